//! Executor side of the mailbox protocol.
//!
//! The executor plays the remote hardware: it watches the command word, applies
//! each request to a simulated bus, and hands the slot back. Running it on its
//! own thread gives the two independently scheduled actors the protocol is
//! built for.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use super::{Mailbox, Request};
use crate::sim::SimBus;
use crate::stats::MailboxStats;

/// Idle polls between scheduler yields while no command is pending.
const IDLE_SPINS_PER_YIELD: u32 = 256;

/// Services mailbox commands against a simulated bus.
#[derive(Debug)]
pub struct Executor {
    mailbox: Arc<Mailbox>,
    bus: SimBus,
    stats: Arc<MailboxStats>,
}

impl Executor {
    /// Creates an executor serving `mailbox` from `bus`.
    pub const fn new(mailbox: Arc<Mailbox>, bus: SimBus, stats: Arc<MailboxStats>) -> Self {
        Self {
            mailbox,
            bus,
            stats,
        }
    }

    /// Returns the simulated bus.
    pub const fn bus(&self) -> &SimBus {
        &self.bus
    }

    /// Consumes the executor, returning the simulated bus.
    pub fn into_bus(self) -> SimBus {
        self.bus
    }

    /// Services the pending command, if there is one.
    ///
    /// Returns `true` if a command was completed.
    pub fn service_one(&mut self) -> bool {
        let Some(request) = self.mailbox.pending() else {
            return false;
        };
        match request {
            Request::Read { address } => {
                let value = self.bus.read_u32(address);
                tracing::trace!(%address, value, "executor read");
                self.mailbox.complete(Some(value));
            }
            Request::Write { address, value } => {
                self.bus.write_u32(address, value);
                tracing::trace!(%address, value, "executor write");
                self.mailbox.complete(None);
            }
            Request::Unknown { code } => {
                tracing::warn!(code, "executor discarded unknown mailbox command");
                self.mailbox.complete(None);
            }
        }
        self.stats.record_serviced();
        true
    }

    /// Runs the executor on a new thread until the returned handle is stopped.
    ///
    /// # Returns
    ///
    /// A handle that stops and joins the thread when dropped. Use
    /// [`ExecutorHandle::join`] to get the executor, and its bus, back.
    pub fn spawn(mut self) -> ExecutorHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_signal = Arc::clone(&stop);
        let thread = thread::spawn(move || {
            let mut idle: u32 = 0;
            while !stop_signal.load(Ordering::Acquire) {
                if self.service_one() {
                    idle = 0;
                    continue;
                }
                idle = idle.wrapping_add(1);
                if idle % IDLE_SPINS_PER_YIELD == 0 {
                    thread::yield_now();
                } else {
                    std::hint::spin_loop();
                }
            }
            self
        });
        tracing::debug!("mailbox executor started");
        ExecutorHandle {
            stop,
            thread: Some(thread),
        }
    }
}

/// Handle to an executor running on its own thread.
///
/// Dropping the handle stops the executor and waits for it.
#[derive(Debug)]
pub struct ExecutorHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<Executor>>,
}

impl ExecutorHandle {
    /// Asks the executor to stop after the command it is servicing, if any.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Stops the executor and returns it, with its bus, once the thread exits.
    ///
    /// Returns `None` if the executor thread panicked.
    pub fn join(mut self) -> Option<Executor> {
        self.stop();
        let executor = self.thread.take()?.join().ok();
        tracing::debug!("mailbox executor stopped");
        executor
    }
}

impl Drop for ExecutorHandle {
    fn drop(&mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
