//! Mailbox traffic statistics.
//!
//! Counters are shared between the requester-side strategies and the executor,
//! so they are plain relaxed atomics. This module provides:
//! 1. **Requests:** Reads and writes issued through the mailbox.
//! 2. **Polling:** Command-flag polls spent waiting, and waits that timed out.
//! 3. **Servicing:** Commands completed by the executor.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared mailbox counters.
#[derive(Debug, Default)]
pub struct MailboxStats {
    reads: AtomicU64,
    writes: AtomicU64,
    polls: AtomicU64,
    timeouts: AtomicU64,
    serviced: AtomicU64,
}

/// Point-in-time copy of [`MailboxStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MailboxSnapshot {
    /// Completed remote reads.
    pub reads: u64,
    /// Completed remote writes.
    pub writes: u64,
    /// Polls of the command word across all requests.
    pub polls: u64,
    /// Requests abandoned because the executor never answered.
    pub timeouts: u64,
    /// Commands completed by the executor.
    pub serviced: u64,
}

impl MailboxStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_read(&self, polls: u32) {
        let _ = self.reads.fetch_add(1, Ordering::Relaxed);
        let _ = self.polls.fetch_add(u64::from(polls), Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self, polls: u32) {
        let _ = self.writes.fetch_add(1, Ordering::Relaxed);
        let _ = self.polls.fetch_add(u64::from(polls), Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self, polls: u32) {
        let _ = self.timeouts.fetch_add(1, Ordering::Relaxed);
        let _ = self.polls.fetch_add(u64::from(polls), Ordering::Relaxed);
    }

    pub(crate) fn record_serviced(&self) {
        let _ = self.serviced.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a copy of the current counter values.
    pub fn snapshot(&self) -> MailboxSnapshot {
        MailboxSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            polls: self.polls.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            serviced: self.serviced.load(Ordering::Relaxed),
        }
    }
}

impl MailboxSnapshot {
    /// Average number of command-word polls per completed request.
    pub fn polls_per_request(&self) -> f64 {
        let requests = self.reads + self.writes;
        if requests == 0 {
            0.0
        } else {
            self.polls as f64 / requests as f64
        }
    }

    /// Prints the counters in the same aligned layout as the bring-up report.
    pub fn print(&self) {
        println!("\n==========================================================");
        println!("MAILBOX STATISTICS");
        println!("==========================================================");
        println!("  reads            {:>12}", self.reads);
        println!("  writes           {:>12}", self.writes);
        println!("  serviced         {:>12}", self.serviced);
        println!("  timeouts         {:>12}", self.timeouts);
        println!(
            "  polls            {:>12}  ({:.1} per request)",
            self.polls,
            self.polls_per_request()
        );
    }
}
