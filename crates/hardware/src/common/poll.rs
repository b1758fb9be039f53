//! Bounded polling and cancellation.
//!
//! Every wait in this crate goes through [`retry`]: the mailbox command-flag
//! wait, MDIO completion waits, and the sequencer's select-then-verify loops.
//! A wait is bounded by an attempt count and spaced by an inter-attempt delay;
//! exhaustion is reported to the caller, which maps it to its own error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use super::error::Result;

/// With a zero delay, the poller yields to the scheduler once per this many
/// attempts so that an executor sharing the core can run.
const SPINS_PER_YIELD: u32 = 1024;

/// Bound and pacing for a polling loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum number of attempts before the wait is abandoned; at least one
    /// attempt is always made.
    pub max_attempts: u32,
    /// Pause between attempts. Zero spins.
    pub delay: Duration,
}

impl PollPolicy {
    /// Creates a policy with the given attempt bound and inter-attempt delay.
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Creates a tight-spinning policy with the given attempt bound.
    pub const fn spin(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    fn pause(&self, attempt: u32) {
        if self.delay.is_zero() {
            if attempt % SPINS_PER_YIELD == 0 {
                thread::yield_now();
            } else {
                std::hint::spin_loop();
            }
        } else {
            thread::sleep(self.delay);
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::spin(1_000_000)
    }
}

/// Shared flag used to abort a bring-up run from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Observed at the next poll of any wait sharing
    /// this token, or at the next step boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Outcome of a bounded wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retry<T> {
    /// The attempt produced a value.
    Converged {
        /// Value produced by the final attempt.
        value: T,
        /// Number of attempts made, including the successful one.
        attempts: u32,
    },
    /// The attempt bound ran out.
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
    },
    /// The cancellation token was raised before convergence.
    Cancelled {
        /// Number of attempts made before cancellation was observed.
        attempts: u32,
    },
}

/// Runs `attempt` until it returns `Some`, the policy's bound is exhausted,
/// or `cancel` is raised.
///
/// The attempt receives its 1-based attempt number. Errors returned by the
/// attempt abort the wait immediately.
///
/// # Errors
///
/// Propagates the first error returned by `attempt`.
pub fn retry<T>(
    policy: &PollPolicy,
    cancel: Option<&CancelToken>,
    mut attempt: impl FnMut(u32) -> Result<Option<T>>,
) -> Result<Retry<T>> {
    let max_attempts = policy.max_attempts.max(1);
    for n in 1..=max_attempts {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Ok(Retry::Cancelled { attempts: n - 1 });
        }
        if let Some(value) = attempt(n)? {
            return Ok(Retry::Converged { value, attempts: n });
        }
        if n < max_attempts {
            policy.pause(n);
        }
    }
    Ok(Retry::Exhausted {
        attempts: max_attempts,
    })
}
