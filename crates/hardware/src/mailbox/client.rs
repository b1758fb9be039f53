//! Requester side of the mailbox protocol.
//!
//! `remote_read` and `remote_write` are the access strategy installed when the
//! chip is a simulator reachable only through the mailbox. Both block until
//! the executor returns the command word to idle, bounded by a poll policy
//! and, optionally, a cancellation token.

use std::sync::Arc;

use super::{Command, Mailbox};
use crate::access::{Backend, RegisterAccess};
use crate::common::{CancelToken, Error, PhysAddr, PollPolicy, Result, Retry, retry};
use crate::stats::MailboxStats;

/// The bounds shared by every wait of one request.
#[derive(Clone, Copy, Debug)]
pub struct Wait<'a> {
    /// Bound on polls of the command word, applied to each wait separately.
    pub policy: &'a PollPolicy,
    /// Token that abandons the wait when raised.
    pub cancel: Option<&'a CancelToken>,
    /// Counters to record into.
    pub stats: &'a MailboxStats,
}

impl<'a> Wait<'a> {
    /// Creates a non-cancellable wait.
    pub const fn new(policy: &'a PollPolicy, stats: &'a MailboxStats) -> Self {
        Self {
            policy,
            cancel: None,
            stats,
        }
    }

    /// Abandons the wait once `cancel` is raised.
    #[must_use]
    pub const fn with_cancel(mut self, cancel: Option<&'a CancelToken>) -> Self {
        self.cancel = cancel;
        self
    }

    fn poll_idle(&self, mailbox: &Mailbox) -> Result<Retry<()>> {
        retry(self.policy, self.cancel, |_| Ok(mailbox.is_idle().then_some(())))
    }

    /// Waits out any command still outstanding before a new one is posted.
    fn until_free(&self, mailbox: &Mailbox, command: Command, address: PhysAddr) -> Result<()> {
        match self.poll_idle(mailbox)? {
            Retry::Converged { .. } => Ok(()),
            Retry::Cancelled { .. } => Err(Error::MailboxCancelled { command, address }),
            Retry::Exhausted { attempts } => {
                // The slot may have freed up after the last poll.
                let Some(outstanding) = mailbox.pending() else {
                    return Ok(());
                };
                self.stats.record_timeout(attempts);
                tracing::warn!(%outstanding, attempts, "mailbox still holds an earlier command");
                Err(Error::MailboxBusy {
                    outstanding,
                    attempts,
                })
            }
        }
    }

    /// Waits for the executor to complete `command`. Returns the polls spent.
    fn until_done(&self, mailbox: &Mailbox, command: Command, address: PhysAddr) -> Result<u32> {
        match self.poll_idle(mailbox)? {
            Retry::Converged { attempts, .. } => Ok(attempts),
            Retry::Cancelled { attempts } => {
                self.stats.record_timeout(attempts);
                tracing::warn!(%command, %address, attempts, "mailbox wait cancelled");
                Err(Error::MailboxCancelled { command, address })
            }
            Retry::Exhausted { attempts } => {
                self.stats.record_timeout(attempts);
                tracing::warn!(%command, %address, attempts, "mailbox command not acknowledged");
                Err(Error::MailboxTimeout {
                    command,
                    address,
                    attempts,
                })
            }
        }
    }
}

/// Reads the word at `address` through the mailbox.
///
/// Any command still outstanding from an earlier, timed-out request is waited
/// out first, so at most one command is ever in flight.
///
/// # Arguments
///
/// * `mailbox` - The shared mailbox record.
/// * `address` - Absolute address to read, carried in `Arg0`.
/// * `wait` - Poll bound, cancellation token and statistics for both waits.
///
/// # Returns
///
/// The value the executor left in `Arg0`.
///
/// # Errors
///
/// * [`Error::MailboxBusy`] if an earlier command never completed.
/// * [`Error::MailboxTimeout`] if this command is not acknowledged in time.
/// * [`Error::MailboxCancelled`] if the token is raised during either wait.
pub fn remote_read(mailbox: &Mailbox, address: PhysAddr, wait: &Wait<'_>) -> Result<u32> {
    wait.until_free(mailbox, Command::ReadMem, address)?;
    mailbox.post(Command::ReadMem, address, None);
    let polls = wait.until_done(mailbox, Command::ReadMem, address)?;
    wait.stats.record_read(polls);
    Ok(mailbox.arg0())
}

/// Writes `value` to the word at `address` through the mailbox and returns
/// `value` as the acknowledged value.
///
/// # Errors
///
/// As for [`remote_read`].
pub fn remote_write(
    mailbox: &Mailbox,
    address: PhysAddr,
    value: u32,
    wait: &Wait<'_>,
) -> Result<u32> {
    wait.until_free(mailbox, Command::WriteMem, address)?;
    mailbox.post(Command::WriteMem, address, Some(value));
    let polls = wait.until_done(mailbox, Command::WriteMem, address)?;
    wait.stats.record_write(polls);
    Ok(value)
}

/// Access strategy that forwards every access through the mailbox.
#[derive(Debug, Clone)]
pub struct MailboxAccess {
    mailbox: Arc<Mailbox>,
    base: PhysAddr,
    policy: PollPolicy,
    cancel: Option<CancelToken>,
    stats: Arc<MailboxStats>,
}

impl MailboxAccess {
    /// Creates a strategy for the bank at `base`.
    pub const fn new(
        mailbox: Arc<Mailbox>,
        base: PhysAddr,
        policy: PollPolicy,
        stats: Arc<MailboxStats>,
    ) -> Self {
        Self {
            mailbox,
            base,
            policy,
            cancel: None,
            stats,
        }
    }

    /// Abandons waits once `token` is raised.
    #[must_use]
    pub fn with_cancel(mut self, token: Option<CancelToken>) -> Self {
        self.cancel = token;
        self
    }

    fn wait(&self) -> Wait<'_> {
        Wait::new(&self.policy, &self.stats).with_cancel(self.cancel.as_ref())
    }
}

impl RegisterAccess for MailboxAccess {
    fn name(&self) -> &str {
        "mailbox"
    }

    fn base(&self) -> PhysAddr {
        self.base
    }

    fn read(&self, _cached: u32, offset: u32) -> Result<u32> {
        remote_read(&self.mailbox, self.base.offset(offset), &self.wait())
    }

    fn write(&self, value: u32, offset: u32) -> Result<u32> {
        remote_write(&self.mailbox, self.base.offset(offset), value, &self.wait())
    }
}

/// Backend handing out [`MailboxAccess`] strategies over one mailbox.
#[derive(Debug, Clone)]
pub struct MailboxBackend {
    mailbox: Arc<Mailbox>,
    policy: PollPolicy,
    cancel: Option<CancelToken>,
    stats: Arc<MailboxStats>,
}

impl MailboxBackend {
    /// Creates a backend over `mailbox` with its own statistics.
    pub fn new(mailbox: Arc<Mailbox>, policy: PollPolicy) -> Self {
        Self::with_stats(mailbox, policy, Arc::new(MailboxStats::new()))
    }

    /// Creates a backend that records into existing statistics, e.g. ones
    /// shared with the executor.
    pub const fn with_stats(
        mailbox: Arc<Mailbox>,
        policy: PollPolicy,
        stats: Arc<MailboxStats>,
    ) -> Self {
        Self {
            mailbox,
            policy,
            cancel: None,
            stats,
        }
    }

    /// Makes every strategy handed out abandon its waits once `token` is
    /// raised. Give the same token to the sequencer so that a cancelled wait
    /// is reported against the step that issued it.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Returns the shared mailbox.
    pub const fn mailbox(&self) -> &Arc<Mailbox> {
        &self.mailbox
    }

    /// Returns the shared statistics.
    pub const fn stats(&self) -> &Arc<MailboxStats> {
        &self.stats
    }
}

impl Backend for MailboxBackend {
    fn name(&self) -> &str {
        "mailbox"
    }

    fn access(&self, base: PhysAddr) -> Arc<dyn RegisterAccess> {
        Arc::new(
            MailboxAccess::new(
                Arc::clone(&self.mailbox),
                base,
                self.policy,
                Arc::clone(&self.stats),
            )
            .with_cancel(self.cancel.clone()),
        )
    }
}
