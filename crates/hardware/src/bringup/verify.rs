//! Select-then-verify retry loops.
//!
//! Some PHY writes do not always land. The workaround observed on real boards
//! is to write a selector, read something back, and on a mismatch start over
//! from the write. Each round walks `SelectorWritten -> Verifying` and ends in
//! either `Converged` or a restart; rounds are bounded by a poll policy.

use super::Step;
use crate::common::{CancelToken, Error, PollPolicy, Result, Retry, retry};

/// Position of one round in the select-then-verify state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyState {
    /// The selector has just been written.
    SelectorWritten,
    /// The status is being read back.
    Verifying,
    /// The read-back matched; the loop is done.
    Converged,
}

/// Writes a selector with `select`, then checks it with `verify`, repeating
/// both until `verify` reports a match.
///
/// # Arguments
///
/// * `step` - Named in the timeout or cancellation error.
/// * `policy` - Bounds the number of rounds and the pause between them.
/// * `cancel` - Checked before every round.
/// * `ctx` - Handed to both closures so they can share mutable state such as
///   a register bank.
///
/// # Returns
///
/// The number of rounds taken, at least one.
///
/// # Errors
///
/// * [`Error::SequenceTimeout`] naming `step` if `policy` runs out first.
/// * [`Error::Cancelled`] if `cancel` is raised between rounds.
/// * Any error from `select` or `verify`, immediately.
pub fn select_then_verify<C: ?Sized>(
    step: Step,
    policy: &PollPolicy,
    cancel: Option<&CancelToken>,
    ctx: &mut C,
    mut select: impl FnMut(&mut C) -> Result<()>,
    mut verify: impl FnMut(&mut C) -> Result<bool>,
) -> Result<u32> {
    let outcome = retry(policy, cancel, |attempt| {
        select(&mut *ctx)?;
        let mut state = VerifyState::SelectorWritten;
        loop {
            tracing::trace!(%step, attempt, ?state, "select-then-verify");
            state = match state {
                VerifyState::SelectorWritten => VerifyState::Verifying,
                VerifyState::Verifying if verify(&mut *ctx)? => VerifyState::Converged,
                VerifyState::Verifying => return Ok(None),
                VerifyState::Converged => return Ok(Some(())),
            };
        }
    })?;

    match outcome {
        Retry::Converged { attempts, .. } => {
            if attempts > 1 {
                tracing::warn!(%step, attempts, "selector took several writes to stick");
            }
            Ok(attempts)
        }
        Retry::Exhausted { attempts } => Err(Error::SequenceTimeout { step, attempts }),
        Retry::Cancelled { .. } => Err(Error::Cancelled { step }),
    }
}
