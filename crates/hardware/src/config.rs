//! Configuration for bring-up runs.
//!
//! This module defines the knobs that bound every wait in the crate. It provides:
//! 1. **Defaults:** Attempt bounds and delays used when a field is omitted.
//! 2. **Structures:** Mailbox and sequencer settings, each a set of poll bounds.
//! 3. **Conversion:** `PollConfig` to the runtime `PollPolicy`.
//!
//! Configuration is supplied as JSON (the CLI's `--config` file) or built with
//! `Config::default()`.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::common::{PollPolicy, Result};

/// Default configuration constants.
mod defaults {
    /// Command-word polls before a mailbox request is abandoned.
    ///
    /// The executor answers in well under a microsecond, so this is generous
    /// even with spinning.
    pub const MAILBOX_ATTEMPTS: u32 = 1_000_000;

    /// Delay between command-word polls (none; the wait spins).
    pub const MAILBOX_DELAY_US: u64 = 0;

    /// Select-then-verify rounds before a step is declared stuck.
    ///
    /// Observed hardware needs about a dozen.
    pub const SELECT_VERIFY_ATTEMPTS: u32 = 64;

    /// Delay between select-then-verify rounds.
    pub const SELECT_VERIFY_DELAY_US: u64 = 0;

    /// Polls of the MDIO busy bit per transaction.
    pub const MDIO_ATTEMPTS: u32 = 10_000;

    /// Delay between MDIO busy polls.
    pub const MDIO_DELAY_US: u64 = 0;
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use apeboot_core::config::Config;
///
/// let json = r#"{
///     "mailbox": { "poll": { "max_attempts": 5000 } },
///     "sequence": {
///         "select_verify": { "max_attempts": 12, "delay_us": 10 },
///         "zero_fill": false
///     }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.mailbox.poll.max_attempts, 5000);
/// assert_eq!(config.sequence.select_verify.max_attempts, 12);
/// assert!(!config.sequence.zero_fill);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Mailbox protocol settings
    #[serde(default)]
    pub mailbox: MailboxConfig,
    /// Bring-up sequencer settings
    #[serde(default)]
    pub sequence: SequenceConfig,
}

impl Config {
    /// Parses a configuration document. Omitted fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::common::Error::Config) if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Bound and pacing of one polling loop, in configuration units.
///
/// In a document, either field may be omitted; the omitted one keeps the
/// default of the section it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Maximum attempts; at least one is always made.
    pub max_attempts: u32,
    /// Delay between attempts in microseconds. Zero spins.
    pub delay_us: u64,
}

/// A poll object as written, before section defaults are applied.
#[derive(Deserialize)]
struct PartialPoll {
    max_attempts: Option<u32>,
    delay_us: Option<u64>,
}

impl PartialPoll {
    fn or(self, base: PollConfig) -> PollConfig {
        PollConfig {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            delay_us: self.delay_us.unwrap_or(base.delay_us),
        }
    }
}

fn mailbox_poll<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<PollConfig, D::Error> {
    Ok(PartialPoll::deserialize(d)?.or(MailboxConfig::default_poll()))
}

fn select_verify_poll<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<PollConfig, D::Error> {
    Ok(PartialPoll::deserialize(d)?.or(SequenceConfig::default_select_verify()))
}

fn mdio_poll<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<PollConfig, D::Error> {
    Ok(PartialPoll::deserialize(d)?.or(SequenceConfig::default_mdio()))
}

impl PollConfig {
    /// Creates a poll configuration.
    pub const fn new(max_attempts: u32, delay_us: u64) -> Self {
        Self {
            max_attempts,
            delay_us,
        }
    }

    /// Returns the runtime policy for this configuration.
    pub const fn policy(&self) -> PollPolicy {
        PollPolicy::new(self.max_attempts, Duration::from_micros(self.delay_us))
    }
}

impl From<PollConfig> for PollPolicy {
    fn from(config: PollConfig) -> Self {
        config.policy()
    }
}

/// Mailbox protocol settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MailboxConfig {
    /// Bound on waiting for the executor to return the command word to idle
    #[serde(
        default = "MailboxConfig::default_poll",
        deserialize_with = "mailbox_poll"
    )]
    pub poll: PollConfig,
}

impl MailboxConfig {
    const fn default_poll() -> PollConfig {
        PollConfig::new(defaults::MAILBOX_ATTEMPTS, defaults::MAILBOX_DELAY_US)
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            poll: Self::default_poll(),
        }
    }
}

/// Bring-up sequencer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SequenceConfig {
    /// Bound on each select-then-verify loop
    #[serde(
        default = "SequenceConfig::default_select_verify",
        deserialize_with = "select_verify_poll"
    )]
    pub select_verify: PollConfig,

    /// Bound on waiting for one MDIO transaction to finish
    #[serde(
        default = "SequenceConfig::default_mdio",
        deserialize_with = "mdio_poll"
    )]
    pub mdio: PollConfig,

    /// Clear the GEN, RXMBUF, TXMBUF and SDBCACHE regions. Disable to save
    /// time against a simulator that starts zeroed.
    #[serde(default = "SequenceConfig::default_zero_fill")]
    pub zero_fill: bool,
}

impl SequenceConfig {
    const fn default_select_verify() -> PollConfig {
        PollConfig::new(
            defaults::SELECT_VERIFY_ATTEMPTS,
            defaults::SELECT_VERIFY_DELAY_US,
        )
    }

    const fn default_mdio() -> PollConfig {
        PollConfig::new(defaults::MDIO_ATTEMPTS, defaults::MDIO_DELAY_US)
    }

    const fn default_zero_fill() -> bool {
        true
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            select_verify: Self::default_select_verify(),
            mdio: Self::default_mdio(),
            zero_fill: true,
        }
    }
}
