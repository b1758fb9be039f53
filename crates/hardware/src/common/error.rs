//! Error types for register access and bring-up.
//!
//! Every failure is local to the operation that produced it and is surfaced
//! to the caller of the bring-up sequencer. There is no silent recovery and no
//! rollback of register writes that were already applied.

use thiserror::Error;

use super::addr::PhysAddr;
use super::data::AccessKind;
use crate::bringup::Step;
use crate::mailbox::{Command, Request};

/// Result type alias for register access and bring-up operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by access indirection, the mailbox protocol, and the sequencer.
#[derive(Debug, Error)]
pub enum Error {
    /// A register or bank was accessed before a handler was installed for
    /// that direction.
    #[error("unbound {kind} access at {address}")]
    UnboundAccess {
        /// Effective address of the attempted access.
        address: PhysAddr,
        /// Whether a read or a write was attempted.
        kind: AccessKind,
    },

    /// The remote executor did not return the mailbox command field to idle
    /// within the configured bound.
    #[error("mailbox {command} of {address} not acknowledged after {attempts} polls")]
    MailboxTimeout {
        /// Command that was left outstanding.
        command: Command,
        /// Address carried in Arg0.
        address: PhysAddr,
        /// Number of polls of the command field.
        attempts: u32,
    },

    /// A command left outstanding by an earlier request never completed, so a
    /// new one could not be posted.
    #[error("mailbox still busy with {outstanding} after {attempts} polls")]
    MailboxBusy {
        /// The command still occupying the mailbox.
        outstanding: Request,
        /// Number of polls of the command field.
        attempts: u32,
    },

    /// The run was cancelled while waiting on the mailbox.
    #[error("mailbox {command} of {address} abandoned on cancellation")]
    MailboxCancelled {
        /// Command being waited on.
        command: Command,
        /// Address carried in Arg0.
        address: PhysAddr,
    },

    /// A bank was addressed at an unaligned offset or past its last entry.
    #[error("offset {offset:#x} is unaligned or outside bank {bank}")]
    BadOffset {
        /// Name of the bank.
        bank: &'static str,
        /// Byte offset requested.
        offset: u32,
    },

    /// A bring-up step polled for a status value that never converged.
    #[error("bring-up step {step} did not converge after {attempts} attempts")]
    SequenceTimeout {
        /// Step that failed.
        step: Step,
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// The bring-up run was cancelled through its cancellation token.
    #[error("bring-up cancelled during {step}")]
    Cancelled {
        /// Step that was running when cancellation was observed.
        step: Step,
    },

    /// A direct memory-mapped access hit an address that no mapped window covers.
    #[error("{kind} access fault at {address}: no mapped window")]
    AccessFault {
        /// Faulting address.
        address: PhysAddr,
        /// Whether a read or a write was attempted.
        kind: AccessKind,
    },

    /// The MDIO controller flagged a PHY register read as failed.
    #[error("MDIO read of PHY {phy} register {reg:#04x} failed")]
    MdioReadFailed {
        /// PHY address on the MDIO bus.
        phy: u8,
        /// MII register number.
        reg: u8,
    },

    /// An anonymous MMIO window or an input file could not be set up.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Returns the bring-up step this error names, if any.
    pub const fn step(&self) -> Option<Step> {
        match self {
            Self::SequenceTimeout { step, .. } | Self::Cancelled { step } => Some(*step),
            _ => None,
        }
    }
}
