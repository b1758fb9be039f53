//! Shared-memory command mailbox.
//!
//! The mailbox is the only channel between the code performing bring-up and a
//! remote executor that emulates the hardware. It is a single-slot rendezvous:
//! 1. **Layout:** Three 32-bit words, `Arg0`, `Arg1`, and `Command`, in that order.
//! 2. **Requester:** Stores the arguments, then publishes a command with release ordering.
//! 3. **Executor:** Observes the command with acquire ordering, performs it, stores any
//!    result in `Arg0`, then returns the command to idle with release ordering.
//! 4. **Completion:** The requester observes idle with acquire ordering before reading `Arg0`.
//!
//! The command word is the synchronisation point; argument accesses are never
//! reordered across it in either direction.

/// Requester side: remote read/write and the mailbox access strategy.
pub mod client;

/// Executor side: services commands against a simulated bus.
pub mod executor;

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::common::PhysAddr;

pub use client::{MailboxAccess, MailboxBackend, Wait};
pub use executor::{Executor, ExecutorHandle};

/// Mailbox command codes as stored in the `Command` word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Command {
    /// No command outstanding.
    Idle = 0,
    /// Read the word at `Arg0`; the result is returned in `Arg0`.
    ReadMem = 1,
    /// Write `Arg1` to the word at `Arg0`.
    WriteMem = 2,
}

impl Command {
    /// Returns the raw code stored in the `Command` word.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Decodes a raw command word.
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Idle),
            1 => Some(Self::ReadMem),
            2 => Some(Self::WriteMem),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::ReadMem => f.write_str("read-mem"),
            Self::WriteMem => f.write_str("write-mem"),
        }
    }
}

/// A command observed by the executor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    /// Read the word at `address`.
    Read {
        /// Target address from `Arg0`.
        address: PhysAddr,
    },
    /// Write `value` to the word at `address`.
    Write {
        /// Target address from `Arg0`.
        address: PhysAddr,
        /// Value from `Arg1`.
        value: u32,
    },
    /// The command word holds a code this side does not understand.
    Unknown {
        /// Raw command word.
        code: u32,
    },
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { address } => write!(f, "{} of {address}", Command::ReadMem),
            Self::Write { address, value } => {
                write!(f, "{} of {address} ({value:#010x})", Command::WriteMem)
            }
            Self::Unknown { code } => write!(f, "unknown command {code:#x}"),
        }
    }
}

/// The shared mailbox record.
///
/// `AtomicU32` has the same in-memory representation as `u32`, so this type
/// matches the three-word layout bit for bit.
#[derive(Debug, Default)]
#[repr(C)]
pub struct Mailbox {
    arg0: AtomicU32,
    arg1: AtomicU32,
    command: AtomicU32,
}

impl Mailbox {
    /// Creates an idle mailbox with zeroed arguments.
    pub const fn new() -> Self {
        Self {
            arg0: AtomicU32::new(0),
            arg1: AtomicU32::new(0),
            command: AtomicU32::new(Command::Idle.code()),
        }
    }

    /// Returns the raw command word.
    pub fn command_word(&self) -> u32 {
        self.command.load(Ordering::Acquire)
    }

    /// Returns `true` if no command is outstanding.
    pub fn is_idle(&self) -> bool {
        self.command_word() == Command::Idle.code()
    }

    /// Returns the raw `Arg0` word.
    pub fn arg0(&self) -> u32 {
        self.arg0.load(Ordering::Acquire)
    }

    /// Returns the raw `Arg1` word.
    pub fn arg1(&self) -> u32 {
        self.arg1.load(Ordering::Acquire)
    }

    /// Publishes a request. The caller must have observed the mailbox idle.
    fn post(&self, command: Command, address: PhysAddr, value: Option<u32>) {
        self.arg0.store(address.val(), Ordering::Relaxed);
        if let Some(value) = value {
            self.arg1.store(value, Ordering::Relaxed);
        }
        self.command.store(command.code(), Ordering::Release);
    }

    /// Returns the outstanding request, if any.
    ///
    /// The acquire load of the command word makes the requester's argument
    /// stores visible before they are read here.
    pub fn pending(&self) -> Option<Request> {
        let code = self.command.load(Ordering::Acquire);
        let address = PhysAddr(self.arg0.load(Ordering::Relaxed));
        match Command::from_code(code) {
            Some(Command::Idle) => None,
            Some(Command::ReadMem) => Some(Request::Read { address }),
            Some(Command::WriteMem) => Some(Request::Write {
                address,
                value: self.arg1.load(Ordering::Relaxed),
            }),
            None => Some(Request::Unknown { code }),
        }
    }

    /// Completes the outstanding request, storing `result` in `Arg0` first
    /// when one is given, then returning the command word to idle.
    pub fn complete(&self, result: Option<u32>) {
        if let Some(result) = result {
            self.arg0.store(result, Ordering::Relaxed);
        }
        self.command.store(Command::Idle.code(), Ordering::Release);
    }
}
