//! Register access kinds.
//!
//! Used to tag errors and trace events with the direction of the access that
//! produced them.

use std::fmt;

/// Direction of a register access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// Register read; routed through the bound read handler.
    Read,
    /// Register write; routed through the bound write handler.
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}
