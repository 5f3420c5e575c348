//! Decoded operand values.

use std::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::registers::Register;

/// A single decoded operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operand {
    /// A bare register, e.g. `r3`.
    Register(Register),
    /// A register used as a memory address, e.g. `[r3]`.
    IndirectRegister(Register),
    /// An 8-bit immediate.
    Immediate8(u8),
    /// A 16-bit immediate, little-endian on the wire.
    Immediate16(u16),
}

impl Operand {
    /// Returns the register this operand reads from, whether bare or
    /// indirect; `None` for immediates.
    #[must_use]
    pub const fn register(self) -> Option<Register> {
        match self {
            Self::Register(r) | Self::IndirectRegister(r) => Some(r),
            Self::Immediate8(_) | Self::Immediate16(_) => None,
        }
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(r) => write!(f, "{r}"),
            Self::IndirectRegister(r) => write!(f, "[{r}]"),
            Self::Immediate8(v) => write!(f, "0x{v:02x}"),
            Self::Immediate16(v) => write!(f, "0x{v:04x}"),
        }
    }
}
