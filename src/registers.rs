//! The 14-register file: general-purpose registers, the stack/frame/program
//! counters and the three flag registers.

use std::fmt::{self, Display, Write};

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of registers in the file.
pub const NUMBER_OF_REGISTERS: usize = 14;

/// General-purpose register 0.
pub const R0: Register = Register(0);
/// General-purpose register 1.
pub const R1: Register = Register(1);
/// General-purpose register 2.
pub const R2: Register = Register(2);
/// General-purpose register 3.
pub const R3: Register = Register(3);
/// General-purpose register 4.
pub const R4: Register = Register(4);
/// General-purpose register 5.
pub const R5: Register = Register(5);
/// General-purpose register 6.
pub const R6: Register = Register(6);
/// General-purpose register 7.
pub const R7: Register = Register(7);
/// Base (frame) pointer.
pub const BP: Register = Register(8);
/// Stack pointer.
pub const SP: Register = Register(9);
/// Program counter.
pub const PC: Register = Register(10);
/// `CMP`/arithmetic "above" flag.
pub const AF: Register = Register(11);
/// `CMP`/arithmetic "below" flag.
pub const BF: Register = Register(12);
/// Zero flag.
pub const ZF: Register = Register(13);

/// Register names in index order, as used for disassembly and trace output.
pub const NAMES: [&str; NUMBER_OF_REGISTERS] = [
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "bp", "sp", "pc", "af", "bf", "zf",
];

/// An index into the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Register(u8);

impl Register {
    /// Builds a register index, or `None` if `value` is out of range.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if (value as usize) < NUMBER_OF_REGISTERS {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the register's name, e.g. `"r0"` or `"pc"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        NAMES[self.index()]
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A register byte didn't correspond to any of the 14 register slots.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("register index {0} out of range (0..{NUMBER_OF_REGISTERS})")]
pub struct RegisterConvError(pub u8);

impl TryFrom<u8> for Register {
    type Error = RegisterConvError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(RegisterConvError(value))
    }
}

impl From<Register> for u8 {
    fn from(register: Register) -> Self {
        register.0
    }
}

impl From<Register> for usize {
    fn from(register: Register) -> Self {
        register.index()
    }
}

/// The full set of 14 16-bit registers.
///
/// All arithmetic on the contained values wraps modulo 2^16 (spec.md §4.3);
/// this type itself does no range checking beyond the register index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    slots: [u16; NUMBER_OF_REGISTERS],
}

impl RegisterFile {
    /// A register file with every slot zeroed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [0; NUMBER_OF_REGISTERS],
        }
    }

    /// Reads a register's current value.
    #[must_use]
    pub fn read(&self, register: Register) -> u16 {
        self.slots[register.index()]
    }

    /// Overwrites a register's value.
    pub fn write(&mut self, register: Register, value: u16) {
        self.slots[register.index()] = value;
    }

    /// Sets `ZF` to 1 if `value == 0`, else 0 — the shared helper every
    /// flag-setting opcode (`CMP`, `TEST`, `SUB`, ...) funnels through.
    pub fn set_zf(&mut self, value: u16) {
        self.write(ZF, u16::from(value == 0));
    }

    /// Iterates over `(register, value)` pairs in index order, for tracing.
    pub fn iter(&self) -> impl Iterator<Item = (Register, u16)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, &v)| (Register(i as u8), v))
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
