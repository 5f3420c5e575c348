//! Error types shared by the decoder and the execution engine.

use thiserror::Error;

/// Failure decoding a single instruction from a byte stream.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A byte didn't match any entry in the opcode table.
    #[error("unknown opcode 0x{opcode:02x} at offset {offset}")]
    UnknownOpcode {
        /// Offending byte.
        opcode: u8,
        /// Offset of the opcode byte within the stream.
        offset: u16,
    },

    /// A flag byte didn't match any of the eleven defined values.
    #[error("unknown flag 0x{flag:02x} at offset {offset}")]
    UnknownFlag {
        /// Offending byte.
        flag: u8,
        /// Offset of the flag byte within the stream.
        offset: u16,
    },

    /// A register operand byte was out of range for the 14-register file.
    #[error("unknown register 0x{register:02x} at offset {offset}")]
    UnknownRegister {
        /// Offending byte.
        register: u8,
        /// Offset of the register byte within the stream.
        offset: u16,
    },

    /// The stream ended before an instruction's operand bytes were fully read.
    #[error("truncated instruction at offset {offset}: needed {needed} more byte(s)")]
    Truncated {
        /// Offset at which the read ran out of bytes.
        offset: u16,
        /// Number of additional bytes the read required.
        needed: u8,
    },
}

/// Failure executing a decoded instruction.
#[derive(Error, Debug)]
pub enum ExecError {
    /// A memory access fell outside any mapped, sufficiently permissive region.
    #[error("memory fault at address 0x{address:04x}")]
    MemoryFault {
        /// Address the access targeted.
        address: u16,
    },

    /// `DIV` with a zero divisor.
    #[error("division by zero")]
    DivByZero,

    /// An opcode decoded successfully but has no execution handler.
    ///
    /// Every opcode in the table has a handler; this only fires if the
    /// table and the execute dispatch ever drift apart.
    #[error("opcode {mnemonic} has no execution handler")]
    Unimplemented {
        /// Mnemonic of the offending opcode.
        mnemonic: &'static str,
    },

    /// Fetching the next instruction failed.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The host rejected or failed a syscall dispatch.
    #[error("syscall failed: {0}")]
    Syscall(String),
}

/// The non-error outcome of a completed [`crate::interpreter::Cpu::start`] run.
///
/// Carries the CPU's exit code the same way a process exit status does; it
/// isn't an error even though the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExitStatus(pub u16);

impl ExitStatus {
    /// The conventional "clean exit" status.
    pub const SUCCESS: Self = Self(0);
}

impl From<u16> for ExitStatus {
    fn from(code: u16) -> Self {
        Self(code)
    }
}
