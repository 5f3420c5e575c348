//! The contract a host emulator implements to embed this CPU.
//!
//! This crate owns instruction decoding and execution; it knows nothing
//! about process creation, loaders, or syscall implementations. A host
//! supplies memory, a syscall table and hook callbacks through [`Host`].

use crate::registers::RegisterFile;

/// Access rights on a mapped memory region, as a host would report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Protection {
    /// Region can be read.
    pub read: bool,
    /// Region can be written.
    pub write: bool,
    /// Region can be fetched from and executed.
    pub exec: bool,
}

impl Protection {
    /// No access at all.
    pub const NONE: Self = Self {
        read: false,
        write: false,
        exec: false,
    };

    /// Read, write and execute.
    pub const ALL: Self = Self {
        read: true,
        write: true,
        exec: true,
    };

    /// Read-only.
    pub const READ: Self = Self {
        read: true,
        write: false,
        exec: false,
    };

    /// Read and write, no execute.
    pub const READ_WRITE: Self = Self {
        read: true,
        write: true,
        exec: false,
    };
}

/// The external surface a host emulator provides to the CPU.
///
/// Everything outside of decode/execute — the address space, syscall
/// dispatch, and block/instruction tracing hooks — lives behind this
/// trait. The interpreter (`src/interpreter.rs`) only ever talks to a
/// `Host`; it never assumes a particular process model.
pub trait Host {
    /// Reads `buf.len()` bytes starting at `address`.
    ///
    /// # Errors
    /// Returns `Err` if any byte in the range isn't mapped with read
    /// permission.
    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), HostError>;

    /// Writes `buf` starting at `address`.
    ///
    /// # Errors
    /// Returns `Err` if any byte in the range isn't mapped with write
    /// permission.
    fn write(&mut self, address: u16, buf: &[u8]) -> Result<(), HostError>;

    /// Reports the permissions mapped at `address`, or [`Protection::NONE`]
    /// if nothing is mapped there.
    fn protection(&self, address: u16) -> Protection;

    /// Maps `size` bytes starting at `address` with the given protection.
    ///
    /// Hosts whose address space is already fully mapped before the CPU
    /// starts (the common case) can leave this at its default, which
    /// rejects every call; [`crate::arch::init`] only needs it for hosts
    /// that want the stack region mapped lazily.
    ///
    /// # Errors
    /// Returns `Err` if the host doesn't support mapping, or the region
    /// overlaps something already mapped.
    fn map(&mut self, address: u16, size: u16, protection: Protection) -> Result<(), HostError> {
        let _ = (address, size, protection);
        Err(HostError::new("this host does not support dynamic mapping"))
    }

    /// Dispatches a syscall. `number` is the value from `R0`, looked up in
    /// the architecture's syscall name table and passed as `name` (`None`
    /// if `number` isn't in that table); `args` are `R1`..`R4` in order.
    /// Returns the value to write back into `R0`.
    ///
    /// # Errors
    /// Returns `Err` if the host rejects or fails the call.
    fn syscall(
        &mut self,
        number: u16,
        name: Option<&'static str>,
        args: [u16; 4],
        registers: &mut RegisterFile,
    ) -> Result<u16, HostError>;

    /// Called before the CPU fetches the first instruction of a new basic
    /// block (i.e. right after a taken jump, or at start-of-run).
    fn on_block(&mut self, _address: u16, _registers: &RegisterFile) {}

    /// Called after every instruction is fetched, before it executes.
    fn on_code(&mut self, _instruction_address: u16, _registers: &RegisterFile) {}
}

/// A host-side failure servicing a memory access or syscall.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    /// Builds a host error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
