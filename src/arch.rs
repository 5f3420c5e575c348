//! Architecture registration: stack bootstrap and syscall name table.
//!
//! This is the seam between the CPU engine and a host emulator's process
//! model. It owns none of the process/loader/memory-manager machinery
//! itself — only the two pieces specific to this instruction set: how a
//! fresh process's stack is laid out, and what the syscall numbers mean.

use crate::error::ExecError;
use crate::host::{Host, Protection};
use crate::interpreter::Cpu;
use crate::registers::{BP, SP};

/// Total bytes of stack space [`init`] maps below the initial stack pointer.
pub const STACK_SIZE: u16 = 0x8000;

/// Register names in index order (mirrors [`crate::registers::NAMES`], kept
/// here too since a host's architecture registration conventionally
/// exposes its own copy for tracer configuration).
pub const REGISTER_NAMES: [&str; crate::registers::NUMBER_OF_REGISTERS] = crate::registers::NAMES;

/// The subset of registers a tracer shows by default absent user
/// configuration: the eight general-purpose registers.
pub const DEFAULT_TRACE_SET: [&str; 8] = ["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7"];

/// Syscall numbers this architecture names. `Cpu::start`'s `SYSCALL`
/// handler looks a number up here and passes the name to
/// [`crate::host::Host::syscall`] alongside the raw number.
const SYSCALL_NAMES: &[(u16, &str)] = &[
    (0x01, "exit"),
    (0x02, "open"),
    (0x03, "read"),
    (0x04, "write"),
    (0x05, "close"),
    (0x06, "setuid"),
    (0x07, "setgid"),
    (0x08, "dup2"),
    (0x09, "send"),
    (0x0a, "recv"),
    (0x0b, "socket"),
    (0x0c, "listen"),
    (0x0d, "bind"),
    (0x0e, "accept"),
    (0x0f, "chdir"),
    (0x10, "chmod"),
    (0x11, "lseek"),
    (0x12, "getpid"),
    (0x13, "getuid"),
    (0x14, "pause"),
];

/// Looks up a syscall number's name.
#[must_use]
pub fn syscall_name(number: u16) -> Option<&'static str> {
    SYSCALL_NAMES
        .iter()
        .find(|&&(n, _)| n == number)
        .map(|&(_, name)| name)
}

/// Bootstraps a fresh process's stack: maps [`STACK_SIZE`] bytes below
/// address `STACK_SIZE`, pushes each of `argv` (NUL-terminated), packs a
/// `[argc, argv[0], argv[1], ..., 0]` array below that, and points both
/// `SP` and `BP` at the bottom of the array.
///
/// # Errors
/// Returns [`ExecError::Syscall`] if the host rejects the mapping or a
/// write, wrapping the host's message.
pub fn init<H: Host>(cpu: &mut Cpu<H>, argv: &[&[u8]]) -> Result<(), ExecError> {
    cpu.host_mut()
        .map(0, STACK_SIZE, Protection::ALL)
        .map_err(|e| ExecError::Syscall(e.0))?;

    let mut sp = STACK_SIZE;
    let mut addresses = Vec::with_capacity(argv.len());
    for arg in argv.iter().rev() {
        sp = sp
            .checked_sub(arg.len() as u16 + 1)
            .ok_or_else(|| ExecError::Syscall("argv overflowed the stack region".into()))?;
        write_bytes(cpu, sp, arg)?;
        write_bytes(cpu, sp.wrapping_add(arg.len() as u16), &[0])?;
        addresses.push(sp);
    }
    addresses.reverse();

    sp = sp.wrapping_sub(2);
    write_u16(cpu, sp, 0)?; // argv NULL terminator
    for &address in addresses.iter().rev() {
        sp = sp.wrapping_sub(2);
        write_u16(cpu, sp, address)?;
    }
    sp = sp.wrapping_sub(2);
    #[allow(clippy::cast_possible_truncation)]
    write_u16(cpu, sp, argv.len() as u16)?;

    cpu.registers_mut().write(SP, sp);
    cpu.registers_mut().write(BP, sp);
    Ok(())
}

fn write_bytes<H: Host>(cpu: &mut Cpu<H>, address: u16, bytes: &[u8]) -> Result<(), ExecError> {
    cpu.host_mut()
        .write(address, bytes)
        .map_err(|e| ExecError::Syscall(e.0))
}

fn write_u16<H: Host>(cpu: &mut Cpu<H>, address: u16, value: u16) -> Result<(), ExecError> {
    write_bytes(cpu, address, &value.to_le_bytes())
}
