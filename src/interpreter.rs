//! The fetch-decode-execute loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::decode::Decoder;
use crate::error::{ExecError, ExitStatus};
use crate::host::Host;
use crate::operand::Operand;
use crate::registers::{RegisterFile, AF, BF, PC, R0, R1, R2, R3, R4, SP, ZF};

/// Maximum byte length of a single instruction (opcode + flag + two 16-bit
/// operands), used to size the fetch buffer.
pub const MAX_INST_LEN: usize = 5;

/// A cloneable, thread-safe handle that lets another thread request a stop
/// without touching the interpreter's own state directly (§5: the one
/// operation on [`Cpu`] that's safe to call across threads).
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Requests that the interpreter stop at its next opportunity (after
    /// the current instruction's code hook fires).
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// The execution engine: registers plus a host-supplied memory bus.
pub struct Cpu<H: Host> {
    registers: RegisterFile,
    host: H,
    stop_requested: Arc<AtomicBool>,
}

impl<H: Host> Cpu<H> {
    /// Builds a CPU with a zeroed register file over the given host.
    pub fn new(host: H) -> Self {
        Self {
            registers: RegisterFile::new(),
            host,
            stop_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The register file.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// The register file, mutably — for a loader to set up initial state.
    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.registers
    }

    /// The host.
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// A cross-thread-safe handle that can request a stop.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop_requested))
    }

    /// Requests a stop from the calling thread.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::Relaxed);
    }

    /// Exposes the CPU itself for host-side introspection (registers,
    /// pending stop flag); a no-op surface without the `debug` feature.
    #[cfg(feature = "debug")]
    #[must_use]
    pub const fn backend(&self) -> &Self {
        self
    }

    /// No introspection surface without the `debug` feature.
    #[cfg(not(feature = "debug"))]
    #[must_use]
    pub const fn backend(&self) {}

    fn read_u8(&mut self, address: u16) -> Result<u8, ExecError> {
        let mut buf = [0u8; 1];
        self.host
            .read(address, &mut buf)
            .map_err(|_| ExecError::MemoryFault { address })?;
        Ok(buf[0])
    }

    fn write_u8(&mut self, address: u16, value: u8) -> Result<(), ExecError> {
        self.host
            .write(address, &[value])
            .map_err(|_| ExecError::MemoryFault { address })
    }

    fn read_u16(&mut self, address: u16) -> Result<u16, ExecError> {
        let mut buf = [0u8; 2];
        self.host
            .read(address, &mut buf)
            .map_err(|_| ExecError::MemoryFault { address })?;
        Ok(u16::from_le_bytes(buf))
    }

    fn write_u16(&mut self, address: u16, value: u16) -> Result<(), ExecError> {
        self.host
            .write(address, &value.to_le_bytes())
            .map_err(|_| ExecError::MemoryFault { address })
    }

    /// Reads an operand's current value. Indirect operands dereference one
    /// byte through the host's memory. A `None` operand — a mnemonic's
    /// handler asking for an operand the instruction's flag byte didn't
    /// supply — reads as 0, matching a missing argument falling through
    /// every case of a type switch.
    fn get(&mut self, operand: Option<Operand>) -> Result<u16, ExecError> {
        match operand {
            Some(Operand::Register(r)) => Ok(self.registers.read(r)),
            Some(Operand::IndirectRegister(r)) => {
                let address = self.registers.read(r);
                self.read_u8(address).map(u16::from)
            }
            Some(Operand::Immediate8(v)) => Ok(u16::from(v)),
            Some(Operand::Immediate16(v)) => Ok(v),
            None => Ok(0),
        }
    }

    /// Writes an operand's value. Indirect operands write one byte through
    /// the host's memory, truncating the value. A `None` operand is a no-op.
    fn set(&mut self, operand: Option<Operand>, value: u16) -> Result<(), ExecError> {
        match operand {
            Some(Operand::Register(r)) => {
                self.registers.write(r, value);
                Ok(())
            }
            Some(Operand::IndirectRegister(r)) => {
                let address = self.registers.read(r);
                #[allow(clippy::cast_possible_truncation)]
                self.write_u8(address, value as u8)
            }
            Some(Operand::Immediate8(_) | Operand::Immediate16(_)) => {
                unreachable!("decoder never produces an immediate as a destination operand")
            }
            None => Ok(()),
        }
    }

    fn set_with_zf(&mut self, operand: Option<Operand>, value: u16) -> Result<(), ExecError> {
        self.registers.set_zf(value);
        self.set(operand, value)
    }

    fn dispatch_syscall(&mut self) -> Result<(), ExecError> {
        let number = self.registers.read(R0);
        let name = crate::arch::syscall_name(number);
        let args = [
            self.registers.read(R1),
            self.registers.read(R2),
            self.registers.read(R3),
            self.registers.read(R4),
        ];
        log::trace!("syscall {number:#06x} ({name:?}) args={args:?}");
        let result = self
            .host
            .syscall(number, name, args, &mut self.registers)
            .map_err(|e| ExecError::Syscall(e.0))?;
        self.registers.write(R0, result);
        Ok(())
    }

    /// Runs until the program counter equals `until`, the program executes
    /// `END`, a stop is requested, or an error occurs.
    ///
    /// # Errors
    /// Returns [`ExecError`] on a decode failure, memory fault, division by
    /// zero, or host syscall failure.
    #[allow(clippy::too_many_lines)]
    pub fn start(&mut self, begin: u16, until: u16) -> Result<ExitStatus, ExecError> {
        self.stop_requested.store(false, Ordering::Relaxed);
        let mut pc = begin;
        self.registers.write(PC, pc);
        self.host.on_block(pc, &self.registers);

        // `jump` carries the relative offset of the branch taken by the
        // previous instruction, if any. The top of the loop re-fires
        // on_block for it before clearing it, same as a fresh block entry;
        // this means a taken jump's block-entry hook runs twice (once when
        // the jump is computed at the bottom of the loop, again here before
        // the flag is cleared). A `CALL`/`RET` sets `PC` directly and
        // restarts the loop without going through that path, firing
        // on_block exactly once.
        let mut jump: Option<u16> = None;

        while pc != until {
            pc = self.registers.read(PC);
            if jump.is_some() {
                self.host.on_block(pc, &self.registers);
            }
            jump = None;

            if !self.host.protection(pc).exec {
                return Err(ExecError::MemoryFault { address: pc });
            }
            let mut buf = [0u8; MAX_INST_LEN];
            self.host
                .read(pc, &mut buf)
                .map_err(|_| ExecError::MemoryFault { address: pc })?;
            let instr = Decoder::new(&buf, pc).decode_one()?;

            self.host.on_code(pc, &self.registers);

            if self.stop_requested.load(Ordering::Relaxed) {
                break;
            }

            if instr.mnemonic == "END" {
                return Ok(ExitStatus::SUCCESS);
            }

            let [a, b] = instr.operands.as_array();

            match instr.mnemonic {
                "NOP" => {}
                "ADD" => {
                    let result = self.get(a)?.wrapping_add(self.get(b)?);
                    self.set_with_zf(a, result)?;
                }
                "SUB" => {
                    let result = self.get(a)?.wrapping_sub(self.get(b)?);
                    self.set_with_zf(a, result)?;
                }
                "MUL" => {
                    let result = self.get(a)?.wrapping_mul(self.get(b)?);
                    self.set_with_zf(a, result)?;
                }
                "DIV" => {
                    let divisor = self.get(b)?;
                    if divisor == 0 {
                        return Err(ExecError::DivByZero);
                    }
                    let result = self.get(a)? / divisor;
                    self.set_with_zf(a, result)?;
                }
                "NOT" => {
                    let result = !self.get(a)?;
                    self.set_with_zf(a, result)?;
                }
                "OR" => {
                    let result = self.get(a)? | self.get(b)?;
                    self.set_with_zf(a, result)?;
                }
                "AND" => {
                    let result = self.get(a)? & self.get(b)?;
                    self.set_with_zf(a, result)?;
                }
                "XOR" => {
                    let result = self.get(a)? ^ self.get(b)?;
                    self.set_with_zf(a, result)?;
                }
                "MOV" => {
                    let value = self.get(b)?;
                    self.set(a, value)?;
                }
                "XCHG" => {
                    let (va, vb) = (self.get(a)?, self.get(b)?);
                    self.set(a, vb)?;
                    self.set(b, va)?;
                }
                "INC" => {
                    let result = self.get(a)?.wrapping_add(1);
                    self.set(a, result)?;
                }
                "DEC" => {
                    let result = self.get(a)?.wrapping_sub(1);
                    self.set(a, result)?;
                }
                "POP" => {
                    let sp = self.registers.read(SP);
                    let value = self.read_u16(sp)?;
                    self.registers.write(SP, sp.wrapping_add(2));
                    self.set(a, value)?;
                }
                "PUSH" => {
                    let value = self.get(a)?;
                    let size: u16 = if matches!(a, Some(Operand::Immediate8(_))) { 1 } else { 2 };
                    let sp = self.registers.read(SP).wrapping_sub(size);
                    self.registers.write(SP, sp);
                    if size == 1 {
                        #[allow(clippy::cast_possible_truncation)]
                        self.write_u8(sp, value as u8)?;
                    } else {
                        self.write_u16(sp, value)?;
                    }
                }
                "TEST" => {
                    // ZF = 1 iff both operands are zero.
                    let (va, vb) = (self.get(a)?, self.get(b)?);
                    self.registers.set_zf(u16::from(va != 0 || vb != 0));
                }
                "CMP" => {
                    // ZF = 1 iff equal; AF/BF record greater-than/less-than.
                    let (va, vb) = (self.get(a)?, self.get(b)?);
                    self.registers.set_zf(u16::from(va != vb));
                    if va == vb {
                        self.registers.write(AF, 0);
                        self.registers.write(BF, 0);
                    } else if va > vb {
                        self.registers.write(AF, 1);
                        self.registers.write(BF, 0);
                    } else {
                        self.registers.write(AF, 0);
                        self.registers.write(BF, 1);
                    }
                }
                "JMPS" | "JMPL" => {
                    jump = Some(self.get(a)?);
                }
                "JZ" => {
                    if self.registers.read(ZF) == 1 {
                        jump = Some(self.get(a)?);
                    }
                }
                "JNZ" => {
                    if self.registers.read(ZF) != 1 {
                        jump = Some(self.get(a)?);
                    }
                }
                "JA" => {
                    if self.registers.read(AF) != 1 {
                        jump = Some(self.get(a)?);
                    }
                }
                "JB" => {
                    if self.registers.read(BF) != 1 {
                        jump = Some(self.get(a)?);
                    }
                }
                "CALL" => {
                    let return_address = pc.wrapping_add(u16::from(instr.length));
                    let sp = self.registers.read(SP).wrapping_sub(2);
                    self.registers.write(SP, sp);
                    self.write_u16(sp, return_address)?;

                    // A register operand is an absolute jump; a 16-bit
                    // immediate is a relative offset like the unconditional
                    // jumps. Anything else (indirect, 8-bit immediate, or a
                    // missing operand) matches neither and leaves `jump`
                    // unset, so execution just falls through to the next
                    // instruction after pushing the return address.
                    match a {
                        Some(Operand::Register(r)) => {
                            let target = self.registers.read(r);
                            self.registers.write(PC, target);
                            self.host.on_block(target, &self.registers);
                            continue;
                        }
                        Some(Operand::Immediate16(_)) => jump = Some(self.get(a)?),
                        _ => {}
                    }
                }
                "RET" => {
                    let sp = self.registers.read(SP);
                    let target = self.read_u16(sp)?;
                    self.registers.write(SP, sp.wrapping_add(2));
                    self.registers.write(PC, target);
                    self.host.on_block(target, &self.registers);
                    continue;
                }
                "SYSCALL" => self.dispatch_syscall()?,
                mnemonic => return Err(ExecError::Unimplemented { mnemonic }),
            }

            if let Some(offset) = jump {
                pc = pc.wrapping_add(u16::from(instr.length)).wrapping_add(offset);
                self.host.on_block(pc, &self.registers);
            } else {
                pc = pc.wrapping_add(u16::from(instr.length));
            }
            self.registers.write(PC, pc);
        }

        Ok(ExitStatus::SUCCESS)
    }
}
