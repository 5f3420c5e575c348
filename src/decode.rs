//! Decodes a byte stream into [`Instruction`]s.

use crate::error::DecodeError;
use crate::instruction::{Instruction, Operands};
use crate::opcode::{self, Flag, OperandKind};
use crate::operand::Operand;
use crate::registers::Register;

/// A cursor over a byte slice that decodes one instruction at a time.
///
/// Mirrors the original disassembler's reader: a position plus small
/// `u8`/`u16`/`flag`/`reg` helpers, each advancing the cursor and failing
/// with [`DecodeError::Truncated`] on a short read.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    bytes: &'a [u8],
    base_address: u16,
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Builds a decoder over `bytes`, whose first byte is at `base_address`.
    #[must_use]
    pub const fn new(bytes: &'a [u8], base_address: u16) -> Self {
        Self {
            bytes,
            base_address,
            pos: 0,
        }
    }

    /// Current read position as an absolute address.
    #[must_use]
    pub const fn address(&self) -> u16 {
        self.base_address.wrapping_add(self.pos as u16)
    }

    /// Whether the cursor has consumed every byte in the stream.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn take_u8(&mut self) -> Result<u8, DecodeError> {
        let byte = *self.bytes.get(self.pos).ok_or(DecodeError::Truncated {
            offset: self.address(),
            needed: 1,
        })?;
        self.pos += 1;
        Ok(byte)
    }

    fn take_u16(&mut self) -> Result<u16, DecodeError> {
        let offset = self.address();
        let lo = self.take_u8().map_err(|_| DecodeError::Truncated { offset, needed: 2 })?;
        let hi = self.take_u8().map_err(|_| DecodeError::Truncated { offset, needed: 2 })?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    fn take_reg(&mut self) -> Result<Register, DecodeError> {
        let offset = self.address();
        let byte = self.take_u8()?;
        Register::try_from(byte).map_err(|_| DecodeError::UnknownRegister { register: byte, offset })
    }

    fn take_flag(&mut self) -> Result<Flag, DecodeError> {
        let offset = self.address();
        let byte = self.take_u8()?;
        Flag::from_byte(byte).ok_or(DecodeError::UnknownFlag { flag: byte, offset })
    }

    /// Decodes the operand pair a flag byte selects.
    fn decode_flag_operands(&mut self, flag: Flag) -> Result<Operands, DecodeError> {
        Ok(match flag {
            Flag::RegReg => Operands::Two(
                Operand::Register(self.take_reg()?),
                Operand::Register(self.take_reg()?),
            ),
            Flag::RegDirect08 => Operands::Two(
                Operand::Register(self.take_reg()?),
                Operand::Immediate8(self.take_u8()?),
            ),
            Flag::RegDirect16 => Operands::Two(
                Operand::Register(self.take_reg()?),
                Operand::Immediate16(self.take_u16()?),
            ),
            Flag::Reg => Operands::One(Operand::Register(self.take_reg()?)),
            Flag::Direct08 => Operands::One(Operand::Immediate8(self.take_u8()?)),
            Flag::Direct16 => Operands::One(Operand::Immediate16(self.take_u16()?)),
            Flag::RegIndirectReg => Operands::Two(
                Operand::IndirectRegister(self.take_reg()?),
                Operand::Register(self.take_reg()?),
            ),
            Flag::RegIndirectDirect08 => Operands::Two(
                Operand::IndirectRegister(self.take_reg()?),
                Operand::Immediate8(self.take_u8()?),
            ),
            Flag::RegIndirectDirect16 => Operands::Two(
                Operand::IndirectRegister(self.take_reg()?),
                Operand::Immediate16(self.take_u16()?),
            ),
            Flag::RegIndirectRegIndirect => Operands::Two(
                Operand::IndirectRegister(self.take_reg()?),
                Operand::IndirectRegister(self.take_reg()?),
            ),
            Flag::RegRegIndirect => Operands::Two(
                Operand::Register(self.take_reg()?),
                Operand::IndirectRegister(self.take_reg()?),
            ),
        })
    }

    /// Decodes exactly one instruction at the current position.
    ///
    /// # Errors
    /// Returns [`DecodeError::UnknownOpcode`], [`DecodeError::UnknownFlag`]
    /// or [`DecodeError::Truncated`] without advancing past the failing byte.
    pub fn decode_one(&mut self) -> Result<Instruction, DecodeError> {
        let address = self.address();
        let start = self.pos;
        let opcode = self.take_u8()?;
        let info = opcode::lookup(opcode).ok_or(DecodeError::UnknownOpcode { opcode, offset: address })?;

        let operands = match info.kind {
            OperandKind::None => Operands::None,
            OperandKind::OneReg => Operands::One(Operand::Register(self.take_reg()?)),
            OperandKind::TwoReg => Operands::Two(
                Operand::Register(self.take_reg()?),
                Operand::Register(self.take_reg()?),
            ),
            OperandKind::U8 => Operands::One(Operand::Immediate8(self.take_u8()?)),
            OperandKind::U16 => Operands::One(Operand::Immediate16(self.take_u16()?)),
            OperandKind::Flag => {
                let flag = self.take_flag()?;
                self.decode_flag_operands(flag)?
            }
        };

        let length = (self.pos - start) as u8;
        Ok(Instruction {
            address,
            opcode,
            mnemonic: info.mnemonic,
            operands,
            length,
        })
    }
}

/// Decodes every instruction in `bytes`, stopping at `END` or end of input.
///
/// # Errors
/// Returns the first [`DecodeError`] encountered; instructions decoded
/// before the failure are returned alongside it.
pub fn decode_all(bytes: &[u8], base_address: u16) -> (Vec<Instruction>, Option<DecodeError>) {
    let mut decoder = Decoder::new(bytes, base_address);
    let mut instructions = Vec::new();
    loop {
        if decoder.is_empty() {
            return (instructions, None);
        }
        match decoder.decode_one() {
            Ok(inst) => {
                let is_end = inst.mnemonic == "END";
                instructions.push(inst);
                if is_end {
                    return (instructions, None);
                }
            }
            Err(err) => return (instructions, Some(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::op;

    #[test]
    fn decode_nop_and_end() {
        let bytes = [op::NOP, op::END];
        let (insts, err) = decode_all(&bytes, 0);
        assert!(err.is_none());
        assert_eq!(insts.len(), 2);
        assert_eq!(insts[0].mnemonic, "NOP");
        assert_eq!(insts[0].length, 1);
        assert_eq!(insts[1].mnemonic, "END");
    }

    #[test]
    fn decode_mov_reg_direct16() {
        // MOV r0, 0x1234 via flag RegDirect16
        let bytes = [op::MOV, Flag::RegDirect16 as u8, 0, 0x34, 0x12];
        let mut decoder = Decoder::new(&bytes, 0x8000);
        let inst = decoder.decode_one().unwrap();
        assert_eq!(inst.mnemonic, "MOV");
        assert_eq!(inst.length, 5);
        assert_eq!(inst.address, 0x8000);
        match inst.operands {
            Operands::Two(Operand::Register(r), Operand::Immediate16(v)) => {
                assert_eq!(r.index(), 0);
                assert_eq!(v, 0x1234);
            }
            other => panic!("unexpected operands: {other:?}"),
        }
    }

    #[test]
    fn unknown_opcode_errors() {
        let bytes = [0xff];
        let mut decoder = Decoder::new(&bytes, 0);
        assert_eq!(
            decoder.decode_one(),
            Err(DecodeError::UnknownOpcode { opcode: 0xff, offset: 0 })
        );
    }

    #[test]
    fn unknown_flag_errors() {
        let bytes = [op::MOV, 0xff];
        let mut decoder = Decoder::new(&bytes, 0);
        assert_eq!(
            decoder.decode_one(),
            Err(DecodeError::UnknownFlag { flag: 0xff, offset: 1 })
        );
    }

    #[test]
    fn truncated_operand_errors() {
        let bytes = [op::MOV, Flag::RegDirect16 as u8, 0, 0x34];
        let mut decoder = Decoder::new(&bytes, 0);
        assert_eq!(
            decoder.decode_one(),
            Err(DecodeError::Truncated { offset: 3, needed: 2 })
        );
    }

    #[test]
    fn decode_all_stops_at_end() {
        let bytes = [op::NOP, op::END, op::NOP];
        let (insts, err) = decode_all(&bytes, 0);
        assert!(err.is_none());
        assert_eq!(insts.len(), 2);
    }
}
