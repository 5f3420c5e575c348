//! A single decoded instruction.

use std::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::opcode::is_branch_mnemonic;
use crate::operand::Operand;

/// The decoded operand list. At most two operands; the exact count and
/// shape are determined by the opcode's [`crate::opcode::OperandKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operands {
    /// No operands (`NOP`, `END`, `RET`, `SYSCALL`).
    #[default]
    None,
    /// One operand.
    One(Operand),
    /// Two operands, destination first.
    Two(Operand, Operand),
}

impl Operands {
    /// Returns the operands as a slice-like pair, padded with `None` holes.
    #[must_use]
    pub const fn as_array(self) -> [Option<Operand>; 2] {
        match self {
            Self::None => [None, None],
            Self::One(a) => [Some(a), None],
            Self::Two(a, b) => [Some(a), Some(b)],
        }
    }
}

/// A fully decoded instruction: its address, raw encoding, and operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Instruction {
    /// Address of the opcode byte.
    pub address: u16,
    /// The opcode byte itself.
    pub opcode: u8,
    /// Assembler mnemonic, e.g. `"MOV"`.
    pub mnemonic: &'static str,
    /// Decoded operands.
    pub operands: Operands,
    /// Total length in bytes, including the opcode byte. Never exceeds
    /// `MAX_INST_LEN` (5).
    pub length: u8,
}

impl Instruction {
    /// Address of the byte immediately after this instruction.
    #[must_use]
    pub const fn next_address(&self) -> u16 {
        self.address.wrapping_add(self.length as u16)
    }

    /// For branch/call mnemonics carrying an immediate operand, the
    /// absolute target address: `next_address + immediate`, wrapping.
    /// `None` for anything else (register-operand jumps, non-branch
    /// mnemonics, or a branch with no immediate operand).
    #[must_use]
    pub fn branch_target(&self) -> Option<u16> {
        if !is_branch_mnemonic(self.mnemonic) {
            return None;
        }
        self.operands.as_array().into_iter().flatten().find_map(|op| match op {
            Operand::Immediate16(v) => Some(self.next_address().wrapping_add(v)),
            Operand::Immediate8(v) => Some(self.next_address().wrapping_add(u16::from(v))),
            Operand::Register(_) | Operand::IndirectRegister(_) => None,
        })
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}: {}", self.address, self.mnemonic)?;
        let operands = self.operands.as_array();
        let mut first = true;
        for (i, operand) in operands.into_iter().flatten().enumerate() {
            f.write_str(if first { " " } else { ", " })?;
            first = false;
            // Branch/call targets display as the resolved absolute address
            // rather than the raw relative immediate, matching how a
            // disassembler presents a jump.
            if i == 0 {
                if let Some(target) = self.branch_target() {
                    write!(f, "0x{target:04x}")?;
                    continue;
                }
            }
            write!(f, "{operand}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::R0;

    #[test]
    fn next_address_wraps() {
        let inst = Instruction {
            address: 0xfffe,
            opcode: 0,
            mnemonic: "NOP",
            operands: Operands::None,
            length: 3,
        };
        assert_eq!(inst.next_address(), 1);
    }

    #[test]
    fn branch_target_resolves_relative_immediate() {
        let inst = Instruction {
            address: 0x10,
            opcode: 18,
            mnemonic: "JMPS",
            operands: Operands::One(Operand::Immediate8(5)),
            length: 2,
        };
        assert_eq!(inst.branch_target(), Some(0x17));
    }

    #[test]
    fn branch_target_none_for_register_operand() {
        let inst = Instruction {
            address: 0x10,
            opcode: 24,
            mnemonic: "CALL",
            operands: Operands::One(Operand::Register(R0)),
            length: 2,
        };
        assert_eq!(inst.branch_target(), None);
    }

    #[test]
    fn display_non_branch() {
        let inst = Instruction {
            address: 0,
            opcode: 12,
            mnemonic: "MOV",
            operands: Operands::Two(Operand::Register(R0), Operand::Immediate16(0x1234)),
            length: 5,
        };
        assert_eq!(inst.to_string(), "0000: MOV r0, 0x1234");
    }
}
