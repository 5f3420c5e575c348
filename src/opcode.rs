//! The static opcode table: `opcode byte -> (mnemonic, operand kind)`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shape of the operand bytes that follow an opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OperandKind {
    /// No operands.
    None,
    /// One register byte.
    OneReg,
    /// Two register bytes.
    TwoReg,
    /// One byte immediate.
    U8,
    /// One little-endian 16-bit immediate.
    U16,
    /// One flag byte, followed by the operand pair the flag selects.
    Flag,
}

/// The operand pair a [`OperandKind::Flag`] byte selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Flag {
    /// `reg, reg`
    RegReg = 0,
    /// `reg, u8`
    RegDirect08 = 1,
    /// `reg, u16`
    RegDirect16 = 2,
    /// `reg`
    Reg = 3,
    /// `u8`
    Direct08 = 4,
    /// `u16`
    Direct16 = 5,
    /// `[reg]`
    RegIndirectReg = 6,
    /// `[reg], u8`
    RegIndirectDirect08 = 7,
    /// `[reg], u16`
    RegIndirectDirect16 = 8,
    /// `[reg], [reg]`
    RegIndirectRegIndirect = 9,
    /// `reg, [reg]`
    RegRegIndirect = 10,
}

impl Flag {
    /// Decodes a flag byte, or `None` if it isn't one of the eleven defined values.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::RegReg),
            1 => Some(Self::RegDirect08),
            2 => Some(Self::RegDirect16),
            3 => Some(Self::Reg),
            4 => Some(Self::Direct08),
            5 => Some(Self::Direct16),
            6 => Some(Self::RegIndirectReg),
            7 => Some(Self::RegIndirectDirect08),
            8 => Some(Self::RegIndirectDirect16),
            9 => Some(Self::RegIndirectRegIndirect),
            10 => Some(Self::RegRegIndirect),
            _ => None,
        }
    }
}

/// An opcode table entry: the mnemonic and the shape of its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpcodeInfo {
    /// Assembler mnemonic, e.g. `"MOV"`.
    pub mnemonic: &'static str,
    /// Shape of the bytes following the opcode byte.
    pub kind: OperandKind,
}

macro_rules! opcode_table {
    ($($name:ident = $value:literal => $mnemonic:literal, $kind:expr;)+) => {
        /// Opcode byte constants, in the order spec.md §4.1 enumerates them.
        #[allow(missing_docs)]
        pub mod op {
            $(pub const $name: u8 = $value;)+
        }

        /// Looks up an opcode byte in the static table.
        #[must_use]
        pub const fn lookup(opcode: u8) -> Option<OpcodeInfo> {
            match opcode {
                $($value => Some(OpcodeInfo { mnemonic: $mnemonic, kind: $kind }),)+
                _ => None,
            }
        }
    };
}

opcode_table! {
    NOP     = 0  => "NOP",     OperandKind::None;
    END     = 1  => "END",     OperandKind::None;
    ADD     = 2  => "ADD",     OperandKind::Flag;
    SUB     = 3  => "SUB",     OperandKind::Flag;
    MUL     = 4  => "MUL",     OperandKind::Flag;
    DIV     = 5  => "DIV",     OperandKind::Flag;
    INC     = 6  => "INC",     OperandKind::Flag;
    DEC     = 7  => "DEC",     OperandKind::Flag;
    OR      = 8  => "OR",      OperandKind::Flag;
    AND     = 9  => "AND",     OperandKind::Flag;
    XOR     = 10 => "XOR",     OperandKind::Flag;
    NOT     = 11 => "NOT",     OperandKind::Flag;
    MOV     = 12 => "MOV",     OperandKind::Flag;
    XCHG    = 13 => "XCHG",    OperandKind::Flag;
    TEST    = 14 => "TEST",    OperandKind::Flag;
    CMP     = 15 => "CMP",     OperandKind::Flag;
    PUSH    = 16 => "PUSH",    OperandKind::Flag;
    POP     = 17 => "POP",     OperandKind::Flag;
    JMPS    = 18 => "JMPS",    OperandKind::Flag;
    JMPL    = 19 => "JMPL",    OperandKind::Flag;
    JZ      = 20 => "JZ",      OperandKind::Flag;
    JNZ     = 21 => "JNZ",     OperandKind::Flag;
    JA      = 22 => "JA",      OperandKind::Flag;
    JB      = 23 => "JB",      OperandKind::Flag;
    CALL    = 24 => "CALL",    OperandKind::Flag;
    RET     = 25 => "RET",     OperandKind::None;
    SYSCALL = 26 => "SYSCALL", OperandKind::None;
}

/// The branch/call mnemonics whose display target is PC-relative from the
/// *next* instruction (spec.md §4.2's display rule).
#[must_use]
pub const fn is_branch_mnemonic(mnemonic: &str) -> bool {
    matches!(
        mnemonic.as_bytes(),
        b"CALL" | b"JA" | b"JB" | b"JMPL" | b"JMPS" | b"JNZ" | b"JZ"
    )
}
