//! Small byte-assembling helpers shared by the integration tests.
//!
//! There's no assembler in this crate (nor in the source material it's
//! grounded on); tests build programs directly as byte vectors using these
//! helpers, the same granularity `burjui-risky`'s `tests/util.rs` builds
//! RISC-V words at.

use ndh_cpu::opcode::{op, Flag};

/// `MOV reg, imm16`
pub fn mov_reg_imm16(dst: u8, value: u16) -> Vec<u8> {
    let mut bytes = vec![op::MOV, Flag::RegDirect16 as u8, dst];
    bytes.extend_from_slice(&value.to_le_bytes());
    bytes
}

/// `MOV reg, imm8`
pub fn mov_reg_imm8(dst: u8, value: u8) -> Vec<u8> {
    vec![op::MOV, Flag::RegDirect08 as u8, dst, value]
}

/// `MOV reg, reg`
pub fn mov_reg_reg(dst: u8, src: u8) -> Vec<u8> {
    vec![op::MOV, Flag::RegReg as u8, dst, src]
}

/// `ADD reg, reg`
pub fn add_reg_reg(dst: u8, src: u8) -> Vec<u8> {
    vec![op::ADD, Flag::RegReg as u8, dst, src]
}

/// `CMP reg, reg`
pub fn cmp_reg_reg(a: u8, b: u8) -> Vec<u8> {
    vec![op::CMP, Flag::RegReg as u8, a, b]
}

/// `INC reg`
pub fn inc_reg(dst: u8) -> Vec<u8> {
    vec![op::INC, Flag::Reg as u8, dst]
}

/// `DEC reg`
pub fn dec_reg(dst: u8) -> Vec<u8> {
    vec![op::DEC, Flag::Reg as u8, dst]
}

/// `XCHG reg, reg`
pub fn xchg_reg_reg(a: u8, b: u8) -> Vec<u8> {
    vec![op::XCHG, Flag::RegReg as u8, a, b]
}

/// `PUSH imm16`
pub fn push_imm16(value: u16) -> Vec<u8> {
    let mut bytes = vec![op::PUSH, Flag::Direct16 as u8];
    bytes.extend_from_slice(&value.to_le_bytes());
    bytes
}

/// `MOV [reg], imm8`
pub fn mov_indirect_reg_imm8(dst: u8, value: u8) -> Vec<u8> {
    vec![op::MOV, Flag::RegIndirectDirect08 as u8, dst, value]
}

/// `JZ imm8` (relative)
pub fn jz_imm8(offset: u8) -> Vec<u8> {
    vec![op::JZ, Flag::Direct08 as u8, offset]
}

/// `JMPS imm8` (relative)
pub fn jmps_imm8(offset: u8) -> Vec<u8> {
    vec![op::JMPS, Flag::Direct08 as u8, offset]
}

/// `PUSH reg`
pub fn push_reg(src: u8) -> Vec<u8> {
    vec![op::PUSH, Flag::Reg as u8, src]
}

/// `POP reg`
pub fn pop_reg(dst: u8) -> Vec<u8> {
    vec![op::POP, Flag::Reg as u8, dst]
}

/// `CALL imm16` (relative)
pub fn call_imm16(offset: u16) -> Vec<u8> {
    let mut bytes = vec![op::CALL, Flag::Direct16 as u8];
    bytes.extend_from_slice(&offset.to_le_bytes());
    bytes
}

/// `RET`
pub fn ret() -> Vec<u8> {
    vec![op::RET]
}

/// `SYSCALL`
pub fn syscall() -> Vec<u8> {
    vec![op::SYSCALL]
}

/// `NOP`
pub fn nop() -> Vec<u8> {
    vec![op::NOP]
}

/// `END`
pub fn end() -> Vec<u8> {
    vec![op::END]
}

/// Concatenates a sequence of instruction byte vectors into one program.
pub fn assemble(parts: impl IntoIterator<Item = Vec<u8>>) -> Vec<u8> {
    parts.into_iter().flatten().collect()
}
