mod util;

use ndh_cpu::error::ExitStatus;
use ndh_cpu::host::{Host, HostError, Protection};
use ndh_cpu::interpreter::Cpu;
use ndh_cpu::registers::{R0, R1, SP};
use quickcheck_macros::quickcheck;
use util::{assemble, dec_reg, end, inc_reg, mov_indirect_reg_imm8, mov_reg_imm16, push_imm16, xchg_reg_reg};

/// A flat 64KiB address space, fully mapped, with no syscalls exercised.
struct FlatHost {
    memory: Vec<u8>,
}

impl FlatHost {
    fn new() -> Self {
        Self { memory: vec![0; 0x10000] }
    }

    fn load(&mut self, address: u16, bytes: &[u8]) {
        let start = address as usize;
        self.memory[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl Host for FlatHost {
    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), HostError> {
        let start = address as usize;
        buf.copy_from_slice(&self.memory[start..start + buf.len()]);
        Ok(())
    }

    fn write(&mut self, address: u16, buf: &[u8]) -> Result<(), HostError> {
        let start = address as usize;
        self.memory[start..start + buf.len()].copy_from_slice(buf);
        Ok(())
    }

    fn protection(&self, _address: u16) -> Protection {
        Protection::ALL
    }

    fn syscall(
        &mut self,
        number: u16,
        _name: Option<&'static str>,
        _args: [u16; 4],
        _registers: &mut ndh_cpu::registers::RegisterFile,
    ) -> Result<u16, HostError> {
        Err(HostError::new(format!("unexpected syscall {number:#x}")))
    }
}

fn run(program: &[u8]) -> Cpu<FlatHost> {
    let mut host = FlatHost::new();
    host.load(0, program);
    let mut cpu = Cpu::new(host);
    let status = cpu.start(0, u16::MAX).unwrap();
    assert_eq!(status, ExitStatus::SUCCESS);
    cpu
}

/// spec §8 invariant 5: `INC(a)` followed by `DEC(a)` leaves `a` unchanged
/// modulo 2¹⁶, for every starting value including the wraparound edges.
#[quickcheck]
fn inc_then_dec_is_identity(value: u16) -> bool {
    let program = assemble([
        mov_reg_imm16(R0.index() as u8, value),
        inc_reg(R0.index() as u8),
        dec_reg(R0.index() as u8),
        end(),
    ]);
    run(&program).registers().read(R0) == value
}

/// spec §8 invariant 6: `XCHG(a,b)` is its own inverse.
#[quickcheck]
fn xchg_twice_is_identity(a: u16, b: u16) -> bool {
    let program = assemble([
        mov_reg_imm16(R0.index() as u8, a),
        mov_reg_imm16(R1.index() as u8, b),
        xchg_reg_reg(R0.index() as u8, R1.index() as u8),
        xchg_reg_reg(R0.index() as u8, R1.index() as u8),
        end(),
    ]);
    let cpu = run(&program);
    cpu.registers().read(R0) == a && cpu.registers().read(R1) == b
}

/// spec §8 invariant 2: SP is even after every PUSH/POP of a 2-byte value,
/// and is restored once the push is undone.
#[quickcheck]
fn push_pop_restores_sp_parity(value: u16) -> bool {
    let initial_sp = 0x1000u16;
    let mut host = FlatHost::new();
    host.load(0, &assemble([push_imm16(value), end()]));
    let mut cpu = Cpu::new(host);
    cpu.registers_mut().write(SP, initial_sp);
    cpu.start(0, u16::MAX).unwrap();
    let sp_after_push = cpu.registers().read(SP);
    sp_after_push == initial_sp.wrapping_sub(2) && sp_after_push % 2 == 0
}

/// S5: an indirect byte store through `[reg]` only touches the one
/// addressed byte, leaving its neighbor alone.
#[test]
fn indirect_store_touches_only_the_addressed_byte() {
    let program = assemble([
        mov_reg_imm16(R0.index() as u8, 0x1000),
        mov_indirect_reg_imm8(R0.index() as u8, 0xff),
        end(),
    ]);
    let mut host = FlatHost::new();
    host.load(0, &program);
    host.memory[0x1001] = 0xaa;
    let mut cpu = Cpu::new(host);
    cpu.start(0, u16::MAX).unwrap();
    let mut byte = [0u8; 1];
    cpu.host_mut().read(0x1000, &mut byte).unwrap();
    assert_eq!(byte[0], 0xff);
    let mut neighbor = [0u8; 1];
    cpu.host_mut().read(0x1001, &mut neighbor).unwrap();
    assert_eq!(neighbor[0], 0xaa);
}
