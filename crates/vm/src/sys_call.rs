use posix_stub::HALT_OPCODE;

use crate::memory::Memory;
use crate::registers::Register;

/// What the CPU does after an `ecall`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Trap {
    /// Continue at the next instruction.
    Resume,
    /// Stop with the given exit code.
    Halt(u32),
}

/// Trait implemented by `ecall` handlers consumed by the VM.
pub trait SyscallHandler: std::fmt::Debug {
    fn handle_ecall(&mut self, regs: &mut [u32; 32], memory: &mut Memory) -> Trap;
}

/// The no-OS trap convention: `t0 == 0` halts with the code in `a0`.
/// Any other request is answered with the neutral value 0 in `a0`.
#[derive(Debug, Default)]
pub struct HaltHandler {
    /// Non-halting calls answered so far.
    pub ignored: u32,
}

impl SyscallHandler for HaltHandler {
    fn handle_ecall(&mut self, regs: &mut [u32; 32], _memory: &mut Memory) -> Trap {
        if regs[Register::T0.idx()] == HALT_OPCODE {
            return Trap::Halt(regs[Register::A0.idx()]);
        }
        self.ignored += 1;
        regs[Register::A0.idx()] = 0;
        Trap::Resume
    }
}
