use compiler::riscv::{self, A0, A1, RA, SP, T0, ZERO};
use posix_stub::HALT_SEQUENCE;
use posix_stub::halt::halt_sequence_bytes;
use vm::cpu::CPU;
use vm::memory::Memory;
use vm::registers::Register;
use vm::sys_call::{HaltHandler, SyscallHandler, Trap};
use vm::{VM, VmError};

fn bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

fn run(words: &[u32]) -> Result<vm::Exit, VmError> {
    let mut vm = VM::new(64 * 1024);
    vm.load_code(&bytes(words))?;
    vm.run(10_000)
}

/// Ignores the halt convention and always resumes.
#[derive(Debug, Default)]
struct ResumeAlways {
    calls: u32,
}

impl SyscallHandler for ResumeAlways {
    fn handle_ecall(&mut self, _regs: &mut [u32; 32], _memory: &mut Memory) -> Trap {
        self.calls += 1;
        Trap::Resume
    }
}

#[test]
fn test_addi_program() {
    let code = bytes(&[
        0x0050_0093, // addi x1, x0, 5
        0x00a0_8113, // addi x2, x1, 10
    ]);
    let mut memory = Memory::new(64);
    memory.write_code(&code).unwrap();
    let mut cpu = CPU::new(Box::new(HaltHandler::default()));

    assert_eq!(cpu.step(&mut memory), Ok(Trap::Resume));
    assert_eq!(cpu.regs[1], 5);
    assert_eq!(cpu.step(&mut memory), Ok(Trap::Resume));
    assert_eq!(cpu.regs[2], 15);
    assert_eq!(cpu.pc, 8);
}

#[test]
fn halt_sequence_stops_with_a0() {
    let mut words = vec![riscv::addi(A0, ZERO, 7)];
    words.extend(HALT_SEQUENCE);
    let exit = run(&words).unwrap();
    assert_eq!(exit.exit_code, 7);
    assert_eq!(exit.pc, 8);
    assert_eq!(exit.steps, 3);
}

#[test]
fn halt_bytes_match_words() {
    let mut vm = VM::new(1024);
    vm.load_code(&halt_sequence_bytes()).unwrap();
    assert_eq!(vm.run(10).unwrap().exit_code, 0);
}

#[test]
fn instruction_after_halt_never_runs() {
    let mut words = HALT_SEQUENCE.to_vec();
    words.push(riscv::addi(A0, ZERO, 99));
    let mut vm = VM::new(1024);
    vm.load_code(&bytes(&words)).unwrap();
    vm.run(10).unwrap();
    assert_eq!(vm.reg(Register::A0), 0);
}

#[test]
fn resumed_halt_spins_in_place() {
    let mut vm = VM::with_handler(1024, Box::new(ResumeAlways::default()));
    let mut words = HALT_SEQUENCE.to_vec();
    words.push(riscv::addi(A0, ZERO, 99));
    vm.load_code(&bytes(&words)).unwrap();
    let err = vm.run(100).unwrap_err();
    assert_eq!(err, VmError::StepLimit { pc: 8, steps: 100 });
    assert_eq!(vm.reg(Register::A0), 0);
}

#[test]
fn non_halt_ecall_returns_zero() {
    let mut words = vec![
        riscv::addi(T0, ZERO, 64), // some other service
        riscv::addi(A0, ZERO, 5),
        riscv::ecall(),
        riscv::addi(A0, A0, 3),
    ];
    words.extend(HALT_SEQUENCE);
    assert_eq!(run(&words).unwrap().exit_code, 3);
}

#[test]
fn call_and_return() {
    // main: jal ra, f; halt.  f: a0 = 40 + 2; ret
    let mut words = vec![riscv::jal(RA, 16)];
    words.extend(HALT_SEQUENCE);
    words.extend([
        riscv::addi(A0, ZERO, 40),
        riscv::addi(A1, ZERO, 2),
        riscv::add(A0, A0, A1),
        riscv::jalr(ZERO, RA, 0),
    ]);
    assert_eq!(run(&words).unwrap().exit_code, 42);
}

#[test]
fn stack_round_trip() {
    let mut words = vec![
        riscv::addi(A0, ZERO, -3),
        riscv::addi(SP, SP, -4),
        riscv::sw(A0, SP, 0),
        riscv::addi(A0, ZERO, 0),
        riscv::lw(A1, SP, 0),
        riscv::sub(A0, ZERO, A1),
    ];
    words.extend(HALT_SEQUENCE);
    assert_eq!(run(&words).unwrap().exit_code, 3);
}

#[test]
fn division_edge_cases() {
    let mut words = vec![
        riscv::addi(A1, ZERO, 0),
        riscv::addi(A0, ZERO, 9),
        riscv::div(A0, A0, A1), // 9 / 0 == -1
    ];
    words.extend(HALT_SEQUENCE);
    assert_eq!(run(&words).unwrap().exit_code, u32::MAX);

    let mut words = vec![
        riscv::addi(A1, ZERO, 0),
        riscv::addi(A0, ZERO, 9),
        riscv::rem(A0, A0, A1), // 9 % 0 == 9
    ];
    words.extend(HALT_SEQUENCE);
    assert_eq!(run(&words).unwrap().exit_code, 9);
}

#[test]
fn illegal_instruction_faults() {
    assert_eq!(
        run(&[0x0000_0000]),
        Err(VmError::IllegalInstruction { pc: 0, word: 0 })
    );
}

#[test]
fn running_off_memory_faults() {
    let mut vm = VM::new(8);
    vm.load_code(&bytes(&[riscv::addi(A0, ZERO, 1), riscv::addi(A0, ZERO, 2)]))
        .unwrap();
    assert_eq!(vm.run(10), Err(VmError::MemoryFault { addr: 8, len: 4 }));
}

#[test]
fn out_of_bounds_store_faults() {
    let words = [riscv::addi(A0, ZERO, -16), riscv::sw(A0, A0, 0)];
    assert_eq!(
        run(&words),
        Err(VmError::MemoryFault { addr: 0xffff_fff0, len: 4 })
    );
}

#[test]
fn ebreak_is_reported() {
    assert_eq!(run(&[0x0010_0073]), Err(VmError::Breakpoint { pc: 0 }));
}

#[test]
fn code_larger_than_memory_is_rejected() {
    let mut vm = VM::new(4);
    assert_eq!(
        vm.load_code(&[0u8; 8]),
        Err(VmError::CodeTooLarge { len: 8, memory: 4 })
    );
}

#[test]
fn stack_starts_at_aligned_top() {
    let vm = VM::new(1000);
    assert_eq!(vm.reg(Register::Sp), 992);
}
