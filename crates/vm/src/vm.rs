use crate::cpu::CPU;
use crate::error::VmError;
use crate::memory::Memory;
use crate::registers::{ABI_NAMES, Register};
use crate::sys_call::{HaltHandler, SyscallHandler, Trap};

/// How a run ended at the halt trap.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Exit {
    pub exit_code: u32,
    pub steps: u64,
    /// Address of the halting `ecall`.
    pub pc: u32,
}

pub struct VM {
    pub cpu: CPU,
    pub memory: Memory,
}

impl VM {
    /// A machine with `memory_size` bytes that understands the halt trap.
    pub fn new(memory_size: usize) -> Self {
        Self::with_handler(memory_size, Box::new(HaltHandler::default()))
    }

    pub fn with_handler(memory_size: usize, handler: Box<dyn SyscallHandler>) -> Self {
        let memory = Memory::new(memory_size);
        let mut cpu = CPU::new(handler);
        cpu.regs[Register::Sp.idx()] = memory.stack_top();
        Self { cpu, memory }
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.cpu.verbose = verbose;
    }

    /// Copies a code buffer to address 0 and points the pc at it.
    pub fn load_code(&mut self, code: &[u8]) -> Result<(), VmError> {
        self.memory.write_code(code)?;
        self.cpu.pc = 0;
        if self.cpu.verbose {
            println!("loaded {} bytes of code, sp = 0x{:08x}", code.len(), self.cpu.regs[Register::Sp.idx()]);
        }
        Ok(())
    }

    /// Entry arguments for `main(argc, argv)`.
    pub fn set_args(&mut self, argc: u32, argv: u32) {
        self.set_reg_u32(Register::A0, argc);
        self.set_reg_u32(Register::A1, argv);
    }

    pub fn set_reg_u32(&mut self, reg: Register, value: u32) {
        self.cpu.regs[reg.idx()] = value;
    }

    pub fn reg(&self, reg: Register) -> u32 {
        self.cpu.regs[reg.idx()]
    }

    /// Runs until the halt trap, a fault, or `max_steps` instructions.
    pub fn run(&mut self, max_steps: u64) -> Result<Exit, VmError> {
        let mut steps = 0;
        while steps < max_steps {
            let pc = self.cpu.pc;
            let trap = self.cpu.step(&mut self.memory)?;
            steps += 1;
            if let Trap::Halt(exit_code) = trap {
                if self.cpu.verbose {
                    println!("halt: exit code {} after {} steps", exit_code, steps);
                }
                return Ok(Exit { exit_code, steps, pc });
            }
        }
        Err(VmError::StepLimit {
            pc: self.cpu.pc,
            steps,
        })
    }

    pub fn dump_registers(&self) {
        println!("--- Register Dump ---");
        for (i, name) in ABI_NAMES.iter().enumerate() {
            let val = self.cpu.regs[i];
            println!("x{:02} ({:<4}) = 0x{:08x} ({})", i, name, val, val);
        }
        println!("pc           = 0x{:08x}", self.cpu.pc);
        println!("------------------------");
    }
}
