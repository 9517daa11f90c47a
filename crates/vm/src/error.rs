use core::fmt;

/// Why a run stopped without reaching the halt trap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VmError {
    IllegalInstruction { pc: u32, word: u32 },
    MemoryFault { addr: u32, len: u32 },
    Breakpoint { pc: u32 },
    StepLimit { pc: u32, steps: u64 },
    CodeTooLarge { len: usize, memory: usize },
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::IllegalInstruction { pc, word } => {
                write!(f, "illegal instruction 0x{:08x} at pc 0x{:08x}", word, pc)
            }
            VmError::MemoryFault { addr, len } => {
                write!(f, "memory fault: {} byte access at 0x{:08x}", len, addr)
            }
            VmError::Breakpoint { pc } => write!(f, "ebreak at pc 0x{:08x}", pc),
            VmError::StepLimit { pc, steps } => {
                write!(f, "step limit of {} reached at pc 0x{:08x}", steps, pc)
            }
            VmError::CodeTooLarge { len, memory } => {
                write!(f, "code of {} bytes does not fit in {} bytes of memory", len, memory)
            }
        }
    }
}

impl std::error::Error for VmError {}
