pub mod cpu;
pub mod decoder;
pub mod error;
pub mod instruction;
pub mod memory;
pub mod registers;
pub mod sys_call;
pub mod vm;

pub use error::VmError;
pub use sys_call::{HaltHandler, SyscallHandler, Trap};
pub use vm::{Exit, VM};
