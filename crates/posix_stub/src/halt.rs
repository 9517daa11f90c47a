//! Process termination: the only shim operation with a real effect.
//!
//! On the zkVM target the machine is stopped with an `ecall` whose selector
//! in `t0` is [`HALT_OPCODE`]; the exit code travels in `a0`. Code
//! generators that need to end a program inline emit [`HALT_SEQUENCE`],
//! which has the same shape as [`sys_halt`].

/// `ecall` selector (in `t0`) that halts the machine.
pub const HALT_OPCODE: u32 = 0;

const REG_ZERO: u32 = 0;
const REG_T0: u32 = 5;
const OPCODE_OP_IMM: u32 = 0b001_0011;
const OPCODE_JAL: u32 = 0b110_1111;

/// `addi t0, zero, HALT_OPCODE`
pub const LOAD_HALT_OPCODE: u32 =
    (HALT_OPCODE << 20) | (REG_ZERO << 15) | (REG_T0 << 7) | OPCODE_OP_IMM;
/// `ecall`
pub const ECALL: u32 = 0x0000_0073;
/// `jal zero, 0`: jumps to itself if the trap ever comes back.
pub const SPIN: u32 = (REG_ZERO << 7) | OPCODE_JAL;

/// Machine code for an inline halt, exit code already in `a0`.
pub const HALT_SEQUENCE: [u32; 3] = [LOAD_HALT_OPCODE, ECALL, SPIN];

/// [`HALT_SEQUENCE`] as little-endian bytes.
pub fn halt_sequence_bytes() -> [u8; 12] {
    let mut out = [0u8; 12];
    for (chunk, word) in out.chunks_exact_mut(4).zip(HALT_SEQUENCE) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    out
}

#[cfg(target_arch = "riscv32")]
#[inline(never)]
pub fn sys_halt(code: i32) -> ! {
    unsafe {
        core::arch::asm!(
            "li t0, {halt}",
            "ecall",
            halt = const HALT_OPCODE,
            in("a0") code,
            out("t0") _,
            options(nostack),
        );
    }
    // A trap that returns must not let the caller continue.
    loop {}
}

#[cfg(not(target_arch = "riscv32"))]
pub fn sys_halt(code: i32) -> ! {
    panic!("sys_halt: exit code {}", code);
}
