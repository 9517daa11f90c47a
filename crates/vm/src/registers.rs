#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register {
    Zero = 0, // x0: hardwired zero
    Ra = 1,   // x1: return address
    Sp = 2,   // x2: stack pointer
    Gp = 3,   // x3: global pointer
    Tp = 4,   // x4: thread pointer

    T0 = 5, // x5: temporary, carries the halt opcode
    T1 = 6, // x6: temporary register
    T2 = 7, // x7: temporary register

    S0 = 8, // x8: saved register / frame pointer
    S1 = 9, // x9: saved register

    A0 = 10, // x10: argc on entry, exit code on halt
    A1 = 11, // x11: argv on entry
    A2 = 12, // x12: argument 2
    A3 = 13, // x13: argument 3
    A4 = 14, // x14: argument 4
    A5 = 15, // x15: argument 5
    A6 = 16, // x16: argument 6
    A7 = 17, // x17: argument 7
}

pub const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

impl Register {
    pub fn idx(self) -> usize {
        self as usize
    }
}
