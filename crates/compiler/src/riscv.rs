//! RV32IM instruction encoders.
//!
//! Each helper returns one little-endian instruction word. Immediates are
//! truncated to their field width; callers keep them in range.

pub const ZERO: u32 = 0;
pub const RA: u32 = 1;
pub const SP: u32 = 2;
pub const T0: u32 = 5;
pub const S0: u32 = 8;
pub const A0: u32 = 10;
pub const A1: u32 = 11;

const OP: u32 = 0x33;
const OP_IMM: u32 = 0x13;
const LOAD: u32 = 0x03;
const STORE: u32 = 0x23;
const BRANCH: u32 = 0x63;
const JAL: u32 = 0x6f;
const JALR: u32 = 0x67;
const LUI: u32 = 0x37;
const SYSTEM: u32 = 0x73;

/// Signed range of an I/S-type immediate.
pub fn fits_imm12(v: i32) -> bool {
    (-2048..=2047).contains(&v)
}

pub fn r_type(funct7: u32, rs2: u32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
    (funct7 << 25) | (rs2 << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
}

pub fn i_type(imm: i32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
    (((imm as u32) & 0xfff) << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
}

pub fn s_type(imm: i32, rs2: u32, rs1: u32, funct3: u32, opcode: u32) -> u32 {
    let imm = imm as u32;
    (((imm >> 5) & 0x7f) << 25)
        | (rs2 << 20)
        | (rs1 << 15)
        | (funct3 << 12)
        | ((imm & 0x1f) << 7)
        | opcode
}

pub fn b_type(offset: i32, rs2: u32, rs1: u32, funct3: u32) -> u32 {
    let imm = offset as u32;
    (((imm >> 12) & 1) << 31)
        | (((imm >> 5) & 0x3f) << 25)
        | (rs2 << 20)
        | (rs1 << 15)
        | (funct3 << 12)
        | (((imm >> 1) & 0xf) << 8)
        | (((imm >> 11) & 1) << 7)
        | BRANCH
}

pub fn j_type(offset: i32, rd: u32) -> u32 {
    let imm = offset as u32;
    (((imm >> 20) & 1) << 31)
        | (((imm >> 1) & 0x3ff) << 21)
        | (((imm >> 11) & 1) << 20)
        | (((imm >> 12) & 0xff) << 12)
        | (rd << 7)
        | JAL
}

pub fn u_type(imm20: u32, rd: u32, opcode: u32) -> u32 {
    ((imm20 & 0xfffff) << 12) | (rd << 7) | opcode
}

pub fn addi(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(imm, rs1, 0, rd, OP_IMM)
}

pub fn sltiu(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(imm, rs1, 3, rd, OP_IMM)
}

pub fn xori(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(imm, rs1, 4, rd, OP_IMM)
}

pub fn add(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0x00, rs2, rs1, 0, rd, OP)
}

pub fn sub(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0x20, rs2, rs1, 0, rd, OP)
}

pub fn sll(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0x00, rs2, rs1, 1, rd, OP)
}

pub fn slt(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0x00, rs2, rs1, 2, rd, OP)
}

pub fn sltu(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0x00, rs2, rs1, 3, rd, OP)
}

pub fn xor(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0x00, rs2, rs1, 4, rd, OP)
}

pub fn sra(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0x20, rs2, rs1, 5, rd, OP)
}

pub fn or(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0x00, rs2, rs1, 6, rd, OP)
}

pub fn and(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0x00, rs2, rs1, 7, rd, OP)
}

pub fn mul(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0x01, rs2, rs1, 0, rd, OP)
}

pub fn div(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0x01, rs2, rs1, 4, rd, OP)
}

pub fn rem(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0x01, rs2, rs1, 6, rd, OP)
}

pub fn lw(rd: u32, rs1: u32, offset: i32) -> u32 {
    i_type(offset, rs1, 2, rd, LOAD)
}

pub fn sw(rs2: u32, rs1: u32, offset: i32) -> u32 {
    s_type(offset, rs2, rs1, 2, STORE)
}

pub fn lui(rd: u32, imm20: u32) -> u32 {
    u_type(imm20, rd, LUI)
}

pub fn jal(rd: u32, offset: i32) -> u32 {
    j_type(offset, rd)
}

pub fn jalr(rd: u32, rs1: u32, offset: i32) -> u32 {
    i_type(offset, rs1, 0, rd, JALR)
}

pub fn beq(rs1: u32, rs2: u32, offset: i32) -> u32 {
    b_type(offset, rs2, rs1, 0)
}

pub fn bne(rs1: u32, rs2: u32, offset: i32) -> u32 {
    b_type(offset, rs2, rs1, 1)
}

pub fn ecall() -> u32 {
    SYSTEM
}

/// Splits `value` into `lui`/`addi` parts. The upper part is rounded so the
/// sign-extended low 12 bits add back exactly.
pub fn split_imm(value: i32) -> (u32, i32) {
    let low = (value << 20) >> 20;
    let high = (value.wrapping_sub(low) as u32) >> 12;
    (high, low)
}
