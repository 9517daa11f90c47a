use crate::instruction::Instruction;

const OP: u32 = 0x33;
const OP_IMM: u32 = 0x13;
const LOAD: u32 = 0x03;
const STORE: u32 = 0x23;
const BRANCH: u32 = 0x63;
const JAL: u32 = 0x6f;
const JALR: u32 = 0x67;
const LUI: u32 = 0x37;
const AUIPC: u32 = 0x17;
const MISC_MEM: u32 = 0x0f;
const SYSTEM: u32 = 0x73;

/// Decodes a 32-bit RV32IM instruction word.
///
/// ```text
/// 31:25  funct7
/// 24:20  rs2
/// 19:15  rs1
/// 14:12  funct3
/// 11:7   rd
/// 6:0    opcode
/// ```
///
/// Returns `None` for anything outside the supported set, including the
/// all-zero word and compressed encodings.
pub fn decode_full(word: u32) -> Option<Instruction> {
    let opcode = word & 0x7f;
    let rd = ((word >> 7) & 0x1f) as usize;
    let funct3 = (word >> 12) & 0x07;
    let rs1 = ((word >> 15) & 0x1f) as usize;
    let rs2 = ((word >> 20) & 0x1f) as usize;
    let funct7 = (word >> 25) & 0x7f;

    // Sign-extended immediates for each format.
    let i_imm = (word as i32) >> 20;
    let s_imm = ((word as i32) >> 25 << 5) | ((word >> 7) & 0x1f) as i32;
    let b_imm = (((word as i32) >> 31) << 12)
        | (((word >> 7) & 1) << 11) as i32
        | (((word >> 25) & 0x3f) << 5) as i32
        | (((word >> 8) & 0xf) << 1) as i32;
    let j_imm = (((word as i32) >> 31) << 20)
        | (((word >> 12) & 0xff) << 12) as i32
        | (((word >> 20) & 1) << 11) as i32
        | (((word >> 21) & 0x3ff) << 1) as i32;
    let u_imm = (word & 0xffff_f000) as i32;

    use Instruction::*;
    let inst = match opcode {
        OP => match (funct3, funct7) {
            (0x0, 0x00) => Add { rd, rs1, rs2 },
            (0x0, 0x20) => Sub { rd, rs1, rs2 },
            (0x1, 0x00) => Sll { rd, rs1, rs2 },
            (0x2, 0x00) => Slt { rd, rs1, rs2 },
            (0x3, 0x00) => Sltu { rd, rs1, rs2 },
            (0x4, 0x00) => Xor { rd, rs1, rs2 },
            (0x5, 0x00) => Srl { rd, rs1, rs2 },
            (0x5, 0x20) => Sra { rd, rs1, rs2 },
            (0x6, 0x00) => Or { rd, rs1, rs2 },
            (0x7, 0x00) => And { rd, rs1, rs2 },
            (0x0, 0x01) => Mul { rd, rs1, rs2 },
            (0x1, 0x01) => Mulh { rd, rs1, rs2 },
            (0x2, 0x01) => Mulhsu { rd, rs1, rs2 },
            (0x3, 0x01) => Mulhu { rd, rs1, rs2 },
            (0x4, 0x01) => Div { rd, rs1, rs2 },
            (0x5, 0x01) => Divu { rd, rs1, rs2 },
            (0x6, 0x01) => Rem { rd, rs1, rs2 },
            (0x7, 0x01) => Remu { rd, rs1, rs2 },
            _ => return None,
        },
        OP_IMM => {
            let shamt = rs2 as u8;
            match funct3 {
                0x0 => Addi { rd, rs1, imm: i_imm },
                0x2 => Slti { rd, rs1, imm: i_imm },
                0x3 => Sltiu { rd, rs1, imm: i_imm },
                0x4 => Xori { rd, rs1, imm: i_imm },
                0x6 => Ori { rd, rs1, imm: i_imm },
                0x7 => Andi { rd, rs1, imm: i_imm },
                0x1 if funct7 == 0x00 => Slli { rd, rs1, shamt },
                0x5 if funct7 == 0x00 => Srli { rd, rs1, shamt },
                0x5 if funct7 == 0x20 => Srai { rd, rs1, shamt },
                _ => return None,
            }
        }
        LOAD => match funct3 {
            0x0 => Lb { rd, rs1, offset: i_imm },
            0x1 => Lh { rd, rs1, offset: i_imm },
            0x2 => Lw { rd, rs1, offset: i_imm },
            0x4 => Lbu { rd, rs1, offset: i_imm },
            0x5 => Lhu { rd, rs1, offset: i_imm },
            _ => return None,
        },
        STORE => match funct3 {
            0x0 => Sb { rs1, rs2, offset: s_imm },
            0x1 => Sh { rs1, rs2, offset: s_imm },
            0x2 => Sw { rs1, rs2, offset: s_imm },
            _ => return None,
        },
        BRANCH => match funct3 {
            0x0 => Beq { rs1, rs2, offset: b_imm },
            0x1 => Bne { rs1, rs2, offset: b_imm },
            0x4 => Blt { rs1, rs2, offset: b_imm },
            0x5 => Bge { rs1, rs2, offset: b_imm },
            0x6 => Bltu { rs1, rs2, offset: b_imm },
            0x7 => Bgeu { rs1, rs2, offset: b_imm },
            _ => return None,
        },
        JAL => Jal { rd, offset: j_imm },
        JALR if funct3 == 0 => Jalr { rd, rs1, offset: i_imm },
        LUI => Lui { rd, imm: u_imm },
        AUIPC => Auipc { rd, imm: u_imm },
        MISC_MEM => Fence,
        SYSTEM => match word {
            0x0000_0073 => Ecall,
            0x0010_0073 => Ebreak,
            _ => return None,
        },
        _ => return None,
    };
    Some(inst)
}
