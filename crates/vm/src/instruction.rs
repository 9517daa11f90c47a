/// Decoded RV32IM instruction.
///
/// Register fields index `CPU::regs`; immediates and offsets are already
/// sign-extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // ===== RV32I =====
    Add { rd: usize, rs1: usize, rs2: usize },
    Sub { rd: usize, rs1: usize, rs2: usize },
    Sll { rd: usize, rs1: usize, rs2: usize },
    Slt { rd: usize, rs1: usize, rs2: usize },
    Sltu { rd: usize, rs1: usize, rs2: usize },
    Xor { rd: usize, rs1: usize, rs2: usize },
    Srl { rd: usize, rs1: usize, rs2: usize },
    Sra { rd: usize, rs1: usize, rs2: usize },
    Or { rd: usize, rs1: usize, rs2: usize },
    And { rd: usize, rs1: usize, rs2: usize },

    Addi { rd: usize, rs1: usize, imm: i32 },
    Slti { rd: usize, rs1: usize, imm: i32 },
    Sltiu { rd: usize, rs1: usize, imm: i32 },
    Xori { rd: usize, rs1: usize, imm: i32 },
    Ori { rd: usize, rs1: usize, imm: i32 },
    Andi { rd: usize, rs1: usize, imm: i32 },
    Slli { rd: usize, rs1: usize, shamt: u8 },
    Srli { rd: usize, rs1: usize, shamt: u8 },
    Srai { rd: usize, rs1: usize, shamt: u8 },

    Lb { rd: usize, rs1: usize, offset: i32 },
    Lh { rd: usize, rs1: usize, offset: i32 },
    Lw { rd: usize, rs1: usize, offset: i32 },
    Lbu { rd: usize, rs1: usize, offset: i32 },
    Lhu { rd: usize, rs1: usize, offset: i32 },
    Sb { rs1: usize, rs2: usize, offset: i32 },
    Sh { rs1: usize, rs2: usize, offset: i32 },
    Sw { rs1: usize, rs2: usize, offset: i32 },

    Beq { rs1: usize, rs2: usize, offset: i32 },
    Bne { rs1: usize, rs2: usize, offset: i32 },
    Blt { rs1: usize, rs2: usize, offset: i32 },
    Bge { rs1: usize, rs2: usize, offset: i32 },
    Bltu { rs1: usize, rs2: usize, offset: i32 },
    Bgeu { rs1: usize, rs2: usize, offset: i32 },

    Jal { rd: usize, offset: i32 },
    Jalr { rd: usize, rs1: usize, offset: i32 },
    /// `imm` is the full upper value, low 12 bits clear.
    Lui { rd: usize, imm: i32 },
    Auipc { rd: usize, imm: i32 },

    Fence,
    Ecall,
    Ebreak,

    // ===== RV32M =====
    Mul { rd: usize, rs1: usize, rs2: usize },
    Mulh { rd: usize, rs1: usize, rs2: usize },
    Mulhsu { rd: usize, rs1: usize, rs2: usize },
    Mulhu { rd: usize, rs1: usize, rs2: usize },
    Div { rd: usize, rs1: usize, rs2: usize },
    Divu { rd: usize, rs1: usize, rs2: usize },
    Rem { rd: usize, rs1: usize, rs2: usize },
    Remu { rd: usize, rs1: usize, rs2: usize },
}

impl Instruction {
    pub fn pretty_print(&self) -> String {
        fn reg(r: usize) -> &'static str {
            crate::registers::ABI_NAMES[r]
        }

        use Instruction::*;
        match *self {
            Add { rd, rs1, rs2 } => format!("add  {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
            Sub { rd, rs1, rs2 } => format!("sub  {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
            Sll { rd, rs1, rs2 } => format!("sll  {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
            Slt { rd, rs1, rs2 } => format!("slt  {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
            Sltu { rd, rs1, rs2 } => format!("sltu {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
            Xor { rd, rs1, rs2 } => format!("xor  {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
            Srl { rd, rs1, rs2 } => format!("srl  {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
            Sra { rd, rs1, rs2 } => format!("sra  {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
            Or { rd, rs1, rs2 } => format!("or   {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
            And { rd, rs1, rs2 } => format!("and  {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),

            Addi { rd, rs1, imm } => format!("addi {}, {}, {}", reg(rd), reg(rs1), imm),
            Slti { rd, rs1, imm } => format!("slti {}, {}, {}", reg(rd), reg(rs1), imm),
            Sltiu { rd, rs1, imm } => format!("sltiu {}, {}, {}", reg(rd), reg(rs1), imm),
            Xori { rd, rs1, imm } => format!("xori {}, {}, {}", reg(rd), reg(rs1), imm),
            Ori { rd, rs1, imm } => format!("ori  {}, {}, {}", reg(rd), reg(rs1), imm),
            Andi { rd, rs1, imm } => format!("andi {}, {}, {}", reg(rd), reg(rs1), imm),
            Slli { rd, rs1, shamt } => format!("slli {}, {}, {}", reg(rd), reg(rs1), shamt),
            Srli { rd, rs1, shamt } => format!("srli {}, {}, {}", reg(rd), reg(rs1), shamt),
            Srai { rd, rs1, shamt } => format!("srai {}, {}, {}", reg(rd), reg(rs1), shamt),

            Lb { rd, rs1, offset } => format!("lb   {}, {}({})", reg(rd), offset, reg(rs1)),
            Lh { rd, rs1, offset } => format!("lh   {}, {}({})", reg(rd), offset, reg(rs1)),
            Lw { rd, rs1, offset } => format!("lw   {}, {}({})", reg(rd), offset, reg(rs1)),
            Lbu { rd, rs1, offset } => format!("lbu  {}, {}({})", reg(rd), offset, reg(rs1)),
            Lhu { rd, rs1, offset } => format!("lhu  {}, {}({})", reg(rd), offset, reg(rs1)),
            Sb { rs1, rs2, offset } => format!("sb   {}, {}({})", reg(rs2), offset, reg(rs1)),
            Sh { rs1, rs2, offset } => format!("sh   {}, {}({})", reg(rs2), offset, reg(rs1)),
            Sw { rs1, rs2, offset } => format!("sw   {}, {}({})", reg(rs2), offset, reg(rs1)),

            Beq { rs1, rs2, offset } => format!("beq  {}, {}, pc{:+}", reg(rs1), reg(rs2), offset),
            Bne { rs1, rs2, offset } => format!("bne  {}, {}, pc{:+}", reg(rs1), reg(rs2), offset),
            Blt { rs1, rs2, offset } => format!("blt  {}, {}, pc{:+}", reg(rs1), reg(rs2), offset),
            Bge { rs1, rs2, offset } => format!("bge  {}, {}, pc{:+}", reg(rs1), reg(rs2), offset),
            Bltu { rs1, rs2, offset } => format!("bltu {}, {}, pc{:+}", reg(rs1), reg(rs2), offset),
            Bgeu { rs1, rs2, offset } => format!("bgeu {}, {}, pc{:+}", reg(rs1), reg(rs2), offset),

            Jal { rd, offset } => format!("jal  {}, pc{:+}", reg(rd), offset),
            Jalr { rd, rs1, offset } => format!("jalr {}, {}({})", reg(rd), offset, reg(rs1)),
            Lui { rd, imm } => format!("lui  {}, 0x{:x}", reg(rd), (imm as u32) >> 12),
            Auipc { rd, imm } => format!("auipc {}, 0x{:x}", reg(rd), (imm as u32) >> 12),

            Fence => "fence".to_string(),
            Ecall => "ecall".to_string(),
            Ebreak => "ebreak".to_string(),

            Mul { rd, rs1, rs2 } => format!("mul  {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
            Mulh { rd, rs1, rs2 } => format!("mulh {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
            Mulhsu { rd, rs1, rs2 } => format!("mulhsu {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
            Mulhu { rd, rs1, rs2 } => format!("mulhu {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
            Div { rd, rs1, rs2 } => format!("div  {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
            Divu { rd, rs1, rs2 } => format!("divu {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
            Rem { rd, rs1, rs2 } => format!("rem  {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
            Remu { rd, rs1, rs2 } => format!("remu {}, {}, {}", reg(rd), reg(rs1), reg(rs2)),
        }
    }
}
