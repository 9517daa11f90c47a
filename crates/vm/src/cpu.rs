use crate::decoder::decode_full;
use crate::error::VmError;
use crate::instruction::Instruction;
use crate::memory::Memory;
use crate::sys_call::{SyscallHandler, Trap};

/// RV32IM hart: program counter, the 32 integer registers and the handler
/// that services `ecall`.
#[derive(Debug)]
pub struct CPU {
    pub pc: u32,
    /// x0 reads as zero; writes to it are dropped.
    pub regs: [u32; 32],
    /// Print every instruction before it executes.
    pub verbose: bool,
    pub syscall_handler: Box<dyn SyscallHandler>,
}

impl CPU {
    pub fn new(syscall_handler: Box<dyn SyscallHandler>) -> Self {
        Self {
            pc: 0,
            regs: [0; 32],
            verbose: false,
            syscall_handler,
        }
    }

    /// Fetches, decodes and executes one instruction.
    pub fn step(&mut self, memory: &mut Memory) -> Result<Trap, VmError> {
        let instr = self.next_instruction(memory)?;
        if self.verbose {
            println!("PC = 0x{:08x}, Instr = {}", self.pc, instr.pretty_print());
        }
        let old_pc = self.pc;
        let trap = self.execute(instr, memory)?;
        // Only advance if the instruction didn't redirect control.
        if self.pc == old_pc && !Self::is_jump(&instr) {
            self.pc = self.pc.wrapping_add(4);
        }
        Ok(trap)
    }

    pub fn next_instruction(&self, memory: &Memory) -> Result<Instruction, VmError> {
        let word = memory.load_u32(self.pc)?;
        decode_full(word).ok_or(VmError::IllegalInstruction { pc: self.pc, word })
    }

    /// Control transfers set the pc themselves, even to their own address.
    fn is_jump(instr: &Instruction) -> bool {
        matches!(
            instr,
            Instruction::Jal { .. }
                | Instruction::Jalr { .. }
                | Instruction::Beq { .. }
                | Instruction::Bne { .. }
                | Instruction::Blt { .. }
                | Instruction::Bge { .. }
                | Instruction::Bltu { .. }
                | Instruction::Bgeu { .. }
        )
    }

    fn write_reg(&mut self, rd: usize, value: u32) {
        if rd != 0 {
            self.regs[rd] = value;
        }
    }

    fn branch(&mut self, taken: bool, offset: i32) {
        self.pc = if taken {
            self.pc.wrapping_add(offset as u32)
        } else {
            self.pc.wrapping_add(4)
        };
    }

    pub fn execute(&mut self, instr: Instruction, memory: &mut Memory) -> Result<Trap, VmError> {
        use Instruction::*;
        let r = self.regs;
        let addr = |base: usize, offset: i32| r[base].wrapping_add(offset as u32);

        match instr {
            Add { rd, rs1, rs2 } => self.write_reg(rd, r[rs1].wrapping_add(r[rs2])),
            Sub { rd, rs1, rs2 } => self.write_reg(rd, r[rs1].wrapping_sub(r[rs2])),
            Sll { rd, rs1, rs2 } => self.write_reg(rd, r[rs1] << (r[rs2] & 0x1f)),
            Slt { rd, rs1, rs2 } => self.write_reg(rd, ((r[rs1] as i32) < (r[rs2] as i32)) as u32),
            Sltu { rd, rs1, rs2 } => self.write_reg(rd, (r[rs1] < r[rs2]) as u32),
            Xor { rd, rs1, rs2 } => self.write_reg(rd, r[rs1] ^ r[rs2]),
            Srl { rd, rs1, rs2 } => self.write_reg(rd, r[rs1] >> (r[rs2] & 0x1f)),
            Sra { rd, rs1, rs2 } => {
                self.write_reg(rd, ((r[rs1] as i32) >> (r[rs2] & 0x1f)) as u32)
            }
            Or { rd, rs1, rs2 } => self.write_reg(rd, r[rs1] | r[rs2]),
            And { rd, rs1, rs2 } => self.write_reg(rd, r[rs1] & r[rs2]),

            Addi { rd, rs1, imm } => self.write_reg(rd, r[rs1].wrapping_add(imm as u32)),
            Slti { rd, rs1, imm } => self.write_reg(rd, ((r[rs1] as i32) < imm) as u32),
            Sltiu { rd, rs1, imm } => self.write_reg(rd, (r[rs1] < imm as u32) as u32),
            Xori { rd, rs1, imm } => self.write_reg(rd, r[rs1] ^ imm as u32),
            Ori { rd, rs1, imm } => self.write_reg(rd, r[rs1] | imm as u32),
            Andi { rd, rs1, imm } => self.write_reg(rd, r[rs1] & imm as u32),
            Slli { rd, rs1, shamt } => self.write_reg(rd, r[rs1] << shamt),
            Srli { rd, rs1, shamt } => self.write_reg(rd, r[rs1] >> shamt),
            Srai { rd, rs1, shamt } => self.write_reg(rd, ((r[rs1] as i32) >> shamt) as u32),

            Lb { rd, rs1, offset } => {
                let v = memory.load_u8(addr(rs1, offset))? as i8 as i32 as u32;
                self.write_reg(rd, v)
            }
            Lh { rd, rs1, offset } => {
                let v = memory.load_u16(addr(rs1, offset))? as i16 as i32 as u32;
                self.write_reg(rd, v)
            }
            Lw { rd, rs1, offset } => {
                let v = memory.load_u32(addr(rs1, offset))?;
                self.write_reg(rd, v)
            }
            Lbu { rd, rs1, offset } => {
                let v = memory.load_u8(addr(rs1, offset))? as u32;
                self.write_reg(rd, v)
            }
            Lhu { rd, rs1, offset } => {
                let v = memory.load_u16(addr(rs1, offset))? as u32;
                self.write_reg(rd, v)
            }
            Sb { rs1, rs2, offset } => memory.store_u8(addr(rs1, offset), r[rs2] as u8)?,
            Sh { rs1, rs2, offset } => memory.store_u16(addr(rs1, offset), r[rs2] as u16)?,
            Sw { rs1, rs2, offset } => memory.store_u32(addr(rs1, offset), r[rs2])?,

            Beq { rs1, rs2, offset } => self.branch(r[rs1] == r[rs2], offset),
            Bne { rs1, rs2, offset } => self.branch(r[rs1] != r[rs2], offset),
            Blt { rs1, rs2, offset } => self.branch((r[rs1] as i32) < (r[rs2] as i32), offset),
            Bge { rs1, rs2, offset } => self.branch((r[rs1] as i32) >= (r[rs2] as i32), offset),
            Bltu { rs1, rs2, offset } => self.branch(r[rs1] < r[rs2], offset),
            Bgeu { rs1, rs2, offset } => self.branch(r[rs1] >= r[rs2], offset),

            Jal { rd, offset } => {
                let ret = self.pc.wrapping_add(4);
                self.pc = self.pc.wrapping_add(offset as u32);
                self.write_reg(rd, ret);
            }
            Jalr { rd, rs1, offset } => {
                let ret = self.pc.wrapping_add(4);
                self.pc = addr(rs1, offset) & !1;
                self.write_reg(rd, ret);
            }
            Lui { rd, imm } => self.write_reg(rd, imm as u32),
            Auipc { rd, imm } => self.write_reg(rd, self.pc.wrapping_add(imm as u32)),

            Fence => {}
            Ecall => {
                let trap = self.syscall_handler.handle_ecall(&mut self.regs, memory);
                self.regs[0] = 0;
                return Ok(trap);
            }
            Ebreak => return Err(VmError::Breakpoint { pc: self.pc }),

            Mul { rd, rs1, rs2 } => self.write_reg(rd, r[rs1].wrapping_mul(r[rs2])),
            Mulh { rd, rs1, rs2 } => {
                let v = (r[rs1] as i32 as i64) * (r[rs2] as i32 as i64);
                self.write_reg(rd, (v >> 32) as u32)
            }
            Mulhsu { rd, rs1, rs2 } => {
                let v = (r[rs1] as i32 as i64).wrapping_mul(r[rs2] as i64);
                self.write_reg(rd, (v >> 32) as u32)
            }
            Mulhu { rd, rs1, rs2 } => {
                let v = (r[rs1] as u64) * (r[rs2] as u64);
                self.write_reg(rd, (v >> 32) as u32)
            }
            // Division never traps: x/0 is all ones, MIN/-1 is MIN.
            Div { rd, rs1, rs2 } => {
                let (a, b) = (r[rs1] as i32, r[rs2] as i32);
                let v = if b == 0 { -1 } else { a.wrapping_div(b) };
                self.write_reg(rd, v as u32)
            }
            Divu { rd, rs1, rs2 } => {
                let v = r[rs1].checked_div(r[rs2]).unwrap_or(u32::MAX);
                self.write_reg(rd, v)
            }
            Rem { rd, rs1, rs2 } => {
                let (a, b) = (r[rs1] as i32, r[rs2] as i32);
                let v = if b == 0 { a } else { a.wrapping_rem(b) };
                self.write_reg(rd, v as u32)
            }
            Remu { rd, rs1, rs2 } => {
                let v = r[rs1].checked_rem(r[rs2]).unwrap_or(r[rs1]);
                self.write_reg(rd, v)
            }
        }
        Ok(Trap::Resume)
    }
}
