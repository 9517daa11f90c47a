use compiler::riscv::{self, A0, A1, RA, S0, SP, ZERO};
use vm::decoder::decode_full;
use vm::instruction::Instruction;

#[test]
fn decodes_immediates_with_sign() {
    assert_eq!(
        decode_full(riscv::addi(SP, SP, -8)),
        Some(Instruction::Addi { rd: 2, rs1: 2, imm: -8 })
    );
    assert_eq!(
        decode_full(riscv::sw(A0, S0, -2000)),
        Some(Instruction::Sw { rs1: 8, rs2: 10, offset: -2000 })
    );
    assert_eq!(
        decode_full(riscv::lw(A1, S0, -4)),
        Some(Instruction::Lw { rd: 11, rs1: 8, offset: -4 })
    );
}

#[test]
fn decodes_control_flow_offsets() {
    assert_eq!(
        decode_full(riscv::jal(RA, -1024)),
        Some(Instruction::Jal { rd: 1, offset: -1024 })
    );
    assert_eq!(
        decode_full(riscv::jal(ZERO, (1 << 20) - 2)),
        Some(Instruction::Jal { rd: 0, offset: (1 << 20) - 2 })
    );
    assert_eq!(
        decode_full(riscv::bne(A0, ZERO, 8)),
        Some(Instruction::Bne { rs1: 10, rs2: 0, offset: 8 })
    );
    assert_eq!(
        decode_full(riscv::beq(A0, A1, -4096)),
        Some(Instruction::Beq { rs1: 10, rs2: 11, offset: -4096 })
    );
}

#[test]
fn decodes_upper_immediate() {
    assert_eq!(
        decode_full(riscv::lui(A0, 0x80000)),
        Some(Instruction::Lui { rd: 10, imm: i32::MIN })
    );
}

#[test]
fn decodes_m_extension() {
    assert_eq!(
        decode_full(riscv::rem(A0, A1, A0)),
        Some(Instruction::Rem { rd: 10, rs1: 11, rs2: 10 })
    );
}

#[test]
fn rejects_unknown_words() {
    assert_eq!(decode_full(0), None);
    assert_eq!(decode_full(0xffff_ffff), None);
    // Compressed `c.nop`.
    assert_eq!(decode_full(0x0001), None);
}

#[test]
fn pretty_print_uses_abi_names() {
    let instr = decode_full(riscv::addi(A0, ZERO, 42)).unwrap();
    assert_eq!(instr.pretty_print(), "addi a0, zero, 42");
}
