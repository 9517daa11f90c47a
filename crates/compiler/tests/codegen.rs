use compiler::riscv;
use compiler::{Compiler, Program, code_size, generate_code};
use posix_stub::{HALT_SEQUENCE, NO_OS};

const FIXED: &[u8] = b"int main(int argc, char** argv) { return 0; }\n";

fn program(src: &[u8]) -> Program {
    let compiler = Compiler::new(&NO_OS);
    compiler.parse(compiler.preprocess(compiler.tokenize(src)))
}

fn words(code: &[u8]) -> Vec<u32> {
    code.chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect()
}

fn emit(src: &[u8]) -> Vec<u8> {
    let program = program(src);
    let mut out = vec![0u8; code_size(&program)];
    let written = generate_code(&program, &mut out);
    assert_eq!(written, out.len());
    out
}

#[test]
fn encoders_match_reference_words() {
    assert_eq!(riscv::addi(riscv::A0, riscv::ZERO, 42), 0x02a0_0513);
    assert_eq!(riscv::addi(riscv::SP, riscv::SP, -8), 0xff81_0113);
    assert_eq!(riscv::sw(riscv::RA, riscv::SP, 4), 0x0011_2223);
    assert_eq!(riscv::lw(riscv::RA, riscv::SP, 4), 0x0041_2083);
    assert_eq!(riscv::jalr(riscv::ZERO, riscv::RA, 0), 0x0000_8067);
    assert_eq!(riscv::jal(riscv::ZERO, 0), 0x0000_006f);
    assert_eq!(riscv::jal(riscv::RA, 16), 0x0100_00ef);
    assert_eq!(riscv::jal(riscv::ZERO, -8), 0xff9f_f06f);
    assert_eq!(riscv::bne(riscv::A0, riscv::ZERO, 8), 0x0005_1463);
    assert_eq!(riscv::add(riscv::A0, riscv::A1, riscv::A0), 0x00a5_8533);
    assert_eq!(riscv::sub(riscv::A0, riscv::ZERO, riscv::A0), 0x40a0_0533);
    assert_eq!(riscv::mul(riscv::A0, riscv::A1, riscv::A0), 0x02a5_8533);
    assert_eq!(riscv::lui(riscv::A0, 0x12345), 0x1234_5537);
    assert_eq!(riscv::ecall(), 0x0000_0073);
}

#[test]
fn split_imm_rounds_upper_part() {
    for v in [0x12345678, 0x7ffff800, -1, -2049, 2048, 0x800, i32::MIN] {
        let (high, low) = riscv::split_imm(v);
        let rebuilt = ((high << 12) as i32).wrapping_add(low);
        assert_eq!(rebuilt, v, "{v:#x}");
        assert!(riscv::fits_imm12(low));
    }
}

#[test]
fn entry_stub_calls_main_then_halts() {
    let code = emit(FIXED);
    let w = words(&code);
    // jal ra, main: main starts right after the four-word stub.
    assert_eq!(w[0], riscv::jal(riscv::RA, 16));
    assert_eq!(&w[1..4], &HALT_SEQUENCE);
}

#[test]
fn fixed_program_layout() {
    let w = words(&emit(FIXED));
    let main = &w[4..];
    assert_eq!(main[0], riscv::addi(riscv::SP, riscv::SP, -8));
    assert_eq!(main[1], riscv::sw(riscv::RA, riscv::SP, 4));
    assert_eq!(main[2], riscv::sw(riscv::S0, riscv::SP, 0));
    assert_eq!(main[3], riscv::addi(riscv::S0, riscv::SP, 0));
    // Two locals round up to a 16-byte frame.
    assert_eq!(main[4], riscv::addi(riscv::SP, riscv::SP, -16));
    assert_eq!(main[5], riscv::sw(riscv::A0, riscv::S0, -4));
    assert_eq!(main[6], riscv::sw(riscv::A1, riscv::S0, -8));
    assert_eq!(*main.last().unwrap(), riscv::jalr(riscv::ZERO, riscv::RA, 0));
}

#[test]
fn no_stub_without_main() {
    let w = words(&emit(b"int helper() { return 1; }"));
    assert_eq!(w[0], riscv::addi(riscv::SP, riscv::SP, -8));
    assert!(!w.windows(3).any(|s| s == HALT_SEQUENCE));
}

#[test]
fn error_items_emit_nothing() {
    let program = program(b"\x01");
    assert!(program.has_errors());
    assert_eq!(code_size(&program), 0);
    let mut out = [0xaau8; 8];
    assert_eq!(generate_code(&program, &mut out), 0);
    assert_eq!(out, [0xaa; 8]);
}

#[test]
fn invalid_function_is_skipped() {
    let with_bad = emit(b"int bad() { return nope; }\nint main() { return 0; }");
    let without = emit(b"int main() { return 0; }");
    assert_eq!(with_bad, without);
}

#[test]
fn code_size_matches_emission() {
    let src = b"int fib(int n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\n\
                int main() { int i; int s = 0; for (i = 0; i < 10; i++) s += fib(i); return s; }";
    let program = program(src);
    let size = code_size(&program);
    assert!(size > 0);
    assert_eq!(size % 4, 0);
    let mut out = vec![0u8; size + 64];
    assert_eq!(generate_code(&program, &mut out), size);
    assert!(out[size..].iter().all(|&b| b == 0));
}

#[test]
fn emission_truncates_at_region_end() {
    let program = program(FIXED);
    let full = emit(FIXED);
    let mut out = vec![0u8; 10];
    assert_eq!(generate_code(&program, &mut out), 10);
    assert_eq!(&out[..], &full[..10]);
}

#[test]
fn emission_is_deterministic() {
    assert_eq!(emit(FIXED), emit(FIXED));
}

#[test]
fn large_constants_use_lui() {
    let w = words(&emit(b"int main() { return 305419896; }"));
    let (high, low) = riscv::split_imm(305419896);
    let lui = riscv::lui(riscv::A0, high);
    let at = w.iter().position(|&x| x == lui).expect("lui a0");
    assert_eq!(w[at + 1], riscv::addi(riscv::A0, riscv::A0, low));
}
