use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use posix_stub::HALT_SEQUENCE;

use crate::ast::{BinaryOp, Expr, Function, Program, Stmt, UnaryOp};
use crate::riscv::{self, A0, A1, RA, S0, SP, ZERO};

/// Writes the machine code for `program` into `out`.
///
/// Emission stops at the end of `out`; the return value is the number of
/// bytes written. Compare with [`code_size`] to detect truncation.
pub fn generate_code(program: &Program, out: &mut [u8]) -> usize {
    let words = assemble(program);
    let mut written = 0;
    for word in &words {
        let bytes = word.to_le_bytes();
        let n = bytes.len().min(out.len() - written);
        out[written..written + n].copy_from_slice(&bytes[..n]);
        written += n;
        if written == out.len() {
            break;
        }
    }
    written
}

/// Exact number of bytes [`generate_code`] emits for `program`.
pub fn code_size(program: &Program) -> usize {
    assemble(program).len() * 4
}

fn assemble(program: &Program) -> Vec<u32> {
    let mut asm = Assembler::default();
    let mut entries = BTreeMap::new();
    for f in program.functions() {
        let label = asm.new_label();
        entries.insert(f.name.as_str(), label);
    }

    if let Some(&main) = entries.get("main") {
        asm.jump(RA, main);
        for word in HALT_SEQUENCE {
            asm.emit(word);
        }
    }

    for f in program.functions() {
        let mut emitter = FunctionGen {
            asm: &mut asm,
            entries: &entries,
            ret: 0,
            loops: Vec::new(),
        };
        emitter.function(f);
    }
    asm.finish()
}

#[derive(Default)]
struct Assembler {
    words: Vec<u32>,
    /// Word index of each bound label.
    labels: Vec<Option<usize>>,
    /// `jal` words waiting for their target: (word index, label, rd).
    fixups: Vec<(usize, usize, u32)>,
}

impl Assembler {
    fn emit(&mut self, word: u32) {
        self.words.push(word);
    }

    fn new_label(&mut self) -> usize {
        self.labels.push(None);
        self.labels.len() - 1
    }

    fn bind(&mut self, label: usize) {
        self.labels[label] = Some(self.words.len());
    }

    fn jump(&mut self, rd: u32, label: usize) {
        self.fixups.push((self.words.len(), label, rd));
        self.emit(0);
    }

    /// Jumps to `label` when a0 is zero.
    fn jump_if_zero(&mut self, label: usize) {
        self.emit(riscv::bne(A0, ZERO, 8));
        self.jump(ZERO, label);
    }

    fn jump_if_nonzero(&mut self, label: usize) {
        self.emit(riscv::beq(A0, ZERO, 8));
        self.jump(ZERO, label);
    }

    fn li(&mut self, rd: u32, value: i32) {
        if riscv::fits_imm12(value) {
            self.emit(riscv::addi(rd, ZERO, value));
            return;
        }
        let (high, low) = riscv::split_imm(value);
        self.emit(riscv::lui(rd, high));
        if low != 0 {
            self.emit(riscv::addi(rd, rd, low));
        }
    }

    fn push_a0(&mut self) {
        self.emit(riscv::addi(SP, SP, -4));
        self.emit(riscv::sw(A0, SP, 0));
    }

    fn pop(&mut self, rd: u32) {
        self.emit(riscv::lw(rd, SP, 0));
        self.emit(riscv::addi(SP, SP, 4));
    }

    fn finish(mut self) -> Vec<u32> {
        for (at, label, rd) in core::mem::take(&mut self.fixups) {
            // Every label is bound before assembly ends.
            let target = self.labels[label].unwrap_or(at);
            let offset = (target as i64 - at as i64) * 4;
            self.words[at] = riscv::jal(rd, offset as i32);
        }
        self.words
    }
}

struct FunctionGen<'a, 'p> {
    asm: &'a mut Assembler,
    entries: &'a BTreeMap<&'p str, usize>,
    ret: usize,
    /// (continue target, break target) of each enclosing loop.
    loops: Vec<(usize, usize)>,
}

fn slot_offset(slot: usize) -> i32 {
    -4 * (slot as i32 + 1)
}

impl FunctionGen<'_, '_> {
    fn function(&mut self, f: &Function) {
        if let Some(&entry) = self.entries.get(f.name.as_str()) {
            self.asm.bind(entry);
        }
        self.ret = self.asm.new_label();

        let frame = (f.locals * 4).next_multiple_of(16) as i32;
        self.asm.emit(riscv::addi(SP, SP, -8));
        self.asm.emit(riscv::sw(RA, SP, 4));
        self.asm.emit(riscv::sw(S0, SP, 0));
        self.asm.emit(riscv::addi(S0, SP, 0));
        if frame > 0 {
            self.asm.emit(riscv::addi(SP, SP, -frame));
        }
        for i in 0..f.params {
            self.asm.emit(riscv::sw(A0 + i as u32, S0, slot_offset(i)));
        }

        for stmt in &f.body {
            self.stmt(stmt);
        }
        // Falling off the end returns 0.
        self.asm.li(A0, 0);

        self.asm.bind(self.ret);
        self.asm.emit(riscv::addi(SP, S0, 0));
        self.asm.emit(riscv::lw(RA, SP, 4));
        self.asm.emit(riscv::lw(S0, SP, 0));
        self.asm.emit(riscv::addi(SP, SP, 8));
        self.asm.emit(riscv::jalr(ZERO, RA, 0));
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Return(value) => {
                match value {
                    Some(e) => self.expr(e),
                    None => self.asm.li(A0, 0),
                }
                self.asm.jump(ZERO, self.ret);
            }
            Stmt::Expr(e) => self.expr(e),
            Stmt::Decl { slot, init } => {
                match init {
                    Some(e) => {
                        self.expr(e);
                        self.asm.emit(riscv::sw(A0, S0, slot_offset(*slot)));
                    }
                    None => self.asm.emit(riscv::sw(ZERO, S0, slot_offset(*slot))),
                }
            }
            Stmt::If { cond, then, els } => {
                let else_label = self.asm.new_label();
                self.expr(cond);
                self.asm.jump_if_zero(else_label);
                self.stmt(then);
                match els {
                    Some(els) => {
                        let end = self.asm.new_label();
                        self.asm.jump(ZERO, end);
                        self.asm.bind(else_label);
                        self.stmt(els);
                        self.asm.bind(end);
                    }
                    None => self.asm.bind(else_label),
                }
            }
            Stmt::While { cond, body } => {
                let top = self.asm.new_label();
                let end = self.asm.new_label();
                self.asm.bind(top);
                self.expr(cond);
                self.asm.jump_if_zero(end);
                self.loop_body(body, top, end);
                self.asm.jump(ZERO, top);
                self.asm.bind(end);
            }
            Stmt::DoWhile { body, cond } => {
                let top = self.asm.new_label();
                let next = self.asm.new_label();
                let end = self.asm.new_label();
                self.asm.bind(top);
                self.loop_body(body, next, end);
                self.asm.bind(next);
                self.expr(cond);
                self.asm.jump_if_nonzero(top);
                self.asm.bind(end);
            }
            Stmt::For { init, cond, step, body } => {
                if let Some(init) = init {
                    self.stmt(init);
                }
                let top = self.asm.new_label();
                let next = self.asm.new_label();
                let end = self.asm.new_label();
                self.asm.bind(top);
                if let Some(cond) = cond {
                    self.expr(cond);
                    self.asm.jump_if_zero(end);
                }
                self.loop_body(body, next, end);
                self.asm.bind(next);
                if let Some(step) = step {
                    self.expr(step);
                }
                self.asm.jump(ZERO, top);
                self.asm.bind(end);
            }
            Stmt::Break => {
                if let Some(&(_, end)) = self.loops.last() {
                    self.asm.jump(ZERO, end);
                }
            }
            Stmt::Continue => {
                if let Some(&(next, _)) = self.loops.last() {
                    self.asm.jump(ZERO, next);
                }
            }
            Stmt::Block(stmts) => {
                for s in stmts {
                    self.stmt(s);
                }
            }
            Stmt::Empty => {}
        }
    }

    fn loop_body(&mut self, body: &Stmt, next: usize, end: usize) {
        self.loops.push((next, end));
        self.stmt(body);
        self.loops.pop();
    }

    /// Evaluates `e` into a0. Temporaries live on the stack.
    fn expr(&mut self, e: &Expr) {
        match e {
            Expr::Num(v) => self.asm.li(A0, *v),
            Expr::Var(slot) => self.asm.emit(riscv::lw(A0, S0, slot_offset(*slot))),
            Expr::Assign(slot, value) => {
                self.expr(value);
                self.asm.emit(riscv::sw(A0, S0, slot_offset(*slot)));
            }
            Expr::Unary(op, operand) => {
                self.expr(operand);
                self.asm.emit(match op {
                    UnaryOp::Neg => riscv::sub(A0, ZERO, A0),
                    UnaryOp::Not => riscv::sltiu(A0, A0, 1),
                    UnaryOp::BitNot => riscv::xori(A0, A0, -1),
                });
            }
            Expr::Binary(op, lhs, rhs) => {
                self.expr(lhs);
                self.asm.push_a0();
                self.expr(rhs);
                self.asm.pop(A1);
                self.binary(*op);
            }
            Expr::LogicalAnd(lhs, rhs) => {
                let fail = self.asm.new_label();
                let end = self.asm.new_label();
                self.expr(lhs);
                self.asm.jump_if_zero(fail);
                self.expr(rhs);
                self.asm.emit(riscv::sltu(A0, ZERO, A0));
                self.asm.jump(ZERO, end);
                self.asm.bind(fail);
                self.asm.li(A0, 0);
                self.asm.bind(end);
            }
            Expr::LogicalOr(lhs, rhs) => {
                let pass = self.asm.new_label();
                let end = self.asm.new_label();
                self.expr(lhs);
                self.asm.jump_if_nonzero(pass);
                self.expr(rhs);
                self.asm.emit(riscv::sltu(A0, ZERO, A0));
                self.asm.jump(ZERO, end);
                self.asm.bind(pass);
                self.asm.li(A0, 1);
                self.asm.bind(end);
            }
            Expr::Call { name, args } => {
                let Some(&entry) = self.entries.get(name.as_str()) else {
                    // Unresolved callees are rejected by the parser.
                    self.asm.li(A0, 0);
                    return;
                };
                for arg in args {
                    self.expr(arg);
                    self.asm.push_a0();
                }
                for i in (0..args.len()).rev() {
                    self.asm.pop(A0 + i as u32);
                }
                self.asm.jump(RA, entry);
            }
        }
    }

    /// a0 = a1 `op` a0
    fn binary(&mut self, op: BinaryOp) {
        let asm = &mut *self.asm;
        match op {
            BinaryOp::Add => asm.emit(riscv::add(A0, A1, A0)),
            BinaryOp::Sub => asm.emit(riscv::sub(A0, A1, A0)),
            BinaryOp::Mul => asm.emit(riscv::mul(A0, A1, A0)),
            BinaryOp::Div => asm.emit(riscv::div(A0, A1, A0)),
            BinaryOp::Rem => asm.emit(riscv::rem(A0, A1, A0)),
            BinaryOp::BitAnd => asm.emit(riscv::and(A0, A1, A0)),
            BinaryOp::BitOr => asm.emit(riscv::or(A0, A1, A0)),
            BinaryOp::BitXor => asm.emit(riscv::xor(A0, A1, A0)),
            BinaryOp::Shl => asm.emit(riscv::sll(A0, A1, A0)),
            BinaryOp::Shr => asm.emit(riscv::sra(A0, A1, A0)),
            BinaryOp::Lt => asm.emit(riscv::slt(A0, A1, A0)),
            BinaryOp::Gt => asm.emit(riscv::slt(A0, A0, A1)),
            BinaryOp::Le => {
                asm.emit(riscv::slt(A0, A0, A1));
                asm.emit(riscv::xori(A0, A0, 1));
            }
            BinaryOp::Ge => {
                asm.emit(riscv::slt(A0, A1, A0));
                asm.emit(riscv::xori(A0, A0, 1));
            }
            BinaryOp::Eq => {
                asm.emit(riscv::xor(A0, A1, A0));
                asm.emit(riscv::sltiu(A0, A0, 1));
            }
            BinaryOp::Ne => {
                asm.emit(riscv::xor(A0, A1, A0));
                asm.emit(riscv::sltu(A0, ZERO, A0));
            }
        }
    }
}
