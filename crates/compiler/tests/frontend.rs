use std::cell::RefCell;
use std::collections::HashMap;

use compiler::ast::{BinaryOp, Expr, Stmt};
use compiler::{Compiler, Item, TokenKind, parse, preprocess, tokenize};
use posix_stub::{Fd, HostEnv, NO_OS, Pid, Stat, Stream};

/// Serves headers from memory, one open file at a time.
#[derive(Default)]
struct HeaderEnv {
    files: HashMap<Vec<u8>, Vec<u8>>,
    open: RefCell<Option<(Vec<u8>, usize)>>,
}

impl HeaderEnv {
    fn with(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(k, v)| (k.as_bytes().to_vec(), v.as_bytes().to_vec()))
                .collect(),
            open: RefCell::new(None),
        }
    }
}

impl HostEnv for HeaderEnv {
    fn read(&self, _fd: Fd, buf: &mut [u8]) -> isize {
        let mut open = self.open.borrow_mut();
        let Some((data, pos)) = open.as_mut() else {
            return -1;
        };
        let n = buf.len().min(data.len() - *pos);
        buf[..n].copy_from_slice(&data[*pos..*pos + n]);
        *pos += n;
        n as isize
    }
    fn write(&self, _fd: Fd, buf: &[u8]) -> isize {
        buf.len() as isize
    }
    fn open(&self, path: &[u8], _flags: i32) -> Fd {
        match self.files.get(path) {
            Some(data) => {
                *self.open.borrow_mut() = Some((data.clone(), 0));
                3
            }
            None => -1,
        }
    }
    fn close(&self, _fd: Fd) -> i32 {
        *self.open.borrow_mut() = None;
        0
    }
    fn lseek(&self, _fd: Fd, _offset: i64, _whence: i32) -> i64 {
        0
    }
    fn stat(&self, _path: &[u8], _out: &mut Stat) -> i32 {
        0
    }
    fn kill(&self, _pid: Pid, _signal: i32) -> i32 {
        0
    }
    fn getpid(&self) -> Pid {
        1
    }
    fn open_memstream(&self) -> Stream {
        Stream::NULL
    }
    fn fmemopen(&self, _buf: &mut [u8], _mode: &[u8]) -> Stream {
        Stream::NULL
    }
    fn exit(&self, code: i32) -> ! {
        panic!("exit {}", code)
    }
}

fn texts(src: &str, env: &dyn HostEnv) -> Vec<String> {
    preprocess(tokenize(src.as_bytes()), env)
        .iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.text.clone())
        .collect()
}

#[test]
fn tokenize_fixed_program() {
    let tokens = tokenize(b"int main(int argc, char** argv) { return 0; }\n");
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(kinds.len(), 17);
    assert_eq!(kinds[0], TokenKind::Ident);
    assert_eq!(*kinds.last().unwrap(), TokenKind::Eof);
    assert!(!tokens.has_error());
    assert!(tokens.tokens[0].at_bol);
    assert!(tokens.tokens[1].has_space);
}

#[test]
fn tokenize_numbers_and_chars() {
    let tokens = tokenize(b"0x1F 017 42u 'a' '\\n'");
    let values: Vec<i64> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Num)
        .map(|t| t.value)
        .collect();
    assert_eq!(values, vec![31, 15, 42, 97, 10]);
}

#[test]
fn tokenize_longest_punctuator() {
    let tokens = tokenize(b"a <<= b >> c");
    let puncts: Vec<&str> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Punct)
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(puncts, vec!["<<=", ">>"]);
}

#[test]
fn tokenize_skips_comments_and_counts_lines() {
    let tokens = tokenize(b"// one\n/* two\n three */ x");
    let x = &tokens.tokens[0];
    assert_eq!(x.text, "x");
    assert_eq!(x.line, 3);
}

#[test]
fn lexical_error_becomes_marker() {
    let tokens = tokenize(b"int x = \"open");
    let err = tokens.first_error().expect("error token");
    assert_eq!(err.text, "unterminated string literal");
    assert_eq!(tokens.tokens.last().unwrap().kind, TokenKind::Eof);

    let tokens = tokenize(b"/* never closed");
    assert!(tokens.has_error());

    let tokens = tokenize(b"int \x01x;");
    assert_eq!(tokens.first_error().unwrap().text, "unexpected character");
}

#[test]
fn object_macros_expand() {
    let out = texts("#define N 40\n#define M N + 2\nM", &NO_OS);
    assert_eq!(out, vec!["40", "+", "2"]);
}

#[test]
fn self_referential_macro_stops() {
    let out = texts("#define x x + 1\nx", &NO_OS);
    assert_eq!(out, vec!["x", "+", "1"]);
}

#[test]
fn conditionals_select_branches() {
    let src = "#ifdef __riscv\na\n#else\nb\n#endif\n#if 0\nc\n#elif __riscv_xlen\nd\n#endif\n#ifndef FOO\ne\n#endif";
    assert_eq!(texts(src, &NO_OS), vec!["a", "d", "e"]);
}

#[test]
fn nested_conditionals_inside_skipped_branch() {
    let src = "#if 0\n#ifdef __STDC__\na\n#else\nb\n#endif\n#else\nc\n#endif";
    assert_eq!(texts(src, &NO_OS), vec!["c"]);
}

#[test]
fn undef_removes_macro() {
    let out = texts("#define A 1\n#undef A\nA", &NO_OS);
    assert_eq!(out, vec!["A"]);
}

#[test]
fn include_is_empty_without_os() {
    let out = texts("#include <stdio.h>\n#include \"local.h\"\nint", &NO_OS);
    assert_eq!(out, vec!["int"]);
}

#[test]
fn include_reads_through_env() {
    let env = HeaderEnv::with(&[("answer.h", "#define ANSWER 42\n")]);
    let out = texts("#include \"answer.h\"\nANSWER", &env);
    assert_eq!(out, vec!["42"]);
}

#[test]
fn missing_include_is_error_marker() {
    let env = HeaderEnv::default();
    let tokens = preprocess(tokenize(b"#include \"nope.h\"\n"), &env);
    assert_eq!(tokens.first_error().unwrap().text, "cannot open include file nope.h");
}

#[test]
fn recursive_include_is_bounded() {
    let env = HeaderEnv::with(&[("self.h", "#include \"self.h\"\n")]);
    let tokens = preprocess(tokenize(b"#include \"self.h\"\n"), &env);
    assert_eq!(tokens.first_error().unwrap().text, "#include nested too deeply");
}

#[test]
fn directive_errors() {
    let tokens = preprocess(tokenize(b"#error stop here\n"), &NO_OS);
    assert_eq!(tokens.first_error().unwrap().text, "#error stop here");

    let tokens = preprocess(tokenize(b"#define F(x) x\n"), &NO_OS);
    assert!(tokens.has_error());

    let tokens = preprocess(tokenize(b"#ifdef A\n"), &NO_OS);
    assert_eq!(
        tokens.first_error().unwrap().text,
        "unterminated conditional directive"
    );

    let tokens = preprocess(tokenize(b"#endif\n"), &NO_OS);
    assert_eq!(tokens.first_error().unwrap().text, "stray #endif");
}

#[test]
fn lexer_error_passes_through_preprocessor() {
    let tokens = preprocess(tokenize(b"int x; \x01"), &NO_OS);
    assert_eq!(tokens.first_error().unwrap().text, "unexpected character");
}

#[test]
fn parse_fixed_program() {
    let compiler = Compiler::no_os();
    let tokens = compiler.preprocess(compiler.tokenize(b"int main(int argc, char** argv) { return 0; }\n"));
    let program = compiler.parse(tokens);
    assert!(!program.has_errors());
    let main = program.function("main").unwrap();
    assert_eq!(main.params, 2);
    assert_eq!(main.locals, 2);
    assert_eq!(main.body, vec![Stmt::Return(Some(Expr::Num(0)))]);
}

#[test]
fn parse_precedence() {
    let program = parse(tokenize(b"int f() { return 1 + 2 * 3; }"));
    let f = program.function("f").unwrap();
    let expected = Expr::Binary(
        BinaryOp::Add,
        Box::new(Expr::Num(1)),
        Box::new(Expr::Binary(
            BinaryOp::Mul,
            Box::new(Expr::Num(2)),
            Box::new(Expr::Num(3)),
        )),
    );
    assert_eq!(f.body, vec![Stmt::Return(Some(expected))]);
}

#[test]
fn parse_compound_assignment_lowers() {
    let program = parse(tokenize(b"int f(int a) { a += 2; return a; }"));
    let f = program.function("f").unwrap();
    assert_eq!(
        f.body[0],
        Stmt::Expr(Expr::Assign(
            0,
            Box::new(Expr::Binary(
                BinaryOp::Add,
                Box::new(Expr::Var(0)),
                Box::new(Expr::Num(2)),
            )),
        ))
    );
}

#[test]
fn shadowed_locals_get_fresh_slots() {
    let program = parse(tokenize(b"int f() { int x = 1; { int x = 2; } return x; }"));
    let f = program.function("f").unwrap();
    assert_eq!(f.locals, 2);
    assert_eq!(f.body[2], Stmt::Return(Some(Expr::Var(0))));
}

#[test]
fn parse_error_recovers_at_next_declaration() {
    let program = parse(tokenize(b"int bad() { return y; }\nint good() { return 1; }"));
    assert_eq!(program.items.len(), 2);
    let err = program.errors().next().unwrap();
    assert_eq!(err.message, "undeclared variable 'y'");
    assert!(program.function("good").is_some());
}

#[test]
fn undefined_call_demotes_callers() {
    let src = b"int a() { return missing(); }\nint b() { return a(); }\nint c() { return 3; }";
    let program = parse(tokenize(src));
    let errors: Vec<&str> = program.errors().map(|e| e.message.as_str()).collect();
    assert_eq!(
        errors,
        vec!["call to undefined function 'missing'", "call to undefined function 'a'"]
    );
    assert_eq!(program.functions().count(), 1);
}

#[test]
fn prototype_without_definition_is_error_when_called() {
    let program = parse(tokenize(b"int g(int);\nint main() { return g(1); }"));
    assert_eq!(
        program.errors().next().unwrap().message,
        "call to undefined function 'g'"
    );
}

#[test]
fn arity_mismatch_is_error() {
    let program = parse(tokenize(b"int g(int a) { return a; }\nint main() { return g(1, 2); }"));
    assert_eq!(
        program.errors().next().unwrap().message,
        "wrong number of arguments to 'g'"
    );
}

#[test]
fn unsupported_constructs_are_errors() {
    for src in [
        "int x;",
        "int f() { int a[4]; return 0; }",
        "int f() { return \"s\"; }",
        "struct s { int a; };",
        "int f() { break; }",
    ] {
        let program = parse(tokenize(src.as_bytes()));
        assert!(program.has_errors(), "{src}");
    }
}

#[test]
fn error_token_becomes_error_item() {
    let program = parse(tokenize(b"int main() { return 0; } \x01"));
    assert!(matches!(program.items[0], Item::Function(_)));
    assert_eq!(program.errors().next().unwrap().message, "unexpected character");
}

fn nested_parens(depth: usize) -> String {
    format!("int main() {{ return {}1{}; }}", "(".repeat(depth), ")".repeat(depth))
}

#[test]
fn moderate_nesting_parses() {
    let program = parse(tokenize(nested_parens(40).as_bytes()));
    assert!(!program.has_errors());
    assert_eq!(program.function("main").unwrap().body, vec![Stmt::Return(Some(Expr::Num(1)))]);
}

#[test]
fn deep_parentheses_are_an_error_item() {
    let program = parse(tokenize(nested_parens(10_000).as_bytes()));
    assert!(program.function("main").is_none());
    let errors: Vec<&str> = program.errors().map(|e| e.message.as_str()).collect();
    assert_eq!(errors, vec!["expression nested too deeply"]);
}

#[test]
fn deep_unary_and_assignment_chains_are_bounded() {
    let negations = format!("int main() {{ return {}1; }}", "- ".repeat(10_000));
    let assignments = format!("int main() {{ int a; return {}1; }}", "a = ".repeat(10_000));
    let calls = format!(
        "int f(int x) {{ return x; }}\nint main() {{ return {}1{}; }}",
        "f(".repeat(10_000),
        ")".repeat(10_000)
    );
    for src in [negations, assignments, calls] {
        let program = parse(tokenize(src.as_bytes()));
        assert!(program.function("main").is_none());
        assert_eq!(
            program.errors().next().unwrap().message,
            "expression nested too deeply"
        );
    }
}

#[test]
fn deep_blocks_are_an_error_item() {
    let src = format!("int main() {{ {}return 0;{} }}", "{ ".repeat(10_000), " }".repeat(10_000));
    let program = parse(tokenize(src.as_bytes()));
    assert!(program.function("main").is_none());
    assert_eq!(program.errors().next().unwrap().message, "statements nested too deeply");
}

#[test]
fn operator_chains_are_bounded_by_height() {
    let short = format!("int main() {{ return 1{}; }}", " + 1".repeat(500));
    assert!(!parse(tokenize(short.as_bytes())).has_errors());

    let long = format!("int main() {{ return 1{}; }}", " + 1".repeat(20_000));
    let program = parse(tokenize(long.as_bytes()));
    assert!(program.function("main").is_none());
    assert_eq!(
        program.errors().next().unwrap().message,
        "expression nested too deeply"
    );
}
