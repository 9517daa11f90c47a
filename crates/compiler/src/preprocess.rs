use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use posix_stub::{HostEnv, O_RDONLY};

use crate::token::{Token, TokenKind, TokenStream, tokenize};

/// Deepest `#include` chain followed before giving up.
pub const MAX_INCLUDE_DEPTH: usize = 16;
/// Largest header read through the environment.
pub const MAX_INCLUDE_BYTES: usize = 1 << 20;

const READ_CHUNK: usize = 512;

const PREDEFINED: &[(&str, &str)] = &[
    ("__STDC__", "1"),
    ("__STDC_HOSTED__", "0"),
    ("__riscv", "1"),
    ("__riscv_xlen", "32"),
];

/// Expands directives and object-like macros.
///
/// Headers are fetched through `env`. On a no-OS table every `open`
/// succeeds with an empty file, so includes expand to nothing. Error tokens
/// from the lexer are passed through untouched.
pub fn preprocess(tokens: TokenStream, env: &dyn HostEnv) -> TokenStream {
    let mut pp = Preprocessor::new(env);
    let mut out = Vec::with_capacity(tokens.len());
    pp.run(tokens.tokens, 0, &mut out);
    if !pp.conds.is_empty() {
        out.push(Token::error("unterminated conditional directive", pp.last_line));
    }
    out.push(Token::eof(pp.last_line));
    TokenStream { tokens: out }
}

struct Cond {
    /// Tokens in the current branch are kept.
    active: bool,
    /// Some branch of this conditional has already been taken.
    taken: bool,
    seen_else: bool,
}

struct Preprocessor<'e> {
    env: &'e dyn HostEnv,
    macros: BTreeMap<String, Vec<Token>>,
    conds: Vec<Cond>,
    last_line: u32,
}

impl<'e> Preprocessor<'e> {
    fn new(env: &'e dyn HostEnv) -> Self {
        let mut macros = BTreeMap::new();
        for (name, body) in PREDEFINED {
            macros.insert(String::from(*name), body_tokens(body.as_bytes()));
        }
        Self {
            env,
            macros,
            conds: Vec::new(),
            last_line: 1,
        }
    }

    fn skipping(&self) -> bool {
        self.conds.iter().any(|c| !c.active)
    }

    fn run(&mut self, tokens: Vec<Token>, depth: usize, out: &mut Vec<Token>) {
        let mut i = 0;
        while i < tokens.len() {
            let tok = &tokens[i];
            self.last_line = tok.line;
            if tok.kind == TokenKind::Eof {
                break;
            }
            if tok.kind == TokenKind::Error {
                out.push(tok.clone());
                i += 1;
                continue;
            }
            if tok.is("#") && tok.at_bol {
                let start = i + 1;
                let mut end = start;
                // Error markers end the line so they still reach the output.
                while end < tokens.len()
                    && !tokens[end].at_bol
                    && !matches!(tokens[end].kind, TokenKind::Eof | TokenKind::Error)
                {
                    end += 1;
                }
                self.directive(&tokens[start..end], tok.line, depth, out);
                i = end;
                continue;
            }
            if !self.skipping() {
                let mut active = Vec::new();
                self.expand(tok, &mut active, out);
            }
            i += 1;
        }
    }

    fn expand(&self, tok: &Token, active: &mut Vec<String>, out: &mut Vec<Token>) {
        if tok.kind == TokenKind::Ident && !active.contains(&tok.text) {
            if let Some(body) = self.macros.get(&tok.text) {
                active.push(tok.text.clone());
                for (n, t) in body.iter().enumerate() {
                    let mut t = t.clone();
                    t.line = tok.line;
                    t.at_bol = false;
                    if n == 0 {
                        t.has_space = tok.has_space;
                    }
                    self.expand(&t, active, out);
                }
                active.pop();
                return;
            }
        }
        let mut tok = tok.clone();
        tok.at_bol = false;
        out.push(tok);
    }

    fn directive(&mut self, line: &[Token], at: u32, depth: usize, out: &mut Vec<Token>) {
        let Some(name) = line.first() else {
            // Null directive.
            return;
        };
        let args = &line[1..];

        match name.text.as_str() {
            "ifdef" | "ifndef" => {
                let defined = args.first().is_some_and(|t| self.macros.contains_key(&t.text));
                let keep = defined == (name.text == "ifdef");
                self.push_cond(keep);
                return;
            }
            "if" => {
                let keep = if self.skipping() { false } else { self.eval_if(args, at, out) };
                self.push_cond(keep);
                return;
            }
            "elif" => {
                let parent_active = self.conds.len() < 2
                    || self.conds[..self.conds.len() - 1].iter().all(|c| c.active);
                let taken = match self.conds.last() {
                    Some(c) if !c.seen_else => c.taken,
                    _ => {
                        out.push(Token::error("stray #elif", at));
                        return;
                    }
                };
                let keep = parent_active && !taken && self.eval_if(args, at, out);
                if let Some(c) = self.conds.last_mut() {
                    c.active = keep;
                    c.taken |= keep;
                }
                return;
            }
            "else" => {
                let parent_active = self.conds.len() < 2
                    || self.conds[..self.conds.len() - 1].iter().all(|c| c.active);
                match self.conds.last_mut() {
                    Some(c) if !c.seen_else => {
                        c.seen_else = true;
                        c.active = parent_active && !c.taken;
                        c.taken = true;
                    }
                    _ => out.push(Token::error("stray #else", at)),
                }
                return;
            }
            "endif" => {
                if self.conds.pop().is_none() {
                    out.push(Token::error("stray #endif", at));
                }
                return;
            }
            _ => {}
        }

        if self.skipping() {
            return;
        }

        match name.text.as_str() {
            "define" => self.define(args, at, out),
            "undef" => {
                if let Some(t) = args.first() {
                    self.macros.remove(&t.text);
                }
            }
            "include" => self.include(args, at, depth, out),
            "error" => {
                let text: Vec<&str> = args.iter().map(|t| t.text.as_str()).collect();
                out.push(Token::error(&format!("#error {}", text.join(" ")), at));
            }
            "pragma" | "line" => {}
            other => out.push(Token::error(&format!("unknown directive #{}", other), at)),
        }
    }

    fn push_cond(&mut self, keep: bool) {
        let keep = keep && !self.skipping();
        self.conds.push(Cond {
            active: keep,
            taken: keep,
            seen_else: false,
        });
    }

    fn define(&mut self, args: &[Token], at: u32, out: &mut Vec<Token>) {
        let Some(name) = args.first().filter(|t| t.kind == TokenKind::Ident) else {
            out.push(Token::error("macro name must be an identifier", at));
            return;
        };
        if args.get(1).is_some_and(|t| t.is("(") && !t.has_space) {
            out.push(Token::error("function-like macros are not supported", at));
            return;
        }
        self.macros.insert(name.text.clone(), args[1..].to_vec());
    }

    /// `#if N`, `#if NAME` and `#if defined NAME` / `#if defined(NAME)`.
    fn eval_if(&self, args: &[Token], at: u32, out: &mut Vec<Token>) -> bool {
        if args.first().is_some_and(|t| t.is("defined")) {
            let name = match args.get(1) {
                Some(t) if t.is("(") => args.get(2),
                other => other,
            };
            return name.is_some_and(|t| self.macros.contains_key(&t.text));
        }

        let mut expanded = Vec::new();
        let mut active = Vec::new();
        for t in args {
            self.expand(t, &mut active, &mut expanded);
        }
        match expanded.as_slice() {
            [t] if t.kind == TokenKind::Num => t.value != 0,
            // Unknown identifiers evaluate to 0.
            [t] if t.kind == TokenKind::Ident => false,
            _ => {
                out.push(Token::error("unsupported #if expression", at));
                false
            }
        }
    }

    fn include(&mut self, args: &[Token], at: u32, depth: usize, out: &mut Vec<Token>) {
        let path = match args.first() {
            Some(t) if t.kind == TokenKind::Str => t.text.clone(),
            Some(t) if t.is("<") => {
                let mut path = String::new();
                let mut closed = false;
                for t in &args[1..] {
                    if t.is(">") {
                        closed = true;
                        break;
                    }
                    path.push_str(&t.text);
                }
                if !closed {
                    out.push(Token::error("expected '>' in #include", at));
                    return;
                }
                path
            }
            _ => {
                out.push(Token::error("expected a file name after #include", at));
                return;
            }
        };

        if depth >= MAX_INCLUDE_DEPTH {
            out.push(Token::error("#include nested too deeply", at));
            return;
        }

        let Some(contents) = self.read_file(path.as_bytes()) else {
            out.push(Token::error(&format!("cannot open include file {}", path), at));
            return;
        };
        let included = tokenize(&contents);
        self.run(included.tokens, depth + 1, out);
    }

    fn read_file(&self, path: &[u8]) -> Option<Vec<u8>> {
        let fd = self.env.open(path, O_RDONLY);
        if fd < 0 {
            return None;
        }
        let mut contents = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = self.env.read(fd, &mut chunk);
            if n <= 0 {
                break;
            }
            let n = (n as usize).min(READ_CHUNK);
            contents.extend_from_slice(&chunk[..n]);
            if contents.len() >= MAX_INCLUDE_BYTES {
                break;
            }
        }
        self.env.close(fd);
        Some(contents)
    }
}

fn body_tokens(src: &[u8]) -> Vec<Token> {
    let mut tokens = tokenize(src).tokens;
    tokens.retain(|t| t.kind != TokenKind::Eof);
    tokens
}
