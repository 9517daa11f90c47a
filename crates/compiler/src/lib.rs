//! A small C frontend emitting RV32IM machine code.
//!
//! The pipeline is four independent stages: [`tokenize`], [`preprocess`],
//! [`parse`] and [`generate_code`]. Failures never abort a stage; they are
//! carried forward as error tokens or error items so the caller decides what
//! to do with partial results.
#![no_std]

extern crate alloc;

pub mod ast;
pub mod codegen;
pub mod parser;
pub mod preprocess;
pub mod riscv;
pub mod token;

pub use ast::{Item, ParseError, Program};
pub use codegen::{code_size, generate_code};
pub use parser::parse;
pub use preprocess::preprocess;
pub use token::{Token, TokenKind, TokenStream, tokenize};

use posix_stub::HostEnv;

/// The frontend bound to the environment it reads headers from.
#[derive(Clone, Copy)]
pub struct Compiler<'e> {
    env: &'e dyn HostEnv,
}

impl<'e> Compiler<'e> {
    pub fn new(env: &'e dyn HostEnv) -> Self {
        Self { env }
    }

    /// Uses the neutral table; every include expands to nothing.
    pub fn no_os() -> Compiler<'static> {
        Compiler { env: &posix_stub::NO_OS }
    }

    pub fn env(&self) -> &'e dyn HostEnv {
        self.env
    }

    pub fn tokenize(&self, source: &[u8]) -> TokenStream {
        tokenize(source)
    }

    pub fn preprocess(&self, tokens: TokenStream) -> TokenStream {
        preprocess(tokens, self.env)
    }

    pub fn parse(&self, tokens: TokenStream) -> Program {
        parse(tokens)
    }

    pub fn generate_code(&self, program: &Program, out: &mut [u8]) -> usize {
        generate_code(program, out)
    }

    pub fn code_size(&self, program: &Program) -> usize {
        code_size(program)
    }
}
