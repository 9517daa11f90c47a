use compiler::{Compiler, Program, TokenStream};

/// The four compiler stages the harness drives, in order.
///
/// Stage errors are not surfaced here: a frontend encodes them in its own
/// intermediates and `generate_code` emits whatever it can.
pub trait Frontend {
    type Tokens;
    type Program;

    fn tokenize(&self, source: &[u8]) -> Self::Tokens;
    fn preprocess(&self, tokens: Self::Tokens) -> Self::Tokens;
    fn parse(&self, tokens: Self::Tokens) -> Self::Program;
    /// Never writes past `out`; returns the number of bytes written.
    fn generate_code(&self, program: &Self::Program, out: &mut [u8]) -> usize;
    /// Exact size `generate_code` would emit, if the frontend can tell.
    fn code_size(&self, program: &Self::Program) -> Option<usize>;
}

impl Frontend for Compiler<'_> {
    type Tokens = TokenStream;
    type Program = Program;

    fn tokenize(&self, source: &[u8]) -> TokenStream {
        Compiler::tokenize(self, source)
    }

    fn preprocess(&self, tokens: TokenStream) -> TokenStream {
        Compiler::preprocess(self, tokens)
    }

    fn parse(&self, tokens: TokenStream) -> Program {
        Compiler::parse(self, tokens)
    }

    fn generate_code(&self, program: &Program, out: &mut [u8]) -> usize {
        Compiler::generate_code(self, program, out)
    }

    fn code_size(&self, program: &Program) -> Option<usize> {
        Some(Compiler::code_size(self, program))
    }
}
