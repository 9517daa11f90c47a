use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

/// A translation unit. Parse failures are kept inline as [`Item::Error`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    pub items: Vec<Item>,
}

impl Program {
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(f) => Some(f),
            Item::Error(_) => None,
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &ParseError> {
        self.items.iter().filter_map(|item| match item {
            Item::Error(e) => Some(e),
            Item::Function(_) => None,
        })
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions().find(|f| f.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    Function(Function),
    Error(ParseError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    /// Parameters occupy the first `params` local slots.
    pub params: usize,
    /// Total number of 32-bit local slots, parameters included.
    pub locals: usize,
    pub body: Vec<Stmt>,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    Return(Option<Expr>),
    Expr(Expr),
    /// Declared locals start at zero unless initialized.
    Decl { slot: usize, init: Option<Expr> },
    If { cond: Expr, then: Box<Stmt>, els: Option<Box<Stmt>> },
    While { cond: Expr, body: Box<Stmt> },
    DoWhile { body: Box<Stmt>, cond: Expr },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    Break,
    Continue,
    Block(Vec<Stmt>),
    Empty,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Num(i32),
    Var(usize),
    Assign(usize, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    LogicalAnd(Box<Expr>, Box<Expr>),
    LogicalOr(Box<Expr>, Box<Expr>),
    Call { name: String, args: Vec<Expr> },
}
