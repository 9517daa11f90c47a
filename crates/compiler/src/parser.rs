use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::ast::{BinaryOp, Expr, Function, Item, ParseError, Program, Stmt, UnaryOp};
use crate::token::{Token, TokenKind, TokenStream};

/// Register-passed arguments on RV32.
pub const MAX_PARAMS: usize = 8;
/// Keeps every frame offset inside a 12-bit immediate.
pub const MAX_LOCALS: usize = 500;
/// Deepest chain of nested parentheses, unary operators, calls, assignments
/// and statements accepted before giving up.
pub const MAX_NESTING: usize = 64;
/// Tallest expression tree accepted, operator chains included.
pub const MAX_EXPR_HEIGHT: usize = 1024;

const TYPE_KEYWORDS: &[&str] = &["int", "char", "short", "long", "void", "signed", "unsigned"];
const UNSUPPORTED: &[&str] = &[
    "switch", "case", "default", "goto", "struct", "union", "enum", "typedef", "static",
    "extern", "const", "volatile", "sizeof", "float", "double",
];

type PResult<T> = Result<T, ParseError>;

/// Builds a [`Program`] from preprocessed tokens.
///
/// Errors never abort the parse: the failing declaration becomes an
/// [`Item::Error`] and parsing resumes at the next top-level declaration.
/// Functions that call something undefined are demoted to errors as well.
pub fn parse(tokens: TokenStream) -> Program {
    let mut toks = tokens.tokens;
    if toks.last().is_none_or(|t| t.kind != TokenKind::Eof) {
        let line = toks.last().map_or(1, |t| t.line);
        toks.push(Token::eof(line));
    }
    let mut parser = Parser {
        toks,
        pos: 0,
        depth: 0,
        nesting: 0,
        height: 0,
        scopes: Vec::new(),
        locals: 0,
        loops: 0,
        prototypes: BTreeMap::new(),
    };
    let mut items = Vec::new();
    while !parser.at_eof() {
        if parser.peek().kind == TokenKind::Error {
            let tok = parser.advance();
            items.push(Item::Error(ParseError { message: tok.text, line: tok.line }));
            continue;
        }
        match parser.top_level() {
            Ok(Some(function)) => items.push(Item::Function(function)),
            Ok(None) => {}
            Err(e) => {
                items.push(Item::Error(e));
                parser.recover();
            }
        }
    }
    resolve_calls(&mut items);
    Program { items }
}

struct Parser {
    toks: Vec<Token>,
    pos: usize,
    /// Brace nesting, used to resynchronize after an error.
    depth: usize,
    /// Parser recursion, bounded by [`MAX_NESTING`].
    nesting: usize,
    /// Expression tree height on the current path.
    height: usize,
    scopes: Vec<Vec<(String, usize)>>,
    locals: usize,
    loops: usize,
    /// Declared arity of every prototype and definition seen so far.
    prototypes: BTreeMap<String, usize>,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.toks[self.pos.min(self.toks.len() - 1)]
    }

    fn peek_at(&self, ahead: usize) -> &Token {
        &self.toks[(self.pos + ahead).min(self.toks.len() - 1)]
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if tok.kind != TokenKind::Eof {
            if tok.is("{") {
                self.depth += 1;
            } else if tok.is("}") {
                self.depth = self.depth.saturating_sub(1);
            }
            self.pos += 1;
        }
        tok
    }

    fn error<T>(&self, message: &str) -> PResult<T> {
        let tok = self.peek();
        if tok.kind == TokenKind::Error {
            return Err(ParseError { message: tok.text.clone(), line: tok.line });
        }
        Err(ParseError { message: String::from(message), line: tok.line })
    }

    /// Runs `f` one level deeper, failing once nesting passes [`MAX_NESTING`].
    fn nested<T>(&mut self, what: &str, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.nesting >= MAX_NESTING || self.height >= MAX_EXPR_HEIGHT {
            return self.error(&format!("{} nested too deeply", what));
        }
        self.nesting += 1;
        self.height += 1;
        let result = f(self);
        self.nesting -= 1;
        self.height -= 1;
        result
    }

    /// One more link in an operator chain. The caller restores `height`.
    fn grow(&mut self) -> PResult<()> {
        if self.height >= MAX_EXPR_HEIGHT {
            return self.error("expression nested too deeply");
        }
        self.height += 1;
        Ok(())
    }

    fn consume(&mut self, s: &str) -> bool {
        if self.peek().is(s) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, s: &str) -> PResult<()> {
        if self.consume(s) {
            Ok(())
        } else {
            self.error(&format!("expected '{}'", s))
        }
    }

    fn ident(&mut self) -> PResult<Token> {
        let tok = self.peek();
        if tok.kind == TokenKind::Ident && !is_keyword(&tok.text) {
            Ok(self.advance())
        } else {
            self.error("expected an identifier")
        }
    }

    /// Skips to the end of the declaration that failed.
    fn recover(&mut self) {
        self.scopes.clear();
        self.loops = 0;
        self.nesting = 0;
        self.height = 0;
        loop {
            if self.at_eof() {
                self.depth = 0;
                return;
            }
            if self.peek().kind == TokenKind::Error {
                // Already reported by the failing production.
                self.advance();
                self.depth = 0;
                return;
            }
            let tok = self.advance();
            if self.depth == 0 && (tok.is("}") || tok.is(";")) {
                return;
            }
        }
    }

    fn is_type_start(&self) -> bool {
        TYPE_KEYWORDS.iter().any(|k| self.peek().is(k))
    }

    fn base_type(&mut self) -> PResult<()> {
        if !self.is_type_start() {
            return self.error("expected a type");
        }
        while self.is_type_start() {
            self.advance();
        }
        while self.consume("*") {}
        Ok(())
    }

    fn declare(&mut self, name: &Token) -> PResult<usize> {
        if self.locals >= MAX_LOCALS {
            return Err(ParseError {
                message: String::from("too many local variables"),
                line: name.line,
            });
        }
        let slot = self.locals;
        self.locals += 1;
        if let Some(scope) = self.scopes.last_mut() {
            scope.push((name.text.clone(), slot));
        }
        Ok(slot)
    }

    fn lookup(&self, name: &str) -> Option<usize> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(n, _)| n == name)
            .map(|(_, slot)| *slot)
    }

    fn top_level(&mut self) -> PResult<Option<Function>> {
        let line = self.peek().line;
        if let Some(word) = UNSUPPORTED.iter().find(|k| self.peek().is(k)) {
            return self.error(&format!("'{}' is not supported", word));
        }
        self.base_type()?;
        let name = self.ident()?;
        if !self.peek().is("(") {
            return self.error("global variables are not supported");
        }
        self.advance();

        self.scopes = alloc::vec![Vec::new()];
        self.locals = 0;
        self.loops = 0;

        let mut params = 0;
        let no_params = self.peek().is(")")
            || (self.peek().is("void") && self.peek_at(1).is(")"));
        if self.peek().is("void") && self.peek_at(1).is(")") {
            self.advance();
        }
        if !no_params {
            loop {
                self.base_type()?;
                if self.peek().kind == TokenKind::Ident {
                    let pname = self.ident()?;
                    if self.consume("[") {
                        self.expect("]")?;
                    }
                    self.declare(&pname)?;
                } else {
                    // Unnamed parameter in a prototype.
                    self.locals += 1;
                }
                params += 1;
                if params > MAX_PARAMS {
                    return self.error("too many parameters");
                }
                if !self.consume(",") {
                    break;
                }
            }
        }
        self.expect(")")?;

        if let Some(&arity) = self.prototypes.get(&name.text) {
            if arity != params {
                return self.error(&format!("conflicting declaration of '{}'", name.text));
            }
        }
        self.prototypes.insert(name.text.clone(), params);

        if self.consume(";") {
            return Ok(None);
        }
        if !self.peek().is("{") {
            return self.error("expected '{' or ';'");
        }
        let body = self.block()?;
        self.scopes.clear();

        Ok(Some(Function {
            name: name.text,
            params,
            locals: self.locals,
            body,
            line,
        }))
    }

    fn block(&mut self) -> PResult<Vec<Stmt>> {
        self.expect("{")?;
        self.scopes.push(Vec::new());
        let mut stmts = Vec::new();
        while !self.peek().is("}") {
            if self.at_eof() {
                return self.error("expected '}'");
            }
            stmts.push(self.statement()?);
        }
        self.expect("}")?;
        self.scopes.pop();
        Ok(stmts)
    }

    fn statement(&mut self) -> PResult<Stmt> {
        self.nested("statements", Self::statement_body)
    }

    fn statement_body(&mut self) -> PResult<Stmt> {
        if self.peek().kind == TokenKind::Error {
            return self.error("");
        }
        if self.peek().is("{") {
            return Ok(Stmt::Block(self.block()?));
        }
        if self.is_type_start() {
            return self.declaration();
        }
        if self.consume(";") {
            return Ok(Stmt::Empty);
        }
        if self.consume("return") {
            if self.consume(";") {
                return Ok(Stmt::Return(None));
            }
            let value = self.expr()?;
            self.expect(";")?;
            return Ok(Stmt::Return(Some(value)));
        }
        if self.consume("if") {
            self.expect("(")?;
            let cond = self.expr()?;
            self.expect(")")?;
            let then = Box::new(self.statement()?);
            let els = if self.consume("else") {
                Some(Box::new(self.statement()?))
            } else {
                None
            };
            return Ok(Stmt::If { cond, then, els });
        }
        if self.consume("while") {
            self.expect("(")?;
            let cond = self.expr()?;
            self.expect(")")?;
            let body = Box::new(self.loop_body()?);
            return Ok(Stmt::While { cond, body });
        }
        if self.consume("do") {
            let body = Box::new(self.loop_body()?);
            self.expect("while")?;
            self.expect("(")?;
            let cond = self.expr()?;
            self.expect(")")?;
            self.expect(";")?;
            return Ok(Stmt::DoWhile { body, cond });
        }
        if self.consume("for") {
            return self.for_statement();
        }
        if self.peek().is("break") || self.peek().is("continue") {
            let tok = self.advance();
            if self.loops == 0 {
                return Err(ParseError {
                    message: format!("'{}' outside of a loop", tok.text),
                    line: tok.line,
                });
            }
            self.expect(";")?;
            return Ok(if tok.is("break") { Stmt::Break } else { Stmt::Continue });
        }
        if let Some(word) = UNSUPPORTED.iter().find(|k| self.peek().is(k)) {
            return self.error(&format!("'{}' is not supported", word));
        }
        let e = self.expr()?;
        self.expect(";")?;
        Ok(Stmt::Expr(e))
    }

    fn loop_body(&mut self) -> PResult<Stmt> {
        self.loops += 1;
        let body = self.statement();
        self.loops -= 1;
        body
    }

    fn for_statement(&mut self) -> PResult<Stmt> {
        self.expect("(")?;
        self.scopes.push(Vec::new());
        let init = if self.consume(";") {
            None
        } else if self.is_type_start() {
            Some(Box::new(self.declaration()?))
        } else {
            let e = self.expr()?;
            self.expect(";")?;
            Some(Box::new(Stmt::Expr(e)))
        };
        let cond = if self.peek().is(";") { None } else { Some(self.expr()?) };
        self.expect(";")?;
        let step = if self.peek().is(")") { None } else { Some(self.expr()?) };
        self.expect(")")?;
        let body = Box::new(self.loop_body()?);
        self.scopes.pop();
        Ok(Stmt::For { init, cond, step, body })
    }

    fn declaration(&mut self) -> PResult<Stmt> {
        while self.is_type_start() {
            self.advance();
        }
        let mut decls = Vec::new();
        loop {
            while self.consume("*") {}
            let name = self.ident()?;
            if self.peek().is("[") {
                return self.error("arrays are not supported");
            }
            let slot = self.declare(&name)?;
            let init = if self.consume("=") { Some(self.assign()?) } else { None };
            decls.push(Stmt::Decl { slot, init });
            if !self.consume(",") {
                break;
            }
        }
        self.expect(";")?;
        if decls.len() == 1 {
            if let Some(decl) = decls.pop() {
                return Ok(decl);
            }
        }
        Ok(Stmt::Block(decls))
    }

    fn expr(&mut self) -> PResult<Expr> {
        self.assign()
    }

    fn assign(&mut self) -> PResult<Expr> {
        let lhs = self.logical_or()?;
        let compound = [
            ("+=", BinaryOp::Add),
            ("-=", BinaryOp::Sub),
            ("*=", BinaryOp::Mul),
            ("/=", BinaryOp::Div),
            ("%=", BinaryOp::Rem),
            ("&=", BinaryOp::BitAnd),
            ("|=", BinaryOp::BitOr),
            ("^=", BinaryOp::BitXor),
            ("<<=", BinaryOp::Shl),
            (">>=", BinaryOp::Shr),
        ];
        if self.peek().is("=") {
            let slot = self.assignable(&lhs)?;
            self.advance();
            let rhs = self.nested("expression", Self::assign)?;
            return Ok(Expr::Assign(slot, Box::new(rhs)));
        }
        for (punct, op) in compound {
            if self.peek().is(punct) {
                let slot = self.assignable(&lhs)?;
                self.advance();
                let rhs = self.nested("expression", Self::assign)?;
                return Ok(Expr::Assign(
                    slot,
                    Box::new(Expr::Binary(op, Box::new(Expr::Var(slot)), Box::new(rhs))),
                ));
            }
        }
        Ok(lhs)
    }

    fn assignable(&self, e: &Expr) -> PResult<usize> {
        match e {
            Expr::Var(slot) => Ok(*slot),
            _ => self.error("expression is not assignable"),
        }
    }

    fn logical_or(&mut self) -> PResult<Expr> {
        let mark = self.height;
        let chain = self.logical_or_chain();
        self.height = mark;
        chain
    }

    fn logical_or_chain(&mut self) -> PResult<Expr> {
        let mut lhs = self.logical_and()?;
        while self.consume("||") {
            self.grow()?;
            let rhs = self.logical_and()?;
            lhs = Expr::LogicalOr(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn logical_and(&mut self) -> PResult<Expr> {
        let mark = self.height;
        let chain = self.logical_and_chain();
        self.height = mark;
        chain
    }

    fn logical_and_chain(&mut self) -> PResult<Expr> {
        let mut lhs = self.binary(0)?;
        while self.consume("&&") {
            self.grow()?;
            let rhs = self.binary(0)?;
            lhs = Expr::LogicalAnd(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    /// Left-associative binary operators, loosest level first.
    fn binary(&mut self, level: usize) -> PResult<Expr> {
        const LEVELS: &[&[(&str, BinaryOp)]] = &[
            &[("|", BinaryOp::BitOr)],
            &[("^", BinaryOp::BitXor)],
            &[("&", BinaryOp::BitAnd)],
            &[("==", BinaryOp::Eq), ("!=", BinaryOp::Ne)],
            &[
                ("<", BinaryOp::Lt),
                ("<=", BinaryOp::Le),
                (">", BinaryOp::Gt),
                (">=", BinaryOp::Ge),
            ],
            &[("<<", BinaryOp::Shl), (">>", BinaryOp::Shr)],
            &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
            &[("*", BinaryOp::Mul), ("/", BinaryOp::Div), ("%", BinaryOp::Rem)],
        ];
        if level == LEVELS.len() {
            return self.unary();
        }
        let mark = self.height;
        let chain = self.binary_chain(LEVELS[level], level);
        self.height = mark;
        chain
    }

    fn binary_chain(&mut self, ops: &[(&str, BinaryOp)], level: usize) -> PResult<Expr> {
        let mut lhs = self.binary(level + 1)?;
        'outer: loop {
            for (punct, op) in ops {
                if self.consume(punct) {
                    self.grow()?;
                    let rhs = self.binary(level + 1)?;
                    lhs = Expr::Binary(*op, Box::new(lhs), Box::new(rhs));
                    continue 'outer;
                }
            }
            return Ok(lhs);
        }
    }

    fn unary(&mut self) -> PResult<Expr> {
        if self.consume("+") {
            return self.nested("expression", Self::unary);
        }
        for (punct, op) in [("-", UnaryOp::Neg), ("!", UnaryOp::Not), ("~", UnaryOp::BitNot)] {
            if self.consume(punct) {
                let operand = self.nested("expression", Self::unary)?;
                return Ok(Expr::Unary(op, Box::new(operand)));
            }
        }
        for (punct, op) in [("++", BinaryOp::Add), ("--", BinaryOp::Sub)] {
            if self.consume(punct) {
                let operand = self.nested("expression", Self::unary)?;
                let slot = self.assignable(&operand)?;
                return Ok(step(slot, op));
            }
        }
        self.postfix()
    }

    fn postfix(&mut self) -> PResult<Expr> {
        let e = self.primary()?;
        for (punct, op, undo) in [
            ("++", BinaryOp::Add, BinaryOp::Sub),
            ("--", BinaryOp::Sub, BinaryOp::Add),
        ] {
            if self.peek().is(punct) {
                let slot = self.assignable(&e)?;
                self.advance();
                // `x++` is `(x += 1) - 1`.
                return Ok(Expr::Binary(undo, Box::new(step(slot, op)), Box::new(Expr::Num(1))));
            }
        }
        Ok(e)
    }

    fn primary(&mut self) -> PResult<Expr> {
        if self.consume("(") {
            let e = self.nested("expression", Self::expr)?;
            self.expect(")")?;
            return Ok(e);
        }
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Num => {
                self.advance();
                Ok(Expr::Num(tok.value as i32))
            }
            TokenKind::Str => self.error("string literals are not supported"),
            TokenKind::Ident if !is_keyword(&tok.text) => {
                self.advance();
                if self.consume("(") {
                    let mut args = Vec::new();
                    if !self.consume(")") {
                        loop {
                            args.push(self.nested("expression", Self::assign)?);
                            if !self.consume(",") {
                                break;
                            }
                        }
                        self.expect(")")?;
                    }
                    if args.len() > MAX_PARAMS {
                        return self.error("too many arguments");
                    }
                    return Ok(Expr::Call { name: tok.text, args });
                }
                match self.lookup(&tok.text) {
                    Some(slot) => Ok(Expr::Var(slot)),
                    None => Err(ParseError {
                        message: format!("undeclared variable '{}'", tok.text),
                        line: tok.line,
                    }),
                }
            }
            _ => self.error("expected an expression"),
        }
    }
}

fn step(slot: usize, op: BinaryOp) -> Expr {
    Expr::Assign(
        slot,
        Box::new(Expr::Binary(op, Box::new(Expr::Var(slot)), Box::new(Expr::Num(1)))),
    )
}

fn is_keyword(word: &str) -> bool {
    const CONTROL: &[&str] = &["return", "if", "else", "while", "do", "for", "break", "continue"];
    TYPE_KEYWORDS.contains(&word) || UNSUPPORTED.contains(&word) || CONTROL.contains(&word)
}

/// Demotes functions whose calls cannot be linked: the callee is not defined
/// in this unit or is called with the wrong number of arguments. Repeats
/// until no more functions change, since a demoted callee breaks its callers.
fn resolve_calls(items: &mut [Item]) {
    loop {
        let defined: BTreeMap<String, usize> = items
            .iter()
            .filter_map(|item| match item {
                Item::Function(f) => Some((f.name.clone(), f.params)),
                Item::Error(_) => None,
            })
            .collect();

        let mut changed = false;
        for item in items.iter_mut() {
            let Item::Function(f) = item else {
                continue;
            };
            let mut problem = None;
            for stmt in &f.body {
                check_stmt(stmt, &defined, &mut problem);
            }
            let line = f.line;
            if let Some(message) = problem {
                *item = Item::Error(ParseError { message, line });
                changed = true;
            }
        }
        if !changed {
            return;
        }
    }
}

fn check_stmt(stmt: &Stmt, defined: &BTreeMap<String, usize>, problem: &mut Option<String>) {
    match stmt {
        Stmt::Return(Some(e)) | Stmt::Expr(e) => check_expr(e, defined, problem),
        Stmt::Decl { init: Some(e), .. } => check_expr(e, defined, problem),
        Stmt::If { cond, then, els } => {
            check_expr(cond, defined, problem);
            check_stmt(then, defined, problem);
            if let Some(els) = els {
                check_stmt(els, defined, problem);
            }
        }
        Stmt::While { cond, body } | Stmt::DoWhile { body, cond } => {
            check_expr(cond, defined, problem);
            check_stmt(body, defined, problem);
        }
        Stmt::For { init, cond, step, body } => {
            if let Some(init) = init {
                check_stmt(init, defined, problem);
            }
            if let Some(cond) = cond {
                check_expr(cond, defined, problem);
            }
            if let Some(step) = step {
                check_expr(step, defined, problem);
            }
            check_stmt(body, defined, problem);
        }
        Stmt::Block(stmts) => {
            for s in stmts {
                check_stmt(s, defined, problem);
            }
        }
        Stmt::Return(None)
        | Stmt::Decl { init: None, .. }
        | Stmt::Break
        | Stmt::Continue
        | Stmt::Empty => {}
    }
}

fn check_expr(e: &Expr, defined: &BTreeMap<String, usize>, problem: &mut Option<String>) {
    if problem.is_some() {
        return;
    }
    match e {
        Expr::Num(_) | Expr::Var(_) => {}
        Expr::Assign(_, v) | Expr::Unary(_, v) => check_expr(v, defined, problem),
        Expr::Binary(_, l, r) | Expr::LogicalAnd(l, r) | Expr::LogicalOr(l, r) => {
            check_expr(l, defined, problem);
            check_expr(r, defined, problem);
        }
        Expr::Call { name, args } => {
            match defined.get(name) {
                Some(&arity) if arity == args.len() => {}
                Some(_) => {
                    *problem = Some(format!("wrong number of arguments to '{}'", name));
                    return;
                }
                None => {
                    *problem = Some(format!("call to undefined function '{}'", name));
                    return;
                }
            }
            for a in args {
                check_expr(a, defined, problem);
            }
        }
    }
}
