// File: src/compiler.rs
//
// Single-pass Pratt-parsing bytecode compiler for the Ruff programming
// language. Drives the scanner token-by-token and emits directly into a
// `Chunk` — there is no intermediate AST (spec §4.D).

use crate::chunk::OpCode;
use crate::errors::{RuffError, SourceLocation};
use crate::interner::Interner;
use crate::lexer::{Scanner, Token, TokenType};
use crate::value::{Function, Value};
use std::rc::Rc;

const MAX_LOCALS: usize = 256;
const MAX_UPVALUES: usize = 256;
const MAX_CONSTANTS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call => Precedence::Primary,
            Precedence::Primary => Precedence::Primary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    Script,
    Function,
}

/// A compile-time local: its lexeme and the scope depth it belongs to.
/// `depth == None` is the `UNINITIALIZED` sentinel from spec §3, replaced
/// by `mark_initialized` once the initializer has been compiled.
struct LocalVar {
    name: String,
    depth: Option<usize>,
    /// Set once some nested function resolves this local as an upvalue
    /// (spec §4.D step 2: "mark the local captured"). Lets the VM know,
    /// via the slot being the target of an open upvalue, that popping it
    /// out of scope must close that upvalue rather than just drop it.
    captured: bool,
}

/// A compile-time upvalue descriptor living on the *capturing* function's
/// compiler state.
#[derive(Clone, Copy)]
struct CompileUpvalue {
    index: u8,
    is_local: bool,
}

/// One entry in the stack of function compilers: the function currently
/// being built, plus its locals/upvalues/scope bookkeeping.
struct FunctionState {
    function: Function,
    kind: FunctionKind,
    locals: Vec<LocalVar>,
    upvalues: Vec<CompileUpvalue>,
    scope_depth: usize,
}

impl FunctionState {
    fn new(kind: FunctionKind, name: Rc<str>) -> Self {
        // Slot 0 is reserved for the running closure itself (spec §3:
        // "the name of the function at slot 0 ... is never read by user
        // code — slot 0 is reserved").
        let locals = vec![LocalVar { name: String::new(), depth: Some(0), captured: false }];
        Self { function: Function::new(name), kind, locals, upvalues: Vec::new(), scope_depth: 0 }
    }
}

type ParseFn<'src, 'a> = fn(&mut Compiler<'src, 'a>, bool);

struct ParseRule<'src, 'a> {
    prefix: Option<ParseFn<'src, 'a>>,
    infix: Option<ParseFn<'src, 'a>>,
    precedence: Precedence,
}

pub struct Compiler<'src, 'a> {
    scanner: Scanner<'src>,
    current: Token<'src>,
    previous: Token<'src>,
    had_error: bool,
    panic_mode: bool,
    errors: Vec<RuffError>,
    interner: &'a mut Interner,
    functions: Vec<FunctionState>,
}

/// Compiles `source` into the top-level script `Function`. Discards the
/// whole result if any compile-time error occurred (spec §7).
pub fn compile(source: &str, interner: &mut Interner) -> Result<Rc<Function>, Vec<RuffError>> {
    let mut compiler = Compiler {
        scanner: Scanner::new(source),
        current: Token { kind: TokenType::Eof, lexeme: "", line: 1 },
        previous: Token { kind: TokenType::Eof, lexeme: "", line: 1 },
        had_error: false,
        panic_mode: false,
        errors: Vec::new(),
        interner,
        functions: vec![FunctionState::new(FunctionKind::Script, Rc::from(""))],
    };

    compiler.advance();
    while !compiler.check(TokenType::Eof) {
        compiler.declaration();
    }
    compiler.consume(TokenType::Eof, "Expect end of expression.");

    let state = compiler.end_function();
    if compiler.had_error {
        Err(compiler.errors)
    } else {
        Ok(Rc::new(state.function))
    }
}

impl<'src, 'a> Compiler<'src, 'a> {
    // ---- token stream -----------------------------------------------

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind != TokenType::Error {
                break;
            }
            self.error_at_current(self.current.lexeme);
        }
    }

    fn check(&self, kind: TokenType) -> bool {
        self.current.kind == kind
    }

    fn match_token(&mut self, kind: TokenType) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    fn consume(&mut self, kind: TokenType, message: &str) {
        if self.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    // ---- error reporting ----------------------------------------------

    fn error_at_current(&mut self, message: &str) {
        let token = self.current;
        self.error_at(token, message);
    }

    fn error(&mut self, message: &str) {
        let token = self.previous;
        self.error_at(token, message);
    }

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;
        let what = if token.kind == TokenType::Eof {
            " at end".to_string()
        } else if token.kind == TokenType::Error {
            String::new()
        } else {
            format!(" at '{}'", token.lexeme)
        };
        self.errors.push(RuffError::compile_error(
            format!("{message}{what}"),
            SourceLocation::new(token.line),
        ));
    }

    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.current.kind != TokenType::Eof {
            if self.previous.kind == TokenType::Semicolon {
                return;
            }
            match self.current.kind {
                TokenType::Class
                | TokenType::Fun
                | TokenType::Var
                | TokenType::For
                | TokenType::If
                | TokenType::While
                | TokenType::Print
                | TokenType::Return => return,
                _ => {}
            }
            self.advance();
        }
    }

    // ---- bytecode emission --------------------------------------------

    fn current_function(&mut self) -> &mut FunctionState {
        self.functions.last_mut().expect("at least the script compiler is always present")
    }

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line;
        self.current_function().function.chunk.write(byte, line);
    }

    fn emit_bytes(&mut self, a: u8, b: u8) {
        self.emit_byte(a);
        self.emit_byte(b);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.emit_byte(op as u8);
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        let index = self.current_function().function.chunk.write_constant(value);
        if index >= MAX_CONSTANTS {
            self.error("Too many constants in one chunk.");
            return 0;
        }
        index as u8
    }

    fn emit_constant(&mut self, value: Value) {
        let constant = self.make_constant(value);
        self.emit_bytes(OpCode::Constant as u8, constant);
    }

    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_op(op);
        self.emit_byte(0xff);
        self.emit_byte(0xff);
        self.current_function().function.chunk.len() - 2
    }

    fn patch_jump(&mut self, offset: usize) {
        let jump = self.current_function().function.chunk.len() - offset - 2;
        if jump > u16::MAX as usize {
            self.error("Too much code to jump over.");
            return;
        }
        self.current_function().function.chunk.patch_u16(offset, jump as u16);
    }

    fn emit_loop(&mut self, loop_start: usize) {
        self.emit_op(OpCode::Loop);
        let offset = self.current_function().function.chunk.len() - loop_start + 2;
        if offset > u16::MAX as usize {
            self.error("Too much code to jump over.");
            return;
        }
        let offset = offset as u16;
        self.emit_byte((offset >> 8) as u8);
        self.emit_byte((offset & 0xff) as u8);
    }

    /// Default function epilogue, also used for a bare `return;`.
    fn emit_epilogue(&mut self) {
        self.emit_op(OpCode::Nil);
        self.emit_op(OpCode::Return);
    }

    fn end_function(&mut self) -> FunctionState {
        self.emit_epilogue();
        self.functions.pop().expect("function stack is never empty during end_function")
    }

    // ---- scope & locals -------------------------------------------------

    fn begin_scope(&mut self) {
        self.current_function().scope_depth += 1;
    }

    fn end_scope(&mut self) {
        let state = self.current_function();
        state.scope_depth -= 1;
        let depth = state.scope_depth;
        while let Some(local) = self.current_function().locals.last() {
            if local.depth.is_some_and(|d| d > depth) {
                self.emit_op(OpCode::Pop);
                self.current_function().locals.pop();
            } else {
                break;
            }
        }
    }

    fn identifier_constant(&mut self, name: &str) -> u8 {
        let interned = self.interner.intern(name);
        self.make_constant(Value::String(interned))
    }

    fn add_local(&mut self, name: String) {
        if self.current_function().locals.len() >= MAX_LOCALS {
            self.error("Too many local variables in function.");
            return;
        }
        self.current_function().locals.push(LocalVar { name, depth: None, captured: false });
    }

    fn declare_variable(&mut self) {
        if self.current_function().scope_depth == 0 {
            return;
        }
        let name = self.previous.lexeme.to_string();
        let scope_depth = self.current_function().scope_depth;
        let mut duplicate = false;
        for local in self.current_function().locals.iter().rev() {
            if let Some(depth) = local.depth {
                if depth < scope_depth {
                    break;
                }
            }
            if local.name == name {
                duplicate = true;
                break;
            }
        }
        if duplicate {
            self.error("Variable with this name already declared in this scope.");
            return;
        }
        self.add_local(name);
    }

    fn parse_variable(&mut self, message: &str) -> u8 {
        self.consume(TokenType::Identifier, message);
        self.declare_variable();
        if self.current_function().scope_depth > 0 {
            return 0;
        }
        let name = self.previous.lexeme.to_string();
        self.identifier_constant(&name)
    }

    fn mark_initialized(&mut self) {
        let state = self.current_function();
        if state.scope_depth == 0 {
            return;
        }
        let depth = state.scope_depth;
        if let Some(local) = state.locals.last_mut() {
            local.depth = Some(depth);
        }
    }

    fn define_variable(&mut self, global: u8) {
        if self.current_function().scope_depth > 0 {
            self.mark_initialized();
            return;
        }
        self.emit_bytes(OpCode::DefineGlobal as u8, global);
    }

    // ---- name resolution -------------------------------------------------

    fn resolve_local(&mut self, fn_index: usize, name: &str) -> Option<usize> {
        let locals = &self.functions[fn_index].locals;
        for (i, local) in locals.iter().enumerate().rev() {
            if local.name == name {
                if local.depth.is_none() {
                    self.error("Can't read local variable in its own initializer.");
                }
                return Some(i);
            }
        }
        None
    }

    fn resolve_upvalue(&mut self, fn_index: usize, name: &str) -> Option<usize> {
        if fn_index == 0 {
            return None;
        }
        let parent = fn_index - 1;
        if let Some(local) = self.resolve_local(parent, name) {
            self.functions[parent].locals[local].captured = true;
            return Some(self.add_upvalue(fn_index, local, true));
        }
        if let Some(upvalue) = self.resolve_upvalue(parent, name) {
            return Some(self.add_upvalue(fn_index, upvalue, false));
        }
        None
    }

    fn add_upvalue(&mut self, fn_index: usize, index: usize, is_local: bool) -> usize {
        let state = &mut self.functions[fn_index];
        for (i, existing) in state.upvalues.iter().enumerate() {
            if existing.index == index as u8 && existing.is_local == is_local {
                return i;
            }
        }
        if state.upvalues.len() >= MAX_UPVALUES {
            self.error("Too many closure variables in function.");
            return 0;
        }
        state.upvalues.push(CompileUpvalue { index: index as u8, is_local });
        state.function.upvalue_count = state.upvalues.len() as u16;
        state.upvalues.len() - 1
    }

    fn named_variable(&mut self, name: Token<'src>, can_assign: bool) {
        let fn_index = self.functions.len() - 1;
        let (get_op, set_op, arg) = if let Some(slot) = self.resolve_local(fn_index, name.lexeme) {
            (OpCode::GetLocal, OpCode::SetLocal, slot as u8)
        } else if let Some(slot) = self.resolve_upvalue(fn_index, name.lexeme) {
            (OpCode::GetUpvalue, OpCode::SetUpvalue, slot as u8)
        } else {
            let constant = self.identifier_constant(name.lexeme);
            (OpCode::GetGlobal, OpCode::SetGlobal, constant)
        };

        if can_assign && self.match_token(TokenType::Equal) {
            self.expression();
            self.emit_bytes(set_op as u8, arg);
        } else {
            self.emit_bytes(get_op as u8, arg);
        }
    }

    // ---- declarations & statements --------------------------------------

    fn declaration(&mut self) {
        if self.match_token(TokenType::Fun) {
            self.fun_declaration();
        } else if self.match_token(TokenType::Var) {
            self.var_declaration();
        } else {
            self.statement();
        }

        if self.panic_mode {
            self.synchronize();
        }
    }

    fn fun_declaration(&mut self) {
        let global = self.parse_variable("Expect function name.");
        self.mark_initialized();
        self.function(FunctionKind::Function);
        self.define_variable(global);
    }

    fn function(&mut self, kind: FunctionKind) {
        let name = self.interner.intern(self.previous.lexeme);
        self.functions.push(FunctionState::new(kind, name));
        self.begin_scope();

        self.consume(TokenType::LeftParen, "Expect '(' after function name.");
        if !self.check(TokenType::RightParen) {
            loop {
                if self.current_function().function.arity == 255 {
                    self.error_at_current("Can't have more than 255 parameters.");
                } else {
                    self.current_function().function.arity += 1;
                }
                let constant = self.parse_variable("Expect parameter name.");
                self.define_variable(constant);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightParen, "Expect ')' after parameters.");
        self.consume(TokenType::LeftBrace, "Expect '{' before function body.");
        self.block();

        let compiled = self.end_function();
        let upvalues = compiled.upvalues.clone();
        let function_rc = Rc::new(compiled.function);
        let constant = self.make_constant(Value::Function(function_rc));
        self.emit_bytes(OpCode::Closure as u8, constant);
        for upvalue in upvalues {
            self.emit_byte(if upvalue.is_local { 1 } else { 0 });
            self.emit_byte(upvalue.index);
        }
    }

    fn var_declaration(&mut self) {
        let global = self.parse_variable("Expect variable name.");
        if self.match_token(TokenType::Equal) {
            self.expression();
        } else {
            self.emit_op(OpCode::Nil);
        }
        self.consume(TokenType::Semicolon, "Expect ';' after variable declaration.");
        self.define_variable(global);
    }

    fn statement(&mut self) {
        if self.match_token(TokenType::Print) {
            self.print_statement();
        } else if self.match_token(TokenType::If) {
            self.if_statement();
        } else if self.match_token(TokenType::While) {
            self.while_statement();
        } else if self.match_token(TokenType::For) {
            self.for_statement();
        } else if self.match_token(TokenType::Return) {
            self.return_statement();
        } else if self.match_token(TokenType::LeftBrace) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    fn block(&mut self) {
        while !self.check(TokenType::RightBrace) && !self.check(TokenType::Eof) {
            self.declaration();
        }
        self.consume(TokenType::RightBrace, "Expect '}' after block.");
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenType::Semicolon, "Expect ';' after value.");
        self.emit_op(OpCode::Print);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenType::Semicolon, "Expect ';' after expression.");
        self.emit_op(OpCode::Pop);
    }

    fn if_statement(&mut self) {
        self.consume(TokenType::LeftParen, "Expect '(' after 'if'.");
        self.expression();
        self.consume(TokenType::RightParen, "Expect ')' after condition.");

        let then_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement();

        let else_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(then_jump);
        self.emit_op(OpCode::Pop);

        if self.match_token(TokenType::Else) {
            self.statement();
        }
        self.patch_jump(else_jump);
    }

    fn while_statement(&mut self) {
        let loop_start = self.current_function().function.chunk.len();
        self.consume(TokenType::LeftParen, "Expect '(' after 'while'.");
        self.expression();
        self.consume(TokenType::RightParen, "Expect ')' after condition.");

        let exit_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement();
        self.emit_loop(loop_start);

        self.patch_jump(exit_jump);
        self.emit_op(OpCode::Pop);
    }

    fn for_statement(&mut self) {
        self.begin_scope();
        self.consume(TokenType::LeftParen, "Expect '(' after 'for'.");
        if self.match_token(TokenType::Semicolon) {
            // no initializer
        } else if self.match_token(TokenType::Var) {
            self.var_declaration();
        } else {
            self.expression_statement();
        }

        let mut loop_start = self.current_function().function.chunk.len();
        let mut exit_jump = None;
        if !self.match_token(TokenType::Semicolon) {
            self.expression();
            self.consume(TokenType::Semicolon, "Expect ';' after loop condition.");
            exit_jump = Some(self.emit_jump(OpCode::JumpIfFalse));
            self.emit_op(OpCode::Pop);
        }

        if !self.match_token(TokenType::RightParen) {
            let body_jump = self.emit_jump(OpCode::Jump);
            let increment_start = self.current_function().function.chunk.len();
            self.expression();
            self.emit_op(OpCode::Pop);
            self.consume(TokenType::RightParen, "Expect ')' after for clauses.");

            self.emit_loop(loop_start);
            loop_start = increment_start;
            self.patch_jump(body_jump);
        }

        self.statement();
        self.emit_loop(loop_start);

        if let Some(exit_jump) = exit_jump {
            self.patch_jump(exit_jump);
            self.emit_op(OpCode::Pop);
        }
        self.end_scope();
    }

    fn return_statement(&mut self) {
        if self.current_function().kind == FunctionKind::Script {
            self.error("Can't return from top-level code.");
        }
        if self.match_token(TokenType::Semicolon) {
            self.emit_epilogue();
        } else {
            self.expression();
            self.consume(TokenType::Semicolon, "Expect ';' after return value.");
            self.emit_op(OpCode::Return);
        }
    }

    // ---- Pratt parser ----------------------------------------------------

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let prefix = self.get_rule(self.previous.kind).prefix;
        let Some(prefix) = prefix else {
            self.error("Expect expression.");
            return;
        };
        let can_assign = precedence <= Precedence::Assignment;
        prefix(self, can_assign);

        while precedence <= self.get_rule(self.current.kind).precedence {
            self.advance();
            let infix = self.get_rule(self.previous.kind).infix.expect("precedence table guarantees an infix rule here");
            infix(self, can_assign);
        }

        if can_assign && self.match_token(TokenType::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    /// The Pratt table, kept as data keyed by token kind rather than a
    /// virtual method per token (spec §9 design note).
    fn get_rule(&self, kind: TokenType) -> ParseRule<'src, 'a> {
        use TokenType::*;
        match kind {
            LeftParen => ParseRule { prefix: Some(Self::grouping), infix: Some(Self::call), precedence: Precedence::Call },
            Minus => ParseRule { prefix: Some(Self::unary), infix: Some(Self::binary), precedence: Precedence::Term },
            Plus => ParseRule { prefix: None, infix: Some(Self::binary), precedence: Precedence::Term },
            Slash => ParseRule { prefix: None, infix: Some(Self::binary), precedence: Precedence::Factor },
            Star => ParseRule { prefix: None, infix: Some(Self::binary), precedence: Precedence::Factor },
            Bang => ParseRule { prefix: Some(Self::unary), infix: None, precedence: Precedence::None },
            BangEqual => ParseRule { prefix: None, infix: Some(Self::binary), precedence: Precedence::Equality },
            EqualEqual => ParseRule { prefix: None, infix: Some(Self::binary), precedence: Precedence::Equality },
            Greater => ParseRule { prefix: None, infix: Some(Self::binary), precedence: Precedence::Comparison },
            GreaterEqual => ParseRule { prefix: None, infix: Some(Self::binary), precedence: Precedence::Comparison },
            Less => ParseRule { prefix: None, infix: Some(Self::binary), precedence: Precedence::Comparison },
            LessEqual => ParseRule { prefix: None, infix: Some(Self::binary), precedence: Precedence::Comparison },
            Identifier => ParseRule { prefix: Some(Self::variable), infix: None, precedence: Precedence::None },
            String => ParseRule { prefix: Some(Self::string), infix: None, precedence: Precedence::None },
            Number => ParseRule { prefix: Some(Self::number), infix: None, precedence: Precedence::None },
            And => ParseRule { prefix: None, infix: Some(Self::and_), precedence: Precedence::And },
            Or => ParseRule { prefix: None, infix: Some(Self::or_), precedence: Precedence::Or },
            False | Nil | True => ParseRule { prefix: Some(Self::literal), infix: None, precedence: Precedence::None },
            _ => ParseRule { prefix: None, infix: None, precedence: Precedence::None },
        }
    }

    fn grouping(&mut self, _can_assign: bool) {
        self.expression();
        self.consume(TokenType::RightParen, "Expect ')' after expression.");
    }

    fn unary(&mut self, _can_assign: bool) {
        let kind = self.previous.kind;
        self.parse_precedence(Precedence::Unary);
        match kind {
            TokenType::Minus => self.emit_op(OpCode::Negate),
            TokenType::Bang => self.emit_op(OpCode::Not),
            _ => unreachable!("unary is only registered for - and !"),
        }
    }

    fn binary(&mut self, _can_assign: bool) {
        let kind = self.previous.kind;
        let rule_precedence = self.get_rule(kind).precedence;
        self.parse_precedence(rule_precedence.next());
        match kind {
            TokenType::Plus => self.emit_op(OpCode::Add),
            TokenType::Minus => self.emit_op(OpCode::Subtract),
            TokenType::Star => self.emit_op(OpCode::Multiply),
            TokenType::Slash => self.emit_op(OpCode::Divide),
            TokenType::BangEqual => {
                self.emit_op(OpCode::Equal);
                self.emit_op(OpCode::Not);
            }
            TokenType::EqualEqual => self.emit_op(OpCode::Equal),
            TokenType::Greater => self.emit_op(OpCode::Greater),
            TokenType::GreaterEqual => {
                self.emit_op(OpCode::Less);
                self.emit_op(OpCode::Not);
            }
            TokenType::Less => self.emit_op(OpCode::Less),
            TokenType::LessEqual => {
                self.emit_op(OpCode::Greater);
                self.emit_op(OpCode::Not);
            }
            _ => unreachable!("binary is only registered for the operators above"),
        }
    }

    fn and_(&mut self, _can_assign: bool) {
        let end_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::And);
        self.patch_jump(end_jump);
    }

    fn or_(&mut self, _can_assign: bool) {
        let else_jump = self.emit_jump(OpCode::JumpIfFalse);
        let end_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(else_jump);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::Or);
        self.patch_jump(end_jump);
    }

    fn literal(&mut self, _can_assign: bool) {
        match self.previous.kind {
            TokenType::False => self.emit_op(OpCode::False),
            TokenType::Nil => self.emit_op(OpCode::Nil),
            TokenType::True => self.emit_op(OpCode::True),
            _ => unreachable!("literal is only registered for false/nil/true"),
        }
    }

    fn number(&mut self, _can_assign: bool) {
        let value: f64 = self.previous.lexeme.parse().unwrap_or(0.0);
        self.emit_constant(Value::Number(value));
    }

    fn string(&mut self, _can_assign: bool) {
        let lexeme = self.previous.lexeme;
        let contents = &lexeme[1..lexeme.len() - 1];
        let interned = self.interner.intern(contents);
        self.emit_constant(Value::String(interned));
    }

    fn variable(&mut self, can_assign: bool) {
        let name = self.previous;
        self.named_variable(name, can_assign);
    }

    fn call(&mut self, _can_assign: bool) {
        let arg_count = self.argument_list();
        self.emit_bytes(OpCode::Call as u8, arg_count);
    }

    fn argument_list(&mut self) -> u8 {
        let mut count: u32 = 0;
        if !self.check(TokenType::RightParen) {
            loop {
                self.expression();
                if count == 255 {
                    self.error("Can't have more than 255 arguments.");
                }
                count += 1;
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightParen, "Expect ')' after arguments.");
        count as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::OpCode;

    fn compile_ok(src: &str) -> Rc<Function> {
        let mut interner = Interner::new();
        compile(src, &mut interner).unwrap_or_else(|errs| {
            panic!("expected compile success, got {:?}", errs.iter().map(|e| &e.message).collect::<Vec<_>>())
        })
    }

    fn compile_err(src: &str) -> Vec<RuffError> {
        let mut interner = Interner::new();
        compile(src, &mut interner).expect_err("expected a compile error")
    }

    #[test]
    fn simple_print_emits_constant_print() {
        let f = compile_ok("print 1 + 2;");
        let code = f.chunk.code();
        assert_eq!(code[0], OpCode::Constant as u8);
        assert_eq!(code[2], OpCode::Constant as u8);
        assert_eq!(code[4], OpCode::Add as u8);
        assert_eq!(code[5], OpCode::Print as u8);
    }

    #[test]
    fn redeclaring_a_local_in_the_same_scope_is_an_error() {
        let errs = compile_err("{ var a; var a; }");
        assert!(errs[0].message.contains("already declared"));
    }

    #[test]
    fn shadowing_in_a_nested_scope_is_fine() {
        compile_ok("{ var a; { var a; } }");
    }

    #[test]
    fn reading_own_initializer_is_an_error() {
        let errs = compile_err("{ var a = a; }");
        assert!(errs[0].message.contains("its own initializer"));
    }

    #[test]
    fn top_level_return_is_an_error() {
        let errs = compile_err("return 1;");
        assert!(errs[0].message.contains("top-level"));
    }

    #[test]
    fn exactly_255_parameters_compile_256_errors() {
        let params: Vec<String> = (0..255).map(|i| format!("p{i}")).collect();
        let src = format!("fun f({}) {{}}", params.join(", "));
        compile_ok(&src);

        let params: Vec<String> = (0..256).map(|i| format!("p{i}")).collect();
        let src = format!("fun f({}) {{}}", params.join(", "));
        let errs = compile_err(&src);
        assert!(errs.iter().any(|e| e.message.contains("255 parameters")));
    }

    #[test]
    fn exactly_256_constants_compile_257_errors() {
        let literals: Vec<String> = (0..256).map(|i| format!("{i};")).collect();
        compile_ok(&literals.join(""));

        let literals: Vec<String> = (0..257).map(|i| format!("{i};")).collect();
        let errs = compile_err(&literals.join(""));
        assert!(errs.iter().any(|e| e.message.contains("Too many constants")));
    }
}
