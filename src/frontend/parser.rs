//! The recursive-descent parser of the bundled front end.
//!
//! The parser covers the statement and expression subset the analyser
//! models: function definitions over the builtin integer/floating types,
//! structured control flow (`if`/`while`/`do`/`for`/`switch`), and the
//! expression forms the analyses classify (assignment, compound
//! assignment, unary and binary operators, casts, subscripts,
//! conditionals, calls). Name resolution and typing happen inline, since C
//! declares before use.

use crate::language::{Type, TypeKind};

use super::{
    ast::{
        AstStmt, AstStmtId, AstStmtKind, BinaryOp, CastKind, DeclId, Expr, ExprId, ExprKind,
        FunctionAst, Span, UnaryOp, UpdateOp, VarDecl,
    },
    lexer::{self, LineMap, Token, TokenKind},
    sema::{self, Scopes},
};

/// A diagnostic from the bundled front end.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A character no token matches.
    #[error("unexpected character at {line}:{column}")]
    UnexpectedCharacter {
        /// The 1-based line.
        line: i32,
        /// The 1-based column.
        column: i32,
    },
    /// The source ended in the middle of a construct.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A token other than the required one.
    #[error("expected {expected} at {line}:{column}, found `{found}`")]
    UnexpectedToken {
        /// What the parser was looking for.
        expected: String,
        /// The text of the offending token.
        found: String,
        /// The 1-based line.
        line: i32,
        /// The 1-based column.
        column: i32,
    },
    /// An identifier that resolves to no declaration.
    #[error("undeclared identifier `{name}` at {line}:{column}")]
    UndeclaredIdentifier {
        /// The unresolved name.
        name: String,
        /// The 1-based line.
        line: i32,
        /// The 1-based column.
        column: i32,
    },
    /// An integer literal that does not fit any modelled type.
    #[error("invalid integer literal `{text}` at {line}:{column}")]
    InvalidLiteral {
        /// The literal text.
        text: String,
        /// The 1-based line.
        line: i32,
        /// The 1-based column.
        column: i32,
    },
    /// A construct outside the modelled subset.
    #[error("{what} are not supported (at {line}:{column})")]
    Unsupported {
        /// The construct.
        what: &'static str,
        /// The 1-based line.
        line: i32,
        /// The 1-based column.
        column: i32,
    },
}

/// A function definition as parsed, before block-graph lowering.
#[derive(Debug)]
pub(crate) struct ParsedFunction {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<DeclId>,
    pub ast: FunctionAst,
    pub body: Vec<BodyStmt>,
}

/// Structured statements of a function body, lowered to basic blocks by
/// [`super::blocks`]. Leaf statements have already been interned into the
/// function's statement arena.
#[derive(Debug)]
pub(crate) enum BodyStmt {
    Compound(Vec<BodyStmt>),
    Decls(Vec<AstStmtId>),
    Expr(AstStmtId),
    Return(AstStmtId),
    If {
        cond: AstStmtId,
        then_branch: Box<BodyStmt>,
        else_branch: Option<Box<BodyStmt>>,
    },
    While {
        cond: AstStmtId,
        body: Box<BodyStmt>,
    },
    DoWhile {
        body: Box<BodyStmt>,
        cond: AstStmtId,
    },
    For {
        init: Option<Box<BodyStmt>>,
        cond: Option<AstStmtId>,
        step: Option<AstStmtId>,
        body: Box<BodyStmt>,
    },
    Switch {
        cond: AstStmtId,
        arms: Vec<SwitchArm>,
        has_default: bool,
    },
    Break,
    Continue,
    Empty,
}

/// One labelled group of a `switch` body.
#[derive(Debug)]
pub(crate) struct SwitchArm {
    pub is_default: bool,
    pub body: Vec<BodyStmt>,
}

pub(crate) fn parse(source: &str) -> Result<Vec<ParsedFunction>, ParseError> {
    let line_map = LineMap::new(source);
    let tokens = lexer::tokenize(source).map_err(|offset| {
        let (line, column) = line_map.location(offset);
        ParseError::UnexpectedCharacter { line, column }
    })?;
    Parser {
        source,
        tokens,
        line_map,
        pos: 0,
        ast: FunctionAst::empty(),
        scopes: Scopes::default(),
        loop_depth: 0,
        switch_depth: 0,
    }
    .translation_unit()
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    line_map: LineMap,
    pos: usize,
    ast: FunctionAst,
    scopes: Scopes,
    loop_depth: usize,
    switch_depth: usize,
}

impl Parser<'_> {
    fn translation_unit(mut self) -> Result<Vec<ParsedFunction>, ParseError> {
        let mut functions = Vec::new();
        while self.peek().is_some() {
            let return_type = self
                .type_specifier()?
                .ok_or_else(|| self.unexpected("a type specifier"))?;
            let name = self.expect_ident()?;
            if self.peek_kind() == Some(TokenKind::LParen) {
                if let Some(function) = self.function_rest(name, return_type)? {
                    functions.push(function);
                }
            } else {
                // A file-scope object; the analyser only models locals, so
                // skip to the end of the declaration.
                self.skip_past(TokenKind::Semi)?;
            }
        }
        Ok(functions)
    }

    /// Parses the remainder of a function after its name, starting at `(`.
    /// Returns `None` for a bare prototype.
    fn function_rest(
        &mut self,
        name: String,
        return_type: Type,
    ) -> Result<Option<ParsedFunction>, ParseError> {
        self.ast = FunctionAst::empty();
        self.scopes = Scopes::default();
        self.scopes.push();

        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if self.peek_kind() != Some(TokenKind::RParen) {
            if self.peek_kind() == Some(TokenKind::KwVoid)
                && self.peek_kind_at(1) == Some(TokenKind::RParen)
            {
                self.advance();
            } else {
                loop {
                    let ty = self
                        .type_specifier()?
                        .ok_or_else(|| self.unexpected("a parameter type"))?;
                    self.reject_pointer()?;
                    let span = self.peek_span();
                    // Prototypes may leave parameters unnamed.
                    let param_name = if self.peek_kind() == Some(TokenKind::Ident) {
                        self.advance_text()
                    } else {
                        String::new()
                    };
                    let decl = self.ast.push_decl(VarDecl {
                        name: param_name.clone(),
                        ty,
                        is_param: true,
                        span,
                    });
                    if !param_name.is_empty() {
                        self.scopes.declare(&param_name, decl);
                    }
                    params.push(decl);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        if self.eat(TokenKind::Semi) {
            return Ok(None);
        }
        self.expect(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.eat(TokenKind::RBrace) {
            body.push(self.statement()?);
        }
        self.scopes.pop();

        Ok(Some(ParsedFunction {
            name,
            return_type,
            params,
            ast: std::mem::replace(&mut self.ast, FunctionAst::empty()),
            body,
        }))
    }

    fn statement(&mut self) -> Result<BodyStmt, ParseError> {
        match self.peek_kind().ok_or(ParseError::UnexpectedEof)? {
            TokenKind::LBrace => {
                self.advance();
                self.scopes.push();
                let mut stmts = Vec::new();
                while !self.eat(TokenKind::RBrace) {
                    stmts.push(self.statement()?);
                }
                self.scopes.pop();
                Ok(BodyStmt::Compound(stmts))
            }
            TokenKind::Semi => {
                self.advance();
                Ok(BodyStmt::Empty)
            }
            TokenKind::KwIf => {
                self.advance();
                let cond = self.parenthesised_condition()?;
                let then_branch = Box::new(self.statement()?);
                let else_branch = if self.eat(TokenKind::KwElse) {
                    Some(Box::new(self.statement()?))
                } else {
                    None
                };
                Ok(BodyStmt::If {
                    cond,
                    then_branch,
                    else_branch,
                })
            }
            TokenKind::KwWhile => {
                self.advance();
                let cond = self.parenthesised_condition()?;
                self.loop_depth += 1;
                let body = Box::new(self.statement()?);
                self.loop_depth -= 1;
                Ok(BodyStmt::While { cond, body })
            }
            TokenKind::KwDo => {
                self.advance();
                self.loop_depth += 1;
                let body = Box::new(self.statement()?);
                self.loop_depth -= 1;
                self.expect(TokenKind::KwWhile)?;
                let cond = self.parenthesised_condition()?;
                self.expect(TokenKind::Semi)?;
                Ok(BodyStmt::DoWhile { body, cond })
            }
            TokenKind::KwFor => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                self.scopes.push();
                let init = match self.peek_kind() {
                    Some(TokenKind::Semi) => {
                        self.advance();
                        None
                    }
                    Some(kind) if is_type_start(kind) => Some(Box::new(self.declaration()?)),
                    _ => {
                        let stmt = self.expression_element()?;
                        self.expect(TokenKind::Semi)?;
                        Some(Box::new(BodyStmt::Expr(stmt)))
                    }
                };
                let cond = if self.peek_kind() == Some(TokenKind::Semi) {
                    None
                } else {
                    Some(self.expression_element()?)
                };
                self.expect(TokenKind::Semi)?;
                let step = if self.peek_kind() == Some(TokenKind::RParen) {
                    None
                } else {
                    Some(self.expression_element()?)
                };
                self.expect(TokenKind::RParen)?;
                self.loop_depth += 1;
                let body = Box::new(self.statement()?);
                self.loop_depth -= 1;
                self.scopes.pop();
                Ok(BodyStmt::For {
                    init,
                    cond,
                    step,
                    body,
                })
            }
            TokenKind::KwSwitch => {
                self.advance();
                let cond = self.parenthesised_condition()?;
                self.expect(TokenKind::LBrace)?;
                self.scopes.push();
                self.switch_depth += 1;
                let mut arms: Vec<SwitchArm> = Vec::new();
                let mut has_default = false;
                while !self.eat(TokenKind::RBrace) {
                    match self.peek_kind() {
                        Some(TokenKind::KwCase) => {
                            self.advance();
                            // The label value does not affect the block
                            // graph; every labelled group is a successor of
                            // the switch head.
                            let _ = self.conditional()?;
                            self.expect(TokenKind::Colon)?;
                            arms.push(SwitchArm {
                                is_default: false,
                                body: Vec::new(),
                            });
                        }
                        Some(TokenKind::KwDefault) => {
                            self.advance();
                            self.expect(TokenKind::Colon)?;
                            has_default = true;
                            arms.push(SwitchArm {
                                is_default: true,
                                body: Vec::new(),
                            });
                        }
                        Some(_) => {
                            let stmt = self.statement()?;
                            match arms.last_mut() {
                                Some(arm) => arm.body.push(stmt),
                                None => {
                                    return Err(
                                        self.unexpected("`case` or `default` before statements")
                                    );
                                }
                            }
                        }
                        None => return Err(ParseError::UnexpectedEof),
                    }
                }
                self.switch_depth -= 1;
                self.scopes.pop();
                Ok(BodyStmt::Switch {
                    cond,
                    arms,
                    has_default,
                })
            }
            TokenKind::KwReturn => {
                let start = self.peek_span();
                self.advance();
                let value = if self.peek_kind() == Some(TokenKind::Semi) {
                    None
                } else {
                    let expr = self.expression()?;
                    sema::insert_loads(&mut self.ast, expr);
                    Some(expr)
                };
                let end = self.previous_span();
                self.expect(TokenKind::Semi)?;
                let stmt = self.ast.push_stmt(AstStmt {
                    kind: AstStmtKind::Return { value },
                    span: start.to(end),
                });
                Ok(BodyStmt::Return(stmt))
            }
            TokenKind::KwBreak => {
                if self.loop_depth == 0 && self.switch_depth == 0 {
                    return Err(self.unsupported("`break` statements outside loops"));
                }
                self.advance();
                self.expect(TokenKind::Semi)?;
                Ok(BodyStmt::Break)
            }
            TokenKind::KwContinue => {
                if self.loop_depth == 0 {
                    return Err(self.unsupported("`continue` statements outside loops"));
                }
                self.advance();
                self.expect(TokenKind::Semi)?;
                Ok(BodyStmt::Continue)
            }
            kind if is_type_start(kind) => self.declaration(),
            _ => {
                let stmt = self.expression_element()?;
                self.expect(TokenKind::Semi)?;
                Ok(BodyStmt::Expr(stmt))
            }
        }
    }

    /// Parses `( expression )` and interns it as a condition element.
    fn parenthesised_condition(&mut self) -> Result<AstStmtId, ParseError> {
        self.expect(TokenKind::LParen)?;
        let cond = self.expression_element()?;
        self.expect(TokenKind::RParen)?;
        Ok(cond)
    }

    /// Parses an expression and interns it as a block element.
    fn expression_element(&mut self) -> Result<AstStmtId, ParseError> {
        let expr = self.expression()?;
        sema::insert_loads(&mut self.ast, expr);
        let span = self.ast.expr(expr).span;
        Ok(self.ast.push_stmt(AstStmt {
            kind: AstStmtKind::Expr { expr },
            span,
        }))
    }

    /// One declaration, split into per-declarator statements.
    fn declaration(&mut self) -> Result<BodyStmt, ParseError> {
        let ty = self
            .type_specifier()?
            .ok_or_else(|| self.unexpected("a type specifier"))?;
        let mut stmts = Vec::new();
        loop {
            self.reject_pointer()?;
            let start = self.peek_span();
            let name = self.expect_ident()?;
            if self.peek_kind() == Some(TokenKind::LBracket) {
                return Err(self.unsupported("array declarators"));
            }
            let init = if self.eat(TokenKind::Assign) {
                let init = self.assignment()?;
                sema::insert_loads(&mut self.ast, init);
                Some(init)
            } else {
                None
            };
            // Declare after the initialiser so `int x = x;` resolves the
            // right-hand `x` to an outer declaration.
            let decl = self.ast.push_decl(VarDecl {
                name: name.clone(),
                ty: ty.clone(),
                is_param: false,
                span: start,
            });
            self.scopes.declare(&name, decl);
            let end = self.previous_span();
            stmts.push(self.ast.push_stmt(AstStmt {
                kind: AstStmtKind::Decl { decl, init },
                span: start.to(end),
            }));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Semi)?;
        Ok(BodyStmt::Decls(stmts))
    }

    // ---- expressions -------------------------------------------------

    fn expression(&mut self) -> Result<ExprId, ParseError> {
        let mut lhs = self.assignment()?;
        while self.eat(TokenKind::Comma) {
            let rhs = self.assignment()?;
            let span = self.ast.expr(lhs).span.to(self.ast.expr(rhs).span);
            let ty = self.ast.expr(rhs).ty.clone();
            lhs = self.ast.push_expr(Expr {
                kind: ExprKind::Comma { lhs, rhs },
                ty,
                span,
            });
        }
        Ok(lhs)
    }

    fn assignment(&mut self) -> Result<ExprId, ParseError> {
        let lhs = self.conditional()?;
        let op = match self.peek_kind() {
            Some(TokenKind::Assign) => None,
            Some(TokenKind::PlusAssign) => Some(BinaryOp::Add),
            Some(TokenKind::MinusAssign) => Some(BinaryOp::Sub),
            Some(TokenKind::StarAssign) => Some(BinaryOp::Mul),
            Some(TokenKind::SlashAssign) => Some(BinaryOp::Div),
            Some(TokenKind::PercentAssign) => Some(BinaryOp::Rem),
            Some(TokenKind::AmpAssign) => Some(BinaryOp::And),
            Some(TokenKind::PipeAssign) => Some(BinaryOp::Or),
            Some(TokenKind::CaretAssign) => Some(BinaryOp::Xor),
            Some(TokenKind::ShlAssign) => Some(BinaryOp::Shl),
            Some(TokenKind::ShrAssign) => Some(BinaryOp::Shr),
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.assignment()?;
        let span = self.ast.expr(lhs).span.to(self.ast.expr(rhs).span);
        let ty = self.ast.expr(lhs).ty.clone();
        let kind = match op {
            None => ExprKind::Assign { lhs, rhs },
            Some(op) => ExprKind::CompoundAssign { op, lhs, rhs },
        };
        Ok(self.ast.push_expr(Expr { kind, ty, span }))
    }

    fn conditional(&mut self) -> Result<ExprId, ParseError> {
        let cond = self.binary(1)?;
        if !self.eat(TokenKind::Question) {
            return Ok(cond);
        }
        let then_value = self.assignment()?;
        self.expect(TokenKind::Colon)?;
        let else_value = self.conditional()?;
        let then_ty = self.ast.expr(then_value).ty.clone();
        let else_ty = self.ast.expr(else_value).ty.clone();
        let ty = if then_ty.is_integer() && else_ty.is_integer() {
            sema::usual_arithmetic_conversion(&then_ty, &else_ty)
        } else {
            then_ty
        };
        let span = self.ast.expr(cond).span.to(self.ast.expr(else_value).span);
        Ok(self.ast.push_expr(Expr {
            kind: ExprKind::Conditional {
                cond,
                then_value,
                else_value,
            },
            ty,
            span,
        }))
    }

    fn binary(&mut self, min_precedence: u8) -> Result<ExprId, ParseError> {
        let mut lhs = self.unary()?;
        while let Some((op, precedence)) = self.peek_binary_op() {
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let rhs = self.binary(precedence + 1)?;
            let lhs_ty = self.ast.expr(lhs).ty.clone();
            let rhs_ty = self.ast.expr(rhs).ty.clone();
            let ty = binary_result_type(op, &lhs_ty, &rhs_ty);
            let span = self.ast.expr(lhs).span.to(self.ast.expr(rhs).span);
            lhs = self.ast.push_expr(Expr {
                kind: ExprKind::Binary { op, lhs, rhs },
                ty,
                span,
            });
        }
        Ok(lhs)
    }

    fn peek_binary_op(&self) -> Option<(BinaryOp, u8)> {
        let (op, precedence) = match self.peek_kind()? {
            TokenKind::OrOr => (BinaryOp::LogicalOr, 1),
            TokenKind::AndAnd => (BinaryOp::LogicalAnd, 2),
            TokenKind::Pipe => (BinaryOp::Or, 3),
            TokenKind::Caret => (BinaryOp::Xor, 4),
            TokenKind::Amp => (BinaryOp::And, 5),
            TokenKind::EqEq => (BinaryOp::Eq, 6),
            TokenKind::Ne => (BinaryOp::Ne, 6),
            TokenKind::Lt => (BinaryOp::Lt, 7),
            TokenKind::Gt => (BinaryOp::Gt, 7),
            TokenKind::Le => (BinaryOp::Le, 7),
            TokenKind::Ge => (BinaryOp::Ge, 7),
            TokenKind::Shl => (BinaryOp::Shl, 8),
            TokenKind::Shr => (BinaryOp::Shr, 8),
            TokenKind::Plus => (BinaryOp::Add, 9),
            TokenKind::Minus => (BinaryOp::Sub, 9),
            TokenKind::Star => (BinaryOp::Mul, 10),
            TokenKind::Slash => (BinaryOp::Div, 10),
            TokenKind::Percent => (BinaryOp::Rem, 10),
            _ => return None,
        };
        Some((op, precedence))
    }

    fn unary(&mut self) -> Result<ExprId, ParseError> {
        let start = self.peek_span();
        match self.peek_kind().ok_or(ParseError::UnexpectedEof)? {
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if self.peek_kind() == Some(TokenKind::PlusPlus) {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                self.advance();
                let operand = self.unary()?;
                let ty = self.ast.expr(operand).ty.clone();
                let span = start.to(self.ast.expr(operand).span);
                Ok(self.ast.push_expr(Expr {
                    kind: ExprKind::Update {
                        op,
                        prefix: true,
                        operand,
                    },
                    ty,
                    span,
                }))
            }
            TokenKind::Plus | TokenKind::Minus | TokenKind::Bang | TokenKind::Tilde => {
                let op = match self.peek_kind() {
                    Some(TokenKind::Plus) => UnaryOp::Plus,
                    Some(TokenKind::Minus) => UnaryOp::Minus,
                    Some(TokenKind::Bang) => UnaryOp::LogicalNot,
                    _ => UnaryOp::BitNot,
                };
                self.advance();
                let operand = self.unary()?;
                let operand_ty = self.ast.expr(operand).ty.clone();
                let ty = match op {
                    UnaryOp::LogicalNot => Type::builtin(TypeKind::Int),
                    _ if operand_ty.is_integer() => Type::builtin(sema::promote(&operand_ty)),
                    _ => operand_ty,
                };
                let span = start.to(self.ast.expr(operand).span);
                Ok(self.ast.push_expr(Expr {
                    kind: ExprKind::Unary { op, operand },
                    ty,
                    span,
                }))
            }
            TokenKind::LParen if self.peek_is_cast() => {
                self.advance();
                let ty = self
                    .type_specifier()?
                    .ok_or_else(|| self.unexpected("a type name"))?;
                self.expect(TokenKind::RParen)?;
                let operand = self.unary()?;
                let span = start.to(self.ast.expr(operand).span);
                Ok(self.ast.push_expr(Expr {
                    kind: ExprKind::Cast {
                        kind: CastKind::Explicit,
                        operand,
                    },
                    ty,
                    span,
                }))
            }
            _ => self.postfix(),
        }
    }

    fn peek_is_cast(&self) -> bool {
        self.peek_kind_at(1).is_some_and(is_type_start)
    }

    fn postfix(&mut self) -> Result<ExprId, ParseError> {
        let mut expr = self.primary()?;
        loop {
            match self.peek_kind() {
                Some(TokenKind::LBracket) => {
                    self.advance();
                    let index = self.expression()?;
                    let end = self.peek_span();
                    self.expect(TokenKind::RBracket)?;
                    let span = self.ast.expr(expr).span.to(end);
                    expr = self.ast.push_expr(Expr {
                        kind: ExprKind::Subscript { base: expr, index },
                        ty: Type::builtin(TypeKind::Int),
                        span,
                    });
                }
                Some(TokenKind::PlusPlus | TokenKind::MinusMinus) => {
                    let op = if self.peek_kind() == Some(TokenKind::PlusPlus) {
                        UpdateOp::Increment
                    } else {
                        UpdateOp::Decrement
                    };
                    let end = self.peek_span();
                    self.advance();
                    let ty = self.ast.expr(expr).ty.clone();
                    let span = self.ast.expr(expr).span.to(end);
                    expr = self.ast.push_expr(Expr {
                        kind: ExprKind::Update {
                            op,
                            prefix: false,
                            operand: expr,
                        },
                        ty,
                        span,
                    });
                }
                _ => return Ok(expr),
            }
        }
    }

    fn primary(&mut self) -> Result<ExprId, ParseError> {
        let span = self.peek_span();
        match self.peek_kind().ok_or(ParseError::UnexpectedEof)? {
            TokenKind::IntLiteral => {
                let text = self.advance_text();
                let (bits, kind) = parse_int_literal(&text).ok_or_else(|| {
                    ParseError::InvalidLiteral {
                        text,
                        line: span.start_line,
                        column: span.start_column,
                    }
                })?;
                Ok(self.ast.push_expr(Expr {
                    kind: ExprKind::IntLiteral(bits),
                    ty: Type::builtin(kind),
                    span,
                }))
            }
            TokenKind::CharLiteral => {
                let text = self.advance_text();
                let value = parse_char_literal(&text).ok_or(ParseError::InvalidLiteral {
                    text,
                    line: span.start_line,
                    column: span.start_column,
                })?;
                Ok(self.ast.push_expr(Expr {
                    kind: ExprKind::CharLiteral(value),
                    ty: Type::builtin(TypeKind::Int),
                    span,
                }))
            }
            TokenKind::Ident => {
                let name = self.advance_text();
                if self.peek_kind() == Some(TokenKind::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    if self.peek_kind() != Some(TokenKind::RParen) {
                        loop {
                            args.push(self.assignment()?);
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let end = self.peek_span();
                    self.expect(TokenKind::RParen)?;
                    // Callee return types are not resolved across functions;
                    // the constant lattice treats every call as NAC anyway.
                    return Ok(self.ast.push_expr(Expr {
                        kind: ExprKind::Call { callee: name, args },
                        ty: Type::builtin(TypeKind::Int),
                        span: span.to(end),
                    }));
                }
                let decl = self.scopes.resolve(&name).ok_or_else(|| {
                    ParseError::UndeclaredIdentifier {
                        name: name.clone(),
                        line: span.start_line,
                        column: span.start_column,
                    }
                })?;
                let ty = self.ast.decl(decl).ty.clone();
                Ok(self.ast.push_expr(Expr {
                    kind: ExprKind::VarRef(decl),
                    ty,
                    span,
                }))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                let end = self.peek_span();
                self.expect(TokenKind::RParen)?;
                let ty = self.ast.expr(inner).ty.clone();
                Ok(self.ast.push_expr(Expr {
                    kind: ExprKind::Paren(inner),
                    ty,
                    span: span.to(end),
                }))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    // ---- type specifiers ---------------------------------------------

    /// Parses a type specifier, or returns `None` without consuming
    /// anything if the next token cannot start one.
    #[allow(clippy::too_many_lines)]
    fn type_specifier(&mut self) -> Result<Option<Type>, ParseError> {
        if !self.peek_kind().is_some_and(is_type_start) {
            return Ok(None);
        }
        let mut signed = None;
        let mut base = None;
        let mut long_count = 0u8;
        loop {
            match self.peek_kind() {
                Some(TokenKind::KwConst) => {
                    self.advance();
                }
                Some(TokenKind::KwSigned) => {
                    signed = Some(true);
                    self.advance();
                }
                Some(TokenKind::KwUnsigned) => {
                    signed = Some(false);
                    self.advance();
                }
                Some(TokenKind::KwLong) => {
                    long_count += 1;
                    self.advance();
                }
                Some(
                    kind @ (TokenKind::KwVoid
                    | TokenKind::KwBool
                    | TokenKind::KwChar
                    | TokenKind::KwChar16
                    | TokenKind::KwChar32
                    | TokenKind::KwShort
                    | TokenKind::KwInt
                    | TokenKind::KwFloat
                    | TokenKind::KwDouble),
                ) if base.is_none() => {
                    base = Some(kind);
                    self.advance();
                }
                _ => break,
            }
        }
        let kind = match (base, long_count, signed) {
            (Some(TokenKind::KwVoid), 0, None) => TypeKind::Void,
            (Some(TokenKind::KwBool), 0, None) => TypeKind::Bool,
            (Some(TokenKind::KwFloat), 0, None) => TypeKind::Float,
            (Some(TokenKind::KwDouble), _, None) => TypeKind::Double,
            (Some(TokenKind::KwChar16), 0, None) => TypeKind::Char16,
            (Some(TokenKind::KwChar32), 0, None) => TypeKind::Char32,
            (Some(TokenKind::KwChar), 0, signed) => match signed {
                None => TypeKind::Char,
                Some(true) => TypeKind::SChar,
                Some(false) => TypeKind::UChar,
            },
            (Some(TokenKind::KwShort), 0, signed) => {
                if signed == Some(false) {
                    TypeKind::UShort
                } else {
                    TypeKind::Short
                }
            }
            (Some(TokenKind::KwInt) | None, 0, signed) => {
                if signed == Some(false) {
                    TypeKind::UInt
                } else {
                    TypeKind::Int
                }
            }
            (Some(TokenKind::KwInt) | None, 1, signed) => {
                if signed == Some(false) {
                    TypeKind::ULong
                } else {
                    TypeKind::Long
                }
            }
            (Some(TokenKind::KwInt) | None, 2, signed) => {
                if signed == Some(false) {
                    TypeKind::ULongLong
                } else {
                    TypeKind::LongLong
                }
            }
            _ => return Err(self.unexpected("a valid type specifier")),
        };
        Ok(Some(Type::builtin(kind)))
    }

    fn reject_pointer(&mut self) -> Result<(), ParseError> {
        if self.peek_kind() == Some(TokenKind::Star) {
            Err(self.unsupported("pointer declarators"))
        } else {
            Ok(())
        }
    }

    // ---- token plumbing ----------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_kind_at(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    fn peek_span(&self) -> Span {
        self.peek().map_or(Span::SYNTHETIC, |t| self.token_span(t))
    }

    fn previous_span(&self) -> Span {
        self.tokens
            .get(self.pos.wrapping_sub(1))
            .map_or(Span::SYNTHETIC, |t| self.token_span(t))
    }

    fn token_span(&self, token: &Token) -> Span {
        let (start_line, start_column) = self.line_map.location(token.start);
        let (end_line, end_column) = self.line_map.location(token.end.saturating_sub(1));
        Span {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    fn token_text(&self, token: &Token) -> &str {
        &self.source[token.start..token.end]
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn advance_text(&mut self) -> String {
        let text = self.token_text(&self.tokens[self.pos]).to_string();
        self.pos += 1;
        text
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("{kind:?}")))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        if self.peek_kind() == Some(TokenKind::Ident) {
            Ok(self.advance_text())
        } else {
            Err(self.unexpected("an identifier"))
        }
    }

    fn skip_past(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        while let Some(token) = self.peek() {
            let found = token.kind;
            self.advance();
            if found == kind {
                return Ok(());
            }
        }
        Err(ParseError::UnexpectedEof)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => {
                let (line, column) = self.line_map.location(token.start);
                ParseError::UnexpectedToken {
                    expected: expected.to_string(),
                    found: self.token_text(token).to_string(),
                    line,
                    column,
                }
            }
            None => ParseError::UnexpectedEof,
        }
    }

    fn unsupported(&self, what: &'static str) -> ParseError {
        let (line, column) = self
            .peek()
            .map_or((-1, -1), |t| self.line_map.location(t.start));
        ParseError::Unsupported { what, line, column }
    }
}

/// The type of a binary expression: comparisons and logical operators are
/// `int`, shifts take the promoted left operand, and the arithmetic and
/// bitwise forms follow the usual arithmetic conversions.
fn binary_result_type(op: BinaryOp, lhs: &Type, rhs: &Type) -> Type {
    match op {
        BinaryOp::Lt
        | BinaryOp::Gt
        | BinaryOp::Le
        | BinaryOp::Ge
        | BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::LogicalAnd
        | BinaryOp::LogicalOr => Type::builtin(TypeKind::Int),
        BinaryOp::Shl | BinaryOp::Shr if lhs.is_integer() => Type::builtin(sema::promote(lhs)),
        _ if lhs.is_integer() && rhs.is_integer() => sema::usual_arithmetic_conversion(lhs, rhs),
        _ => lhs.clone(),
    }
}

fn is_type_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::KwVoid
            | TokenKind::KwBool
            | TokenKind::KwChar
            | TokenKind::KwChar16
            | TokenKind::KwChar32
            | TokenKind::KwShort
            | TokenKind::KwInt
            | TokenKind::KwLong
            | TokenKind::KwFloat
            | TokenKind::KwDouble
            | TokenKind::KwSigned
            | TokenKind::KwUnsigned
            | TokenKind::KwConst
    )
}

/// Decodes an integer literal into raw bits and the literal's type, per the
/// usual "smallest type the value fits" rules.
fn parse_int_literal(text: &str) -> Option<(u64, TypeKind)> {
    let trimmed = text.trim_end_matches(['u', 'U', 'l', 'L']);
    let suffix = &text[trimmed.len()..];
    let unsigned = suffix.contains(['u', 'U']);
    let long_count = suffix.chars().filter(|c| matches!(c, 'l' | 'L')).count();

    let (digits, radix) = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        (hex, 16)
    } else if trimmed.len() > 1 && trimmed.starts_with('0') {
        (&trimmed[1..], 8)
    } else {
        (trimmed, 10)
    };
    let value = u64::from_str_radix(digits, radix).ok()?;

    let kind = match (unsigned, long_count) {
        (true, 0) => {
            if u32::try_from(value).is_ok() {
                TypeKind::UInt
            } else {
                TypeKind::ULong
            }
        }
        (true, 1) => TypeKind::ULong,
        (true, _) => TypeKind::ULongLong,
        (false, 0) => {
            if i32::try_from(value).is_ok() {
                TypeKind::Int
            } else if radix != 10 && u32::try_from(value).is_ok() {
                TypeKind::UInt
            } else if i64::try_from(value).is_ok() {
                TypeKind::Long
            } else if radix != 10 {
                TypeKind::ULong
            } else {
                return None;
            }
        }
        (false, 1) => {
            if i64::try_from(value).is_ok() {
                TypeKind::Long
            } else {
                return None;
            }
        }
        (false, _) => {
            if i64::try_from(value).is_ok() {
                TypeKind::LongLong
            } else {
                return None;
            }
        }
    };
    Some((value, kind))
}

/// Decodes a character literal (quotes included) to its code point value.
fn parse_char_literal(text: &str) -> Option<u32> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    let first = chars.next()?;
    if first != '\\' {
        return Some(first as u32);
    }
    let escape = chars.next()?;
    let rest: String = chars.collect();
    let value = match escape {
        'n' => 0x0a,
        't' => 0x09,
        'r' => 0x0d,
        'v' => 0x0b,
        'a' => 0x07,
        'b' => 0x08,
        'f' => 0x0c,
        '\\' => 0x5c,
        '\'' => 0x27,
        '"' => 0x22,
        '?' => 0x3f,
        'x' => u32::from_str_radix(&rest, 16).ok()?,
        d if d.is_digit(8) => {
            let digits = format!("{d}{rest}");
            u32::from_str_radix(&digits, 8).ok()?
        }
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(source: &str) -> ParsedFunction {
        let mut functions = parse(source).unwrap();
        assert_eq!(functions.len(), 1);
        functions.pop().unwrap()
    }

    #[test]
    fn parses_a_minimal_function() {
        let f = parse_one("int dummy() { int x; int y; y = x = 1; return y; }");
        assert_eq!(f.name, "dummy");
        assert_eq!(f.return_type.name(), "int");
        assert!(f.params.is_empty());
        assert_eq!(f.body.len(), 4);
    }

    #[test]
    fn renders_statements_like_the_source() {
        let f = parse_one("int f(int n) { int x = 1; x += n; return x; }");
        let rendered: Vec<_> = (0..f.ast.stmts.len())
            .map(|i| f.ast.render_stmt(AstStmtId::from(u32::try_from(i).unwrap())))
            .collect();
        assert_eq!(rendered, vec!["int x = 1;", "x += n", "return x"]);
    }

    #[test]
    fn declaration_splits_declarators() {
        let f = parse_one("int f() { int x, y, z; return 0; }");
        let decls = match &f.body[0] {
            BodyStmt::Decls(decls) => decls.len(),
            other => panic!("expected declarations, got {other:?}"),
        };
        assert_eq!(decls, 3);
    }

    #[test]
    fn reads_are_wrapped_in_loads() {
        let f = parse_one("int f(int a) { int b = a; a = b; return a + b; }");
        // `int b = a;` reads `a` through a load and leaves `b` bare.
        let init = match &f.ast.stmt(AstStmtId::from(0)).kind {
            AstStmtKind::Decl {
                init: Some(init), ..
            } => *init,
            other => panic!("expected a declaration, got {other:?}"),
        };
        assert!(matches!(
            f.ast.expr(init).kind,
            ExprKind::Cast {
                kind: CastKind::LvalueToRvalue,
                ..
            }
        ));
        // `a = b` keeps `a` bare on the left.
        let assign = match &f.ast.stmt(AstStmtId::from(1)).kind {
            AstStmtKind::Expr { expr } => *expr,
            other => panic!("expected an expression, got {other:?}"),
        };
        let ExprKind::Assign { lhs, .. } = &f.ast.expr(assign).kind else {
            panic!("expected an assignment");
        };
        assert!(matches!(f.ast.expr(*lhs).kind, ExprKind::VarRef(_)));
    }

    #[test]
    fn literal_types_follow_suffix_and_magnitude() {
        assert_eq!(parse_int_literal("1"), Some((1, TypeKind::Int)));
        assert_eq!(parse_int_literal("15u"), Some((15, TypeKind::UInt)));
        assert_eq!(parse_int_literal("0x10"), Some((16, TypeKind::Int)));
        assert_eq!(parse_int_literal("042"), Some((34, TypeKind::Int)));
        assert_eq!(
            parse_int_literal("5000000000"),
            Some((5_000_000_000, TypeKind::Long))
        );
        assert_eq!(parse_int_literal("1ull"), Some((1, TypeKind::ULongLong)));
        assert_eq!(parse_int_literal("0xffffffff"), Some((0xffff_ffff, TypeKind::UInt)));
    }

    #[test]
    fn char_literals_decode_escapes() {
        assert_eq!(parse_char_literal("'a'"), Some(97));
        assert_eq!(parse_char_literal("'\\n'"), Some(10));
        assert_eq!(parse_char_literal("'\\x41'"), Some(0x41));
        assert_eq!(parse_char_literal("'\\0'"), Some(0));
    }

    #[test]
    fn rejects_the_unsupported() {
        assert!(matches!(
            parse("int f(int *p) { return 0; }"),
            Err(ParseError::Unsupported { .. })
        ));
        assert!(matches!(
            parse("int f() { undeclared = 1; return 0; }"),
            Err(ParseError::UndeclaredIdentifier { .. })
        ));
    }

    #[test]
    fn prototypes_and_globals_are_skipped() {
        let functions = parse("int g(int);\nint global_counter;\nint f() { return 0; }").unwrap();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "f");
    }
}
