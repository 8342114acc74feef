//! The arena syntax tree produced by the front end.
//!
//! Nodes live in per-function arenas and refer to each other through index
//! newtypes ([`ExprId`], [`AstStmtId`], [`DeclId`], [`BlockId`]). The indices
//! are stable identities: every analysis that needs to talk about "the same
//! expression" does so through the id, never through structural equality.

use std::fmt::Write as _;

use crate::language::Type;

/// Denotes an expression node within a function.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    derive_more::From,
)]
#[display("e{_0}")]
pub struct ExprId(u32);

/// Denotes a front-end statement (a basic-block element) within a function.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    derive_more::From,
)]
#[display("s{_0}")]
pub struct AstStmtId(u32);

/// Denotes a variable declaration within a function.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    derive_more::From,
)]
#[display("d{_0}")]
pub struct DeclId(u32);

/// Denotes a basic block of the front-end block graph.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    derive_more::From,
)]
#[display("b{_0}")]
pub struct BlockId(u32);

impl ExprId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl AstStmtId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl DeclId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl BlockId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A source region in 1-based lines and columns, end inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// The line the region starts on.
    pub start_line: i32,
    /// The column the region starts on.
    pub start_column: i32,
    /// The line the region ends on.
    pub end_line: i32,
    /// The column the region ends on.
    pub end_column: i32,
}

impl Span {
    /// The span of synthetic nodes that have no source location.
    pub const SYNTHETIC: Self = Self {
        start_line: -1,
        start_column: -1,
        end_line: -1,
        end_column: -1,
    };

    /// The smallest span covering both operands.
    #[must_use]
    pub fn to(self, other: Self) -> Self {
        Self {
            start_line: self.start_line,
            start_column: self.start_column,
            end_line: other.end_line,
            end_column: other.end_column,
        }
    }
}

/// A local variable or parameter declaration.
#[derive(Debug, Clone)]
pub struct VarDecl {
    /// The declared name.
    pub name: String,
    /// The declared type.
    pub ty: Type,
    /// Whether the declaration is a function parameter.
    pub is_param: bool,
    /// Where the declarator appears.
    pub span: Span,
}

/// Unary operators that keep their operand's value shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `+e`
    Plus,
    /// `-e`
    Minus,
    /// `!e`
    LogicalNot,
    /// `~e`
    BitNot,
}

impl UnaryOp {
    const fn token(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::LogicalNot => "!",
            Self::BitNot => "~",
        }
    }
}

/// Increment or decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

impl UpdateOp {
    const fn token(self) -> &'static str {
        match self {
            Self::Increment => "++",
            Self::Decrement => "--",
        }
    }
}

/// Binary operators, including the comparison and logical forms the constant
/// lattice does not fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `&`
    And,
    /// `|`
    Or,
    /// `^`
    Xor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `&&`
    LogicalAnd,
    /// `||`
    LogicalOr,
}

impl BinaryOp {
    /// The source spelling of the operator.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::LogicalAnd => "&&",
            Self::LogicalOr => "||",
        }
    }

    /// Whether the operator is one of the arithmetic/bitwise forms the
    /// constant lattice folds.
    #[must_use]
    pub const fn is_foldable(self) -> bool {
        matches!(
            self,
            Self::Add
                | Self::Sub
                | Self::Mul
                | Self::Div
                | Self::Rem
                | Self::And
                | Self::Or
                | Self::Xor
                | Self::Shl
                | Self::Shr
        )
    }

    /// Whether the operator is division or modulus.
    #[must_use]
    pub const fn is_division(self) -> bool {
        matches!(self, Self::Div | Self::Rem)
    }
}

/// The kind of a cast node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    /// The implicit conversion from an object to the value stored in it.
    /// Reading through one of these is what distinguishes a *use* of a
    /// variable from a mention of it.
    LvalueToRvalue,
    /// A cast written in the source; the target type is the node's type.
    Explicit,
}

/// An expression node.
#[derive(Debug, Clone)]
pub struct Expr {
    /// What the expression is.
    pub kind: ExprKind,
    /// The expression's type.
    pub ty: Type,
    /// Where the expression appears.
    pub span: Span,
}

/// The classification of an expression node.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// An integer literal, stored as raw bits; the node type carries the
    /// literal's width and signedness.
    IntLiteral(u64),
    /// A character literal.
    CharLiteral(u32),
    /// A reference to a variable, resolved to its declaration.
    VarRef(DeclId),
    /// `(e)`
    Paren(ExprId),
    /// `+e`, `-e`, `!e`, `~e`
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: ExprId,
    },
    /// `++e`, `--e`, `e++`, `e--`
    Update {
        /// Increment or decrement.
        op: UpdateOp,
        /// Whether the operator is written before the operand.
        prefix: bool,
        /// The operand.
        operand: ExprId,
    },
    /// A cast; the target type is the node's type.
    Cast {
        /// How the cast came to be.
        kind: CastKind,
        /// The operand.
        operand: ExprId,
    },
    /// `a ⊙ b`
    Binary {
        /// The operator.
        op: BinaryOp,
        /// The left operand.
        lhs: ExprId,
        /// The right operand.
        rhs: ExprId,
    },
    /// `a = b`
    Assign {
        /// The assigned-to operand.
        lhs: ExprId,
        /// The assigned value.
        rhs: ExprId,
    },
    /// `a ⊙= b`
    CompoundAssign {
        /// The operator combined with the assignment.
        op: BinaryOp,
        /// The assigned-to operand.
        lhs: ExprId,
        /// The right operand.
        rhs: ExprId,
    },
    /// `a[i]`
    Subscript {
        /// The subscripted operand.
        base: ExprId,
        /// The index.
        index: ExprId,
    },
    /// `c ? a : b`
    Conditional {
        /// The condition.
        cond: ExprId,
        /// The value when the condition holds.
        then_value: ExprId,
        /// The value otherwise.
        else_value: ExprId,
    },
    /// `f(a, b, ...)`
    Call {
        /// The name of the called function.
        callee: String,
        /// The arguments.
        args: Vec<ExprId>,
    },
    /// `a, b`
    Comma {
        /// The discarded operand.
        lhs: ExprId,
        /// The value operand.
        rhs: ExprId,
    },
}

/// A front-end statement: one element of a basic block.
#[derive(Debug, Clone)]
pub struct AstStmt {
    /// What the statement is.
    pub kind: AstStmtKind,
    /// Where the statement appears.
    pub span: Span,
}

/// The classification of a front-end statement.
#[derive(Debug, Clone)]
pub enum AstStmtKind {
    /// A single declarator of a declaration (`int x = e;` — multi-declarator
    /// declarations are split into one statement per declarator).
    Decl {
        /// The declared variable.
        decl: DeclId,
        /// The initialiser, if any.
        init: Option<ExprId>,
    },
    /// An expression evaluated for its effects, or a branch condition.
    Expr {
        /// The expression.
        expr: ExprId,
    },
    /// `return e;` / `return;`
    Return {
        /// The returned value, if any.
        value: Option<ExprId>,
    },
}

/// A basic block of front-end statements.
#[derive(Debug, Clone, Default)]
pub struct BasicBlock {
    /// The statements of the block, in execution order.
    pub elements: Vec<AstStmtId>,
    /// The blocks control may transfer to after this one.
    pub succs: Vec<BlockId>,
}

/// The front-end's own control flow graph: basic blocks of statements with
/// successor lists and distinguished entry/exit blocks (both empty).
#[derive(Debug, Clone)]
pub struct BlockGraph {
    pub(crate) blocks: Vec<BasicBlock>,
    pub(crate) entry: BlockId,
    pub(crate) exit: BlockId,
}

impl BlockGraph {
    /// The distinguished entry block.
    #[must_use]
    pub const fn entry(&self) -> BlockId {
        self.entry
    }

    /// The distinguished exit block.
    #[must_use]
    pub const fn exit(&self) -> BlockId {
        self.exit
    }

    /// The block with the given id.
    #[must_use]
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    /// Iterates over all blocks with their ids.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &BasicBlock)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (BlockId::from(u32::try_from(i).expect("block count fits u32")), b))
    }
}

/// The complete front-end view of one function body: node arenas plus the
/// block graph over them.
#[derive(Debug, Clone)]
pub struct FunctionAst {
    pub(crate) decls: Vec<VarDecl>,
    pub(crate) exprs: Vec<Expr>,
    pub(crate) stmts: Vec<AstStmt>,
    pub(crate) blocks: BlockGraph,
}

impl FunctionAst {
    /// The declaration with the given id.
    #[must_use]
    pub fn decl(&self, id: DeclId) -> &VarDecl {
        &self.decls[id.index()]
    }

    /// The expression with the given id.
    #[must_use]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// The statement with the given id.
    #[must_use]
    pub fn stmt(&self, id: AstStmtId) -> &AstStmt {
        &self.stmts[id.index()]
    }

    /// The block graph of the function body.
    #[must_use]
    pub const fn blocks(&self) -> &BlockGraph {
        &self.blocks
    }

    /// Strips parentheses and reads through lvalue-to-rvalue conversions to
    /// find the variable an expression directly names, if any.
    #[must_use]
    pub fn as_var_ref(&self, mut id: ExprId) -> Option<DeclId> {
        loop {
            match &self.expr(id).kind {
                ExprKind::VarRef(decl) => return Some(*decl),
                ExprKind::Paren(inner) => id = *inner,
                ExprKind::Cast {
                    kind: CastKind::LvalueToRvalue,
                    operand,
                } => id = *operand,
                _ => return None,
            }
        }
    }

    /// Renders a statement the way the analyser reports it (`int x;`,
    /// `y = x = 1`, `return y`).
    #[must_use]
    pub fn render_stmt(&self, id: AstStmtId) -> String {
        match &self.stmt(id).kind {
            AstStmtKind::Decl { decl, init } => {
                let decl = self.decl(*decl);
                match init {
                    Some(init) => {
                        format!("{} {} = {};", decl.ty, decl.name, self.render_expr(*init))
                    }
                    None => format!("{} {};", decl.ty, decl.name),
                }
            }
            AstStmtKind::Expr { expr } => self.render_expr(*expr),
            AstStmtKind::Return { value: Some(value) } => {
                format!("return {}", self.render_expr(*value))
            }
            AstStmtKind::Return { value: None } => "return".to_string(),
        }
    }

    /// Renders an expression with minimal parentheses (explicit [`Paren`]
    /// nodes are always kept).
    ///
    /// [`Paren`]: ExprKind::Paren
    #[must_use]
    pub fn render_expr(&self, id: ExprId) -> String {
        let mut out = String::new();
        self.render_into(&mut out, id, 0);
        out
    }

    fn precedence(&self, id: ExprId) -> u8 {
        match &self.expr(id).kind {
            ExprKind::IntLiteral(_)
            | ExprKind::CharLiteral(_)
            | ExprKind::VarRef(_)
            | ExprKind::Paren(_) => 16,
            ExprKind::Subscript { .. } | ExprKind::Call { .. } => 15,
            ExprKind::Update { prefix, .. } => {
                if *prefix {
                    14
                } else {
                    15
                }
            }
            ExprKind::Unary { .. } => 14,
            ExprKind::Cast { kind, operand } => match kind {
                CastKind::LvalueToRvalue => self.precedence(*operand),
                CastKind::Explicit => 14,
            },
            ExprKind::Binary { op, .. } => match op {
                BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 13,
                BinaryOp::Add | BinaryOp::Sub => 12,
                BinaryOp::Shl | BinaryOp::Shr => 11,
                BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 10,
                BinaryOp::Eq | BinaryOp::Ne => 9,
                BinaryOp::And => 8,
                BinaryOp::Xor => 7,
                BinaryOp::Or => 6,
                BinaryOp::LogicalAnd => 5,
                BinaryOp::LogicalOr => 4,
            },
            ExprKind::Conditional { .. } => 3,
            ExprKind::Assign { .. } | ExprKind::CompoundAssign { .. } => 2,
            ExprKind::Comma { .. } => 1,
        }
    }

    fn render_into(&self, out: &mut String, id: ExprId, min_precedence: u8) {
        let precedence = self.precedence(id);
        let parenthesise = precedence < min_precedence;
        if parenthesise {
            out.push('(');
        }
        match &self.expr(id).kind {
            ExprKind::IntLiteral(bits) => {
                let ty = &self.expr(id).ty;
                if ty.is_signed_integer() {
                    #[allow(clippy::cast_possible_wrap)]
                    let _ = write!(out, "{}", *bits as i64);
                } else {
                    let _ = write!(out, "{bits}");
                }
            }
            ExprKind::CharLiteral(c) => {
                match char::from_u32(*c) {
                    Some(c @ (' '..='~')) => {
                        let _ = write!(out, "'{}'", c.escape_default());
                    }
                    _ => {
                        let _ = write!(out, "'\\x{c:02x}'");
                    }
                };
            }
            ExprKind::VarRef(decl) => out.push_str(&self.decl(*decl).name),
            ExprKind::Paren(inner) => {
                out.push('(');
                self.render_into(out, *inner, 0);
                out.push(')');
            }
            ExprKind::Unary { op, operand } => {
                out.push_str(op.token());
                self.render_into(out, *operand, 14);
            }
            ExprKind::Update {
                op,
                prefix,
                operand,
            } => {
                if *prefix {
                    out.push_str(op.token());
                    self.render_into(out, *operand, 14);
                } else {
                    self.render_into(out, *operand, 15);
                    out.push_str(op.token());
                }
            }
            ExprKind::Cast { kind, operand } => match kind {
                CastKind::LvalueToRvalue => self.render_into(out, *operand, min_precedence),
                CastKind::Explicit => {
                    let _ = write!(out, "({})", self.expr(id).ty);
                    self.render_into(out, *operand, 14);
                }
            },
            ExprKind::Binary { op, lhs, rhs } => {
                self.render_into(out, *lhs, precedence);
                let _ = write!(out, " {} ", op.token());
                self.render_into(out, *rhs, precedence + 1);
            }
            ExprKind::Assign { lhs, rhs } => {
                self.render_into(out, *lhs, 15);
                out.push_str(" = ");
                self.render_into(out, *rhs, precedence);
            }
            ExprKind::CompoundAssign { op, lhs, rhs } => {
                self.render_into(out, *lhs, 15);
                let _ = write!(out, " {}= ", op.token());
                self.render_into(out, *rhs, precedence);
            }
            ExprKind::Subscript { base, index } => {
                self.render_into(out, *base, 15);
                out.push('[');
                self.render_into(out, *index, 0);
                out.push(']');
            }
            ExprKind::Conditional {
                cond,
                then_value,
                else_value,
            } => {
                self.render_into(out, *cond, 4);
                out.push_str(" ? ");
                self.render_into(out, *then_value, 0);
                out.push_str(" : ");
                self.render_into(out, *else_value, precedence);
            }
            ExprKind::Call { callee, args } => {
                out.push_str(callee);
                out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.render_into(out, *arg, 2);
                }
                out.push(')');
            }
            ExprKind::Comma { lhs, rhs } => {
                self.render_into(out, *lhs, 2);
                out.push_str(", ");
                self.render_into(out, *rhs, 1);
            }
        }
        if parenthesise {
            out.push(')');
        }
    }

    pub(crate) fn push_decl(&mut self, decl: VarDecl) -> DeclId {
        let id = DeclId::from(u32::try_from(self.decls.len()).expect("decl count fits u32"));
        self.decls.push(decl);
        id
    }

    pub(crate) fn push_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::from(u32::try_from(self.exprs.len()).expect("expr count fits u32"));
        self.exprs.push(expr);
        id
    }

    pub(crate) fn push_stmt(&mut self, stmt: AstStmt) -> AstStmtId {
        let id = AstStmtId::from(u32::try_from(self.stmts.len()).expect("stmt count fits u32"));
        self.stmts.push(stmt);
        id
    }

    pub(crate) fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.index()]
    }

    pub(crate) fn empty() -> Self {
        Self {
            decls: Vec::new(),
            exprs: Vec::new(),
            stmts: Vec::new(),
            blocks: BlockGraph {
                blocks: Vec::new(),
                entry: BlockId::from(0),
                exit: BlockId::from(0),
            },
        }
    }
}
