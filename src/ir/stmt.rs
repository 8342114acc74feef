//! The statement abstraction: one unit of computation with its source span
//! and use/def sets.

use std::collections::BTreeSet;

use crate::frontend::ast::{
    AstStmtId, AstStmtKind, CastKind, DeclId, ExprId, ExprKind, FunctionAst, Span,
};

use super::var::VarId;

/// The identity of a [`Stmt`] within its IR.
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
#[display("#{_0}")]
pub struct StmtId(u32);

impl StmtId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<StmtId> for u32 {
    fn from(id: StmtId) -> Self {
        id.0
    }
}

/// One unit of computation: a front-end statement wrapped with its span,
/// rendering, and the variables it may define and read.
///
/// Synthetic nop statements (the CFG's entry/exit and the stand-ins for
/// empty blocks) have no front-end handle, an empty use/def set, and the
/// span `(-1, -1)`.
#[derive(Debug, Clone)]
pub struct Stmt {
    id: StmtId,
    span: Span,
    rendering: String,
    ast: Option<AstStmtId>,
    defs: BTreeSet<VarId>,
    uses: BTreeSet<VarId>,
}

impl Stmt {
    pub(crate) fn new(
        id: StmtId,
        span: Span,
        rendering: String,
        ast: AstStmtId,
        defs: BTreeSet<VarId>,
        uses: BTreeSet<VarId>,
    ) -> Self {
        Self {
            id,
            span,
            rendering,
            ast: Some(ast),
            defs,
            uses,
        }
    }

    pub(crate) fn nop(id: StmtId) -> Self {
        Self {
            id,
            span: Span::SYNTHETIC,
            rendering: "nop".to_string(),
            ast: None,
            defs: BTreeSet::new(),
            uses: BTreeSet::new(),
        }
    }

    /// The identity of this statement.
    #[must_use]
    pub const fn id(&self) -> StmtId {
        self.id
    }

    /// The source span of this statement.
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }

    /// The 1-based line the statement starts on (`-1` for nops).
    #[must_use]
    pub const fn start_line(&self) -> i32 {
        self.span.start_line
    }

    /// The 1-based column the statement starts on (`-1` for nops).
    #[must_use]
    pub const fn start_column(&self) -> i32 {
        self.span.start_column
    }

    /// The 1-based line the statement ends on, inclusive (`-1` for nops).
    #[must_use]
    pub const fn end_line(&self) -> i32 {
        self.span.end_line
    }

    /// The 1-based column the statement ends on, inclusive (`-1` for nops).
    #[must_use]
    pub const fn end_column(&self) -> i32 {
        self.span.end_column
    }

    /// The variables this statement may assign to.
    #[must_use]
    pub const fn defs(&self) -> &BTreeSet<VarId> {
        &self.defs
    }

    /// The variables whose value this statement reads.
    #[must_use]
    pub const fn uses(&self) -> &BTreeSet<VarId> {
        &self.uses
    }

    /// The front-end statement this wraps, absent for synthetic nops.
    #[must_use]
    pub const fn ast_stmt(&self) -> Option<AstStmtId> {
        self.ast
    }

    /// Whether this is a synthetic nop.
    #[must_use]
    pub const fn is_nop(&self) -> bool {
        self.ast.is_none()
    }

    /// The human-readable rendering of this statement.
    #[must_use]
    pub fn rendering(&self) -> &str {
        &self.rendering
    }
}

impl std::fmt::Display for Stmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.rendering)
    }
}

/// Computes the def and use sets of a front-end statement.
///
/// The rules: a declaration defines its variable only when initialised;
/// an assignment left side is a def and its right side is read; a compound
/// assignment or increment/decrement both reads and defines its target; a
/// variable reference behind an lvalue-to-rvalue conversion is a use; any
/// other variable reference counts as a def.
pub(crate) fn extract_use_def(
    ast: &FunctionAst,
    stmt: AstStmtId,
    resolve: &mut dyn FnMut(DeclId) -> VarId,
) -> (BTreeSet<VarId>, BTreeSet<VarId>) {
    let mut extractor = Extractor {
        ast,
        resolve,
        defs: BTreeSet::new(),
        uses: BTreeSet::new(),
    };
    match &ast.stmt(stmt).kind {
        AstStmtKind::Decl { decl, init } => {
            // Materialise the variable even when nothing initialises it, so
            // the variable universe covers never-assigned declarations.
            let var = (extractor.resolve)(*decl);
            if let Some(init) = init {
                extractor.defs.insert(var);
                extractor.walk(*init);
            }
        }
        AstStmtKind::Expr { expr } => extractor.walk(*expr),
        AstStmtKind::Return { value } => {
            if let Some(value) = value {
                extractor.walk(*value);
            }
        }
    }
    (extractor.defs, extractor.uses)
}

struct Extractor<'a> {
    ast: &'a FunctionAst,
    resolve: &'a mut dyn FnMut(DeclId) -> VarId,
    defs: BTreeSet<VarId>,
    uses: BTreeSet<VarId>,
}

impl Extractor<'_> {
    fn walk(&mut self, id: ExprId) {
        match &self.ast.expr(id).kind {
            ExprKind::IntLiteral(_) | ExprKind::CharLiteral(_) => {}
            ExprKind::VarRef(decl) => {
                let var = (self.resolve)(*decl);
                self.defs.insert(var);
            }
            ExprKind::Cast {
                kind: CastKind::LvalueToRvalue,
                operand,
            } => {
                if let ExprKind::VarRef(decl) = self.ast.expr(*operand).kind {
                    let var = (self.resolve)(decl);
                    self.uses.insert(var);
                } else {
                    self.walk(*operand);
                }
            }
            ExprKind::Paren(operand)
            | ExprKind::Cast { operand, .. }
            | ExprKind::Unary { operand, .. } => self.walk(*operand),
            ExprKind::Update { operand, .. } => match self.ast.as_var_ref(*operand) {
                Some(decl) => {
                    let var = (self.resolve)(decl);
                    self.uses.insert(var);
                    self.defs.insert(var);
                }
                None => self.walk(*operand),
            },
            ExprKind::CompoundAssign { lhs, rhs, .. } => {
                match self.ast.as_var_ref(*lhs) {
                    Some(decl) => {
                        let var = (self.resolve)(decl);
                        self.uses.insert(var);
                        self.defs.insert(var);
                    }
                    None => self.walk(*lhs),
                }
                self.walk(*rhs);
            }
            ExprKind::Binary { lhs, rhs, .. }
            | ExprKind::Assign { lhs, rhs }
            | ExprKind::Comma { lhs, rhs } => {
                self.walk(*lhs);
                self.walk(*rhs);
            }
            ExprKind::Subscript { base, index } => {
                self.walk(*base);
                self.walk(*index);
            }
            ExprKind::Conditional {
                cond,
                then_value,
                else_value,
            } => {
                self.walk(*cond);
                self.walk(*then_value);
                self.walk(*else_value);
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    self.walk(*arg);
                }
            }
        }
    }
}
