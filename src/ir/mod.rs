//! The per-method intermediate representation.

pub mod builder;
mod stmt;
mod var;

pub use stmt::{Stmt, StmtId};
pub use var::{Var, VarId};

use std::sync::Arc;

use crate::analysis::graph::Cfg;
use crate::frontend::ast::FunctionAst;

/// The per-method bundle the analyses run on: parameters, the variable
/// universe, the statement list ordered by source position, and the control
/// flow graph over the statements. Immutable after build.
#[derive(Debug)]
pub struct Ir {
    method_signature: String,
    ast: Arc<FunctionAst>,
    params: Vec<VarId>,
    vars: Vec<Var>,
    stmts: Vec<Stmt>,
    stmt_order: Vec<StmtId>,
    cfg: Cfg,
}

impl Ir {
    pub(crate) fn new(
        method_signature: String,
        ast: Arc<FunctionAst>,
        params: Vec<VarId>,
        vars: Vec<Var>,
        stmts: Vec<Stmt>,
        stmt_order: Vec<StmtId>,
        cfg: Cfg,
    ) -> Self {
        Self {
            method_signature,
            ast,
            params,
            vars,
            stmts,
            stmt_order,
            cfg,
        }
    }

    /// The signature of the method this IR represents.
    #[must_use]
    pub fn method_signature(&self) -> &str {
        &self.method_signature
    }

    /// The front-end syntax tree the statements refer back into.
    #[must_use]
    pub fn ast(&self) -> &FunctionAst {
        &self.ast
    }

    /// The method's parameters, in order.
    pub fn params(&self) -> impl Iterator<Item = &Var> {
        self.params.iter().map(|&id| self.var(id))
    }

    /// Every variable of the method, parameters included, unique by
    /// identity.
    pub fn vars(&self) -> impl Iterator<Item = &Var> {
        self.vars.iter()
    }

    /// The variable with the given identity.
    ///
    /// # Panics
    /// Panics when the id does not belong to this IR.
    #[must_use]
    pub fn var(&self, id: VarId) -> &Var {
        &self.vars[id.index()]
    }

    /// Looks a variable up by its integer identity.
    #[must_use]
    pub fn var_by_identity(&self, identity: u64) -> Option<&Var> {
        usize::try_from(identity)
            .ok()
            .and_then(|index| self.vars.get(index))
    }

    /// The statements of the method, ordered by source start line, ties
    /// broken by start column. Synthetic stand-ins for empty blocks come
    /// first; the CFG's entry/exit nops are not part of the list.
    pub fn stmts(&self) -> impl Iterator<Item = &Stmt> {
        self.stmt_order.iter().map(|&id| self.stmt(id))
    }

    /// The statement with the given identity (entry/exit nops included).
    ///
    /// # Panics
    /// Panics when the id does not belong to this IR.
    #[must_use]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    /// The control flow graph over this IR's statements.
    #[must_use]
    pub const fn cfg(&self) -> &Cfg {
        &self.cfg
    }
}
