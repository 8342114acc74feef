//! Translation of the front-end block graph into the per-statement IR.

use std::collections::BTreeMap;
use std::sync::Arc;

use itertools::Itertools;
use tracing::debug;

use crate::analysis::graph::{Cfg, CfgEdge, EdgeKind};
use crate::frontend::ast::{AstStmtId, BlockId, DeclId};
use crate::language::CppMethod;

use super::stmt::{self, Stmt, StmtId};
use super::var::{Var, VarId};

/// Builds IR for concrete methods.
pub trait IrBuilder {
    /// Builds the intermediate representation of a method.
    fn build_ir(&self, method: &CppMethod) -> super::Ir;
}

/// The default IR builder: wraps every block element in a [`Stmt`], seeds
/// the variable universe from parameters and use/def sets, and lays
/// kind-labelled edges over the front-end block graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultIrBuilder;

impl IrBuilder for DefaultIrBuilder {
    fn build_ir(&self, method: &CppMethod) -> super::Ir {
        debug!(signature = method.signature(), "building ir");
        Helper::new(method).build()
    }
}

struct Helper<'m> {
    method: &'m CppMethod,
    vars: Vec<Var>,
    var_of_decl: BTreeMap<DeclId, VarId>,
    stmts: Vec<Stmt>,
    stmt_of: BTreeMap<AstStmtId, StmtId>,
}

impl<'m> Helper<'m> {
    fn new(method: &'m CppMethod) -> Self {
        Self {
            method,
            vars: Vec::new(),
            var_of_decl: BTreeMap::new(),
            stmts: Vec::new(),
            stmt_of: BTreeMap::new(),
        }
    }

    fn build(mut self) -> super::Ir {
        let params = self.build_params();
        self.build_stmts();
        let (cfg, nops) = self.build_edges();
        let stmt_order = self
            .stmt_of
            .values()
            .copied()
            .chain(nops)
            .sorted_by_key(|&id| {
                let stmt = &self.stmts[id.index()];
                (stmt.start_line(), stmt.start_column())
            })
            .collect();
        super::Ir::new(
            self.method.signature().to_string(),
            Arc::clone(self.method.ast()),
            params,
            self.vars,
            self.stmts,
            stmt_order,
            cfg,
        )
    }

    fn build_params(&mut self) -> Vec<VarId> {
        self.method
            .param_decls()
            .to_vec()
            .into_iter()
            .map(|decl| self.var_of(decl))
            .collect()
    }

    fn var_of(&mut self, decl: DeclId) -> VarId {
        if let Some(&var) = self.var_of_decl.get(&decl) {
            return var;
        }
        let id = VarId::from(u32::try_from(self.vars.len()).expect("var count fits u32"));
        let declaration = self.method.ast().decl(decl);
        self.vars.push(Var::new(
            id,
            declaration.name.clone(),
            declaration.ty.clone(),
            decl,
        ));
        self.var_of_decl.insert(decl, id);
        id
    }

    /// Wraps every block element in a statement and populates the variable
    /// universe from the use/def sets.
    fn build_stmts(&mut self) {
        let ast = Arc::clone(self.method.ast());
        for (_, block) in ast.blocks().blocks() {
            for &element in &block.elements {
                let id = self.fresh_stmt_id();
                let mut resolve = |decl: DeclId| self.var_of(decl);
                let (defs, uses) = stmt::extract_use_def(&ast, element, &mut resolve);
                let node = ast.stmt(element);
                self.stmts.push(Stmt::new(
                    id,
                    node.span,
                    ast.render_stmt(element),
                    element,
                    defs,
                    uses,
                ));
                self.stmt_of.insert(element, id);
            }
        }
    }

    fn fresh_stmt_id(&self) -> StmtId {
        StmtId::from(u32::try_from(self.stmts.len()).expect("stmt count fits u32"))
    }

    /// Lays the edges: fall-through inside blocks, entry/exit edges at the
    /// boundary, jump edges between blocks, with a synthetic nop standing in
    /// for each empty block (created at most once per block).
    fn build_edges(&mut self) -> (Cfg, Vec<StmtId>) {
        let ast = Arc::clone(self.method.ast());
        let graph = ast.blocks();

        let entry = self.push_nop();
        let exit = self.push_nop();
        let mut cfg = Cfg::new(entry, exit);
        let mut stand_ins: BTreeMap<BlockId, StmtId> = BTreeMap::new();

        for (block_id, block) in graph.blocks() {
            for (&from, &to) in block.elements.iter().tuple_windows() {
                cfg.add_edge(CfgEdge {
                    kind: EdgeKind::FallThrough,
                    source: self.stmt_of[&from],
                    target: self.stmt_of[&to],
                });
            }
            for &element in &block.elements {
                cfg.insert_node(self.stmt_of[&element]);
            }

            if block.succs.is_empty() {
                continue;
            }
            let (source, kind) = if block_id == graph.entry() {
                (entry, EdgeKind::Entry)
            } else if let Some(&last) = block.elements.last() {
                (self.stmt_of[&last], EdgeKind::Jump)
            } else {
                (self.stand_in(&mut stand_ins, block_id), EdgeKind::Jump)
            };
            for &succ in &block.succs {
                if succ == graph.exit() {
                    cfg.add_edge(CfgEdge {
                        kind: EdgeKind::Exit,
                        source,
                        target: exit,
                    });
                } else {
                    let target = match graph.block(succ).elements.first() {
                        Some(&first) => self.stmt_of[&first],
                        None => self.stand_in(&mut stand_ins, succ),
                    };
                    cfg.add_edge(CfgEdge {
                        kind,
                        source,
                        target,
                    });
                }
            }
        }
        (cfg, stand_ins.into_values().collect())
    }

    fn push_nop(&mut self) -> StmtId {
        let id = self.fresh_stmt_id();
        self.stmts.push(Stmt::nop(id));
        id
    }

    fn stand_in(&mut self, stand_ins: &mut BTreeMap<BlockId, StmtId>, block: BlockId) -> StmtId {
        if let Some(&nop) = stand_ins.get(&block) {
            return nop;
        }
        let nop = self.push_nop();
        stand_ins.insert(block, nop);
        nop
    }
}
