//! Reaching definitions: which assignments may reach each program point.

use std::collections::BTreeMap;

use crate::analysis::graph::Cfg;
use crate::analysis::{AnalysisConfig, MethodAnalysis};
use crate::ir::{Ir, Stmt, StmtId, VarId};

use super::fact::{DataflowResult, SetFact};
use super::solver::{self, Solver};
use super::DataflowAnalysis;

/// The reaching-definitions analysis: a forward may-analysis whose facts
/// are sets of defining statements.
#[derive(Debug)]
pub struct ReachingDefinition {
    config: AnalysisConfig,
}

impl ReachingDefinition {
    /// Creates the analysis from its configuration.
    #[must_use]
    pub const fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }
}

impl MethodAnalysis for ReachingDefinition {
    type Output = DataflowResult<SetFact<StmtId>>;

    fn analyze(&self, ir: &Ir) -> Self::Output {
        let analysis = Analysis::new(ir);
        solver::make_solver().solve(&analysis)
    }

    fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

struct Analysis<'ir> {
    ir: &'ir Ir,
    /// For each variable, every statement that may define it; the kill set
    /// of a defining statement is the union of its variables' entries.
    defs: BTreeMap<VarId, SetFact<StmtId>>,
}

impl<'ir> Analysis<'ir> {
    fn new(ir: &'ir Ir) -> Self {
        let mut defs: BTreeMap<VarId, SetFact<StmtId>> = ir
            .vars()
            .map(|var| (var.id(), SetFact::new()))
            .collect();
        for stmt in ir.stmts() {
            for &var in stmt.defs() {
                defs.get_mut(&var)
                    .expect("every def variable is in the universe")
                    .add(stmt.id());
            }
        }
        Self { ir, defs }
    }
}

impl DataflowAnalysis for Analysis<'_> {
    type Fact = SetFact<StmtId>;

    fn is_forward(&self) -> bool {
        true
    }

    fn new_boundary_fact(&self) -> Self::Fact {
        self.new_initial_fact()
    }

    fn new_initial_fact(&self) -> Self::Fact {
        SetFact::new()
    }

    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact) {
        target.union(fact);
    }

    fn transfer_node(
        &self,
        stmt: &Stmt,
        in_fact: &mut Self::Fact,
        out_fact: &mut Self::Fact,
    ) -> bool {
        let old_out = out_fact.clone();
        out_fact.set_to(in_fact);
        for &var in stmt.defs() {
            out_fact.remove_all(&self.defs[&var]);
        }
        if !stmt.defs().is_empty() {
            out_fact.add(stmt.id());
        }
        *out_fact != old_out
    }

    fn cfg(&self) -> &Cfg {
        self.ir.cfg()
    }

    fn ir(&self) -> &Ir {
        self.ir
    }
}
