//! Live variables: which variables may still be read after each program
//! point.

use crate::analysis::graph::Cfg;
use crate::analysis::{AnalysisConfig, MethodAnalysis};
use crate::ir::{Ir, Stmt, VarId};

use super::fact::{DataflowResult, SetFact};
use super::solver::{self, Solver};
use super::DataflowAnalysis;

/// The live-variables analysis: a backward may-analysis whose facts are
/// sets of variables.
#[derive(Debug)]
pub struct LiveVariable {
    config: AnalysisConfig,
}

impl LiveVariable {
    /// Creates the analysis from its configuration.
    #[must_use]
    pub const fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }
}

impl MethodAnalysis for LiveVariable {
    type Output = DataflowResult<SetFact<VarId>>;

    fn analyze(&self, ir: &Ir) -> Self::Output {
        let analysis = Analysis { ir };
        solver::make_solver().solve(&analysis)
    }

    fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

struct Analysis<'ir> {
    ir: &'ir Ir,
}

impl DataflowAnalysis for Analysis<'_> {
    type Fact = SetFact<VarId>;

    fn is_forward(&self) -> bool {
        false
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
        let old_in = in_fact.clone();
        in_fact.set_to(out_fact);
        for &var in stmt.defs() {
            in_fact.remove(var);
        }
        for &var in stmt.uses() {
            in_fact.add(var);
        }
        *in_fact != old_in
    }

    fn cfg(&self) -> &Cfg {
        self.ir.cfg()
    }

    fn ir(&self) -> &Ir {
        self.ir
    }
}
