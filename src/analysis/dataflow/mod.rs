//! The dataflow framework: fact lattices, the analysis contract, the
//! worklist solver, and the bundled analyses.

pub mod constant_propagation;
pub mod fact;
pub mod live_variable;
pub mod reaching_definition;
pub mod solver;

use crate::analysis::graph::{Cfg, CfgEdge};
use crate::ir::{Ir, Stmt};

/// A dataflow analysis problem over fact type [`Self::Fact`].
///
/// Implementations must provide monotonic transfer functions over a
/// finite-height lattice; the solver relies on both for termination.
pub trait DataflowAnalysis {
    /// The lattice value attached to each program point.
    type Fact: Clone + PartialEq;

    /// Whether facts propagate along control flow (`true`) or against it.
    fn is_forward(&self) -> bool;

    /// The fact at the boundary node: the entry in a forward analysis, the
    /// exit in a backward one.
    fn new_boundary_fact(&self) -> Self::Fact;

    /// The initial fact at every non-boundary node.
    fn new_initial_fact(&self) -> Self::Fact;

    /// Merges `fact` into `target` in place (the lattice's join), handling
    /// control-flow confluence.
    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact);

    /// The node transfer function: updates the out fact from the in fact
    /// (forward) or the in fact from the out fact (backward); reports
    /// whether the updated side changed.
    fn transfer_node(
        &self,
        stmt: &Stmt,
        in_fact: &mut Self::Fact,
        out_fact: &mut Self::Fact,
    ) -> bool;

    /// Whether the analysis wants [`Self::transfer_edge`] applied to the
    /// edge. The bundled solver never asks.
    fn needs_transfer_edge(&self, edge: &CfgEdge) -> bool {
        let _ = edge;
        false
    }

    /// The edge transfer function.
    ///
    /// # Panics
    /// The default implementation panics: edge transfer is unsupported
    /// unless an analysis overrides it, and the bundled solver never
    /// invokes it.
    fn transfer_edge(&self, edge: &CfgEdge, node_fact: &Self::Fact) -> Self::Fact {
        let _ = (edge, node_fact);
        panic!("edge transfer is unsupported by this analysis")
    }

    /// The control flow graph the analysis iterates over.
    fn cfg(&self) -> &Cfg;

    /// The IR owning the graph's statements.
    fn ir(&self) -> &Ir;
}
