//! Fixed-point solvers for dataflow analyses.

use std::collections::{BTreeMap, VecDeque};

use crate::ir::StmtId;

use super::{DataflowAnalysis, fact::DataflowResult};

/// A dataflow solver.
pub trait Solver<A: DataflowAnalysis> {
    /// Solves the analysis problem to its fixed point.
    fn solve(&self, analysis: &A) -> DataflowResult<A::Fact>;
}

/// Obtains the default solver for an analysis: FIFO worklist iteration.
#[must_use]
pub fn make_solver<A: DataflowAnalysis>() -> impl Solver<A> {
    WorkListSolver
}

/// The worklist solver: initialises boundary/initial facts, then pops
/// statements from a FIFO queue and re-applies meet and transfer until no
/// transfer reports change.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkListSolver;

impl<A: DataflowAnalysis> Solver<A> for WorkListSolver {
    fn solve(&self, analysis: &A) -> DataflowResult<A::Fact> {
        let (mut in_facts, mut out_facts) = initialize(analysis);
        if analysis.is_forward() {
            solve_forward(analysis, &mut in_facts, &mut out_facts);
        } else {
            solve_backward(analysis, &mut in_facts, &mut out_facts);
        }
        DataflowResult::new(in_facts, out_facts)
    }
}

type Facts<A> = BTreeMap<StmtId, <A as DataflowAnalysis>::Fact>;

/// Assigns the boundary fact to both sides of the boundary node and the
/// initial fact everywhere else (the far end included).
fn initialize<A: DataflowAnalysis>(analysis: &A) -> (Facts<A>, Facts<A>) {
    let cfg = analysis.cfg();
    let (boundary, other_end) = if analysis.is_forward() {
        (cfg.entry(), cfg.exit())
    } else {
        (cfg.exit(), cfg.entry())
    };
    let mut in_facts = BTreeMap::new();
    let mut out_facts = BTreeMap::new();
    in_facts.insert(boundary, analysis.new_boundary_fact());
    out_facts.insert(boundary, analysis.new_boundary_fact());
    for stmt in analysis.ir().stmts() {
        in_facts.insert(stmt.id(), analysis.new_initial_fact());
        out_facts.insert(stmt.id(), analysis.new_initial_fact());
    }
    in_facts.insert(other_end, analysis.new_initial_fact());
    out_facts.insert(other_end, analysis.new_initial_fact());
    (in_facts, out_facts)
}

fn solve_forward<A: DataflowAnalysis>(
    analysis: &A,
    in_facts: &mut Facts<A>,
    out_facts: &mut Facts<A>,
) {
    let cfg = analysis.cfg();
    let ir = analysis.ir();
    let mut work_list: VecDeque<StmtId> = std::iter::once(cfg.entry())
        .chain(ir.stmts().map(crate::ir::Stmt::id))
        .chain(std::iter::once(cfg.exit()))
        .collect();
    while let Some(stmt) = work_list.pop_front() {
        if stmt == cfg.entry() {
            continue;
        }
        {
            let in_fact = in_facts.get_mut(&stmt).expect("facts are initialised");
            for pred in cfg.preds_of(stmt) {
                let pred_out = out_facts.get(&pred).expect("facts are initialised");
                analysis.meet_into(pred_out, in_fact);
            }
        }
        let in_fact = in_facts.get_mut(&stmt).expect("facts are initialised");
        let out_fact = out_facts.get_mut(&stmt).expect("facts are initialised");
        if analysis.transfer_node(ir.stmt(stmt), in_fact, out_fact) {
            work_list.extend(cfg.succs_of(stmt));
        }
    }
}

fn solve_backward<A: DataflowAnalysis>(
    analysis: &A,
    in_facts: &mut Facts<A>,
    out_facts: &mut Facts<A>,
) {
    let cfg = analysis.cfg();
    let ir = analysis.ir();
    let mut work_list: VecDeque<StmtId> = std::iter::once(cfg.exit())
        .chain(ir.stmts().map(crate::ir::Stmt::id))
        .chain(std::iter::once(cfg.entry()))
        .collect();
    while let Some(stmt) = work_list.pop_front() {
        if stmt == cfg.exit() {
            continue;
        }
        {
            let out_fact = out_facts.get_mut(&stmt).expect("facts are initialised");
            for succ in cfg.succs_of(stmt) {
                let succ_in = in_facts.get(&succ).expect("facts are initialised");
                analysis.meet_into(succ_in, out_fact);
            }
        }
        let in_fact = in_facts.get_mut(&stmt).expect("facts are initialised");
        let out_fact = out_facts.get_mut(&stmt).expect("facts are initialised");
        if analysis.transfer_node(ir.stmt(stmt), in_fact, out_fact) {
            work_list.extend(cfg.preds_of(stmt));
        }
    }
}
