//! The statement-level control flow graph.
//!
//! The graph is a directed multigraph over [`StmtId`]s: edges live in an
//! arena and two adjacency maps index them by source and by target, so a
//! node's in/out edge counts may both exceed its number of distinct
//! neighbours. Construction is the IR builder's business; clients only
//! query.

#[cfg(feature = "petgraph")]
pub mod petgraph;

use std::collections::{BTreeMap, BTreeSet};

use crate::ir::StmtId;

/// The kind of a control flow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeKind {
    /// From the synthetic entry nop into the method.
    Entry,
    /// Into the synthetic exit nop.
    Exit,
    /// Sequential flow inside a basic block.
    FallThrough,
    /// Any transfer between basic blocks: branches, loop back edges, and
    /// join points alike.
    Jump,
    /// An edge the builder could not classify.
    Unknown,
}

/// A directed, kind-labelled control flow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfgEdge {
    /// The kind of the edge.
    pub kind: EdgeKind,
    /// The statement the edge leaves.
    pub source: StmtId,
    /// The statement the edge enters.
    pub target: StmtId,
}

/// The statement-level control flow graph of one method.
#[derive(Debug, Clone)]
pub struct Cfg {
    edges: Vec<CfgEdge>,
    in_edges: BTreeMap<StmtId, Vec<usize>>,
    out_edges: BTreeMap<StmtId, Vec<usize>>,
    entry: StmtId,
    exit: StmtId,
}

impl Cfg {
    pub(crate) fn new(entry: StmtId, exit: StmtId) -> Self {
        let mut cfg = Self {
            edges: Vec::new(),
            in_edges: BTreeMap::new(),
            out_edges: BTreeMap::new(),
            entry,
            exit,
        };
        cfg.insert_node(entry);
        cfg.insert_node(exit);
        cfg
    }

    pub(crate) fn insert_node(&mut self, stmt: StmtId) {
        self.in_edges.entry(stmt).or_default();
        self.out_edges.entry(stmt).or_default();
    }

    pub(crate) fn add_edge(&mut self, edge: CfgEdge) {
        let index = self.edges.len();
        self.insert_node(edge.source);
        self.insert_node(edge.target);
        self.edges.push(edge);
        self.out_edges
            .get_mut(&edge.source)
            .expect("just inserted")
            .push(index);
        self.in_edges
            .get_mut(&edge.target)
            .expect("just inserted")
            .push(index);
    }

    /// The synthetic entry nop. It has no predecessors.
    #[must_use]
    pub const fn entry(&self) -> StmtId {
        self.entry
    }

    /// The synthetic exit nop. It has no successors.
    #[must_use]
    pub const fn exit(&self) -> StmtId {
        self.exit
    }

    /// Whether the statement is a node of this graph.
    #[must_use]
    pub fn has_stmt(&self, stmt: StmtId) -> bool {
        self.out_edges.contains_key(&stmt)
    }

    /// Whether some edge runs from `source` to `target`, of any kind.
    #[must_use]
    pub fn has_edge(&self, source: StmtId, target: StmtId) -> bool {
        self.out_edges_of(source).any(|edge| edge.target == target)
    }

    /// The distinct predecessors of a statement.
    #[must_use]
    pub fn preds_of(&self, stmt: StmtId) -> BTreeSet<StmtId> {
        self.in_edges_of(stmt).map(|edge| edge.source).collect()
    }

    /// The distinct successors of a statement.
    #[must_use]
    pub fn succs_of(&self, stmt: StmtId) -> BTreeSet<StmtId> {
        self.out_edges_of(stmt).map(|edge| edge.target).collect()
    }

    /// The edges entering a statement.
    pub fn in_edges_of(&self, stmt: StmtId) -> impl Iterator<Item = &CfgEdge> {
        self.in_edges
            .get(&stmt)
            .into_iter()
            .flatten()
            .map(|&index| &self.edges[index])
    }

    /// The edges leaving a statement.
    pub fn out_edges_of(&self, stmt: StmtId) -> impl Iterator<Item = &CfgEdge> {
        self.out_edges
            .get(&stmt)
            .into_iter()
            .flatten()
            .map(|&index| &self.edges[index])
    }

    /// The number of edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterates over every node of the graph, entry and exit included.
    pub fn nodes(&self) -> impl Iterator<Item = StmtId> + '_ {
        self.out_edges.keys().copied()
    }

    /// Iterates over every edge of the graph.
    pub fn edges(&self) -> impl Iterator<Item = &CfgEdge> {
        self.edges.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Cfg {
        // entry -> 1 -> {2, 3} -> 4 -> exit, with statement ids 0 and 5 as
        // the synthetic entry/exit.
        let mut cfg = Cfg::new(StmtId::from(0), StmtId::from(5));
        let edge = |kind, source: u32, target: u32| CfgEdge {
            kind,
            source: StmtId::from(source),
            target: StmtId::from(target),
        };
        cfg.add_edge(edge(EdgeKind::Entry, 0, 1));
        cfg.add_edge(edge(EdgeKind::Jump, 1, 2));
        cfg.add_edge(edge(EdgeKind::Jump, 1, 3));
        cfg.add_edge(edge(EdgeKind::Jump, 2, 4));
        cfg.add_edge(edge(EdgeKind::Jump, 3, 4));
        cfg.add_edge(edge(EdgeKind::Exit, 4, 5));
        cfg
    }

    #[test]
    fn entry_and_exit_are_boundary_nodes() {
        let cfg = diamond();
        assert!(cfg.preds_of(cfg.entry()).is_empty());
        assert!(cfg.succs_of(cfg.exit()).is_empty());
    }

    #[test]
    fn adjacency_queries() {
        let cfg = diamond();
        assert!(cfg.has_edge(StmtId::from(1), StmtId::from(2)));
        assert!(!cfg.has_edge(StmtId::from(2), StmtId::from(1)));
        assert_eq!(
            cfg.succs_of(StmtId::from(1)),
            BTreeSet::from([StmtId::from(2), StmtId::from(3)])
        );
        assert_eq!(
            cfg.preds_of(StmtId::from(4)),
            BTreeSet::from([StmtId::from(2), StmtId::from(3)])
        );
        assert_eq!(cfg.edge_count(), 6);
        assert_eq!(cfg.nodes().count(), 6);
    }

    #[test]
    fn parallel_edges_are_kept() {
        let mut cfg = diamond();
        cfg.add_edge(CfgEdge {
            kind: EdgeKind::Unknown,
            source: StmtId::from(1),
            target: StmtId::from(2),
        });
        assert_eq!(cfg.out_edges_of(StmtId::from(1)).count(), 3);
        assert_eq!(cfg.succs_of(StmtId::from(1)).len(), 2);
    }
}
