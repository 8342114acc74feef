//! Implementations for the traits in the `petgraph` crate.

use std::collections::BTreeSet;

use petgraph::{
    Directed, Direction,
    visit::{
        Data, GraphBase, GraphProp, IntoEdgeReferences, IntoNeighbors, IntoNeighborsDirected,
        IntoNodeIdentifiers, NodeIndexable, VisitMap, Visitable,
    },
};

use crate::ir::StmtId;

use super::{Cfg, EdgeKind};

impl GraphBase for Cfg {
    type NodeId = StmtId;
    type EdgeId = (StmtId, StmtId);
}

impl Data for Cfg {
    type NodeWeight = ();
    type EdgeWeight = EdgeKind;
}

impl GraphProp for Cfg {
    type EdgeType = Directed;
}

impl<'a> IntoEdgeReferences for &'a Cfg {
    type EdgeRef = (StmtId, StmtId, &'a EdgeKind);

    type EdgeReferences = <Vec<Self::EdgeRef> as IntoIterator>::IntoIter;

    fn edge_references(self) -> Self::EdgeReferences {
        self.edges()
            .map(|edge| (edge.source, edge.target, &edge.kind))
            .collect::<Vec<_>>()
            .into_iter()
    }
}

impl IntoNodeIdentifiers for &Cfg {
    type NodeIdentifiers = <BTreeSet<StmtId> as IntoIterator>::IntoIter;

    fn node_identifiers(self) -> Self::NodeIdentifiers {
        self.nodes().collect::<BTreeSet<_>>().into_iter()
    }
}

impl IntoNeighbors for &Cfg {
    type Neighbors = <BTreeSet<StmtId> as IntoIterator>::IntoIter;

    fn neighbors(self, a: StmtId) -> Self::Neighbors {
        self.succs_of(a).into_iter()
    }
}

impl IntoNeighborsDirected for &Cfg {
    type NeighborsDirected = <BTreeSet<StmtId> as IntoIterator>::IntoIter;

    fn neighbors_directed(self, n: StmtId, d: Direction) -> Self::NeighborsDirected {
        match d {
            Direction::Outgoing => self.succs_of(n),
            Direction::Incoming => self.preds_of(n),
        }
        .into_iter()
    }
}

/// A visit map for the control flow graph.
pub type Visited = BTreeSet<StmtId>;

impl VisitMap<StmtId> for Visited {
    fn visit(&mut self, a: StmtId) -> bool {
        self.insert(a)
    }

    fn is_visited(&self, a: &StmtId) -> bool {
        self.contains(a)
    }

    fn unvisit(&mut self, a: StmtId) -> bool {
        self.remove(&a)
    }
}

impl Visitable for Cfg {
    type Map = Visited;

    fn visit_map(&self) -> Self::Map {
        BTreeSet::new()
    }

    fn reset_map(&self, map: &mut Self::Map) {
        map.clear();
    }
}

impl NodeIndexable for Cfg {
    fn node_bound(&self) -> usize {
        self.nodes()
            .map(|id| u32::from(id) as usize + 1)
            .max()
            .unwrap_or(0)
    }

    fn to_index(&self, ix: StmtId) -> usize {
        u32::from(ix) as usize
    }

    fn from_index(&self, ix: usize) -> StmtId {
        StmtId::from(u32::try_from(ix).expect("index is out of u32"))
    }
}
