//! Dijkstra search over the street graph with per-run, algorithm-owned
//! state.
//!
//! The graph's node records stay immutable during a run: tentative costs,
//! parents, arrival streets and the closed set live in a [`SearchTree`]
//! allocated fresh per search, so the allocation itself is the O(V) reset
//! and two runs can never interleave their state.

use fixedbitset::FixedBitSet;
use log::trace;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use super::RouteMetric;
use crate::algo::MinHeap;
use crate::model::streets::StreetGraph;

/// Search state of one routing run.
#[derive(Debug)]
pub struct SearchTree {
    cost: Vec<f64>,
    parent: Vec<Option<NodeIndex>>,
    street: Vec<Option<String>>,
    closed: FixedBitSet,
    metric: RouteMetric,
}

#[derive(Copy, Clone)]
struct Frontier {
    cost: f64,
    node: NodeIndex,
}

impl SearchTree {
    fn new(node_count: usize, metric: RouteMetric) -> Self {
        Self {
            cost: vec![f64::INFINITY; node_count],
            parent: vec![None; node_count],
            street: vec![None; node_count],
            closed: FixedBitSet::with_capacity(node_count),
            metric,
        }
    }

    /// Whether the search closed `node`, i.e. found a final cost for it.
    pub fn reached(&self, node: NodeIndex) -> bool {
        self.closed.contains(node.index())
    }

    pub fn cost(&self, node: NodeIndex) -> f64 {
        self.cost[node.index()]
    }

    pub fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.parent[node.index()]
    }

    /// Name of the street the search arrived on at `node`.
    pub fn arrival_street(&self, node: NodeIndex) -> Option<&str> {
        self.street[node.index()].as_deref()
    }

    pub fn metric(&self) -> RouteMetric {
        self.metric
    }

    /// Relaxation step: improves every neighbour of `node` that is not yet
    /// closed, re-pushing on improvement, then closes `node`. Stale heap
    /// duplicates left behind are discarded at extraction.
    fn relax_neighbors(
        &mut self,
        graph: &StreetGraph,
        node: NodeIndex,
        frontier: &mut MinHeap<Frontier, impl FnMut(&Frontier, &Frontier) -> std::cmp::Ordering>,
    ) {
        self.closed.insert(node.index());
        let base = self.cost[node.index()];

        for edge in graph.petgraph().edges(node) {
            let next = edge.target();
            if self.closed.contains(next.index()) {
                continue;
            }
            let candidate = base + self.metric.edge_cost(edge.weight());
            if !candidate.is_finite() {
                continue;
            }
            if candidate < self.cost[next.index()] {
                self.cost[next.index()] = candidate;
                self.parent[next.index()] = Some(node);
                self.street[next.index()] = Some(edge.weight().street.clone());
                frontier.push(Frontier {
                    cost: candidate,
                    node: next,
                });
            }
        }
    }
}

/// Runs Dijkstra from `start` until the frontier drains, so the resulting
/// [`SearchTree`] answers reachability and cost for every node.
pub fn run_search(graph: &StreetGraph, start: NodeIndex, metric: RouteMetric) -> SearchTree {
    let mut tree = SearchTree::new(graph.node_count(), metric);
    let mut frontier = MinHeap::with_capacity(
        graph.node_count() / 4 + 1,
        |a: &Frontier, b: &Frontier| a.cost.total_cmp(&b.cost),
    );

    tree.cost[start.index()] = 0.0;
    frontier.push(Frontier {
        cost: 0.0,
        node: start,
    });

    let mut expanded = 0usize;
    while let Some(Frontier { node, .. }) = frontier.pop() {
        // A closed node popping again is a stale duplicate of an earlier,
        // worse push; its final cost is already settled.
        if tree.reached(node) {
            continue;
        }
        tree.relax_neighbors(graph, node, &mut frontier);
        expanded += 1;
    }
    trace!(
        "search from {start:?} ({metric:?}) expanded {expanded} of {} nodes",
        graph.node_count()
    );
    tree
}
