//! Street graph storage: petgraph adjacency plus an R-tree over node
//! positions for nearest-node snapping.

use geo::{Contains, Distance, Euclidean, Intersects, Line, Point, Polygon};
use hashbrown::HashMap;
use log::{debug, trace};
use petgraph::Directed;
use petgraph::graph::{EdgeIndex, Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use super::components::{Compass, StreetEdge, StreetNode};
use crate::Error;

/// Node position entry of the snap index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedPoint {
    pub node: NodeIndex,
    pub position: [f64; 2],
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// The persistent street network. Nodes are never removed; edges are only
/// ever soft-deleted, so the snap index is maintained on insertion alone.
#[derive(Debug, Clone, Default)]
pub struct StreetGraph {
    graph: Graph<StreetNode, StreetEdge, Directed>,
    ids: HashMap<String, NodeIndex>,
    index: RTree<IndexedPoint>,
}

impl StreetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an isolated node. External ids must be unique.
    pub fn add_node(&mut self, id: &str, x: f64, y: f64) -> Result<NodeIndex, Error> {
        if self.ids.contains_key(id) {
            return Err(Error::InvalidData(format!("duplicate node id '{id}'")));
        }
        let node = self.graph.add_node(StreetNode {
            id: id.to_string(),
            point: Point::new(x, y),
        });
        self.ids.insert(id.to_string(), node);
        self.index.insert(IndexedPoint {
            node,
            position: [x, y],
        });
        Ok(node)
    }

    /// Appends one directed edge. Symmetry is the caller's responsibility
    /// and duplicate edges are kept as-is.
    #[allow(clippy::too_many_arguments)]
    pub fn add_edge(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        left_block: Option<&str>,
        right_block: Option<&str>,
        length: f64,
        speed: f64,
        street: &str,
    ) -> Result<EdgeIndex, Error> {
        if self.graph.node_weight(from).is_none() || self.graph.node_weight(to).is_none() {
            return Err(Error::NotFound("edge endpoint node".to_string()));
        }
        if !(length.is_finite() && length >= 0.0) || !(speed.is_finite() && speed >= 0.0) {
            return Err(Error::InvalidData(format!(
                "bad edge metrics for street '{street}': length {length}, speed {speed}"
            )));
        }
        Ok(self.graph.add_edge(
            from,
            to,
            StreetEdge {
                length,
                speed,
                street: street.to_string(),
                left_block: left_block.map(str::to_string),
                right_block: right_block.map(str::to_string),
            },
        ))
    }

    pub fn node(&self, node: NodeIndex) -> Option<&StreetNode> {
        self.graph.node_weight(node)
    }

    pub fn node_by_id(&self, id: &str) -> Option<NodeIndex> {
        self.ids.get(id).copied()
    }

    pub fn point(&self, node: NodeIndex) -> Point<f64> {
        self.graph[node].point
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Outgoing edges of `node` in insertion order. petgraph yields the
    /// adjacency newest-first, so the walk is materialized and reversed.
    pub fn ordered_edges(&self, node: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
        let mut edges: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges(node)
            .map(|edge| (edge.id(), edge.target()))
            .collect();
        edges.reverse();
        edges
    }

    pub fn edge(&self, edge: EdgeIndex) -> Option<&StreetEdge> {
        self.graph.edge_weight(edge)
    }

    pub(crate) fn petgraph(&self) -> &Graph<StreetNode, StreetEdge, Directed> {
        &self.graph
    }

    /// The first outgoing edge, in insertion order, whose target lies in
    /// the requested octant from `node`. Returns the target and the street
    /// name of the matched edge.
    pub fn go_to(&self, node: NodeIndex, heading: Compass) -> Option<(NodeIndex, &str)> {
        let origin = self.graph.node_weight(node)?.point;
        for (edge, target) in self.ordered_edges(node) {
            if heading.matches(origin, self.graph[target].point) {
                return Some((target, self.graph[edge].street.as_str()));
            }
        }
        None
    }

    /// Pruned nearest-neighbour lookup over the node index; returns the
    /// snapped node and its Euclidean distance from the query point.
    pub fn nearest_node(&self, point: &Point<f64>) -> Option<(NodeIndex, f64)> {
        let entry = self.index.nearest_neighbor(&[point.x(), point.y()])?;
        let snapped = self.graph[entry.node].point;
        Some((entry.node, Euclidean.distance(*point, snapped)))
    }

    /// Soft-deletes every outgoing edge of `node` that touches `polygon`:
    /// source inside, target inside, or segment crossing the boundary.
    /// Returns the number of edges invalidated. Permanent for the graph's
    /// lifetime.
    pub fn invalidate_edges_intersecting(
        &mut self,
        node: NodeIndex,
        polygon: &Polygon<f64>,
    ) -> usize {
        let Some(source) = self.graph.node_weight(node).map(|n| n.point) else {
            return 0;
        };
        let source_inside = polygon.contains(&source);

        let mut invalidated = 0;
        for (edge, target) in self.ordered_edges(node) {
            let target_point = self.graph[target].point;
            let segment = Line::new(source.0, target_point.0);
            if source_inside
                || polygon.contains(&target_point)
                || polygon.exterior().intersects(&segment)
            {
                if let Some(weight) = self.graph.edge_weight_mut(edge) {
                    if weight.is_passable() {
                        invalidated += 1;
                    }
                    weight.invalidate();
                }
            }
        }
        if invalidated > 0 {
            trace!(
                "invalidated {invalidated} edges leaving node {:?}",
                self.graph[node].id
            );
        }
        invalidated
    }
}

/// Applies [`StreetGraph::invalidate_edges_intersecting`] to every node of
/// the graph.
pub fn invalidate_graph_edges(graph: &mut StreetGraph, polygon: &Polygon<f64>) -> usize {
    let nodes: Vec<NodeIndex> = graph.node_indices().collect();
    let mut total = 0;
    for node in nodes {
        total += graph.invalidate_edges_intersecting(node, polygon);
    }
    debug!("soft-deleted {total} edges intersecting polygon");
    total
}
