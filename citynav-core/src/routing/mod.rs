//! Routing engine: dual-metric Dijkstra search, nearest-node snapping,
//! backtracking into owned path stacks, and the interactive navigation
//! session consuming them.

pub mod backtrace;
pub mod dijkstra;
pub mod session;

use geo::{Line, Point};
use itertools::Itertools;
use log::{debug, info};

use crate::Error;
use crate::model::CityModel;
use crate::model::streets::{StreetEdge, StreetGraph};
use crate::render::{DirectionsSink, Instruction, Renderer};

pub use backtrace::{PathStack, backtrace, describe_route};
pub use dijkstra::{SearchTree, run_search};
pub use session::{MoveEvent, NavigationSession, SessionState};

use petgraph::graph::NodeIndex;

/// The routing cost function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMetric {
    /// Sum of edge lengths
    Distance,
    /// Sum of length/speed; a zero speed limit makes the edge impassable
    Time,
}

impl RouteMetric {
    pub fn edge_cost(self, edge: &StreetEdge) -> f64 {
        match self {
            RouteMetric::Distance => edge.length,
            RouteMetric::Time => {
                if edge.speed == 0.0 {
                    f64::INFINITY
                } else {
                    edge.length / edge.speed
                }
            }
        }
    }
}

/// Which routes a [`find_path`] call computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathFindMode {
    Shortest,
    Quickest,
    Both,
}

impl PathFindMode {
    fn wants(self, metric: RouteMetric) -> bool {
        match (self, metric) {
            (PathFindMode::Both, _) => true,
            (PathFindMode::Shortest, RouteMetric::Distance) => true,
            (PathFindMode::Quickest, RouteMetric::Time) => true,
            _ => false,
        }
    }
}

/// Routes computed by one [`find_path`] call; ownership of the stacks
/// passes to the caller.
#[derive(Debug, Default)]
pub struct FoundRoutes {
    pub shortest: Option<PathStack>,
    pub quickest: Option<PathStack>,
}

/// Snaps an arbitrary query point to its nearest graph node.
pub fn find_closest_node(graph: &StreetGraph, point: Point<f64>) -> Result<NodeIndex, Error> {
    graph
        .nearest_node(&point)
        .map(|(node, _)| node)
        .ok_or_else(|| Error::NotFound("no graph nodes to snap to".to_string()))
}

/// Computes one route and returns just its stack; used by session
/// recalculation where no narration is wanted.
pub fn find_path_stack(
    graph: &StreetGraph,
    start: NodeIndex,
    end: NodeIndex,
    metric: RouteMetric,
) -> Result<PathStack, Error> {
    let tree = run_search(graph, start, metric);
    backtrace(&tree, start, end)
}

/// Snaps both query points, computes the distance-optimal and/or
/// time-optimal route per `mode`, narrates each into `sink`, and — when a
/// renderer is supplied — draws each route polyline plus the last-mile
/// connectors from the raw points to their snapped nodes.
///
/// A metric with no route reports [`Instruction::NoRoute`] and leaves its
/// slot empty; only snapping on an empty graph is a hard error.
pub fn find_path(
    model: &CityModel,
    from: Point<f64>,
    to: Point<f64>,
    mode: PathFindMode,
    mut renderer: Option<&mut dyn Renderer>,
    sink: &mut dyn DirectionsSink,
) -> Result<FoundRoutes, Error> {
    let graph = &model.streets;
    let start = find_closest_node(graph, from)?;
    let end = find_closest_node(graph, to)?;
    debug!(
        "snapped query points to nodes '{}' and '{}'",
        graph.node(start).map(|n| n.id.as_str()).unwrap_or("?"),
        graph.node(end).map(|n| n.id.as_str()).unwrap_or("?"),
    );

    let mut routes = FoundRoutes::default();
    for metric in [RouteMetric::Distance, RouteMetric::Time] {
        if !mode.wants(metric) {
            continue;
        }
        let tree = run_search(graph, start, metric);
        match backtrace(&tree, start, end) {
            Ok(path) => {
                sink.instruction(&Instruction::RouteHead { metric })?;
                describe_route(graph, &tree, &path, sink)?;
                if let Some(renderer) = renderer.as_deref_mut() {
                    render_route(graph, &path, from, to, renderer)?;
                }
                info!(
                    "{metric:?} route found with {} nodes, cost {:.3}",
                    path.len(),
                    tree.cost(end)
                );
                match metric {
                    RouteMetric::Distance => routes.shortest = Some(path),
                    RouteMetric::Time => routes.quickest = Some(path),
                }
            }
            Err(Error::Unreachable) => {
                info!("{metric:?} route not found");
                sink.instruction(&Instruction::NoRoute { metric })?;
            }
            Err(other) => return Err(other),
        }
    }
    Ok(routes)
}

/// Draws the route polyline and the connectors tying the raw query points
/// to their snapped endpoints.
fn render_route(
    graph: &StreetGraph,
    path: &PathStack,
    from: Point<f64>,
    to: Point<f64>,
    renderer: &mut dyn Renderer,
) -> Result<(), Error> {
    for (current, next) in path.iter_from_start().tuple_windows() {
        renderer.draw_segment(Line::new(graph.point(current).0, graph.point(next).0))?;
    }
    // Last-mile connectors: the stack top is the snapped start, the base
    // the snapped destination.
    if let (Some(first), Some(last)) = (path.peek(), path.base()) {
        renderer.draw_segment(Line::new(from.0, graph.point(first).0))?;
        renderer.draw_segment(Line::new(to.0, graph.point(last).0))?;
    }
    Ok(())
}
