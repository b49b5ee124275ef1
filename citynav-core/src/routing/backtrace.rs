//! Route backtracking: follows the parent chain of a finished search into
//! a [`PathStack`] and derives merged turn-by-turn instructions from it.

use geo::Point;
use itertools::Itertools;
use petgraph::graph::NodeIndex;

use super::dijkstra::SearchTree;
use crate::Error;
use crate::model::streets::{Cardinal, StreetGraph};
use crate::render::{DirectionsSink, Instruction};

/// The node sequence of a computed route, stored bottom-up: the
/// destination sits at the base and the start on top, so popping advances
/// travel and the final destination stays O(1) reachable throughout.
///
/// A stack is exclusively owned by whoever received it; dropping it is the
/// release.
#[derive(Debug, Clone, Default)]
pub struct PathStack {
    nodes: Vec<NodeIndex>,
}

impl PathStack {
    /// Current position on the route (the top of the stack).
    pub fn peek(&self) -> Option<NodeIndex> {
        self.nodes.last().copied()
    }

    /// Consumes the top entry and exposes the next one.
    pub fn pop(&mut self) -> Option<NodeIndex> {
        self.nodes.pop()
    }

    /// The route's final destination (the base of the stack).
    pub fn base(&self) -> Option<NodeIndex> {
        self.nodes.first().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walks the route in travel order, start first.
    pub fn iter_from_start(&self) -> impl DoubleEndedIterator<Item = NodeIndex> + '_ {
        self.nodes.iter().rev().copied()
    }
}

/// Follows parent references from `end` back to `start`, producing the
/// start-on-top stack. Fails with [`Error::Unreachable`] when the search
/// never closed `end`.
pub fn backtrace(
    tree: &SearchTree,
    start: NodeIndex,
    end: NodeIndex,
) -> Result<PathStack, Error> {
    if !tree.reached(end) {
        return Err(Error::Unreachable);
    }
    let mut nodes = Vec::new();
    let mut current = end;
    while current != start {
        nodes.push(current);
        current = tree.parent(current).ok_or(Error::Unreachable)?;
    }
    nodes.push(start);
    Ok(PathStack { nodes })
}

/// Classifies one hop four ways from the sign of the coordinate delta and
/// returns the travelled span along that axis.
pub(crate) fn classify_hop(from: Point<f64>, to: Point<f64>) -> (Cardinal, f64) {
    let dx = to.x() - from.x();
    let dy = to.y() - from.y();
    if dx > 0.0 {
        (Cardinal::East, dx)
    } else if dx < 0.0 {
        (Cardinal::West, -dx)
    } else if dy > 0.0 {
        (Cardinal::North, dy)
    } else {
        (Cardinal::South, -dy)
    }
}

/// Emits the turn-by-turn narrative of `path`. Consecutive hops in the
/// same direction merge into one accumulated distance; a reversal onto the
/// opposite direction is a U-turn, a perpendicular change is an
/// intersection turn. Street names come from the search tree's arrival
/// records.
pub fn describe_route(
    graph: &StreetGraph,
    tree: &SearchTree,
    path: &PathStack,
    sink: &mut dyn DirectionsSink,
) -> Result<(), Error> {
    let mut heading: Option<Cardinal> = None;
    let mut run_distance = 0.0;

    for (current, next) in path.iter_from_start().tuple_windows() {
        let (hop_heading, hop_distance) = classify_hop(graph.point(current), graph.point(next));
        let street = tree
            .arrival_street(next)
            .unwrap_or("unnamed street")
            .to_string();

        match heading {
            None => {
                run_distance = hop_distance;
                sink.instruction(&Instruction::Depart {
                    heading: hop_heading,
                    street,
                })?;
            }
            Some(previous) if previous != hop_heading => {
                sink.instruction(&Instruction::Proceed {
                    distance: run_distance,
                })?;
                run_distance = hop_distance;
                if hop_heading == previous.opposite() {
                    sink.instruction(&Instruction::UTurn {
                        heading: hop_heading,
                        street,
                    })?;
                } else {
                    sink.instruction(&Instruction::TurnAt {
                        cross_street: street,
                        heading: hop_heading,
                    })?;
                }
            }
            Some(_) => run_distance += hop_distance,
        }
        heading = Some(hop_heading);
    }

    sink.instruction(&Instruction::Arrive {
        distance: run_distance,
    })
}
