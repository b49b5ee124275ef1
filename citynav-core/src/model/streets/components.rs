//! Street network components: nodes, directed edges, and the structured
//! direction values used by navigation.

use std::fmt;
use std::str::FromStr;

use geo::Point;

use crate::Error;

/// Street graph node. The record is immutable during a routing run; all
/// transient search state lives in [`crate::routing::SearchTree`].
#[derive(Debug, Clone)]
pub struct StreetNode {
    /// External id of the corner
    pub id: String,
    /// Node coordinates
    pub point: Point<f64>,
}

/// One directed street segment. Undirected streets are modelled by the
/// caller inserting the mirror edge at the target; parallel edges between
/// the same pair of nodes are allowed.
#[derive(Debug, Clone)]
pub struct StreetEdge {
    /// Segment length in distance units
    pub length: f64,
    /// Speed limit; 0 means impassable
    pub speed: f64,
    /// Name of the street this segment belongs to
    pub street: String,
    /// Opaque id of the block abutting the left side, if any
    pub left_block: Option<String>,
    /// Opaque id of the block abutting the right side, if any
    pub right_block: Option<String>,
}

impl StreetEdge {
    /// A soft-deleted edge stays in the adjacency but can never be part of
    /// a route again. There is no restore.
    pub fn invalidate(&mut self) {
        self.length = f64::INFINITY;
        self.speed = 0.0;
    }

    pub fn is_passable(&self) -> bool {
        self.speed > 0.0 && self.length.is_finite()
    }
}

/// Eight-way movement direction. Geometric convention throughout the core:
/// +x is east, +y is north. Locale wording belongs to sinks, never here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compass {
    North,
    South,
    East,
    West,
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

impl Compass {
    /// Whether `to` lies in this octant relative to `from`: exact axis
    /// alignment for the cardinal directions, strictly off both axes for
    /// the diagonals.
    pub fn matches(self, from: Point<f64>, to: Point<f64>) -> bool {
        let dx = to.x() - from.x();
        let dy = to.y() - from.y();
        match self {
            Compass::East => dx > 0.0 && dy == 0.0,
            Compass::West => dx < 0.0 && dy == 0.0,
            Compass::North => dy > 0.0 && dx == 0.0,
            Compass::South => dy < 0.0 && dx == 0.0,
            Compass::Northeast => dx > 0.0 && dy > 0.0,
            Compass::Northwest => dx < 0.0 && dy > 0.0,
            Compass::Southeast => dx > 0.0 && dy < 0.0,
            Compass::Southwest => dx < 0.0 && dy < 0.0,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Compass::North => "n",
            Compass::South => "s",
            Compass::East => "e",
            Compass::West => "w",
            Compass::Northeast => "ne",
            Compass::Northwest => "nw",
            Compass::Southeast => "se",
            Compass::Southwest => "sw",
        }
    }
}

impl fmt::Display for Compass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Compass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "n" => Ok(Compass::North),
            "s" => Ok(Compass::South),
            "e" => Ok(Compass::East),
            "w" => Ok(Compass::West),
            "ne" => Ok(Compass::Northeast),
            "nw" => Ok(Compass::Northwest),
            "se" => Ok(Compass::Southeast),
            "sw" => Ok(Compass::Southwest),
            other => Err(Error::InvalidData(format!("unknown direction '{other}'"))),
        }
    }
}

/// Four-way heading used by turn-by-turn instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinal {
    North,
    South,
    East,
    West,
}

impl Cardinal {
    pub fn opposite(self) -> Cardinal {
        match self {
            Cardinal::North => Cardinal::South,
            Cardinal::South => Cardinal::North,
            Cardinal::East => Cardinal::West,
            Cardinal::West => Cardinal::East,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Cardinal::North => "north",
            Cardinal::South => "south",
            Cardinal::East => "east",
            Cardinal::West => "west",
        }
    }
}

impl fmt::Display for Cardinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
