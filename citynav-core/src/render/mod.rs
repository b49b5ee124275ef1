//! Produced-to interfaces: the core never owns output handles, it hands
//! draw intents to a [`Renderer`] and navigation narration to a
//! [`DirectionsSink`].

pub mod geojson;

use std::io::Write;

use geo::{Line, Point, Polygon};

use crate::Error;
use crate::model::streets::Cardinal;
use crate::routing::RouteMetric;

pub use geojson::GeoJsonRenderer;

/// Abstract drawing sink. Implementations decide the medium; the core only
/// states what to draw.
pub trait Renderer {
    fn draw_segment(&mut self, segment: Line<f64>) -> Result<(), Error>;
    fn draw_polygon(&mut self, polygon: &Polygon<f64>) -> Result<(), Error>;
    fn draw_point(&mut self, point: Point<f64>, label: &str) -> Result<(), Error>;
}

/// One structured turn-by-turn instruction. Directions stay structured all
/// the way to the sink; only sink implementations put words on them, which
/// keeps locale and sign-convention questions out of the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Header announcing which route the following instructions belong to.
    RouteHead { metric: RouteMetric },
    /// No route exists under this metric.
    NoRoute { metric: RouteMetric },
    Depart { heading: Cardinal, street: String },
    /// Closes the current merged straight run.
    Proceed { distance: f64 },
    UTurn { heading: Cardinal, street: String },
    TurnAt { cross_street: String, heading: Cardinal },
    Arrive { distance: f64 },
}

/// Abstract narration sink for turn-by-turn instructions.
pub trait DirectionsSink {
    fn instruction(&mut self, instruction: &Instruction) -> Result<(), Error>;
}

/// Plain-text English renderer of the instruction stream.
pub struct TextDirections<W: Write> {
    out: W,
}

impl<W: Write> TextDirections<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DirectionsSink for TextDirections<W> {
    fn instruction(&mut self, instruction: &Instruction) -> Result<(), Error> {
        match instruction {
            Instruction::RouteHead { metric } => match metric {
                RouteMetric::Distance => writeln!(self.out, "SHORTEST ROUTE:")?,
                RouteMetric::Time => writeln!(self.out, "QUICKEST ROUTE:")?,
            },
            Instruction::NoRoute { .. } => writeln!(self.out, "No route found.")?,
            Instruction::Depart { heading, street } => {
                writeln!(self.out, "Head {heading} on {street}")?;
            }
            Instruction::Proceed { distance } => {
                writeln!(self.out, "Continue for {distance:.0} m")?;
            }
            Instruction::UTurn { heading, street } => {
                writeln!(self.out, "Make a U-turn and head {heading} on {street}")?;
            }
            Instruction::TurnAt {
                cross_street,
                heading,
            } => {
                writeln!(
                    self.out,
                    "At the intersection with {cross_street}, turn {heading}"
                )?;
            }
            Instruction::Arrive { distance } => {
                writeln!(
                    self.out,
                    "After {distance:.0} m you have arrived at your destination."
                )?;
            }
        }
        Ok(())
    }
}

/// Sink that discards the narration; for callers that only want the stack.
#[derive(Debug, Default)]
pub struct SilentDirections;

impl DirectionsSink for SilentDirections {
    fn instruction(&mut self, _instruction: &Instruction) -> Result<(), Error> {
        Ok(())
    }
}
