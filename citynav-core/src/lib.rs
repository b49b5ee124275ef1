//! Core engine for an indexed city model: a mutable street graph with
//! dual-metric routing, interactive turn-by-turn navigation, and a
//! radial-sweep visibility engine over wall and building obstacles.
//!
//! The crate is the computational core only. Parsing of city description
//! files, entity bookkeeping and concrete output formats live outside; the
//! core produces draw intents through [`render::Renderer`] and navigation
//! instructions through [`render::DirectionsSink`].

pub mod algo;
pub mod error;
pub mod model;
pub mod prelude;
pub mod render;
pub mod routing;

pub use error::Error;

/// Distance from the next intermediate target beyond which an in-progress
/// navigation session recomputes its route.
pub const DEVIATION_THRESHOLD: f64 = 200.0;

/// Margin added around all geometry when the visibility sweep builds its
/// enclosing boundary rectangle.
pub const VISIBILITY_MARGIN: f64 = 100.0;

/// Tolerance of the occlusion test: intersections within this distance of
/// the probed vertex count as occluding.
pub const OCCLUSION_TOLERANCE: f64 = 1e-6;
