//! Curated re-exports for typical hosts of the engine.

pub use crate::error::Error;

// City model
pub use crate::model::{CityModel, ModelConfig, Proximity, Site, SiteKind};
pub use crate::model::streets::{Cardinal, Compass, StreetGraph};

// Routing
pub use crate::routing::{
    FoundRoutes, MoveEvent, NavigationSession, PathFindMode, PathStack, RouteMetric, SessionState,
    find_closest_node, find_path, find_path_stack, run_search,
};

// Visibility
pub use crate::algo::visibility_polygon;

// Output interfaces
pub use crate::render::{
    DirectionsSink, GeoJsonRenderer, Instruction, Renderer, SilentDirections, TextDirections,
};
