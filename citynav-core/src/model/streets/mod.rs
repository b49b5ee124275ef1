//! Street network model

pub mod components;
pub mod network;

pub use components::{Cardinal, Compass, StreetEdge, StreetNode};
pub use network::{IndexedPoint, StreetGraph, invalidate_graph_edges};
