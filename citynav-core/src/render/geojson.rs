//! Renderer that collects draw intents as GeoJSON features.

use geo::{Line, LineString, Point, Polygon};
use geojson::{Feature, FeatureCollection, Geometry};
use serde_json::json;

use super::Renderer;
use crate::Error;

/// Accumulates draw calls into a [`FeatureCollection`] a host can
/// serialize or hand to a map client.
#[derive(Debug, Default)]
pub struct GeoJsonRenderer {
    features: Vec<Feature>,
}

impl GeoJsonRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn into_collection(self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.features,
            foreign_members: None,
        }
    }

    fn push(&mut self, value: serde_json::Value) -> Result<(), Error> {
        let feature: Feature =
            serde_json::from_value(value).map_err(|e| Error::InvalidData(e.to_string()))?;
        self.features.push(feature);
        Ok(())
    }
}

impl Renderer for GeoJsonRenderer {
    fn draw_segment(&mut self, segment: Line<f64>) -> Result<(), Error> {
        let line = LineString::from(vec![segment.start, segment.end]);
        self.push(json!({
            "type": "Feature",
            "geometry": Geometry::new((&line).into()),
            "properties": { "kind": "segment" }
        }))
    }

    fn draw_polygon(&mut self, polygon: &Polygon<f64>) -> Result<(), Error> {
        self.push(json!({
            "type": "Feature",
            "geometry": Geometry::new(polygon.into()),
            "properties": { "kind": "polygon" }
        }))
    }

    fn draw_point(&mut self, point: Point<f64>, label: &str) -> Result<(), Error> {
        self.push(json!({
            "type": "Feature",
            "geometry": Geometry::new((&point).into()),
            "properties": { "kind": "point", "label": label }
        }))
    }
}
