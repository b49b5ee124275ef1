use serde::Deserialize;

use crate::{DEVIATION_THRESHOLD, Error, VISIBILITY_MARGIN};

/// Tunables of the city model. Deserializable so a host application can
/// load it from its own configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Distance from the next navigation target that triggers an automatic
    /// route recomputation.
    pub deviation_threshold: f64,
    /// Margin added around all geometry for the visibility boundary
    /// rectangle.
    pub visibility_margin: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            deviation_threshold: DEVIATION_THRESHOLD,
            visibility_margin: VISIBILITY_MARGIN,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.deviation_threshold.is_finite() && self.deviation_threshold > 0.0) {
            return Err(Error::InvalidData(format!(
                "deviation threshold must be positive, got {}",
                self.deviation_threshold
            )));
        }
        if !(self.visibility_margin.is_finite() && self.visibility_margin > 0.0) {
            return Err(Error::InvalidData(format!(
                "visibility margin must be positive, got {}",
                self.visibility_margin
            )));
        }
        Ok(())
    }
}
