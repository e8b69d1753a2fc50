use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::reconcile::ExitPolicy;

/// Geometry, styling and policy knobs for a render pass.
///
/// Every field has a default, so a config file only needs to name what it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: f64,
    pub height: f64,
    /// Gap kept between sibling tiles and inside each parent tile.
    pub padding: f64,
    pub stroke_width: f64,

    pub timeline_height: f64,
    pub timeline_margin: f64,
    pub timeline_node_radius: f64,

    pub spark_width: f64,
    pub spark_height: f64,
    pub spark_margin: f64,
    /// Stride divisor: default marker visibility every `ceil(n / divisor)` points.
    pub marker_divisor: f64,

    pub label_max_chars: usize,
    pub top_labels: usize,
    pub font_min: f64,
    pub font_max: f64,
    pub timeline_font_size: f64,
    /// Size of the current value printed above each sparkline.
    pub value_font_size: f64,

    /// Multiplier applied to `sqrt(volume / max_volume)` by the normalizer.
    pub size_scale: f64,
    pub initial_transition_ms: u64,
    pub exit_policy: ExitPolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 800.0,
            padding: 1.0,
            stroke_width: 1.0,
            timeline_height: 100.0,
            timeline_margin: 50.0,
            timeline_node_radius: 10.0,
            spark_width: 50.0,
            spark_height: 120.0,
            spark_margin: 5.0,
            marker_divisor: 1.5,
            label_max_chars: 8,
            top_labels: 30,
            font_min: 8.0,
            font_max: 12.0,
            timeline_font_size: 10.0,
            value_font_size: 10.0,
            size_scale: 10.0,
            initial_transition_ms: 500,
            exit_policy: ExitPolicy::Freeze,
        }
    }
}

impl RenderConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would make a render pass meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.font_min <= self.font_max) {
            return Err(ConfigError::Invalid(format!(
                "font_min {} exceeds font_max {}",
                self.font_min, self.font_max
            )));
        }
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "canvas {}x{} must have a positive size",
                self.width, self.height
            )));
        }
        if self.padding < 0.0 || self.stroke_width < 0.0 {
            return Err(ConfigError::Invalid("padding and stroke_width must not be negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: RenderConfig =
            serde_json::from_str(r#"{ "width": 640, "exit_policy": "remove" }"#).unwrap();
        assert_eq!(cfg.width, 640.0);
        assert_eq!(cfg.height, 800.0);
        assert_eq!(cfg.exit_policy, ExitPolicy::Remove);
    }

    #[test]
    fn inverted_font_range_is_rejected() {
        let cfg = RenderConfig {
            font_min: 14.0,
            font_max: 9.0,
            ..RenderConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
        assert!(RenderConfig::default().validate().is_ok());
    }
}
