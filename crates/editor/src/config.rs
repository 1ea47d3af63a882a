use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Point, Size};

/// Modifier that turns a left-button press on empty canvas into a pan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanModifier {
    #[default]
    Alt,
    Shift,
    Control,
    Platform,
}

/// Zoom bounds and wheel step factors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomLimits {
    pub min_scale: f32,
    pub max_scale: f32,
    /// Scale multiplier for one wheel step toward the user.
    pub zoom_in_factor: f32,
    /// Scale multiplier for one wheel step away from the user.
    pub zoom_out_factor: f32,
}

/// A config value the viewport cannot work with.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("min_scale must be positive, got {0}")]
    NonPositiveMinScale(f32),

    #[error("min_scale {min} is larger than max_scale {max}")]
    InvertedScaleBounds { min: f32, max: f32 },

    #[error("zoom_in_factor must be greater than 1, got {0}")]
    ZoomInFactor(f32),

    #[error("zoom_out_factor must be between 0 and 1, got {0}")]
    ZoomOutFactor(f32),
}

impl ZoomLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Negated comparisons so NaN fails too.
        if !(self.min_scale > 0.0) {
            return Err(ConfigError::NonPositiveMinScale(self.min_scale));
        }
        if !(self.min_scale <= self.max_scale) {
            return Err(ConfigError::InvertedScaleBounds {
                min: self.min_scale,
                max: self.max_scale,
            });
        }
        if !(self.zoom_in_factor > 1.0) {
            return Err(ConfigError::ZoomInFactor(self.zoom_in_factor));
        }
        if !(self.zoom_out_factor > 0.0 && self.zoom_out_factor < 1.0) {
            return Err(ConfigError::ZoomOutFactor(self.zoom_out_factor));
        }
        Ok(())
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min_scale: 0.5,
            max_scale: 2.0,
            zoom_in_factor: 1.1,
            zoom_out_factor: 0.9,
        }
    }
}

/// Tunables for the editor. Every field has a default so a config file only
/// needs to name what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub zoom: ZoomLimits,
    /// Rendered node size in canvas units, used for hit testing and edges.
    pub node_size: Size,
    /// Hit radius of the input and output ports.
    pub port_radius: f32,
    /// Where `add_node` places the first node.
    pub default_position: Point,
    /// Offset between consecutively added nodes so they do not stack exactly.
    pub cascade_step: Point,
    /// Number of cascade steps before placement wraps back to the default.
    pub cascade_limit: usize,
    pub pan_modifier: PanModifier,
    /// Screen pixels a press may travel and still count as a click.
    pub click_slop: f32,
    /// Horizontal bezier handle length as a fraction of the edge's dx.
    pub edge_curvature: f32,
    /// Lower bound on the bezier handle length.
    pub min_edge_handle: f32,
    /// Screen padding kept around content by fit-to-content.
    pub fit_padding: f32,
    /// Column and row gaps used by auto-arrange.
    pub arrange_gap: Size,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            zoom: ZoomLimits::default(),
            node_size: Size::new(200.0, 72.0),
            port_radius: 8.0,
            default_position: Point::new(250.0, 150.0),
            cascade_step: Point::new(24.0, 24.0),
            cascade_limit: 8,
            pan_modifier: PanModifier::default(),
            click_slop: 4.0,
            edge_curvature: 0.5,
            min_edge_handle: 50.0,
            fit_padding: 40.0,
            arrange_gap: Size::new(80.0, 40.0),
        }
    }
}

impl EditorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.zoom.validate()
    }

    /// Placement for the `n`th added node.
    pub fn placement(&self, n: usize) -> Point {
        let step = if self.cascade_limit == 0 {
            0
        } else {
            n % self.cascade_limit
        };
        self.default_position + self.cascade_step * step as f32
    }
}
