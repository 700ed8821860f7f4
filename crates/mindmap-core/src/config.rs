//! Engine configuration, passed explicitly into constructors.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::record::DepthTier;

/// Horizontal and vertical spacing per depth tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Gap between the root and a first-level node
    pub first_level_x_gap: f64,
    /// Vertical gap between stacked first-level subtrees
    pub first_level_y_gap: f64,
    /// Gap between a node and its grandchild-tier children
    pub grandchild_x_gap: f64,
    /// Vertical gap between stacked deeper subtrees
    pub grandchild_y_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            first_level_x_gap: 40.0,
            first_level_y_gap: 25.0,
            grandchild_x_gap: 24.0,
            grandchild_y_gap: 15.0,
        }
    }
}

impl LayoutConfig {
    /// Horizontal gap between a father and a child of the given tier
    pub fn x_gap(&self, child_tier: DepthTier) -> f64 {
        match child_tier {
            DepthTier::Root => 0.0,
            DepthTier::FirstLevel => self.first_level_x_gap,
            DepthTier::Grandchild => self.grandchild_x_gap,
        }
    }

    /// Vertical gap between siblings of the given tier
    pub fn y_gap(&self, child_tier: DepthTier) -> f64 {
        match child_tier {
            DepthTier::Root => 0.0,
            DepthTier::FirstLevel => self.first_level_y_gap,
            DepthTier::Grandchild => self.grandchild_y_gap,
        }
    }
}

/// Expander circle geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpanderMetrics {
    pub radius: f64,
    /// Distance between the node's outer side and the circle
    pub offset: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Touch-sized affordances (bigger expander circles)
    pub touch_mode: bool,
    /// Viewport scale on startup
    pub initial_scale: f64,
    /// Pointer travel in pixels before a press becomes a drag
    pub drag_threshold: f64,
    /// Scale delta for the zoom buttons
    pub zoom_speed: f64,
    /// Scale delta per wheel notch with the zoom modifier held
    pub wheel_zoom_speed: f64,
    pub layout: LayoutConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            touch_mode: false,
            initial_scale: 1.0,
            drag_threshold: 2.0,
            zoom_speed: 0.25,
            wheel_zoom_speed: 0.25,
            layout: LayoutConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn expander(&self) -> ExpanderMetrics {
        if self.touch_mode {
            ExpanderMetrics { radius: 7.0, offset: 3.0 }
        } else {
            ExpanderMetrics { radius: 5.0, offset: 2.0 }
        }
    }

    /// Load a JSON config file; missing keys take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing engine config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EngineConfig::from_json(r#"{ "touch_mode": true, "layout": { "grandchild_x_gap": 30 } }"#)
            .unwrap();
        assert!(cfg.touch_mode);
        assert_eq!(cfg.drag_threshold, 2.0);
        assert_eq!(cfg.layout.grandchild_x_gap, 30.0);
        assert_eq!(cfg.layout.first_level_x_gap, 40.0);
        assert_eq!(cfg.expander(), ExpanderMetrics { radius: 7.0, offset: 3.0 });
    }

    #[test]
    fn first_level_gaps_are_wider() {
        let layout = LayoutConfig::default();
        assert!(layout.x_gap(DepthTier::FirstLevel) > layout.x_gap(DepthTier::Grandchild));
        assert!(layout.y_gap(DepthTier::FirstLevel) > layout.y_gap(DepthTier::Grandchild));
    }
}
