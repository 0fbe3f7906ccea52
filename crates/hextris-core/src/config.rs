//! Game configuration, loadable from JSON.

use crate::hex::HexSettings;
use crate::polygon::Point;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Size of the drawing surface the board is centered on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 1600.0,
            height: 1024.0,
        }
    }
}

impl CanvasSize {
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Tuning for drag-time overlap testing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Pixels a dragged piece must move on either axis before overlaps are recomputed
    pub move_threshold: f64,
    /// Smallest overlap, as a fraction of one hexagon's area, that counts as a match
    pub min_overlap_ratio: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            move_threshold: 20.0,
            min_overlap_ratio: 0.2,
        }
    }
}

/// Everything needed to start a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub settings: HexSettings,
    /// Cells in the widest (middle) row; must be odd
    pub board_width: usize,
    /// Number of pieces offered at once
    pub staging_slots: usize,
    pub canvas: CanvasSize,
    pub placement: PlacementConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            settings: HexSettings::default(),
            board_width: 11,
            staging_slots: 3,
            canvas: CanvasSize::default(),
            placement: PlacementConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl GameConfig {
    /// Parse from JSON. Missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let settings = &self.settings;
        let fields = [
            ("size", settings.size),
            ("spacing", settings.spacing),
            ("x_spacing_factor", settings.x_spacing_factor),
            ("y_spacing_factor", settings.y_spacing_factor),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::Invalid(format!("{name} must be finite, got {value}")));
        }
        if settings.size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "hex size must be positive, got {}",
                settings.size
            )));
        }
        if settings.x_spacing_factor <= 0.0 || settings.y_spacing_factor <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "spacing factors must be positive, got {} and {}",
                settings.x_spacing_factor, settings.y_spacing_factor
            )));
        }
        if settings.outline_radius() <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "spacing {} collapses the hex outline",
                settings.spacing
            )));
        }
        if self.board_width < 3 || self.board_width % 2 == 0 {
            return Err(ConfigError::Invalid(format!(
                "board width must be odd and at least 3, got {}",
                self.board_width
            )));
        }
        if self.staging_slots == 0 {
            return Err(ConfigError::Invalid("at least one staging slot is required".into()));
        }
        if !(0.0..=1.0).contains(&self.placement.min_overlap_ratio) {
            return Err(ConfigError::Invalid(format!(
                "min overlap ratio must be within [0, 1], got {}",
                self.placement.min_overlap_ratio
            )));
        }
        if !self.placement.move_threshold.is_finite() || self.placement.move_threshold < 0.0 {
            return Err(ConfigError::Invalid("move threshold cannot be negative".into()));
        }
        Ok(())
    }
}
