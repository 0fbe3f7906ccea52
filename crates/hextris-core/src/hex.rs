//! Hex coordinate system for offset-row hexagon boards.
//!
//! This module provides:
//! - `HexCoord`: logical `(row, column)` position of a hex, where alternating
//!   rows are shifted by half a column
//! - `Orientation`: the two rotation classes a hex can be drawn in
//! - `HexSettings`: sizing configuration shared by the board and pieces
//! - `HexGeometry`: maps logical coordinates to pixel space and caches the
//!   hexagon vertex sets for the current settings
//!
//! Columns are stored in half-column units (`half_col = 2 * col`) so that the
//! half-integer columns of shifted rows stay exact integers.

use crate::polygon::{self, Point};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::ops::{Add, Sub};
use thiserror::Error;

/// Rotation class of a hexagon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Orientation {
    /// No extra rotation
    #[default]
    Flat,
    /// Rotated by 30 degrees
    Rotated,
}

impl Orientation {
    pub const ALL: [Orientation; 2] = [Orientation::Flat, Orientation::Rotated];

    /// Extra rotation applied on top of the base vertex phase
    pub fn degrees(&self) -> f64 {
        match self {
            Orientation::Flat => 0.0,
            Orientation::Rotated => 30.0,
        }
    }

    /// Board rows alternate orientation, starting flat on row 0
    pub fn for_row(row: usize) -> Self {
        if row % 2 == 0 {
            Orientation::Flat
        } else {
            Orientation::Rotated
        }
    }

    /// The other rotation class
    pub fn toggled(&self) -> Self {
        match self {
            Orientation::Flat => Orientation::Rotated,
            Orientation::Rotated => Orientation::Flat,
        }
    }

    fn slot(&self) -> usize {
        match self {
            Orientation::Flat => 0,
            Orientation::Rotated => 1,
        }
    }
}

/// Logical hex position.
///
/// - `row` increases going down
/// - `half_col` is the column times two; neighbors in the same row are two
///   half-columns apart, neighbors in adjacent rows one half-column apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct HexCoord {
    pub row: i32,
    pub half_col: i32,
}

impl HexCoord {
    pub const fn new(row: i32, half_col: i32) -> Self {
        Self { row, half_col }
    }

    /// Build from a column that may be a half-integer (`1.5`, `-0.5`, ...)
    pub fn from_col(row: i32, col: f64) -> Self {
        Self::new(row, (col * 2.0).round() as i32)
    }

    /// Column as a (possibly half-integer) number
    pub fn col(&self) -> f64 {
        f64::from(self.half_col) / 2.0
    }

    /// Mirror across the vertical axis (`col -> -col`)
    pub const fn flip_horizontal(&self) -> Self {
        Self::new(self.row, -self.half_col)
    }

    /// Mirror across the horizontal axis (`row -> -row`)
    pub const fn flip_vertical(&self) -> Self {
        Self::new(-self.row, self.half_col)
    }

    /// The six touching hexes, clockwise starting from East
    pub fn neighbors(&self) -> [HexCoord; 6] {
        [
            HexCoord::new(self.row, self.half_col + 2),     // East
            HexCoord::new(self.row + 1, self.half_col + 1), // SouthEast
            HexCoord::new(self.row + 1, self.half_col - 1), // SouthWest
            HexCoord::new(self.row, self.half_col - 2),     // West
            HexCoord::new(self.row - 1, self.half_col - 1), // NorthWest
            HexCoord::new(self.row - 1, self.half_col + 1), // NorthEast
        ]
    }
}

impl Add for HexCoord {
    type Output = HexCoord;

    fn add(self, rhs: HexCoord) -> HexCoord {
        HexCoord::new(self.row + rhs.row, self.half_col + rhs.half_col)
    }
}

impl Sub for HexCoord {
    type Output = HexCoord;

    fn sub(self, rhs: HexCoord) -> HexCoord {
        HexCoord::new(self.row - rhs.row, self.half_col - rhs.half_col)
    }
}

impl fmt::Display for HexCoord {
    /// `col,row`, with the column printed as a decimal (`0.5,1`)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.col(), self.row)
    }
}

/// Sizing configuration for hexes on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HexSettings {
    /// Gap added between neighboring hexes, in pixels
    pub spacing: f64,
    /// Hexagon circumradius, in pixels
    pub size: f64,
    /// Horizontal distance between columns, as a multiple of `size`
    pub x_spacing_factor: f64,
    /// Vertical distance between rows, as a multiple of `size`
    pub y_spacing_factor: f64,
}

impl Default for HexSettings {
    fn default() -> Self {
        Self {
            spacing: 0.0,
            size: 50.0,
            x_spacing_factor: 1.75,
            y_spacing_factor: 1.5,
        }
    }
}

impl HexSettings {
    /// Pixel distance between two adjacent columns
    pub fn column_step(&self) -> f64 {
        self.size * self.x_spacing_factor + self.spacing
    }

    /// Pixel distance between two adjacent rows
    pub fn row_step(&self) -> f64 {
        self.size * self.y_spacing_factor + self.spacing
    }

    /// Radius used for the drawn outline, half the spacing included
    pub fn outline_radius(&self) -> f64 {
        self.size + self.spacing / 2.0
    }
}

/// Errors raised by the geometry layer. These indicate setup bugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("hex geometry requested before any settings were configured")]
    ConfigurationMissing,
}

/// Six hexagon vertices around the origin for the given radius and orientation.
///
/// Vertices sit at 60 degree steps with a -30 degree phase, shifted by the
/// orientation's extra rotation.
pub fn hex_vertices(radius: f64, orientation: Orientation) -> [Point; 6] {
    let phase = -PI / 6.0 + orientation.degrees().to_radians();
    std::array::from_fn(|i| {
        let angle = PI / 3.0 * i as f64 + phase;
        Point::new(angle.cos() * radius, angle.sin() * radius)
    })
}

#[derive(Debug, Clone, PartialEq)]
struct VertexCache {
    size: f64,
    spacing: f64,
    vertices: [[Point; 6]; 2],
    area: f64,
}

impl VertexCache {
    fn compute(settings: &HexSettings) -> Self {
        let radius = settings.outline_radius();
        let vertices = Orientation::ALL.map(|o| hex_vertices(radius, o));
        Self {
            size: settings.size,
            spacing: settings.spacing,
            area: polygon::area(&vertices[0]),
            vertices,
        }
    }

    fn matches(&self, settings: &HexSettings) -> bool {
        self.size == settings.size && self.spacing == settings.spacing
    }
}

/// Pixel-space geometry for the current settings.
///
/// One instance is owned per session and handed to the board, the staging
/// area and the placement engine by reference. Vertex sets only depend on
/// `size` and `spacing`, so reconfiguring with the same pair keeps the cache.
#[derive(Debug, Clone, Default)]
pub struct HexGeometry {
    settings: Option<HexSettings>,
    cache: Option<VertexCache>,
    recomputations: u32,
}

impl HexGeometry {
    /// Create an unconfigured geometry. Every query fails until `configure`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a geometry already configured with `settings`
    pub fn with_settings(settings: HexSettings) -> Self {
        let mut geometry = Self::new();
        geometry.configure(settings);
        geometry
    }

    /// Install new settings, recomputing vertices only if size or spacing changed
    pub fn configure(&mut self, settings: HexSettings) {
        let stale = self
            .cache
            .as_ref()
            .map_or(true, |cache| !cache.matches(&settings));
        if stale {
            self.cache = Some(VertexCache::compute(&settings));
            self.recomputations += 1;
        }
        self.settings = Some(settings);
    }

    pub fn is_configured(&self) -> bool {
        self.settings.is_some()
    }

    pub fn settings(&self) -> Result<&HexSettings, GeometryError> {
        self.settings.as_ref().ok_or(GeometryError::ConfigurationMissing)
    }

    /// How many times the vertex sets have been computed
    pub fn recomputations(&self) -> u32 {
        self.recomputations
    }

    fn cache(&self) -> Result<&VertexCache, GeometryError> {
        self.cache.as_ref().ok_or(GeometryError::ConfigurationMissing)
    }

    /// Pixel offset of a hex center from its board/piece origin
    pub fn offset(&self, coord: HexCoord) -> Result<Point, GeometryError> {
        let settings = self.settings()?;
        Ok(Point::new(
            coord.col() * settings.column_step(),
            f64::from(coord.row) * settings.row_step(),
        ))
    }

    /// Local vertex offsets of a hexagon with the given orientation
    pub fn vertices(&self, orientation: Orientation) -> Result<&[Point; 6], GeometryError> {
        Ok(&self.cache()?.vertices[orientation.slot()])
    }

    /// Absolute hexagon polygon centered on `center`
    pub fn polygon_at(
        &self,
        center: Point,
        orientation: Orientation,
    ) -> Result<[Point; 6], GeometryError> {
        let local = self.vertices(orientation)?;
        Ok(local.map(|v| center + v))
    }

    /// Area of a single hexagon
    pub fn hex_area(&self) -> Result<f64, GeometryError> {
        Ok(self.cache()?.area)
    }

    /// Distance beyond which two hexagons can never overlap
    pub fn overlap_reach(&self) -> Result<f64, GeometryError> {
        Ok(2.0 * self.settings()?.outline_radius())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_columns_round_trip() {
        let coord = HexCoord::from_col(3, 1.5);
        assert_eq!(coord, HexCoord::new(3, 3));
        assert_eq!(coord.col(), 1.5);
        assert_eq!(coord.to_string(), "1.5,3");
        assert_eq!(HexCoord::from_col(0, 2.0).to_string(), "2,0");
    }

    #[test]
    fn test_flips_are_involutions() {
        let coord = HexCoord::from_col(-1, 0.5);
        assert_eq!(coord.flip_horizontal().flip_horizontal(), coord);
        assert_eq!(coord.flip_vertical().flip_vertical(), coord);
        assert_eq!(coord.flip_horizontal(), HexCoord::from_col(-1, -0.5));
        assert_eq!(coord.flip_vertical(), HexCoord::from_col(1, 0.5));
    }

    #[test]
    fn test_neighbors_are_unique() {
        let center = HexCoord::new(4, 4);
        let neighbors = center.neighbors();
        let unique: std::collections::HashSet<_> = neighbors.iter().collect();
        assert_eq!(unique.len(), 6);
        for n in neighbors {
            // Neighbors keep the tiling parity of the center
            assert_eq!((n.row + n.half_col).rem_euclid(2), 0);
        }
    }

    #[test]
    fn test_geometry_requires_configuration() {
        let geometry = HexGeometry::new();
        assert!(!geometry.is_configured());
        assert_eq!(
            geometry.vertices(Orientation::Flat).unwrap_err(),
            GeometryError::ConfigurationMissing
        );
        assert_eq!(
            geometry.offset(HexCoord::new(1, 1)).unwrap_err(),
            GeometryError::ConfigurationMissing
        );
        assert!(geometry.hex_area().is_err());
    }

    #[test]
    fn test_offset_uses_spacing_factors() {
        let geometry = HexGeometry::with_settings(HexSettings::default());
        let p = geometry.offset(HexCoord::from_col(2, 1.5)).unwrap();
        assert!((p.x - 1.5 * 87.5).abs() < 1e-9);
        assert!((p.y - 2.0 * 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_vertices_have_outline_radius() {
        let settings = HexSettings {
            spacing: 4.0,
            ..HexSettings::default()
        };
        let geometry = HexGeometry::with_settings(settings);
        for orientation in Orientation::ALL {
            for v in geometry.vertices(orientation).unwrap() {
                assert!((v.distance_to(Point::default()) - 52.0).abs() < 1e-9);
            }
        }
        // First flat vertex sits at -30 degrees
        let first = geometry.vertices(Orientation::Flat).unwrap()[0];
        assert!((first.x - 52.0 * (3.0_f64).sqrt() / 2.0).abs() < 1e-9);
        assert!((first.y + 26.0).abs() < 1e-9);
        // Rotated hexes start at 0 degrees
        let first = geometry.vertices(Orientation::Rotated).unwrap()[0];
        assert!((first.x - 52.0).abs() < 1e-9);
        assert!(first.y.abs() < 1e-9);
    }

    #[test]
    fn test_vertex_cache_survives_unrelated_changes() {
        let mut geometry = HexGeometry::with_settings(HexSettings::default());
        assert_eq!(geometry.recomputations(), 1);

        geometry.configure(HexSettings {
            x_spacing_factor: 2.0,
            ..HexSettings::default()
        });
        assert_eq!(geometry.recomputations(), 1);
        assert_eq!(geometry.settings().unwrap().x_spacing_factor, 2.0);

        geometry.configure(HexSettings {
            size: 30.0,
            ..HexSettings::default()
        });
        assert_eq!(geometry.recomputations(), 2);
    }

    #[test]
    fn test_hex_area_matches_formula() {
        let geometry = HexGeometry::with_settings(HexSettings::default());
        let expected = 3.0 * (3.0_f64).sqrt() / 2.0 * 50.0 * 50.0;
        assert!((geometry.hex_area().unwrap() - expected).abs() < 1e-6);
    }
}
