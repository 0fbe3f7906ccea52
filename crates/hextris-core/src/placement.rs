//! Drag-time overlap testing, hover preview and commit.
//!
//! While a piece is dragged, each of its hexes is matched with the board cell
//! it covers the most. A drop is only accepted when every hex found its own
//! empty cell.

use crate::board::{Board, Color, GridIndex, HexStyle};
use crate::config::PlacementConfig;
use crate::hex::{GeometryError, HexCoord, HexGeometry};
use crate::pieces::Piece;
use crate::polygon::{self, Point};
use crate::staging::{PieceHexId, PieceId, StagedPiece};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Best board cell found under one piece hex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    pub piece_hex: PieceHexId,
    /// Piece-local coordinate of the hex
    pub piece_coord: HexCoord,
    pub cell: GridIndex,
    /// Overlap area in square pixels
    pub area: f64,
}

/// Match every hex of a staged piece with the board cell it overlaps most.
///
/// Overlap is the true area of the two hexagons' intersection. A hex with no
/// overlap of at least `min_overlap_ratio` of a full hexagon is left out, so
/// the result is shorter than the piece when part of it hangs off the board.
pub fn compute_intersections(
    staged: &StagedPiece,
    board: &Board,
    geometry: &HexGeometry,
    config: &PlacementConfig,
) -> Result<Vec<Intersection>, GeometryError> {
    let min_area = geometry.hex_area()? * config.min_overlap_ratio;
    let reach = geometry.overlap_reach()?;
    let mut intersections = Vec::new();

    for (index, hex) in staged.piece.hexes().iter().enumerate() {
        let center = staged.position + geometry.offset(hex.coord)?;
        let outline = geometry.polygon_at(center, hex.orientation)?;

        let mut best: Option<(GridIndex, f64)> = None;
        for cell in board.cells() {
            // Circumcircles that don't touch can't overlap
            if center.distance_to(cell.center) >= reach {
                continue;
            }
            let cell_outline = geometry.polygon_at(cell.center, cell.hex.orientation)?;
            let area = polygon::intersection_area(&outline, &cell_outline);
            if best.map_or(true, |(_, top)| area > top) {
                best = Some((cell.index, area));
            }
        }

        if let Some((cell, area)) = best {
            if area > 0.0 && area >= min_area {
                intersections.push(Intersection {
                    piece_hex: staged.hex_id(index),
                    piece_coord: hex.coord,
                    cell,
                    area,
                });
            }
        }
    }

    Ok(intersections)
}

/// Reuses the last intersection list while a dragged piece barely moves
#[derive(Debug, Clone, Default)]
pub struct IntersectionCache {
    piece: Option<PieceId>,
    /// Piece position at the last computation
    reference: Point,
    intersections: Vec<Intersection>,
    hits: u32,
    misses: u32,
}

impl IntersectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached intersections if `staged` is the same piece and has moved less
    /// than the threshold on both axes, otherwise freshly computed ones.
    pub fn get_or_compute(
        &mut self,
        staged: &StagedPiece,
        board: &Board,
        geometry: &HexGeometry,
        config: &PlacementConfig,
    ) -> Result<&[Intersection], GeometryError> {
        let delta = staged.position - self.reference;
        let fresh_enough = self.piece == Some(staged.id)
            && delta.x.abs() < config.move_threshold
            && delta.y.abs() < config.move_threshold;

        if fresh_enough {
            self.hits += 1;
        } else {
            self.intersections = compute_intersections(staged, board, geometry, config)?;
            self.piece = Some(staged.id);
            self.reference = staged.position;
            self.misses += 1;
        }
        Ok(&self.intersections)
    }

    /// Forget the cached piece; the next lookup always recomputes
    pub fn reset(&mut self) {
        self.piece = None;
        self.intersections.clear();
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }
}

impl Board {
    /// Cells a piece would fill for these intersections, if the drop is legal
    fn matched_cells(&self, piece: &Piece, intersections: &[Intersection]) -> Option<Vec<GridIndex>> {
        if intersections.len() != piece.len() {
            return None;
        }
        let mut seen = HashSet::new();
        for hit in intersections {
            let cell = self.cell(hit.cell)?;
            if cell.is_occupied() || !seen.insert(hit.cell) {
                return None;
            }
        }
        Some(intersections.iter().map(|hit| hit.cell).collect())
    }

    /// Mark cells occupied and paint them
    pub(crate) fn fill_cells(&mut self, cells: &[GridIndex], color: Color) {
        for &index in cells {
            if let Some(cell) = self.cell_mut(index) {
                cell.hex.occupied = true;
                cell.style = HexStyle::with_fill(color);
            }
        }
    }

    pub fn previewed_cells(&self) -> &[GridIndex] {
        &self.preview
    }

    /// Remove the hover highlight, returning the cells that had it
    pub fn clear_preview(&mut self) -> Vec<GridIndex> {
        let previous = std::mem::take(&mut self.preview);
        for &index in &previous {
            if let Some(cell) = self.cell_mut(index) {
                cell.highlighted = false;
            }
        }
        previous
    }

    /// Highlight the cells a hovering piece would fill.
    ///
    /// Any previous highlight is cleared first. Returns false, leaving nothing
    /// highlighted, when the piece could not be dropped here.
    pub fn preview_hover(&mut self, piece: &Piece, intersections: &[Intersection]) -> bool {
        self.clear_preview();
        let Some(cells) = self.matched_cells(piece, intersections) else {
            return false;
        };
        for &index in &cells {
            if let Some(cell) = self.cell_mut(index) {
                cell.highlighted = true;
            }
        }
        self.preview = cells;
        true
    }

    /// Lock a piece into the cells it overlaps.
    ///
    /// On success the cells become occupied and take the piece color, then a
    /// completion scan runs. On failure nothing changes.
    pub fn try_commit(&mut self, piece: &Piece, intersections: &[Intersection]) -> bool {
        let Some(cells) = self.matched_cells(piece, intersections) else {
            debug!(piece = piece.name(), hits = intersections.len(), "Rejected drop");
            return false;
        };

        self.clear_preview();
        self.fill_cells(&cells, piece.color());
        debug!(piece = piece.name(), cells = cells.len(), "Committed piece");

        self.check_complete_lines();
        true
    }
}
