//! Game board representation: cell layout, occupancy and line clearing.
//!
//! This module contains:
//! - Cell and style types
//! - The hexagonal board built from two mirrored half-boards
//! - The occupancy fingerprint used to skip redundant scans
//! - Row and diagonal completion checks and clearing
//!
//! Grid rows run top to bottom. Row `i` of a board of width `W` (radius
//! `R = (W - 1) / 2`) holds `W - |i - R|` cells, and its cell `c` sits at
//! half-column `2c + |i - R|`, which produces the hexagonal packing.

use crate::config::CanvasSize;
use crate::hex::{GeometryError, HexCoord, HexGeometry, Orientation};
use crate::polygon::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Packed `0xRRGGBB` color
pub type Color = u32;

/// Outline of a drawn hexagon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Border {
    pub width: u32,
    pub color: Color,
}

/// How a cell should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexStyle {
    pub border: Border,
    pub fill: Color,
}

impl Default for HexStyle {
    fn default() -> Self {
        Self {
            border: Border {
                width: 3,
                color: 0xffffff,
            },
            fill: 0x0000ff,
        }
    }
}

impl HexStyle {
    /// Default outline with a custom fill
    pub fn with_fill(fill: Color) -> Self {
        Self {
            fill,
            ..Self::default()
        }
    }
}

/// Style drawn over cells that a hovering piece would fill
pub const HIGHLIGHT_STYLE: HexStyle = HexStyle {
    border: Border {
        width: 4,
        color: 0xffff00,
    },
    fill: 0x3a7d44,
};

/// Dense index of a cell inside the row arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridIndex {
    pub row: usize,
    pub col: usize,
}

impl GridIndex {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A logical hex cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexCell {
    pub coord: HexCoord,
    pub orientation: Orientation,
    pub occupied: bool,
}

/// A cell that belongs to the board
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardCell {
    pub hex: HexCell,
    /// Position in the row arrays, reassigned whenever the layout is rebuilt
    pub index: GridIndex,
    /// Pixel center on the canvas
    pub center: Point,
    pub style: HexStyle,
    /// Set while a valid drop is hovering over this cell
    pub highlighted: bool,
}

impl BoardCell {
    fn blank() -> Self {
        Self {
            hex: HexCell {
                coord: HexCoord::default(),
                orientation: Orientation::Flat,
                occupied: false,
            },
            index: GridIndex::new(0, 0),
            center: Point::default(),
            style: HexStyle::default(),
            highlighted: false,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.hex.occupied
    }

    pub fn coord(&self) -> HexCoord {
        self.hex.coord
    }

    /// Style to draw right now, taking the hover highlight into account
    pub fn display_style(&self) -> HexStyle {
        if self.highlighted {
            HIGHLIGHT_STYLE
        } else {
            self.style
        }
    }
}

/// The two diagonal directions of the hex grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagonalFamily {
    /// "/" lines, walked down and to the left
    Ascending,
    /// "\" lines, walked down and to the right
    Descending,
}

impl DiagonalFamily {
    pub const ALL: [DiagonalFamily; 2] = [DiagonalFamily::Ascending, DiagonalFamily::Descending];
}

/// A clearable line of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Line {
    Row(usize),
    Diagonal {
        family: DiagonalFamily,
        /// Topmost cell of the diagonal
        start: GridIndex,
    },
}

/// Outcome of one completion scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineClearReport {
    /// Every line found complete
    pub lines: Vec<Line>,
    /// Every cell emptied, each listed once
    pub cleared: Vec<GridIndex>,
}

impl LineClearReport {
    /// True when the scan found nothing to clear
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn rows_cleared(&self) -> usize {
        self.lines.iter().filter(|l| matches!(l, Line::Row(_))).count()
    }

    pub fn diagonals_cleared(&self) -> usize {
        self.lines.len() - self.rows_cleared()
    }
}

/// Callback invoked once per performed completion scan
pub type LineClearHook = Arc<dyn Fn(&LineClearReport) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board width must be odd and at least 3, got {0}")]
    InvalidWidth(usize),

    #[error("fingerprint covers {actual} cells but the board has {expected}")]
    FingerprintLength { expected: usize, actual: usize },

    #[error("invalid fingerprint character {0:?}")]
    FingerprintCharacter(char),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// The complete hexagonal board
#[derive(Clone)]
pub struct Board {
    /// Cells by grid row, narrow at both ends and widest in the middle
    rows: Vec<Vec<BoardCell>>,
    /// Cells in the middle row
    width: usize,
    /// Fingerprint as of the end of the last performed scan
    last_scanned: Option<String>,
    scans: u32,
    /// Cells currently highlighted by a hover preview
    pub(crate) preview: Vec<GridIndex>,
    hooks: Vec<LineClearHook>,
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("width", &self.width)
            .field("fingerprint", &self.fingerprint())
            .field("scans", &self.scans)
            .field("preview", &self.preview)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl Board {
    /// Build an empty board of the given width, centered on the canvas
    pub fn new(width: usize, geometry: &HexGeometry, canvas: CanvasSize) -> Result<Self, BoardError> {
        if width < 3 || width % 2 == 0 {
            return Err(BoardError::InvalidWidth(width));
        }
        let radius = width / 2;

        // Each half-board is a trapezoid whose rows shrink by one cell per
        // step away from the middle. The top half includes the middle row.
        let half = |steps: std::ops::RangeInclusive<usize>| -> Vec<Vec<BoardCell>> {
            steps
                .map(|k| vec![BoardCell::blank(); width - k])
                .collect()
        };
        let mut top = half(0..=radius);
        let bottom = half(1..=radius);

        // The top half was built from the middle outward; flip it so rows run
        // from the upper edge to the lower edge.
        top.reverse();
        let mut rows = top;
        rows.extend(bottom);

        let mut board = Self {
            rows,
            width,
            last_scanned: None,
            scans: 0,
            preview: Vec::new(),
            hooks: Vec::new(),
        };
        board.reindex(geometry, canvas)?;
        Ok(board)
    }

    /// Build a board and load its occupancy from a fingerprint
    pub fn from_fingerprint(
        width: usize,
        geometry: &HexGeometry,
        canvas: CanvasSize,
        fingerprint: &str,
    ) -> Result<Self, BoardError> {
        let mut board = Self::new(width, geometry, canvas)?;
        board.load_fingerprint(fingerprint)?;
        Ok(board)
    }

    /// Reassign every cell's dense index, logical coordinate, orientation and
    /// pixel center from its position in the row arrays.
    fn reindex(&mut self, geometry: &HexGeometry, canvas: CanvasSize) -> Result<(), GeometryError> {
        let radius = self.radius();
        let middle = HexCoord::new(radius as i32, 2 * radius as i32);
        let origin = canvas.center() - geometry.offset(middle)?;

        for (r, row) in self.rows.iter_mut().enumerate() {
            let shift = r.abs_diff(radius);
            for (c, cell) in row.iter_mut().enumerate() {
                cell.index = GridIndex::new(r, c);
                cell.hex.coord = HexCoord::new(r as i32, (2 * c + shift) as i32);
                cell.hex.orientation = Orientation::for_row(r);
                cell.center = origin + geometry.offset(cell.hex.coord)?;
            }
        }
        Ok(())
    }

    /// Re-lay the board for new settings or canvas, keeping occupancy
    pub fn relayout(&mut self, geometry: &HexGeometry, canvas: CanvasSize) -> Result<(), BoardError> {
        self.reindex(geometry, canvas)?;
        Ok(())
    }

    // ==================== Query Methods ====================

    /// Cells in the widest row
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of cells from the middle row to either edge row
    pub fn radius(&self) -> usize {
        self.width / 2
    }

    /// Number of grid rows
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<BoardCell>] {
        &self.rows
    }

    /// Number of cells in a grid row (0 for rows that do not exist)
    pub fn row_len(&self, row: usize) -> usize {
        self.rows.get(row).map_or(0, Vec::len)
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = &BoardCell> {
        self.rows.iter().flatten()
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Cell at a dense index, absent outside the row's actual bounds
    pub fn get_cell(&self, row: usize, col: usize) -> Option<&BoardCell> {
        self.rows.get(row)?.get(col)
    }

    pub fn cell(&self, index: GridIndex) -> Option<&BoardCell> {
        self.get_cell(index.row, index.col)
    }

    pub(crate) fn cell_mut(&mut self, index: GridIndex) -> Option<&mut BoardCell> {
        self.rows.get_mut(index.row)?.get_mut(index.col)
    }

    /// Dense index of the cell at a logical coordinate, if there is one
    pub fn index_of(&self, coord: HexCoord) -> Option<GridIndex> {
        let row = usize::try_from(coord.row).ok()?;
        let len = self.rows.get(row)?.len();
        let indent = i32::try_from(row.abs_diff(self.radius())).ok()?;
        let shifted = coord.half_col.checked_sub(indent)?;
        if shifted < 0 || shifted % 2 != 0 {
            return None;
        }
        let col = (shifted / 2) as usize;
        (col < len).then_some(GridIndex::new(row, col))
    }

    /// Cell at a logical coordinate, absent if the board has no such cell
    pub fn cell_at(&self, coord: HexCoord) -> Option<&BoardCell> {
        self.index_of(coord).and_then(|index| self.cell(index))
    }

    pub fn occupied_count(&self) -> usize {
        self.cells().filter(|c| c.is_occupied()).count()
    }

    /// Number of completion scans actually performed (skips not counted)
    pub fn scans_performed(&self) -> u32 {
        self.scans
    }

    // ==================== Mutation Methods ====================

    /// Replace the cell at `cell.index`. Returns false if that index is absent.
    pub fn set_cell(&mut self, cell: BoardCell) -> bool {
        match self.cell_mut(cell.index) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// Register a callback run once per performed completion scan
    pub fn on_line_cleared<F>(&mut self, hook: F)
    where
        F: Fn(&LineClearReport) + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
    }

    /// Drop every registered line-clear callback
    pub fn clear_hooks(&mut self) {
        self.hooks.clear();
    }

    // ==================== Fingerprint ====================

    /// One `'1'`/`'0'` per cell, row-major, left to right within each row
    pub fn fingerprint(&self) -> String {
        self.cells()
            .map(|c| if c.is_occupied() { '1' } else { '0' })
            .collect()
    }

    /// Overwrite every cell's occupancy from a fingerprint
    pub fn load_fingerprint(&mut self, fingerprint: &str) -> Result<(), BoardError> {
        let expected = self.cell_count();
        let actual = fingerprint.chars().count();
        if actual != expected {
            return Err(BoardError::FingerprintLength { expected, actual });
        }
        let bits = fingerprint
            .chars()
            .map(|ch| match ch {
                '1' => Ok(true),
                '0' => Ok(false),
                other => Err(BoardError::FingerprintCharacter(other)),
            })
            .collect::<Result<Vec<bool>, BoardError>>()?;

        for (cell, occupied) in self.rows.iter_mut().flatten().zip(bits) {
            cell.hex.occupied = occupied;
            if !occupied {
                cell.style = HexStyle::default();
            }
        }
        Ok(())
    }

    // ==================== Line Completion ====================

    /// Top cells of every diagonal in a family.
    ///
    /// Every diagonal starts either on the top row or on the upper edge of
    /// the side it leans away from.
    fn diagonal_starts(&self, family: DiagonalFamily) -> Vec<GridIndex> {
        let mut starts: Vec<GridIndex> = (0..self.row_len(0)).map(|c| GridIndex::new(0, c)).collect();
        for row in 1..=self.radius() {
            let col = match family {
                DiagonalFamily::Ascending => self.row_len(row).saturating_sub(1),
                DiagonalFamily::Descending => 0,
            };
            starts.push(GridIndex::new(row, col));
        }
        starts
    }

    /// Next cell of a diagonal one row down, or `None` once the walk leaves the board.
    ///
    /// Above the midline rows widen, so "/" keeps its column and "\" moves one
    /// right; from the midline down rows narrow, so "/" moves one left and
    /// "\" keeps its column.
    fn diagonal_step(&self, from: GridIndex, family: DiagonalFamily) -> Option<GridIndex> {
        let before_midline = from.row < self.height() / 2;
        let col = match (family, before_midline) {
            (DiagonalFamily::Ascending, true) => Some(from.col),
            (DiagonalFamily::Descending, true) => Some(from.col + 1),
            (DiagonalFamily::Ascending, false) => from.col.checked_sub(1),
            (DiagonalFamily::Descending, false) => Some(from.col),
        }?;
        let next = GridIndex::new(from.row + 1, col);
        self.cell(next).map(|c| c.index)
    }

    /// Cells of a diagonal from `start` until the walk exits the board
    pub fn diagonal(&self, start: GridIndex, family: DiagonalFamily) -> Vec<GridIndex> {
        std::iter::successors(self.cell(start).map(|c| c.index), |&index| {
            self.diagonal_step(index, family)
        })
        .collect()
    }

    /// Cells of a complete diagonal, or `None` if it has a gap
    fn complete_diagonal(&self, start: GridIndex, family: DiagonalFamily) -> Option<Vec<GridIndex>> {
        let open_length = self.diagonal(start, family).len();
        let filled: Vec<GridIndex> = std::iter::successors(self.cell(start), |cell| {
            self.diagonal_step(cell.index, family)
                .and_then(|next| self.cell(next))
        })
        .take_while(|cell| cell.is_occupied())
        .map(|cell| cell.index)
        .collect();

        // A walk that stopped short of the open-board length hit a gap
        (!filled.is_empty() && filled.len() == open_length).then_some(filled)
    }

    /// Every complete line on the board, with the cells it covers
    pub fn complete_lines(&self) -> Vec<(Line, Vec<GridIndex>)> {
        let mut lines = Vec::new();

        for (r, row) in self.rows.iter().enumerate() {
            if !row.is_empty() && row.iter().all(BoardCell::is_occupied) {
                lines.push((Line::Row(r), row.iter().map(|c| c.index).collect()));
            }
        }

        for family in DiagonalFamily::ALL {
            for start in self.diagonal_starts(family) {
                if let Some(cells) = self.complete_diagonal(start, family) {
                    lines.push((Line::Diagonal { family, start }, cells));
                }
            }
        }

        lines
    }

    /// Clear every complete row and diagonal.
    ///
    /// Skipped (returns `None`, no hooks run) when occupancy has not changed
    /// since the last performed scan. Otherwise all complete lines are
    /// cleared in one pass, each registered hook is called once with the
    /// report, and the report is returned.
    pub fn check_complete_lines(&mut self) -> Option<LineClearReport> {
        let fingerprint = self.fingerprint();
        if self.last_scanned.as_deref() == Some(fingerprint.as_str()) {
            debug!("Occupancy unchanged since last scan, skipping");
            return None;
        }
        self.scans += 1;

        let mut lines = Vec::new();
        let mut doomed = BTreeSet::new();
        for (line, cells) in self.complete_lines() {
            lines.push(line);
            doomed.extend(cells);
        }

        for &index in &doomed {
            if let Some(cell) = self.cell_mut(index) {
                cell.hex.occupied = false;
                cell.style = HexStyle::default();
            }
        }

        let report = LineClearReport {
            lines,
            cleared: doomed.into_iter().collect(),
        };
        self.last_scanned = Some(self.fingerprint());

        if report.is_empty() {
            debug!("Completion scan found no full lines");
        } else {
            info!(
                rows = report.rows_cleared(),
                diagonals = report.diagonals_cleared(),
                cells = report.cleared.len(),
                "Cleared complete lines"
            );
        }

        for hook in &self.hooks {
            hook(&report);
        }
        Some(report)
    }

    /// Convert to a flat, serializable view for rendering clients
    pub fn to_view(&self) -> BoardView {
        BoardView {
            width: self.width,
            fingerprint: self.fingerprint(),
            cells: self.cells().copied().collect(),
        }
    }
}

/// Flat board representation for clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardView {
    pub width: usize,
    pub fingerprint: String,
    pub cells: Vec<BoardCell>,
}
