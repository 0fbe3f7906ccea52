//! Static fit search: can any staged piece still go anywhere?

use crate::board::{Board, GridIndex};
use crate::pieces::Piece;
use tracing::info;

impl Board {
    /// Cells `piece` would cover with its first hex on `at`, if they all exist and are empty
    pub fn placement_cells(&self, piece: &Piece, at: GridIndex) -> Option<Vec<GridIndex>> {
        let origin = self.cell(at)?.coord();
        let first = piece.hexes().first()?.coord;

        piece
            .hexes()
            .iter()
            .map(|hex| {
                let cell = self.cell_at(origin + (hex.coord - first))?;
                (!cell.is_occupied()).then_some(cell.index)
            })
            .collect()
    }

    pub fn can_place(&self, piece: &Piece, at: GridIndex) -> bool {
        self.placement_cells(piece, at).is_some()
    }

    /// True when no piece fits on any empty cell. Also true for no pieces.
    pub fn is_game_over<'a>(&self, pieces: impl IntoIterator<Item = &'a Piece>) -> bool {
        let pieces: Vec<&Piece> = pieces.into_iter().collect();
        let fits = self
            .cells()
            .filter(|cell| !cell.is_occupied())
            .any(|cell| pieces.iter().any(|piece| self.can_place(piece, cell.index)));

        if !fits {
            info!(
                pieces = pieces.len(),
                empty = self.cell_count() - self.occupied_count(),
                "No staged piece fits"
            );
        }
        !fits
    }
}
