//! Inputs a session accepts and the events it emits.
//!
//! Rendering clients translate pointer activity into `InputEvent`s and redraw
//! from the resulting `GameEvent`s.

use crate::board::{GridIndex, Line};
use crate::hex::Orientation;
use crate::polygon::Point;
use crate::staging::PieceId;
use serde::{Deserialize, Serialize};

/// Pointer and frame input from the rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    /// Button pressed; may pick up a staged piece
    PointerDown { x: f64, y: f64 },
    /// Pointer moved; drags the held piece
    PointerMove { x: f64, y: f64 },
    /// Button released; drops the held piece
    PointerUp { x: f64, y: f64 },
    /// Scroll wheel turned; toggles the orientation of the held or hovered piece
    Wheel { x: f64, y: f64, delta: f64 },
    /// Frame boundary; deferred cleanup happens here
    Tick,
}

impl InputEvent {
    /// Pointer position carried by the event, if any
    pub fn position(&self) -> Option<Point> {
        match *self {
            InputEvent::PointerDown { x, y }
            | InputEvent::PointerMove { x, y }
            | InputEvent::PointerUp { x, y }
            | InputEvent::Wheel { x, y, .. } => Some(Point::new(x, y)),
            InputEvent::Tick => None,
        }
    }
}

/// A placement chosen without pointer input: drop the piece in `slot` so its
/// first hex lands on `anchor`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub slot: usize,
    pub anchor: GridIndex,
}

/// Things that happened while handling an input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    /// A fresh piece appeared in a staging slot
    PieceStaged { piece: PieceId, slot: usize, name: String },

    /// A staged piece was picked up
    PieceLifted { piece: PieceId },

    /// These cells would be filled if the piece were dropped now
    PreviewShown { cells: Vec<GridIndex> },

    /// The previous hover highlight was removed
    PreviewCleared { cells: Vec<GridIndex> },

    /// A piece was locked into the board
    PieceCommitted {
        piece: PieceId,
        slot: usize,
        cells: Vec<GridIndex>,
    },

    /// A piece's hexes switched rotation class
    PieceRotated {
        piece: PieceId,
        orientations: Vec<Orientation>,
    },

    /// A dropped piece did not fit and sprang back
    PieceReturned { piece: PieceId, to: Point },

    /// Complete lines were cleared
    LinesCleared {
        lines: Vec<Line>,
        cells: Vec<GridIndex>,
    },

    /// A consumed piece's graphics can be released
    PieceDestroyed { piece: PieceId },

    /// Settings changed and the whole scene was rebuilt
    BoardRebuilt,

    /// None of the staged pieces fit anywhere
    GameOver,
}
