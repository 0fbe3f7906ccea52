//! Hextris - a hexagonal block-fitting puzzle engine
//!
//! This crate provides the core game logic for Hextris, including:
//! - Hex coordinate system and pixel geometry for the board and pieces
//! - Board representation with occupancy tracking and line clearing
//! - The piece catalog and the staging area pieces are dragged from
//! - Drag-time placement with hover preview and commit
//! - A pointer-driven game session and a move-suggesting bot
//!
//! # Architecture
//!
//! The engine is platform-agnostic. It can be compiled to:
//! - Native Rust for server-side sessions
//! - WebAssembly for a browser rendering layer
//!
//! # Modules
//!
//! - [`hex`] / [`polygon`]: Coordinates, vertex caches and polygon math
//! - [`board`]: Board cells, fingerprint and row/diagonal clearing
//! - [`pieces`]: Piece templates and the flip-expanded catalog
//! - [`staging`]: Slots holding the pieces on offer
//! - [`placement`]: Overlap matching, preview and commit
//! - [`game_over`]: Whether any staged piece still fits
//! - [`game`]: The session state machine

pub mod actions;
pub mod board;
pub mod bot;
pub mod config;
pub mod game;
pub mod game_over;
pub mod hex;
pub mod pieces;
pub mod placement;
pub mod polygon;
pub mod staging;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{GameEvent, InputEvent, Move};
pub use board::{Board, BoardCell, BoardError, DiagonalFamily, GridIndex, Line, LineClearReport};
pub use bot::{Bot, BotDifficulty};
pub use config::{CanvasSize, ConfigError, GameConfig, PlacementConfig};
pub use game::{GameError, GameSession, SessionSnapshot};
pub use hex::{GeometryError, HexCoord, HexGeometry, HexSettings, Orientation};
pub use pieces::{Catalog, Piece, PieceHex};
pub use placement::{compute_intersections, Intersection, IntersectionCache};
pub use polygon::Point;
pub use staging::{PieceHexId, PieceId, StagedPiece, Staging};
