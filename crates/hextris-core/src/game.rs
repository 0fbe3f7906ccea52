//! Single-player game session.
//!
//! `GameSession` owns the board, the staging area and the geometry cache, and
//! turns pointer input into `GameEvent`s for the rendering layer.

use crate::actions::{GameEvent, InputEvent, Move};
use crate::board::{Board, BoardError, BoardView, GridIndex, LineClearReport};
use crate::config::GameConfig;
use crate::hex::{GeometryError, HexGeometry, HexSettings};
use crate::pieces::Catalog;
use crate::placement::{compute_intersections, IntersectionCache};
use crate::polygon::Point;
use crate::staging::{PieceId, StagedPiece, Staging};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur when driving a session
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Piece catalog is empty")]
    EmptyCatalog,

    #[error("No staging slot {0}")]
    NoSuchSlot(usize),

    #[error("Staging slot {0} is empty")]
    EmptySlot(usize),

    #[error("No board cell at {0}")]
    NoSuchCell(GridIndex),

    #[error("A piece is being dragged")]
    DragInProgress,

    #[error("Game is over")]
    GameOver,
}

/// The piece currently held by the pointer
#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    piece: PieceId,
    slot: usize,
    /// Pointer position relative to the piece origin when it was picked up
    grab: Point,
}

/// Serializable view of a whole session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub settings: HexSettings,
    pub board: BoardView,
    pub staged: Vec<StagedPiece>,
    pub dragging: Option<PieceId>,
    pub moves: u32,
    pub game_over: bool,
}

/// A running game
#[derive(Debug)]
pub struct GameSession {
    config: GameConfig,
    geometry: HexGeometry,
    catalog: Catalog,
    board: Board,
    staging: Staging,
    cache: IntersectionCache,
    drag: Option<Drag>,
    /// Consumed pieces whose graphics are released on the next tick
    pending_destroy: Vec<PieceId>,
    /// Reports delivered by the board's line-clear hook
    line_reports: Receiver<LineClearReport>,
    game_over: bool,
    rng: StdRng,
    moves: u32,
}

/// Build an empty board wired to report its line clears through a channel
fn build_board(
    config: &GameConfig,
    geometry: &HexGeometry,
) -> Result<(Board, Receiver<LineClearReport>), GameError> {
    let mut board = Board::new(config.board_width, geometry, config.canvas)?;
    let (tx, rx) = mpsc::channel();
    board.on_line_cleared(move |report| {
        // The receiver lives as long as the session that owns this board
        let _ = tx.send(report.clone());
    });
    Ok((board, rx))
}

impl GameSession {
    /// Start a session with the standard catalog and fresh randomness
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Start a reproducible session
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, GameError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(config: GameConfig, mut rng: StdRng) -> Result<Self, GameError> {
        let catalog = Catalog::standard_with_rng(&mut rng);
        Self::with_catalog(config, catalog, rng)
    }

    /// Start a session that stages pieces from a custom catalog
    pub fn with_catalog(config: GameConfig, catalog: Catalog, rng: StdRng) -> Result<Self, GameError> {
        config.validate().map_err(|e| {
            warn!(error = %e, "Rejected session configuration");
            GameError::InvalidConfig(e.to_string())
        })?;
        if catalog.is_empty() {
            return Err(GameError::EmptyCatalog);
        }

        let geometry = HexGeometry::with_settings(config.settings);
        let (board, line_reports) = build_board(&config, &geometry)?;
        let staging = Staging::new(config.staging_slots, config.canvas);

        let mut session = Self {
            config,
            geometry,
            catalog,
            board,
            staging,
            cache: IntersectionCache::new(),
            drag: None,
            pending_destroy: Vec::new(),
            line_reports,
            game_over: false,
            rng,
            moves: 0,
        };
        session.stage_all()?;
        info!(
            board_width = session.config.board_width,
            slots = session.config.staging_slots,
            variants = session.catalog.len(),
            "Started session"
        );
        Ok(session)
    }

    // ==================== Query Methods ====================

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn geometry(&self) -> &HexGeometry {
        &self.geometry
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn staging(&self) -> &Staging {
        &self.staging
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Pieces committed since the session (or scene) started
    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn dragged_piece(&self) -> Option<PieceId> {
        self.drag.map(|d| d.piece)
    }

    /// Consumed pieces still waiting for the next tick
    pub fn pending_destroy(&self) -> &[PieceId] {
        &self.pending_destroy
    }

    pub fn cache(&self) -> &IntersectionCache {
        &self.cache
    }

    /// Every placement that fits right now, slot by slot, anchors in row-major order
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.game_over {
            return Vec::new();
        }
        let empty: Vec<GridIndex> = self
            .board
            .cells()
            .filter(|c| !c.is_occupied())
            .map(|c| c.index)
            .collect();

        let board = &self.board;
        let empty = &empty;
        self.staging
            .pieces()
            .flat_map(move |staged| {
                empty
                    .iter()
                    .copied()
                    .filter(move |&anchor| board.can_place(&staged.piece, anchor))
                    .map(move |anchor| Move {
                        slot: staged.slot,
                        anchor,
                    })
            })
            .collect()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            settings: self.config.settings,
            board: self.board.to_view(),
            staged: self.staging.pieces().cloned().collect(),
            dragging: self.dragged_piece(),
            moves: self.moves,
            game_over: self.game_over,
        }
    }

    // ==================== Input Handling ====================

    /// Dispatch one input event
    pub fn handle(&mut self, input: InputEvent) -> Result<Vec<GameEvent>, GameError> {
        match input {
            InputEvent::PointerDown { x, y } => self.pointer_down(Point::new(x, y)),
            InputEvent::PointerMove { x, y } => self.pointer_move(Point::new(x, y)),
            InputEvent::PointerUp { x, y } => self.pointer_up(Point::new(x, y)),
            InputEvent::Wheel { x, y, delta } => self.wheel(Point::new(x, y), delta),
            InputEvent::Tick => Ok(self.tick()),
        }
    }

    /// Pick up the staged piece under the pointer, if any
    pub fn pointer_down(&mut self, at: Point) -> Result<Vec<GameEvent>, GameError> {
        if self.game_over {
            return Err(GameError::GameOver);
        }
        if self.drag.is_some() {
            return Ok(Vec::new());
        }
        let Some(id) = self.staging.hit_test(at, &self.geometry)? else {
            return Ok(Vec::new());
        };
        let Some(staged) = self.staging.find(id) else {
            return Ok(Vec::new());
        };

        self.drag = Some(Drag {
            piece: id,
            slot: staged.slot,
            grab: at - staged.position,
        });
        self.cache.reset();
        debug!(piece = %id, slot = staged.slot, "Lifted piece");
        Ok(vec![GameEvent::PieceLifted { piece: id }])
    }

    /// Drag the held piece and refresh the hover preview
    pub fn pointer_move(&mut self, to: Point) -> Result<Vec<GameEvent>, GameError> {
        if self.game_over {
            return Err(GameError::GameOver);
        }
        let Some(drag) = self.drag else {
            return Ok(Vec::new());
        };
        let Some(staged) = self.staging.find_mut(drag.piece) else {
            return Ok(Vec::new());
        };
        staged.set_position(to - drag.grab);
        self.refresh_preview(drag.piece)
    }

    /// Toggle the orientation of the held piece, or of the staged piece under
    /// the pointer when nothing is held
    pub fn wheel(&mut self, at: Point, delta: f64) -> Result<Vec<GameEvent>, GameError> {
        if self.game_over {
            return Err(GameError::GameOver);
        }
        if delta == 0.0 || !delta.is_finite() {
            return Ok(Vec::new());
        }
        let target = match self.drag {
            Some(drag) => Some(drag.piece),
            None => self.staging.hit_test(at, &self.geometry)?,
        };
        let Some(id) = target else {
            return Ok(Vec::new());
        };
        let Some(orientations) = self.staging.toggle_orientation(id) else {
            return Ok(Vec::new());
        };
        debug!(piece = %id, "Toggled piece orientation");

        let mut events = vec![GameEvent::PieceRotated {
            piece: id,
            orientations,
        }];
        if self.drag.is_some() {
            // The outlines changed, so cached overlaps are stale
            self.cache.reset();
            events.extend(self.refresh_preview(id)?);
        }
        Ok(events)
    }

    /// Recompute the hover preview for the held piece at its current position
    fn refresh_preview(&mut self, id: PieceId) -> Result<Vec<GameEvent>, GameError> {
        let Some(staged) = self.staging.find(id) else {
            return Ok(Vec::new());
        };
        let hits = self
            .cache
            .get_or_compute(staged, &self.board, &self.geometry, &self.config.placement)?
            .to_vec();

        let previous = self.board.previewed_cells().to_vec();
        self.board.preview_hover(&staged.piece, &hits);
        let current = self.board.previewed_cells();

        let mut events = Vec::new();
        if current != previous.as_slice() {
            if !previous.is_empty() {
                events.push(GameEvent::PreviewCleared { cells: previous });
            }
            if !current.is_empty() {
                events.push(GameEvent::PreviewShown {
                    cells: current.to_vec(),
                });
            }
        }
        Ok(events)
    }

    /// Drop the held piece where the pointer is
    pub fn pointer_up(&mut self, at: Point) -> Result<Vec<GameEvent>, GameError> {
        if self.game_over {
            return Err(GameError::GameOver);
        }
        let Some(drag) = self.drag else {
            return Ok(Vec::new());
        };
        if let Some(staged) = self.staging.find_mut(drag.piece) {
            staged.set_position(at - drag.grab);
        }
        self.release(drag.slot)
    }

    /// Release consumed pieces' graphics
    pub fn tick(&mut self) -> Vec<GameEvent> {
        self.pending_destroy
            .drain(..)
            .map(|id| {
                self.staging.forget(id);
                GameEvent::PieceDestroyed { piece: id }
            })
            .collect()
    }

    /// Place the piece in `mv.slot` with its first hex on `mv.anchor`
    pub fn apply_move(&mut self, mv: Move) -> Result<Vec<GameEvent>, GameError> {
        if self.game_over {
            return Err(GameError::GameOver);
        }
        if self.drag.is_some() {
            return Err(GameError::DragInProgress);
        }
        if mv.slot >= self.staging.slot_count() {
            return Err(GameError::NoSuchSlot(mv.slot));
        }
        let center = self
            .board
            .cell(mv.anchor)
            .ok_or(GameError::NoSuchCell(mv.anchor))?
            .center;
        let staged = self
            .staging
            .get_mut(mv.slot)
            .ok_or(GameError::EmptySlot(mv.slot))?;
        staged.align_first_hex(center, &self.geometry)?;
        self.release(mv.slot)
    }

    /// Install new sizing settings and restart the scene
    pub fn set_settings(&mut self, settings: HexSettings) -> Result<Vec<GameEvent>, GameError> {
        let config = GameConfig {
            settings,
            ..self.config
        };
        config.validate().map_err(|e| {
            warn!(error = %e, "Rejected settings change");
            GameError::InvalidConfig(e.to_string())
        })?;

        self.geometry.configure(settings);
        let (board, line_reports) = build_board(&config, &self.geometry)?;
        self.config = config;
        self.board = board;
        self.line_reports = line_reports;
        self.staging = Staging::new(self.config.staging_slots, self.config.canvas);
        self.cache.reset();
        self.drag = None;
        self.pending_destroy.clear();
        self.game_over = false;
        self.moves = 0;
        info!(size = settings.size, spacing = settings.spacing, "Rebuilt scene for new settings");

        let mut events = vec![GameEvent::BoardRebuilt];
        events.extend(self.stage_all()?);
        Ok(events)
    }

    // ==================== Internals ====================

    fn stage_all(&mut self) -> Result<Vec<GameEvent>, GameError> {
        (0..self.staging.slot_count())
            .map(|slot| self.stage_slot(slot))
            .collect()
    }

    /// Fill a slot with a freshly picked catalog piece
    fn stage_slot(&mut self, slot: usize) -> Result<GameEvent, GameError> {
        let piece = self
            .catalog
            .pick(&mut self.rng)
            .ok_or(GameError::EmptyCatalog)?
            .clone();
        let name = piece.name().to_string();
        let id = self
            .staging
            .stage(slot, piece, &self.geometry)?
            .ok_or(GameError::NoSuchSlot(slot))?;
        debug!(piece = %id, slot, name = %name, "Staged piece");
        Ok(GameEvent::PieceStaged { piece: id, slot, name })
    }

    /// Commit the piece in `slot` at its current position, or send it home
    fn release(&mut self, slot: usize) -> Result<Vec<GameEvent>, GameError> {
        self.drag = None;
        self.cache.reset();
        let Some(staged) = self.staging.get_mut(slot) else {
            return Err(GameError::EmptySlot(slot));
        };
        let id = staged.id;

        let hits = compute_intersections(staged, &self.board, &self.geometry, &self.config.placement)?;
        let previous = self.board.previewed_cells().to_vec();
        let mut events = Vec::new();

        if !self.board.try_commit(&staged.piece, &hits) {
            self.board.clear_preview();
            if !previous.is_empty() {
                events.push(GameEvent::PreviewCleared { cells: previous });
            }
            staged.return_home();
            events.push(GameEvent::PieceReturned {
                piece: id,
                to: staged.home,
            });
            return Ok(events);
        }

        if !previous.is_empty() {
            events.push(GameEvent::PreviewCleared { cells: previous });
        }
        events.push(GameEvent::PieceCommitted {
            piece: id,
            slot,
            cells: hits.iter().map(|h| h.cell).collect(),
        });
        self.moves += 1;

        // The committed piece leaves its slot now; its graphics go on the next tick
        self.staging.take(slot);
        self.pending_destroy.push(id);
        events.push(self.stage_slot(slot)?);

        events.extend(self.drain_line_reports());
        Ok(events)
    }

    /// Turn pending line-clear notifications into events, then check for game over
    fn drain_line_reports(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let mut scanned = false;
        while let Ok(report) = self.line_reports.try_recv() {
            scanned = true;
            if !report.is_empty() {
                events.push(GameEvent::LinesCleared {
                    lines: report.lines,
                    cells: report.cleared,
                });
            }
        }
        if scanned {
            events.extend(self.check_game_over());
        }
        events
    }

    fn check_game_over(&mut self) -> Option<GameEvent> {
        if self.game_over {
            return None;
        }
        let staged = self.staging.pieces().map(|s| &s.piece);
        if self.board.is_game_over(staged) {
            self.game_over = true;
            info!(moves = self.moves, "Game over");
            return Some(GameEvent::GameOver);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::{HexCoord, Orientation};
    use crate::pieces::{Piece, PieceHex};
    use pretty_assertions::assert_eq;

    fn singles() -> Catalog {
        Catalog::from_pieces([Piece::new("Single", &[PieceHex::new(HexCoord::new(0, 0))], 0xff0000)])
    }

    fn session() -> GameSession {
        GameSession::with_catalog(GameConfig::default(), singles(), StdRng::seed_from_u64(3)).unwrap()
    }

    fn first_hex_center(session: &GameSession, slot: usize) -> Point {
        let staged = session.staging().get(slot).unwrap();
        staged.hex_center(0, session.geometry()).unwrap().unwrap()
    }

    fn staged_id(session: &GameSession, slot: usize) -> PieceId {
        session.staging().get(slot).unwrap().id
    }

    #[test]
    fn test_new_session_fills_every_slot() {
        let session = GameSession::with_seed(GameConfig::default(), 9).unwrap();
        assert_eq!(session.staging().pieces().count(), 3);
        assert_eq!(session.catalog().len(), 15);
        assert!(!session.is_game_over());
        assert_eq!(session.board().occupied_count(), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = GameConfig {
            board_width: 8,
            ..GameConfig::default()
        };
        let err = GameSession::with_seed(config, 1).unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_catalog_is_rejected() {
        let err = GameSession::with_catalog(GameConfig::default(), Catalog::from_pieces([]), StdRng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(err, GameError::EmptyCatalog);
    }

    #[test]
    fn test_pointer_down_on_nothing() {
        let mut session = session();
        assert!(session.pointer_down(Point::new(5.0, 5.0)).unwrap().is_empty());
        assert_eq!(session.dragged_piece(), None);
    }

    #[test]
    fn test_drag_and_commit() {
        let mut session = session();
        let id = staged_id(&session, 1);
        let grab = first_hex_center(&session, 1);
        assert_eq!(
            session.pointer_down(grab).unwrap(),
            vec![GameEvent::PieceLifted { piece: id }]
        );

        let target = session.board().get_cell(5, 5).unwrap().center;
        let events = session.pointer_move(target).unwrap();
        assert_eq!(
            events,
            vec![GameEvent::PreviewShown {
                cells: vec![GridIndex::new(5, 5)]
            }]
        );

        let events = session.pointer_up(target).unwrap();
        assert_eq!(events[0], GameEvent::PreviewCleared { cells: vec![GridIndex::new(5, 5)] });
        assert_eq!(
            events[1],
            GameEvent::PieceCommitted {
                piece: id,
                slot: 1,
                cells: vec![GridIndex::new(5, 5)]
            }
        );
        assert!(matches!(events[2], GameEvent::PieceStaged { slot: 1, .. }));
        assert_eq!(events.len(), 3);

        assert!(session.board().get_cell(5, 5).unwrap().is_occupied());
        assert_ne!(staged_id(&session, 1), id);
        assert_eq!(session.pending_destroy(), &[id]);
        assert_eq!(session.moves(), 1);
        assert_eq!(session.dragged_piece(), None);
    }

    #[test]
    fn test_failed_drop_returns_home() {
        let mut session = session();
        let id = staged_id(&session, 0);
        let home = session.staging().get(0).unwrap().home;
        session.pointer_down(first_hex_center(&session, 0)).unwrap();

        let events = session.pointer_up(Point::new(20.0, 20.0)).unwrap();
        assert_eq!(events, vec![GameEvent::PieceReturned { piece: id, to: home }]);
        assert!(session.staging().get(0).unwrap().is_home());
        assert_eq!(session.board().occupied_count(), 0);
    }

    #[test]
    fn test_pointer_up_without_drag_is_ignored() {
        let mut session = session();
        assert!(session.pointer_up(Point::new(1.0, 1.0)).unwrap().is_empty());
    }

    #[test]
    fn test_move_under_threshold_uses_cache() {
        let mut session = session();
        session.pointer_down(first_hex_center(&session, 0)).unwrap();
        let target = session.board().get_cell(2, 2).unwrap().center;
        session.pointer_move(target).unwrap();
        let events = session.pointer_move(target + Point::new(5.0, 5.0)).unwrap();
        assert!(events.is_empty());
        assert_eq!(session.cache().hits(), 1);
        assert_eq!(session.cache().misses(), 1);
    }

    #[test]
    fn test_wheel_rotates_hovered_piece() {
        let mut session = session();
        let id = staged_id(&session, 2);
        let over = first_hex_center(&session, 2);

        let events = session.wheel(over, -120.0).unwrap();
        assert_eq!(
            events,
            vec![GameEvent::PieceRotated {
                piece: id,
                orientations: vec![Orientation::Rotated]
            }]
        );
        let hex = session.staging().hex(crate::staging::PieceHexId { piece: id, index: 0 }).unwrap();
        assert_eq!(hex.orientation, Orientation::Rotated);

        // A second notch turns it back
        session.wheel(over, 120.0).unwrap();
        let staged = session.staging().get(2).unwrap();
        assert_eq!(staged.piece.hexes()[0].orientation, Orientation::Flat);
    }

    #[test]
    fn test_wheel_over_nothing_is_ignored() {
        let mut session = session();
        assert!(session.wheel(Point::new(5.0, 5.0), 1.0).unwrap().is_empty());
        let over = first_hex_center(&session, 0);
        assert!(session.wheel(over, 0.0).unwrap().is_empty());
        assert_eq!(session.staging().get(0).unwrap().piece.hexes()[0].orientation, Orientation::Flat);
    }

    #[test]
    fn test_wheel_while_dragging_recomputes_overlap() {
        let mut session = session();
        let id = staged_id(&session, 0);
        session.pointer_down(first_hex_center(&session, 0)).unwrap();
        // Odd rows are drawn rotated
        let target = session.board().get_cell(5, 5).unwrap().center;
        session.pointer_move(target).unwrap();

        let hex_area = session.geometry().hex_area().unwrap();
        let overlap = |session: &GameSession| {
            let staged = session.staging().find(id).unwrap();
            compute_intersections(staged, session.board(), session.geometry(), &session.config().placement).unwrap()[0]
                .area
        };
        assert!(overlap(&session) < hex_area * 0.99);

        let misses = session.cache().misses();
        let events = session
            .handle(InputEvent::Wheel { x: target.x, y: target.y, delta: -1.0 })
            .unwrap();
        // Same cell still previewed, so only the rotation is reported
        assert_eq!(
            events,
            vec![GameEvent::PieceRotated {
                piece: id,
                orientations: vec![Orientation::Rotated]
            }]
        );
        assert_eq!(session.cache().misses(), misses + 1);
        assert!(overlap(&session) > hex_area * 0.99);
        assert_eq!(session.board().previewed_cells(), &[GridIndex::new(5, 5)]);

        let events = session.pointer_up(target).unwrap();
        assert!(events.iter().any(|e| matches!(e, GameEvent::PieceCommitted { piece, .. } if *piece == id)));
    }

    #[test]
    fn test_tick_destroys_consumed_pieces_once() {
        let mut session = session();
        let id = staged_id(&session, 0);
        session
            .apply_move(Move {
                slot: 0,
                anchor: GridIndex::new(0, 0),
            })
            .unwrap();
        assert!(session.staging().hex(crate::staging::PieceHexId { piece: id, index: 0 }).is_some());

        assert_eq!(session.tick(), vec![GameEvent::PieceDestroyed { piece: id }]);
        assert!(session.tick().is_empty());
        assert!(session.staging().hex(crate::staging::PieceHexId { piece: id, index: 0 }).is_none());
    }

    #[test]
    fn test_apply_move_errors() {
        let mut session = session();
        assert_eq!(
            session.apply_move(Move { slot: 7, anchor: GridIndex::new(0, 0) }).unwrap_err(),
            GameError::NoSuchSlot(7)
        );
        assert_eq!(
            session.apply_move(Move { slot: 0, anchor: GridIndex::new(0, 9) }).unwrap_err(),
            GameError::NoSuchCell(GridIndex::new(0, 9))
        );
    }

    #[test]
    fn test_completing_a_row_reports_lines() {
        let mut session = session();
        for col in 0..5 {
            session
                .apply_move(Move { slot: 0, anchor: GridIndex::new(0, col) })
                .unwrap();
        }
        let events = session
            .apply_move(Move { slot: 0, anchor: GridIndex::new(0, 5) })
            .unwrap();
        let cleared = events.iter().find_map(|e| match e {
            GameEvent::LinesCleared { cells, .. } => Some(cells.len()),
            _ => None,
        });
        assert_eq!(cleared, Some(6));
        assert_eq!(session.board().occupied_count(), 0);
    }

    #[test]
    fn test_game_over_blocks_input() {
        let mut session = GameSession::with_seed(GameConfig::default(), 5).unwrap();
        // One lone gap in an otherwise full board
        let fingerprint: String = session
            .board
            .cells()
            .map(|c| if c.index == GridIndex::new(5, 5) { '0' } else { '1' })
            .collect();
        session.board.load_fingerprint(&fingerprint).unwrap();
        // Swap every staged piece for a four-hex bar
        let bar = session.catalog().get("Shape5").unwrap().clone();
        for slot in 0..3 {
            session.staging.stage(slot, bar.clone(), &session.geometry).unwrap();
        }

        assert_eq!(session.check_game_over(), Some(GameEvent::GameOver));
        assert!(session.is_game_over());
        assert_eq!(session.pointer_down(Point::new(0.0, 0.0)).unwrap_err(), GameError::GameOver);
        assert!(session.legal_moves().is_empty());
        // Frames keep ticking
        assert!(session.tick().is_empty());
    }

    #[test]
    fn test_set_settings_restarts_scene() {
        let mut session = session();
        session
            .apply_move(Move { slot: 0, anchor: GridIndex::new(3, 3) })
            .unwrap();
        let events = session
            .set_settings(HexSettings {
                size: 30.0,
                ..HexSettings::default()
            })
            .unwrap();
        assert_eq!(events[0], GameEvent::BoardRebuilt);
        assert_eq!(events.len(), 4);
        assert_eq!(session.board().occupied_count(), 0);
        assert_eq!(session.moves(), 0);
        assert_eq!(session.geometry().recomputations(), 2);
        assert!(session.pending_destroy().is_empty());
    }

    #[test]
    fn test_bad_settings_keep_the_scene() {
        let mut session = session();
        let before = session.snapshot();
        let err = session
            .set_settings(HexSettings {
                size: -1.0,
                ..HexSettings::default()
            })
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_non_finite_settings_are_rejected() {
        let mut session = session();
        let err = session
            .set_settings(HexSettings {
                spacing: f64::NAN,
                ..HexSettings::default()
            })
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
        // Pieces can still be picked up
        let grab = first_hex_center(&session, 0);
        assert_eq!(session.pointer_down(grab).unwrap().len(), 1);
    }

    #[test]
    fn test_legal_moves_cover_every_empty_cell_for_singles() {
        let session = session();
        assert_eq!(session.legal_moves().len(), 3 * 91);
    }

    #[test]
    fn test_snapshot_serializes() {
        let session = session();
        let json = serde_json::to_string(&session.snapshot()).unwrap();
        let back: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.staged.len(), 3);
        assert!(!back.game_over);
    }
}
