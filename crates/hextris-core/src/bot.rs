//! Automated players, used for hints and unattended play.
//!
//! Two difficulty levels:
//! - Random: any move that fits
//! - Greedy: the move that clears the most cells right away

use crate::actions::Move;
use crate::game::GameSession;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Bot difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BotDifficulty {
    Random,
    #[default]
    Greedy,
}

/// A bot that picks placements for a session
#[derive(Debug)]
pub struct Bot {
    pub difficulty: BotDifficulty,
    rng: StdRng,
}

impl Bot {
    pub fn new(difficulty: BotDifficulty) -> Self {
        Self {
            difficulty,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(difficulty: BotDifficulty, seed: u64) -> Self {
        Self {
            difficulty,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose a move, or `None` when nothing fits
    pub fn choose_move(&mut self, session: &GameSession) -> Option<Move> {
        let moves = session.legal_moves();
        if moves.is_empty() {
            return None;
        }

        match self.difficulty {
            BotDifficulty::Random => moves.choose(&mut self.rng).copied(),
            BotDifficulty::Greedy => Self::choose_greedy(session, &moves),
        }
    }

    /// Simulate every move on a scratch board and keep the first one that
    /// clears the most cells
    fn choose_greedy(session: &GameSession, moves: &[Move]) -> Option<Move> {
        let mut scratch = session.board().clone();
        // The session's hooks must not see simulated clears
        scratch.clear_hooks();

        let mut best: Option<(Move, usize)> = None;
        for &mv in moves {
            let Some(staged) = session.staging().get(mv.slot) else {
                continue;
            };
            let Some(cells) = session.board().placement_cells(&staged.piece, mv.anchor) else {
                continue;
            };

            let mut board = scratch.clone();
            board.fill_cells(&cells, staged.piece.color());
            let cleared = board
                .check_complete_lines()
                .map_or(0, |report| report.cleared.len());

            if best.map_or(true, |(_, top)| cleared > top) {
                best = Some((mv, cleared));
            }
        }
        best.map(|(mv, _)| mv)
    }
}
