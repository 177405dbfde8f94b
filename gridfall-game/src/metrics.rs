//! Rolling player-performance signals.

use serde::{Deserialize, Serialize};

use crate::constants::{
    BOARD_FILL_EMA_ALPHA, INITIAL_AVG_BOARD_FILL, INITIAL_AVG_MOVE_TIME_SEC, MOVE_TIME_EMA_ALPHA,
};
use crate::numbers::lerp;

/// Read-only view handed to the difficulty director.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub moves: u32,
    pub avg_move_time_sec: f32,
    pub avg_board_fill: f32,
    pub cancel_rate: f32,
    pub clears: u32,
}

/// Per-session aggregator. Move time and board fill are exponential moving
/// averages; the cancel rate is a whole-session ratio, not a recent window.
#[derive(Debug, Clone)]
pub struct GameMetrics {
    moves: u32,
    cancelled_drags: u32,
    clears: u32,
    avg_move_time_sec: f32,
    avg_board_fill: f32,
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl GameMetrics {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            moves: 0,
            cancelled_drags: 0,
            clears: 0,
            avg_move_time_sec: INITIAL_AVG_MOVE_TIME_SEC,
            avg_board_fill: INITIAL_AVG_BOARD_FILL,
        }
    }

    /// Record one committed placement.
    pub fn register_move(&mut self, move_time_sec: f32, cleared_count: usize, board_fill: f32) {
        self.moves += 1;
        if cleared_count > 0 {
            self.clears += 1;
        }
        self.avg_move_time_sec = lerp(self.avg_move_time_sec, move_time_sec, MOVE_TIME_EMA_ALPHA);
        self.avg_board_fill = lerp(self.avg_board_fill, board_fill, BOARD_FILL_EMA_ALPHA);
    }

    /// A cancelled drag is counted but is not a move.
    pub fn register_cancelled_drag(&mut self) {
        self.cancelled_drags += 1;
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let cancel_rate = if self.moves == 0 {
            0.0
        } else {
            self.cancelled_drags as f32 / self.moves as f32
        };
        MetricsSnapshot {
            moves: self.moves,
            avg_move_time_sec: self.avg_move_time_sec,
            avg_board_fill: self.avg_board_fill,
            cancel_rate,
            clears: self.clears,
        }
    }
}
