//! Local board-quality scoring: holes, pockets, and overhangs.
//!
//! The score never mutates the board. The generator uses the before/after
//! delta of a committed placement to decide whether to install a recovery
//! debuff on piece delivery.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::shapes::Piece;

/// Weighted badness of each dead-zone pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeadZoneWeights {
    #[serde(default = "default_hole_weight")]
    pub hole: f32,
    #[serde(default = "default_pocket_weight")]
    pub pocket: f32,
    #[serde(default = "default_overhang_weight")]
    pub overhang: f32,
}

impl Default for DeadZoneWeights {
    fn default() -> Self {
        Self {
            hole: default_hole_weight(),
            pocket: default_pocket_weight(),
            overhang: default_overhang_weight(),
        }
    }
}

fn default_hole_weight() -> f32 {
    3.0
}

fn default_pocket_weight() -> f32 {
    2.0
}

fn default_overhang_weight() -> f32 {
    1.25
}

/// Inclusive cell region, clamped to the board at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

impl Region {
    fn around_placement(board: &Board, piece: &Piece, ax: i32, ay: i32, margin: i32) -> Self {
        let mut x0 = i32::MAX;
        let mut y0 = i32::MAX;
        let mut x1 = i32::MIN;
        let mut y1 = i32::MIN;
        for c in piece.cells() {
            x0 = x0.min(ax + c.x);
            y0 = y0.min(ay + c.y);
            x1 = x1.max(ax + c.x);
            y1 = y1.max(ay + c.y);
        }
        let limit = board.size() as i32 - 1;
        Self {
            x0: (x0 - margin).max(0),
            y0: (y0 - margin).max(0),
            x1: (x1 + margin).min(limit),
            y1: (y1 + margin).min(limit),
        }
    }

    const fn is_degenerate(&self) -> bool {
        self.x1 < self.x0 || self.y1 < self.y0
    }
}

/// Snapshot taken before a candidate placement is committed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadZoneEvaluation {
    region: Region,
    score_before: f32,
}

impl DeadZoneEvaluation {
    #[must_use]
    pub const fn score_before(&self) -> f32 {
        self.score_before
    }
}

/// Snapshot the badness of the placement's neighborhood before committing.
#[must_use]
pub fn begin_evaluation(
    board: &Board,
    piece: &Piece,
    ax: i32,
    ay: i32,
    margin: i32,
    weights: &DeadZoneWeights,
) -> DeadZoneEvaluation {
    let region = Region::around_placement(board, piece, ax, ay, margin);
    DeadZoneEvaluation {
        region,
        score_before: region_score(board, region, weights),
    }
}

/// Re-score the same region after the commit; positive delta = board worsened.
#[must_use]
pub fn end_evaluation(board: &Board, eval: &DeadZoneEvaluation, weights: &DeadZoneWeights) -> f32 {
    region_score(board, eval.region, weights) - eval.score_before
}

fn region_score(board: &Board, region: Region, weights: &DeadZoneWeights) -> f32 {
    if region.is_degenerate() {
        return 0.0;
    }
    let mut holes = 0u32;
    let mut pockets = 0u32;
    let mut overhangs = 0u32;

    for y in region.y0..=region.y1 {
        for x in region.x0..=region.x1 {
            if board.is_occupied(x, y) {
                continue;
            }
            let left = board.is_occupied(x - 1, y);
            let right = board.is_occupied(x + 1, y);
            let above = board.is_occupied(x, y - 1);
            let below = board.is_occupied(x, y + 1);

            if left && right && above && below {
                holes += 1;
            }
            // Overhang cover must be a real filled cell; off-board "above"
            // would brand the empty top corners as permanently bad.
            let above_solid = board.in_bounds(x, y - 1) && !board.cell(x, y - 1).is_empty();
            if above_solid && (left || right) {
                overhangs += 1;
            }
            // Sealed 1x2 pairs, counted once from their left/top cell.
            if !right
                && left
                && board.is_occupied(x + 2, y)
                && above
                && board.is_occupied(x + 1, y - 1)
                && below
                && board.is_occupied(x + 1, y + 1)
            {
                pockets += 1;
            }
            if !below
                && above
                && board.is_occupied(x, y + 2)
                && left
                && board.is_occupied(x - 1, y + 1)
                && right
                && board.is_occupied(x + 1, y + 1)
            {
                pockets += 1;
            }
        }
    }

    (holes as f32) * weights.hole
        + (pockets as f32) * weights.pocket
        + (overhangs as f32) * weights.overhang
}
