//! Board grid, line/block clearing, and deferred sticky hazards.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::shapes::{Coord, Piece};

pub const DEFAULT_BOARD_SIZE: usize = 9;
const BLOCK_SPAN: usize = 3;

/// State of a single grid cell.
///
/// `Stone` behaves as permanently filled: it blocks placement and counts
/// toward full lines, and only a line/block clear removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Empty,
    Filled,
    Stone,
}

impl CellState {
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// A sticky footprint waiting to harden into stones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingStickyEffect {
    pub remaining_moves: u32,
    pub footprint: Vec<Coord>,
    pub stones_to_create: usize,
}

/// Result of committing a piece: what was cleared and which stones appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementOutcome {
    pub cleared: Vec<Coord>,
    pub cleared_count: usize,
    pub stones: Vec<Coord>,
    pub stone_count: usize,
}

/// The N×N placement grid. Size is fixed for the board's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    cells: Vec<CellState>,
    pending_sticky: Vec<PendingStickyEffect>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_BOARD_SIZE)
    }
}

impl Board {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![CellState::Empty; size * size],
            pending_sticky: Vec::new(),
        }
    }

    /// Zero the grid and drop every pending sticky effect.
    pub fn reset(&mut self) {
        self.cells.fill(CellState::Empty);
        self.pending_sticky.clear();
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> CellState {
        debug_assert!(self.in_bounds(x, y));
        self.cells[self.index(x, y)]
    }

    pub fn set_cell(&mut self, x: i32, y: i32, state: CellState) {
        debug_assert!(self.in_bounds(x, y));
        let index = self.index(x, y);
        self.cells[index] = state;
    }

    #[must_use]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        let size = self.size as i32;
        x >= 0 && x < size && y >= 0 && y < size
    }

    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.size + x as usize
    }

    /// True when a cell blocks placement, counting off-board as occupied.
    #[must_use]
    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        !self.in_bounds(x, y) || !self.cell(x, y).is_empty()
    }

    /// Whether the piece fits with its anchor at `(ax, ay)`. Pure query.
    #[must_use]
    pub fn can_place(&self, piece: &Piece, ax: i32, ay: i32) -> bool {
        piece.cells().iter().all(|c| {
            let x = ax + c.x;
            let y = ay + c.y;
            self.in_bounds(x, y) && self.cell(x, y).is_empty()
        })
    }

    /// Number of distinct anchors where the piece fits.
    #[must_use]
    pub fn count_valid_anchors(&self, piece: &Piece) -> usize {
        let size = self.size as i32;
        let mut count = 0;
        for y in 0..size {
            for x in 0..size {
                if self.can_place(piece, x, y) {
                    count += 1;
                }
            }
        }
        count
    }

    /// True when any piece in the hand has at least one valid anchor.
    ///
    /// Loss detection belongs to the caller; the board only answers the query.
    #[must_use]
    pub fn has_any_move(&self, hand: &[Piece]) -> bool {
        let size = self.size as i32;
        hand.iter().any(|piece| {
            (0..size).any(|y| (0..size).any(|x| self.can_place(piece, x, y)))
        })
    }

    /// Fraction of cells that are non-empty.
    #[must_use]
    pub fn fill_ratio(&self) -> f32 {
        let occupied = self.cells.iter().filter(|c| !c.is_empty()).count();
        occupied as f32 / self.cells.len() as f32
    }

    /// Commit a piece, clear completed rows/columns/blocks, then resolve any
    /// sticky effects that came due this move.
    ///
    /// Clearing strictly precedes sticky resolution: a footprint cell cleared
    /// by this same move is empty again and therefore eligible to harden,
    /// while a footprint cell that was part of a completed line no longer
    /// holds the piece that promised the hazard. Survivor cells are hardened
    /// in row-major order up to the configured stone count.
    pub fn place_and_clear(
        &mut self,
        piece: &Piece,
        ax: i32,
        ay: i32,
        sticky_delay_moves: u32,
        sticky_stone_count: usize,
    ) -> PlacementOutcome {
        let mut footprint = Vec::with_capacity(piece.cells().len());
        for c in piece.cells() {
            let x = ax + c.x;
            let y = ay + c.y;
            self.set_cell(x, y, CellState::Filled);
            footprint.push(Coord::new(x, y));
        }

        // The countdown ticks on subsequent placements only, so the effect
        // registered by this move is exempt from this move's decrement pass.
        let pre_existing = self.pending_sticky.len();
        if piece.is_sticky() {
            self.pending_sticky.push(PendingStickyEffect {
                remaining_moves: sticky_delay_moves,
                footprint,
                stones_to_create: sticky_stone_count,
            });
        }

        let cleared = self.clear_completed();
        let stones = self.resolve_due_sticky(pre_existing);

        PlacementOutcome {
            cleared_count: cleared.len(),
            cleared,
            stone_count: stones.len(),
            stones,
        }
    }

    /// Gather full rows, columns, and 3×3 sub-blocks, dedup cells referenced
    /// by several completed lines, and clear them all to `Empty`.
    fn clear_completed(&mut self) -> Vec<Coord> {
        let size = self.size as i32;
        let mut marked: HashSet<Coord> = HashSet::new();

        for y in 0..size {
            if (0..size).all(|x| !self.cell(x, y).is_empty()) {
                marked.extend((0..size).map(|x| Coord::new(x, y)));
            }
        }
        for x in 0..size {
            if (0..size).all(|y| !self.cell(x, y).is_empty()) {
                marked.extend((0..size).map(|y| Coord::new(x, y)));
            }
        }
        // The 3x3 sub-block partition only exists for sizes divisible by 3.
        if self.size % BLOCK_SPAN == 0 {
            let span = BLOCK_SPAN as i32;
            for by in (0..size).step_by(BLOCK_SPAN) {
                for bx in (0..size).step_by(BLOCK_SPAN) {
                    let full = (0..span).all(|dy| {
                        (0..span).all(|dx| !self.cell(bx + dx, by + dy).is_empty())
                    });
                    if full {
                        for dy in 0..span {
                            for dx in 0..span {
                                marked.insert(Coord::new(bx + dx, by + dy));
                            }
                        }
                    }
                }
            }
        }

        let mut cleared: Vec<Coord> = marked.into_iter().collect();
        cleared.sort_by_key(|c| (c.y, c.x));
        for c in &cleared {
            self.set_cell(c.x, c.y, CellState::Empty);
        }
        cleared
    }

    /// Count down pending sticky effects and harden the ones that came due.
    ///
    /// Only the first `decrement_count` effects tick; an effect registered by
    /// the current move is past that bound but still resolves immediately
    /// when it carries a zero delay.
    fn resolve_due_sticky(&mut self, decrement_count: usize) -> Vec<Coord> {
        let mut created = Vec::new();
        let mut due = Vec::new();
        let mut remaining = Vec::with_capacity(self.pending_sticky.len());
        for (i, mut effect) in self.pending_sticky.drain(..).enumerate() {
            if i < decrement_count {
                effect.remaining_moves = effect.remaining_moves.saturating_sub(1);
            }
            if effect.remaining_moves == 0 {
                due.push(effect);
            } else {
                remaining.push(effect);
            }
        }
        self.pending_sticky = remaining;

        for effect in due {
            let mut survivors: Vec<Coord> = effect
                .footprint
                .into_iter()
                .filter(|c| self.in_bounds(c.x, c.y) && self.cell(c.x, c.y).is_empty())
                .collect();
            survivors.sort_by_key(|c| (c.y, c.x));
            for c in survivors.into_iter().take(effect.stones_to_create) {
                self.set_cell(c.x, c.y, CellState::Stone);
                created.push(c);
            }
        }
        created
    }

    /// Pending sticky effects, oldest first.
    #[must_use]
    pub fn pending_sticky(&self) -> &[PendingStickyEffect] {
        &self.pending_sticky
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::PieceKind;

    fn fill_row(board: &mut Board, y: i32, x_range: std::ops::Range<i32>) {
        for x in x_range {
            board.set_cell(x, y, CellState::Filled);
        }
    }

    #[test]
    fn i_piece_on_empty_bottom_row_clears_nothing() {
        let mut board = Board::default();
        let piece = Piece::new(PieceKind::I);
        assert!(board.can_place(&piece, 0, 8));

        let outcome = board.place_and_clear(&piece, 0, 8, 0, 0);

        assert_eq!(outcome.cleared_count, 0);
        for x in 0..4 {
            assert_eq!(board.cell(x, 8), CellState::Filled);
        }
        for x in 4..9 {
            assert_eq!(board.cell(x, 8), CellState::Empty);
        }
    }

    #[test]
    fn dot_completing_a_row_clears_all_nine_cells() {
        let mut board = Board::default();
        fill_row(&mut board, 0, 0..8);

        let outcome = board.place_and_clear(&Piece::new(PieceKind::Dot), 8, 0, 0, 0);

        assert_eq!(outcome.cleared_count, 9);
        for x in 0..9 {
            assert_eq!(board.cell(x, 0), CellState::Empty);
        }
    }

    #[test]
    fn simultaneous_row_and_column_clear_dedups_shared_cell() {
        let mut board = Board::default();
        fill_row(&mut board, 0, 1..9);
        for y in 1..9 {
            board.set_cell(0, y, CellState::Filled);
        }

        let outcome = board.place_and_clear(&Piece::new(PieceKind::Dot), 0, 0, 0, 0);

        // 9 + 9 cells minus the shared corner.
        assert_eq!(outcome.cleared_count, 17);
        assert!(outcome.cleared.windows(2).all(|w| {
            (w[0].y, w[0].x) < (w[1].y, w[1].x)
        }));
    }

    #[test]
    fn full_block_clears_even_without_full_lines() {
        let mut board = Board::default();
        // Top-left 3x3 block minus one cell.
        for y in 0..3 {
            for x in 0..3 {
                if !(x == 2 && y == 2) {
                    board.set_cell(x, y, CellState::Filled);
                }
            }
        }

        let outcome = board.place_and_clear(&Piece::new(PieceKind::Dot), 2, 2, 0, 0);

        assert_eq!(outcome.cleared_count, 9);
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(board.cell(x, y), CellState::Empty);
            }
        }
    }

    #[test]
    fn block_scan_skips_sizes_not_divisible_by_three() {
        let mut board = Board::new(8);
        for y in 0..3 {
            for x in 0..3 {
                if !(x == 2 && y == 2) {
                    board.set_cell(x, y, CellState::Filled);
                }
            }
        }

        let outcome = board.place_and_clear(&Piece::new(PieceKind::Dot), 2, 2, 0, 0);

        assert_eq!(outcome.cleared_count, 0);
        assert_eq!(board.cell(0, 0), CellState::Filled);
    }

    #[test]
    fn stone_counts_toward_full_line_and_is_cleared_by_it() {
        let mut board = Board::default();
        fill_row(&mut board, 4, 1..8);
        board.set_cell(0, 4, CellState::Stone);

        let outcome = board.place_and_clear(&Piece::new(PieceKind::Dot), 8, 4, 0, 0);

        assert_eq!(outcome.cleared_count, 9);
        assert_eq!(board.cell(0, 4), CellState::Empty);
    }

    #[test]
    fn sticky_resolves_on_exactly_the_delayed_move() {
        let mut board = Board::default();
        let sticky = Piece::with_sticky(PieceKind::DominoH, true);
        board.place_and_clear(&sticky, 0, 0, 2, 2);
        assert_eq!(board.pending_sticky().len(), 1);

        // First follow-up move: not due yet.
        let outcome = board.place_and_clear(&Piece::new(PieceKind::Dot), 5, 5, 0, 0);
        assert_eq!(outcome.stone_count, 0);
        assert_eq!(board.pending_sticky().len(), 1);

        // Second follow-up move: due, but the footprint is still occupied by
        // the sticky piece itself, so no stones can form.
        let outcome = board.place_and_clear(&Piece::new(PieceKind::Dot), 6, 5, 0, 0);
        assert_eq!(outcome.stone_count, 0);
        assert!(board.pending_sticky().is_empty());
    }

    #[test]
    fn sticky_footprint_cleared_by_line_hardens_into_stones() {
        let mut board = Board::default();
        fill_row(&mut board, 0, 2..9);
        let sticky = Piece::with_sticky(PieceKind::DominoH, true);

        // Completes row 0: the footprint cells are cleared immediately.
        let outcome = board.place_and_clear(&sticky, 0, 0, 1, 2);
        assert_eq!(outcome.cleared_count, 9);
        assert_eq!(outcome.stone_count, 0);

        // The footprint is empty again after the clear, so on the delayed
        // move both cells harden, row-major order.
        let outcome = board.place_and_clear(&Piece::new(PieceKind::Dot), 5, 5, 0, 0);
        assert_eq!(outcome.stone_count, 2);
        assert_eq!(outcome.stones, vec![Coord::new(0, 0), Coord::new(1, 0)]);
        assert_eq!(board.cell(0, 0), CellState::Stone);
        assert_eq!(board.cell(1, 0), CellState::Stone);
    }

    #[test]
    fn sticky_stone_count_is_capped_by_config_and_survivors() {
        let mut board = Board::default();
        fill_row(&mut board, 0, 3..9);
        let sticky = Piece::with_sticky(PieceKind::TriLineH, true);

        let outcome = board.place_and_clear(&sticky, 0, 0, 1, 1);
        assert_eq!(outcome.cleared_count, 9);

        let outcome = board.place_and_clear(&Piece::new(PieceKind::Dot), 5, 5, 0, 0);
        // Three empty survivors, but only one stone is allowed.
        assert_eq!(outcome.stone_count, 1);
        assert_eq!(outcome.stones, vec![Coord::new(0, 0)]);
        assert_eq!(board.cell(1, 0), CellState::Empty);
        assert_eq!(board.cell(2, 0), CellState::Empty);
    }

    #[test]
    fn multiple_pending_effects_resolve_independently() {
        let mut board = Board::default();
        let first = Piece::with_sticky(PieceKind::Dot, true);
        let second = Piece::with_sticky(PieceKind::Dot, true);
        board.place_and_clear(&first, 0, 0, 3, 1);
        board.place_and_clear(&second, 8, 8, 3, 1);
        assert_eq!(board.pending_sticky().len(), 2);

        board.place_and_clear(&Piece::new(PieceKind::Dot), 4, 4, 0, 0);
        assert_eq!(board.pending_sticky().len(), 2);
        board.place_and_clear(&Piece::new(PieceKind::Dot), 5, 4, 0, 0);
        // First effect registered two moves before the second: both counted
        // down in lockstep, first placed at move 1 resolves on move 4.
        assert_eq!(board.pending_sticky().len(), 1);
    }

    #[test]
    fn stones_block_placement() {
        let mut board = Board::default();
        board.set_cell(0, 0, CellState::Stone);
        assert!(!board.can_place(&Piece::new(PieceKind::Dot), 0, 0));
        assert!(board.can_place(&Piece::new(PieceKind::Dot), 1, 0));
    }

    #[test]
    fn reset_clears_grid_and_pending_effects() {
        let mut board = Board::default();
        let sticky = Piece::with_sticky(PieceKind::Square2, true);
        board.place_and_clear(&sticky, 0, 0, 5, 2);
        board.reset();
        assert!(board.pending_sticky().is_empty());
        assert!((board.fill_ratio()).abs() < f32::EPSILON);
    }

    #[test]
    fn has_any_move_scans_the_whole_hand() {
        let mut board = Board::default();
        for y in 0..9 {
            for x in 0..9 {
                if !(x == 8 && y == 8) {
                    board.set_cell(x, y, CellState::Filled);
                }
            }
        }
        let hand = [Piece::new(PieceKind::I), Piece::new(PieceKind::Dot)];
        assert!(board.has_any_move(&hand));
        let hand = [Piece::new(PieceKind::I), Piece::new(PieceKind::Square2)];
        assert!(!board.has_any_move(&hand));
    }

    #[test]
    fn count_valid_anchors_on_nearly_full_board() {
        let mut board = Board::default();
        for y in 0..9 {
            for x in 0..9 {
                if !(y == 8 && (4..8).contains(&x)) {
                    board.set_cell(x, y, CellState::Filled);
                }
            }
        }
        // Exactly one spot for the I piece, four for a dot.
        assert_eq!(board.count_valid_anchors(&Piece::new(PieceKind::I)), 1);
        assert_eq!(board.count_valid_anchors(&Piece::new(PieceKind::Dot)), 4);
    }
}
