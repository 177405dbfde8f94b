//! Adaptive piece delivery.
//!
//! The generator weighs every enabled kind against the live board, then runs
//! the selection policy chain: forced-fit, well relief, ideal-vs-random band,
//! anti-streak. A board-independent queue (training table first, then bag or
//! uniform draws) backs the whole thing as the fallback stream, and is burned
//! in lockstep with heuristic picks so both paths stay consistent.

use std::collections::VecDeque;
use std::rc::Rc;

use rand::Rng;
use smallvec::SmallVec;

use crate::board::Board;
use crate::config::EffectiveParams;
use crate::constants::{
    BLOCK_SCORE_FULL, BLOCK_SCORE_MAJORITY, BLOCK_SCORE_ONE_SHORT, BLOCK_SCORE_PER_FILLED,
    BLOCK_SCORE_TWO_SHORT, CELL_SCORE_PER_CELL, HEAVY_SHAPE_MIN_CELLS, HEAVY_SHAPE_SCORE_FACTOR,
    LINE_SCORE_FULL, LINE_SCORE_NEAR, LINE_SCORE_ONE_SHORT, LINE_SCORE_PER_FILLED,
    LINE_SCORE_TWO_SHORT, QUEUE_PREFILL, WELL_CHANCE_RAMP_SECONDS,
};
use crate::numbers::{clamp01, lerp};
use crate::rng::SessionRng;
use crate::shapes::{Piece, PieceKind};

/// Active recovery window installed after a board-quality regression.
///
/// The multiplier is applied to the caller-supplied ideal chance verbatim;
/// whether that rewards or penalizes is a tuning decision, not ours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadZoneDebuff {
    pub remaining_spawns: u32,
    pub ideal_chance_multiplier: f32,
    pub forced_bias_bonus: f32,
}

/// Observability gauges for debug overlays and batch reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorGauges {
    pub seconds_since_last_well: f32,
    pub pieces_since_well: u32,
    pub spawns_since_pity: u32,
    pub pity_triggers: u32,
    pub training_remaining: u32,
}

#[derive(Debug, Clone, Copy)]
struct RankedKind {
    kind: PieceKind,
    score: f32,
}

#[derive(Debug, Clone, Copy)]
struct PendingPick {
    kind: PieceKind,
    sticky: bool,
}

#[derive(Debug)]
pub struct PieceGenerator {
    rng: Rc<SessionRng>,
    params: EffectiveParams,
    enabled_kinds: Vec<PieceKind>,
    queue: VecDeque<PieceKind>,
    bag: Vec<PieceKind>,
    history: VecDeque<PieceKind>,
    training_remaining: u32,
    spawns_since_pity: u32,
    no_progress_moves: u32,
    pity_triggers: u32,
    pieces_since_well: u32,
    last_well_elapsed_sec: f32,
    debuff: Option<DeadZoneDebuff>,
    peeked: Option<PendingPick>,
}

impl PieceGenerator {
    #[must_use]
    pub fn new(rng: Rc<SessionRng>, params: EffectiveParams) -> Self {
        let enabled_kinds = params.enabled_kinds();
        let training_remaining = params.training_draws;
        let mut generator = Self {
            rng,
            params,
            enabled_kinds,
            queue: VecDeque::new(),
            bag: Vec::new(),
            history: VecDeque::new(),
            training_remaining,
            spawns_since_pity: 0,
            no_progress_moves: 0,
            pity_triggers: 0,
            pieces_since_well: 0,
            last_well_elapsed_sec: 0.0,
            debuff: None,
            peeked: None,
        };
        generator.ensure_queue(QUEUE_PREFILL);
        generator
    }

    /// Read-only look-ahead. Idempotent until the next `pop` (or until a
    /// reported outcome / debuff invalidates the cached pick), so a preview
    /// and the following commit always agree.
    pub fn peek(&mut self, board: Option<&Board>, ideal_chance: f32, elapsed_seconds: f32) -> Piece {
        if self.peeked.is_none() {
            self.peeked = Some(self.select(board, ideal_chance, elapsed_seconds));
        }
        let pick = self.peeked.expect("pick cached above");
        Piece::with_sticky(pick.kind, pick.sticky)
    }

    /// Consume the next piece and advance all generator bookkeeping.
    pub fn pop(&mut self, board: Option<&Board>, ideal_chance: f32, elapsed_seconds: f32) -> Piece {
        let pick = match self.peeked.take() {
            Some(pick) => pick,
            None => self.select(board, ideal_chance, elapsed_seconds),
        };

        self.burn_queue_token();
        self.history.push_back(pick.kind);
        while self.history.len() > self.params.history_depth {
            self.history.pop_front();
        }
        self.spawns_since_pity += 1;
        self.pieces_since_well += 1;
        if pick.kind.is_well_kind() {
            self.pieces_since_well = 0;
            self.last_well_elapsed_sec = elapsed_seconds;
        }
        if let Some(debuff) = self.debuff.as_mut() {
            debuff.remaining_spawns = debuff.remaining_spawns.saturating_sub(1);
            if debuff.remaining_spawns == 0 {
                self.debuff = None;
            }
        }
        self.training_remaining = self.training_remaining.saturating_sub(1);

        Piece::with_sticky(pick.kind, pick.sticky)
    }

    /// Report the outcome of the committed placement this generator fed.
    pub fn register_move_outcome(&mut self, cleared_count: usize) {
        if cleared_count > 0 {
            self.no_progress_moves = 0;
        } else {
            self.no_progress_moves += 1;
        }
        self.peeked = None;
    }

    /// Install (or overwrite) the dead-zone recovery window.
    pub fn apply_dead_zone_penalty(
        &mut self,
        duration_spawns: u32,
        ideal_chance_multiplier: f32,
        forced_bias: f32,
    ) {
        self.debuff = Some(DeadZoneDebuff {
            remaining_spawns: duration_spawns,
            ideal_chance_multiplier,
            forced_bias_bonus: forced_bias,
        });
        self.peeked = None;
    }

    #[must_use]
    pub const fn dead_zone_debuff(&self) -> Option<&DeadZoneDebuff> {
        self.debuff.as_ref()
    }

    /// Drain the pity-trigger counter (batch statistic).
    pub fn consume_pity_trigger_count(&mut self) -> u32 {
        let value = self.pity_triggers;
        self.pity_triggers = 0;
        value
    }

    #[must_use]
    pub fn gauges(&self, elapsed_seconds: f32) -> GeneratorGauges {
        GeneratorGauges {
            seconds_since_last_well: (elapsed_seconds - self.last_well_elapsed_sec).max(0.0),
            pieces_since_well: self.pieces_since_well,
            spawns_since_pity: self.spawns_since_pity,
            pity_triggers: self.pity_triggers,
            training_remaining: self.training_remaining,
        }
    }

    fn select(
        &mut self,
        board: Option<&Board>,
        ideal_chance: f32,
        elapsed_seconds: f32,
    ) -> PendingPick {
        let kind = self.select_kind(board, ideal_chance, elapsed_seconds);
        let sticky = self.roll_sticky(kind);
        PendingPick { kind, sticky }
    }

    fn select_kind(
        &mut self,
        board: Option<&Board>,
        ideal_chance: f32,
        elapsed_seconds: f32,
    ) -> PieceKind {
        // Training phase and board-less calls use the plain queue stream.
        let Some(board) = board else {
            return self.fallback_kind();
        };
        if self.training_remaining > 0 {
            return self.fallback_kind();
        }

        let ranked = self.evaluate_kinds(board);
        if ranked.is_empty() {
            return self.fallback_kind();
        }

        // Forced-fit: manufacture a "there is exactly one right spot" moment.
        let forced_probability = self.params.forced_fit_probability(elapsed_seconds)
            + self.debuff.map_or(0.0, |d| d.forced_bias_bonus);
        if self.roll(forced_probability)
            && let Some(kind) = self.pick_single_anchor_kind(board, &ranked)
        {
            return self.enforce_streak(kind, &ranked);
        }

        // Well relief: forced by starvation thresholds or a ramping roll.
        let since_well = (elapsed_seconds - self.last_well_elapsed_sec).max(0.0);
        let force_well = since_well >= self.params.force_well_after_seconds
            || self.pieces_since_well >= self.params.force_well_every_n_pieces;
        let dynamic_chance = lerp(
            self.params.well_spawn_chance_early,
            self.params.well_spawn_chance_late,
            clamp01(since_well / WELL_CHANCE_RAMP_SECONDS),
        );
        if (force_well || self.roll(dynamic_chance))
            && let Some(entry) = ranked.iter().find(|e| e.kind.is_well_kind())
        {
            return self.enforce_streak(entry.kind, &ranked);
        }

        // Default path: pity-forced ideal, rolled ideal, or the fair band.
        let pity = self.params.pity_enabled
            && (self.no_progress_moves >= self.params.no_progress_moves_for_pity
                || self.spawns_since_pity >= self.params.pity_every_n_spawns);
        let effective_ideal =
            ideal_chance * self.debuff.map_or(1.0, |d| d.ideal_chance_multiplier);
        let kind = if pity || self.roll(effective_ideal) {
            if pity {
                self.pity_triggers += 1;
            }
            self.spawns_since_pity = 0;
            ranked[0].kind
        } else {
            let band = self.params.candidate_top_band.min(ranked.len());
            let index = self.rng.pieces().gen_range(0..band);
            ranked[index].kind
        };
        self.enforce_streak(kind, &ranked)
    }

    /// Score every enabled kind by its best anchor; kinds that fit nowhere
    /// are excluded. Sorted by score descending, catalog order on ties.
    fn evaluate_kinds(&self, board: &Board) -> Vec<RankedKind> {
        let scan = BoardScan::of(board);
        let size = board.size() as i32;
        let mut ranked = Vec::with_capacity(self.enabled_kinds.len());
        for &kind in &self.enabled_kinds {
            let piece = Piece::new(kind);
            let mut best = f32::NEG_INFINITY;
            for y in 0..size {
                for x in 0..size {
                    if board.can_place(&piece, x, y) {
                        best = best.max(scan.placement_score(&piece, x, y));
                    }
                }
            }
            if best > f32::NEG_INFINITY {
                ranked.push(RankedKind { kind, score: best });
            }
        }
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }

    /// Restrict to kinds with exactly one valid anchor; highest score wins,
    /// ties within the configured band broken uniformly.
    fn pick_single_anchor_kind(
        &mut self,
        board: &Board,
        ranked: &[RankedKind],
    ) -> Option<PieceKind> {
        let singles: Vec<&RankedKind> = ranked
            .iter()
            .filter(|e| board.count_valid_anchors(&Piece::new(e.kind)) == 1)
            .collect();
        let best = singles.first()?;
        let floor = best.score - self.params.forced_fit_band_width;
        let band: Vec<PieceKind> = singles
            .iter()
            .take_while(|e| e.score >= floor)
            .map(|e| e.kind)
            .collect();
        let index = if band.len() > 1 {
            self.rng.pieces().gen_range(0..band.len())
        } else {
            0
        };
        Some(band[index])
    }

    /// Swap the choice for the next non-violating candidate when it would
    /// extend a same-kind run past the limit; keep it if nothing qualifies.
    fn enforce_streak(&self, chosen: PieceKind, ranked: &[RankedKind]) -> PieceKind {
        if !self.would_violate_streak(chosen) {
            return chosen;
        }
        ranked
            .iter()
            .map(|e| e.kind)
            .find(|&kind| !self.would_violate_streak(kind))
            .unwrap_or(chosen)
    }

    fn would_violate_streak(&self, kind: PieceKind) -> bool {
        let max_run = self.params.max_same_kind_run;
        if max_run == 0 {
            return false;
        }
        let run = self
            .history
            .iter()
            .rev()
            .take_while(|&&recent| recent == kind)
            .count();
        run >= max_run
    }

    /// Front of the board-independent queue, with the streak guard applied
    /// by swapping a later non-violating entry forward when needed.
    fn fallback_kind(&mut self) -> PieceKind {
        self.ensure_queue(QUEUE_PREFILL);
        if self.would_violate_streak(self.queue[0])
            && let Some(pos) = (1..self.queue.len())
                .find(|&i| !self.would_violate_streak(self.queue[i]))
        {
            self.queue.swap(0, pos);
        }
        self.queue[0]
    }

    fn burn_queue_token(&mut self) {
        self.ensure_queue(1);
        self.queue.pop_front();
    }

    fn ensure_queue(&mut self, count: usize) {
        while self.queue.len() < count {
            let kind = if self.training_remaining > 0 {
                self.weighted_training_pick()
            } else if self.params.use_bag {
                self.draw_from_bag()
            } else {
                self.uniform_enabled_pick()
            };
            self.queue.push_back(kind);
        }
    }

    /// Without-replacement draw; refills with all enabled kinds on
    /// exhaustion. Each draw passes through the streak guard.
    fn draw_from_bag(&mut self) -> PieceKind {
        if self.bag.is_empty() {
            self.bag.extend(self.enabled_kinds.iter().copied());
        }
        let mut index = self.rng.pieces().gen_range(0..self.bag.len());
        if self.would_violate_streak(self.bag[index])
            && let Some(alternative) = (0..self.bag.len())
                .find(|&i| !self.would_violate_streak(self.bag[i]))
        {
            index = alternative;
        }
        self.bag.remove(index)
    }

    /// Independent uniform pick over the enabled pool.
    fn uniform_enabled_pick(&mut self) -> PieceKind {
        let mut index = self.rng.pieces().gen_range(0..self.enabled_kinds.len());
        if self.would_violate_streak(self.enabled_kinds[index])
            && let Some(alternative) = (0..self.enabled_kinds.len())
                .find(|&i| !self.would_violate_streak(self.enabled_kinds[i]))
        {
            index = alternative;
        }
        self.enabled_kinds[index]
    }

    /// Fixed weighted table favoring small, forgiving shapes.
    fn weighted_training_pick(&mut self) -> PieceKind {
        let roll = self.rng.pieces().gen_range(1..=100);
        match roll {
            1..=12 => PieceKind::O,
            13..=22 => PieceKind::I,
            23..=32 => PieceKind::T,
            33..=46 => PieceKind::Dot,
            47..=58 => PieceKind::DominoH,
            59..=68 => PieceKind::DominoV,
            69..=78 => PieceKind::Square2,
            79..=86 => PieceKind::TriCorner,
            87..=93 => PieceKind::TriLineH,
            _ => PieceKind::Plus5,
        }
    }

    fn roll_sticky(&mut self, kind: PieceKind) -> bool {
        if self.params.sticky_piece_chance <= 0.0 || kind.is_well_kind() {
            return false;
        }
        self.roll(self.params.sticky_piece_chance)
    }

    fn roll(&mut self, chance: f32) -> bool {
        self.rng.pieces().r#gen::<f32>() <= chance
    }
}

/// Per-board fill tallies for rows, columns, and 3x3 blocks, so scoring a
/// candidate anchor only touches the handful of lines the piece changes
/// instead of rescanning the whole grid per anchor.
#[derive(Debug)]
struct BoardScan {
    size: usize,
    row_counts: Vec<usize>,
    col_counts: Vec<usize>,
    block_counts: Vec<usize>,
    base_score: f32,
}

impl BoardScan {
    fn of(board: &Board) -> Self {
        let size = board.size();
        let blocks_per_side = if size % 3 == 0 { size / 3 } else { 0 };
        let mut row_counts = vec![0usize; size];
        let mut col_counts = vec![0usize; size];
        let mut block_counts = vec![0usize; blocks_per_side * blocks_per_side];
        for y in 0..size {
            for x in 0..size {
                if !board.cell(x as i32, y as i32).is_empty() {
                    row_counts[y] += 1;
                    col_counts[x] += 1;
                    if blocks_per_side > 0 {
                        block_counts[(y / 3) * blocks_per_side + x / 3] += 1;
                    }
                }
            }
        }
        let mut base_score = 0.0;
        for &filled in &row_counts {
            base_score += line_score(filled, size);
        }
        for &filled in &col_counts {
            base_score += line_score(filled, size);
        }
        for &filled in &block_counts {
            base_score += block_score(filled);
        }
        Self {
            size,
            row_counts,
            col_counts,
            block_counts,
            base_score,
        }
    }

    /// Placement quality: piece size bonus plus progress toward completing
    /// rows, columns, and 3x3 blocks, steeply superlinear near completion.
    /// The anchor must already have passed `can_place`.
    fn placement_score(&self, piece: &Piece, ax: i32, ay: i32) -> f32 {
        let mut rows: SmallVec<[(usize, usize); 5]> = SmallVec::new();
        let mut cols: SmallVec<[(usize, usize); 5]> = SmallVec::new();
        let mut blocks: SmallVec<[(usize, usize); 5]> = SmallVec::new();
        let blocks_per_side = self.size / 3;
        for c in piece.cells() {
            let x = (ax + c.x) as usize;
            let y = (ay + c.y) as usize;
            bump(&mut rows, y);
            bump(&mut cols, x);
            if !self.block_counts.is_empty() {
                bump(&mut blocks, (y / 3) * blocks_per_side + x / 3);
            }
        }

        let mut score = piece.cells().len() as f32 * CELL_SCORE_PER_CELL + self.base_score;
        for &(y, added) in &rows {
            score += line_score(self.row_counts[y] + added, self.size)
                - line_score(self.row_counts[y], self.size);
        }
        for &(x, added) in &cols {
            score += line_score(self.col_counts[x] + added, self.size)
                - line_score(self.col_counts[x], self.size);
        }
        for &(block, added) in &blocks {
            score += block_score(self.block_counts[block] + added)
                - block_score(self.block_counts[block]);
        }

        if piece.kind().cell_count() >= HEAVY_SHAPE_MIN_CELLS {
            score *= HEAVY_SHAPE_SCORE_FACTOR;
        }
        score
    }
}

fn bump(entries: &mut SmallVec<[(usize, usize); 5]>, key: usize) {
    if let Some(entry) = entries.iter_mut().find(|(k, _)| *k == key) {
        entry.1 += 1;
    } else {
        entries.push((key, 1));
    }
}

#[cfg(test)]
fn evaluate_placement(board: &Board, piece: &Piece, ax: i32, ay: i32) -> f32 {
    BoardScan::of(board).placement_score(piece, ax, ay)
}

fn line_score(filled: usize, size: usize) -> f32 {
    if filled == size {
        LINE_SCORE_FULL
    } else if filled == size - 1 {
        LINE_SCORE_ONE_SHORT
    } else if filled == size - 2 {
        LINE_SCORE_TWO_SHORT
    } else if filled >= size.saturating_sub(4) {
        LINE_SCORE_NEAR
    } else {
        filled as f32 * LINE_SCORE_PER_FILLED
    }
}

fn block_score(filled: usize) -> f32 {
    if filled == 9 {
        BLOCK_SCORE_FULL
    } else if filled == 8 {
        BLOCK_SCORE_ONE_SHORT
    } else if filled == 7 {
        BLOCK_SCORE_TWO_SHORT
    } else if filled >= 5 {
        BLOCK_SCORE_MAJORITY
    } else {
        filled as f32 * BLOCK_SCORE_PER_FILLED
    }
}
