//! Headless batch simulator for statistical balance validation.
//!
//! Runs many simulated sessions against a simple greedy autoplayer and
//! aggregates the outcomes. Every game in a batch draws from one shared
//! random stream seeded once for the whole batch, in a fixed order, so a
//! `(config, games, seed)` triple always reproduces bit-identical
//! statistics. Do not parallelize the game loop: per-game sub-streams
//! derived from the batch seed would be required first.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::config::{BalanceConfig, DifficultyTag, EffectiveParams};
use crate::constants::AUTOPLAYER_CENTER_PENALTY;
use crate::deadzone;
use crate::director::DifficultyDirector;
use crate::generator::PieceGenerator;
use crate::metrics::GameMetrics;
use crate::numbers::percentile_of_sorted;
use crate::rng::SessionRng;
use crate::shapes::Piece;

/// Aggregate statistics across one simulated batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub games: u32,
    pub mean_moves: f32,
    pub mean_duration_sec: f32,
    pub p50_duration_sec: f32,
    pub p90_duration_sec: f32,
    pub mean_clears: f32,
    pub clears_per_minute: f32,
    pub no_move_loss_rate: f32,
    pub well_overflow_rate: f32,
    pub mean_pity_triggers: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameEnd {
    MaxMoves,
    NoMove,
    WellOverflow,
}

#[derive(Debug, Clone, Copy)]
struct GameResult {
    moves: u32,
    clears: u32,
    pity_triggers: u32,
    end: GameEnd,
}

/// Run `games` simulated sessions and aggregate their outcomes.
#[must_use]
pub fn run_batch(config: &BalanceConfig, tag: DifficultyTag, games: u32, seed: u64) -> BatchStats {
    let params = config.derive(tag);
    let rng = Rc::new(SessionRng::from_user_seed(seed));

    let mut results = Vec::with_capacity(games as usize);
    for _ in 0..games {
        results.push(run_game(&params, &rng));
    }
    aggregate(&params, &results)
}

fn run_game(params: &EffectiveParams, rng: &Rc<SessionRng>) -> GameResult {
    let mut board = Board::default();
    let mut director = DifficultyDirector::new();
    let mut metrics = GameMetrics::new();
    let mut generator = PieceGenerator::new(Rc::clone(rng), params.clone());

    let mut moves = 0u32;
    let mut clears = 0u32;
    let mut backlog = 0.0f32;
    let mut end = GameEnd::MaxMoves;

    while moves < params.simulation_max_moves {
        // Synthetic well pressure: inflow scales with the current fall
        // speed, outflow is the one piece placed per move.
        let fall_speed = params.base_fall_speed * director.fall_multiplier(params);
        backlog = (backlog + fall_speed * params.well_inflow_factor - 1.0).max(0.0);
        if backlog > params.well_capacity as f32 {
            end = GameEnd::WellOverflow;
            break;
        }

        let elapsed = moves as f32 * params.simulation_move_seconds;
        let ideal_chance = director.ideal_piece_chance(params);
        let piece = generator.pop(Some(&board), ideal_chance, elapsed);

        let Some((ax, ay)) = best_placement(&board, &piece) else {
            end = GameEnd::NoMove;
            break;
        };

        let eval = deadzone::begin_evaluation(
            &board,
            &piece,
            ax,
            ay,
            params.dead_zone_margin,
            &params.dead_zone_weights,
        );
        let outcome = board.place_and_clear(
            &piece,
            ax,
            ay,
            params.sticky_delay_moves,
            params.sticky_stone_count,
        );
        let delta = deadzone::end_evaluation(&board, &eval, &params.dead_zone_weights);
        if delta >= params.dead_zone_trigger_delta {
            generator.apply_dead_zone_penalty(
                params.dead_zone_debuff_spawns,
                params.dead_zone_ideal_multiplier,
                params.dead_zone_forced_bias,
            );
        }

        moves += 1;
        clears += outcome.cleared_count as u32;
        metrics.register_move(
            params.simulation_move_seconds,
            outcome.cleared_count,
            board.fill_ratio(),
        );
        director.update(&metrics.snapshot(), params);
        generator.register_move_outcome(outcome.cleared_count);
    }

    GameResult {
        moves,
        clears,
        pity_triggers: generator.consume_pity_trigger_count(),
        end,
    }
}

/// Greedy autoplayer: prefer anchors near the board center, first hit in
/// scan order wins ties.
fn best_placement(board: &Board, piece: &Piece) -> Option<(i32, i32)> {
    let size = board.size() as i32;
    let center = size / 2;
    let mut best: Option<(f32, i32, i32)> = None;
    for y in 0..size {
        for x in 0..size {
            if !board.can_place(piece, x, y) {
                continue;
            }
            let score =
                1.0 - ((center - x).abs() + (center - y).abs()) as f32 * AUTOPLAYER_CENTER_PENALTY;
            if best.is_none_or(|(b, _, _)| score > b) {
                best = Some((score, x, y));
            }
        }
    }
    best.map(|(_, x, y)| (x, y))
}

fn aggregate(params: &EffectiveParams, results: &[GameResult]) -> BatchStats {
    let games = results.len() as u32;
    if games == 0 {
        return BatchStats {
            games: 0,
            mean_moves: 0.0,
            mean_duration_sec: 0.0,
            p50_duration_sec: 0.0,
            p90_duration_sec: 0.0,
            mean_clears: 0.0,
            clears_per_minute: 0.0,
            no_move_loss_rate: 0.0,
            well_overflow_rate: 0.0,
            mean_pity_triggers: 0.0,
        };
    }

    let mut total_moves = 0u64;
    let mut total_clears = 0u64;
    let mut total_pity = 0u64;
    let mut no_move_losses = 0u32;
    let mut overflows = 0u32;
    let mut durations: Vec<f32> = Vec::with_capacity(results.len());

    for result in results {
        total_moves += u64::from(result.moves);
        total_clears += u64::from(result.clears);
        total_pity += u64::from(result.pity_triggers);
        match result.end {
            GameEnd::NoMove => no_move_losses += 1,
            GameEnd::WellOverflow => overflows += 1,
            GameEnd::MaxMoves => {}
        }
        durations.push(result.moves as f32 * params.simulation_move_seconds);
    }
    durations.sort_by(f32::total_cmp);

    let games_f = f64::from(games);
    let total_duration_sec = total_moves as f64 * f64::from(params.simulation_move_seconds);
    let total_minutes = total_duration_sec / 60.0;
    let clears_per_minute = if total_minutes > 0.0 {
        (total_clears as f64 / total_minutes) as f32
    } else {
        0.0
    };

    BatchStats {
        games,
        mean_moves: (total_moves as f64 / games_f) as f32,
        mean_duration_sec: (total_duration_sec / games_f) as f32,
        p50_duration_sec: percentile_of_sorted(&durations, 50),
        p90_duration_sec: percentile_of_sorted(&durations, 90),
        mean_clears: (total_clears as f64 / games_f) as f32,
        clears_per_minute,
        no_move_loss_rate: no_move_losses as f32 / games as f32,
        well_overflow_rate: overflows as f32 / games as f32,
        mean_pity_triggers: (total_pity as f64 / games_f) as f32,
    }
}
