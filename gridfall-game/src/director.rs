//! Difficulty director: a rate-limited feedback controller.
//!
//! One scalar in [0, 1] summarizes how much assistance the player needs
//! (0 = maximum help, 1 = none). Each update recomputes a desired value
//! from the metrics snapshot and steps toward it by at most the configured
//! per-call rate, so the scalar can never jump.

use crate::config::EffectiveParams;
use crate::constants::{
    DIRECTOR_BASELINE, DIRECTOR_CANCEL_WEIGHT, DIRECTOR_DESIRED_MAX, DIRECTOR_DESIRED_MIN,
    DIRECTOR_FILL_PRESSURE_SPAN, DIRECTOR_FILL_WEIGHT, DIRECTOR_INITIAL_DIFFICULTY,
    DIRECTOR_MOVE_WEIGHT,
};
use crate::metrics::MetricsSnapshot;
use crate::numbers::{lerp, move_toward};

#[derive(Debug, Clone)]
pub struct DifficultyDirector {
    difficulty01: f32,
}

impl Default for DifficultyDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl DifficultyDirector {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            difficulty01: DIRECTOR_INITIAL_DIFFICULTY,
        }
    }

    /// Feed one metrics snapshot through the controller.
    pub fn update(&mut self, metrics: &MetricsSnapshot, params: &EffectiveParams) {
        let move_pressure = ((metrics.avg_move_time_sec - params.target_move_time_sec)
            / params.target_move_time_sec)
            .clamp(-1.0, 1.0);
        let fill_pressure = ((metrics.avg_board_fill - params.fill_danger_threshold)
            / DIRECTOR_FILL_PRESSURE_SPAN)
            .clamp(-1.0, 1.0);
        let cancel_pressure = metrics.cancel_rate.clamp(0.0, 1.0);

        let desired = (DIRECTOR_BASELINE
            - move_pressure * DIRECTOR_MOVE_WEIGHT
            - fill_pressure * DIRECTOR_FILL_WEIGHT
            - cancel_pressure * DIRECTOR_CANCEL_WEIGHT)
            .clamp(DIRECTOR_DESIRED_MIN, DIRECTOR_DESIRED_MAX);

        self.difficulty01 = move_toward(self.difficulty01, desired, params.dda_rate_per_move);
    }

    /// Fall-speed multiplier derived from the scalar.
    #[must_use]
    pub fn fall_multiplier(&self, params: &EffectiveParams) -> f32 {
        lerp(
            params.dda_min_fall_multiplier,
            params.dda_max_fall_multiplier,
            self.difficulty01,
        )
    }

    /// Chance the generator hands out the best-scoring piece. Higher
    /// difficulty means fewer generous pieces.
    #[must_use]
    pub fn ideal_piece_chance(&self, params: &EffectiveParams) -> f32 {
        lerp(
            params.ideal_piece_chance_early,
            params.ideal_piece_chance_late,
            self.difficulty01,
        )
    }

    #[must_use]
    pub const fn difficulty01(&self) -> f32 {
        self.difficulty01
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BalanceConfig, DifficultyTag};

    fn params() -> EffectiveParams {
        BalanceConfig::default().derive(DifficultyTag::default())
    }

    fn snapshot(avg_move_time_sec: f32, avg_board_fill: f32, cancel_rate: f32) -> MetricsSnapshot {
        MetricsSnapshot {
            moves: 10,
            avg_move_time_sec,
            avg_board_fill,
            cancel_rate,
            clears: 0,
        }
    }

    #[test]
    fn update_never_moves_past_the_per_call_rate() {
        let params = params();
        let mut director = DifficultyDirector::new();
        let before = director.difficulty01();
        // Extreme metrics in both directions.
        director.update(&snapshot(60.0, 1.0, 1.0), &params);
        assert!((director.difficulty01() - before).abs() <= params.dda_rate_per_move + 1e-6);

        let before = director.difficulty01();
        director.update(&snapshot(0.0, 0.0, 0.0), &params);
        assert!((director.difficulty01() - before).abs() <= params.dda_rate_per_move + 1e-6);
    }

    #[test]
    fn struggling_player_lowers_difficulty() {
        let params = params();
        let mut director = DifficultyDirector::new();
        for _ in 0..30 {
            director.update(&snapshot(60.0, 1.0, 1.0), &params);
        }
        // desired = clamp(0.5 - 0.25 - 0.30 - 0.20, 0.1, 0.95) = 0.1
        assert!((director.difficulty01() - 0.1).abs() < 1e-5);
    }

    #[test]
    fn fast_clean_player_raises_difficulty() {
        let params = params();
        let mut director = DifficultyDirector::new();
        for _ in 0..30 {
            director.update(&snapshot(0.2, 0.05, 0.0), &params);
        }
        // All pressures saturate negative except cancel: 0.5 + 0.25 + 0.30
        assert!(director.difficulty01() > 0.9);
    }

    #[test]
    fn derived_getters_interpolate_with_the_scalar() {
        let params = params();
        let mut director = DifficultyDirector::new();
        let easy_fall = director.fall_multiplier(&params);
        let easy_ideal = director.ideal_piece_chance(&params);
        for _ in 0..30 {
            director.update(&snapshot(0.2, 0.05, 0.0), &params);
        }
        assert!(director.fall_multiplier(&params) > easy_fall);
        assert!(director.ideal_piece_chance(&params) < easy_ideal);
        assert!(director.fall_multiplier(&params) <= params.dda_max_fall_multiplier);
    }
}
