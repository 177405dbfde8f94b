//! Balance configuration and per-difficulty parameter derivation.
//!
//! `BalanceConfig` is the immutable tuning table supplied once at startup.
//! Nothing in the core mutates it; difficulty selection goes through
//! [`BalanceConfig::derive`], a pure function that produces the
//! [`EffectiveParams`] snapshot the rest of the core reads.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::deadzone::DeadZoneWeights;
use crate::numbers::{clamp01, lerp};
use crate::shapes::{PieceFamily, PieceKind};

/// Errors surfaced at the config boundary. Simulation paths never see these;
/// callers that want silent recovery use [`BalanceConfig::from_json_or_default`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("balance config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid balance config: {0}")]
    Invalid(String),
}

/// Coarse difficulty selector handed in by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DifficultyLevel {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Difficulty tag: a level plus the optional no-mercy modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DifficultyTag {
    pub level: DifficultyLevel,
    pub no_mercy: bool,
}

impl DifficultyTag {
    #[must_use]
    pub const fn new(level: DifficultyLevel, no_mercy: bool) -> Self {
        Self { level, no_mercy }
    }
}

/// The immutable tuning table. Every field has a built-in default so a
/// partial (or empty) JSON document deserializes to a playable config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceConfig {
    // Difficulty / pace
    #[serde(default = "default_base_fall_speed")]
    pub base_fall_speed: f32,
    #[serde(default = "default_level_speed_growth")]
    pub level_speed_growth: f32,
    #[serde(default = "default_time_speed_ramp_per_minute")]
    pub time_speed_ramp_per_minute: f32,
    #[serde(default = "default_max_fall_speed_cap")]
    pub max_fall_speed_cap: f32,
    #[serde(default = "default_dda_min_fall_multiplier")]
    pub dda_min_fall_multiplier: f32,
    #[serde(default = "default_dda_max_fall_multiplier")]
    pub dda_max_fall_multiplier: f32,

    // Generator fairness
    #[serde(default = "default_ideal_piece_chance_early")]
    pub ideal_piece_chance_early: f32,
    #[serde(default = "default_ideal_piece_chance_late")]
    pub ideal_piece_chance_late: f32,
    #[serde(default = "default_ideal_chance_decay_per_minute")]
    pub ideal_chance_decay_per_minute: f32,
    #[serde(default = "default_ideal_chance_floor")]
    pub ideal_chance_floor: f32,
    #[serde(default = "default_pity_every_n_spawns")]
    pub pity_every_n_spawns: u32,
    #[serde(default = "default_no_progress_moves_for_pity")]
    pub no_progress_moves_for_pity: u32,
    #[serde(default = "default_candidate_top_band")]
    pub candidate_top_band: usize,

    // DDA signals
    #[serde(default = "default_target_move_time_sec")]
    pub target_move_time_sec: f32,
    #[serde(default = "default_fill_danger_threshold")]
    pub fill_danger_threshold: f32,
    #[serde(default = "default_dda_rate_per_move")]
    pub dda_rate_per_move: f32,

    // Forced-fit teaching moments
    #[serde(default = "default_forced_fit_markers_sec")]
    pub forced_fit_markers_sec: [f32; 4],
    #[serde(default = "default_forced_fit_easy")]
    pub forced_fit_easy: [f32; 4],
    #[serde(default = "default_forced_fit_medium")]
    pub forced_fit_medium: [f32; 4],
    #[serde(default = "default_forced_fit_hard")]
    pub forced_fit_hard: [f32; 4],
    #[serde(default = "default_forced_fit_no_mercy_bonus")]
    pub forced_fit_no_mercy_bonus: f32,
    #[serde(default = "default_forced_fit_band_width")]
    pub forced_fit_band_width: f32,

    // Well relief
    #[serde(default = "default_well_size")]
    pub well_size: u32,
    #[serde(default = "default_force_well_after_seconds")]
    pub force_well_after_seconds: f32,
    #[serde(default = "default_force_well_every_n_pieces")]
    pub force_well_every_n_pieces: u32,
    #[serde(default = "default_well_spawn_chance_early")]
    pub well_spawn_chance_early: f32,
    #[serde(default = "default_well_spawn_chance_late")]
    pub well_spawn_chance_late: f32,

    // Sticky hazards
    #[serde(default = "default_sticky_piece_chance")]
    pub sticky_piece_chance: f32,
    #[serde(default = "default_sticky_no_mercy_bonus")]
    pub sticky_no_mercy_bonus: f32,
    #[serde(default = "default_sticky_delay_moves")]
    pub sticky_delay_moves: u32,
    #[serde(default = "default_sticky_stone_count")]
    pub sticky_stone_count: usize,

    // Dead-zone recovery
    #[serde(default = "default_dead_zone_margin")]
    pub dead_zone_margin: i32,
    #[serde(default)]
    pub dead_zone_weights: DeadZoneWeights,
    #[serde(default = "default_dead_zone_trigger_delta")]
    pub dead_zone_trigger_delta: f32,
    #[serde(default = "default_dead_zone_debuff_spawns")]
    pub dead_zone_debuff_spawns: u32,
    #[serde(default = "default_dead_zone_ideal_multiplier")]
    pub dead_zone_ideal_multiplier: f32,
    #[serde(default = "default_dead_zone_forced_bias")]
    pub dead_zone_forced_bias: f32,

    // Pools and sequencing
    #[serde(default = "default_true")]
    pub enable_dominoes: bool,
    #[serde(default = "default_true")]
    pub enable_trominoes: bool,
    #[serde(default = "default_true")]
    pub enable_heavy: bool,
    #[serde(default = "default_true")]
    pub use_bag: bool,
    #[serde(default = "default_max_same_kind_run")]
    pub max_same_kind_run: usize,
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
    #[serde(default = "default_training_draws")]
    pub training_draws: u32,

    // Simulator
    #[serde(default = "default_simulation_max_moves")]
    pub simulation_max_moves: u32,
    #[serde(default = "default_simulation_move_seconds")]
    pub simulation_move_seconds: f32,
    #[serde(default = "default_well_inflow_factor")]
    pub well_inflow_factor: f32,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        serde_json::from_str("{}").expect("empty config deserializes from defaults")
    }
}

impl BalanceConfig {
    /// Parse and validate a config document.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON cannot be parsed or a field is out of
    /// its legal range.
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Silent-recovery variant: any problem falls back to the defaults.
    /// Reporting the problem is the caller's job.
    #[must_use]
    pub fn from_json_or_default(json_str: &str) -> Self {
        Self::from_json(json_str).unwrap_or_default()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.candidate_top_band == 0 {
            return Err(ConfigError::Invalid(String::from(
                "candidate_top_band must be at least 1",
            )));
        }
        if !self
            .forced_fit_markers_sec
            .windows(2)
            .all(|w| w[0] < w[1])
        {
            return Err(ConfigError::Invalid(String::from(
                "forced_fit_markers_sec must be strictly ascending",
            )));
        }
        for probs in [
            &self.forced_fit_easy,
            &self.forced_fit_medium,
            &self.forced_fit_hard,
        ] {
            if probs.iter().any(|p| !(0.0..=1.0).contains(p)) {
                return Err(ConfigError::Invalid(String::from(
                    "forced-fit probabilities must lie in [0, 1]",
                )));
            }
        }
        if self.dda_min_fall_multiplier > self.dda_max_fall_multiplier {
            return Err(ConfigError::Invalid(String::from(
                "dda fall multiplier range is inverted",
            )));
        }
        Ok(())
    }

    /// Derive the immutable per-difficulty parameter snapshot.
    ///
    /// This is the only place difficulty rewrites tuning values; the result
    /// is handed to the generator/director/simulator and never edited again.
    #[must_use]
    pub fn derive(&self, tag: DifficultyTag) -> EffectiveParams {
        let forced_fit_probs = match tag.level {
            DifficultyLevel::Easy => self.forced_fit_easy,
            DifficultyLevel::Medium => self.forced_fit_medium,
            DifficultyLevel::Hard => self.forced_fit_hard,
        };
        let forced_fit_probs = if tag.no_mercy {
            forced_fit_probs.map(|p| clamp01(p + self.forced_fit_no_mercy_bonus))
        } else {
            forced_fit_probs
        };

        let sticky_piece_chance = match tag.level {
            DifficultyLevel::Easy => 0.0,
            DifficultyLevel::Medium => self.sticky_piece_chance * 0.5,
            DifficultyLevel::Hard => self.sticky_piece_chance,
        };
        let sticky_piece_chance = if tag.no_mercy {
            clamp01(sticky_piece_chance + self.sticky_no_mercy_bonus)
        } else {
            sticky_piece_chance
        };

        let (pity_every_n_spawns, no_progress_moves_for_pity) = match tag.level {
            DifficultyLevel::Easy => (
                self.pity_every_n_spawns.saturating_sub(2).max(1),
                self.no_progress_moves_for_pity.saturating_sub(1).max(1),
            ),
            DifficultyLevel::Medium => (self.pity_every_n_spawns, self.no_progress_moves_for_pity),
            DifficultyLevel::Hard => (
                self.pity_every_n_spawns + 2,
                self.no_progress_moves_for_pity + 1,
            ),
        };

        EffectiveParams {
            tag,
            base_fall_speed: self.base_fall_speed,
            level_speed_growth: self.level_speed_growth,
            time_speed_ramp_per_minute: self.time_speed_ramp_per_minute,
            max_fall_speed_cap: self.max_fall_speed_cap,
            dda_min_fall_multiplier: self.dda_min_fall_multiplier,
            dda_max_fall_multiplier: self.dda_max_fall_multiplier,
            ideal_piece_chance_early: self.ideal_piece_chance_early,
            ideal_piece_chance_late: self.ideal_piece_chance_late,
            ideal_chance_decay_per_minute: self.ideal_chance_decay_per_minute,
            ideal_chance_floor: if tag.no_mercy {
                0.0
            } else {
                self.ideal_chance_floor
            },
            pity_enabled: !tag.no_mercy,
            pity_every_n_spawns,
            no_progress_moves_for_pity,
            candidate_top_band: self.candidate_top_band,
            target_move_time_sec: self.target_move_time_sec,
            fill_danger_threshold: self.fill_danger_threshold,
            dda_rate_per_move: self.dda_rate_per_move,
            forced_fit_markers_sec: self.forced_fit_markers_sec,
            forced_fit_probs,
            forced_fit_band_width: self.forced_fit_band_width,
            well_capacity: self.well_size,
            force_well_after_seconds: self.force_well_after_seconds,
            force_well_every_n_pieces: self.force_well_every_n_pieces,
            well_spawn_chance_early: self.well_spawn_chance_early,
            well_spawn_chance_late: self.well_spawn_chance_late,
            sticky_piece_chance,
            sticky_delay_moves: self.sticky_delay_moves,
            sticky_stone_count: self.sticky_stone_count,
            dead_zone_margin: self.dead_zone_margin,
            dead_zone_weights: self.dead_zone_weights,
            dead_zone_trigger_delta: self.dead_zone_trigger_delta,
            dead_zone_debuff_spawns: self.dead_zone_debuff_spawns,
            dead_zone_ideal_multiplier: self.dead_zone_ideal_multiplier,
            dead_zone_forced_bias: self.dead_zone_forced_bias,
            enable_dominoes: self.enable_dominoes,
            enable_trominoes: self.enable_trominoes,
            enable_heavy: self.enable_heavy && tag.level != DifficultyLevel::Easy,
            use_bag: self.use_bag,
            max_same_kind_run: self.max_same_kind_run,
            history_depth: self.history_depth,
            training_draws: self.training_draws,
            simulation_max_moves: self.simulation_max_moves,
            simulation_move_seconds: self.simulation_move_seconds,
            well_inflow_factor: self.well_inflow_factor,
        }
    }
}

/// Immutable effective parameter snapshot for one session/difficulty.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveParams {
    pub tag: DifficultyTag,
    pub base_fall_speed: f32,
    pub level_speed_growth: f32,
    pub time_speed_ramp_per_minute: f32,
    pub max_fall_speed_cap: f32,
    pub dda_min_fall_multiplier: f32,
    pub dda_max_fall_multiplier: f32,
    pub ideal_piece_chance_early: f32,
    pub ideal_piece_chance_late: f32,
    pub ideal_chance_decay_per_minute: f32,
    pub ideal_chance_floor: f32,
    pub pity_enabled: bool,
    pub pity_every_n_spawns: u32,
    pub no_progress_moves_for_pity: u32,
    pub candidate_top_band: usize,
    pub target_move_time_sec: f32,
    pub fill_danger_threshold: f32,
    pub dda_rate_per_move: f32,
    pub forced_fit_markers_sec: [f32; 4],
    pub forced_fit_probs: [f32; 4],
    pub forced_fit_band_width: f32,
    pub well_capacity: u32,
    pub force_well_after_seconds: f32,
    pub force_well_every_n_pieces: u32,
    pub well_spawn_chance_early: f32,
    pub well_spawn_chance_late: f32,
    pub sticky_piece_chance: f32,
    pub sticky_delay_moves: u32,
    pub sticky_stone_count: usize,
    pub dead_zone_margin: i32,
    pub dead_zone_weights: DeadZoneWeights,
    pub dead_zone_trigger_delta: f32,
    pub dead_zone_debuff_spawns: u32,
    pub dead_zone_ideal_multiplier: f32,
    pub dead_zone_forced_bias: f32,
    pub enable_dominoes: bool,
    pub enable_trominoes: bool,
    pub enable_heavy: bool,
    pub use_bag: bool,
    pub max_same_kind_run: usize,
    pub history_depth: usize,
    pub training_draws: u32,
    pub simulation_max_moves: u32,
    pub simulation_move_seconds: f32,
    pub well_inflow_factor: f32,
}

impl EffectiveParams {
    /// Kinds in the enabled pool, in canonical catalog order.
    #[must_use]
    pub fn enabled_kinds(&self) -> Vec<PieceKind> {
        PieceKind::all()
            .iter()
            .copied()
            .filter(|kind| match kind.family() {
                PieceFamily::Tetromino | PieceFamily::Core => true,
                PieceFamily::Domino => self.enable_dominoes,
                PieceFamily::Tromino => self.enable_trominoes,
                PieceFamily::Heavy => self.enable_heavy,
            })
            .collect()
    }

    /// Forced-fit probability at a point in the session, piecewise-linear
    /// over the configured time markers and clamped outside the range.
    #[must_use]
    pub fn forced_fit_probability(&self, elapsed_seconds: f32) -> f32 {
        let markers = &self.forced_fit_markers_sec;
        let probs = &self.forced_fit_probs;
        if elapsed_seconds <= markers[0] {
            return probs[0];
        }
        if elapsed_seconds >= markers[3] {
            return probs[3];
        }
        for i in 0..markers.len() - 1 {
            if elapsed_seconds <= markers[i + 1] {
                let t = (elapsed_seconds - markers[i]) / (markers[i + 1] - markers[i]);
                return lerp(probs[i], probs[i + 1], t);
            }
        }
        probs[3]
    }
}

fn default_base_fall_speed() -> f32 {
    14.0
}
fn default_level_speed_growth() -> f32 {
    1.16
}
fn default_time_speed_ramp_per_minute() -> f32 {
    0.11
}
fn default_max_fall_speed_cap() -> f32 {
    72.0
}
fn default_dda_min_fall_multiplier() -> f32 {
    0.85
}
fn default_dda_max_fall_multiplier() -> f32 {
    1.25
}
fn default_ideal_piece_chance_early() -> f32 {
    0.82
}
fn default_ideal_piece_chance_late() -> f32 {
    0.30
}
fn default_ideal_chance_decay_per_minute() -> f32 {
    0.06
}
fn default_ideal_chance_floor() -> f32 {
    0.22
}
fn default_pity_every_n_spawns() -> u32 {
    8
}
fn default_no_progress_moves_for_pity() -> u32 {
    3
}
fn default_candidate_top_band() -> usize {
    3
}
fn default_target_move_time_sec() -> f32 {
    2.2
}
fn default_fill_danger_threshold() -> f32 {
    0.70
}
fn default_dda_rate_per_move() -> f32 {
    0.10
}
fn default_forced_fit_markers_sec() -> [f32; 4] {
    [90.0, 180.0, 360.0, 600.0]
}
fn default_forced_fit_easy() -> [f32; 4] {
    [0.02, 0.04, 0.06, 0.08]
}
fn default_forced_fit_medium() -> [f32; 4] {
    [0.05, 0.09, 0.14, 0.18]
}
fn default_forced_fit_hard() -> [f32; 4] {
    [0.08, 0.15, 0.22, 0.28]
}
fn default_forced_fit_no_mercy_bonus() -> f32 {
    0.08
}
fn default_forced_fit_band_width() -> f32 {
    6.0
}
fn default_well_size() -> u32 {
    6
}
fn default_force_well_after_seconds() -> f32 {
    45.0
}
fn default_force_well_every_n_pieces() -> u32 {
    10
}
fn default_well_spawn_chance_early() -> f32 {
    0.08
}
fn default_well_spawn_chance_late() -> f32 {
    0.30
}
fn default_sticky_piece_chance() -> f32 {
    0.06
}
fn default_sticky_no_mercy_bonus() -> f32 {
    0.04
}
fn default_sticky_delay_moves() -> u32 {
    3
}
fn default_sticky_stone_count() -> usize {
    2
}
fn default_dead_zone_margin() -> i32 {
    1
}
fn default_dead_zone_trigger_delta() -> f32 {
    4.0
}
fn default_dead_zone_debuff_spawns() -> u32 {
    6
}
fn default_dead_zone_ideal_multiplier() -> f32 {
    1.35
}
fn default_dead_zone_forced_bias() -> f32 {
    0.10
}
fn default_true() -> bool {
    true
}
fn default_max_same_kind_run() -> usize {
    2
}
fn default_history_depth() -> usize {
    8
}
fn default_training_draws() -> u32 {
    24
}
fn default_simulation_max_moves() -> u32 {
    320
}
fn default_simulation_move_seconds() -> f32 {
    1.8
}
fn default_well_inflow_factor() -> f32 {
    0.06
}
