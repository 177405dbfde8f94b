//! Centralized tuning constants for Gridfall core logic.
//!
//! These values define the deterministic math for the placement heuristic
//! and the performance metrics. Keeping them together ensures that gameplay
//! can only be adjusted via code changes reviewed in version control; the
//! per-session knobs live in `BalanceConfig` instead.

// Placement evaluation ------------------------------------------------------
pub(crate) const CELL_SCORE_PER_CELL: f32 = 1.2;
pub(crate) const LINE_SCORE_FULL: f32 = 130.0;
pub(crate) const LINE_SCORE_ONE_SHORT: f32 = 24.0;
pub(crate) const LINE_SCORE_TWO_SHORT: f32 = 8.0;
pub(crate) const LINE_SCORE_NEAR: f32 = 2.5;
pub(crate) const LINE_SCORE_PER_FILLED: f32 = 0.15;
pub(crate) const BLOCK_SCORE_FULL: f32 = 90.0;
pub(crate) const BLOCK_SCORE_ONE_SHORT: f32 = 18.0;
pub(crate) const BLOCK_SCORE_TWO_SHORT: f32 = 6.0;
pub(crate) const BLOCK_SCORE_MAJORITY: f32 = 2.0;
pub(crate) const BLOCK_SCORE_PER_FILLED: f32 = 0.1;
// Heavy five-cell shapes would otherwise dominate every evaluation.
pub(crate) const HEAVY_SHAPE_SCORE_FACTOR: f32 = 0.80;
pub(crate) const HEAVY_SHAPE_MIN_CELLS: usize = 5;

// Generator -----------------------------------------------------------------
pub(crate) const QUEUE_PREFILL: usize = 2;
pub(crate) const WELL_CHANCE_RAMP_SECONDS: f32 = 60.0;

// Metrics -------------------------------------------------------------------
pub(crate) const MOVE_TIME_EMA_ALPHA: f32 = 0.12;
pub(crate) const BOARD_FILL_EMA_ALPHA: f32 = 0.10;
pub(crate) const INITIAL_AVG_MOVE_TIME_SEC: f32 = 2.0;
pub(crate) const INITIAL_AVG_BOARD_FILL: f32 = 0.2;

// Difficulty director -------------------------------------------------------
pub(crate) const DIRECTOR_INITIAL_DIFFICULTY: f32 = 0.35;
pub(crate) const DIRECTOR_BASELINE: f32 = 0.5;
pub(crate) const DIRECTOR_MOVE_WEIGHT: f32 = 0.25;
pub(crate) const DIRECTOR_FILL_WEIGHT: f32 = 0.30;
pub(crate) const DIRECTOR_CANCEL_WEIGHT: f32 = 0.20;
pub(crate) const DIRECTOR_FILL_PRESSURE_SPAN: f32 = 0.25;
pub(crate) const DIRECTOR_DESIRED_MIN: f32 = 0.1;
pub(crate) const DIRECTOR_DESIRED_MAX: f32 = 0.95;

// Batch simulator -----------------------------------------------------------
pub(crate) const AUTOPLAYER_CENTER_PENALTY: f32 = 0.05;
