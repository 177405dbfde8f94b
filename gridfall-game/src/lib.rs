//! Gridfall Game Engine
//!
//! Platform-agnostic simulation core for Gridfall, a grid placement puzzle.
//! This crate provides the board, the adaptive piece generator, the
//! difficulty director, and the batch simulator without UI or
//! platform-specific dependencies.
//!
//! The pieces form one adaptive control loop: reported move outcomes feed
//! the metrics aggregator, the difficulty director turns those into a
//! difficulty scalar, the scalar biases the piece generator, and the
//! resulting board outcomes feed back into the metrics. Everything is
//! synchronous and step-driven, and all randomness is injected so that the
//! same seed always reproduces the same statistics.

pub mod board;
pub mod config;
pub mod constants;
pub mod deadzone;
pub mod director;
pub mod generator;
pub mod metrics;
pub mod numbers;
pub mod rng;
pub mod session;
pub mod shapes;
pub mod sim;

// Re-export commonly used types
pub use board::{Board, CellState, DEFAULT_BOARD_SIZE, PendingStickyEffect, PlacementOutcome};
pub use config::{BalanceConfig, ConfigError, DifficultyLevel, DifficultyTag, EffectiveParams};
pub use deadzone::{DeadZoneEvaluation, DeadZoneWeights, begin_evaluation, end_evaluation};
pub use director::DifficultyDirector;
pub use generator::{DeadZoneDebuff, GeneratorGauges, PieceGenerator};
pub use metrics::{GameMetrics, MetricsSnapshot};
pub use rng::{CountingRng, SessionRng};
pub use session::{DifficultySnapshot, GameSession};
pub use shapes::{Coord, Piece, PieceFamily, PieceKind};
pub use sim::{BatchStats, run_batch};
