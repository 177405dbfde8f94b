use gridfall_game::{BalanceConfig, DifficultyLevel, DifficultyTag, run_batch};

const GAMES: u32 = 50;
const SEED: u64 = 7;

/// Default tuning with a tighter move cap; acceptance runs care about the
/// reproducibility contract, not full-length sessions.
fn acceptance_config() -> BalanceConfig {
    BalanceConfig::from_json(r#"{"simulation_max_moves": 80}"#).expect("valid config")
}

#[test]
fn batch_runs_are_bit_identical_for_a_fixed_triple() {
    let config = acceptance_config();
    let tag = DifficultyTag::default();
    let first = run_batch(&config, tag, GAMES, SEED);
    let second = run_batch(&config, tag, GAMES, SEED);
    assert_eq!(first, second);

    let json_first = serde_json::to_string(&first).expect("stats serialize");
    let json_second = serde_json::to_string(&second).expect("stats serialize");
    assert_eq!(json_first, json_second);
}

#[test]
fn every_difficulty_tier_completes_a_batch() {
    let config = acceptance_config();
    for level in [
        DifficultyLevel::Easy,
        DifficultyLevel::Medium,
        DifficultyLevel::Hard,
    ] {
        for no_mercy in [false, true] {
            let stats = run_batch(&config, DifficultyTag::new(level, no_mercy), 10, SEED);
            assert_eq!(stats.games, 10);
            assert!(
                stats.mean_moves > 0.0,
                "{level:?}/no_mercy={no_mercy} produced empty games"
            );
            assert!(stats.mean_duration_sec > 0.0);
            assert!(stats.p90_duration_sec >= stats.p50_duration_sec);
        }
    }
}

#[test]
fn config_changes_move_the_statistics() {
    let baseline = run_batch(&acceptance_config(), DifficultyTag::default(), 30, SEED);

    // Choke the well backlog: overflow losses should appear or games shorten.
    let choked = BalanceConfig::from_json(
        r#"{"simulation_max_moves": 80, "well_size": 1, "well_inflow_factor": 0.2}"#,
    )
    .expect("valid config");
    let stats = run_batch(&choked, DifficultyTag::default(), 30, SEED);
    assert!(
        stats.well_overflow_rate > baseline.well_overflow_rate
            || stats.mean_moves < baseline.mean_moves
    );
}

#[test]
fn simulation_honors_the_move_cap() {
    let short = BalanceConfig::from_json(r#"{"simulation_max_moves": 25}"#).expect("valid config");
    let stats = run_batch(&short, DifficultyTag::default(), 20, SEED);
    assert!(stats.mean_moves <= 25.0);
    assert!(stats.p90_duration_sec <= 25.0 * short.simulation_move_seconds + f32::EPSILON);
}
