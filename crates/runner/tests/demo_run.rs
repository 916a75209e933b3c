//! Demo Run Integration Test
//!
//! Runs the full async demo loop against the simulated connector.

use cqg_runner::{RunnerConfig, run};

fn fast_config() -> RunnerConfig {
    RunnerConfig {
        pump_interval_ms: 1,
        run_duration_ms: 5_000,
        ..Default::default()
    }
}

/// The demo completes well before its deadline
#[tokio::test]
async fn test_demo_runs_to_completion() {
    let _ = env_logger::try_init();

    let report = run(fast_config()).await.unwrap();

    assert_eq!(report.accounts, vec![100_001]);
    assert_eq!(report.placed_orders.len(), 3);
    assert_eq!(report.working_orders, Some(1));
    assert_eq!(report.bars.len(), 2);
    assert!(report.errors.is_empty(), "unexpected errors: {:?}", report.errors);
}

/// Without a connection the run stops at its deadline
#[tokio::test]
async fn test_demo_stops_at_deadline() {
    let _ = env_logger::try_init();

    let mut config = fast_config();
    config.sim.auto_connect = false;
    config.run_duration_ms = 50;

    let report = run(config).await.unwrap();
    assert!(report.accounts.is_empty());
    assert!(report.placed_orders.is_empty());
}

/// The report serializes for the console
#[tokio::test]
async fn test_report_serializes() {
    let _ = env_logger::try_init();

    let report = run(fast_config()).await.unwrap();
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("F.US.CLEJ5"));
}

/// Unknown bar symbols are reported, not fatal
#[tokio::test]
async fn test_bar_failures_are_reported() {
    let _ = env_logger::try_init();

    let mut config = fast_config();
    config.bar_symbols = vec!["EP".to_string(), "XYZ".to_string()];

    let report = run(config).await.unwrap();
    assert_eq!(report.bars.len(), 1);
    assert_eq!(report.errors, vec!["Unknown symbol XYZ".to_string()]);
}
