//! Pipeline scenarios run against scripted market data

use alerting::{AlertClassifier, DeduplicationCooler, SuppressReason};
use chrono::{Duration, Utc};
use config::{AlertConfig, CooldownConfig, SignalConfig};
use sentinel_e2e_tests::{
    breakout_snapshot, init_test_logging, short_history_snapshot, uptrend_snapshot,
    PipelineHarness, ScriptedSource,
};
use signals::SignalGenerator;
use types::{AlertLevel, Direction, StrategyTag};

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn volume_spike_on_uptrend_yields_long_breakout() {
    init_test_logging();
    let generator = SignalGenerator::new(SignalConfig::default());

    let candidates = generator.generate(&breakout_snapshot("BTCUSDT")).unwrap();
    let breakout = candidates
        .iter()
        .find(|c| c.strategy == StrategyTag::Breakout)
        .expect("breakout candidate");

    assert_eq!(breakout.direction, Direction::Long);
    assert!(breakout.net_risk_reward >= 1.5);
    assert!(breakout.net_risk_reward < breakout.raw_risk_reward);
    assert!(breakout.stop_loss < breakout.entry);
    assert!(breakout.take_profit_1 > breakout.entry);
}

#[test]
fn repeated_alert_within_window_is_suppressed_once() {
    init_test_logging();
    let generator = SignalGenerator::new(SignalConfig::default());
    let classifier = AlertClassifier::new(AlertConfig::default());
    let cooler = DeduplicationCooler::new(CooldownConfig::default());

    let candidate = generator
        .generate(&uptrend_snapshot("ETHUSDT", 80))
        .unwrap()
        .into_iter()
        .next()
        .expect("trend candidate");
    let alert = classifier.classify(&candidate).unwrap();
    assert_eq!(alert.level, AlertLevel::Fired);

    let now = Utc::now();
    let first = cooler.decide_at(&alert, now);
    let second = cooler.decide_at(&alert, now + Duration::seconds(45));

    assert!(first.is_allowed());
    assert!(!second.is_allowed());
    assert!(matches!(
        second,
        alerting::Decision::Suppress(SuppressReason::Cooldown { .. })
    ));
    assert_eq!(cooler.notification_count("ETHUSDT"), 1);
}

#[tokio::test]
async fn one_failed_fetch_does_not_block_the_batch() {
    init_test_logging();
    let source = ScriptedSource::new()
        .with(uptrend_snapshot("BTCUSDT", 80))
        .with(uptrend_snapshot("ETHUSDT", 80))
        .with(uptrend_snapshot("SOLUSDT", 80))
        .with(uptrend_snapshot("BNBUSDT", 80));
    let harness = PipelineHarness::start(source).await;

    let report = harness
        .orchestrator
        .run_cycle(&symbols(&[
            "BTCUSDT", "ETHUSDT", "XRPUSDT", "SOLUSDT", "BNBUSDT",
        ]))
        .await;

    assert_eq!(report.instruments_attempted, 5);
    assert_eq!(report.instruments_succeeded, 4);
    assert_eq!(report.instruments_failed, 1);
    assert_eq!(report.alerts_emitted, 4);
    assert_eq!(report.stage_errors, 0);

    let stored = harness.orchestrator.snapshot_store().list(10).await.unwrap();
    assert_eq!(stored.len(), 4);
    assert!(stored.iter().all(|s| s.symbol != "XRPUSDT"));

    harness.orchestrator.shutdown().await;
    let subjects = harness.transport.subjects();
    assert_eq!(subjects.len(), 4);
    assert!(subjects.iter().all(|s| s.starts_with("[FIRED]")));
    assert!(!subjects.iter().any(|s| s.contains("XRPUSDT")));
}

#[tokio::test]
async fn short_history_produces_nothing_and_no_error() {
    init_test_logging();
    let generator = SignalGenerator::new(SignalConfig::default());
    assert!(generator
        .generate(&short_history_snapshot("ADAUSDT"))
        .unwrap()
        .is_empty());

    let harness =
        PipelineHarness::start(ScriptedSource::new().with(short_history_snapshot("ADAUSDT")))
            .await;
    let report = harness
        .orchestrator
        .run_cycle(&symbols(&["ADAUSDT"]))
        .await;

    assert_eq!(report.instruments_succeeded, 1);
    assert_eq!(report.opportunities_found, 0);
    assert_eq!(report.alerts_classified, 0);
    assert_eq!(report.alerts_emitted, 0);
    assert_eq!(report.stage_errors, 0);

    harness.orchestrator.shutdown().await;
    assert!(harness.transport.subjects().is_empty());
}

#[tokio::test]
async fn subscribers_receive_alert_and_cycle_events() {
    init_test_logging();
    let harness =
        PipelineHarness::start(ScriptedSource::new().with(uptrend_snapshot("BTCUSDT", 80))).await;
    let (_id, mut events) = harness.hub.subscribe().await;

    harness
        .orchestrator
        .run_cycle(&symbols(&["BTCUSDT"]))
        .await;

    let alert = events.recv().await.expect("alert event");
    assert_eq!(alert["type"], "alert");
    let report = events.recv().await.expect("cycle event");
    assert_eq!(report["type"], "cycle_report");

    harness.orchestrator.shutdown().await;
}
