//! End-to-end test harness for Sentinel
//!
//! Builds the real pipeline around scripted market data and a recording email
//! transport so scenarios can run whole cycles without touching the network.

pub mod fixtures;
pub mod harness;

pub use fixtures::{breakout_snapshot, short_history_snapshot, uptrend_snapshot, SnapshotBuilder};
pub use harness::{init_test_logging, PipelineHarness, RecordingTransport, ScriptedSource};
