//! Pipeline harness with scripted collaborators

use async_trait::async_trait;
use config::AppConfig;
use market_adapter::{AdapterError, MarketDataSource};
use notifications::{DispatcherSettings, EmailTransport, NotificationDispatcher, SubscriberHub};
use orchestrator::{CycleOrchestrator, OrchestratorParts};
use parking_lot::Mutex;
use state::SnapshotStore;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use types::MarketSnapshot;

/// Serves fixed snapshots; unknown symbols fail like an unreachable exchange
#[derive(Default)]
pub struct ScriptedSource {
    snapshots: HashMap<String, MarketSnapshot>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, snapshot: MarketSnapshot) -> Self {
        self.snapshots.insert(snapshot.symbol.clone(), snapshot);
        self
    }
}

#[async_trait]
impl MarketDataSource for ScriptedSource {
    async fn fetch(&self, symbol: &str) -> market_adapter::Result<MarketSnapshot> {
        self.snapshots
            .get(symbol)
            .cloned()
            .ok_or(AdapterError::Timeout {
                endpoint: "ticker",
                timeout_ms: 10_000,
            })
    }

    async fn ping(&self) -> market_adapter::Result<()> {
        Ok(())
    }
}

/// Captures every email subject in send order
#[derive(Default)]
pub struct RecordingTransport {
    subjects: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub fn subjects(&self) -> Vec<String> {
        self.subjects.lock().clone()
    }
}

#[async_trait]
impl EmailTransport for RecordingTransport {
    async fn send_email(
        &self,
        _to: &[String],
        subject: &str,
        _html: &str,
    ) -> notifications::Result<()> {
        self.subjects.lock().push(subject.to_string());
        Ok(())
    }

    async fn test_connectivity(&self) -> bool {
        true
    }
}

pub struct PipelineHarness {
    pub orchestrator: CycleOrchestrator,
    pub transport: Arc<RecordingTransport>,
    pub hub: Arc<SubscriberHub>,
    _snapshot_dir: TempDir,
}

impl PipelineHarness {
    /// Real pipeline stages with fast pacing and a temporary snapshot directory
    pub async fn start(source: ScriptedSource) -> Self {
        let snapshot_dir = TempDir::new().expect("temp dir");

        let mut config = AppConfig::default();
        config.snapshots.dir = snapshot_dir.path().to_path_buf();
        config.monitoring.batch_size = 5;
        config.monitoring.batch_delay_ms = 0;
        config.notifications.recipients = vec!["desk@example.com".to_string()];
        config.notifications.inter_message_delay_ms = 1;

        let transport = Arc::new(RecordingTransport::default());
        let hub = Arc::new(SubscriberHub::new());
        let dispatcher = NotificationDispatcher::start(
            DispatcherSettings::from(&config.notifications),
            transport.clone(),
        );
        let store = SnapshotStore::open(&config.snapshots)
            .await
            .expect("snapshot store");

        let orchestrator = CycleOrchestrator::new(
            &config,
            OrchestratorParts {
                source: Arc::new(source),
                store,
                dispatcher,
                broadcaster: hub.clone(),
                request_tracker: None,
            },
        );

        Self {
            orchestrator,
            transport,
            hub,
            _snapshot_dir: snapshot_dir,
        }
    }
}

/// Route pipeline logs to the test writer; safe to call from every test
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
