//! Queued alert delivery
//!
//! `deliver` never waits on the network: alerts go onto an unbounded FIFO and a single
//! worker sends them one at a time with a fixed pause between messages. A failed send
//! is logged and counted, never retried.

use crate::error::{NotifyError, Result};
use crate::format;
use crate::traits::EmailTransport;
use config::NotificationConfig;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use types::ClassifiedAlert;

#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub enabled: bool,
    pub recipients: Vec<String>,
    pub inter_message_delay: Duration,
    pub snapshot_base_url: Option<String>,
}

impl From<&NotificationConfig> for DispatcherSettings {
    fn from(config: &NotificationConfig) -> Self {
        Self {
            enabled: config.enabled,
            recipients: config.recipients.clone(),
            inter_message_delay: config.inter_message_delay(),
            snapshot_base_url: config.snapshot_base_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub queued: u64,
    pub delivered: u64,
    pub failed: u64,
    /// Accepted while delivery was disabled
    pub skipped: u64,
}

impl DispatchStats {
    pub fn pending(&self) -> u64 {
        self.queued.saturating_sub(self.delivered + self.failed)
    }
}

#[derive(Default)]
struct Counters {
    queued: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

pub struct NotificationDispatcher {
    sender: Mutex<Option<mpsc::UnboundedSender<ClassifiedAlert>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    transport: Arc<dyn EmailTransport>,
    settings: Arc<DispatcherSettings>,
    counters: Arc<Counters>,
}

impl NotificationDispatcher {
    /// Spawn the delivery worker; must be called inside a tokio runtime
    pub fn start(settings: DispatcherSettings, transport: Arc<dyn EmailTransport>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let settings = Arc::new(settings);
        let counters = Arc::new(Counters::default());

        if settings.enabled && settings.recipients.is_empty() {
            warn!("Notifications enabled without recipients, every send will fail");
        }

        let worker = tokio::spawn(run_worker(
            rx,
            Arc::clone(&transport),
            Arc::clone(&settings),
            Arc::clone(&counters),
        ));

        Self {
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            transport,
            settings,
            counters,
        }
    }

    /// Queue an alert for delivery
    pub fn deliver(&self, alert: ClassifiedAlert) -> Result<()> {
        if !self.settings.enabled {
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            debug!(symbol = alert.symbol(), "Notifications disabled, alert not queued");
            return Ok(());
        }

        let sender = self.sender.lock();
        let tx = sender.as_ref().ok_or(NotifyError::QueueClosed)?;
        tx.send(alert).map_err(|_| NotifyError::QueueClosed)?;
        self.counters.queued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub async fn test_connectivity(&self) -> bool {
        self.transport.test_connectivity().await
    }

    /// Send a fixed test message straight through the transport, bypassing the queue
    pub async fn send_test_notification(&self) -> Result<()> {
        if self.settings.recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }
        self.transport
            .send_email(
                &self.settings.recipients,
                "[TEST] Sentinel notification check",
                "<p>This is a test notification from Sentinel.</p>",
            )
            .await?;
        info!(recipients = self.settings.recipients.len(), "Test notification sent");
        Ok(())
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            queued: self.counters.queued.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
        }
    }

    /// Close the queue and wait for everything already queued to be sent
    pub async fn shutdown(&self) {
        self.sender.lock().take();
        let worker = self.worker.lock().take();

        if let Some(worker) = worker {
            let pending = self.stats().pending();
            info!(pending, "Draining notification queue");
            if let Err(e) = worker.await {
                warn!(error = %e, "Notification worker ended abnormally");
            }
        }
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<ClassifiedAlert>,
    transport: Arc<dyn EmailTransport>,
    settings: Arc<DispatcherSettings>,
    counters: Arc<Counters>,
) {
    while let Some(alert) = rx.recv().await {
        let subject = format::subject(&alert);
        let html = format::html_body(&alert, settings.snapshot_base_url.as_deref());

        match transport
            .send_email(&settings.recipients, &subject, &html)
            .await
        {
            Ok(()) => {
                counters.delivered.fetch_add(1, Ordering::Relaxed);
                info!(%subject, "📧 Notification sent");
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(%subject, error = %e, "Notification failed");
            }
        }

        tokio::time::sleep(settings.inter_message_delay).await;
    }
    debug!("Notification worker stopped");
}
