//! One-file-per-snapshot JSON store
//!
//! Each [`DataSnapshot`] lives at `<dir>/<id>.json` and is written through a temp file
//! plus rename so readers never see a partial document. Retention runs in a spawned
//! task after every save and tolerates files disappearing under it.

use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use config::SnapshotConfig;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, info, warn};
use types::{CandidateOpportunity, DataSnapshot, MarketSnapshot, SnapshotStats, TechnicalSummary};
use uuid::Uuid;

const EXTENSION: &str = "json";
const TEMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Clone)]
struct StoredFile {
    path: PathBuf,
    name: String,
    modified: SystemTime,
    size: u64,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    max_count: usize,
    max_age: Duration,
}

impl SnapshotStore {
    /// Open the store, creating the directory if needed
    pub async fn open(config: &SnapshotConfig) -> Result<Self> {
        fs::create_dir_all(&config.dir)
            .await
            .map_err(|e| StoreError::io(&config.dir, e))?;

        info!(dir = ?config.dir, max_count = config.max_count, "Snapshot store ready");
        Ok(Self {
            dir: config.dir.clone(),
            max_count: config.max_count,
            max_age: config.max_age(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist the market context behind one opportunity, returning the new id
    pub async fn save(
        &self,
        opportunity: &CandidateOpportunity,
        market: &MarketSnapshot,
        analysis: &TechnicalSummary,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at
            + chrono::Duration::from_std(self.max_age).unwrap_or_else(|_| chrono::Duration::days(1));

        let snapshot = DataSnapshot {
            id: id.clone(),
            created_at,
            symbol: opportunity.symbol.clone(),
            market: market.clone(),
            analysis: analysis.clone(),
            opportunities: vec![opportunity.clone()],
            expires_at,
        };
        let body = serde_json::to_vec_pretty(&snapshot)?;

        let path = self.path_for(&id);
        let temp = self.dir.join(format!("{id}.{EXTENSION}{TEMP_SUFFIX}"));
        fs::write(&temp, &body)
            .await
            .map_err(|e| StoreError::io(&temp, e))?;
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(StoreError::io(&path, e));
        }

        debug!(id = %id, symbol = %snapshot.symbol, bytes = body.len(), "Snapshot saved");

        let store = self.clone();
        tokio::spawn(async move {
            store.cleanup().await;
        });

        Ok(id)
    }

    /// Load a snapshot; malformed ids, missing and unreadable files all yield `None`
    pub async fn get(&self, id: &str) -> Option<DataSnapshot> {
        if Uuid::parse_str(id).is_err() {
            debug!(id, "Rejected malformed snapshot id");
            return None;
        }

        let path = self.path_for(id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(id, error = %e, "Snapshot unreadable");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(id, error = %e, "Snapshot corrupt");
                None
            }
        }
    }

    /// Newest-first by creation time, at most `limit`
    pub async fn list(&self, limit: usize) -> Result<Vec<DataSnapshot>> {
        let files = self.stored_files().await?;

        let mut snapshots = Vec::with_capacity(files.len());
        for file in files {
            match fs::read(&file.path).await {
                Ok(bytes) => match serde_json::from_slice::<DataSnapshot>(&bytes) {
                    Ok(snapshot) => snapshots.push(snapshot),
                    Err(e) => warn!(file = %file.name, error = %e, "Skipping corrupt snapshot"),
                },
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(file = %file.name, error = %e, "Skipping unreadable snapshot"),
            }
        }

        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        snapshots.truncate(limit);
        Ok(snapshots)
    }

    pub async fn stats(&self) -> Result<SnapshotStats> {
        let files = self.stored_files().await?;
        let times = || files.iter().map(|f| DateTime::<Utc>::from(f.modified));

        Ok(SnapshotStats {
            count: files.len(),
            total_bytes: files.iter().map(|f| f.size).sum(),
            oldest: times().min(),
            newest: times().max(),
        })
    }

    /// Delete the oldest files beyond the count limit, returning how many were removed
    pub async fn enforce_count_limit(&self) -> Result<usize> {
        let mut files = self.stored_files().await?;
        if files.len() <= self.max_count {
            return Ok(0);
        }

        files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)));
        let excess = files.len() - self.max_count;

        let mut removed = 0;
        for file in files.into_iter().take(excess) {
            if remove_if_present(&file.path).await? {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, limit = self.max_count, "Enforced snapshot count limit");
        }
        Ok(removed)
    }

    pub async fn sweep_expired(&self) -> Result<usize> {
        self.sweep_expired_at(SystemTime::now()).await
    }

    /// Delete files whose modification time is older than the retention age
    pub async fn sweep_expired_at(&self, now: SystemTime) -> Result<usize> {
        let files = self.stored_files().await?;

        let mut removed = 0;
        for file in files {
            let age = now.duration_since(file.modified).unwrap_or(Duration::ZERO);
            if age > self.max_age && remove_if_present(&file.path).await? {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, "Swept expired snapshots");
        }
        Ok(removed)
    }

    async fn cleanup(&self) {
        if let Err(e) = self.enforce_count_limit().await {
            warn!(error = %e, "Snapshot count retention failed");
        }
        if let Err(e) = self.sweep_expired().await {
            warn!(error = %e, "Snapshot age retention failed");
        }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }

    /// Completed snapshot files; entries that vanish mid-listing are skipped
    async fn stored_files(&self) -> Result<Vec<StoredFile>> {
        let mut dir = fs::read_dir(&self.dir)
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?;

        let mut files = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::io(&path, e)),
            };
            let modified = metadata.modified().map_err(|e| StoreError::io(&path, e))?;

            files.push(StoredFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                path,
                modified,
                size: metadata.len(),
            });
        }

        Ok(files)
    }
}

/// Returns false when the file was already gone
async fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::io(path, e)),
    }
}
