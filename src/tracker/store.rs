use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

use super::record::WorkflowRecord;

/// A path waiting for an approval decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingApproval {
    pub path: String,
    pub queued_at: DateTime<Utc>,
    /// Record status version when queued.
    pub status_version: usize,
}

/// Durable storage for workflow records and the pending-approval queue.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load(&self, path: &str) -> Result<Option<WorkflowRecord>, StoreError>;
    async fn save(&self, record: &WorkflowRecord) -> Result<(), StoreError>;
    /// All records, sorted by path.
    async fn list(&self) -> Result<Vec<WorkflowRecord>, StoreError>;
    async fn load_pending(&self) -> Result<Vec<PendingApproval>, StoreError>;
    async fn save_pending(&self, queue: &[PendingApproval]) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryRecordStore {
    records: tokio::sync::RwLock<HashMap<String, WorkflowRecord>>,
    pending: tokio::sync::RwLock<Vec<PendingApproval>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn load(&self, path: &str) -> Result<Option<WorkflowRecord>, StoreError> {
        Ok(self.records.read().await.get(path).cloned())
    }

    async fn save(&self, record: &WorkflowRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(record.path.clone(), record.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<WorkflowRecord>, StoreError> {
        let mut records: Vec<WorkflowRecord> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(records)
    }

    async fn load_pending(&self) -> Result<Vec<PendingApproval>, StoreError> {
        Ok(self.pending.read().await.clone())
    }

    async fn save_pending(&self, queue: &[PendingApproval]) -> Result<(), StoreError> {
        *self.pending.write().await = queue.to_vec();
        Ok(())
    }
}

const RECORDS_DIR: &str = "records";
const PENDING_FILE: &str = "pending.json";

/// One JSON document per record under `<dir>/records`, plus `<dir>/pending.json`.
pub struct FileRecordStore {
    dir: PathBuf,
}

impl FileRecordStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(dir.join(RECORDS_DIR)).map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, path: &str) -> PathBuf {
        self.dir.join(RECORDS_DIR).join(format!("{}.json", encode_file_name(path)))
    }

    async fn write_atomic(&self, target: &Path, bytes: Vec<u8>) -> Result<(), StoreError> {
        let tmp = target.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        tokio::fs::rename(&tmp, target)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn load(&self, path: &str) -> Result<Option<WorkflowRecord>, StoreError> {
        let file = self.path_for(path);
        let bytes = match tokio::fs::read(&file).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Storage(e.to_string())),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Corrupted(format!("{}: {}", file.display(), e)))
    }

    async fn save(&self, record: &WorkflowRecord) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec_pretty(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.write_atomic(&self.path_for(&record.path), bytes).await
    }

    async fn list(&self) -> Result<Vec<WorkflowRecord>, StoreError> {
        let mut entries = tokio::fs::read_dir(self.dir.join(RECORDS_DIR))
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?
        {
            let file = entry.path();
            if file.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&file)
                .await
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            let record: WorkflowRecord = serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Corrupted(format!("{}: {}", file.display(), e)))?;
            records.push(record);
        }
        records.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(records)
    }

    async fn load_pending(&self) -> Result<Vec<PendingApproval>, StoreError> {
        let file = self.dir.join(PENDING_FILE);
        let bytes = match tokio::fs::read(&file).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Storage(e.to_string())),
        };
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupted(format!("{}: {}", file.display(), e)))
    }

    async fn save_pending(&self, queue: &[PendingApproval]) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec_pretty(queue).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.write_atomic(&self.dir.join(PENDING_FILE), bytes).await
    }
}

/// File-system safe name for a node path. Unsafe bytes become `%XX`.
fn encode_file_name(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'-' | b'_' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
