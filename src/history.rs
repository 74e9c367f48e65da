//! Resolution history
//!
//! Appends one JSON line per resolution to `history.log` in the state
//! directory, tagged with the invocation id. The cache store only keeps the
//! final outcome; this log records when and how each commit got there.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

/// File-based history log that appends JSON lines
pub struct HistoryLog {
    enabled: bool,
    path: PathBuf,
    invocation: Uuid,
}

impl HistoryLog {
    /// Create a history log for one invocation
    pub fn new(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            enabled,
            path: path.into(),
            invocation: Uuid::new_v4(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Id shared by every event of this invocation
    pub fn invocation(&self) -> Uuid {
        self.invocation
    }

    /// Append an event as a JSON line
    ///
    /// IO failures are logged and dropped; the history must never fail a
    /// build.
    pub async fn log(&self, event: &str, data: &serde_json::Value) {
        if !self.enabled {
            return;
        }

        let entry = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "invocation": self.invocation,
            "event": event,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize history event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write history log {}: {}", self.path.display(), e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
