//! Sweep reports
//!
//! Audit record of one sweep run, written as pretty JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::Result;
use crate::sweep::{BatchSummary, SweepEvent, SweepRequest};

/// Audit record for a completed sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    /// Unique batch ID
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Base58 destination account
    pub destination: String,
    pub summary: BatchSummary,
    pub events: Vec<SweepEvent>,
}

impl SweepReport {
    pub fn new(
        request: &SweepRequest,
        started_at: DateTime<Utc>,
        summary: BatchSummary,
        events: Vec<SweepEvent>,
    ) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            started_at,
            finished_at: Utc::now(),
            destination: request.destination.to_string(),
            summary,
            events,
        }
    }

    /// Default file name inside the report directory
    pub fn default_path(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(format!(
            "sweep-{}-{}.json",
            self.started_at.format("%Y%m%dT%H%M%SZ"),
            self.batch_id
        ))
    }

    /// Write the report, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
