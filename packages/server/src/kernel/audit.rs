//! Fire-and-forget question ledger.
//!
//! Resolutions are pushed onto a bounded queue and written by one background
//! task. The request path only ever calls `try_send`: when the queue is full
//! the new record is dropped, so a slow ledger can never hold up a visitor.
//!
//! Records still queued at shutdown are lost. Each record is written with a
//! single append of one complete line, so the ledger never holds a torn row.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use super::BaseAuditLedger;

/// One row of the question ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub year: i32,
    pub question: String,
    pub resolved_url: String,
}

impl AuditRecord {
    pub fn now(year: i32, question: impl Into<String>, resolved_url: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            year,
            question: question.into(),
            resolved_url: resolved_url.into(),
        }
    }
}

/// Handle used by the router to submit records.
///
/// Cloneable; all clones feed the same worker.
#[derive(Clone)]
pub struct AuditRecorder {
    tx: Option<mpsc::Sender<AuditRecord>>,
}

impl AuditRecorder {
    /// Spawn the background worker draining into `ledger`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(ledger: Arc<dyn BaseAuditLedger>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<AuditRecord>(capacity.max(1));

        tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                if let Err(e) = ledger.append(&record).await {
                    tracing::error!(
                        error = %e,
                        year = record.year,
                        question = %record.question,
                        "Failed to append audit record"
                    );
                }
            }
            tracing::debug!("Audit worker stopped");
        });

        Self { tx: Some(tx) }
    }

    /// A recorder that discards everything (test/CI configuration).
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue a record without waiting. Never fails the caller.
    pub fn record(&self, year: i32, question: &str, resolved_url: &str) {
        let Some(tx) = &self.tx else {
            return;
        };

        match tx.try_send(AuditRecord::now(year, question, resolved_url)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(record)) => {
                tracing::warn!(
                    year = record.year,
                    question = %record.question,
                    "Audit queue full, dropping record"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("Audit worker has stopped, dropping record");
            }
        }
    }
}

// =============================================================================
// Ledgers
// =============================================================================

/// Append-only JSON lines file.
pub struct JsonlAuditLedger {
    path: PathBuf,
}

impl JsonlAuditLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl BaseAuditLedger for JsonlAuditLedger {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        let mut line = serde_json::to_string(record).context("Failed to serialize audit record")?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open audit ledger {}", self.path.display()))?;

        file.write_all(line.as_bytes())
            .await
            .context("Failed to write audit record")?;
        file.flush().await.context("Failed to flush audit ledger")?;

        Ok(())
    }
}

/// Ledger that accepts and forgets.
pub struct NoopAuditLedger;

#[async_trait]
impl BaseAuditLedger for NoopAuditLedger {
    async fn append(&self, _record: &AuditRecord) -> Result<()> {
        Ok(())
    }
}
