// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::audit::AuditRecord;
use super::{BaseAuditLedger, BaseOracle};

// =============================================================================
// Mock Oracle
// =============================================================================

enum QueuedAnswer {
    Text(String),
    Error(String),
    Stall(Duration, String),
}

pub struct MockOracle {
    responses: Arc<Mutex<Vec<QueuedAnswer>>>,
    calls: Arc<Mutex<Vec<String>>>,
    call_times: Arc<Mutex<Vec<Instant>>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            call_times: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a raw text response to the queue
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(QueuedAnswer::Text(response.into()));
        self
    }

    /// Add a JSON response to the queue (will be serialized)
    pub fn with_json_response<T: serde::Serialize>(self, data: &T) -> Self {
        let json = serde_json::to_string(data).expect("Failed to serialize mock response");
        self.with_response(json)
    }

    /// Add a transport failure to the queue
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(QueuedAnswer::Error(message.into()));
        self
    }

    /// Add a response that only arrives after `delay`
    pub fn with_stalled_response(self, delay: Duration, response: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(QueuedAnswer::Stall(delay, response.into()));
        self
    }

    /// Get all prompts that were sent to the oracle
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Get the instant of every call, in order
    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }

    /// Get the last prompt sent to the oracle
    pub fn last_prompt(&self) -> Option<String> {
        self.calls.lock().unwrap().last().cloned()
    }

    /// Check if a prompt containing the given text was sent
    pub fn was_called_with(&self, text: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|p| p.contains(text))
    }

    /// Get the number of times the oracle was called
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseOracle for MockOracle {
    async fn generate_json(&self, prompt: &str) -> Result<String> {
        // Record the call
        self.calls.lock().unwrap().push(prompt.to_string());
        self.call_times.lock().unwrap().push(Instant::now());

        let next = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                None
            } else {
                Some(responses.remove(0))
            }
        };

        match next {
            Some(QueuedAnswer::Text(text)) => Ok(text),
            Some(QueuedAnswer::Error(message)) => Err(anyhow::anyhow!(message)),
            Some(QueuedAnswer::Stall(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            None => Err(anyhow::anyhow!("MockOracle has no queued response")),
        }
    }
}

// =============================================================================
// Mock Audit Ledger
// =============================================================================

pub struct MockAuditLedger {
    records: Arc<Mutex<Vec<AuditRecord>>>,
    failures_left: AtomicUsize,
}

impl MockAuditLedger {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            failures_left: AtomicUsize::new(0),
        }
    }

    /// Fail the first `n` appends
    pub fn failing_first(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// Get all records appended so far
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Poll until at least `count` records arrived or `timeout` elapsed
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<AuditRecord> {
        let deadline = Instant::now() + timeout;
        loop {
            let records = self.records();
            if records.len() >= count || Instant::now() >= deadline {
                return records;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Default for MockAuditLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAuditLedger for MockAuditLedger {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            anyhow::bail!("MockAuditLedger configured to fail");
        }

        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Bundle of mocks with handles kept for assertions
pub struct TestDependencies {
    pub oracle: Arc<MockOracle>,
    pub audit_ledger: Arc<MockAuditLedger>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            oracle: Arc::new(MockOracle::new()),
            audit_ledger: Arc::new(MockAuditLedger::new()),
        }
    }

    /// Set a mock oracle
    pub fn mock_oracle(mut self, oracle: MockOracle) -> Self {
        self.oracle = Arc::new(oracle);
        self
    }

    /// Set a mock audit ledger
    pub fn mock_audit_ledger(mut self, ledger: MockAuditLedger) -> Self {
        self.audit_ledger = Arc::new(ledger);
        self
    }

    /// Convert into ServerDeps with a live audit worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn into_server_deps(self) -> super::ServerDeps {
        super::ServerDeps::new(
            self.oracle,
            super::AuditRecorder::spawn(self.audit_ledger, 64),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
