// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no routing logic.
// The intent router (domains/intent) decides what to ask and how to read the answer.
//
// Naming convention: Base* for trait names (e.g., BaseOracle, BaseAuditLedger)

use anyhow::Result;
use async_trait::async_trait;

use super::audit::AuditRecord;

// =============================================================================
// Oracle Trait (Infrastructure - external reasoning service)
// =============================================================================

#[async_trait]
pub trait BaseOracle: Send + Sync {
    /// Send a rendered instruction and return the raw text of the answer.
    ///
    /// Implementations request JSON output shaped like `{url, parameter, name}`,
    /// but callers must still validate it; the service does not always comply.
    async fn generate_json(&self, prompt: &str) -> Result<String>;
}

// =============================================================================
// Audit Ledger Trait (Infrastructure - append-only question log)
// =============================================================================

#[async_trait]
pub trait BaseAuditLedger: Send + Sync {
    /// Append one record. Never called from the request path directly;
    /// the audit worker drains a queue into this.
    async fn append(&self, record: &AuditRecord) -> Result<()>;
}
