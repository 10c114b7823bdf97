//! Server dependencies for the intent router (using traits for testability)
//!
//! This module provides the central dependency container handed to the router.
//! All external services use trait abstractions to enable testing.

use std::sync::Arc;

use super::{AuditRecorder, BaseOracle};

// =============================================================================
// ServerDeps
// =============================================================================

/// External collaborators the router talks to
#[derive(Clone)]
pub struct ServerDeps {
    /// External reasoning service. The router wraps it with the throttle
    /// and retry discipline; implementations stay dumb.
    pub oracle: Arc<dyn BaseOracle>,
    /// Fire-and-forget question ledger
    pub audit: AuditRecorder,
}

impl ServerDeps {
    pub fn new(oracle: Arc<dyn BaseOracle>, audit: AuditRecorder) -> Self {
        Self { oracle, audit }
    }
}
