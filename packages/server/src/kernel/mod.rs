//! Kernel module - server infrastructure and dependencies.

pub mod audit;
pub mod deps;
pub mod gemini;
pub mod test_dependencies;
pub mod traits;

pub use audit::{AuditRecord, AuditRecorder, JsonlAuditLedger, NoopAuditLedger};
pub use deps::ServerDeps;
pub use gemini::GeminiOracle;
pub use test_dependencies::{MockAuditLedger, MockOracle, TestDependencies};
pub use traits::*;
