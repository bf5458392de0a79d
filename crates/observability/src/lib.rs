//! Tracing setup and the append-only audit trail (shared setup).

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Audit trail of service activity (JSON lines).
pub mod audit;

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use audit::{AuditError, AuditEvent, AuditLevel, AuditSink, InMemoryAuditSink, JsonlAuditLog};
