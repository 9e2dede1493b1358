//! Audit recording with failure isolation.
//!
//! Every state transition writes an audit entry, but a failure to write
//! one must never block or fail the underlying editorial operation. The
//! recorder logs the failure and moves on.

use std::sync::Arc;

use presswire_core::AuditLogEntry;
use presswire_store::Store;

/// Writes audit entries, swallowing (but logging) storage failures.
pub struct AuditRecorder<S: Store> {
    store: Arc<S>,
}

impl<S: Store> AuditRecorder<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Append an entry. Errors are logged at warn and discarded.
    pub async fn record(&self, entry: AuditLogEntry) {
        if let Err(e) = self.store.append_audit(&entry).await {
            tracing::warn!(
                action = %entry.action,
                resource_type = %entry.resource_type,
                resource_id = %entry.resource_id,
                error = %e,
                "failed to write audit entry"
            );
        }
    }
}
