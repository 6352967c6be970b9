//! Dispatcher seam — modules accept an `Arc<dyn LeadDispatcher>` so the
//! pipeline can run with or without a wired automation endpoint.

use std::sync::Arc;

use uuid::Uuid;

use crate::log_stream::LogSink;
use crate::types::LeadForm;

/// Best-effort outbound notification of a submitted lead.
///
/// Implementations must never block the caller and never fail the run:
/// whatever happens on the wire is reported only through `sink` (which drops
/// entries from stale runs) or swallowed after tracing.
pub trait LeadDispatcher: Send + Sync {
    fn dispatch(&self, lead: &LeadForm, run: Uuid, sink: Arc<dyn LogSink>);
}

/// Dispatcher that skips notification entirely (engine default).
pub struct NoOpDispatcher;

impl LeadDispatcher for NoOpDispatcher {
    fn dispatch(&self, lead: &LeadForm, run: Uuid, _sink: Arc<dyn LogSink>) {
        tracing::debug!(%run, email = %lead.email, "Lead dispatch skipped, no dispatcher wired");
    }
}

/// Convenience: create a no-op dispatcher.
pub fn noop_dispatcher() -> Arc<dyn LeadDispatcher> {
    Arc::new(NoOpDispatcher)
}
