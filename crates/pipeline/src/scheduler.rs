//! Discrete-event scheduler that walks the timeline for one run.

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::engine::PipelineEngine;
use crate::schedule::Timeline;

/// Fires each timeline entry `delay` after `begin`, in ascending-delay
/// order (stable on ties), from one cooperative task. The engine's per-run
/// guard makes any late firing from a cancelled run a no-op.
pub struct TimelineScheduler {
    timeline: Timeline,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl TimelineScheduler {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            pending: Mutex::new(None),
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Arms the schedule for `run`. Callers must ensure the previous run's
    /// entries have all fired or been cancelled first.
    pub fn begin(&self, engine: PipelineEngine, run: Uuid) {
        let entries = self.timeline.in_firing_order();
        let started = Instant::now();
        let handle = tokio::spawn(async move {
            for entry in entries {
                tokio::time::sleep_until(started + entry.delay).await;
                engine.apply(run, &entry.action);
            }
            debug!(%run, "Timeline drained");
        });

        if let Some(stale) = self.pending.lock().replace(handle) {
            stale.abort();
        }
    }

    /// Invalidates all pending firings so none land after this call.
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
            debug!("Timeline cancelled");
        }
    }
}
