//! Pipeline engine — owns the run state and sequences one demo run from
//! form submission to qualification.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use queretaro_core::config::CampaignConfig;
use queretaro_core::dispatch::{noop_dispatcher, LeadDispatcher};
use queretaro_core::error::{EngineError, EngineResult};
use queretaro_core::log_stream::{LogSink, LogStream};
use queretaro_core::types::{mock_agencies, Agency, LeadForm, LogCategory, LogEntry};

use crate::schedule::{StepAction, Timeline};
use crate::scheduler::TimelineScheduler;
use crate::state_machine::{RunPhase, RunStateMachine};

/// Everything the active run owns: phase machine, frozen form, log stream,
/// and the agencies revealed so far. One aggregate behind one lock; timer
/// callbacks interleave in time but never overlap.
struct RunState {
    machine: RunStateMachine,
    form: LeadForm,
    logs: LogStream,
    agencies: Vec<Agency>,
    run_id: Option<Uuid>,
}

struct EngineInner {
    state: Mutex<RunState>,
    scheduler: TimelineScheduler,
    dispatcher: Arc<dyn LeadDispatcher>,
    directory: Vec<Agency>,
    campaign: CampaignConfig,
}

/// Top-level controller for the demo pipeline. Cheap to clone; clones share
/// the same run state.
#[derive(Clone)]
pub struct PipelineEngine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for PipelineEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("PipelineEngine")
            .field("phase", &state.machine.phase)
            .field("entries", &state.logs.len())
            .finish()
    }
}

impl PipelineEngine {
    /// Creates an engine with the standard timeline, the mock agency
    /// directory, and default campaign metadata.
    pub fn new(dispatcher: Arc<dyn LeadDispatcher>) -> Self {
        Self::with_parts(
            dispatcher,
            Timeline::standard(),
            mock_agencies(),
            CampaignConfig::default(),
        )
    }

    /// Full constructor for tests and non-default wiring.
    pub fn with_parts(
        dispatcher: Arc<dyn LeadDispatcher>,
        timeline: Timeline,
        directory: Vec<Agency>,
        campaign: CampaignConfig,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                state: Mutex::new(RunState {
                    machine: RunStateMachine::new(),
                    form: LeadForm::default(),
                    logs: LogStream::new(),
                    agencies: Vec::new(),
                    run_id: None,
                }),
                scheduler: TimelineScheduler::new(timeline),
                dispatcher,
                directory,
                campaign,
            }),
        }
    }

    // ---- Observer surface ----

    pub fn phase(&self) -> RunPhase {
        self.inner.state.lock().machine.phase
    }

    pub fn form(&self) -> LeadForm {
        self.inner.state.lock().form.clone()
    }

    /// Edits the form. Returns `false` (and leaves the form untouched)
    /// unless the engine is idle — the form is frozen during a run.
    pub fn update_form(&self, edit: impl FnOnce(&mut LeadForm)) -> bool {
        let mut state = self.inner.state.lock();
        if state.machine.phase != RunPhase::Idle {
            debug!("Form edit ignored while a run is in flight");
            return false;
        }
        edit(&mut state.form);
        true
    }

    /// Ordered snapshot of the active run's feed.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.inner.state.lock().logs.snapshot()
    }

    /// Agencies revealed so far in the active run.
    pub fn agencies(&self) -> Vec<Agency> {
        self.inner.state.lock().agencies.clone()
    }

    // ---- Run control ----

    /// Validates the form and starts a run: clears the stream, moves to
    /// `Running`, appends the protocol-start entry, fires the webhook
    /// dispatch, and arms the timeline. A call while a run is already in
    /// flight (or awaiting reset) is ignored. Must be called from within a
    /// tokio runtime.
    pub fn start(&self) -> EngineResult<()> {
        let (run, form) = {
            let mut state = self.inner.state.lock();
            match state.machine.phase {
                RunPhase::Running => {
                    debug!("Start ignored: run already in flight");
                    return Ok(());
                }
                RunPhase::Completed => {
                    debug!("Start ignored: previous run not reset");
                    return Ok(());
                }
                RunPhase::Idle => {}
            }
            if !state.form.is_valid() {
                return Err(EngineError::Validation(
                    "name, email, and postal code are required".to_string(),
                ));
            }

            let run = Uuid::new_v4();
            state.run_id = Some(run);
            state.logs.clear();
            state.agencies.clear();
            state.machine.transition(RunPhase::Running)?;
            state.logs.append(LogEntry::new(
                LogCategory::Info,
                format!(
                    "Iniciando protocolo \"{}\" v{}...",
                    self.inner.campaign.protocol_name, self.inner.campaign.protocol_version
                ),
            ));
            (run, state.form.clone())
        };

        info!(%run, email = %form.email, "Demo run started");
        metrics::counter!("pipeline.runs_started").increment(1);

        self.inner
            .dispatcher
            .dispatch(&form, run, Arc::new(self.clone()));
        self.inner.scheduler.begin(self.clone(), run);
        Ok(())
    }

    /// Abandons or acknowledges the run: cancels pending firings, clears
    /// the stream, agencies, and form, and returns to `Idle`. Safe to call
    /// repeatedly.
    pub fn reset(&self) {
        self.inner.scheduler.cancel();
        let mut state = self.inner.state.lock();
        if state.machine.phase == RunPhase::Idle {
            return;
        }
        if let Err(err) = state.machine.transition(RunPhase::Idle) {
            warn!(error = %err, "Reset refused by state machine");
            return;
        }
        state.run_id = None;
        state.logs.clear();
        state.agencies.clear();
        state.form = LeadForm::default();
        info!("Run state reset to idle");
    }

    /// Fires one timeline action for `run`. Firings from a stale run are
    /// dropped silently.
    pub(crate) fn apply(&self, run: Uuid, action: &StepAction) {
        let mut state = self.inner.state.lock();
        if state.run_id != Some(run) || state.machine.phase != RunPhase::Running {
            debug!(%run, ?action, "Dropping stray timeline firing");
            return;
        }

        if matches!(action, StepAction::RevealAgencies) {
            state.agencies = self.inner.directory.clone();
        }
        let message = action.message(&state.form, &state.agencies);
        state.logs.append(LogEntry::new(action.category(), message));

        if matches!(action, StepAction::CompleteCycle) {
            self.complete_locked(&mut state, run);
        }
    }

    /// Final-entry callback: `Running` -> `Completed`, exactly once. A late
    /// completion after an external reset is a silent no-op.
    fn complete_locked(&self, state: &mut RunState, run: Uuid) {
        match state.machine.transition(RunPhase::Completed) {
            Ok(()) => {
                info!(%run, entries = state.logs.len(), "Timeline complete, lead qualified");
                metrics::counter!("pipeline.runs_completed").increment(1);
            }
            Err(_) => debug!(%run, "Late completion dropped"),
        }
    }
}

impl Default for PipelineEngine {
    fn default() -> Self {
        Self::new(noop_dispatcher())
    }
}

impl LogSink for PipelineEngine {
    /// Run-gated append used by the dispatcher; entries for a stale run or
    /// an idle engine are dropped.
    fn append(&self, run: Uuid, category: LogCategory, message: String) {
        let mut state = self.inner.state.lock();
        if state.run_id != Some(run) || state.machine.phase != RunPhase::Running {
            debug!(%run, "Dropping sink append from stale run");
            return;
        }
        state.logs.append(LogEntry::new(category, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use queretaro_core::types::InterestCategory;

    fn sample_form() -> LeadForm {
        LeadForm {
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            phone: "+34600000000".to_string(),
            zip: "28001".to_string(),
            interest: InterestCategory::CultureGastronomy,
        }
    }

    fn filled_engine() -> PipelineEngine {
        let engine = PipelineEngine::default();
        assert!(engine.update_form(|form| *form = sample_form()));
        engine
    }

    #[tokio::test]
    async fn test_start_refuses_invalid_form() {
        let engine = PipelineEngine::default();
        engine.update_form(|form| {
            form.name = "Ana".to_string();
            form.zip = "28001".to_string();
        });

        let result = engine.start();
        assert!(matches!(result, Err(EngineError::Validation(_))));
        assert_eq!(engine.phase(), RunPhase::Idle);
        assert!(engine.logs().is_empty());
    }

    #[tokio::test]
    async fn test_start_appends_protocol_entry() {
        let engine = filled_engine();
        engine.start().unwrap();

        assert_eq!(engine.phase(), RunPhase::Running);
        let logs = engine.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].category, LogCategory::Info);
        assert!(logs[0].message.contains("México Comienza Aquí"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_run_is_deterministic() {
        let engine = filled_engine();
        engine.start().unwrap();

        tokio::time::sleep(Duration::from_millis(15_100)).await;

        assert_eq!(engine.phase(), RunPhase::Completed);
        let categories: Vec<LogCategory> =
            engine.logs().iter().map(|entry| entry.category).collect();
        assert_eq!(
            categories,
            vec![
                LogCategory::Info,
                LogCategory::Process,
                LogCategory::Process,
                LogCategory::Process,
                LogCategory::Success,
                LogCategory::AiGeneration,
                LogCategory::EmailSent,
                LogCategory::EmailSent,
                LogCategory::EmailSent,
                LogCategory::WhatsAppSent,
                LogCategory::Success,
            ]
        );
        assert_eq!(engine.agencies().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_happens_exactly_once() {
        let engine = filled_engine();
        engine.start().unwrap();

        tokio::time::sleep(Duration::from_millis(15_100)).await;
        assert_eq!(engine.phase(), RunPhase::Completed);
        let entries = engine.logs().len();

        tokio::time::sleep(Duration::from_millis(30_000)).await;
        assert_eq!(engine.phase(), RunPhase::Completed);
        assert_eq!(engine.logs().len(), entries);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_ignored_mid_run() {
        let engine = filled_engine();
        engine.start().unwrap();
        tokio::time::sleep(Duration::from_millis(2_000)).await;

        engine.start().unwrap();
        // The in-flight run keeps its stream: protocol entry + CRM step.
        assert_eq!(engine.logs().len(), 2);

        tokio::time::sleep(Duration::from_millis(14_000)).await;
        assert_eq!(engine.phase(), RunPhase::Completed);
        assert_eq!(engine.logs().len(), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_mid_run_cancels_pending_entries() {
        let engine = filled_engine();
        engine.start().unwrap();

        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(engine.logs().len(), 4);

        engine.reset();
        assert_eq!(engine.phase(), RunPhase::Idle);
        assert!(engine.logs().is_empty());

        tokio::time::sleep(Duration::from_millis(11_000)).await;
        assert_eq!(engine.phase(), RunPhase::Idle);
        assert!(engine.logs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_run_never_leaks_into_next() {
        let engine = filled_engine();
        engine.start().unwrap();
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        engine.reset();

        assert!(engine.update_form(|form| *form = sample_form()));
        engine.start().unwrap();
        tokio::time::sleep(Duration::from_millis(15_100)).await;

        assert_eq!(engine.phase(), RunPhase::Completed);
        assert_eq!(engine.logs().len(), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_is_idempotent_from_completed() {
        let engine = filled_engine();
        engine.start().unwrap();
        tokio::time::sleep(Duration::from_millis(15_100)).await;
        assert_eq!(engine.phase(), RunPhase::Completed);

        engine.reset();
        assert_eq!(engine.phase(), RunPhase::Idle);
        assert!(engine.logs().is_empty());

        engine.reset();
        assert_eq!(engine.phase(), RunPhase::Idle);
        assert!(engine.logs().is_empty());
    }

    #[tokio::test]
    async fn test_stray_firing_is_dropped() {
        let engine = filled_engine();
        engine.apply(Uuid::new_v4(), &StepAction::CrmValidate);

        assert_eq!(engine.phase(), RunPhase::Idle);
        assert!(engine.logs().is_empty());
    }

    #[tokio::test]
    async fn test_form_is_frozen_while_running() {
        let engine = filled_engine();
        engine.start().unwrap();

        assert!(!engine.update_form(|form| form.name = "Luis".to_string()));
        assert_eq!(engine.form().name, "Ana");
    }

    #[tokio::test]
    async fn test_sink_append_from_stale_run_is_dropped() {
        let engine = filled_engine();
        engine.start().unwrap();

        LogSink::append(
            &engine,
            Uuid::new_v4(),
            LogCategory::Success,
            "late webhook echo".to_string(),
        );
        assert_eq!(engine.logs().len(), 1);
    }
}
