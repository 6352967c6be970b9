use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Overall phase of the demo run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Running,
    Completed,
}

/// Describes a single valid phase transition for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: RunPhase,
    pub to: RunPhase,
    pub trigger: String,
}

/// Guards the run lifecycle by enforcing a finite set of valid phase
/// transitions.
#[derive(Debug, Clone)]
pub struct RunStateMachine {
    pub phase: RunPhase,
    pub transitions: Vec<PhaseTransition>,
}

impl RunStateMachine {
    /// Creates a new state machine starting in `Idle` with all valid
    /// transitions pre-configured.
    pub fn new() -> Self {
        let transitions = vec![
            PhaseTransition {
                from: RunPhase::Idle,
                to: RunPhase::Running,
                trigger: "start".to_string(),
            },
            PhaseTransition {
                from: RunPhase::Running,
                to: RunPhase::Completed,
                trigger: "timeline_complete".to_string(),
            },
            PhaseTransition {
                from: RunPhase::Completed,
                to: RunPhase::Idle,
                trigger: "reset".to_string(),
            },
            // A user may abandon a demo run before the timeline finishes.
            PhaseTransition {
                from: RunPhase::Running,
                to: RunPhase::Idle,
                trigger: "abandon".to_string(),
            },
        ];

        Self {
            phase: RunPhase::Idle,
            transitions,
        }
    }

    /// Returns `true` if the given transition is allowed.
    pub fn can_transition(&self, from: RunPhase, to: RunPhase) -> bool {
        self.transitions
            .iter()
            .any(|t| t.from == from && t.to == to)
    }

    /// Attempts to move the state machine to `to`. Returns an error if the
    /// transition is not permitted.
    pub fn transition(&mut self, to: RunPhase) -> Result<()> {
        if self.can_transition(self.phase, to) {
            self.phase = to;
            Ok(())
        } else {
            Err(anyhow!(
                "Invalid phase transition from {:?} to {:?}",
                self.phase,
                to
            ))
        }
    }
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
