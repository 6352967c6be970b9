//! Run orchestration — the demo pipeline's state machine, fixed event
//! timeline, and the engine that sequences one run from submission to
//! qualification.

pub mod engine;
pub mod schedule;
pub mod scheduler;
pub mod state_machine;

pub use engine::PipelineEngine;
pub use schedule::{ScheduleEntry, StepAction, Timeline};
pub use scheduler::TimelineScheduler;
pub use state_machine::{RunPhase, RunStateMachine};
