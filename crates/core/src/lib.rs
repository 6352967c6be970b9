//! Shared types, configuration, and seams for the Querétaro lead-pipeline
//! demo engine.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod log_stream;
pub mod types;

pub use config::AppConfig;
pub use dispatch::LeadDispatcher;
pub use error::{EngineError, EngineResult};
pub use log_stream::{LogSink, LogStream};
