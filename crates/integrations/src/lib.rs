//! Outbound integrations — best-effort webhook notification of submitted
//! leads to an external automation endpoint.

pub mod webhook;

pub use webhook::{HttpTransport, WebhookDispatcher, WebhookTransport};
