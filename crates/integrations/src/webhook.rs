//! Webhook dispatch — fire-and-forget lead forwarding.
//!
//! The dispatcher never blocks the pipeline and never fails a run: the
//! transport outcome is observed, traced, and deliberately ignored for
//! control flow. `WebhookConfig::require_confirmation` switches to the
//! confirmation-gated variant for non-demo deployments.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use queretaro_core::config::{CampaignConfig, WebhookConfig};
use queretaro_core::dispatch::LeadDispatcher;
use queretaro_core::log_stream::LogSink;
use queretaro_core::types::{LeadForm, LogCategory};

/// JSON body POSTed to the automation endpoint: the lead merged with the
/// fixed campaign metadata.
#[derive(Debug, Clone, Serialize)]
pub struct LeadPayload {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub zip: String,
    pub interest: String,
    pub campaign: String,
    pub country_context: String,
    pub origin: String,
}

impl LeadPayload {
    pub fn new(lead: &LeadForm, campaign: &CampaignConfig) -> Self {
        Self {
            name: lead.name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            zip: lead.zip.clone(),
            interest: lead.interest.label().to_string(),
            campaign: campaign.campaign.clone(),
            country_context: campaign.country_context.clone(),
            origin: campaign.origin.clone(),
        }
    }
}

/// Transport seam for issuing the POST, mockable in tests.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// Posts `payload` as JSON and returns the HTTP status code.
    async fn post_json(&self, url: &str, payload: &serde_json::Value) -> anyhow::Result<u16>;
}

/// Production transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn post_json(&self, url: &str, payload: &serde_json::Value) -> anyhow::Result<u16> {
        let response = self.client.post(url).json(payload).send().await?;
        Ok(response.status().as_u16())
    }
}

/// Transport double that records every call and returns a scripted result.
/// Exposed so downstream integration tests can wire it.
pub struct RecordingTransport {
    outcome: Result<u16, String>,
    calls: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingTransport {
    pub fn returning(status: u16) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(status),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(message.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.lock().expect("transport mutex poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("transport mutex poisoned").len()
    }
}

#[async_trait]
impl WebhookTransport for RecordingTransport {
    async fn post_json(&self, url: &str, payload: &serde_json::Value) -> anyhow::Result<u16> {
        self.calls
            .lock()
            .expect("transport mutex poisoned")
            .push((url.to_string(), payload.clone()));
        match &self.outcome {
            Ok(status) => Ok(*status),
            Err(message) => Err(anyhow::anyhow!(message.clone())),
        }
    }
}

/// Best-effort outbound notifier for submitted leads.
pub struct WebhookDispatcher {
    config: WebhookConfig,
    campaign: CampaignConfig,
    transport: Arc<dyn WebhookTransport>,
}

impl WebhookDispatcher {
    pub fn new(
        config: WebhookConfig,
        campaign: CampaignConfig,
        transport: Arc<dyn WebhookTransport>,
    ) -> Self {
        Self {
            config,
            campaign,
            transport,
        }
    }

    /// The endpoint to notify, if one is configured and plausibly http.
    fn endpoint(&self) -> Option<&str> {
        self.config
            .endpoint
            .as_deref()
            .filter(|url| url.starts_with("http"))
    }
}

impl LeadDispatcher for WebhookDispatcher {
    fn dispatch(&self, lead: &LeadForm, run: Uuid, sink: Arc<dyn LogSink>) {
        let Some(url) = self.endpoint() else {
            debug!(%run, "No automation endpoint configured, simulation mode");
            metrics::counter!("webhook.simulated").increment(1);
            let delay = Duration::from_millis(self.config.simulation_notice_delay_ms);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                sink.append(
                    run,
                    LogCategory::Info,
                    "⚠️ MODO SIMULACIÓN: No se detectó URL de automatización válida.".to_string(),
                );
            });
            return;
        };

        let payload = match serde_json::to_value(LeadPayload::new(lead, &self.campaign)) {
            Ok(payload) => payload,
            Err(err) => {
                // Issue failures soften into a process note; the run goes on.
                warn!(%run, error = %err, "Could not build lead payload");
                sink.append(
                    run,
                    LogCategory::Process,
                    "⚠️ Nota: Envío realizado. El proceso sigue en curso.".to_string(),
                );
                return;
            }
        };

        metrics::counter!("webhook.dispatches").increment(1);
        let url = url.to_string();
        let transport = Arc::clone(&self.transport);
        let require_confirmation = self.config.require_confirmation;
        let task_sink = Arc::clone(&sink);
        tokio::spawn(async move {
            match transport.post_json(&url, &payload).await {
                Ok(status) if (200..300).contains(&status) => {
                    debug!(%run, status, "Lead delivered to automation endpoint");
                    if require_confirmation {
                        task_sink.append(
                            run,
                            LogCategory::Success,
                            "✅ ENTREGA CONFIRMADA: El endpoint de automatización aceptó el lead."
                                .to_string(),
                        );
                    }
                }
                Ok(status) => {
                    warn!(%run, status, "Automation endpoint returned non-success status");
                }
                Err(err) => {
                    warn!(%run, error = %err, "Lead delivery failed, run continues");
                }
            }
        });

        if !self.config.require_confirmation {
            // Optimistic by design: the demo reports success on send, not
            // on delivery confirmation.
            sink.append(
                run,
                LogCategory::Success,
                "✅ CONEXIÓN EXITOSA: Datos enviados al servidor de automatización.".to_string(),
            );
            sink.append(
                run,
                LogCategory::Process,
                "📡 Esperando orquestación de servicios en la nube...".to_string(),
            );
        }
    }
}
