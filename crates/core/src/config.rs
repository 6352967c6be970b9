use serde::Deserialize;

/// Root engine configuration. Loaded from environment variables with the
/// prefix `QUERETARO__` and overridable from the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub campaign: CampaignConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// Fixed campaign metadata merged into every outbound lead payload and the
/// protocol banner.
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignConfig {
    #[serde(default = "default_campaign")]
    pub campaign: String,
    #[serde(default = "default_country_context")]
    pub country_context: String,
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_protocol_name")]
    pub protocol_name: String,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
}

/// Outbound notification settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Automation endpoint receiving the lead payload. Absent or non-http
    /// values switch the dispatcher into simulation mode.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// When set, the delivery entry is appended only after the endpoint
    /// confirms the POST, instead of optimistically on send.
    #[serde(default)]
    pub require_confirmation: bool,
    #[serde(default = "default_simulation_notice_delay_ms")]
    pub simulation_notice_delay_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

// Default functions
fn default_campaign() -> String {
    "Querétaro 2025".to_string()
}
fn default_country_context() -> String {
    "España".to_string()
}
fn default_origin() -> String {
    "Madrid".to_string()
}
fn default_protocol_name() -> String {
    "México Comienza Aquí".to_string()
}
fn default_protocol_version() -> String {
    "2.5".to_string()
}
fn default_simulation_notice_delay_ms() -> u64 {
    500
}
fn default_request_timeout_ms() -> u64 {
    5000
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            campaign: default_campaign(),
            country_context: default_country_context(),
            origin: default_origin(),
            protocol_name: default_protocol_name(),
            protocol_version: default_protocol_version(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            require_confirmation: false,
            simulation_notice_delay_ms: default_simulation_notice_delay_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            campaign: CampaignConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("QUERETARO")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campaign_defaults_match_wire_constants() {
        let config = CampaignConfig::default();
        assert_eq!(config.campaign, "Querétaro 2025");
        assert_eq!(config.country_context, "España");
        assert_eq!(config.origin, "Madrid");
    }

    #[test]
    fn test_webhook_defaults_to_simulation_mode() {
        let config = WebhookConfig::default();
        assert!(config.endpoint.is_none());
        assert!(!config.require_confirmation);
        assert_eq!(config.simulation_notice_delay_ms, 500);
    }
}
