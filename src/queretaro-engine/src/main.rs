//! Querétaro Engine — scripted lead-qualification demo pipeline.
//!
//! Entry point that wires the webhook dispatcher and the pipeline engine,
//! starts one demo run, and streams the simulated backend feed to the
//! terminal.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use queretaro_core::config::AppConfig;
use queretaro_core::dispatch::{noop_dispatcher, LeadDispatcher};
use queretaro_core::types::{mock_agencies, InterestCategory, LogCategory, LogEntry};
use queretaro_integrations::{HttpTransport, WebhookDispatcher};
use queretaro_pipeline::{PipelineEngine, RunPhase, Timeline};

#[derive(Parser, Debug)]
#[command(name = "queretaro-engine")]
#[command(about = "Scripted lead-qualification demo pipeline")]
#[command(version)]
struct Cli {
    /// Lead name
    #[arg(long, default_value = "Ana Torres")]
    name: String,

    /// Lead email
    #[arg(long, default_value = "ana@ejemplo.com")]
    email: String,

    /// Lead WhatsApp number
    #[arg(long, default_value = "+34600000000")]
    phone: String,

    /// Lead postal code
    #[arg(long, default_value = "28001")]
    zip: String,

    /// Travel interest (cultura | aventura | negocios)
    #[arg(long, default_value = "cultura")]
    interest: String,

    /// Automation endpoint (overrides config)
    #[arg(long, env = "QUERETARO__WEBHOOK__ENDPOINT")]
    endpoint: Option<String>,

    /// Log delivery only after the endpoint confirms it
    #[arg(long, default_value_t = false)]
    confirm_delivery: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "queretaro_engine=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if cli.endpoint.is_some() {
        config.webhook.endpoint = cli.endpoint.clone();
    }
    if cli.confirm_delivery {
        config.webhook.require_confirmation = true;
    }

    let interest = cli.interest.parse::<InterestCategory>().unwrap_or_else(|e| {
        warn!(error = %e, "Unknown interest, using default");
        InterestCategory::default()
    });

    info!(
        endpoint = config.webhook.endpoint.as_deref().unwrap_or("<none>"),
        campaign = %config.campaign.campaign,
        "Querétaro Engine starting up"
    );

    let dispatcher: Arc<dyn LeadDispatcher> =
        match HttpTransport::new(Duration::from_millis(config.webhook.request_timeout_ms)) {
            Ok(transport) => Arc::new(WebhookDispatcher::new(
                config.webhook.clone(),
                config.campaign.clone(),
                Arc::new(transport),
            )),
            Err(err) => {
                warn!(error = %err, "HTTP transport unavailable, dispatch disabled");
                noop_dispatcher()
            }
        };

    let engine = PipelineEngine::with_parts(
        dispatcher,
        Timeline::standard(),
        mock_agencies(),
        config.campaign.clone(),
    );

    engine.update_form(|form| {
        form.name = cli.name.clone();
        form.email = cli.email.clone();
        form.phone = cli.phone.clone();
        form.zip = cli.zip.clone();
        form.interest = interest;
    });

    engine.start()?;

    // Stream the feed until the run completes.
    let mut printed = 0;
    let mut ticker = tokio::time::interval(Duration::from_millis(200));
    loop {
        ticker.tick().await;
        let logs = engine.logs();
        for entry in &logs[printed..] {
            println!("{}", render_line(entry));
        }
        printed = logs.len();
        if engine.phase() == RunPhase::Completed && printed == engine.logs().len() {
            break;
        }
    }

    println!();
    println!("Misión cumplida: lead cualificado y distribuido a partners.");
    for agency in engine.agencies() {
        println!(
            "  {} — {} ({}, {:.1}★)",
            agency.name, agency.address, agency.distance, agency.rating
        );
    }

    Ok(())
}

fn render_line(entry: &LogEntry) -> String {
    let tag = match entry.category {
        LogCategory::Info => "info",
        LogCategory::Process => "proc",
        LogCategory::AiGeneration => "ai  ",
        LogCategory::EmailSent => "mail",
        LogCategory::WhatsAppSent => "wapp",
        LogCategory::Success => "ok  ",
    };
    format!("[{}] {} {}", entry.time.format("%H:%M:%S"), tag, entry.message)
}
