//! The fixed dramaturgy of one demo run: ten simulated pipeline events,
//! each with a delay measured from run start.

use std::time::Duration;

use queretaro_core::types::{Agency, LeadForm, LogCategory};

/// One simulated pipeline event the scheduler fires during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// Lead registered in the CRM.
    CrmValidate,
    /// Postal code resolved to a market area.
    NormalizeLocation,
    /// Partner agency search kicked off.
    ShortlistAgencies,
    /// Shortlist results surface to the observer.
    RevealAgencies,
    /// B2B pitch generation for the shortlist.
    GeneratePitches,
    /// Outreach email to the shortlisted agency at `index`.
    AgencyEmail { index: usize },
    /// Welcome email back to the lead.
    LeadWelcomeEmail,
    /// B2C WhatsApp confirmation.
    WhatsAppConfirm,
    /// Terminal event: qualification done, the run completes.
    CompleteCycle,
}

impl StepAction {
    /// Category tag the entry carries in the log stream.
    pub fn category(&self) -> LogCategory {
        match self {
            Self::CrmValidate | Self::NormalizeLocation | Self::ShortlistAgencies => {
                LogCategory::Process
            }
            Self::RevealAgencies | Self::CompleteCycle => LogCategory::Success,
            Self::GeneratePitches => LogCategory::AiGeneration,
            Self::AgencyEmail { .. } | Self::LeadWelcomeEmail => LogCategory::EmailSent,
            Self::WhatsAppConfirm => LogCategory::WhatsAppSent,
        }
    }

    /// Renders the log line for this event from the frozen form and the
    /// agencies revealed so far.
    pub fn message(&self, form: &LeadForm, agencies: &[Agency]) -> String {
        match self {
            Self::CrmValidate => format!(
                "💾 Validando Lead: {} registrado en CRM Airtable.",
                form.email
            ),
            Self::NormalizeLocation => format!(
                "📍 Normalizando ubicación: CP {} -> \"Madrid, España\".",
                form.zip
            ),
            Self::ShortlistAgencies => {
                "🔍 Filtrando agencias \"Long-Haul\" en radio 5km...".to_string()
            }
            Self::RevealAgencies => format!(
                "🎯 TARGET ACQUIRED: {} agencias premium identificadas.",
                agencies.len()
            ),
            Self::GeneratePitches => format!(
                "🤖 OpenAI (GPT-4): Generando {} pitches B2B únicos...",
                agencies.len()
            ),
            Self::AgencyEmail { index } => match agencies.get(*index) {
                Some(agency) => format!("📧 Email enviado a {}", agency.name),
                None => "📧 Email enviado a agencia asociada".to_string(),
            },
            Self::LeadWelcomeEmail => format!(
                "📨 Email de bienvenida enviado al usuario ({}).",
                form.email
            ),
            Self::WhatsAppConfirm => "📲 WhatsApp B2C despachado vía Twilio API.".to_string(),
            Self::CompleteCycle => "✅ CICLO FINALIZADO. Lead cualificado.".to_string(),
        }
    }
}

/// An event plus its delay from run start. Delays are independent of each
/// other, not chained to the previous entry.
#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    pub delay: Duration,
    pub action: StepAction,
}

/// The constant, reusable schedule for one run.
#[derive(Debug, Clone)]
pub struct Timeline {
    entries: Vec<ScheduleEntry>,
}

impl Timeline {
    pub fn new(entries: Vec<ScheduleEntry>) -> Self {
        Self { entries }
    }

    /// The original demo dramaturgy: ten events over fifteen seconds.
    pub fn standard() -> Self {
        let entry = |ms: u64, action: StepAction| ScheduleEntry {
            delay: Duration::from_millis(ms),
            action,
        };
        Self::new(vec![
            entry(1_500, StepAction::CrmValidate),
            entry(3_000, StepAction::NormalizeLocation),
            entry(4_500, StepAction::ShortlistAgencies),
            entry(6_000, StepAction::RevealAgencies),
            entry(7_500, StepAction::GeneratePitches),
            entry(9_500, StepAction::AgencyEmail { index: 0 }),
            entry(10_500, StepAction::AgencyEmail { index: 1 }),
            entry(11_500, StepAction::LeadWelcomeEmail),
            entry(13_000, StepAction::WhatsAppConfirm),
            entry(15_000, StepAction::CompleteCycle),
        ])
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// Entries in firing order: ascending delay, original list order on
    /// ties.
    pub fn in_firing_order(&self) -> Vec<ScheduleEntry> {
        let mut ordered: Vec<(usize, ScheduleEntry)> =
            self.entries.iter().cloned().enumerate().collect();
        ordered.sort_by_key(|(index, entry)| (entry.delay, *index));
        ordered.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Wall-clock span from run start to the last firing.
    pub fn total_duration(&self) -> Duration {
        self.entries
            .iter()
            .map(|entry| entry.delay)
            .max()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::standard()
    }
}
