use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Travel interest a lead declares on the landing form. Serialized with the
/// labels the form and the outbound payload use on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterestCategory {
    #[default]
    #[serde(rename = "Cultura y Gastronomía")]
    CultureGastronomy,
    #[serde(rename = "Aventura y Naturaleza")]
    AdventureNature,
    #[serde(rename = "Negocios y MICE")]
    BusinessMice,
}

impl InterestCategory {
    /// Wire/display label for this category.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CultureGastronomy => "Cultura y Gastronomía",
            Self::AdventureNature => "Aventura y Naturaleza",
            Self::BusinessMice => "Negocios y MICE",
        }
    }
}

impl fmt::Display for InterestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InterestCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cultura" | "cultura y gastronomia" | "cultura y gastronomía" => {
                Ok(Self::CultureGastronomy)
            }
            "aventura" | "aventura y naturaleza" => Ok(Self::AdventureNature),
            "negocios" | "mice" | "negocios y mice" => Ok(Self::BusinessMice),
            other => Err(format!("unknown interest category: {other}")),
        }
    }
}

/// Contact details a visitor submits to start a demo run. Mutable only while
/// the engine is idle; frozen for the duration of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub zip: String,
    #[serde(default)]
    pub interest: InterestCategory,
}

impl LeadForm {
    /// A run may start only with name, email, and postal code present.
    /// Phone and interest have defaults and do not block submission.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.email.trim().is_empty()
            && !self.zip.trim().is_empty()
    }
}

/// A partner travel agency surfaced by the shortlist step. Reference data
/// from an external lookup; the pipeline treats the list as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agency {
    pub id: u32,
    pub name: String,
    pub distance: String,
    pub address: String,
    pub rating: f32,
}

/// Fallback agency directory used when no live lookup is wired in.
pub fn mock_agencies() -> Vec<Agency> {
    vec![
        Agency {
            id: 1,
            name: "Viajes El Corte Inglés".to_string(),
            distance: "0.5 km".to_string(),
            address: "C. de Serrano, Madrid".to_string(),
            rating: 4.8,
        },
        Agency {
            id: 2,
            name: "B Travel Brand Xperience".to_string(),
            distance: "1.2 km".to_string(),
            address: "Av. de Felipe II, Madrid".to_string(),
            rating: 4.6,
        },
        Agency {
            id: 3,
            name: "Halcón Viajes Premium".to_string(),
            distance: "2.1 km".to_string(),
            address: "C. de Alcalá, Madrid".to_string(),
            rating: 4.5,
        },
    ]
}

/// Category tag carried by every line in the run feed. Serialized as the
/// short tags the terminal renderer keys its styling on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    Info,
    Process,
    #[serde(rename = "ai")]
    AiGeneration,
    #[serde(rename = "email")]
    EmailSent,
    #[serde(rename = "whatsapp")]
    WhatsAppSent,
    Success,
}

/// One line in the run's terminal feed. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    pub category: LogCategory,
    pub time: NaiveTime,
}

impl LogEntry {
    /// Stamps a new entry with the current local time of day.
    pub fn new(category: LogCategory, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category,
            time: chrono::Local::now().time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_validity_requires_name_email_zip() {
        let mut form = LeadForm {
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            phone: String::new(),
            zip: "28001".to_string(),
            interest: InterestCategory::default(),
        };
        assert!(form.is_valid());

        form.email = "   ".to_string();
        assert!(!form.is_valid());

        form.email = "ana@x.com".to_string();
        form.zip = String::new();
        assert!(!form.is_valid());
    }

    #[test]
    fn test_phone_does_not_block_validity() {
        let form = LeadForm {
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            phone: String::new(),
            zip: "28001".to_string(),
            interest: InterestCategory::BusinessMice,
        };
        assert!(form.is_valid());
    }

    #[test]
    fn test_interest_serializes_to_form_labels() {
        let json = serde_json::to_string(&InterestCategory::CultureGastronomy).unwrap();
        assert_eq!(json, "\"Cultura y Gastronomía\"");

        let parsed: InterestCategory =
            serde_json::from_str("\"Negocios y MICE\"").unwrap();
        assert_eq!(parsed, InterestCategory::BusinessMice);
    }

    #[test]
    fn test_interest_parses_cli_shorthand() {
        assert_eq!(
            "aventura".parse::<InterestCategory>().unwrap(),
            InterestCategory::AdventureNature
        );
        assert!("surf".parse::<InterestCategory>().is_err());
    }

    #[test]
    fn test_log_category_wire_tags() {
        assert_eq!(
            serde_json::to_string(&LogCategory::AiGeneration).unwrap(),
            "\"ai\""
        );
        assert_eq!(
            serde_json::to_string(&LogCategory::WhatsAppSent).unwrap(),
            "\"whatsapp\""
        );
        assert_eq!(serde_json::to_string(&LogCategory::Success).unwrap(), "\"success\"");
    }

    #[test]
    fn test_mock_directory_has_three_agencies() {
        let agencies = mock_agencies();
        assert_eq!(agencies.len(), 3);
        assert_eq!(agencies[0].name, "Viajes El Corte Inglés");
    }
}
