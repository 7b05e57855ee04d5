//! Specimen Records
//!
//! The record describing one scanned fish. Specimens arrive fully formed from
//! the scanner backend and are treated as an opaque payload: the core never
//! validates or rejects them. A payload missing fields is displayed with empty
//! values instead.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the notification event carrying specimen payloads
pub const FISH_DATA_EVENT: &str = "fishData";

/// One scanned fish, exactly as supplied by the scanner backend
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Specimen {
    /// Catalog identifier (unique per scan, not per process)
    pub id: u32,
    /// Common name
    pub name: String,
    /// Typical adult size
    pub average_size: String,
    /// Typical adult weight
    pub average_weight: String,
    /// Typical lifespan
    pub average_lifespan: String,
    /// Where it lives
    pub habitat: String,
    /// What it eats
    pub diet: String,
    /// Conservation status label (e.g. "Least Concern")
    pub endangered_status: String,
    /// Narrative blurb
    pub blurb: String,
    /// Image reference
    pub image_path: String,
    /// One fun fact
    pub fun_fact: String,
}

impl Specimen {
    /// Decode a specimen from an arbitrary notification payload.
    ///
    /// Never fails. Missing fields become empty, numbers and booleans given
    /// where text is expected are kept in their textual form, and an `id`
    /// that is not a u32 becomes 0. A payload that is not a JSON object
    /// yields an all-empty specimen.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Self {
        let Some(obj) = payload.as_object() else {
            return Self::default();
        };

        let text = |key: &str| -> String {
            match obj.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(b)) => b.to_string(),
                _ => String::new(),
            }
        };

        let id = match obj.get("id") {
            Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .unwrap_or(0);

        Self {
            id,
            name: text("name"),
            average_size: text("average_size"),
            average_weight: text("average_weight"),
            average_lifespan: text("average_lifespan"),
            habitat: text("habitat"),
            diet: text("diet"),
            endangered_status: text("endangered_status"),
            blurb: text("blurb"),
            image_path: text("image_path"),
            fun_fact: text("fun_fact"),
        }
    }

    /// Conservation status parsed from the free-text label
    #[must_use]
    pub fn conservation_status(&self) -> ConservationStatus {
        ConservationStatus::parse(&self.endangered_status)
    }

    /// Name for logs and headers; falls back to the id
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("specimen #{}", self.id)
        } else {
            self.name.clone()
        }
    }
}

/// IUCN-style conservation categories
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConservationStatus {
    /// Critically endangered
    CriticallyEndangered,
    /// Endangered
    Endangered,
    /// Vulnerable
    Vulnerable,
    /// Near threatened
    NearThreatened,
    /// Least concern
    LeastConcern,
    /// Data deficient
    DataDeficient,
    /// Not evaluated, or a label we don't recognise
    NotEvaluated,
}

impl ConservationStatus {
    /// Parse a status label, case-insensitively
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "critically endangered" => Self::CriticallyEndangered,
            "endangered" => Self::Endangered,
            "vulnerable" => Self::Vulnerable,
            "near threatened" => Self::NearThreatened,
            "least concern" => Self::LeastConcern,
            "data deficient" => Self::DataDeficient,
            _ => Self::NotEvaluated,
        }
    }

    /// Whether the species is in one of the threatened categories
    #[must_use]
    pub fn is_threatened(&self) -> bool {
        matches!(
            self,
            Self::CriticallyEndangered | Self::Endangered | Self::Vulnerable | Self::NearThreatened
        )
    }

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::CriticallyEndangered => "Critically Endangered",
            Self::Endangered => "Endangered",
            Self::Vulnerable => "Vulnerable",
            Self::NearThreatened => "Near Threatened",
            Self::LeastConcern => "Least Concern",
            Self::DataDeficient => "Data Deficient",
            Self::NotEvaluated => "Not Evaluated",
        }
    }
}

impl fmt::Display for ConservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
