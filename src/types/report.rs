//! Assessment report data structures

use crate::models::aggregator::{EqsBreakdown, RawPredictions};
use crate::types::category::{AqiBand, Category};
use crate::types::readings::Domain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Outcome of the narrative request for a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeStatus {
    Generated,
    Unavailable,
    Disabled,
}

impl NarrativeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NarrativeStatus::Generated => "generated",
            NarrativeStatus::Unavailable => "unavailable",
            NarrativeStatus::Disabled => "disabled",
        }
    }
}

/// Environmental quality report returned for one assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EqsReport {
    /// Unique report identifier
    pub report_id: String,

    /// Normalized air score (0 - 100)
    #[serde(serialize_with = "round2")]
    pub air_score: f64,

    /// Normalized water score (0 - 100)
    #[serde(serialize_with = "round2")]
    pub water_score: f64,

    /// Normalized soil score (0 - 100)
    #[serde(serialize_with = "round2")]
    pub soil_score: f64,

    /// Weighted environmental quality score (0 - 100)
    #[serde(serialize_with = "round2")]
    pub eqs: f64,

    pub category: Category,

    /// Human-readable narrative, absent when the narrative could not be produced
    pub description: Option<String>,

    pub narrative_status: NarrativeStatus,

    /// Raw model outputs the scores were derived from
    pub raw_predictions: RawPredictions,

    pub timestamp: DateTime<Utc>,
}

impl EqsReport {
    /// Create a report from an aggregation result
    pub fn new(raw_predictions: RawPredictions, breakdown: EqsBreakdown) -> Self {
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            air_score: breakdown.air_score,
            water_score: breakdown.water_score,
            soil_score: breakdown.soil_score,
            eqs: breakdown.eqs,
            category: breakdown.category,
            description: None,
            narrative_status: NarrativeStatus::Disabled,
            raw_predictions,
            timestamp: Utc::now(),
        }
    }

    /// Attach the narrative outcome
    pub fn with_narrative(mut self, description: Option<String>, status: NarrativeStatus) -> Self {
        self.description = description;
        self.narrative_status = status;
        self
    }

    pub fn breakdown(&self) -> EqsBreakdown {
        EqsBreakdown {
            air_score: self.air_score,
            water_score: self.water_score,
            soil_score: self.soil_score,
            eqs: self.eqs,
            category: self.category,
        }
    }
}

/// Single-domain prediction result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainReport {
    pub domain: Domain,

    #[serde(serialize_with = "round2")]
    pub raw_prediction: f64,

    /// Normalized score (0 - 100)
    #[serde(serialize_with = "round2")]
    pub score: f64,

    /// AQI band label (air only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<AqiBand>,
}

fn round2<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 100.0).round() / 100.0)
}
