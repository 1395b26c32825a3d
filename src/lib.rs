//! Environmental Quality Score Service Library
//!
//! Serves air, water and soil quality models over HTTP, combines their
//! outputs into a weighted Environmental Quality Score (EQS), classifies
//! it, and optionally attaches an LLM-written narrative.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod narrative;
pub mod server;
pub mod service;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::AppConfig;
pub use error::{EqsError, Result};
pub use feature_extractor::FeatureExtractor;
pub use models::{InferenceEngine, QualityModel, ScoreAggregator};
pub use narrative::{NarrativeGenerator, Narrator};
pub use service::AssessmentService;
pub use types::{Category, EqsReport, EqsRequest};
