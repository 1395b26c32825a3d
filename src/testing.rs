//! Test doubles for domain models and narrators

use crate::error::{EqsError, Result};
use crate::feature_extractor::FeatureExtractor;
use crate::metrics::ServiceMetrics;
use crate::models::aggregator::{EqsBreakdown, ScoreAggregator};
use crate::models::inference::{InferenceEngine, QualityModel};
use crate::models::loader::DomainModels;
use crate::narrative::NarrativeGenerator;
use crate::service::AssessmentService;
use crate::types::readings::Domain;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Model that always predicts the same value and remembers its last input
pub struct FixedModel {
    value: f64,
    last_features: Mutex<Vec<f32>>,
}

impl FixedModel {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            last_features: Mutex::new(Vec::new()),
        }
    }

    pub fn last_features(&self) -> Vec<f32> {
        self.last_features.lock().unwrap().clone()
    }
}

impl QualityModel for FixedModel {
    fn name(&self) -> &str {
        "fixed"
    }

    fn predict(&self, features: &[f32]) -> Result<f64> {
        *self.last_features.lock().unwrap() = features.to_vec();
        Ok(self.value)
    }
}

/// Model whose inference always fails
pub struct FailingModel;

impl QualityModel for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    fn predict(&self, _features: &[f32]) -> Result<f64> {
        Err(EqsError::Inference {
            domain: Domain::Soil,
            reason: "session crashed".to_string(),
        })
    }
}

pub struct StaticNarrator(pub String);

impl NarrativeGenerator for StaticNarrator {
    async fn describe(&self, _breakdown: EqsBreakdown) -> Result<String> {
        Ok(self.0.clone())
    }
}

pub struct FailingNarrator;

impl NarrativeGenerator for FailingNarrator {
    async fn describe(&self, _breakdown: EqsBreakdown) -> Result<String> {
        Err(EqsError::NarrativeUnavailable("upstream returned HTTP 503".to_string()))
    }
}

/// Narrator that takes longer than any sensible timeout
pub struct SlowNarrator(pub Duration);

impl NarrativeGenerator for SlowNarrator {
    async fn describe(&self, _breakdown: EqsBreakdown) -> Result<String> {
        tokio::time::sleep(self.0).await;
        Ok("too late".to_string())
    }
}

pub fn engine_with(
    air: impl QualityModel + 'static,
    water: impl QualityModel + 'static,
    soil: impl QualityModel + 'static,
) -> InferenceEngine {
    InferenceEngine::from_models(
        DomainModels {
            air: Arc::new(air),
            water: Arc::new(water),
            soil: Arc::new(soil),
        },
        FeatureExtractor::new(),
        ScoreAggregator::default(),
    )
}

pub fn service_with<N: NarrativeGenerator>(
    engine: InferenceEngine,
    narrator: N,
) -> AssessmentService<N> {
    AssessmentService::new(
        Arc::new(engine),
        narrator,
        Arc::new(ServiceMetrics::new()),
        Duration::from_secs(1),
    )
}
