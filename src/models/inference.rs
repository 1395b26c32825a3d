//! Per-domain model inference

use crate::config::AppConfig;
use crate::error::{EqsError, Result};
use crate::feature_extractor::FeatureExtractor;
use crate::models::aggregator::{RawPredictions, ScoreAggregator};
use crate::models::loader::{DomainModels, ModelLoader};
use crate::types::readings::{AirReadings, Domain, EqsRequest, SoilReadings, WaterReadings};
use std::sync::Arc;
use tracing::{debug, info};

/// A loaded domain model: feature vector in, one raw prediction out.
///
/// Implementations are immutable once constructed and shared across requests.
pub trait QualityModel: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, features: &[f32]) -> Result<f64>;
}

/// Inference engine holding one model per domain
pub struct InferenceEngine {
    air: Arc<dyn QualityModel>,
    water: Arc<dyn QualityModel>,
    soil: Arc<dyn QualityModel>,
    /// Maps readings onto model inputs
    extractor: FeatureExtractor,
    /// Score aggregator for combining model outputs
    aggregator: ScoreAggregator,
}

impl InferenceEngine {
    /// Create an inference engine from configuration, loading ONNX models and scalers
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let loader = ModelLoader::with_threads(config.models.onnx_threads)?
            .with_output_name(config.models.output_name.clone());
        let models = loader.load_domain_models(&config.models)?;
        let extractor = FeatureExtractor::from_models_dir(&config.models.models_dir)?;

        let aggregator = ScoreAggregator::new(
            config.scoring.weights,
            config.scoring.water_scale,
            config.scoring.category_scheme,
        );

        info!(
            weights = ?config.scoring.weights,
            water_scale = ?config.scoring.water_scale,
            category_scheme = ?config.scoring.category_scheme,
            "Inference engine initialized"
        );

        Ok(Self::from_models(models, extractor, aggregator))
    }

    /// Create an inference engine from already constructed models
    pub fn from_models(
        models: DomainModels,
        extractor: FeatureExtractor,
        aggregator: ScoreAggregator,
    ) -> Self {
        Self {
            air: models.air,
            water: models.water,
            soil: models.soil,
            extractor,
            aggregator,
        }
    }

    pub fn aggregator(&self) -> &ScoreAggregator {
        &self.aggregator
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Get loaded model names
    pub fn model_names(&self) -> Vec<String> {
        Domain::ALL
            .iter()
            .map(|&domain| self.model(domain).name().to_string())
            .collect()
    }

    fn model(&self, domain: Domain) -> &dyn QualityModel {
        match domain {
            Domain::Air => self.air.as_ref(),
            Domain::Water => self.water.as_ref(),
            Domain::Soil => self.soil.as_ref(),
        }
    }

    /// Raw AQI-like prediction for air readings
    pub fn predict_air(&self, readings: &AirReadings) -> Result<f64> {
        let features = self.extractor.extract_air(readings);
        self.run(Domain::Air, &features)
    }

    /// Raw water quality prediction (ordinal class or 0-100 value)
    pub fn predict_water(&self, readings: &WaterReadings) -> Result<f64> {
        let features = self.extractor.extract_water(readings);
        self.run(Domain::Water, &features)
    }

    /// Raw soil quality prediction (0-100)
    pub fn predict_soil(&self, readings: &SoilReadings) -> Result<f64> {
        let features = self.extractor.extract_soil(readings);
        self.run(Domain::Soil, &features)
    }

    /// Run all three models sequentially
    pub fn predict_all(&self, request: &EqsRequest) -> Result<RawPredictions> {
        Ok(RawPredictions {
            air: self.predict_air(&request.air)?,
            water: self.predict_water(&request.water)?,
            soil: self.predict_soil(&request.soil)?,
        })
    }

    /// Run a single domain model on features
    fn run(&self, domain: Domain, features: &[f32]) -> Result<f64> {
        let model = self.model(domain);
        // The failing slot names the domain, whatever the model reports
        let prediction = model.predict(features).map_err(|e| match e {
            EqsError::Inference { reason, .. } => EqsError::inference(domain, reason),
            other => other,
        })?;

        if !prediction.is_finite() {
            return Err(EqsError::inference(
                domain,
                format!("{} returned non-finite prediction {}", model.name(), prediction),
            ));
        }

        debug!(
            domain = %domain,
            model = %model.name(),
            prediction = prediction,
            "Model inference complete"
        );
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{engine_with, FailingModel, FixedModel};

    #[test]
    fn test_predict_all() {
        let engine = engine_with(
            FixedModel::new(110.0),
            FixedModel::new(2.0),
            FixedModel::new(62.0),
        );

        let raw = engine.predict_all(&EqsRequest::default()).unwrap();
        assert_eq!(
            raw,
            RawPredictions {
                air: 110.0,
                water: 2.0,
                soil: 62.0
            }
        );
        assert_eq!(engine.model_names(), vec!["fixed", "fixed", "fixed"]);
    }

    #[test]
    fn test_model_receives_extracted_features() {
        let air = Arc::new(FixedModel::new(42.0));
        let engine = InferenceEngine::from_models(
            DomainModels {
                air: air.clone(),
                water: Arc::new(FixedModel::new(1.0)),
                soil: Arc::new(FixedModel::new(50.0)),
            },
            FeatureExtractor::new(),
            ScoreAggregator::default(),
        );

        let readings = AirReadings {
            co_gt: 2.6,
            ..Default::default()
        };
        engine.predict_air(&readings).unwrap();

        let seen = air.last_features();
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0], 2.6);
    }

    #[test]
    fn test_model_failure_propagates() {
        let engine = engine_with(FixedModel::new(80.0), FailingModel, FixedModel::new(62.0));

        let err = engine.predict_all(&EqsRequest::default()).unwrap_err();
        assert!(matches!(err, EqsError::Inference { domain: Domain::Water, .. }));
        assert!(err.to_string().starts_with("water"));
    }

    #[test]
    fn test_failure_names_the_called_domain() {
        let engine = engine_with(FailingModel, FixedModel::new(2.0), FixedModel::new(62.0));

        let err = engine.predict_air(&AirReadings::default()).unwrap_err();
        assert!(matches!(err, EqsError::Inference { domain: Domain::Air, .. }));
    }

    #[test]
    fn test_non_finite_prediction_is_inference_failure() {
        let engine = engine_with(
            FixedModel::new(f64::NAN),
            FixedModel::new(1.0),
            FixedModel::new(62.0),
        );

        let err = engine.predict_air(&AirReadings::default()).unwrap_err();
        assert!(matches!(err, EqsError::Inference { domain: Domain::Air, .. }));
    }
}
