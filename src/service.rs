//! Assessment service: runs domain inference, aggregation and narrative
//! generation for one request.

use crate::error::{EqsError, Result};
use crate::metrics::ServiceMetrics;
use crate::models::aggregator::{EqsBreakdown, RawPredictions};
use crate::models::inference::InferenceEngine;
use crate::narrative::NarrativeGenerator;
use crate::types::category::AqiBand;
use crate::types::readings::{AirReadings, Domain, EqsRequest, SoilReadings, WaterReadings};
use crate::types::report::{DomainReport, EqsReport, NarrativeStatus};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Orchestrates a full environmental quality assessment
pub struct AssessmentService<N: NarrativeGenerator> {
    engine: Arc<InferenceEngine>,
    narrator: N,
    metrics: Arc<ServiceMetrics>,
    narrative_timeout: Duration,
}

impl<N: NarrativeGenerator> AssessmentService<N> {
    pub fn new(
        engine: Arc<InferenceEngine>,
        narrator: N,
        metrics: Arc<ServiceMetrics>,
        narrative_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            narrator,
            metrics,
            narrative_timeout,
        }
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        &self.metrics
    }

    /// Full assessment from sensor readings.
    ///
    /// The three domain models run concurrently; aggregation waits for all of them.
    pub async fn assess(&self, request: EqsRequest) -> Result<EqsReport> {
        let start = Instant::now();
        let EqsRequest { air, water, soil } = request;

        let predictions = tokio::try_join!(
            self.predict_blocking(Domain::Air, move |engine| engine.predict_air(&air)),
            self.predict_blocking(Domain::Water, move |engine| engine.predict_water(&water)),
            self.predict_blocking(Domain::Soil, move |engine| engine.predict_soil(&soil)),
        );

        let raw = match predictions {
            Ok((air, water, soil)) => RawPredictions { air, water, soil },
            Err(e) => {
                self.metrics.record_failure();
                error!(error = %e, "Domain inference failed");
                return Err(e);
            }
        };

        self.report(raw, start).await
    }

    /// Assessment from raw predictions produced elsewhere
    pub async fn assess_raw(&self, raw: RawPredictions) -> Result<EqsReport> {
        self.report(raw, Instant::now()).await
    }

    pub async fn assess_air(&self, readings: AirReadings) -> Result<DomainReport> {
        let raw = self
            .predict_domain(Domain::Air, move |engine| engine.predict_air(&readings))
            .await?;

        Ok(DomainReport {
            domain: Domain::Air,
            raw_prediction: raw,
            score: self.engine.aggregator().normalize_air(raw),
            band: Some(AqiBand::from_aqi(raw)),
        })
    }

    pub async fn assess_water(&self, readings: WaterReadings) -> Result<DomainReport> {
        let raw = self
            .predict_domain(Domain::Water, move |engine| engine.predict_water(&readings))
            .await?;

        Ok(DomainReport {
            domain: Domain::Water,
            raw_prediction: raw,
            score: self.engine.aggregator().normalize_water(raw),
            band: None,
        })
    }

    pub async fn assess_soil(&self, readings: SoilReadings) -> Result<DomainReport> {
        let raw = self
            .predict_domain(Domain::Soil, move |engine| engine.predict_soil(&readings))
            .await?;

        Ok(DomainReport {
            domain: Domain::Soil,
            raw_prediction: raw,
            score: self.engine.aggregator().normalize_soil(raw),
            band: None,
        })
    }

    async fn report(&self, raw: RawPredictions, start: Instant) -> Result<EqsReport> {
        let breakdown = match self.engine.aggregator().aggregate(&raw) {
            Ok(breakdown) => breakdown,
            Err(e) => {
                self.metrics.record_failure();
                warn!(error = %e, "Rejected raw predictions");
                return Err(e);
            }
        };

        let (description, status) = self.narrate(breakdown).await;
        self.metrics.record_narrative(status);

        let report = EqsReport::new(raw, breakdown).with_narrative(description, status);

        let elapsed = start.elapsed();
        self.metrics
            .record_assessment(elapsed, report.eqs, report.category.as_str());

        info!(
            report_id = %report.report_id,
            air_score = report.air_score,
            water_score = report.water_score,
            soil_score = report.soil_score,
            eqs = report.eqs,
            category = %report.category,
            narrative = status.as_str(),
            processing_time_us = elapsed.as_micros(),
            "Assessment complete"
        );

        Ok(report)
    }

    /// Ask the narrator for a description, bounded by the narrative timeout.
    ///
    /// Never fails: any problem downgrades to an unavailable narrative.
    pub async fn narrate(&self, breakdown: EqsBreakdown) -> (Option<String>, NarrativeStatus) {
        if !self.narrator.is_enabled() {
            return (None, NarrativeStatus::Disabled);
        }

        let narrative = self.narrator.describe(breakdown);
        match tokio::time::timeout(self.narrative_timeout, narrative).await {
            Ok(Ok(text)) => (Some(text), NarrativeStatus::Generated),
            Ok(Err(e)) => {
                warn!(error = %e, "Narrative generation failed");
                (None, NarrativeStatus::Unavailable)
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.narrative_timeout.as_millis(),
                    "Narrative generation timed out"
                );
                (None, NarrativeStatus::Unavailable)
            }
        }
    }

    /// Single-domain prediction, counted as a failed assessment on error
    async fn predict_domain<F>(&self, domain: Domain, predict: F) -> Result<f64>
    where
        F: FnOnce(&InferenceEngine) -> Result<f64> + Send + 'static,
    {
        self.predict_blocking(domain, predict).await.map_err(|e| {
            self.metrics.record_failure();
            error!(domain = %domain, error = %e, "Domain inference failed");
            e
        })
    }

    /// Run one domain model on the blocking pool
    async fn predict_blocking<F>(&self, domain: Domain, predict: F) -> Result<f64>
    where
        F: FnOnce(&InferenceEngine) -> Result<f64> + Send + 'static,
    {
        let engine = self.engine.clone();
        let start = Instant::now();

        let prediction = tokio::task::spawn_blocking(move || predict(&engine))
            .await
            .map_err(|e| EqsError::inference(domain, format!("inference task failed: {}", e)))??;

        let elapsed = start.elapsed();
        self.metrics.record_model_time(domain, elapsed);
        debug!(
            domain = %domain,
            prediction = prediction,
            elapsed_us = elapsed.as_micros(),
            "Prediction ready"
        );

        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        engine_with, service_with, FailingModel, FailingNarrator, FixedModel, SlowNarrator,
        StaticNarrator,
    };
    use crate::types::category::Category;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_end_to_end_assessment() {
        let service = service_with(
            engine_with(FixedModel::new(110.0), FixedModel::new(2.0), FixedModel::new(62.0)),
            StaticNarrator("Kualitas lingkungan baik.".to_string()),
        );

        let report = service.assess(EqsRequest::default()).await.unwrap();
        assert!((report.air_score - 78.0).abs() < 1e-9);
        assert_eq!(report.water_score, 100.0);
        assert_eq!(report.soil_score, 62.0);
        assert!((report.eqs - 79.8).abs() < 1e-9);
        assert_eq!(report.category, Category::Good);
        assert_eq!(report.description.as_deref(), Some("Kualitas lingkungan baik."));
        assert_eq!(report.narrative_status, NarrativeStatus::Generated);
        assert_eq!(report.raw_predictions.air, 110.0);

        let metrics = service.metrics();
        assert_eq!(metrics.assessments_processed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.get_model_stats().len(), 3);
    }

    #[tokio::test]
    async fn test_narrative_failure_keeps_numeric_result() {
        let service = service_with(
            engine_with(FixedModel::new(110.0), FixedModel::new(2.0), FixedModel::new(62.0)),
            FailingNarrator,
        );

        let report = service.assess(EqsRequest::default()).await.unwrap();
        assert!((report.eqs - 79.8).abs() < 1e-9);
        assert_eq!(report.category, Category::Good);
        assert!(report.description.is_none());
        assert_eq!(report.narrative_status, NarrativeStatus::Unavailable);
        assert_eq!(
            service.metrics().narratives_unavailable.load(Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn test_narrative_timeout_keeps_numeric_result() {
        let service = AssessmentService::new(
            Arc::new(engine_with(
                FixedModel::new(0.0),
                FixedModel::new(2.0),
                FixedModel::new(100.0),
            )),
            SlowNarrator(Duration::from_secs(5)),
            Arc::new(ServiceMetrics::new()),
            Duration::from_millis(20),
        );

        let report = service.assess(EqsRequest::default()).await.unwrap();
        assert_eq!(report.air_score, 100.0);
        assert!((report.eqs - 100.0).abs() < 1e-9);
        assert_eq!(report.narrative_status, NarrativeStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_disabled_narrator_not_called() {
        let service = service_with(
            engine_with(FixedModel::new(250.0), FixedModel::new(1.0), FixedModel::new(50.0)),
            crate::narrative::Narrator::Disabled,
        );

        let report = service.assess(EqsRequest::default()).await.unwrap();
        assert_eq!(report.narrative_status, NarrativeStatus::Disabled);
        assert!((report.eqs - 50.0).abs() < 1e-9);
        assert_eq!(report.category, Category::Moderate);
    }

    #[tokio::test]
    async fn test_inference_failure_is_surfaced() {
        let service = service_with(
            engine_with(FixedModel::new(110.0), FixedModel::new(2.0), FailingModel),
            StaticNarrator("unused".to_string()),
        );

        let err = service.assess(EqsRequest::default()).await.unwrap_err();
        assert!(matches!(err, EqsError::Inference { domain: Domain::Soil, .. }));
        assert_eq!(service.metrics().assessments_failed.load(Ordering::Relaxed), 1);
        assert_eq!(service.metrics().assessments_processed.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_assess_raw() {
        let service = service_with(
            engine_with(FixedModel::new(0.0), FixedModel::new(0.0), FixedModel::new(0.0)),
            FailingNarrator,
        );

        let report = service
            .assess_raw(RawPredictions {
                air: 500.0,
                water: 0.0,
                soil: 0.0,
            })
            .await
            .unwrap();
        assert_eq!(report.eqs, 0.0);
        assert_eq!(report.category, Category::Poor);

        let err = service
            .assess_raw(RawPredictions {
                air: f64::INFINITY,
                water: 1.0,
                soil: 10.0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EqsError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_single_domain_reports() {
        let service = service_with(
            engine_with(FixedModel::new(110.0), FixedModel::new(1.0), FixedModel::new(150.0)),
            FailingNarrator,
        );

        let air = service.assess_air(AirReadings::default()).await.unwrap();
        assert_eq!(air.raw_prediction, 110.0);
        assert!((air.score - 78.0).abs() < 1e-9);
        assert_eq!(air.band, Some(AqiBand::UnhealthyForSensitiveGroups));

        let water = service.assess_water(WaterReadings::default()).await.unwrap();
        assert_eq!(water.score, 50.0);
        assert!(water.band.is_none());

        let soil = service.assess_soil(SoilReadings::default()).await.unwrap();
        assert_eq!(soil.raw_prediction, 150.0);
        assert_eq!(soil.score, 100.0);
    }

    #[tokio::test]
    async fn test_single_domain_failure_is_counted() {
        let service = service_with(
            engine_with(FixedModel::new(110.0), FixedModel::new(1.0), FailingModel),
            FailingNarrator,
        );

        let err = service.assess_soil(SoilReadings::default()).await.unwrap_err();
        assert!(matches!(err, EqsError::Inference { domain: Domain::Soil, .. }));
        assert_eq!(service.metrics().assessments_failed.load(Ordering::Relaxed), 1);

        service.assess_air(AirReadings::default()).await.unwrap();
        assert_eq!(service.metrics().assessments_failed.load(Ordering::Relaxed), 1);
    }
}
