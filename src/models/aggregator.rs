//! Score aggregation for the Environmental Quality Score

use crate::error::{EqsError, Result};
use crate::types::category::{Category, CategoryScheme};
use crate::types::readings::Domain;
use serde::{Deserialize, Serialize};

/// Default weight of the air sub-score
pub const AIR_WEIGHT: f64 = 0.4;
/// Default weight of the water sub-score
pub const WATER_WEIGHT: f64 = 0.3;
/// Default weight of the soil sub-score
pub const SOIL_WEIGHT: f64 = 0.3;

/// Upper end of the AQI scale the air model predicts on
pub const AQI_SCALE_MAX: f64 = 500.0;
/// Highest class of the ordinal water quality model
pub const WATER_ORDINAL_MAX: f64 = 2.0;

const SCORE_MIN: f64 = 0.0;
const SCORE_MAX: f64 = 100.0;

/// Per-domain weights for the EQS
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqsWeights {
    pub air: f64,
    pub water: f64,
    pub soil: f64,
}

impl EqsWeights {
    pub fn total(&self) -> f64 {
        self.air + self.water + self.soil
    }

    /// Check that weights are non-negative and sum to one.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (domain, weight) in [
            (Domain::Air, self.air),
            (Domain::Water, self.water),
            (Domain::Soil, self.soil),
        ] {
            anyhow::ensure!(
                weight.is_finite() && weight >= 0.0,
                "{} weight must be a non-negative number, got {}",
                domain,
                weight
            );
        }

        anyhow::ensure!(
            (self.total() - 1.0).abs() <= 1e-6,
            "weights must sum to 1.0, got {:.4}",
            self.total()
        );

        Ok(())
    }
}

impl Default for EqsWeights {
    fn default() -> Self {
        Self {
            air: AIR_WEIGHT,
            water: WATER_WEIGHT,
            soil: SOIL_WEIGHT,
        }
    }
}

/// How raw water model output is mapped onto the 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterScale {
    /// Ordinal classes {0, 1, 2} map to {0, 50, 100}; any other value is
    /// already a 0-100 quality value and passes through.
    #[default]
    Adaptive,
    /// Every value is treated as a position on the 0-2 ordinal scale.
    Ordinal,
}

/// Raw model outputs for one request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPredictions {
    pub air: f64,
    pub water: f64,
    pub soil: f64,
}

impl RawPredictions {
    fn check_finite(&self) -> Result<()> {
        for (domain, value) in [
            (Domain::Air, self.air),
            (Domain::Water, self.water),
            (Domain::Soil, self.soil),
        ] {
            if !value.is_finite() {
                return Err(EqsError::InvalidInput(format!(
                    "{} prediction is not a finite number: {}",
                    domain, value
                )));
            }
        }
        Ok(())
    }
}

/// Normalized sub-scores, EQS and category for one request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqsBreakdown {
    pub air_score: f64,
    pub water_score: f64,
    pub soil_score: f64,
    pub eqs: f64,
    pub category: Category,
}

/// Combines per-domain model outputs into a single environmental quality score.
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    weights: EqsWeights,
    water_scale: WaterScale,
    scheme: CategoryScheme,
}

impl ScoreAggregator {
    /// Create a new score aggregator.
    pub fn new(weights: EqsWeights, water_scale: WaterScale, scheme: CategoryScheme) -> Self {
        Self {
            weights,
            water_scale,
            scheme,
        }
    }

    /// Invert an AQI-like prediction (higher is worse) into a 0-100 score.
    pub fn normalize_air(&self, raw_aqi: f64) -> f64 {
        clamp_score(SCORE_MAX - (raw_aqi / AQI_SCALE_MAX * SCORE_MAX))
    }

    /// Map a water prediction onto 0-100 according to the configured scale.
    pub fn normalize_water(&self, raw: f64) -> f64 {
        let score = match self.water_scale {
            WaterScale::Adaptive if !is_ordinal_class(raw) => raw,
            _ => raw / WATER_ORDINAL_MAX * SCORE_MAX,
        };
        clamp_score(score)
    }

    /// Soil predictions are already 0-100 quality values.
    pub fn normalize_soil(&self, raw: f64) -> f64 {
        clamp_score(raw)
    }

    /// Weighted combination of normalized sub-scores, clamped to [0, 100].
    pub fn compute_eqs(&self, air_score: f64, water_score: f64, soil_score: f64) -> f64 {
        clamp_score(
            self.weights.air * air_score
                + self.weights.water * water_score
                + self.weights.soil * soil_score,
        )
    }

    pub fn classify(&self, eqs: f64) -> Category {
        Category::from_eqs(eqs, self.scheme)
    }

    /// Normalize, combine and classify one set of raw predictions.
    pub fn aggregate(&self, raw: &RawPredictions) -> Result<EqsBreakdown> {
        raw.check_finite()?;

        let air_score = self.normalize_air(raw.air);
        let water_score = self.normalize_water(raw.water);
        let soil_score = self.normalize_soil(raw.soil);
        let eqs = self.compute_eqs(air_score, water_score, soil_score);

        Ok(EqsBreakdown {
            air_score,
            water_score,
            soil_score,
            eqs,
            category: self.classify(eqs),
        })
    }

    pub fn weights(&self) -> &EqsWeights {
        &self.weights
    }

    pub fn water_scale(&self) -> WaterScale {
        self.water_scale
    }

    pub fn scheme(&self) -> CategoryScheme {
        self.scheme
    }
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self::new(
            EqsWeights::default(),
            WaterScale::default(),
            CategoryScheme::default(),
        )
    }
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(SCORE_MIN, SCORE_MAX)
}

fn is_ordinal_class(raw: f64) -> bool {
    raw == 0.0 || raw == 1.0 || raw == 2.0
}
