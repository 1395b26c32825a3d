//! Feature extraction for air, water and soil model inference.
//!
//! Features are emitted in the column order the models were trained on,
//! then standardized with the per-domain scaler fitted during training.

use crate::types::readings::{AirReadings, Domain, SoilReadings, WaterReadings};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

const AIR_FEATURES: [&str; 6] = ["CO(GT)", "NO2(GT)", "PT08.S5(O3)", "T", "RH", "AH"];

const WATER_FEATURES: [&str; 14] = [
    "Temp",
    "Turbidity (cm)",
    "DO(mg/L)",
    "BOD (mg/L)",
    "CO2",
    "pH",
    "Alkalinity (mg L-1 )",
    "Hardness (mg L-1 )",
    "Calcium (mg L-1 )",
    "Ammonia (mg L-1 )",
    "Nitrite (mg L-1 )",
    "Phosphorus (mg L-1 )",
    "H2S (mg L-1 )",
    "Plankton (No. L-1)",
];

const SOIL_FEATURES: [&str; 11] = ["N", "P", "K", "ph", "EC", "S", "Cu", "Fe", "Mn", "Zn", "B"];

/// Standard scaler parameters exported from training (`mean_` and `scale_`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Load scaler parameters from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scaler from {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse scaler {}", path.display()))
    }

    /// Standardize features in place: `(x - mean) / scale`.
    ///
    /// A zero scale leaves the centered value unscaled.
    pub fn transform(&self, features: &mut [f32]) {
        for ((x, &mean), &scale) in features.iter_mut().zip(&self.mean).zip(&self.scale) {
            let scale = if scale == 0.0 { 1.0 } else { scale };
            *x = ((*x as f64 - mean) / scale) as f32;
        }
    }
}

/// Feature extractor that transforms readings into model input features.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    air_scaler: Option<StandardScaler>,
    water_scaler: Option<StandardScaler>,
    soil_scaler: Option<StandardScaler>,
}

impl FeatureExtractor {
    /// Create an extractor without scaling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `scaler_<domain>.json` files from the models directory.
    ///
    /// Missing scaler files mean the model takes unscaled features.
    pub fn from_models_dir<P: AsRef<Path>>(models_dir: P) -> Result<Self> {
        let models_dir = models_dir.as_ref();
        let mut extractor = Self::new();

        for domain in Domain::ALL {
            let path = models_dir.join(format!("scaler_{}.json", domain));
            if !path.exists() {
                warn!(
                    domain = %domain,
                    path = %path.display(),
                    "Scaler not found, using raw features"
                );
                continue;
            }

            let scaler = StandardScaler::load(&path)?;
            extractor = extractor.with_scaler(domain, scaler)?;
            info!(domain = %domain, path = %path.display(), "Scaler loaded");
        }

        Ok(extractor)
    }

    /// Attach a scaler for one domain, checking it matches the feature count.
    pub fn with_scaler(mut self, domain: Domain, scaler: StandardScaler) -> Result<Self> {
        let expected = self.feature_count(domain);
        anyhow::ensure!(
            scaler.mean.len() == expected && scaler.scale.len() == expected,
            "{} scaler has {} means and {} scales, expected {}",
            domain,
            scaler.mean.len(),
            scaler.scale.len(),
            expected
        );

        match domain {
            Domain::Air => self.air_scaler = Some(scaler),
            Domain::Water => self.water_scaler = Some(scaler),
            Domain::Soil => self.soil_scaler = Some(scaler),
        }
        Ok(self)
    }

    /// Extract air features (6).
    pub fn extract_air(&self, r: &AirReadings) -> Vec<f32> {
        let features = [
            r.co_gt,
            r.no2_gt,
            r.pt08_s5_o3,
            r.temperature,
            r.relative_humidity,
            r.absolute_humidity,
        ];
        self.finish(&features, self.air_scaler.as_ref())
    }

    /// Extract water features (14).
    pub fn extract_water(&self, r: &WaterReadings) -> Vec<f32> {
        let features = [
            r.temp,
            r.turbidity_cm,
            r.do_mg_l,
            r.bod_mg_l,
            r.co2,
            r.ph,
            r.alkalinity_mg_l,
            r.hardness_mg_l,
            r.calcium_mg_l,
            r.ammonia_mg_l,
            r.nitrite_mg_l,
            r.phosphorus_mg_l,
            r.h2s_mg_l,
            r.plankton_no_l,
        ];
        self.finish(&features, self.water_scaler.as_ref())
    }

    /// Extract soil features (11).
    pub fn extract_soil(&self, r: &SoilReadings) -> Vec<f32> {
        let features = [
            r.n, r.p, r.k, r.ph, r.ec, r.s, r.cu, r.fe, r.mn, r.zn, r.b,
        ];
        self.finish(&features, self.soil_scaler.as_ref())
    }

    fn finish(&self, raw: &[f64], scaler: Option<&StandardScaler>) -> Vec<f32> {
        let mut features: Vec<f32> = raw.iter().map(|&x| x as f32).collect();
        if let Some(scaler) = scaler {
            scaler.transform(&mut features);
        }
        features
    }

    /// Number of features the domain's model expects.
    pub fn feature_count(&self, domain: Domain) -> usize {
        self.feature_names(domain).len()
    }

    /// Canonical feature names in model input order.
    pub fn feature_names(&self, domain: Domain) -> &'static [&'static str] {
        match domain {
            Domain::Air => &AIR_FEATURES,
            Domain::Water => &WATER_FEATURES,
            Domain::Soil => &SOIL_FEATURES,
        }
    }

    pub fn is_scaled(&self, domain: Domain) -> bool {
        match domain {
            Domain::Air => self.air_scaler.is_some(),
            Domain::Water => self.water_scaler.is_some(),
            Domain::Soil => self.soil_scaler.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_counts() {
        let extractor = FeatureExtractor::new();
        assert_eq!(extractor.feature_count(Domain::Air), 6);
        assert_eq!(extractor.feature_count(Domain::Water), 14);
        assert_eq!(extractor.feature_count(Domain::Soil), 11);

        assert_eq!(extractor.extract_air(&AirReadings::default()).len(), 6);
        assert_eq!(extractor.extract_water(&WaterReadings::default()).len(), 14);
        assert_eq!(extractor.extract_soil(&SoilReadings::default()).len(), 11);
    }

    #[test]
    fn test_air_feature_order() {
        let extractor = FeatureExtractor::new();
        let readings = AirReadings {
            co_gt: 2.6,
            no2_gt: 113.0,
            pt08_s5_o3: 1268.0,
            temperature: 13.6,
            relative_humidity: 48.9,
            absolute_humidity: 0.7578,
        };

        let features = extractor.extract_air(&readings);
        assert_eq!(features[0], 2.6);
        assert_eq!(features[2], 1268.0);
        assert_eq!(features[5], 0.7578);
    }

    #[test]
    fn test_soil_feature_order_matches_names() {
        let extractor = FeatureExtractor::new();
        let readings = SoilReadings {
            ph: 6.5,
            b: 0.9,
            ..Default::default()
        };

        let features = extractor.extract_soil(&readings);
        let names = extractor.feature_names(Domain::Soil);
        let ph_idx = names.iter().position(|&n| n == "ph").unwrap();
        assert_eq!(features[ph_idx], 6.5);
        assert_eq!(features[names.len() - 1], 0.9);
    }

    #[test]
    fn test_scaler_applied() {
        let scaler = StandardScaler {
            mean: vec![10.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            scale: vec![2.0, 1.0, 1.0, 1.0, 1.0, 0.0],
        };
        let extractor = FeatureExtractor::new()
            .with_scaler(Domain::Air, scaler)
            .unwrap();

        let readings = AirReadings {
            co_gt: 14.0,
            absolute_humidity: 3.0,
            ..Default::default()
        };

        let features = extractor.extract_air(&readings);
        assert_eq!(features[0], 2.0);
        assert_eq!(features[5], 3.0); // zero scale leaves value centered only
        assert!(extractor.is_scaled(Domain::Air));
        assert!(!extractor.is_scaled(Domain::Water));
    }

    #[test]
    fn test_scaler_length_mismatch() {
        let scaler = StandardScaler {
            mean: vec![0.0; 3],
            scale: vec![1.0; 3],
        };
        assert!(FeatureExtractor::new().with_scaler(Domain::Soil, scaler).is_err());
    }

    #[test]
    fn test_scaler_loaded_from_dir() {
        let dir = std::env::temp_dir().join(format!("eqs-scalers-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("scaler_soil.json"),
            serde_json::json!({"mean": vec![1.0; 11], "scale": vec![2.0; 11]}).to_string(),
        )
        .unwrap();

        let extractor = FeatureExtractor::from_models_dir(&dir).unwrap();
        assert!(extractor.is_scaled(Domain::Soil));
        assert!(!extractor.is_scaled(Domain::Air));

        let features = extractor.extract_soil(&SoilReadings {
            n: 5.0,
            ..Default::default()
        });
        assert_eq!(features[0], 2.0);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
