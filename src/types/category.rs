//! Qualitative labels derived from scores

use serde::{Deserialize, Serialize};
use std::fmt;

/// Environmental quality category derived from the EQS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Excellent,
    Good,
    Moderate,
    Poor,
    Critical,
}

impl Category {
    /// Determine the category of a (clamped) EQS under the given scheme.
    ///
    /// Each tier includes its lower bound, so a score sitting exactly on a
    /// threshold belongs to the higher tier. NaN falls through to the lowest
    /// tier.
    pub fn from_eqs(eqs: f64, scheme: CategoryScheme) -> Self {
        match scheme {
            CategoryScheme::ThreeTier => {
                if eqs >= 70.0 {
                    Category::Good
                } else if eqs >= 35.0 {
                    Category::Moderate
                } else {
                    Category::Poor
                }
            }
            CategoryScheme::FiveTier => {
                if eqs >= 80.0 {
                    Category::Excellent
                } else if eqs >= 60.0 {
                    Category::Good
                } else if eqs >= 40.0 {
                    Category::Moderate
                } else if eqs >= 20.0 {
                    Category::Poor
                } else {
                    Category::Critical
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Excellent => "Excellent",
            Category::Good => "Good",
            Category::Moderate => "Moderate",
            Category::Poor => "Poor",
            Category::Critical => "Critical",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threshold scheme used to classify the EQS.
///
/// The two schemes are not equivalent; a deployment selects exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryScheme {
    /// Good >= 70, Moderate >= 35, Poor below
    #[default]
    ThreeTier,
    /// Excellent >= 80, Good >= 60, Moderate >= 40, Poor >= 20, Critical below
    FiveTier,
}

/// Air quality index band for a raw AQI prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AqiBand {
    Good,
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    Hazardous,
}

impl AqiBand {
    pub fn from_aqi(aqi: f64) -> Self {
        if aqi <= 50.0 {
            AqiBand::Good
        } else if aqi <= 100.0 {
            AqiBand::Moderate
        } else if aqi <= 150.0 {
            AqiBand::UnhealthyForSensitiveGroups
        } else if aqi <= 200.0 {
            AqiBand::Unhealthy
        } else if aqi <= 300.0 {
            AqiBand::VeryUnhealthy
        } else {
            AqiBand::Hazardous
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AqiBand::Good => "Good",
            AqiBand::Moderate => "Moderate",
            AqiBand::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiBand::Unhealthy => "Unhealthy",
            AqiBand::VeryUnhealthy => "Very Unhealthy",
            AqiBand::Hazardous => "Hazardous",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_tier_boundaries() {
        let scheme = CategoryScheme::ThreeTier;
        assert_eq!(Category::from_eqs(70.0, scheme), Category::Good);
        assert_eq!(Category::from_eqs(69.99, scheme), Category::Moderate);
        assert_eq!(Category::from_eqs(35.0, scheme), Category::Moderate);
        assert_eq!(Category::from_eqs(34.99, scheme), Category::Poor);
        assert_eq!(Category::from_eqs(100.0, scheme), Category::Good);
        assert_eq!(Category::from_eqs(0.0, scheme), Category::Poor);
    }

    #[test]
    fn test_five_tier_boundaries() {
        let scheme = CategoryScheme::FiveTier;
        assert_eq!(Category::from_eqs(80.0, scheme), Category::Excellent);
        assert_eq!(Category::from_eqs(79.8, scheme), Category::Good);
        assert_eq!(Category::from_eqs(60.0, scheme), Category::Good);
        assert_eq!(Category::from_eqs(59.99, scheme), Category::Moderate);
        assert_eq!(Category::from_eqs(40.0, scheme), Category::Moderate);
        assert_eq!(Category::from_eqs(20.0, scheme), Category::Poor);
        assert_eq!(Category::from_eqs(19.99, scheme), Category::Critical);
    }

    #[test]
    fn test_classification_is_total() {
        for scheme in [CategoryScheme::ThreeTier, CategoryScheme::FiveTier] {
            let _ = Category::from_eqs(f64::NEG_INFINITY, scheme);
            let _ = Category::from_eqs(f64::INFINITY, scheme);
            let _ = Category::from_eqs(f64::NAN, scheme);
        }
        assert_eq!(Category::from_eqs(f64::NAN, CategoryScheme::FiveTier), Category::Critical);
    }

    #[test]
    fn test_category_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Category::Moderate).unwrap(), "\"Moderate\"");
        let scheme: CategoryScheme = serde_json::from_str("\"five_tier\"").unwrap();
        assert_eq!(scheme, CategoryScheme::FiveTier);
    }

    #[test]
    fn test_aqi_bands() {
        assert_eq!(AqiBand::from_aqi(50.0), AqiBand::Good);
        assert_eq!(AqiBand::from_aqi(110.0), AqiBand::UnhealthyForSensitiveGroups);
        assert_eq!(AqiBand::from_aqi(300.0), AqiBand::VeryUnhealthy);
        assert_eq!(AqiBand::from_aqi(420.0), AqiBand::Hazardous);
        assert_eq!(AqiBand::Unhealthy.as_str(), "Unhealthy");
    }
}
