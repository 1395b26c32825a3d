//! Sensor reading records for air, water and soil models
//!
//! Each record accepts the dataset's canonical column names (e.g. `"CO(GT)"`)
//! as well as identifier-style spellings (e.g. `"CO_GT"`). Missing fields
//! default to zero; non-numeric values are rejected during deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Environmental domain covered by one model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Air,
    Water,
    Soil,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Air, Domain::Water, Domain::Soil];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Air => "air",
            Domain::Water => "water",
            Domain::Soil => "soil",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Air quality sensor readings (UCI Air Quality columns)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirReadings {
    /// True hourly averaged CO concentration (mg/m^3)
    #[serde(rename = "CO(GT)", alias = "CO_GT")]
    pub co_gt: f64,

    /// True hourly averaged NO2 concentration (microg/m^3)
    #[serde(rename = "NO2(GT)", alias = "NO2_GT")]
    pub no2_gt: f64,

    /// Tungsten oxide sensor response (nominally O3 targeted)
    #[serde(rename = "PT08.S5(O3)", alias = "PT08_S5_O3")]
    pub pt08_s5_o3: f64,

    /// Temperature (°C)
    #[serde(rename = "T")]
    pub temperature: f64,

    /// Relative humidity (%)
    #[serde(rename = "RH")]
    pub relative_humidity: f64,

    /// Absolute humidity
    #[serde(rename = "AH")]
    pub absolute_humidity: f64,
}

/// Water quality readings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterReadings {
    #[serde(rename = "Temp")]
    pub temp: f64,

    #[serde(rename = "Turbidity (cm)", alias = "Turbidity_cm")]
    pub turbidity_cm: f64,

    /// Dissolved oxygen
    #[serde(rename = "DO(mg/L)", alias = "DO_mg_L")]
    pub do_mg_l: f64,

    /// Biochemical oxygen demand
    #[serde(rename = "BOD (mg/L)", alias = "BOD_mg_L")]
    pub bod_mg_l: f64,

    #[serde(rename = "CO2")]
    pub co2: f64,

    #[serde(rename = "pH")]
    pub ph: f64,

    #[serde(rename = "Alkalinity (mg L-1 )", alias = "Alkalinity_mg_L")]
    pub alkalinity_mg_l: f64,

    #[serde(rename = "Hardness (mg L-1 )", alias = "Hardness_mg_L")]
    pub hardness_mg_l: f64,

    #[serde(rename = "Calcium (mg L-1 )", alias = "Calcium_mg_L")]
    pub calcium_mg_l: f64,

    #[serde(rename = "Ammonia (mg L-1 )", alias = "Ammonia_mg_L")]
    pub ammonia_mg_l: f64,

    #[serde(rename = "Nitrite (mg L-1 )", alias = "Nitrite_mg_L")]
    pub nitrite_mg_l: f64,

    #[serde(rename = "Phosphorus (mg L-1 )", alias = "Phosphorus_mg_L")]
    pub phosphorus_mg_l: f64,

    #[serde(rename = "H2S (mg L-1 )", alias = "H2S_mg_L")]
    pub h2s_mg_l: f64,

    #[serde(rename = "Plankton (No. L-1)", alias = "Plankton_No_L")]
    pub plankton_no_l: f64,
}

/// Soil nutrient readings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilReadings {
    /// Nitrogen
    #[serde(rename = "N")]
    pub n: f64,
    /// Phosphorus
    #[serde(rename = "P")]
    pub p: f64,
    /// Potassium
    #[serde(rename = "K")]
    pub k: f64,
    #[serde(rename = "ph", alias = "pH")]
    pub ph: f64,
    /// Electrical conductivity
    #[serde(rename = "EC")]
    pub ec: f64,
    /// Sulfur
    #[serde(rename = "S")]
    pub s: f64,
    /// Copper
    #[serde(rename = "Cu")]
    pub cu: f64,
    /// Iron
    #[serde(rename = "Fe")]
    pub fe: f64,
    /// Manganese
    #[serde(rename = "Mn")]
    pub mn: f64,
    /// Zinc
    #[serde(rename = "Zn")]
    pub zn: f64,
    /// Boron
    #[serde(rename = "B")]
    pub b: f64,
}

/// Full assessment request carrying readings for all three domains
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EqsRequest {
    #[serde(default)]
    pub air: AirReadings,
    #[serde(default)]
    pub water: WaterReadings,
    #[serde(default)]
    pub soil: SoilReadings,
}
