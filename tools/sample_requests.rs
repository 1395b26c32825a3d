//! Sample Request Generator
//!
//! Generates plausible sensor readings and posts them to the `/predict`
//! endpoint for end-to-end testing of the service.

use rand::Rng;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{info, warn};

/// Readings generator for testing
struct ReadingsGenerator {
    rng: rand::rngs::ThreadRng,
    request_counter: u64,
}

impl ReadingsGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            request_counter: 0,
        }
    }

    /// Use the dataset column name or its identifier-style alias at random,
    /// so both spellings get exercised.
    fn field(&mut self, map: &mut Map<String, Value>, canonical: &str, alias: &str, value: f64) {
        let key = if self.rng.gen_bool(0.5) { canonical } else { alias };
        map.insert(key.to_string(), json!((value * 1000.0).round() / 1000.0));
    }

    /// Generate readings from a clean site
    fn generate_clean(&mut self) -> Value {
        self.request_counter += 1;

        let mut air = Map::new();
        let value = self.rng.gen_range(0.2..1.5);
        self.field(&mut air, "CO(GT)", "CO_GT", value);
        let value = self.rng.gen_range(10.0..60.0);
        self.field(&mut air, "NO2(GT)", "NO2_GT", value);
        let value = self.rng.gen_range(400.0..900.0);
        self.field(&mut air, "PT08.S5(O3)", "PT08_S5_O3", value);
        air.insert("T".into(), json!(self.rng.gen_range(15.0..28.0)));
        air.insert("RH".into(), json!(self.rng.gen_range(35.0..60.0)));
        air.insert("AH".into(), json!(self.rng.gen_range(0.6..1.2)));

        let mut water = Map::new();
        water.insert("Temp".into(), json!(self.rng.gen_range(24.0..30.0)));
        let value = self.rng.gen_range(30.0..60.0);
        self.field(&mut water, "Turbidity (cm)", "Turbidity_cm", value);
        let value = self.rng.gen_range(5.0..8.0);
        self.field(&mut water, "DO(mg/L)", "DO_mg_L", value);
        let value = self.rng.gen_range(1.0..3.0);
        self.field(&mut water, "BOD (mg/L)", "BOD_mg_L", value);
        water.insert("CO2".into(), json!(self.rng.gen_range(4.0..8.0)));
        water.insert("pH".into(), json!(self.rng.gen_range(7.0..8.2)));
        let value = self.rng.gen_range(60.0..120.0);
        self.field(&mut water, "Alkalinity (mg L-1 )", "Alkalinity_mg_L", value);
        let value = self.rng.gen_range(80.0..150.0);
        self.field(&mut water, "Hardness (mg L-1 )", "Hardness_mg_L", value);
        let value = self.rng.gen_range(40.0..90.0);
        self.field(&mut water, "Calcium (mg L-1 )", "Calcium_mg_L", value);
        let value = self.rng.gen_range(0.0..0.02);
        self.field(&mut water, "Ammonia (mg L-1 )", "Ammonia_mg_L", value);
        let value = self.rng.gen_range(0.0..0.02);
        self.field(&mut water, "Nitrite (mg L-1 )", "Nitrite_mg_L", value);
        let value = self.rng.gen_range(0.03..0.5);
        self.field(&mut water, "Phosphorus (mg L-1 )", "Phosphorus_mg_L", value);
        let value = self.rng.gen_range(0.0..0.01);
        self.field(&mut water, "H2S (mg L-1 )", "H2S_mg_L", value);
        let value = self.rng.gen_range(2000.0..4500.0);
        self.field(&mut water, "Plankton (No. L-1)", "Plankton_No_L", value);

        json!({
            "air": air,
            "water": water,
            "soil": self.soil(0.8),
        })
    }

    /// Generate readings from a polluted site
    fn generate_polluted(&mut self) -> Value {
        self.request_counter += 1;

        let mut air = Map::new();
        let value = self.rng.gen_range(3.0..10.0);
        self.field(&mut air, "CO(GT)", "CO_GT", value); // High CO
        let value = self.rng.gen_range(150.0..300.0);
        self.field(&mut air, "NO2(GT)", "NO2_GT", value);
        let value = self.rng.gen_range(1500.0..2500.0);
        self.field(&mut air, "PT08.S5(O3)", "PT08_S5_O3", value);
        air.insert("T".into(), json!(self.rng.gen_range(28.0..40.0)));
        air.insert("RH".into(), json!(self.rng.gen_range(20.0..40.0)));
        air.insert("AH".into(), json!(self.rng.gen_range(0.8..2.0)));

        let mut water = Map::new();
        water.insert("Temp".into(), json!(self.rng.gen_range(30.0..36.0)));
        let value = self.rng.gen_range(5.0..20.0);
        self.field(&mut water, "Turbidity (cm)", "Turbidity_cm", value);
        let value = self.rng.gen_range(0.5..3.0);
        self.field(&mut water, "DO(mg/L)", "DO_mg_L", value); // Low oxygen
        let value = self.rng.gen_range(6.0..15.0);
        self.field(&mut water, "BOD (mg/L)", "BOD_mg_L", value);
        water.insert("CO2".into(), json!(self.rng.gen_range(12.0..25.0)));
        water.insert("pH".into(), json!(self.rng.gen_range(5.0..6.5)));
        let value = self.rng.gen_range(0.1..1.0);
        self.field(&mut water, "Ammonia (mg L-1 )", "Ammonia_mg_L", value);
        let value = self.rng.gen_range(0.05..0.3);
        self.field(&mut water, "H2S (mg L-1 )", "H2S_mg_L", value);

        json!({
            "air": air,
            "water": water,
            "soil": self.soil(0.3),
        })
    }

    /// Soil readings; `fertility` in [0, 1] scales the nutrient levels
    fn soil(&mut self, fertility: f64) -> Value {
        let mut soil = Map::new();
        soil.insert("N".into(), json!(self.rng.gen_range(50.0..300.0) * fertility));
        soil.insert("P".into(), json!(self.rng.gen_range(5.0..40.0) * fertility));
        soil.insert("K".into(), json!(self.rng.gen_range(100.0..800.0) * fertility));
        let value = self.rng.gen_range(5.5..8.0);
        self.field(&mut soil, "ph", "pH", value);
        soil.insert("EC".into(), json!(self.rng.gen_range(0.1..1.0)));
        for element in ["S", "Cu", "Fe", "Mn", "Zn", "B"] {
            soil.insert(element.into(), json!(self.rng.gen_range(0.1..10.0) * fertility));
        }
        Value::Object(soil)
    }
}

/// Parse a probability argument, clamped to [0, 1]
fn parse_rate(arg: Option<&str>, default: f64) -> f64 {
    arg.and_then(|s| s.parse::<f64>().ok())
        .filter(|rate| rate.is_finite())
        .unwrap_or(default)
        .clamp(0.0, 1.0)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_requests=info".parse()?),
        )
        .init();

    info!("Starting sample request generator");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let base_url = args.get(1).map(|s| s.as_str()).unwrap_or("http://localhost:8000");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(20);
    let polluted_rate = parse_rate(args.get(3).map(|s| s.as_str()), 0.3);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(250);

    info!(
        base_url = %base_url,
        count = count,
        polluted_rate = polluted_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let health_url = format!("{}/health", base_url.trim_end_matches('/'));
    let predict_url = format!("{}/predict", base_url.trim_end_matches('/'));

    if let Err(e) = client.get(&health_url).send().await {
        warn!(error = %e, "Service unreachable. Running in dry-run mode.");
        return run_dry_mode(count, polluted_rate, delay_ms).await;
    }

    let mut generator = ReadingsGenerator::new();
    let mut rng = rand::thread_rng();
    let mut failures = 0;

    for i in 0..count {
        let payload = if rng.gen_bool(polluted_rate) {
            generator.generate_polluted()
        } else {
            generator.generate_clean()
        };

        match client.post(&predict_url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                let report: Value = response.json().await?;
                info!(
                    request = generator.request_counter,
                    eqs = %report["eqs"],
                    category = %report["category"],
                    narrative = %report["narrative_status"],
                    "Assessment received"
                );
            }
            Ok(response) => {
                failures += 1;
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "Assessment rejected");
            }
            Err(e) => {
                failures += 1;
                warn!(error = %e, "Request failed");
            }
        }

        if (i + 1) % 10 == 0 {
            info!("Sent {}/{} requests ({} failed)", i + 1, count, failures);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!("Completed! Sent {} requests ({} failed)", count, failures);

    Ok(())
}

async fn run_dry_mode(count: u64, polluted_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no service connection)");

    let mut generator = ReadingsGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let payload = if rng.gen_bool(polluted_rate) {
            generator.generate_polluted()
        } else {
            generator.generate_clean()
        };

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}:\n{}", i + 1, serde_json::to_string_pretty(&payload)?);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate(None, 0.3), 0.3);
        assert_eq!(parse_rate(Some("0.75"), 0.3), 0.75);
        assert_eq!(parse_rate(Some("1.5"), 0.3), 1.0);
        assert_eq!(parse_rate(Some("-2"), 0.3), 0.0);
        assert_eq!(parse_rate(Some("NaN"), 0.3), 0.3);
        assert_eq!(parse_rate(Some("lots"), 0.3), 0.3);
    }
}
