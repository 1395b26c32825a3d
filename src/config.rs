//! Configuration management for the environmental quality service

use crate::models::aggregator::{EqsWeights, WaterScale};
use crate::types::category::CategoryScheme;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    pub narrative: NarrativeConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Interval between metrics summaries in the log (seconds)
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    60
}

/// Domain model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing ONNX model and scaler files
    pub models_dir: String,
    /// Number of threads for ONNX inference per model (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    #[serde(default = "default_air_model")]
    pub air_model: String,
    #[serde(default = "default_water_model")]
    pub water_model: String,
    #[serde(default = "default_soil_model")]
    pub soil_model: String,
    /// Output to read predictions from; the first model output when unset
    #[serde(default)]
    pub output_name: Option<String>,
}

fn default_onnx_threads() -> usize {
    1
}

fn default_air_model() -> String {
    "air_model.onnx".to_string()
}

fn default_water_model() -> String {
    "water_model.onnx".to_string()
}

fn default_soil_model() -> String {
    "soil_model.onnx".to_string()
}

/// Score aggregation configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringConfig {
    /// Domain weights for the EQS
    #[serde(default)]
    pub weights: EqsWeights,
    /// Water normalization: "adaptive" or "ordinal"
    #[serde(default)]
    pub water_scale: WaterScale,
    /// Category thresholds: "three_tier" or "five_tier"
    #[serde(default)]
    pub category_scheme: CategoryScheme,
}

/// Narrative generation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NarrativeConfig {
    /// Whether to request narratives at all
    pub enabled: bool,
    /// Generative Language API base URL
    #[serde(default = "default_narrative_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_narrative_model")]
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Upper bound on narrative latency in milliseconds
    #[serde(default = "default_narrative_timeout")]
    pub timeout_ms: u64,
    /// Language of the generated description
    #[serde(default = "default_narrative_language")]
    pub language: String,
}

fn default_narrative_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_narrative_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_narrative_timeout() -> u64 {
    8000
}

fn default_narrative_language() -> String {
    "Indonesian".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from `EQS_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("EQS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path, with `EQS__` environment overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("EQS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<()> {
        self.scoring
            .weights
            .validate()
            .context("Invalid scoring weights")?;
        anyhow::ensure!(self.models.onnx_threads > 0, "models.onnx_threads must be at least 1");
        anyhow::ensure!(self.narrative.timeout_ms > 0, "narrative.timeout_ms must be positive");
        anyhow::ensure!(
            matches!(self.logging.format.as_str(), "json" | "pretty"),
            "logging.format must be \"json\" or \"pretty\", got {:?}",
            self.logging.format
        );
        Ok(())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                metrics_interval_secs: default_metrics_interval(),
            },
            models: ModelsConfig {
                models_dir: "models".to_string(),
                onnx_threads: default_onnx_threads(),
                air_model: default_air_model(),
                water_model: default_water_model(),
                soil_model: default_soil_model(),
                output_name: None,
            },
            scoring: ScoringConfig::default(),
            narrative: NarrativeConfig {
                enabled: true,
                endpoint: default_narrative_endpoint(),
                model: default_narrative_model(),
                api_key_env: default_api_key_env(),
                timeout_ms: default_narrative_timeout(),
                language: default_narrative_language(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
