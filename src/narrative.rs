//! Narrative generation for assessment results
//!
//! The narrative is optional: the numeric result never depends on it, and any
//! failure here surfaces as [`EqsError::NarrativeUnavailable`].

use crate::config::NarrativeConfig;
use crate::error::{EqsError, Result};
use crate::models::aggregator::EqsBreakdown;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Produces a short free-text description of an assessment
pub trait NarrativeGenerator: Send + Sync {
    /// Disabled generators are skipped without being called
    fn is_enabled(&self) -> bool {
        true
    }

    fn describe(&self, breakdown: EqsBreakdown) -> impl Future<Output = Result<String>> + Send;
}

/// Build the prompt sent to the language model
pub fn build_prompt(breakdown: &EqsBreakdown, language: &str) -> String {
    format!(
        "Analyze the following environmental scores and provide a concise summary:\n\
         - Air Quality Score: {:.2}\n\
         - Water Quality Score: {:.2}\n\
         - Soil Quality Score: {:.2}\n\
         - Overall EQS: {:.2} ({})\n\n\
         Explain what these scores indicate about the environment, how good or bad the \
         overall quality is, and give one actionable suggestion for improvement.\n\
         Write plain text only without any formatting, 2-3 sentences, in {}, as a \
         description of the environmental quality.",
        breakdown.air_score,
        breakdown.water_score,
        breakdown.soil_score,
        breakdown.eqs,
        breakdown.category,
        language
    )
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Narrative generator backed by the Gemini `generateContent` API
#[derive(Clone)]
pub struct GeminiNarrator {
    client: reqwest::Client,
    url: String,
    api_key: String,
    language: String,
}

impl GeminiNarrator {
    pub fn new(config: &NarrativeConfig, api_key: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            url: format!(
                "{}/models/{}:generateContent",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
            api_key,
            language: config.language.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl NarrativeGenerator for GeminiNarrator {
    async fn describe(&self, breakdown: EqsBreakdown) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(build_prompt(&breakdown, &self.language)),
                }],
            }],
            generation_config: GenerationConfig {
                thinking_config: ThinkingConfig { thinking_budget: 0 },
            },
        };

        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EqsError::NarrativeUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EqsError::NarrativeUnavailable(format!(
                "narrative service returned HTTP {}",
                status
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| EqsError::NarrativeUnavailable(format!("malformed response: {}", e)))?;

        let text = body
            .into_text()
            .ok_or_else(|| EqsError::NarrativeUnavailable("empty response".to_string()))?;

        debug!(chars = text.len(), "Narrative generated");
        Ok(text)
    }
}

/// Narrator selected at startup
#[derive(Clone)]
pub enum Narrator {
    Gemini(GeminiNarrator),
    Disabled,
}

impl Narrator {
    /// Build the narrator from configuration.
    ///
    /// Falls back to [`Narrator::Disabled`] when narratives are turned off or
    /// the API key variable is unset.
    pub fn from_config(config: &NarrativeConfig) -> anyhow::Result<Self> {
        if !config.enabled {
            info!("Narrative generation disabled by configuration");
            return Ok(Narrator::Disabled);
        }

        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => {
                let narrator = GeminiNarrator::new(config, key)?;
                info!(
                    model = %config.model,
                    language = %config.language,
                    "Narrative generation enabled"
                );
                Ok(Narrator::Gemini(narrator))
            }
            _ => {
                warn!(
                    api_key_env = %config.api_key_env,
                    "API key not set, narrative generation disabled"
                );
                Ok(Narrator::Disabled)
            }
        }
    }
}

impl NarrativeGenerator for Narrator {
    fn is_enabled(&self) -> bool {
        matches!(self, Narrator::Gemini(_))
    }

    async fn describe(&self, breakdown: EqsBreakdown) -> Result<String> {
        match self {
            Narrator::Gemini(gemini) => gemini.describe(breakdown).await,
            Narrator::Disabled => Err(EqsError::NarrativeUnavailable(
                "narrative generation disabled".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::category::Category;

    fn breakdown() -> EqsBreakdown {
        EqsBreakdown {
            air_score: 78.0,
            water_score: 100.0,
            soil_score: 62.0,
            eqs: 79.8,
            category: Category::Good,
        }
    }

    fn config(enabled: bool, api_key_env: &str) -> NarrativeConfig {
        NarrativeConfig {
            enabled,
            endpoint: "https://generativelanguage.googleapis.com/v1beta/".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: api_key_env.to_string(),
            timeout_ms: 500,
            language: "Indonesian".to_string(),
        }
    }

    #[test]
    fn test_prompt_contains_scores() {
        let prompt = build_prompt(&breakdown(), "Indonesian");
        assert!(prompt.contains("Air Quality Score: 78.00"));
        assert!(prompt.contains("Overall EQS: 79.80 (Good)"));
        assert!(prompt.contains("in Indonesian"));
    }

    #[test]
    fn test_request_body_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some("hello".to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                thinking_config: ThinkingConfig { thinking_budget: 0 },
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["thinkingConfig"]["thinkingBudget"], 0);
    }

    #[test]
    fn test_response_text_extraction() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"  Kualitas udara baik. "},{"text":"Tanah cukup."}],"role":"model"}}]}"#,
        )
        .unwrap();
        assert_eq!(body.into_text().unwrap(), "Kualitas udara baik. Tanah cukup.");

        let empty: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.into_text().is_none());
    }

    #[test]
    fn test_gemini_url() {
        let narrator = GeminiNarrator::new(&config(true, "UNUSED"), "key".to_string()).unwrap();
        assert_eq!(
            narrator.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_disabled_by_config() {
        let narrator = Narrator::from_config(&config(false, "GEMINI_API_KEY")).unwrap();
        assert!(!narrator.is_enabled());
    }

    #[test]
    fn test_disabled_without_key() {
        let narrator =
            Narrator::from_config(&config(true, "EQS_TEST_KEY_THAT_IS_NEVER_SET")).unwrap();
        assert!(!narrator.is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_narrator_is_unavailable() {
        let err = Narrator::Disabled.describe(breakdown()).await.unwrap_err();
        assert!(matches!(err, EqsError::NarrativeUnavailable(_)));
    }
}
