//! Gemini `generateContent` client used as the fault oracle.

use async_trait::async_trait;
use faultline_core::DriverType;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classifier::{FaultOracle, OracleError};
use crate::rules::parse_verdict;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Connection settings for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// Like `https://generativelanguage.googleapis.com/v1beta` (no trailing slash).
    pub base_url: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Prompt sent for one letter excerpt.
pub fn build_prompt(excerpt: &str) -> String {
    format!(
        "Analyze this letter about a car accident and determine if this person is likely at fault.\n\
         Return ONLY \"fault\" or \"not_fault\" as a single word answer.\n\
         Letter: {excerpt}"
    )
}

/// Fault oracle backed by a Gemini model.
pub struct GeminiOracle {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiOracle {
    pub fn new(mut config: GeminiConfig) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.config.api_key
        )
    }
}

#[async_trait]
impl FaultOracle for GeminiOracle {
    async fn classify(&self, excerpt: &str) -> Result<DriverType, OracleError> {
        let prompt = build_prompt(excerpt);
        let body = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: &prompt }],
            }],
        };

        // The endpoint carries the API key, so only the model is logged.
        info!(model = %self.config.model, "asking classification service for a verdict");
        let resp = self.client.post(self.endpoint()).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OracleError::Server {
                status: status.as_u16(),
                body,
            });
        }

        // A successful call always yields a label: no answer reads as not fault.
        let parsed: GenerateResponse = resp.json().await?;
        let answer = parsed.first_text().unwrap_or_default();
        if answer.trim().is_empty() {
            warn!(model = %self.config.model, "classification service returned no answer text");
        }

        let verdict = parse_verdict(&answer);
        info!(answer = %answer.trim(), %verdict, "classification service answered");
        Ok(verdict)
    }
}
