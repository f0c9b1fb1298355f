/// LLM Client — the single point of entry for all generative-model calls.
///
/// ARCHITECTURAL RULE: No other module may call the model API directly.
/// Everything goes through a `ModelClient`, so the pipeline can be driven by a
/// scripted client in tests.
///
/// One attempt per call: a failed request is reported as unavailability and the
/// caller serves its fallback instead of retrying.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ModelSettings;

#[cfg(test)]
pub mod mock;
pub mod prompts;

const CONNECTION_PROBE_PROMPT: &str = "Say \"API is working\" if you can read this.";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Response blocked: {0}")]
    Blocked(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// A hosted text model. Implementations must be cheap to share across tasks.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends a single prompt and returns the model's raw text.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    fn model_name(&self) -> &str;

    /// Cheap round-trip used by the model health endpoint.
    async fn check_connection(&self) -> bool {
        match self.generate(CONNECTION_PROBE_PROMPT).await {
            Ok(text) => {
                info!(model = self.model_name(), reply = %text.trim(), "Model connection check passed");
                true
            }
            Err(e) => {
                warn!(model = self.model_name(), error = %e, "Model connection check failed");
                false
            }
        }
    }
}

/// Model text exactly as received. May be fenced, truncated, or not JSON at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelOutput(String);

impl RawModelOutput {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Result of a model invocation as seen by the orchestrator.
#[derive(Debug)]
pub enum ModelOutcome {
    Output(RawModelOutput),
    Unavailable(LlmError),
}

/// Calls the model once. Never fails outward: errors are logged and reported
/// as `ModelOutcome::Unavailable`.
pub async fn invoke_model(client: &dyn ModelClient, prompt: &str) -> ModelOutcome {
    match client.generate(prompt).await {
        Ok(text) => ModelOutcome::Output(RawModelOutput::new(text)),
        Err(e) => {
            warn!(model = client.model_name(), error = %e, "Model call failed, treating as unavailable");
            ModelOutcome::Unavailable(e)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini generateContent wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates.first()?.finish_reason.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// GeminiClient
// ────────────────────────────────────────────────────────────────────────────

/// Production `ModelClient` backed by the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    generation_config: GenerationConfig,
}

impl GeminiClient {
    pub fn new(settings: &ModelSettings) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            endpoint: format!(
                "{}/models/{}:generateContent",
                settings.api_base.trim_end_matches('/'),
                settings.model
            ),
            model: settings.model.clone(),
            generation_config: GenerationConfig {
                temperature: settings.temperature,
                top_k: settings.top_k,
                top_p: settings.top_p,
                max_output_tokens: settings.max_output_tokens,
            },
        })
    }

    /// Makes one raw call to the model, returning the full response object.
    pub async fn call(&self, prompt: &str) -> Result<GenerateResponse, LlmError> {
        let request_body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: self.generation_config.clone(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let generated: GenerateResponse = response.json().await?;

        if let Some(usage) = &generated.usage_metadata {
            debug!(
                "LLM call succeeded: prompt_tokens={}, output_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(generated)
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.call(prompt).await?;

        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Err(LlmError::Blocked(reason));
        }

        if response.finish_reason() == Some("MAX_TOKENS") {
            warn!(
                model = %self.model,
                max_output_tokens = self.generation_config.max_output_tokens,
                "Model output hit the token limit and is likely truncated"
            );
        }

        response.text().ok_or(LlmError::EmptyContent)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
