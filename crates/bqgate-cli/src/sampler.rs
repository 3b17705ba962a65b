//! Model participant backed by the Anthropic Messages API.

use async_trait::async_trait;
use bqgate_approval::{ParticipantError, SamplingParticipant, SamplingRequest, SamplingResponse};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Connection settings for [`ClaudeSampler`].
#[derive(Clone)]
pub struct SamplerConfig {
    api_key: String,
    /// Model name.
    pub model: String,
    /// Endpoint override.
    pub base_url: Option<String>,
}

impl std::fmt::Debug for SamplerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplerConfig")
            .field("has_api_key", &self.has_api_key())
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl SamplerConfig {
    /// Settings with the given key and the default model.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "claude-3-5-haiku-latest".to_owned(),
            base_url: None,
        }
    }

    /// Set the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the endpoint.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Whether a key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Asks a Claude model for the approval judgment.
#[derive(Debug, Clone)]
pub struct ClaudeSampler {
    client: Client,
    config: SamplerConfig,
}

impl ClaudeSampler {
    /// Create a sampler.
    #[must_use]
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn build_request(&self, request: &SamplingRequest) -> Value {
        serde_json::json!({
            "model": self.config.model,
            "max_tokens": request.max_tokens,
            "system": request.system,
            "messages": [{ "role": "user", "content": request.prompt }],
        })
    }
}

#[async_trait]
impl SamplingParticipant for ClaudeSampler {
    async fn sample(&self, request: SamplingRequest) -> Result<SamplingResponse, ParticipantError> {
        if !self.config.has_api_key() {
            return Err(ParticipantError::Unavailable(
                "no API key configured for sampling (set ANTHROPIC_API_KEY)".to_owned(),
            ));
        }

        let url = self.config.base_url.as_deref().unwrap_or(ANTHROPIC_API_URL);
        debug!(model = self.config.model, %request.request_id, "sending approval prompt");

        let mut api_key_header = reqwest::header::HeaderValue::try_from(&self.config.api_key)
            .map_err(|e| ParticipantError::Unavailable(format!("invalid API key characters: {e}")))?;
        api_key_header.set_sensitive(true);

        let response = self
            .client
            .post(url)
            .header("x-api-key", api_key_header)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&self.build_request(&request))
            .send()
            .await
            .map_err(|e| ParticipantError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Claude API error");
            return Ok(SamplingResponse::failure(
                request.request_id,
                format!("status {status}: {body}"),
            ));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ParticipantError::Protocol(e.to_string()))?;

        Ok(api_response.into_sampling_response(request.request_id))
    }
}

// API response types

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
    model: Option<String>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl ApiResponse {
    fn into_sampling_response(self, request_id: Uuid) -> SamplingResponse {
        let text: String = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();

        SamplingResponse {
            model: self.model,
            stop_reason: self.stop_reason,
            ..SamplingResponse::text(request_id, text)
        }
    }
}
