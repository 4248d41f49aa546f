use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::analyzer::AnalysisPrompt;
use crate::config::LlmConfig;
use crate::error::{SatPrepError, SatPrepResult};

/// Anything that can answer a system + user chat prompt with text
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Model identifier the service is bound to
    fn model(&self) -> &str;

    async fn complete(&self, prompt: &AnalysisPrompt) -> SatPrepResult<String>;
}

/// Client for the OpenAI chat completions protocol.
/// No retries: failures go straight back to the caller.
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<serde_json::Value>,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> SatPrepResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder
            .build()
            .map_err(|e| SatPrepError::analysis_service_with_source("Failed to create HTTP client", e))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        info!("LLM client: {} at {}", config.model, base_url);

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &AnalysisPrompt) -> SatPrepResult<String> {
        let request = build_request(&self.model, prompt);
        let url = self.endpoint();
        debug!(
            "POST {} ({} prompt chars)",
            url,
            prompt.system.chars().count() + prompt.user.chars().count()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                SatPrepError::analysis_service_with_source(
                    format!("Failed to reach completion service at {}", self.base_url),
                    e,
                )
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SatPrepError::analysis_service_with_source("Failed to read completion response", e))?;

        if !status.is_success() {
            return Err(SatPrepError::analysis_service(
                format!("API error ({}): {}", status, error_detail(&body)),
                Some(status.as_u16()),
            ));
        }

        parse_response(&body)
    }
}

pub(crate) fn build_request<'a>(model: &'a str, prompt: &'a AnalysisPrompt) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: [
            ChatMessage {
                role: "system",
                content: &prompt.system,
            },
            ChatMessage {
                role: "user",
                content: &prompt.user,
            },
        ],
    }
}

/// First choice's content, verbatim
pub(crate) fn parse_response(body: &str) -> SatPrepResult<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| SatPrepError::analysis_service_with_source("Malformed completion response", e))?;

    response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| SatPrepError::analysis_service("Completion response had no choices", None))?
        .message
        .content
        .ok_or_else(|| SatPrepError::analysis_service("First completion choice had no content", None))
}

fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error)
        .map(|e| match e.get("message").and_then(|m| m.as_str()) {
            Some(message) => message.to_string(),
            None => e.to_string(),
        })
        .unwrap_or_else(|| body.to_string())
}
