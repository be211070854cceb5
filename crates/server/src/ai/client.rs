//! OpenAI Responses API client

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Errors from a Responses API call
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("OpenAI API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Model refused: {0}")]
    Refusal(String),

    #[error("No output_text")]
    NoOutput,
}

/// Client for the OpenAI Responses API
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

/// Conversation role of an input message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A message in the request input
#[derive(Debug, Clone, Serialize)]
pub struct InputMessage {
    pub role: Role,
    pub content: String,
}

/// Output text format
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextFormat {
    JsonSchema {
        name: String,
        schema: JsonValue,
        strict: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct TextConfig {
    pub format: TextFormat,
}

/// Hosted tool made available to the model
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    FileSearch {
        vector_store_ids: Vec<String>,
        max_num_results: u32,
    },
}

/// Request body for `POST /responses`, minus the model
#[derive(Debug, Clone)]
pub struct ResponseRequest {
    pub input: Vec<InputMessage>,
    pub text: TextConfig,
    pub tools: Vec<Tool>,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    input: &'a [InputMessage],
    text: &'a TextConfig,
    tools: &'a [Tool],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Response from the Responses API
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub incomplete_details: Option<IncompleteDetails>,
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
pub struct IncompleteDetails {
    #[serde(default)]
    pub reason: Option<String>,
}

/// One item of the response output; tool calls and reasoning are skipped
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<OutputContent>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputContent {
    OutputText { text: String },
    Refusal { refusal: String },
    #[serde(other)]
    Other,
}

/// Error detail from the Responses API
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenAiClient {
    /// Create a new client against `base_url` (e.g. `https://api.openai.com/v1`)
    pub fn new(api_key: String, base_url: &str, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a request and decode the response
    pub async fn create_response(
        &self,
        request: &ResponseRequest,
    ) -> Result<ApiResponse, UpstreamError> {
        let body = ApiRequest {
            model: &self.model,
            input: &request.input,
            text: &request.text,
            tools: &request.tools,
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        };

        let response = self
            .http
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiError>(&text) {
                Ok(api_err) => api_err.error.message,
                Err(_) => text,
            };
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

/// Text of the first `output_text` block of the first `message` item
pub fn extract_text(response: &ApiResponse) -> Result<&str, UpstreamError> {
    let content = response
        .output
        .iter()
        .find_map(|item| match item {
            OutputItem::Message { content } => Some(content),
            OutputItem::Other => None,
        })
        .ok_or(UpstreamError::NoOutput)?;

    for block in content {
        match block {
            OutputContent::OutputText { text } => return Ok(text.as_str()),
            OutputContent::Refusal { refusal } => {
                return Err(UpstreamError::Refusal(refusal.clone()));
            }
            OutputContent::Other => {}
        }
    }

    Err(UpstreamError::NoOutput)
}
