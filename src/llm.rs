//! LLM integration for coaching replies
//!
//! This module handles communication with the Gemini API. The rest of the
//! crate only sees the `TextGenerator` trait: a prompt goes in, text or a
//! `GenerationError` comes out.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
const API_KEY_HEADER: &str = "x-goog-api-key";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;
pub const DEFAULT_TOP_P: f64 = 0.95;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Generation parameters sent with every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
  pub api_base: String,
  pub model: String,
  pub temperature: f64,
  pub max_output_tokens: u32,
  pub top_p: f64,
  pub timeout_secs: u64,
}

impl Default for GenerationSettings {
  fn default() -> Self {
    Self {
      api_base: DEFAULT_API_BASE.to_string(),
      model: DEFAULT_MODEL.to_string(),
      temperature: DEFAULT_TEMPERATURE,
      max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
      top_p: DEFAULT_TOP_P,
      timeout_secs: DEFAULT_TIMEOUT_SECS,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum GenerationError {
  #[error("API key not configured")]
  MissingApiKey,

  #[error("Request failed: {0}")]
  Request(String),

  #[error("Request timed out")]
  Timeout,

  #[error("Rate limited: {0}")]
  RateLimited(String),

  #[error("API error (HTTP {status}): {message}")]
  Api { status: u16, message: String },

  #[error("Parse error: {0}")]
  Parse(String),
}

impl From<reqwest::Error> for GenerationError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_timeout() {
      GenerationError::Timeout
    } else {
      // The URL can carry credentials, keep it out of error text and logs
      GenerationError::Request(e.without_url().to_string())
    }
  }
}

/// ---------------------------------------------------------------------------
/// Generator seam
/// ---------------------------------------------------------------------------

/// Anything that can turn a prompt into reply text
#[async_trait]
pub trait TextGenerator: Send + Sync {
  async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// ---------------------------------------------------------------------------
/// Gemini API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
  contents: Vec<GeminiContent>,
  generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
  #[serde(skip_serializing_if = "Option::is_none")]
  role: Option<String>,
  #[serde(default)]
  parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
  #[serde(skip_serializing_if = "Option::is_none")]
  text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  temperature: f64,
  max_output_tokens: u32,
  top_p: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
  candidates: Option<Vec<Candidate>>,
  usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
  content: Option<GeminiContent>,
  finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  prompt_token_count: Option<u32>,
  candidates_token_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
  pub input_tokens: u32,
  pub output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
  error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
  message: String,
}

/// ---------------------------------------------------------------------------
/// Gemini Client
/// ---------------------------------------------------------------------------

pub struct GeminiClient {
  client: Client,
  api_key: String,
  settings: GenerationSettings,
}

impl std::fmt::Debug for GeminiClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("GeminiClient")
      .field("api_key", &"[REDACTED]")
      .field("settings", &self.settings)
      .finish()
  }
}

impl GeminiClient {
  pub fn new(api_key: impl Into<String>, settings: GenerationSettings) -> Result<Self, GenerationError> {
    let api_key = api_key.into();
    if api_key.trim().is_empty() {
      return Err(GenerationError::MissingApiKey);
    }

    let client = Client::builder()
      .timeout(Duration::from_secs(settings.timeout_secs))
      .build()?;

    Ok(Self {
      client,
      api_key,
      settings,
    })
  }

  /// Create a client with default settings, loading the API key from environment
  pub fn from_env() -> Result<Self, GenerationError> {
    let api_key = std::env::var(GEMINI_API_KEY_ENV).map_err(|_| GenerationError::MissingApiKey)?;
    Self::new(api_key, GenerationSettings::default())
  }

  pub fn settings(&self) -> &GenerationSettings {
    &self.settings
  }

  fn endpoint(&self) -> Result<Url, GenerationError> {
    let raw = format!(
      "{}/models/{}:generateContent",
      self.settings.api_base.trim_end_matches('/'),
      self.settings.model
    );
    Url::parse(&raw).map_err(|e| GenerationError::Request(e.to_string()))
  }

  /// Send a single-turn prompt and return the reply text with token usage
  pub async fn complete(&self, prompt: &str) -> Result<(String, Usage), GenerationError> {
    let request = GeminiRequest {
      contents: vec![GeminiContent {
        role: Some("user".to_string()),
        parts: vec![GeminiPart {
          text: Some(prompt.to_string()),
        }],
      }],
      generation_config: GenerationConfig {
        temperature: self.settings.temperature,
        max_output_tokens: self.settings.max_output_tokens,
        top_p: self.settings.top_p,
      },
    };

    debug!(model = %self.settings.model, prompt_chars = prompt.len(), "Sending request to Gemini");

    let response = self
      .client
      .post(self.endpoint()?)
      .header("content-type", "application/json")
      .header(API_KEY_HEADER, &self.api_key)
      .json(&request)
      .send()
      .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
      error!(status = %status, "Gemini API error");
      return Err(map_api_error(status.as_u16(), &body));
    }

    let gemini_response: GeminiResponse =
      serde_json::from_str(&body).map_err(|e| GenerationError::Parse(e.to_string()))?;

    let text = extract_text(&gemini_response)?;

    let usage = gemini_response
      .usage_metadata
      .map(|u| Usage {
        input_tokens: u.prompt_token_count.unwrap_or(0),
        output_tokens: u.candidates_token_count.unwrap_or(0),
      })
      .unwrap_or_default();

    Ok((text, usage))
  }
}

#[async_trait]
impl TextGenerator for GeminiClient {
  async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
    let (text, usage) = self.complete(prompt).await?;
    debug!(
      input_tokens = usage.input_tokens,
      output_tokens = usage.output_tokens,
      "Gemini reply received"
    );
    Ok(text)
  }
}

/// Join the text parts of the first candidate
fn extract_text(response: &GeminiResponse) -> Result<String, GenerationError> {
  let candidate = response
    .candidates
    .as_ref()
    .and_then(|c| c.first())
    .ok_or_else(|| GenerationError::Parse("No candidates in response".to_string()))?;

  let text: String = candidate
    .content
    .as_ref()
    .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
    .unwrap_or_default();

  if text.trim().is_empty() {
    let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
    return Err(GenerationError::Parse(format!(
      "No text content in response (finish reason: {})",
      reason
    )));
  }

  Ok(text)
}

fn map_api_error(status: u16, body: &str) -> GenerationError {
  let message = serde_json::from_str::<GeminiErrorResponse>(body)
    .map(|r| r.error.message)
    .unwrap_or_else(|_| body.to_string());

  match status {
    429 => GenerationError::RateLimited(message),
    _ => GenerationError::Api { status, message },
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
