//! Runtime configuration from the environment
//!
//! The API key and generation parameters come from environment variables
//! (optionally via a `.env` file loaded by the binary). Nothing in the scoring
//! or prompt code reads these.

use std::env;
use std::str::FromStr;

use crate::llm::{GenerationSettings, GEMINI_API_KEY_ENV};

pub const MODEL_ENV: &str = "FITCOACH_MODEL";
pub const TEMPERATURE_ENV: &str = "FITCOACH_TEMPERATURE";
pub const MAX_OUTPUT_TOKENS_ENV: &str = "FITCOACH_MAX_OUTPUT_TOKENS";
pub const TOP_P_ENV: &str = "FITCOACH_TOP_P";
pub const TIMEOUT_ENV: &str = "FITCOACH_TIMEOUT_SECS";
pub const API_BASE_ENV: &str = "FITCOACH_API_BASE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Missing configuration: {0}")]
  Missing(&'static str),

  #[error("Invalid value for {name}: {value}")]
  Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct AppConfig {
  pub api_key: Option<String>,
  pub generation: GenerationSettings,
}

impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
      .field("generation", &self.generation)
      .finish()
  }
}

impl AppConfig {
  /// Read configuration, falling back to defaults for anything unset
  ///
  /// A missing API key is not an error here; the terminal front-end can still
  /// ask for one. Use `require_api_key` where a key must exist.
  pub fn from_env() -> Result<Self, ConfigError> {
    let defaults = GenerationSettings::default();

    let api_key = env::var(GEMINI_API_KEY_ENV)
      .ok()
      .map(|k| k.trim().to_string())
      .filter(|k| !k.is_empty());

    let generation = GenerationSettings {
      api_base: env::var(API_BASE_ENV).unwrap_or(defaults.api_base),
      model: env::var(MODEL_ENV).unwrap_or(defaults.model),
      temperature: parse_var(TEMPERATURE_ENV)?.unwrap_or(defaults.temperature),
      max_output_tokens: parse_var(MAX_OUTPUT_TOKENS_ENV)?.unwrap_or(defaults.max_output_tokens),
      top_p: parse_var(TOP_P_ENV)?.unwrap_or(defaults.top_p),
      timeout_secs: parse_var(TIMEOUT_ENV)?.unwrap_or(defaults.timeout_secs),
    };

    validate(&generation)?;

    Ok(Self {
      api_key,
      generation,
    })
  }

  pub fn require_api_key(&self) -> Result<&str, ConfigError> {
    self
      .api_key
      .as_deref()
      .ok_or(ConfigError::Missing(GEMINI_API_KEY_ENV))
  }
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
  match env::var(name) {
    Ok(raw) => raw
      .trim()
      .parse::<T>()
      .map(Some)
      .map_err(|_| ConfigError::Invalid { name, value: raw }),
    Err(_) => Ok(None),
  }
}

/// Reject generation parameters the API would refuse anyway
pub fn validate(settings: &GenerationSettings) -> Result<(), ConfigError> {
  if !(0.0..=2.0).contains(&settings.temperature) {
    return Err(ConfigError::Invalid {
      name: TEMPERATURE_ENV,
      value: settings.temperature.to_string(),
    });
  }
  if !(0.0..=1.0).contains(&settings.top_p) {
    return Err(ConfigError::Invalid {
      name: TOP_P_ENV,
      value: settings.top_p.to_string(),
    });
  }
  if settings.max_output_tokens == 0 {
    return Err(ConfigError::Invalid {
      name: MAX_OUTPUT_TOKENS_ENV,
      value: "0".to_string(),
    });
  }
  if settings.timeout_secs == 0 {
    return Err(ConfigError::Invalid {
      name: TIMEOUT_ENV,
      value: "0".to_string(),
    });
  }
  Ok(())
}
