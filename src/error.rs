//! Error types surfaced by the scoring, context and session layers

use serde::Serialize;

use crate::llm::GenerationError;

#[derive(Debug, thiserror::Error)]
pub enum CoachError {
  #[error("Invalid profile: {field} {reason}")]
  InvalidProfile { field: &'static str, reason: String },

  #[error("Query is empty")]
  EmptyQuery,

  #[error("Invalid session transition: {0}")]
  InvalidTransition(String),

  #[error("A reply is already being generated")]
  ReplyPending,

  #[error("Generation failed: {0}")]
  Generation(#[from] GenerationError),
}

impl CoachError {
  pub fn invalid_profile(field: &'static str, reason: impl Into<String>) -> Self {
    Self::InvalidProfile {
      field,
      reason: reason.into(),
    }
  }
}

impl Serialize for CoachError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}
