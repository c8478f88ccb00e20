//! Commands for the chat page

use serde::Serialize;
use tracing::{debug, info};

use crate::state::AppState;

/// Reply to one chat message, as the chat page renders it
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
  pub reply: String,
  pub fallback: bool,
  /// Underlying generation error, for display next to the fallback
  pub error: Option<String>,
  pub turns: usize,
}

/// Send a user message and wait for the coach's reply
///
/// The session lock is released while the model is working, so status
/// queries see the session as pending in the meantime.
pub async fn send_message(state: &AppState, text: String) -> Result<ChatReply, String> {
  let pending = {
    let mut session = state.session.lock().await;
    session.begin_query(&text).map_err(|e| e.to_string())?
  };

  debug!(prompt_chars = pending.prompt.len(), "Dispatching query");
  let result = state.generator.generate(&pending.prompt).await;

  let mut session = state.session.lock().await;
  let reply = session
    .complete_query(pending, result)
    .map_err(|e| format!("Failed to record reply: {}", e))?;
  let turns = session.status().turns;

  info!(turns, fallback = reply.is_fallback(), "Reply recorded");

  Ok(ChatReply {
    fallback: reply.is_fallback(),
    error: reply.error.as_ref().map(|e| e.to_string()),
    reply: reply.text,
    turns,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::commands::profile::submit_profile;
  use crate::commands::{get_conversation, get_session_status, reset_session};
  use crate::llm::{GenerationError, TextGenerator};
  use crate::models::Role;
  use crate::session::FALLBACK_REPLY;
  use crate::test_utils::{sample_form, StubGenerator};
  use async_trait::async_trait;
  use std::sync::Arc;
  use tokio::sync::Notify;

  /// Holds every reply until released
  struct GatedGenerator {
    gate: Notify,
  }

  #[async_trait]
  impl TextGenerator for GatedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
      self.gate.notified().await;
      Ok("Released".to_string())
    }
  }

  #[tokio::test]
  async fn test_send_message_appends_user_and_reply() {
    let state = AppState::new(Arc::new(StubGenerator::replying("Do squats.")));
    submit_profile(&state, sample_form()).await.unwrap();

    let reply = send_message(&state, "Leg day ideas?".to_string()).await.unwrap();

    assert_eq!(reply.reply, "Do squats.");
    assert!(!reply.fallback);
    assert_eq!(reply.turns, 3);

    let turns = get_conversation(&state).await.unwrap();
    let roles: Vec<Role> = turns.iter().map(|t| t.role).collect();
    assert_eq!(roles, vec![Role::Instructor, Role::User, Role::Instructor]);
  }

  #[tokio::test]
  async fn test_send_message_before_profile_fails() {
    let state = AppState::new(Arc::new(StubGenerator::replying("unused")));

    assert!(send_message(&state, "hello".to_string()).await.is_err());
    assert!(get_conversation(&state).await.is_err());
  }

  #[tokio::test]
  async fn test_generation_error_is_reported_with_fallback() {
    let generator = StubGenerator::failing(GenerationError::Timeout);
    let state = AppState::new(Arc::new(generator));
    submit_profile(&state, sample_form()).await.unwrap();

    let reply = send_message(&state, "Plan please".to_string()).await.unwrap();

    assert!(reply.fallback);
    assert_eq!(reply.reply, FALLBACK_REPLY);
    assert_eq!(reply.error.as_deref(), Some("Request timed out"));
  }

  #[tokio::test]
  async fn test_status_is_pending_while_reply_outstanding() {
    let generator = Arc::new(GatedGenerator { gate: Notify::new() });
    let state = AppState::new(generator.clone());
    submit_profile(&state, sample_form()).await.unwrap();

    let observer = async {
      loop {
        if get_session_status(&state).await.pending {
          break;
        }
        tokio::task::yield_now().await;
      }
      // A second message is refused while the first is outstanding
      let second = send_message(&state, "Another one".to_string()).await;
      generator.gate.notify_one();
      second
    };

    let (first, second) = tokio::join!(send_message(&state, "First".to_string()), observer);

    assert_eq!(first.unwrap().reply, "Released");
    assert!(second.is_err());
    let status = get_session_status(&state).await;
    assert!(!status.pending);
    assert_eq!(status.turns, 3);
  }

  #[tokio::test]
  async fn test_reset_while_pending_discards_late_reply() {
    let generator = Arc::new(GatedGenerator { gate: Notify::new() });
    let state = AppState::new(generator.clone());
    submit_profile(&state, sample_form()).await.unwrap();

    let resetter = async {
      while !get_session_status(&state).await.pending {
        tokio::task::yield_now().await;
      }
      reset_session(&state).await;
      generator.gate.notify_one();
    };

    let (late, _) = tokio::join!(send_message(&state, "First".to_string()), resetter);

    assert!(late.is_err());
    assert_eq!(get_session_status(&state).await.phase, "collecting");
  }
}
