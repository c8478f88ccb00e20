pub mod chat;
pub mod profile;

use crate::models::Turn;
use crate::session::SessionStatus;
use crate::state::AppState;

pub async fn get_session_status(state: &AppState) -> SessionStatus {
  state.session.lock().await.status()
}

pub async fn get_conversation(state: &AppState) -> Result<Vec<Turn>, String> {
  let session = state.session.lock().await;
  session
    .conversation()
    .map(|c| c.turns().to_vec())
    .ok_or_else(|| "No conversation yet: submit a profile first".to_string())
}

/// Back to the profile form with nothing carried over
pub async fn reset_session(state: &AppState) -> SessionStatus {
  let mut session = state.session.lock().await;
  session.reset();
  session.status()
}
