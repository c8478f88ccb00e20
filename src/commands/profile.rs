//! Commands for the profile form page

use serde::Serialize;

use crate::models::{Profile, ProfileForm};
use crate::scoring::FitnessScore;
use crate::state::AppState;

/// What the chat page shows above the conversation
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
  pub bmi: f64,
  pub fitness_score: String,
  pub score: FitnessScore,
  pub free_days: String,
}

impl ProfileSummary {
  fn new(profile: &Profile, score: &FitnessScore) -> Self {
    Self {
      bmi: profile.bmi_rounded(),
      fitness_score: score.to_string(),
      score: *score,
      free_days: profile.free_slots_display(),
    }
  }
}

/// Validate the form, score it and move the session to the chat page
pub async fn submit_profile(state: &AppState, form: ProfileForm) -> Result<ProfileSummary, String> {
  let profile = Profile::from_form(form).map_err(|e| e.to_string())?;

  let mut session = state.session.lock().await;
  let score = session
    .complete_profile(profile)
    .map_err(|e| format!("Failed to submit profile: {}", e))?;

  let profile = session
    .profile()
    .ok_or_else(|| "Profile missing after submission".to_string())?;

  Ok(ProfileSummary::new(profile, &score))
}

pub async fn get_profile_summary(state: &AppState) -> Result<Option<ProfileSummary>, String> {
  let session = state.session.lock().await;
  Ok(match (session.profile(), session.score()) {
    (Some(profile), Some(score)) => Some(ProfileSummary::new(profile, score)),
    _ => None,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{sample_form, StubGenerator};
  use std::sync::Arc;

  fn state() -> AppState {
    AppState::new(Arc::new(StubGenerator::replying("ok")))
  }

  #[tokio::test]
  async fn test_submit_profile_returns_summary() {
    let state = state();

    let summary = submit_profile(&state, sample_form()).await.unwrap();

    assert_eq!(summary.bmi, 22.86);
    assert_eq!(summary.fitness_score, "50/50");
    assert_eq!(summary.free_days, "Monday, Wednesday evening, Saturday");
    assert_eq!(
      get_profile_summary(&state).await.unwrap().unwrap().fitness_score,
      "50/50"
    );
  }

  #[tokio::test]
  async fn test_invalid_form_keeps_session_collecting() {
    let state = state();
    let mut form = sample_form();
    form.age = None;

    let err = submit_profile(&state, form).await.unwrap_err();

    assert!(err.contains("age"));
    assert_eq!(crate::commands::get_session_status(&state).await.phase, "collecting");
    assert!(get_profile_summary(&state).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_second_submission_rejected_until_reset() {
    let state = state();
    submit_profile(&state, sample_form()).await.unwrap();

    assert!(submit_profile(&state, sample_form()).await.is_err());

    crate::commands::reset_session(&state).await;
    assert!(submit_profile(&state, sample_form()).await.is_ok());
  }
}
