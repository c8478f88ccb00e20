//! Shared fixtures for the coaching tests
//!
//! `sample_form` is the reference user (25, 70 kg, 1.75 m, full gym) that
//! scores 50/50. `StubGenerator` answers in place of Gemini and keeps the
//! prompts it was sent so tests can inspect them.

use crate::llm::{GenerationError, TextGenerator};
use crate::models::{DayPeriod, Equipment, Experience, FreeSlot, Gender, Profile, ProfileForm};
use async_trait::async_trait;
use chrono::Weekday;
use std::sync::Mutex;

/// ---------------------------------------------------------------------------
/// Profile Factories
/// ---------------------------------------------------------------------------

/// 25-year-old beginner, 70 kg at 1.75 m (BMI 22.86), full gym access
pub fn sample_form() -> ProfileForm {
  ProfileForm {
    weight_kg: Some(70.0),
    height_m: Some(1.75),
    age: Some(25),
    gender: Some(Gender::Male),
    free_slots: vec![
      FreeSlot::day(Weekday::Mon),
      FreeSlot::at(Weekday::Wed, DayPeriod::Evening),
      FreeSlot::day(Weekday::Sat),
    ],
    experience: Some(Experience::Beginner),
    session_minutes: Some(30),
    equipment: Some(Equipment::Full),
  }
}

pub fn sample_profile() -> Profile {
  Profile::from_form(sample_form()).expect("sample form is valid")
}

/// Sample profile with the fields that drive scoring replaced
pub fn profile_with(age: u32, weight_kg: f64, height_m: f64, equipment: Equipment) -> Profile {
  let form = ProfileForm {
    age: Some(age),
    weight_kg: Some(weight_kg),
    height_m: Some(height_m),
    equipment: Some(equipment),
    ..sample_form()
  };
  Profile::from_form(form).expect("test profile is valid")
}

/// ---------------------------------------------------------------------------
/// Stub Generator
/// ---------------------------------------------------------------------------

/// Returns a fixed outcome and records every prompt it was given
pub struct StubGenerator {
  outcome: Result<String, GenerationError>,
  prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
  pub fn replying(text: &str) -> Self {
    Self {
      outcome: Ok(text.to_string()),
      prompts: Mutex::new(Vec::new()),
    }
  }

  pub fn failing(error: GenerationError) -> Self {
    Self {
      outcome: Err(error),
      prompts: Mutex::new(Vec::new()),
    }
  }

  pub fn prompts(&self) -> Vec<String> {
    self.prompts.lock().unwrap().clone()
  }
}

#[async_trait]
impl TextGenerator for StubGenerator {
  async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
    self.prompts.lock().unwrap().push(prompt.to_string());
    self.outcome.clone()
  }
}
