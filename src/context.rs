//! Prompt assembly for the coaching model
//!
//! The model gets a persona line, the user's profile, the chat so far, the new
//! question, then a tone directive. Identical inputs render identical bytes.

use crate::error::CoachError;
use crate::models::{Profile, Turn};
use crate::scoring::FitnessScore;

const PERSONA: &str = "You are a friendly and professional fitness instructor.";
const TONE: &str = "Respond in a supportive, motivating tone. Be specific and actionable.";
const NO_FREE_SLOTS: &str = "Not specified";

/// Build the prompt for a user query
///
/// `history` is the conversation before `query` was asked. The query is
/// trimmed; a blank query fails with `EmptyQuery`. A profile whose values
/// fail `Profile::validate` fails with `InvalidProfile`.
pub fn build_context(
  profile: &Profile,
  score: &FitnessScore,
  history: &[Turn],
  query: &str,
) -> Result<String, CoachError> {
  profile.validate()?;

  let query = query.trim();
  if query.is_empty() {
    return Err(CoachError::EmptyQuery);
  }

  let mut prompt = String::new();
  prompt.push_str(PERSONA);
  prompt.push('\n');
  prompt.push_str(&render_profile(profile, score));

  if !history.is_empty() {
    prompt.push_str("\nConversation so far:\n");
    prompt.push_str(&render_history(history));
  }

  prompt.push_str(&format!("\nUser's question: {}\n\n", query));
  prompt.push_str(TONE);

  Ok(prompt)
}

/// "User details:" block, one line per profile field
pub fn render_profile(profile: &Profile, score: &FitnessScore) -> String {
  let free_slots = if profile.free_slots().is_empty() {
    NO_FREE_SLOTS.to_string()
  } else {
    profile.free_slots_display()
  };

  let mut block = String::from("User details:\n");
  block.push_str(&format!("- Age: {} years\n", profile.age()));
  block.push_str(&format!("- Gender: {}\n", profile.gender()));
  block.push_str(&format!("- BMI: {:.2}\n", profile.bmi_rounded()));
  block.push_str(&format!("- Experience: {}\n", profile.experience()));
  block.push_str(&format!(
    "- Duration: {} minutes per session\n",
    profile.session_minutes()
  ));
  block.push_str(&format!("- Free Days: {}\n", free_slots));
  block.push_str(&format!("- Equipment: {}\n", profile.equipment()));
  block.push_str(&format!("- Fitness Score: {}\n", score));
  block
}

fn render_history(history: &[Turn]) -> String {
  history
    .iter()
    .map(|turn| format!("{}: {}\n", turn.role, turn.text.trim()))
    .collect::<Vec<_>>()
    .join("")
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
