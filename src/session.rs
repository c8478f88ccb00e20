//! Per-user session: profile collection first, then coaching chat
//!
//! The session is either collecting a profile or conversing. Profile, cached
//! score and conversation live together inside the conversing phase, so a
//! reset always drops all three at once.

use serde::Serialize;
use tracing::{error, info};

use crate::context::build_context;
use crate::error::CoachError;
use crate::llm::{GenerationError, TextGenerator};
use crate::models::{Conversation, Profile, Role};
use crate::scoring::{compute_score_with, EquipmentWeights, FitnessScore};

/// Shown in place of a reply when generation fails
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't generate a response. Please try again later.";

/// ---------------------------------------------------------------------------
/// Phases
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Coaching {
  profile: Profile,
  score: FitnessScore,
  conversation: Conversation,
  pending: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionPhase {
  #[default]
  Collecting,
  Conversing(Coaching),
}

impl SessionPhase {
  pub fn name(&self) -> &'static str {
    match self {
      SessionPhase::Collecting => "collecting",
      SessionPhase::Conversing(_) => "conversing",
    }
  }
}

/// A user query whose reply is outstanding
#[derive(Debug, Clone)]
pub struct PendingQuery {
  pub prompt: String,
  epoch: u64,
}

/// Outcome of one query
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
  pub text: String,
  /// Set when `text` is the fallback message
  pub error: Option<GenerationError>,
}

impl Reply {
  pub fn is_fallback(&self) -> bool {
    self.error.is_some()
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
  pub phase: &'static str,
  pub pending: bool,
  pub turns: usize,
}

/// ---------------------------------------------------------------------------
/// Session
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Session {
  phase: SessionPhase,
  weights: EquipmentWeights,
  /// Bumped on every profile, reset and query; a pending query only
  /// completes against the epoch it was issued in
  epoch: u64,
}

impl Session {
  pub fn new() -> Self {
    Self::default()
  }

  /// Session scoring equipment with a custom table
  pub fn with_weights(weights: EquipmentWeights) -> Self {
    Self {
      phase: SessionPhase::Collecting,
      weights,
      epoch: 0,
    }
  }

  pub fn phase_name(&self) -> &'static str {
    self.phase.name()
  }

  pub fn is_pending(&self) -> bool {
    matches!(&self.phase, SessionPhase::Conversing(c) if c.pending)
  }

  pub fn profile(&self) -> Option<&Profile> {
    self.coaching().map(|c| &c.profile)
  }

  pub fn score(&self) -> Option<&FitnessScore> {
    self.coaching().map(|c| &c.score)
  }

  pub fn conversation(&self) -> Option<&Conversation> {
    self.coaching().map(|c| &c.conversation)
  }

  pub fn status(&self) -> SessionStatus {
    SessionStatus {
      phase: self.phase_name(),
      pending: self.is_pending(),
      turns: self.conversation().map(|c| c.len()).unwrap_or(0),
    }
  }

  fn coaching(&self) -> Option<&Coaching> {
    match &self.phase {
      SessionPhase::Conversing(c) => Some(c),
      SessionPhase::Collecting => None,
    }
  }

  fn coaching_mut(&mut self) -> Result<&mut Coaching, CoachError> {
    match &mut self.phase {
      SessionPhase::Conversing(c) => Ok(c),
      SessionPhase::Collecting => Err(CoachError::InvalidTransition(
        "no profile has been submitted yet".to_string(),
      )),
    }
  }

  /// Finish profile collection: score once, seed the chat, start conversing
  pub fn complete_profile(&mut self, profile: Profile) -> Result<FitnessScore, CoachError> {
    if let SessionPhase::Conversing(_) = self.phase {
      return Err(CoachError::InvalidTransition(
        "profile already submitted; reset the session first".to_string(),
      ));
    }

    let score = compute_score_with(&profile, &self.weights)?;

    info!(
      score = score.value,
      max = score.max,
      bmi = profile.bmi_rounded(),
      "Profile complete, starting conversation"
    );

    self.phase = SessionPhase::Conversing(Coaching {
      profile,
      score,
      conversation: Conversation::new(),
      pending: false,
    });
    self.epoch += 1;

    Ok(score)
  }

  /// Record the user's query and build the prompt for it
  pub fn begin_query(&mut self, query: &str) -> Result<PendingQuery, CoachError> {
    let coaching = self.coaching_mut()?;
    if coaching.pending {
      return Err(CoachError::ReplyPending);
    }

    let prompt = build_context(
      &coaching.profile,
      &coaching.score,
      coaching.conversation.turns(),
      query,
    )?;

    coaching.conversation.push(Role::User, query.trim());
    coaching.pending = true;
    self.epoch += 1;

    Ok(PendingQuery {
      prompt,
      epoch: self.epoch,
    })
  }

  /// Record the generator's outcome for a pending query
  ///
  /// Generation failures become the fallback reply; the underlying error is
  /// logged and handed back in `Reply::error`.
  pub fn complete_query(
    &mut self,
    pending: PendingQuery,
    result: Result<String, GenerationError>,
  ) -> Result<Reply, CoachError> {
    let current = self.epoch;
    let coaching = self.coaching_mut()?;
    if !coaching.pending || pending.epoch != current {
      return Err(CoachError::InvalidTransition(
        "no matching query is awaiting a reply".to_string(),
      ));
    }

    let reply = match result {
      Ok(text) => Reply { text, error: None },
      Err(e) => {
        error!(error = %e, "Reply generation failed, using fallback");
        Reply {
          text: FALLBACK_REPLY.to_string(),
          error: Some(e),
        }
      }
    };

    coaching.conversation.push(Role::Instructor, reply.text.clone());
    coaching.pending = false;

    Ok(reply)
  }

  /// Ask one question end to end
  pub async fn ask(
    &mut self,
    generator: &dyn TextGenerator,
    query: &str,
  ) -> Result<Reply, CoachError> {
    let pending = self.begin_query(query)?;
    let result = generator.generate(&pending.prompt).await;
    self.complete_query(pending, result)
  }

  /// Drop profile, score and conversation together
  pub fn reset(&mut self) {
    info!("Session reset");
    self.phase = SessionPhase::Collecting;
    self.epoch += 1;
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{Equipment, GREETING};
  use crate::test_utils::{profile_with, sample_profile, StubGenerator};

  #[test]
  fn test_new_session_is_collecting() {
    let session = Session::new();

    assert_eq!(session.phase_name(), "collecting");
    assert!(session.profile().is_none());
    assert!(session.score().is_none());
    assert!(session.conversation().is_none());
  }

  #[test]
  fn test_complete_profile_caches_score_and_seeds_chat() {
    let mut session = Session::new();
    let score = session.complete_profile(sample_profile()).unwrap();

    assert_eq!(score.value, 50);
    assert_eq!(session.phase_name(), "conversing");
    assert_eq!(session.score(), Some(&score));

    let conversation = session.conversation().unwrap();
    assert_eq!(conversation.len(), 1);
    assert_eq!(conversation.turns()[0].role, Role::Instructor);
    assert_eq!(conversation.turns()[0].text, GREETING);
  }

  #[test]
  fn test_profile_cannot_be_submitted_twice() {
    let mut session = Session::new();
    session.complete_profile(sample_profile()).unwrap();

    let second = session.complete_profile(profile_with(70, 90.0, 1.7, Equipment::None));

    assert!(matches!(second, Err(CoachError::InvalidTransition(_))));
    assert_eq!(session.score().unwrap().value, 50);
  }

  #[test]
  fn test_query_before_profile_rejected() {
    let mut session = Session::new();
    assert!(matches!(
      session.begin_query("hello"),
      Err(CoachError::InvalidTransition(_))
    ));
  }

  #[tokio::test]
  async fn test_one_exchange_grows_conversation_to_three() {
    let generator = StubGenerator::replying("Try three full-body sessions a week.");
    let mut session = Session::new();
    session.complete_profile(sample_profile()).unwrap();

    let reply = session.ask(&generator, "  How should I start?  ").await.unwrap();

    assert!(!reply.is_fallback());
    assert_eq!(reply.text, "Try three full-body sessions a week.");

    let turns = session.conversation().unwrap().turns();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[1].role, Role::User);
    assert_eq!(turns[1].text, "How should I start?");
    assert_eq!(turns[2].role, Role::Instructor);
    assert!(turns.windows(2).all(|w| w[0].at <= w[1].at));
  }

  #[tokio::test]
  async fn test_prompt_uses_history_before_the_query() {
    let generator = StubGenerator::replying("Sure.");
    let mut session = Session::new();
    session.complete_profile(sample_profile()).unwrap();

    session.ask(&generator, "First question").await.unwrap();
    session.ask(&generator, "Second question").await.unwrap();

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(!prompts[0].contains("User: First question"));
    assert!(prompts[1].contains("User: First question"));
    assert!(prompts[1].contains("Fitness instructor: Sure."));
    assert!(!prompts[1].contains("User: Second question"));
    assert!(prompts[1].contains("User's question: Second question"));
  }

  #[tokio::test]
  async fn test_generation_failure_becomes_fallback_reply() {
    let generator = StubGenerator::failing(GenerationError::RateLimited("quota".to_string()));
    let mut session = Session::new();
    session.complete_profile(sample_profile()).unwrap();

    let reply = session.ask(&generator, "Plan my week").await.unwrap();

    assert_eq!(reply.text, FALLBACK_REPLY);
    assert_eq!(
      reply.error,
      Some(GenerationError::RateLimited("quota".to_string()))
    );
    assert_eq!(session.conversation().unwrap().len(), 3);
    assert!(!session.is_pending());
  }

  #[tokio::test]
  async fn test_empty_query_leaves_conversation_untouched() {
    let generator = StubGenerator::replying("unused");
    let mut session = Session::new();
    session.complete_profile(sample_profile()).unwrap();

    let result = session.ask(&generator, "   ").await;

    assert!(matches!(result, Err(CoachError::EmptyQuery)));
    assert_eq!(session.conversation().unwrap().len(), 1);
    assert!(generator.prompts().is_empty());
  }

  #[test]
  fn test_pending_blocks_second_query() {
    let mut session = Session::new();
    session.complete_profile(sample_profile()).unwrap();

    let pending = session.begin_query("Question one").unwrap();
    assert!(session.is_pending());
    assert!(session.status().pending);
    assert!(matches!(
      session.begin_query("Question two"),
      Err(CoachError::ReplyPending)
    ));

    session
      .complete_query(pending, Ok("Answer one".to_string()))
      .unwrap();
    assert!(!session.is_pending());
    assert_eq!(session.status().turns, 3);
  }

  #[test]
  fn test_stale_pending_query_rejected() {
    let mut session = Session::new();
    session.complete_profile(sample_profile()).unwrap();

    let first = session.begin_query("Question one").unwrap();
    let stale = first.clone();
    session.complete_query(first, Ok("Answer".to_string())).unwrap();

    assert!(matches!(
      session.complete_query(stale, Ok("Again".to_string())),
      Err(CoachError::InvalidTransition(_))
    ));
    assert_eq!(session.conversation().unwrap().len(), 3);
  }

  #[test]
  fn test_reply_from_before_reset_rejected_in_new_conversation() {
    let mut session = Session::new();
    session.complete_profile(sample_profile()).unwrap();
    let before_reset = session.begin_query("How deep should squats go?").unwrap();

    session.reset();
    session
      .complete_profile(profile_with(40, 80.0, 1.8, Equipment::Some))
      .unwrap();
    let current = session.begin_query("New question about swimming").unwrap();

    // Both conversations are pending at the same length
    assert!(matches!(
      session.complete_query(before_reset, Ok("Answer to squats".to_string())),
      Err(CoachError::InvalidTransition(_))
    ));
    assert!(session.is_pending());

    let reply = session
      .complete_query(current, Ok("Answer to swimming".to_string()))
      .unwrap();
    assert_eq!(reply.text, "Answer to swimming");

    let turns = session.conversation().unwrap().turns();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[1].text, "New question about swimming");
    assert_eq!(turns[2].text, "Answer to swimming");
  }

  #[tokio::test]
  async fn test_reset_clears_everything_together() {
    let generator = StubGenerator::replying("ok");
    let mut session = Session::new();
    session.complete_profile(sample_profile()).unwrap();
    session.ask(&generator, "hi").await.unwrap();

    session.reset();

    assert_eq!(session.phase_name(), "collecting");
    assert!(session.profile().is_none());
    assert!(session.score().is_none());
    assert!(session.conversation().is_none());

    // A fresh profile gets a fresh score and a fresh chat
    let score = session
      .complete_profile(profile_with(50, 90.0, 1.7, Equipment::None))
      .unwrap();
    assert_eq!(score.value, 5 + 5);
    assert_eq!(session.conversation().unwrap().len(), 1);
  }

  #[test]
  fn test_custom_weights_flow_into_cached_score() {
    let mut session = Session::with_weights(EquipmentWeights {
      none: 5,
      some: 10,
      full: 15,
    });

    let score = session.complete_profile(sample_profile()).unwrap();

    assert_eq!(score.value, 45);
    assert_eq!(score.max, 45);
  }
}
