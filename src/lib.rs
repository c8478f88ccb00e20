//! Personalized fitness assistant
//!
//! Collects a fitness profile, scores it, then answers coaching questions
//! through a hosted LLM with the profile injected into every prompt.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod models;
pub mod scoring;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_utils;

pub use context::build_context;
pub use error::CoachError;
pub use llm::{GeminiClient, GenerationError, GenerationSettings, TextGenerator};
pub use models::{Conversation, Profile, ProfileForm, Role, Turn};
pub use scoring::{compute_score, compute_score_with, EquipmentWeights, FitnessScore};
pub use session::{Reply, Session};
pub use state::AppState;
