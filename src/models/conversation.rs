use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// First instructor turn of every conversation
pub const GREETING: &str = "Hi! I'm your fitness coach. How can I help you reach your goals today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Instructor,
  User,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Instructor => "Fitness instructor",
      Role::User => "User",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
  pub role: Role,
  pub text: String,
  pub at: DateTime<Utc>,
}

/// Append-only chat log, always starting with the instructor greeting
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
  turns: Vec<Turn>,
}

impl Conversation {
  pub fn new() -> Self {
    Self {
      turns: vec![Turn {
        role: Role::Instructor,
        text: GREETING.to_string(),
        at: Utc::now(),
      }],
    }
  }

  pub fn push(&mut self, role: Role, text: impl Into<String>) -> &Turn {
    // Timestamps never go backwards even if the wall clock does
    let now = Utc::now();
    let at = match self.turns.last() {
      Some(last) if last.at > now => last.at,
      _ => now,
    };

    self.turns.push(Turn {
      role,
      text: text.into(),
      at,
    });
    &self.turns[self.turns.len() - 1]
  }

  pub fn turns(&self) -> &[Turn] {
    &self.turns
  }

  pub fn len(&self) -> usize {
    self.turns.len()
  }
}

impl Default for Conversation {
  fn default() -> Self {
    Self::new()
  }
}
