//! Terminal front-end: the profile form page, then the chat page
//!
//! Reads answers line by line and enforces the same limits the form widgets
//! would (minimum weight and height, duration slider steps). Everything else
//! goes through the command layer.

use anyhow::{bail, Context, Result};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tracing::info;

use crate::commands::chat::send_message;
use crate::commands::profile::submit_profile;
use crate::commands::{get_conversation, reset_session};
use crate::config::{self, AppConfig};
use crate::llm::{GeminiClient, GEMINI_API_KEY_ENV};
use crate::models::{
  Equipment, Experience, FreeSlot, Gender, ProfileForm, DEFAULT_SESSION_MINUTES,
  MAX_SESSION_MINUTES, MIN_SESSION_MINUTES,
};
use crate::state::AppState;

const MIN_WEIGHT_KG: f64 = 1.0;
const MIN_HEIGHT_M: f64 = 0.5;
const SESSION_STEP_MINUTES: u32 = 5;

/// ---------------------------------------------------------------------------
/// Command line
/// ---------------------------------------------------------------------------

#[derive(clap::Parser, Debug)]
#[command(author, version, about = "Personalized fitness assistant", long_about = None)]
pub struct Cli {
  /// Gemini API key (prompted for when not set)
  #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
  pub api_key: Option<String>,

  /// Gemini model name
  #[arg(long)]
  pub model: Option<String>,

  /// Sampling temperature (0.0 - 2.0)
  #[arg(long)]
  pub temperature: Option<f64>,

  /// Request timeout in seconds
  #[arg(long)]
  pub timeout_secs: Option<u64>,
}

pub async fn run(cli: Cli) -> Result<()> {
  let mut config = AppConfig::from_env().context("Invalid configuration")?;
  if let Some(model) = cli.model {
    config.generation.model = model;
  }
  if let Some(temperature) = cli.temperature {
    config.generation.temperature = temperature;
  }
  if let Some(timeout_secs) = cli.timeout_secs {
    config.generation.timeout_secs = timeout_secs;
  }
  config::validate(&config.generation).context("Invalid command line options")?;

  let mut term = Terminal::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());

  let api_key = match cli.api_key.or(config.api_key) {
    Some(key) => key,
    None => prompt_api_key(&mut term).await?,
  };

  info!(model = %config.generation.model, "Starting fitness assistant");

  let client =
    GeminiClient::new(api_key, config.generation).context("Failed to create Gemini client")?;
  let state = AppState::new(Arc::new(client));

  run_session(&state, &mut term).await
}

/// ---------------------------------------------------------------------------
/// Terminal I/O
/// ---------------------------------------------------------------------------

pub struct Terminal<R, W> {
  lines: Lines<R>,
  out: W,
}

impl<R, W> Terminal<R, W>
where
  R: AsyncBufRead + Unpin,
  W: AsyncWrite + Unpin,
{
  pub fn new(reader: R, out: W) -> Self {
    Self {
      lines: reader.lines(),
      out,
    }
  }

  pub fn into_output(self) -> W {
    self.out
  }

  pub async fn say(&mut self, text: &str) -> Result<()> {
    self.out.write_all(text.as_bytes()).await?;
    self.out.write_all(b"\n").await?;
    self.out.flush().await?;
    Ok(())
  }

  /// Show a label and read one line; `None` once input is closed
  pub async fn prompt(&mut self, label: &str) -> Result<Option<String>> {
    self.out.write_all(label.as_bytes()).await?;
    self.out.write_all(b" ").await?;
    self.out.flush().await?;
    Ok(self.lines.next_line().await?)
  }

  /// Re-ask until `parse` accepts the answer
  async fn ask<T>(
    &mut self,
    label: &str,
    parse: impl Fn(&str) -> Result<T, String>,
  ) -> Result<Option<T>> {
    loop {
      let Some(line) = self.prompt(label).await? else {
        return Ok(None);
      };
      match parse(line.trim()) {
        Ok(value) => return Ok(Some(value)),
        Err(msg) => self.say(&format!("  {}", msg)).await?,
      }
    }
  }

  /// Numbered menu that also accepts the option's name
  async fn choose<T>(&mut self, label: &str, options: &[T]) -> Result<Option<T>>
  where
    T: Copy + Display + FromStr,
  {
    self.say(label).await?;
    for (i, option) in options.iter().enumerate() {
      self.say(&format!("  {}) {}", i + 1, option)).await?;
    }
    self
      .ask(">", |answer| {
        if let Ok(n) = answer.parse::<usize>() {
          return options
            .get(n.wrapping_sub(1))
            .copied()
            .ok_or_else(|| format!("Pick a number from 1 to {}", options.len()));
        }
        answer
          .parse::<T>()
          .map_err(|_| format!("Pick a number from 1 to {}", options.len()))
      })
      .await
  }
}

/// ---------------------------------------------------------------------------
/// Pages
/// ---------------------------------------------------------------------------

/// Ask for the key when neither the flag nor the environment set it
///
/// Input is echoed, so the prompt says so and points at the variable.
pub async fn prompt_api_key<R, W>(term: &mut Terminal<R, W>) -> Result<String>
where
  R: AsyncBufRead + Unpin,
  W: AsyncWrite + Unpin,
{
  term
    .say(&format!(
      "Warning: the key will be visible as you type. Set {} to skip this prompt.",
      GEMINI_API_KEY_ENV
    ))
    .await?;

  match term.prompt("Enter Gemini API key:").await? {
    Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
    _ => bail!("A Gemini API key is required"),
  }
}

/// Ask every profile question; `None` if input closes part way
pub async fn collect_form<R, W>(term: &mut Terminal<R, W>) -> Result<Option<ProfileForm>>
where
  R: AsyncBufRead + Unpin,
  W: AsyncWrite + Unpin,
{
  let Some(weight_kg) = term
    .ask("Weight (kg):", |s| parse_min(s, MIN_WEIGHT_KG))
    .await?
  else {
    return Ok(None);
  };

  let Some(height_m) = term
    .ask("Height (m):", |s| parse_min(s, MIN_HEIGHT_M))
    .await?
  else {
    return Ok(None);
  };

  let Some(age) = term
    .ask("Age:", |s| match s.parse::<u32>() {
      Ok(age) if age >= 1 => Ok(age),
      _ => Err("Enter a whole number of at least 1".to_string()),
    })
    .await?
  else {
    return Ok(None);
  };

  let Some(gender) = term.choose("Gender:", &Gender::ALL).await? else {
    return Ok(None);
  };

  let Some(free_slots) = term
    .ask(
      "Days you're free (e.g. Monday, Friday evening; blank for none):",
      parse_free_slots,
    )
    .await?
  else {
    return Ok(None);
  };

  let Some(experience) = term.choose("Fitness experience:", &Experience::ALL).await? else {
    return Ok(None);
  };

  let duration_label = format!(
    "Typical workout duration in minutes ({}-{}, steps of {}) [{}]:",
    MIN_SESSION_MINUTES, MAX_SESSION_MINUTES, SESSION_STEP_MINUTES, DEFAULT_SESSION_MINUTES
  );
  let Some(session_minutes) = term.ask(&duration_label, parse_session_minutes).await? else {
    return Ok(None);
  };

  let Some(equipment) = term.choose("Available equipment:", &Equipment::ALL).await? else {
    return Ok(None);
  };

  Ok(Some(ProfileForm {
    weight_kg: Some(weight_kg),
    height_m: Some(height_m),
    age: Some(age),
    gender: Some(gender),
    free_slots,
    experience: Some(experience),
    session_minutes: Some(session_minutes),
    equipment: Some(equipment),
  }))
}

/// Form page, then chat page, until input closes or the user quits
pub async fn run_session<R, W>(state: &AppState, term: &mut Terminal<R, W>) -> Result<()>
where
  R: AsyncBufRead + Unpin,
  W: AsyncWrite + Unpin,
{
  loop {
    term.say("\nCreate Your Fitness Profile").await?;
    let Some(form) = collect_form(term).await? else {
      return Ok(());
    };

    let summary = match submit_profile(state, form).await {
      Ok(summary) => summary,
      Err(e) => {
        term.say(&format!("Error: {}", e)).await?;
        continue;
      }
    };

    term.say("\nPersonalized Fitness Chatbot").await?;
    term.say(&format!("BMI: {:.2}", summary.bmi)).await?;
    term.say(&format!("Fitness Score: {}", summary.fitness_score)).await?;
    term.say(&format!("Free Days: {}", summary.free_days)).await?;
    term.say("(type /reset to start over, /quit to leave)\n").await?;

    let turns = get_conversation(state).await.map_err(anyhow::Error::msg)?;
    for turn in &turns {
      term.say(&format!("{}: {}", turn.role, turn.text)).await?;
    }

    loop {
      let Some(line) = term.prompt("You:").await? else {
        return Ok(());
      };

      match line.trim() {
        "" => continue,
        "/quit" | "/exit" => return Ok(()),
        "/reset" => {
          reset_session(state).await;
          break;
        }
        text => {
          term.say("Generating response...").await?;
          match send_message(state, text.to_string()).await {
            Ok(reply) => {
              if let Some(error) = &reply.error {
                term.say(&format!("Gemini API Error: {}", error)).await?;
              }
              term.say(&format!("Fitness instructor: {}", reply.reply)).await?;
            }
            Err(e) => term.say(&format!("Error: {}", e)).await?,
          }
        }
      }
    }
  }
}

/// ---------------------------------------------------------------------------
/// Answer parsing
/// ---------------------------------------------------------------------------

fn parse_min(answer: &str, min: f64) -> Result<f64, String> {
  match answer.parse::<f64>() {
    Ok(value) if value.is_finite() && value >= min => Ok(value),
    _ => Err(format!("Enter a number of at least {}", min)),
  }
}

fn parse_free_slots(answer: &str) -> Result<Vec<FreeSlot>, String> {
  answer
    .split(',')
    .map(str::trim)
    .filter(|token| !token.is_empty())
    .map(|token| token.parse::<FreeSlot>().map_err(|e| e.to_string()))
    .collect()
}

fn parse_session_minutes(answer: &str) -> Result<u32, String> {
  if answer.is_empty() {
    return Ok(DEFAULT_SESSION_MINUTES);
  }
  match answer.parse::<u32>() {
    Ok(minutes)
      if (MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&minutes)
        && minutes % SESSION_STEP_MINUTES == 0 =>
    {
      Ok(minutes)
    }
    _ => Err(format!(
      "Enter a multiple of {} between {} and {}",
      SESSION_STEP_MINUTES, MIN_SESSION_MINUTES, MAX_SESSION_MINUTES
    )),
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
