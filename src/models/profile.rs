//! User fitness profile as collected by the profile form
//!
//! A `ProfileForm` carries whatever the form collaborator managed to fill in.
//! `Profile::from_form` checks presence and ranges, then derives BMI exactly
//! once. Profile fields are read-only afterwards so the stored BMI always
//! matches the weight and height it came from.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoachError;

/// ---------------------------------------------------------------------------
/// Ranges accepted from the form
/// ---------------------------------------------------------------------------

pub const MIN_SESSION_MINUTES: u32 = 10;
pub const MAX_SESSION_MINUTES: u32 = 90;
pub const DEFAULT_SESSION_MINUTES: u32 = 30;

/// ---------------------------------------------------------------------------
/// Enumerated answers
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
  Male,
  Female,
  Other,
}

impl Gender {
  pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

  pub fn as_str(&self) -> &'static str {
    match self {
      Gender::Male => "Male",
      Gender::Female => "Female",
      Gender::Other => "Other",
    }
  }
}

impl fmt::Display for Gender {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Gender {
  type Err = CoachError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "male" | "m" => Ok(Gender::Male),
      "female" | "f" => Ok(Gender::Female),
      "other" | "o" => Ok(Gender::Other),
      other => Err(CoachError::invalid_profile(
        "gender",
        format!("'{}' is not one of Male, Female, Other", other),
      )),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Experience {
  Beginner,
  Intermediate,
  Advanced,
}

impl Experience {
  pub const ALL: [Experience; 3] = [
    Experience::Beginner,
    Experience::Intermediate,
    Experience::Advanced,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Experience::Beginner => "Beginner",
      Experience::Intermediate => "Intermediate",
      Experience::Advanced => "Advanced",
    }
  }
}

impl fmt::Display for Experience {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Experience {
  type Err = CoachError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "beginner" => Ok(Experience::Beginner),
      "intermediate" => Ok(Experience::Intermediate),
      "advanced" => Ok(Experience::Advanced),
      other => Err(CoachError::invalid_profile(
        "experience",
        format!("'{}' is not one of Beginner, Intermediate, Advanced", other),
      )),
    }
  }
}

/// Equipment the user can train with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Equipment {
  None,
  Some,
  Full,
}

impl Equipment {
  pub const ALL: [Equipment; 3] = [Equipment::None, Equipment::Some, Equipment::Full];

  /// Label as shown on the profile form
  pub fn label(&self) -> &'static str {
    match self {
      Equipment::None => "None",
      Equipment::Some => "Some (e.g. dumbbells, bands)",
      Equipment::Full => "Full gym access",
    }
  }
}

impl fmt::Display for Equipment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for Equipment {
  type Err = CoachError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "none" | "no equipment" => Ok(Equipment::None),
      "some" | "some (e.g. dumbbells, bands)" => Ok(Equipment::Some),
      "full" | "full gym" | "full gym access" => Ok(Equipment::Full),
      other => Err(CoachError::invalid_profile(
        "equipment",
        format!("'{}' is not one of None, Some, Full", other),
      )),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Free time slots
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayPeriod {
  Morning,
  Afternoon,
  Evening,
}

impl DayPeriod {
  pub fn as_str(&self) -> &'static str {
    match self {
      DayPeriod::Morning => "morning",
      DayPeriod::Afternoon => "afternoon",
      DayPeriod::Evening => "evening",
    }
  }
}

impl FromStr for DayPeriod {
  type Err = CoachError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "morning" => Ok(DayPeriod::Morning),
      "afternoon" => Ok(DayPeriod::Afternoon),
      "evening" => Ok(DayPeriod::Evening),
      other => Err(CoachError::invalid_profile(
        "free_slots",
        format!("'{}' is not a period of the day", other),
      )),
    }
  }
}

/// A day the user is free, optionally narrowed to part of the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FreeSlot {
  pub day: Weekday,
  pub period: Option<DayPeriod>,
}

impl FreeSlot {
  pub fn day(day: Weekday) -> Self {
    Self { day, period: None }
  }

  pub fn at(day: Weekday, period: DayPeriod) -> Self {
    Self {
      day,
      period: Some(period),
    }
  }
}

pub fn day_name(day: Weekday) -> &'static str {
  match day {
    Weekday::Mon => "Monday",
    Weekday::Tue => "Tuesday",
    Weekday::Wed => "Wednesday",
    Weekday::Thu => "Thursday",
    Weekday::Fri => "Friday",
    Weekday::Sat => "Saturday",
    Weekday::Sun => "Sunday",
  }
}

impl fmt::Display for FreeSlot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.period {
      Some(period) => write!(f, "{} {}", day_name(self.day), period.as_str()),
      None => f.write_str(day_name(self.day)),
    }
  }
}

impl FromStr for FreeSlot {
  type Err = CoachError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut parts = s.split_whitespace();

    let day = parts
      .next()
      .ok_or_else(|| CoachError::invalid_profile("free_slots", "empty time slot"))?;
    let day = Weekday::from_str(day).map_err(|_| {
      CoachError::invalid_profile("free_slots", format!("'{}' is not a day of the week", day))
    })?;

    let period = parts.next().map(DayPeriod::from_str).transpose()?;

    if parts.next().is_some() {
      return Err(CoachError::invalid_profile(
        "free_slots",
        format!("'{}' has trailing text", s.trim()),
      ));
    }

    Ok(Self { day, period })
  }
}

impl TryFrom<String> for FreeSlot {
  type Error = CoachError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<FreeSlot> for String {
  fn from(slot: FreeSlot) -> Self {
    slot.to_string()
  }
}

/// ---------------------------------------------------------------------------
/// Form input
/// ---------------------------------------------------------------------------

/// Raw answers from the profile form; any field may still be missing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileForm {
  pub weight_kg: Option<f64>,
  pub height_m: Option<f64>,
  pub age: Option<u32>,
  pub gender: Option<Gender>,
  #[serde(default)]
  pub free_slots: Vec<FreeSlot>,
  pub experience: Option<Experience>,
  pub session_minutes: Option<u32>,
  pub equipment: Option<Equipment>,
}

/// ---------------------------------------------------------------------------
/// Validated profile
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProfileForm")]
pub struct Profile {
  weight_kg: f64,
  height_m: f64,
  age: u32,
  gender: Gender,
  free_slots: Vec<FreeSlot>,
  experience: Experience,
  session_minutes: u32,
  equipment: Equipment,
  bmi: f64,
}

impl Profile {
  /// Validate form answers and derive BMI
  pub fn from_form(form: ProfileForm) -> Result<Self, CoachError> {
    let weight_kg = require("weight_kg", form.weight_kg)?;
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
      return Err(CoachError::invalid_profile(
        "weight_kg",
        format!("must be a positive number, got {}", weight_kg),
      ));
    }

    let height_m = require("height_m", form.height_m)?;
    if !height_m.is_finite() || height_m <= 0.0 {
      return Err(CoachError::invalid_profile(
        "height_m",
        format!("must be a positive number, got {}", height_m),
      ));
    }

    let age = require("age", form.age)?;
    if age == 0 {
      return Err(CoachError::invalid_profile("age", "must be at least 1"));
    }

    let gender = require("gender", form.gender)?;
    let experience = require("experience", form.experience)?;
    let equipment = require("equipment", form.equipment)?;

    let session_minutes = require("session_minutes", form.session_minutes)?;
    check_session_minutes(session_minutes)?;

    // Keep first-seen order for display, drop repeats
    let mut free_slots: Vec<FreeSlot> = Vec::with_capacity(form.free_slots.len());
    for slot in form.free_slots {
      if !free_slots.contains(&slot) {
        free_slots.push(slot);
      }
    }

    // Finite inputs can still overflow or underflow the quotient
    let bmi = weight_kg / (height_m * height_m);
    check_bmi(bmi)?;

    Ok(Self {
      weight_kg,
      height_m,
      age,
      gender,
      free_slots,
      experience,
      session_minutes,
      equipment,
      bmi,
    })
  }

  /// Re-check the invariants scoring and prompting depend on
  pub fn validate(&self) -> Result<(), CoachError> {
    if self.age == 0 {
      return Err(CoachError::invalid_profile("age", "must be at least 1"));
    }
    check_bmi(self.bmi)?;
    check_session_minutes(self.session_minutes)
  }

  pub fn weight_kg(&self) -> f64 {
    self.weight_kg
  }

  pub fn height_m(&self) -> f64 {
    self.height_m
  }

  pub fn age(&self) -> u32 {
    self.age
  }

  pub fn gender(&self) -> Gender {
    self.gender
  }

  pub fn free_slots(&self) -> &[FreeSlot] {
    &self.free_slots
  }

  pub fn experience(&self) -> Experience {
    self.experience
  }

  pub fn session_minutes(&self) -> u32 {
    self.session_minutes
  }

  pub fn equipment(&self) -> Equipment {
    self.equipment
  }

  /// Body-mass index, fixed at construction
  pub fn bmi(&self) -> f64 {
    self.bmi
  }

  /// BMI rounded to 2 decimal places
  pub fn bmi_rounded(&self) -> f64 {
    (self.bmi * 100.0).round() / 100.0
  }

  /// Free slots joined for display, e.g. "Monday, Friday evening"
  pub fn free_slots_display(&self) -> String {
    self
      .free_slots
      .iter()
      .map(|s| s.to_string())
      .collect::<Vec<_>>()
      .join(", ")
  }
}

#[cfg(test)]
impl Profile {
  /// Overwrite the derived BMI without any checks
  pub(crate) fn with_raw_bmi(mut self, bmi: f64) -> Self {
    self.bmi = bmi;
    self
  }
}

impl TryFrom<ProfileForm> for Profile {
  type Error = CoachError;

  fn try_from(form: ProfileForm) -> Result<Self, Self::Error> {
    Profile::from_form(form)
  }
}

fn require<T>(field: &'static str, value: Option<T>) -> Result<T, CoachError> {
  value.ok_or_else(|| CoachError::invalid_profile(field, "is missing"))
}

fn check_bmi(bmi: f64) -> Result<(), CoachError> {
  if !bmi.is_finite() || bmi <= 0.0 {
    return Err(CoachError::invalid_profile(
      "bmi",
      format!("must be a positive number, got {}", bmi),
    ));
  }
  Ok(())
}

fn check_session_minutes(minutes: u32) -> Result<(), CoachError> {
  if !(MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&minutes) {
    return Err(CoachError::invalid_profile(
      "session_minutes",
      format!(
        "must be between {} and {}, got {}",
        MIN_SESSION_MINUTES, MAX_SESSION_MINUTES, minutes
      ),
    ));
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
