//! Deterministic fitness score
//!
//! The score is the sum of three bounded parts: an age band, a BMI band and an
//! equipment tier. The equipment tier is a table so deployments can pick their
//! own weights; the ceiling follows from whichever table is in use.
//!
//! | part      | rule                                   | points       |
//! |-----------|----------------------------------------|--------------|
//! | age       | <=30 / 31-45 / 46-60 / >60             | 15 / 10 / 5 / 2 |
//! | BMI       | 18.5 <= BMI <= 24.9, otherwise         | 15 / 5       |
//! | equipment | None / Some / Full (default table)     | 0 / 10 / 20  |
//!
//! With the default table the ceiling is 15 + 15 + 20 = 50.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoachError;
use crate::models::{Equipment, Profile};

/// ---------------------------------------------------------------------------
/// Band constants
/// ---------------------------------------------------------------------------

const AGE_POINTS_UP_TO_30: u32 = 15;
const AGE_POINTS_31_TO_45: u32 = 10;
const AGE_POINTS_46_TO_60: u32 = 5;
const AGE_POINTS_OVER_60: u32 = 2;
const AGE_POINTS_MAX: u32 = AGE_POINTS_UP_TO_30;

const BMI_HEALTHY_LOW: f64 = 18.5;
const BMI_HEALTHY_HIGH: f64 = 24.9;
const BMI_POINTS_HEALTHY: u32 = 15;
const BMI_POINTS_OTHER: u32 = 5;
const BMI_POINTS_MAX: u32 = BMI_POINTS_HEALTHY;

/// ---------------------------------------------------------------------------
/// Equipment table
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentWeights {
  pub none: u32,
  pub some: u32,
  pub full: u32,
}

impl Default for EquipmentWeights {
  fn default() -> Self {
    Self {
      none: 0,
      some: 10,
      full: 20,
    }
  }
}

impl EquipmentWeights {
  pub fn points(&self, equipment: Equipment) -> u32 {
    match equipment {
      Equipment::None => self.none,
      Equipment::Some => self.some,
      Equipment::Full => self.full,
    }
  }

  pub fn max_points(&self) -> u32 {
    self.none.max(self.some).max(self.full)
  }

  /// Highest score reachable with this table
  pub fn max_score(&self) -> u32 {
    AGE_POINTS_MAX + BMI_POINTS_MAX + self.max_points()
  }
}

/// Ceiling for the default equipment table
pub const DEFAULT_MAX_SCORE: u32 = 50;

/// ---------------------------------------------------------------------------
/// Score
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
  pub age: u32,
  pub bmi: u32,
  pub equipment: u32,
}

impl ScoreBreakdown {
  pub fn total(&self) -> u32 {
    self.age + self.bmi + self.equipment
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitnessScore {
  pub value: u32,
  pub max: u32,
  pub breakdown: ScoreBreakdown,
}

impl fmt::Display for FitnessScore {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.value, self.max)
  }
}

pub fn age_points(age: u32) -> u32 {
  match age {
    0..=30 => AGE_POINTS_UP_TO_30,
    31..=45 => AGE_POINTS_31_TO_45,
    46..=60 => AGE_POINTS_46_TO_60,
    _ => AGE_POINTS_OVER_60,
  }
}

pub fn bmi_points(bmi: f64) -> u32 {
  if (BMI_HEALTHY_LOW..=BMI_HEALTHY_HIGH).contains(&bmi) {
    BMI_POINTS_HEALTHY
  } else {
    BMI_POINTS_OTHER
  }
}

/// Score a profile with the default equipment table
pub fn compute_score(profile: &Profile) -> Result<FitnessScore, CoachError> {
  compute_score_with(profile, &EquipmentWeights::default())
}

/// Score a profile with a custom equipment table
pub fn compute_score_with(
  profile: &Profile,
  weights: &EquipmentWeights,
) -> Result<FitnessScore, CoachError> {
  profile.validate()?;

  let breakdown = ScoreBreakdown {
    age: age_points(profile.age()),
    bmi: bmi_points(profile.bmi()),
    equipment: weights.points(profile.equipment()),
  };

  Ok(FitnessScore {
    value: breakdown.total(),
    max: weights.max_score(),
    breakdown,
  })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
