//! Age estimates and the bands derived from them

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Oldest age the chat service accepts
pub const MAX_AGE_YEARS: f64 = 120.0;

/// Parenting mode is only offered above this age
pub const PARENTING_MIN_AGE: f64 = 25.0;

#[derive(Debug, Error, PartialEq)]
#[error("Age must be between 0 and 120, got {0}")]
pub struct InvalidAge(pub f64);

/// Result of an age inference, or its absence
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgeEstimate {
    Years { years: f64 },
    #[default]
    Unknown,
}

impl AgeEstimate {
    /// Validated constructor: finite and within `[0, MAX_AGE_YEARS]`
    pub fn years(years: f64) -> Result<Self, InvalidAge> {
        if years.is_finite() && (0.0..=MAX_AGE_YEARS).contains(&years) {
            Ok(AgeEstimate::Years { years })
        } else {
            Err(InvalidAge(years))
        }
    }

    /// Lenient constructor for stored values: anything invalid is `Unknown`
    pub fn from_option(years: Option<f64>) -> Self {
        years
            .and_then(|y| Self::years(y).ok())
            .unwrap_or(AgeEstimate::Unknown)
    }

    pub fn as_years(self) -> Option<f64> {
        match self {
            AgeEstimate::Years { years } => Some(years),
            AgeEstimate::Unknown => None,
        }
    }
}

/// Coarse age classification sent to the chat service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Child,
    Teen,
    Adult,
    Senior,
}

impl AgeGroup {
    pub fn from_years(years: f64) -> Self {
        if years < 13.0 {
            AgeGroup::Child
        } else if years < 18.0 {
            AgeGroup::Teen
        } else if years < 65.0 {
            AgeGroup::Adult
        } else {
            AgeGroup::Senior
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgeGroup::Child => "child",
            AgeGroup::Teen => "teen",
            AgeGroup::Adult => "adult",
            AgeGroup::Senior => "senior",
        }
    }

    pub fn is_minor(self) -> bool {
        matches!(self, AgeGroup::Child | AgeGroup::Teen)
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finer bands used to pick greetings and health focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBand {
    Child,
    Teen,
    YoungAdult,
    Midlife,
    Mature,
}

impl AgeBand {
    pub fn from_years(years: f64) -> Self {
        if years < 13.0 {
            AgeBand::Child
        } else if years < 18.0 {
            AgeBand::Teen
        } else if years < 30.0 {
            AgeBand::YoungAdult
        } else if years < 50.0 {
            AgeBand::Midlife
        } else {
            AgeBand::Mature
        }
    }

    /// Short label shown next to the detected age
    pub fn focus_label(self) -> &'static str {
        match self {
            AgeBand::Child => "Building Healthy Habits",
            AgeBand::Teen => "Growth & Development",
            AgeBand::YoungAdult => "Establishing Routines",
            AgeBand::Midlife => "Maintaining Health",
            AgeBand::Mature => "Wellness & Prevention",
        }
    }
}

/// Age rounded for display
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn display_age(years: f64) -> u32 {
    // Range is validated upstream, the clamp only guards the cast
    years.round().clamp(0.0, MAX_AGE_YEARS) as u32
}

/// Whether parenting mode may be offered or toggled at this age
pub fn parenting_eligible(years: Option<f64>) -> bool {
    years.is_some_and(|y| y > PARENTING_MIN_AGE)
}
