//! Chat session state types

use crate::age::{parenting_eligible, AgeBand, AgeEstimate, AgeGroup};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rolling exchange history kept per session
pub const HISTORY_LIMIT: usize = 10;

/// Exchanges sent to the chat service as context
pub const HISTORY_CONTEXT: usize = 5;

// ============================================================================
// Conversation State
// ============================================================================

/// Where the conversation is in its lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    /// Not yet initialized with an age result
    #[default]
    Idle,

    /// The parenting opt-in question is open; the next input answers it
    AwaitingParentingConfirmation,

    /// Normal message routing
    Active,
}

impl ChatState {
    pub fn is_awaiting_confirmation(self) -> bool {
        matches!(self, ChatState::AwaitingParentingConfirmation)
    }
}

// ============================================================================
// Session
// ============================================================================

/// Persisted per-user session data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub predicted_age_years: Option<f64>,
    pub age_group: Option<AgeGroup>,
    pub parenting_mode_active: bool,
    /// One-time flag: the opt-in question has been asked
    pub parenting_asked: bool,
    pub gender_hint: Option<String>,
}

impl Session {
    /// Set the age and the group derived from it
    pub fn set_age(&mut self, years: Option<f64>) {
        self.predicted_age_years = years;
        self.age_group = years.map(AgeGroup::from_years);
        if !parenting_eligible(years) {
            self.parenting_mode_active = false;
        }
    }

    pub fn age_estimate(&self) -> AgeEstimate {
        AgeEstimate::from_option(self.predicted_age_years)
    }

    pub fn age_band(&self) -> Option<AgeBand> {
        self.predicted_age_years.map(AgeBand::from_years)
    }

    pub fn parenting_eligible(&self) -> bool {
        parenting_eligible(self.predicted_age_years)
    }
}

// ============================================================================
// Exchange History
// ============================================================================

/// One completed user message / assistant reply pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub message: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl Exchange {
    pub fn new(message: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            response: response.into(),
            timestamp: Utc::now(),
        }
    }
}
