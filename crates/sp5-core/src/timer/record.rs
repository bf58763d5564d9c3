//! The persisted timer record.
//!
//! Stored as a single JSON object with camelCase keys:
//!
//! ```text
//! { "timerState": "paused", "remainingTime": 120000, "previousState": "work",
//!   "spCount": 2, "dailyGoal": 5, "lastResetDate": "2026-10-18" }
//! ```
//!
//! `remainingTime` and `previousState` only exist inside the `paused`
//! variant, so a record can never carry them in any other phase.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default number of work sessions to aim for each day.
pub const DEFAULT_DAILY_GOAL: u32 = 5;

/// A phase that owns a running wake-up and can be paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivePhase {
    Work,
    Break,
}

impl ActivePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivePhase::Work => "work",
            ActivePhase::Break => "break",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "timerState", rename_all = "lowercase")]
pub enum TimerState {
    Initial,
    Work,
    Break,
    Paused {
        /// Time left in the interrupted phase, in milliseconds.
        #[serde(rename = "remainingTime")]
        remaining_ms: u64,
        /// Phase to resume into.
        #[serde(rename = "previousState")]
        previous: ActivePhase,
    },
}

impl TimerState {
    pub fn name(&self) -> &'static str {
        match self {
            TimerState::Initial => "initial",
            TimerState::Work => "work",
            TimerState::Break => "break",
            TimerState::Paused { .. } => "paused",
        }
    }

    /// The running phase, if a phase wake-up should exist.
    pub fn active(&self) -> Option<ActivePhase> {
        match self {
            TimerState::Work => Some(ActivePhase::Work),
            TimerState::Break => Some(ActivePhase::Break),
            _ => None,
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, TimerState::Paused { .. })
    }

    pub fn remaining_ms(&self) -> Option<u64> {
        match self {
            TimerState::Paused { remaining_ms, .. } => Some(*remaining_ms),
            _ => None,
        }
    }

    pub fn previous(&self) -> Option<ActivePhase> {
        match self {
            TimerState::Paused { previous, .. } => Some(*previous),
            _ => None,
        }
    }
}

impl From<ActivePhase> for TimerState {
    fn from(phase: ActivePhase) -> Self {
        match phase {
            ActivePhase::Work => TimerState::Work,
            ActivePhase::Break => TimerState::Break,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerRecord {
    #[serde(flatten)]
    pub state: TimerState,
    /// Work sessions completed since `last_reset_date`.
    pub sp_count: u32,
    pub daily_goal: u32,
    pub last_reset_date: NaiveDate,
}

impl TimerRecord {
    /// The record written on install.
    pub fn new(daily_goal: u32, today: NaiveDate) -> Self {
        Self {
            state: TimerState::Initial,
            sp_count: 0,
            daily_goal: daily_goal.max(1),
            last_reset_date: today,
        }
    }

    pub fn goal_reached(&self) -> bool {
        self.sp_count >= self.daily_goal
    }
}
