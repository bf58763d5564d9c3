//! Badge reflector.
//!
//! Derives the small indicator next to the timer icon from the current
//! state. It never writes the record; the only thing it decides besides
//! the text and color is whether the one-minute refresh wake-up should keep
//! running.

use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

pub const RUNNING_COLOR: &str = "#007aff";
pub const PAUSED_COLOR: &str = "#8e8e93";
pub const REFRESH_INTERVAL_MS: u64 = 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub text: String,
    /// `None` keeps whatever color the indicator had.
    pub color: Option<String>,
}

impl Badge {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            color: None,
        }
    }

    fn minutes(ms: u64, color: &str) -> Self {
        Self {
            text: format!("{}'", ceil_minutes(ms)),
            color: Some(color.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Schedule the refresh wake-up at the given instant.
    Arm { at_ms: u64 },
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeUpdate {
    pub badge: Badge,
    pub refresh: Refresh,
}

/// Compute the badge for `state` at `now_ms`, given the pending phase
/// deadline if there is one.
pub fn reflect(state: &TimerState, deadline_ms: Option<u64>, now_ms: u64) -> BadgeUpdate {
    match (state, deadline_ms) {
        (TimerState::Work | TimerState::Break, Some(deadline)) => BadgeUpdate {
            badge: Badge::minutes(deadline.saturating_sub(now_ms), RUNNING_COLOR),
            refresh: Refresh::Arm {
                at_ms: now_ms.saturating_add(REFRESH_INTERVAL_MS),
            },
        },
        (TimerState::Paused { remaining_ms, .. }, _) => BadgeUpdate {
            badge: Badge::minutes(*remaining_ms, PAUSED_COLOR),
            refresh: Refresh::Cancel,
        },
        _ => BadgeUpdate {
            badge: Badge::empty(),
            refresh: Refresh::Cancel,
        },
    }
}

fn ceil_minutes(ms: u64) -> u64 {
    ms.div_ceil(60 * 1000)
}
