//! Named wake-ups.
//!
//! There are exactly two: the phase timer that ends a work session or a
//! break, and the badge refresher that re-renders the countdown once a
//! minute. Scheduling a name that already exists replaces it, so each name
//! has at most one pending wake-up.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlarmName {
    #[serde(rename = "sp5Timer")]
    PhaseTimer,
    #[serde(rename = "badgeUpdater")]
    BadgeRefresh,
}

impl AlarmName {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmName::PhaseTimer => "sp5Timer",
            AlarmName::BadgeRefresh => "badgeUpdater",
        }
    }
}

impl fmt::Display for AlarmName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlarmName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sp5Timer" => Ok(AlarmName::PhaseTimer),
            "badgeUpdater" => Ok(AlarmName::BadgeRefresh),
            other => Err(format!("unknown alarm '{other}'")),
        }
    }
}

/// A pending wake-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub name: AlarmName,
    pub scheduled_at_ms: u64,
}
