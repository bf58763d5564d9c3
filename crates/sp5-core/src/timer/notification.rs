use serde::{Deserialize, Serialize};

/// Which phase boundary a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    WorkEnd,
    BreakEnd,
    WorkSkip,
    BreakSkip,
}

impl NotificationKind {
    /// Stable notification id; showing the same id again replaces the old one.
    pub fn id(&self) -> &'static str {
        match self {
            NotificationKind::WorkEnd => "work_end",
            NotificationKind::BreakEnd => "break_end",
            NotificationKind::WorkSkip => "work_skip",
            NotificationKind::BreakSkip => "break_skip",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn id(&self) -> &'static str {
        self.kind.id()
    }

    pub(crate) fn work_end(sp_count: u32, daily_goal: u32) -> Self {
        Self {
            kind: NotificationKind::WorkEnd,
            title: "Time for a break!".into(),
            message: format!("SP completed: {sp_count} of {daily_goal}"),
        }
    }

    pub(crate) fn work_skip(sp_count: u32, daily_goal: u32) -> Self {
        Self {
            kind: NotificationKind::WorkSkip,
            title: "Work cycle skipped".into(),
            message: format!("Counted as done. SP completed: {sp_count} of {daily_goal}"),
        }
    }

    pub(crate) fn break_end() -> Self {
        Self {
            kind: NotificationKind::BreakEnd,
            title: "Break is over!".into(),
            message: "Ready for the next work cycle?".into(),
        }
    }

    pub(crate) fn break_skip() -> Self {
        Self {
            kind: NotificationKind::BreakSkip,
            title: "Break skipped".into(),
            message: "Ready for the next work cycle?".into(),
        }
    }
}
