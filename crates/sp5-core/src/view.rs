//! Popup view model.
//!
//! Everything the popup shows, derived from the record. Rendering is left
//! to whatever front end consumes this; the CLI prints it as JSON.

use serde::{Deserialize, Serialize};

use crate::timer::{TimerRecord, TimerState, WORK_MS};

pub const GOAL_MET_COLOR: &str = "#34c759";
pub const PROGRESS_COLOR: &str = "#007aff";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Timer,
    /// Daily goal met and nothing running.
    Completion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub done: u32,
    pub goal: u32,
    /// 0.0 .. 100.0
    pub percent: f64,
    pub color: String,
    /// "done/goal", as shown in the middle of the ring.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupView {
    pub screen: Screen,
    pub mode: String,
    pub button: String,
    /// `MM:SS`
    pub display: String,
    pub show_skip_break: bool,
    pub progress: Progress,
}

impl PopupView {
    pub fn new(record: &TimerRecord, deadline_ms: Option<u64>, now_ms: u64) -> Self {
        let (mode, button, remaining_ms) = match record.state {
            TimerState::Work => ("Work", "Pause", countdown(deadline_ms, now_ms)),
            TimerState::Break => ("Break", "Pause", countdown(deadline_ms, now_ms)),
            TimerState::Paused { remaining_ms, .. } => ("Paused", "Resume", remaining_ms),
            TimerState::Initial => ("Ready to work?", "Start work", WORK_MS),
        };
        let screen = if record.state == TimerState::Initial && record.goal_reached() {
            Screen::Completion
        } else {
            Screen::Timer
        };
        Self {
            screen,
            mode: mode.to_string(),
            button: button.to_string(),
            display: format_time(round_secs(remaining_ms)),
            show_skip_break: record.state == TimerState::Break,
            progress: Progress::new(record.sp_count, record.daily_goal),
        }
    }
}

impl Progress {
    fn new(done: u32, goal: u32) -> Self {
        let goal = goal.max(1);
        let percent = (f64::from(done) / f64::from(goal) * 100.0).min(100.0);
        let color = if done >= goal {
            GOAL_MET_COLOR
        } else {
            PROGRESS_COLOR
        };
        Self {
            done,
            goal,
            percent,
            color: color.to_string(),
            label: format!("{done}/{goal}"),
        }
    }
}

fn countdown(deadline_ms: Option<u64>, now_ms: u64) -> u64 {
    deadline_ms.map_or(0, |d| d.saturating_sub(now_ms))
}

fn round_secs(ms: u64) -> u64 {
    ms.saturating_add(500) / 1000
}

/// Format whole seconds as zero-padded `MM:SS`.
pub fn format_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ActivePhase;
    use chrono::NaiveDate;

    fn record(state: TimerState, sp_count: u32) -> TimerRecord {
        TimerRecord {
            state,
            sp_count,
            daily_goal: 5,
            last_reset_date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
        }
    }

    #[test]
    fn initial_view_offers_a_full_work_session() {
        let view = PopupView::new(&record(TimerState::Initial, 0), None, 0);
        assert_eq!(view.screen, Screen::Timer);
        assert_eq!(view.mode, "Ready to work?");
        assert_eq!(view.button, "Start work");
        assert_eq!(view.display, "45:00");
        assert!(!view.show_skip_break);
        assert_eq!(view.progress.label, "0/5");
    }

    #[test]
    fn break_view_counts_down_and_offers_skip() {
        let view = PopupView::new(&record(TimerState::Break, 2), Some(10_000 + 61_400), 10_000);
        assert_eq!(view.display, "01:01");
        assert_eq!(view.button, "Pause");
        assert!(view.show_skip_break);
        assert_eq!(view.progress.percent, 40.0);
        assert_eq!(view.progress.color, PROGRESS_COLOR);
    }

    #[test]
    fn paused_view_shows_frozen_time() {
        let state = TimerState::Paused {
            remaining_ms: 125_000,
            previous: ActivePhase::Work,
        };
        let view = PopupView::new(&record(state, 0), None, 0);
        assert_eq!(view.mode, "Paused");
        assert_eq!(view.button, "Resume");
        assert_eq!(view.display, "02:05");
    }

    #[test]
    fn huge_remaining_time_does_not_overflow() {
        let state = TimerState::Paused {
            remaining_ms: u64::MAX,
            previous: ActivePhase::Break,
        };
        let view = PopupView::new(&record(state, 0), None, 0);
        assert_eq!(view.display, "307445734561825:51");
    }

    #[test]
    fn goal_met_while_idle_shows_completion() {
        let view = PopupView::new(&record(TimerState::Initial, 5), None, 0);
        assert_eq!(view.screen, Screen::Completion);
        assert_eq!(view.progress.color, GOAL_MET_COLOR);
        assert_eq!(view.progress.percent, 100.0);

        let running = PopupView::new(&record(TimerState::Work, 6), Some(1_000), 0);
        assert_eq!(running.screen, Screen::Timer);
        assert_eq!(running.progress.percent, 100.0);
    }
}
