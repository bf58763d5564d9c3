//! SP-5 state machine.
//!
//! A pure function from `(record, event, context)` to the next record plus
//! the side effects the caller must carry out. Nothing here touches storage,
//! alarms or the system clock.
//!
//! ## State Transitions
//!
//! ```text
//! Initial --main--> Work --wake/skip_cycle--> Break --wake/skip--> Initial
//!                    |  ^                       |  ^
//!                  main main                  main main
//!                    v  |                       v  |
//!                  Paused(work)              Paused(break)
//!
//! any --end_day / new day--> Initial (counter zeroed)
//! ```

use chrono::NaiveDate;

use super::notification::Notification;
use super::record::{ActivePhase, TimerRecord, TimerState};
use crate::alarm::AlarmName;
use crate::events::Command;

pub const WORK_MINUTES: u64 = 45;
pub const BREAK_MINUTES: u64 = 15;
pub const WORK_MS: u64 = WORK_MINUTES * 60 * 1000;
pub const BREAK_MS: u64 = BREAK_MINUTES * 60 * 1000;

/// Input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Command(Command),
    /// The phase timer fired.
    WakeUp,
}

impl From<Command> for Event {
    fn from(command: Command) -> Self {
        Event::Command(command)
    }
}

/// What the state machine may observe about the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub now_ms: u64,
    pub today: NaiveDate,
    /// When the pending phase timer fires, if one is scheduled.
    pub deadline_ms: Option<u64>,
}

/// Side effect requested by a transition, executed in order by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Schedule { alarm: AlarmName, at_ms: u64 },
    Cancel(AlarmName),
    CancelAll,
    Notify(Notification),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub record: TimerRecord,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(record: &TimerRecord) -> Self {
        Self {
            record: record.clone(),
            effects: Vec::new(),
        }
    }

    /// Whether the event left the record and the outside world untouched.
    pub fn is_noop(&self, before: &TimerRecord) -> bool {
        self.effects.is_empty() && self.record == *before
    }
}

pub fn transition(record: &TimerRecord, event: Event, ctx: &Context) -> Transition {
    match event {
        Event::Command(Command::EndDay) => end_day(record),
        Event::Command(Command::CheckDate) => check_date(record, ctx),
        Event::Command(Command::AddSp) => add_sp(record),
        Event::Command(Command::MainAction) => main_action(record, ctx),
        Event::Command(Command::SkipCycle) => match record.state {
            TimerState::Work => finish_work(record, ctx, true),
            TimerState::Break => finish_break(record, true),
            _ => Transition::unchanged(record),
        },
        Event::Command(Command::SkipBreak) => match record.state {
            TimerState::Break => finish_break(record, true),
            _ => Transition::unchanged(record),
        },
        Event::WakeUp => match record.state {
            TimerState::Work => finish_work(record, ctx, false),
            TimerState::Break => finish_break(record, false),
            // Stale wake-up: nothing is running, only drop the alarm.
            _ => Transition {
                record: record.clone(),
                effects: vec![Effect::Cancel(AlarmName::PhaseTimer)],
            },
        },
    }
}

fn main_action(record: &TimerRecord, ctx: &Context) -> Transition {
    let mut next = record.clone();
    let effects = match record.state {
        TimerState::Initial => {
            next.state = TimerState::Work;
            vec![Effect::Schedule {
                alarm: AlarmName::PhaseTimer,
                at_ms: ctx.now_ms.saturating_add(WORK_MS),
            }]
        }
        TimerState::Work | TimerState::Break => {
            let Some(deadline) = ctx.deadline_ms else {
                // No wake-up to measure against; leave the phase running.
                return Transition::unchanged(record);
            };
            let previous = match record.state {
                TimerState::Work => ActivePhase::Work,
                _ => ActivePhase::Break,
            };
            next.state = TimerState::Paused {
                remaining_ms: deadline.saturating_sub(ctx.now_ms),
                previous,
            };
            vec![Effect::Cancel(AlarmName::PhaseTimer)]
        }
        TimerState::Paused {
            remaining_ms,
            previous,
        } => {
            next.state = previous.into();
            vec![Effect::Schedule {
                alarm: AlarmName::PhaseTimer,
                at_ms: ctx.now_ms.saturating_add(remaining_ms),
            }]
        }
    };
    Transition {
        record: next,
        effects,
    }
}

fn finish_work(record: &TimerRecord, ctx: &Context, skipped: bool) -> Transition {
    let mut next = record.clone();
    next.sp_count = record.sp_count.saturating_add(1);
    next.state = TimerState::Break;
    let notification = if skipped {
        Notification::work_skip(next.sp_count, next.daily_goal)
    } else {
        Notification::work_end(next.sp_count, next.daily_goal)
    };
    Transition {
        record: next,
        effects: vec![
            Effect::Schedule {
                alarm: AlarmName::PhaseTimer,
                at_ms: ctx.now_ms.saturating_add(BREAK_MS),
            },
            Effect::Notify(notification),
        ],
    }
}

fn finish_break(record: &TimerRecord, skipped: bool) -> Transition {
    let mut next = record.clone();
    next.state = TimerState::Initial;
    let notification = if skipped {
        Notification::break_skip()
    } else {
        Notification::break_end()
    };
    Transition {
        record: next,
        effects: vec![
            Effect::Cancel(AlarmName::PhaseTimer),
            Effect::Notify(notification),
        ],
    }
}

fn end_day(record: &TimerRecord) -> Transition {
    let mut next = record.clone();
    next.state = TimerState::Initial;
    next.sp_count = 0;
    Transition {
        record: next,
        effects: vec![Effect::CancelAll],
    }
}

fn check_date(record: &TimerRecord, ctx: &Context) -> Transition {
    if record.last_reset_date == ctx.today {
        return Transition::unchanged(record);
    }
    let mut reset = end_day(record);
    reset.record.last_reset_date = ctx.today;
    reset
}

fn add_sp(record: &TimerRecord) -> Transition {
    let mut next = record.clone();
    if next.sp_count < next.daily_goal {
        next.sp_count += 1;
    }
    Transition {
        record: next,
        effects: Vec::new(),
    }
}
