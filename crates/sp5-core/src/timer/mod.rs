mod machine;
mod notification;
mod record;

pub use machine::{
    transition, Context, Effect, Event, Transition, BREAK_MINUTES, BREAK_MS, WORK_MINUTES,
    WORK_MS,
};
pub use notification::{Notification, NotificationKind};
pub use record::{ActivePhase, TimerRecord, TimerState, DEFAULT_DAILY_GOAL};
