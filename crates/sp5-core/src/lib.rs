//! # SP-5 Core Library
//!
//! Business logic for the SP-5 work/break timer: 45-minute work sessions,
//! 15-minute breaks and a daily goal of completed sessions.
//!
//! ## Architecture
//!
//! - **Timer**: a pure state machine, `(record, event, context) -> (record, effects)`
//! - **Badge**: derives the countdown indicator from the current state
//! - **View**: the popup's display model
//! - **Runtime**: the background driver that executes effects against a
//!   record store, an alarm scheduler and a presenter
//! - **Storage**: SQLite for the record and pending alarms, TOML for configuration
//!
//! ## Key Components
//!
//! - [`transition`]: the state machine
//! - [`Background`]: event loop entry points and the message boundary
//! - [`Database`]: durable record store and alarm table
//! - [`Config`]: application configuration

pub mod alarm;
pub mod badge;
pub mod clock;
pub mod error;
pub mod events;
pub mod runtime;
pub mod storage;
pub mod timer;
pub mod view;

pub use alarm::{Alarm, AlarmName};
pub use badge::{reflect, Badge, BadgeUpdate, Refresh};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError};
pub use events::{Command, Message, Response};
pub use runtime::{AlarmScheduler, Background, Presenter, RecordStore, Settings, Snapshot};
pub use storage::{Config, Database};
pub use timer::{
    transition, ActivePhase, Notification, NotificationKind, TimerRecord, TimerState,
};
pub use view::PopupView;
