//! The background driver.
//!
//! Owns the record store, the alarm scheduler, the presenter and the clock.
//! Each entry point handles one event to completion: load the record, run
//! the pure transition, save, carry out the effects, refresh the badge.
//! `&mut self` on every entry point keeps events strictly sequential.
//!
//! The record is saved before any alarm or notification is touched, so a
//! storage failure leaves both the stored record and the alarms as they
//! were.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::traits::{AlarmScheduler, Presenter, RecordStore};
use crate::alarm::{Alarm, AlarmName};
use crate::badge::{self, Badge, Refresh};
use crate::clock::Clock;
use crate::error::Result;
use crate::events::{Command, Message, Response};
use crate::timer::{self, Context, Effect, Event, TimerRecord, DEFAULT_DAILY_GOAL};
use crate::view::PopupView;

/// Upper bound on wake-ups fired by one catch-up pass.
const MAX_CATCH_UP: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Goal written into the record on install.
    pub daily_goal: u32,
    pub notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_goal: DEFAULT_DAILY_GOAL,
            notifications: true,
        }
    }
}

/// Everything a front end needs to draw the current state.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub record: TimerRecord,
    pub deadline_ms: Option<u64>,
    pub badge: Badge,
    pub view: PopupView,
    pub alarms: Vec<Alarm>,
}

pub struct Background<S, A, P, C> {
    store: S,
    alarms: A,
    presenter: P,
    clock: C,
    settings: Settings,
}

impl<S, A, P, C> Background<S, A, P, C>
where
    S: RecordStore,
    A: AlarmScheduler,
    P: Presenter,
    C: Clock,
{
    pub fn new(store: S, alarms: A, presenter: P, clock: C, settings: Settings) -> Self {
        Self {
            store,
            alarms,
            presenter,
            clock,
            settings,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn alarms(&self) -> &A {
        &self.alarms
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Write the default record and clear the badge.
    pub fn on_install(&mut self) -> Result<()> {
        let record = TimerRecord::new(self.settings.daily_goal, self.clock.today());
        self.store.save(&record)?;
        self.alarms.cancel_all()?;
        self.presenter.set_badge(&Badge::empty())?;
        info!(daily_goal = record.daily_goal, "installed with default record");
        Ok(())
    }

    /// Restore the badge after the process comes back up.
    pub fn on_startup(&mut self) -> Result<()> {
        self.update_badge()
    }

    pub fn on_alarm(&mut self, name: AlarmName) -> Result<()> {
        debug!(alarm = %name, "alarm fired");
        match name {
            // The transition replaces or cancels the fired alarm, so a
            // failed save leaves it pending for the next pass.
            AlarmName::PhaseTimer => self.apply(Event::WakeUp),
            // Re-armed or cancelled by the badge update.
            AlarmName::BadgeRefresh => self.update_badge(),
        }
    }

    /// Message boundary: never fails, reports errors in the response.
    pub fn handle_message(&mut self, message: &Message) -> Response {
        match message.command().and_then(|command| self.dispatch(command)) {
            Ok(()) => Response::Ok,
            Err(e) => {
                error!(command = %message.command, error = %e, "command failed");
                Response::error(&e)
            }
        }
    }

    /// Decode a raw JSON message and handle it.
    pub fn handle_raw(&mut self, raw: &str) -> Response {
        match Message::from_json(raw) {
            Ok(message) => self.handle_message(&message),
            Err(e) => {
                error!(error = %e, "rejected message");
                Response::error(&e)
            }
        }
    }

    pub fn dispatch(&mut self, command: Command) -> Result<()> {
        debug!(%command, "dispatching");
        self.apply(Event::Command(command))
    }

    /// Fire every wake-up that is already due, earliest first.
    ///
    /// Used when the process was not running at the scheduled instant.
    /// Returns how many wake-ups fired.
    pub fn fire_due_alarms(&mut self) -> Result<usize> {
        let mut fired = 0;
        while let Some(alarm) = self.due_alarm()? {
            if fired == MAX_CATCH_UP {
                warn!(alarm = %alarm.name, "catch-up stopped after {MAX_CATCH_UP} wake-ups");
                break;
            }
            let now = self.clock.now_ms();
            if now > alarm.scheduled_at_ms {
                debug!(alarm = %alarm.name, late_ms = now - alarm.scheduled_at_ms, "catching up");
            }
            self.on_alarm(alarm.name)?;
            fired += 1;
        }
        Ok(fired)
    }

    /// The earliest alarm whose time has come.
    fn due_alarm(&self) -> Result<Option<Alarm>> {
        let now = self.clock.now_ms();
        Ok(self
            .alarms
            .pending()?
            .into_iter()
            .find(|alarm| alarm.scheduled_at_ms <= now))
    }

    /// The earliest pending wake-up, if any.
    pub fn next_alarm(&self) -> Result<Option<Alarm>> {
        Ok(self.alarms.pending()?.into_iter().next())
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The stored record, or the install defaults if none was written yet.
    pub fn record(&self) -> Result<TimerRecord> {
        match self.store.load()? {
            Some(record) => Ok(record),
            None => {
                warn!("no stored record, using install defaults");
                Ok(TimerRecord::new(self.settings.daily_goal, self.clock.today()))
            }
        }
    }

    pub fn deadline_ms(&self) -> Result<Option<u64>> {
        Ok(self
            .alarms
            .get(AlarmName::PhaseTimer)?
            .map(|alarm| alarm.scheduled_at_ms))
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        let record = self.record()?;
        let deadline_ms = self.deadline_ms()?;
        let now = self.clock.now_ms();
        let badge = badge::reflect(&record.state, deadline_ms, now).badge;
        let view = PopupView::new(&record, deadline_ms, now);
        Ok(Snapshot {
            record,
            deadline_ms,
            badge,
            view,
            alarms: self.alarms.pending()?,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn apply(&mut self, event: Event) -> Result<()> {
        let record = self.record()?;
        let ctx = Context {
            now_ms: self.clock.now_ms(),
            today: self.clock.today(),
            deadline_ms: self.deadline_ms()?,
        };
        let step = timer::transition(&record, event, &ctx);

        if step.is_noop(&record) {
            debug!(state = record.state.name(), ?event, "event ignored");
        } else {
            if step.record != record {
                self.store.save(&step.record)?;
            }
            for effect in &step.effects {
                self.execute(effect)?;
            }
            if step.record.state.name() != record.state.name() {
                info!(
                    from = record.state.name(),
                    to = step.record.state.name(),
                    sp_count = step.record.sp_count,
                    "phase changed"
                );
            }
        }
        self.update_badge()
    }

    fn execute(&mut self, effect: &Effect) -> Result<()> {
        match effect {
            Effect::Schedule { alarm, at_ms } => self.alarms.schedule(*alarm, *at_ms),
            Effect::Cancel(alarm) => self.alarms.cancel(*alarm),
            Effect::CancelAll => self.alarms.cancel_all(),
            Effect::Notify(notification) => {
                if self.settings.notifications {
                    self.presenter.notify(notification)
                } else {
                    debug!(id = notification.id(), "notifications disabled");
                    Ok(())
                }
            }
        }
    }

    fn update_badge(&mut self) -> Result<()> {
        let record = self.record()?;
        let now = self.clock.now_ms();
        let update = badge::reflect(&record.state, self.deadline_ms()?, now);
        self.presenter.set_badge(&update.badge)?;
        match update.refresh {
            Refresh::Arm { at_ms } => self.alarms.schedule(AlarmName::BadgeRefresh, at_ms),
            Refresh::Cancel => self.alarms.cancel(AlarmName::BadgeRefresh),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::runtime::memory::{MemoryAlarms, MemoryStore, RecordingPresenter};
    use crate::timer::{NotificationKind, TimerState};
    use chrono::{Duration, NaiveDate};

    type TestBackground = Background<MemoryStore, MemoryAlarms, RecordingPresenter, ManualClock>;

    fn installed() -> TestBackground {
        let clock = ManualClock::on_day(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(), 9);
        let mut bg = Background::new(
            MemoryStore::new(),
            MemoryAlarms::new(),
            RecordingPresenter::new(),
            clock,
            Settings::default(),
        );
        bg.on_install().unwrap();
        bg
    }

    #[test]
    fn install_writes_defaults() {
        let bg = installed();
        let record = bg.record().unwrap();
        assert_eq!(record.state, TimerState::Initial);
        assert_eq!(record.sp_count, 0);
        assert_eq!(record.daily_goal, 5);
        assert!(bg.alarms().pending().unwrap().is_empty());
    }

    #[test]
    fn start_arms_phase_timer_and_badge_refresh() {
        let mut bg = installed();
        let now = bg.clock().now_ms();
        assert!(bg.handle_message(&Command::MainAction.into()).is_ok());

        assert_eq!(
            bg.alarms().scheduled_at(AlarmName::PhaseTimer),
            Some(now + timer::WORK_MS)
        );
        assert_eq!(
            bg.alarms().scheduled_at(AlarmName::BadgeRefresh),
            Some(now + 60_000)
        );
        assert_eq!(bg.presenter().badge.text, "45'");
    }

    #[test]
    fn pause_clears_both_alarms() {
        let mut bg = installed();
        bg.dispatch(Command::MainAction).unwrap();
        bg.clock().advance(Duration::minutes(10));
        bg.dispatch(Command::MainAction).unwrap();

        assert!(bg.alarms().pending().unwrap().is_empty());
        assert_eq!(
            bg.record().unwrap().state.remaining_ms(),
            Some(35 * 60 * 1000)
        );
        assert_eq!(bg.presenter().badge.text, "35'");
    }

    #[test]
    fn unknown_command_is_reported_not_raised() {
        let mut bg = installed();
        let before = bg.record().unwrap();
        let response = bg.handle_message(&Message::new("launch_rocket"));
        assert_eq!(
            response,
            Response::Error {
                message: "Unknown command: 'launch_rocket'".into()
            }
        );
        assert_eq!(bg.record().unwrap(), before);
    }

    #[test]
    fn failed_write_leaves_alarms_untouched() {
        let mut bg = installed();
        bg.store_mut().fail_writes = true;
        let response = bg.handle_message(&Command::MainAction.into());
        assert!(!response.is_ok());
        assert_eq!(bg.record().unwrap().state, TimerState::Initial);
        assert!(bg.alarms().get(AlarmName::PhaseTimer).unwrap().is_none());
    }

    #[test]
    fn failed_write_on_wake_up_keeps_the_phase_timer() {
        let mut bg = installed();
        bg.dispatch(Command::MainAction).unwrap();
        let deadline = bg.alarms().scheduled_at(AlarmName::PhaseTimer);
        bg.clock().advance(Duration::minutes(46));

        bg.store_mut().fail_writes = true;
        assert!(bg.fire_due_alarms().is_err());
        assert_eq!(bg.record().unwrap().state, TimerState::Work);
        assert_eq!(bg.alarms().scheduled_at(AlarmName::PhaseTimer), deadline);

        bg.store_mut().fail_writes = false;
        bg.fire_due_alarms().unwrap();
        let record = bg.record().unwrap();
        assert_eq!(record.state, TimerState::Break);
        assert_eq!(record.sp_count, 1);
        assert_eq!(
            bg.alarms().scheduled_at(AlarmName::PhaseTimer),
            Some(bg.clock().now_ms() + timer::BREAK_MS)
        );
    }

    #[test]
    fn stale_wake_up_is_consumed() {
        let mut bg = installed();
        let at = bg.clock().now_ms();
        bg.alarms.schedule(AlarmName::PhaseTimer, at).unwrap();

        assert_eq!(bg.fire_due_alarms().unwrap(), 1);
        assert_eq!(bg.record().unwrap().state, TimerState::Initial);
        assert!(bg.alarms().pending().unwrap().is_empty());
    }

    /// Keeps the first time given for each name and ignores cancels.
    struct StuckAlarms(MemoryAlarms);

    impl AlarmScheduler for StuckAlarms {
        fn schedule(&mut self, name: AlarmName, at_ms: u64) -> Result<()> {
            if self.0.get(name)?.is_none() {
                self.0.schedule(name, at_ms)?;
            }
            Ok(())
        }

        fn cancel(&mut self, _name: AlarmName) -> Result<()> {
            Ok(())
        }

        fn cancel_all(&mut self) -> Result<()> {
            Ok(())
        }

        fn get(&self, name: AlarmName) -> Result<Option<Alarm>> {
            self.0.get(name)
        }

        fn pending(&self) -> Result<Vec<Alarm>> {
            self.0.pending()
        }
    }

    #[test]
    fn catch_up_is_bounded_when_alarms_never_clear() {
        let clock = ManualClock::on_day(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(), 9);
        let mut bg = Background::new(
            MemoryStore::new(),
            StuckAlarms(MemoryAlarms::new()),
            RecordingPresenter::new(),
            clock,
            Settings::default(),
        );
        bg.on_install().unwrap();
        bg.dispatch(Command::MainAction).unwrap();
        bg.clock().advance(Duration::minutes(2));

        assert_eq!(bg.fire_due_alarms().unwrap(), MAX_CATCH_UP);
        assert_eq!(bg.presenter().badge.text, "43'");
    }

    #[test]
    fn badge_refresh_alarm_rearms_itself() {
        let mut bg = installed();
        bg.dispatch(Command::MainAction).unwrap();
        bg.clock().advance(Duration::minutes(1));
        assert_eq!(bg.fire_due_alarms().unwrap(), 1);
        assert_eq!(bg.presenter().badge.text, "44'");
        assert_eq!(
            bg.alarms().scheduled_at(AlarmName::BadgeRefresh),
            Some(bg.clock().now_ms() + 60_000)
        );
    }

    #[test]
    fn catch_up_fires_overdue_work_end() {
        let mut bg = installed();
        bg.dispatch(Command::MainAction).unwrap();
        bg.clock().advance(Duration::minutes(50));

        // Badge refresh (at +1 min) then the phase timer (at +45 min).
        assert_eq!(bg.fire_due_alarms().unwrap(), 2);
        let record = bg.record().unwrap();
        assert_eq!(record.state, TimerState::Break);
        assert_eq!(record.sp_count, 1);
        assert_eq!(
            bg.presenter().notifications.last().map(|n| n.kind),
            Some(NotificationKind::WorkEnd)
        );
    }

    #[test]
    fn disabled_notifications_are_not_shown() {
        let mut bg = installed();
        bg.settings.notifications = false;
        bg.dispatch(Command::MainAction).unwrap();
        bg.dispatch(Command::SkipCycle).unwrap();
        assert_eq!(bg.record().unwrap().sp_count, 1);
        assert!(bg.presenter().notifications.is_empty());
    }

    #[test]
    fn raw_json_messages_are_decoded() {
        let mut bg = installed();
        assert!(bg.handle_raw(r#"{"command":"main_action"}"#).is_ok());
        assert!(!bg.handle_raw("not json").is_ok());
        assert_eq!(bg.record().unwrap().state, TimerState::Work);
    }
}
