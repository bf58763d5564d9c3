//! The background driver over the on-disk database, as the CLI runs it.

use chrono::{Duration, NaiveDate};
use sp5_core::runtime::memory::RecordingPresenter;
use sp5_core::{
    AlarmName, AlarmScheduler, Background, Command, Database, ManualClock, RecordStore, Settings,
    TimerState,
};

#[test]
fn test_wake_up_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sp5.db");
    let day = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();

    let clock = ManualClock::on_day(day, 9);
    let mut first = Background::new(
        Database::open_at(&path).unwrap(),
        Database::open_at(&path).unwrap(),
        RecordingPresenter::new(),
        clock,
        Settings::default(),
    );
    first.on_install().unwrap();
    first.dispatch(Command::MainAction).unwrap();
    let deadline = first.deadline_ms().unwrap().unwrap();
    drop(first);

    // A later process, after the work session should have ended.
    let clock = ManualClock::on_day(day, 10);
    let mut second = Background::new(
        Database::open_at(&path).unwrap(),
        Database::open_at(&path).unwrap(),
        RecordingPresenter::new(),
        clock,
        Settings::default(),
    );
    assert!(second.alarms().get(AlarmName::PhaseTimer).unwrap().is_some());
    second.fire_due_alarms().unwrap();

    let record = second.store().load().unwrap().unwrap();
    assert_eq!(record.state, TimerState::Break);
    assert_eq!(record.sp_count, 1);
    let next = second.deadline_ms().unwrap().unwrap();
    assert!(next > deadline);
    assert_eq!(second.presenter().notifications.len(), 1);
}

#[test]
fn test_check_date_on_stored_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sp5.db");
    let day = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();

    let mut bg = Background::new(
        Database::open_at(&path).unwrap(),
        Database::open_at(&path).unwrap(),
        RecordingPresenter::new(),
        ManualClock::on_day(day, 22),
        Settings { daily_goal: 3, notifications: true },
    );
    bg.on_install().unwrap();
    bg.dispatch(Command::AddSp).unwrap();
    bg.clock().advance(Duration::hours(3));
    bg.dispatch(Command::CheckDate).unwrap();

    let record = bg.record().unwrap();
    assert_eq!(record.daily_goal, 3);
    assert_eq!(record.sp_count, 0);
    assert_eq!(record.last_reset_date, day.succ_opt().unwrap());
}
