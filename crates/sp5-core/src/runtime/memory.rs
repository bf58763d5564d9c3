//! In-process implementations of the runtime traits, for tests and for
//! embedding the timer without a database.

use std::collections::BTreeMap;

use super::traits::{AlarmScheduler, Presenter, RecordStore};
use crate::alarm::{Alarm, AlarmName};
use crate::badge::Badge;
use crate::error::{CoreError, DatabaseError, Result};
use crate::timer::{Notification, TimerRecord};

#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Option<TimerRecord>,
    /// When set, every `save` fails as a locked database would.
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: TimerRecord) -> Self {
        Self {
            record: Some(record),
            fail_writes: false,
        }
    }

    pub fn record(&self) -> Option<&TimerRecord> {
        self.record.as_ref()
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Result<Option<TimerRecord>> {
        Ok(self.record.clone())
    }

    fn save(&mut self, record: &TimerRecord) -> Result<()> {
        if self.fail_writes {
            return Err(CoreError::Database(DatabaseError::Locked));
        }
        self.record = Some(record.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryAlarms {
    alarms: BTreeMap<AlarmName, u64>,
}

impl MemoryAlarms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled_at(&self, name: AlarmName) -> Option<u64> {
        self.alarms.get(&name).copied()
    }
}

impl AlarmScheduler for MemoryAlarms {
    fn schedule(&mut self, name: AlarmName, at_ms: u64) -> Result<()> {
        self.alarms.insert(name, at_ms);
        Ok(())
    }

    fn cancel(&mut self, name: AlarmName) -> Result<()> {
        self.alarms.remove(&name);
        Ok(())
    }

    fn cancel_all(&mut self) -> Result<()> {
        self.alarms.clear();
        Ok(())
    }

    fn get(&self, name: AlarmName) -> Result<Option<Alarm>> {
        Ok(self.scheduled_at(name).map(|scheduled_at_ms| Alarm {
            name,
            scheduled_at_ms,
        }))
    }

    fn pending(&self) -> Result<Vec<Alarm>> {
        let mut alarms: Vec<Alarm> = self
            .alarms
            .iter()
            .map(|(&name, &scheduled_at_ms)| Alarm {
                name,
                scheduled_at_ms,
            })
            .collect();
        alarms.sort_by_key(|a| (a.scheduled_at_ms, a.name));
        Ok(alarms)
    }
}

/// Keeps everything it is asked to show.
#[derive(Debug)]
pub struct RecordingPresenter {
    pub notifications: Vec<Notification>,
    pub badge: Badge,
    pub badge_updates: usize,
}

impl Default for RecordingPresenter {
    fn default() -> Self {
        Self {
            notifications: Vec::new(),
            badge: Badge::empty(),
            badge_updates: 0,
        }
    }
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Presenter for RecordingPresenter {
    fn notify(&mut self, notification: &Notification) -> Result<()> {
        self.notifications.push(notification.clone());
        Ok(())
    }

    fn set_badge(&mut self, badge: &Badge) -> Result<()> {
        self.badge = badge.clone();
        self.badge_updates += 1;
        Ok(())
    }
}
