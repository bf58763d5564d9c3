use crate::alarm::{Alarm, AlarmName};
use crate::badge::Badge;
use crate::error::Result;
use crate::timer::{Notification, TimerRecord};

/// Durable home of the single timer record.
pub trait RecordStore {
    /// `Ok(None)` until the record has been written once.
    fn load(&self) -> Result<Option<TimerRecord>>;

    /// Overwrite the record in place.
    fn save(&mut self, record: &TimerRecord) -> Result<()>;
}

/// One-shot named wake-ups.
///
/// Scheduling a name that already has a pending wake-up replaces it.
pub trait AlarmScheduler {
    fn schedule(&mut self, name: AlarmName, at_ms: u64) -> Result<()>;

    /// Cancelling a name with nothing pending is not an error.
    fn cancel(&mut self, name: AlarmName) -> Result<()>;

    fn cancel_all(&mut self) -> Result<()>;

    fn get(&self, name: AlarmName) -> Result<Option<Alarm>>;

    /// All pending wake-ups, earliest first.
    fn pending(&self) -> Result<Vec<Alarm>>;
}

/// Where notifications and the badge end up.
pub trait Presenter {
    fn notify(&mut self, notification: &Notification) -> Result<()>;

    fn set_badge(&mut self, badge: &Badge) -> Result<()>;
}
