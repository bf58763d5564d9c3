mod background;
pub mod memory;
mod traits;

pub use background::{Background, Settings, Snapshot};
pub use traits::{AlarmScheduler, Presenter, RecordStore};
