//! Collaborator traits defined in `flasky-core` and implemented by other crates.

pub mod clock;
pub mod notification;

pub use clock::{Clock, ManualClock, SystemClock};
pub use notification::{Notification, NotificationSink};
