//! Outbound account email composition and the logging sink.

pub mod log;
pub mod mailer;

pub use log::LogNotificationSink;
pub use mailer::{Mailer, templates};
