//! Notification channels invoked for every recorded error
//!
//! The router only knows a notifier by its [`Notifier::name`]; rule documents
//! suppress channels by that name, compared case-insensitively.

pub mod log;
pub mod mail_drop;

pub use log::LogNotifier;
pub use mail_drop::MailDropNotifier;

use crate::capture::StoredRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to write notification to '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Failed(String),
}

pub trait Notifier: Send + Sync {
    /// Channel name used to match suppressed channels
    fn name(&self) -> &str;

    fn notify(&self, record: &StoredRecord) -> Result<(), NotifyError>;
}
