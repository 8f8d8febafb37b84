use super::{Notifier, NotifyError};
use crate::capture::StoredRecord;
use tracing::error;

/// Reports each recorded error as a `tracing` event
#[derive(Debug, Clone)]
pub struct LogNotifier {
    name: String,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::named("log")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn notify(&self, record: &StoredRecord) -> Result<(), NotifyError> {
        let e = &record.error;
        error!(
            channel = %self.name,
            id = %record.id,
            application = %e.application,
            host = %e.host,
            status = e.effective_status_code(),
            error_type = %e.type_name(),
            "{}",
            e.message()
        );
        Ok(())
    }
}
