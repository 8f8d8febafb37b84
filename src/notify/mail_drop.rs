use super::{Notifier, NotifyError};
use crate::capture::StoredRecord;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes one RFC 822 style message per record into a pickup directory,
/// for a mail transfer agent to deliver
#[derive(Debug, Clone)]
pub struct MailDropNotifier {
    name: String,
    directory: PathBuf,
    from: String,
    to: String,
    subject_prefix: String,
}

impl MailDropNotifier {
    pub fn new(
        directory: impl Into<PathBuf>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            name: "email".to_string(),
            directory: directory.into(),
            from: from.into(),
            to: to.into(),
            subject_prefix: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_subject_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.subject_prefix = prefix.into();
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Render the message for a record without writing it
    pub fn render(&self, record: &StoredRecord) -> String {
        let e = &record.error;
        let first_line = e.message().lines().next().unwrap_or("");

        let mut out = String::new();
        let _ = writeln!(out, "From: {}", self.from);
        let _ = writeln!(out, "To: {}", self.to);
        let _ = writeln!(
            out,
            "Subject: {}Error ({}): {}",
            self.subject_prefix,
            e.type_name(),
            first_line
        );
        let _ = writeln!(out, "Date: {}", e.timestamp.to_rfc2822());
        let _ = writeln!(out, "X-Fault-Id: {}", record.id);
        let _ = writeln!(out, "Content-Type: text/plain; charset=utf-8");
        out.push('\n');

        let _ = writeln!(out, "Application: {}", e.application);
        let _ = writeln!(out, "Host: {}", e.host);
        let _ = writeln!(out, "Time: {}", e.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
        let _ = writeln!(out, "Status: {}", e.effective_status_code());
        if let Some(request) = &e.request {
            let _ = writeln!(out, "Request: {} {}", request.method, request.url);
        }
        if !e.user().is_empty() {
            let _ = writeln!(out, "User: {}", e.user());
        }
        out.push('\n');
        out.push_str(&e.detail());
        out.push('\n');
        out
    }
}

impl Notifier for MailDropNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn notify(&self, record: &StoredRecord) -> Result<(), NotifyError> {
        let path = self.directory.join(format!("{}.eml", record.id));
        let io_error = |source: std::io::Error| NotifyError::Io {
            path: path.display().to_string(),
            source,
        };

        fs::create_dir_all(&self.directory).map_err(io_error)?;
        fs::write(&path, self.render(record)).map_err(io_error)?;
        debug!(path = %path.display(), "dropped notification message");
        Ok(())
    }
}
