use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// One exception in a captured chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExceptionInfo {
    /// Runtime type name (e.g. "TimeoutError", "app.errors.NotFound")
    pub type_name: String,
    /// Base types and implemented interfaces, nearest first
    pub ancestry: Vec<String>,
    pub message: String,
    /// Component or module that raised the exception
    pub source: String,
    pub stack_trace: String,
    /// Status code carried by HTTP-aware exceptions
    pub http_status: Option<u16>,
    pub data: BTreeMap<String, String>,
    /// The exception that caused this one
    pub inner: Option<Box<ExceptionInfo>>,
}

impl ExceptionInfo {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_ancestry<I, S>(mut self, ancestry: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ancestry = ancestry.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = stack_trace.into();
        self
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_inner(mut self, inner: ExceptionInfo) -> Self {
        self.inner = Some(Box::new(inner));
        self
    }

    /// The innermost exception of the chain (the root cause)
    pub fn base(&self) -> &ExceptionInfo {
        let mut current = self;
        while let Some(inner) = current.inner.as_deref() {
            current = inner;
        }
        current
    }

    /// True when this exception's type is `type_name` or derives from it
    pub fn is_compatible_with(&self, type_name: &str) -> bool {
        self.type_name == type_name || self.ancestry.iter().any(|t| t == type_name)
    }

    /// Full textual rendering of the chain, outermost first
    pub fn detail(&self) -> String {
        let mut out = format!("{}: {}", self.type_name, self.message);
        if let Some(inner) = self.inner.as_deref() {
            out.push_str(" ---> ");
            out.push_str(&inner.detail());
            out.push_str("\n   --- End of inner exception stack trace ---");
        }
        if !self.stack_trace.is_empty() {
            out.push('\n');
            out.push_str(&self.stack_trace);
        }
        out
    }
}

/// HTTP request data available when the error was captured
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub url: String,
    pub user: Option<String>,
    pub client_address: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub form: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub server_variables: BTreeMap<String, String>,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            method: method.into(),
            url: path.clone(),
            path,
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_client_address(mut self, address: impl Into<String>) -> Self {
        self.client_address = Some(address.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_server_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.server_variables.insert(name.into(), value.into());
        self
    }
}

/// Snapshot of one handled error, taken at the moment of failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedError {
    pub exception: ExceptionInfo,
    #[serde(default)]
    pub request: Option<RequestContext>,
    /// Response status explicitly reported by the host
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub application: String,
    #[serde(default)]
    pub request_body: Option<String>,
}

impl CapturedError {
    pub fn new(exception: ExceptionInfo) -> Self {
        Self {
            exception,
            request: None,
            status_code: None,
            timestamp: Utc::now(),
            host: String::new(),
            application: String::new(),
            request_body: None,
        }
    }

    pub fn with_request(mut self, request: RequestContext) -> Self {
        self.request = Some(request);
        self
    }

    pub fn with_status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = application.into();
        self
    }

    pub fn with_request_body(mut self, body: impl Into<String>) -> Self {
        self.request_body = Some(body.into());
        self
    }

    pub fn base_exception(&self) -> &ExceptionInfo {
        self.exception.base()
    }

    /// Explicit status, else the status carried by the exception chain, else 0
    pub fn effective_status_code(&self) -> u16 {
        self.status_code
            .or(self.exception.http_status)
            .or(self.base_exception().http_status)
            .unwrap_or(0)
    }

    pub fn type_name(&self) -> &str {
        &self.base_exception().type_name
    }

    pub fn message(&self) -> &str {
        &self.base_exception().message
    }

    pub fn source(&self) -> &str {
        &self.base_exception().source
    }

    pub fn user(&self) -> &str {
        self.request
            .as_ref()
            .and_then(|r| r.user.as_deref())
            .unwrap_or("")
    }

    pub fn detail(&self) -> String {
        self.exception.detail()
    }
}

/// Identifier assigned by a store on append
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// The persisted form of a captured error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    /// Store-local append counter, breaks ties between equal timestamps
    pub sequence: u64,
    pub error: CapturedError,
}

impl StoredRecord {
    /// Ordering used by every page: newest timestamp first, then latest append first
    pub fn cmp_newest_first(&self, other: &StoredRecord) -> Ordering {
        other
            .error
            .timestamp
            .cmp(&self.error.timestamp)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}
