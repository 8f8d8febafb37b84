use crate::capture::{ExceptionInfo, RequestContext};
use chrono::NaiveDateTime;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Static kind of a value produced by a property path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    String,
    DateTime,
    Exception,
    Map,
    /// The HTTP context view (`Context`)
    Http,
    /// The request view (`Context.Request`)
    Request,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::DateTime => "datetime",
            ValueKind::Exception => "exception",
            ValueKind::Map => "map",
            ValueKind::Http => "http-context",
            ValueKind::Request => "request",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value extracted from a captured error, borrowing from it where possible
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Cow<'a, str>),
    /// Always UTC
    DateTime(NaiveDateTime),
    Exception(&'a ExceptionInfo),
    Map(&'a BTreeMap<String, String>),
    Http(&'a RequestContext),
    Request(&'a RequestContext),
}

impl<'a> Value<'a> {
    pub fn str(s: &'a str) -> Self {
        Value::Str(Cow::Borrowed(s))
    }

    pub fn opt_str(s: Option<&'a str>) -> Self {
        s.map(Value::str).unwrap_or(Value::Null)
    }

    /// Runtime kind, `None` for null
    pub fn kind(&self) -> Option<ValueKind> {
        Some(match self {
            Value::Null => return None,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::String,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Exception(_) => ValueKind::Exception,
            Value::Map(_) => ValueKind::Map,
            Value::Http(_) => ValueKind::Http,
            Value::Request(_) => ValueKind::Request,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Textual form of scalar values; structured values and null have none
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            Value::Int(i) => Some(Cow::Owned(i.to_string())),
            Value::Float(f) => Some(Cow::Owned(f.to_string())),
            Value::Str(s) => Some(Cow::Borrowed(s.as_ref())),
            Value::DateTime(dt) => Some(Cow::Owned(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
            _ => None,
        }
    }
}
