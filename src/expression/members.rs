use super::value::{Value, ValueKind};
use crate::assertion::AssertionContext;
use std::collections::BTreeMap;

/// Owner of a member lookup: the evaluation root or a value of some kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Root,
    Value(ValueKind),
}

impl Owner {
    pub fn name(&self) -> &'static str {
        match self {
            Owner::Root => "context",
            Owner::Value(kind) => kind.name(),
        }
    }
}

/// Every property a path segment can bind to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    // root
    Exception,
    BaseException,
    HttpStatusCode,
    Time,
    Host,
    Application,
    Context,
    FilterSource,
    // exception
    TypeName,
    Message,
    Source,
    StackTrace,
    Detail,
    ExceptionStatusCode,
    Data,
    InnerException,
    ExceptionBase,
    // http context
    Request,
    User,
    // request
    Method,
    Path,
    Url,
    ClientAddress,
    Headers,
    Query,
    Form,
    Cookies,
    ServerVariables,
}

impl Member {
    /// Finds the member called `name` on `owner`, ignoring ASCII case
    pub fn resolve(owner: Owner, name: &str) -> Option<Member> {
        let name = name.to_ascii_lowercase();
        let member = match (owner, name.as_str()) {
            (Owner::Root, "exception") => Member::Exception,
            (Owner::Root, "baseexception") => Member::BaseException,
            (Owner::Root, "httpstatuscode" | "statuscode") => Member::HttpStatusCode,
            (Owner::Root, "time" | "timestamp") => Member::Time,
            (Owner::Root, "host") => Member::Host,
            (Owner::Root, "application") => Member::Application,
            (Owner::Root, "context") => Member::Context,
            (Owner::Root, "filtersource") => Member::FilterSource,

            (Owner::Value(ValueKind::Exception), "type" | "typename") => Member::TypeName,
            (Owner::Value(ValueKind::Exception), "message") => Member::Message,
            (Owner::Value(ValueKind::Exception), "source") => Member::Source,
            (Owner::Value(ValueKind::Exception), "stacktrace") => Member::StackTrace,
            (Owner::Value(ValueKind::Exception), "detail") => Member::Detail,
            (Owner::Value(ValueKind::Exception), "httpstatuscode" | "statuscode") => {
                Member::ExceptionStatusCode
            }
            (Owner::Value(ValueKind::Exception), "data") => Member::Data,
            (Owner::Value(ValueKind::Exception), "innerexception" | "inner") => {
                Member::InnerException
            }
            (Owner::Value(ValueKind::Exception), "baseexception") => Member::ExceptionBase,

            (Owner::Value(ValueKind::Http), "request") => Member::Request,
            (Owner::Value(ValueKind::Http), "user") => Member::User,

            (Owner::Value(ValueKind::Request), "method" | "httpmethod") => Member::Method,
            (Owner::Value(ValueKind::Request), "path") => Member::Path,
            (Owner::Value(ValueKind::Request), "url" | "rawurl") => Member::Url,
            (Owner::Value(ValueKind::Request), "userhostaddress" | "clientaddress") => {
                Member::ClientAddress
            }
            (Owner::Value(ValueKind::Request), "headers") => Member::Headers,
            (Owner::Value(ValueKind::Request), "querystring" | "query") => Member::Query,
            (Owner::Value(ValueKind::Request), "form") => Member::Form,
            (Owner::Value(ValueKind::Request), "cookies") => Member::Cookies,
            (Owner::Value(ValueKind::Request), "servervariables") => Member::ServerVariables,
            _ => return None,
        };
        Some(member)
    }

    /// Static kind of the member's value
    pub fn yields(&self) -> ValueKind {
        match self {
            Member::Exception
            | Member::BaseException
            | Member::InnerException
            | Member::ExceptionBase => ValueKind::Exception,
            Member::HttpStatusCode | Member::ExceptionStatusCode => ValueKind::Int,
            Member::Time => ValueKind::DateTime,
            Member::Context => ValueKind::Http,
            Member::Request => ValueKind::Request,
            Member::Data
            | Member::Headers
            | Member::Query
            | Member::Form
            | Member::Cookies
            | Member::ServerVariables => ValueKind::Map,
            Member::Host
            | Member::Application
            | Member::FilterSource
            | Member::TypeName
            | Member::Message
            | Member::Source
            | Member::StackTrace
            | Member::Detail
            | Member::User
            | Member::Method
            | Member::Path
            | Member::Url
            | Member::ClientAddress => ValueKind::String,
        }
    }

    /// Reads the member from `target` (root members read from `ctx` instead)
    pub fn read<'a>(&self, ctx: &AssertionContext<'a>, target: &Value<'a>) -> Value<'a> {
        let error = ctx.error();
        match (self, target) {
            (Member::Exception, _) => Value::Exception(&error.exception),
            (Member::BaseException, _) => Value::Exception(error.base_exception()),
            (Member::HttpStatusCode, _) => Value::Int(i64::from(error.effective_status_code())),
            (Member::Time, _) => Value::DateTime(error.timestamp.naive_utc()),
            (Member::Host, _) => Value::str(&error.host),
            (Member::Application, _) => Value::str(&error.application),
            (Member::Context, _) => error.request.as_ref().map(Value::Http).unwrap_or(Value::Null),
            (Member::FilterSource, _) => Value::opt_str(ctx.filter_source()),

            (Member::TypeName, &Value::Exception(e)) => Value::str(&e.type_name),
            (Member::Message, &Value::Exception(e)) => Value::str(&e.message),
            (Member::Source, &Value::Exception(e)) => Value::str(&e.source),
            (Member::StackTrace, &Value::Exception(e)) => Value::str(&e.stack_trace),
            (Member::Detail, &Value::Exception(e)) => Value::Str(e.detail().into()),
            (Member::ExceptionStatusCode, &Value::Exception(e)) => e
                .http_status
                .map(|s| Value::Int(i64::from(s)))
                .unwrap_or(Value::Null),
            (Member::Data, &Value::Exception(e)) => Value::Map(&e.data),
            (Member::InnerException, &Value::Exception(e)) => {
                e.inner.as_deref().map(Value::Exception).unwrap_or(Value::Null)
            }
            (Member::ExceptionBase, &Value::Exception(e)) => Value::Exception(e.base()),

            (Member::Request, &Value::Http(r)) => Value::Request(r),
            (Member::User, &Value::Http(r)) => Value::opt_str(r.user.as_deref()),

            (Member::Method, &Value::Request(r)) => Value::str(&r.method),
            (Member::Path, &Value::Request(r)) => Value::str(&r.path),
            (Member::Url, &Value::Request(r)) => Value::str(&r.url),
            (Member::ClientAddress, &Value::Request(r)) => {
                Value::opt_str(r.client_address.as_deref())
            }
            (Member::Headers, &Value::Request(r)) => Value::Map(&r.headers),
            (Member::Query, &Value::Request(r)) => Value::Map(&r.query),
            (Member::Form, &Value::Request(r)) => Value::Map(&r.form),
            (Member::Cookies, &Value::Request(r)) => Value::Map(&r.cookies),
            (Member::ServerVariables, &Value::Request(r)) => Value::Map(&r.server_variables),

            _ => Value::Null,
        }
    }
}

/// Looks up `key` in a string map, exact match first, then ignoring ASCII case
pub fn index_map<'a>(map: &'a BTreeMap<String, String>, key: &str) -> Value<'a> {
    map.get(key)
        .or_else(|| {
            map.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
        .map(|v| Value::str(v.as_str()))
        .unwrap_or(Value::Null)
}
