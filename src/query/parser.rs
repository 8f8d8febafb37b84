use super::error::QueryParseError;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\S+)\s+(\S+)\s+(\S.*?)\s*$").expect("valid query line regex"));

/// Stored record fields a query can address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Application,
    Host,
    Type,
    Source,
    Message,
    Detail,
    User,
    Status,
    Method,
    Path,
    Url,
    Time,
}

/// How a property's values are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    String,
    DateTime,
}

impl FromStr for Property {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "application" | "app" => Ok(Property::Application),
            "host" => Ok(Property::Host),
            "type" => Ok(Property::Type),
            "source" => Ok(Property::Source),
            "message" | "msg" => Ok(Property::Message),
            "detail" => Ok(Property::Detail),
            "user" => Ok(Property::User),
            "status" | "statuscode" => Ok(Property::Status),
            "method" => Ok(Property::Method),
            "path" => Ok(Property::Path),
            "url" => Ok(Property::Url),
            "time" => Ok(Property::Time),
            _ => Err(QueryParseError::UnknownProperty(s.to_string())),
        }
    }
}

impl Property {
    /// Get the canonical name of this property
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Property::Application => "application",
            Property::Host => "host",
            Property::Type => "type",
            Property::Source => "source",
            Property::Message => "message",
            Property::Detail => "detail",
            Property::User => "user",
            Property::Status => "status",
            Property::Method => "method",
            Property::Path => "path",
            Property::Url => "url",
            Property::Time => "time",
        }
    }

    pub fn property_type(&self) -> PropertyType {
        match self {
            Property::Time => PropertyType::DateTime,
            _ => PropertyType::String,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Equals,
    NotEquals,
    Contains,
    NotContains,
}

impl FromStr for Condition {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Condition::Equals),
            "!=" => Ok(Condition::NotEquals),
            "~" => Ok(Condition::Contains),
            "!~" => Ok(Condition::NotContains),
            _ => Err(QueryParseError::UnknownCondition(s.to_string())),
        }
    }
}

impl Condition {
    pub fn symbol(&self) -> &'static str {
        match self {
            Condition::Equals => "=",
            Condition::NotEquals => "!=",
            Condition::Contains => "~",
            Condition::NotContains => "!~",
        }
    }

    pub fn is_negated(&self) -> bool {
        matches!(self, Condition::NotEquals | Condition::NotContains)
    }
}

/// A date-time literal, parsed once when the filter is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOperand {
    /// `yyyy-MM-dd`, matches the whole calendar day
    Date(NaiveDate),
    /// `yyyy-MM-dd HH:mm:ss`, matches the whole second
    DateTime(NaiveDateTime),
}

impl DateOperand {
    fn parse(value: &str) -> Result<Self, QueryParseError> {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
            return Ok(DateOperand::DateTime(dt));
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(DateOperand::Date)
            .map_err(|_| QueryParseError::InvalidDateTime(value.to_string()))
    }
}

/// A single parsed query filter (e.g. `message ~ timeout`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    pub(super) property: Property,
    pub(super) condition: Condition,
    pub(super) value: String,
    pub(super) date: Option<DateOperand>,
}

impl QueryFilter {
    /// Builds a filter, validating the literal against the property's type
    pub fn new(
        property: Property,
        condition: Condition,
        value: impl Into<String>,
    ) -> Result<Self, QueryParseError> {
        let value = value.into();
        let date = match property.property_type() {
            PropertyType::String => None,
            PropertyType::DateTime => {
                if !matches!(condition, Condition::Equals | Condition::NotEquals) {
                    return Err(QueryParseError::UnsupportedCondition {
                        property: property.canonical_name().to_string(),
                        condition: condition.symbol().to_string(),
                    });
                }
                Some(DateOperand::parse(&value)?)
            }
        };

        Ok(QueryFilter {
            property,
            condition,
            value,
            date,
        })
    }

    /// Parse a single `<property> <condition> <value>` line.
    ///
    /// Fields are separated by runs of whitespace; the value is the rest of
    /// the line and may itself contain whitespace.
    pub fn parse(line: &str) -> Result<Self, QueryParseError> {
        let caps = LINE_RE
            .captures(line)
            .ok_or_else(|| QueryParseError::Malformed(line.trim().to_string()))?;

        let property: Property = caps[1].parse()?;
        let condition: Condition = caps[2].parse()?;
        QueryFilter::new(property, condition, &caps[3])
    }

    pub fn property(&self) -> Property {
        self.property
    }

    pub fn property_type(&self) -> PropertyType {
        self.property.property_type()
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl FromStr for QueryFilter {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryFilter::parse(s)
    }
}

impl fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.property, self.condition.symbol(), self.value)
    }
}
