use super::error::ConfigurationError;
use crate::expression::{Expression, Value, ValueKind};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::fmt;

/// Ordering predicate applied to `value.cmp(literal)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    Lesser,
    LesserOrEqual,
    Greater,
    GreaterOrEqual,
}

impl ComparisonOp {
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Equal => ordering == Ordering::Equal,
            ComparisonOp::Lesser => ordering == Ordering::Less,
            ComparisonOp::LesserOrEqual => ordering != Ordering::Greater,
            ComparisonOp::Greater => ordering == Ordering::Greater,
            ComparisonOp::GreaterOrEqual => ordering != Ordering::Less,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::Lesser => "<",
            ComparisonOp::LesserOrEqual => "<=",
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterOrEqual => ">=",
        }
    }
}

/// Primitive types a comparison literal can have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralType {
    Bool,
    Int,
    Float,
    String,
    DateTime,
}

impl LiteralType {
    /// Resolves a declared type name. Types without an ordering are rejected.
    pub fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Ok(LiteralType::Bool),
            "int" | "integer" | "int16" | "int32" | "int64" | "uint16" | "uint32" | "long"
            | "short" | "byte" => Ok(LiteralType::Int),
            "float" | "double" | "single" | "decimal" | "number" => Ok(LiteralType::Float),
            "string" | "str" | "char" => Ok(LiteralType::String),
            "datetime" | "date" | "time" => Ok(LiteralType::DateTime),
            "object" | "exception" | "map" | "empty" | "null" | "dbnull" | "request"
            | "http-context" => Err(ConfigurationError::NonOrdinalType(name.to_string())),
            _ => Err(ConfigurationError::UnknownLiteralType(name.to_string())),
        }
    }

    /// Literal type implied by a property's static kind, if it has an ordering
    pub fn for_kind(kind: ValueKind) -> Option<Self> {
        match kind {
            ValueKind::Bool => Some(LiteralType::Bool),
            ValueKind::Int => Some(LiteralType::Int),
            ValueKind::Float => Some(LiteralType::Float),
            ValueKind::String => Some(LiteralType::String),
            ValueKind::DateTime => Some(LiteralType::DateTime),
            ValueKind::Exception | ValueKind::Map | ValueKind::Http | ValueKind::Request => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LiteralType::Bool => "bool",
            LiteralType::Int => "int",
            LiteralType::Float => "float",
            LiteralType::String => "string",
            LiteralType::DateTime => "datetime",
        }
    }
}

/// A typed comparison operand
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(NaiveDateTime),
}

impl Literal {
    pub fn parse(literal_type: LiteralType, text: &str) -> Result<Self, ConfigurationError> {
        let invalid = || ConfigurationError::InvalidLiteral {
            value: text.to_string(),
            literal_type: literal_type.name().to_string(),
        };
        let literal = match literal_type {
            LiteralType::String => Literal::String(text.to_string()),
            LiteralType::Bool => Literal::Bool(parse_bool(text).ok_or_else(invalid)?),
            LiteralType::Int => Literal::Int(text.trim().parse().map_err(|_| invalid())?),
            LiteralType::Float => Literal::Float(text.trim().parse().map_err(|_| invalid())?),
            LiteralType::DateTime => {
                Literal::DateTime(parse_date_time(text).ok_or_else(invalid)?)
            }
        };
        Ok(literal)
    }

    pub fn literal_type(&self) -> LiteralType {
        match self {
            Literal::Bool(_) => LiteralType::Bool,
            Literal::Int(_) => LiteralType::Int,
            Literal::Float(_) => LiteralType::Float,
            Literal::String(_) => LiteralType::String,
            Literal::DateTime(_) => LiteralType::DateTime,
        }
    }

    /// Converts `value` to this literal's type and orders it against the literal.
    /// `None` when the value cannot be converted or the pair is unordered.
    pub fn compare(&self, value: &Value<'_>) -> Option<Ordering> {
        match self {
            Literal::Bool(expected) => to_bool(value).map(|v| v.cmp(expected)),
            Literal::Int(expected) => to_int(value).map(|v| v.cmp(expected)),
            Literal::Float(expected) => to_float(value).and_then(|v| v.partial_cmp(expected)),
            Literal::String(expected) => match value {
                Value::Str(s) => Some((**s).cmp(expected.as_str())),
                other => other.as_text().map(|t| (*t).cmp(expected.as_str())),
            },
            Literal::DateTime(expected) => to_date_time(value).map(|v| v.cmp(expected)),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Float(x) => write!(f, "{x}"),
            Literal::String(s) => write!(f, "{s:?}"),
            Literal::DateTime(dt) => write!(f, "'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Compares a property against a fixed literal
#[derive(Debug, Clone)]
pub struct ComparisonAssertion {
    expression: Expression,
    op: ComparisonOp,
    literal: Literal,
}

impl ComparisonAssertion {
    pub fn new(expression: Expression, op: ComparisonOp, literal: Literal) -> Self {
        Self {
            expression,
            op,
            literal,
        }
    }

    /// Builds a comparison from a declared literal type name and its text
    pub fn parse(
        expression: Expression,
        op: ComparisonOp,
        type_name: &str,
        value: &str,
    ) -> Result<Self, ConfigurationError> {
        let literal_type = LiteralType::from_name(type_name)?;
        Ok(Self::new(expression, op, Literal::parse(literal_type, value)?))
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn op(&self) -> ComparisonOp {
        self.op
    }

    pub fn literal(&self) -> &Literal {
        &self.literal
    }

    pub(super) fn test_result(&self, value: &Value<'_>) -> Option<bool> {
        self.literal
            .compare(value)
            .map(|ordering| self.op.accepts(ordering))
    }
}

impl fmt::Display for ComparisonAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.expression,
            self.op.symbol(),
            self.literal
        )
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Accepts `yyyy-MM-dd HH:mm:ss`, `yyyy-MM-ddTHH:mm:ss`, `yyyy-MM-dd` and RFC 3339
pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.naive_utc())
}

fn to_bool(value: &Value<'_>) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Str(s) => parse_bool(s),
        _ => None,
    }
}

/// Floats in this range convert to `i64` without saturating
const INT_RANGE: std::ops::Range<f64> = i64::MIN as f64..i64::MAX as f64;

fn to_int(value: &Value<'_>) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Float(f) if f.fract() == 0.0 && INT_RANGE.contains(f) => Some(*f as i64),
        Value::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_float(value: &Value<'_>) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_date_time(value: &Value<'_>) -> Option<NaiveDateTime> {
    match value {
        Value::DateTime(dt) => Some(*dt),
        Value::Str(s) => parse_date_time(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_ordinal_types_are_rejected() {
        for name in ["Object", "exception", "MAP", "DBNull"] {
            assert!(
                matches!(
                    LiteralType::from_name(name),
                    Err(ConfigurationError::NonOrdinalType(_))
                ),
                "{name} should be rejected as non-ordinal"
            );
        }
        assert!(matches!(
            LiteralType::from_name("widget"),
            Err(ConfigurationError::UnknownLiteralType(_))
        ));
    }

    #[test]
    fn test_literal_parse_rejects_bad_text() {
        assert!(Literal::parse(LiteralType::Int, "four-oh-four").is_err());
        assert!(Literal::parse(LiteralType::Bool, "yes").is_err());
        assert!(Literal::parse(LiteralType::DateTime, "yesterday").is_err());
        assert_eq!(
            Literal::parse(LiteralType::Int, " 404 ").unwrap(),
            Literal::Int(404)
        );
    }

    #[test]
    fn test_compare_converts_value_to_literal_type() {
        let literal = Literal::Int(404);
        assert_eq!(literal.compare(&Value::Int(404)), Some(Ordering::Equal));
        assert_eq!(literal.compare(&Value::str("500")), Some(Ordering::Greater));
        assert_eq!(literal.compare(&Value::str("n/a")), None);
        assert_eq!(literal.compare(&Value::Null), None);

        let literal = Literal::String("404".to_string());
        assert_eq!(literal.compare(&Value::Int(404)), Some(Ordering::Equal));
    }

    #[test]
    fn test_out_of_range_floats_do_not_saturate() {
        let literal = Literal::Int(i64::MAX);
        assert_eq!(literal.compare(&Value::Float(1e30)), None);
        assert_eq!(Literal::Int(i64::MIN).compare(&Value::Float(-1e30)), None);
        assert_eq!(Literal::Int(4096).compare(&Value::Float(4096.0)), Some(Ordering::Equal));
    }

    #[test]
    fn test_operators() {
        assert!(ComparisonOp::LesserOrEqual.accepts(Ordering::Equal));
        assert!(ComparisonOp::LesserOrEqual.accepts(Ordering::Less));
        assert!(!ComparisonOp::Lesser.accepts(Ordering::Equal));
        assert!(ComparisonOp::GreaterOrEqual.accepts(Ordering::Greater));
        assert!(!ComparisonOp::Greater.accepts(Ordering::Less));
    }

    #[test]
    fn test_parse_date_time_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(parse_date_time("2025-03-01 10:30:00"), Some(expected));
        assert_eq!(parse_date_time("2025-03-01T10:30:00"), Some(expected));
        assert_eq!(parse_date_time("2025-03-01T10:30:00Z"), Some(expected));
        assert_eq!(
            parse_date_time("2025-03-01"),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(0, 0, 0)
        );
    }
}
