use super::error::ConfigurationError;
use crate::expression::{Expression, Value};
use regex::{Regex, RegexBuilder};
use std::fmt;

/// Matches the textual form of a property against a regular expression
#[derive(Debug, Clone)]
pub struct PatternAssertion {
    expression: Expression,
    regex: Regex,
    case_sensitive: bool,
}

impl PatternAssertion {
    pub fn new(
        expression: Expression,
        pattern: &str,
        case_sensitive: bool,
    ) -> Result<Self, ConfigurationError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|source| ConfigurationError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            expression,
            regex,
            case_sensitive,
        })
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub(super) fn test_result(&self, value: &Value<'_>) -> Option<bool> {
        value.as_text().map(|text| self.regex.is_match(&text))
    }
}

impl fmt::Display for PatternAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = if self.case_sensitive { "" } else { "i" };
        write!(f, "{} =~ /{}/{}", self.expression, self.regex.as_str(), flags)
    }
}
