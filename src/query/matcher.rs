use super::parser::{Condition, DateOperand, Property, QueryFilter};
use crate::capture::CapturedError;
use chrono::Timelike;
use std::borrow::Cow;

/// Read the text a string-typed property addresses on a captured error
pub fn property_text(error: &CapturedError, property: Property) -> Cow<'_, str> {
    let request = error.request.as_ref();
    match property {
        Property::Application => Cow::Borrowed(&error.application),
        Property::Host => Cow::Borrowed(&error.host),
        Property::Type => Cow::Borrowed(error.type_name()),
        Property::Source => Cow::Borrowed(error.source()),
        Property::Message => Cow::Borrowed(error.message()),
        Property::Detail => Cow::Owned(error.detail()),
        Property::User => Cow::Borrowed(error.user()),
        Property::Status => Cow::Owned(error.effective_status_code().to_string()),
        Property::Method => Cow::Borrowed(request.map_or("", |r| r.method.as_str())),
        Property::Path => Cow::Borrowed(request.map_or("", |r| r.path.as_str())),
        Property::Url => Cow::Borrowed(request.map_or("", |r| r.url.as_str())),
        Property::Time => Cow::Owned(error.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
    }
}

impl QueryFilter {
    /// Check whether a captured error satisfies this filter
    pub fn is_match(&self, error: &CapturedError) -> bool {
        let positive = match self.date {
            Some(operand) => date_matches(error, operand),
            None => {
                let text = property_text(error, self.property);
                match self.condition {
                    Condition::Equals | Condition::NotEquals => *text == *self.value,
                    Condition::Contains | Condition::NotContains => {
                        text.contains(self.value.as_str())
                    }
                }
            }
        };

        positive != self.condition.is_negated()
    }
}

fn date_matches(error: &CapturedError, operand: DateOperand) -> bool {
    let recorded = error.timestamp.naive_utc();
    match operand {
        DateOperand::Date(day) => recorded.date() == day,
        DateOperand::DateTime(moment) => recorded.with_nanosecond(0) == Some(moment),
    }
}
