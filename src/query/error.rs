use thiserror::Error;

/// Errors that can occur when parsing a query filter line
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryParseError {
    #[error("Expected '<property> <condition> <value>', got: '{0}'")]
    Malformed(String),

    #[error(
        "Unknown property: '{0}'. Valid properties are: application, host, type, source, message, detail, user, status, method, path, url, time"
    )]
    UnknownProperty(String),

    #[error("Unknown condition: '{0}'. Valid conditions are: =, !=, ~, !~")]
    UnknownCondition(String),

    #[error("Invalid date '{0}'. Expected yyyy-MM-dd or yyyy-MM-dd HH:mm:ss")]
    InvalidDateTime(String),

    #[error("Condition '{condition}' is not supported for date property '{property}'")]
    UnsupportedCondition { property: String, condition: String },
}
