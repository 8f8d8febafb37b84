use thiserror::Error;

/// Errors raised while building assertions and loading rule documents.
///
/// These are load-time failures: a rule set that produces one must not be
/// run partially compiled.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Unknown assertion kind '{0}'")]
    UnknownAssertion(String),

    #[error("Invalid property path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid property path '{path}': {owner} has no member '{member}'")]
    UnknownMember {
        path: String,
        owner: String,
        member: String,
    },

    #[error("Invalid property path '{path}': {owner} values cannot be indexed")]
    NotIndexable { path: String, owner: String },

    #[error("Type '{0}' has no ordering and cannot be used in a comparison")]
    NonOrdinalType(String),

    #[error("Unknown literal type '{0}'. Valid types are: bool, int, float, string, datetime")]
    UnknownLiteralType(String),

    #[error("Cannot read '{value}' as {literal_type}")]
    InvalidLiteral { value: String, literal_type: String },

    #[error("Invalid regular expression '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown type kind '{0}'. Valid kinds are: concrete, abstract, interface")]
    UnknownTypeKind(String),

    #[error("No predicate registered under '{0}'")]
    UnknownPredicate(String),

    #[error("Missing required attribute '{0}'")]
    MissingAttribute(String),

    #[error("{0}")]
    Malformed(String),

    #[error("Failed to read rule document '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse rule document '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("{location}: {source}")]
    At {
        location: String,
        #[source]
        source: Box<ConfigurationError>,
    },
}

impl ConfigurationError {
    /// Attaches the location of the offending rule entry, keeping the innermost one
    pub fn at(self, location: &str) -> Self {
        match self {
            located @ ConfigurationError::At { .. } => located,
            other if location.is_empty() => other,
            other => ConfigurationError::At {
                location: location.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Location of the offending entry, if known
    pub fn location(&self) -> Option<&str> {
        match self {
            ConfigurationError::At { location, .. } => Some(location),
            _ => None,
        }
    }
}

/// A failure while evaluating one assertion against one captured error
#[derive(Debug, Clone, Error)]
pub enum EvaluationFault {
    #[error("Null reference in '{path}' at segment {position}")]
    NullReference { path: String, position: usize },

    #[error("Predicate '{name}' failed: {message}")]
    Predicate { name: String, message: String },

    #[error("Assertion panicked: {0}")]
    Panicked(String),
}
