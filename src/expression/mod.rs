//! Property-path expressions over a captured error
//!
//! A path is a dotted chain of member names, each optionally followed by one
//! or more indexers:
//!
//! ```text
//! HttpStatusCode
//! BaseException.Message
//! Context.Request.Headers['User-Agent']
//! Exception.InnerException.Data[code]
//! ```
//!
//! Paths are resolved once, at rule-load time, against a fixed member table.
//! Evaluation only walks the resolved steps.

mod members;
mod value;

pub use members::{Member, Owner};
pub use value::{Value, ValueKind};

use crate::assertion::{AssertionContext, ConfigurationError, EvaluationFault};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Member(Member),
    Index(String),
}

/// A compiled property path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    source: String,
    steps: Vec<Step>,
    kind: ValueKind,
}

impl Expression {
    /// Parses and resolves a property path
    pub fn compile(path: &str) -> Result<Self, ConfigurationError> {
        let source = path.trim().to_string();
        let segments = parse_path(&source)?;

        let mut owner = Owner::Root;
        let mut steps = Vec::new();
        for segment in segments {
            let member = Member::resolve(owner, segment.name).ok_or_else(|| {
                ConfigurationError::UnknownMember {
                    path: source.clone(),
                    owner: owner.name().to_string(),
                    member: segment.name.to_string(),
                }
            })?;
            steps.push(Step::Member(member));
            let mut kind = member.yields();

            for key in segment.indexes {
                if kind != ValueKind::Map {
                    return Err(ConfigurationError::NotIndexable {
                        path: source.clone(),
                        owner: kind.name().to_string(),
                    });
                }
                steps.push(Step::Index(key));
                kind = ValueKind::String;
            }
            owner = Owner::Value(kind);
        }

        let Owner::Value(kind) = owner else {
            return Err(ConfigurationError::InvalidPath {
                path: source,
                reason: "path is empty".to_string(),
            });
        };

        Ok(Expression {
            source,
            steps,
            kind,
        })
    }

    /// Static kind of the value this path yields
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate<'a>(&self, ctx: &AssertionContext<'a>) -> Result<Value<'a>, EvaluationFault> {
        let mut current = Value::Null;
        for (position, step) in self.steps.iter().enumerate() {
            if position > 0 && current.is_null() {
                return Err(EvaluationFault::NullReference {
                    path: self.source.clone(),
                    position,
                });
            }
            current = match step {
                Step::Member(member) => member.read(ctx, &current),
                Step::Index(key) => match current {
                    Value::Map(map) => members::index_map(map, key),
                    _ => Value::Null,
                },
            };
        }
        Ok(current)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[derive(Debug)]
struct Segment<'p> {
    name: &'p str,
    indexes: Vec<String>,
}

fn parse_path(path: &str) -> Result<Vec<Segment<'_>>, ConfigurationError> {
    let invalid = |reason: &str| ConfigurationError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.is_empty() {
        return Err(invalid("path is empty"));
    }

    let mut segments = Vec::new();
    let mut rest = path;
    loop {
        let name_end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        if name.is_empty() {
            return Err(invalid("expected a member name"));
        }
        rest = &rest[name_end..];

        let mut indexes = Vec::new();
        while let Some(after_open) = rest.strip_prefix('[') {
            let close = after_open
                .find(']')
                .ok_or_else(|| invalid("unterminated indexer"))?;
            let key = unquote(after_open[..close].trim());
            if key.is_empty() {
                return Err(invalid("empty indexer"));
            }
            indexes.push(key.to_string());
            rest = &after_open[close + 1..];
        }

        segments.push(Segment { name, indexes });

        if rest.is_empty() {
            return Ok(segments);
        }
        rest = rest
            .strip_prefix('.')
            .ok_or_else(|| invalid("expected '.' or '[' after member name"))?;
    }
}

fn unquote(key: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = key
            .strip_prefix(quote)
            .and_then(|k| k.strip_suffix(quote))
        {
            return inner;
        }
    }
    key
}
