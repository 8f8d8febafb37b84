//! Error filters and the filter pipeline
//!
//! A [`Filter`] binds an assertion to a set of notification channels. When
//! the assertion holds, the filter either dismisses the error entirely (no
//! channels configured) or only suppresses the listed channels.
//!
//! Filters come from code or from a rule document:
//!
//! ```text
//! {
//!   type: [ { name: "Retryable", kind: "interface" } ],
//!   filter: [
//!     { name: "not-found", test: { equal: { binding: "HttpStatusCode", value: 404 } } },
//!     { channel: ["email"], test: { "is-type-compatible": { binding: "BaseException", type: "Retryable" } } },
//!   ],
//! }
//! ```

pub mod pipeline;
pub mod rules;

pub use pipeline::{FilterPipeline, Verdict};
pub use rules::{load_rules, parse_rules};

use crate::assertion::{Assertion, AssertionContext, EvaluationFault};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Case-insensitive set of notification channel names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelSet(BTreeSet<String>);

impl ChannelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a channel; blank names are ignored. Returns true if it was new.
    pub fn insert(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.0.insert(name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(&name.trim().to_lowercase())
    }

    pub fn union_with(&mut self, other: &ChannelSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Normalised (lower-cased) names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = ChannelSet::new();
        for name in iter {
            set.insert(name.as_ref());
        }
        set
    }
}

impl fmt::Display for ChannelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "{}", names.join(", "))
    }
}

impl Serialize for ChannelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// What a single filter decided for one captured error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome<'f> {
    NoMatch,
    DismissEntirely,
    DismissChannels(&'f ChannelSet),
}

/// An assertion bound to the channels it suppresses
#[derive(Debug, Clone)]
pub struct Filter {
    name: Option<String>,
    assertion: Assertion,
    channels: ChannelSet,
}

impl Filter {
    /// A filter that dismisses matching errors entirely
    pub fn new(assertion: Assertion) -> Self {
        Self {
            name: None,
            assertion,
            channels: ChannelSet::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restricts the dismissal to the given channels
    pub fn with_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for channel in channels {
            self.channels.insert(channel.as_ref());
        }
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn assertion(&self) -> &Assertion {
        &self.assertion
    }

    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    /// True when a match dismisses the error rather than some channels
    pub fn dismisses_entirely(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn evaluate(&self, ctx: &AssertionContext<'_>) -> Result<FilterOutcome<'_>, EvaluationFault> {
        if !self.assertion.test(ctx)? {
            return Ok(FilterOutcome::NoMatch);
        }
        if self.channels.is_empty() {
            Ok(FilterOutcome::DismissEntirely)
        } else {
            Ok(FilterOutcome::DismissChannels(&self.channels))
        }
    }
}
