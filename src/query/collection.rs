use super::parser::QueryFilter;
use crate::capture::CapturedError;
use tracing::debug;

/// A conjunction of query filters plus an optional free-text search term
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCollection {
    filters: Vec<QueryFilter>,
    search: Option<String>,
}

impl FilterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one filter per line, dropping lines that do not parse.
    ///
    /// Query text usually comes straight from a user, so a bad line narrows
    /// nothing instead of failing the whole request.
    pub fn parse(text: &str) -> Self {
        let mut collection = Self::new();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            match QueryFilter::parse(line) {
                Ok(filter) => collection.push(filter),
                Err(e) => debug!(line, error = %e, "dropping query line"),
            }
        }
        collection
    }

    /// Same as [`FilterCollection::parse`], over separately supplied lines
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = lines
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self::parse(&text)
    }

    pub fn push(&mut self, filter: QueryFilter) {
        self.filters.push(filter);
    }

    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.push(filter);
        self
    }

    /// Set the free-text search term; a blank term clears it
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self
    }

    pub fn filters(&self) -> &[QueryFilter] {
        &self.filters
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// True when nothing narrows the result set
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.search.is_none()
    }

    pub fn is_match(&self, error: &CapturedError) -> bool {
        self.filters.iter().all(|f| f.is_match(error))
            && self
                .search
                .as_deref()
                .is_none_or(|term| search_matches(error, term))
    }
}

fn search_matches(error: &CapturedError, term: &str) -> bool {
    let needle = term.to_lowercase();
    [
        error.message(),
        error.type_name(),
        error.source(),
        error.user(),
        error.host.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}
