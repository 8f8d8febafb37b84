//! Store contract for captured errors
//!
//! Every backend appends records, fetches one by id, and serves filtered
//! pages. Pages are ordered newest first; the query filters and search term
//! are applied before the window, so [`Page::total`] is the post-filter count.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::capture::{CapturedError, RecordId, StoredRecord};
use crate::query::FilterCollection;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store lock was poisoned by a panicking writer")]
    Poisoned,

    #[error("Store I/O failed on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Store rejected the record: {0}")]
    Rejected(String),
}

/// One window of matching records plus the number of records that matched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub records: Vec<StoredRecord>,
    pub total: usize,
}

pub trait ErrorStore: Send + Sync {
    /// Persist a captured error and return the stored record
    fn append(&self, error: &CapturedError) -> Result<StoredRecord, StoreError>;

    fn get_by_id(&self, id: &RecordId) -> Result<Option<StoredRecord>, StoreError>;

    /// Fetch `page_size` records starting at `offset` among those matching `query`
    fn get_page(
        &self,
        query: &FilterCollection,
        offset: usize,
        page_size: usize,
    ) -> Result<Page, StoreError>;
}

/// Filter, order and window a snapshot of records
pub(crate) fn paginate<'a, I>(
    records: I,
    query: &FilterCollection,
    offset: usize,
    page_size: usize,
) -> Page
where
    I: IntoIterator<Item = &'a StoredRecord>,
{
    let mut matching: Vec<&StoredRecord> = records
        .into_iter()
        .filter(|r| query.is_match(&r.error))
        .collect();
    matching.sort_by(|a, b| a.cmp_newest_first(b));

    let total = matching.len();
    let records = matching
        .into_iter()
        .skip(offset)
        .take(page_size)
        .cloned()
        .collect();

    Page { records, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ExceptionInfo;
    use chrono::{TimeZone, Utc};

    fn record(sequence: u64, minute: u32, type_name: &str) -> StoredRecord {
        StoredRecord {
            id: RecordId::new(),
            sequence,
            error: CapturedError::new(ExceptionInfo::new(type_name, "m"))
                .at(Utc.with_ymd_and_hms(2025, 1, 1, 12, minute, 0).unwrap()),
        }
    }

    #[test]
    fn test_paginate_orders_newest_first() {
        let records = vec![record(0, 1, "A"), record(1, 3, "A"), record(2, 2, "A")];
        let page = paginate(&records, &FilterCollection::new(), 0, 10);
        let sequences: Vec<u64> = page.records.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 0]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_paginate_breaks_timestamp_ties_by_sequence() {
        let records = vec![record(0, 1, "A"), record(1, 1, "A")];
        let page = paginate(&records, &FilterCollection::new(), 0, 10);
        assert_eq!(page.records[0].sequence, 1);
    }

    #[test]
    fn test_paginate_total_ignores_window() {
        let records: Vec<StoredRecord> = (0..7)
            .map(|i| record(i, i as u32, if i % 2 == 0 { "Even" } else { "Odd" }))
            .collect();
        let query = FilterCollection::parse("type = Even");
        let page = paginate(&records, &query, 1, 2);
        assert_eq!(page.total, 4);
        assert_eq!(page.records.len(), 2);
        assert!(page.records.iter().all(|r| r.error.type_name() == "Even"));
    }

    #[test]
    fn test_paginate_offset_past_end_is_empty() {
        let records = vec![record(0, 1, "A")];
        let page = paginate(&records, &FilterCollection::new(), 5, 10);
        assert!(page.records.is_empty());
        assert_eq!(page.total, 1);
    }
}
