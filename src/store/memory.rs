use super::{ErrorStore, Page, StoreError, paginate};
use crate::capture::{CapturedError, RecordId, StoredRecord};
use crate::query::FilterCollection;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::trace;

#[derive(Debug, Default)]
struct Arena {
    records: BTreeMap<u64, StoredRecord>,
    by_id: HashMap<RecordId, u64>,
    next_sequence: u64,
}

/// In-process store, optionally bounded to the most recent `capacity` records
#[derive(Debug, Default)]
pub struct MemoryStore {
    arena: Mutex<Arena>,
    capacity: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that evicts its oldest records once `capacity` is exceeded
    pub fn bounded(capacity: usize) -> Self {
        Self {
            arena: Mutex::default(),
            capacity: Some(capacity),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        self.lock().map(|a| a.records.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        self.len().map(|len| len == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Arena>, StoreError> {
        self.arena.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl ErrorStore for MemoryStore {
    fn append(&self, error: &CapturedError) -> Result<StoredRecord, StoreError> {
        if self.capacity == Some(0) {
            return Err(StoreError::Rejected("memory store has zero capacity".to_string()));
        }

        let mut arena = self.lock()?;
        let sequence = arena.next_sequence;
        arena.next_sequence += 1;

        let record = StoredRecord {
            id: RecordId::new(),
            sequence,
            error: error.clone(),
        };
        arena.by_id.insert(record.id, sequence);
        arena.records.insert(sequence, record.clone());

        if let Some(capacity) = self.capacity {
            while arena.records.len() > capacity {
                let Some((_, evicted)) = arena.records.pop_first() else {
                    break;
                };
                arena.by_id.remove(&evicted.id);
                trace!(id = %evicted.id, "evicted oldest record");
            }
        }

        Ok(record)
    }

    fn get_by_id(&self, id: &RecordId) -> Result<Option<StoredRecord>, StoreError> {
        let arena = self.lock()?;
        Ok(arena
            .by_id
            .get(id)
            .and_then(|seq| arena.records.get(seq))
            .cloned())
    }

    fn get_page(
        &self,
        query: &FilterCollection,
        offset: usize,
        page_size: usize,
    ) -> Result<Page, StoreError> {
        let arena = self.lock()?;
        Ok(paginate(arena.records.values(), query, offset, page_size))
    }
}
