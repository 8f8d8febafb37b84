use super::{ErrorStore, Page, StoreError, paginate};
use crate::capture::{CapturedError, RecordId, StoredRecord};
use crate::query::FilterCollection;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Append-only JSON-lines store, one stored record per line
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    next_sequence: Mutex<u64>,
}

impl FileStore {
    /// Open (or create) a store file; sequence numbers continue after the
    /// highest one already present
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| io_error(&path, source))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|source| io_error(&path, source))?;
        terminate_last_line(&mut file).map_err(|source| io_error(&path, source))?;

        let next_sequence = read_records(&path)?
            .iter()
            .map(|r| r.sequence + 1)
            .max()
            .unwrap_or(0);
        debug!(path = %path.display(), next_sequence, "opened file store");

        Ok(Self {
            path,
            next_sequence: Mutex::new(next_sequence),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, u64>, StoreError> {
        self.next_sequence.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Ends a torn last line so the next append starts on a line of its own.
/// Returns the file length afterwards.
fn terminate_last_line(file: &mut File) -> io::Result<u64> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(0);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    if last[0] == b'\n' {
        return Ok(len);
    }

    warn!(len, "terminating torn last line of store file");
    file.write_all(b"\n")?;
    Ok(len + 1)
}

fn read_records(path: &Path) -> Result<Vec<StoredRecord>, StoreError> {
    let file = File::open(path).map_err(|source| io_error(path, source))?;
    let mut records = Vec::new();

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| io_error(path, source))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<StoredRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(
                path = %path.display(),
                line = index + 1,
                error = %e,
                "skipping undecodable record"
            ),
        }
    }

    Ok(records)
}

impl ErrorStore for FileStore {
    fn append(&self, error: &CapturedError) -> Result<StoredRecord, StoreError> {
        let mut next_sequence = self.lock()?;
        let record = StoredRecord {
            id: RecordId::new(),
            sequence: *next_sequence,
            error: error.clone(),
        };

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| io_error(&self.path, source))?;
        let len = terminate_last_line(&mut file).map_err(|source| io_error(&self.path, source))?;

        if let Err(source) = file.write_all(line.as_bytes()) {
            // drop whatever part of the record made it to disk
            if let Err(e) = file.set_len(len) {
                warn!(path = %self.path.display(), error = %e, "failed to roll back partial append");
            }
            return Err(io_error(&self.path, source));
        }

        *next_sequence += 1;
        Ok(record)
    }

    fn get_by_id(&self, id: &RecordId) -> Result<Option<StoredRecord>, StoreError> {
        let _guard = self.lock()?;
        Ok(read_records(&self.path)?.into_iter().find(|r| r.id == *id))
    }

    fn get_page(
        &self,
        query: &FilterCollection,
        offset: usize,
        page_size: usize,
    ) -> Result<Page, StoreError> {
        let records = {
            let _guard = self.lock()?;
            read_records(&self.path)?
        };
        Ok(paginate(&records, query, offset, page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ExceptionInfo;
    use tempfile::TempDir;

    fn error(message: &str) -> CapturedError {
        CapturedError::new(ExceptionInfo::new("IoException", message)).with_host("web-01")
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("errors.jsonl");

        let first = {
            let store = FileStore::open(&path).unwrap();
            store.append(&error("disk full")).unwrap()
        };

        let store = FileStore::open(&path).unwrap();
        let fetched = store.get_by_id(&first.id).unwrap().unwrap();
        assert_eq!(fetched.error.message(), "disk full");

        let second = store.append(&error("disk still full")).unwrap();
        assert_eq!(second.sequence, first.sequence + 1);
    }

    #[test]
    fn test_undecodable_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("errors.jsonl");
        let store = FileStore::open(&path).unwrap();
        store.append(&error("a")).unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();
        store.append(&error("b")).unwrap();

        let page = store.get_page(&FilterCollection::new(), 0, 10).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.records[0].error.message(), "b");
    }

    #[test]
    fn test_append_after_torn_line_is_readable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("errors.jsonl");
        FileStore::open(&path).unwrap().append(&error("first")).unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        write!(file, "{{\"id\":\"trunc").unwrap();
        drop(file);

        let store = FileStore::open(&path).unwrap();
        let second = store.append(&error("second")).unwrap();
        assert_eq!(store.get_by_id(&second.id).unwrap().unwrap().error.message(), "second");

        // a torn line written while the store is open is repaired before the next append
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        write!(file, "{{\"id\":").unwrap();
        drop(file);
        let third = store.append(&error("third")).unwrap();
        assert!(store.get_by_id(&third.id).unwrap().is_some());

        let page = store.get_page(&FilterCollection::new(), 0, 10).unwrap();
        assert_eq!(page.total, 3);
        assert!(fs::read_to_string(&path).unwrap().ends_with('\n'));
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/store/errors.jsonl");
        let store = FileStore::open(&path).unwrap();
        assert!(store.path().exists());
    }
}
