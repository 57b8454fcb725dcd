//! Processed-set stores: the record of deposits already admitted.
//!
//! A store is injected into the [`Verifier`](crate::Verifier) so that tests and multiple
//! verifier instances each get an isolated set. Both implementations guard the
//! check-and-insert with a single lock, so exactly one caller wins the insertion of a key.

use std::{
    collections::HashSet,
    fmt,
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use thiserror::Error;
use tracing::{info, warn};
use zkbridge_types::DepositId;

/// Errors from a processed-set store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or appending the log failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A log entry other than the last one could not be parsed.
    #[error("corrupt entry at {path:?} line {line}: {source}")]
    Corrupt {
        /// Log file.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Parse failure.
        source: serde_json::Error,
    },
    /// A previous holder of the store lock panicked.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Set of admitted deposit identifiers.
///
/// The set only grows. `insert` returns whether this call performed the insertion, which is
/// `false` when the id was already present.
pub trait ProcessedSet: fmt::Debug + Send + Sync {
    /// Returns `true` if `id` has been admitted.
    fn contains(&self, id: &DepositId) -> Result<bool, StoreError>;

    /// Records `id` as admitted; returns `false` if it already was.
    fn insert(&self, id: &DepositId) -> Result<bool, StoreError>;

    /// Number of admitted deposits.
    fn len(&self) -> Result<usize, StoreError>;

    /// Returns `true` if nothing has been admitted.
    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex.lock().map_err(|_| StoreError::Poisoned)
}

/// In-memory processed set, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryProcessedSet {
    ids: Mutex<HashSet<DepositId>>,
}

impl MemoryProcessedSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessedSet for MemoryProcessedSet {
    fn contains(&self, id: &DepositId) -> Result<bool, StoreError> {
        Ok(lock(&self.ids)?.contains(id))
    }

    fn insert(&self, id: &DepositId) -> Result<bool, StoreError> {
        Ok(lock(&self.ids)?.insert(id.clone()))
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(lock(&self.ids)?.len())
    }
}

/// Processed set persisted as an append-only log.
///
/// Each line holds one JSON-encoded deposit id. The log is replayed on open; a torn final
/// line left by a crash mid-append is cut off. An id is durable before `insert` reports it.
pub struct FileProcessedSet {
    path: PathBuf,
    inner: Mutex<FileInner>,
}

struct FileInner {
    ids: HashSet<DepositId>,
    log: File,
}

impl FileProcessedSet {
    /// Opens (or creates) the log at `path` and replays it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let Replay {
            ids,
            truncate_to,
            missing_newline,
        } = replay(&path)?;
        let mut log = OpenOptions::new().create(true).append(true).open(&path)?;
        if let Some(len) = truncate_to {
            log.set_len(len)?;
        } else if missing_newline {
            log.write_all(b"\n")?;
        }

        info!(path = %path.display(), processed = ids.len(), "Opened processed-set log");

        Ok(Self {
            path,
            inner: Mutex::new(FileInner { ids, log }),
        })
    }

    /// Returns the log path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

struct Replay {
    ids: HashSet<DepositId>,
    /// Byte length to cut a torn final entry back to.
    truncate_to: Option<u64>,
    /// The last entry parsed but was not newline-terminated.
    missing_newline: bool,
}

fn replay(path: &Path) -> Result<Replay, StoreError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let mut ids = HashSet::new();
    let mut offset = 0;
    let mut entries = contents.split_inclusive('\n').enumerate().peekable();
    while let Some((idx, entry)) = entries.next() {
        let line = entry.trim_end_matches('\n');
        if !line.trim().is_empty() {
            match serde_json::from_str::<DepositId>(line) {
                Ok(id) => {
                    ids.insert(id);
                }
                Err(e) if entries.peek().is_none() => {
                    warn!(path = %path.display(), error = %e, "Dropping torn final log entry");
                    return Ok(Replay {
                        ids,
                        truncate_to: Some(offset as u64),
                        missing_newline: false,
                    });
                }
                Err(source) => {
                    return Err(StoreError::Corrupt {
                        path: path.to_path_buf(),
                        line: idx + 1,
                        source,
                    });
                }
            }
        }
        offset += entry.len();
    }

    Ok(Replay {
        ids,
        truncate_to: None,
        missing_newline: !contents.is_empty() && !contents.ends_with('\n'),
    })
}

/// Append-only sink behind [`FileProcessedSet`].
trait AppendLog: Write {
    /// Current length in bytes.
    fn byte_len(&self) -> io::Result<u64>;
    /// Flushes appended data to durable storage.
    fn sync(&mut self) -> io::Result<()>;
    /// Cuts the log back to `len` bytes.
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl AppendLog for File {
    fn byte_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Appends and syncs `entry`. On failure the log is cut back to its previous length so a
/// partial entry never ends up in front of a later one.
fn append_entry(log: &mut impl AppendLog, entry: &[u8]) -> io::Result<()> {
    let len = log.byte_len()?;
    if let Err(e) = log.write_all(entry).and_then(|()| log.sync()) {
        if let Err(rollback) = log.truncate(len).and_then(|()| log.sync()) {
            warn!(error = %rollback, "Failed to roll back partial log entry");
        }
        return Err(e);
    }
    Ok(())
}

impl fmt::Debug for FileProcessedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileProcessedSet")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl ProcessedSet for FileProcessedSet {
    fn contains(&self, id: &DepositId) -> Result<bool, StoreError> {
        Ok(lock(&self.inner)?.ids.contains(id))
    }

    fn insert(&self, id: &DepositId) -> Result<bool, StoreError> {
        let mut inner = lock(&self.inner)?;
        if inner.ids.contains(id) {
            return Ok(false);
        }

        let mut entry = serde_json::to_vec(id).map_err(io::Error::other)?;
        entry.push(b'\n');
        append_entry(&mut inner.log, &entry)?;

        inner.ids.insert(id.clone());
        Ok(true)
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(lock(&self.inner)?.ids.len())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs::OpenOptions,
        io::{self, Write},
        sync::{Arc, Barrier},
        thread,
    };

    use tempfile::tempdir;
    use zkbridge_types::DepositId;

    use crate::store::{
        AppendLog, FileProcessedSet, MemoryProcessedSet, ProcessedSet, StoreError, append_entry,
    };

    /// In-memory log that accepts `budget` more bytes before failing.
    struct FlakyLog {
        bytes: Vec<u8>,
        budget: Option<usize>,
        fail_sync: bool,
    }

    impl io::Write for FlakyLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = match self.budget {
                Some(0) => return Err(io::Error::other("disk full")),
                Some(budget) => budget.min(buf.len()),
                None => buf.len(),
            };
            self.bytes.extend_from_slice(&buf[..n]);
            if let Some(budget) = &mut self.budget {
                *budget -= n;
            }
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl AppendLog for FlakyLog {
        fn byte_len(&self) -> io::Result<u64> {
            Ok(self.bytes.len() as u64)
        }

        fn sync(&mut self) -> io::Result<()> {
            if self.fail_sync {
                return Err(io::Error::other("sync failed"));
            }
            Ok(())
        }

        fn truncate(&mut self, len: u64) -> io::Result<()> {
            self.bytes.truncate(len as usize);
            Ok(())
        }
    }

    #[test]
    fn test_memory_insert_reports_first_writer_only() {
        let set = MemoryProcessedSet::new();
        let id = DepositId::from("d1");

        assert!(!set.contains(&id).unwrap());
        assert!(set.insert(&id).unwrap());
        assert!(!set.insert(&id).unwrap());
        assert!(set.contains(&id).unwrap());
        assert_eq!(set.len().unwrap(), 1);
    }

    #[test]
    fn test_concurrent_inserts_of_same_key_have_one_winner() {
        const THREADS: usize = 16;
        let set = Arc::new(MemoryProcessedSet::new());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let set = set.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    set.insert(&DepositId::from("race")).unwrap()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|inserted| *inserted)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(set.len().unwrap(), 1);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("processed.log");

        {
            let set = FileProcessedSet::open(&path).unwrap();
            assert!(set.is_empty().unwrap());
            assert!(set.insert(&DepositId::from("d1")).unwrap());
            assert!(set.insert(&DepositId::from("line\nbreak")).unwrap());
            assert!(!set.insert(&DepositId::from("d1")).unwrap());
        }

        let reopened = FileProcessedSet::open(&path).unwrap();
        assert_eq!(reopened.len().unwrap(), 2);
        assert!(reopened.contains(&DepositId::from("d1")).unwrap());
        assert!(reopened.contains(&DepositId::from("line\nbreak")).unwrap());
        assert!(!reopened.insert(&DepositId::from("d1")).unwrap());
        assert!(reopened.insert(&DepositId::from("d2")).unwrap());
    }

    #[test]
    fn test_file_store_skips_torn_tail_but_rejects_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed.log");
        std::fs::write(&path, "\"d1\"\n\"d2").unwrap();

        let set = FileProcessedSet::open(&path).unwrap();
        assert!(set.contains(&DepositId::from("d1")).unwrap());
        assert!(!set.contains(&DepositId::from("d2")).unwrap());
        assert!(set.insert(&DepositId::from("d2")).unwrap());
        drop(set);

        let reopened = FileProcessedSet::open(&path).unwrap();
        assert!(reopened.contains(&DepositId::from("d2")).unwrap());
        drop(reopened);

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"garbage\n\"d3\"\n").unwrap();
        assert!(matches!(
            FileProcessedSet::open(&path),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_failed_append_leaves_no_partial_entry() {
        let mut log = FlakyLog {
            bytes: b"\"d1\"\n".to_vec(),
            budget: Some(3),
            fail_sync: false,
        };
        assert!(append_entry(&mut log, b"\"d5\"\n").is_err());
        assert_eq!(log.bytes, b"\"d1\"\n");

        log.budget = None;
        log.fail_sync = true;
        assert!(append_entry(&mut log, b"\"d5\"\n").is_err());
        assert_eq!(log.bytes, b"\"d1\"\n");

        log.fail_sync = false;
        append_entry(&mut log, b"\"d6\"\n").unwrap();
        assert_eq!(log.bytes, b"\"d1\"\n\"d6\"\n");

        // What is left on disk replays cleanly.
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed.log");
        std::fs::write(&path, &log.bytes).unwrap();
        let set = FileProcessedSet::open(&path).unwrap();
        assert!(set.contains(&DepositId::from("d1")).unwrap());
        assert!(!set.contains(&DepositId::from("d5")).unwrap());
        assert!(set.contains(&DepositId::from("d6")).unwrap());
    }

    #[test]
    fn test_file_log_appends_and_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed.log");
        std::fs::write(&path, "\"d1\"\n").unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        append_entry(&mut file, b"\"d2\"\n").unwrap();
        assert_eq!(file.byte_len().unwrap(), 10);

        file.truncate(5).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "\"d1\"\n");
    }
}
