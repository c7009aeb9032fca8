//! Lock-scoped transactions over the JSONL snapshot.
//!
//! Every mutating operation runs as `load → mutate → save` inside one
//! critical section guarded by an exclusive `<snapshot>.lock` file. The lock
//! is taken with `create_new`, so it serialises writers across threads and
//! processes alike. Readers never take the lock: saves replace the file
//! atomically, so a reader always sees a complete snapshot.
//!
//! The lock file carries the holder's pid and a `utc=` stamp. A lock older
//! than `LockPolicy::stale_after` belongs to a writer that died mid-way and
//! is reclaimed once.

use chrono::{DateTime, Utc};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::jsonl::{JsonlError, read_snapshot_from_path, write_snapshot_to_path};
use crate::snapshot::Snapshot;

pub const DEFAULT_LOCK_ATTEMPTS: u32 = 400;
pub const DEFAULT_LOCK_RETRY_DELAY: Duration = Duration::from_millis(5);
pub const DEFAULT_LOCK_STALE_AFTER: Duration = Duration::from_secs(30);

pub fn snapshot_lock_path(snapshot_path: &Path) -> PathBuf {
    let mut path: OsString = snapshot_path.as_os_str().to_os_string();
    path.push(".lock");
    PathBuf::from(path)
}

/// Errors from the persistent store. All of them abort the operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Jsonl(#[from] JsonlError),

    #[error("snapshot lock busy: {lock_path}")]
    LockBusy { lock_path: String },

    #[error("failed to acquire snapshot lock {lock_path}: {message}")]
    LockIo { lock_path: String, message: String },
}

/// Failure of a transaction: either the store or the mutation itself.
///
/// A mutation failure aborts the transaction; nothing is written.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError<E> {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Mutation(E),
}

impl<E: From<StoreError>> TransactionError<E> {
    /// Collapse into the mutation error type.
    pub fn flatten(self) -> E {
        match self {
            Self::Store(err) => E::from(err),
            Self::Mutation(err) => err,
        }
    }
}

/// How long to wait for a busy lock, and when a held lock counts as
/// abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    pub attempts: u32,
    pub retry_delay: Duration,
    pub stale_after: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_LOCK_ATTEMPTS,
            retry_delay: DEFAULT_LOCK_RETRY_DELAY,
            stale_after: DEFAULT_LOCK_STALE_AFTER,
        }
    }
}

/// Handle on one snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    lock: LockPolicy,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: LockPolicy::default(),
        }
    }

    pub fn with_lock_policy(mut self, lock: LockPolicy) -> Self {
        self.lock = lock;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current snapshot without locking.
    pub fn load(&self) -> Result<Snapshot, StoreError> {
        let snapshot = read_snapshot_from_path(&self.path)?;
        tracing::debug!(
            path = %self.path.display(),
            revision = snapshot.revision(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Run one serialisable transaction.
    ///
    /// The mutator returns `(value, changed)`:
    /// - `value` is returned to the caller
    /// - `changed=true` persists the snapshot before the lock is released
    ///
    /// A failed save is reported as `TransactionError::Store`; the file on
    /// disk keeps the previous revision.
    pub fn transact<T, E, F>(&self, mutator: F) -> Result<T, TransactionError<E>>
    where
        F: FnOnce(&mut Snapshot) -> Result<(T, bool), E>,
    {
        let _guard = SnapshotLockGuard::acquire(&self.path, self.lock)?;
        let mut snapshot = read_snapshot_from_path(&self.path).map_err(StoreError::from)?;
        let (value, changed) = mutator(&mut snapshot).map_err(TransactionError::Mutation)?;
        if changed {
            self.commit(&mut snapshot)?;
        }
        Ok(value)
    }

    /// Write `snapshot` as the next revision. On failure the in-memory
    /// revision is left where it was.
    fn commit(&self, snapshot: &mut Snapshot) -> Result<(), StoreError> {
        snapshot.bump_revision();
        if let Err(err) = write_snapshot_to_path(&self.path, snapshot) {
            snapshot.rollback_revision();
            tracing::error!(
                path = %self.path.display(),
                revision = snapshot.revision() + 1,
                %err,
                "snapshot save failed"
            );
            return Err(err.into());
        }
        tracing::debug!(
            path = %self.path.display(),
            revision = snapshot.revision(),
            "snapshot saved"
        );
        Ok(())
    }
}

struct SnapshotLockGuard {
    lock_path: PathBuf,
    _file: File,
}

impl SnapshotLockGuard {
    fn acquire(path: &Path, policy: LockPolicy) -> Result<Self, StoreError> {
        let lock_path = snapshot_lock_path(path);
        if let Some(parent) = lock_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| lock_io(&lock_path, e.to_string()))?;
        }

        let attempts = policy.attempts.max(1);
        let mut reclaimed = false;
        for attempt in 1..=attempts {
            if let Some(guard) = Self::try_create(&lock_path)? {
                return Ok(guard);
            }
            if !reclaimed && is_stale(&lock_path, policy.stale_after) {
                reclaimed = true;
                tracing::warn!(
                    lock = %lock_path.display(),
                    holder = %lock_holder(&lock_path),
                    "reclaiming abandoned snapshot lock"
                );
                match fs::remove_file(&lock_path) {
                    Ok(()) => {}
                    Err(err) if err.kind() == ErrorKind::NotFound => {}
                    Err(err) => return Err(lock_io(&lock_path, err.to_string())),
                }
                if let Some(guard) = Self::try_create(&lock_path)? {
                    return Ok(guard);
                }
            }
            if attempt < attempts {
                thread::sleep(policy.retry_delay);
            }
        }

        tracing::warn!(
            lock = %lock_path.display(),
            attempts,
            "snapshot lock still busy, giving up"
        );
        Err(StoreError::LockBusy {
            lock_path: lock_path.display().to_string(),
        })
    }

    /// `Ok(None)` when another holder has the lock.
    fn try_create(lock_path: &Path) -> Result<Option<Self>, StoreError> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(lock_path)
        {
            Ok(mut file) => {
                let _ = writeln!(
                    file,
                    "pid={}\nutc={}",
                    std::process::id(),
                    Utc::now().to_rfc3339()
                );
                Ok(Some(Self {
                    lock_path: lock_path.to_path_buf(),
                    _file: file,
                }))
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(err) => Err(lock_io(lock_path, err.to_string())),
        }
    }
}

impl Drop for SnapshotLockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// When the lock was taken: its `utc=` stamp, else the file's mtime.
fn lock_taken_at(lock_path: &Path) -> Option<DateTime<Utc>> {
    let stamped = fs::read_to_string(lock_path).ok().and_then(|text| {
        text.lines()
            .find_map(|line| line.strip_prefix("utc="))
            .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
    });
    match stamped {
        Some(at) => Some(at.with_timezone(&Utc)),
        None => {
            let modified = fs::metadata(lock_path).ok()?.modified().ok()?;
            Some(DateTime::<Utc>::from(modified))
        }
    }
}

fn is_stale(lock_path: &Path, stale_after: Duration) -> bool {
    lock_taken_at(lock_path)
        .and_then(|at| (Utc::now() - at).to_std().ok())
        .is_some_and(|age| age >= stale_after)
}

fn lock_holder(lock_path: &Path) -> String {
    fs::read_to_string(lock_path)
        .ok()
        .and_then(|text| {
            text.lines()
                .find_map(|line| line.strip_prefix("pid="))
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn lock_io(lock_path: &Path, message: String) -> StoreError {
    StoreError::LockIo {
        lock_path: lock_path.display().to_string(),
        message,
    }
}
