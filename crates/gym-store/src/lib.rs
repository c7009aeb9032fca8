//! # gym-store
//!
//! Persistence layer for gymkeep.
//!
//! This crate provides:
//! - `Snapshot` (the complete durable state: accounts + class sessions)
//! - JSONL read/write with atomic file replacement
//! - `SnapshotStore`, whose `transact` runs `load → mutate → save` as one
//!   lock-scoped critical section
//!
//! Facilities and zones are not stored; they are rebuilt from the kernel's
//! built-in catalog on every load, with zone occupancy derived from the
//! members currently checked in.
//!
//! ## Data model
//!
//! ```text
//! JSONL (on disk: header, one line per account, one line per class)
//!     ↕  load / save (under <path>.lock)
//! Snapshot (in-memory, rebuilt per operation)
//!     ↕  hydrate / store_facility
//! Facility (catalog zones + classes + derived occupancy)
//! ```

pub mod atomic_store;
pub mod jsonl;
pub mod snapshot;

pub use atomic_store::{
    DEFAULT_LOCK_ATTEMPTS, DEFAULT_LOCK_RETRY_DELAY, DEFAULT_LOCK_STALE_AFTER, LockPolicy,
    SnapshotStore, StoreError, TransactionError, snapshot_lock_path,
};
pub use jsonl::{
    JsonlError, SNAPSHOT_SCHEMA, read_snapshot, read_snapshot_from_path, write_snapshot,
    write_snapshot_to_path,
};
pub use snapshot::{Snapshot, SnapshotError};
