//! # Storage Module
//!
//! The keyed record store the vault runs on. Every entry point of the
//! vault program executes as exactly one [`RecordStore::transact`] call:
//! all reads and writes of that call go through a [`Txn`] overlay and are
//! committed together, or not at all.
//!
//! ## Architecture
//!
//! ```text
//! record.rs  Record trait, kind-tagged Envelope, bincode codec
//! txn.rs     Txn overlay: create / fetch / mutate / destroy
//! memory.rs  MemoryStore, RwLock<HashMap> backend
//! db.rs      SledStore, single-tree sled backend with atomic batches
//! ```
//!
//! ## Serialization of conflicting calls
//!
//! Both backends admit one writer at a time. Two calls touching the same
//! record therefore execute one after the other, in whatever order they
//! acquire the writer; the vault never assumes which one wins. That is
//! enough to make status guards ("vault must be Active") race-free: the
//! loser of a race always reads the winner's committed state.

pub mod db;
pub mod memory;
pub mod record;
pub mod txn;

pub use db::SledStore;
pub use memory::MemoryStore;
pub use record::{Envelope, Record};
pub use txn::{RecordView, Txn, WriteSet};

use crate::identity::Address;

/// Errors raised by the record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("account already initialized: {0}")]
    AccountAlreadyInitialized(Address),

    #[error("account not found: {0}")]
    AccountNotFound(Address),

    #[error("record kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A keyed record store with atomic multi-record transactions.
pub trait RecordStore: Send + Sync {
    /// Read the committed envelope at `key`.
    fn read(&self, key: &Address) -> StoreResult<Option<Envelope>>;

    /// Run `f` against a fresh [`Txn`] and commit its writes atomically if
    /// it returns `Ok`. On `Err` nothing is written.
    fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Txn<'_>) -> Result<T, E>,
        E: From<StoreError>;

    /// Create-if-absent as a single atomic call.
    fn create<R: Record>(&self, key: &Address, record: &R) -> StoreResult<()> {
        self.transact(|txn| txn.create(key, record))
    }

    /// Fetch a committed record that must exist.
    fn fetch<R: Record>(&self, key: &Address) -> StoreResult<R> {
        self.try_fetch(key)?
            .ok_or(StoreError::AccountNotFound(*key))
    }

    /// Fetch a committed record, `None` when the key is empty.
    fn try_fetch<R: Record>(&self, key: &Address) -> StoreResult<Option<R>> {
        self.read(key)?.map(|env| env.open::<R>()).transpose()
    }

    /// Atomic read-modify-write of a single record.
    fn mutate<R, T, F>(&self, key: &Address, f: F) -> StoreResult<T>
    where
        R: Record,
        F: FnOnce(&mut R) -> T,
    {
        self.transact(|txn| txn.mutate(key, |record: &mut R| Ok(f(record))))
    }

    /// Remove a record and reclaim its storage.
    fn destroy(&self, key: &Address) -> StoreResult<()> {
        self.transact(|txn| txn.destroy(key))
    }

    fn contains(&self, key: &Address) -> StoreResult<bool> {
        Ok(self.read(key)?.is_some())
    }
}
