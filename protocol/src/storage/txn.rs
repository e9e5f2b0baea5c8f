//! Write-staging overlay for a single atomic call.
//!
//! A [`Txn`] reads through to the committed state and buffers every write.
//! Nothing reaches the backing store until the closure passed to
//! [`RecordStore::transact`](super::RecordStore::transact) returns `Ok`;
//! an `Err` drops the overlay and the store is exactly as it was.
//!
//! Reads observe the transaction's own staged writes, so a record created
//! earlier in the same call can be fetched, and a destroyed record reads
//! as absent.

use std::collections::BTreeMap;

use super::record::{Envelope, Record};
use super::{StoreError, StoreResult};
use crate::identity::Address;

/// Read access to committed state.
pub trait RecordView {
    fn read(&self, key: &Address) -> StoreResult<Option<Envelope>>;
}

/// Staged writes: `Some` is an upsert, `None` a deletion.
pub type WriteSet = BTreeMap<Address, Option<Envelope>>;

/// A read-through, write-buffering view over a [`RecordView`].
pub struct Txn<'a> {
    view: &'a dyn RecordView,
    writes: WriteSet,
}

impl<'a> Txn<'a> {
    pub fn new(view: &'a dyn RecordView) -> Self {
        Self {
            view,
            writes: BTreeMap::new(),
        }
    }

    fn envelope(&self, key: &Address) -> StoreResult<Option<Envelope>> {
        match self.writes.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => self.view.read(key),
        }
    }

    /// Whether any record (of any kind) lives at `key`.
    pub fn exists(&self, key: &Address) -> StoreResult<bool> {
        Ok(self.envelope(key)?.is_some())
    }

    /// Fetch a record, returning `None` when the key is empty.
    pub fn try_fetch<R: Record>(&self, key: &Address) -> StoreResult<Option<R>> {
        self.envelope(key)?.map(|env| env.open::<R>()).transpose()
    }

    /// Fetch a record that must exist.
    pub fn fetch<R: Record>(&self, key: &Address) -> StoreResult<R> {
        self.try_fetch(key)?
            .ok_or(StoreError::AccountNotFound(*key))
    }

    /// Create-if-absent. Fails with [`StoreError::AccountAlreadyInitialized`]
    /// when anything already lives at `key`.
    pub fn create<R: Record>(&mut self, key: &Address, record: &R) -> StoreResult<()> {
        if self.exists(key)? {
            return Err(StoreError::AccountAlreadyInitialized(*key));
        }
        self.writes.insert(*key, Some(Envelope::seal(record)?));
        Ok(())
    }

    /// Overwrite an existing record of the same kind.
    pub fn put<R: Record>(&mut self, key: &Address, record: &R) -> StoreResult<()> {
        let current = self
            .envelope(key)?
            .ok_or(StoreError::AccountNotFound(*key))?;
        if current.kind != R::KIND {
            return Err(StoreError::KindMismatch {
                expected: R::KIND,
                found: current.kind,
            });
        }
        self.writes.insert(*key, Some(Envelope::seal(record)?));
        Ok(())
    }

    /// Read-modify-write. If `f` fails, the record is left untouched.
    pub fn mutate<R, T, E, F>(&mut self, key: &Address, f: F) -> Result<T, E>
    where
        R: Record,
        E: From<StoreError>,
        F: FnOnce(&mut R) -> Result<T, E>,
    {
        let mut record: R = self.fetch(key)?;
        let out = f(&mut record)?;
        self.put(key, &record)?;
        Ok(out)
    }

    /// Remove a record. Fails with [`StoreError::AccountNotFound`] when
    /// nothing lives at `key`.
    pub fn destroy(&mut self, key: &Address) -> StoreResult<()> {
        if !self.exists(key)? {
            return Err(StoreError::AccountNotFound(*key));
        }
        self.writes.insert(*key, None);
        Ok(())
    }

    /// Number of keys touched so far.
    pub fn staged_len(&self) -> usize {
        self.writes.len()
    }

    pub fn into_writes(self) -> WriteSet {
        self.writes
    }
}
