//! # SledStore: Persistent Record Store
//!
//! Durable [`RecordStore`] built on sled's embedded key-value store.
//!
//! ## Tree Layout
//!
//! | Tree      | Key                | Value              |
//! |-----------|--------------------|--------------------|
//! | `records` | address (32 bytes) | `bincode(Envelope)`|
//!
//! ## Atomicity
//!
//! A transaction's staged writes are applied as a single sled `Batch` to
//! the `records` tree, so either every insert and removal lands or none
//! does. Writers are serialized by an in-process gate held from the first
//! read to the commit, which keeps read-check-write sequences (status
//! guards, balance checks) free of lost updates.
//!
//! The commit point is `apply_batch`. The flush that follows is logged on
//! failure but never turns a committed transaction into an error.

use parking_lot::Mutex;
use sled::{Batch, Db, Tree};
use std::path::Path;
use std::sync::Arc;

use super::record::Envelope;
use super::txn::{RecordView, Txn, WriteSet};
use super::{RecordStore, StoreError, StoreResult};
use crate::config::RECORDS_TREE;
use crate::identity::Address;

/// Persistent record store backed by sled.
///
/// Cheap to clone; clones share the database handle and the writer gate.
#[derive(Debug, Clone)]
pub struct SledStore {
    db: Db,
    records: Tree,
    write_gate: Arc<Mutex<()>>,
}

struct TreeView<'a>(&'a Tree);

impl RecordView for TreeView<'_> {
    fn read(&self, key: &Address) -> StoreResult<Option<Envelope>> {
        match self.0.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(Envelope::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl SledStore {
    /// Open or create a store at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a store that lives in a temporary directory and is removed
    /// when dropped.
    pub fn open_temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let records = db.open_tree(RECORDS_TREE)?;
        Ok(Self {
            db,
            records,
            write_gate: Arc::new(Mutex::new(())),
        })
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn commit(&self, writes: WriteSet) -> StoreResult<()> {
        if writes.is_empty() {
            return Ok(());
        }

        let mut batch = Batch::default();
        for (key, write) in writes {
            match write {
                Some(envelope) => batch.insert(&key.as_bytes()[..], envelope.to_bytes()?),
                None => batch.remove(&key.as_bytes()[..]),
            }
        }

        self.records.apply_batch(batch)?;
        // Applied batches are visible to every later read; a failed flush
        // only delays durability and must not report the commit as failed.
        flush_outcome(self.db.flush());
        Ok(())
    }
}

/// Log a post-commit flush failure. Returns whether the batch reached disk.
fn flush_outcome(result: sled::Result<usize>) -> bool {
    match result {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(error = %err, "flush after commit failed; batch applied but not yet durable");
            false
        }
    }
}

impl RecordStore for SledStore {
    fn read(&self, key: &Address) -> StoreResult<Option<Envelope>> {
        TreeView(&self.records).read(key)
    }

    fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Txn<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _gate = self.write_gate.lock();
        let view = TreeView(&self.records);

        let (out, writes) = {
            let mut txn = Txn::new(&view);
            let out = f(&mut txn)?;
            (out, txn.into_writes())
        };

        self.commit(writes).map_err(E::from)?;
        Ok(out)
    }
}
