//! In-memory record store.
//!
//! A `HashMap` behind a `parking_lot::RwLock`. Reads take the shared lock;
//! a transaction holds the exclusive lock from its first read to its
//! commit, so transactions are fully serialized. Ideal for tests and for
//! embedding the vault in a host that provides its own durability.

use parking_lot::RwLock;
use std::collections::HashMap;

use super::record::Envelope;
use super::txn::{RecordView, Txn};
use super::{RecordStore, StoreError, StoreResult};
use crate::identity::Address;

impl RecordView for HashMap<Address, Envelope> {
    fn read(&self, key: &Address) -> StoreResult<Option<Envelope>> {
        Ok(self.get(key).cloned())
    }
}

/// Volatile [`RecordStore`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Address, Envelope>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn read(&self, key: &Address) -> StoreResult<Option<Envelope>> {
        Ok(self.records.read().get(key).cloned())
    }

    fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Txn<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut records = self.records.write();

        let (out, writes) = {
            let mut txn = Txn::new(&*records);
            let out = f(&mut txn)?;
            (out, txn.into_writes())
        };

        for (key, write) in writes {
            match write {
                Some(envelope) => {
                    records.insert(key, envelope);
                }
                None => {
                    records.remove(&key);
                }
            }
        }

        Ok(out)
    }
}
