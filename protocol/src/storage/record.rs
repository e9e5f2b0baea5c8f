//! Typed records and their on-disk envelope.
//!
//! The store itself is untyped: it maps [`Address`](crate::identity::Address)
//! to an [`Envelope`]. The envelope's `kind` tag is checked on every typed
//! read, so handing a deposit-slip address to code that expects a vault
//! fails with [`StoreError::KindMismatch`] instead of decoding garbage.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::StoreError;

/// A value that can be persisted in a [`RecordStore`](super::RecordStore).
pub trait Record: Serialize + DeserializeOwned {
    /// Stable tag written into the envelope. Never rename a kind that has
    /// been persisted.
    const KIND: &'static str;
}

/// Serialized record plus its kind tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: String,
    pub data: Vec<u8>,
}

impl Envelope {
    /// Encode a typed record.
    pub fn seal<R: Record>(record: &R) -> Result<Self, StoreError> {
        let data =
            bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self {
            kind: R::KIND.to_string(),
            data,
        })
    }

    /// Decode into `R`, rejecting envelopes of a different kind.
    pub fn open<R: Record>(&self) -> Result<R, StoreError> {
        if self.kind != R::KIND {
            return Err(StoreError::KindMismatch {
                expected: R::KIND,
                found: self.kind.clone(),
            });
        }
        bincode::deserialize(&self.data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
