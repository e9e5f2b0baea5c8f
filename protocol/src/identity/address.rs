//! # Addresses
//!
//! Every record in the store (vaults, slips, asset classes, asset
//! accounts) lives at a 32-byte [`Address`]. Addresses come from one of
//! two places:
//!
//! 1. **Keys.** A participant's address is their Ed25519 public key.
//! 2. **Derivation.** Program-owned records live at
//!    `BLAKE3-derive-key(context, program_id || seeds...)`. Nobody holds a
//!    private key for a derived address; only the program can act for it.
//!
//! Derivation is a pure function, which is what makes find-or-create
//! idempotent: the vault for `(authority, asset)` is always at the same
//! address, so creating it twice collides in the store instead of
//! producing a duplicate.
//!
//! ## Text form
//!
//! Addresses render as Bech32 with the `cvault` HRP:
//!
//! ```text
//! cvault1<52 data chars><6 checksum chars>
//! ```

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{ADDRESS_DERIVATION_CONTEXT, ADDRESS_HRP, ADDRESS_LENGTH};
use crate::crypto::hash::derive_key_hash;
use crate::crypto::keys::PublicKey;

/// Errors from parsing a rendered address.
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp { expected: String, got: String },

    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

/// A 32-byte record address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derive a program-owned address from a program id and seeds.
    ///
    /// # Examples
    ///
    /// ```
    /// use cvault_protocol::identity::Address;
    ///
    /// let program = Address::new([1u8; 32]);
    /// let a = Address::derive(&program, &[b"deposit_slip", b"alice"]);
    /// let b = Address::derive(&program, &[b"deposit_slip", b"alice"]);
    /// assert_eq!(a, b);
    /// ```
    pub fn derive(program_id: &Address, seeds: &[&[u8]]) -> Self {
        let mut parts: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 1);
        parts.push(program_id.as_bytes());
        parts.extend_from_slice(seeds);
        Self(derive_key_hash(ADDRESS_DERIVATION_CONTEXT, &parts))
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Bech32 rendering. Same as `Display`.
    pub fn to_bech32(&self) -> String {
        self.to_string()
    }

    fn hrp() -> Hrp {
        Hrp::parse_unchecked(ADDRESS_HRP)
    }
}

impl From<PublicKey> for Address {
    fn from(pk: PublicKey) -> Self {
        Self(*pk.as_bytes())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = bech32::encode::<Bech32>(Self::hrp(), &self.0).map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &hex::encode(self.0)[..16])
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hrp, data) =
            bech32::decode(s).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;

        if hrp != Self::hrp() {
            return Err(AddressError::InvalidHrp {
                expected: ADDRESS_HRP.to_string(),
                got: hrp.to_string(),
            });
        }

        let bytes: [u8; ADDRESS_LENGTH] =
            data.as_slice()
                .try_into()
                .map_err(|_| AddressError::InvalidLength {
                    expected: ADDRESS_LENGTH,
                    got: data.len(),
                })?;
        Ok(Self(bytes))
    }
}
