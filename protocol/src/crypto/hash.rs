//! # Hashing Utilities
//!
//! BLAKE3 is the only hash function the vault needs. It backs two things:
//!
//! - **Address derivation**: vault, slip, escrow, and conditional-asset
//!   addresses are BLAKE3 outputs in derive-key mode (see
//!   [`crate::identity::Address::derive`]).
//! - **Key-to-address mapping**: an Ed25519 public key is already 32
//!   uniformly distributed bytes, so it is used verbatim; BLAKE3 is only
//!   involved where seeds have to be combined.
//!
//! ## Length prefixing
//!
//! [`derive_key_hash`] absorbs every part with a little-endian `u64` length
//! prefix. Without it, `["ab", "c"]` and `["a", "bc"]` would hash to the
//! same address, which for a vault keyed on `(authority, asset)` means two
//! different pairs could land on one record.

/// Compute the BLAKE3 hash of the input data.
///
/// # Example
///
/// ```
/// use cvault_protocol::crypto::blake3_hash;
///
/// let hash = blake3_hash(b"conditional vault");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// BLAKE3 in derive-key mode over a list of length-prefixed parts.
///
/// `context` should be a hardcoded, globally unique string; see
/// [`crate::config::ADDRESS_DERIVATION_CONTEXT`].
pub fn derive_key_hash(context: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}
