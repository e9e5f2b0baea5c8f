//! # Cryptographic Primitives
//!
//! Thin wrappers over audited implementations:
//!
//! - **Ed25519** (`ed25519-dalek`) for participant identities.
//! - **BLAKE3** for address derivation.
//!
//! Nothing in here rolls its own crypto.

pub mod hash;
pub mod keys;

pub use hash::{blake3_hash, derive_key_hash};
pub use keys::{KeyError, Keypair, PublicKey};
