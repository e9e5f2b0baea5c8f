//! # Identity Module
//!
//! Participants are Ed25519 keypairs; records are addressed by 32-byte
//! [`Address`]es that are either a participant's public key or a
//! program-derived value. Authorization anywhere in the vault reduces to
//! "does the caller's keypair map to the address stored in this field".

pub mod address;

pub use crate::crypto::keys::{Keypair, PublicKey};
pub use address::{Address, AddressError};
