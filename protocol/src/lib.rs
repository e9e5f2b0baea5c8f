// Copyright (c) 2026 Conditional Vault Contributors. MIT License.
// See LICENSE for details.

//! # Conditional Vault: Protocol Primitives
//!
//! The pieces the vault program stands on but does not own:
//!
//! - **config**: Seed prefixes, derivation context, and other constants.
//! - **crypto**: Ed25519 keypairs and BLAKE3 helpers.
//! - **identity**: 32-byte addresses, key-derived or program-derived.
//! - **storage**: Keyed record store with atomic multi-record transactions.
//! - **asset**: The asset capability (balance / transfer / mint / burn).
//! - **logging**: `tracing` subscriber setup for hosts and tests.
//!
//! ## Design Philosophy
//!
//! 1. One call, one transaction. Anything that must change together is
//!    staged in a single [`storage::Txn`] and committed at once.
//! 2. Checks before writes. No primitive stages a write it might have to
//!    take back.
//! 3. `u64` base units with checked arithmetic. Money does not wrap.

pub mod asset;
pub mod config;
pub mod crypto;
pub mod identity;
pub mod logging;
pub mod storage;
