// Copyright (c) 2026 Conditional Vault Contributors. MIT License.
// See LICENSE for details.

//! # Conditional Vault Program
//!
//! Escrowed deposits against a yes/no condition decided by one trusted
//! settlement authority:
//!
//! - **Vault Registry**: one vault per (authority, underlying asset), with
//!   a vault-owned escrow and a vault-minted conditional asset.
//! - **Deposit Slips**: per-depositor running totals, the refund claim.
//! - **Minter**: underlying in, conditional tokens out, 1:1.
//! - **Settlement**: one-shot `Active -> Finalized | Reverted`.
//! - **Redemption**: conditional tokens pay out if finalized; deposit
//!   slips pay out if reverted. Never both.
//!
//! [`ConditionalVaultProgram`] is the entry point. It runs each
//! instruction as one store transaction, emits `tracing` events, and
//! keeps Prometheus counters in [`ProgramMetrics`].
//!
//! ## Invariant
//!
//! While a vault is active, and absent redemptions:
//!
//! ```text
//! escrow balance == sum of deposit slips == conditional supply
//! ```

pub mod deposit_slip;
pub mod error;
pub mod metrics;
pub mod minter;
pub mod program;
pub mod redemption;
pub mod settlement;
pub mod vault_registry;

pub use deposit_slip::DepositSlip;
pub use error::{ErrorClass, VaultError, VaultResult};
pub use metrics::ProgramMetrics;
pub use minter::MintConditionalTokens;
pub use program::{ConditionalVaultProgram, ProgramConfig};
pub use redemption::{RedeemConditionalTokens, RedeemDepositSlip};
pub use settlement::SettlementOutcome;
pub use vault_registry::{Vault, VaultStatus};
