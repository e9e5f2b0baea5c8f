//! Errors returned by the conditional vault program.
//!
//! Every rejection names its precise cause; nothing is collapsed into a
//! generic failure. [`VaultError::class`] groups causes into the coarse
//! [`ErrorClass`] buckets used for logging and the `rejections_total`
//! metric.

use cvault_protocol::asset::AssetError;
use cvault_protocol::identity::Address;
use cvault_protocol::storage::StoreError;
use std::fmt;
use thiserror::Error;

use crate::vault_registry::VaultStatus;

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    // -- Validation ---------------------------------------------------------
    /// A supplied asset account is not owned by the signing authority.
    #[error("constraint violated: account {account} is not owned by {authority}")]
    ConstraintTokenOwner { account: Address, authority: Address },

    /// A supplied asset account holds the wrong asset.
    #[error("constraint violated: account {account} holds {found}, expected {expected}")]
    ConstraintTokenMint {
        account: Address,
        expected: Address,
        found: Address,
    },

    /// A deposit slip is not bound to the expected vault or depositor.
    #[error("constraint violated: deposit slip {slip} is not bound to this vault and authority")]
    ConstraintHasOne { slip: Address },

    /// The escrow account passed in is not the vault's escrow.
    #[error("account {supplied} is not the underlying escrow of vault {vault}")]
    InvalidVaultUnderlyingTokenAccount { vault: Address, supplied: Address },

    /// The conditional asset passed in is not the vault's conditional asset.
    #[error("asset {supplied} is not the conditional asset of vault {vault}")]
    InvalidConditionalTokenMint { vault: Address, supplied: Address },

    // -- State --------------------------------------------------------------
    /// Settlement was attempted on a vault that is no longer active.
    #[error("vault {vault} already settled as {status}")]
    VaultAlreadySettled { vault: Address, status: VaultStatus },

    /// Conditional tokens are only redeemable once the vault is finalized.
    #[error("conditional tokens of vault {vault} are not redeemable while {status}")]
    CantRedeemConditionalTokens { vault: Address, status: VaultStatus },

    /// Deposit slips are only redeemable once the vault is reverted.
    #[error("deposit slips of vault {vault} are not redeemable while {status}")]
    CantRedeemDepositSlip { vault: Address, status: VaultStatus },

    // -- Resource -----------------------------------------------------------
    /// The depositor's underlying account cannot cover the mint.
    #[error("insufficient underlying tokens in {account}: balance {balance}, requested {requested}")]
    InsufficientUnderlyingTokens {
        account: Address,
        balance: u64,
        requested: u64,
    },

    /// A deposit slip total would exceed u64::MAX.
    #[error("amount overflow on {0}")]
    AmountOverflow(Address),

    // -- Authorization ------------------------------------------------------
    /// The caller is not the vault's settlement authority.
    #[error("{caller} is not the settlement authority of vault {vault}")]
    Unauthorized { vault: Address, caller: Address },

    // -- Collaborators ------------------------------------------------------
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("asset error: {0}")]
    Asset(AssetError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

pub type VaultResult<T> = Result<T, VaultError>;

impl From<AssetError> for VaultError {
    /// Store failures surfaced through the asset capability are reported
    /// as storage errors, so a missing account reads the same regardless
    /// of which layer looked it up.
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::Store(inner) => VaultError::Store(inner),
            other => VaultError::Asset(other),
        }
    }
}

/// Coarse grouping of [`VaultError`] causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// A supplied account does not match the vault/slip/asset binding.
    Validation,
    /// The operation is not valid in the vault's current status.
    State,
    /// Insufficient funds or arithmetic limits.
    Resource,
    /// The caller lacks authority over a record or account.
    Authorization,
    /// Missing, duplicate, or undecodable records; backend failures.
    Storage,
}

impl ErrorClass {
    /// Stable lowercase label, used as a metric label value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Validation => "validation",
            ErrorClass::State => "state",
            ErrorClass::Resource => "resource",
            ErrorClass::Authorization => "authorization",
            ErrorClass::Storage => "storage",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl VaultError {
    pub fn class(&self) -> ErrorClass {
        match self {
            VaultError::ConstraintTokenOwner { .. }
            | VaultError::ConstraintTokenMint { .. }
            | VaultError::ConstraintHasOne { .. }
            | VaultError::InvalidVaultUnderlyingTokenAccount { .. }
            | VaultError::InvalidConditionalTokenMint { .. } => ErrorClass::Validation,

            VaultError::VaultAlreadySettled { .. }
            | VaultError::CantRedeemConditionalTokens { .. }
            | VaultError::CantRedeemDepositSlip { .. } => ErrorClass::State,

            VaultError::InsufficientUnderlyingTokens { .. } | VaultError::AmountOverflow(_) => {
                ErrorClass::Resource
            }

            VaultError::Unauthorized { .. } => ErrorClass::Authorization,

            VaultError::Asset(inner) => match inner {
                AssetError::InsufficientFunds { .. } | AssetError::Overflow(_) => {
                    ErrorClass::Resource
                }
                AssetError::OwnerMismatch { .. } | AssetError::MintAuthorityMismatch { .. } => {
                    ErrorClass::Authorization
                }
                AssetError::AssetMismatch { .. } => ErrorClass::Validation,
                AssetError::Store(_) => ErrorClass::Storage,
            },

            VaultError::Store(_) | VaultError::Metrics(_) => ErrorClass::Storage,
        }
    }
}
