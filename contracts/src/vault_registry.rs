//! # Vault Registry
//!
//! Creates vaults and owns their identity. A vault binds one settlement
//! authority to one underlying asset; its address is derived from exactly
//! that pair, so there is at most one vault per pair and no directory is
//! needed to find it.
//!
//! Initialization creates three records in one transaction:
//!
//! | record            | address                                         |
//! |-------------------|-------------------------------------------------|
//! | vault             | `derive([VAULT_SEED, authority, underlying])`   |
//! | escrow account    | `derive([ESCROW_SEED, vault, underlying])`      |
//! | conditional asset | `derive([CONDITIONAL_ASSET_SEED, vault])`       |
//!
//! The escrow account is owned by the vault address and the conditional
//! asset's mint authority is the vault address. No key exists for either,
//! so only this program can move escrowed funds or issue claim tokens.

use cvault_protocol::asset::AssetCapability;
use cvault_protocol::config::{CONDITIONAL_ASSET_SEED, ESCROW_SEED, VAULT_SEED};
use cvault_protocol::identity::Address;
use cvault_protocol::storage::{Record, Txn};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::VaultResult;

/// Lifecycle status of a vault. Leaves `Active` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultStatus {
    /// Accepting deposits; nothing is redeemable.
    Active,
    /// Conditional tokens redeem 1:1 for underlying.
    Finalized,
    /// Deposit slips redeem for the amount deposited.
    Reverted,
}

impl fmt::Display for VaultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultStatus::Active => write!(f, "Active"),
            VaultStatus::Finalized => write!(f, "Finalized"),
            VaultStatus::Reverted => write!(f, "Reverted"),
        }
    }
}

/// A conditional vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    /// The only identity that may settle this vault.
    pub settlement_authority: Address,
    /// Asset class accepted as deposits.
    pub underlying_asset: Address,
    /// Claim-token asset class minted 1:1 against deposits.
    pub conditional_asset: Address,
    /// Vault-owned account holding every deposit.
    pub underlying_escrow_account: Address,
    pub status: VaultStatus,
}

impl Record for Vault {
    const KIND: &'static str = "conditional_vault";
}

impl Vault {
    pub fn is_active(&self) -> bool {
        self.status == VaultStatus::Active
    }
}

/// Address of the vault for `(settlement_authority, underlying_asset)`.
pub fn vault_address(
    program_id: &Address,
    settlement_authority: &Address,
    underlying_asset: &Address,
) -> Address {
    Address::derive(
        program_id,
        &[VAULT_SEED, settlement_authority.as_ref(), underlying_asset.as_ref()],
    )
}

/// Address of a vault's underlying escrow account.
pub fn escrow_address(program_id: &Address, vault: &Address, underlying_asset: &Address) -> Address {
    Address::derive(
        program_id,
        &[ESCROW_SEED, vault.as_ref(), underlying_asset.as_ref()],
    )
}

/// Address of a vault's conditional asset class.
pub fn conditional_asset_address(program_id: &Address, vault: &Address) -> Address {
    Address::derive(program_id, &[CONDITIONAL_ASSET_SEED, vault.as_ref()])
}

/// Create a vault, its escrow account, and its conditional asset.
///
/// The conditional asset inherits the underlying asset's decimals.
///
/// # Errors
///
/// - `Store(AccountAlreadyInitialized)` if the vault (or either derived
///   account) already exists.
/// - `Store(AccountNotFound)` if `underlying_asset` is not a registered
///   asset class.
pub fn initialize_vault<A: AssetCapability + ?Sized>(
    program_id: &Address,
    txn: &mut Txn<'_>,
    assets: &A,
    settlement_authority: &Address,
    underlying_asset: &Address,
) -> VaultResult<Address> {
    let vault_id = vault_address(program_id, settlement_authority, underlying_asset);
    let escrow = escrow_address(program_id, &vault_id, underlying_asset);
    let conditional_asset = conditional_asset_address(program_id, &vault_id);

    let underlying = assets.asset_class(txn, underlying_asset)?;

    let vault = Vault {
        settlement_authority: *settlement_authority,
        underlying_asset: *underlying_asset,
        conditional_asset,
        underlying_escrow_account: escrow,
        status: VaultStatus::Active,
    };
    txn.create(&vault_id, &vault)?;

    assets.create_asset(txn, &conditional_asset, &vault_id, underlying.decimals)?;
    assets.open_account(txn, &escrow, underlying_asset, &vault_id)?;

    Ok(vault_id)
}

/// Fetch a vault record.
pub fn load_vault(txn: &Txn<'_>, vault_id: &Address) -> VaultResult<Vault> {
    Ok(txn.fetch(vault_id)?)
}
