//! # Asset Capability
//!
//! The vault moves value only through this interface. It knows nothing
//! about a particular token standard: anything that can answer balance /
//! owner / asset queries and perform transfer, mint, and burn on
//! asset-holding accounts can sit behind [`AssetCapability`].
//!
//! Every method takes the caller's [`Txn`], so asset movements are staged
//! alongside the program's own record writes and commit (or vanish) with
//! them. A transfer that fails leaves nothing staged.
//!
//! ## Authority
//!
//! `transfer` and `burn` require `authority == account.owner`; `mint`
//! requires `authority == asset.mint_authority`. The capability trusts the
//! `authority` address it is handed. Proving control of that address is
//! the caller's job: the vault program checks a [`Keypair`] for user
//! accounts and passes its own derived address for vault-owned ones.
//!
//! ## Addresses
//!
//! Asset classes and accounts opened on behalf of callers live at
//! addresses derived under [`ledger_root`], never at caller-chosen ones.
//! Their seed prefixes differ from every program seed, so a caller-created
//! record cannot occupy an address a program derives for itself.
//!
//! [`Keypair`]: crate::crypto::Keypair

pub mod ledger;

pub use ledger::TokenLedger;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ASSET_CLASS_SEED, ASSET_LEDGER_NAME, TOKEN_ACCOUNT_SEED};
use crate::identity::Address;
use crate::storage::{Record, StoreError, Txn};

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Derivation root for everything the ledger opens on a caller's behalf.
pub fn ledger_root() -> Address {
    Address::derive(&Address::new([0u8; 32]), &[ASSET_LEDGER_NAME.as_bytes()])
}

/// `derive(ledger_root, [ASSET_CLASS_SEED, mint_authority, name])`
pub fn asset_class_address(mint_authority: &Address, name: &str) -> Address {
    Address::derive(
        &ledger_root(),
        &[ASSET_CLASS_SEED, mint_authority.as_ref(), name.as_bytes()],
    )
}

/// The one account `owner` holds for `asset`.
pub fn token_account_address(owner: &Address, asset: &Address) -> Address {
    Address::derive(
        &ledger_root(),
        &[TOKEN_ACCOUNT_SEED, owner.as_ref(), asset.as_ref()],
    )
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during asset operations.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Attempted to move or burn more than the account holds.
    #[error("insufficient funds in {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: Address,
        balance: u64,
        requested: u64,
    },

    /// The signing authority does not own the account being debited.
    #[error("authority {authority} does not own account {account}")]
    OwnerMismatch { account: Address, authority: Address },

    /// The authority is not the asset's mint authority.
    #[error("authority {authority} cannot mint asset {asset}")]
    MintAuthorityMismatch { asset: Address, authority: Address },

    /// The account holds a different asset than the operation requires.
    #[error("asset mismatch on {account}: expected {expected}, found {found}")]
    AssetMismatch {
        account: Address,
        expected: Address,
        found: Address,
    },

    /// u64 arithmetic would wrap.
    #[error("arithmetic overflow on {0}")]
    Overflow(Address),
}

pub type AssetResult<T> = Result<T, AssetError>;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// An asset class: who can mint it and how much of it exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetClass {
    pub mint_authority: Address,
    /// Display precision only; arithmetic is always in base units.
    pub decimals: u8,
    pub supply: u64,
}

impl Record for AssetClass {
    const KIND: &'static str = "asset_class";
}

/// An account holding a balance of exactly one asset class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAccount {
    pub asset: Address,
    pub owner: Address,
    pub balance: u64,
}

impl Record for AssetAccount {
    const KIND: &'static str = "asset_account";
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// Query and movement primitives over asset-holding accounts.
pub trait AssetCapability: Send + Sync {
    /// Register a new asset class with zero supply.
    fn create_asset(
        &self,
        txn: &mut Txn<'_>,
        asset: &Address,
        mint_authority: &Address,
        decimals: u8,
    ) -> AssetResult<()>;

    /// Open an empty account for `asset`, owned by `owner`.
    fn open_account(
        &self,
        txn: &mut Txn<'_>,
        account: &Address,
        asset: &Address,
        owner: &Address,
    ) -> AssetResult<()>;

    fn asset_class(&self, txn: &Txn<'_>, asset: &Address) -> AssetResult<AssetClass>;

    fn account(&self, txn: &Txn<'_>, account: &Address) -> AssetResult<AssetAccount>;

    fn balance_of(&self, txn: &Txn<'_>, account: &Address) -> AssetResult<u64> {
        Ok(self.account(txn, account)?.balance)
    }

    fn owner_of(&self, txn: &Txn<'_>, account: &Address) -> AssetResult<Address> {
        Ok(self.account(txn, account)?.owner)
    }

    fn asset_of(&self, txn: &Txn<'_>, account: &Address) -> AssetResult<Address> {
        Ok(self.account(txn, account)?.asset)
    }

    fn supply_of(&self, txn: &Txn<'_>, asset: &Address) -> AssetResult<u64> {
        Ok(self.asset_class(txn, asset)?.supply)
    }

    /// Move `amount` between two accounts of the same asset.
    fn transfer(
        &self,
        txn: &mut Txn<'_>,
        from: &Address,
        to: &Address,
        amount: u64,
        authority: &Address,
    ) -> AssetResult<()>;

    /// Create `amount` new units of `asset` in account `to`.
    fn mint(
        &self,
        txn: &mut Txn<'_>,
        asset: &Address,
        to: &Address,
        amount: u64,
        authority: &Address,
    ) -> AssetResult<()>;

    /// Destroy `amount` units held in account `from`.
    fn burn(
        &self,
        txn: &mut Txn<'_>,
        from: &Address,
        amount: u64,
        authority: &Address,
    ) -> AssetResult<()>;
}
