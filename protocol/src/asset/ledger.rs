//! Record-backed fungible token ledger.
//!
//! Asset classes and accounts are ordinary store records, so token state
//! shares the store's atomicity with whatever program is driving it.
//! Supply and per-account balances are kept in lock-step: `mint` raises
//! both, `burn` lowers both, `transfer` leaves supply alone.
//!
//! All checks run before the first staged write. A rejected operation
//! therefore never leaves a half-applied debit in the transaction.

use tracing::trace;

use super::{AssetAccount, AssetCapability, AssetClass, AssetError, AssetResult};
use crate::identity::Address;
use crate::storage::Txn;

/// The default [`AssetCapability`]: balances stored as records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenLedger;

impl TokenLedger {
    pub fn new() -> Self {
        Self
    }
}

impl AssetCapability for TokenLedger {
    fn create_asset(
        &self,
        txn: &mut Txn<'_>,
        asset: &Address,
        mint_authority: &Address,
        decimals: u8,
    ) -> AssetResult<()> {
        let class = AssetClass {
            mint_authority: *mint_authority,
            decimals,
            supply: 0,
        };
        txn.create(asset, &class)?;
        trace!(asset = %asset, decimals, "asset class created");
        Ok(())
    }

    fn open_account(
        &self,
        txn: &mut Txn<'_>,
        account: &Address,
        asset: &Address,
        owner: &Address,
    ) -> AssetResult<()> {
        // The asset must exist before anyone can hold it.
        txn.fetch::<AssetClass>(asset)?;
        let record = AssetAccount {
            asset: *asset,
            owner: *owner,
            balance: 0,
        };
        txn.create(account, &record)?;
        trace!(account = %account, asset = %asset, owner = %owner, "asset account opened");
        Ok(())
    }

    fn asset_class(&self, txn: &Txn<'_>, asset: &Address) -> AssetResult<AssetClass> {
        Ok(txn.fetch(asset)?)
    }

    fn account(&self, txn: &Txn<'_>, account: &Address) -> AssetResult<AssetAccount> {
        Ok(txn.fetch(account)?)
    }

    fn transfer(
        &self,
        txn: &mut Txn<'_>,
        from: &Address,
        to: &Address,
        amount: u64,
        authority: &Address,
    ) -> AssetResult<()> {
        let mut source: AssetAccount = txn.fetch(from)?;
        let mut dest: AssetAccount = txn.fetch(to)?;

        if source.owner != *authority {
            return Err(AssetError::OwnerMismatch {
                account: *from,
                authority: *authority,
            });
        }
        if dest.asset != source.asset {
            return Err(AssetError::AssetMismatch {
                account: *to,
                expected: source.asset,
                found: dest.asset,
            });
        }
        if source.balance < amount {
            return Err(AssetError::InsufficientFunds {
                account: *from,
                balance: source.balance,
                requested: amount,
            });
        }

        // Self-transfer: checks passed, balances unchanged.
        if from == to {
            return Ok(());
        }

        source.balance -= amount;
        dest.balance = dest
            .balance
            .checked_add(amount)
            .ok_or(AssetError::Overflow(*to))?;

        txn.put(from, &source)?;
        txn.put(to, &dest)?;
        trace!(from = %from, to = %to, amount, "transfer");
        Ok(())
    }

    fn mint(
        &self,
        txn: &mut Txn<'_>,
        asset: &Address,
        to: &Address,
        amount: u64,
        authority: &Address,
    ) -> AssetResult<()> {
        let mut class: AssetClass = txn.fetch(asset)?;
        let mut dest: AssetAccount = txn.fetch(to)?;

        if class.mint_authority != *authority {
            return Err(AssetError::MintAuthorityMismatch {
                asset: *asset,
                authority: *authority,
            });
        }
        if dest.asset != *asset {
            return Err(AssetError::AssetMismatch {
                account: *to,
                expected: *asset,
                found: dest.asset,
            });
        }

        class.supply = class
            .supply
            .checked_add(amount)
            .ok_or(AssetError::Overflow(*asset))?;
        dest.balance = dest
            .balance
            .checked_add(amount)
            .ok_or(AssetError::Overflow(*to))?;

        txn.put(asset, &class)?;
        txn.put(to, &dest)?;
        trace!(asset = %asset, to = %to, amount, "mint");
        Ok(())
    }

    fn burn(
        &self,
        txn: &mut Txn<'_>,
        from: &Address,
        amount: u64,
        authority: &Address,
    ) -> AssetResult<()> {
        let mut source: AssetAccount = txn.fetch(from)?;

        if source.owner != *authority {
            return Err(AssetError::OwnerMismatch {
                account: *from,
                authority: *authority,
            });
        }
        if source.balance < amount {
            return Err(AssetError::InsufficientFunds {
                account: *from,
                balance: source.balance,
                requested: amount,
            });
        }

        let mut class: AssetClass = txn.fetch(&source.asset)?;
        class.supply = class
            .supply
            .checked_sub(amount)
            .ok_or(AssetError::Overflow(source.asset))?;
        source.balance -= amount;

        txn.put(&source.asset, &class)?;
        txn.put(from, &source)?;
        trace!(from = %from, amount, "burn");
        Ok(())
    }
}
