//! # Minter
//!
//! Deposits underlying into a vault's escrow and mints the same amount of
//! conditional tokens to the depositor, crediting their deposit slip.
//!
//! Checks run in a fixed order and the first failure is reported:
//!
//! 1. slip belongs to the vault            -> `ConstraintHasOne`
//! 2. escrow is the vault's escrow         -> `InvalidVaultUnderlyingTokenAccount`
//! 3. source owned by the authority        -> `ConstraintTokenOwner`
//! 4. source holds the underlying asset    -> `ConstraintTokenMint`
//! 5. destination owned by the authority   -> `ConstraintTokenOwner`
//! 6. destination holds the passed asset   -> `ConstraintTokenMint`
//! 7. passed asset is the vault's claim    -> `InvalidConditionalTokenMint`
//! 8. source balance covers the amount     -> `InsufficientUnderlyingTokens`
//!
//! Minting is not gated on vault status. A deposit after settlement
//! moves `amount` underlying in and issues `amount` claims out, so it
//! cannot break conservation.

use cvault_protocol::asset::AssetCapability;
use cvault_protocol::identity::Address;
use cvault_protocol::storage::Txn;

use crate::deposit_slip::DepositSlip;
use crate::error::{VaultError, VaultResult};
use crate::vault_registry::load_vault;

/// Accounts taking part in a mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintConditionalTokens {
    pub vault: Address,
    pub deposit_slip: Address,
    pub amount: u64,
    /// Depositor's account of the underlying asset (debited).
    pub user_underlying_account: Address,
    /// The vault's escrow account (credited).
    pub vault_underlying_account: Address,
    /// Asset class of the claim tokens being minted.
    pub conditional_asset: Address,
    /// Depositor's account of the conditional asset (credited).
    pub user_conditional_account: Address,
}

pub fn mint_conditional_tokens<A: AssetCapability + ?Sized>(
    txn: &mut Txn<'_>,
    assets: &A,
    accounts: &MintConditionalTokens,
    authority: &Address,
) -> VaultResult<()> {
    let vault = load_vault(txn, &accounts.vault)?;
    let slip: DepositSlip = txn.fetch(&accounts.deposit_slip)?;

    if slip.vault != accounts.vault {
        return Err(VaultError::ConstraintHasOne {
            slip: accounts.deposit_slip,
        });
    }

    if accounts.vault_underlying_account != vault.underlying_escrow_account {
        return Err(VaultError::InvalidVaultUnderlyingTokenAccount {
            vault: accounts.vault,
            supplied: accounts.vault_underlying_account,
        });
    }

    let source = assets.account(txn, &accounts.user_underlying_account)?;
    if source.owner != *authority {
        return Err(VaultError::ConstraintTokenOwner {
            account: accounts.user_underlying_account,
            authority: *authority,
        });
    }
    if source.asset != vault.underlying_asset {
        return Err(VaultError::ConstraintTokenMint {
            account: accounts.user_underlying_account,
            expected: vault.underlying_asset,
            found: source.asset,
        });
    }

    let destination = assets.account(txn, &accounts.user_conditional_account)?;
    if destination.owner != *authority {
        return Err(VaultError::ConstraintTokenOwner {
            account: accounts.user_conditional_account,
            authority: *authority,
        });
    }
    if destination.asset != accounts.conditional_asset {
        return Err(VaultError::ConstraintTokenMint {
            account: accounts.user_conditional_account,
            expected: accounts.conditional_asset,
            found: destination.asset,
        });
    }

    if accounts.conditional_asset != vault.conditional_asset {
        return Err(VaultError::InvalidConditionalTokenMint {
            vault: accounts.vault,
            supplied: accounts.conditional_asset,
        });
    }

    if source.balance < accounts.amount {
        return Err(VaultError::InsufficientUnderlyingTokens {
            account: accounts.user_underlying_account,
            balance: source.balance,
            requested: accounts.amount,
        });
    }

    assets.transfer(
        txn,
        &accounts.user_underlying_account,
        &accounts.vault_underlying_account,
        accounts.amount,
        authority,
    )?;
    assets.mint(
        txn,
        &vault.conditional_asset,
        &accounts.user_conditional_account,
        accounts.amount,
        &accounts.vault,
    )?;
    txn.mutate(&accounts.deposit_slip, |slip: &mut DepositSlip| {
        slip.credit(&accounts.deposit_slip, accounts.amount)
    })?;

    Ok(())
}
