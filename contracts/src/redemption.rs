//! # Redemption
//!
//! The two exits from a settled vault. Exactly one is open, chosen by the
//! outcome:
//!
//! - `Finalized`: burn the caller's whole conditional balance and pay out
//!   the same amount of underlying from escrow.
//! - `Reverted`: pay out the caller's deposit slip total from escrow and
//!   delete the slip.
//!
//! The status gate is checked first. Account binding checks follow, so a
//! caller cannot drain escrow into an account it does not own or route
//! the payout through an escrow that is not the vault's.

use cvault_protocol::asset::{AssetAccount, AssetCapability};
use cvault_protocol::identity::Address;
use cvault_protocol::storage::Txn;

use crate::deposit_slip::DepositSlip;
use crate::error::{VaultError, VaultResult};
use crate::vault_registry::{load_vault, Vault, VaultStatus};

/// Accounts taking part in a conditional-token redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedeemConditionalTokens {
    pub vault: Address,
    /// Caller's conditional account (burned from).
    pub user_conditional_account: Address,
    /// Caller's underlying account (paid into).
    pub user_underlying_account: Address,
    /// The vault's escrow account (paid from).
    pub vault_underlying_account: Address,
    pub conditional_asset: Address,
}

/// Accounts taking part in a deposit-slip redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedeemDepositSlip {
    pub vault: Address,
    pub deposit_slip: Address,
    /// Caller's underlying account (paid into).
    pub user_underlying_account: Address,
    /// The vault's escrow account (paid from).
    pub vault_underlying_account: Address,
}

/// Redeem the caller's whole conditional balance for underlying.
/// Returns the amount paid out.
pub fn redeem_conditional_tokens<A: AssetCapability + ?Sized>(
    txn: &mut Txn<'_>,
    assets: &A,
    accounts: &RedeemConditionalTokens,
    authority: &Address,
) -> VaultResult<u64> {
    let vault = load_vault(txn, &accounts.vault)?;
    if vault.status != VaultStatus::Finalized {
        return Err(VaultError::CantRedeemConditionalTokens {
            vault: accounts.vault,
            status: vault.status,
        });
    }

    if accounts.conditional_asset != vault.conditional_asset {
        return Err(VaultError::InvalidConditionalTokenMint {
            vault: accounts.vault,
            supplied: accounts.conditional_asset,
        });
    }
    check_escrow(&vault, &accounts.vault, &accounts.vault_underlying_account)?;

    let claims = assets.account(txn, &accounts.user_conditional_account)?;
    check_holding(
        &claims,
        &accounts.user_conditional_account,
        &vault.conditional_asset,
        authority,
    )?;
    let payee = assets.account(txn, &accounts.user_underlying_account)?;
    check_holding(
        &payee,
        &accounts.user_underlying_account,
        &vault.underlying_asset,
        authority,
    )?;

    let amount = claims.balance;
    assets.burn(txn, &accounts.user_conditional_account, amount, authority)?;
    assets.transfer(
        txn,
        &accounts.vault_underlying_account,
        &accounts.user_underlying_account,
        amount,
        &accounts.vault,
    )?;

    Ok(amount)
}

/// Refund the caller's deposit slip and delete it. Returns the amount
/// paid out.
pub fn redeem_deposit_slip<A: AssetCapability + ?Sized>(
    txn: &mut Txn<'_>,
    assets: &A,
    accounts: &RedeemDepositSlip,
    authority: &Address,
) -> VaultResult<u64> {
    let vault = load_vault(txn, &accounts.vault)?;
    if vault.status != VaultStatus::Reverted {
        return Err(VaultError::CantRedeemDepositSlip {
            vault: accounts.vault,
            status: vault.status,
        });
    }

    let slip: DepositSlip = txn.fetch(&accounts.deposit_slip)?;
    if !slip.is_bound_to(&accounts.vault, authority) {
        return Err(VaultError::ConstraintHasOne {
            slip: accounts.deposit_slip,
        });
    }

    check_escrow(&vault, &accounts.vault, &accounts.vault_underlying_account)?;
    let payee = assets.account(txn, &accounts.user_underlying_account)?;
    check_holding(
        &payee,
        &accounts.user_underlying_account,
        &vault.underlying_asset,
        authority,
    )?;

    let amount = slip.deposited_amount;
    assets.transfer(
        txn,
        &accounts.vault_underlying_account,
        &accounts.user_underlying_account,
        amount,
        &accounts.vault,
    )?;
    txn.destroy(&accounts.deposit_slip)?;

    Ok(amount)
}

fn check_escrow(vault: &Vault, vault_id: &Address, supplied: &Address) -> VaultResult<()> {
    if *supplied != vault.underlying_escrow_account {
        return Err(VaultError::InvalidVaultUnderlyingTokenAccount {
            vault: *vault_id,
            supplied: *supplied,
        });
    }
    Ok(())
}

fn check_holding(
    holding: &AssetAccount,
    account: &Address,
    expected_asset: &Address,
    authority: &Address,
) -> VaultResult<()> {
    // Owner before asset, matching the deposit path.
    if holding.owner != *authority {
        return Err(VaultError::ConstraintTokenOwner {
            account: *account,
            authority: *authority,
        });
    }
    if holding.asset != *expected_asset {
        return Err(VaultError::ConstraintTokenMint {
            account: *account,
            expected: *expected_asset,
            found: holding.asset,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deposit_slip::initialize_deposit_slip;
    use crate::minter::{mint_conditional_tokens, MintConditionalTokens};
    use crate::settlement::{settle_conditional_vault, SettlementOutcome};
    use crate::vault_registry::initialize_vault;
    use cvault_protocol::asset::TokenLedger;
    use cvault_protocol::storage::{MemoryStore, RecordStore, StoreError};

    fn addr(byte: u8) -> Address {
        Address::new([byte; 32])
    }

    const PROGRAM: u8 = 0xAA;
    const AUTHORITY: u8 = 1;
    const UNDERLYING: u8 = 2;
    const ISSUER: u8 = 3;
    const ALICE: u8 = 10;
    const ALICE_UNDERLYING: u8 = 11;
    const ALICE_CONDITIONAL: u8 = 12;
    const MALLORY: u8 = 20;
    const MALLORY_UNDERLYING: u8 = 21;
    const MALLORY_CONDITIONAL: u8 = 22;

    struct Fixture {
        store: MemoryStore,
        ledger: TokenLedger,
        vault: Vault,
        vault_id: Address,
        slip: Address,
    }

    /// Alice holds 1_000 underlying and has deposited 400 of it.
    fn deposited() -> Fixture {
        let store = MemoryStore::new();
        let ledger = TokenLedger::new();
        let (vault_id, slip) = store
            .transact(|txn| -> VaultResult<(Address, Address)> {
                ledger.create_asset(txn, &addr(UNDERLYING), &addr(ISSUER), 6)?;
                let vault_id = initialize_vault(
                    &addr(PROGRAM),
                    txn,
                    &ledger,
                    &addr(AUTHORITY),
                    &addr(UNDERLYING),
                )?;
                let vault: Vault = txn.fetch(&vault_id)?;
                ledger.open_account(txn, &addr(ALICE_UNDERLYING), &addr(UNDERLYING), &addr(ALICE))?;
                ledger.open_account(
                    txn,
                    &addr(ALICE_CONDITIONAL),
                    &vault.conditional_asset,
                    &addr(ALICE),
                )?;
                ledger.open_account(
                    txn,
                    &addr(MALLORY_UNDERLYING),
                    &addr(UNDERLYING),
                    &addr(MALLORY),
                )?;
                ledger.mint(txn, &addr(UNDERLYING), &addr(ALICE_UNDERLYING), 1_000, &addr(ISSUER))?;

                let slip = initialize_deposit_slip(&addr(PROGRAM), txn, &vault_id, &addr(ALICE))?;
                mint_conditional_tokens(
                    txn,
                    &ledger,
                    &MintConditionalTokens {
                        vault: vault_id,
                        deposit_slip: slip,
                        amount: 400,
                        user_underlying_account: addr(ALICE_UNDERLYING),
                        vault_underlying_account: vault.underlying_escrow_account,
                        conditional_asset: vault.conditional_asset,
                        user_conditional_account: addr(ALICE_CONDITIONAL),
                    },
                    &addr(ALICE),
                )?;
                Ok((vault_id, slip))
            })
            .unwrap();
        let vault = store.fetch(&vault_id).unwrap();
        Fixture {
            store,
            ledger,
            vault,
            vault_id,
            slip,
        }
    }

    fn settle(f: &Fixture, outcome: SettlementOutcome) {
        f.store
            .transact(|txn| settle_conditional_vault(txn, &f.vault_id, &addr(AUTHORITY), outcome))
            .unwrap();
    }

    fn balance(f: &Fixture, account: &Address) -> u64 {
        f.store
            .transact(|txn| f.ledger.balance_of(txn, account))
            .unwrap()
    }

    fn claim_accounts(f: &Fixture) -> RedeemConditionalTokens {
        RedeemConditionalTokens {
            vault: f.vault_id,
            user_conditional_account: addr(ALICE_CONDITIONAL),
            user_underlying_account: addr(ALICE_UNDERLYING),
            vault_underlying_account: f.vault.underlying_escrow_account,
            conditional_asset: f.vault.conditional_asset,
        }
    }

    fn slip_accounts(f: &Fixture) -> RedeemDepositSlip {
        RedeemDepositSlip {
            vault: f.vault_id,
            deposit_slip: f.slip,
            user_underlying_account: addr(ALICE_UNDERLYING),
            vault_underlying_account: f.vault.underlying_escrow_account,
        }
    }

    fn redeem_claims(f: &Fixture, accounts: &RedeemConditionalTokens, who: u8) -> VaultResult<u64> {
        f.store
            .transact(|txn| redeem_conditional_tokens(txn, &f.ledger, accounts, &addr(who)))
    }

    fn redeem_slip(f: &Fixture, accounts: &RedeemDepositSlip, who: u8) -> VaultResult<u64> {
        f.store
            .transact(|txn| redeem_deposit_slip(txn, &f.ledger, accounts, &addr(who)))
    }

    #[test]
    fn finalized_vault_pays_claims() {
        let f = deposited();
        settle(&f, SettlementOutcome::Finalized);

        assert_eq!(redeem_claims(&f, &claim_accounts(&f), ALICE).unwrap(), 400);
        assert_eq!(balance(&f, &addr(ALICE_UNDERLYING)), 1_000);
        assert_eq!(balance(&f, &addr(ALICE_CONDITIONAL)), 0);
        assert_eq!(balance(&f, &f.vault.underlying_escrow_account), 0);
        let supply = f
            .store
            .transact(|txn| f.ledger.supply_of(txn, &f.vault.conditional_asset))
            .unwrap();
        assert_eq!(supply, 0);
    }

    #[test]
    fn second_claim_redemption_pays_zero() {
        let f = deposited();
        settle(&f, SettlementOutcome::Finalized);
        redeem_claims(&f, &claim_accounts(&f), ALICE).unwrap();
        assert_eq!(redeem_claims(&f, &claim_accounts(&f), ALICE).unwrap(), 0);
        assert_eq!(balance(&f, &addr(ALICE_UNDERLYING)), 1_000);
    }

    #[test]
    fn claims_locked_unless_finalized() {
        let f = deposited();
        assert!(matches!(
            redeem_claims(&f, &claim_accounts(&f), ALICE).unwrap_err(),
            VaultError::CantRedeemConditionalTokens {
                status: VaultStatus::Active,
                ..
            }
        ));
        settle(&f, SettlementOutcome::Reverted);
        assert!(matches!(
            redeem_claims(&f, &claim_accounts(&f), ALICE).unwrap_err(),
            VaultError::CantRedeemConditionalTokens {
                status: VaultStatus::Reverted,
                ..
            }
        ));
        assert_eq!(balance(&f, &addr(ALICE_CONDITIONAL)), 400);
    }

    #[test]
    fn reverted_vault_refunds_slip() {
        let f = deposited();
        settle(&f, SettlementOutcome::Reverted);

        assert_eq!(redeem_slip(&f, &slip_accounts(&f), ALICE).unwrap(), 400);
        assert_eq!(balance(&f, &addr(ALICE_UNDERLYING)), 1_000);
        assert_eq!(balance(&f, &f.vault.underlying_escrow_account), 0);
        assert!(!f.store.contains(&f.slip).unwrap());
        // Claims are stranded, not burned.
        assert_eq!(balance(&f, &addr(ALICE_CONDITIONAL)), 400);
    }

    #[test]
    fn slip_redeems_once() {
        let f = deposited();
        settle(&f, SettlementOutcome::Reverted);
        redeem_slip(&f, &slip_accounts(&f), ALICE).unwrap();
        assert!(matches!(
            redeem_slip(&f, &slip_accounts(&f), ALICE).unwrap_err(),
            VaultError::Store(StoreError::AccountNotFound(_))
        ));
    }

    #[test]
    fn slip_locked_unless_reverted() {
        let f = deposited();
        settle(&f, SettlementOutcome::Finalized);
        assert!(matches!(
            redeem_slip(&f, &slip_accounts(&f), ALICE).unwrap_err(),
            VaultError::CantRedeemDepositSlip {
                status: VaultStatus::Finalized,
                ..
            }
        ));
        assert!(f.store.contains(&f.slip).unwrap());
    }

    #[test]
    fn stranger_cannot_take_anothers_slip() {
        let f = deposited();
        settle(&f, SettlementOutcome::Reverted);
        let accounts = RedeemDepositSlip {
            user_underlying_account: addr(MALLORY_UNDERLYING),
            ..slip_accounts(&f)
        };
        assert!(matches!(
            redeem_slip(&f, &accounts, MALLORY).unwrap_err(),
            VaultError::ConstraintHasOne { .. }
        ));
        assert_eq!(balance(&f, &f.vault.underlying_escrow_account), 400);
    }

    #[test]
    fn payout_must_go_to_callers_account() {
        let f = deposited();
        settle(&f, SettlementOutcome::Reverted);
        let accounts = RedeemDepositSlip {
            user_underlying_account: addr(MALLORY_UNDERLYING),
            ..slip_accounts(&f)
        };
        assert!(matches!(
            redeem_slip(&f, &accounts, ALICE).unwrap_err(),
            VaultError::ConstraintTokenOwner { .. }
        ));
    }

    #[test]
    fn payout_from_foreign_escrow_rejected() {
        let f = deposited();
        settle(&f, SettlementOutcome::Finalized);
        let accounts = RedeemConditionalTokens {
            vault_underlying_account: addr(MALLORY_UNDERLYING),
            ..claim_accounts(&f)
        };
        assert!(matches!(
            redeem_claims(&f, &accounts, ALICE).unwrap_err(),
            VaultError::InvalidVaultUnderlyingTokenAccount { .. }
        ));
    }

    #[test]
    fn wrong_conditional_asset_rejected() {
        let f = deposited();
        settle(&f, SettlementOutcome::Finalized);
        let accounts = RedeemConditionalTokens {
            conditional_asset: addr(UNDERLYING),
            ..claim_accounts(&f)
        };
        assert!(matches!(
            redeem_claims(&f, &accounts, ALICE).unwrap_err(),
            VaultError::InvalidConditionalTokenMint { .. }
        ));
    }

    #[test]
    fn payout_owner_is_checked_before_asset() {
        let f = deposited();
        f.store
            .transact(|txn| {
                f.ledger.open_account(
                    txn,
                    &addr(MALLORY_CONDITIONAL),
                    &f.vault.conditional_asset,
                    &addr(MALLORY),
                )
            })
            .unwrap();
        settle(&f, SettlementOutcome::Reverted);

        // Wrong owner and wrong asset: the owner mismatch is reported.
        let accounts = RedeemDepositSlip {
            user_underlying_account: addr(MALLORY_CONDITIONAL),
            ..slip_accounts(&f)
        };
        assert!(matches!(
            redeem_slip(&f, &accounts, ALICE).unwrap_err(),
            VaultError::ConstraintTokenOwner { .. }
        ));

        // Right owner, wrong asset.
        let accounts = RedeemDepositSlip {
            user_underlying_account: addr(ALICE_CONDITIONAL),
            ..slip_accounts(&f)
        };
        assert!(matches!(
            redeem_slip(&f, &accounts, ALICE).unwrap_err(),
            VaultError::ConstraintTokenMint { .. }
        ));
        assert_eq!(balance(&f, &f.vault.underlying_escrow_account), 400);
        assert!(f.store.contains(&f.slip).unwrap());
    }
}
