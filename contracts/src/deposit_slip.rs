//! # Deposit Slips
//!
//! A deposit slip is the per-(vault, depositor) record of how much
//! underlying the depositor has put into the vault. It is the refund
//! claim if the vault reverts, and it is consumed (deleted) on refund.
//!
//! Slips are created at zero and only ever credited by minting.

use cvault_protocol::config::DEPOSIT_SLIP_SEED;
use cvault_protocol::identity::Address;
use cvault_protocol::storage::{Record, Txn};
use serde::{Deserialize, Serialize};

use crate::error::{VaultError, VaultResult};

/// Running deposit total for one depositor in one vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositSlip {
    pub vault: Address,
    pub depositor: Address,
    /// Underlying base units deposited so far.
    pub deposited_amount: u64,
}

impl Record for DepositSlip {
    const KIND: &'static str = "deposit_slip";
}

impl DepositSlip {
    pub fn new(vault: Address, depositor: Address) -> Self {
        Self {
            vault,
            depositor,
            deposited_amount: 0,
        }
    }

    /// Whether this slip belongs to `vault` and `depositor`.
    pub fn is_bound_to(&self, vault: &Address, depositor: &Address) -> bool {
        self.vault == *vault && self.depositor == *depositor
    }

    /// Add `amount` to the running total. `slip` names the record in the
    /// error if the total would overflow.
    pub fn credit(&mut self, slip: &Address, amount: u64) -> VaultResult<()> {
        self.deposited_amount = self
            .deposited_amount
            .checked_add(amount)
            .ok_or(VaultError::AmountOverflow(*slip))?;
        Ok(())
    }
}

/// Address of the slip for `(vault, depositor)`.
pub fn deposit_slip_address(program_id: &Address, vault: &Address, depositor: &Address) -> Address {
    Address::derive(
        program_id,
        &[DEPOSIT_SLIP_SEED, vault.as_ref(), depositor.as_ref()],
    )
}

/// Create the zero-valued slip for `depositor` in `vault`.
///
/// # Errors
///
/// - `Store(AccountNotFound)` if `vault` does not exist.
/// - `Store(AccountAlreadyInitialized)` if the slip already exists.
pub fn initialize_deposit_slip(
    program_id: &Address,
    txn: &mut Txn<'_>,
    vault: &Address,
    depositor: &Address,
) -> VaultResult<Address> {
    crate::vault_registry::load_vault(txn, vault)?;

    let slip_id = deposit_slip_address(program_id, vault, depositor);
    txn.create(&slip_id, &DepositSlip::new(*vault, *depositor))?;
    Ok(slip_id)
}
