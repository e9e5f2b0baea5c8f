//! # Settlement
//!
//! Moves a vault out of `Active`, exactly once, by its settlement
//! authority. The outcome decides which redemption path opens.

use cvault_protocol::identity::Address;
use cvault_protocol::storage::Txn;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{VaultError, VaultResult};
use crate::vault_registry::{Vault, VaultStatus};

/// The two terminal outcomes of a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementOutcome {
    /// The condition held: conditional tokens redeem.
    Finalized,
    /// The condition failed: deposit slips redeem.
    Reverted,
}

impl SettlementOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementOutcome::Finalized => "finalized",
            SettlementOutcome::Reverted => "reverted",
        }
    }
}

impl fmt::Display for SettlementOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SettlementOutcome> for VaultStatus {
    fn from(outcome: SettlementOutcome) -> Self {
        match outcome {
            SettlementOutcome::Finalized => VaultStatus::Finalized,
            SettlementOutcome::Reverted => VaultStatus::Reverted,
        }
    }
}

/// Settle `vault_id` with `outcome`.
///
/// The caller is checked before the status, so an outsider probing a
/// settled vault learns only that they are not its authority.
pub fn settle_conditional_vault(
    txn: &mut Txn<'_>,
    vault_id: &Address,
    caller: &Address,
    outcome: SettlementOutcome,
) -> VaultResult<VaultStatus> {
    txn.mutate(vault_id, |vault: &mut Vault| {
        if vault.settlement_authority != *caller {
            return Err(VaultError::Unauthorized {
                vault: *vault_id,
                caller: *caller,
            });
        }
        if !vault.is_active() {
            return Err(VaultError::VaultAlreadySettled {
                vault: *vault_id,
                status: vault.status,
            });
        }
        vault.status = outcome.into();
        Ok(vault.status)
    })
}
