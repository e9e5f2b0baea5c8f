//! # Protocol Configuration & Constants
//!
//! Every magic number used by the conditional vault lives here. Seed
//! prefixes and the derivation context are part of the address scheme:
//! changing any of them after deployment silently relocates every vault,
//! slip, and escrow account, so treat them as frozen.

// ---------------------------------------------------------------------------
// Address Derivation
// ---------------------------------------------------------------------------

/// BLAKE3 derive-key context for program-derived addresses.
///
/// Domain-separates derived addresses from every other BLAKE3 use in the
/// workspace. Format follows the BLAKE3 recommendation of
/// "application, date, purpose".
pub const ADDRESS_DERIVATION_CONTEXT: &str = "conditional-vault 2024 address derivation v1";

/// Name hashed into the default program id.
pub const PROGRAM_NAME: &str = "conditional_vault";

/// Seed prefix for vault records: `[VAULT_SEED, authority, underlying_asset]`.
pub const VAULT_SEED: &[u8] = b"conditional_vault";

/// Seed prefix for deposit slips: `[DEPOSIT_SLIP_SEED, vault, depositor]`.
pub const DEPOSIT_SLIP_SEED: &[u8] = b"deposit_slip";

/// Seed prefix for the vault's underlying escrow account:
/// `[ESCROW_SEED, vault, underlying_asset]`.
pub const ESCROW_SEED: &[u8] = b"vault_escrow";

/// Seed prefix for the vault's conditional asset class: `[CONDITIONAL_ASSET_SEED, vault]`.
pub const CONDITIONAL_ASSET_SEED: &[u8] = b"conditional_asset";

/// Name hashed into the asset ledger's derivation root.
pub const ASSET_LEDGER_NAME: &str = "asset_ledger";

/// Seed prefix for caller-created asset classes:
/// `[ASSET_CLASS_SEED, mint_authority, name]`, under the ledger root.
pub const ASSET_CLASS_SEED: &[u8] = b"asset_class";

/// Seed prefix for caller-opened accounts: `[TOKEN_ACCOUNT_SEED, owner, asset]`,
/// under the ledger root.
pub const TOKEN_ACCOUNT_SEED: &[u8] = b"token_account";

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Bech32 human-readable prefix for rendered addresses.
pub const ADDRESS_HRP: &str = "cvault";

/// Raw address length in bytes.
pub const ADDRESS_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Name of the sled tree that holds every record envelope.
pub const RECORDS_TREE: &str = "records";

// ---------------------------------------------------------------------------
// Logging & Metrics
// ---------------------------------------------------------------------------

/// Default filter directive when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Namespace prefix applied to every Prometheus metric.
pub const METRICS_NAMESPACE: &str = "cvault";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_prefixes_are_distinct() {
        let seeds = [
            VAULT_SEED,
            DEPOSIT_SLIP_SEED,
            ESCROW_SEED,
            CONDITIONAL_ASSET_SEED,
            ASSET_CLASS_SEED,
            TOKEN_ACCOUNT_SEED,
        ];
        for (i, a) in seeds.iter().enumerate() {
            for b in seeds.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn ledger_root_differs_from_program_name() {
        assert_ne!(ASSET_LEDGER_NAME, PROGRAM_NAME);
    }
}
