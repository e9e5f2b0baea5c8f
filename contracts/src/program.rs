//! # Conditional Vault Program
//!
//! The entry points. Each instruction runs as exactly one store
//! transaction: every check and every write (program records and asset
//! movements alike) goes through a single [`Txn`], and the store commits
//! it whole or not at all. Overlapping calls serialize at the store.
//!
//! Privileged instructions take the signer's [`Keypair`]; its address is
//! compared against stored authority and owner fields.

use std::time::Instant;

use cvault_protocol::asset::{
    self, AssetAccount, AssetCapability, AssetClass, TokenLedger,
};
use cvault_protocol::config::PROGRAM_NAME;
use cvault_protocol::identity::{Address, Keypair};
use cvault_protocol::storage::{Envelope, RecordStore, RecordView, StoreResult, Txn};

use crate::deposit_slip::{self, DepositSlip};
use crate::error::VaultResult;
use crate::metrics::{ProgramMetrics, PATH_CONDITIONAL, PATH_DEPOSIT_SLIP};
use crate::minter::{self, MintConditionalTokens};
use crate::redemption::{self, RedeemConditionalTokens, RedeemDepositSlip};
use crate::settlement::{self, SettlementOutcome};
use crate::vault_registry::{self, Vault};

/// Program-level configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramConfig {
    /// Root of every derived address this program owns.
    pub program_id: Address,
    /// Register and update [`ProgramMetrics`].
    pub enable_metrics: bool,
}

impl ProgramConfig {
    /// The well-known program id, derived from the program name.
    pub fn default_program_id() -> Address {
        Address::derive(&Address::new([0u8; 32]), &[PROGRAM_NAME.as_bytes()])
    }
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            program_id: Self::default_program_id(),
            enable_metrics: true,
        }
    }
}

/// The conditional vault program over a record store `S` and an asset
/// capability `A`.
#[derive(Debug)]
pub struct ConditionalVaultProgram<S: RecordStore, A: AssetCapability = TokenLedger> {
    store: S,
    assets: A,
    config: ProgramConfig,
    metrics: Option<ProgramMetrics>,
}

impl<S: RecordStore> ConditionalVaultProgram<S, TokenLedger> {
    /// Program with the default config and the record-backed token ledger.
    pub fn new(store: S) -> VaultResult<Self> {
        Self::with_config(store, TokenLedger::new(), ProgramConfig::default())
    }
}

impl<S: RecordStore, A: AssetCapability> ConditionalVaultProgram<S, A> {
    pub fn with_config(store: S, assets: A, config: ProgramConfig) -> VaultResult<Self> {
        let metrics = if config.enable_metrics {
            Some(ProgramMetrics::new()?)
        } else {
            None
        };
        tracing::debug!(
            program_id = %config.program_id,
            metrics = config.enable_metrics,
            "conditional vault program ready"
        );
        Ok(Self {
            store,
            assets,
            config,
            metrics,
        })
    }

    pub fn program_id(&self) -> &Address {
        &self.config.program_id
    }

    pub fn config(&self) -> &ProgramConfig {
        &self.config
    }

    pub fn metrics(&self) -> Option<&ProgramMetrics> {
        self.metrics.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -- Addressing ---------------------------------------------------------

    pub fn vault_address(&self, settlement_authority: &Address, underlying_asset: &Address) -> Address {
        vault_registry::vault_address(self.program_id(), settlement_authority, underlying_asset)
    }

    pub fn deposit_slip_address(&self, vault: &Address, depositor: &Address) -> Address {
        deposit_slip::deposit_slip_address(self.program_id(), vault, depositor)
    }

    pub fn escrow_address(&self, vault: &Address, underlying_asset: &Address) -> Address {
        vault_registry::escrow_address(self.program_id(), vault, underlying_asset)
    }

    pub fn conditional_asset_address(&self, vault: &Address) -> Address {
        vault_registry::conditional_asset_address(self.program_id(), vault)
    }

    /// Where [`create_asset`](Self::create_asset) puts `name` for this
    /// mint authority.
    pub fn asset_address(&self, mint_authority: &Address, name: &str) -> Address {
        asset::asset_class_address(mint_authority, name)
    }

    /// Where [`open_account`](Self::open_account) puts `owner`'s account
    /// for `asset`.
    pub fn token_account_address(&self, asset: &Address, owner: &Address) -> Address {
        asset::token_account_address(owner, asset)
    }

    // -- Instructions -------------------------------------------------------

    /// Create the vault for `(settlement_authority, underlying_asset)`,
    /// its escrow account, and its conditional asset.
    pub fn initialize_vault(
        &self,
        settlement_authority: &Address,
        underlying_asset: &Address,
    ) -> VaultResult<Address> {
        let vault_id = self.execute("initialize_vault", |txn| {
            vault_registry::initialize_vault(
                self.program_id(),
                txn,
                &self.assets,
                settlement_authority,
                underlying_asset,
            )
        })?;

        tracing::info!(
            vault = %vault_id,
            authority = %settlement_authority,
            underlying = %underlying_asset,
            "vault initialized"
        );
        if let Some(m) = &self.metrics {
            m.vaults_initialized_total.inc();
        }
        Ok(vault_id)
    }

    /// Create `depositor`'s zero-valued slip in `vault`.
    pub fn initialize_deposit_slip(&self, vault: &Address, depositor: &Address) -> VaultResult<Address> {
        let slip_id = self.execute("initialize_deposit_slip", |txn| {
            deposit_slip::initialize_deposit_slip(self.program_id(), txn, vault, depositor)
        })?;

        tracing::debug!(vault = %vault, depositor = %depositor, slip = %slip_id, "deposit slip initialized");
        if let Some(m) = &self.metrics {
            m.deposit_slips_initialized_total.inc();
        }
        Ok(slip_id)
    }

    /// Deposit `accounts.amount` underlying into escrow and mint as many
    /// conditional tokens to `authority`.
    pub fn mint_conditional_tokens(
        &self,
        accounts: &MintConditionalTokens,
        authority: &Keypair,
    ) -> VaultResult<()> {
        let signer = authority.address();
        self.execute("mint_conditional_tokens", |txn| {
            minter::mint_conditional_tokens(txn, &self.assets, accounts, &signer)
        })?;

        tracing::debug!(
            vault = %accounts.vault,
            depositor = %signer,
            amount = accounts.amount,
            "conditional tokens minted"
        );
        if let Some(m) = &self.metrics {
            m.record_mint(accounts.amount);
        }
        Ok(())
    }

    /// Settle `vault` with `outcome`. Only the settlement authority may
    /// call this, and only once.
    pub fn settle_conditional_vault(
        &self,
        vault: &Address,
        outcome: SettlementOutcome,
        settlement_authority: &Keypair,
    ) -> VaultResult<()> {
        let caller = settlement_authority.address();
        self.execute("settle_conditional_vault", |txn| {
            settlement::settle_conditional_vault(txn, vault, &caller, outcome)
        })?;

        tracing::info!(vault = %vault, %outcome, "vault settled");
        if let Some(m) = &self.metrics {
            m.record_settlement(outcome);
        }
        Ok(())
    }

    /// Burn the signer's whole conditional balance and pay out the same
    /// amount of underlying. Returns the amount paid.
    pub fn redeem_conditional_tokens(
        &self,
        accounts: &RedeemConditionalTokens,
        authority: &Keypair,
    ) -> VaultResult<u64> {
        let signer = authority.address();
        let amount = self.execute("redeem_conditional_tokens", |txn| {
            redemption::redeem_conditional_tokens(txn, &self.assets, accounts, &signer)
        })?;

        tracing::info!(vault = %accounts.vault, holder = %signer, amount, "conditional tokens redeemed");
        if let Some(m) = &self.metrics {
            m.record_redemption(PATH_CONDITIONAL, amount);
        }
        Ok(amount)
    }

    /// Refund the signer's deposit slip and delete it. Returns the amount
    /// paid.
    pub fn redeem_deposit_slip(
        &self,
        accounts: &RedeemDepositSlip,
        authority: &Keypair,
    ) -> VaultResult<u64> {
        let signer = authority.address();
        let amount = self.execute("redeem_deposit_slip", |txn| {
            redemption::redeem_deposit_slip(txn, &self.assets, accounts, &signer)
        })?;

        tracing::info!(vault = %accounts.vault, depositor = %signer, amount, "deposit slip redeemed");
        if let Some(m) = &self.metrics {
            m.record_redemption(PATH_DEPOSIT_SLIP, amount);
        }
        Ok(amount)
    }

    // -- Asset setup --------------------------------------------------------

    /// Register asset `name` under the signer's mint authority and return
    /// its derived address. Callers never choose the address, so nothing
    /// created here can land on a vault, escrow, slip, or conditional
    /// asset address.
    pub fn create_asset(
        &self,
        name: &str,
        mint_authority: &Keypair,
        decimals: u8,
    ) -> VaultResult<Address> {
        let authority = mint_authority.address();
        let asset = asset::asset_class_address(&authority, name);
        self.execute("create_asset", |txn| {
            self.assets.create_asset(txn, &asset, &authority, decimals)?;
            Ok(asset)
        })?;
        tracing::debug!(asset = %asset, name, "asset created");
        Ok(asset)
    }

    /// Return `owner`'s account for `asset`, opening it empty if it does
    /// not exist yet.
    pub fn open_account(&self, asset: &Address, owner: &Address) -> VaultResult<Address> {
        let account = asset::token_account_address(owner, asset);
        self.execute("open_account", |txn| {
            if txn.exists(&account)? {
                // Still has to be an account of this asset.
                self.assets.account(txn, &account)?;
            } else {
                self.assets.open_account(txn, &account, asset, owner)?;
            }
            Ok(account)
        })
    }

    /// Issue `amount` of `asset` into `to`, signed by the mint authority.
    pub fn mint_to(
        &self,
        asset: &Address,
        to: &Address,
        amount: u64,
        mint_authority: &Keypair,
    ) -> VaultResult<()> {
        let signer = mint_authority.address();
        self.execute("mint_to", |txn| {
            Ok(self.assets.mint(txn, asset, to, amount, &signer)?)
        })
    }

    // -- Views --------------------------------------------------------------

    pub fn vault(&self, vault: &Address) -> VaultResult<Vault> {
        Ok(self.store.fetch(vault)?)
    }

    pub fn deposit_slip(&self, slip: &Address) -> VaultResult<DepositSlip> {
        Ok(self.store.fetch(slip)?)
    }

    /// `None` once the slip has been redeemed (or was never created).
    pub fn try_deposit_slip(&self, slip: &Address) -> VaultResult<Option<DepositSlip>> {
        Ok(self.store.try_fetch(slip)?)
    }

    pub fn account(&self, account: &Address) -> VaultResult<AssetAccount> {
        self.view(|txn| Ok(self.assets.account(txn, account)?))
    }

    pub fn asset_class(&self, asset: &Address) -> VaultResult<AssetClass> {
        self.view(|txn| Ok(self.assets.asset_class(txn, asset)?))
    }

    pub fn balance_of(&self, account: &Address) -> VaultResult<u64> {
        self.view(|txn| Ok(self.assets.balance_of(txn, account)?))
    }

    pub fn supply_of(&self, asset: &Address) -> VaultResult<u64> {
        self.view(|txn| Ok(self.assets.supply_of(txn, asset)?))
    }

    // -- Plumbing -----------------------------------------------------------

    /// Run one instruction as one transaction, logging and counting
    /// rejections.
    fn execute<T, F>(&self, instruction: &'static str, f: F) -> VaultResult<T>
    where
        F: FnOnce(&mut Txn<'_>) -> VaultResult<T>,
    {
        let started = Instant::now();
        let result = self.store.transact(f);
        let elapsed = started.elapsed().as_secs_f64();

        if let Some(m) = &self.metrics {
            m.observe_duration(instruction, elapsed);
        }
        if let Err(err) = &result {
            tracing::warn!(
                instruction,
                class = %err.class(),
                error = %err,
                "instruction rejected"
            );
            if let Some(m) = &self.metrics {
                m.record_rejection(err.class());
            }
        }
        result
    }

    /// Read-only access through a transaction that is never committed.
    fn view<T, F>(&self, f: F) -> VaultResult<T>
    where
        F: FnOnce(&Txn<'_>) -> VaultResult<T>,
    {
        let committed = Committed(&self.store);
        let txn = Txn::new(&committed);
        f(&txn)
    }
}

/// Committed state of a store, readable through a [`Txn`].
struct Committed<'a, S>(&'a S);

impl<S: RecordStore> RecordView for Committed<'_, S> {
    fn read(&self, key: &Address) -> StoreResult<Option<Envelope>> {
        self.0.read(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorClass, VaultError};
    use crate::vault_registry::VaultStatus;
    use cvault_protocol::storage::{MemoryStore, StoreError};

    struct World {
        program: ConditionalVaultProgram<MemoryStore>,
        authority: Keypair,
        issuer: Keypair,
        underlying: Address,
    }

    fn world() -> World {
        let program = ConditionalVaultProgram::new(MemoryStore::new()).unwrap();
        let authority = Keypair::generate();
        let issuer = Keypair::generate();
        let underlying = program.create_asset("usd", &issuer, 9).unwrap();
        World {
            program,
            authority,
            issuer,
            underlying,
        }
    }

    #[test]
    fn default_program_id_is_stable() {
        assert_eq!(
            ProgramConfig::default().program_id,
            ProgramConfig::default_program_id()
        );
        let w = world();
        assert_eq!(*w.program.program_id(), ProgramConfig::default_program_id());
    }

    #[test]
    fn initialize_vault_derives_and_counts() {
        let w = world();
        let vault_id = w
            .program
            .initialize_vault(&w.authority.address(), &w.underlying)
            .unwrap();
        assert_eq!(
            vault_id,
            w.program.vault_address(&w.authority.address(), &w.underlying)
        );

        let vault = w.program.vault(&vault_id).unwrap();
        assert_eq!(vault.status, VaultStatus::Active);
        assert_eq!(
            vault.underlying_escrow_account,
            w.program.escrow_address(&vault_id, &w.underlying)
        );
        assert_eq!(
            vault.conditional_asset,
            w.program.conditional_asset_address(&vault_id)
        );
        assert_eq!(w.program.asset_class(&vault.conditional_asset).unwrap().decimals, 9);

        let m = w.program.metrics().unwrap();
        assert_eq!(m.vaults_initialized_total.get(), 1);
    }

    #[test]
    fn rejections_are_counted_by_class() {
        let w = world();
        let vault_id = w
            .program
            .initialize_vault(&w.authority.address(), &w.underlying)
            .unwrap();
        let outsider = Keypair::generate();
        let err = w
            .program
            .settle_conditional_vault(&vault_id, SettlementOutcome::Finalized, &outsider)
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Authorization);

        let m = w.program.metrics().unwrap();
        assert_eq!(
            m.rejections_total
                .with_label_values(&["authorization"])
                .get(),
            1
        );
        assert_eq!(m.settlements_total.with_label_values(&["finalized"]).get(), 0);
    }

    #[test]
    fn metrics_can_be_disabled() {
        let config = ProgramConfig {
            enable_metrics: false,
            ..ProgramConfig::default()
        };
        let program =
            ConditionalVaultProgram::with_config(MemoryStore::new(), TokenLedger::new(), config)
                .unwrap();
        assert!(program.metrics().is_none());
    }

    #[test]
    fn custom_program_id_moves_every_address() {
        let w = world();
        let config = ProgramConfig {
            program_id: Address::new([7u8; 32]),
            ..ProgramConfig::default()
        };
        let other =
            ConditionalVaultProgram::with_config(MemoryStore::new(), TokenLedger::new(), config)
                .unwrap();
        let authority = w.authority.address();
        assert_ne!(
            w.program.vault_address(&authority, &w.underlying),
            other.vault_address(&authority, &w.underlying)
        );
    }

    #[test]
    fn mint_to_requires_issuer() {
        let w = world();
        let holder = Keypair::generate();
        let account = w
            .program
            .open_account(&w.underlying, &holder.address())
            .unwrap();
        w.program.mint_to(&w.underlying, &account, 5, &w.issuer).unwrap();
        assert!(w.program.mint_to(&w.underlying, &account, 5, &holder).is_err());
        assert_eq!(w.program.balance_of(&account).unwrap(), 5);
        assert_eq!(w.program.supply_of(&w.underlying).unwrap(), 5);
    }

    #[test]
    fn views_report_missing_records() {
        let w = world();
        let nowhere = Address::new([1u8; 32]);
        assert!(matches!(
            w.program.vault(&nowhere).unwrap_err(),
            VaultError::Store(StoreError::AccountNotFound(_))
        ));
        assert!(w.program.try_deposit_slip(&nowhere).unwrap().is_none());
        assert!(matches!(
            w.program.balance_of(&nowhere).unwrap_err(),
            VaultError::Store(StoreError::AccountNotFound(_))
        ));
    }

    #[test]
    fn slip_for_unknown_vault_rejected() {
        let w = world();
        let err = w
            .program
            .initialize_deposit_slip(&Address::new([3u8; 32]), &w.authority.address())
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Storage);
        assert_eq!(
            w.program
                .metrics()
                .unwrap()
                .deposit_slips_initialized_total
                .get(),
            0
        );
    }

    #[test]
    fn open_account_is_idempotent() {
        let w = world();
        let holder = Keypair::generate().address();
        let account = w.program.open_account(&w.underlying, &holder).unwrap();
        assert_eq!(account, w.program.token_account_address(&w.underlying, &holder));

        w.program.mint_to(&w.underlying, &account, 40, &w.issuer).unwrap();
        assert_eq!(w.program.open_account(&w.underlying, &holder).unwrap(), account);
        assert_eq!(w.program.balance_of(&account).unwrap(), 40);
        assert_eq!(w.program.account(&account).unwrap().owner, holder);
    }

    #[test]
    fn create_asset_is_scoped_to_the_signer() {
        let w = world();
        assert_eq!(
            w.underlying,
            w.program.asset_address(&w.issuer.address(), "usd")
        );
        // Same name, different signer: a different asset.
        let other = Keypair::generate();
        let theirs = w.program.create_asset("usd", &other, 2).unwrap();
        assert_ne!(theirs, w.underlying);
        assert_eq!(w.program.asset_class(&theirs).unwrap().mint_authority, other.address());

        let err = w.program.create_asset("usd", &w.issuer, 9).unwrap_err();
        assert!(matches!(
            err,
            VaultError::Store(StoreError::AccountAlreadyInitialized(_))
        ));
    }

    #[test]
    fn setup_helpers_cannot_occupy_program_addresses() {
        let w = world();
        let mallory = Keypair::generate();
        let victim = Keypair::generate().address();
        let authority = w.authority.address();

        let vault_id = w.program.vault_address(&authority, &w.underlying);
        let reserved = [
            vault_id,
            w.program.escrow_address(&vault_id, &w.underlying),
            w.program.conditional_asset_address(&vault_id),
            w.program.deposit_slip_address(&vault_id, &victim),
        ];

        // Everything an outsider can create before the vault exists.
        let mut created = vec![
            w.program.create_asset("squat", &mallory, 0).unwrap(),
            w.program.open_account(&w.underlying, &mallory.address()).unwrap(),
            w.program.open_account(&w.underlying, &victim).unwrap(),
            w.program.open_account(&w.underlying, &vault_id).unwrap(),
        ];
        let squat = created[0];
        created.push(w.program.open_account(&squat, &vault_id).unwrap());
        created.push(w.program.open_account(&squat, &victim).unwrap());
        for address in &created {
            assert!(!reserved.contains(address), "{address} is program-derived");
        }

        let initialized = w.program.initialize_vault(&authority, &w.underlying).unwrap();
        assert_eq!(initialized, vault_id);
        let slip = w.program.initialize_deposit_slip(&vault_id, &victim).unwrap();
        assert_eq!(w.program.deposit_slip(&slip).unwrap().depositor, victim);
        assert_eq!(w.program.balance_of(&reserved[1]).unwrap(), 0);
    }
}
