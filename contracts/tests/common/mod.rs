//! Shared fixtures for the vault integration tests.

#![allow(dead_code)]

use cvault_contracts::{
    ConditionalVaultProgram, MintConditionalTokens, RedeemConditionalTokens, RedeemDepositSlip,
    VaultResult,
};
use cvault_protocol::identity::{Address, Keypair};
use cvault_protocol::logging::{init_logging, LogFormat};
use cvault_protocol::storage::RecordStore;

pub const DECIMALS: u8 = 6;

/// One vault over a fresh underlying asset, plus the keys that control it.
pub struct Harness<S: RecordStore> {
    pub program: ConditionalVaultProgram<S>,
    pub authority: Keypair,
    pub issuer: Keypair,
    pub underlying: Address,
    pub vault: Address,
}

/// A funded depositor with both accounts open and a slip in the vault.
#[derive(Clone)]
pub struct Depositor {
    pub key: Keypair,
    pub underlying_account: Address,
    pub conditional_account: Address,
    pub slip: Address,
}

impl<S: RecordStore> Harness<S> {
    pub fn new(store: S) -> Self {
        let _ = init_logging("warn", LogFormat::Pretty);

        let program = ConditionalVaultProgram::new(store).unwrap();
        let authority = Keypair::generate();
        let issuer = Keypair::generate();
        let underlying = program.create_asset("usd", &issuer, DECIMALS).unwrap();
        let vault = program
            .initialize_vault(&authority.address(), &underlying)
            .unwrap();
        Self {
            program,
            authority,
            issuer,
            underlying,
            vault,
        }
    }

    pub fn depositor(&self, funded: u64) -> Depositor {
        let key = Keypair::generate();
        let owner = key.address();
        let underlying_account = self.program.open_account(&self.underlying, &owner).unwrap();
        let conditional_account = self
            .program
            .open_account(&self.conditional_asset(), &owner)
            .unwrap();
        self.program
            .mint_to(&self.underlying, &underlying_account, funded, &self.issuer)
            .unwrap();
        let slip = self.program.initialize_deposit_slip(&self.vault, &owner).unwrap();

        Depositor {
            key,
            underlying_account,
            conditional_account,
            slip,
        }
    }

    pub fn escrow(&self) -> Address {
        self.program.vault(&self.vault).unwrap().underlying_escrow_account
    }

    pub fn conditional_asset(&self) -> Address {
        self.program.vault(&self.vault).unwrap().conditional_asset
    }

    pub fn escrow_balance(&self) -> u64 {
        self.program.balance_of(&self.escrow()).unwrap()
    }

    pub fn conditional_supply(&self) -> u64 {
        self.program.supply_of(&self.conditional_asset()).unwrap()
    }

    pub fn deposited(&self, d: &Depositor) -> u64 {
        self.program.deposit_slip(&d.slip).unwrap().deposited_amount
    }

    pub fn balance(&self, account: &Address) -> u64 {
        self.program.balance_of(account).unwrap()
    }

    pub fn mint_accounts(&self, d: &Depositor, amount: u64) -> MintConditionalTokens {
        MintConditionalTokens {
            vault: self.vault,
            deposit_slip: d.slip,
            amount,
            user_underlying_account: d.underlying_account,
            vault_underlying_account: self.escrow(),
            conditional_asset: self.conditional_asset(),
            user_conditional_account: d.conditional_account,
        }
    }

    pub fn deposit(&self, d: &Depositor, amount: u64) -> VaultResult<()> {
        self.program
            .mint_conditional_tokens(&self.mint_accounts(d, amount), &d.key)
    }

    pub fn claim_accounts(&self, d: &Depositor) -> RedeemConditionalTokens {
        RedeemConditionalTokens {
            vault: self.vault,
            user_conditional_account: d.conditional_account,
            user_underlying_account: d.underlying_account,
            vault_underlying_account: self.escrow(),
            conditional_asset: self.conditional_asset(),
        }
    }

    pub fn slip_accounts(&self, d: &Depositor) -> RedeemDepositSlip {
        RedeemDepositSlip {
            vault: self.vault,
            deposit_slip: d.slip,
            user_underlying_account: d.underlying_account,
            vault_underlying_account: self.escrow(),
        }
    }
}
