//! The XUSD vault.
//!
//! `Vault` owns every piece of mutable protocol state (parameters, both
//! registries, vault-held balances, the receipt token and the event log)
//! in a single `Ledger`. Strategies and the oracle are shared collaborators.
//!
//! ## Atomicity
//!
//! Every mutating operation runs inside `transact`: the ledger is
//! snapshotted, strategy movements are journaled, and on failure the
//! journal is unwound in reverse before the snapshot is restored. A failed
//! call therefore leaves no trace, not even an event.
//!
//! ## Price basis
//!
//! Deposits are valued at the oracle's mint price. Everything else (total
//! value, buffer targets, rebases, redemption baskets and their slippage
//! checks) uses the redeem price.

pub mod allocation;
pub mod governance;
pub mod handle;
pub mod journal;
pub mod mint_redeem;
pub mod rebase;
pub mod status;

pub use allocation::{AllocationMove, AllocationOutcome};
pub use handle::VaultHandle;
pub use mint_redeem::RedeemOutcome;
pub use rebase::{RebaseOutcome, RebaseReport, SupplyChange};
pub use status::{AssetStatus, StrategyStatus, VaultSnapshot, VaultStatus};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::core::{Asset, AssetRegistry, ReceiptToken, VaultState};
use crate::error::{Error, Result};
use crate::events::{EventLog, VaultEvent};
use crate::oracle::PriceOracle;
use crate::strategy::{StrategyRef, StrategyRegistry};
use crate::utils::address::Address;
use crate::utils::math::{apply_price, safe_add, safe_sub};
use crate::utils::validation::validate_price;
use journal::MoveJournal;

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER
// ═══════════════════════════════════════════════════════════════════════════════

/// All state a failed operation must be able to restore
#[derive(Debug, Clone)]
pub(crate) struct Ledger {
    pub(crate) governor: Address,
    pub(crate) state: VaultState,
    pub(crate) assets: AssetRegistry,
    pub(crate) strategies: StrategyRegistry,
    /// Vault-held balances, native units
    pub(crate) holdings: BTreeMap<Address, u128>,
    pub(crate) token: ReceiptToken,
    pub(crate) events: EventLog,
}

// ═══════════════════════════════════════════════════════════════════════════════
// VAULT
// ═══════════════════════════════════════════════════════════════════════════════

/// Multi-asset vault backing the XUSD receipt token
pub struct Vault {
    address: Address,
    oracle: Arc<dyn PriceOracle>,
    pub(crate) ledger: Ledger,
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault")
            .field("address", &self.address)
            .field("governor", &self.ledger.governor)
            .field("assets", &self.ledger.assets.count())
            .field("strategies", &self.ledger.strategies.count())
            .field("total_supply", &self.ledger.token.total_supply())
            .finish()
    }
}

impl Vault {
    /// Create a vault with default parameters
    pub fn new(address: Address, governor: Address, oracle: Arc<dyn PriceOracle>) -> Self {
        Self {
            address,
            oracle,
            ledger: Ledger {
                governor,
                state: VaultState::default(),
                assets: AssetRegistry::new(),
                strategies: StrategyRegistry::new(),
                holdings: BTreeMap::new(),
                token: ReceiptToken::new(),
                events: EventLog::new(),
            },
        }
    }

    /// Create a vault with the given parameters
    pub fn with_state(
        address: Address,
        governor: Address,
        oracle: Arc<dyn PriceOracle>,
        state: VaultState,
    ) -> Result<Self> {
        state.validate()?;
        let mut vault = Self::new(address, governor, oracle);
        vault.ledger.state = state;
        Ok(vault)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Vault address; strategies pay out to it
    pub fn address(&self) -> Address {
        self.address
    }

    /// Current governor
    pub fn governor(&self) -> Address {
        self.ledger.governor
    }

    /// Current parameters
    pub fn state(&self) -> &VaultState {
        &self.ledger.state
    }

    /// Receipt token ledger
    pub fn token(&self) -> &ReceiptToken {
        &self.ledger.token
    }

    /// Asset registry
    pub fn assets(&self) -> &AssetRegistry {
        &self.ledger.assets
    }

    /// Strategy registry
    pub fn strategies(&self) -> &StrategyRegistry {
        &self.ledger.strategies
    }

    /// Recent events
    pub fn events(&self) -> &EventLog {
        &self.ledger.events
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Receipt token balance of an account
    pub fn balance_of(&self, account: &Address) -> u128 {
        self.ledger.token.balance_of(account)
    }

    /// Receipt token supply
    pub fn total_supply(&self) -> u128 {
        self.ledger.token.total_supply()
    }

    /// Amount of `asset` held directly by the vault, native units
    pub fn vault_balance(&self, asset: &Address) -> u128 {
        self.ledger.holdings.get(asset).copied().unwrap_or(0)
    }

    /// Vault-held plus every approved strategy's position, native units
    pub fn check_balance(&self, asset: &Address) -> Result<u128> {
        let mut balance = self.vault_balance(asset);
        for strategy in self.ledger.strategies.supporting(asset) {
            balance = safe_add(balance, strategy.check_balance(asset)?)?;
        }
        Ok(balance)
    }

    /// Total backing value, 18-decimal USD at redeem prices
    pub fn total_value(&self) -> Result<u128> {
        let mut total = 0u128;
        for asset in self.ledger.assets.list_supported() {
            let balance = self.check_balance(&asset.address)?;
            total = safe_add(total, self.value_of(asset, balance)?)?;
        }
        Ok(total)
    }

    /// Value held directly by the vault, 18-decimal USD at redeem prices
    pub fn vault_value(&self) -> Result<u128> {
        let mut total = 0u128;
        for asset in self.ledger.assets.list_supported() {
            let balance = self.vault_balance(&asset.address);
            total = safe_add(total, self.value_of(asset, balance)?)?;
        }
        Ok(total)
    }

    /// Validated mint price of an asset
    pub fn price_usd_mint(&self, asset: &Address) -> Result<u128> {
        validate_price(*asset, self.oracle.price_usd_mint(asset)?)
    }

    /// Validated redeem price of an asset
    pub fn price_usd_redeem(&self, asset: &Address) -> Result<u128> {
        validate_price(*asset, self.oracle.price_usd_redeem(asset)?)
    }

    /// Supported asset identifiers in registry order
    pub fn all_assets(&self) -> Vec<Address> {
        self.ledger
            .assets
            .list_supported()
            .map(|a| a.address)
            .collect()
    }

    /// Number of supported assets
    pub fn asset_count(&self) -> usize {
        self.ledger.assets.count()
    }

    /// Number of approved strategies
    pub fn strategy_count(&self) -> usize {
        self.ledger.strategies.count()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL
    // ═══════════════════════════════════════════════════════════════════════════

    /// Run `op` atomically: on error, unwind strategy moves and restore the ledger
    pub(crate) fn transact<T, F>(&mut self, operation: &'static str, op: F) -> Result<T>
    where
        F: FnOnce(&mut Self, &mut MoveJournal) -> Result<T>,
    {
        let snapshot = self.ledger.clone();
        let mut journal = MoveJournal::new(self.address);

        match op(self, &mut journal) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(
                    operation,
                    error = %err,
                    moves = journal.len(),
                    "operation failed, rolling back"
                );
                journal.unwind();
                self.ledger = snapshot;
                Err(err)
            }
        }
    }

    pub(crate) fn ensure_governor(&self, caller: &Address) -> Result<()> {
        if *caller != self.ledger.governor {
            return Err(Error::NotGovernor(*caller));
        }
        Ok(())
    }

    pub(crate) fn emit(&mut self, event: VaultEvent) {
        self.ledger.events.push(event);
    }

    /// Value of `amount` native units of `asset` at its redeem price
    pub(crate) fn value_of(&self, asset: &Asset, amount: u128) -> Result<u128> {
        if amount == 0 {
            return Ok(0);
        }
        let price = self.price_usd_redeem(&asset.address)?;
        apply_price(amount, asset.decimals, price)
    }

    pub(crate) fn credit_holdings(&mut self, asset: &Address, amount: u128) -> Result<()> {
        let held = self.ledger.holdings.entry(*asset).or_insert(0);
        *held = safe_add(*held, amount)?;
        Ok(())
    }

    pub(crate) fn debit_holdings(&mut self, asset: &Address, amount: u128) -> Result<()> {
        let held = self.vault_balance(asset);
        if held < amount {
            return Err(Error::InsufficientLiquidity {
                asset: *asset,
                required: amount,
                available: held,
            });
        }
        self.ledger.holdings.insert(*asset, safe_sub(held, amount)?);
        Ok(())
    }

    /// Move vault-held funds into a strategy
    pub(crate) fn deposit_to_strategy(
        &mut self,
        journal: &mut MoveJournal,
        strategy: &StrategyRef,
        asset: &Address,
        amount: u128,
    ) -> Result<()> {
        self.debit_holdings(asset, amount)?;
        strategy.deposit(asset, amount)?;
        journal.record_deposit(strategy, *asset, amount);
        Ok(())
    }

    /// Pull funds out of a strategy into vault-held balances
    pub(crate) fn withdraw_from_strategy(
        &mut self,
        journal: &mut MoveJournal,
        strategy: &StrategyRef,
        asset: &Address,
        amount: u128,
    ) -> Result<()> {
        strategy.withdraw(&self.address, asset, amount)?;
        journal.record_withdrawal(strategy, *asset, amount);
        self.credit_holdings(asset, amount)
    }
}
