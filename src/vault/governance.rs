//! Governor-only operations.
//!
//! Every call here checks the caller against the governor before doing
//! anything else and fails with `NotGovernor` otherwise.

use tracing::info;

use super::journal::MoveJournal;
use super::Vault;
use crate::core::VaultState;
use crate::error::{Error, Result};
use crate::events::VaultEvent;
use crate::strategy::StrategyRef;
use crate::utils::address::Address;
use crate::utils::math::{format_units, FixedPoint};
use crate::utils::validation::validate_address;

impl Vault {
    // ═══════════════════════════════════════════════════════════════════════════
    // ASSETS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Start accepting an asset
    pub fn support_asset(
        &mut self,
        caller: &Address,
        asset: Address,
        symbol: &str,
        decimals: u8,
    ) -> Result<()> {
        self.ensure_governor(caller)?;
        self.ledger.assets.support_asset(asset, symbol, decimals)?;
        self.emit(VaultEvent::AssetSupported {
            asset,
            symbol: symbol.to_string(),
            decimals,
        });
        info!(asset = %asset.short(), symbol, decimals, "asset supported");
        Ok(())
    }

    /// Stop accepting an asset. The vault and its strategies must hold none of it.
    pub fn remove_asset(&mut self, caller: &Address, asset: &Address) -> Result<()> {
        self.ensure_governor(caller)?;
        self.ledger.assets.supported(asset).map_err(|_| Error::UnknownAsset(*asset))?;

        let balance = self.check_balance(asset)?;
        if balance > 0 {
            return Err(Error::AssetBalanceNotZero {
                asset: *asset,
                balance,
            });
        }

        self.ledger.assets.remove_asset(asset)?;
        self.emit(VaultEvent::AssetRemoved { asset: *asset });
        info!(asset = %asset.short(), "asset removed");
        Ok(())
    }

    /// Route allocations of `asset` to an approved strategy, or stop routing
    pub fn set_asset_default_strategy(
        &mut self,
        caller: &Address,
        asset: &Address,
        strategy: Option<&Address>,
    ) -> Result<()> {
        self.ensure_governor(caller)?;
        let strategy = match strategy {
            Some(id) => Some(
                self.ledger
                    .strategies
                    .get(id)
                    .cloned()
                    .ok_or(Error::StrategyNotApproved(*id))?,
            ),
            None => None,
        };

        self.ledger
            .assets
            .set_default_strategy(asset, strategy.as_ref())?;
        let strategy = strategy.map(|s| s.id());
        self.emit(VaultEvent::AssetDefaultStrategyUpdated {
            asset: *asset,
            strategy,
        });
        info!(asset = %asset.short(), strategy = ?strategy, "default strategy updated");
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STRATEGIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Approve a strategy for allocation
    pub fn approve_strategy(&mut self, caller: &Address, strategy: StrategyRef) -> Result<()> {
        self.ensure_governor(caller)?;
        let id = strategy.id();
        self.ledger.strategies.approve(strategy)?;
        self.emit(VaultEvent::StrategyApproved { strategy: id });
        info!(strategy = %id.short(), "strategy approved");
        Ok(())
    }

    /// Remove an emptied strategy that no asset routes to
    pub fn remove_strategy(&mut self, caller: &Address, id: &Address) -> Result<()> {
        self.ensure_governor(caller)?;
        self.ledger.strategies.ensure_empty(id)?;
        if let Some(asset) = self.ledger.assets.defaults_to(id).next() {
            return Err(Error::StrategyIsDefault {
                strategy: *id,
                asset: asset.address,
            });
        }

        self.ledger.strategies.remove(id)?;
        self.emit(VaultEvent::StrategyRemoved { strategy: *id });
        info!(strategy = %id.short(), "strategy removed");
        Ok(())
    }

    /// Pull every position out of one strategy into the vault
    pub fn withdraw_all_from_strategy(
        &mut self,
        caller: &Address,
        id: &Address,
    ) -> Result<Vec<(Address, u128)>> {
        self.ensure_governor(caller)?;
        self.transact("withdraw_all_from_strategy", |vault, journal| {
            let strategy = vault
                .ledger
                .strategies
                .get(id)
                .cloned()
                .ok_or(Error::StrategyNotApproved(*id))?;
            vault.drain_strategy(journal, &strategy)
        })
    }

    /// Pull every position out of every approved strategy
    pub fn withdraw_all_from_strategies(
        &mut self,
        caller: &Address,
    ) -> Result<Vec<(Address, u128)>> {
        self.ensure_governor(caller)?;
        self.transact("withdraw_all_from_strategies", |vault, journal| {
            let strategies: Vec<StrategyRef> =
                vault.ledger.strategies.approved().cloned().collect();
            let mut paid = Vec::new();
            for strategy in &strategies {
                paid.extend(vault.drain_strategy(journal, strategy)?);
            }
            Ok(paid)
        })
    }

    fn drain_strategy(
        &mut self,
        journal: &mut MoveJournal,
        strategy: &StrategyRef,
    ) -> Result<Vec<(Address, u128)>> {
        let paid = strategy.withdraw_all(&self.address())?;
        for (asset, amount) in &paid {
            journal.record_withdrawal(strategy, *asset, *amount);
            self.credit_holdings(asset, *amount)?;
            self.emit(VaultEvent::StrategyWithdrawal {
                strategy: strategy.id(),
                asset: *asset,
                amount: *amount,
            });
        }
        info!(strategy = %strategy.id().short(), assets = paid.len(), "strategy drained");
        Ok(paid)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PARAMETERS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Set the vault buffer (1e18 = 100%)
    pub fn set_vault_buffer(&mut self, caller: &Address, buffer: u128) -> Result<()> {
        let shown = FixedPoint::from_raw(buffer).to_percent_string();
        self.update_state(caller, "vault_buffer", shown, |s| s.vault_buffer = buffer)
    }

    /// Set the auto-allocate threshold (18-decimal USD)
    pub fn set_auto_allocate_threshold(&mut self, caller: &Address, threshold: u128) -> Result<()> {
        let shown = format_units(threshold, 18);
        self.update_state(caller, "auto_allocate_threshold", shown, |s| {
            s.auto_allocate_threshold = threshold
        })
    }

    /// Set the rebase threshold (18-decimal USD)
    pub fn set_rebase_threshold(&mut self, caller: &Address, threshold: u128) -> Result<()> {
        let shown = format_units(threshold, 18);
        self.update_state(caller, "rebase_threshold", shown, |s| {
            s.rebase_threshold = threshold
        })
    }

    /// Set the redeem fee in basis points
    pub fn set_redeem_fee_bps(&mut self, caller: &Address, bps: u128) -> Result<()> {
        self.update_state(caller, "redeem_fee_bps", bps.to_string(), |s| {
            s.redeem_fee_bps = bps
        })
    }

    /// Set the trustee fee in basis points
    pub fn set_trustee_fee_bps(&mut self, caller: &Address, bps: u128) -> Result<()> {
        self.update_state(caller, "trustee_fee_bps", bps.to_string(), |s| {
            s.trustee_fee_bps = bps
        })
    }

    /// Set (or clear) the trustee
    pub fn set_trustee_address(&mut self, caller: &Address, trustee: Option<Address>) -> Result<()> {
        let shown = trustee.map_or_else(|| "none".to_string(), |t| t.to_hex());
        self.update_state(caller, "trustee_address", shown, |s| {
            s.trustee_address = trustee
        })
    }

    /// Set the max supply drift (1e18 = 100%, 0 disables the check)
    pub fn set_max_supply_diff(&mut self, caller: &Address, diff: u128) -> Result<()> {
        let shown = FixedPoint::from_raw(diff).to_percent_string();
        self.update_state(caller, "max_supply_diff", shown, |s| s.max_supply_diff = diff)
    }

    /// Pause mint and redeem
    pub fn pause_capital(&mut self, caller: &Address) -> Result<()> {
        self.update_state(caller, "capital_paused", "true".into(), |s| {
            s.capital_paused = true
        })
    }

    /// Resume mint and redeem
    pub fn unpause_capital(&mut self, caller: &Address) -> Result<()> {
        self.update_state(caller, "capital_paused", "false".into(), |s| {
            s.capital_paused = false
        })
    }

    /// Pause rebasing
    pub fn pause_rebase(&mut self, caller: &Address) -> Result<()> {
        self.update_state(caller, "rebase_paused", "true".into(), |s| {
            s.rebase_paused = true
        })
    }

    /// Resume rebasing
    pub fn unpause_rebase(&mut self, caller: &Address) -> Result<()> {
        self.update_state(caller, "rebase_paused", "false".into(), |s| {
            s.rebase_paused = false
        })
    }

    /// Hand governance to a new address
    pub fn transfer_governance(&mut self, caller: &Address, governor: Address) -> Result<()> {
        self.ensure_governor(caller)?;
        validate_address(&governor, "governor")?;
        let previous = self.ledger.governor;
        self.ledger.governor = governor;
        self.emit(VaultEvent::GovernorChanged { previous, governor });
        info!(previous = %previous.short(), governor = %governor.short(), "governor changed");
        Ok(())
    }

    fn update_state<F>(&mut self, caller: &Address, name: &str, shown: String, apply: F) -> Result<()>
    where
        F: FnOnce(&mut VaultState),
    {
        self.ensure_governor(caller)?;
        let mut state = self.ledger.state.clone();
        apply(&mut state);
        state.validate()?;
        self.ledger.state = state;

        info!(parameter = name, value = %shown, "parameter updated");
        self.emit(VaultEvent::ParameterUpdated {
            name: name.to_string(),
            value: shown,
        });
        Ok(())
    }
}
