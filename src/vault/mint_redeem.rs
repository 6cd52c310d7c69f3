//! Minting receipt tokens against deposits and redeeming them for a basket.

use serde::Serialize;
use tracing::{debug, info};

use super::journal::MoveJournal;
use super::Vault;
use crate::error::{Error, Result};
use crate::events::VaultEvent;
use crate::strategy::StrategyRef;
use crate::utils::address::Address;
use crate::utils::math::{apply_price, bps_of, mul_div, safe_add};
use crate::utils::validation::{validate_min_received, validate_non_zero};

/// Result of a redemption
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedeemOutcome {
    /// Receipt tokens burned
    pub amount: u128,
    /// Part of `amount` kept in the vault as yield
    pub fee: u128,
    /// Basket paid out, native units per asset in registry order
    pub outputs: Vec<(Address, u128)>,
    /// Basket value at redeem prices, 18 decimals
    pub value: u128,
}

impl Vault {
    // ═══════════════════════════════════════════════════════════════════════════
    // MINT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Deposit `amount` of `asset` and mint receipt tokens to `caller`.
    /// Returns the amount minted.
    pub fn mint(
        &mut self,
        caller: &Address,
        asset: &Address,
        amount: u128,
        min_received: u128,
    ) -> Result<u128> {
        self.transact("mint", |vault, journal| {
            vault.mint_inner(journal, caller, asset, amount, min_received)
        })
    }

    fn mint_inner(
        &mut self,
        journal: &mut MoveJournal,
        caller: &Address,
        asset: &Address,
        amount: u128,
        min_received: u128,
    ) -> Result<u128> {
        if self.ledger.state.capital_paused {
            return Err(Error::CapitalPaused);
        }
        let decimals = self.ledger.assets.supported(asset)?.decimals;
        validate_non_zero(amount)?;

        let price = self.price_usd_mint(asset)?;
        let received = apply_price(amount, decimals, price)?;
        validate_non_zero(received)?;
        validate_min_received(received, min_received)?;

        // A large mint rebases first so the new tokens do not share
        // yield earned before they existed
        if received > self.ledger.state.rebase_threshold {
            self.rebase_inner()?;
        }

        self.credit_holdings(asset, amount)?;
        self.ledger.token.mint(*caller, received)?;
        self.emit(VaultEvent::Mint {
            account: *caller,
            asset: *asset,
            amount,
            minted: received,
        });
        info!(account = %caller.short(), asset = %asset.short(), amount, minted = received, "mint");

        self.auto_allocate(journal)?;
        Ok(received)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // REDEEM
    // ═══════════════════════════════════════════════════════════════════════════

    /// Burn `amount` receipt tokens for a proportional basket
    pub fn redeem(
        &mut self,
        caller: &Address,
        amount: u128,
        min_received: u128,
    ) -> Result<RedeemOutcome> {
        self.transact("redeem", |vault, journal| {
            vault.redeem_inner(journal, caller, amount, min_received, false)
        })
    }

    /// Burn the caller's entire balance, leaving no residual credits
    pub fn redeem_all(&mut self, caller: &Address, min_received: u128) -> Result<RedeemOutcome> {
        self.transact("redeem_all", |vault, journal| {
            let amount = vault.ledger.token.balance_of(caller);
            vault.redeem_inner(journal, caller, amount, min_received, true)
        })
    }

    /// Basket `amount` receipt tokens would redeem for, after the fee
    pub fn calculate_redeem_outputs(&self, amount: u128) -> Result<Vec<(Address, u128)>> {
        let fee = bps_of(amount, self.ledger.state.redeem_fee_bps)?;
        self.basket_for(amount - fee)
    }

    fn basket_for(&self, net: u128) -> Result<Vec<(Address, u128)>> {
        let total_value = self.total_value()?;
        let mut outputs = Vec::new();
        for asset in self.ledger.assets.list_supported() {
            let output = if total_value == 0 {
                0
            } else {
                mul_div(self.check_balance(&asset.address)?, net, total_value)?
            };
            outputs.push((asset.address, output));
        }
        Ok(outputs)
    }

    fn redeem_inner(
        &mut self,
        journal: &mut MoveJournal,
        caller: &Address,
        amount: u128,
        min_received: u128,
        full_exit: bool,
    ) -> Result<RedeemOutcome> {
        if self.ledger.state.capital_paused {
            return Err(Error::CapitalPaused);
        }
        validate_non_zero(amount)?;

        let available = self.ledger.token.balance_of(caller);
        if available < amount {
            return Err(Error::InsufficientBalance {
                required: amount,
                available,
            });
        }

        let fee = bps_of(amount, self.ledger.state.redeem_fee_bps)?;
        let outputs = self.basket_for(amount - fee)?;

        let mut value = 0u128;
        for (address, output) in &outputs {
            let asset = self.ledger.assets.supported(address)?;
            value = safe_add(value, self.value_of(asset, *output)?)?;
        }
        validate_min_received(value, min_received)?;

        for (asset, output) in &outputs {
            if *output == 0 {
                continue;
            }
            self.source_liquidity(journal, asset, *output)?;
            self.debit_holdings(asset, *output)?;
        }

        if full_exit {
            self.ledger.token.burn_all(*caller)?;
        } else {
            self.ledger.token.burn(*caller, amount)?;
        }

        self.emit(VaultEvent::Redeem {
            account: *caller,
            amount,
            fee,
            outputs: outputs.clone(),
        });
        info!(account = %caller.short(), amount, fee, value, "redeem");

        Ok(RedeemOutcome {
            amount,
            fee,
            outputs,
            value,
        })
    }

    /// Make sure the vault holds `required` of `asset`, withdrawing the
    /// shortfall from the default strategy first, then from any other
    /// approved strategy that supports the asset
    fn source_liquidity(
        &mut self,
        journal: &mut MoveJournal,
        asset: &Address,
        required: u128,
    ) -> Result<()> {
        let held = self.vault_balance(asset);
        if held >= required {
            return Ok(());
        }
        let mut shortfall = required - held;

        let default = self
            .ledger
            .assets
            .get(asset)
            .and_then(|a| a.default_strategy);
        let mut sources: Vec<StrategyRef> = Vec::new();
        if let Some(strategy) = default.as_ref().and_then(|id| self.ledger.strategies.get(id)) {
            sources.push(strategy.clone());
        }
        sources.extend(
            self.ledger
                .strategies
                .supporting(asset)
                .filter(|s| Some(s.id()) != default)
                .cloned(),
        );

        for strategy in sources {
            if shortfall == 0 {
                break;
            }
            let take = strategy.liquid_balance(asset)?.min(shortfall);
            if take == 0 {
                continue;
            }
            self.withdraw_from_strategy(journal, &strategy, asset, take)?;
            self.emit(VaultEvent::StrategyWithdrawal {
                strategy: strategy.id(),
                asset: *asset,
                amount: take,
            });
            debug!(strategy = %strategy.id().short(), asset = %asset.short(), take, "sourced liquidity");
            shortfall -= take;
        }

        if shortfall > 0 {
            return Err(Error::InsufficientLiquidity {
                asset: *asset,
                required,
                available: required - shortfall,
            });
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TOKEN OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Transfer receipt tokens
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<()> {
        self.transact("transfer", |vault, _| {
            vault.ledger.token.transfer(*from, *to, amount)?;
            vault.emit(VaultEvent::Transfer {
                from: *from,
                to: *to,
                amount,
            });
            Ok(())
        })
    }

    /// Start receiving rebases
    pub fn rebase_opt_in(&mut self, account: &Address) -> Result<()> {
        self.transact("rebase_opt_in", |vault, _| {
            vault.ledger.token.rebase_opt_in(*account)?;
            vault.emit(VaultEvent::RebaseOptIn { account: *account });
            Ok(())
        })
    }

    /// Freeze the current balance and stop receiving rebases
    pub fn rebase_opt_out(&mut self, account: &Address) -> Result<()> {
        self.transact("rebase_opt_out", |vault, _| {
            vault.ledger.token.rebase_opt_out(*account)?;
            vault.emit(VaultEvent::RebaseOptOut { account: *account });
            Ok(())
        })
    }
}
