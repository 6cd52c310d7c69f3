//! Scripted vault scenarios.
//!
//! A scenario is a JSON document describing assets, in-memory strategies
//! and a list of steps. Amounts are decimal strings in human units
//! (`"22.5"` DAI, `"0.1"` buffer) and are converted to native integers with
//! the asset's decimals. Accounts, assets and strategies are referred to by
//! name; names are hashed to addresses.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::VaultState;
use crate::error::Error;
use crate::oracle::FixedPriceOracle;
use crate::strategy::{InMemoryStrategy, Strategy, StrategyRef};
use crate::utils::address::Address;
use crate::utils::constants::VALUE_DECIMALS;
use crate::utils::math::{format_units, pow10};
use crate::vault::{Vault, VaultStatus};

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Scenario failures
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Scenario file could not be read
    #[error("Cannot read scenario: {0}")]
    Io(#[from] std::io::Error),

    /// Scenario file is not valid JSON
    #[error("Invalid scenario: {0}")]
    Parse(#[from] serde_json::Error),

    /// A name does not refer to a declared asset or strategy
    #[error("Unknown {kind}: {name}")]
    Unknown {
        /// "asset" or "strategy"
        kind: &'static str,
        /// Name used in the scenario
        name: String,
    },

    /// A decimal amount does not fit the target precision
    #[error("Invalid amount {amount}: {reason}")]
    Amount {
        /// Amount as written
        amount: String,
        /// Why it was rejected
        reason: String,
    },

    /// Setting up the vault failed
    #[error("Setup failed: {0}")]
    Setup(#[source] Error),

    /// A step failed unexpectedly
    #[error("Step {index} ({action}) failed: {source}")]
    Step {
        /// Zero-based step index
        index: usize,
        /// Step action
        action: String,
        /// Vault error
        #[source]
        source: Error,
    },

    /// A step expected to fail succeeded, or failed differently
    #[error("Step {index} ({action}): expected {expected}, got {actual}")]
    Expectation {
        /// Zero-based step index
        index: usize,
        /// Step action
        action: String,
        /// Expected error name
        expected: String,
        /// What happened instead
        actual: String,
    },
}

/// Scenario result type
pub type ScenarioResult<T> = Result<T, ScenarioError>;

// ═══════════════════════════════════════════════════════════════════════════════
// SCENARIO DOCUMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// A scripted run against a fresh vault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Governor name
    #[serde(default = "default_governor")]
    pub governor: String,
    /// Initial parameters (defaults if absent)
    #[serde(default)]
    pub state: Option<VaultState>,
    /// Assets, in registry order
    pub assets: Vec<AssetSpec>,
    /// In-memory strategies, approved in order
    #[serde(default)]
    pub strategies: Vec<StrategySpec>,
    /// Steps to run
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

fn default_governor() -> String {
    "governor".into()
}

fn default_price() -> Decimal {
    Decimal::ONE
}

/// A supported asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSpec {
    /// Symbol, also the asset's name
    pub symbol: String,
    /// Native decimals
    pub decimals: u8,
    /// USD price
    #[serde(default = "default_price")]
    pub price: Decimal,
    /// Strategy that receives allocations
    #[serde(default)]
    pub default_strategy: Option<String>,
}

/// An in-memory strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySpec {
    /// Strategy name
    pub name: String,
    /// Asset symbols it accepts
    pub assets: Vec<String>,
}

/// One step plus an optional expected failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSpec {
    /// What to do
    #[serde(flatten)]
    pub step: Step,
    /// Error variant the step must fail with (e.g. `"BalanceNotZero"`)
    #[serde(default)]
    pub expect_error: Option<String>,
}

/// Scenario actions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Deposit an asset
    Mint {
        /// Depositor
        account: String,
        /// Asset symbol
        asset: String,
        /// Asset amount
        amount: Decimal,
        /// Minimum XUSD minted
        #[serde(default)]
        min_received: Option<Decimal>,
    },
    /// Redeem XUSD
    Redeem {
        /// Redeemer
        account: String,
        /// XUSD amount
        amount: Decimal,
        /// Minimum basket value
        #[serde(default)]
        min_received: Option<Decimal>,
    },
    /// Redeem an account's whole balance
    RedeemAll {
        /// Redeemer
        account: String,
    },
    /// Transfer XUSD
    Transfer {
        /// Sender
        from: String,
        /// Recipient
        to: String,
        /// XUSD amount
        amount: Decimal,
    },
    /// Opt an account into rebasing
    OptIn {
        /// Account
        account: String,
    },
    /// Opt an account out of rebasing
    OptOut {
        /// Account
        account: String,
    },
    /// Run an allocation pass
    Allocate,
    /// Rebase
    Rebase,
    /// Credit yield to a strategy
    Accrue {
        /// Strategy name
        strategy: String,
        /// Asset symbol
        asset: String,
        /// Asset amount
        amount: Decimal,
    },
    /// Write a strategy position down
    Slash {
        /// Strategy name
        strategy: String,
        /// Asset symbol
        asset: String,
        /// Asset amount
        amount: Decimal,
    },
    /// Freeze or unfreeze a strategy position
    SetIlliquid {
        /// Strategy name
        strategy: String,
        /// Asset symbol
        asset: String,
        /// Whether withdrawals are blocked
        illiquid: bool,
    },
    /// Change an oracle price
    SetPrice {
        /// Asset symbol
        asset: String,
        /// USD price
        price: Decimal,
    },
    /// Governance: change the vault buffer
    SetVaultBuffer {
        /// Fraction, `0.1` = 10%
        buffer: Decimal,
    },
    /// Governance: change the max supply drift
    SetMaxSupplyDiff {
        /// Fraction, `0.05` = 5%
        diff: Decimal,
    },
    /// Governance: move funds between strategies
    Reallocate {
        /// Source strategy
        from: String,
        /// Target strategy
        to: String,
        /// Asset symbol
        asset: String,
        /// Asset amount
        amount: Decimal,
    },
    /// Governance: empty a strategy
    WithdrawAll {
        /// Strategy name
        strategy: String,
    },
    /// Governance: route an asset to a strategy (or none)
    SetDefaultStrategy {
        /// Asset symbol
        asset: String,
        /// Strategy name
        #[serde(default)]
        strategy: Option<String>,
    },
    /// Governance: remove a strategy
    RemoveStrategy {
        /// Strategy name
        strategy: String,
    },
    /// Governance: pause mint and redeem
    PauseCapital,
    /// Governance: resume mint and redeem
    UnpauseCapital,
}

impl Step {
    /// Action name as written in the scenario
    pub fn action(&self) -> &'static str {
        match self {
            Step::Mint { .. } => "mint",
            Step::Redeem { .. } => "redeem",
            Step::RedeemAll { .. } => "redeem_all",
            Step::Transfer { .. } => "transfer",
            Step::OptIn { .. } => "opt_in",
            Step::OptOut { .. } => "opt_out",
            Step::Allocate => "allocate",
            Step::Rebase => "rebase",
            Step::Accrue { .. } => "accrue",
            Step::Slash { .. } => "slash",
            Step::SetIlliquid { .. } => "set_illiquid",
            Step::SetPrice { .. } => "set_price",
            Step::SetVaultBuffer { .. } => "set_vault_buffer",
            Step::SetMaxSupplyDiff { .. } => "set_max_supply_diff",
            Step::Reallocate { .. } => "reallocate",
            Step::WithdrawAll { .. } => "withdraw_all",
            Step::SetDefaultStrategy { .. } => "set_default_strategy",
            Step::RemoveStrategy { .. } => "remove_strategy",
            Step::PauseCapital => "pause_capital",
            Step::UnpauseCapital => "unpause_capital",
        }
    }
}

impl Scenario {
    /// Load a scenario from a JSON file
    pub fn load(path: &Path) -> ScenarioResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Parse a scenario from JSON text
    pub fn from_json(json: &str) -> ScenarioResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty JSON
    pub fn to_json(&self) -> ScenarioResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REPORT
// ═══════════════════════════════════════════════════════════════════════════════

/// What one step did
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// Zero-based index
    pub index: usize,
    /// Step action
    pub action: String,
    /// Human-readable result
    pub outcome: String,
}

/// Result of a full run
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// Per-step results
    pub steps: Vec<StepRecord>,
    /// Vault status after the last step
    pub status: VaultStatus,
    /// Hash of the final vault snapshot
    pub state_hash: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RUNNER
// ═══════════════════════════════════════════════════════════════════════════════

/// Runs a scenario against a fresh vault
#[derive(Debug)]
pub struct ScenarioRunner {
    vault: Vault,
    governor: Address,
    oracle: Arc<FixedPriceOracle>,
    assets: BTreeMap<String, (Address, u8)>,
    strategies: BTreeMap<String, Arc<InMemoryStrategy>>,
}

impl ScenarioRunner {
    /// Build the vault, assets and strategies a scenario declares
    pub fn new(scenario: &Scenario) -> ScenarioResult<Self> {
        let governor = Address::from_label(&scenario.governor);
        let vault_address = Address::from_label(&format!("{}-vault", scenario.name));
        let oracle = Arc::new(FixedPriceOracle::new());

        let mut vault = Vault::with_state(
            vault_address,
            governor,
            oracle.clone(),
            scenario.state.clone().unwrap_or_default(),
        )
        .map_err(ScenarioError::Setup)?;

        let mut assets = BTreeMap::new();
        for spec in &scenario.assets {
            let address = Address::from_label(&spec.symbol);
            let price = decimal_to_units(spec.price, VALUE_DECIMALS)?;
            oracle.set_price(address, price).map_err(ScenarioError::Setup)?;
            vault
                .support_asset(&governor, address, &spec.symbol, spec.decimals)
                .map_err(ScenarioError::Setup)?;
            assets.insert(spec.symbol.clone(), (address, spec.decimals));
        }

        let mut strategies = BTreeMap::new();
        for spec in &scenario.strategies {
            let accepted = spec
                .assets
                .iter()
                .map(|symbol| lookup_asset(&assets, symbol).map(|(a, _)| a))
                .collect::<ScenarioResult<Vec<_>>>()?;
            let strategy = Arc::new(InMemoryStrategy::new(
                Address::from_label(&spec.name),
                vault_address,
                accepted,
            ));
            let strategy_ref: StrategyRef = strategy.clone();
            vault
                .approve_strategy(&governor, strategy_ref)
                .map_err(ScenarioError::Setup)?;
            strategies.insert(spec.name.clone(), strategy);
        }

        let mut runner = Self {
            vault,
            governor,
            oracle,
            assets,
            strategies,
        };
        for spec in &scenario.assets {
            if let Some(name) = &spec.default_strategy {
                let asset = runner.asset(&spec.symbol)?.0;
                let strategy = runner.strategy(name)?.id();
                runner
                    .vault
                    .set_asset_default_strategy(&governor, &asset, Some(&strategy))
                    .map_err(ScenarioError::Setup)?;
            }
        }

        info!(
            scenario = %scenario.name,
            assets = runner.assets.len(),
            strategies = runner.strategies.len(),
            "scenario ready"
        );
        Ok(runner)
    }

    /// Vault under test
    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Run every step and report the final state
    pub fn run(mut self, scenario: &Scenario) -> ScenarioResult<ScenarioReport> {
        let mut steps = Vec::new();
        for (index, spec) in scenario.steps.iter().enumerate() {
            let action = spec.step.action().to_string();
            let result = self.apply(&spec.step)?;

            let outcome = match (result, &spec.expect_error) {
                (Ok(outcome), None) => outcome,
                (Err(source), None) => {
                    return Err(ScenarioError::Step {
                        index,
                        action,
                        source,
                    })
                }
                (Ok(outcome), Some(expected)) => {
                    return Err(ScenarioError::Expectation {
                        index,
                        action,
                        expected: expected.clone(),
                        actual: format!("success ({})", outcome),
                    })
                }
                (Err(err), Some(expected)) => {
                    let actual = error_name(&err);
                    if actual != *expected {
                        return Err(ScenarioError::Expectation {
                            index,
                            action,
                            expected: expected.clone(),
                            actual,
                        });
                    }
                    format!("failed as expected: {}", err)
                }
            };

            debug!(index, action = %action, outcome = %outcome, "step done");
            steps.push(StepRecord {
                index,
                action,
                outcome,
            });
        }

        let status = self.vault.status().map_err(ScenarioError::Setup)?;
        let state_hash = self
            .vault
            .state_hash()
            .map_err(ScenarioError::Setup)?
            .to_hex();
        Ok(ScenarioReport {
            name: scenario.name.clone(),
            steps,
            status,
            state_hash,
        })
    }

    /// Apply one step. The outer result carries scenario errors (bad names,
    /// bad amounts); the inner one carries the vault's answer.
    fn apply(&mut self, step: &Step) -> ScenarioResult<Result<String, Error>> {
        let governor = self.governor;
        Ok(match step {
            Step::Mint {
                account,
                asset,
                amount,
                min_received,
            } => {
                let (asset, decimals) = self.asset(asset)?;
                let amount = decimal_to_units(*amount, decimals)?;
                let min = optional_value(*min_received)?;
                self.vault
                    .mint(&Address::from_label(account), &asset, amount, min)
                    .map(|minted| format!("minted {} XUSD", format_units(minted, 18)))
            }
            Step::Redeem {
                account,
                amount,
                min_received,
            } => {
                let amount = decimal_to_units(*amount, VALUE_DECIMALS)?;
                let min = optional_value(*min_received)?;
                self.vault
                    .redeem(&Address::from_label(account), amount, min)
                    .map(|out| format!("redeemed for {} USD", format_units(out.value, 18)))
            }
            Step::RedeemAll { account } => self
                .vault
                .redeem_all(&Address::from_label(account), 0)
                .map(|out| {
                    format!(
                        "redeemed {} XUSD for {} USD",
                        format_units(out.amount, 18),
                        format_units(out.value, 18)
                    )
                }),
            Step::Transfer { from, to, amount } => {
                let amount = decimal_to_units(*amount, VALUE_DECIMALS)?;
                self.vault
                    .transfer(&Address::from_label(from), &Address::from_label(to), amount)
                    .map(|()| "transferred".to_string())
            }
            Step::OptIn { account } => self
                .vault
                .rebase_opt_in(&Address::from_label(account))
                .map(|()| "opted in".to_string()),
            Step::OptOut { account } => self
                .vault
                .rebase_opt_out(&Address::from_label(account))
                .map(|()| "opted out".to_string()),
            Step::Allocate => self
                .vault
                .allocate()
                .map(|out| format!("{} moves", out.moves.len())),
            Step::Rebase => self.vault.rebase().map(|out| format!("{:?}", out)),
            Step::Accrue {
                strategy,
                asset,
                amount,
            } => {
                let (asset, decimals) = self.asset(asset)?;
                let amount = decimal_to_units(*amount, decimals)?;
                self.strategy(strategy)?
                    .accrue(&asset, amount)
                    .map(|()| "accrued".to_string())
            }
            Step::Slash {
                strategy,
                asset,
                amount,
            } => {
                let (asset, decimals) = self.asset(asset)?;
                let amount = decimal_to_units(*amount, decimals)?;
                self.strategy(strategy)?
                    .slash(&asset, amount)
                    .map(|()| "slashed".to_string())
            }
            Step::SetIlliquid {
                strategy,
                asset,
                illiquid,
            } => {
                let (asset, _) = self.asset(asset)?;
                self.strategy(strategy)?
                    .set_illiquid(&asset, *illiquid)
                    .map(|()| format!("illiquid = {}", illiquid))
            }
            Step::SetPrice { asset, price } => {
                let (asset, _) = self.asset(asset)?;
                let price = decimal_to_units(*price, VALUE_DECIMALS)?;
                self.oracle
                    .set_price(asset, price)
                    .map(|()| "price set".to_string())
            }
            Step::SetVaultBuffer { buffer } => {
                let buffer = decimal_to_units(*buffer, VALUE_DECIMALS)?;
                self.vault
                    .set_vault_buffer(&governor, buffer)
                    .map(|()| "buffer set".to_string())
            }
            Step::SetMaxSupplyDiff { diff } => {
                let diff = decimal_to_units(*diff, VALUE_DECIMALS)?;
                self.vault
                    .set_max_supply_diff(&governor, diff)
                    .map(|()| "max supply diff set".to_string())
            }
            Step::Reallocate {
                from,
                to,
                asset,
                amount,
            } => {
                let (asset, decimals) = self.asset(asset)?;
                let amount = decimal_to_units(*amount, decimals)?;
                let from = Address::from_label(from);
                let to = Address::from_label(to);
                self.vault
                    .reallocate(&governor, &from, &to, &[asset], &[amount])
                    .map(|()| "reallocated".to_string())
            }
            Step::WithdrawAll { strategy } => self
                .vault
                .withdraw_all_from_strategy(&governor, &Address::from_label(strategy))
                .map(|paid| format!("{} assets returned", paid.len())),
            Step::SetDefaultStrategy { asset, strategy } => {
                let (asset, _) = self.asset(asset)?;
                let strategy = strategy.as_deref().map(Address::from_label);
                self.vault
                    .set_asset_default_strategy(&governor, &asset, strategy.as_ref())
                    .map(|()| "default strategy set".to_string())
            }
            Step::RemoveStrategy { strategy } => self
                .vault
                .remove_strategy(&governor, &Address::from_label(strategy))
                .map(|()| "strategy removed".to_string()),
            Step::PauseCapital => self
                .vault
                .pause_capital(&governor)
                .map(|()| "capital paused".to_string()),
            Step::UnpauseCapital => self
                .vault
                .unpause_capital(&governor)
                .map(|()| "capital unpaused".to_string()),
        })
    }

    fn asset(&self, symbol: &str) -> ScenarioResult<(Address, u8)> {
        lookup_asset(&self.assets, symbol)
    }

    fn strategy(&self, name: &str) -> ScenarioResult<&Arc<InMemoryStrategy>> {
        self.strategies.get(name).ok_or_else(|| ScenarioError::Unknown {
            kind: "strategy",
            name: name.to_string(),
        })
    }
}

/// Load and run a scenario in one go
pub fn run_scenario(scenario: &Scenario) -> ScenarioResult<ScenarioReport> {
    ScenarioRunner::new(scenario)?.run(scenario)
}

fn lookup_asset(
    assets: &BTreeMap<String, (Address, u8)>,
    symbol: &str,
) -> ScenarioResult<(Address, u8)> {
    assets.get(symbol).copied().ok_or_else(|| ScenarioError::Unknown {
        kind: "asset",
        name: symbol.to_string(),
    })
}

fn optional_value(amount: Option<Decimal>) -> ScenarioResult<u128> {
    amount.map_or(Ok(0), |a| decimal_to_units(a, VALUE_DECIMALS))
}

/// Variant name of an error, e.g. `BalanceNotZero`
pub fn error_name(err: &Error) -> String {
    let debug = format!("{:?}", err);
    debug
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Convert a human amount to native units, truncating extra precision
pub fn decimal_to_units(amount: Decimal, decimals: u8) -> ScenarioResult<u128> {
    let invalid = |reason: &str| ScenarioError::Amount {
        amount: amount.to_string(),
        reason: reason.to_string(),
    };
    if amount.is_sign_negative() {
        return Err(invalid("negative"));
    }

    let mantissa = u128::try_from(amount.mantissa()).map_err(|_| invalid("out of range"))?;
    let scale = amount.scale();
    let decimals = u32::from(decimals);

    let units = if scale <= decimals {
        let factor = pow10((decimals - scale) as u8).map_err(|_| invalid("too many decimals"))?;
        mantissa.checked_mul(factor)
    } else {
        let factor = pow10((scale - decimals) as u8).map_err(|_| invalid("too many decimals"))?;
        Some(mantissa / factor)
    };
    units.ok_or_else(|| invalid("overflow"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// SAMPLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Scenario written by `xusd init`: buffer allocation, yield and a strategy swap
pub fn sample_scenario() -> ScenarioResult<Scenario> {
    let json = r#"{
  "name": "sample",
  "state": {
    "vault_buffer": 100000000000000000,
    "auto_allocate_threshold": 25000000000000000000000,
    "rebase_threshold": 1000000000000000000000,
    "redeem_fee_bps": 50,
    "trustee_fee_bps": 0,
    "trustee_address": null,
    "max_supply_diff": 0,
    "capital_paused": false,
    "rebase_paused": false
  },
  "assets": [
    { "symbol": "DAI", "decimals": 18, "default_strategy": "compound" },
    { "symbol": "USDC", "decimals": 6, "price": "1" }
  ],
  "strategies": [
    { "name": "compound", "assets": ["DAI", "USDC"] },
    { "name": "aave", "assets": ["DAI"] }
  ],
  "steps": [
    { "action": "mint", "account": "alice", "asset": "DAI", "amount": "200" },
    { "action": "mint", "account": "bob", "asset": "DAI", "amount": "22" },
    { "action": "allocate" },
    { "action": "accrue", "strategy": "compound", "asset": "DAI", "amount": "2" },
    { "action": "rebase" },
    { "action": "remove_strategy", "strategy": "compound", "expect_error": "BalanceNotZero" },
    { "action": "reallocate", "from": "compound", "to": "aave", "asset": "DAI", "amount": "100" },
    { "action": "redeem", "account": "bob", "amount": "10" }
  ]
}"#;
    Scenario::from_json(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::SCALE;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_decimal_to_units() {
        assert_eq!(decimal_to_units(dec("22.2"), 18).unwrap(), 222 * SCALE / 10);
        assert_eq!(decimal_to_units(dec("5004"), 6).unwrap(), 5_004_000_000);
        assert_eq!(decimal_to_units(dec("1.2345678"), 6).unwrap(), 1_234_567);
        assert!(decimal_to_units(dec("-1"), 18).is_err());
    }

    #[test]
    fn test_error_name() {
        assert_eq!(error_name(&Error::CapitalPaused), "CapitalPaused");
        assert_eq!(
            error_name(&Error::NotGovernor(Address::from_label("x"))),
            "NotGovernor"
        );
        assert_eq!(
            error_name(&Error::Slippage {
                minimum: 2,
                actual: 1
            }),
            "Slippage"
        );
    }

    #[test]
    fn test_sample_scenario_runs() {
        let scenario = sample_scenario().unwrap();
        assert_eq!(scenario.steps.len(), 8);

        let report = run_scenario(&scenario).unwrap();
        assert_eq!(report.steps.len(), 8);
        assert!(report.steps[5].outcome.starts_with("failed as expected"));
        assert!(report.status.total_supply > 0);
        assert_eq!(report.state_hash.len(), 64);
    }

    #[test]
    fn test_declared_default_strategy_receives_allocation() {
        let json = r#"{
            "name": "routing",
            "assets": [{ "symbol": "DAI", "decimals": 18, "default_strategy": "compound" }],
            "strategies": [{ "name": "compound", "assets": ["DAI"] }],
            "steps": [
                { "action": "mint", "account": "alice", "asset": "DAI", "amount": "100" },
                { "action": "allocate" }
            ]
        }"#;
        let scenario = Scenario::from_json(json).unwrap();
        let report = run_scenario(&scenario).unwrap();

        let compound = Address::from_label("compound");
        assert_eq!(report.status.assets[0].default_strategy, Some(compound));
        assert_eq!(report.status.strategies[0].id, compound);
        assert_eq!(report.status.assets[0].vault_balance, 0);
        assert_eq!(report.status.strategies[0].balances[0].1, 100 * SCALE);
    }

    #[test]
    fn test_unexpected_error_reports_step() {
        let json = r#"{
            "name": "bad",
            "assets": [{ "symbol": "DAI", "decimals": 18 }],
            "steps": [{ "action": "redeem", "account": "alice", "amount": "1" }]
        }"#;
        let scenario = Scenario::from_json(json).unwrap();
        match run_scenario(&scenario) {
            Err(ScenarioError::Step { index, action, .. }) => {
                assert_eq!(index, 0);
                assert_eq!(action, "redeem");
            }
            other => panic!("unexpected: {:?}", other.map(|r| r.name)),
        }
    }

    #[test]
    fn test_unknown_asset() {
        let json = r#"{
            "name": "bad",
            "assets": [],
            "steps": [{ "action": "mint", "account": "a", "asset": "FOO", "amount": "1" }]
        }"#;
        let scenario = Scenario::from_json(json).unwrap();
        assert!(matches!(
            run_scenario(&scenario),
            Err(ScenarioError::Unknown { kind: "asset", .. })
        ));
    }
}
