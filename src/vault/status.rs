//! Read-only views of the vault: a human-facing status report and a
//! serializable snapshot used for state hashing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Vault;
use crate::core::{AssetRegistry, ReceiptToken, VaultState};
use crate::error::{Error, Result};
use crate::utils::address::{Address, Hash};

// ═══════════════════════════════════════════════════════════════════════════════
// STATUS
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-asset view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetStatus {
    /// Token address
    pub address: Address,
    /// Ticker
    pub symbol: String,
    /// Native decimals
    pub decimals: u8,
    /// Held directly by the vault, native units
    pub vault_balance: u128,
    /// Vault plus strategies, native units
    pub total_balance: u128,
    /// `total_balance` at the redeem price, 18 decimals
    pub value: u128,
    /// Where allocation sends this asset
    pub default_strategy: Option<Address>,
}

/// Per-strategy positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyStatus {
    /// Strategy identifier
    pub id: Address,
    /// Position per supported asset, native units
    pub balances: Vec<(Address, u128)>,
}

/// Vault-wide view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultStatus {
    /// Backing value, 18 decimals
    pub total_value: u128,
    /// Receipt token supply
    pub total_supply: u128,
    /// Credits held by opted-in accounts
    pub rebasing_credits: u128,
    /// Supply held by opted-out accounts
    pub non_rebasing_supply: u128,
    /// Current rebasing rate
    pub credits_per_token: u128,
    /// Buffer fraction, 18 decimals
    pub vault_buffer: u128,
    /// Mint and allocate are blocked
    pub capital_paused: bool,
    /// Rebase is a no-op
    pub rebase_paused: bool,
    /// One entry per supported asset
    pub assets: Vec<AssetStatus>,
    /// One entry per approved strategy
    pub strategies: Vec<StrategyStatus>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SNAPSHOT
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything needed to compare two vaults for equality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    /// Vault address
    pub address: Address,
    /// Current governor
    pub governor: Address,
    /// Parameters
    pub state: VaultState,
    /// Supported assets
    pub assets: AssetRegistry,
    /// Strategy positions
    pub strategies: Vec<StrategyStatus>,
    /// Assets held directly by the vault
    pub holdings: BTreeMap<Address, u128>,
    /// Receipt token ledger
    pub token: ReceiptToken,
}

impl VaultSnapshot {
    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| Error::Deserialization(e.to_string()))
    }
}

impl Vault {
    /// Build a status report
    pub fn status(&self) -> Result<VaultStatus> {
        let mut assets = Vec::new();
        for asset in self.ledger.assets.list_supported() {
            let total_balance = self.check_balance(&asset.address)?;
            assets.push(AssetStatus {
                address: asset.address,
                symbol: asset.symbol.clone(),
                decimals: asset.decimals,
                vault_balance: self.vault_balance(&asset.address),
                total_balance,
                value: self.value_of(asset, total_balance)?,
                default_strategy: asset.default_strategy,
            });
        }

        let token = &self.ledger.token;
        Ok(VaultStatus {
            total_value: self.total_value()?,
            total_supply: token.total_supply(),
            rebasing_credits: token.rebasing_credits(),
            non_rebasing_supply: token.non_rebasing_supply(),
            credits_per_token: token.rebasing_credits_per_token(),
            vault_buffer: self.ledger.state.vault_buffer,
            capital_paused: self.ledger.state.capital_paused,
            rebase_paused: self.ledger.state.rebase_paused,
            assets,
            strategies: self.strategy_statuses()?,
        })
    }

    /// Capture the vault's state, including strategy positions
    pub fn snapshot(&self) -> Result<VaultSnapshot> {
        Ok(VaultSnapshot {
            address: self.address(),
            governor: self.ledger.governor,
            state: self.ledger.state.clone(),
            assets: self.ledger.assets.clone(),
            strategies: self.strategy_statuses()?,
            holdings: self.ledger.holdings.clone(),
            token: self.ledger.token.clone(),
        })
    }

    /// Hash of the snapshot
    pub fn state_hash(&self) -> Result<Hash> {
        Ok(Hash::sha256(&self.snapshot()?.to_bytes()?))
    }

    fn strategy_statuses(&self) -> Result<Vec<StrategyStatus>> {
        let mut statuses = Vec::new();
        for strategy in self.ledger.strategies.approved() {
            let mut balances = Vec::new();
            for asset in strategy.supported_assets() {
                balances.push((asset, strategy.check_balance(&asset)?));
            }
            statuses.push(StrategyStatus {
                id: strategy.id(),
                balances,
            });
        }
        Ok(statuses)
    }
}
