//! Vault events for state change notifications.
//!
//! Every successful state change appends an event to a bounded in-memory
//! log. Events appended by an operation that later fails are rolled back
//! with the rest of the vault state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::utils::address::Address;
use crate::utils::constants::MAX_EVENTS;

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// All vault event types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEvent {
    // Registry Events
    /// Asset became supported
    AssetSupported {
        /// Asset identifier
        asset: Address,
        /// Display symbol
        symbol: String,
        /// Native decimals
        decimals: u8,
    },
    /// Asset stopped being supported
    AssetRemoved {
        /// Asset identifier
        asset: Address,
    },
    /// Default strategy for an asset changed
    AssetDefaultStrategyUpdated {
        /// Asset identifier
        asset: Address,
        /// New default (None clears it)
        strategy: Option<Address>,
    },
    /// Strategy approved
    StrategyApproved {
        /// Strategy identifier
        strategy: Address,
    },
    /// Strategy removed
    StrategyRemoved {
        /// Strategy identifier
        strategy: Address,
    },

    // Capital Events
    /// Receipt tokens minted against a deposit
    Mint {
        /// Depositor
        account: Address,
        /// Deposited asset
        asset: Address,
        /// Deposited amount, native units
        amount: u128,
        /// Receipt tokens minted
        minted: u128,
    },
    /// Receipt tokens redeemed for a basket
    Redeem {
        /// Redeemer
        account: Address,
        /// Receipt tokens burned
        amount: u128,
        /// Part of `amount` kept as fee
        fee: u128,
        /// Basket paid out, native units per asset
        outputs: Vec<(Address, u128)>,
    },
    /// Receipt tokens moved between accounts
    Transfer {
        /// Sender
        from: Address,
        /// Recipient
        to: Address,
        /// Amount
        amount: u128,
    },

    // Allocation Events
    /// Vault-held funds deposited into a strategy
    Allocated {
        /// Target strategy
        strategy: Address,
        /// Asset moved
        asset: Address,
        /// Amount, native units
        amount: u128,
    },
    /// Funds withdrawn from a strategy back into the vault
    StrategyWithdrawal {
        /// Source strategy
        strategy: Address,
        /// Asset moved
        asset: Address,
        /// Amount, native units
        amount: u128,
    },
    /// Funds moved from one strategy to another
    Reallocated {
        /// Source strategy
        from: Address,
        /// Target strategy
        to: Address,
        /// Asset moved
        asset: Address,
        /// Amount, native units
        amount: u128,
    },

    // Rebase Events
    /// Credits per token changed
    Rebased {
        /// Rate before
        previous_credits_per_token: u128,
        /// Rate after
        credits_per_token: u128,
        /// Backing value the supply was set to
        total_value: u128,
    },
    /// Trustee fee minted
    TrusteeFeeMinted {
        /// Trustee
        trustee: Address,
        /// Fee, receipt token units
        amount: u128,
    },
    /// Account opted in to rebasing
    RebaseOptIn {
        /// Account
        account: Address,
    },
    /// Account opted out of rebasing
    RebaseOptOut {
        /// Account
        account: Address,
    },

    // Governance Events
    /// A vault parameter changed
    ParameterUpdated {
        /// Parameter name
        name: String,
        /// New value, rendered
        value: String,
    },
    /// Governor changed
    GovernorChanged {
        /// Previous governor
        previous: Address,
        /// New governor
        governor: Address,
    },
}

impl VaultEvent {
    /// Get event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            VaultEvent::AssetSupported { .. } => "AssetSupported",
            VaultEvent::AssetRemoved { .. } => "AssetRemoved",
            VaultEvent::AssetDefaultStrategyUpdated { .. } => "AssetDefaultStrategyUpdated",
            VaultEvent::StrategyApproved { .. } => "StrategyApproved",
            VaultEvent::StrategyRemoved { .. } => "StrategyRemoved",
            VaultEvent::Mint { .. } => "Mint",
            VaultEvent::Redeem { .. } => "Redeem",
            VaultEvent::Transfer { .. } => "Transfer",
            VaultEvent::Allocated { .. } => "Allocated",
            VaultEvent::StrategyWithdrawal { .. } => "StrategyWithdrawal",
            VaultEvent::Reallocated { .. } => "Reallocated",
            VaultEvent::Rebased { .. } => "Rebased",
            VaultEvent::TrusteeFeeMinted { .. } => "TrusteeFeeMinted",
            VaultEvent::RebaseOptIn { .. } => "RebaseOptIn",
            VaultEvent::RebaseOptOut { .. } => "RebaseOptOut",
            VaultEvent::ParameterUpdated { .. } => "ParameterUpdated",
            VaultEvent::GovernorChanged { .. } => "GovernorChanged",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// A logged event with its position and time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Monotonic sequence number
    pub sequence: u64,
    /// When the event was recorded
    pub timestamp: DateTime<Utc>,
    /// The event
    pub event: VaultEvent,
}

/// Bounded log of recent events
#[derive(Debug, Clone)]
pub struct EventLog {
    records: VecDeque<EventRecord>,
    next_sequence: u64,
    max_events: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self::with_capacity(MAX_EVENTS)
    }

    /// Create a log that keeps at most `max_events`
    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            records: VecDeque::new(),
            next_sequence: 0,
            max_events: max_events.max(1),
        }
    }

    /// Add an event (with pruning)
    pub fn push(&mut self, event: VaultEvent) {
        self.records.push_back(EventRecord {
            sequence: self.next_sequence,
            timestamp: Utc::now(),
            event,
        });
        self.next_sequence += 1;

        while self.records.len() > self.max_events {
            self.records.pop_front();
        }
    }

    /// Retained events, oldest first
    pub fn records(&self) -> impl Iterator<Item = &EventRecord> {
        self.records.iter()
    }

    /// The `n` most recent events, oldest first
    pub fn recent(&self, n: usize) -> Vec<&EventRecord> {
        let skip = self.records.len().saturating_sub(n);
        self.records.iter().skip(skip).collect()
    }

    /// Get events of a specific type
    pub fn filter_by_type(&self, event_type: &str) -> Vec<&VaultEvent> {
        self.records
            .iter()
            .map(|r| &r.event)
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Total events ever pushed, including pruned ones
    pub fn total_recorded(&self) -> u64 {
        self.next_sequence
    }

    /// Get the number of retained events
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
