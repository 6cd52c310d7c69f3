//! XUSD receipt token implementation.
//!
//! The receipt token is a rebasing ledger:
//! - Opted-in accounts hold *credits*; their balance is
//!   `credits * 1e18 / rebasing_credits_per_token`
//! - Opted-out accounts hold a frozen face value that no rebase touches
//! - A rebase only moves `rebasing_credits_per_token`, so every opted-in
//!   balance grows (or shrinks) by the same ratio at once

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::utils::address::{Address, Hash};
use crate::utils::constants::*;
use crate::utils::math::{mul_div, mul_div_up, safe_add, safe_sub};

// ═══════════════════════════════════════════════════════════════════════════════
// ACCOUNT HOLDINGS
// ═══════════════════════════════════════════════════════════════════════════════

/// Whether an account participates in rebases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebaseState {
    /// Balance follows the credits-per-token rate
    Rebasing,
    /// Balance is a fixed face value
    NonRebasing,
}

/// What an account holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Holding {
    /// Credits, converted to a balance at the current rate
    Rebasing {
        /// Credit units
        credits: u128,
    },
    /// Frozen face value
    NonRebasing {
        /// Balance in token units
        balance: u128,
    },
}

impl Default for Holding {
    fn default() -> Self {
        Holding::Rebasing { credits: 0 }
    }
}

impl Holding {
    /// Rebase participation of this holding
    pub fn state(&self) -> RebaseState {
        match self {
            Holding::Rebasing { .. } => RebaseState::Rebasing,
            Holding::NonRebasing { .. } => RebaseState::NonRebasing,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECEIPT TOKEN
// ═══════════════════════════════════════════════════════════════════════════════

/// The XUSD rebasing receipt token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptToken {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Decimal places
    pub decimals: u8,
    /// Sum of all opted-in accounts' credits
    rebasing_credits: u128,
    /// Credits per token, 18 decimals
    rebasing_credits_per_token: u128,
    /// Sum of all opted-out balances
    non_rebasing_supply: u128,
    /// Holdings by account
    accounts: BTreeMap<Address, Holding>,
}

impl Default for ReceiptToken {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptToken {
    /// Create an empty ledger at the initial rate
    pub fn new() -> Self {
        Self {
            name: TOKEN_NAME.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            decimals: TOKEN_DECIMALS,
            rebasing_credits: 0,
            rebasing_credits_per_token: INITIAL_CREDITS_PER_TOKEN,
            non_rebasing_supply: 0,
            accounts: BTreeMap::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SUPPLY
    // ═══════════════════════════════════════════════════════════════════════════

    /// `non_rebasing_supply + rebasing_credits / rebasing_credits_per_token`
    pub fn total_supply(&self) -> u128 {
        self.non_rebasing_supply
            .saturating_add(self.rebasing_supply())
    }

    /// Supply held by opted-in accounts
    pub fn rebasing_supply(&self) -> u128 {
        self.credits_to_balance(self.rebasing_credits)
    }

    /// Sum of all opted-in credits
    pub fn rebasing_credits(&self) -> u128 {
        self.rebasing_credits
    }

    /// Current credits per token
    pub fn rebasing_credits_per_token(&self) -> u128 {
        self.rebasing_credits_per_token
    }

    /// Sum of all opted-out balances
    pub fn non_rebasing_supply(&self) -> u128 {
        self.non_rebasing_supply
    }

    /// Whether a rebase to `new_total_supply` would leave anything for
    /// opted-in holders
    pub fn can_rebase_to(&self, new_total_supply: u128) -> bool {
        self.rebasing_credits > 0 && new_total_supply > self.non_rebasing_supply
    }

    /// Re-rate opted-in credits so that total supply becomes `new_total_supply`.
    ///
    /// Returns the new credits-per-token, or `None` when there is nothing
    /// to re-rate (no credits, or no supply left over for opted-in holders).
    pub(crate) fn change_supply(&mut self, new_total_supply: u128) -> Result<Option<u128>> {
        if !self.can_rebase_to(new_total_supply) {
            return Ok(None);
        }
        let rebasing_target = new_total_supply - self.non_rebasing_supply;
        // round the rate up so opted-in balances never exceed the target
        let new_rate = mul_div_up(self.rebasing_credits, SCALE, rebasing_target)?;
        if new_rate == 0 {
            return Err(Error::InvariantViolation(format!(
                "credits per token collapsed to zero for supply {}",
                new_total_supply
            )));
        }
        self.rebasing_credits_per_token = new_rate;
        Ok(Some(new_rate))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BALANCES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Display balance of an account
    pub fn balance_of(&self, account: &Address) -> u128 {
        match self.holding(account) {
            Holding::Rebasing { credits } => self.credits_to_balance(credits),
            Holding::NonRebasing { balance } => balance,
        }
    }

    /// Raw credits and the rate they convert at. Opted-out accounts report
    /// their face value at a rate of 1.0.
    pub fn credits_balance_of(&self, account: &Address) -> (u128, u128) {
        match self.holding(account) {
            Holding::Rebasing { credits } => (credits, self.rebasing_credits_per_token),
            Holding::NonRebasing { balance } => (balance, INITIAL_CREDITS_PER_TOKEN),
        }
    }

    /// Rebase participation of an account (accounts start opted in)
    pub fn rebase_state(&self, account: &Address) -> RebaseState {
        self.holding(account).state()
    }

    /// Get number of accounts with a record
    pub fn holder_count(&self) -> usize {
        self.accounts.len()
    }

    /// Get all holdings (for auditing)
    pub fn all_holdings(&self) -> &BTreeMap<Address, Holding> {
        &self.accounts
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Mint new tokens
    pub fn mint(&mut self, to: Address, amount: u128) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        self.credit(to, amount)
    }

    /// Burn tokens. A request up to `BURN_ROUNDING_TOLERANCE` above the
    /// balance empties the account.
    pub fn burn(&mut self, from: Address, amount: u128) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        self.debit(from, amount)
    }

    /// Burn everything the account holds; returns the balance burned
    pub fn burn_all(&mut self, from: Address) -> Result<u128> {
        let burned = self.balance_of(&from);
        match self.holding(&from) {
            Holding::Rebasing { credits } => {
                self.rebasing_credits = safe_sub(self.rebasing_credits, credits)?;
                self.accounts.remove(&from);
            }
            Holding::NonRebasing { balance } => {
                self.non_rebasing_supply = safe_sub(self.non_rebasing_supply, balance)?;
                self.accounts
                    .insert(from, Holding::NonRebasing { balance: 0 });
            }
        }
        Ok(burned)
    }

    /// Transfer tokens between accounts, whatever their rebase states
    pub fn transfer(&mut self, from: Address, to: Address, amount: u128) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }

        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return Err(Error::InsufficientBalance {
                required: amount,
                available: from_balance,
            });
        }

        if from == to {
            return Ok(());
        }

        self.debit(from, amount)?;
        self.credit(to, amount)
    }

    /// Convert an account's credits into a frozen face value
    pub fn rebase_opt_out(&mut self, account: Address) -> Result<()> {
        let credits = match self.holding(&account) {
            Holding::Rebasing { credits } => credits,
            Holding::NonRebasing { .. } => return Err(Error::AlreadyNonRebasing(account)),
        };
        let balance = self.credits_to_balance(credits);

        self.rebasing_credits = safe_sub(self.rebasing_credits, credits)?;
        self.non_rebasing_supply = safe_add(self.non_rebasing_supply, balance)?;
        self.accounts
            .insert(account, Holding::NonRebasing { balance });
        Ok(())
    }

    /// Convert an account's face value back into credits at the current rate
    pub fn rebase_opt_in(&mut self, account: Address) -> Result<()> {
        let balance = match self.holding(&account) {
            Holding::NonRebasing { balance } => balance,
            Holding::Rebasing { .. } => return Err(Error::AlreadyRebasing(account)),
        };
        let credits = self.balance_to_credits(balance)?;

        self.non_rebasing_supply = safe_sub(self.non_rebasing_supply, balance)?;
        self.rebasing_credits = safe_add(self.rebasing_credits, credits)?;
        if credits == 0 {
            self.accounts.remove(&account);
        } else {
            self.accounts.insert(account, Holding::Rebasing { credits });
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INVARIANTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Totals equal the sums of the per-account records
    pub fn verify_supply_invariant(&self) -> bool {
        let mut credits = 0u128;
        let mut face = 0u128;
        for holding in self.accounts.values() {
            match holding {
                Holding::Rebasing { credits: c } => credits = credits.saturating_add(*c),
                Holding::NonRebasing { balance } => face = face.saturating_add(*balance),
            }
        }
        credits == self.rebasing_credits && face == self.non_rebasing_supply
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL
    // ═══════════════════════════════════════════════════════════════════════════

    fn holding(&self, account: &Address) -> Holding {
        self.accounts.get(account).copied().unwrap_or_default()
    }

    fn credits_to_balance(&self, credits: u128) -> u128 {
        // saturates on overflow; the rate is never zero
        mul_div(credits, SCALE, self.rebasing_credits_per_token).unwrap_or(u128::MAX)
    }

    fn balance_to_credits(&self, balance: u128) -> Result<u128> {
        mul_div(balance, self.rebasing_credits_per_token, SCALE)
    }

    fn credit(&mut self, to: Address, amount: u128) -> Result<()> {
        match self.holding(&to) {
            Holding::Rebasing { credits } => {
                let added = self.balance_to_credits(amount)?;
                let credits = safe_add(credits, added)?;
                self.rebasing_credits = safe_add(self.rebasing_credits, added)?;
                self.accounts.insert(to, Holding::Rebasing { credits });
            }
            Holding::NonRebasing { balance } => {
                let balance = safe_add(balance, amount)?;
                self.non_rebasing_supply = safe_add(self.non_rebasing_supply, amount)?;
                self.accounts.insert(to, Holding::NonRebasing { balance });
            }
        }
        Ok(())
    }

    fn debit(&mut self, from: Address, amount: u128) -> Result<()> {
        let available = self.balance_of(&from);
        if amount > available.saturating_add(BURN_ROUNDING_TOLERANCE) {
            return Err(Error::InsufficientBalance {
                required: amount,
                available,
            });
        }

        match self.holding(&from) {
            Holding::Rebasing { credits } => {
                let removed =
                    mul_div_up(amount, self.rebasing_credits_per_token, SCALE)?.min(credits);
                self.rebasing_credits = safe_sub(self.rebasing_credits, removed)?;
                if credits == removed {
                    self.accounts.remove(&from);
                } else {
                    self.accounts.insert(
                        from,
                        Holding::Rebasing {
                            credits: credits - removed,
                        },
                    );
                }
            }
            Holding::NonRebasing { balance } => {
                let removed = amount.min(balance);
                self.non_rebasing_supply = safe_sub(self.non_rebasing_supply, removed)?;
                self.accounts.insert(
                    from,
                    Holding::NonRebasing {
                        balance: balance - removed,
                    },
                );
            }
        }
        Ok(())
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Compute state hash over rate, totals and holdings
    pub fn state_hash(&self) -> Hash {
        let mut data = Vec::new();
        data.extend_from_slice(&self.rebasing_credits_per_token.to_be_bytes());
        data.extend_from_slice(&self.rebasing_credits.to_be_bytes());
        data.extend_from_slice(&self.non_rebasing_supply.to_be_bytes());

        // BTreeMap iteration is already sorted by address
        for (account, holding) in &self.accounts {
            data.extend_from_slice(account.as_bytes());
            match holding {
                Holding::Rebasing { credits } => {
                    data.push(0);
                    data.extend_from_slice(&credits.to_be_bytes());
                }
                Holding::NonRebasing { balance } => {
                    data.push(1);
                    data.extend_from_slice(&balance.to_be_bytes());
                }
            }
        }

        Hash::sha256(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const E18: u128 = SCALE;

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn bob() -> Address {
        Address::from_label("bob")
    }

    #[test]
    fn test_new_token() {
        let token = ReceiptToken::new();
        assert_eq!(token.total_supply(), 0);
        assert_eq!(token.rebasing_credits_per_token(), E18);
        assert_eq!(token.rebase_state(&alice()), RebaseState::Rebasing);
        assert_eq!(token.symbol, "XUSD");
    }

    #[test]
    fn test_mint() {
        let mut token = ReceiptToken::new();
        token.mint(alice(), 100 * E18).unwrap();
        assert_eq!(token.balance_of(&alice()), 100 * E18);
        assert_eq!(token.total_supply(), 100 * E18);
        assert_eq!(token.credits_balance_of(&alice()), (100 * E18, E18));
        assert!(token.verify_supply_invariant());
    }

    #[test]
    fn test_mint_zero_fails() {
        let mut token = ReceiptToken::new();
        assert_eq!(token.mint(alice(), 0), Err(Error::ZeroAmount));
    }

    #[test]
    fn test_burn() {
        let mut token = ReceiptToken::new();
        token.mint(alice(), 100 * E18).unwrap();
        token.burn(alice(), 40 * E18).unwrap();
        assert_eq!(token.balance_of(&alice()), 60 * E18);
        assert_eq!(token.total_supply(), 60 * E18);
        assert!(token.verify_supply_invariant());
    }

    #[test]
    fn test_burn_insufficient_balance() {
        let mut token = ReceiptToken::new();
        token.mint(alice(), 10 * E18).unwrap();
        assert!(matches!(
            token.burn(alice(), 11 * E18),
            Err(Error::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_rebase_changes_only_opted_in() {
        let mut token = ReceiptToken::new();
        token.mint(alice(), 100 * E18).unwrap();
        token.mint(bob(), 100 * E18).unwrap();
        token.rebase_opt_out(bob()).unwrap();

        // 10% more backing for the rebasing half
        token.change_supply(210 * E18).unwrap();

        assert_eq!(token.balance_of(&bob()), 100 * E18);
        let alice_balance = token.balance_of(&alice());
        assert!(alice_balance <= 110 * E18);
        assert!(110 * E18 - alice_balance < 1_000);
        assert!(token.total_supply() <= 210 * E18);
        assert!(210 * E18 - token.total_supply() < 1_000);
    }

    #[test]
    fn test_change_supply_without_rebasing_credits() {
        let mut token = ReceiptToken::new();
        token.mint(alice(), 100 * E18).unwrap();
        token.rebase_opt_out(alice()).unwrap();
        assert!(!token.can_rebase_to(150 * E18));
        assert_eq!(token.change_supply(150 * E18).unwrap(), None);
        assert_eq!(token.rebasing_credits_per_token(), E18);
    }

    #[test]
    fn test_opt_out_and_in() {
        let mut token = ReceiptToken::new();
        token.mint(alice(), 50 * E18).unwrap();

        token.rebase_opt_out(alice()).unwrap();
        assert_eq!(token.rebase_state(&alice()), RebaseState::NonRebasing);
        assert_eq!(token.non_rebasing_supply(), 50 * E18);
        assert_eq!(token.rebasing_credits(), 0);
        assert_eq!(
            token.rebase_opt_out(alice()),
            Err(Error::AlreadyNonRebasing(alice()))
        );

        token.rebase_opt_in(alice()).unwrap();
        assert_eq!(token.rebase_state(&alice()), RebaseState::Rebasing);
        assert_eq!(token.balance_of(&alice()), 50 * E18);
        assert_eq!(token.rebase_opt_in(alice()), Err(Error::AlreadyRebasing(alice())));
        assert!(token.verify_supply_invariant());
    }

    #[test]
    fn test_transfer_mixed_states() {
        let mut token = ReceiptToken::new();
        token.mint(alice(), 100 * E18).unwrap();
        token.rebase_opt_out(bob()).unwrap();

        token.transfer(alice(), bob(), 30 * E18).unwrap();
        assert_eq!(token.balance_of(&alice()), 70 * E18);
        assert_eq!(token.balance_of(&bob()), 30 * E18);
        assert_eq!(token.non_rebasing_supply(), 30 * E18);
        assert_eq!(token.total_supply(), 100 * E18);

        token.transfer(bob(), alice(), 30 * E18).unwrap();
        assert_eq!(token.balance_of(&bob()), 0);
        assert_eq!(token.non_rebasing_supply(), 0);
        assert!(token.verify_supply_invariant());
    }

    #[test]
    fn test_transfer_insufficient() {
        let mut token = ReceiptToken::new();
        token.mint(alice(), E18).unwrap();
        assert!(token.transfer(alice(), bob(), 2 * E18).is_err());
        assert_eq!(token.transfer(alice(), bob(), 0), Err(Error::ZeroAmount));
    }

    #[test]
    fn test_burn_all_leaves_no_residual() {
        let mut token = ReceiptToken::new();
        token.mint(alice(), 100 * E18).unwrap();
        token.mint(bob(), 33 * E18).unwrap();
        token.change_supply(140 * E18).unwrap();

        let burned = token.burn_all(alice()).unwrap();
        assert!(burned > 100 * E18);
        assert_eq!(token.balance_of(&alice()), 0);
        assert_eq!(token.credits_balance_of(&alice()).0, 0);
        assert!(token.verify_supply_invariant());
    }

    #[test]
    fn test_state_hash_deterministic() {
        let mut a = ReceiptToken::new();
        let mut b = ReceiptToken::new();
        a.mint(alice(), E18).unwrap();
        a.mint(bob(), 2 * E18).unwrap();
        b.mint(bob(), 2 * E18).unwrap();
        b.mint(alice(), E18).unwrap();
        assert_eq!(a.state_hash(), b.state_hash());

        let restored = ReceiptToken::from_bytes(&a.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, a);
    }
}
