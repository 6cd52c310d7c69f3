//! Journal of strategy movements made by one vault operation.
//!
//! The vault's own state is restored from a snapshot when an operation
//! fails, but funds already handed to (or taken from) a strategy live
//! outside the vault. The journal remembers those movements so they can be
//! compensated in reverse order.

use tracing::{debug, error};

use crate::strategy::StrategyRef;
use crate::utils::address::Address;

#[derive(Debug)]
enum Move {
    Deposit {
        strategy: StrategyRef,
        asset: Address,
        amount: u128,
    },
    Withdrawal {
        strategy: StrategyRef,
        asset: Address,
        amount: u128,
    },
}

/// Strategy movements in the order they happened
#[derive(Debug)]
pub struct MoveJournal {
    vault: Address,
    moves: Vec<Move>,
}

impl MoveJournal {
    pub(crate) fn new(vault: Address) -> Self {
        Self {
            vault,
            moves: Vec::new(),
        }
    }

    pub(crate) fn record_deposit(&mut self, strategy: &StrategyRef, asset: Address, amount: u128) {
        self.moves.push(Move::Deposit {
            strategy: strategy.clone(),
            asset,
            amount,
        });
    }

    pub(crate) fn record_withdrawal(
        &mut self,
        strategy: &StrategyRef,
        asset: Address,
        amount: u128,
    ) {
        self.moves.push(Move::Withdrawal {
            strategy: strategy.clone(),
            asset,
            amount,
        });
    }

    /// Number of recorded movements
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Check if nothing moved
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Reverse every movement, newest first
    pub(crate) fn unwind(self) {
        let vault = self.vault;
        for step in self.moves.into_iter().rev() {
            let (result, strategy, asset, amount) = match step {
                Move::Deposit {
                    strategy,
                    asset,
                    amount,
                } => (strategy.withdraw(&vault, &asset, amount), strategy, asset, amount),
                Move::Withdrawal {
                    strategy,
                    asset,
                    amount,
                } => (strategy.deposit(&asset, amount), strategy, asset, amount),
            };

            match result {
                Ok(()) => debug!(
                    strategy = %strategy.id().short(),
                    asset = %asset.short(),
                    amount,
                    "compensated strategy move"
                ),
                Err(err) => error!(
                    strategy = %strategy.id().short(),
                    asset = %asset.short(),
                    amount,
                    error = %err,
                    "failed to compensate strategy move"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{InMemoryStrategy, Strategy};
    use std::sync::Arc;

    #[test]
    fn test_unwind_reverses_moves() {
        let vault = Address::from_label("vault");
        let dai = Address::from_label("DAI");
        let a = Arc::new(InMemoryStrategy::new(Address::from_label("A"), vault, vec![dai]));
        let b = Arc::new(InMemoryStrategy::new(Address::from_label("B"), vault, vec![dai]));
        a.deposit(&dai, 100).unwrap();

        let a_ref: StrategyRef = a.clone();
        let b_ref: StrategyRef = b.clone();

        let mut journal = MoveJournal::new(vault);
        a.withdraw(&vault, &dai, 60).unwrap();
        journal.record_withdrawal(&a_ref, dai, 60);
        b.deposit(&dai, 60).unwrap();
        journal.record_deposit(&b_ref, dai, 60);
        assert_eq!(journal.len(), 2);

        journal.unwind();
        assert_eq!(a.check_balance(&dai).unwrap(), 100);
        assert_eq!(b.check_balance(&dai).unwrap(), 0);
    }
}
