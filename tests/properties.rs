//! Property-based tests for vault accounting.
//!
//! Supply conservation, non-dilution of opted-out holders, buffer respect,
//! allocation idempotence and the redeem round trip.

use std::sync::Arc;

use proptest::prelude::*;

use xusd::core::VaultState;
use xusd::oracle::FixedPriceOracle;
use xusd::strategy::{InMemoryStrategy, Strategy, StrategyRef};
use xusd::utils::address::Address;
use xusd::utils::constants::SCALE;
use xusd::vault::Vault;

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

const USDC_UNIT: u128 = 1_000_000;

/// One USDC base unit in 18-decimal value
const USDC_DUST: u128 = SCALE / USDC_UNIT;

struct Setup {
    vault: Vault,
    dai: Address,
    usdc: Address,
    strategy: Arc<InMemoryStrategy>,
}

/// DAI and USDC at the peg, both routed to one in-memory strategy
fn setup(state: VaultState) -> Setup {
    let governor = Address::from_label("governor");
    let dai = Address::from_label("DAI");
    let usdc = Address::from_label("USDC");
    let oracle = Arc::new(FixedPriceOracle::pegged(&[dai, usdc]));
    let address = Address::from_label("vault");

    let mut vault = Vault::with_state(address, governor, oracle, state).unwrap();
    vault.support_asset(&governor, dai, "DAI", 18).unwrap();
    vault.support_asset(&governor, usdc, "USDC", 6).unwrap();

    let strategy = Arc::new(InMemoryStrategy::new(
        Address::from_label("A"),
        address,
        vec![dai, usdc],
    ));
    let strategy_ref: StrategyRef = strategy.clone();
    vault.approve_strategy(&governor, strategy_ref).unwrap();
    for asset in [dai, usdc] {
        vault
            .set_asset_default_strategy(&governor, &asset, Some(&strategy.id()))
            .unwrap();
    }

    Setup {
        vault,
        dai,
        usdc,
        strategy,
    }
}

fn account(i: usize) -> Address {
    Address::from_label(&format!("user-{}", i))
}

/// (account, mint?, whole tokens)
fn operations() -> impl proptest::strategy::Strategy<Value = Vec<(usize, bool, u128)>> {
    prop::collection::vec((0usize..4, any::<bool>(), 1u128..900), 1..40)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Without yield, balances always add up to the supply
    #[test]
    fn prop_supply_conserved(ops in operations()) {
        let mut s = setup(VaultState::default());
        s.vault.rebase_opt_out(&account(3)).unwrap();

        for (i, mint, tokens) in &ops {
            let who = account(*i);
            if *mint {
                s.vault.mint(&who, &s.dai, tokens * SCALE, 0).unwrap();
            } else {
                let amount = (tokens * SCALE).min(s.vault.balance_of(&who));
                if amount > 0 {
                    s.vault.redeem(&who, amount, 0).unwrap();
                }
            }

            let sum: u128 = (0..4).map(|j| s.vault.balance_of(&account(j))).sum();
            let supply = s.vault.total_supply();
            prop_assert!(sum.abs_diff(supply) <= ops.len() as u128);
            prop_assert!(s.vault.token().verify_supply_invariant());
            prop_assert!(s.vault.total_value().unwrap() >= supply);
        }
    }

    /// Opted-out balances are untouched by rebases of either sign
    #[test]
    fn prop_opted_out_not_diluted(
        alice in 1u128..10_000,
        bob in 1u128..10_000,
        gain in any::<bool>(),
        percent in 1u128..50,
    ) {
        let mut s = setup(VaultState::default());
        let (a, b) = (account(0), account(1));
        s.vault.mint(&a, &s.dai, alice * SCALE, 0).unwrap();
        s.vault.mint(&b, &s.dai, bob * SCALE, 0).unwrap();
        s.vault.rebase_opt_out(&b).unwrap();
        let before = s.vault.balance_of(&b);

        let delta = (alice + bob) * SCALE * percent / 100;
        if gain {
            s.strategy.accrue(&s.dai, delta).unwrap();
        } else {
            s.strategy.slash(&s.dai, delta).unwrap();
        }
        s.vault.rebase().unwrap();

        prop_assert_eq!(s.vault.balance_of(&b), before);
        prop_assert_eq!(s.vault.token().non_rebasing_supply(), before);
    }

    /// After allocate every routed asset sits at or below its buffer share,
    /// and a second allocate moves nothing
    #[test]
    fn prop_allocate_respects_buffer_and_is_idempotent(
        buffer_bps in 1u128..=10_000,
        dai in 1u128..900,
        usdc in 1u128..900,
    ) {
        let state = VaultState::default().with_vault_buffer(buffer_bps * SCALE / 10_000);
        let mut s = setup(state);
        s.vault.mint(&account(0), &s.dai, dai * SCALE, 0).unwrap();
        s.vault.mint(&account(1), &s.usdc, usdc * USDC_UNIT, 0).unwrap();

        s.vault.allocate().unwrap();
        let total = s.vault.total_value().unwrap();
        let target = total * buffer_bps / 10_000;
        let slack = 2 * USDC_DUST + 10;
        let dai_held = s.vault.vault_balance(&s.dai);
        let usdc_held_value = s.vault.vault_balance(&s.usdc) * USDC_DUST;
        prop_assert!(dai_held <= target + slack);
        prop_assert!(usdc_held_value <= target + slack);

        let dai_allocated = s.strategy.check_balance(&s.dai).unwrap();
        let usdc_allocated = s.strategy.check_balance(&s.usdc).unwrap();
        prop_assert!(s.vault.allocate().unwrap().is_noop());
        prop_assert_eq!(s.strategy.check_balance(&s.dai).unwrap(), dai_allocated);
        prop_assert_eq!(s.strategy.check_balance(&s.usdc).unwrap(), usdc_allocated);
        prop_assert_eq!(s.vault.total_value().unwrap(), total);
    }

    /// Minting then redeeming returns the deposit less the redeem fee
    #[test]
    fn prop_redeem_round_trip(tokens in 1u128..100_000, six_decimals in any::<bool>()) {
        let mut s = setup(VaultState::default());
        let who = account(0);
        let (asset, amount) = if six_decimals {
            (s.usdc, tokens * USDC_UNIT)
        } else {
            (s.dai, tokens * SCALE)
        };

        let minted = s.vault.mint(&who, &asset, amount, 0).unwrap();
        prop_assert_eq!(minted, tokens * SCALE);

        let outcome = s.vault.redeem(&who, minted, 0).unwrap();
        let floor = minted - minted * s.vault.state().redeem_fee_bps / 10_000;
        prop_assert!(outcome.value + USDC_DUST >= floor);
        prop_assert_eq!(s.vault.balance_of(&who), 0);
    }
}
