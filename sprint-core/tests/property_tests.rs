//! Property tests for ledger invariants.
//!
//! Uses proptest to verify:
//! 1. Open: maturity, status, and counter step for any valid deposit
//! 2. Payout ordering: maturity payout > early payout ≥ principal
//! 3. Maturity gates: settle/withdraw_early split exactly at `matures_at`
//! 4. Ownership: non-owners never move a position
//! 5. Custody: open principal never exceeds custody under random op sequences

use proptest::prelude::*;
use sprint_core::domain::{AccountId, PositionId, PositionStatus, TierCatalog, TierId};
use sprint_core::ledger::{CloseKind, LedgerError, Payout, PositionLedger};
use sprint_core::token::MockUsdc;

const ACCOUNTS: [&str; 3] = ["alice", "bob", "carol"];

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_principal() -> impl Strategy<Value = u128> {
    1u128..1_000_000_000_000
}

fn arb_tier() -> impl Strategy<Value = TierId> {
    (0u8..3).prop_map(TierId)
}

fn arb_now() -> impl Strategy<Value = u64> {
    0u64..2_000_000_000
}

#[derive(Debug, Clone)]
enum Op {
    Open { who: usize, principal: u128, tier: u8 },
    Settle { who: usize, id: u64 },
    Withdraw { who: usize, id: u64 },
    Fund { amount: u128 },
    Advance { secs: u64 },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..3, 0u128..5_000, 0u8..4)
            .prop_map(|(who, principal, tier)| Op::Open { who, principal, tier }),
        3 => (0usize..3, 0u64..12).prop_map(|(who, id)| Op::Settle { who, id }),
        2 => (0usize..3, 0u64..12).prop_map(|(who, id)| Op::Withdraw { who, id }),
        1 => (0u128..500).prop_map(|amount| Op::Fund { amount }),
        3 => (0u64..400).prop_map(|secs| Op::Advance { secs }),
    ]
}

fn funded_ledger(each: u128) -> PositionLedger<MockUsdc> {
    let mut ledger = PositionLedger::with_default_tiers(MockUsdc::default());
    let custody = ledger.custody().clone();
    for name in ACCOUNTS.iter().chain(["treasury"].iter()) {
        let account = AccountId::new(*name);
        ledger.token_mut().mint(&account, each).unwrap();
        ledger.token_mut().approve(&account, &custody, each);
    }
    ledger
}

// ── 1. Open ──────────────────────────────────────────────────────────

proptest! {
    /// A valid open stores an Open position maturing exactly one lock later.
    #[test]
    fn open_sets_maturity_and_advances_counter(
        principal in arb_principal(),
        tier in arb_tier(),
        now in arb_now(),
    ) {
        let mut ledger = funded_ledger(principal);
        let before = ledger.next_position_id();
        let id = ledger.open_position(&AccountId::new("alice"), principal, tier, now).unwrap();

        let lock = ledger.get_tier(tier).unwrap().lock_duration;
        let position = ledger.get_position(id).unwrap();
        prop_assert_eq!(position.matures_at, now + lock);
        prop_assert_eq!(position.status, PositionStatus::Open);
        prop_assert_eq!(ledger.next_position_id(), before + 1);
        prop_assert_eq!(id, PositionId(before));
    }
}

// ── 2. Payout Ordering ───────────────────────────────────────────────

proptest! {
    /// Settling always beats exiting early, and neither loses principal.
    #[test]
    fn settle_payout_exceeds_early_payout(
        principal in arb_principal(),
        bps in 1u32..10_000,
    ) {
        let catalog = TierCatalog::from_pairs(&[(60, bps)]).unwrap();
        let tier = catalog.get(TierId(0)).unwrap();
        let settle = Payout::compute(principal, tier, CloseKind::Settle).unwrap();
        let early = Payout::compute(principal, tier, CloseKind::WithdrawEarly).unwrap();

        prop_assert!(early.total() >= principal);
        prop_assert!(settle.total() >= early.total());
        prop_assert_eq!(settle.yield_paid, early.yield_paid + early.forfeited_yield);
        if settle.yield_paid > 0 {
            prop_assert!(settle.total() > early.total());
        }
    }
}

// ── 3. Maturity Gates ────────────────────────────────────────────────

proptest! {
    /// `now < matures_at` admits only early exit; `now >= matures_at` only settle.
    #[test]
    fn maturity_splits_exit_paths(
        tier in arb_tier(),
        offset in 0u64..1_200,
    ) {
        let mut ledger = funded_ledger(1_000_000);
        ledger.fund_rewards(&AccountId::new("treasury"), 100_000, 0).unwrap();
        let alice = AccountId::new("alice");
        let id = ledger.open_position(&alice, 10_000, tier, 0).unwrap();
        let matures_at = ledger.get_position(id).unwrap().matures_at;

        if offset < matures_at {
            let is_not_mature = matches!(
                ledger.settle(&alice, id, offset),
                Err(LedgerError::NotMature { .. })
            );
            prop_assert!(is_not_mature);
            prop_assert!(ledger.withdraw_early(&alice, id, offset).is_ok());
        } else {
            let is_already_mature = matches!(
                ledger.withdraw_early(&alice, id, offset),
                Err(LedgerError::AlreadyMature { .. })
            );
            prop_assert!(is_already_mature);
            prop_assert!(ledger.settle(&alice, id, offset).is_ok());
        }
    }
}

// ── 4. Ownership ─────────────────────────────────────────────────────

proptest! {
    /// Non-owner calls fail with Unauthorized and leave the position Open.
    #[test]
    fn non_owner_never_moves_position(
        principal in 1u128..1_000_000,
        tier in arb_tier(),
        now in 0u64..2_000,
        use_settle in any::<bool>(),
    ) {
        let mut ledger = funded_ledger(1_000_000);
        let id = ledger.open_position(&AccountId::new("alice"), principal, tier, 0).unwrap();

        let mallory = AccountId::new("mallory");
        let result = if use_settle {
            ledger.settle(&mallory, id, now)
        } else {
            ledger.withdraw_early(&mallory, id, now)
        };
        let is_unauthorized = matches!(result, Err(LedgerError::Unauthorized { .. }));
        prop_assert!(is_unauthorized);
        prop_assert!(ledger.get_position(id).unwrap().is_open());
    }
}

// ── 5. Custody ───────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Under any sequence of operations, successful or not, the ledger passes
    /// a full audit and sum(open principal) ≤ custody balance.
    #[test]
    fn custody_covers_open_principal(ops in prop::collection::vec(arb_op(), 1..60)) {
        let mut ledger = funded_ledger(20_000);
        let mut now = 0u64;

        for op in ops {
            let before = ledger.snapshot();
            let result = match op {
                Op::Open { who, principal, tier } => ledger
                    .open_position(&AccountId::new(ACCOUNTS[who]), principal, TierId(tier), now)
                    .map(|_| ()),
                Op::Settle { who, id } => ledger
                    .settle(&AccountId::new(ACCOUNTS[who]), PositionId(id), now)
                    .map(|_| ()),
                Op::Withdraw { who, id } => ledger
                    .withdraw_early(&AccountId::new(ACCOUNTS[who]), PositionId(id), now)
                    .map(|_| ()),
                Op::Fund { amount } => ledger.fund_rewards(&AccountId::new("treasury"), amount, now),
                Op::Advance { secs } => {
                    now += secs;
                    Ok(())
                }
            };

            if result.is_err() {
                prop_assert_eq!(ledger.snapshot(), before);
            }
            let report = ledger.audit().unwrap();
            prop_assert!(report.open_principal <= report.custody_balance);
            let open_sum: u128 = ledger
                .positions()
                .filter(|p| p.is_open())
                .map(|p| p.principal)
                .sum();
            prop_assert_eq!(open_sum, ledger.stats().open_principal);
        }
    }
}
