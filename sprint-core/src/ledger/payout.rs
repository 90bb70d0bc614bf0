//! Yield and penalty math.
//!
//! All arithmetic is integer basis-point arithmetic with truncation toward
//! zero, so the ledger never pays out a fractional unit it does not hold:
//!
//! ```text
//! yield         = principal * bps / 10_000
//! maturity      = principal + yield
//! early exit    = principal + yield / 2
//! ```

use crate::domain::{Amount, Position, Tier, Timestamp};
use serde::{Deserialize, Serialize};

/// 100% in basis points.
pub const BPS_DENOMINATOR: Amount = 10_000;

/// Early exit keeps 1/2 of the maturity yield; the other half is forfeited.
pub const EARLY_EXIT_YIELD_DIVISOR: Amount = 2;

/// Full yield earned at maturity. `None` on overflow.
pub fn maturity_yield(principal: Amount, yield_rate_bps: u32) -> Option<Amount> {
    principal
        .checked_mul(yield_rate_bps as Amount)
        .map(|v| v / BPS_DENOMINATOR)
}

/// Yield kept by an early exit (half the maturity yield, truncated).
pub fn early_exit_yield(principal: Amount, yield_rate_bps: u32) -> Option<Amount> {
    maturity_yield(principal, yield_rate_bps).map(|y| y / EARLY_EXIT_YIELD_DIVISOR)
}

/// How a position is being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseKind {
    Settle,
    WithdrawEarly,
}

/// Breakdown of a closing payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub principal: Amount,
    pub yield_paid: Amount,
    pub forfeited_yield: Amount,
}

impl Payout {
    /// Compute the payout for closing `principal` in `tier` by `kind`.
    pub fn compute(principal: Amount, tier: &Tier, kind: CloseKind) -> Option<Self> {
        let full = maturity_yield(principal, tier.yield_rate_bps)?;
        let yield_paid = match kind {
            CloseKind::Settle => full,
            CloseKind::WithdrawEarly => full / EARLY_EXIT_YIELD_DIVISOR,
        };
        // Overflow check up front so `total()` cannot fail.
        principal.checked_add(yield_paid)?;
        Some(Self {
            principal,
            yield_paid,
            forfeited_yield: full - yield_paid,
        })
    }

    /// Amount transferred to the owner.
    pub fn total(&self) -> Amount {
        self.principal + self.yield_paid
    }
}

/// Point-in-time view of what a position would pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub maturity_payout: Amount,
    pub early_payout: Amount,
    pub is_mature: bool,
    pub seconds_to_maturity: u64,
    /// Payout of the action available right now (settle when mature,
    /// early exit otherwise). `None` once the position is closed.
    pub redeemable_now: Option<Amount>,
}

impl Quote {
    pub fn for_position(position: &Position, tier: &Tier, now: Timestamp) -> Option<Self> {
        let maturity = Payout::compute(position.principal, tier, CloseKind::Settle)?.total();
        let early = Payout::compute(position.principal, tier, CloseKind::WithdrawEarly)?.total();
        let is_mature = position.is_mature(now);
        let redeemable_now = position
            .is_open()
            .then_some(if is_mature { maturity } else { early });
        Some(Self {
            maturity_payout: maturity,
            early_payout: early,
            is_mature,
            seconds_to_maturity: position.seconds_to_maturity(now),
            redeemable_now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TierId;

    fn quick() -> Tier {
        Tier {
            id: TierId::QUICK,
            name: "Quick Sprint".into(),
            lock_duration: 60,
            yield_rate_bps: 100,
        }
    }

    #[test]
    fn quick_tier_settles_for_one_percent() {
        let payout = Payout::compute(100, &quick(), CloseKind::Settle).unwrap();
        assert_eq!(payout.total(), 101);
        assert_eq!(payout.forfeited_yield, 0);
    }

    #[test]
    fn early_exit_truncates_half_yield() {
        // 100 * 100 / 10_000 = 1, 1 / 2 = 0
        let payout = Payout::compute(100, &quick(), CloseKind::WithdrawEarly).unwrap();
        assert_eq!(payout.total(), 100);
        assert_eq!(payout.yield_paid, 0);
        assert_eq!(payout.forfeited_yield, 1);
    }

    #[test]
    fn early_exit_with_scaled_principal() {
        // 100 tokens at 6 decimals: yield 1_000_000, half 500_000
        let payout = Payout::compute(100_000_000, &quick(), CloseKind::WithdrawEarly).unwrap();
        assert_eq!(payout.total(), 100_500_000);
    }

    #[test]
    fn yield_truncates_toward_zero() {
        assert_eq!(maturity_yield(99, 100), Some(0));
        assert_eq!(maturity_yield(199, 100), Some(1));
        assert_eq!(maturity_yield(12_345, 1_000), Some(1_234));
        assert_eq!(early_exit_yield(12_345, 1_000), Some(617));
    }

    #[test]
    fn overflow_is_none() {
        assert_eq!(maturity_yield(Amount::MAX, 2), None);
        let tier = Tier {
            yield_rate_bps: 10_000,
            ..quick()
        };
        assert!(Payout::compute(Amount::MAX / 2 + 1, &tier, CloseKind::Settle).is_none());
    }

    #[test]
    fn quote_switches_action_at_maturity() {
        let position = Position {
            id: crate::domain::PositionId(0),
            owner: crate::domain::AccountId::new("alice"),
            principal: 10_000,
            tier_id: TierId::QUICK,
            created_at: 0,
            matures_at: 60,
            status: crate::domain::PositionStatus::Open,
            closed_at: None,
            payout: None,
        };
        let before = Quote::for_position(&position, &quick(), 30).unwrap();
        assert_eq!(before.maturity_payout, 10_100);
        assert_eq!(before.early_payout, 10_050);
        assert_eq!(before.redeemable_now, Some(10_050));
        assert_eq!(before.seconds_to_maturity, 30);

        let after = Quote::for_position(&position, &quick(), 60).unwrap();
        assert!(after.is_mature);
        assert_eq!(after.redeemable_now, Some(10_100));
    }
}
