//! Ledger invariants.
//!
//! Two levels of checking:
//! - `check_invariants`: O(1) checks run before and after every mutation
//! - `audit`: full scan of the position table, stats, and event log;
//!   run after every mutation in debug builds and on every restore

use super::error::LedgerError;
use super::payout::{CloseKind, Payout};
use super::position_ledger::{LedgerStats, PositionLedger};
use crate::domain::{Amount, PositionStatus};
use crate::token::TokenLedger;
use serde::{Deserialize, Serialize};

/// Result of a successful full audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub positions: u64,
    pub open: u64,
    pub settled: u64,
    pub withdrawn_early: u64,
    pub open_principal: Amount,
    pub custody_balance: Amount,
    pub reward_reserve: Amount,
}

impl<T: TokenLedger> PositionLedger<T> {
    pub(crate) fn check_invariants(&self) -> Result<(), LedgerError> {
        if self.next_id != self.positions.len() as u64 {
            return Err(LedgerError::InvariantViolation(
                "allocation counter does not match position table",
            ));
        }
        if self.stats.open_principal > self.custody_balance() {
            return Err(LedgerError::InvariantViolation(
                "custody balance below open principal",
            ));
        }
        Ok(())
    }

    /// Recompute every aggregate from the position table and verify each
    /// position against its tier terms.
    pub fn audit(&self) -> Result<AuditReport, LedgerError> {
        self.check_invariants()?;

        // Funding has no per-position record; carry it over as-is.
        let mut recomputed = LedgerStats {
            total_funded: self.stats.total_funded,
            ..LedgerStats::default()
        };

        for (index, position) in self.positions.iter().enumerate() {
            if position.id.index() != index {
                return Err(LedgerError::InvariantViolation("position ids are not contiguous"));
            }
            if position.principal == 0 {
                return Err(LedgerError::InvariantViolation("position holds zero principal"));
            }
            let tier = self
                .tiers
                .get(position.tier_id)
                .ok_or(LedgerError::InvariantViolation("position references unknown tier"))?;
            if tier.maturity_for(position.created_at) != Some(position.matures_at) {
                return Err(LedgerError::InvariantViolation(
                    "maturity does not match tier lock",
                ));
            }

            recomputed.total_deposited = add(recomputed.total_deposited, position.principal)?;

            let kind = match (position.status, position.closed_at, position.payout) {
                (PositionStatus::Open, None, None) => {
                    recomputed.open_positions += 1;
                    recomputed.open_principal =
                        add(recomputed.open_principal, position.principal)?;
                    continue;
                }
                (PositionStatus::Open, _, _) => {
                    return Err(LedgerError::InvariantViolation(
                        "open position carries a close record",
                    ));
                }
                (_, None, _) | (_, _, None) => {
                    return Err(LedgerError::InvariantViolation(
                        "closed position missing close record",
                    ));
                }
                (PositionStatus::Settled, Some(closed_at), Some(_)) => {
                    if closed_at < position.matures_at {
                        return Err(LedgerError::InvariantViolation("settled before maturity"));
                    }
                    recomputed.settled_positions += 1;
                    CloseKind::Settle
                }
                (PositionStatus::WithdrawnEarly, Some(closed_at), Some(_)) => {
                    if closed_at >= position.matures_at {
                        return Err(LedgerError::InvariantViolation(
                            "early withdrawal at or after maturity",
                        ));
                    }
                    recomputed.withdrawn_early_positions += 1;
                    CloseKind::WithdrawEarly
                }
            };

            let expected = Payout::compute(position.principal, tier, kind)
                .ok_or(LedgerError::Overflow)?;
            if position.payout != Some(expected.total()) {
                return Err(LedgerError::InvariantViolation(
                    "recorded payout does not match tier terms",
                ));
            }
            recomputed.total_paid_out = add(recomputed.total_paid_out, expected.total())?;
            recomputed.total_yield_paid = add(recomputed.total_yield_paid, expected.yield_paid)?;
            recomputed.total_forfeited_yield =
                add(recomputed.total_forfeited_yield, expected.forfeited_yield)?;
        }

        if recomputed != self.stats {
            return Err(LedgerError::InvariantViolation(
                "stats disagree with position table",
            ));
        }

        for (index, record) in self.events.iter().enumerate() {
            if record.seq != index as u64 {
                return Err(LedgerError::InvariantViolation("event log is not contiguous"));
            }
        }

        let custody_balance = self.custody_balance();
        Ok(AuditReport {
            positions: self.next_id,
            open: recomputed.open_positions,
            settled: recomputed.settled_positions,
            withdrawn_early: recomputed.withdrawn_early_positions,
            open_principal: recomputed.open_principal,
            custody_balance,
            reward_reserve: custody_balance.saturating_sub(recomputed.open_principal),
        })
    }
}

fn add(a: Amount, b: Amount) -> Result<Amount, LedgerError> {
    a.checked_add(b).ok_or(LedgerError::Overflow)
}
