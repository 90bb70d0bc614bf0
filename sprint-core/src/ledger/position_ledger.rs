//! Position ledger: creates, tracks, and settles sprint positions.
//!
//! The ledger owns:
//! - the immutable tier catalog
//! - the position table (indexed by `PositionId`, never shrinks)
//! - the allocation counter
//! - aggregate custody accounting (`LedgerStats`)
//! - an append-only event log
//!
//! Every mutating operation follows the same shape: check invariants,
//! validate inputs and state, precompute every new value with checked
//! arithmetic, perform the single token transfer, then commit. The token
//! transfer is the only fallible step after validation, so a failed call
//! leaves the ledger exactly as it was. The invariant check after the
//! commit is the exception: it reports corruption but does not roll back.
//!
//! The custody account never acts as a depositor or funder. A transfer from
//! custody to itself moves nothing, so it could not back a position.

use super::error::LedgerError;
use super::payout::{CloseKind, Payout, Quote};
use crate::domain::{
    AccountId, Amount, EventRecord, LedgerEvent, Position, PositionId, PositionStatus, Tier,
    TierCatalog, TierId, Timestamp,
};
use crate::token::TokenLedger;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Custody account used when none is configured.
pub const DEFAULT_CUSTODY: &str = "stable-sprints-custody";

/// Aggregate accounting, maintained incrementally alongside the position table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_deposited: Amount,
    pub total_funded: Amount,
    pub total_paid_out: Amount,
    pub total_yield_paid: Amount,
    pub total_forfeited_yield: Amount,
    /// Sum of principal over `Open` positions.
    pub open_principal: Amount,
    pub open_positions: u64,
    pub settled_positions: u64,
    pub withdrawn_early_positions: u64,
}

/// The sprint position ledger over a token collaborator `T`.
#[derive(Debug, Clone)]
pub struct PositionLedger<T> {
    pub(super) tiers: TierCatalog,
    pub(super) custody: AccountId,
    pub(super) token: T,
    pub(super) positions: Vec<Position>,
    pub(super) next_id: u64,
    pub(super) stats: LedgerStats,
    pub(super) events: Vec<EventRecord>,
}

impl<T: TokenLedger> PositionLedger<T> {
    pub fn new(tiers: TierCatalog, token: T, custody: AccountId) -> Self {
        Self {
            tiers,
            custody,
            token,
            positions: Vec::new(),
            next_id: 0,
            stats: LedgerStats::default(),
            events: Vec::new(),
        }
    }

    /// Ledger with the default Quick / Standard / Long catalog and custody account.
    pub fn with_default_tiers(token: T) -> Self {
        Self::new(
            TierCatalog::sprint_default(),
            token,
            AccountId::new(DEFAULT_CUSTODY),
        )
    }

    // ── Mutations ──────────────────────────────────────────────────────

    /// Deposit `principal` from `caller` into a new position in `tier_id`.
    ///
    /// Pulls the principal into custody via `transfer_from`, so `caller`
    /// must have approved the custody account for at least `principal`.
    pub fn open_position(
        &mut self,
        caller: &AccountId,
        principal: Amount,
        tier_id: TierId,
        now: Timestamp,
    ) -> Result<PositionId, LedgerError> {
        self.check_invariants()?;

        self.reject_custody_caller(caller)?;
        if principal == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let tier = self.get_tier(tier_id)?;
        let matures_at = tier.maturity_for(now).ok_or(LedgerError::Overflow)?;

        let id = PositionId(self.next_id);
        let next_id = self.next_id.checked_add(1).ok_or(LedgerError::Overflow)?;
        let mut stats = self.stats.clone();
        stats.total_deposited = checked_add(stats.total_deposited, principal)?;
        stats.open_principal = checked_add(stats.open_principal, principal)?;
        stats.open_positions += 1;

        if let Err(err) = self
            .token
            .transfer_from(&self.custody, caller, &self.custody, principal)
        {
            warn!(owner = %caller, principal = %principal, tier = %tier_id, error = %err, "deposit rejected");
            return Err(err.into());
        }

        self.positions.push(Position {
            id,
            owner: caller.clone(),
            principal,
            tier_id,
            created_at: now,
            matures_at,
            status: PositionStatus::Open,
            closed_at: None,
            payout: None,
        });
        self.next_id = next_id;
        self.stats = stats;
        self.record(
            now,
            LedgerEvent::PositionOpened {
                id,
                owner: caller.clone(),
                principal,
                tier_id,
                matures_at,
            },
        );
        info!(%id, owner = %caller, principal = %principal, tier = %tier_id, matures_at, "position opened");

        self.after_mutation()?;
        Ok(id)
    }

    /// Redeem a matured position for principal plus full yield.
    pub fn settle(
        &mut self,
        caller: &AccountId,
        id: PositionId,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        self.close(caller, id, now, CloseKind::Settle)
    }

    /// Exit a position before maturity for principal plus half the yield.
    pub fn withdraw_early(
        &mut self,
        caller: &AccountId,
        id: PositionId,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        self.close(caller, id, now, CloseKind::WithdrawEarly)
    }

    /// Pull `amount` from `funder` into custody to back yield payouts.
    pub fn fund_rewards(
        &mut self,
        funder: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.check_invariants()?;

        self.reject_custody_caller(funder)?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let total_funded = checked_add(self.stats.total_funded, amount)?;

        if let Err(err) = self
            .token
            .transfer_from(&self.custody, funder, &self.custody, amount)
        {
            warn!(funder = %funder, amount = %amount, error = %err, "reward funding rejected");
            return Err(err.into());
        }

        self.stats.total_funded = total_funded;
        self.record(
            now,
            LedgerEvent::RewardsFunded {
                funder: funder.clone(),
                amount,
            },
        );
        info!(funder = %funder, amount = %amount, "rewards funded");

        self.after_mutation()
    }

    fn close(
        &mut self,
        caller: &AccountId,
        id: PositionId,
        now: Timestamp,
        kind: CloseKind,
    ) -> Result<Amount, LedgerError> {
        self.check_invariants()?;

        let position = self.get_position(id)?;
        if !position.is_owned_by(caller) {
            return Err(LedgerError::Unauthorized {
                id,
                caller: caller.clone(),
            });
        }
        if position.status.is_terminal() {
            return Err(LedgerError::AlreadyClosed {
                id,
                status: position.status,
            });
        }
        match kind {
            CloseKind::Settle if !position.is_mature(now) => {
                return Err(LedgerError::NotMature {
                    id,
                    matures_at: position.matures_at,
                    now,
                });
            }
            CloseKind::WithdrawEarly if position.is_mature(now) => {
                return Err(LedgerError::AlreadyMature {
                    id,
                    matures_at: position.matures_at,
                });
            }
            _ => {}
        }

        let tier = self
            .tiers
            .get(position.tier_id)
            .ok_or(LedgerError::InvariantViolation("position references unknown tier"))?;
        let payout = Payout::compute(position.principal, tier, kind).ok_or(LedgerError::Overflow)?;
        let amount = payout.total();

        // Yield comes out of the reserve (custody above open principal), never
        // out of other depositors' principal.
        let reserve = self.reward_reserve();
        if payout.yield_paid > reserve {
            warn!(%id, needed = %payout.yield_paid, available = %reserve, "reward reserve shortfall");
            return Err(LedgerError::ReserveShortfall {
                needed: payout.yield_paid,
                available: reserve,
            });
        }

        let mut stats = self.stats.clone();
        stats.open_principal = stats
            .open_principal
            .checked_sub(payout.principal)
            .ok_or(LedgerError::InvariantViolation("open principal underflow"))?;
        stats.open_positions = stats
            .open_positions
            .checked_sub(1)
            .ok_or(LedgerError::InvariantViolation("open position count underflow"))?;
        stats.total_paid_out = checked_add(stats.total_paid_out, amount)?;
        stats.total_yield_paid = checked_add(stats.total_yield_paid, payout.yield_paid)?;
        stats.total_forfeited_yield =
            checked_add(stats.total_forfeited_yield, payout.forfeited_yield)?;
        let (status, event) = match kind {
            CloseKind::Settle => {
                stats.settled_positions += 1;
                (
                    PositionStatus::Settled,
                    LedgerEvent::PositionSettled {
                        id,
                        owner: caller.clone(),
                        payout: amount,
                    },
                )
            }
            CloseKind::WithdrawEarly => {
                stats.withdrawn_early_positions += 1;
                (
                    PositionStatus::WithdrawnEarly,
                    LedgerEvent::PositionWithdrawnEarly {
                        id,
                        owner: caller.clone(),
                        payout: amount,
                        forfeited_yield: payout.forfeited_yield,
                    },
                )
            }
        };

        if let Err(err) = self.token.transfer(&self.custody, caller, amount) {
            warn!(%id, payout = %amount, error = %err, "payout transfer failed");
            return Err(err.into());
        }

        let position = &mut self.positions[id.index()];
        position.status = status;
        position.closed_at = Some(now);
        position.payout = Some(amount);
        self.stats = stats;
        self.record(now, event);
        info!(%id, owner = %caller, payout = %amount, %status, "position closed");

        self.after_mutation()?;
        Ok(amount)
    }

    fn reject_custody_caller(&self, caller: &AccountId) -> Result<(), LedgerError> {
        if caller == &self.custody {
            warn!(caller = %caller, "custody account cannot deposit");
            return Err(LedgerError::CustodyCaller(caller.clone()));
        }
        Ok(())
    }

    fn record(&mut self, at: Timestamp, event: LedgerEvent) {
        let seq = self.events.len() as u64;
        self.events.push(EventRecord { seq, at, event });
    }

    fn after_mutation(&self) -> Result<(), LedgerError> {
        self.check_invariants()?;
        #[cfg(debug_assertions)]
        self.audit()?;
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn get_tier(&self, id: TierId) -> Result<&Tier, LedgerError> {
        self.tiers.get(id).ok_or(LedgerError::InvalidTier(id))
    }

    pub fn tiers(&self) -> &TierCatalog {
        &self.tiers
    }

    pub fn get_position(&self, id: PositionId) -> Result<&Position, LedgerError> {
        self.positions
            .get(id.index())
            .filter(|p| p.id == id)
            .ok_or(LedgerError::NotFound(id))
    }

    /// All positions, ascending by ID.
    pub fn positions(&self) -> std::slice::Iter<'_, Position> {
        self.positions.iter()
    }

    /// Positions owned by `owner`, ascending by ID.
    ///
    /// The iterator is lazy and `Clone`; cloning it (or calling this again)
    /// restarts the walk from the beginning.
    pub fn positions_of<'a, 'o>(&'a self, owner: &'o AccountId) -> PositionsOf<'a, 'o> {
        debug!(owner = %owner, "listing positions");
        PositionsOf {
            inner: self.positions.iter(),
            owner,
        }
    }

    /// Next ID to be allocated; equals the number of positions ever created.
    pub fn next_position_id(&self) -> u64 {
        self.next_id
    }

    pub fn quote(&self, id: PositionId, now: Timestamp) -> Result<Quote, LedgerError> {
        let position = self.get_position(id)?;
        let tier = self
            .tiers
            .get(position.tier_id)
            .ok_or(LedgerError::InvariantViolation("position references unknown tier"))?;
        Quote::for_position(position, tier, now).ok_or(LedgerError::Overflow)
    }

    pub fn stats(&self) -> &LedgerStats {
        &self.stats
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Events with `seq >= from`.
    pub fn events_since(&self, from: u64) -> &[EventRecord] {
        let start = (from as usize).min(self.events.len());
        &self.events[start..]
    }

    pub fn custody(&self) -> &AccountId {
        &self.custody
    }

    pub fn custody_balance(&self) -> Amount {
        self.token.balance_of(&self.custody)
    }

    /// Custody funds not backing open principal.
    pub fn reward_reserve(&self) -> Amount {
        self.custody_balance()
            .saturating_sub(self.stats.open_principal)
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    /// Mutable access to the token, for minting and approvals.
    ///
    /// Moving funds out of custody through this handle breaks the custody
    /// invariant; the next ledger operation then fails with
    /// `InvariantViolation`.
    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }
}

/// Lazy, restartable iterator over one owner's positions in ID order.
#[derive(Debug, Clone)]
pub struct PositionsOf<'a, 'o> {
    inner: std::slice::Iter<'a, Position>,
    owner: &'o AccountId,
}

impl<'a> Iterator for PositionsOf<'a, '_> {
    type Item = &'a Position;

    fn next(&mut self) -> Option<Self::Item> {
        let owner = self.owner;
        self.inner.find(|p| &p.owner == owner)
    }
}

fn checked_add(a: Amount, b: Amount) -> Result<Amount, LedgerError> {
    a.checked_add(b).ok_or(LedgerError::Overflow)
}
