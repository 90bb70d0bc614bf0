//! Thread-safe handle over a position ledger.
//!
//! All ledger operations are serialized through one mutex, so concurrent
//! callers observe a single total order of mutations and never see a
//! half-applied open or close. A poisoned lock surfaces as
//! `LedgerError::LockPoisoned` rather than a panic.

use super::error::LedgerError;
use super::payout::Quote;
use super::position_ledger::{LedgerStats, PositionLedger};
use crate::domain::{AccountId, Amount, Position, PositionId, TierId, Timestamp};
use crate::token::TokenLedger;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct SharedLedger<T> {
    inner: Arc<Mutex<PositionLedger<T>>>,
}

impl<T> Clone for SharedLedger<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: TokenLedger> SharedLedger<T> {
    pub fn new(ledger: PositionLedger<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, PositionLedger<T>>, LedgerError> {
        self.inner.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    pub fn open_position(
        &self,
        caller: &AccountId,
        principal: Amount,
        tier_id: TierId,
        now: Timestamp,
    ) -> Result<PositionId, LedgerError> {
        self.lock()?.open_position(caller, principal, tier_id, now)
    }

    pub fn settle(
        &self,
        caller: &AccountId,
        id: PositionId,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        self.lock()?.settle(caller, id, now)
    }

    pub fn withdraw_early(
        &self,
        caller: &AccountId,
        id: PositionId,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        self.lock()?.withdraw_early(caller, id, now)
    }

    pub fn fund_rewards(
        &self,
        funder: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.lock()?.fund_rewards(funder, amount, now)
    }

    pub fn get_position(&self, id: PositionId) -> Result<Position, LedgerError> {
        self.lock()?.get_position(id).cloned()
    }

    /// Owned copies of `owner`'s positions, ascending by ID.
    pub fn positions_of(&self, owner: &AccountId) -> Result<Vec<Position>, LedgerError> {
        Ok(self.lock()?.positions_of(owner).cloned().collect())
    }

    pub fn next_position_id(&self) -> Result<u64, LedgerError> {
        Ok(self.lock()?.next_position_id())
    }

    pub fn quote(&self, id: PositionId, now: Timestamp) -> Result<Quote, LedgerError> {
        self.lock()?.quote(id, now)
    }

    pub fn stats(&self) -> Result<LedgerStats, LedgerError> {
        Ok(self.lock()?.stats().clone())
    }

    /// Run `f` with exclusive access, e.g. to mint or approve on the token.
    pub fn with<R>(&self, f: impl FnOnce(&mut PositionLedger<T>) -> R) -> Result<R, LedgerError> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }
}
