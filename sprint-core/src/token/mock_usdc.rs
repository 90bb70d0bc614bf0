//! In-memory fungible token with mint, approve, and allowance-checked transfers.

use super::{TokenError, TokenLedger};
use crate::domain::{AccountId, Amount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mock stable-value token.
///
/// Balances and allowances live in ordered maps so that serialized state is
/// byte-stable (snapshot digests depend on it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockUsdc {
    pub symbol: String,
    pub decimals: u8,
    total_supply: Amount,
    balances: BTreeMap<AccountId, Amount>,
    /// owner → spender → remaining allowance
    allowances: BTreeMap<AccountId, BTreeMap<AccountId, Amount>>,
}

impl Default for MockUsdc {
    fn default() -> Self {
        Self::new("mUSDC", 18)
    }
}

impl MockUsdc {
    pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    /// Create `amount` new tokens for `to`.
    pub fn mint(&mut self, to: &AccountId, amount: Amount) -> Result<(), TokenError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.total_supply = supply;
        self.balances.insert(to.clone(), balance);
        Ok(())
    }

    /// Set (not add to) `spender`'s allowance over `owner`'s funds.
    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        let entry = self.allowances.entry(owner.clone()).or_default();
        if amount == 0 {
            entry.remove(spender);
        } else {
            entry.insert(spender.clone(), amount);
        }
        if entry.is_empty() {
            self.allowances.remove(owner);
        }
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|m| m.get(spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// All non-zero balances, ordered by account.
    pub fn balances(&self) -> impl Iterator<Item = (&AccountId, Amount)> {
        self.balances.iter().map(|(a, b)| (a, *b))
    }

    fn set_balance(&mut self, account: &AccountId, amount: Amount) {
        if amount == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), amount);
        }
    }

    /// Validate and apply a balance move. Nothing changes on error.
    fn move_funds(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientFunds {
                account: from.clone(),
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.set_balance(from, available - amount);
        self.set_balance(to, credited);
        Ok(())
    }
}

impl TokenLedger for MockUsdc {
    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.move_funds(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &AccountId,
        owner: &AccountId,
        recipient: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let available = self.balance_of(owner);
        if available < amount {
            return Err(TokenError::InsufficientFunds {
                account: owner.clone(),
                needed: amount,
                available,
            });
        }
        let allowed = self.allowance(owner, spender);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: owner.clone(),
                spender: spender.clone(),
                needed: amount,
                allowed,
            });
        }

        self.move_funds(owner, recipient, amount)?;
        self.approve(owner, spender, allowed - amount);
        Ok(())
    }
}
