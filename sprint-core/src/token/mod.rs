//! Token collaborator: the fungible stable-value token the ledger moves funds through.
//!
//! The position ledger only needs three operations from the token:
//! - `transfer_from`: pull a depositor's funds into custody (requires allowance)
//! - `transfer`: push funds out of custody to a recipient
//! - `balance_of`: read-only balance lookup
//!
//! Any conventional fungible token can back the ledger by implementing
//! [`TokenLedger`]. [`MockUsdc`] is the in-memory implementation used by the
//! CLI, the runner, and the tests.

pub mod mock_usdc;
pub mod units;

pub use mock_usdc::MockUsdc;
pub use units::{format_units, parse_units, UnitsError};

use crate::domain::{AccountId, Amount};
use thiserror::Error;

/// Rejections from the token layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("insufficient funds: {account} holds {available}, needs {needed}")]
    InsufficientFunds {
        account: AccountId,
        needed: Amount,
        available: Amount,
    },

    #[error("insufficient allowance: {owner} approved {spender} for {allowed}, needs {needed}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        needed: Amount,
        allowed: Amount,
    },

    #[error("token amount overflow")]
    Overflow,
}

/// Conventional fungible-token operations used by the position ledger.
///
/// Every operation either completes fully or fails leaving balances and
/// allowances untouched.
pub trait TokenLedger {
    /// Balance of `account` (0 for unknown accounts).
    fn balance_of(&self, account: &AccountId) -> Amount;

    /// Move `amount` from `from` to `to`. Fails if `from` holds less than `amount`.
    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount)
        -> Result<(), TokenError>;

    /// Move `amount` from `owner` to `recipient` on behalf of `spender`,
    /// consuming `spender`'s allowance. Fails if `owner`'s balance or the
    /// allowance is below `amount`.
    fn transfer_from(
        &mut self,
        spender: &AccountId,
        owner: &AccountId,
        recipient: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError>;
}
