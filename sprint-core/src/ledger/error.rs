use crate::domain::{AccountId, Amount, PositionId, PositionStatus, TierId, Timestamp};
use crate::token::TokenError;
use thiserror::Error;

/// Errors from position ledger operations.
///
/// Every variant is a deterministic outcome of the caller's input or timing;
/// none is transient and the ledger never retries. A call that returns an
/// error has left ledger and token state exactly as it found them, with one
/// exception: `InvariantViolation` from the post-commit check reports
/// corruption found after the call's effects were applied, and those effects
/// stay in place.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("tier {0} does not exist")]
    InvalidTier(TierId),

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("insufficient funds: {account} holds {available}, needs {needed}")]
    InsufficientFunds {
        account: AccountId,
        needed: Amount,
        available: Amount,
    },

    #[error("insufficient allowance: {owner} approved {allowed}, needs {needed}")]
    InsufficientAllowance {
        owner: AccountId,
        needed: Amount,
        allowed: Amount,
    },

    #[error("position {0} not found")]
    NotFound(PositionId),

    #[error("{caller} does not own position {id}")]
    Unauthorized { id: PositionId, caller: AccountId },

    #[error("custody account {0} cannot deposit into itself")]
    CustodyCaller(AccountId),

    #[error("position {id} is already closed ({status})")]
    AlreadyClosed { id: PositionId, status: PositionStatus },

    #[error("position {id} matures at {matures_at}, now is {now}")]
    NotMature {
        id: PositionId,
        matures_at: Timestamp,
        now: Timestamp,
    },

    #[error("position {id} matured at {matures_at}; settle instead")]
    AlreadyMature { id: PositionId, matures_at: Timestamp },

    #[error("reward reserve {available} cannot cover yield {needed}")]
    ReserveShortfall { needed: Amount, available: Amount },

    #[error("arithmetic overflow")]
    Overflow,

    #[error("ledger invariant violated: {0}")]
    InvariantViolation(&'static str),

    #[error("ledger lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    /// Stable snake_case name of the variant, used by scenario expectations.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InvalidTier(_) => "invalid_tier",
            LedgerError::ZeroAmount => "zero_amount",
            LedgerError::InsufficientFunds { .. } => "insufficient_funds",
            LedgerError::InsufficientAllowance { .. } => "insufficient_allowance",
            LedgerError::NotFound(_) => "not_found",
            LedgerError::Unauthorized { .. } => "unauthorized",
            LedgerError::CustodyCaller(_) => "custody_caller",
            LedgerError::AlreadyClosed { .. } => "already_closed",
            LedgerError::NotMature { .. } => "not_mature",
            LedgerError::AlreadyMature { .. } => "already_mature",
            LedgerError::ReserveShortfall { .. } => "reserve_shortfall",
            LedgerError::Overflow => "overflow",
            LedgerError::InvariantViolation(_) => "invariant_violation",
            LedgerError::LockPoisoned => "lock_poisoned",
        }
    }
}

impl From<TokenError> for LedgerError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InsufficientFunds {
                account,
                needed,
                available,
            } => LedgerError::InsufficientFunds {
                account,
                needed,
                available,
            },
            TokenError::InsufficientAllowance {
                owner,
                needed,
                allowed,
                ..
            } => LedgerError::InsufficientAllowance {
                owner,
                needed,
                allowed,
            },
            TokenError::Overflow => LedgerError::Overflow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_errors_map_to_ledger_taxonomy() {
        let err: LedgerError = TokenError::InsufficientAllowance {
            owner: AccountId::new("alice"),
            spender: AccountId::new("custody"),
            needed: 10,
            allowed: 3,
        }
        .into();
        assert_eq!(err.kind(), "insufficient_allowance");

        let err: LedgerError = TokenError::Overflow.into();
        assert_eq!(err, LedgerError::Overflow);
    }

    #[test]
    fn messages_name_the_position() {
        let err = LedgerError::AlreadyClosed {
            id: PositionId(3),
            status: PositionStatus::Settled,
        };
        assert_eq!(err.to_string(), "position #3 is already closed (settled)");
    }
}
