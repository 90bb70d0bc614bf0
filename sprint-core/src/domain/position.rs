//! Sprint positions and their lifecycle status.

use super::ids::{AccountId, PositionId, TierId};
use super::{Amount, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position lifecycle states.
///
/// The only legal transitions are `Open → Settled` and `Open → WithdrawnEarly`.
/// Both targets are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Open,
    /// Redeemed at or after maturity for principal plus full yield.
    Settled,
    /// Exited before maturity for principal plus half yield.
    WithdrawnEarly,
}

impl PositionStatus {
    pub fn is_open(self) -> bool {
        self == PositionStatus::Open
    }

    pub fn is_terminal(self) -> bool {
        !self.is_open()
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PositionStatus::Open => "open",
            PositionStatus::Settled => "settled",
            PositionStatus::WithdrawnEarly => "withdrawn_early",
        };
        f.write_str(s)
    }
}

/// A single fixed-term deposit record.
///
/// Everything except `status`, `closed_at` and `payout` is fixed at creation.
/// `closed_at` and `payout` are set together with the terminal status and are
/// `None` while the position is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub owner: AccountId,
    pub principal: Amount,
    pub tier_id: TierId,
    pub created_at: Timestamp,
    pub matures_at: Timestamp,
    pub status: PositionStatus,
    #[serde(default)]
    pub closed_at: Option<Timestamp>,
    #[serde(default)]
    pub payout: Option<Amount>,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Mature means eligible for full settlement: `now >= matures_at`.
    pub fn is_mature(&self, now: Timestamp) -> bool {
        now >= self.matures_at
    }

    /// Seconds left until maturity (0 once mature).
    pub fn seconds_to_maturity(&self, now: Timestamp) -> u64 {
        self.matures_at.saturating_sub(now)
    }

    pub fn is_owned_by(&self, account: &AccountId) -> bool {
        &self.owner == account
    }
}
