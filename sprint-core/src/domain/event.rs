//! Ledger events: the append-only record of every successful mutation.

use super::ids::{AccountId, PositionId, TierId};
use super::{Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// What happened.
///
/// Externally tagged (`{"position_settled": {..}}`): serde_json reads the
/// `u128` amounts directly only when the variant body is not buffered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    PositionOpened {
        id: PositionId,
        owner: AccountId,
        principal: Amount,
        tier_id: TierId,
        matures_at: Timestamp,
    },
    PositionSettled {
        id: PositionId,
        owner: AccountId,
        payout: Amount,
    },
    PositionWithdrawnEarly {
        id: PositionId,
        owner: AccountId,
        payout: Amount,
        forfeited_yield: Amount,
    },
    RewardsFunded {
        funder: AccountId,
        amount: Amount,
    },
}

impl LedgerEvent {
    /// Position the event refers to, if any.
    pub fn position_id(&self) -> Option<PositionId> {
        match self {
            LedgerEvent::PositionOpened { id, .. }
            | LedgerEvent::PositionSettled { id, .. }
            | LedgerEvent::PositionWithdrawnEarly { id, .. } => Some(*id),
            LedgerEvent::RewardsFunded { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::PositionOpened { .. } => "position_opened",
            LedgerEvent::PositionSettled { .. } => "position_settled",
            LedgerEvent::PositionWithdrawnEarly { .. } => "position_withdrawn_early",
            LedgerEvent::RewardsFunded { .. } => "rewards_funded",
        }
    }
}

/// Sequence-numbered event as stored in the ledger's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// 0-based, gapless.
    pub seq: u64,
    pub at: Timestamp,
    pub event: LedgerEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_json_is_keyed_by_kind() {
        let event = LedgerEvent::PositionSettled {
            id: PositionId(4),
            owner: AccountId::new("alice"),
            payout: 101,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json[event.kind()]["id"], 4);
        assert_eq!(json[event.kind()]["payout"], 101);
    }

    #[test]
    fn eighteen_decimal_amounts_decode_exactly() {
        // 100 tokens at 18 decimals is past u64::MAX.
        let principal: Amount = 100 * 10u128.pow(18);
        let record = EventRecord {
            seq: 0,
            at: 1_700_000_000,
            event: LedgerEvent::PositionOpened {
                id: PositionId(0),
                owner: AccountId::new("alice"),
                principal,
                tier_id: TierId::QUICK,
                matures_at: 1_700_000_060,
            },
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("100000000000000000000"));
        let decoded: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, record);

        let small = LedgerEvent::RewardsFunded {
            funder: AccountId::new("treasury"),
            amount: 50_000,
        };
        let decoded: LedgerEvent =
            serde_json::from_str(&serde_json::to_string(&small).unwrap()).unwrap();
        assert_eq!(decoded, small);
    }

    #[test]
    fn position_id_extraction() {
        let funded = LedgerEvent::RewardsFunded {
            funder: AccountId::new("treasury"),
            amount: 5,
        };
        assert_eq!(funded.position_id(), None);
        assert_eq!(funded.kind(), "rewards_funded");

        let opened = LedgerEvent::PositionOpened {
            id: PositionId(9),
            owner: AccountId::new("bob"),
            principal: 1,
            tier_id: TierId::LONG,
            matures_at: 600,
        };
        assert_eq!(opened.position_id(), Some(PositionId(9)));
    }
}
