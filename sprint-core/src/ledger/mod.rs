//! Position ledger: the sprint settlement state machine.
//!
//! ```text
//!                 settle (now >= matures_at)
//!        ┌──────────────────────────────────▶ Settled
//!  Open ─┤
//!        └──────────────────────────────────▶ WithdrawnEarly
//!                 withdraw_early (now < matures_at)
//! ```
//!
//! Both terminal states are absorbing.

pub mod error;
pub mod invariants;
pub mod payout;
pub mod position_ledger;
pub mod shared;
pub mod snapshot;

pub use error::LedgerError;
pub use invariants::AuditReport;
pub use payout::{
    early_exit_yield, maturity_yield, CloseKind, Payout, Quote, BPS_DENOMINATOR,
    EARLY_EXIT_YIELD_DIVISOR,
};
pub use position_ledger::{LedgerStats, PositionLedger, PositionsOf, DEFAULT_CUSTODY};
pub use shared::SharedLedger;
pub use snapshot::{LedgerSnapshot, SnapshotError, SNAPSHOT_VERSION};
