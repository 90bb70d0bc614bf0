//! Domain types for StableSprints

pub mod event;
pub mod ids;
pub mod position;
pub mod tier;

pub use event::{EventRecord, LedgerEvent};
pub use ids::{AccountId, PositionId, TierId};
pub use position::{Position, PositionStatus};
pub use tier::{default_tier_specs, CatalogError, Tier, TierCatalog, TierSpec, MAX_TIERS};

/// Token amount in base units (no fractional units below 1).
pub type Amount = u128;

/// Unix timestamp in seconds.
pub type Timestamp = u64;
