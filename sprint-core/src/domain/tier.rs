//! Tier catalog: the fixed set of (lock duration, yield rate) sprint tiers.
//!
//! The catalog is built once from an ordered list and never mutated. A tier's
//! ID is its position in that list.

use super::ids::TierId;
use super::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Maximum number of tiers addressable by a `TierId`.
pub const MAX_TIERS: usize = u8::MAX as usize + 1;

/// Errors from building a tier catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("tier catalog must contain at least one tier")]
    Empty,

    #[error("tier catalog has {0} tiers (max 256)")]
    TooMany(usize),

    #[error("duplicate tier name '{0}'")]
    DuplicateName(String),

    #[error("tier at index {index} carries id {found}")]
    MisnumberedTier { index: usize, found: TierId },
}

/// Configuration form of a tier, as written in TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSpec {
    pub name: String,
    /// Seconds a position must age before it matures.
    pub lock_secs: u64,
    /// Yield applied to principal at maturity (100 = 1%).
    pub yield_bps: u32,
}

impl TierSpec {
    pub fn new(name: impl Into<String>, lock_secs: u64, yield_bps: u32) -> Self {
        Self {
            name: name.into(),
            lock_secs,
            yield_bps,
        }
    }
}

/// A configured sprint tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub id: TierId,
    pub name: String,
    pub lock_duration: u64,
    pub yield_rate_bps: u32,
}

impl Tier {
    /// Maturity timestamp for a position created at `created_at`.
    /// `None` if the sum overflows.
    pub fn maturity_for(&self, created_at: Timestamp) -> Option<Timestamp> {
        created_at.checked_add(self.lock_duration)
    }
}

/// Immutable, fixed-size tier table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierCatalog {
    tiers: Vec<Tier>,
}

impl TierCatalog {
    /// Build a catalog from named specs; IDs are assigned by position.
    pub fn new(specs: Vec<TierSpec>) -> Result<Self, CatalogError> {
        if specs.is_empty() {
            return Err(CatalogError::Empty);
        }
        if specs.len() > MAX_TIERS {
            return Err(CatalogError::TooMany(specs.len()));
        }

        let mut seen = HashSet::new();
        let mut tiers = Vec::with_capacity(specs.len());
        for (index, spec) in specs.into_iter().enumerate() {
            if !seen.insert(spec.name.clone()) {
                return Err(CatalogError::DuplicateName(spec.name));
            }
            tiers.push(Tier {
                id: TierId(index as u8),
                name: spec.name,
                lock_duration: spec.lock_secs,
                yield_rate_bps: spec.yield_bps,
            });
        }

        Ok(Self { tiers })
    }

    /// Build a catalog from bare `(lock_duration, yield_rate_bps)` pairs.
    pub fn from_pairs(pairs: &[(u64, u32)]) -> Result<Self, CatalogError> {
        let specs = pairs
            .iter()
            .enumerate()
            .map(|(i, &(lock, bps))| TierSpec::new(format!("tier-{i}"), lock, bps))
            .collect();
        Self::new(specs)
    }

    /// Rebuild a catalog from stored tiers, checking that IDs are positional.
    pub fn from_tiers(tiers: Vec<Tier>) -> Result<Self, CatalogError> {
        if tiers.is_empty() {
            return Err(CatalogError::Empty);
        }
        if tiers.len() > MAX_TIERS {
            return Err(CatalogError::TooMany(tiers.len()));
        }
        let mut seen = HashSet::new();
        for (index, tier) in tiers.iter().enumerate() {
            if tier.id.index() != index {
                return Err(CatalogError::MisnumberedTier {
                    index,
                    found: tier.id,
                });
            }
            if !seen.insert(tier.name.as_str()) {
                return Err(CatalogError::DuplicateName(tier.name.clone()));
            }
        }
        Ok(Self { tiers })
    }

    /// The three sprints offered by the product: Quick (1 min, 1%),
    /// Standard (5 min, 5%), Long (10 min, 10%).
    pub fn sprint_default() -> Self {
        Self {
            tiers: default_tier_specs()
                .into_iter()
                .enumerate()
                .map(|(i, spec)| Tier {
                    id: TierId(i as u8),
                    name: spec.name,
                    lock_duration: spec.lock_secs,
                    yield_rate_bps: spec.yield_bps,
                })
                .collect(),
        }
    }

    pub fn get(&self, id: TierId) -> Option<&Tier> {
        self.tiers.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter()
    }

    pub fn as_slice(&self) -> &[Tier] {
        &self.tiers
    }
}

/// Specs backing [`TierCatalog::sprint_default`].
pub fn default_tier_specs() -> Vec<TierSpec> {
    vec![
        TierSpec::new("Quick Sprint", 60, 100),
        TierSpec::new("Standard Sprint", 300, 500),
        TierSpec::new("Long Sprint", 600, 1_000),
    ]
}
