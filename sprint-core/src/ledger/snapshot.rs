//! Ledger snapshots: whole-ledger serialization, restore, and digest.
//!
//! A snapshot captures the tier catalog, position table, allocation counter,
//! stats, event log, and the token state. Restoring re-runs the full audit,
//! so a hand-edited or corrupted file is rejected instead of loaded.
//!
//! The digest is a BLAKE3 hash over the compact JSON form. All maps in the
//! ledger and token are ordered, so identical histories produce identical
//! digests.

use super::error::LedgerError;
use super::position_ledger::{LedgerStats, PositionLedger};
use crate::domain::{AccountId, CatalogError, EventRecord, Position, Tier, TierCatalog};
use crate::token::TokenLedger;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const SNAPSHOT_VERSION: u32 = 1;

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot version {found} (expected 1)")]
    UnsupportedVersion { found: u32 },

    #[error("invalid tier catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("snapshot rejected: {0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot<T> {
    #[serde(default = "default_version")]
    pub schema_version: u32,
    pub custody: AccountId,
    pub tiers: Vec<Tier>,
    pub next_position_id: u64,
    pub positions: Vec<Position>,
    pub stats: LedgerStats,
    #[serde(default)]
    pub events: Vec<EventRecord>,
    pub token: T,
}

impl<T: TokenLedger + Clone> PositionLedger<T> {
    pub fn snapshot(&self) -> LedgerSnapshot<T> {
        LedgerSnapshot {
            schema_version: SNAPSHOT_VERSION,
            custody: self.custody.clone(),
            tiers: self.tiers.as_slice().to_vec(),
            next_position_id: self.next_id,
            positions: self.positions.clone(),
            stats: self.stats.clone(),
            events: self.events.clone(),
            token: self.token.clone(),
        }
    }
}

impl<T: TokenLedger> PositionLedger<T> {
    /// Rebuild a ledger from a snapshot, rejecting it unless it passes a full audit.
    pub fn restore(snapshot: LedgerSnapshot<T>) -> Result<Self, SnapshotError> {
        if snapshot.schema_version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.schema_version,
            });
        }
        let ledger = Self {
            tiers: TierCatalog::from_tiers(snapshot.tiers)?,
            custody: snapshot.custody,
            token: snapshot.token,
            positions: snapshot.positions,
            next_id: snapshot.next_position_id,
            stats: snapshot.stats,
            events: snapshot.events,
        };
        ledger.audit()?;
        Ok(ledger)
    }
}

impl<T: Serialize> LedgerSnapshot<T> {
    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// BLAKE3 hex digest of the compact JSON encoding.
    pub fn digest(&self) -> Result<String, SnapshotError> {
        let bytes = serde_json::to_vec(self)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }

    /// Write to `path` via a sibling temp file and rename.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = self.to_json_pretty()?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl<T: DeserializeOwned> LedgerSnapshot<T> {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
