//! Sprint Runner: configuration, scripted replay, and simulation on top of `sprint-core`.
//!
//! This crate provides:
//! - TOML ledger configuration (custody, token, tiers, genesis mints)
//! - Scenario scripts with per-step expectations and strict mode
//! - Seeded workload simulation ending in a full audit and digest
//! - JSONL event journal
//! - CSV export of positions and events

pub mod amount;
pub mod config;
pub mod export;
pub mod journal;
pub mod scenario;
pub mod workload;

pub use amount::AmountSpec;
pub use config::{ConfigError, GenesisMint, LedgerConfig, TokenConfig};
pub use export::{export_events_csv, export_positions_csv, write_csv};
pub use journal::{EventJournal, JournalError};
pub use scenario::{
    Scenario, ScenarioError, ScenarioReport, ScenarioStep, StepAction, StepOutcome, EXPECT_OK,
};
pub use workload::{simulate, WorkloadConfig, WorkloadError, WorkloadReport};
