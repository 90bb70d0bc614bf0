//! Seeded workload simulation.
//!
//! Drives a fresh ledger with a random but reproducible mix of opens,
//! settlements, early exits, reward top-ups, and clock advances. The same
//! seed and config always produce the same final digest, which makes the
//! simulation usable as a determinism check as well as a stress run.

use crate::config::{ConfigError, LedgerConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sprint_core::domain::{AccountId, Amount, PositionId, TierId, Timestamp};
use sprint_core::ledger::{AuditReport, LedgerError, LedgerStats, SnapshotError};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("workload needs at least one account")]
    NoAccounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    pub seed: u64,
    pub accounts: usize,
    pub steps: usize,
    /// Base units minted to (and approved by) each account.
    pub balance: u64,
    /// Base units the treasury puts into the reward reserve up front.
    pub reward_reserve: u64,
    pub max_principal: u64,
    pub max_advance_secs: u64,
    pub start: Timestamp,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            accounts: 8,
            steps: 1_000,
            balance: 1_000_000,
            reward_reserve: 50_000,
            max_principal: 10_000,
            max_advance_secs: 120,
            start: 1_700_000_000,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkloadReport {
    pub seed: u64,
    pub steps: usize,
    pub final_time: Timestamp,
    /// Count of each outcome, keyed `"<action>:<ok|error kind>"`.
    pub outcomes: BTreeMap<String, u64>,
    pub stats: LedgerStats,
    pub audit: AuditReport,
    pub digest: String,
}

const TREASURY: &str = "treasury";

/// Run a seeded workload against a ledger built from `ledger_config`.
pub fn simulate(
    config: &WorkloadConfig,
    ledger_config: &LedgerConfig,
) -> Result<WorkloadReport, WorkloadError> {
    if config.accounts == 0 {
        return Err(WorkloadError::NoAccounts);
    }

    let mut ledger = ledger_config.build_ledger()?;
    let custody = ledger.custody().clone();
    let accounts: Vec<AccountId> = (0..config.accounts)
        .map(|i| AccountId::new(format!("user-{i}")))
        .collect();
    for account in &accounts {
        ledger
            .token_mut()
            .mint(account, config.balance as Amount)
            .map_err(LedgerError::from)?;
        ledger
            .token_mut()
            .approve(account, &custody, config.balance as Amount);
    }
    let treasury = AccountId::new(TREASURY);
    let reserve = config.reward_reserve as Amount;
    ledger
        .token_mut()
        .mint(&treasury, reserve)
        .map_err(LedgerError::from)?;
    ledger.token_mut().approve(&treasury, &custody, reserve);
    if reserve > 0 {
        ledger.fund_rewards(&treasury, reserve, config.start)?;
    }

    let tier_count = ledger.tiers().len();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut now = config.start;
    let mut outcomes: BTreeMap<String, u64> = BTreeMap::new();

    for _ in 0..config.steps {
        let roll = rng.gen_range(0..100u32);
        let (action, result) = match roll {
            0..=39 => {
                let caller = &accounts[rng.gen_range(0..accounts.len())];
                let principal = rng.gen_range(0..=config.max_principal) as Amount;
                // Occasionally pick a tier past the end of the catalog.
                let tier = rng.gen_range(0..=tier_count) as u8;
                let result = ledger.open_position(caller, principal, TierId(tier), now);
                ("open", result.map(|_| ()))
            }
            40..=79 if ledger.next_position_id() > 0 => {
                let id = PositionId(rng.gen_range(0..ledger.next_position_id()));
                let caller = match ledger.get_position(id) {
                    // Mostly the owner, sometimes a random account.
                    Ok(p) if rng.gen_bool(0.9) => p.owner.clone(),
                    _ => accounts[rng.gen_range(0..accounts.len())].clone(),
                };
                if roll < 60 {
                    ("settle", ledger.settle(&caller, id, now).map(|_| ()))
                } else {
                    ("withdraw", ledger.withdraw_early(&caller, id, now).map(|_| ()))
                }
            }
            80..=84 => {
                let amount = rng.gen_range(0..=config.max_principal / 10) as Amount;
                let result = ledger
                    .token_mut()
                    .mint(&treasury, amount)
                    .map_err(LedgerError::from)
                    .and_then(|()| {
                        let allowed = ledger.token().allowance(&treasury, &custody);
                        ledger
                            .token_mut()
                            .approve(&treasury, &custody, allowed.saturating_add(amount));
                        ledger.fund_rewards(&treasury, amount, now)
                    });
                ("fund", result)
            }
            _ => {
                now = now.saturating_add(rng.gen_range(1..=config.max_advance_secs.max(1)));
                ("advance", Ok(()))
            }
        };

        let key = match result {
            Ok(()) => format!("{action}:ok"),
            Err(err) => format!("{action}:{}", err.kind()),
        };
        *outcomes.entry(key).or_default() += 1;
    }

    let audit = ledger.audit()?;
    let digest = ledger.snapshot().digest()?;
    info!(seed = config.seed, steps = config.steps, %digest, "workload complete");

    Ok(WorkloadReport {
        seed: config.seed,
        steps: config.steps,
        final_time: now,
        outcomes,
        stats: ledger.stats().clone(),
        audit,
        digest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::AmountSpec;
    use crate::config::{GenesisMint, TokenConfig};

    fn small(seed: u64) -> WorkloadConfig {
        WorkloadConfig {
            seed,
            steps: 300,
            ..WorkloadConfig::default()
        }
    }

    #[test]
    fn same_seed_same_digest() {
        let ledger_config = LedgerConfig::default();
        let a = simulate(&small(7), &ledger_config).unwrap();
        let b = simulate(&small(7), &ledger_config).unwrap();
        assert_eq!(a.digest, b.digest);
        assert_eq!(a.outcomes, b.outcomes);
    }

    #[test]
    fn different_seeds_diverge() {
        let ledger_config = LedgerConfig::default();
        let a = simulate(&small(1), &ledger_config).unwrap();
        let b = simulate(&small(2), &ledger_config).unwrap();
        assert_ne!(a.digest, b.digest);
    }

    #[test]
    fn outcomes_cover_every_step() {
        let report = simulate(&small(11), &LedgerConfig::default()).unwrap();
        let total: u64 = report.outcomes.values().sum();
        assert_eq!(total, 300);
        assert!(report.outcomes.contains_key("open:ok"));
        assert!(report.audit.open_principal <= report.audit.custody_balance);
    }

    #[test]
    fn setup_mint_overflow_is_reported() {
        let ledger_config = LedgerConfig {
            token: TokenConfig {
                symbol: "mUSDC".to_string(),
                decimals: 0,
            },
            genesis: vec![GenesisMint {
                account: TREASURY.to_string(),
                amount: AmountSpec::Tokens(Amount::MAX.to_string()),
            }],
            ..LedgerConfig::default()
        };
        assert!(matches!(
            simulate(&small(3), &ledger_config),
            Err(WorkloadError::Ledger(LedgerError::Overflow))
        ));
    }

    #[test]
    fn zero_accounts_rejected() {
        let config = WorkloadConfig {
            accounts: 0,
            ..WorkloadConfig::default()
        };
        assert!(matches!(
            simulate(&config, &LedgerConfig::default()),
            Err(WorkloadError::NoAccounts)
        ));
    }
}
