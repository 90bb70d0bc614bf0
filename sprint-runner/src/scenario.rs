//! Scripted scenario replay.
//!
//! A scenario is a TOML script: a ledger config, a start time, and an ordered
//! list of steps. Each step may carry an expected outcome (`"ok"` or an error
//! kind such as `"not_mature"`). Replay runs every step against a fresh
//! ledger and reports per-step outcomes; a mismatch is recorded, or aborts the
//! replay when the scenario is `strict`.
//!
//! ```toml
//! name = "quick sprint"
//! strict = true
//! start = 1_700_000_000
//!
//! [[steps]]
//! action = "open"
//! account = "alice"
//! amount = "100"
//! tier = 0
//!
//! [[steps]]
//! action = "advance"
//! secs = 60
//! ```

use crate::amount::AmountSpec;
use crate::config::{ConfigError, LedgerConfig};
use serde::{Deserialize, Serialize};
use sprint_core::domain::{AccountId, Amount, PositionId, TierId, Timestamp};
use sprint_core::ledger::{LedgerError, LedgerSnapshot, PositionLedger, SnapshotError};
use sprint_core::token::{MockUsdc, UnitsError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Expected outcome meaning success.
pub const EXPECT_OK: &str = "ok";

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid scenario TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("scenario ledger config: {0}")]
    Config(#[from] ConfigError),

    #[error("step {step}: {source}")]
    Amount { step: usize, source: UnitsError },

    #[error("step {step} ({action}): expected {expected}, got {actual}")]
    ExpectationFailed {
        step: usize,
        action: &'static str,
        expected: String,
        actual: String,
    },

    #[error("snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    Mint { account: String, amount: AmountSpec },
    /// Approve the custody account to pull `amount` from `account`.
    Approve { account: String, amount: AmountSpec },
    Fund { account: String, amount: AmountSpec },
    Open {
        account: String,
        amount: AmountSpec,
        tier: u8,
    },
    Settle { account: String, position: u64 },
    Withdraw { account: String, position: u64 },
    Advance { secs: u64 },
}

impl StepAction {
    pub fn name(&self) -> &'static str {
        match self {
            StepAction::Mint { .. } => "mint",
            StepAction::Approve { .. } => "approve",
            StepAction::Fund { .. } => "fund",
            StepAction::Open { .. } => "open",
            StepAction::Settle { .. } => "settle",
            StepAction::Withdraw { .. } => "withdraw",
            StepAction::Advance { .. } => "advance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStep {
    #[serde(flatten)]
    pub action: StepAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    /// Abort on the first expectation mismatch.
    #[serde(default)]
    pub strict: bool,
    /// Clock value before the first step.
    #[serde(default)]
    pub start: Timestamp,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
}

/// Result of one replayed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub index: usize,
    pub action: String,
    pub at: Timestamp,
    /// `"ok"` or the error kind.
    pub outcome: String,
    /// Position id, payout, new clock value, or the error message.
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    pub matched: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub steps: Vec<StepOutcome>,
    pub mismatches: usize,
    pub final_time: Timestamp,
    pub digest: String,
    pub snapshot: LedgerSnapshot<MockUsdc>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.mismatches == 0
    }
}

impl Scenario {
    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(content)?)
    }

    /// Replay against a fresh ledger built from `self.ledger`.
    pub fn replay(&self) -> Result<ScenarioReport, ScenarioError> {
        let ledger = self.ledger.build_ledger()?;
        self.replay_on(ledger, self.start)
    }

    /// Replay against an existing ledger, starting the clock at `start`.
    pub fn replay_on(
        &self,
        mut ledger: PositionLedger<MockUsdc>,
        start: Timestamp,
    ) -> Result<ScenarioReport, ScenarioError> {
        let decimals = ledger.token().decimals;
        let mut now = start;
        let mut steps = Vec::with_capacity(self.steps.len());
        let mut mismatches = 0;

        for (index, step) in self.steps.iter().enumerate() {
            let result = run_step(&mut ledger, &step.action, &mut now, decimals)
                .map_err(|source| ScenarioError::Amount { step: index, source })?;
            let (outcome, detail) = match result {
                Ok(detail) => (EXPECT_OK.to_string(), detail),
                Err(err) => (err.kind().to_string(), err.to_string()),
            };
            let matched = step.expect.as_deref().map_or(true, |e| e == outcome);
            debug!(step = index, action = step.action.name(), %outcome, "step replayed");

            if !matched {
                mismatches += 1;
                let expected = step.expect.clone().unwrap_or_default();
                warn!(step = index, action = step.action.name(), %expected, actual = %outcome, "expectation mismatch");
                if self.strict {
                    return Err(ScenarioError::ExpectationFailed {
                        step: index,
                        action: step.action.name(),
                        expected,
                        actual: outcome,
                    });
                }
            }

            steps.push(StepOutcome {
                index,
                action: step.action.name().to_string(),
                at: now,
                outcome,
                detail,
                expected: step.expect.clone(),
                matched,
            });
        }

        let snapshot = ledger.snapshot();
        let digest = snapshot.digest()?;
        info!(scenario = %self.name, steps = steps.len(), mismatches, %digest, "scenario replayed");

        Ok(ScenarioReport {
            name: self.name.clone(),
            steps,
            mismatches,
            final_time: now,
            digest,
            snapshot,
        })
    }
}

/// Execute one step. The outer error is a malformed amount; the inner
/// result is the ledger's verdict.
fn run_step(
    ledger: &mut PositionLedger<MockUsdc>,
    action: &StepAction,
    now: &mut Timestamp,
    decimals: u8,
) -> Result<Result<String, LedgerError>, UnitsError> {
    let resolve = |amount: &AmountSpec| -> Result<Amount, UnitsError> { amount.resolve(decimals) };

    let result = match action {
        StepAction::Mint { account, amount } => {
            let amount = resolve(amount)?;
            ledger
                .token_mut()
                .mint(&AccountId::new(account.as_str()), amount)
                .map(|()| amount.to_string())
                .map_err(LedgerError::from)
        }
        StepAction::Approve { account, amount } => {
            let amount = resolve(amount)?;
            let custody = ledger.custody().clone();
            ledger
                .token_mut()
                .approve(&AccountId::new(account.as_str()), &custody, amount);
            Ok(amount.to_string())
        }
        StepAction::Fund { account, amount } => {
            let amount = resolve(amount)?;
            ledger
                .fund_rewards(&AccountId::new(account.as_str()), amount, *now)
                .map(|()| amount.to_string())
        }
        StepAction::Open {
            account,
            amount,
            tier,
        } => {
            let amount = resolve(amount)?;
            ledger
                .open_position(&AccountId::new(account.as_str()), amount, TierId(*tier), *now)
                .map(|id| id.to_string())
        }
        StepAction::Settle { account, position } => ledger
            .settle(&AccountId::new(account.as_str()), PositionId(*position), *now)
            .map(|payout| payout.to_string()),
        StepAction::Withdraw { account, position } => ledger
            .withdraw_early(&AccountId::new(account.as_str()), PositionId(*position), *now)
            .map(|payout| payout.to_string()),
        StepAction::Advance { secs } => match now.checked_add(*secs) {
            Some(next) => {
                *now = next;
                Ok(next.to_string())
            }
            None => Err(LedgerError::Overflow),
        },
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUICK: &str = r#"
name = "quick"
start = 1000

[[steps]]
action = "mint"
account = "alice"
amount = 1000

[[steps]]
action = "approve"
account = "alice"
amount = 1000

[[steps]]
action = "open"
account = "alice"
amount = 100
tier = 0
expect = "ok"

[[steps]]
action = "settle"
account = "alice"
position = 0
expect = "not_mature"

[[steps]]
action = "advance"
secs = 60

[[steps]]
action = "settle"
account = "alice"
position = 0
expect = "reserve_shortfall"
"#;

    #[test]
    fn parses_tagged_steps() {
        let scenario = Scenario::from_toml(QUICK).unwrap();
        assert_eq!(scenario.steps.len(), 6);
        assert_eq!(
            scenario.steps[2].action,
            StepAction::Open {
                account: "alice".into(),
                amount: AmountSpec::Base(100),
                tier: 0
            }
        );
        assert_eq!(scenario.steps[3].expect.as_deref(), Some("not_mature"));
    }

    #[test]
    fn replay_records_outcomes() {
        let report = Scenario::from_toml(QUICK).unwrap().replay().unwrap();
        assert!(report.passed());
        let outcomes: Vec<&str> = report.steps.iter().map(|s| s.outcome.as_str()).collect();
        assert_eq!(
            outcomes,
            vec!["ok", "ok", "ok", "not_mature", "ok", "reserve_shortfall"]
        );
        assert_eq!(report.steps[2].detail, "#0");
        assert_eq!(report.final_time, 1060);
    }

    #[test]
    fn lenient_replay_counts_mismatches() {
        let mut scenario = Scenario::from_toml(QUICK).unwrap();
        scenario.steps[3].expect = Some("ok".into());
        let report = scenario.replay().unwrap();
        assert_eq!(report.mismatches, 1);
        assert!(!report.steps[3].matched);
    }

    #[test]
    fn strict_replay_aborts() {
        let mut scenario = Scenario::from_toml(QUICK).unwrap();
        scenario.strict = true;
        scenario.steps[3].expect = Some("ok".into());
        let err = scenario.replay().unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::ExpectationFailed { step: 3, .. }
        ));
    }

    #[test]
    fn bad_amount_is_a_script_error() {
        let mut scenario = Scenario::from_toml(QUICK).unwrap();
        scenario.steps[0].action = StepAction::Mint {
            account: "alice".into(),
            amount: AmountSpec::from("lots"),
        };
        assert!(matches!(
            scenario.replay(),
            Err(ScenarioError::Amount { step: 0, .. })
        ));
    }

    #[test]
    fn replay_is_deterministic() {
        let scenario = Scenario::from_toml(QUICK).unwrap();
        let a = scenario.replay().unwrap();
        let b = scenario.replay().unwrap();
        assert_eq!(a.digest, b.digest);
    }
}
