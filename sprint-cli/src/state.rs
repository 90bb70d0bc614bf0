//! State file handling and display helpers.

use anyhow::{bail, Context, Result};
use sprint_core::domain::{Amount, Position, Timestamp};
use sprint_core::ledger::{LedgerSnapshot, PositionLedger};
use sprint_core::token::{format_units, parse_units, MockUsdc};
use std::path::Path;
use tracing::debug;

pub type Ledger = PositionLedger<MockUsdc>;

/// Load and audit the ledger stored at `path`.
pub fn load(path: &Path) -> Result<Ledger> {
    if !path.exists() {
        bail!(
            "no ledger state at {} (run `sprints init` first)",
            path.display()
        );
    }
    let snapshot = LedgerSnapshot::<MockUsdc>::load(path)
        .with_context(|| format!("failed to read ledger state {}", path.display()))?;
    let ledger = PositionLedger::restore(snapshot)
        .with_context(|| format!("ledger state {} failed audit", path.display()))?;
    debug!(path = %path.display(), positions = ledger.next_position_id(), "state loaded");
    Ok(ledger)
}

pub fn save(ledger: &Ledger, path: &Path) -> Result<()> {
    ledger
        .snapshot()
        .save(path)
        .with_context(|| format!("failed to write ledger state {}", path.display()))?;
    debug!(path = %path.display(), "state saved");
    Ok(())
}

/// Current Unix time, unless overridden.
pub fn resolve_now(now: Option<Timestamp>) -> Result<Timestamp> {
    match now {
        Some(now) => Ok(now),
        None => u64::try_from(chrono::Utc::now().timestamp()).context("system clock before 1970"),
    }
}

/// Parse a token amount in display units (`"100.5"`).
pub fn parse_amount(ledger: &Ledger, text: &str) -> Result<Amount> {
    parse_units(text, ledger.token().decimals)
        .with_context(|| format!("invalid amount '{text}'"))
}

pub fn display_amount(ledger: &Ledger, amount: Amount) -> String {
    format!(
        "{} {}",
        format_units(amount, ledger.token().decimals),
        ledger.token().symbol
    )
}

pub fn format_time(ts: Timestamp) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

pub fn position_line(ledger: &Ledger, p: &Position) -> String {
    let tier = ledger
        .tiers()
        .get(p.tier_id)
        .map(|t| t.name.as_str())
        .unwrap_or("?");
    let mut line = format!(
        "{:<6} {:<16} {:<16} {:>24}  matures {}  {}",
        p.id.to_string(),
        p.owner.to_string(),
        tier,
        display_amount(ledger, p.principal),
        format_time(p.matures_at),
        p.status
    );
    if let Some(payout) = p.payout {
        line.push_str(&format!("  paid {}", display_amount(ledger, payout)));
    }
    line
}
