//! CSV export of positions and events.

use anyhow::{Context, Result};
use sprint_core::domain::{EventRecord, LedgerEvent, Position};
use sprint_core::token::format_units;
use std::path::Path;

/// Export positions as CSV.
///
/// Columns: id, owner, tier, principal, principal_tokens, created_at,
/// matures_at, status, closed_at, payout, payout_tokens
pub fn export_positions_csv<'a>(
    positions: impl IntoIterator<Item = &'a Position>,
    decimals: u8,
) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "id",
        "owner",
        "tier",
        "principal",
        "principal_tokens",
        "created_at",
        "matures_at",
        "status",
        "closed_at",
        "payout",
        "payout_tokens",
    ])?;

    for p in positions {
        wtr.write_record([
            p.id.0.to_string(),
            p.owner.to_string(),
            p.tier_id.0.to_string(),
            p.principal.to_string(),
            format_units(p.principal, decimals),
            p.created_at.to_string(),
            p.matures_at.to_string(),
            p.status.to_string(),
            p.closed_at.map(|t| t.to_string()).unwrap_or_default(),
            p.payout.map(|v| v.to_string()).unwrap_or_default(),
            p.payout
                .map(|v| format_units(v, decimals))
                .unwrap_or_default(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export events as CSV with seq, at, type, position, account, amount columns.
pub fn export_events_csv(events: &[EventRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["seq", "at", "type", "position", "account", "amount"])?;

    for record in events {
        let (account, amount) = match &record.event {
            LedgerEvent::PositionOpened {
                owner, principal, ..
            } => (owner, *principal),
            LedgerEvent::PositionSettled { owner, payout, .. }
            | LedgerEvent::PositionWithdrawnEarly { owner, payout, .. } => (owner, *payout),
            LedgerEvent::RewardsFunded { funder, amount } => (funder, *amount),
        };
        wtr.write_record([
            record.seq.to_string(),
            record.at.to_string(),
            record.event.kind().to_string(),
            record
                .event
                .position_id()
                .map(|id| id.0.to_string())
                .unwrap_or_default(),
            account.to_string(),
            amount.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write `csv` to `path`, creating parent directories.
pub fn write_csv(path: &Path, csv: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))
}
