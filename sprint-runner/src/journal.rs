//! Event journal: JSONL append-only persistence of ledger events.
//!
//! One `EventRecord` per line. Appending only writes records past the
//! journal's last sequence number, so re-exporting the same ledger is
//! idempotent. Malformed lines are skipped on read.

use serde_json::Error as JsonError;
use sprint_core::domain::EventRecord;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("journal encode error: {0}")]
    Json(#[from] JsonError),
}

pub struct EventJournal {
    path: PathBuf,
}

impl EventJournal {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append the records newer than the journal's last sequence number.
    ///
    /// Returns the number of lines written.
    pub fn append(&self, records: &[EventRecord]) -> Result<usize, JournalError> {
        let next_seq = self.last_seq()?.map_or(0, |seq| seq + 1);
        let fresh: Vec<&EventRecord> = records.iter().filter(|r| r.seq >= next_seq).collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        for record in &fresh {
            let json = serde_json::to_string(record)?;
            writeln!(file, "{json}")?;
        }
        file.flush()?;

        Ok(fresh.len())
    }

    /// Read all records, skipping blank and malformed lines.
    pub fn read_all(&self) -> Result<Vec<EventRecord>, JournalError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = io::BufReader::new(fs::File::open(&self.path)?);
        let mut records = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<EventRecord>(&line) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(path = %self.path.display(), line = line_no + 1, error = %err, "skipping malformed journal line");
                }
            }
        }
        Ok(records)
    }

    pub fn last_seq(&self) -> Result<Option<u64>, JournalError> {
        Ok(self.read_all()?.iter().map(|r| r.seq).max())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprint_core::domain::{AccountId, LedgerEvent, PositionId, TierId};
    use sprint_core::token::parse_units;

    fn funded(seq: u64) -> EventRecord {
        EventRecord {
            seq,
            at: 100 + seq,
            event: LedgerEvent::RewardsFunded {
                funder: AccountId::new("treasury"),
                amount: 10,
            },
        }
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let journal = EventJournal::new(dir.path().join("events.jsonl"));
        assert!(journal.read_all().unwrap().is_empty());
        assert_eq!(journal.last_seq().unwrap(), None);
    }

    #[test]
    fn append_is_incremental() {
        let dir = tempfile::tempdir().unwrap();
        let journal = EventJournal::new(dir.path().join("nested/events.jsonl"));

        assert_eq!(journal.append(&[funded(0), funded(1)]).unwrap(), 2);
        assert_eq!(journal.append(&[funded(0), funded(1), funded(2)]).unwrap(), 1);
        assert_eq!(journal.append(&[funded(0)]).unwrap(), 0);

        let seqs: Vec<u64> = journal.read_all().unwrap().iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let good = serde_json::to_string(&funded(0)).unwrap();
        fs::write(&path, format!("{good}\nnot json\n\n{{\"seq\": 1}}\n")).unwrap();

        let records = EventJournal::new(path).read_all().unwrap();
        assert_eq!(records, vec![funded(0)]);
    }

    #[test]
    fn eighteen_decimal_events_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let journal = EventJournal::new(dir.path().join("events.jsonl"));
        let opened = EventRecord {
            seq: 0,
            at: 1_700_000_000,
            event: LedgerEvent::PositionOpened {
                id: PositionId(0),
                owner: AccountId::new("alice"),
                principal: parse_units("100", 18).unwrap(),
                tier_id: TierId::QUICK,
                matures_at: 1_700_000_060,
            },
        };

        assert_eq!(journal.append(std::slice::from_ref(&opened)).unwrap(), 1);
        assert_eq!(journal.read_all().unwrap(), vec![opened.clone()]);
        assert_eq!(journal.last_seq().unwrap(), Some(0));
        assert_eq!(journal.append(&[opened]).unwrap(), 0);
    }
}
