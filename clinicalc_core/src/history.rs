//! Saved calculation history.
//!
//! Results are appended to a JSONL (JSON Lines) file with file locking so
//! that several processes can record results at once. The engine itself
//! never touches this module; callers hand finished results to a
//! [`ResultSink`].

use crate::types::CalculationResult;
use crate::Result;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File name of the history inside the data directory
pub const HISTORY_FILE: &str = "history.jsonl";

/// One saved result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub result: CalculationResult,
}

impl HistoryEntry {
    pub fn new(result: CalculationResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            saved_at: Utc::now(),
            result,
        }
    }
}

/// Destination for finished calculation results
pub trait ResultSink {
    fn record(&mut self, result: &CalculationResult) -> Result<HistoryEntry>;
}

/// JSONL-backed history with file locking
pub struct JsonlHistory {
    path: PathBuf,
}

impl JsonlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append an already-built entry
    pub fn append(&mut self, entry: &HistoryEntry) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!(
            "Saved {} result {} to history",
            entry.result.calculator_id(),
            entry.id
        );
        Ok(())
    }
}

impl ResultSink for JsonlHistory {
    fn record(&mut self, result: &CalculationResult) -> Result<HistoryEntry> {
        let entry = HistoryEntry::new(result.clone());
        self.append(&entry)?;
        Ok(entry)
    }
}

/// Read every entry from a history file, oldest first.
///
/// A missing file is an empty history. Lines that do not parse are skipped
/// with a warning.
pub fn read_history(path: &Path) -> Result<Vec<HistoryEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<HistoryEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Skipping history line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} history entries", entries.len());
    Ok(entries)
}

/// Most recent entries first, optionally for one calculator only
pub fn recent(entries: &[HistoryEntry], calculator_id: Option<&str>, limit: usize) -> Vec<HistoryEntry> {
    let mut selected: Vec<HistoryEntry> = entries
        .iter()
        .filter(|e| calculator_id.map_or(true, |id| e.result.calculator_id() == id))
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
    selected.truncate(limit);
    selected
}
