//! CSV export of saved results.
//!
//! One row per history entry. Inputs and result values are flattened into
//! `key=value` lists so every calculator fits the same columns.

use crate::history::HistoryEntry;
use crate::Result;
use chrono::{TimeZone, Utc};
use std::fs::OpenOptions;
use std::path::Path;

/// Column names, matching the field order of [`CsvRow`]
const HEADERS: [&str; 6] = ["id", "saved_at", "calculator_id", "calculated_at", "inputs", "results"];

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    saved_at: String,
    calculator_id: String,
    calculated_at: String,
    inputs: String,
    results: String,
}

impl From<&HistoryEntry> for CsvRow {
    fn from(entry: &HistoryEntry) -> Self {
        let result = &entry.result;
        let calculated_at = Utc
            .timestamp_millis_opt(result.timestamp())
            .single()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| result.timestamp().to_string());

        CsvRow {
            id: entry.id.to_string(),
            saved_at: entry.saved_at.to_rfc3339(),
            calculator_id: result.calculator_id().to_string(),
            calculated_at,
            inputs: flatten(result.input_values().iter()),
            results: flatten(result.result_values().iter()),
        }
    }
}

fn flatten<'a>(pairs: impl Iterator<Item = (&'a String, &'a String)>) -> String {
    pairs
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Write `entries` to `csv_path`, replacing any existing file.
///
/// The file is fsynced before returning. Returns the number of rows written.
pub fn export_csv(entries: &[HistoryEntry], csv_path: &Path) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(csv_path)?;

    let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(file);
    // serialize() only emits headers alongside the first row
    if entries.is_empty() {
        writer.write_record(HEADERS)?;
    }
    for entry in entries {
        writer.serialize(CsvRow::from(entry))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} results to {:?}", entries.len(), csv_path);
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{input_set, CalculationResult};
    use crate::calculators::bmi::Bmi;
    use crate::Calculator;

    fn bmi_entry(weight: &str) -> HistoryEntry {
        let inputs = input_set([("weight", weight), ("height", "170")]);
        let result: CalculationResult = Bmi.calculate_at(&inputs, 0).unwrap();
        HistoryEntry::new(result)
    }

    #[test]
    fn test_export_writes_header_and_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("out").join("results.csv");

        let entries = vec![bmi_entry("70"), bmi_entry("90")];
        let count = export_csv(&entries, &csv_path).unwrap();
        assert_eq!(count, 2);

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            HEADERS
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][2], "bmi");
        assert_eq!(&rows[0][3], "1970-01-01T00:00:00+00:00");
        assert_eq!(&rows[0][4], "height=170; weight=70");
        assert!(rows[0][5].contains("bmi=24.2"));
    }

    #[test]
    fn test_export_replaces_previous_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("results.csv");

        export_csv(&[bmi_entry("70"), bmi_entry("80")], &csv_path).unwrap();
        export_csv(&[bmi_entry("60")], &csv_path).unwrap();

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 1);
    }

    #[test]
    fn test_empty_export_writes_header_only() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("results.csv");

        assert_eq!(export_csv(&[], &csv_path).unwrap(), 0);
        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.headers().unwrap().iter().collect::<Vec<_>>(), HEADERS);
        assert_eq!(reader.into_records().count(), 0);
    }
}
