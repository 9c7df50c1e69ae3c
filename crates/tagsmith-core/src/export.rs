//! Result export: JSON and CSV writers over collected records.
//!
//! Records are open-shaped maps, so the CSV header is the union of every
//! key seen across the batch, in first-seen order. Missing cells stay
//! empty. The CSV starts with a UTF-8 BOM so spreadsheet tools detect the
//! encoding for non-ASCII analysis text.

use crate::error::{EngineError, Result};
use crate::naming::{FILE_NAME_KEY, FILE_PATH_KEY};
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tagsmith_abstraction::Record;
use tracing::info;

/// Writes all records as a pretty-printed JSON array.
pub fn write_json(path: &Path, records: &[Record]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| EngineError::Export(format!("failed to serialize records: {e}")))?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), records = records.len(), "wrote JSON export");
    Ok(())
}

/// Writes all records as CSV with a BOM and a header covering every key.
pub fn write_csv(path: &Path, records: &[Record]) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all("\u{FEFF}".as_bytes())?;
    let mut writer = csv::Writer::from_writer(file);

    let columns = column_order(records);
    if columns.is_empty() {
        writer
            .flush()
            .map_err(|e| EngineError::Export(format!("failed to flush CSV: {e}")))?;
        return Ok(());
    }
    writer
        .write_record(&columns)
        .map_err(|e| EngineError::Export(format!("failed to write CSV header: {e}")))?;

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|key| record.get(key).map(cell_text).unwrap_or_default())
            .collect();
        writer
            .write_record(&row)
            .map_err(|e| EngineError::Export(format!("failed to write CSV row: {e}")))?;
    }
    writer.flush()?;
    info!(path = %path.display(), records = records.len(), "wrote CSV export");
    Ok(())
}

/// Union of record keys in first-seen order, with the file identity
/// columns pinned to the front when present.
fn column_order(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for pinned in [FILE_NAME_KEY, FILE_PATH_KEY] {
        if records.iter().any(|r| r.contains_key(pinned)) {
            columns.push(pinned.to_string());
        }
    }
    for record in records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Strings render bare; everything else keeps its JSON form so nested
/// values survive a round trip through a spreadsheet.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }

    #[test]
    fn test_json_export_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let records = vec![
            record(&[("file_name", json!("a.png")), ("caption", json!("a cat"))]),
            record(&[("file_name", json!("b.png")), ("caption", json!("a dog"))]),
        ];
        write_json(&path, &records).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<Record> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_csv_header_is_first_seen_union() {
        let records = vec![
            record(&[("caption", json!("x")), ("file_name", json!("a.png"))]),
            record(&[("caption", json!("y")), ("tags", json!(["t1"]))]),
        ];
        let columns = column_order(&records);
        assert_eq!(columns, vec!["file_name", "caption", "tags"]);
    }

    #[test]
    fn test_csv_export_fills_missing_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let records = vec![
            record(&[("file_name", json!("a.png")), ("caption", json!("a cat"))]),
            record(&[("file_name", json!("b.png")), ("tags", json!(["dog", "park"]))]),
        ];
        write_csv(&path, &records).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], "\u{FEFF}".as_bytes());
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "file_name,caption,tags");
        assert_eq!(lines.next().unwrap(), "a.png,a cat,");
        let second = lines.next().unwrap();
        assert!(second.starts_with("b.png,,"));
        assert!(second.contains("dog"));
    }

    #[test]
    fn test_empty_batch_exports_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("out.json");
        let csv_path = dir.path().join("out.csv");
        write_json(&json_path, &[]).unwrap();
        write_csv(&csv_path, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&json_path).unwrap(), "[]");
        assert_eq!(std::fs::read(&csv_path).unwrap(), "\u{FEFF}".as_bytes());
    }
}
