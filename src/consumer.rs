//! Newline-delimited JSON record reader

use crate::error::AuditError;
use crate::types::application::Record;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::info;

/// Reads application or scored records, one JSON object per line
pub struct RecordReader<R> {
    reader: BufReader<R>,
    source: String,
}

impl RecordReader<File> {
    /// Open a records file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AuditError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::new(file, &path.display().to_string()))
    }
}

impl<R: Read> RecordReader<R> {
    /// Wrap any reader; `source` names it in logs
    pub fn new(reader: R, source: &str) -> Self {
        Self {
            reader: BufReader::new(reader),
            source: source.to_string(),
        }
    }

    /// Read every record, skipping blank lines
    pub fn read_all(self) -> Result<Vec<Record>, AuditError> {
        let mut records = Vec::new();

        for (index, line) in self.reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let line_number = index + 1;
            match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Object(record)) => records.push(record),
                Ok(other) => {
                    return Err(AuditError::Input {
                        line: line_number,
                        reason: format!("expected a JSON object, got {}", kind(&other)),
                    });
                }
                Err(e) => {
                    return Err(AuditError::Input {
                        line: line_number,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(source = %self.source, records = records.len(), "Records loaded");
        Ok(records)
    }

    /// Get the source name
    pub fn source(&self) -> &str {
        &self.source
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_json_lines() {
        let input = "{\"score\": 1, \"gender\": \"male\"}\n\n{\"score\": 0, \"gender\": \"female\"}\n";
        let records = RecordReader::new(input.as_bytes(), "inline").read_all().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["gender"], "female");
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys, vec!["score", "gender"]);
    }

    #[test]
    fn test_rejects_non_object_line() {
        let input = "{\"score\": 1}\n[1, 2]\n";
        match RecordReader::new(input.as_bytes(), "inline").read_all() {
            Err(AuditError::Input { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("array"));
            }
            other => panic!("expected input error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_malformed_line() {
        let input = "{\"score\": 1\n";
        assert!(matches!(
            RecordReader::new(input.as_bytes(), "inline").read_all(),
            Err(AuditError::Input { line: 1, .. })
        ));
    }

    #[test]
    fn test_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"label_value\": 1}}").unwrap();

        let reader = RecordReader::open(file.path()).unwrap();
        assert_eq!(reader.source(), file.path().display().to_string());
        assert_eq!(reader.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_open_missing_file() {
        assert!(matches!(
            RecordReader::open("data/does_not_exist.json"),
            Err(AuditError::Io(_))
        ));
    }
}
