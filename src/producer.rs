//! JSON output for scored records and metrics reports

use crate::error::AuditError;
use crate::types::application::Record;
use crate::types::report::MetricsReport;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Writes results as JSON to stdout or a file
pub struct ReportWriter {
    writer: Box<dyn Write>,
    pretty: bool,
}

impl ReportWriter {
    /// Write to stdout
    pub fn stdout(pretty: bool) -> Self {
        Self::new(Box::new(io::stdout().lock()), pretty)
    }

    /// Create (or truncate) a file and write to it
    pub fn create<P: AsRef<Path>>(path: P, pretty: bool) -> Result<Self, AuditError> {
        let file = File::create(path)?;
        Ok(Self::new(Box::new(BufWriter::new(file)), pretty))
    }

    pub fn new(writer: Box<dyn Write>, pretty: bool) -> Self {
        Self { writer, pretty }
    }

    /// Write one scored record as a single JSON line
    pub fn write_record(&mut self, record: &Record) -> Result<(), AuditError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write a metrics report
    pub fn write_report(&mut self, report: &MetricsReport) -> Result<(), AuditError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, report)?;
        } else {
            serde_json::to_writer(&mut self.writer, report)?;
        }
        self.writer.write_all(b"\n")?;

        debug!(
            group_rows = report.group_metrics.len(),
            bias_rows = report.bias_metrics.len(),
            "Metrics report written"
        );

        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), AuditError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::report::metrics_row;
    use std::sync::{Arc, Mutex};

    /// Writer that keeps a handle on everything written
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_write_records_as_lines() {
        let buffer = SharedBuffer::default();
        let mut writer = ReportWriter::new(Box::new(buffer.clone()), false);

        let mut record = Record::new();
        record.insert("credit_amount".to_string(), 1169.into());
        record.insert("predicted_score".to_string(), 0.into());
        writer.write_record(&record).unwrap();
        writer.write_record(&record).unwrap();
        writer.flush().unwrap();

        let output = buffer.contents();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"credit_amount":1169,"predicted_score":0}"#);
    }

    #[test]
    fn test_write_report() {
        let buffer = SharedBuffer::default();
        let mut writer = ReportWriter::new(Box::new(buffer.clone()), true);

        let report = MetricsReport {
            group_metrics: vec![metrics_row("gender", "male")],
            bias_metrics: vec![metrics_row("gender", "male")],
        };
        writer.write_report(&report).unwrap();

        let parsed: MetricsReport = serde_json::from_str(&buffer.contents()).unwrap();
        assert_eq!(parsed, report);
    }
}
