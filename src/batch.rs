// 📦 Batch Checker - validate every IBAN in a CSV or plain list
// Each row goes through the same pipeline as a single check; the report
// keeps per-row results plus totals.

use crate::checksum::{explain, ChecksumBreakdown};
use crate::config::BatchConfig;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info, warn};

// ============================================================================
// REPORT TYPES
// ============================================================================

/// Result for one row of the input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Line in the source file (1-based)
    pub line_number: u64,
    pub input: String,
    pub normalized: String,
    pub remainder: Option<u32>,
    pub valid: bool,
}

impl BatchEntry {
    fn from_breakdown(line_number: u64, breakdown: ChecksumBreakdown) -> Self {
        BatchEntry {
            line_number,
            input: breakdown.input,
            normalized: breakdown.normalized,
            remainder: breakdown.remainder,
            valid: breakdown.valid,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Unique id for this run
    pub id: String,
    pub checked_at: DateTime<Utc>,

    /// File path or other label for where the rows came from
    pub source: String,

    pub total: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub results: Vec<BatchEntry>,
}

impl BatchReport {
    fn new(source: impl Into<String>, results: Vec<BatchEntry>) -> Self {
        let valid_count = results.iter().filter(|e| e.valid).count();

        BatchReport {
            id: uuid::Uuid::new_v4().to_string(),
            checked_at: Utc::now(),
            source: source.into(),
            total: results.len(),
            valid_count,
            invalid_count: results.len() - valid_count,
            results,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} IBANs checked, {} valid, {} invalid",
            self.source, self.total, self.valid_count, self.invalid_count
        )
    }

    pub fn all_valid(&self) -> bool {
        self.invalid_count == 0
    }

    pub fn invalid_entries(&self) -> impl Iterator<Item = &BatchEntry> {
        self.results.iter().filter(|e| !e.valid)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize batch report")
    }

    /// Write one CSV row per entry, with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        for entry in &self.results {
            wtr.serialize(entry).context("Failed to write CSV row")?;
        }

        wtr.flush().context("Failed to flush CSV output")?;
        Ok(())
    }
}

// ============================================================================
// CHECKING
// ============================================================================

/// Check every row read from `reader`. `source` only labels the report.
pub fn check_reader<R: Read>(reader: R, source: &str, config: &BatchConfig) -> Result<BatchReport> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(config.has_headers)
        .delimiter(config.delimiter_byte()?)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let column = if config.has_headers {
        let headers = rdr.headers().context("Failed to read CSV headers")?;
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(&config.column))
            .ok_or_else(|| {
                anyhow!(
                    "Column '{}' not found in headers: {}",
                    config.column,
                    headers.iter().collect::<Vec<_>>().join(", ")
                )
            })?
    } else {
        config.column_index
    };

    debug!(source, column, "Reading IBAN column");

    let mut results = Vec::new();

    for record in rdr.records() {
        let record = record.with_context(|| format!("Failed to read CSV record in {}", source))?;

        if record.iter().all(str::is_empty) {
            continue;
        }

        let line_number = record.position().map(|p| p.line()).unwrap_or(0);
        let input = record.get(column).unwrap_or_default();

        if input.is_empty() {
            warn!(line_number, column, "Row has no IBAN value");
        }

        results.push(BatchEntry::from_breakdown(line_number, explain(input)));
    }

    let report = BatchReport::new(source, results);
    info!("{}", report.summary());

    Ok(report)
}

/// Open `path` and check every row
pub fn check_file(path: &Path, config: &BatchConfig) -> Result<BatchReport> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open batch file {}", path.display()))?;

    check_reader(file, &path.display().to_string(), config)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
name,iban,currency
Alice,GB29 NWBK 6016 1331 9268 19,GBP
Bob,ES95 0217 0100 17,EUR
Carol,de89-3704-0044-0532-0130-00,EUR
";

    #[test]
    fn test_check_reader_with_headers() {
        let report = check_reader(SAMPLE_CSV.as_bytes(), "sample", &BatchConfig::default()).unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.valid_count, 2);
        assert_eq!(report.invalid_count, 1);
        assert!(!report.all_valid());

        let invalid: Vec<_> = report.invalid_entries().collect();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].input, "ES95 0217 0100 17");
        assert_eq!(invalid[0].remainder, Some(23));
        assert_eq!(invalid[0].line_number, 3);

        assert_eq!(report.results[2].normalized, "DE89370400440532013000");
        assert!(report.results[2].valid);
    }

    #[test]
    fn test_header_match_is_case_insensitive() {
        let csv = "Account,IBAN\nmain,NL91 ABNA 0417 1643 00\n";
        let report = check_reader(csv.as_bytes(), "sample", &BatchConfig::default()).unwrap();
        assert_eq!(report.total, 1);
        assert!(report.all_valid());
    }

    #[test]
    fn test_missing_column_is_error() {
        let config = BatchConfig {
            column: "account".to_string(),
            ..BatchConfig::default()
        };

        let err = check_reader(SAMPLE_CSV.as_bytes(), "sample", &config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Column 'account' not found"));
        assert!(message.contains("name, iban, currency"));
    }

    #[test]
    fn test_headerless_plain_list() {
        let list = "GB29 NWBK 6016 1331 9268 19\nLU36 0029 1534 6005 0000\n\nBE68 5390 0754 7034\n";
        let config = BatchConfig {
            has_headers: false,
            ..BatchConfig::default()
        };

        let report = check_reader(list.as_bytes(), "list", &config).unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.valid_count, 2);
        assert_eq!(report.results[1].remainder, Some(46));
        assert_eq!(report.results[0].line_number, 1);
    }

    #[test]
    fn test_semicolon_delimiter_and_column_index() {
        let csv = "x;AT61 1904 3002 3457 3201\ny;TN59 1421 7207 1007 0712 9648\n";
        let config = BatchConfig {
            has_headers: false,
            column_index: 1,
            delimiter: ';',
            ..BatchConfig::default()
        };

        let report = check_reader(csv.as_bytes(), "semi", &config).unwrap();
        assert_eq!(report.total, 2);
        assert!(report.results[0].valid);
        assert!(!report.results[1].valid);
    }

    #[test]
    fn test_short_row_is_invalid_entry() {
        let csv = "name,iban\nAlice\nBob,BE68 5390 0754 7034\n";
        let report = check_reader(csv.as_bytes(), "short", &BatchConfig::default()).unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.results[0].input, "");
        assert_eq!(report.results[0].remainder, None);
        assert!(!report.results[0].valid);
        assert!(report.results[1].valid);
    }

    #[test]
    fn test_check_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_CSV.as_bytes()).unwrap();

        let report = check_file(file.path(), &BatchConfig::default()).unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.source, file.path().display().to_string());
        assert!(report.summary().contains("3 IBANs checked, 2 valid, 1 invalid"));
    }

    #[test]
    fn test_check_file_missing() {
        let err = check_file(Path::new("/nonexistent/ibans.csv"), &BatchConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to open batch file"));
    }

    #[test]
    fn test_report_json() {
        let report = check_reader(SAMPLE_CSV.as_bytes(), "sample", &BatchConfig::default()).unwrap();
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["total"], 3);
        assert_eq!(value["valid_count"], 2);
        assert_eq!(value["results"][1]["remainder"], 23);
        assert_eq!(value["results"][0]["valid"], true);
        assert!(uuid::Uuid::parse_str(value["id"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_report_csv() {
        let report = check_reader(SAMPLE_CSV.as_bytes(), "sample", &BatchConfig::default()).unwrap();
        let mut out = Vec::new();
        report.write_csv(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "line_number,input,normalized,remainder,valid");
        assert_eq!(lines[1], "2,GB29 NWBK 6016 1331 9268 19,GB29NWBK60161331926819,1,true");
        assert_eq!(lines.len(), 4);
    }
}
