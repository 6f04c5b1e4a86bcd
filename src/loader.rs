//! Tolerant loaders for tab-delimited biosignal exports
//!
//! `TableLoader` recovers a rectangular numeric matrix from a biomarker export:
//! - Header row skipped, leading time-label column discarded
//! - Unparseable cells dropped silently (the row just gets shorter)
//! - Ragged rows reconciled by majority row length
//!
//! `TraceLoader` reads a single raw signal trace for the waveform path.
//!
//! Neither loader fails on malformed content. An unreadable file, or one that
//! no encoding can turn into data, yields an empty result plus a diagnostic.

use crate::decoder::{decode_candidates, TextEncoding, DEFAULT_ENCODINGS};
use crate::types::{CleanTable, ParsedRow};
use csv::{Reader, ReaderBuilder, StringRecord};
use std::fs;
use std::path::Path;

/// Parse one cell as a finite number
pub fn parse_field(field: &str) -> Option<f64> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Tab-delimited reader over decoded text.
///
/// Rows may have any length and quotes are literal characters. Line endings
/// may be `\n`, `\r\n` or a lone `\r`; fully empty lines are skipped.
fn tab_reader(text: &str, has_headers: bool) -> Reader<&[u8]> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes())
}

/// Numeric cells of one data record.
///
/// Leading blank cells are ignored as if the line had been trimmed, then the
/// time label is skipped.
pub fn parse_record(record: &StringRecord) -> ParsedRow {
    record
        .iter()
        .skip_while(|field| field.trim().is_empty())
        .skip(1)
        .filter_map(parse_field)
        .collect()
}

/// Parse decoded text into rows, skipping the header.
///
/// Rows with no numeric cells at all are left out.
pub fn parse_rows(text: &str) -> Vec<ParsedRow> {
    tab_reader(text, true)
        .records()
        .filter_map(|record| match record {
            Ok(record) => Some(parse_record(&record)),
            Err(e) => {
                log::debug!("Skipping unreadable record: {e}");
                None
            }
        })
        .filter(|row| !row.is_empty())
        .collect()
}

/// Outcome of a table load, with the details reported in diagnostics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableLoad {
    pub table: CleanTable,
    /// Encoding that produced the table
    pub encoding: Option<TextEncoding>,
    /// Parsed rows before majority filtering
    pub parsed_rows: usize,
}

/// Loader for the combined biomarker table
#[derive(Debug, Clone)]
pub struct TableLoader {
    encodings: Vec<TextEncoding>,
}

impl Default for TableLoader {
    fn default() -> Self {
        Self::new(DEFAULT_ENCODINGS.to_vec())
    }
}

impl TableLoader {
    /// Create a loader that tries `encodings` in order
    pub fn new(encodings: Vec<TextEncoding>) -> Self {
        Self { encodings }
    }

    /// Load a clean table from a file, empty when nothing usable is found
    pub fn load(&self, path: &Path) -> CleanTable {
        self.load_detailed(path).table
    }

    /// Load a clean table from a file and report how it was recovered
    pub fn load_detailed(&self, path: &Path) -> TableLoad {
        match fs::read(path) {
            Ok(bytes) => {
                let loaded = self.load_bytes(&bytes);
                match loaded.encoding {
                    Some(encoding) => log::info!(
                        "Loaded {} rows (filtered from {}) from {} using {}. Common columns: {}",
                        loaded.table.row_count(),
                        loaded.parsed_rows,
                        path.display(),
                        encoding,
                        loaded.table.column_count()
                    ),
                    None => log::warn!("Could not load biomarkers from {}", path.display()),
                }
                loaded
            }
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                TableLoad::default()
            }
        }
    }

    /// Recover a clean table from raw file contents.
    ///
    /// An encoding is accepted when it decodes cleanly and yields at least one
    /// numeric row; otherwise the next candidate is tried.
    pub fn load_bytes(&self, bytes: &[u8]) -> TableLoad {
        for decoded in decode_candidates(bytes, &self.encodings) {
            let rows = parse_rows(&decoded.text);
            if rows.is_empty() {
                log::debug!("No data rows under {}", decoded.encoding);
                continue;
            }

            let parsed_rows = rows.len();
            return TableLoad {
                table: CleanTable::from_majority(rows),
                encoding: Some(decoded.encoding),
                parsed_rows,
            };
        }

        TableLoad::default()
    }
}

/// Loader for a single raw signal trace (one sample per line)
#[derive(Debug, Clone)]
pub struct TraceLoader {
    encodings: Vec<TextEncoding>,
}

impl Default for TraceLoader {
    fn default() -> Self {
        Self::new(DEFAULT_ENCODINGS.to_vec())
    }
}

impl TraceLoader {
    pub fn new(encodings: Vec<TextEncoding>) -> Self {
        Self { encodings }
    }

    /// Load the samples of a trace file, empty when unreadable
    pub fn load(&self, path: &Path) -> Vec<f64> {
        match fs::read(path) {
            Ok(bytes) => {
                let samples = self.load_bytes(&bytes);
                log::info!("Loaded {} samples from {}", samples.len(), path.display());
                samples
            }
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    /// Extract samples from raw file contents.
    ///
    /// Each line contributes its last numeric cell, so both single-column
    /// traces and `time<TAB>value` layouts work. Lines without a number
    /// (headers, comments) are skipped.
    pub fn load_bytes(&self, bytes: &[u8]) -> Vec<f64> {
        decode_candidates(bytes, &self.encodings)
            .map(|decoded| parse_trace(&decoded.text))
            .find(|samples| !samples.is_empty())
            .unwrap_or_default()
    }
}

fn parse_trace(text: &str) -> Vec<f64> {
    tab_reader(text, false)
        .records()
        .filter_map(Result::ok)
        .filter_map(|record| {
            record
                .iter()
                .flat_map(|field| field.split(|c: char| c == ',' || c == ';' || c.is_whitespace()))
                .filter_map(parse_field)
                .last()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Time\tFp1_Delta\tFp1_Theta\tFp1_Alpha\tFp1_Beta\tFp1_Gamma\t\
                          Fp2_Delta\tFp2_Theta\tFp2_Alpha\tFp2_Beta\tFp2_Gamma\t\
                          Heartbeat\tSDNN\tRMSSD";

    fn write_file(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    fn data_line(time: &str, values: &[f64]) -> String {
        let cells: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        format!("{}\t{}", time, cells.join("\t"))
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(parse_field(" 1.5 "), Some(1.5));
        assert_eq!(parse_field("-2e3"), Some(-2000.0));
        assert_eq!(parse_field(""), None);
        assert_eq!(parse_field("n/a"), None);
        assert_eq!(parse_field("nan"), None);
        assert_eq!(parse_field("inf"), None);
    }

    #[test]
    fn test_parse_rows_drops_time_and_garbage() {
        let rows = parse_rows("Time\tA\tB\tC\tD\n 1:49:25.583\t1.0\t\tx\t2.5\t 3 \n");
        assert_eq!(rows, vec![vec![1.0, 2.5, 3.0]]);
    }

    #[test]
    fn test_parse_rows_needs_header_and_data() {
        assert!(parse_rows("Time\tA").is_empty());
        assert!(parse_rows("Time\tA\n\n  \n").is_empty());
        assert_eq!(parse_rows("Time\tA\n0:00\t1\n"), vec![vec![1.0]]);
    }

    #[test]
    fn test_parse_rows_line_endings() {
        let rows = parse_rows("Time\tA\r\n0:01\t1\r0:02\t2\n0:03\t3");
        assert_eq!(rows, vec![vec![1.0], vec![2.0], vec![3.0]]);
    }

    #[test]
    fn test_leading_blank_cells_are_trimmed_away() {
        // A blank time cell is trimmed off, so the first value becomes the label
        let rows = parse_rows("Time\tA\tB\n\t1\t2\n \t 3\t4\n");
        assert_eq!(rows, vec![vec![2.0], vec![4.0]]);
    }

    #[test]
    fn test_quotes_are_literal() {
        let rows = parse_rows("Time\tA\tB\n0:01\t\"1\t2\n");
        assert_eq!(rows, vec![vec![2.0]]);
    }

    #[test]
    fn test_load_full_export() {
        let mut text = String::from(HEADER);
        for i in 0..5 {
            text.push('\n');
            text.push_str(&data_line(
                &format!(" 1:49:2{i}.000"),
                &[1.0, 2.0, 4.0, 8.0, 16.0, 1.0, 2.0, 4.0, 8.0, 16.0, 72.0, 40.0, 35.0],
            ));
        }
        let file = write_file(text.as_bytes());

        let loaded = TableLoader::default().load_detailed(file.path());
        assert_eq!(loaded.encoding, Some(TextEncoding::Utf8));
        assert_eq!(loaded.parsed_rows, 5);
        assert_eq!(loaded.table.row_count(), 5);
        assert_eq!(loaded.table.column_count(), 13);
    }

    #[test]
    fn test_ragged_rows_use_majority_length() {
        let full = [1.0; 12];
        let mut text = String::from(HEADER);
        for line in [
            data_line("t0", &full),
            data_line("t1", &full),
            data_line("t2", &full),
            data_line("t3", &full[..7]),
        ] {
            text.push('\n');
            text.push_str(&line);
        }

        let loaded = TableLoader::default().load_bytes(text.as_bytes());
        assert_eq!(loaded.parsed_rows, 4);
        assert_eq!(loaded.table.row_count(), 3);
        assert_eq!(loaded.table.column_count(), 12);
    }

    #[test]
    fn test_single_byte_fallback_still_loads() {
        let mut bytes = b"Time\xFF\tFp1_Delta\tFp1_Theta\n".to_vec();
        bytes.extend_from_slice(b" 0:00:01\t1.5\t2.5\n 0:00:02\t3.5\t4.5\n");
        let file = write_file(&bytes);

        let loaded = TableLoader::default().load_detailed(file.path());
        assert_eq!(loaded.encoding, Some(TextEncoding::Latin1));
        assert!(!loaded.table.is_empty());
        assert_eq!(loaded.table.rows()[1], vec![3.5, 4.5]);
    }

    #[test]
    fn test_korean_header_loads() {
        let (header, _, _) = encoding_rs::EUC_KR.encode("시간\t델타\t세타\n");
        let mut bytes = header.into_owned();
        bytes.extend_from_slice(b"0:01\t1\t2\n");

        let loaded = TableLoader::default().load_bytes(&bytes);
        assert_eq!(loaded.encoding, Some(TextEncoding::Cp949));
        assert_eq!(loaded.table.rows(), &[vec![1.0, 2.0]]);
    }

    #[test]
    fn test_empty_file_gives_empty_table() {
        let file = write_file(b"");
        let table = TableLoader::default().load(file.path());
        assert!(table.is_empty());
    }

    #[test]
    fn test_header_only_gives_empty_table() {
        let loaded = TableLoader::default().load_bytes(HEADER.as_bytes());
        assert!(loaded.table.is_empty());
        assert_eq!(loaded.encoding, None);
    }

    #[test]
    fn test_missing_file_gives_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let table = TableLoader::default().load(&dir.path().join("missing.txt"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_load_is_repeatable() {
        let text = format!("{HEADER}\nt\t1\t2\t3\nt\t4\t5\t6\nt\t7\n");
        let file = write_file(text.as_bytes());
        let loader = TableLoader::default();

        assert_eq!(loader.load(file.path()), loader.load(file.path()));
    }

    #[test]
    fn test_trace_single_column() {
        let samples = TraceLoader::default().load_bytes(b"EEG\n1.0\n-2.0\n\n3.5\n");
        assert_eq!(samples, vec![1.0, -2.0, 3.5]);
    }

    #[test]
    fn test_trace_takes_last_numeric_cell() {
        let samples = TraceLoader::default().load_bytes(b"Time\tGSR\n0:01\t0.4\n0:02\t0.6\n");
        assert_eq!(samples, vec![0.4, 0.6]);
    }

    #[test]
    fn test_trace_mixed_line_endings() {
        let samples = TraceLoader::default().load_bytes(b"GSR\r\n0.1\r0.2\n0.3, 0.4\n");
        assert_eq!(samples, vec![0.1, 0.2, 0.4]);
    }

    #[test]
    fn test_trace_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TraceLoader::default().load(&dir.path().join("nope")).is_empty());
    }
}
