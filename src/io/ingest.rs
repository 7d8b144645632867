//! Delimited-text spectrum ingest.
//!
//! This module turns exported spectrometer tables into clean numeric columns.
//!
//! Design goals:
//! - **Delimiter sniffing**: comma, tab, semicolon or runs of spaces
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Header detection**: a non-numeric first row is kept as column names
//! - **Separation of concerns**: no fitting logic here

use std::path::Path;

use crate::domain::Spectrum;
use crate::error::AppError;

/// A row that could not be parsed.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Numeric table read from a text file.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Column names, when the first data row was a header.
    pub headers: Option<Vec<String>>,
    /// Rows of equal length (the width of the first numeric row).
    pub rows: Vec<Vec<f64>>,
    pub row_errors: Vec<RowError>,
}

impl Table {
    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn column(&self, idx: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[idx]).collect()
    }
}

/// Two-column spectrum plus ingest diagnostics.
#[derive(Debug, Clone)]
pub struct IngestedSpectrum {
    pub spectrum: Spectrum,
    pub row_errors: Vec<RowError>,
}

/// Load `(x, y)` from the first two numeric columns of a text file.
pub fn load_spectrum(path: &Path) -> Result<IngestedSpectrum, AppError> {
    let table = read_table(path)?;
    if table.width() < 2 || table.rows.len() < 2 {
        return Err(AppError::invalid_config(format!(
            "'{}' has no usable two-column data ({} rows read).",
            path.display(),
            table.rows.len()
        )));
    }

    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let spectrum = Spectrum::new(table.column(0), table.column(1))?.with_label(label);

    if !table.row_errors.is_empty() {
        log::warn!(
            "{}: skipped {} unparseable rows",
            path.display(),
            table.row_errors.len()
        );
    }

    Ok(IngestedSpectrum {
        spectrum,
        row_errors: table.row_errors,
    })
}

/// Read a numeric table with a sniffed delimiter.
pub fn read_table(path: &Path) -> Result<Table, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read '{}': {e}", path.display())))?;
    parse_table(&text)
}

pub fn parse_table(text: &str) -> Result<Table, AppError> {
    let delimiter = sniff_delimiter(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut table = Table::default();

    for (idx, result) in reader.records().enumerate() {
        let line = result
            .as_ref()
            .ok()
            .and_then(|r| r.position())
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                table.row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let fields: Vec<&str> = record.iter().filter(|f| !f.is_empty()).collect();
        if fields.is_empty() {
            continue;
        }

        let parsed: Result<Vec<f64>, _> = fields.iter().map(|f| f.parse::<f64>()).collect();
        match parsed {
            Ok(values) => {
                let width = table.width();
                if width != 0 && values.len() < width {
                    table.row_errors.push(RowError {
                        line,
                        message: format!("expected {width} columns, found {}", values.len()),
                    });
                } else if values.iter().any(|v| !v.is_finite()) {
                    table.row_errors.push(RowError {
                        line,
                        message: "non-finite value".to_string(),
                    });
                } else {
                    let keep = if width == 0 { values.len() } else { width };
                    table.rows.push(values[..keep].to_vec());
                }
            }
            Err(_) if table.rows.is_empty() && table.headers.is_none() => {
                table.headers = Some(fields.iter().map(|f| f.to_string()).collect());
            }
            Err(e) => table.row_errors.push(RowError {
                line,
                message: format!("non-numeric field: {e}"),
            }),
        }
    }

    Ok(table)
}

fn sniff_delimiter(text: &str) -> u8 {
    let sample = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .unwrap_or("");

    if sample.contains(',') {
        b','
    } else if sample.contains('\t') {
        b'\t'
    } else if sample.contains(';') {
        b';'
    } else {
        b' '
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_table_with_header() {
        let t = parse_table("wavelength,intensity\n690.0,10\n690.1,12.5\n").unwrap();
        assert_eq!(t.headers.as_deref(), Some(&["wavelength".to_string(), "intensity".to_string()][..]));
        assert_eq!(t.rows, vec![vec![690.0, 10.0], vec![690.1, 12.5]]);
        assert!(t.row_errors.is_empty());
    }

    #[test]
    fn parses_whitespace_runs_and_comments() {
        let t = parse_table("# exported\n690.0    10\n690.1  \t 12\n").unwrap();
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[1], vec![690.1, 12.0]);
    }

    #[test]
    fn bad_rows_are_reported_not_fatal() {
        let t = parse_table("1;2\n3;oops\n5\n7;8\n").unwrap();
        assert_eq!(t.rows, vec![vec![1.0, 2.0], vec![7.0, 8.0]]);
        assert_eq!(t.row_errors.len(), 2);
    }

    #[test]
    fn load_spectrum_requires_two_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.txt");
        std::fs::write(&path, "1\n2\n3\n").unwrap();
        assert!(load_spectrum(&path).is_err());

        let path = dir.path().join("ruby.txt");
        std::fs::write(&path, "690,1\n691,2\n692,3\n").unwrap();
        let ing = load_spectrum(&path).unwrap();
        assert_eq!(ing.spectrum.len(), 3);
        assert_eq!(ing.spectrum.label.as_deref(), Some("ruby.txt"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_spectrum(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }
}
