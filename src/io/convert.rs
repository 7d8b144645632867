//! Batch conversion of spectrum files in a directory tree.
//!
//! Every file the decoder accepts is split into its datasets and each dataset
//! is written next to the source as `<original_path>.<suffix>.txt` (two
//! comma-delimited columns). A file that fails to decode or write is logged and
//! recorded, and the walk continues with the next file.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::domain::Spectrum;
use crate::error::AppError;
use crate::io::export::write_spectrum_csv;
use crate::io::ingest::read_table;

/// One spectrum extracted from a source file.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Short name used in the output file name (e.g. `AB`, `ScSm`).
    pub suffix: String,
    pub spectrum: Spectrum,
}

/// Decoding seam for spectrometer file formats.
pub trait SpectrumDecoder {
    /// Cheap check (usually by extension) whether this decoder handles `path`.
    fn accepts(&self, path: &Path) -> bool;
    /// Every dataset contained in `path`.
    fn datasets(&self, path: &Path) -> Result<Vec<Dataset>, AppError>;
}

/// Multi-column text tables: column 0 is x, every further column is a dataset.
///
/// Dataset suffixes come from the header row when present, else `Y1`, `Y2`, ...
#[derive(Debug, Clone)]
pub struct ColumnTableDecoder {
    extensions: Vec<String>,
}

impl Default for ColumnTableDecoder {
    fn default() -> Self {
        Self::new(["dpt", "prn"])
    }
}

impl ColumnTableDecoder {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().to_lowercase())
                .collect(),
        }
    }
}

impl SpectrumDecoder for ColumnTableDecoder {
    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    fn datasets(&self, path: &Path) -> Result<Vec<Dataset>, AppError> {
        let table = read_table(path)?;
        if table.width() < 2 || table.rows.is_empty() {
            return Err(AppError::invalid_config(format!(
                "'{}' contains no numeric x/y columns.",
                path.display()
            )));
        }

        let x = table.column(0);
        (1..table.width())
            .map(|col| {
                let suffix = table
                    .headers
                    .as_ref()
                    .and_then(|h| h.get(col))
                    .map(|name| sanitize_suffix(name))
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| format!("Y{col}"));
                Ok(Dataset {
                    suffix,
                    spectrum: Spectrum::new(x.clone(), table.column(col))?,
                })
            })
            .collect()
    }
}

fn sanitize_suffix(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// A source file that could not be converted.
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    /// Source files the decoder accepted.
    pub files_seen: usize,
    /// Output files written.
    pub written: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

/// `<original_path>.<suffix>.txt`
pub fn output_path(source: &Path, suffix: &str) -> PathBuf {
    let mut name = source.as_os_str().to_owned();
    name.push(format!(".{suffix}.txt"));
    PathBuf::from(name)
}

/// Walk `root` (sorted, recursive) and convert every accepted file.
///
/// Only a missing or unreadable root is an error; per-file problems end up in
/// the report.
pub fn convert_tree<D: SpectrumDecoder>(root: &Path, decoder: &D) -> Result<ConversionReport, AppError> {
    if !root.is_dir() {
        return Err(AppError::io(format!("'{}' is not a directory.", root.display())));
    }

    let mut report = ConversionReport::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                log::warn!("skipping {}: {e}", path.display());
                report.failures.push(FileFailure {
                    path,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || !decoder.accepts(path) {
            continue;
        }
        report.files_seen += 1;

        match convert_file(path, decoder, &mut report.written) {
            Ok(count) => {
                log::info!("{}: {count} dataset(s) converted", path.display());
            }
            Err(e) => {
                log::warn!("{}: conversion failed: {e}", path.display());
                report.failures.push(FileFailure {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// Write every dataset of `path`. Outputs are pushed to `written` as they are
/// created, including those written before a failure.
fn convert_file<D: SpectrumDecoder>(
    path: &Path,
    decoder: &D,
    written: &mut Vec<PathBuf>,
) -> Result<usize, AppError> {
    let datasets = decoder.datasets(path)?;
    for dataset in &datasets {
        let out = output_path(path, &dataset.suffix);
        write_spectrum_csv(&out, &dataset.spectrum)?;
        written.push(out);
    }
    Ok(datasets.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_appends_suffix() {
        let p = output_path(Path::new("/data/run1/sample.0"), "AB");
        assert_eq!(p, PathBuf::from("/data/run1/sample.0.AB.txt"));
    }

    #[test]
    fn decoder_splits_columns_into_datasets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.dpt");
        std::fs::write(&path, "wn,ScSm,ScRf\n4000,0.5,0.6\n3999,0.4,0.7\n").unwrap();

        let decoder = ColumnTableDecoder::default();
        assert!(decoder.accepts(&path));
        assert!(!decoder.accepts(&dir.path().join("notes.md")));

        let sets = decoder.datasets(&path).unwrap();
        let suffixes: Vec<&str> = sets.iter().map(|d| d.suffix.as_str()).collect();
        assert_eq!(suffixes, ["ScSm", "ScRf"]);
        assert_eq!(sets[1].spectrum.y, vec![0.6, 0.7]);
    }

    #[test]
    fn headerless_columns_get_numbered_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.PRN");
        std::fs::write(&path, "1 2 3\n4 5 6\n").unwrap();
        let sets = ColumnTableDecoder::default().datasets(&path).unwrap();
        assert_eq!(sets[0].suffix, "Y1");
        assert_eq!(sets[1].suffix, "Y2");
    }

    #[test]
    fn one_bad_file_does_not_stop_the_walk() {
        testing_logger::setup();

        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("a.dpt"), "1,10\n2,20\n").unwrap();
        std::fs::write(dir.path().join("b.dpt"), "garbage only\n").unwrap();
        std::fs::write(nested.join("c.dpt"), "1,10,11\n2,20,21\n").unwrap();
        std::fs::write(dir.path().join("ignored.csv"), "1,2\n").unwrap();

        let report = convert_tree(dir.path(), &ColumnTableDecoder::default()).unwrap();
        assert_eq!(report.files_seen, 3);
        assert_eq!(report.written.len(), 3);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("b.dpt"));
        assert!(dir.path().join("a.dpt.Y1.txt").exists());
        assert!(nested.join("c.dpt.Y2.txt").exists());

        testing_logger::validate(|logs| {
            assert!(
                logs.iter()
                    .any(|l| l.level == log::Level::Warn && l.body.contains("b.dpt"))
            );
        });
    }

    /// Yields a writable dataset followed by one whose output directory does not exist.
    struct HalfWritableDecoder;

    impl SpectrumDecoder for HalfWritableDecoder {
        fn accepts(&self, path: &Path) -> bool {
            path.extension().is_some_and(|e| e == "dpt")
        }

        fn datasets(&self, _path: &Path) -> Result<Vec<Dataset>, AppError> {
            let spectrum = Spectrum::new(vec![1.0, 2.0], vec![3.0, 4.0])?;
            Ok(vec![
                Dataset {
                    suffix: "AB".to_string(),
                    spectrum: spectrum.clone(),
                },
                Dataset {
                    suffix: "missing/ScSm".to_string(),
                    spectrum,
                },
            ])
        }
    }

    #[test]
    fn partially_written_file_reports_its_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan.dpt");
        std::fs::write(&source, "1,2\n").unwrap();

        let report = convert_tree(dir.path(), &HalfWritableDecoder).unwrap();
        assert_eq!(report.files_seen, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.written, vec![output_path(&source, "AB")]);
        assert!(report.written[0].exists());
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = convert_tree(Path::new("/no/such/dir"), &ColumnTableDecoder::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }
}
