//! CSV bucket loader
//!
//! Seeds a [`MemoryStore`] from a directory laid out as
//! `<dir>/<Symbol>/<Timeframe>/<RecordFormat>.csv`. Each file has a header
//! row whose first column is `Epoch` (integer seconds); every other column is
//! read as a float.

use crate::bucket::BucketKey;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::memory::MemoryStore;
use crate::storage::types::{Column, ColumnSeries, EPOCH};
use std::path::{Path, PathBuf};

/// Outcome of loading a data directory
#[derive(Debug, Default)]
pub struct LoadReport {
    pub buckets_loaded: usize,
    pub rows_loaded: usize,
    pub files_failed: usize,
    pub dirs_failed: usize,
    pub errors: Vec<String>,
}

/// Parse one bucket's CSV text into a column series
pub fn parse_bucket_csv<R: std::io::Read>(reader: R) -> StorageResult<ColumnSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.get(0) != Some(EPOCH) {
        return Err(StorageError::Schema(format!(
            "first column must be {}, found {:?}",
            EPOCH,
            headers.get(0).unwrap_or("")
        )));
    }

    let mut epochs: Vec<i64> = Vec::new();
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); headers.len() - 1];

    for (line_num, result) in reader.records().enumerate() {
        let line = line_num + 2;
        let record = result?;

        let epoch = record
            .get(0)
            .unwrap_or("")
            .parse::<i64>()
            .map_err(|e| StorageError::Csv(format!("Line {}: bad Epoch: {}", line, e)))?;
        if epochs.last().is_some_and(|prev| *prev > epoch) {
            return Err(StorageError::Schema(format!(
                "Line {}: Epoch {} is out of order",
                line, epoch
            )));
        }
        epochs.push(epoch);

        for (idx, column) in values.iter_mut().enumerate() {
            let raw = record.get(idx + 1).unwrap_or("");
            let value = raw.parse::<f64>().map_err(|e| {
                StorageError::Csv(format!("Line {}: bad value {:?}: {}", line, raw, e))
            })?;
            column.push(value);
        }
    }

    let mut series = ColumnSeries::with_epoch(epochs);
    for (name, column) in headers.iter().skip(1).zip(values) {
        series.add_column(name, Column::Float64(column))?;
    }
    Ok(series)
}

/// Load every bucket file under `dir` into `store`
///
/// A file that fails to parse or insert, or a nested directory that cannot
/// be listed, is recorded in the report and skipped. A missing directory
/// loads nothing; an unreadable `dir` itself is an error.
pub fn load_dir(store: &MemoryStore, dir: &Path) -> StorageResult<LoadReport> {
    let mut report = LoadReport::default();
    if !dir.exists() {
        tracing::warn!(path = %dir.display(), "Data directory does not exist, starting empty");
        return Ok(report);
    }

    let symbols = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;

    for symbol_path in symbols.into_iter().filter(|p| p.is_dir()) {
        for tf_path in list_dir(&symbol_path, &mut report) {
            if !tf_path.is_dir() {
                continue;
            }
            for file_path in list_dir(&tf_path, &mut report) {
                if file_path.extension().and_then(|e| e.to_str()) != Some("csv") {
                    continue;
                }
                match load_file(store, &file_path) {
                    Ok(rows) => {
                        report.buckets_loaded += 1;
                        report.rows_loaded += rows;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %file_path.display(),
                            error = %e,
                            "Skipping bucket file"
                        );
                        report.files_failed += 1;
                        report.errors.push(format!("{}: {}", file_path.display(), e));
                    }
                }
            }
        }
    }

    tracing::info!(
        buckets = report.buckets_loaded,
        rows = report.rows_loaded,
        failed = report.files_failed + report.dirs_failed,
        "Loaded bucket data"
    );
    Ok(report)
}

/// Entries of a nested directory; a listing failure is recorded and yields
/// whatever was read before it
fn list_dir(dir: &Path, report: &mut LoadReport) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            record_dir_failure(dir, &e, report);
            return paths;
        }
    };
    for entry in entries {
        match entry {
            Ok(entry) => paths.push(entry.path()),
            Err(e) => {
                record_dir_failure(dir, &e, report);
                break;
            }
        }
    }
    paths
}

fn record_dir_failure(dir: &Path, error: &std::io::Error, report: &mut LoadReport) {
    tracing::warn!(path = %dir.display(), error = %error, "Skipping unreadable directory");
    report.dirs_failed += 1;
    report.errors.push(format!("{}: {}", dir.display(), error));
}

fn load_file(store: &MemoryStore, path: &Path) -> StorageResult<usize> {
    let name = |p: Option<&Path>| -> StorageResult<String> {
        p.and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| StorageError::InvalidBucket(format!("bad path {}", path.display())))
    };
    let record_format = path
        .file_stem()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StorageError::InvalidBucket(format!("bad path {}", path.display())))?;
    let tf_dir = path.parent();
    let timeframe = name(tf_dir)?;
    let symbol = name(tf_dir.and_then(Path::parent))?;

    let key = BucketKey::parse(&format!("{}/{}/{}", symbol, timeframe, record_format))?;
    let series = parse_bucket_csv(std::fs::File::open(path)?)?;
    let rows = series.len();
    store.insert(&key, series)?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::engine::Catalog;
    use tempfile::TempDir;

    const BARS: &str = "Epoch,Open,High,Low,Close\n60,1,2,0.5,1.5\n120,1.5,3,1,2.5\n";

    #[test]
    fn test_parse_bucket_csv() {
        let series = parse_bucket_csv(BARS.as_bytes()).unwrap();
        assert_eq!(series.epoch(), Some(&[60, 120][..]));
        assert_eq!(series.get("Close"), Some(&Column::Float64(vec![1.5, 2.5])));
        assert_eq!(series.column_names().len(), 5);
    }

    #[test]
    fn test_parse_requires_epoch_first() {
        let err = parse_bucket_csv("Close,Epoch\n1,60\n".as_bytes()).unwrap_err();
        assert!(matches!(err, StorageError::Schema(_)));
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(parse_bucket_csv("Epoch,Close\n60,abc\n".as_bytes()).is_err());
        assert!(parse_bucket_csv("Epoch,Close\n120,1\n60,2\n".as_bytes()).is_err());
    }

    #[test]
    fn test_load_dir() {
        let dir = TempDir::new().unwrap();
        let bucket_dir = dir.path().join("AAPL").join("1Min");
        std::fs::create_dir_all(&bucket_dir).unwrap();
        std::fs::write(bucket_dir.join("OHLCV.csv"), BARS).unwrap();
        std::fs::write(bucket_dir.join("BROKEN.csv"), "Close\n1\n").unwrap();
        std::fs::write(bucket_dir.join("notes.txt"), "ignored").unwrap();

        let store = MemoryStore::default();
        let report = load_dir(&store, dir.path()).unwrap();

        assert_eq!(report.buckets_loaded, 1);
        assert_eq!(report.rows_loaded, 2);
        assert_eq!(report.files_failed, 1);
        assert_eq!(store.bucket_count(), 1);
        assert!(store.gather_categories_and_items()["Symbol"].contains("AAPL"));
    }

    #[test]
    fn test_unreadable_nested_dir_is_recorded() {
        let dir = TempDir::new().unwrap();
        let mut report = LoadReport::default();
        let paths = list_dir(&dir.path().join("gone"), &mut report);

        assert!(paths.is_empty());
        assert_eq!(report.dirs_failed, 1);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_load_dir_skips_stray_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("README"), "top-level file").unwrap();
        let bucket_dir = dir.path().join("TSLA").join("1Min");
        std::fs::create_dir_all(&bucket_dir).unwrap();
        std::fs::write(dir.path().join("TSLA").join("stray.csv"), BARS).unwrap();
        std::fs::write(bucket_dir.join("OHLCV.csv"), BARS).unwrap();

        let store = MemoryStore::default();
        let report = load_dir(&store, dir.path()).unwrap();
        assert_eq!(report.buckets_loaded, 1);
        assert_eq!(report.files_failed + report.dirs_failed, 0);
    }

    #[test]
    fn test_load_missing_dir() {
        let store = MemoryStore::default();
        let report = load_dir(&store, Path::new("/nonexistent/chronicle-query")).unwrap();
        assert_eq!(report.buckets_loaded, 0);
    }
}
