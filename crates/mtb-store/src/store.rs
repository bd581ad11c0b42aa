//! Filesystem access for the monthly candle cache.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mtb_types::{Candle, RequiredFile};

use crate::csv::{parse_csv_candles, render_csv_candles};

/// Errors from the write side of the store.
#[derive(Debug)]
pub enum StoreError {
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { path, source } => {
                write!(f, "store i/o error at {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
        }
    }
}

/// The monthly candle cache rooted at one data directory.
///
/// File layout is flat: `{data_dir}/{symbol}-{tf}-{year}-{month:02}.csv`.
#[derive(Clone, Debug)]
pub struct MonthlyStore {
    data_dir: PathBuf,
}

impl MonthlyStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Absolute path of one monthly cache file.
    pub fn path_for(&self, file: &RequiredFile) -> PathBuf {
        self.data_dir.join(file.file_name())
    }

    /// Whether the monthly file is present on disk. Presence is the store's
    /// only cache-validity criterion; content is checked at load time.
    pub fn exists(&self, file: &RequiredFile) -> bool {
        self.path_for(file).is_file()
    }

    /// Load one month of candles, in file order.
    ///
    /// Never fails: a missing, unreadable, or structurally broken file loads
    /// as zero candles with a warning. Short months only become an error
    /// later, when alignment finds too little history for the warm-up.
    pub fn load(&self, file: &RequiredFile) -> Vec<Candle> {
        let path = self.path_for(file);
        let src = match fs::read_to_string(&path) {
            Ok(src) => src,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "monthly file unreadable, loading empty");
                return Vec::new();
            }
        };
        match parse_csv_candles(&src) {
            Ok(candles) => candles,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "monthly file invalid, loading empty");
                Vec::new()
            }
        }
    }

    /// Load every month in `files`, concatenated in iteration order.
    pub fn load_all(&self, files: impl IntoIterator<Item = RequiredFile>) -> Vec<Candle> {
        let mut out = Vec::new();
        for file in files {
            out.extend(self.load(&file));
        }
        out
    }

    /// Write one month of candles, creating the data directory if needed.
    /// Used by the provisioner after a successful fetch.
    pub fn write(&self, file: &RequiredFile, candles: &[Candle]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::Io {
            path: self.data_dir.clone(),
            source,
        })?;
        let path = self.path_for(file);
        fs::write(&path, render_csv_candles(candles)).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), candles = candles.len(), "wrote monthly file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtb_types::Timeframe;

    fn file() -> RequiredFile {
        RequiredFile::new("EURUSD", Timeframe::H1, 2024, 1)
    }

    fn candle(open_time: i64) -> Candle {
        Candle::new(open_time, 1_100_000, 1_200_000, 1_000_000, 1_150_000, 10_000_000)
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MonthlyStore::new(dir.path());
        assert!(!store.exists(&file()));
        assert!(store.load(&file()).is_empty());
    }

    #[test]
    fn write_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = MonthlyStore::new(dir.path().join("data"));
        let candles = vec![candle(1_704_067_200), candle(1_704_070_800)];
        store.write(&file(), &candles).unwrap();
        assert!(store.exists(&file()));
        assert_eq!(store.load(&file()), candles);
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MonthlyStore::new(dir.path());
        fs::write(store.path_for(&file()), "garbage,header\n1,2\n").unwrap();
        assert!(store.exists(&file()));
        assert!(store.load(&file()).is_empty());
    }

    #[test]
    fn load_all_concatenates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = MonthlyStore::new(dir.path());
        let jan = RequiredFile::new("EURUSD", Timeframe::H1, 2024, 1);
        let feb = RequiredFile::new("EURUSD", Timeframe::H1, 2024, 2);
        store.write(&jan, &[candle(100)]).unwrap();
        store.write(&feb, &[candle(200)]).unwrap();
        let all = store.load_all([jan, feb]);
        let times: Vec<i64> = all.iter().map(|c| c.open_time).collect();
        assert_eq!(times, vec![100, 200]);
    }

    #[test]
    fn path_for_uses_cache_file_name() {
        let store = MonthlyStore::new("/data");
        assert_eq!(
            store.path_for(&file()),
            PathBuf::from("/data/EURUSD-1h-2024-01.csv")
        );
    }
}
