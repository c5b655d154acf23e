// Archive ordering and trailing-window selection
use crate::model::{HistoryError, Snapshot};
use crate::storage::read_snapshot;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_WINDOW: usize = 30;

/// (year, month, day) taken from the leading `_`-separated components of a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArchiveDate {
    pub year: i64,
    pub month: i64,
    pub day: i64,
}

impl ArchiveDate {
    pub fn from_file_name(name: &str) -> Result<Self, HistoryError> {
        let mut parts = name.split('_');
        let mut next = || -> Result<i64, HistoryError> {
            parts
                .next()
                .and_then(|p| p.parse::<i64>().ok())
                .ok_or_else(|| HistoryError::MalformedFileName(name.to_string()))
        };
        let year = next()?;
        let month = next()?;
        let day = next()?;
        Ok(Self { year, month, day })
    }
}

/// Names of the `.csv` files in the archive directory, unordered.
pub fn list_archive(dir: &Path) -> Result<Vec<String>, HistoryError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".csv") {
            names.push(name);
        }
    }
    Ok(names)
}

/// Orders archive names oldest first by their date prefix and joins them onto `folder`.
/// Any name without a numeric year_month_day prefix fails the whole call.
pub fn sort_and_path(file_names: &[String], folder: &Path) -> Result<Vec<PathBuf>, HistoryError> {
    let mut dated = file_names
        .iter()
        .map(|name| ArchiveDate::from_file_name(name).map(|date| (date, name)))
        .collect::<Result<Vec<_>, _>>()?;

    dated.sort_by_key(|(date, _)| *date);

    Ok(dated.into_iter().map(|(_, name)| folder.join(name)).collect())
}

/// The most recent `last` entries of chronologically ordered paths.
pub fn trailing_window(sorted_paths: &[PathBuf], last: usize) -> &[PathBuf] {
    let take = last.min(sorted_paths.len());
    &sorted_paths[sorted_paths.len() - take..]
}

/// Lists, orders and loads the trailing window of archived snapshots, oldest first.
pub fn load_history(dir: &Path, last: usize) -> Result<Vec<(PathBuf, Snapshot)>, HistoryError> {
    let names = list_archive(dir)?;
    let sorted = sort_and_path(&names, dir)?;
    let window = trailing_window(&sorted, last);
    info!(
        "Loading {} of {} archived snapshots from {}",
        window.len(),
        sorted.len(),
        dir.display()
    );

    window
        .iter()
        .map(|path| -> Result<(PathBuf, Snapshot), HistoryError> {
            Ok((path.clone(), read_snapshot(path)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sort_orders_by_year_month_day_numerically() {
        let files = names(&[
            "2023_12_2_goods-data.csv",
            "2024_1_10_goods-data.csv",
            "2024_1_9_goods-data.csv",
            "2023_2_28_goods-data.csv",
            "2024_10_1_goods-data.csv",
        ]);
        let sorted = sort_and_path(&files, Path::new("archive")).unwrap();
        let expected: Vec<PathBuf> = [
            "2023_2_28_goods-data.csv",
            "2023_12_2_goods-data.csv",
            "2024_1_9_goods-data.csv",
            "2024_1_10_goods-data.csv",
            "2024_10_1_goods-data.csv",
        ]
        .iter()
        .map(|n| Path::new("archive").join(n))
        .collect();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn test_equal_dates_keep_input_order() {
        let files = names(&["2024_1_1_a.csv", "2024_1_1_b.csv", "2023_1_1_c.csv"]);
        let sorted = sort_and_path(&files, Path::new("")).unwrap();
        let sorted: Vec<_> = sorted.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        assert_eq!(sorted, vec!["2023_1_1_c.csv", "2024_1_1_a.csv", "2024_1_1_b.csv"]);
    }

    #[test]
    fn test_malformed_name_fails_everything() {
        let files = names(&["2024_1_1_goods-data.csv", "notes.csv"]);
        assert!(matches!(
            sort_and_path(&files, Path::new("archive")),
            Err(HistoryError::MalformedFileName(name)) if name == "notes.csv"
        ));
        let files = names(&["2024_1_goods-data.csv"]);
        assert!(sort_and_path(&files, Path::new("archive")).is_err());
    }

    #[test]
    fn test_trailing_window_never_exceeds_available() {
        let paths: Vec<PathBuf> = (1..=5).map(|d| PathBuf::from(format!("2024_1_{}", d))).collect();

        assert_eq!(trailing_window(&paths, 3), &paths[2..]);
        assert_eq!(trailing_window(&paths, 30), &paths[..]);
        assert!(trailing_window(&paths, 0).is_empty());
        assert!(trailing_window(&[], DEFAULT_WINDOW).is_empty());
    }

    #[test]
    fn test_list_archive_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2024_1_1_goods-data.csv"), "").unwrap();
        fs::write(dir.path().join("README.md"), "").unwrap();
        fs::create_dir(dir.path().join("old.csv")).unwrap();

        assert_eq!(list_archive(dir.path()).unwrap(), vec!["2024_1_1_goods-data.csv"]);
    }
}
