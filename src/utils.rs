// Utility functions
use chrono::{Datelike, NaiveDate};

/// Trimmed, non-empty lines of `text`.
pub fn non_blank_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Archive name for a snapshot taken on `date`: `2024_3_7_goods-data.csv`.
/// Components are not zero padded.
pub fn archive_file_name(date: NaiveDate) -> String {
    format!("{}_{}_{}_goods-data.csv", date.year(), date.month(), date.day())
}

/// Formats an optional price for log lines.
pub fn fmt_price(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    }
}
