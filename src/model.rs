// Core structs: ProductRow, ProductId, and the per-layer error types
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Upstream product ids arrive either as JSON integers or as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Int(i64),
    Text(String),
}

impl ProductId {
    /// Integers win when the text parses as one, matching what the archive wrote.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(n) => ProductId::Int(n),
            Err(_) => ProductId::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductId::Int(n) => write!(f, "{}", n),
            ProductId::Text(s) => f.write_str(s),
        }
    }
}

/// One product in one snapshot. The snapshot date lives in the archive file name.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub category: String,
    pub name: String,
    pub id: ProductId,
    pub full_name: String,
    pub brand: String,
    pub price: f64,
    pub discount: f64,
    pub stock: i64,
}

impl ProductRow {
    /// List price minus discount.
    pub fn final_price(&self) -> f64 {
        self.price - self.discount
    }
}

pub type Snapshot = Vec<ProductRow>;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("invalid url template '{0}': expected exactly one '*' placeholder")]
    InvalidTemplate(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    InvalidResponse(reqwest::StatusCode),
    #[error("response body is not json: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid header {0}")]
    Client(String),
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("payload does not match the catalog schema: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("product {product} is missing {field}")]
    MissingField { product: String, field: &'static str },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("invalid record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("archive file name '{0}' has no year_month_day prefix")]
    MalformedFileName(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
