use crate::model::{ProductId, ProductRow, Snapshot, StorageError};
use crate::utils::archive_file_name;
use chrono::NaiveDate;
use csv::{Reader, StringRecord, Writer};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const HEADER: [&str; 8] = [
    "Category", "Name", "id", "FullName", "Brand", "Price", "Discount", "Stock",
];

/// Dated snapshot files, one per fetch run.
pub struct SnapshotArchive {
    dir: PathBuf,
}

impl SnapshotArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Writes the snapshot for `date`, replacing an earlier file from the same day.
    pub fn write(&self, date: NaiveDate, rows: &[ProductRow]) -> Result<PathBuf, StorageError> {
        let path = self.dir.join(archive_file_name(date));
        let mut writer = Writer::from_path(&path)?;

        writer.write_record(HEADER)?;
        for row in rows {
            writer.write_record(&[
                row.category.clone(),
                row.name.clone(),
                row.id.to_string(),
                row.full_name.clone(),
                row.brand.clone(),
                row.price.to_string(),
                row.discount.to_string(),
                row.stock.to_string(),
            ])?;
        }
        writer.flush()?;

        info!("Archived {} rows to {}", rows.len(), path.display());
        Ok(path)
    }
}

pub fn read_snapshot(path: &Path) -> Result<Snapshot, StorageError> {
    let mut reader = Reader::from_path(path)?;
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        rows.push(parse_record(&record)?);
    }

    Ok(rows)
}

fn parse_record(record: &StringRecord) -> Result<ProductRow, StorageError> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    let field = |i: usize| -> Result<&str, StorageError> {
        record.get(i).ok_or_else(|| StorageError::InvalidRecord {
            line,
            reason: format!("missing column {}", HEADER[i]),
        })
    };
    let number = |i: usize| -> Result<f64, StorageError> {
        let raw = field(i)?;
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| StorageError::InvalidRecord {
                line,
                reason: format!("{} is not a finite number: '{}'", HEADER[i], raw),
            })
    };

    let stock_raw = field(7)?;
    let stock = stock_raw
        .trim()
        .parse::<i64>()
        .or_else(|_| stock_raw.trim().parse::<f64>().map(|v| v as i64))
        .map_err(|_| StorageError::InvalidRecord {
            line,
            reason: format!("Stock is not a number: '{}'", stock_raw),
        })?;

    Ok(ProductRow {
        category: field(0)?.to_string(),
        name: field(1)?.to_string(),
        id: ProductId::parse(field(2)?),
        full_name: field(3)?.to_string(),
        brand: field(4)?.to_string(),
        price: number(5)?,
        discount: number(6)?,
        stock,
    })
}
