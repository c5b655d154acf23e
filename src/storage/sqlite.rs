use crate::analyzer::price_analysis::{DealReport, DealRow};
use crate::model::{ProductId, StorageError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

pub const BEST_SHEET: &str = "favorable buys today";
pub const WORST_SHEET: &str = "better later";

/// Analysis workbook: one table per sheet plus a log of runs.
pub struct SqliteStorage {
    conn: Connection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub ran_at: DateTime<Utc>,
    pub snapshots: usize,
    pub products: usize,
    pub best: usize,
    pub worst: usize,
}

impl SqliteStorage {
    /// Opens the workbook and makes sure every sheet exists.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ran_at TEXT NOT NULL,
                snapshots INTEGER NOT NULL,
                products INTEGER NOT NULL,
                best INTEGER NOT NULL,
                worst INTEGER NOT NULL
            );
            ",
        )?;
        for sheet in [BEST_SHEET, WORST_SHEET] {
            Self::create_sheet(&conn, sheet)?;
        }
        Ok(Self { conn })
    }

    fn create_sheet(conn: &Connection, sheet: &str) -> Result<(), StorageError> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (
                position INTEGER PRIMARY KEY,
                category TEXT NOT NULL,
                product_id TEXT NOT NULL,
                full_name TEXT NOT NULL,
                min_price REAL,
                max_price REAL,
                yesterday REAL,
                today REAL,
                bucket INTEGER NOT NULL
            );",
            sheet
        ))?;
        Ok(())
    }

    /// Replaces both sheets with the rows of `report`, in report order.
    pub fn save_report(&mut self, report: &DealReport) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        for (sheet, rows) in [(BEST_SHEET, &report.best), (WORST_SHEET, &report.worst)] {
            tx.execute(&format!("DELETE FROM \"{}\"", sheet), [])?;
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO \"{}\" (position, category, product_id, full_name,
                    min_price, max_price, yesterday, today, bucket)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                sheet
            ))?;
            for (position, row) in rows.iter().enumerate() {
                stmt.execute(params![
                    position as i64,
                    &row.category,
                    row.product_id.to_string(),
                    &row.full_name,
                    row.min,
                    row.max,
                    row.yesterday,
                    row.today,
                    row.bucket,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn record_run(&self, run: &RunRecord) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO runs (ran_at, snapshots, products, best, worst)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run.ran_at.to_rfc3339(),
                run.snapshots as i64,
                run.products as i64,
                run.best as i64,
                run.worst as i64,
            ],
        )?;
        Ok(())
    }

    pub fn last_run(&self) -> Result<Option<RunRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT ran_at, snapshots, products, best, worst FROM runs ORDER BY id DESC LIMIT 1",
        )?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            let ran_at: String = row.get(0)?;
            let ran_at = DateTime::parse_from_rfc3339(&ran_at)
                .map_err(|e| StorageError::InvalidRecord {
                    line: 0,
                    reason: format!("invalid run timestamp: {}", e),
                })?
                .with_timezone(&Utc);
            Ok(Some(RunRecord {
                ran_at,
                snapshots: row.get::<_, i64>(1)? as usize,
                products: row.get::<_, i64>(2)? as usize,
                best: row.get::<_, i64>(3)? as usize,
                worst: row.get::<_, i64>(4)? as usize,
            }))
        } else {
            Ok(None)
        }
    }

    /// Reads one sheet back in report order.
    pub fn load_sheet(&self, sheet: &str) -> Result<Vec<DealRow>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT category, product_id, full_name, min_price, max_price, yesterday, today, bucket
             FROM \"{}\" ORDER BY position ASC",
            sheet
        ))?;
        let rows = stmt.query_map([], Self::map_deal)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    fn map_deal(row: &Row) -> Result<DealRow, rusqlite::Error> {
        let product_id: String = row.get(1)?;
        Ok(DealRow {
            category: row.get(0)?,
            product_id: ProductId::parse(&product_id),
            full_name: row.get(2)?,
            min: row.get(3)?,
            max: row.get(4)?,
            yesterday: row.get(5)?,
            today: row.get(6)?,
            bucket: row.get(7)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deal(id: i64, bucket: i32) -> DealRow {
        DealRow {
            category: "dairy".into(),
            product_id: ProductId::Int(id),
            full_name: format!("Product {}", id),
            min: Some(1.0),
            max: Some(9.0),
            yesterday: Some(5.0),
            today: Some(2.0),
            bucket,
        }
    }

    #[test]
    fn test_save_report_replaces_sheets() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let first = DealReport {
            best: vec![deal(1, 5), deal(2, 25)],
            worst: vec![deal(3, 95)],
        };
        storage.save_report(&first).unwrap();

        let second = DealReport {
            best: vec![deal(4, 10)],
            worst: vec![],
        };
        storage.save_report(&second).unwrap();

        assert_eq!(storage.load_sheet(BEST_SHEET).unwrap(), vec![deal(4, 10)]);
        assert!(storage.load_sheet(WORST_SHEET).unwrap().is_empty());
    }

    #[test]
    fn test_sheet_keeps_report_order_and_missing_values() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let mut sparse = deal(7, 75);
        sparse.yesterday = None;
        let report = DealReport {
            best: vec![],
            worst: vec![sparse.clone(), deal(8, 90), deal(9, 95)],
        };
        storage.save_report(&report).unwrap();

        assert_eq!(storage.load_sheet(WORST_SHEET).unwrap(), report.worst);
    }

    #[test]
    fn test_run_log_returns_latest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.db");
        let storage = SqliteStorage::new(path.to_str().unwrap()).unwrap();
        assert!(storage.last_run().unwrap().is_none());

        let ran_at = DateTime::parse_from_rfc3339("2024-05-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let run = RunRecord { ran_at, snapshots: 3, products: 120, best: 4, worst: 6 };
        storage.record_run(&RunRecord { snapshots: 1, ..run.clone() }).unwrap();
        storage.record_run(&run).unwrap();

        assert_eq!(storage.last_run().unwrap(), Some(run));
    }
}
