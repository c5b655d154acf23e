use crate::model::{ProductRow, Snapshot};
use std::collections::HashSet;
use tracing::info;

/// Trims text fields and keeps only the first row for each product id.
pub fn normalize_all(rows: Snapshot) -> Snapshot {
    let total = rows.len();
    let mut seen = HashSet::new();
    let mut result = Vec::with_capacity(total);

    for mut row in rows {
        if !seen.insert(row.id.clone()) {
            continue;
        }
        normalize_row(&mut row);
        result.push(row);
    }

    if result.len() < total {
        info!("Dropped {} duplicate product rows", total - result.len());
    }
    result
}

fn normalize_row(row: &mut ProductRow) {
    for field in [
        &mut row.category,
        &mut row.name,
        &mut row.full_name,
        &mut row.brand,
    ] {
        let trimmed = field.trim();
        if trimmed.len() != field.len() {
            *field = trimmed.to_string();
        }
    }
}
