use crate::model::{ProductId, ProductRow};
use std::collections::BTreeMap;
use std::collections::btree_map;
use tracing::warn;

/// Identity of a product across snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PriceKey {
    pub category: String,
    pub id: ProductId,
    pub full_name: String,
}

impl From<&ProductRow> for PriceKey {
    fn from(row: &ProductRow) -> Self {
        Self {
            category: row.category.clone(),
            id: row.id.clone(),
            full_name: row.full_name.clone(),
        }
    }
}

/// Final prices per product, one column per snapshot, oldest column first.
/// `None` marks a day on which the product was not listed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceMatrix {
    days: Vec<String>,
    rows: BTreeMap<PriceKey, Vec<Option<f64>>>,
}

impl PriceMatrix {
    /// Outer-joins the snapshots on (category, id, full name). `snapshots` must be
    /// in chronological order; each entry is labelled with its day.
    pub fn build(snapshots: &[(String, &[ProductRow])]) -> Self {
        let width = snapshots.len();
        let mut rows: BTreeMap<PriceKey, Vec<Option<f64>>> = BTreeMap::new();

        for (col, (day, snapshot)) in snapshots.iter().enumerate() {
            let mut duplicates = 0;
            for row in snapshot.iter() {
                let cells = rows
                    .entry(PriceKey::from(row))
                    .or_insert_with(|| vec![None; width]);
                if cells[col].is_some() {
                    duplicates += 1;
                    continue;
                }
                cells[col] = Some(row.final_price());
            }
            if duplicates > 0 {
                warn!("{}: ignored {} repeated product rows", day, duplicates);
            }
        }

        Self {
            days: snapshots.iter().map(|(day, _)| day.clone()).collect(),
            rows,
        }
    }

    pub fn days(&self) -> &[String] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &PriceKey) -> Option<&[Option<f64>]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, PriceKey, Vec<Option<f64>>> {
        self.rows.iter()
    }
}
