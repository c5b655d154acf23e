use crate::analyzer::price_matrix::{PriceKey, PriceMatrix};

/// Quantile levels, in percent, in the order they are reported and scanned.
pub const QUANTILE_LEVELS: [i32; 7] = [5, 10, 25, 50, 75, 90, 95];

/// Distribution of one product's final prices over the window.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRow {
    pub key: PriceKey,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Values at `QUANTILE_LEVELS`, same order.
    pub quantiles: [Option<f64>; 7],
    /// Second to last column of the matrix.
    pub yesterday: Option<f64>,
    /// Last column of the matrix.
    pub today: Option<f64>,
}

/// Linear interpolation between the closest ranks of `sorted`, `q` in [0, 1].
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let (a, b) = (sorted[lo], sorted[hi]);
    let v = a + (b - a) * (pos - lo as f64);
    Some(v.clamp(a, b))
}

/// Non-finite prices count as missing.
fn finite(cell: Option<f64>) -> Option<f64> {
    cell.filter(|v| v.is_finite())
}

impl StatsRow {
    pub fn from_cells(key: PriceKey, cells: &[Option<f64>]) -> Self {
        let mut observed: Vec<f64> = cells.iter().filter_map(|c| finite(*c)).collect();
        observed.sort_by(f64::total_cmp);

        let mut quantiles = [None; 7];
        for (slot, level) in quantiles.iter_mut().zip(QUANTILE_LEVELS) {
            *slot = quantile(&observed, level as f64 / 100.0);
        }

        let yesterday = match cells.len() {
            n if n >= 2 => finite(cells[n - 2]),
            _ => None,
        };

        Self {
            key,
            min: observed.first().copied(),
            max: observed.last().copied(),
            quantiles,
            yesterday,
            today: cells.last().copied().and_then(finite),
        }
    }
}

/// One statistics row per matrix row, in matrix order.
pub fn compute_stats(matrix: &PriceMatrix) -> Vec<StatsRow> {
    matrix
        .iter()
        .map(|(key, cells)| StatsRow::from_cells(key.clone(), cells))
        .collect()
}
