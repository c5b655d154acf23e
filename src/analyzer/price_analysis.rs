use crate::analyzer::price_matrix::PriceMatrix;
use crate::analyzer::statistics::{compute_stats, StatsRow, QUANTILE_LEVELS};
use crate::model::ProductId;

/// Bucket of a product whose price today is not below any quantile.
pub const UNCLASSIFIED: i32 = -1;
/// Largest bucket that still counts as a good time to buy.
pub const BEST_MAX_BUCKET: i32 = 25;
/// Smallest bucket that counts as a bad time to buy.
pub const WORST_MIN_BUCKET: i32 = 75;

/// Trait defining the interface for a price history analyzer.
pub trait Analyzer {
    fn price_statistics(&self, matrix: &PriceMatrix) -> Vec<StatsRow>;
    fn classify(&self, row: &StatsRow) -> i32;
    fn find_deals(&self, stats: &[StatsRow]) -> DealReport;
}

/// Statistics row with the bucket today's price fell into.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRow {
    pub stats: StatsRow,
    pub bucket: i32,
}

/// One line of a report sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct DealRow {
    pub category: String,
    pub product_id: ProductId,
    pub full_name: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub yesterday: Option<f64>,
    pub today: Option<f64>,
    pub bucket: i32,
}

impl From<&ClassifiedRow> for DealRow {
    fn from(row: &ClassifiedRow) -> Self {
        let stats = &row.stats;
        Self {
            category: stats.key.category.clone(),
            product_id: stats.key.id.clone(),
            full_name: stats.key.full_name.clone(),
            min: stats.min,
            max: stats.max,
            yesterday: stats.yesterday,
            today: stats.today,
            bucket: row.bucket,
        }
    }
}

/// Products worth buying today and products better bought later,
/// each ascending by bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DealReport {
    pub best: Vec<DealRow>,
    pub worst: Vec<DealRow>,
}

/// Position of the first value strictly greater than `probe`, scanning left to right.
/// Missing values never match.
pub fn index_more(values: &[Option<f64>], probe: f64) -> Option<usize> {
    values
        .iter()
        .position(|v| matches!(v, Some(v) if *v > probe))
}

/// Bucket label of the first quantile above `today`, or `UNCLASSIFIED`.
pub fn quantile_bucket(quantiles: &[Option<f64>; 7], today: Option<f64>) -> i32 {
    today
        .and_then(|today| index_more(quantiles, today))
        .map(|i| QUANTILE_LEVELS[i])
        .unwrap_or(UNCLASSIFIED)
}

/// Implementation of the price history analyzer.
pub struct AnalyzerImpl;

impl AnalyzerImpl {
    pub fn new() -> Self {
        Self
    }

    /// Attaches a bucket to every row, drops unclassified rows and stable-sorts
    /// the rest ascending by bucket.
    pub fn classify_all(&self, stats: &[StatsRow]) -> Vec<ClassifiedRow> {
        let mut classified: Vec<ClassifiedRow> = stats
            .iter()
            .map(|row| ClassifiedRow {
                stats: row.clone(),
                bucket: self.classify(row),
            })
            .filter(|row| row.bucket != UNCLASSIFIED)
            .collect();
        classified.sort_by_key(|row| row.bucket);
        classified
    }
}

impl Analyzer for AnalyzerImpl {
    fn price_statistics(&self, matrix: &PriceMatrix) -> Vec<StatsRow> {
        compute_stats(matrix)
    }

    fn classify(&self, row: &StatsRow) -> i32 {
        quantile_bucket(&row.quantiles, row.today)
    }

    fn find_deals(&self, stats: &[StatsRow]) -> DealReport {
        let classified = self.classify_all(stats);

        let best = classified
            .iter()
            .filter(|row| row.bucket <= BEST_MAX_BUCKET)
            .map(DealRow::from)
            .collect();
        let worst = classified
            .iter()
            .filter(|row| row.bucket >= WORST_MIN_BUCKET)
            .map(DealRow::from)
            .collect();

        DealReport { best, worst }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::price_matrix::PriceKey;

    fn quantiles(values: [f64; 7]) -> [Option<f64>; 7] {
        values.map(Some)
    }

    fn stats(id: i64, q: [f64; 7], today: Option<f64>) -> StatsRow {
        StatsRow {
            key: PriceKey {
                category: "snacks".into(),
                id: ProductId::Int(id),
                full_name: format!("Chips {}", id),
            },
            min: Some(q[0]),
            max: Some(q[6]),
            quantiles: quantiles(q),
            yesterday: Some(q[3]),
            today,
        }
    }

    const Q: [f64; 7] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];

    #[test]
    fn test_bucket_is_first_quantile_strictly_above_today() {
        let q = quantiles([10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0]);
        assert_eq!(quantile_bucket(&q, Some(35.0)), 50);
        assert_eq!(quantile_bucket(&quantiles(Q), Some(6.5)), 95);
        assert_eq!(quantile_bucket(&quantiles(Q), Some(8.0)), UNCLASSIFIED);
        assert_eq!(quantile_bucket(&quantiles(Q), Some(0.5)), 5);
    }

    #[test]
    fn test_equal_to_quantile_moves_to_next_bucket() {
        assert_eq!(quantile_bucket(&quantiles(Q), Some(3.0)), 50);
        assert_eq!(quantile_bucket(&quantiles(Q), Some(7.0)), UNCLASSIFIED);
    }

    #[test]
    fn test_flat_history_is_unclassified() {
        assert_eq!(quantile_bucket(&quantiles([4.0; 7]), Some(4.0)), UNCLASSIFIED);
    }

    #[test]
    fn test_missing_today_or_quantiles_is_unclassified() {
        assert_eq!(quantile_bucket(&quantiles(Q), None), UNCLASSIFIED);
        assert_eq!(quantile_bucket(&[None; 7], Some(1.0)), UNCLASSIFIED);
    }

    #[test]
    fn test_index_more_skips_missing_values() {
        let values = [None, Some(2.0), Some(5.0)];
        assert_eq!(index_more(&values, 1.0), Some(1));
        assert_eq!(index_more(&values, 2.0), Some(2));
        assert_eq!(index_more(&values, 9.0), None);
    }

    #[test]
    fn test_find_deals_partitions_and_orders_by_bucket() {
        let rows = vec![
            stats(1, Q, Some(6.5)), // 95
            stats(2, Q, Some(2.5)), // 25
            stats(3, Q, Some(9.0)), // unclassified
            stats(4, Q, Some(0.5)), // 5
            stats(5, Q, Some(3.5)), // 50
            stats(6, Q, Some(4.5)), // 75
            stats(7, Q, Some(0.9)), // 5
            stats(8, Q, None),      // unclassified
        ];
        let report = AnalyzerImpl::new().find_deals(&rows);

        let ids = |rows: &[DealRow]| -> Vec<(ProductId, i32)> {
            rows.iter().map(|r| (r.product_id.clone(), r.bucket)).collect()
        };
        assert_eq!(
            ids(&report.best),
            vec![(ProductId::Int(4), 5), (ProductId::Int(7), 5), (ProductId::Int(2), 25)]
        );
        assert_eq!(
            ids(&report.worst),
            vec![(ProductId::Int(6), 75), (ProductId::Int(1), 95)]
        );
    }

    #[test]
    fn test_deal_row_carries_prices() {
        let report = AnalyzerImpl::new().find_deals(&[stats(11, Q, Some(1.5))]);
        let row = &report.best[0];
        assert_eq!(row.category, "snacks");
        assert_eq!(row.full_name, "Chips 11");
        assert_eq!(row.yesterday, Some(4.0));
        assert_eq!(row.today, Some(1.5));
        assert_eq!(row.min, Some(1.0));
        assert_eq!(row.max, Some(7.0));
        assert_eq!(row.bucket, 10);
        assert!(report.worst.is_empty());
    }

    #[test]
    fn test_classify_all_keeps_only_classified_rows() {
        let rows = vec![stats(1, Q, Some(8.0)), stats(2, Q, Some(5.5))];
        let classified = AnalyzerImpl::new().classify_all(&rows);
        assert_eq!(classified.len(), 1);
        assert_eq!(classified[0].bucket, 90);
    }
}
