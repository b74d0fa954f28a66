//! Standardization and fractile bucketing.
//!
//! Z-scores use the population convention (divide by n). Fractiles are rank
//! bands: rows are stably sorted by score (ties keep table order) and the row
//! at rank `r` of `n` gets label `r * N / n + 1`. With `n >= N` every label is
//! populated and bucket sizes differ by at most one; with fewer rows some
//! labels stay empty.

use crate::domain::error::FractileError;
use crate::domain::table::UniverseTable;
use polars::prelude::*;
use tracing::debug;

/// `(x - mean) / std` with the population standard deviation.
pub fn zscore(name: &str) -> Expr {
    ((col(name) - col(name).mean()) / col(name).std(0)).alias(name)
}

/// Z-scores of a complete numeric column. A constant column maps to all zeros.
pub fn standardize(values: &Float64Chunked) -> Result<Vec<f64>, FractileError> {
    if values.min() == values.max() {
        return Ok(vec![0.0; values.len()]);
    }
    let name = values.name().to_string();
    let frame = DataFrame::new(vec![values.clone().into_series().into_column()])?;
    let scored = frame.lazy().select([zscore(&name)]).collect()?;
    Ok(scored.column(&name)?.f64()?.into_no_null_iter().collect())
}

pub fn check_fractile_count(fractiles: usize) -> Result<(), FractileError> {
    if fractiles < 2 {
        return Err(FractileError::ConfigInvalid {
            section: "portfolio".into(),
            key: "fractiles".into(),
            reason: format!("need at least 2 fractiles, got {fractiles}"),
        });
    }
    Ok(())
}

/// Audit record of one fractile.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FractileBucket {
    pub label: usize,
    pub count: usize,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FractileAssignment {
    /// Label per input position, in `1..=fractiles`.
    pub labels: Vec<usize>,
    /// One entry per label, ascending; empty buckets have no bounds.
    pub buckets: Vec<FractileBucket>,
}

impl FractileAssignment {
    pub fn count(&self, label: usize) -> usize {
        self.buckets
            .get(label.wrapping_sub(1))
            .map_or(0, |b| b.count)
    }

    /// Number of labels actually used.
    pub fn populated(&self) -> usize {
        self.buckets.iter().filter(|b| b.count > 0).count()
    }
}

/// Partitions `scores` into `fractiles` contiguous rank bands.
pub fn assign_fractiles(scores: &[f64], fractiles: usize) -> Result<FractileAssignment, FractileError> {
    check_fractile_count(fractiles)?;
    let n = scores.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]).then(a.cmp(&b)));

    let mut labels = vec![0; n];
    let mut buckets: Vec<FractileBucket> = (1..=fractiles)
        .map(|label| FractileBucket {
            label,
            count: 0,
            lower: None,
            upper: None,
        })
        .collect();

    for (rank, &pos) in order.iter().enumerate() {
        let label = rank * fractiles / n + 1;
        labels[pos] = label;
        let bucket = &mut buckets[label - 1];
        bucket.count += 1;
        bucket.lower.get_or_insert(scores[pos]);
        bucket.upper = Some(scores[pos]);
    }

    Ok(FractileAssignment { labels, buckets })
}

/// Standardized scores and fractiles of one factor.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorScores {
    pub factor: String,
    pub zscores: Vec<f64>,
    pub fractiles: FractileAssignment,
}

/// Complete rows of a universe with per-factor scores.
#[derive(Debug, Clone)]
pub struct ScoredUniverse {
    pub table: UniverseTable,
    pub fractile_count: usize,
    pub factors: Vec<FactorScores>,
}

impl ScoredUniverse {
    pub fn factor(&self, name: &str) -> Option<&FactorScores> {
        self.factors.iter().find(|f| f.factor == name)
    }

    pub fn factor_names(&self) -> Vec<&str> {
        self.factors.iter().map(|f| f.factor.as_str()).collect()
    }
}

pub fn zscore_column(factor: &str) -> String {
    format!("Zscore {factor}")
}

pub fn fractile_column(factor: &str) -> String {
    format!("Fractile {factor}")
}

/// Drops rows missing any `required` or `factors` value, then scores every factor.
pub fn score_universe<S: AsRef<str>>(
    universe: &UniverseTable,
    required: &[S],
    factors: &[S],
    fractile_count: usize,
) -> Result<ScoredUniverse, FractileError> {
    check_fractile_count(fractile_count)?;
    universe.require_columns(required)?;
    universe.require_columns(factors)?;

    let needed: Vec<&str> = required.iter().chain(factors).map(|c| c.as_ref()).collect();
    let table = universe.drop_missing_in(&needed)?;
    let dropped = universe.len() - table.len();
    if dropped > 0 {
        debug!(dropped, "rows with missing factor inputs dropped");
    }

    let mut scored = Vec::with_capacity(factors.len());
    for factor in factors {
        let factor = factor.as_ref();
        let zscores = standardize(&table.numeric_column(factor)?)?;
        let fractiles = assign_fractiles(&zscores, fractile_count)?;
        debug!(
            factor,
            buckets = ?fractiles.buckets.iter().map(|b| b.count).collect::<Vec<_>>(),
            "factor bucketed"
        );
        scored.push(FactorScores {
            factor: factor.to_string(),
            zscores,
            fractiles,
        });
    }

    Ok(ScoredUniverse {
        table,
        fractile_count,
        factors: scored,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn z(values: &[f64]) -> Vec<f64> {
        standardize(&Float64Chunked::from_slice("x".into(), values)).unwrap()
    }

    #[test]
    fn standardize_uses_population_std() {
        let z = z(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        // mean 5, population std 2
        assert_relative_eq!(z[0], -1.5, epsilon = 1e-12);
        assert_relative_eq!(z[7], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn standardize_constant_input_is_zero() {
        assert_eq!(z(&[3.0, 3.0, 3.0]), vec![0.0, 0.0, 0.0]);
        assert_eq!(z(&[0.1, 0.1, 0.1, 0.1]), vec![0.0; 4]);
        assert!(z(&[]).is_empty());
    }

    #[test]
    fn standardize_does_not_depend_on_units() {
        let unit: Vec<f64> = (1..=8).map(f64::from).collect();
        let tiny: Vec<f64> = unit.iter().map(|v| v * 1e-17).collect();
        let huge: Vec<f64> = unit.iter().map(|v| v * 1e12).collect();
        let expected = z(&unit);
        for scaled in [z(&tiny), z(&huge)] {
            assert!(scaled.iter().any(|v| *v != 0.0));
            for (a, b) in scaled.iter().zip(&expected) {
                assert_relative_eq!(*a, *b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn eight_values_into_quartiles() {
        let values: Vec<f64> = (1..=8).map(f64::from).collect();
        let a = assign_fractiles(&z(&values), 4).unwrap();
        assert_eq!(a.labels, vec![1, 1, 2, 2, 3, 3, 4, 4]);
        assert!(a.buckets.iter().all(|b| b.count == 2));
    }

    #[test]
    fn labels_follow_score_not_position() {
        let a = assign_fractiles(&[0.5, -1.0, 2.0, 0.0], 2).unwrap();
        assert_eq!(a.labels, vec![2, 1, 2, 1]);
    }

    #[test]
    fn ties_keep_table_order() {
        let a = assign_fractiles(&[1.0, 1.0, 1.0, 1.0], 2).unwrap();
        assert_eq!(a.labels, vec![1, 1, 2, 2]);
    }

    #[test]
    fn bucket_bounds_are_reported() {
        let a = assign_fractiles(&[4.0, 1.0, 3.0, 2.0, 6.0, 5.0], 3).unwrap();
        assert_eq!(a.buckets[0].lower, Some(1.0));
        assert_eq!(a.buckets[0].upper, Some(2.0));
        assert_eq!(a.buckets[2].lower, Some(5.0));
        assert_eq!(a.buckets[2].upper, Some(6.0));
    }

    #[test]
    fn too_few_rows_merge_buckets() {
        let a = assign_fractiles(&[1.0, 2.0], 4).unwrap();
        assert_eq!(a.labels, vec![1, 3]);
        assert_eq!(a.populated(), 2);
        assert_eq!(a.count(4), 0);
        assert_eq!(a.buckets[3].lower, None);
    }

    #[test]
    fn fewer_than_two_fractiles_is_config_error() {
        for n in [0, 1] {
            let err = assign_fractiles(&[1.0, 2.0, 3.0], n).unwrap_err();
            assert!(matches!(err, FractileError::ConfigInvalid { ref key, .. } if key == "fractiles"));
        }
    }

    #[test]
    fn score_universe_drops_incomplete_rows() {
        let table = UniverseTable::from_cells(
            &["name", "ROIC"],
            &[vec!["A", "1"], vec!["B", ""], vec!["C", "3"]],
        )
        .unwrap();
        let scored = score_universe(&table, &["name"], &["ROIC"], 2).unwrap();
        assert_eq!(scored.table.len(), 2);
        assert_eq!(scored.factor("ROIC").unwrap().fractiles.labels, vec![1, 2]);
    }

    #[test]
    fn score_universe_rejects_text_factor() {
        let table =
            UniverseTable::from_cells(&["name", "ROIC"], &[vec!["A", "1"], vec!["B", "high"]])
                .unwrap();
        let err = score_universe(&table, &["name"], &["ROIC"], 2).unwrap_err();
        assert!(matches!(err, FractileError::Parse { row: 1, .. }));
    }

    #[test]
    fn score_universe_rejects_single_fractile() {
        let table =
            UniverseTable::from_cells(&["name", "ROIC"], &[vec!["A", "1"], vec!["B", "2"]]).unwrap();
        assert!(matches!(
            score_universe(&table, &["name"], &["ROIC"], 1),
            Err(FractileError::ConfigInvalid { .. })
        ));
    }

    proptest! {
        #[test]
        fn partition_is_balanced(
            values in prop::collection::vec(-1e6f64..1e6, 2..200),
            fractiles in 2usize..10,
        ) {
            prop_assume!(values.len() >= fractiles);
            let a = assign_fractiles(&values, fractiles).unwrap();
            prop_assert!(a.labels.iter().all(|&l| (1..=fractiles).contains(&l)));
            let counts: Vec<usize> = a.buckets.iter().map(|b| b.count).collect();
            let max = *counts.iter().max().unwrap();
            let min = *counts.iter().min().unwrap();
            prop_assert!(max - min <= 1);
        }

        #[test]
        fn zscores_have_zero_mean_unit_std(
            values in prop::collection::vec(-1e3f64..1e3, 2..100),
            scale in prop::sample::select(vec![1e-15, 1.0, 1e15]),
        ) {
            prop_assume!(values.iter().any(|v| (v - values[0]).abs() > 1e-6));
            let scaled: Vec<f64> = values.iter().map(|v| v * scale).collect();
            let zs = Float64Chunked::from_vec("z".into(), z(&scaled));
            prop_assert!(zs.mean().unwrap().abs() < 1e-6);
            prop_assert!((zs.std(0).unwrap() - 1.0).abs() < 1e-6);
        }

        #[test]
        fn higher_labels_never_hold_lower_scores(values in prop::collection::vec(-100f64..100.0, 4..60)) {
            let a = assign_fractiles(&values, 4).unwrap();
            for i in 0..values.len() {
                for j in 0..values.len() {
                    if a.labels[i] < a.labels[j] {
                        prop_assert!(values[i] <= values[j]);
                    }
                }
            }
        }
    }
}
