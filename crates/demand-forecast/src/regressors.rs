//! Regressor alignment and correlation.
//!
//! Joins demographic series against month grids, failing loudly when a
//! selected series does not cover a required date, and computes the
//! count/demographic correlation surface the dashboard displays.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use mission_store::{DemographicCatalog, MissionStore};

use crate::{ForecastError, Result};

/// A column-major block of regressor values aligned to a date grid.
#[derive(Debug, Clone)]
pub struct RegressorFrame {
    pub names: Vec<String>,
    /// One column per name, one row per date, same order as the grid the
    /// frame was built against.
    pub columns: Vec<Vec<f64>>,
    pub n_rows: usize,
}

impl RegressorFrame {
    pub fn empty(n_rows: usize) -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
            n_rows,
        }
    }

    pub fn n_regressors(&self) -> usize {
        self.names.len()
    }

    /// Row-slice view of the frame covering `range`, for cross-validation
    /// splits.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        Self {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| c[start..end].to_vec())
                .collect(),
            n_rows: end - start,
        }
    }
}

/// Build an aligned frame for `names` over `dates`.
///
/// Unknown names and coverage gaps are errors; the forecaster never
/// zero-fills a missing regressor value.
pub fn build_frame(
    catalog: &DemographicCatalog,
    names: &[String],
    dates: &[NaiveDate],
) -> Result<RegressorFrame> {
    let mut columns = Vec::with_capacity(names.len());

    for name in names {
        let series = catalog
            .get(name)
            .map_err(|_| ForecastError::UnknownRegressor(name.clone()))?;

        let mut column = Vec::with_capacity(dates.len());
        for &date in dates {
            let value = series.value_on(date).ok_or(ForecastError::RegressorAlignment {
                name: name.clone(),
                date,
            })?;
            column.push(value);
        }
        columns.push(column);
    }

    Ok(RegressorFrame {
        names: names.to_vec(),
        columns,
        n_rows: dates.len(),
    })
}

/// Pearson correlation between two equal-length samples; 0 for degenerate
/// inputs.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let mean_x: f64 = x[..n].iter().sum::<f64>() / n as f64;
    let mean_y: f64 = y[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..n {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom <= f64::EPSILON {
        0.0
    } else {
        cov / denom
    }
}

/// Correlation of monthly mission counts against every demographic series.
pub fn count_correlations(
    store: &MissionStore,
    catalog: &DemographicCatalog,
) -> Result<BTreeMap<String, f64>> {
    let monthly = store.monthly_counts();
    let dates: Vec<NaiveDate> = monthly.iter().map(|(d, _)| *d).collect();
    let counts: Vec<f64> = monthly.iter().map(|(_, v)| *v).collect();

    let mut correlations = BTreeMap::new();
    for series in catalog.iter() {
        let values: Result<Vec<f64>> = dates
            .iter()
            .map(|&d| {
                series.value_on(d).ok_or(ForecastError::RegressorAlignment {
                    name: series.name.clone(),
                    date: d,
                })
            })
            .collect();
        correlations.insert(series.name.clone(), pearson(&counts, &values?));
    }
    Ok(correlations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mission_store::{load_demand_points, BaseRegistry};

    #[test]
    fn test_pearson_perfect_correlation() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let y = vec![2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);

        let neg: Vec<f64> = y.iter().map(|v| -v).collect();
        assert!((pearson(&x, &neg) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_degenerate() {
        let x = vec![1.0, 1.0, 1.0];
        let y = vec![2.0, 4.0, 6.0];
        assert_eq!(pearson(&x, &y), 0.0);
        assert_eq!(pearson(&[1.0], &[2.0]), 0.0);
    }

    #[test]
    fn test_build_frame_alignment() {
        let catalog = DemographicCatalog::with_regional_projections();
        let dates: Vec<NaiveDate> = (0..12)
            .map(|i| NaiveDate::from_ymd_opt(2024, i + 1, 1).unwrap())
            .collect();
        let frame = build_frame(
            &catalog,
            &["population_index".to_string()],
            &dates,
        )
        .unwrap();
        assert_eq!(frame.n_rows, 12);
        assert_eq!(frame.columns[0].len(), 12);
        // Monotone growth series stays monotone after interpolation
        for w in frame.columns[0].windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn test_correlations_in_range() {
        let registry = BaseRegistry::with_gulf_coast_network();
        let demand = load_demand_points();
        let store = MissionStore::with_reference_history(&registry, &demand);
        let catalog = DemographicCatalog::with_regional_projections();

        let corr = count_correlations(&store, &catalog).unwrap();
        assert_eq!(corr.len(), 4);
        for (name, r) in &corr {
            assert!((-1.0..=1.0).contains(r), "{} out of range: {}", name, r);
        }
        // Counts grow with the population index in the reference history
        assert!(corr["population_index"] > 0.0);
    }
}
