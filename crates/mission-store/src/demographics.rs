//! Demographic regressor series.
//!
//! Annual service-area demographics (census observations through 2025,
//! state demographer projections after that), exposed as monthly values by
//! linear interpolation between January anchors. These are the exogenous
//! regressors the demand forecaster can join against monthly mission counts.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{DataError, Result};

/// One named annual series with projections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemographicSeries {
    pub name: String,
    /// (year, value) anchors at January 1, ascending and contiguous.
    pub anchors: Vec<(i32, f64)>,
}

impl DemographicSeries {
    /// Interpolated value at `date`, or `None` outside the anchored span.
    /// The caller treats `None` for a needed date as an alignment error,
    /// never as a silent zero.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        let first_year = self.anchors.first()?.0;
        let last_year = self.anchors.last()?.0;
        if date.year() < first_year || date.year() > last_year {
            return None;
        }
        if date.year() == last_year {
            // Only January 1 of the final anchor year is covered
            let anchor = NaiveDate::from_ymd_opt(last_year, 1, 1)?;
            if date != anchor {
                return None;
            }
            return self.anchors.last().map(|a| a.1);
        }

        let idx = (date.year() - first_year) as usize;
        let (y0, v0) = self.anchors[idx];
        let (_, v1) = self.anchors[idx + 1];

        let start = NaiveDate::from_ymd_opt(y0, 1, 1)?;
        let end = NaiveDate::from_ymd_opt(y0 + 1, 1, 1)?;
        let span = (end - start).num_days() as f64;
        let elapsed = (date - start).num_days() as f64;
        Some(v0 + (v1 - v0) * elapsed / span)
    }

    /// Last date the series covers.
    pub fn coverage_end(&self) -> Option<NaiveDate> {
        let last_year = self.anchors.last()?.0;
        NaiveDate::from_ymd_opt(last_year, 1, 1)
    }
}

pub struct DemographicCatalog {
    series: Vec<DemographicSeries>,
}

impl DemographicCatalog {
    pub fn with_regional_projections() -> Self {
        let table: Vec<(&str, Vec<(i32, f64)>)> = vec![
            (
                "pop_over_65_ratio",
                vec![
                    (2022, 0.1280),
                    (2023, 0.1315),
                    (2024, 0.1352),
                    (2025, 0.1390),
                    (2026, 0.1428),
                    (2027, 0.1466),
                    (2028, 0.1503),
                    (2029, 0.1540),
                ],
            ),
            (
                "pop_under_18_ratio",
                vec![
                    (2022, 0.2620),
                    (2023, 0.2598),
                    (2024, 0.2577),
                    (2025, 0.2556),
                    (2026, 0.2535),
                    (2027, 0.2514),
                    (2028, 0.2494),
                    (2029, 0.2475),
                ],
            ),
            (
                "population_index",
                vec![
                    (2022, 1.0000),
                    (2023, 1.0180),
                    (2024, 1.0355),
                    (2025, 1.0528),
                    (2026, 1.0701),
                    (2027, 1.0874),
                    (2028, 1.1046),
                    (2029, 1.1218),
                ],
            ),
            (
                "median_age",
                vec![
                    (2022, 34.60),
                    (2023, 34.78),
                    (2024, 34.96),
                    (2025, 35.15),
                    (2026, 35.34),
                    (2027, 35.52),
                    (2028, 35.70),
                    (2029, 35.88),
                ],
            ),
        ];

        let series = table
            .into_iter()
            .map(|(name, anchors)| DemographicSeries {
                name: name.to_string(),
                anchors,
            })
            .collect();

        Self { series }
    }

    pub fn names(&self) -> Vec<String> {
        self.series.iter().map(|s| s.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Result<&DemographicSeries> {
        self.series
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| DataError::SeriesNotFound(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DemographicSeries> {
        self.series.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names() {
        let catalog = DemographicCatalog::with_regional_projections();
        let names = catalog.names();
        assert!(names.contains(&"pop_over_65_ratio".to_string()));
        assert!(names.contains(&"population_index".to_string()));
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_interpolation_at_anchor() {
        let catalog = DemographicCatalog::with_regional_projections();
        let series = catalog.get("population_index").unwrap();
        let jan_2023 = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let v = series.value_on(jan_2023).unwrap();
        assert!((v - 1.0180).abs() < 1e-9);
    }

    #[test]
    fn test_interpolation_midyear_is_between_anchors() {
        let catalog = DemographicCatalog::with_regional_projections();
        let series = catalog.get("pop_over_65_ratio").unwrap();
        let jul = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let v = series.value_on(jul).unwrap();
        assert!(v > 0.1352 && v < 0.1390, "midyear value {}", v);
    }

    #[test]
    fn test_out_of_range_is_none() {
        let catalog = DemographicCatalog::with_regional_projections();
        let series = catalog.get("median_age").unwrap();
        let far_future = NaiveDate::from_ymd_opt(2031, 6, 1).unwrap();
        assert!(series.value_on(far_future).is_none());
        let past = NaiveDate::from_ymd_opt(2019, 6, 1).unwrap();
        assert!(series.value_on(past).is_none());
    }

    #[test]
    fn test_unknown_series_errors() {
        let catalog = DemographicCatalog::with_regional_projections();
        assert!(catalog.get("gdp_per_capita").is_err());
    }
}
