//! Demand Forecast Library
//!
//! Monthly demand forecasting for the operations dashboard: aggregates the
//! mission log to monthly counts, joins optional demographic regressors,
//! and fits a regressor-aware seasonal time-series model behind a pluggable
//! engine interface. Produces the in-sample fit, an out-of-sample forecast
//! with a confidence band, decomposed components, and rolling-origin
//! cross-validation metrics.
//!
//! The built-in engine ([`model::RidgeSeasonalEngine`]) is a MAP reading of
//! the Prophet-style configuration surface: piecewise-linear trend via
//! changepoint hinges, yearly Fourier seasonality, standardized exogenous
//! regressors, with the prior scales mapped to ridge penalties. Any
//! compliant engine can be substituted through [`ForecastEngine`].

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use mission_store::{DemographicCatalog, MissionStore};

pub mod cv;
pub mod model;
pub mod regressors;

pub use model::RidgeSeasonalEngine;
pub use regressors::{count_correlations, RegressorFrame};

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Invalid forecast configuration: {0}")]
    InvalidConfig(String),
    #[error("Unknown regressor: {0}")]
    UnknownRegressor(String),
    /// Not enough monthly history for the requested seasonality structure.
    #[error("Insufficient history: have {have} months, need {need}")]
    InsufficientData { have: usize, need: usize },
    /// A selected regressor does not cover the full historical range plus
    /// the forecast horizon. Never silently zero-filled.
    #[error("Regressor {name} has no value for {date}")]
    RegressorAlignment { name: String, date: NaiveDate },
    #[error("Forecast computation failed: {0}")]
    Computation(String),
}

pub type Result<T> = std::result::Result<T, ForecastError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Growth {
    Linear,
    Logistic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    Additive,
    Multiplicative,
}

/// Explicit, range-validated forecast configuration — never an open map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub extra_vars: Vec<String>,
    pub growth: Growth,
    pub yearly_seasonality: bool,
    pub seasonality_mode: SeasonalityMode,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub regressor_prior_scale: f64,
    pub interval_width: f64,
    /// Forecast horizon in months. Zero is allowed and yields an empty
    /// forecast series.
    pub periods: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            extra_vars: Vec::new(),
            growth: Growth::Linear,
            yearly_seasonality: true,
            seasonality_mode: SeasonalityMode::Additive,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            regressor_prior_scale: 10.0,
            interval_width: 0.8,
            periods: 12,
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value, lo, hi) in [
            ("changepoint_prior_scale", self.changepoint_prior_scale, 0.001, 10.0),
            ("seasonality_prior_scale", self.seasonality_prior_scale, 0.01, 100.0),
            ("regressor_prior_scale", self.regressor_prior_scale, 0.01, 100.0),
        ] {
            if !value.is_finite() || value < lo || value > hi {
                return Err(ForecastError::InvalidConfig(format!(
                    "{} must be in [{}, {}]",
                    name, lo, hi
                )));
            }
        }
        if !self.interval_width.is_finite()
            || self.interval_width < 0.5
            || self.interval_width > 0.99
        {
            return Err(ForecastError::InvalidConfig(
                "interval_width must be in [0.5, 0.99]".to_string(),
            ));
        }
        if self.periods > 60 {
            return Err(ForecastError::InvalidConfig(
                "periods must not exceed 60 months".to_string(),
            ));
        }
        Ok(())
    }

    /// Minimum months of history the configuration can be fit on.
    pub fn min_history_months(&self) -> usize {
        if self.yearly_seasonality {
            24
        } else {
            12
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub count: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Decomposed model components over the full timeline (history + horizon).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSeries {
    pub dates: Vec<NaiveDate>,
    pub trend: Vec<f64>,
    pub yearly: Vec<f64>,
    pub regressors: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvMetrics {
    pub mae: f64,
    pub mape: f64,
    pub rmse: f64,
    /// Empirical share of held-out actuals inside the stated interval.
    pub coverage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResult {
    pub historical_actual: Vec<SeriesPoint>,
    /// In-sample fitted values aligned to historical dates.
    pub historical_fit: Vec<ForecastPoint>,
    /// Out-of-sample forecast, one point per horizon month.
    pub forecast_data: Vec<ForecastPoint>,
    pub components: ComponentSeries,
    pub cv_metrics: CvMetrics,
}

/// A fitted model ready to predict over arbitrary month grids.
pub trait FittedModel: Send {
    fn predict(&self, dates: &[NaiveDate], regressors: &RegressorFrame)
        -> Result<Vec<ForecastPoint>>;
    fn components(&self, dates: &[NaiveDate], regressors: &RegressorFrame)
        -> Result<ComponentSeries>;
}

/// A pluggable regressor-aware seasonal time-series engine.
pub trait ForecastEngine: Send + Sync {
    fn fit(
        &self,
        dates: &[NaiveDate],
        values: &[f64],
        regressors: &RegressorFrame,
        config: &ForecastConfig,
    ) -> Result<Box<dyn FittedModel>>;
}

/// Month grid of `n` consecutive months starting right after `last`.
fn future_months(last: NaiveDate, n: u32) -> Vec<NaiveDate> {
    (1..=n)
        .filter_map(|i| last.checked_add_months(Months::new(i)))
        .collect()
}

/// Fit the configured model and produce the full forecast payload.
///
/// The model fit is CPU-bound and can take a while; callers on a request
/// path should run this on a blocking worker.
pub fn fit_and_forecast(
    store: &MissionStore,
    catalog: &DemographicCatalog,
    engine: &dyn ForecastEngine,
    config: &ForecastConfig,
) -> Result<ForecastResult> {
    config.validate()?;

    let monthly = store.monthly_counts();
    let need = config.min_history_months();
    if monthly.len() < need {
        return Err(ForecastError::InsufficientData {
            have: monthly.len(),
            need,
        });
    }

    let history_dates: Vec<NaiveDate> = monthly.iter().map(|(d, _)| *d).collect();
    let values: Vec<f64> = monthly.iter().map(|(_, v)| *v).collect();
    let last = *history_dates
        .last()
        .ok_or_else(|| ForecastError::Computation("empty history".to_string()))?;

    let future_dates = future_months(last, config.periods);
    let mut all_dates = history_dates.clone();
    all_dates.extend(&future_dates);

    // Regressors must cover history plus horizon; a gap is a configuration
    // error, not a silent zero-fill.
    let train_frame = regressors::build_frame(catalog, &config.extra_vars, &history_dates)?;
    let full_frame = regressors::build_frame(catalog, &config.extra_vars, &all_dates)?;
    let future_frame = regressors::build_frame(catalog, &config.extra_vars, &future_dates)?;

    tracing::info!(
        "Fitting demand model: {} months history, {} regressors, horizon {}",
        history_dates.len(),
        config.extra_vars.len(),
        config.periods
    );

    let fitted = engine.fit(&history_dates, &values, &train_frame, config)?;

    let historical_fit = fitted.predict(&history_dates, &train_frame)?;
    let forecast_data = if config.periods == 0 {
        Vec::new()
    } else {
        fitted.predict(&future_dates, &future_frame)?
    };
    let components = fitted.components(&all_dates, &full_frame)?;

    let cv_metrics = cv::cross_validate(engine, &history_dates, &values, &train_frame, config)?;

    let historical_actual = monthly
        .into_iter()
        .map(|(date, count)| SeriesPoint { date, count })
        .collect();

    Ok(ForecastResult {
        historical_actual,
        historical_fit,
        forecast_data,
        components,
        cv_metrics,
    })
}
