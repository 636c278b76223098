//! Forecasting and reference-data endpoints.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::json;

use demand_forecast::{count_correlations, fit_and_forecast, ForecastConfig, Growth, SeasonalityMode};
use mission_store::Base;

use crate::responses::{success, ApiError};
use crate::AppState;

/// Wire shape of a forecast request; any omitted field falls back to the
/// engine default.
#[derive(Deserialize)]
pub struct ForecastRequest {
    pub extra_vars: Option<Vec<String>>,
    pub growth: Option<Growth>,
    pub yearly_seasonality: Option<bool>,
    pub seasonality_mode: Option<SeasonalityMode>,
    pub changepoint_prior_scale: Option<f64>,
    pub seasonality_prior_scale: Option<f64>,
    pub regressor_prior_scale: Option<f64>,
    pub interval_width: Option<f64>,
    /// Regressors share the model's link space, so this flag carries no
    /// extra information; accepted for wire compatibility with older
    /// dashboard builds.
    #[allow(dead_code)]
    pub regressor_mode: Option<SeasonalityMode>,
    pub periods: Option<u32>,
}

impl ForecastRequest {
    fn into_config(self) -> ForecastConfig {
        let defaults = ForecastConfig::default();
        ForecastConfig {
            extra_vars: self.extra_vars.unwrap_or(defaults.extra_vars),
            growth: self.growth.unwrap_or(defaults.growth),
            yearly_seasonality: self
                .yearly_seasonality
                .unwrap_or(defaults.yearly_seasonality),
            seasonality_mode: self.seasonality_mode.unwrap_or(defaults.seasonality_mode),
            changepoint_prior_scale: self
                .changepoint_prior_scale
                .unwrap_or(defaults.changepoint_prior_scale),
            seasonality_prior_scale: self
                .seasonality_prior_scale
                .unwrap_or(defaults.seasonality_prior_scale),
            regressor_prior_scale: self
                .regressor_prior_scale
                .unwrap_or(defaults.regressor_prior_scale),
            interval_width: self.interval_width.unwrap_or(defaults.interval_width),
            periods: self.periods.unwrap_or(defaults.periods),
        }
    }
}

pub async fn predict_demand_v2(
    State(state): State<AppState>,
    Json(req): Json<ForecastRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let config = req.into_config();
    let store = state.store.clone();
    let catalog = state.catalog.clone();
    let engine = state.engine.clone();

    // Model fits block for a noticeable fraction of a second; keep them off
    // the runtime workers
    let result = tokio::task::spawn_blocking(move || {
        fit_and_forecast(&store, &catalog, engine.as_ref(), &config)
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(success(result))
}

pub async fn base_locations(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let existing: Vec<&Base> = state.registry.existing().collect();
    let candidates: Vec<&Base> = state.registry.candidates().collect();
    Ok(success(json!({
        "existing_bases": existing,
        "candidate_bases": candidates,
    })))
}

pub async fn get_corr_matrix(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let correlations = count_correlations(&state.store, &state.catalog)?;
    Ok(success(json!({ "count_correlations": correlations })))
}
