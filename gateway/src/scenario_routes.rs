//! Scenario simulation, comparison, Pareto search and siting endpoints.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::json;

use mission_store::Base;
use scenario_engine::{
    compare, pareto::SensitivityConfig, siting::SitingConfig, ScenarioParams,
};

use crate::map_html::render_coverage_map;
use crate::responses::{success, ApiError};
use crate::AppState;

pub async fn scenario_simulate(
    State(state): State<AppState>,
    Json(params): Json<ScenarioParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = state.simulator.simulate(&params)?;
    Ok(success(result))
}

#[derive(Deserialize)]
pub struct CompareRequest {
    pub scenarios: Vec<ScenarioParams>,
}

pub async fn scenario_compare(
    State(state): State<AppState>,
    Json(req): Json<CompareRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rows = compare::compare(&state.simulator, &req.scenarios)?;
    Ok(success(json!({ "comparison": rows })))
}

pub async fn pareto_sensitivity(
    State(state): State<AppState>,
    Json(config): Json<SensitivityConfig>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let outcome = scenario_engine::pareto::run_sensitivity(&state.simulator, &config)?;
    Ok(success(outcome))
}

pub async fn base_siting(
    State(state): State<AppState>,
    Json(config): Json<SitingConfig>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let analysis = scenario_engine::siting::analyze_siting(&state.simulator, &config)?;

    let existing = state
        .registry
        .resolve(&config.existing_bases)
        .map_err(scenario_engine::ScenarioError::from)?;
    let before_map_html = render_coverage_map(
        "siting-before",
        &existing,
        &analysis.before_coverage,
        &state.demand_points,
    );

    let mut augmented: Vec<&Base> = existing.clone();
    if let Some(candidate) = &config.candidate_base {
        augmented.push(candidate);
    }
    let after_map_html = render_coverage_map(
        "siting-after",
        &augmented,
        &analysis.after_coverage,
        &state.demand_points,
    );

    Ok(success(json!({
        "before_scenario": analysis.before_scenario,
        "after_scenario": analysis.after_scenario,
        "sla_lift": analysis.sla_lift,
        "before_within_threshold_percent": analysis.before_within_threshold_percent,
        "after_within_threshold_percent": analysis.after_within_threshold_percent,
        "before_map_html": before_map_html,
        "after_map_html": after_map_html,
    })))
}
