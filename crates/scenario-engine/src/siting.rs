//! Base-siting lift analysis.
//!
//! Evaluates an optional candidate base against the existing configuration:
//! simulates before and after, and reports the SLA and coverage lift the
//! candidate buys per incremental dollar. The candidate may be a location
//! that is not in the registry at all — it is passed as a full base object
//! and injected into the coverage geometry directly.

use serde::{Deserialize, Serialize};

use mission_store::Base;
use service_coverage::CoverageMap;

use crate::{Result, ScenarioError, ScenarioParams, ScenarioResult, Simulator};

/// Fleet assumptions for siting runs: one vehicle per base, typical
/// utilization and crewing.
const SITING_MISSIONS_PER_VEHICLE_PER_DAY: f64 = 4.0;
const SITING_CREWS_PER_VEHICLE: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitingConfig {
    pub existing_bases: Vec<String>,
    pub candidate_base: Option<Base>,
    pub service_radius_miles: f64,
    pub sla_target_minutes: f64,
    /// Response-time threshold for the time-based coverage view, minutes.
    pub coverage_threshold_minutes: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaLift {
    pub sla_lift_absolute: f64,
    pub coverage_lift: f64,
    pub incremental_cost: f64,
    /// Incremental cost per SLA point gained; `None` when there is no lift.
    pub cost_per_sla_point: Option<f64>,
}

/// Before/after snapshots plus the lift summary. The coverage maps ride
/// along for the presentation layer to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitingAnalysis {
    pub before_scenario: ScenarioResult,
    pub after_scenario: ScenarioResult,
    pub sla_lift: SlaLift,
    /// Share of historical demand reachable within the coverage threshold.
    pub before_within_threshold_percent: f64,
    pub after_within_threshold_percent: f64,
    pub before_coverage: CoverageMap,
    pub after_coverage: CoverageMap,
}

fn validate(config: &SitingConfig) -> Result<()> {
    if config.existing_bases.is_empty() {
        return Err(ScenarioError::Validation(
            "existing_bases must not be empty".to_string(),
        ));
    }
    if !(config.service_radius_miles > 0.0) || !config.service_radius_miles.is_finite() {
        return Err(ScenarioError::Validation(
            "service_radius_miles must be positive".to_string(),
        ));
    }
    if !(config.sla_target_minutes > 0.0) || !config.sla_target_minutes.is_finite() {
        return Err(ScenarioError::Validation(
            "sla_target_minutes must be positive".to_string(),
        ));
    }
    if !(config.coverage_threshold_minutes > 0.0) || !config.coverage_threshold_minutes.is_finite()
    {
        return Err(ScenarioError::Validation(
            "coverage_threshold_minutes must be positive".to_string(),
        ));
    }
    Ok(())
}

fn demand_within_threshold(coverage: &CoverageMap, threshold_minutes: f64) -> f64 {
    let total = coverage.total_demand() as f64;
    if total <= 0.0 {
        return 0.0;
    }
    let within: f64 = coverage
        .points
        .iter()
        .filter_map(|p| {
            p.response_minutes
                .filter(|r| *r <= threshold_minutes)
                .map(|_| p.historical_missions as f64)
        })
        .sum();
    within / total * 100.0
}

pub fn analyze_siting(simulator: &Simulator, config: &SitingConfig) -> Result<SitingAnalysis> {
    validate(config)?;

    let existing = simulator.registry().resolve(&config.existing_bases)?;

    let base_params = |n_bases: u32| ScenarioParams {
        fleet_size: n_bases,
        missions_per_vehicle_per_day: SITING_MISSIONS_PER_VEHICLE_PER_DAY,
        crews_per_vehicle: SITING_CREWS_PER_VEHICLE,
        base_locations: config.existing_bases.clone(),
        service_radius_miles: config.service_radius_miles,
        sla_target_minutes: config.sla_target_minutes,
    };

    let before_params = base_params(existing.len() as u32);
    let before = simulator.simulate_with_bases(&before_params, &existing)?;
    let before_coverage = CoverageMap::compute(
        &existing,
        config.service_radius_miles,
        simulator.demand_points(),
        simulator.profile(),
    );

    let (after, after_coverage) = match &config.candidate_base {
        Some(candidate) => {
            let mut augmented: Vec<&Base> = existing.clone();
            augmented.push(candidate);
            let after_params = base_params(augmented.len() as u32);
            let after = simulator.simulate_with_bases(&after_params, &augmented)?;
            let coverage = CoverageMap::compute(
                &augmented,
                config.service_radius_miles,
                simulator.demand_points(),
                simulator.profile(),
            );
            (after, coverage)
        }
        None => (before.clone(), before_coverage.clone()),
    };

    let sla_lift_absolute =
        after.sla_attainment.rate_percent - before.sla_attainment.rate_percent;
    let coverage_lift = after.coverage.coverage_rate - before.coverage.coverage_rate;
    let incremental_cost = after.cost.total_cost - before.cost.total_cost;
    let cost_per_sla_point = if sla_lift_absolute > 0.0 {
        Some(incremental_cost / sla_lift_absolute)
    } else {
        None
    };

    tracing::info!(
        "Siting: sla_lift={:.2}pp coverage_lift={:.2}pp incremental_cost={:.0}",
        sla_lift_absolute,
        coverage_lift,
        incremental_cost
    );

    Ok(SitingAnalysis {
        before_within_threshold_percent: demand_within_threshold(
            &before_coverage,
            config.coverage_threshold_minutes,
        ),
        after_within_threshold_percent: demand_within_threshold(
            &after_coverage,
            config.coverage_threshold_minutes,
        ),
        before_scenario: before,
        after_scenario: after,
        sla_lift: SlaLift {
            sla_lift_absolute,
            coverage_lift,
            incremental_cost,
            cost_per_sla_point,
        },
        before_coverage,
        after_coverage,
    })
}
