//! KPI aggregation.
//!
//! Reduces the mission store plus coverage geometry into one scenario KPI
//! snapshot. SLA attainment and unmet demand are computed over demand
//! points weighted by their historical mission counts, using the scenario's
//! estimated response times — historical wall-clock response times belong
//! to the historical base layout, not the simulated one.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use mission_store::{Base, DemandPoint, MissionStore};
use service_coverage::{CoverageMap, CruiseProfile};

use crate::{
    CostKpis, CoverageKpis, MissionKpis, Result, ScenarioError, ScenarioParams, ScenarioResult,
    SlaKpis, UnmetDemandKpis,
};

/// Annual fixed cost of operating one base (facility, hangar, dispatch).
const FIXED_COST_PER_BASE: f64 = 750_000.0;
/// Annual cost of one vehicle before crewing.
const VEHICLE_ANNUAL_COST: f64 = 400_000.0;
/// Annual cost of one crew.
const CREW_ANNUAL_COST: f64 = 290_000.0;

/// Compute the KPI snapshot for an already-resolved base selection.
///
/// `bases` must be non-empty; callers validate `params` first.
pub fn compute_kpis(
    params: &ScenarioParams,
    bases: &[&Base],
    store: &MissionStore,
    demand_points: &[DemandPoint],
    profile: &CruiseProfile,
    reference_date: NaiveDate,
) -> Result<ScenarioResult> {
    params.validate()?;
    if bases.is_empty() {
        return Err(ScenarioError::Validation(
            "no bases resolved for scenario".to_string(),
        ));
    }

    let coverage = CoverageMap::compute(bases, params.service_radius_miles, demand_points, profile);

    let historical_annual = store.annual_missions(reference_date) as u64;
    let estimated_capacity =
        params.fleet_size as f64 * params.missions_per_vehicle_per_day * 365.0;

    // Demand-weighted SLA attainment over the coverage geometry. Uncovered
    // points stay in the denominator and count as unmet.
    let total_weight = coverage.total_demand() as f64;
    let mut attained_weight = 0.0;
    let mut covered_weight = 0.0;
    let mut response_weighted_sum = 0.0;
    let mut late_covered_weight = 0.0;

    for point in &coverage.points {
        let weight = point.historical_missions as f64;
        if let Some(response) = point.response_minutes {
            covered_weight += weight;
            response_weighted_sum += response * weight;
            if response <= params.sla_target_minutes {
                attained_weight += weight;
            } else {
                late_covered_weight += weight;
            }
        }
    }

    let sla_rate = if total_weight > 0.0 {
        attained_weight / total_weight * 100.0
    } else {
        0.0
    };
    let avg_response = if covered_weight > 0.0 {
        response_weighted_sum / covered_weight
    } else {
        0.0
    };

    let unmet_weight = coverage.uncovered_demand() as f64 + late_covered_weight;
    let unmet_rate = if total_weight > 0.0 {
        unmet_weight / total_weight * 100.0
    } else {
        0.0
    };

    let total_cost = FIXED_COST_PER_BASE * bases.len() as f64
        + params.fleet_size as f64
            * (VEHICLE_ANNUAL_COST + params.crews_per_vehicle as f64 * CREW_ANNUAL_COST);
    let cost_per_mission = total_cost / estimated_capacity.max(1.0);

    let coverage_details: BTreeMap<String, usize> = coverage.per_base_counts.clone();

    tracing::debug!(
        "KPIs: radius={:.0}mi sla={:.0}min coverage={:.1}% sla_rate={:.1}% cost={:.0}",
        params.service_radius_miles,
        params.sla_target_minutes,
        coverage.coverage_rate(),
        sla_rate,
        total_cost
    );

    Ok(ScenarioResult {
        missions: MissionKpis {
            estimated_capacity,
            last_year_missions: historical_annual,
            historical_annual,
        },
        sla_attainment: SlaKpis {
            rate_percent: sla_rate,
            avg_response_time_minutes: avg_response,
        },
        unmet_demand: UnmetDemandKpis {
            missions: unmet_weight.round() as u64,
            rate_percent: unmet_rate,
        },
        cost: CostKpis {
            total_cost,
            cost_per_mission,
        },
        coverage: CoverageKpis {
            coverage_rate: coverage.coverage_rate(),
            cities_covered: coverage.covered_count(),
            total_cities: coverage.total_points(),
        },
        coverage_details,
    })
}

/// Population-weighted coverage for the same selection; the Pareto search
/// scalarizes on this alongside the KPI snapshot.
pub fn population_coverage(
    params: &ScenarioParams,
    bases: &[&Base],
    demand_points: &[DemandPoint],
    profile: &CruiseProfile,
) -> f64 {
    CoverageMap::compute(bases, params.service_radius_miles, demand_points, profile)
        .population_coverage_rate()
}
