//! Scenario comparison.
//!
//! Runs the simulator independently per parameter set and returns an
//! aligned table, one row per input in input order. A failed scenario is
//! reported in its own row and does not abort the batch.

use serde::{Deserialize, Serialize};

use crate::{Result, ScenarioError, ScenarioParams, ScenarioResult, Simulator};

/// One comparison row: stable id plus either flattened KPIs or an error
/// marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub scenario_id: String,
    pub fleet_size: u32,
    pub bases: Vec<String>,
    pub service_radius_miles: f64,
    pub sla_target_minutes: f64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sla_attainment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_response_time_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_capacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmet_missions: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_mission: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComparisonRow {
    fn from_result(id: String, params: &ScenarioParams, result: &ScenarioResult) -> Self {
        Self {
            scenario_id: id,
            fleet_size: params.fleet_size,
            bases: params.base_locations.clone(),
            service_radius_miles: params.service_radius_miles,
            sla_target_minutes: params.sla_target_minutes,
            success: true,
            sla_attainment: Some(result.sla_attainment.rate_percent),
            avg_response_time_minutes: Some(result.sla_attainment.avg_response_time_minutes),
            coverage_rate: Some(result.coverage.coverage_rate),
            estimated_capacity: Some(result.missions.estimated_capacity),
            unmet_missions: Some(result.unmet_demand.missions),
            total_cost: Some(result.cost.total_cost),
            cost_per_mission: Some(result.cost.cost_per_mission),
            error: None,
        }
    }

    fn from_error(id: String, params: &ScenarioParams, err: &ScenarioError) -> Self {
        Self {
            scenario_id: id,
            fleet_size: params.fleet_size,
            bases: params.base_locations.clone(),
            service_radius_miles: params.service_radius_miles,
            sla_target_minutes: params.sla_target_minutes,
            success: false,
            sla_attainment: None,
            avg_response_time_minutes: None,
            coverage_rate: None,
            estimated_capacity: None,
            unmet_missions: None,
            total_cost: None,
            cost_per_mission: None,
            error: Some(err.to_string()),
        }
    }
}

/// Compare a list of scenarios. Ids are assigned "Scenario 1", "Scenario 2",
/// … in input order. An empty list is a validation error; an individual
/// scenario failure produces an error row (partial success).
pub fn compare(simulator: &Simulator, scenarios: &[ScenarioParams]) -> Result<Vec<ComparisonRow>> {
    if scenarios.is_empty() {
        return Err(ScenarioError::Validation(
            "scenarios must not be empty".to_string(),
        ));
    }

    let rows = scenarios
        .iter()
        .enumerate()
        .map(|(i, params)| {
            let id = format!("Scenario {}", i + 1);
            match simulator.simulate(params) {
                Ok(result) => ComparisonRow::from_result(id, params, &result),
                Err(err) => {
                    tracing::warn!("{} failed: {}", id, err);
                    ComparisonRow::from_error(id, params, &err)
                }
            }
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::tests::test_simulator;

    fn params(bases: &[&str], radius: f64, sla: f64) -> ScenarioParams {
        ScenarioParams {
            fleet_size: 3,
            missions_per_vehicle_per_day: 4.0,
            crews_per_vehicle: 3,
            base_locations: bases.iter().map(|s| s.to_string()).collect(),
            service_radius_miles: radius,
            sla_target_minutes: sla,
        }
    }

    #[test]
    fn test_rows_match_individual_simulations() {
        let sim = test_simulator();
        let p1 = params(&["LF1"], 50.0, 20.0);
        let p2 = params(&["LF1", "LF2"], 80.0, 25.0);

        let rows = compare(&sim, &[p1.clone(), p2.clone()]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].scenario_id, "Scenario 1");
        assert_eq!(rows[1].scenario_id, "Scenario 2");

        let direct = sim.simulate(&p1).unwrap();
        assert_eq!(rows[0].sla_attainment, Some(direct.sla_attainment.rate_percent));
        assert_eq!(rows[0].coverage_rate, Some(direct.coverage.coverage_rate));
        assert_eq!(rows[0].total_cost, Some(direct.cost.total_cost));
    }

    #[test]
    fn test_empty_list_is_validation_error() {
        let sim = test_simulator();
        assert!(matches!(
            compare(&sim, &[]),
            Err(ScenarioError::Validation(_))
        ));
    }

    #[test]
    fn test_partial_failure_keeps_batch() {
        let sim = test_simulator();
        let good = params(&["LF1"], 50.0, 20.0);
        let bad = params(&["No Such Base"], 50.0, 20.0);

        let rows = compare(&sim, &[good, bad]).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].success);
        assert!(rows[0].error.is_none());
        assert!(!rows[1].success);
        assert!(rows[1].error.is_some());
        assert!(rows[1].sla_attainment.is_none());
    }
}
