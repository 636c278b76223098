//! Scenario Engine Library
//!
//! Deterministic what-if analysis over the operator's historical record:
//! KPI aggregation, scenario simulation and comparison, Pareto sensitivity
//! search over (radius, SLA-target) grids, and base-siting lift analysis.
//!
//! Every computation here is a pure function of (scenario parameters,
//! mission store, reference data, reference date) — no randomness, no
//! wall-clock reads, no mutation of shared state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub mod compare;
pub mod kpi;
pub mod pareto;
pub mod simulator;
pub mod siting;

pub use compare::{compare, ComparisonRow};
pub use pareto::{run_sensitivity, ParetoOutcome, ParetoPoint, ScalarWeights, SensitivityConfig};
pub use simulator::Simulator;
pub use siting::{analyze_siting, SitingAnalysis, SitingConfig, SlaLift};

#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Bad or missing parameters; surfaced immediately, never retried.
    #[error("Invalid scenario: {0}")]
    Validation(String),
    #[error("Unknown base: {0}")]
    UnknownBase(String),
    /// Unexpected internal failure; logged and surfaced generically.
    #[error("Scenario computation failed: {0}")]
    Computation(String),
}

impl From<mission_store::DataError> for ScenarioError {
    fn from(err: mission_store::DataError) -> Self {
        match err {
            mission_store::DataError::BaseNotFound(name) => ScenarioError::UnknownBase(name),
            other => ScenarioError::Computation(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScenarioError>;

/// Immutable scenario parameter object. Two parameter sets are equal iff
/// every field matches; that equality is what comparison (and any caching
/// layered on top) keys on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub fleet_size: u32,
    pub missions_per_vehicle_per_day: f64,
    pub crews_per_vehicle: u32,
    pub base_locations: Vec<String>,
    pub service_radius_miles: f64,
    pub sla_target_minutes: f64,
}

impl ScenarioParams {
    /// Reject malformed parameters up front. An empty base selection is a
    /// misconfigured request, never a zero-KPI scenario.
    pub fn validate(&self) -> Result<()> {
        if self.base_locations.is_empty() {
            return Err(ScenarioError::Validation(
                "base_locations must not be empty".to_string(),
            ));
        }
        if self.fleet_size == 0 {
            return Err(ScenarioError::Validation(
                "fleet_size must be positive".to_string(),
            ));
        }
        if self.crews_per_vehicle == 0 {
            return Err(ScenarioError::Validation(
                "crews_per_vehicle must be at least 1".to_string(),
            ));
        }
        if !(self.missions_per_vehicle_per_day > 0.0)
            || !self.missions_per_vehicle_per_day.is_finite()
        {
            return Err(ScenarioError::Validation(
                "missions_per_vehicle_per_day must be positive".to_string(),
            ));
        }
        if !(self.service_radius_miles > 0.0) || !self.service_radius_miles.is_finite() {
            return Err(ScenarioError::Validation(
                "service_radius_miles must be positive".to_string(),
            ));
        }
        if !(self.sla_target_minutes > 0.0) || !self.sla_target_minutes.is_finite() {
            return Err(ScenarioError::Validation(
                "sla_target_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Mission volume KPIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionKpis {
    /// Simple throughput ceiling: fleet * missions/vehicle/day * 365.
    pub estimated_capacity: f64,
    /// Wire alias for the most recent complete 12-month window.
    pub last_year_missions: u64,
    pub historical_annual: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaKpis {
    /// Attained share of total historical demand, percent in [0, 100].
    pub rate_percent: f64,
    /// Demand-weighted mean estimated response over covered points.
    pub avg_response_time_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmetDemandKpis {
    pub missions: u64,
    pub rate_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostKpis {
    pub total_cost: f64,
    pub cost_per_mission: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageKpis {
    /// Percent of demand points covered, each point counted once.
    pub coverage_rate: f64,
    pub cities_covered: usize,
    pub total_cities: usize,
}

/// One deterministic KPI snapshot — the output of a single simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub missions: MissionKpis,
    pub sla_attainment: SlaKpis,
    pub unmet_demand: UnmetDemandKpis,
    pub cost: CostKpis,
    pub coverage: CoverageKpis,
    /// Covered-city count per selected base (overlap counted per base).
    pub coverage_details: BTreeMap<String, usize>,
}
