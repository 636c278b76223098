//! Pareto sensitivity search.
//!
//! Exhaustively enumerates a (service radius × SLA target) grid, simulates
//! every point, and partitions the resulting cloud in (coverage rate,
//! avg response time) space into a Pareto frontier and its dominated
//! complement. A weighted scalarization over normalized (population
//! coverage, SLA attainment, inverse cost) picks the recommended scenario
//! off the frontier.

use serde::{Deserialize, Serialize};

use crate::{kpi, Result, ScenarioError, ScenarioParams, Simulator};

/// Bound on grid size to keep interactive latency acceptable; the search is
/// O(grid) simulator calls.
pub const MAX_GRID_POINTS: usize = 400;

/// Tolerance for inclusive floating-point range endpoints.
const STEP_EPS: f64 = 1e-9;

/// Scalarization weights. They need not sum to 1; the search normalizes
/// internally. All-zero weights are rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScalarWeights {
    pub population: f64,
    pub sla: f64,
    pub cost: f64,
}

impl ScalarWeights {
    fn normalized(&self) -> Result<(f64, f64, f64)> {
        if self.population < 0.0 || self.sla < 0.0 || self.cost < 0.0 {
            return Err(ScenarioError::Validation(
                "weights must be non-negative".to_string(),
            ));
        }
        let sum = self.population + self.sla + self.cost;
        if sum <= 0.0 {
            return Err(ScenarioError::Validation(
                "at least one weight must be positive".to_string(),
            ));
        }
        Ok((self.population / sum, self.sla / sum, self.cost / sum))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityConfig {
    pub base_locations: Vec<String>,
    pub radius_min: f64,
    pub radius_max: f64,
    pub radius_step: f64,
    pub sla_min: f64,
    pub sla_max: f64,
    pub sla_step: f64,
    pub fleet_size: u32,
    pub crews_per_vehicle: u32,
    pub missions_per_vehicle_per_day: f64,
    pub weights: ScalarWeights,
}

impl SensitivityConfig {
    fn validate(&self) -> Result<()> {
        if self.base_locations.is_empty() {
            return Err(ScenarioError::Validation(
                "base_locations must not be empty".to_string(),
            ));
        }
        for (name, min, max, step) in [
            ("radius", self.radius_min, self.radius_max, self.radius_step),
            ("sla", self.sla_min, self.sla_max, self.sla_step),
        ] {
            if !(min > 0.0) || !min.is_finite() {
                return Err(ScenarioError::Validation(format!(
                    "{}_min must be positive",
                    name
                )));
            }
            if min > max {
                return Err(ScenarioError::Validation(format!(
                    "{}_min must not exceed {}_max",
                    name, name
                )));
            }
            if !(step > 0.0) || !step.is_finite() {
                return Err(ScenarioError::Validation(format!(
                    "{}_step must be positive",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// One simulated grid point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParetoPoint {
    pub service_radius_miles: f64,
    pub sla_target_minutes: f64,
    pub coverage_rate: f64,
    pub avg_response_time_minutes: f64,
    pub sla_attainment: f64,
    pub population_coverage: f64,
    pub total_cost: f64,
    /// Normalized scalarization score, populated during optimum selection.
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub n_scenarios: usize,
    pub n_pareto: usize,
    pub n_dominated: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParetoOutcome {
    pub pareto_frontier: Vec<ParetoPoint>,
    pub dominated_points: Vec<ParetoPoint>,
    pub optimal_scenario: ParetoPoint,
    pub metadata: SearchMetadata,
}

/// Inclusive discretization of `[min, max]` at `step`.
fn grid_axis(min: f64, max: f64, step: f64) -> Vec<f64> {
    let mut values = Vec::new();
    let mut v = min;
    while v <= max + STEP_EPS {
        values.push(v.min(max));
        v += step;
    }
    values
}

/// `b` dominates `a`: at least as much coverage and at most the response
/// time, strictly better in one.
fn dominates(b: &ParetoPoint, a: &ParetoPoint) -> bool {
    let ge_cov = b.coverage_rate >= a.coverage_rate;
    let le_rt = b.avg_response_time_minutes <= a.avg_response_time_minutes;
    let strict = b.coverage_rate > a.coverage_rate
        || b.avg_response_time_minutes < a.avg_response_time_minutes;
    ge_cov && le_rt && strict
}

/// Min-max normalization; a degenerate span maps everything to 1.
fn normalize(value: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span <= STEP_EPS {
        1.0
    } else {
        (value - min) / span
    }
}

pub fn run_sensitivity(simulator: &Simulator, config: &SensitivityConfig) -> Result<ParetoOutcome> {
    config.validate()?;

    let radii = grid_axis(config.radius_min, config.radius_max, config.radius_step);
    let slas = grid_axis(config.sla_min, config.sla_max, config.sla_step);
    let n_scenarios = radii.len() * slas.len();

    if n_scenarios == 0 {
        return Err(ScenarioError::Validation("empty sensitivity grid".to_string()));
    }
    if n_scenarios > MAX_GRID_POINTS {
        return Err(ScenarioError::Validation(format!(
            "grid of {} points exceeds limit of {}",
            n_scenarios, MAX_GRID_POINTS
        )));
    }

    tracing::info!(
        "Pareto search: {} radii x {} SLA targets = {} scenarios",
        radii.len(),
        slas.len(),
        n_scenarios
    );

    let (w_pop, w_sla, w_cost) = config.weights.normalized()?;
    let bases = simulator.registry().resolve(&config.base_locations)?;

    let mut points = Vec::with_capacity(n_scenarios);
    for &radius in &radii {
        for &sla in &slas {
            let params = ScenarioParams {
                fleet_size: config.fleet_size,
                missions_per_vehicle_per_day: config.missions_per_vehicle_per_day,
                crews_per_vehicle: config.crews_per_vehicle,
                base_locations: config.base_locations.clone(),
                service_radius_miles: radius,
                sla_target_minutes: sla,
            };
            let result = simulator.simulate(&params)?;
            let population_coverage = kpi::population_coverage(
                &params,
                &bases,
                simulator.demand_points(),
                simulator.profile(),
            );

            points.push(ParetoPoint {
                service_radius_miles: radius,
                sla_target_minutes: sla,
                coverage_rate: result.coverage.coverage_rate,
                avg_response_time_minutes: result.sla_attainment.avg_response_time_minutes,
                sla_attainment: result.sla_attainment.rate_percent,
                population_coverage,
                total_cost: result.cost.total_cost,
                score: 0.0,
            });
        }
    }

    // Scalarization bounds over the whole cloud
    let min_pop = points.iter().map(|p| p.population_coverage).fold(f64::MAX, f64::min);
    let max_pop = points.iter().map(|p| p.population_coverage).fold(f64::MIN, f64::max);
    let min_sla = points.iter().map(|p| p.sla_attainment).fold(f64::MAX, f64::min);
    let max_sla = points.iter().map(|p| p.sla_attainment).fold(f64::MIN, f64::max);
    let min_cost = points.iter().map(|p| p.total_cost).fold(f64::MAX, f64::min);
    let max_cost = points.iter().map(|p| p.total_cost).fold(f64::MIN, f64::max);

    for p in &mut points {
        let pop_n = normalize(p.population_coverage, min_pop, max_pop);
        let sla_n = normalize(p.sla_attainment, min_sla, max_sla);
        let inv_cost_n = 1.0 - normalize(p.total_cost, min_cost, max_cost);
        p.score = w_pop * pop_n + w_sla * sla_n + w_cost * inv_cost_n;
    }

    let (frontier, dominated): (Vec<ParetoPoint>, Vec<ParetoPoint>) = points
        .iter()
        .cloned()
        .partition(|a| !points.iter().any(|b| dominates(b, a)));

    let optimal = frontier
        .iter()
        .max_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                // Ties break toward the faster response
                .then(b.avg_response_time_minutes.total_cmp(&a.avg_response_time_minutes))
        })
        .cloned()
        .ok_or_else(|| ScenarioError::Computation("empty Pareto frontier".to_string()))?;

    let metadata = SearchMetadata {
        n_scenarios,
        n_pareto: frontier.len(),
        n_dominated: dominated.len(),
    };

    Ok(ParetoOutcome {
        pareto_frontier: frontier,
        dominated_points: dominated,
        optimal_scenario: optimal,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::tests::test_simulator;
    use proptest::prelude::*;

    fn config() -> SensitivityConfig {
        SensitivityConfig {
            base_locations: vec!["LF1".to_string(), "LF2".to_string()],
            radius_min: 20.0,
            radius_max: 60.0,
            radius_step: 20.0,
            sla_min: 15.0,
            sla_max: 20.0,
            sla_step: 5.0,
            fleet_size: 3,
            crews_per_vehicle: 3,
            missions_per_vehicle_per_day: 4.0,
            weights: ScalarWeights {
                population: 0.4,
                sla: 0.4,
                cost: 0.2,
            },
        }
    }

    #[test]
    fn test_example_grid_counts() {
        // radius [20,40,60] x sla [15,20] = 6 scenarios
        let sim = test_simulator();
        let outcome = run_sensitivity(&sim, &config()).unwrap();
        assert_eq!(outcome.metadata.n_scenarios, 6);
        assert_eq!(
            outcome.metadata.n_pareto + outcome.metadata.n_dominated,
            6
        );
    }

    #[test]
    fn test_frontier_correctness() {
        let sim = test_simulator();
        let outcome = run_sensitivity(&sim, &config()).unwrap();

        // Every dominated point has a dominating frontier point
        for a in &outcome.dominated_points {
            assert!(
                outcome.pareto_frontier.iter().any(|b| dominates(b, a)),
                "dominated point has no dominator: {:?}",
                a
            );
        }
    }

    #[test]
    fn test_frontier_mutual_nondomination() {
        let sim = test_simulator();
        let outcome = run_sensitivity(&sim, &config()).unwrap();
        for (i, a) in outcome.pareto_frontier.iter().enumerate() {
            for (j, b) in outcome.pareto_frontier.iter().enumerate() {
                if i != j {
                    assert!(!dominates(a, b), "frontier point dominates another");
                }
            }
        }
    }

    #[test]
    fn test_optimal_is_on_frontier() {
        let sim = test_simulator();
        let outcome = run_sensitivity(&sim, &config()).unwrap();
        let opt = &outcome.optimal_scenario;
        assert!(outcome
            .pareto_frontier
            .iter()
            .any(|p| p.service_radius_miles == opt.service_radius_miles
                && p.sla_target_minutes == opt.sla_target_minutes));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let sim = test_simulator();
        let mut cfg = config();
        cfg.radius_min = 80.0;
        cfg.radius_max = 20.0;
        assert!(matches!(
            run_sensitivity(&sim, &cfg),
            Err(ScenarioError::Validation(_))
        ));
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let sim = test_simulator();
        let mut cfg = config();
        cfg.radius_min = 1.0;
        cfg.radius_max = 500.0;
        cfg.radius_step = 1.0;
        cfg.sla_min = 1.0;
        cfg.sla_max = 60.0;
        cfg.sla_step = 1.0;
        assert!(matches!(
            run_sensitivity(&sim, &cfg),
            Err(ScenarioError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_weights_rejected() {
        let sim = test_simulator();
        let mut cfg = config();
        cfg.weights = ScalarWeights {
            population: 0.0,
            sla: 0.0,
            cost: 0.0,
        };
        assert!(matches!(
            run_sensitivity(&sim, &cfg),
            Err(ScenarioError::Validation(_))
        ));
    }

    #[test]
    fn test_grid_axis_inclusive_endpoints() {
        let axis = grid_axis(20.0, 60.0, 20.0);
        assert_eq!(axis, vec![20.0, 40.0, 60.0]);
        // Endpoint reached despite accumulation error
        let axis = grid_axis(0.1, 0.4, 0.1);
        assert_eq!(axis.len(), 4);
    }

    proptest! {
        /// Dominance partition invariants hold for arbitrary point clouds.
        #[test]
        fn prop_dominance_partition(coords in prop::collection::vec((0.0f64..100.0, 0.0f64..60.0), 1..40)) {
            let points: Vec<ParetoPoint> = coords
                .iter()
                .map(|&(cov, rt)| ParetoPoint {
                    service_radius_miles: 50.0,
                    sla_target_minutes: 20.0,
                    coverage_rate: cov,
                    avg_response_time_minutes: rt,
                    sla_attainment: cov,
                    population_coverage: cov,
                    total_cost: 1.0,
                    score: 0.0,
                })
                .collect();

            let (frontier, dominated): (Vec<ParetoPoint>, Vec<ParetoPoint>) = points
                .iter()
                .cloned()
                .partition(|a| !points.iter().any(|b| dominates(b, a)));

            prop_assert_eq!(frontier.len() + dominated.len(), points.len());
            prop_assert!(!frontier.is_empty());
            for a in &dominated {
                prop_assert!(frontier.iter().any(|b| dominates(b, a)));
            }
            for (i, a) in frontier.iter().enumerate() {
                for (j, b) in frontier.iter().enumerate() {
                    if i != j {
                        prop_assert!(!dominates(a, b));
                    }
                }
            }
        }
    }
}
