//! Service Coverage Library
//!
//! Coverage geometry for the scenario engine: which demand points fall
//! within a service radius of a base set, which base is nearest, and the
//! estimated response time to each point. Distances are great-circle
//! (haversine) — base-to-city legs span tens to hundreds of miles, where
//! planar error is material.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use mission_store::{AssetType, Base, DemandPoint};

/// Mean Earth radius in statute miles.
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Great-circle distance between two points in statute miles.
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Cruise assumptions for response-time estimation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CruiseProfile {
    pub air_speed_mph: f64,
    pub ground_speed_mph: f64,
    /// Fixed overhead between dispatch and wheels-up, minutes.
    pub dispatch_overhead_minutes: f64,
}

impl Default for CruiseProfile {
    fn default() -> Self {
        Self {
            air_speed_mph: 150.0,
            ground_speed_mph: 55.0,
            dispatch_overhead_minutes: 8.0,
        }
    }
}

impl CruiseProfile {
    pub fn speed_for(&self, asset: AssetType) -> f64 {
        match asset {
            AssetType::Air => self.air_speed_mph,
            AssetType::Ground => self.ground_speed_mph,
        }
    }

    /// Estimated response time in minutes for a leg of `distance_miles`.
    pub fn response_minutes(&self, asset: AssetType, distance_miles: f64) -> f64 {
        distance_miles / self.speed_for(asset) * 60.0 + self.dispatch_overhead_minutes
    }
}

/// Coverage outcome for one demand point under a base selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointCoverage {
    pub name: String,
    /// Within the service radius of at least one selected base.
    pub covered: bool,
    /// Nearest selected base regardless of coverage.
    pub nearest_base: Option<String>,
    pub distance_miles: Option<f64>,
    /// Estimated response from the nearest covering base; `None` when the
    /// point is uncovered (it contributes to unmet demand instead).
    pub response_minutes: Option<f64>,
    pub historical_missions: u32,
    pub population: u32,
}

/// Coverage of a full demand-point collection by a base selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageMap {
    pub points: Vec<PointCoverage>,
    /// Covered-city count per base. A point inside several radii counts in
    /// every covering base's entry; the aggregate rate counts it once.
    pub per_base_counts: BTreeMap<String, usize>,
    pub radius_miles: f64,
}

impl CoverageMap {
    /// Compute coverage of `points` by `bases` at `radius_miles`.
    ///
    /// An empty base slice yields an all-uncovered map; rejecting that as a
    /// misconfigured request is the scenario layer's job.
    pub fn compute(
        bases: &[&Base],
        radius_miles: f64,
        points: &[DemandPoint],
        profile: &CruiseProfile,
    ) -> Self {
        let mut per_base_counts: BTreeMap<String, usize> =
            bases.iter().map(|b| (b.name.clone(), 0)).collect();

        let point_coverage = points
            .iter()
            .map(|p| {
                let distances: Vec<(&Base, f64)> = bases
                    .iter()
                    .map(|b| {
                        (
                            *b,
                            haversine_miles(p.latitude, p.longitude, b.latitude, b.longitude),
                        )
                    })
                    .collect();

                for (base, _) in distances.iter().filter(|(_, d)| *d <= radius_miles) {
                    if let Some(count) = per_base_counts.get_mut(&base.name) {
                        *count += 1;
                    }
                }

                let nearest = distances
                    .iter()
                    .copied()
                    .min_by(|a, b| a.1.total_cmp(&b.1));

                match nearest {
                    Some((base, dist)) => {
                        let covered = dist <= radius_miles;
                        PointCoverage {
                            name: p.name.clone(),
                            covered,
                            nearest_base: Some(base.name.clone()),
                            distance_miles: Some(dist),
                            response_minutes: covered
                                .then(|| profile.response_minutes(base.asset, dist)),
                            historical_missions: p.historical_missions,
                            population: p.population,
                        }
                    }
                    None => PointCoverage {
                        name: p.name.clone(),
                        covered: false,
                        nearest_base: None,
                        distance_miles: None,
                        response_minutes: None,
                        historical_missions: p.historical_missions,
                        population: p.population,
                    },
                }
            })
            .collect();

        let map = Self {
            points: point_coverage,
            per_base_counts,
            radius_miles,
        };
        tracing::debug!(
            "Coverage at {:.0}mi: {}/{} points, rate {:.1}%",
            radius_miles,
            map.covered_count(),
            map.points.len(),
            map.coverage_rate()
        );
        map
    }

    pub fn covered_count(&self) -> usize {
        self.points.iter().filter(|p| p.covered).count()
    }

    pub fn total_points(&self) -> usize {
        self.points.len()
    }

    /// Unweighted coverage rate in percent, 0 for an empty point set.
    pub fn coverage_rate(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.covered_count() as f64 / self.points.len() as f64 * 100.0
    }

    /// Population-weighted coverage rate in percent.
    pub fn population_coverage_rate(&self) -> f64 {
        let total: u64 = self.points.iter().map(|p| p.population as u64).sum();
        if total == 0 {
            return 0.0;
        }
        let covered: u64 = self
            .points
            .iter()
            .filter(|p| p.covered)
            .map(|p| p.population as u64)
            .sum();
        covered as f64 / total as f64 * 100.0
    }

    /// Total historical demand weight across all points.
    pub fn total_demand(&self) -> u64 {
        self.points.iter().map(|p| p.historical_missions as u64).sum()
    }

    /// Historical demand weight at uncovered points.
    pub fn uncovered_demand(&self) -> u64 {
        self.points
            .iter()
            .filter(|p| !p.covered)
            .map(|p| p.historical_missions as u64)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mission_store::{load_demand_points, BaseRegistry};

    fn lf1_only(registry: &BaseRegistry) -> Vec<&Base> {
        vec![registry.get("LF1").unwrap()]
    }

    #[test]
    fn test_haversine_known_distance() {
        // Houston to Galveston is roughly 43 miles
        let d = haversine_miles(29.7604, -95.3698, 29.3013, -94.7977);
        assert!((d - 43.0).abs() < 5.0, "got {}", d);

        // Same point is zero
        let d = haversine_miles(29.76, -95.37, 29.76, -95.37);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_coverage_monotone_in_radius() {
        let registry = BaseRegistry::with_gulf_coast_network();
        let points = load_demand_points();
        let bases = lf1_only(&registry);
        let profile = CruiseProfile::default();

        let mut prev = -1.0;
        for radius in [10.0, 25.0, 50.0, 75.0, 100.0, 150.0] {
            let map = CoverageMap::compute(&bases, radius, &points, &profile);
            let rate = map.coverage_rate();
            assert!(
                rate >= prev,
                "coverage dropped from {} to {} at radius {}",
                prev,
                rate,
                radius
            );
            prev = rate;
        }
    }

    #[test]
    fn test_radius_50_to_100_strictly_increases() {
        let registry = BaseRegistry::with_gulf_coast_network();
        let points = load_demand_points();
        let bases = lf1_only(&registry);
        let profile = CruiseProfile::default();

        let at_50 = CoverageMap::compute(&bases, 50.0, &points, &profile).coverage_rate();
        let at_100 = CoverageMap::compute(&bases, 100.0, &points, &profile).coverage_rate();
        assert!(at_100 > at_50, "50mi={} 100mi={}", at_50, at_100);
    }

    #[test]
    fn test_uncovered_points_have_no_response_estimate() {
        let registry = BaseRegistry::with_gulf_coast_network();
        let points = load_demand_points();
        let bases = lf1_only(&registry);
        let map = CoverageMap::compute(&bases, 50.0, &points, &CruiseProfile::default());

        for p in &map.points {
            if p.covered {
                assert!(p.response_minutes.is_some());
            } else {
                assert!(p.response_minutes.is_none(), "{} uncovered but estimated", p.name);
            }
        }
    }

    #[test]
    fn test_multi_base_detail_counts_overlap() {
        let registry = BaseRegistry::with_gulf_coast_network();
        let points = load_demand_points();
        let bases: Vec<&Base> = registry.existing().collect();
        let map = CoverageMap::compute(&bases, 100.0, &points, &CruiseProfile::default());

        // Per-base details may double count; the aggregate never does
        let detail_total: usize = map.per_base_counts.values().sum();
        assert!(detail_total >= map.covered_count());
        assert!(map.coverage_rate() <= 100.0);
    }

    #[test]
    fn test_empty_base_slice_covers_nothing() {
        let points = load_demand_points();
        let map = CoverageMap::compute(&[], 100.0, &points, &CruiseProfile::default());
        assert_eq!(map.covered_count(), 0);
        assert_eq!(map.coverage_rate(), 0.0);
        assert_eq!(map.uncovered_demand(), map.total_demand());
    }

    #[test]
    fn test_air_faster_than_ground() {
        let profile = CruiseProfile::default();
        let air = profile.response_minutes(AssetType::Air, 60.0);
        let ground = profile.response_minutes(AssetType::Ground, 60.0);
        assert!(air < ground);
    }
}
