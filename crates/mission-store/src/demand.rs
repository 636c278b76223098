//! Demand-point reference data.
//!
//! Cities and county seats in the operator's Gulf-coast service area, with
//! census population and the annual transport volume observed from each.

use serde::{Deserialize, Serialize};

/// An aggregation unit (city or county seat) used for coverage computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandPoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Annual transport requests historically originating here.
    pub historical_missions: u32,
    pub population: u32,
}

pub fn load_demand_points() -> Vec<DemandPoint> {
    let cities = vec![
        // name, lat, lon, annual missions, population
        ("Houston", 29.7604, -95.3698, 640, 2_304_580),
        ("Galveston", 29.3013, -94.7977, 180, 53_695),
        ("Conroe", 30.3119, -95.4561, 150, 89_956),
        ("Katy", 29.7858, -95.8245, 95, 21_894),
        ("Sugar Land", 29.6197, -95.6349, 120, 111_026),
        ("Baytown", 29.7355, -94.9774, 140, 83_701),
        ("Pasadena", 29.6911, -95.2091, 160, 151_950),
        ("Pearland", 29.5636, -95.2860, 110, 125_828),
        ("League City", 29.5075, -95.0949, 105, 114_392),
        ("Texas City", 29.3838, -94.9027, 90, 51_898),
        ("The Woodlands", 30.1658, -95.4613, 100, 114_436),
        ("Huntsville", 30.7235, -95.5508, 85, 45_941),
        ("Beaumont", 30.0802, -94.1266, 170, 115_282),
        ("Port Arthur", 29.8850, -93.9399, 95, 56_039),
        ("Victoria", 28.8053, -97.0036, 110, 65_534),
        ("Bay City", 28.9828, -95.9694, 60, 17_614),
        ("Angleton", 29.1694, -95.4316, 55, 19_429),
        ("Lake Jackson", 29.0339, -95.4344, 65, 28_177),
        ("Cleveland", 30.3424, -95.0855, 45, 8_034),
        ("Livingston", 30.7110, -94.9330, 50, 5_557),
        ("Columbus", 29.7066, -96.5386, 35, 3_726),
        ("El Campo", 29.1966, -96.2697, 40, 12_350),
        ("Wharton", 29.3116, -96.1027, 38, 8_627),
        ("Brenham", 30.1669, -96.3977, 48, 18_266),
    ];

    cities
        .into_iter()
        .map(|(name, lat, lon, missions, population)| DemandPoint {
            name: name.to_string(),
            latitude: lat,
            longitude: lon,
            historical_missions: missions,
            population,
        })
        .collect()
}

/// Total annual demand across all points.
pub fn total_demand(points: &[DemandPoint]) -> u32 {
    points.iter().map(|p| p.historical_missions).sum()
}

/// Total population across all points.
pub fn total_population(points: &[DemandPoint]) -> u64 {
    points.iter().map(|p| p.population as u64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demand_points_load() {
        let points = load_demand_points();
        assert_eq!(points.len(), 24);
        assert!(points.iter().all(|p| p.historical_missions > 0));
        assert!(points.iter().all(|p| p.population > 0));
    }

    #[test]
    fn test_coordinates_in_service_area() {
        // Everything sits in the Gulf-coast operating box
        let points = load_demand_points();
        for p in &points {
            assert!(p.latitude > 28.0 && p.latitude < 32.0, "{}", p.name);
            assert!(p.longitude > -98.0 && p.longitude < -93.0, "{}", p.name);
        }
    }

    #[test]
    fn test_totals() {
        let points = load_demand_points();
        assert!(total_demand(&points) > 2000);
        assert!(total_population(&points) > 3_000_000);
    }
}
