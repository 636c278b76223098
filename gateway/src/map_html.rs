//! Self-contained Leaflet map fragments for the siting response.
//!
//! The dashboard drops these straight into the page, so each fragment
//! carries its own container div and init script keyed by a unique map id.
//! No tiles are served from here; the fragment points at the public OSM
//! tile endpoint.

use mission_store::{Base, DemandPoint};
use service_coverage::CoverageMap;

const MILES_TO_METERS: f64 = 1609.34;

fn js_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Render one coverage configuration: base markers with service-radius
/// circles, demand points colored by coverage membership.
///
/// `coverage.points` is aligned index-for-index with `demand_points`.
pub fn render_coverage_map(
    map_id: &str,
    bases: &[&Base],
    coverage: &CoverageMap,
    demand_points: &[DemandPoint],
) -> String {
    let (center_lat, center_lon) = if bases.is_empty() {
        (29.76, -95.37)
    } else {
        let n = bases.len() as f64;
        (
            bases.iter().map(|b| b.latitude).sum::<f64>() / n,
            bases.iter().map(|b| b.longitude).sum::<f64>() / n,
        )
    };

    let mut layers = String::new();
    for base in bases {
        layers.push_str(&format!(
            "L.marker([{:.5}, {:.5}]).addTo(m).bindPopup('{}');\n\
             L.circle([{:.5}, {:.5}], {{radius: {:.0}, color: '#2b6cb0', weight: 1, fillOpacity: 0.08}}).addTo(m);\n",
            base.latitude,
            base.longitude,
            js_escape(&base.name),
            base.latitude,
            base.longitude,
            coverage.radius_miles * MILES_TO_METERS,
        ));
    }

    for (point, detail) in demand_points.iter().zip(&coverage.points) {
        let color = if detail.covered { "#2f855a" } else { "#c53030" };
        let note = match (&detail.nearest_base, detail.response_minutes) {
            (Some(base), Some(minutes)) => format!(
                "{} — {} ({:.0} min)",
                js_escape(&point.name),
                js_escape(base),
                minutes
            ),
            _ => format!("{} — uncovered", js_escape(&point.name)),
        };
        layers.push_str(&format!(
            "L.circleMarker([{:.5}, {:.5}], {{radius: 5, color: '{}', fillOpacity: 0.8}}).addTo(m).bindPopup('{}');\n",
            point.latitude, point.longitude, color, note,
        ));
    }

    format!(
        "<div id=\"{id}\" style=\"height: 420px;\"></div>\n\
         <script>\n\
         (function() {{\n\
         var m = L.map('{id}').setView([{lat:.5}, {lon:.5}], 7);\n\
         L.tileLayer('https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{maxZoom: 12}}).addTo(m);\n\
         {layers}\
         }})();\n\
         </script>\n",
        id = map_id,
        lat = center_lat,
        lon = center_lon,
        layers = layers,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mission_store::{load_demand_points, BaseRegistry};
    use service_coverage::{CoverageMap, CruiseProfile};

    #[test]
    fn test_fragment_shape() {
        let registry = BaseRegistry::with_gulf_coast_network();
        let demand = load_demand_points();
        let bases: Vec<&Base> = registry.existing().collect();
        let coverage =
            CoverageMap::compute(&bases, 75.0, &demand, &CruiseProfile::default());

        let html = render_coverage_map("siting-before", &bases, &coverage, &demand);
        assert!(html.contains("id=\"siting-before\""));
        assert!(html.contains("L.map('siting-before')"));
        // One marker and one radius circle per base
        assert_eq!(html.matches("L.marker(").count(), bases.len());
        assert_eq!(html.matches("L.circle(").count(), bases.len());
        assert_eq!(html.matches("L.circleMarker(").count(), demand.len());
    }

    #[test]
    fn test_uncovered_points_marked() {
        let registry = BaseRegistry::with_gulf_coast_network();
        let demand = load_demand_points();
        let lf1 = registry.get("LF1").unwrap();
        let bases = vec![lf1];
        let coverage =
            CoverageMap::compute(&bases, 50.0, &demand, &CruiseProfile::default());

        let html = render_coverage_map("t", &bases, &coverage, &demand);
        assert!(html.contains("uncovered"));
        assert!(html.contains("#c53030"));
    }

    #[test]
    fn test_names_escaped() {
        assert_eq!(js_escape("O'Brien"), "O\\'Brien");
    }
}
