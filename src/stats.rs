//! Route-statistics engine.
//!
//! Sits directly atop [`crate::catalogue::Catalogue`] — no mutable state, no
//! caching, just a deterministic aggregate over the materialised stop
//! sequence.

use crate::catalogue::Catalogue;

/// Aggregates returned for a known bus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteStats {
    pub stop_count: usize,
    pub unique_stops: usize,
    pub route_length_meters: f64,
    pub curvature: f64,
}

/// Computes [`RouteStats`] for `bus_number`, or `None` if the bus is unknown.
pub fn route_stats(catalogue: &Catalogue, bus_number: &str) -> Option<RouteStats> {
    let bus = catalogue.find_bus(bus_number)?;

    let stop_count = if bus.stops.is_empty() {
        0
    } else if bus.is_circular {
        bus.stops.len()
    } else {
        2 * bus.stops.len() - 1
    };

    let unique_stops = {
        let mut seen: Vec<u32> = bus.stops.clone();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    };

    let sequence = bus.materialised_sequence();
    let mut road_length_meters: u64 = 0;
    let mut geo_length_meters: f64 = 0.0;
    for pair in sequence.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        road_length_meters += catalogue.road_distance(from, to) as u64;
        let from_coord = catalogue.stop_by_index(from).coordinate;
        let to_coord = catalogue.stop_by_index(to).coordinate;
        geo_length_meters += from_coord.great_circle_distance(&to_coord);
    }
    let route_length_meters = road_length_meters as f64;

    // +infinity rather than NaN for a zero-length geographic path, so it is
    // test-visible and never silently swallowed by a downstream comparison.
    let curvature = if geo_length_meters == 0.0 {
        f64::INFINITY
    } else {
        route_length_meters / geo_length_meters
    };

    Some(RouteStats {
        stop_count,
        unique_stops,
        route_length_meters,
        curvature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    fn build_scenario_1() -> Catalogue {
        let mut c = Catalogue::new();
        c.add_stop("A", Coordinate::new(55.6, 37.6)).unwrap();
        c.add_stop("B", Coordinate::new(55.7, 37.6)).unwrap();
        c.add_stop("C", Coordinate::new(55.7, 37.7)).unwrap();
        c.set_distance("A", "B", 1000).unwrap();
        c.set_distance("B", "C", 2000).unwrap();
        c.set_distance("C", "A", 3000).unwrap();
        c.add_bus(
            "1",
            &["A".into(), "B".into(), "C".into(), "A".into()],
            true,
        )
        .unwrap();
        c
    }

    #[test]
    fn circular_route_symmetric_distances() {
        let c = build_scenario_1();
        let stats = route_stats(&c, "1").unwrap();
        assert_eq!(stats.stop_count, 4);
        assert_eq!(stats.unique_stops, 3);
        assert_eq!(stats.route_length_meters, 6000.0);
        assert!(stats.curvature >= 1.0 - 1e-9);
    }

    #[test]
    fn non_circular_route_asymmetric_distances() {
        let mut c = Catalogue::new();
        c.add_stop("X", Coordinate::new(0.0, 0.0)).unwrap();
        c.add_stop("Y", Coordinate::new(0.0, 1.0)).unwrap();
        c.set_distance("X", "Y", 1000).unwrap();
        c.set_distance("Y", "X", 1500).unwrap();
        c.add_bus("2", &["X".into(), "Y".into()], false).unwrap();

        let stats = route_stats(&c, "2").unwrap();
        assert_eq!(stats.stop_count, 3);
        assert_eq!(stats.unique_stops, 2);
        assert_eq!(stats.route_length_meters, 2500.0);
    }

    #[test]
    fn unknown_bus_returns_none() {
        let c = build_scenario_1();
        assert!(route_stats(&c, "ghost").is_none());
    }

    #[test]
    fn zero_length_geography_gives_infinite_curvature() {
        let mut c = Catalogue::new();
        c.add_stop("A", Coordinate::new(10.0, 10.0)).unwrap();
        c.add_stop("B", Coordinate::new(10.0, 10.0)).unwrap();
        c.set_distance("A", "B", 500).unwrap();
        c.add_bus("3", &["A".into(), "B".into()], false).unwrap();

        let stats = route_stats(&c, "3").unwrap();
        assert_eq!(stats.curvature, f64::INFINITY);
    }

    #[test]
    fn unique_stop_count_never_exceeds_stop_count() {
        let c = build_scenario_1();
        let stats = route_stats(&c, "1").unwrap();
        assert!(stats.unique_stops <= stats.stop_count);
    }

    #[test]
    fn empty_route_has_zero_stop_count() {
        let mut c = Catalogue::new();
        c.add_stop("A", Coordinate::new(0.0, 0.0)).unwrap();
        c.add_bus("empty", &[], false).unwrap();

        let stats = route_stats(&c, "empty").unwrap();
        assert_eq!(stats.stop_count, 0);
        assert_eq!(stats.unique_stops, 0);
        assert_eq!(stats.route_length_meters, 0.0);
    }
}
