//! The transport router: lowers a catalogue into a doubled-vertex graph and
//! answers fastest-itinerary queries.
//!
//! Every stop gets two vertices, an idle one and a boarded one, connected by
//! a boarding edge weighted by wait time; travel edges connect boarded
//! vertices to idle vertices along each bus's route.

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalogue::Catalogue;
use crate::graph::{Edge, Graph};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterSettings {
    /// Minutes a passenger waits to board at any stop.
    pub bus_wait_time: u32,
    /// Bus speed in km/h.
    pub bus_velocity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItineraryItem {
    Wait { stop_name: String, time: f64 },
    Bus { bus: String, span_count: u32, time: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    pub total_time: f64,
    pub items: Vec<ItineraryItem>,
}

/// Prefix sums of road distance along a bus's declared stop sequence, in
/// both directions, giving O(1) distance-between-stops lookups while
/// building travel edges.
struct RouteDistances {
    forward: Vec<u64>,
    backward: Vec<u64>,
}

impl RouteDistances {
    fn build(catalogue: &Catalogue, stops: &[u32], is_circular: bool) -> Self {
        let mut forward = vec![0u64; stops.len()];
        let mut backward = vec![0u64; stops.len()];
        for i in 0..stops.len().saturating_sub(1) {
            forward[i + 1] = forward[i] + catalogue.road_distance(stops[i], stops[i + 1]) as u64;
            if !is_circular {
                backward[i + 1] =
                    backward[i] + catalogue.road_distance(stops[i + 1], stops[i]) as u64;
            }
        }
        Self { forward, backward }
    }

    /// Distance travelling forward from stop-sequence index `i` to `j` (`i < j`).
    fn forward_distance(&self, i: usize, j: usize) -> u64 {
        self.forward[j] - self.forward[i]
    }

    /// Distance travelling backward from stop-sequence index `j` to `i` (`i < j`).
    fn backward_distance(&self, i: usize, j: usize) -> u64 {
        self.backward[j] - self.backward[i]
    }
}

pub struct TransportRouter {
    graph: Graph<f64>,
    /// Stop name -> idle (even) vertex id; the boarded twin is always `+1`.
    stop_vertex: HashMap<Arc<str>, u32>,
    settings: RouterSettings,
}

impl TransportRouter {
    /// Builds the doubled stop-vertex graph from a frozen catalogue.
    pub fn build(catalogue: &Catalogue, settings: RouterSettings) -> Self {
        let vertex_count = 2 * catalogue.stop_count();
        let mut graph = Graph::new(vertex_count);
        let mut stop_vertex = HashMap::with_capacity(catalogue.stop_count());

        for stop in catalogue.all_stops() {
            let idle = 2 * stop.index;
            stop_vertex.insert(stop.name.clone(), idle);
            graph.add_edge(Edge {
                from: idle,
                to: idle + 1,
                weight: settings.bus_wait_time as f64,
                label: stop.name.to_string(),
                span_count: 0,
            });
        }

        let meters_per_minute = settings.bus_velocity * 1000.0 / 60.0;

        for bus in catalogue.all_buses() {
            let stops = &bus.stops;
            if stops.len() < 2 {
                continue;
            }
            let distances = RouteDistances::build(catalogue, stops, bus.is_circular);
            for i in 0..stops.len() - 1 {
                for j in (i + 1)..stops.len() {
                    let forward_meters = distances.forward_distance(i, j);
                    graph.add_edge(Edge {
                        from: 2 * stops[i] + 1,
                        to: 2 * stops[j],
                        weight: forward_meters as f64 / meters_per_minute,
                        label: bus.number.to_string(),
                        span_count: (j - i) as u32,
                    });

                    if !bus.is_circular {
                        let backward_meters = distances.backward_distance(i, j);
                        graph.add_edge(Edge {
                            from: 2 * stops[j] + 1,
                            to: 2 * stops[i],
                            weight: backward_meters as f64 / meters_per_minute,
                            label: bus.number.to_string(),
                            span_count: (j - i) as u32,
                        });
                    }
                }
            }
        }

        Self {
            graph,
            stop_vertex,
            settings,
        }
    }

    /// Reassembles a router from a previously-materialised graph and
    /// stop-vertex map, as produced by the binary codec's round trip.
    pub fn from_parts(
        graph: Graph<f64>,
        stop_vertex: HashMap<Arc<str>, u32>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            graph,
            stop_vertex,
            settings,
        }
    }

    pub fn graph(&self) -> &Graph<f64> {
        &self.graph
    }

    pub fn stop_vertex(&self) -> &HashMap<Arc<str>, u32> {
        &self.stop_vertex
    }

    pub fn settings(&self) -> RouterSettings {
        self.settings
    }

    /// Fastest itinerary between two named stops, or `None` if either stop
    /// is unknown or no path exists.
    pub fn build_itinerary(&self, from_name: &str, to_name: &str) -> Option<Itinerary> {
        let from_vertex = *self.stop_vertex.get(from_name)?;
        let to_vertex = *self.stop_vertex.get(to_name)?;

        if from_name == to_name {
            return Some(Itinerary {
                total_time: 0.0,
                items: Vec::new(),
            });
        }

        let route = self.graph.build_route(from_vertex, to_vertex)?;
        let items = route
            .edges
            .iter()
            .map(|&id| {
                let edge = self.graph.edge(id);
                if edge.span_count == 0 {
                    ItineraryItem::Wait {
                        stop_name: edge.label.clone(),
                        time: edge.weight,
                    }
                } else {
                    ItineraryItem::Bus {
                        bus: edge.label.clone(),
                        span_count: edge.span_count,
                        time: edge.weight,
                    }
                }
            })
            .collect();

        Some(Itinerary {
            total_time: route.total_weight,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    fn settings(wait: u32, velocity: f64) -> RouterSettings {
        RouterSettings {
            bus_wait_time: wait,
            bus_velocity: velocity,
        }
    }

    #[test]
    fn basic_itinerary() {
        let mut c = Catalogue::new();
        c.add_stop("A", Coordinate::new(0.0, 0.0)).unwrap();
        c.add_stop("B", Coordinate::new(0.0, 0.01)).unwrap();
        c.set_distance("A", "B", 600).unwrap();
        c.add_bus("", &["A".into(), "B".into()], false).unwrap();

        let router = TransportRouter::build(&c, settings(6, 40.0));
        let itinerary = router.build_itinerary("A", "B").unwrap();

        assert_eq!(itinerary.items.len(), 2);
        assert!(matches!(&itinerary.items[0], ItineraryItem::Wait { stop_name, time }
            if stop_name == "A" && (*time - 6.0).abs() < 1e-9));
        assert!(matches!(&itinerary.items[1], ItineraryItem::Bus { span_count: 1, .. }));
        assert!((itinerary.total_time - 6.9).abs() < 1e-6);
    }

    #[test]
    fn transfer_has_two_waits_and_two_legs() {
        let mut c = Catalogue::new();
        c.add_stop("A", Coordinate::new(0.0, 0.0)).unwrap();
        c.add_stop("B", Coordinate::new(0.0, 0.01)).unwrap();
        c.add_stop("C", Coordinate::new(0.0, 0.02)).unwrap();
        c.set_distance("A", "B", 600).unwrap();
        c.set_distance("B", "C", 600).unwrap();
        c.add_bus("u", &["A".into(), "B".into()], false).unwrap();
        c.add_bus("v", &["B".into(), "C".into()], false).unwrap();

        let router = TransportRouter::build(&c, settings(6, 40.0));
        let itinerary = router.build_itinerary("A", "C").unwrap();

        assert_eq!(itinerary.items.len(), 4);
        assert!(matches!(&itinerary.items[0], ItineraryItem::Wait { stop_name, .. } if stop_name == "A"));
        assert!(matches!(&itinerary.items[2], ItineraryItem::Wait { stop_name, .. } if stop_name == "B"));
    }

    #[test]
    fn same_stop_is_empty_itinerary() {
        let mut c = Catalogue::new();
        c.add_stop("A", Coordinate::new(0.0, 0.0)).unwrap();
        let router = TransportRouter::build(&c, settings(5, 30.0));
        let itinerary = router.build_itinerary("A", "A").unwrap();
        assert_eq!(itinerary.total_time, 0.0);
        assert!(itinerary.items.is_empty());
    }

    #[test]
    fn missing_stop_is_not_found() {
        let c = Catalogue::new();
        let router = TransportRouter::build(&c, settings(5, 30.0));
        assert!(router.build_itinerary("A", "B").is_none());
    }

    #[test]
    fn asymmetric_distances_give_different_leg_times_by_direction() {
        let mut c = Catalogue::new();
        c.add_stop("X", Coordinate::new(0.0, 0.0)).unwrap();
        c.add_stop("Y", Coordinate::new(0.0, 0.01)).unwrap();
        c.set_distance("X", "Y", 1000).unwrap();
        c.set_distance("Y", "X", 2000).unwrap();
        c.add_bus("2", &["X".into(), "Y".into()], false).unwrap();

        let router = TransportRouter::build(&c, settings(0, 60.0));
        let forward = router.build_itinerary("X", "Y").unwrap();
        let backward = router.build_itinerary("Y", "X").unwrap();
        assert!(forward.total_time < backward.total_time);
    }
}
