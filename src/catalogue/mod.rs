//! The stop ↔ bus ↔ distance graph store.
//!
//! A flat, append-only store with index-keyed identity and name→index
//! lookup maps: stops and buses never move once inserted, and every
//! reference to one is a dense `u32` index rather than a pointer.

mod entities;

pub use entities::{Bus, Stop};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

use crate::geo::Coordinate;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("stop {0:?} already exists")]
    DuplicateStop(String),
    #[error("bus {0:?} already exists")]
    DuplicateBus(String),
    #[error("stop {0:?} is not in the catalogue")]
    UnknownStop(String),
}

/// Owns stops and buses with stable integer identities, plus the secondary
/// indices needed for O(1) lookup and deterministic lexicographic
/// enumeration.
#[derive(Debug, Default)]
pub struct Catalogue {
    stops: Vec<Stop>,
    buses: Vec<Bus>,
    stop_lookup: HashMap<Arc<str>, u32>,
    bus_lookup: HashMap<Arc<str>, u32>,
    /// Inverse adjacency: stop index -> set of bus indices serving it.
    stop_to_buses: Vec<HashSet<u32>>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new stop. Fails if `name` is already taken.
    pub fn add_stop(&mut self, name: &str, coordinate: Coordinate) -> Result<u32, Error> {
        if self.stop_lookup.contains_key(name) {
            return Err(Error::DuplicateStop(name.to_string()));
        }
        let index = self.stops.len() as u32;
        let name: Arc<str> = Arc::from(name);
        self.stops.push(Stop::new(index, name.clone(), coordinate));
        self.stop_lookup.insert(name, index);
        self.stop_to_buses.push(HashSet::new());
        Ok(index)
    }

    /// Records a directed road distance `from -> to`, overwriting any prior
    /// value for the same ordered pair.
    pub fn set_distance(&mut self, from: &str, to: &str, meters: u32) -> Result<(), Error> {
        let from_idx = *self
            .stop_lookup
            .get(from)
            .ok_or_else(|| Error::UnknownStop(from.to_string()))?;
        if !self.stop_lookup.contains_key(to) {
            return Err(Error::UnknownStop(to.to_string()));
        }
        let to_name: Arc<str> = Arc::from(to);
        self.stops[from_idx as usize]
            .distances
            .insert(to_name, meters);
        Ok(())
    }

    /// Inserts a new bus. Fails if `number` is already taken or any
    /// referenced stop is unknown. The terminal defaults to the last stop of
    /// `stop_names` (the declared sequence); callers may fix it afterward
    /// with [`Catalogue::set_terminal`].
    pub fn add_bus(
        &mut self,
        number: &str,
        stop_names: &[String],
        is_circular: bool,
    ) -> Result<u32, Error> {
        if self.bus_lookup.contains_key(number) {
            return Err(Error::DuplicateBus(number.to_string()));
        }
        let mut stops = Vec::with_capacity(stop_names.len());
        for name in stop_names {
            let idx = *self
                .stop_lookup
                .get(name.as_str())
                .ok_or_else(|| Error::UnknownStop(name.clone()))?;
            stops.push(idx);
        }
        let terminal = *stops.last().unwrap_or(&0);
        let index = self.buses.len() as u32;
        let number: Arc<str> = Arc::from(number);
        self.buses.push(Bus {
            index,
            number: number.clone(),
            stops: stops.clone(),
            is_circular,
            terminal,
        });
        self.bus_lookup.insert(number, index);
        for stop_idx in stops {
            self.stop_to_buses[stop_idx as usize].insert(index);
        }
        Ok(index)
    }

    /// Fixes the terminal stop of a bus, by stop index. Used by the ingest
    /// pipeline (to set the circular-route terminal, which equals the
    /// shared start/end stop) and by codec deserialization.
    pub fn set_terminal(&mut self, bus_idx: u32, stop_idx: u32) {
        self.buses[bus_idx as usize].terminal = stop_idx;
    }

    pub fn find_stop(&self, name: &str) -> Option<&Stop> {
        self.stop_lookup.get(name).map(|&idx| &self.stops[idx as usize])
    }

    pub fn find_bus(&self, number: &str) -> Option<&Bus> {
        self.bus_lookup.get(number).map(|&idx| &self.buses[idx as usize])
    }

    pub fn stop_by_index(&self, index: u32) -> &Stop {
        &self.stops[index as usize]
    }

    pub fn bus_by_index(&self, index: u32) -> &Bus {
        &self.buses[index as usize]
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn all_buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn all_stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Stops in lexicographic order by name.
    pub fn stops_sorted(&self) -> Vec<&Stop> {
        let mut stops: Vec<&Stop> = self.stops.iter().collect();
        stops.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        stops
    }

    /// Buses in lexicographic order by number.
    pub fn buses_sorted(&self) -> Vec<&Bus> {
        let mut buses: Vec<&Bus> = self.buses.iter().collect();
        buses.sort_unstable_by(|a, b| a.number.cmp(&b.number));
        buses
    }

    /// Bus numbers serving `stop_idx`, in sorted order.
    pub fn buses_through(&self, stop_idx: u32) -> Vec<&str> {
        let mut numbers: Vec<&str> = self.stop_to_buses[stop_idx as usize]
            .iter()
            .map(|&bus_idx| self.buses[bus_idx as usize].number.as_ref())
            .collect();
        numbers.sort_unstable();
        numbers
    }

    /// Directed road distance from `from` to `to`, in metres. Falls back to
    /// the reverse-direction distance if the forward one is absent, and to
    /// `0` if neither is declared. Both the statistics engine and the
    /// router depend on this fallback.
    pub fn road_distance(&self, from: u32, to: u32) -> u32 {
        let from_stop = &self.stops[from as usize];
        if let Some(&meters) = from_stop.distances.get(self.stops[to as usize].name.as_ref()) {
            return meters;
        }
        let to_stop = &self.stops[to as usize];
        if let Some(&meters) = to_stop.distances.get(from_stop.name.as_ref()) {
            return meters;
        }
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon)
    }

    #[test]
    fn duplicate_stop_rejected() {
        let mut c = Catalogue::new();
        c.add_stop("A", coord(0.0, 0.0)).unwrap();
        assert_eq!(
            c.add_stop("A", coord(1.0, 1.0)),
            Err(Error::DuplicateStop("A".into()))
        );
    }

    #[test]
    fn unknown_stop_in_bus_is_rejected() {
        let mut c = Catalogue::new();
        c.add_stop("A", coord(0.0, 0.0)).unwrap();
        let err = c.add_bus("1", &["A".into(), "B".into()], true).unwrap_err();
        assert_eq!(err, Error::UnknownStop("B".into()));
    }

    #[test]
    fn road_distance_falls_back_to_reverse_then_zero() {
        let mut c = Catalogue::new();
        c.add_stop("A", coord(0.0, 0.0)).unwrap();
        c.add_stop("B", coord(0.0, 1.0)).unwrap();
        c.add_stop("C", coord(1.0, 1.0)).unwrap();
        c.set_distance("A", "B", 1000).unwrap();

        let a = c.find_stop("A").unwrap().index;
        let b = c.find_stop("B").unwrap().index;
        let cc = c.find_stop("C").unwrap().index;

        assert_eq!(c.road_distance(a, b), 1000);
        assert_eq!(c.road_distance(b, a), 1000); // falls back to reverse
        assert_eq!(c.road_distance(a, cc), 0); // neither direction declared
    }

    #[test]
    fn buses_through_stop_uses_inverse_index() {
        let mut c = Catalogue::new();
        c.add_stop("A", coord(0.0, 0.0)).unwrap();
        c.add_stop("B", coord(0.0, 1.0)).unwrap();
        c.add_stop("Z", coord(2.0, 2.0)).unwrap();
        c.add_bus("2", &["A".into(), "B".into()], false).unwrap();
        c.add_bus("1", &["A".into(), "B".into()], false).unwrap();

        let a = c.find_stop("A").unwrap().index;
        let z = c.find_stop("Z").unwrap().index;
        assert_eq!(c.buses_through(a), vec!["1", "2"]);
        assert!(c.buses_through(z).is_empty());
    }

    #[test]
    fn enumeration_is_lexicographic_regardless_of_insertion_order() {
        let mut c = Catalogue::new();
        c.add_stop("Zeta", coord(0.0, 0.0)).unwrap();
        c.add_stop("Alpha", coord(1.0, 1.0)).unwrap();
        let names: Vec<&str> = c.stops_sorted().iter().map(|s| s.name.as_ref()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }
}
