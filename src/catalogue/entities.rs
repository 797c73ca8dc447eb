use std::collections::HashMap;
use std::sync::Arc;

use crate::geo::Coordinate;

/// A physical point where passengers can board or alight from a bus.
///
/// Identity (`index`) is pinned for the catalogue's lifetime; only
/// `distances` is mutated after insertion, by `Catalogue::set_distance`.
#[derive(Debug, Clone)]
pub struct Stop {
    pub index: u32,
    pub name: Arc<str>,
    pub coordinate: Coordinate,
    /// Directed outgoing road distances in metres, keyed by neighbour name.
    pub distances: HashMap<Arc<str>, u32>,
}

impl Stop {
    pub(crate) fn new(index: u32, name: Arc<str>, coordinate: Coordinate) -> Self {
        Self {
            index,
            name,
            coordinate,
            distances: HashMap::new(),
        }
    }
}

/// A bus route: an ordered sequence of stop references plus the terminal
/// used for map-label placement.
#[derive(Debug, Clone)]
pub struct Bus {
    pub index: u32,
    pub number: Arc<str>,
    /// Declared stop sequence. For a circular route this starts and ends at
    /// the same stop; for a non-circular route it holds the forward leg only.
    pub stops: Vec<u32>,
    pub is_circular: bool,
    /// Fixed at creation time (or by `Catalogue::set_terminal` during
    /// ingest/deserialization); never recomputed afterward.
    pub terminal: u32,
}

impl Bus {
    /// The materialised stop sequence used by statistics and the renderer:
    /// the declared sequence for circular routes, forward-then-reversed-tail
    /// for non-circular routes.
    pub fn materialised_sequence(&self) -> Vec<u32> {
        if self.is_circular {
            self.stops.clone()
        } else {
            let mut sequence = self.stops.clone();
            sequence.extend(self.stops.iter().rev().skip(1));
            sequence
        }
    }

    /// `true` if the bus serves no stops at all — excluded from map rendering.
    pub fn is_empty_route(&self) -> bool {
        self.stops.is_empty()
    }
}
