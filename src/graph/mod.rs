//! Generic directed weighted graph and a cached Dijkstra-style solver.
//!
//! The graph is owned separately from its solver state; vertices are dense
//! integer ids and edges are referenced by id rather than by pointer.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A weight type usable by the solver: additive, totally ordered for our
/// purposes, with a zero and an "infinity" identity for min.
pub trait Weight: Copy + PartialOrd {
    const ZERO: Self;
    const INFINITY: Self;
    fn add(self, other: Self) -> Self;
}

impl Weight for f64 {
    const ZERO: f64 = 0.0;
    const INFINITY: f64 = f64::INFINITY;
    fn add(self, other: f64) -> f64 {
        self + other
    }
}

#[derive(Debug, Clone)]
pub struct Edge<W> {
    pub from: u32,
    pub to: u32,
    pub weight: W,
    /// Opaque label: a bus number for a travel edge, a stop name for a
    /// boarding edge.
    pub label: String,
    /// Number of stop hops this edge represents; `0` marks a boarding edge.
    pub span_count: u32,
}

/// A path returned by [`Graph::build_route`]: total weight plus the edge ids
/// traversed, in order.
#[derive(Debug, Clone)]
pub struct RouteInfo<W> {
    pub total_weight: W,
    pub edges: Vec<u32>,
}

/// A wrapper making `W` usable as a min-heap key (reverses `PartialOrd`).
struct HeapEntry<W> {
    distance: W,
    vertex: u32,
}

impl<W: PartialOrd> PartialEq for HeapEntry<W> {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance && self.vertex == other.vertex
    }
}
impl<W: PartialOrd> Eq for HeapEntry<W> {}
impl<W: PartialOrd> PartialOrd for HeapEntry<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<W: PartialOrd> Ord for HeapEntry<W> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the smallest distance first.
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

struct DijkstraCache<W> {
    source: u32,
    distance: Vec<Option<W>>,
    /// Predecessor edge id used to reach each vertex on the shortest tree.
    predecessor_edge: Vec<Option<u32>>,
}

/// A directed weighted graph over dense vertex ids `0..vertex_count`, with a
/// lazily computed, source-keyed Dijkstra cache: repeated queries from the
/// same source reuse the cached shortest-path tree instead of recomputing.
pub struct Graph<W> {
    vertex_count: usize,
    edges: Vec<Edge<W>>,
    /// Outgoing edge ids per vertex, in insertion order (this is what gives
    /// the solver's tie-breaking-by-edge-id behaviour, since relaxation
    /// visits edges in this order and only updates on strict improvement).
    incidence: Vec<Vec<u32>>,
    cache: RefCell<Option<DijkstraCache<W>>>,
}

impl<W: Weight> Graph<W> {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            vertex_count,
            edges: Vec::new(),
            incidence: vec![Vec::new(); vertex_count],
            cache: RefCell::new(None),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, id: u32) -> &Edge<W> {
        &self.edges[id as usize]
    }

    pub fn incident_edges(&self, vertex: u32) -> &[u32] {
        &self.incidence[vertex as usize]
    }

    pub fn all_edges(&self) -> &[Edge<W>] {
        &self.edges
    }

    /// Appends an edge and returns its new id. Invalidates the solver cache.
    pub fn add_edge(&mut self, edge: Edge<W>) -> u32 {
        let id = self.edges.len() as u32;
        self.incidence[edge.from as usize].push(id);
        self.edges.push(edge);
        *self.cache.borrow_mut() = None;
        id
    }

    /// Single-source, non-negative-weight shortest path from `from` to `to`.
    /// Ties are broken by edge-id (insertion) order, since edges are relaxed
    /// in insertion order and only a strict improvement updates a vertex.
    pub fn build_route(&self, from: u32, to: u32) -> Option<RouteInfo<W>> {
        self.ensure_cached(from);
        let cache = self.cache.borrow();
        let cache = cache.as_ref().expect("just computed");

        let total_weight = (*cache.distance.get(to as usize)?)?;

        let mut edges = Vec::new();
        let mut current = to;
        while current != from {
            let edge_id = cache.predecessor_edge[current as usize]?;
            edges.push(edge_id);
            current = self.edges[edge_id as usize].from;
        }
        edges.reverse();

        Some(RouteInfo {
            total_weight,
            edges,
        })
    }

    fn ensure_cached(&self, source: u32) {
        {
            let cache = self.cache.borrow();
            if let Some(cache) = cache.as_ref() {
                if cache.source == source {
                    return;
                }
            }
        }
        *self.cache.borrow_mut() = Some(self.dijkstra(source));
    }

    fn dijkstra(&self, source: u32) -> DijkstraCache<W> {
        let mut distance: Vec<Option<W>> = vec![None; self.vertex_count];
        let mut predecessor_edge: Vec<Option<u32>> = vec![None; self.vertex_count];
        let mut heap = BinaryHeap::new();

        distance[source as usize] = Some(W::ZERO);
        heap.push(HeapEntry {
            distance: W::ZERO,
            vertex: source,
        });

        while let Some(HeapEntry { distance: d, vertex: u }) = heap.pop() {
            match distance[u as usize] {
                Some(best) if d > best => continue,
                _ => {}
            }
            for &edge_id in &self.incidence[u as usize] {
                let edge = &self.edges[edge_id as usize];
                let candidate = d.add(edge.weight);
                let better = match distance[edge.to as usize] {
                    None => true,
                    Some(current_best) => candidate < current_best,
                };
                if better {
                    distance[edge.to as usize] = Some(candidate);
                    predecessor_edge[edge.to as usize] = Some(edge_id);
                    heap.push(HeapEntry {
                        distance: candidate,
                        vertex: edge.to,
                    });
                }
            }
        }

        DijkstraCache {
            source,
            distance,
            predecessor_edge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: u32, to: u32, weight: f64) -> Edge<f64> {
        Edge {
            from,
            to,
            weight,
            label: String::new(),
            span_count: 1,
        }
    }

    #[test]
    fn finds_shortest_path() {
        let mut g: Graph<f64> = Graph::new(4);
        g.add_edge(edge(0, 1, 1.0));
        g.add_edge(edge(1, 2, 1.0));
        g.add_edge(edge(0, 2, 5.0));
        g.add_edge(edge(2, 3, 1.0));

        let route = g.build_route(0, 3).unwrap();
        assert_eq!(route.total_weight, 3.0);
        assert_eq!(route.edges.len(), 3);
    }

    #[test]
    fn unreachable_returns_none() {
        let mut g: Graph<f64> = Graph::new(3);
        g.add_edge(edge(0, 1, 1.0));
        assert!(g.build_route(0, 2).is_none());
    }

    #[test]
    fn repeated_queries_from_same_source_reuse_cache() {
        let mut g: Graph<f64> = Graph::new(3);
        g.add_edge(edge(0, 1, 1.0));
        g.add_edge(edge(1, 2, 1.0));
        let first = g.build_route(0, 2).unwrap();
        let second = g.build_route(0, 2).unwrap();
        assert_eq!(first.total_weight, second.total_weight);
    }

    #[test]
    fn adding_edge_invalidates_cache_for_new_queries() {
        let mut g: Graph<f64> = Graph::new(3);
        g.add_edge(edge(0, 1, 5.0));
        assert_eq!(g.build_route(0, 1).unwrap().total_weight, 5.0);
        g.add_edge(edge(0, 1, 1.0));
        assert_eq!(g.build_route(0, 1).unwrap().total_weight, 1.0);
    }
}
