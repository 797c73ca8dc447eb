//! Equirectangular min/max projector with an aspect-preserving zoom
//! coefficient: whichever axis has a non-degenerate coordinate spread sets
//! the zoom, the narrower of the two if both do, zero if neither does.

use crate::geo::Coordinate;
use crate::render::svg::Point;

const EPSILON: f64 = 1e-6;

fn is_zero(value: f64) -> bool {
    value.abs() < EPSILON
}

#[derive(Debug, Clone, Copy)]
pub struct Projector {
    padding: f64,
    min_lon: f64,
    max_lat: f64,
    zoom: f64,
}

impl Projector {
    /// Builds a projector from the coordinates that will be drawn. Returns
    /// the identity projector (all zeros, zoom 0) for an empty input set.
    pub fn new(coordinates: &[Coordinate], width: f64, height: f64, padding: f64) -> Self {
        if coordinates.is_empty() {
            return Self {
                padding,
                min_lon: 0.0,
                max_lat: 0.0,
                zoom: 0.0,
            };
        }

        let min_lon = coordinates
            .iter()
            .map(|c| c.lon)
            .fold(f64::INFINITY, f64::min);
        let max_lon = coordinates
            .iter()
            .map(|c| c.lon)
            .fold(f64::NEG_INFINITY, f64::max);
        let min_lat = coordinates
            .iter()
            .map(|c| c.lat)
            .fold(f64::INFINITY, f64::min);
        let max_lat = coordinates
            .iter()
            .map(|c| c.lat)
            .fold(f64::NEG_INFINITY, f64::max);

        let width_zoom = if !is_zero(max_lon - min_lon) {
            Some((width - 2.0 * padding) / (max_lon - min_lon))
        } else {
            None
        };
        let height_zoom = if !is_zero(max_lat - min_lat) {
            Some((height - 2.0 * padding) / (max_lat - min_lat))
        } else {
            None
        };

        let zoom = match (width_zoom, height_zoom) {
            (Some(w), Some(h)) => w.min(h),
            (Some(w), None) => w,
            (None, Some(h)) => h,
            (None, None) => 0.0,
        };

        Self {
            padding,
            min_lon,
            max_lat,
            zoom,
        }
    }

    /// Projects a coordinate onto canvas space. Latitude is flipped so that
    /// north renders toward the top of the image.
    pub fn project(&self, coordinate: &Coordinate) -> Point {
        Point {
            x: (coordinate.lon - self.min_lon) * self.zoom + self.padding,
            y: (self.max_lat - coordinate.lat) * self.zoom + self.padding,
        }
    }
}
