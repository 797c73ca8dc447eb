//! Map renderer: produces a deterministic, layered SVG scene from a frozen
//! catalogue and render settings.

pub mod projector;
pub mod svg;

use std::collections::BTreeSet;

use crate::catalogue::{Bus, Catalogue};
use crate::render::projector::Projector;
use crate::render::svg::{Color, Document, Point, Shape};

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub line_width: f64,
    pub stop_radius: f64,
    pub bus_label_font_size: u32,
    pub bus_label_offset: Point,
    pub stop_label_font_size: u32,
    pub stop_label_offset: Point,
    pub underlayer_color: Color,
    pub underlayer_width: f64,
    /// Ordered colour palette, size >= 1.
    pub color_palette: Vec<Color>,
}

/// Renders the full SVG map in a fixed z-order: polylines, then bus labels,
/// then stop circles, then stop labels.
pub fn render(catalogue: &Catalogue, settings: &RenderSettings) -> Document {
    let buses: Vec<&Bus> = catalogue
        .buses_sorted()
        .into_iter()
        .filter(|bus| !bus.is_empty_route())
        .collect();

    let mut referenced_stops: BTreeSet<u32> = BTreeSet::new();
    for bus in &buses {
        referenced_stops.extend(bus.stops.iter().copied());
    }

    let coordinates: Vec<_> = referenced_stops
        .iter()
        .map(|&idx| catalogue.stop_by_index(idx).coordinate)
        .collect();
    let projector = Projector::new(&coordinates, settings.width, settings.height, settings.padding);

    let palette_size = settings.color_palette.len().max(1);
    let bus_colors: Vec<Color> = buses
        .iter()
        .enumerate()
        .map(|(k, _)| settings.color_palette[k % palette_size].clone())
        .collect();

    let mut document = Document::new();

    render_polylines(&mut document, catalogue, &buses, &bus_colors, &projector, settings);
    render_bus_labels(&mut document, catalogue, &buses, &bus_colors, &projector, settings);

    let mut stops: Vec<_> = referenced_stops
        .iter()
        .map(|&idx| catalogue.stop_by_index(idx))
        .collect();
    stops.sort_unstable_by(|a, b| a.name.cmp(&b.name));

    render_stop_circles(&mut document, &stops, &projector, settings);
    render_stop_labels(&mut document, &stops, &projector, settings);

    document
}

fn render_polylines(
    document: &mut Document,
    catalogue: &Catalogue,
    buses: &[&Bus],
    bus_colors: &[Color],
    projector: &Projector,
    settings: &RenderSettings,
) {
    for (bus, color) in buses.iter().zip(bus_colors) {
        let points = bus
            .materialised_sequence()
            .into_iter()
            .map(|idx| projector.project(&catalogue.stop_by_index(idx).coordinate))
            .collect();
        document.push(Shape::Polyline {
            points,
            stroke: color.clone(),
            stroke_width: settings.line_width,
        });
    }
}

fn render_bus_labels(
    document: &mut Document,
    catalogue: &Catalogue,
    buses: &[&Bus],
    bus_colors: &[Color],
    projector: &Projector,
    settings: &RenderSettings,
) {
    for (bus, color) in buses.iter().zip(bus_colors) {
        let first_stop = bus.stops[0];
        push_bus_label(document, catalogue, projector, settings, bus, color, first_stop);

        if !bus.is_circular && bus.terminal != first_stop {
            push_bus_label(document, catalogue, projector, settings, bus, color, bus.terminal);
        }
    }
}

fn push_bus_label(
    document: &mut Document,
    catalogue: &Catalogue,
    projector: &Projector,
    settings: &RenderSettings,
    bus: &Bus,
    color: &Color,
    stop_idx: u32,
) {
    let position = projector.project(&catalogue.stop_by_index(stop_idx).coordinate);
    document.push(Shape::Text {
        position,
        offset: settings.bus_label_offset,
        font_size: settings.bus_label_font_size,
        bold: true,
        data: bus.number.to_string(),
        fill: color.clone(),
        stroke: Some((settings.underlayer_color.clone(), settings.underlayer_width)),
    });
    document.push(Shape::Text {
        position,
        offset: settings.bus_label_offset,
        font_size: settings.bus_label_font_size,
        bold: true,
        data: bus.number.to_string(),
        fill: color.clone(),
        stroke: None,
    });
}

fn render_stop_circles(
    document: &mut Document,
    stops: &[&crate::catalogue::Stop],
    projector: &Projector,
    settings: &RenderSettings,
) {
    for stop in stops {
        document.push(Shape::Circle {
            center: projector.project(&stop.coordinate),
            radius: settings.stop_radius,
            fill: Color::Named("white".to_string()),
        });
    }
}

fn render_stop_labels(
    document: &mut Document,
    stops: &[&crate::catalogue::Stop],
    projector: &Projector,
    settings: &RenderSettings,
) {
    for stop in stops {
        let position = projector.project(&stop.coordinate);
        document.push(Shape::Text {
            position,
            offset: settings.stop_label_offset,
            font_size: settings.stop_label_font_size,
            bold: false,
            data: stop.name.to_string(),
            fill: Color::Named("black".to_string()),
            stroke: Some((settings.underlayer_color.clone(), settings.underlayer_width)),
        });
        document.push(Shape::Text {
            position,
            offset: settings.stop_label_offset,
            font_size: settings.stop_label_font_size,
            bold: false,
            data: stop.name.to_string(),
            fill: Color::Named("black".to_string()),
            stroke: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    fn settings() -> RenderSettings {
        RenderSettings {
            width: 600.0,
            height: 400.0,
            padding: 50.0,
            line_width: 14.0,
            stop_radius: 5.0,
            bus_label_font_size: 20,
            bus_label_offset: Point { x: 7.0, y: 15.0 },
            stop_label_font_size: 20,
            stop_label_offset: Point { x: 7.0, y: -3.0 },
            underlayer_color: Color::Rgba {
                red: 255,
                green: 255,
                blue: 255,
                opacity: 0.85,
            },
            underlayer_width: 3.0,
            color_palette: vec![Color::Named("green".into()), Color::Rgb { red: 255, green: 160, blue: 0 }],
        }
    }

    fn build_catalogue() -> Catalogue {
        let mut c = Catalogue::new();
        c.add_stop("A", Coordinate::new(55.6, 37.6)).unwrap();
        c.add_stop("B", Coordinate::new(55.7, 37.6)).unwrap();
        c.add_stop("C", Coordinate::new(55.7, 37.7)).unwrap();
        c.set_distance("A", "B", 1000).unwrap();
        c.set_distance("B", "C", 2000).unwrap();
        c.add_bus("1", &["A".into(), "B".into(), "C".into()], false).unwrap();
        c.add_bus("2", &["A".into()], false).unwrap(); // empty-ish degenerate route, still non-empty
        c
    }

    #[test]
    fn rendering_is_deterministic() {
        let catalogue = build_catalogue();
        let settings = settings();
        let first = render(&catalogue, &settings).render();
        let second = render(&catalogue, &settings).render();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_bus_produces_no_polyline() {
        let mut c = Catalogue::new();
        c.add_stop("A", Coordinate::new(0.0, 0.0)).unwrap();
        c.add_bus("empty", &[], false).unwrap();
        let doc = render(&c, &settings()).render();
        assert!(!doc.contains("<polyline"));
    }

    #[test]
    fn svg_has_matching_root_tags() {
        let catalogue = build_catalogue();
        let doc = render(&catalogue, &settings()).render();
        assert!(doc.starts_with("<?xml"));
        assert!(doc.trim_end().ends_with("</svg>"));
    }
}
