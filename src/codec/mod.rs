//! Binary serialization codec: persists a built catalogue, its render
//! settings, and its router graph to a single blob, and reconstructs them
//! byte-for-byte later. Wire format is Protocol Buffers, compiled from
//! `proto/transit.proto` by `build.rs`.

mod proto {
    #![allow(clippy::all)]
    include!(concat!(env!("OUT_DIR"), "/transit.serialize.rs"));
}

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::catalogue::{self, Catalogue};
use crate::geo::Coordinate;
use crate::graph::{Edge, Graph};
use crate::render::svg::{Color, Point};
use crate::render::RenderSettings;
use crate::router::{RouterSettings, TransportRouter};

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to decode the persisted blob: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("persisted blob is missing required field {0:?}")]
    MissingField(&'static str),
    #[error(transparent)]
    Catalogue(#[from] catalogue::Error),
}

/// Everything needed to answer requests: the catalogue plus the settings
/// and derived structures the two other phases produced it with.
pub struct Loaded {
    pub catalogue: Catalogue,
    pub render_settings: RenderSettings,
    pub router: TransportRouter,
}

/// Serializes a built catalogue, its render settings, and its router into
/// a single binary blob.
pub fn encode(catalogue: &Catalogue, render_settings: &RenderSettings, router: &TransportRouter) -> Vec<u8> {
    use prost::Message;

    let stops = catalogue
        .all_stops()
        .iter()
        .map(|stop| {
            let mut names: Vec<&Arc<str>> = stop.distances.keys().collect();
            names.sort_unstable();
            let neighbor_name = names.iter().map(|n| n.to_string()).collect();
            let neighbor_distance = names.iter().map(|n| stop.distances[*n]).collect();
            proto::Stop {
                name: stop.name.to_string(),
                latitude: stop.coordinate.lat,
                longitude: stop.coordinate.lon,
                neighbor_name,
                neighbor_distance,
            }
        })
        .collect();

    let buses = catalogue
        .all_buses()
        .iter()
        .map(|bus| proto::Bus {
            number: bus.number.to_string(),
            stop_name: bus
                .stops
                .iter()
                .map(|&idx| catalogue.stop_by_index(idx).name.to_string())
                .collect(),
            is_circular: bus.is_circular,
            terminal_name: catalogue.stop_by_index(bus.terminal).name.to_string(),
        })
        .collect();

    let graph = router.graph();
    let edges = graph
        .all_edges()
        .iter()
        .map(|edge| proto::Edge {
            from: edge.from,
            to: edge.to,
            weight: edge.weight,
            label: edge.label.clone(),
            span_count: edge.span_count,
        })
        .collect();
    let incidence = (0..graph.vertex_count() as u32)
        .map(|v| proto::IncidenceList {
            edge_id: graph.incident_edges(v).to_vec(),
        })
        .collect();

    let mut stop_vertex: Vec<(&Arc<str>, u32)> =
        router.stop_vertex().iter().map(|(k, &v)| (k, v)).collect();
    stop_vertex.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let message = proto::TransportCatalogue {
        stop: stops,
        bus: buses,
        render_settings: Some(render_settings_to_proto(render_settings)),
        router_settings: Some(router_settings_to_proto(router.settings())),
        graph: Some(proto::Graph { edge: edges, incidence }),
        stop_vertex: stop_vertex
            .into_iter()
            .map(|(name, vertex_id)| proto::StopVertex {
                stop_name: name.to_string(),
                vertex_id,
            })
            .collect(),
    };

    message.encode_to_vec()
}

/// Deserializes a blob written by [`encode`], re-establishing the inverse
/// stop→bus index (rebuilt by `Catalogue::add_bus` itself) and the
/// stop-name↔vertex-id consistency the router relies on.
pub fn decode(bytes: &[u8]) -> Result<Loaded, Error> {
    use prost::Message;

    let message = proto::TransportCatalogue::decode(bytes)?;

    let mut catalogue = Catalogue::new();
    for stop in &message.stop {
        catalogue.add_stop(&stop.name, Coordinate::new(stop.latitude, stop.longitude))?;
    }
    for stop in &message.stop {
        for (name, &distance) in stop.neighbor_name.iter().zip(&stop.neighbor_distance) {
            catalogue.set_distance(&stop.name, name, distance)?;
        }
    }
    for bus in &message.bus {
        let bus_idx = catalogue.add_bus(&bus.number, &bus.stop_name, bus.is_circular)?;
        if !bus.terminal_name.is_empty() {
            let terminal_idx = catalogue
                .find_stop(&bus.terminal_name)
                .ok_or_else(|| catalogue::Error::UnknownStop(bus.terminal_name.clone()))?
                .index;
            catalogue.set_terminal(bus_idx, terminal_idx);
        }
    }

    let render_settings = render_settings_from_proto(
        message
            .render_settings
            .as_ref()
            .ok_or(Error::MissingField("render_settings"))?,
    )?;

    let router_settings = router_settings_from_proto(
        message
            .router_settings
            .as_ref()
            .ok_or(Error::MissingField("router_settings"))?,
    );

    let graph_message = message.graph.as_ref().ok_or(Error::MissingField("graph"))?;
    let vertex_count = graph_message.incidence.len();
    let mut graph: Graph<f64> = Graph::new(vertex_count);
    for edge in &graph_message.edge {
        graph.add_edge(Edge {
            from: edge.from,
            to: edge.to,
            weight: edge.weight,
            label: edge.label.clone(),
            span_count: edge.span_count,
        });
    }

    let mut stop_vertex: HashMap<Arc<str>, u32> = HashMap::with_capacity(message.stop_vertex.len());
    for entry in &message.stop_vertex {
        stop_vertex.insert(Arc::from(entry.stop_name.as_str()), entry.vertex_id);
    }

    let router = TransportRouter::from_parts(graph, stop_vertex, router_settings);

    Ok(Loaded {
        catalogue,
        render_settings,
        router,
    })
}

fn color_to_proto(color: &Color) -> proto::Color {
    use proto::color::Value;
    let value = match color {
        Color::Named(name) => Value::Named(name.clone()),
        Color::Rgb { red, green, blue } => Value::Rgb(proto::Rgb {
            red: *red as u32,
            green: *green as u32,
            blue: *blue as u32,
        }),
        Color::Rgba { red, green, blue, opacity } => Value::Rgba(proto::Rgba {
            red: *red as u32,
            green: *green as u32,
            blue: *blue as u32,
            opacity: *opacity as f32,
        }),
    };
    proto::Color { value: Some(value) }
}

fn color_from_proto(color: &proto::Color) -> Result<Color, Error> {
    use proto::color::Value;
    match color.value.as_ref().ok_or(Error::MissingField("color.value"))? {
        Value::Named(name) => Ok(Color::Named(name.clone())),
        Value::Rgb(rgb) => Ok(Color::Rgb {
            red: rgb.red as u8,
            green: rgb.green as u8,
            blue: rgb.blue as u8,
        }),
        Value::Rgba(rgba) => Ok(Color::Rgba {
            red: rgba.red as u8,
            green: rgba.green as u8,
            blue: rgba.blue as u8,
            opacity: rgba.opacity as f64,
        }),
    }
}

fn point_to_proto(point: Point) -> proto::Point {
    proto::Point { x: point.x, y: point.y }
}

fn point_from_proto(point: &proto::Point) -> Point {
    Point { x: point.x, y: point.y }
}

fn render_settings_to_proto(settings: &RenderSettings) -> proto::RenderSettings {
    proto::RenderSettings {
        width: settings.width,
        height: settings.height,
        padding: settings.padding,
        line_width: settings.line_width,
        stop_radius: settings.stop_radius,
        bus_label_font_size: settings.bus_label_font_size,
        bus_label_offset: Some(point_to_proto(settings.bus_label_offset)),
        stop_label_font_size: settings.stop_label_font_size,
        stop_label_offset: Some(point_to_proto(settings.stop_label_offset)),
        underlayer_color: Some(color_to_proto(&settings.underlayer_color)),
        underlayer_width: settings.underlayer_width,
        color_palette: settings.color_palette.iter().map(color_to_proto).collect(),
    }
}

fn render_settings_from_proto(settings: &proto::RenderSettings) -> Result<RenderSettings, Error> {
    Ok(RenderSettings {
        width: settings.width,
        height: settings.height,
        padding: settings.padding,
        line_width: settings.line_width,
        stop_radius: settings.stop_radius,
        bus_label_font_size: settings.bus_label_font_size,
        bus_label_offset: point_from_proto(
            settings
                .bus_label_offset
                .as_ref()
                .ok_or(Error::MissingField("bus_label_offset"))?,
        ),
        stop_label_font_size: settings.stop_label_font_size,
        stop_label_offset: point_from_proto(
            settings
                .stop_label_offset
                .as_ref()
                .ok_or(Error::MissingField("stop_label_offset"))?,
        ),
        underlayer_color: color_from_proto(
            settings
                .underlayer_color
                .as_ref()
                .ok_or(Error::MissingField("underlayer_color"))?,
        )?,
        underlayer_width: settings.underlayer_width,
        color_palette: settings
            .color_palette
            .iter()
            .map(color_from_proto)
            .collect::<Result<_, _>>()?,
    })
}

fn router_settings_to_proto(settings: RouterSettings) -> proto::RouterSettings {
    proto::RouterSettings {
        bus_wait_time: settings.bus_wait_time,
        bus_velocity: settings.bus_velocity,
    }
}

fn router_settings_from_proto(settings: &proto::RouterSettings) -> RouterSettings {
    RouterSettings {
        bus_wait_time: settings.bus_wait_time,
        bus_velocity: settings.bus_velocity,
    }
}
