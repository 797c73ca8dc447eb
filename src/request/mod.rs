//! The JSON request/response documents and the ingest + dispatch pipeline
//! that sits between them and the rest of the engine.

use std::collections::HashMap;
use std::fs;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::catalogue::{self, Catalogue};
use crate::codec;
use crate::geo::Coordinate;
use crate::render::svg::{Color, Point};
use crate::render::{self, RenderSettings};
use crate::router::{ItineraryItem, RouterSettings, TransportRouter};
use crate::stats;

#[derive(Error, Debug)]
pub enum FatalError {
    #[error("failed to read or write {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("malformed input document: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Catalogue(#[from] catalogue::Error),
    #[error("failed to decode the persisted catalogue: {0}")]
    Codec(#[from] codec::Error),
    #[error("input document is missing required key {0:?} for this mode")]
    MissingKey(&'static str),
}

#[derive(Debug, Deserialize)]
pub struct InputDocument {
    #[serde(default)]
    pub base_requests: Vec<BaseRequest>,
    #[serde(default)]
    pub stat_requests: Vec<StatRequest>,
    pub render_settings: Option<RawRenderSettings>,
    pub routing_settings: Option<RawRoutingSettings>,
    pub serialization_settings: SerializationSettings,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum BaseRequest {
    Stop {
        name: String,
        #[serde(flatten)]
        coordinate: Coordinate,
        #[serde(default)]
        road_distances: HashMap<String, u32>,
    },
    Bus {
        name: String,
        stops: Vec<String>,
        is_roundtrip: bool,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum StatRequest {
    Bus { id: i64, name: String },
    Stop { id: i64, name: String },
    Map { id: i64 },
    Route { id: i64, from: String, to: String },
}

#[derive(Debug, Deserialize)]
pub struct RawPoint(pub f64, pub f64);

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawColor {
    Named(String),
    Rgb(u8, u8, u8),
    Rgba(u8, u8, u8, f64),
}

fn color_from_raw(raw: &RawColor) -> Color {
    match raw {
        RawColor::Named(name) => Color::Named(name.clone()),
        RawColor::Rgb(red, green, blue) => Color::Rgb {
            red: *red,
            green: *green,
            blue: *blue,
        },
        RawColor::Rgba(red, green, blue, opacity) => Color::Rgba {
            red: *red,
            green: *green,
            blue: *blue,
            opacity: *opacity,
        },
    }
}

fn point_from_raw(raw: &RawPoint) -> Point {
    Point { x: raw.0, y: raw.1 }
}

#[derive(Debug, Deserialize)]
pub struct RawRenderSettings {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub line_width: f64,
    pub stop_radius: f64,
    pub bus_label_font_size: u32,
    pub bus_label_offset: RawPoint,
    pub stop_label_font_size: u32,
    pub stop_label_offset: RawPoint,
    pub underlayer_color: RawColor,
    pub underlayer_width: f64,
    pub color_palette: Vec<RawColor>,
}

impl RawRenderSettings {
    fn into_render_settings(self) -> RenderSettings {
        RenderSettings {
            width: self.width,
            height: self.height,
            padding: self.padding,
            line_width: self.line_width,
            stop_radius: self.stop_radius,
            bus_label_font_size: self.bus_label_font_size,
            bus_label_offset: point_from_raw(&self.bus_label_offset),
            stop_label_font_size: self.stop_label_font_size,
            stop_label_offset: point_from_raw(&self.stop_label_offset),
            underlayer_color: color_from_raw(&self.underlayer_color),
            underlayer_width: self.underlayer_width,
            color_palette: self.color_palette.iter().map(color_from_raw).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawRoutingSettings {
    pub bus_wait_time: u32,
    pub bus_velocity: f64,
}

impl From<RawRoutingSettings> for RouterSettings {
    fn from(raw: RawRoutingSettings) -> Self {
        RouterSettings {
            bus_wait_time: raw.bus_wait_time,
            bus_velocity: raw.bus_velocity,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SerializationSettings {
    pub file: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum RouteItem {
    Wait { stop_name: String, time: f64 },
    Bus { bus: String, span_count: u32, time: f64 },
}

impl From<&ItineraryItem> for RouteItem {
    fn from(item: &ItineraryItem) -> Self {
        match item {
            ItineraryItem::Wait { stop_name, time } => RouteItem::Wait {
                stop_name: stop_name.clone(),
                time: *time,
            },
            ItineraryItem::Bus { bus, span_count, time } => RouteItem::Bus {
                bus: bus.clone(),
                span_count: *span_count,
                time: *time,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StatResponse {
    Bus {
        request_id: i64,
        curvature: f64,
        route_length: f64,
        stop_count: usize,
        unique_stop_count: usize,
    },
    Stop {
        request_id: i64,
        buses: Vec<String>,
    },
    Map {
        request_id: i64,
        map: String,
    },
    Route {
        request_id: i64,
        total_time: f64,
        items: Vec<RouteItem>,
    },
    NotFound {
        request_id: i64,
        error_message: &'static str,
    },
}

/// Populates a fresh catalogue from base requests in the three-pass order
/// the data model requires: every stop must exist before a distance entry
/// or a bus can reference it.
pub fn ingest(base_requests: &[BaseRequest]) -> Result<Catalogue, catalogue::Error> {
    let mut catalogue = Catalogue::new();

    for request in base_requests {
        if let BaseRequest::Stop { name, coordinate, .. } = request {
            catalogue.add_stop(name, *coordinate)?;
        }
    }

    for request in base_requests {
        if let BaseRequest::Stop { name, road_distances, .. } = request {
            for (to, &meters) in road_distances {
                catalogue.set_distance(name, to, meters)?;
            }
        }
    }

    for request in base_requests {
        if let BaseRequest::Bus { name, stops, is_roundtrip } = request {
            catalogue.add_bus(name, stops, *is_roundtrip)?;
        }
    }

    info!(
        stops = catalogue.stop_count(),
        buses = catalogue.all_buses().len(),
        "catalogue built"
    );

    Ok(catalogue)
}

/// Answers every query in order, never failing the whole batch: each item
/// independently resolves to data or to a structured "not found".
pub fn answer(
    catalogue: &Catalogue,
    router: &TransportRouter,
    render_settings: &RenderSettings,
    requests: &[StatRequest],
) -> Vec<StatResponse> {
    requests
        .iter()
        .map(|request| answer_one(catalogue, router, render_settings, request))
        .collect()
}

fn answer_one(
    catalogue: &Catalogue,
    router: &TransportRouter,
    render_settings: &RenderSettings,
    request: &StatRequest,
) -> StatResponse {
    match request {
        StatRequest::Bus { id, name } => match stats::route_stats(catalogue, name) {
            Some(s) => StatResponse::Bus {
                request_id: *id,
                curvature: s.curvature,
                route_length: s.route_length_meters,
                stop_count: s.stop_count,
                unique_stop_count: s.unique_stops,
            },
            None => not_found(*id),
        },
        StatRequest::Stop { id, name } => match catalogue.find_stop(name) {
            Some(stop) => StatResponse::Stop {
                request_id: *id,
                buses: catalogue
                    .buses_through(stop.index)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            },
            None => not_found(*id),
        },
        StatRequest::Map { id } => {
            let document = render::render(catalogue, render_settings);
            StatResponse::Map {
                request_id: *id,
                map: document.render(),
            }
        }
        StatRequest::Route { id, from, to } => match router.build_itinerary(from, to) {
            Some(itinerary) => StatResponse::Route {
                request_id: *id,
                total_time: itinerary.total_time,
                items: itinerary.items.iter().map(RouteItem::from).collect(),
            },
            None => not_found(*id),
        },
    }
}

fn not_found(request_id: i64) -> StatResponse {
    StatResponse::NotFound {
        request_id,
        error_message: "not found",
    }
}

fn io_error(path: &str, source: std::io::Error) -> FatalError {
    FatalError::Io { path: path.to_string(), source }
}

/// Runs the make_base phase: ingest + build the router + persist the blob.
pub fn run_make_base(document: InputDocument) -> Result<(), FatalError> {
    let catalogue = ingest(&document.base_requests)?;

    let render_settings = document
        .render_settings
        .ok_or(FatalError::MissingKey("render_settings"))?
        .into_render_settings();

    let router_settings: RouterSettings = document
        .routing_settings
        .ok_or(FatalError::MissingKey("routing_settings"))?
        .into();

    let router = TransportRouter::build(&catalogue, router_settings);
    info!(edges = router.graph().edge_count(), "router graph built");

    let blob = codec::encode(&catalogue, &render_settings, &router);
    fs::write(&document.serialization_settings.file, blob)
        .map_err(|e| io_error(&document.serialization_settings.file, e))?;

    Ok(())
}

/// Runs the process_requests phase: load the blob + answer every query.
pub fn run_process_requests(document: InputDocument) -> Result<Vec<StatResponse>, FatalError> {
    let path = &document.serialization_settings.file;
    let bytes = fs::read(path).map_err(|e| io_error(path, e))?;
    let codec::Loaded { catalogue, render_settings, router } = codec::decode(&bytes)?;

    info!(stops = catalogue.stop_count(), "catalogue loaded");

    Ok(answer(&catalogue, &router, &render_settings, &document.stat_requests))
}

/// Parses the input document read from standard input.
pub fn parse_input_document(text: &str) -> Result<InputDocument, FatalError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> &'static str {
        r#"{
            "base_requests": [
                {"type": "Stop", "name": "A", "latitude": 55.6, "longitude": 37.6, "road_distances": {"B": 1000}},
                {"type": "Stop", "name": "B", "latitude": 55.7, "longitude": 37.6, "road_distances": {}},
                {"type": "Bus", "name": "1", "stops": ["A", "B"], "is_roundtrip": false}
            ],
            "stat_requests": [
                {"id": 1, "type": "Bus", "name": "1"},
                {"id": 2, "type": "Bus", "name": "ghost"},
                {"id": 3, "type": "Stop", "name": "A"}
            ],
            "render_settings": {
                "width": 600.0, "height": 400.0, "padding": 50.0,
                "line_width": 14.0, "stop_radius": 5.0,
                "bus_label_font_size": 20, "bus_label_offset": [7.0, 15.0],
                "stop_label_font_size": 20, "stop_label_offset": [7.0, -3.0],
                "underlayer_color": [255, 255, 255, 0.85], "underlayer_width": 3.0,
                "color_palette": ["green", [255, 160, 0]]
            },
            "routing_settings": {"bus_wait_time": 6, "bus_velocity": 40.0},
            "serialization_settings": {"file": "unused.db"}
        }"#
    }

    #[test]
    fn parses_full_document() {
        let document = parse_input_document(sample_document()).unwrap();
        assert_eq!(document.base_requests.len(), 3);
        assert_eq!(document.stat_requests.len(), 3);
        assert!(document.render_settings.is_some());
        assert_eq!(document.serialization_settings.file, "unused.db");
    }

    #[test]
    fn ingest_and_answer_round_trip() {
        let document = parse_input_document(sample_document()).unwrap();
        let catalogue = ingest(&document.base_requests).unwrap();
        let router = TransportRouter::build(&catalogue, RouterSettings { bus_wait_time: 6, bus_velocity: 40.0 });
        let render_settings = document.render_settings.unwrap().into_render_settings();

        let responses = answer(&catalogue, &router, &render_settings, &document.stat_requests);
        assert_eq!(responses.len(), 3);

        match &responses[0] {
            StatResponse::Bus { stop_count, unique_stop_count, .. } => {
                assert_eq!(*stop_count, 3);
                assert_eq!(*unique_stop_count, 2);
            }
            other => panic!("expected Bus response, got {other:?}"),
        }
        assert!(matches!(&responses[1], StatResponse::NotFound { request_id: 2, .. }));
        match &responses[2] {
            StatResponse::Stop { buses, .. } => assert_eq!(buses, &["1"]),
            other => panic!("expected Stop response, got {other:?}"),
        }
    }
}
