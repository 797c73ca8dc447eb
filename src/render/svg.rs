//! A minimal SVG 1.1 text emitter: shape objects with settable style
//! attributes that render themselves into a string buffer. Plain structs
//! with a `render` method writing into a `fmt::Write`, no templating engine
//! and no external rendering dependency.

use std::fmt::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A tagged union of the three colour forms a render setting may use: a
/// named CSS colour, an opaque RGB triple, or a translucent RGBA value.
#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    Named(String),
    Rgb { red: u8, green: u8, blue: u8 },
    Rgba { red: u8, green: u8, blue: u8, opacity: f64 },
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Named(name) => write!(f, "{name}"),
            Color::Rgb { red, green, blue } => write!(f, "rgb({red},{green},{blue})"),
            Color::Rgba {
                red,
                green,
                blue,
                opacity,
            } => write!(f, "rgba({red},{green},{blue},{opacity})"),
        }
    }
}

/// One shape in the rendered scene, in the order it must be emitted.
#[derive(Debug, Clone)]
pub enum Shape {
    Polyline {
        points: Vec<Point>,
        stroke: Color,
        stroke_width: f64,
    },
    Text {
        position: Point,
        offset: Point,
        font_size: u32,
        bold: bool,
        data: String,
        fill: Color,
        /// `Some` for the underlayer stroke pass, `None` for the plain fill pass.
        stroke: Option<(Color, f64)>,
    },
    Circle {
        center: Point,
        radius: f64,
        fill: Color,
    },
}

impl Shape {
    fn render(&self, out: &mut String) {
        match self {
            Shape::Polyline {
                points,
                stroke,
                stroke_width,
            } => {
                out.push_str("<polyline points=\"");
                for (i, p) in points.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    let _ = write!(out, "{},{}", p.x, p.y);
                }
                let _ = write!(
                    out,
                    "\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>"
                );
            }
            Shape::Circle { center, radius, fill } => {
                let _ = write!(
                    out,
                    "<circle cx=\"{}\" cy=\"{}\" r=\"{radius}\" fill=\"{fill}\"/>",
                    center.x, center.y
                );
            }
            Shape::Text {
                position,
                offset,
                font_size,
                bold,
                data,
                fill,
                stroke,
            } => {
                out.push_str("<text");
                let _ = write!(
                    out,
                    " x=\"{}\" y=\"{}\" dx=\"{}\" dy=\"{}\" font-size=\"{font_size}\"",
                    position.x,
                    position.y,
                    offset.x,
                    offset.y
                );
                out.push_str(" font-family=\"Verdana\"");
                if *bold {
                    out.push_str(" font-weight=\"bold\"");
                }
                if let Some((stroke_color, stroke_width)) = stroke {
                    let _ = write!(
                        out,
                        " fill=\"{stroke_color}\" stroke=\"{stroke_color}\" stroke-width=\"{stroke_width}\" stroke-linecap=\"round\" stroke-linejoin=\"round\""
                    );
                } else {
                    let _ = write!(out, " fill=\"{fill}\"");
                }
                out.push('>');
                escape_text(data, out);
                out.push_str("</text>");
            }
        }
    }
}

fn escape_text(data: &str, out: &mut String) {
    for ch in data.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

/// An ordered scene of shapes. Rendering is append-only and deterministic:
/// two documents built from the same shape sequence are byte-identical.
#[derive(Debug, Clone, Default)]
pub struct Document {
    shapes: Vec<Shape>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n");
        out.push_str(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\">\n",
        );
        for shape in &self.shapes {
            shape.render(&mut out);
            out.push('\n');
        }
        out.push_str("</svg>");
        out
    }
}
