//! Shape model and geometry kernel.
//!
//! The editable shape set is closed: every per-type behavior (creation
//! defaults, bounds, translation, corner resize, cloning, port layout) is an
//! exhaustive match on `ShapeType`. Geometry lives in `ShapeData` and is
//! mirrored into the shape's owned `Element` on every mutation, so the data
//! bag and the rendered markup never disagree.

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::error::EditorError;
use crate::geometry::{format_points, parse_points, Bounds, Point};

/// Minimum edge length for box-like resizes.
pub const MIN_SIZE: f64 = 20.0;
/// Minimum circle radius.
pub const MIN_RADIUS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeType {
    Rect,
    RoundedRect,
    Circle,
    Ellipse,
    Triangle,
    Diamond,
    Trapezoid,
    Hexagon,
    Pentagon,
    Speech,
    Wave,
    Cloud,
    Cylinder,
    Text,
    Image,
    Line,
    Polyline,
    Connector,
}

impl ShapeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeType::Rect => "rect",
            ShapeType::RoundedRect => "roundedRect",
            ShapeType::Circle => "circle",
            ShapeType::Ellipse => "ellipse",
            ShapeType::Triangle => "triangle",
            ShapeType::Diamond => "diamond",
            ShapeType::Trapezoid => "trapezoid",
            ShapeType::Hexagon => "hexagon",
            ShapeType::Pentagon => "pentagon",
            ShapeType::Speech => "speech",
            ShapeType::Wave => "wave",
            ShapeType::Cloud => "cloud",
            ShapeType::Cylinder => "cylinder",
            ShapeType::Text => "text",
            ShapeType::Image => "image",
            ShapeType::Line => "line",
            ShapeType::Polyline => "polyline",
            ShapeType::Connector => "connector",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, EditorError> {
        match raw {
            "rect" => Ok(ShapeType::Rect),
            "roundedRect" => Ok(ShapeType::RoundedRect),
            "circle" => Ok(ShapeType::Circle),
            "ellipse" => Ok(ShapeType::Ellipse),
            "triangle" => Ok(ShapeType::Triangle),
            "diamond" => Ok(ShapeType::Diamond),
            "trapezoid" => Ok(ShapeType::Trapezoid),
            "hexagon" => Ok(ShapeType::Hexagon),
            "pentagon" => Ok(ShapeType::Pentagon),
            "speech" => Ok(ShapeType::Speech),
            "wave" => Ok(ShapeType::Wave),
            "cloud" => Ok(ShapeType::Cloud),
            "cylinder" => Ok(ShapeType::Cylinder),
            "text" => Ok(ShapeType::Text),
            "image" => Ok(ShapeType::Image),
            "line" => Ok(ShapeType::Line),
            "polyline" => Ok(ShapeType::Polyline),
            "connector" => Ok(ShapeType::Connector),
            other => Err(EditorError::UnknownShapeType(other.to_string())),
        }
    }

    /// Normalized outline for the path family, as (x, y) factors of the box.
    fn blueprint(&self) -> Option<&'static [(f64, f64)]> {
        match self {
            ShapeType::Diamond => {
                Some(&[(0.5, 0.0), (1.0, 0.5), (0.5, 1.0), (0.0, 0.5)])
            }
            ShapeType::Trapezoid => {
                Some(&[(0.2, 0.0), (0.8, 0.0), (1.0, 1.0), (0.0, 1.0)])
            }
            ShapeType::Hexagon => Some(&[
                (0.2, 0.0),
                (0.8, 0.0),
                (1.0, 0.5),
                (0.8, 1.0),
                (0.2, 1.0),
                (0.0, 0.5),
            ]),
            ShapeType::Pentagon => Some(&[
                (0.5, 0.0),
                (1.0, 0.4),
                (0.8, 1.0),
                (0.2, 1.0),
                (0.0, 0.4),
            ]),
            ShapeType::Speech => Some(&[
                (0.0, 0.0),
                (1.0, 0.0),
                (1.0, 0.75),
                (0.65, 0.75),
                (0.5, 1.0),
                (0.5, 0.75),
                (0.0, 0.75),
            ]),
            ShapeType::Wave => Some(&[
                (0.0, 0.35),
                (0.25, 0.55),
                (0.5, 0.25),
                (0.75, 0.6),
                (1.0, 0.4),
                (1.0, 1.0),
                (0.0, 1.0),
            ]),
            _ => None,
        }
    }

    pub fn is_path_family(&self) -> bool {
        self.blueprint().is_some()
    }

    /// Line-like shapes with two endpoint slots instead of corner grips.
    pub fn is_edge(&self) -> bool {
        matches!(self, ShapeType::Line | ShapeType::Polyline | ShapeType::Connector)
    }

    /// Shapes that expose connection ports.
    pub fn has_ports(&self) -> bool {
        !matches!(
            self,
            ShapeType::Text | ShapeType::Line | ShapeType::Polyline | ShapeType::Connector
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowMode {
    #[default]
    None,
    Start,
    End,
    Both,
}

/// Free-form geometry and style bag. Which fields are populated depends on
/// the shape type; absent fields stay out of the persisted JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ry: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip_x: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip_y: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrow_mode: Option<ArrowMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_port_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_port_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_name: Option<String>,
}

impl ShapeData {
    pub fn x(&self) -> f64 {
        self.x.unwrap_or(0.0)
    }
    pub fn y(&self) -> f64 {
        self.y.unwrap_or(0.0)
    }
    pub fn width(&self) -> f64 {
        self.width.unwrap_or(0.0)
    }
    pub fn height(&self) -> f64 {
        self.height.unwrap_or(0.0)
    }
    pub fn point_list(&self) -> Vec<Point> {
        self.points.as_deref().map(parse_points).unwrap_or_default()
    }
}

/// Connection port on a shape's outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub id: String,
    pub point: Point,
    pub position: PortPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortPosition {
    Top,
    Right,
    Bottom,
    Left,
}

impl PortPosition {
    pub fn tag(&self) -> &'static str {
        match self {
            PortPosition::Top => "top",
            PortPosition::Right => "right",
            PortPosition::Bottom => "bottom",
            PortPosition::Left => "left",
        }
    }
}

/// Extra per-type handle; currently the rounded-rect corner radius knob.
#[derive(Debug, Clone, PartialEq)]
pub struct CornerHandle {
    pub id: String,
    pub point: Point,
    pub cursor: &'static str,
}

/// Which grip a resize gesture holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
    /// First endpoint of an edge shape.
    Start,
    /// Second endpoint of an edge shape.
    End,
}

impl ResizeHandle {
    pub fn has_north(&self) -> bool {
        matches!(self, ResizeHandle::NorthWest | ResizeHandle::NorthEast)
    }
    pub fn has_south(&self) -> bool {
        matches!(self, ResizeHandle::SouthWest | ResizeHandle::SouthEast)
    }
    pub fn has_east(&self) -> bool {
        matches!(self, ResizeHandle::NorthEast | ResizeHandle::SouthEast)
    }
    pub fn has_west(&self) -> bool {
        matches!(self, ResizeHandle::NorthWest | ResizeHandle::SouthWest)
    }
}

/// One editable shape: id, type tag, owned render element, geometry bag and
/// connection bookkeeping. Connectors keep exactly two endpoint slots; every
/// other shape keeps an unordered list of attached connector ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: String,
    pub shape_type: ShapeType,
    pub element: Element,
    pub data: ShapeData,
    pub connections: Vec<Option<String>>,
}

impl Shape {
    /// Endpoint slot (0 = start, 1 = end) of an edge shape.
    pub fn endpoint(&self, slot: usize) -> Option<&str> {
        self.connections.get(slot).and_then(|c| c.as_deref())
    }

    pub fn set_endpoint(&mut self, slot: usize, target: Option<String>) {
        while self.connections.len() < 2 {
            self.connections.push(None);
        }
        self.connections[slot] = target;
    }

    pub fn has_bound_endpoint(&self) -> bool {
        self.connections.iter().any(|c| c.is_some())
    }

    /// Register an attached connector on a node shape.
    pub fn attach_connector(&mut self, connector_id: &str) {
        if !self
            .connections
            .iter()
            .any(|c| c.as_deref() == Some(connector_id))
        {
            self.connections.push(Some(connector_id.to_string()));
        }
    }

    pub fn detach_connector(&mut self, connector_id: &str) {
        self.connections
            .retain(|c| c.as_deref() != Some(connector_id));
    }

    pub fn attached_connectors(&self) -> impl Iterator<Item = &str> {
        self.connections.iter().filter_map(|c| c.as_deref())
    }
}

/// Default drop-in position for each type, before scatter.
pub fn default_origin(shape_type: ShapeType) -> Point {
    match shape_type {
        ShapeType::Rect | ShapeType::RoundedRect => Point::new(100.0, 100.0),
        ShapeType::Circle => Point::new(220.0, 180.0),
        ShapeType::Ellipse => Point::new(100.0, 100.0),
        ShapeType::Triangle => Point::new(160.0, 220.0),
        ShapeType::Diamond
        | ShapeType::Trapezoid
        | ShapeType::Hexagon
        | ShapeType::Pentagon
        | ShapeType::Speech
        | ShapeType::Wave => Point::new(80.0, 80.0),
        ShapeType::Cloud => Point::new(100.0, 80.0),
        ShapeType::Cylinder => Point::new(90.0, 80.0),
        ShapeType::Text => Point::new(100.0, 250.0),
        ShapeType::Image => Point::new(120.0, 120.0),
        ShapeType::Line => Point::new(120.0, 120.0),
        ShapeType::Polyline => Point::new(100.0, 100.0),
        ShapeType::Connector => Point::new(150.0, 150.0),
    }
}

/// Scatter range applied on top of `default_origin` for freshly dropped
/// shapes, so repeated palette clicks do not stack exactly.
pub fn scatter_range(shape_type: ShapeType) -> (f64, f64) {
    match shape_type {
        ShapeType::Rect | ShapeType::RoundedRect => (100.0, 100.0),
        ShapeType::Circle => (100.0, 80.0),
        ShapeType::Triangle => (100.0, 80.0),
        ShapeType::Text => (100.0, 50.0),
        ShapeType::Image => (100.0, 80.0),
        _ => (0.0, 0.0),
    }
}

/// Optional creation parameters for image shapes.
#[derive(Debug, Clone, Default)]
pub struct ImageOptions {
    pub href: Option<String>,
    pub svg_text: Option<String>,
    pub icon_name: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

fn base_element(shape_type: ShapeType, id: &str) -> Element {
    let tag = match shape_type {
        ShapeType::Rect | ShapeType::RoundedRect => "rect",
        ShapeType::Circle => "circle",
        ShapeType::Ellipse => "ellipse",
        ShapeType::Triangle => "polygon",
        ShapeType::Cylinder => "g",
        ShapeType::Text => "text",
        ShapeType::Image => "image",
        ShapeType::Line | ShapeType::Connector => "line",
        ShapeType::Polyline => "polyline",
        _ => "path",
    };
    let mut el = Element::new(tag);
    el.set_attr("id", id);
    if shape_type == ShapeType::Cylinder {
        let mut body = Element::new("path");
        body.set_attr("class", "cylinder-body");
        let mut rim = Element::new("path");
        rim.set_attr("class", "cylinder-rim");
        el.push_child(body);
        el.push_child(rim);
    }
    el
}

fn apply_base_style(shape: &mut Shape) {
    let cursor = if shape.shape_type.is_edge() { "pointer" } else { "move" };
    match shape.shape_type {
        ShapeType::Cylinder => {
            // Styling lives on the child paths; the group stays inert.
            shape.element.set_attr("fill", "none");
            shape.element.set_attr("stroke", "none");
        }
        ShapeType::Text | ShapeType::Image => {}
        _ => {
            if let Some(fill) = shape.data.fill.clone() {
                shape.element.set_attr("fill", fill);
            }
            if let Some(stroke) = shape.data.stroke.clone() {
                shape.element.set_attr("stroke", stroke);
            }
            if let Some(w) = shape.data.stroke_width {
                shape.element.set_num("stroke-width", w);
            }
            if shape.shape_type.is_edge() {
                shape.element.set_attr("fill", "none");
            }
        }
    }
    shape.element.set_attr("cursor", cursor);
}

/// Build a fresh shape of `shape_type` anchored at `origin` with the
/// type's default geometry and style.
pub fn create_shape(shape_type: ShapeType, id: String, origin: Point) -> Shape {
    let element = base_element(shape_type, &id);
    let mut data = ShapeData {
        rotation: Some(0.0),
        scale: Some(1.0),
        opacity: Some(1.0),
        ..ShapeData::default()
    };

    match shape_type {
        ShapeType::Rect | ShapeType::RoundedRect => {
            data.x = Some(origin.x);
            data.y = Some(origin.y);
            data.width = Some(140.0);
            data.height = Some(80.0);
            data.fill = Some("transparent".into());
            data.stroke = Some("#000000".into());
            data.stroke_width = Some(2.0);
            if shape_type == ShapeType::RoundedRect {
                data.corner_radius = Some(15.0);
            }
        }
        ShapeType::Circle => {
            data.x = Some(origin.x);
            data.y = Some(origin.y);
            data.radius = Some(50.0);
            data.fill = Some("transparent".into());
            data.stroke = Some("#166534".into());
            data.stroke_width = Some(2.0);
        }
        ShapeType::Ellipse => {
            data.cx = Some(origin.x);
            data.cy = Some(origin.y);
            data.rx = Some(70.0);
            data.ry = Some(45.0);
            data.fill = Some("transparent".into());
            data.stroke = Some("#000000".into());
            data.stroke_width = Some(2.0);
        }
        ShapeType::Triangle => {
            data.points = Some(triangle_points(origin.x, origin.y, 100.0));
            data.fill = Some("transparent".into());
            data.stroke = Some("#d97706".into());
            data.stroke_width = Some(2.0);
        }
        ShapeType::Diamond
        | ShapeType::Trapezoid
        | ShapeType::Hexagon
        | ShapeType::Pentagon
        | ShapeType::Speech
        | ShapeType::Wave => {
            data.x = Some(origin.x);
            data.y = Some(origin.y);
            data.width = Some(140.0);
            data.height = Some(90.0);
            data.points = Some(normalized_outline(
                shape_type, origin.x, origin.y, 140.0, 90.0,
            ));
            data.fill = Some("transparent".into());
            data.stroke = Some("#000000".into());
            data.stroke_width = Some(2.0);
        }
        ShapeType::Cloud => {
            data.x = Some(origin.x);
            data.y = Some(origin.y);
            data.width = Some(160.0);
            data.height = Some(110.0);
            data.fill = Some("transparent".into());
            data.stroke = Some("#000000".into());
            data.stroke_width = Some(2.0);
        }
        ShapeType::Cylinder => {
            data.x = Some(origin.x);
            data.y = Some(origin.y);
            data.width = Some(120.0);
            data.height = Some(160.0);
            data.rx = Some(60.0);
            data.ry = Some((MIN_SIZE / 3.0).max(30.0));
            data.fill = Some("transparent".into());
            data.stroke = Some("#000000".into());
            data.stroke_width = Some(2.0);
        }
        ShapeType::Text => {
            data.x = Some(origin.x);
            data.y = Some(origin.y);
            data.width = Some(200.0);
            data.height = Some(60.0);
            data.text = Some("Double-click to edit".into());
            data.font_size = Some(20.0);
            data.fill = Some("#1f2937".into());
            data.stroke = Some("none".into());
            data.stroke_width = Some(0.0);
        }
        ShapeType::Image => {
            let size = 120.0;
            data.x = Some(origin.x);
            data.y = Some(origin.y);
            data.width = Some(size);
            data.height = Some(size);
            data.href = Some(String::new());
            data.original_href = Some(String::new());
            data.fill = Some("none".into());
            data.stroke = Some("none".into());
            data.stroke_width = Some(0.0);
        }
        ShapeType::Line => {
            data.x1 = Some(origin.x);
            data.y1 = Some(origin.y);
            data.x2 = Some(origin.x + 100.0);
            data.y2 = Some(origin.y + 60.0);
            data.stroke = Some("#000000".into());
            data.stroke_width = Some(2.0);
            data.arrow_mode = Some(ArrowMode::None);
            data.rotation = None;
            data.scale = None;
            data.opacity = None;
        }
        ShapeType::Polyline => {
            data.points = Some(format_points(&[
                origin,
                origin.translated(60.0, 40.0),
                origin.translated(120.0, 20.0),
            ]));
            data.stroke = Some("#6b7280".into());
            data.stroke_width = Some(2.0);
            data.rotation = None;
            data.scale = None;
            data.opacity = None;
        }
        ShapeType::Connector => {
            data.x1 = Some(origin.x);
            data.y1 = Some(origin.y);
            data.x2 = Some(origin.x + 100.0);
            data.y2 = Some(origin.y + 60.0);
            data.stroke = Some("#6b7280".into());
            data.stroke_width = Some(2.0);
            data.rotation = None;
            data.scale = None;
            data.opacity = None;
        }
    }

    let connections = if shape_type.is_edge() { vec![None, None] } else { Vec::new() };
    let mut shape = Shape { id, shape_type, element, data, connections };
    apply_base_style(&mut shape);
    sync_geometry(&mut shape);
    shape
}

/// Build an image shape with explicit source options.
pub fn create_image(id: String, origin: Point, opts: ImageOptions) -> Shape {
    let mut shape = create_shape(ShapeType::Image, id, origin);
    let size = opts.width.unwrap_or(120.0).max(opts.height.unwrap_or(80.0));
    shape.data.width = Some(size);
    shape.data.height = Some(size);
    shape.data.href = Some(opts.href.clone().unwrap_or_default());
    shape.data.original_href = Some(opts.href.unwrap_or_default());
    shape.data.icon_name = opts.icon_name;
    if let Some(svg) = opts.svg_text {
        shape.data.href = Some(svg_data_uri(&svg));
    }
    sync_geometry(&mut shape);
    shape
}

/// Inline an SVG document as a base64 data URI.
pub fn svg_data_uri(svg_text: &str) -> String {
    use base64::Engine as _;
    let encoded = base64::engine::general_purpose::STANDARD.encode(svg_text.as_bytes());
    format!("data:image/svg+xml;base64,{encoded}")
}

fn triangle_points(cx: f64, cy: f64, size: f64) -> String {
    let h = size * 3.0_f64.sqrt() / 2.0;
    format_points(&[
        Point::new(cx, cy - 2.0 / 3.0 * h),
        Point::new(cx - size / 2.0, cy + h / 3.0),
        Point::new(cx + size / 2.0, cy + h / 3.0),
    ])
}

fn normalized_outline(shape_type: ShapeType, x: f64, y: f64, w: f64, h: f64) -> String {
    let blueprint = shape_type.blueprint().unwrap_or(&[]);
    let pts: Vec<Point> = blueprint
        .iter()
        .map(|(fx, fy)| Point::new(x + fx * w, y + fy * h))
        .collect();
    format_points(&pts)
}

/// Cubic template for the cloud outline, as factors of the box.
const CLOUD_TEMPLATE: &[(&str, &[f64])] = &[
    ("M", &[0.25, 0.2105]),
    ("C", &[0.05, 0.2105, 0.0, 0.4737, 0.16, 0.5263]),
    ("C", &[0.0, 0.6421, 0.18, 0.8947, 0.31, 0.7895]),
    ("C", &[0.4, 1.0, 0.7, 1.0, 0.8, 0.7895]),
    ("C", &[1.0, 0.7895, 1.0, 0.5789, 0.875, 0.4737]),
    ("C", &[1.0, 0.2632, 0.8, 0.0526, 0.625, 0.1579]),
    ("C", &[0.5, 0.0, 0.3, 0.0, 0.25, 0.2105]),
];

fn cloud_path(x: f64, y: f64, w: f64, h: f64) -> String {
    let mut segments = Vec::with_capacity(CLOUD_TEMPLATE.len());
    for (cmd, factors) in CLOUD_TEMPLATE {
        let coords: Vec<String> = factors
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let c = if i % 2 == 0 { x + v * w } else { y + v * h };
                crate::geometry::fmt_num(c)
            })
            .collect();
        segments.push(format!("{} {}", cmd, coords.join(" ")));
    }
    segments.join(" ") + " Z"
}

// Circle-approximation constant for the cylinder cap curves.
const KAPPA: f64 = 0.552_284_749_830_793_6;

fn sync_cylinder(shape: &mut Shape) {
    let d = &shape.data;
    let (x, y, w, h) = (d.x(), d.y(), d.width(), d.height());
    let rx = d.rx.unwrap_or(w / 2.0);
    let ry = d.ry.unwrap_or((MIN_SIZE / 3.0).max(w / 4.0));
    let cx = x + w / 2.0;
    let top = y;
    let bottom = y + h;
    let k = KAPPA;
    let n = crate::geometry::fmt_num;

    let body_d = [
        format!("M {} {}", n(cx - rx), n(top + ry)),
        format!(
            "C {} {} {} {} {} {}",
            n(cx - rx),
            n(top + ry - k * ry),
            n(cx - k * rx),
            n(top),
            n(cx),
            n(top)
        ),
        format!(
            "C {} {} {} {} {} {}",
            n(cx + k * rx),
            n(top),
            n(cx + rx),
            n(top + ry - k * ry),
            n(cx + rx),
            n(top + ry)
        ),
        format!("L {} {}", n(cx + rx), n(bottom - ry)),
        format!(
            "C {} {} {} {} {} {}",
            n(cx + rx),
            n(bottom - ry + k * ry),
            n(cx + k * rx),
            n(bottom),
            n(cx),
            n(bottom)
        ),
        format!(
            "C {} {} {} {} {} {}",
            n(cx - k * rx),
            n(bottom),
            n(cx - rx),
            n(bottom - ry + k * ry),
            n(cx - rx),
            n(bottom - ry)
        ),
        "Z".to_string(),
    ]
    .join(" ");

    let rim_d = [
        format!("M {} {}", n(cx - rx), n(top + ry)),
        format!(
            "C {} {} {} {} {} {}",
            n(cx - rx),
            n(top + ry + k * ry),
            n(cx - k * rx),
            n(top + 2.0 * ry),
            n(cx),
            n(top + 2.0 * ry)
        ),
        format!(
            "C {} {} {} {} {} {}",
            n(cx + k * rx),
            n(top + 2.0 * ry),
            n(cx + rx),
            n(top + ry + k * ry),
            n(cx + rx),
            n(top + ry)
        ),
    ]
    .join(" ");

    let fill = d.fill.clone().unwrap_or_else(|| "transparent".into());
    let stroke = d.stroke.clone().unwrap_or_else(|| "#000000".into());
    let stroke_width = d.stroke_width.unwrap_or(2.0);
    let opacity = d.opacity.unwrap_or(1.0);

    if let Some(body) = shape.element.child_by_class_mut("cylinder-body") {
        body.set_attr("d", body_d);
        body.set_attr("fill", fill);
        body.set_attr("stroke", stroke.clone());
        body.set_num("stroke-width", stroke_width);
        body.set_num("opacity", opacity);
    }
    if let Some(rim) = shape.element.child_by_class_mut("cylinder-rim") {
        rim.set_attr("d", rim_d);
        rim.set_attr("fill", "none");
        rim.set_attr("stroke", stroke);
        rim.set_num("stroke-width", stroke_width);
        rim.set_num("opacity", opacity);
    }
}

/// Mirror the data bag's geometry into the owned element.
pub fn sync_geometry(shape: &mut Shape) {
    match shape.shape_type {
        ShapeType::Rect => {
            let (x, y, w, h) = {
                let d = &shape.data;
                (d.x(), d.y(), d.width(), d.height())
            };
            shape.element.set_num("x", x);
            shape.element.set_num("y", y);
            shape.element.set_num("width", w);
            shape.element.set_num("height", h);
        }
        ShapeType::RoundedRect => {
            let (x, y, w, h, r) = {
                let d = &shape.data;
                (d.x(), d.y(), d.width(), d.height(), d.corner_radius.unwrap_or(0.0))
            };
            shape.element.set_num("x", x);
            shape.element.set_num("y", y);
            shape.element.set_num("width", w);
            shape.element.set_num("height", h);
            shape.element.set_num("rx", r);
            shape.element.set_num("ry", r);
        }
        ShapeType::Circle => {
            let (cx, cy, r) = (shape.data.x(), shape.data.y(), shape.data.radius.unwrap_or(0.0));
            shape.element.set_num("cx", cx);
            shape.element.set_num("cy", cy);
            shape.element.set_num("r", r);
        }
        ShapeType::Ellipse => {
            let (cx, cy, rx, ry) = {
                let d = &shape.data;
                (
                    d.cx.unwrap_or(0.0),
                    d.cy.unwrap_or(0.0),
                    d.rx.unwrap_or(0.0),
                    d.ry.unwrap_or(0.0),
                )
            };
            shape.element.set_num("cx", cx);
            shape.element.set_num("cy", cy);
            shape.element.set_num("rx", rx);
            shape.element.set_num("ry", ry);
        }
        ShapeType::Triangle => {
            let pts = shape.data.points.clone().unwrap_or_default();
            shape.element.set_attr("points", pts);
        }
        ShapeType::Diamond
        | ShapeType::Trapezoid
        | ShapeType::Hexagon
        | ShapeType::Pentagon
        | ShapeType::Speech
        | ShapeType::Wave => {
            let pts = shape.data.point_list();
            let d: String = pts
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let cmd = if i == 0 { "M" } else { "L" };
                    format!(
                        "{} {} {}",
                        cmd,
                        crate::geometry::fmt_num(p.x),
                        crate::geometry::fmt_num(p.y)
                    )
                })
                .collect::<Vec<_>>()
                .join(" ")
                + " Z";
            shape.element.set_attr("d", d);
        }
        ShapeType::Cloud => {
            let path = {
                let d = &shape.data;
                cloud_path(d.x(), d.y(), d.width(), d.height())
            };
            shape.element.set_attr("d", path);
        }
        ShapeType::Cylinder => sync_cylinder(shape),
        ShapeType::Text => {
            let (x, y, font_size, fill, text) = {
                let d = &shape.data;
                (
                    d.x(),
                    d.y(),
                    d.font_size.unwrap_or(20.0),
                    d.fill.clone().unwrap_or_else(|| "#1f2937".into()),
                    d.text.clone().unwrap_or_default(),
                )
            };
            shape.element.set_num("x", x);
            // Baseline of the first line, not the box corner.
            shape.element.set_num("y", y + font_size);
            shape.element.set_num("font-size", font_size);
            shape.element.set_attr("font-family", "Arial, sans-serif");
            shape.element.set_attr("fill", fill);
            shape.element.set_text(text);
        }
        ShapeType::Image => {
            let (x, y, w, h, href) = {
                let d = &shape.data;
                (d.x(), d.y(), d.width(), d.height(), d.href.clone())
            };
            shape.element.set_num("x", x);
            shape.element.set_num("y", y);
            shape.element.set_num("width", w);
            shape.element.set_num("height", h);
            if let Some(href) = href {
                shape.element.set_attr("href", href);
            }
            shape.element.set_attr("preserveAspectRatio", "xMidYMid meet");
        }
        ShapeType::Line => {
            let (x1, y1, x2, y2) = {
                let d = &shape.data;
                (
                    d.x1.unwrap_or(0.0),
                    d.y1.unwrap_or(0.0),
                    d.x2.unwrap_or(0.0),
                    d.y2.unwrap_or(0.0),
                )
            };
            shape.element.set_num("x1", x1);
            shape.element.set_num("y1", y1);
            shape.element.set_num("x2", x2);
            shape.element.set_num("y2", y2);
        }
        ShapeType::Polyline => {
            let pts = shape.data.points.clone().unwrap_or_default();
            shape.element.set_attr("points", pts);
        }
        ShapeType::Connector => {
            // A connector renders as a line until it gains interior points.
            let pts = shape.data.point_list();
            if pts.len() > 2 || shape.element.tag() == "polyline" {
                upgrade_connector_element(shape);
                let raw = shape.data.points.clone().unwrap_or_default();
                shape.element.set_attr("points", raw);
            } else {
                let (x1, y1, x2, y2) = {
                    let d = &shape.data;
                    (
                        d.x1.unwrap_or(0.0),
                        d.y1.unwrap_or(0.0),
                        d.x2.unwrap_or(0.0),
                        d.y2.unwrap_or(0.0),
                    )
                };
                shape.element.set_num("x1", x1);
                shape.element.set_num("y1", y1);
                shape.element.set_num("x2", x2);
                shape.element.set_num("y2", y2);
            }
        }
    }
}

/// Swap a connector's `line` element for a `polyline` in place, keeping
/// every attribute except the line endpoints.
pub fn upgrade_connector_element(shape: &mut Shape) {
    if shape.element.tag() != "line" {
        return;
    }
    shape.element.retag("polyline");
    for attr in ["x1", "y1", "x2", "y2"] {
        shape.element.remove_attr(attr);
    }
    shape.element.set_attr("fill", "none");
}

/// Points along a connector: interior route when present, else its two
/// endpoints.
pub fn connector_points(shape: &Shape) -> Vec<Point> {
    let pts = shape.data.point_list();
    if pts.len() >= 2 {
        return pts;
    }
    vec![
        Point::new(shape.data.x1.unwrap_or(0.0), shape.data.y1.unwrap_or(0.0)),
        Point::new(shape.data.x2.unwrap_or(0.0), shape.data.y2.unwrap_or(0.0)),
    ]
}

/// Install a full route on a connector, keeping x1..y2 in sync with the
/// first and last points.
pub fn set_connector_points(shape: &mut Shape, pts: &[Point]) {
    if pts.len() < 2 {
        return;
    }
    shape.data.points = Some(format_points(pts));
    let first = pts[0];
    let last = pts[pts.len() - 1];
    shape.data.x1 = Some(first.x);
    shape.data.y1 = Some(first.y);
    shape.data.x2 = Some(last.x);
    shape.data.y2 = Some(last.y);
    sync_geometry(shape);
}

/// Axis-aligned bounds.
pub fn shape_bounds(shape: &Shape) -> Bounds {
    let d = &shape.data;
    match shape.shape_type {
        ShapeType::Rect
        | ShapeType::RoundedRect
        | ShapeType::Cloud
        | ShapeType::Cylinder
        | ShapeType::Text
        | ShapeType::Image
        | ShapeType::Diamond
        | ShapeType::Trapezoid
        | ShapeType::Hexagon
        | ShapeType::Pentagon
        | ShapeType::Speech
        | ShapeType::Wave => {
            Bounds::new(d.x(), d.y(), d.x() + d.width(), d.y() + d.height())
        }
        ShapeType::Circle => {
            let r = d.radius.unwrap_or(0.0);
            Bounds::new(d.x() - r, d.y() - r, d.x() + r, d.y() + r)
        }
        ShapeType::Ellipse => {
            let (cx, cy) = (d.cx.unwrap_or(0.0), d.cy.unwrap_or(0.0));
            let (rx, ry) = (d.rx.unwrap_or(0.0), d.ry.unwrap_or(0.0));
            Bounds::new(cx - rx, cy - ry, cx + rx, cy + ry)
        }
        ShapeType::Triangle | ShapeType::Polyline => Bounds::of_points(&d.point_list()),
        ShapeType::Line | ShapeType::Connector => {
            Bounds::of_points(&connector_points(shape))
        }
    }
}

/// Logical center used for center-bound connections.
pub fn shape_center(shape: &Shape) -> Point {
    let d = &shape.data;
    match shape.shape_type {
        ShapeType::Circle => Point::new(d.x(), d.y()),
        ShapeType::Ellipse => Point::new(d.cx.unwrap_or(0.0), d.cy.unwrap_or(0.0)),
        ShapeType::Triangle | ShapeType::Polyline => {
            let pts = d.point_list();
            if pts.is_empty() {
                return Point::default();
            }
            let n = pts.len() as f64;
            Point::new(
                pts.iter().map(|p| p.x).sum::<f64>() / n,
                pts.iter().map(|p| p.y).sum::<f64>() / n,
            )
        }
        ShapeType::Line | ShapeType::Connector => {
            let pts = connector_points(shape);
            let first = pts[0];
            let last = pts[pts.len() - 1];
            Point::new((first.x + last.x) / 2.0, (first.y + last.y) / 2.0)
        }
        _ => shape_bounds(shape).center(),
    }
}

/// Exact translation; no clamping, every coordinate shifts by the delta.
pub fn translate_shape(shape: &mut Shape, dx: f64, dy: f64) {
    let d = &mut shape.data;
    match shape.shape_type {
        ShapeType::Rect
        | ShapeType::RoundedRect
        | ShapeType::Circle
        | ShapeType::Cloud
        | ShapeType::Cylinder
        | ShapeType::Text
        | ShapeType::Image => {
            d.x = Some(d.x() + dx);
            d.y = Some(d.y() + dy);
        }
        ShapeType::Ellipse => {
            d.cx = Some(d.cx.unwrap_or(0.0) + dx);
            d.cy = Some(d.cy.unwrap_or(0.0) + dy);
        }
        ShapeType::Triangle | ShapeType::Polyline => {
            let pts: Vec<Point> =
                d.point_list().iter().map(|p| p.translated(dx, dy)).collect();
            d.points = Some(format_points(&pts));
        }
        ShapeType::Diamond
        | ShapeType::Trapezoid
        | ShapeType::Hexagon
        | ShapeType::Pentagon
        | ShapeType::Speech
        | ShapeType::Wave => {
            d.x = Some(d.x() + dx);
            d.y = Some(d.y() + dy);
            let pts: Vec<Point> =
                d.point_list().iter().map(|p| p.translated(dx, dy)).collect();
            d.points = Some(format_points(&pts));
        }
        ShapeType::Line | ShapeType::Connector => {
            d.x1 = Some(d.x1.unwrap_or(0.0) + dx);
            d.y1 = Some(d.y1.unwrap_or(0.0) + dy);
            d.x2 = Some(d.x2.unwrap_or(0.0) + dx);
            d.y2 = Some(d.y2.unwrap_or(0.0) + dy);
            if d.points.is_some() {
                let pts: Vec<Point> =
                    d.point_list().iter().map(|p| p.translated(dx, dy)).collect();
                d.points = Some(format_points(&pts));
            }
        }
    }
    sync_geometry(shape);
}

fn resize_box(
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    handle: ResizeHandle,
    dx: f64,
    dy: f64,
    min: f64,
) -> (f64, f64, f64, f64) {
    let (mut x, mut y, mut w, mut h) = (x, y, w, h);
    match handle {
        ResizeHandle::SouthEast => {
            w = (w + dx).max(min);
            h = (h + dy).max(min);
        }
        ResizeHandle::SouthWest => {
            x = (x + dx).min(x + w - min);
            w = (w - dx).max(min);
            h = (h + dy).max(min);
        }
        ResizeHandle::NorthEast => {
            y = (y + dy).min(y + h - min);
            w = (w + dx).max(min);
            h = (h - dy).max(min);
        }
        ResizeHandle::NorthWest => {
            x = (x + dx).min(x + w - min);
            y = (y + dy).min(y + h - min);
            w = (w - dx).max(min);
            h = (h - dy).max(min);
        }
        ResizeHandle::Start | ResizeHandle::End => {}
    }
    (x, y, w, h)
}

/// Corner-handle resize with per-type minimum floors. The edge opposite the
/// dragged grip stays fixed.
pub fn resize_shape(shape: &mut Shape, handle: ResizeHandle, dx: f64, dy: f64) {
    match shape.shape_type {
        ShapeType::Rect | ShapeType::Image => {
            let (mut x, mut y, mut w, mut h) = {
                let d = &shape.data;
                resize_box(d.x(), d.y(), d.width(), d.height(), handle, dx, dy, MIN_SIZE)
            };
            if shape.shape_type == ShapeType::Image {
                // Images keep a 1:1 frame; re-square against the dragged corner.
                let size = w.max(h);
                match handle {
                    ResizeHandle::SouthWest => x += w - size,
                    ResizeHandle::NorthEast => y += h - size,
                    ResizeHandle::NorthWest => {
                        x += w - size;
                        y += h - size;
                    }
                    _ => {}
                }
                w = size;
                h = size;
            }
            shape.data.x = Some(x);
            shape.data.y = Some(y);
            shape.data.width = Some(w);
            shape.data.height = Some(h);
        }
        ShapeType::RoundedRect => {
            let (x, y, w, h) = {
                let d = &shape.data;
                resize_box(d.x(), d.y(), d.width(), d.height(), handle, dx, dy, 40.0)
            };
            // Dragging a corner also eases the corner radius toward the grip.
            let max_radius = w.min(h) / 4.0;
            let adjustment = (dx.abs() + dy.abs()) / 2.0;
            let radius = (shape.data.corner_radius.unwrap_or(0.0) + adjustment * 0.1)
                .clamp(0.0, max_radius.max(0.0));
            shape.data.x = Some(x);
            shape.data.y = Some(y);
            shape.data.width = Some(w);
            shape.data.height = Some(h);
            shape.data.corner_radius = Some(radius);
        }
        ShapeType::Circle => {
            let delta_x = if handle.has_east() {
                dx
            } else if handle.has_west() {
                -dx
            } else {
                0.0
            };
            let delta_y = if handle.has_south() {
                dy
            } else if handle.has_north() {
                -dy
            } else {
                0.0
            };
            let avg = (delta_x + delta_y) / 2.0;
            let radius = (shape.data.radius.unwrap_or(0.0) + avg).max(MIN_RADIUS);
            shape.data.radius = Some(radius);
        }
        ShapeType::Ellipse => {
            let ddx = if handle.has_west() { -dx } else { dx };
            let ddy = if handle.has_north() { -dy } else { dy };
            let rx = (shape.data.rx.unwrap_or(0.0) + ddx).max(MIN_SIZE / 2.0);
            let ry = (shape.data.ry.unwrap_or(0.0) + ddy).max(MIN_SIZE / 2.0);
            shape.data.rx = Some(rx);
            shape.data.ry = Some(ry);
        }
        ShapeType::Triangle => {
            let pts = shape.data.point_list();
            if pts.is_empty() {
                return;
            }
            let b = Bounds::of_points(&pts);
            let width = if b.width() == 0.0 { 1.0 } else { b.width() };
            let height = if b.height() == 0.0 { 1.0 } else { b.height() };
            let anchor = Point::new(
                if handle.has_west() { b.max_x } else { b.min_x },
                if handle.has_north() { b.max_y } else { b.min_y },
            );
            let width_delta = if handle.has_east() { dx } else { -dx };
            let height_delta = if handle.has_south() { dy } else { -dy };
            let scale_x = (width + width_delta).max(MIN_SIZE) / width;
            let scale_y = (height + height_delta).max(MIN_SIZE) / height;
            let scaled: Vec<Point> = pts
                .iter()
                .map(|p| {
                    Point::new(
                        anchor.x + (p.x - anchor.x) * scale_x,
                        anchor.y + (p.y - anchor.y) * scale_y,
                    )
                })
                .collect();
            shape.data.points = Some(format_points(&scaled));
        }
        ShapeType::Diamond
        | ShapeType::Trapezoid
        | ShapeType::Hexagon
        | ShapeType::Pentagon
        | ShapeType::Speech
        | ShapeType::Wave => {
            let (x, y, w, h) = {
                let d = &shape.data;
                resize_box(d.x(), d.y(), d.width(), d.height(), handle, dx, dy, MIN_SIZE)
            };
            shape.data.x = Some(x);
            shape.data.y = Some(y);
            shape.data.width = Some(w);
            shape.data.height = Some(h);
            shape.data.points = Some(normalized_outline(shape.shape_type, x, y, w, h));
        }
        ShapeType::Cloud => {
            let (x, y, w, h) = {
                let d = &shape.data;
                resize_box(d.x(), d.y(), d.width(), d.height(), handle, dx, dy, MIN_SIZE)
            };
            shape.data.x = Some(x);
            shape.data.y = Some(y);
            shape.data.width = Some(w);
            shape.data.height = Some(h);
        }
        ShapeType::Cylinder => {
            let (x, y, w, h) = {
                let d = &shape.data;
                resize_box(d.x(), d.y(), d.width(), d.height(), handle, dx, dy, MIN_SIZE)
            };
            shape.data.x = Some(x);
            shape.data.y = Some(y);
            shape.data.width = Some(w);
            shape.data.height = Some(h);
            shape.data.rx = Some(w / 2.0);
            shape.data.ry = Some((MIN_SIZE / 3.0).max(w / 4.0));
        }
        ShapeType::Text => {
            let (cur_x, cur_y, cur_w, cur_h) = {
                let d = &shape.data;
                (d.x(), d.y(), d.width(), d.height())
            };
            let (mut x, mut y, mut w, mut h) = (cur_x, cur_y, cur_w, cur_h);
            if handle.has_east() {
                w = (cur_w + dx).max(30.0);
            }
            if handle.has_south() {
                h = (cur_h + dy).max(20.0);
            }
            if handle.has_west() {
                x = cur_x + dx;
                w = (cur_w - dx).max(30.0);
            }
            if handle.has_north() {
                y = cur_y + dy;
                h = (cur_h - dy).max(20.0);
            }
            shape.data.x = Some(x);
            shape.data.y = Some(y);
            shape.data.width = Some(w);
            shape.data.height = Some(h);
        }
        ShapeType::Line | ShapeType::Connector => match handle {
            ResizeHandle::Start => {
                shape.data.x1 = Some(shape.data.x1.unwrap_or(0.0) + dx);
                shape.data.y1 = Some(shape.data.y1.unwrap_or(0.0) + dy);
            }
            ResizeHandle::End => {
                shape.data.x2 = Some(shape.data.x2.unwrap_or(0.0) + dx);
                shape.data.y2 = Some(shape.data.y2.unwrap_or(0.0) + dy);
            }
            _ => {}
        },
        ShapeType::Polyline => {
            let mut pts = shape.data.point_list();
            if pts.is_empty() {
                return;
            }
            match handle {
                ResizeHandle::Start => {
                    pts[0] = pts[0].translated(dx, dy);
                }
                ResizeHandle::End => {
                    let last = pts.len() - 1;
                    pts[last] = pts[last].translated(dx, dy);
                }
                _ => return,
            }
            shape.data.points = Some(format_points(&pts));
        }
    }
    sync_geometry(shape);
}

/// Set the rounded-rect corner radius directly (corner-handle drag).
pub fn set_corner_radius(shape: &mut Shape, radius: f64) {
    if shape.shape_type != ShapeType::RoundedRect {
        return;
    }
    let max = shape.data.width().min(shape.data.height()) / 2.0;
    shape.data.corner_radius = Some(radius.clamp(0.0, max.max(0.0)));
    sync_geometry(shape);
}

/// Deep copy with a fresh id, offset on both axes, connections cleared.
pub fn clone_shape(shape: &Shape, new_id: String, offset: f64) -> Shape {
    let mut cloned = shape.clone();
    cloned.id = new_id.clone();
    cloned.element.set_attr("id", new_id);
    cloned.connections =
        if shape.shape_type.is_edge() { vec![None, None] } else { Vec::new() };
    cloned.data.start_port_id = None;
    cloned.data.end_port_id = None;
    translate_shape(&mut cloned, offset, offset);
    cloned
}

fn box_ports(shape_id: &str, x: f64, y: f64, w: f64, h: f64) -> Vec<Port> {
    vec![
        Port {
            id: format!("{shape_id}-port-top"),
            point: Point::new(x + w / 2.0, y),
            position: PortPosition::Top,
        },
        Port {
            id: format!("{shape_id}-port-right"),
            point: Point::new(x + w, y + h / 2.0),
            position: PortPosition::Right,
        },
        Port {
            id: format!("{shape_id}-port-bottom"),
            point: Point::new(x + w / 2.0, y + h),
            position: PortPosition::Bottom,
        },
        Port {
            id: format!("{shape_id}-port-left"),
            point: Point::new(x, y + h / 2.0),
            position: PortPosition::Left,
        },
    ]
}

fn triangle_ports(shape: &Shape) -> Vec<Port> {
    let pts = shape.data.point_list();
    if pts.len() < 3 {
        return Vec::new();
    }
    let n = pts.len() as f64;
    let centroid = Point::new(
        pts.iter().map(|p| p.x).sum::<f64>() / n,
        pts.iter().map(|p| p.y).sum::<f64>() / n,
    );
    let edges = [(pts[0], pts[1]), (pts[1], pts[2]), (pts[2], pts[0])];
    let directions = [
        (PortPosition::Top, (0.0, -1.0)),
        (PortPosition::Right, (1.0, 0.0)),
        (PortPosition::Bottom, (0.0, 1.0)),
        (PortPosition::Left, (-1.0, 0.0)),
    ];
    let cross = |ax: f64, ay: f64, bx: f64, by: f64| ax * by - ay * bx;
    directions
        .iter()
        .map(|(position, (dir_x, dir_y))| {
            // Nearest intersection of the outward ray with the outline.
            let mut best: Option<(Point, f64)> = None;
            for (a, b) in &edges {
                let seg_x = b.x - a.x;
                let seg_y = b.y - a.y;
                let denom = cross(*dir_x, *dir_y, seg_x, seg_y);
                if denom.abs() < 1e-6 {
                    continue;
                }
                let diff_x = a.x - centroid.x;
                let diff_y = a.y - centroid.y;
                let t = cross(diff_x, diff_y, seg_x, seg_y) / denom;
                let u = cross(diff_x, diff_y, *dir_x, *dir_y) / denom;
                if t >= 0.0 && (0.0..=1.0).contains(&u) {
                    let hit = Point::new(centroid.x + t * dir_x, centroid.y + t * dir_y);
                    if best.is_none() || t < best.as_ref().map(|(_, bt)| *bt).unwrap_or(f64::MAX) {
                        best = Some((hit, t));
                    }
                }
            }
            let point = best.map(|(p, _)| p).unwrap_or(centroid);
            Port {
                id: format!("{}-port-{}", shape.id, position.tag()),
                point,
                position: *position,
            }
        })
        .collect()
}

/// Rotate/scale/flip ports about the shape center, for shapes that carry a
/// visual transform. Only images track this today.
fn transform_ports(shape: &Shape, ports: Vec<Port>) -> Vec<Port> {
    let d = &shape.data;
    let rotation = d.rotation.unwrap_or(0.0);
    let scale = d.scale.unwrap_or(1.0);
    let flip_x = d.flip_x.unwrap_or(false);
    let flip_y = d.flip_y.unwrap_or(false);
    if rotation == 0.0 && scale == 1.0 && !flip_x && !flip_y {
        return ports;
    }
    let cx = d.x() + d.width() / 2.0;
    let cy = d.y() + d.height() / 2.0;
    let rad = rotation.to_radians();
    let (sin, cos) = rad.sin_cos();
    let sx = scale * if flip_x { -1.0 } else { 1.0 };
    let sy = scale * if flip_y { -1.0 } else { 1.0 };
    ports
        .into_iter()
        .map(|mut port| {
            let dx = (port.point.x - cx) * sx;
            let dy = (port.point.y - cy) * sy;
            port.point = Point::new(cx + dx * cos - dy * sin, cy + dx * sin + dy * cos);
            port
        })
        .collect()
}

/// Logical connection ports for a shape. Edge shapes and text have none.
pub fn shape_ports(shape: &Shape) -> Vec<Port> {
    let d = &shape.data;
    match shape.shape_type {
        ShapeType::Rect
        | ShapeType::RoundedRect
        | ShapeType::Cloud
        | ShapeType::Cylinder
        | ShapeType::Diamond
        | ShapeType::Trapezoid
        | ShapeType::Hexagon
        | ShapeType::Pentagon
        | ShapeType::Speech
        | ShapeType::Wave => box_ports(&shape.id, d.x(), d.y(), d.width(), d.height()),
        ShapeType::Image => {
            let ports = box_ports(&shape.id, d.x(), d.y(), d.width(), d.height());
            transform_ports(shape, ports)
        }
        ShapeType::Circle => {
            let (x, y) = (d.x(), d.y());
            let r = d.radius.unwrap_or(0.0);
            vec![
                Port {
                    id: format!("{}-port-top", shape.id),
                    point: Point::new(x, y - r),
                    position: PortPosition::Top,
                },
                Port {
                    id: format!("{}-port-right", shape.id),
                    point: Point::new(x + r, y),
                    position: PortPosition::Right,
                },
                Port {
                    id: format!("{}-port-bottom", shape.id),
                    point: Point::new(x, y + r),
                    position: PortPosition::Bottom,
                },
                Port {
                    id: format!("{}-port-left", shape.id),
                    point: Point::new(x - r, y),
                    position: PortPosition::Left,
                },
            ]
        }
        ShapeType::Ellipse => {
            let (cx, cy) = (d.cx.unwrap_or(0.0), d.cy.unwrap_or(0.0));
            let (rx, ry) = (d.rx.unwrap_or(0.0), d.ry.unwrap_or(0.0));
            vec![
                Port {
                    id: format!("{}-port-top", shape.id),
                    point: Point::new(cx, cy - ry),
                    position: PortPosition::Top,
                },
                Port {
                    id: format!("{}-port-right", shape.id),
                    point: Point::new(cx + rx, cy),
                    position: PortPosition::Right,
                },
                Port {
                    id: format!("{}-port-bottom", shape.id),
                    point: Point::new(cx, cy + ry),
                    position: PortPosition::Bottom,
                },
                Port {
                    id: format!("{}-port-left", shape.id),
                    point: Point::new(cx - rx, cy),
                    position: PortPosition::Left,
                },
            ]
        }
        ShapeType::Triangle => triangle_ports(shape),
        ShapeType::Text | ShapeType::Line | ShapeType::Polyline | ShapeType::Connector => {
            Vec::new()
        }
    }
}

/// Extra handles beyond the corner grips. Rounded rects expose a radius
/// knob near the top-right corner.
pub fn corner_handles(shape: &Shape) -> Vec<CornerHandle> {
    if shape.shape_type != ShapeType::RoundedRect {
        return Vec::new();
    }
    let d = &shape.data;
    let offset = 12.0;
    vec![CornerHandle {
        id: format!("{}-corner-top", shape.id),
        point: Point::new(d.x() + d.width() - offset, d.y() + offset),
        cursor: "ew-resize",
    }]
}

/// Rebuild an element purely from a shape's type and data, for imports
/// where the stored markup is absent or unusable.
pub fn rebuild_element(shape_type: ShapeType, id: &str, data: &ShapeData) -> Element {
    let element = base_element(shape_type, id);
    let connections = if shape_type.is_edge() { vec![None, None] } else { Vec::new() };
    let mut shape = Shape {
        id: id.to_string(),
        shape_type,
        element,
        data: data.clone(),
        connections,
    };
    apply_base_style(&mut shape);
    sync_geometry(&mut shape);
    shape.element
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_at(x: f64, y: f64) -> Shape {
        create_shape(ShapeType::Rect, "shape-1".into(), Point::new(x, y))
    }

    #[test]
    fn rect_defaults() {
        let s = rect_at(100.0, 100.0);
        assert_eq!(s.data.width, Some(140.0));
        assert_eq!(s.data.height, Some(80.0));
        assert_eq!(s.element.attr("fill"), Some("transparent"));
        assert_eq!(s.element.attr("stroke-width"), Some("2"));
        let b = shape_bounds(&s);
        assert_eq!((b.min_x, b.max_x), (100.0, 240.0));
    }

    #[test]
    fn translate_is_exact() {
        let mut s = rect_at(10.0, 20.0);
        translate_shape(&mut s, -3.5, 7.25);
        assert_eq!(s.data.x, Some(6.5));
        assert_eq!(s.data.y, Some(27.25));
        assert_eq!(s.element.attr("x"), Some("6.5"));
    }

    #[test]
    fn resize_respects_floor() {
        let mut s = rect_at(0.0, 0.0);
        resize_shape(&mut s, ResizeHandle::SouthEast, -1000.0, -1000.0);
        assert_eq!(s.data.width, Some(MIN_SIZE));
        assert_eq!(s.data.height, Some(MIN_SIZE));
    }

    #[test]
    fn resize_nw_keeps_opposite_corner() {
        let mut s = rect_at(100.0, 100.0);
        resize_shape(&mut s, ResizeHandle::NorthWest, 10.0, 10.0);
        let b = shape_bounds(&s);
        assert_eq!(b.max_x, 240.0);
        assert_eq!(b.max_y, 180.0);
        assert_eq!(b.min_x, 110.0);
    }

    #[test]
    fn circle_resize_uses_average_delta() {
        let mut s = create_shape(ShapeType::Circle, "shape-2".into(), Point::new(0.0, 0.0));
        resize_shape(&mut s, ResizeHandle::SouthEast, 10.0, 20.0);
        assert_eq!(s.data.radius, Some(65.0));
        resize_shape(&mut s, ResizeHandle::SouthEast, -500.0, -500.0);
        assert_eq!(s.data.radius, Some(MIN_RADIUS));
    }

    #[test]
    fn image_resize_stays_square() {
        let mut s = create_shape(ShapeType::Image, "shape-3".into(), Point::new(0.0, 0.0));
        resize_shape(&mut s, ResizeHandle::SouthEast, 40.0, 10.0);
        assert_eq!(s.data.width, s.data.height);
        assert_eq!(s.data.width, Some(160.0));
    }

    #[test]
    fn path_family_outline_follows_box() {
        let mut s =
            create_shape(ShapeType::Diamond, "shape-4".into(), Point::new(80.0, 80.0));
        let pts = s.data.point_list();
        assert_eq!(pts.len(), 4);
        assert_eq!(pts[0], Point::new(150.0, 80.0));
        translate_shape(&mut s, 20.0, 0.0);
        assert_eq!(s.data.point_list()[0], Point::new(170.0, 80.0));
    }

    #[test]
    fn triangle_ports_sit_on_axes() {
        let s =
            create_shape(ShapeType::Triangle, "shape-5".into(), Point::new(160.0, 220.0));
        let ports = shape_ports(&s);
        assert_eq!(ports.len(), 4);
        let center = shape_center(&s);
        let top = ports.iter().find(|p| p.position == PortPosition::Top).unwrap();
        assert!((top.point.x - center.x).abs() < 1e-6);
        assert!(top.point.y < center.y);
    }

    #[test]
    fn ports_only_on_node_shapes() {
        let line = create_shape(ShapeType::Line, "shape-6".into(), Point::new(0.0, 0.0));
        let text = create_shape(ShapeType::Text, "shape-7".into(), Point::new(0.0, 0.0));
        assert!(shape_ports(&line).is_empty());
        assert!(shape_ports(&text).is_empty());
    }

    #[test]
    fn port_ids_follow_naming_scheme() {
        let s = rect_at(0.0, 0.0);
        let ids: Vec<_> = shape_ports(&s).into_iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            vec![
                "shape-1-port-top",
                "shape-1-port-right",
                "shape-1-port-bottom",
                "shape-1-port-left"
            ]
        );
    }

    #[test]
    fn clone_offsets_and_clears_connections() {
        let mut s = rect_at(50.0, 50.0);
        s.attach_connector("conn-1");
        let c = clone_shape(&s, "shape-8".into(), 20.0);
        assert_eq!(c.id, "shape-8");
        assert_eq!(c.data.x, Some(70.0));
        assert_eq!(c.data.y, Some(70.0));
        assert!(c.connections.is_empty());
        // Source untouched.
        assert_eq!(s.data.x, Some(50.0));
        assert_eq!(s.attached_connectors().count(), 1);
    }

    #[test]
    fn connector_upgrades_to_polyline() {
        let mut s =
            create_shape(ShapeType::Connector, "conn-1".into(), Point::new(150.0, 150.0));
        assert_eq!(s.element.tag(), "line");
        set_connector_points(
            &mut s,
            &[
                Point::new(0.0, 0.0),
                Point::new(50.0, 50.0),
                Point::new(100.0, 0.0),
            ],
        );
        assert_eq!(s.element.tag(), "polyline");
        assert_eq!(s.element.attr("x1"), None);
        assert_eq!(s.data.x1, Some(0.0));
        assert_eq!(s.data.x2, Some(100.0));
        assert_eq!(s.element.attr("points"), Some("0,0 50,50 100,0"));
    }

    #[test]
    fn corner_radius_clamps_to_half_min_side() {
        let mut s =
            create_shape(ShapeType::RoundedRect, "shape-9".into(), Point::new(0.0, 0.0));
        set_corner_radius(&mut s, 1000.0);
        assert_eq!(s.data.corner_radius, Some(40.0));
        set_corner_radius(&mut s, -5.0);
        assert_eq!(s.data.corner_radius, Some(0.0));
    }

    #[test]
    fn corner_handle_position() {
        let s = create_shape(
            ShapeType::RoundedRect,
            "shape-10".into(),
            Point::new(100.0, 100.0),
        );
        let handles = corner_handles(&s);
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].point, Point::new(228.0, 112.0));
        assert_eq!(handles[0].cursor, "ew-resize");
    }

    #[test]
    fn rebuild_element_matches_created_element() {
        let s = rect_at(100.0, 100.0);
        let rebuilt = rebuild_element(ShapeType::Rect, &s.id, &s.data);
        assert_eq!(rebuilt, s.element);
    }

    #[test]
    fn shape_type_round_trips_through_names() {
        for t in [
            ShapeType::Rect,
            ShapeType::RoundedRect,
            ShapeType::Connector,
            ShapeType::Speech,
        ] {
            assert_eq!(ShapeType::parse(t.as_str()).unwrap(), t);
        }
        assert!(ShapeType::parse("blob").is_err());
    }
}
