//! Document import and export.
//!
//! JSON is the lossless document format: one record per shape with its id,
//! type, data bag, connection slots and rendered markup. SVG export builds
//! a standalone document from the owned elements; raster export rasterizes
//! that document through resvg.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::editor::Editor;
use crate::element::Element;
use crate::error::EditorError;
use crate::geometry::{fmt_num, Bounds};
use crate::scene::Scene;
use crate::shapes::{rebuild_element, shape_bounds, Shape, ShapeData, ShapeType};
use crate::style::apply_transform;

const CANVAS_MIN_WIDTH: f64 = 800.0;
const CANVAS_MIN_HEIGHT: f64 = 600.0;
const EXPORT_MARGIN: f64 = 20.0;

#[derive(Debug, Serialize, Deserialize)]
struct ShapeRecord {
    id: String,
    #[serde(rename = "type")]
    shape_type: String,
    #[serde(default)]
    data: ShapeData,
    #[serde(default)]
    connections: Vec<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    element: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    shapes: Vec<ShapeRecord>,
}

/// Serialize a scene to the JSON document format.
pub fn export_json(scene: &Scene) -> Result<String, EditorError> {
    let doc = Document {
        shapes: scene
            .shapes()
            .iter()
            .map(|s| ShapeRecord {
                id: s.id.clone(),
                shape_type: s.shape_type.as_str().to_string(),
                data: s.data.clone(),
                connections: s.connections.clone(),
                element: Some(s.element.to_markup()),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&doc).map_err(|e| EditorError::Export(e.to_string()))
}

/// Parse a JSON document into shapes. Any bad record aborts the whole
/// import; a half-loaded document is worse than none.
pub fn parse_document(json: &str) -> Result<Vec<Shape>, EditorError> {
    let doc: Document =
        serde_json::from_str(json).map_err(|e| EditorError::Import(e.to_string()))?;
    let mut shapes = Vec::with_capacity(doc.shapes.len());
    for record in doc.shapes {
        let shape_type = ShapeType::parse(&record.shape_type)
            .map_err(|e| EditorError::Import(e.to_string()))?;
        let element = build_element(shape_type, &record);
        let mut shape = Shape {
            id: record.id,
            shape_type,
            element,
            data: record.data,
            connections: record.connections,
        };
        restore_presentation(&mut shape);
        shapes.push(shape);
    }
    Ok(shapes)
}

/// Elements are rebuilt from the data bag so imports do not trust stored
/// markup; the markup is only a fallback for records with no data at all.
fn build_element(shape_type: ShapeType, record: &ShapeRecord) -> Element {
    if record.data == ShapeData::default() {
        if let Some(markup) = record.element.as_deref() {
            if let Ok(el) = Element::from_markup(markup) {
                return el;
            }
        }
    }
    rebuild_element(shape_type, &record.id, &record.data)
}

fn restore_presentation(shape: &mut Shape) {
    if let Some(opacity) = shape.data.opacity {
        shape.element.set_num("opacity", opacity);
    }
    if let Some(mode) = shape.data.arrow_mode {
        crate::style::set_arrow_mode(shape, mode);
    }
    apply_transform(shape);
}

fn canvas_bounds(scene: &Scene) -> Bounds {
    let mut width = CANVAS_MIN_WIDTH;
    let mut height = CANVAS_MIN_HEIGHT;
    for shape in scene.shapes() {
        let b = shape_bounds(shape);
        width = width.max(b.max_x + EXPORT_MARGIN);
        height = height.max(b.max_y + EXPORT_MARGIN);
    }
    Bounds::new(0.0, 0.0, width, height)
}

fn arrow_markers() -> String {
    concat!(
        "<defs>",
        "<marker id=\"arrow-end\" markerWidth=\"10\" markerHeight=\"10\" ",
        "refX=\"5\" refY=\"3\" orient=\"auto\" markerUnits=\"strokeWidth\">",
        "<path d=\"M 0 0 L 6 3 L 0 6 Z\" fill=\"#6b7280\"/></marker>",
        "<marker id=\"arrow-start\" markerWidth=\"10\" markerHeight=\"10\" ",
        "refX=\"5\" refY=\"3\" orient=\"auto-start-reverse\" markerUnits=\"strokeWidth\">",
        "<path d=\"M 0 0 L 6 3 L 0 6 Z\" fill=\"#6b7280\"/></marker>",
        "</defs>"
    )
    .to_string()
}

/// Build a standalone SVG document from the scene, shapes in render order.
pub fn export_svg(scene: &Scene) -> String {
    let bounds = canvas_bounds(scene);
    let (w, h) = (fmt_num(bounds.width()), fmt_num(bounds.height()));
    let mut out = String::new();
    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
         viewBox=\"0 0 {w} {h}\">"
    ));
    out.push_str(&arrow_markers());
    out.push_str(&format!(
        "<rect width=\"{w}\" height=\"{h}\" fill=\"#ffffff\"/>"
    ));
    for shape in scene.shapes() {
        out.push_str(&shape.element.to_markup());
    }
    out.push_str("</svg>");
    out
}

fn rasterize(scene: &Scene) -> Result<tiny_skia::Pixmap, EditorError> {
    let svg = export_svg(scene);
    let tree = usvg::Tree::from_str(&svg, &usvg::Options::default())
        .map_err(|e| EditorError::Export(e.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| EditorError::Export("zero-sized canvas".into()))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Rasterize to PNG bytes.
pub fn export_png(scene: &Scene) -> Result<Vec<u8>, EditorError> {
    let pixmap = rasterize(scene)?;
    pixmap
        .encode_png()
        .map_err(|e| EditorError::Export(e.to_string()))
}

/// Rasterize to JPEG bytes, composited over white.
pub fn export_jpeg(scene: &Scene, quality: u8) -> Result<Vec<u8>, EditorError> {
    let pixmap = rasterize(scene)?;
    let (w, h) = (pixmap.width(), pixmap.height());
    let mut rgb = image::RgbImage::new(w, h);
    for (i, px) in pixmap.pixels().iter().enumerate() {
        let c = px.demultiply();
        let a = c.alpha() as u32;
        let over_white = |v: u8| ((v as u32 * a + 255 * (255 - a)) / 255) as u8;
        let x = (i as u32) % w;
        let y = (i as u32) / w;
        rgb.put_pixel(
            x,
            y,
            image::Rgb([over_white(c.red()), over_white(c.green()), over_white(c.blue())]),
        );
    }
    let mut buf = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    image::DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(encoder)
        .map_err(|e| EditorError::Export(e.to_string()))?;
    Ok(buf)
}

impl Editor {
    pub fn export_json(&self) -> Result<String, EditorError> {
        export_json(self.scene())
    }

    /// Replace the document with the parsed JSON. Selection clears and the
    /// history collapses to a single entry so undo cannot cross the
    /// import. Failures park on the error channel and load nothing.
    pub fn import_json(&mut self, json: &str) -> usize {
        match parse_document(json) {
            Ok(shapes) => {
                let count = shapes.len();
                self.scene_mut().replace_all(shapes);
                self.scene_mut().clear_selection();
                self.reset_history();
                info!(count, "imported document");
                count
            }
            Err(err) => {
                self.fail(err);
                0
            }
        }
    }

    pub fn export_svg(&self) -> String {
        export_svg(self.scene())
    }

    pub fn export_png(&self) -> Result<Vec<u8>, EditorError> {
        export_png(self.scene())
    }

    pub fn export_jpeg(&self, quality: u8) -> Result<Vec<u8>, EditorError> {
        export_jpeg(self.scene(), quality)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = self.export_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "saved document");
        Ok(())
    }

    pub fn load_json(&mut self, path: impl AsRef<Path>) -> anyhow::Result<usize> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let count = self.import_json(&json);
        if let Some(err) = self.take_error() {
            return Err(anyhow::Error::new(err)
                .context(format!("failed to load {}", path.display())));
        }
        Ok(count)
    }

    pub fn save_svg(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.export_svg())
            .with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.export_png()?)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn save_jpeg(&self, path: impl AsRef<Path>, quality: u8) -> anyhow::Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.export_jpeg(quality)?)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}
