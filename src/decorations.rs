//! Selection and connection decorations.
//!
//! Decorations are derived from the scene on demand and drawn above it.
//! They are never part of the shape list, so they stay out of history,
//! the clipboard and every export.

use crate::element::Element;
use crate::geometry::{Bounds, Point};
use crate::scene::Scene;
use crate::shapes::{
    connector_points, corner_handles, shape_bounds, shape_ports, ResizeHandle, Shape, ShapeType,
};

pub const GRIP_SIZE: f64 = 12.0;
pub const CORNER_HANDLE_SIZE: f64 = 10.0;
pub const ENDPOINT_HANDLE_RADIUS: f64 = 6.0;
pub const VERTEX_HANDLE_RADIUS: f64 = 5.0;
pub const PORT_MARKER_RADIUS: f64 = 5.0;
pub const PORT_HIGHLIGHT_RADIUS: f64 = 7.0;
pub const TEXT_OUTLINE_PADDING: f64 = 4.0;

pub const SELECTION_COLOR: &str = "#38bdf8";
pub const CORNER_HANDLE_COLOR: &str = "#f59e0b";
pub const PORT_COLOR: &str = "#22c55e";
pub const PORT_HIGHLIGHT_COLOR: &str = "#fbbf24";

fn handle_tag(handle: ResizeHandle) -> &'static str {
    match handle {
        ResizeHandle::NorthWest => "nw",
        ResizeHandle::NorthEast => "ne",
        ResizeHandle::SouthWest => "sw",
        ResizeHandle::SouthEast => "se",
        ResizeHandle::Start => "start",
        ResizeHandle::End => "end",
    }
}

/// The four corner grips of a selection box, as hit rectangles centered on
/// the corners.
pub fn grip_rects(bounds: &Bounds) -> [(ResizeHandle, Bounds); 4] {
    let half = GRIP_SIZE / 2.0;
    let grip = |x: f64, y: f64| Bounds::new(x - half, y - half, x + half, y + half);
    [
        (ResizeHandle::NorthWest, grip(bounds.min_x, bounds.min_y)),
        (ResizeHandle::NorthEast, grip(bounds.max_x, bounds.min_y)),
        (ResizeHandle::SouthWest, grip(bounds.min_x, bounds.max_y)),
        (ResizeHandle::SouthEast, grip(bounds.max_x, bounds.max_y)),
    ]
}

/// Grip under the pointer, if any.
pub fn grip_at(bounds: &Bounds, point: Point) -> Option<ResizeHandle> {
    grip_rects(bounds)
        .into_iter()
        .find(|(_, rect)| rect.contains(point))
        .map(|(handle, _)| handle)
}

/// Outline box for a shape. Text gets breathing room around the glyphs.
pub fn outline_bounds(shape: &Shape) -> Bounds {
    let bounds = shape_bounds(shape);
    if shape.shape_type == ShapeType::Text {
        bounds.expanded(TEXT_OUTLINE_PADDING)
    } else {
        bounds
    }
}

fn outline_element(bounds: &Bounds) -> Element {
    let mut el = Element::new("rect");
    el.set_attr("class", "selection-outline");
    el.set_num("x", bounds.min_x);
    el.set_num("y", bounds.min_y);
    el.set_num("width", bounds.width());
    el.set_num("height", bounds.height());
    el.set_attr("fill", "none");
    el.set_attr("stroke", SELECTION_COLOR);
    el.set_attr("stroke-width", "2");
    el.set_attr("stroke-dasharray", "4,4");
    el.set_attr("pointer-events", "none");
    el
}

fn grip_element(handle: ResizeHandle, rect: &Bounds) -> Element {
    let mut el = Element::new("rect");
    el.set_attr("class", "resize-grip");
    el.set_attr("data-handle", handle_tag(handle));
    el.set_num("x", rect.min_x);
    el.set_num("y", rect.min_y);
    el.set_num("width", GRIP_SIZE);
    el.set_num("height", GRIP_SIZE);
    el.set_attr("fill", "#ffffff");
    el.set_attr("stroke", SELECTION_COLOR);
    el.set_attr("stroke-width", "1.5");
    el
}

fn circle_handle(class: &str, point: Point, radius: f64) -> Element {
    let mut el = Element::new("circle");
    el.set_attr("class", class);
    el.set_num("cx", point.x);
    el.set_num("cy", point.y);
    el.set_num("r", radius);
    el.set_attr("fill", "#ffffff");
    el.set_attr("stroke", SELECTION_COLOR);
    el.set_attr("stroke-width", "2");
    el
}

/// Decorations for one selected shape. Edge shapes get endpoint and vertex
/// handles instead of a box.
pub fn decorate_shape(shape: &Shape) -> Vec<Element> {
    if shape.shape_type.is_edge() {
        return decorate_edge(shape);
    }
    let bounds = outline_bounds(shape);
    let mut out = vec![outline_element(&bounds)];
    for (handle, rect) in grip_rects(&bounds) {
        out.push(grip_element(handle, &rect));
    }
    for handle in corner_handles(shape) {
        let half = CORNER_HANDLE_SIZE / 2.0;
        let mut el = Element::new("rect");
        el.set_attr("class", "corner-handle");
        el.set_attr("data-handle-id", handle.id.clone());
        el.set_num("x", handle.point.x - half);
        el.set_num("y", handle.point.y - half);
        el.set_num("width", CORNER_HANDLE_SIZE);
        el.set_num("height", CORNER_HANDLE_SIZE);
        el.set_attr("fill", CORNER_HANDLE_COLOR);
        el.set_attr(
            "transform",
            format!(
                "rotate(45 {} {})",
                crate::geometry::fmt_num(handle.point.x),
                crate::geometry::fmt_num(handle.point.y)
            ),
        );
        el.set_attr("cursor", handle.cursor);
        out.push(el);
    }
    out
}

fn decorate_edge(shape: &Shape) -> Vec<Element> {
    let pts = connector_points(shape);
    if pts.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let last = pts.len() - 1;
    for (i, p) in pts.iter().enumerate() {
        let mut el = if i == 0 || i == last {
            circle_handle("endpoint-handle", *p, ENDPOINT_HANDLE_RADIUS)
        } else {
            circle_handle("vertex-handle", *p, VERTEX_HANDLE_RADIUS)
        };
        el.set_num("data-index", i as f64);
        out.push(el);
    }
    out
}

/// Decorations for the whole selection. A single shape gets its full
/// handle set; a multi-selection collapses into one combined outline with
/// no per-shape grips.
pub fn scene_decorations(scene: &Scene) -> Vec<Element> {
    if scene.selection_count() > 1 {
        return match scene.selection_bounds() {
            Some(bounds) => vec![outline_element(&bounds)],
            None => Vec::new(),
        };
    }
    scene
        .shapes()
        .iter()
        .filter(|s| scene.is_selected(&s.id))
        .flat_map(decorate_shape)
        .collect()
}

/// Port markers shown while a connection gesture is live.
pub fn port_markers(shape: &Shape) -> Vec<Element> {
    shape_ports(shape)
        .into_iter()
        .map(|port| {
            let mut el = Element::new("circle");
            el.set_attr("class", "port-marker");
            el.set_attr("id", port.id);
            el.set_num("cx", port.point.x);
            el.set_num("cy", port.point.y);
            el.set_num("r", PORT_MARKER_RADIUS);
            el.set_attr("fill", PORT_COLOR);
            el.set_attr("stroke", "#ffffff");
            el.set_attr("stroke-width", "1.5");
            el
        })
        .collect()
}

/// Emphasis ring over the port a drop would bind to.
pub fn port_highlight(point: Point) -> Element {
    let mut el = Element::new("circle");
    el.set_attr("class", "port-highlight");
    el.set_num("cx", point.x);
    el.set_num("cy", point.y);
    el.set_num("r", PORT_HIGHLIGHT_RADIUS);
    el.set_attr("fill", "none");
    el.set_attr("stroke", PORT_HIGHLIGHT_COLOR);
    el.set_attr("stroke-width", "2");
    el
}

/// Dashed rubber-band line from a port to the pointer during connection.
pub fn connection_preview(from: Point, to: Point) -> Element {
    let mut el = Element::new("line");
    el.set_attr("class", "connection-preview");
    el.set_num("x1", from.x);
    el.set_num("y1", from.y);
    el.set_num("x2", to.x);
    el.set_num("y2", to.y);
    el.set_attr("stroke", SELECTION_COLOR);
    el.set_attr("stroke-width", "2");
    el.set_attr("stroke-dasharray", "5,5");
    el.set_attr("pointer-events", "none");
    el
}

/// Marquee rectangle during box selection.
pub fn marquee_element(rect: &Bounds) -> Element {
    let mut el = Element::new("rect");
    el.set_attr("class", "selection-marquee");
    el.set_num("x", rect.min_x);
    el.set_num("y", rect.min_y);
    el.set_num("width", rect.width());
    el.set_num("height", rect.height());
    el.set_attr("fill", "rgba(56, 189, 248, 0.1)");
    el.set_attr("stroke", SELECTION_COLOR);
    el.set_attr("stroke-width", "1");
    el.set_attr("stroke-dasharray", "4,4");
    el
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::connect_shapes;
    use crate::shapes::create_shape;

    #[test]
    fn box_selection_gets_outline_and_four_grips() {
        let shape = create_shape(ShapeType::Rect, "a".into(), Point::new(100.0, 100.0));
        let els = decorate_shape(&shape);
        assert_eq!(els.len(), 5);
        assert_eq!(els[0].attr("class"), Some("selection-outline"));
        assert_eq!(els[0].attr("stroke"), Some(SELECTION_COLOR));
        let grips: Vec<_> = els[1..]
            .iter()
            .filter_map(|e| e.attr("data-handle"))
            .collect();
        assert_eq!(grips, vec!["nw", "ne", "sw", "se"]);
        // Grip centered on the top-left corner.
        assert_eq!(els[1].attr("x"), Some("94"));
    }

    #[test]
    fn rounded_rect_adds_the_radius_knob() {
        let shape = create_shape(ShapeType::RoundedRect, "a".into(), Point::new(0.0, 0.0));
        let els = decorate_shape(&shape);
        let knob = els.iter().find(|e| e.attr("class") == Some("corner-handle")).unwrap();
        // Handle point is (x + w - 12, y + 12), square centered on it.
        assert_eq!(knob.attr("x"), Some("123"));
        assert_eq!(knob.attr("y"), Some("7"));
        assert_eq!(knob.attr("fill"), Some(CORNER_HANDLE_COLOR));
    }

    #[test]
    fn text_outline_is_padded() {
        let shape = create_shape(ShapeType::Text, "t".into(), Point::new(100.0, 100.0));
        let bounds = outline_bounds(&shape);
        assert_eq!(bounds.min_x, 100.0 - TEXT_OUTLINE_PADDING);
    }

    #[test]
    fn edges_get_endpoint_handles() {
        let mut scene = Scene::new();
        scene.push(create_shape(ShapeType::Rect, "a".into(), Point::new(0.0, 0.0)));
        scene.push(create_shape(ShapeType::Rect, "b".into(), Point::new(300.0, 0.0)));
        connect_shapes(&mut scene, "c".into(), "a", "b", None, None);
        let els = decorate_shape(scene.shape("c").unwrap());
        assert_eq!(els.len(), 2);
        assert!(els.iter().all(|e| e.attr("class") == Some("endpoint-handle")));
        assert_eq!(els[0].attr("r"), Some("6"));
    }

    #[test]
    fn multi_selection_collapses_to_one_outline() {
        let mut scene = Scene::new();
        scene.push(create_shape(ShapeType::Rect, "a".into(), Point::new(0.0, 0.0)));
        scene.push(create_shape(ShapeType::Rect, "b".into(), Point::new(300.0, 0.0)));
        scene.select_all();
        let els = scene_decorations(&scene);
        assert_eq!(els.len(), 1);
        assert_eq!(els[0].attr("class"), Some("selection-outline"));
        assert_eq!(els[0].attr("width"), Some("440"));
        scene.select_only("a");
        let els = scene_decorations(&scene);
        assert!(els.iter().any(|e| e.attr("class") == Some("resize-grip")));
    }

    #[test]
    fn port_markers_carry_port_ids() {
        let shape = create_shape(ShapeType::Rect, "a".into(), Point::new(0.0, 0.0));
        let markers = port_markers(&shape);
        assert_eq!(markers.len(), 4);
        assert_eq!(markers[0].attr("id"), Some("a-port-top"));
        assert_eq!(markers[0].attr("r"), Some("5"));
    }

    #[test]
    fn grip_hit_test_matches_the_rects() {
        let bounds = Bounds::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(grip_at(&bounds, Point::new(2.0, -3.0)), Some(ResizeHandle::NorthWest));
        assert_eq!(grip_at(&bounds, Point::new(98.0, 103.0)), Some(ResizeHandle::SouthEast));
        assert_eq!(grip_at(&bounds, Point::new(50.0, 50.0)), None);
    }
}
