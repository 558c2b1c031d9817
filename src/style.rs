//! Style and transform mutations.
//!
//! Every setter writes the data bag first, then mirrors the value into the
//! shape's element, same contract as the geometry kernel. Transforms
//! (rotation, uniform scale, flips) compose into a single `transform`
//! attribute about the shape center.

use crate::geometry::fmt_num;
use crate::shapes::{shape_center, ArrowMode, Shape, ShapeType};

/// Smallest allowed uniform scale.
pub const MIN_SCALE: f64 = 0.1;

/// Rebuild the `transform` attribute from the shape's rotation, scale and
/// flips. Identity transforms drop the attribute entirely.
pub fn apply_transform(shape: &mut Shape) {
    let d = &shape.data;
    let rotation = d.rotation.unwrap_or(0.0);
    let scale = d.scale.unwrap_or(1.0);
    let flip_x = d.flip_x.unwrap_or(false);
    let flip_y = d.flip_y.unwrap_or(false);
    if rotation == 0.0 && scale == 1.0 && !flip_x && !flip_y {
        shape.element.remove_attr("transform");
        return;
    }
    let center = shape_center(shape);
    let sx = scale * if flip_x { -1.0 } else { 1.0 };
    let sy = scale * if flip_y { -1.0 } else { 1.0 };
    let transform = format!(
        "translate({},{}) rotate({}) scale({},{}) translate({},{})",
        fmt_num(center.x),
        fmt_num(center.y),
        fmt_num(rotation),
        fmt_num(sx),
        fmt_num(sy),
        fmt_num(-center.x),
        fmt_num(-center.y),
    );
    shape.element.set_attr("transform", transform);
}

/// Set absolute rotation in degrees, normalized into [0, 360).
pub fn set_rotation(shape: &mut Shape, degrees: f64) {
    let normalized = degrees.rem_euclid(360.0);
    shape.data.rotation = if normalized == 0.0 { None } else { Some(normalized) };
    apply_transform(shape);
}

pub fn rotate_by(shape: &mut Shape, delta: f64) {
    let current = shape.data.rotation.unwrap_or(0.0);
    set_rotation(shape, current + delta);
}

pub fn flip_horizontal(shape: &mut Shape) {
    let flipped = !shape.data.flip_x.unwrap_or(false);
    shape.data.flip_x = if flipped { Some(true) } else { None };
    apply_transform(shape);
}

pub fn flip_vertical(shape: &mut Shape) {
    let flipped = !shape.data.flip_y.unwrap_or(false);
    shape.data.flip_y = if flipped { Some(true) } else { None };
    apply_transform(shape);
}

pub fn set_scale(shape: &mut Shape, scale: f64) {
    let clamped = scale.max(MIN_SCALE);
    shape.data.scale = if clamped == 1.0 { None } else { Some(clamped) };
    apply_transform(shape);
}

pub fn set_fill(shape: &mut Shape, fill: impl Into<String>) {
    let fill = fill.into();
    shape.data.fill = Some(fill.clone());
    match shape.shape_type {
        // Styling lives on the child paths.
        ShapeType::Cylinder => {
            if let Some(body) = shape.element.child_by_class_mut("cylinder-body") {
                body.set_attr("fill", fill.clone());
            }
            if let Some(rim) = shape.element.child_by_class_mut("cylinder-rim") {
                rim.set_attr("fill", fill);
            }
        }
        // Edge shapes always render unfilled.
        _ if shape.shape_type.is_edge() => {}
        _ => shape.element.set_attr("fill", fill),
    }
}

pub fn set_stroke(shape: &mut Shape, stroke: impl Into<String>) {
    let stroke = stroke.into();
    shape.data.stroke = Some(stroke.clone());
    match shape.shape_type {
        ShapeType::Cylinder => {
            if let Some(body) = shape.element.child_by_class_mut("cylinder-body") {
                body.set_attr("stroke", stroke.clone());
            }
            if let Some(rim) = shape.element.child_by_class_mut("cylinder-rim") {
                rim.set_attr("stroke", stroke);
            }
        }
        _ => shape.element.set_attr("stroke", stroke),
    }
}

pub fn set_stroke_width(shape: &mut Shape, width: f64) {
    let width = width.max(0.0);
    shape.data.stroke_width = Some(width);
    match shape.shape_type {
        ShapeType::Cylinder => {
            if let Some(body) = shape.element.child_by_class_mut("cylinder-body") {
                body.set_num("stroke-width", width);
            }
            if let Some(rim) = shape.element.child_by_class_mut("cylinder-rim") {
                rim.set_num("stroke-width", width);
            }
        }
        _ => shape.element.set_num("stroke-width", width),
    }
}

pub fn set_opacity(shape: &mut Shape, opacity: f64) {
    let clamped = opacity.clamp(0.0, 1.0);
    shape.data.opacity = Some(clamped);
    shape.element.set_num("opacity", clamped);
}

/// Arrowheads on edge shapes. Non-edges ignore the call.
pub fn set_arrow_mode(shape: &mut Shape, mode: ArrowMode) {
    if !shape.shape_type.is_edge() {
        return;
    }
    shape.data.arrow_mode = if mode == ArrowMode::None { None } else { Some(mode) };
    match mode {
        ArrowMode::None => {
            shape.element.remove_attr("marker-start");
            shape.element.remove_attr("marker-end");
        }
        ArrowMode::Start => {
            shape.element.set_attr("marker-start", "url(#arrow-start)");
            shape.element.remove_attr("marker-end");
        }
        ArrowMode::End => {
            shape.element.remove_attr("marker-start");
            shape.element.set_attr("marker-end", "url(#arrow-end)");
        }
        ArrowMode::Both => {
            shape.element.set_attr("marker-start", "url(#arrow-start)");
            shape.element.set_attr("marker-end", "url(#arrow-end)");
        }
    }
}
