//! Clipboard and duplication.
//!
//! Copy captures deep clones of the selection plus any edge whose both
//! endpoints are inside it. Duplication runs in two passes: nodes first,
//! building an old-to-new id map, then connectors, which are re-bound to
//! the mapped shapes with their ports re-resolved by name. Connectors with
//! at most one mapped endpoint fall back to plain offset copies.

use std::collections::HashMap;

use tracing::debug;

use crate::geometry::Point;
use crate::scene::Scene;
use crate::shapes::{
    clone_shape, connector_points, set_connector_points, shape_center, shape_ports, Shape,
    ShapeType,
};

/// Offset applied to duplicated geometry on both axes.
pub const DUPLICATE_OFFSET: f64 = 20.0;

#[derive(Debug, Default)]
pub struct Clipboard {
    buffer: Vec<Shape>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Snapshot `ids` (plus edges fully inside the set) into the buffer.
    /// Returns the number of captured shapes; an empty selection clears
    /// nothing and returns 0.
    pub fn capture(&mut self, scene: &Scene, ids: &[String]) -> usize {
        if ids.is_empty() {
            return 0;
        }
        self.buffer = snapshot_with_edges(scene, ids);
        debug!(count = self.buffer.len(), "captured clipboard");
        self.buffer.len()
    }

    /// Duplicate the buffer into the scene, then re-point the buffer at the
    /// new copies so repeated pastes keep stepping down-right.
    pub fn paste(
        &mut self,
        scene: &mut Scene,
        id_gen: &mut dyn FnMut() -> String,
    ) -> Vec<String> {
        if self.buffer.is_empty() {
            return Vec::new();
        }
        let source = self.buffer.clone();
        let new_ids = duplicate_shapes(scene, &source, id_gen);
        self.buffer = new_ids
            .iter()
            .filter_map(|id| scene.shape(id).cloned())
            .collect();
        new_ids
    }
}

/// Deep clones of `ids` in scene order, plus any line/connector not in the
/// set whose both endpoints are.
pub fn snapshot_with_edges(scene: &Scene, ids: &[String]) -> Vec<Shape> {
    let in_set = |id: &str| ids.iter().any(|i| i == id);
    scene
        .shapes()
        .iter()
        .filter(|shape| {
            if in_set(&shape.id) {
                return true;
            }
            if !shape.shape_type.is_edge() {
                return false;
            }
            match (shape.endpoint(0), shape.endpoint(1)) {
                (Some(a), Some(b)) => in_set(a) && in_set(b),
                _ => false,
            }
        })
        .cloned()
        .collect()
}

/// Re-resolve a stale port id against a freshly cloned shape: exact id,
/// then `-port-` suffix, then position tag, then the first port; shapes
/// without ports (and connectors bound by center) resolve to the center.
pub fn resolve_port_on(shape: &Shape, old_port_id: Option<&str>) -> (Option<String>, Point) {
    let ports = shape_ports(shape);
    let Some(old) = old_port_id else {
        return (None, shape_center(shape));
    };
    if let Some(port) = ports.iter().find(|p| p.id == old) {
        return (Some(port.id.clone()), port.point);
    }
    if let Some(suffix) = old.split("-port-").nth(1) {
        let wanted = format!("-port-{suffix}");
        if let Some(port) = ports.iter().find(|p| p.id.ends_with(&wanted)) {
            return (Some(port.id.clone()), port.point);
        }
        if let Some(port) = ports.iter().find(|p| p.position.tag() == suffix) {
            return (Some(port.id.clone()), port.point);
        }
    }
    match ports.first() {
        Some(port) => (Some(port.id.clone()), port.point),
        None => (None, shape_center(shape)),
    }
}

/// Two-pass duplication of `source` into the scene. Returns the new ids in
/// creation order.
pub fn duplicate_shapes(
    scene: &mut Scene,
    source: &[Shape],
    id_gen: &mut dyn FnMut() -> String,
) -> Vec<String> {
    let mut id_map: HashMap<String, String> = HashMap::new();
    let mut created = Vec::new();

    for shape in source.iter().filter(|s| s.shape_type != ShapeType::Connector) {
        let new_id = id_gen();
        let cloned = clone_shape(shape, new_id.clone(), DUPLICATE_OFFSET);
        id_map.insert(shape.id.clone(), new_id.clone());
        scene.push(cloned);
        created.push(new_id);
    }

    for shape in source.iter().filter(|s| s.shape_type == ShapeType::Connector) {
        let mapped_from = shape.endpoint(0).and_then(|id| id_map.get(id)).cloned();
        let mapped_to = shape.endpoint(1).and_then(|id| id_map.get(id)).cloned();
        let (Some(from_id), Some(to_id)) = (mapped_from, mapped_to) else {
            // Dangling connector: duplicate as plain geometry.
            let new_id = id_gen();
            let cloned = clone_shape(shape, new_id.clone(), DUPLICATE_OFFSET);
            scene.push(cloned);
            created.push(new_id);
            continue;
        };

        let new_id = id_gen();
        let (start_port, start_point) = match scene.shape(&from_id) {
            Some(s) => resolve_port_on(s, shape.data.start_port_id.as_deref()),
            None => continue,
        };
        let (end_port, end_point) = match scene.shape(&to_id) {
            Some(s) => resolve_port_on(s, shape.data.end_port_id.as_deref()),
            None => continue,
        };

        let old_pts = connector_points(shape);
        let delta_x = start_point.x - old_pts[0].x;
        let delta_y = start_point.y - old_pts[0].y;
        let mut pts: Vec<Point> = old_pts
            .iter()
            .map(|p| p.translated(delta_x, delta_y))
            .collect();
        pts[0] = start_point;
        let last = pts.len() - 1;
        pts[last] = end_point;

        let mut connector = shape.clone();
        connector.id = new_id.clone();
        connector.element.set_attr("id", new_id.clone());
        set_connector_points(&mut connector, &pts);
        connector.connections = vec![Some(from_id.clone()), Some(to_id.clone())];
        connector.data.start_port_id = start_port;
        connector.data.end_port_id = end_port;
        scene.push(connector);

        if let Some(s) = scene.shape_mut(&from_id) {
            s.attach_connector(&new_id);
        }
        if let Some(s) = scene.shape_mut(&to_id) {
            s.attach_connector(&new_id);
        }
        created.push(new_id);
    }

    created
}
