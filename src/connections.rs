//! Connection engine: ports, endpoint resolution and connector routing.
//!
//! Connectors reference node shapes by id through their two endpoint slots;
//! node shapes keep the reverse list of attached connector ids. Every
//! routing pass resolves bound endpoints fresh from the scene, so moving or
//! resizing a node drags its connectors along.

use tracing::{debug, warn};

use crate::geometry::{point_to_segment_distance, project_point_to_segment, Point};
use crate::scene::Scene;
use crate::shapes::{
    connector_points, create_shape, set_connector_points, shape_center, shape_ports, Port,
    Shape, ShapeType,
};

/// Pointer distance within which a port captures a drop or snap.
pub const PORT_HIT_RADIUS: f64 = 14.0;
/// Distance within which a dragged vertex aligns to a neighbor's axis.
pub const AXIS_ALIGN_DISTANCE: f64 = 6.0;

/// Resolve a port id to its current position. The owning shape is found by
/// id prefix, then the port is looked up in its live port list.
pub fn port_position(scene: &Scene, port_id: &str) -> Option<Point> {
    let shape_id = port_id.split("-port-").next()?;
    let shape = scene.shape(shape_id)?;
    shape_ports(shape)
        .into_iter()
        .find(|p| p.id == port_id)
        .map(|p| p.point)
}

/// Nearest port to `point` across the scene, within `max_distance`.
/// `exclude` skips one shape (typically the drag source).
pub fn find_nearest_port(
    scene: &Scene,
    point: Point,
    max_distance: f64,
    exclude: Option<&str>,
) -> Option<(String, Port)> {
    let mut best: Option<(f64, String, Port)> = None;
    for shape in scene.shapes() {
        if !shape.shape_type.has_ports() {
            continue;
        }
        if exclude == Some(shape.id.as_str()) {
            continue;
        }
        for port in shape_ports(shape) {
            let dist = point.distance_to(port.point);
            if dist <= max_distance
                && best.as_ref().is_none_or(|(bd, _, _)| dist < *bd)
            {
                best = Some((dist, shape.id.clone(), port));
            }
        }
    }
    best.map(|(_, id, port)| (id, port))
}

/// Where a connector endpoint should sit right now: its port if one is
/// recorded and still resolvable, else the bound shape's center. Free
/// endpoints return `None` and keep their stored coordinate.
pub fn resolve_endpoint(scene: &Scene, connector: &Shape, slot: usize) -> Option<Point> {
    let target_id = connector.endpoint(slot)?;
    let port_id = if slot == 0 {
        connector.data.start_port_id.as_deref()
    } else {
        connector.data.end_port_id.as_deref()
    };
    if let Some(pid) = port_id {
        if let Some(point) = port_position(scene, pid) {
            return Some(point);
        }
    }
    scene.shape(target_id).map(shape_center)
}

/// Recompute a connector's first and last route points from its bindings,
/// preserving interior points.
pub fn route_connector(scene: &mut Scene, connector_id: &str) {
    let Some(connector) = scene.shape(connector_id) else {
        warn!(connector_id, "route on unknown connector");
        return;
    };
    if connector.shape_type != ShapeType::Connector
        && connector.shape_type != ShapeType::Line
    {
        return;
    }
    let start = resolve_endpoint(scene, connector, 0);
    let end = resolve_endpoint(scene, connector, 1);
    if start.is_none() && end.is_none() {
        return;
    }
    let mut pts = connector_points(connector);
    if let Some(p) = start {
        pts[0] = p;
    }
    if let Some(p) = end {
        let last = pts.len() - 1;
        pts[last] = p;
    }
    if let Some(connector) = scene.shape_mut(connector_id) {
        set_connector_points(connector, &pts);
    }
}

/// Re-route every connector attached to `shape_id`.
pub fn reroute_attached(scene: &mut Scene, shape_id: &str) {
    let attached: Vec<String> = match scene.shape(shape_id) {
        Some(shape) if !shape.shape_type.is_edge() => {
            shape.attached_connectors().map(str::to_string).collect()
        }
        _ => return,
    };
    for connector_id in attached {
        route_connector(scene, &connector_id);
    }
}

/// Rebind one endpoint slot, keeping both sides' bookkeeping consistent.
pub fn bind_endpoint(
    scene: &mut Scene,
    connector_id: &str,
    slot: usize,
    new_target: Option<String>,
    new_port: Option<String>,
) {
    let old_target = match scene.shape(connector_id) {
        Some(c) => c.endpoint(slot).map(str::to_string),
        None => {
            warn!(connector_id, "bind on unknown connector");
            return;
        }
    };
    if let Some(old_id) = &old_target {
        if old_target != new_target {
            if let Some(old_shape) = scene.shape_mut(old_id) {
                old_shape.detach_connector(connector_id);
            }
        }
    }
    if let Some(new_id) = &new_target {
        let connector_id = connector_id.to_string();
        if let Some(new_shape) = scene.shape_mut(new_id) {
            new_shape.attach_connector(&connector_id);
        }
    }
    if let Some(connector) = scene.shape_mut(connector_id) {
        connector.set_endpoint(slot, new_target);
        if slot == 0 {
            connector.data.start_port_id = new_port;
        } else {
            connector.data.end_port_id = new_port;
        }
    }
}

/// Create a connector between two shapes. Ports are optional; a missing
/// port binds to the shape center. Self-connections and unknown ids are
/// no-ops.
pub fn connect_shapes(
    scene: &mut Scene,
    connector_id: String,
    from_id: &str,
    to_id: &str,
    from_port: Option<String>,
    to_port: Option<String>,
) -> Option<String> {
    if from_id == to_id {
        return None;
    }
    let from = scene.shape(from_id)?;
    let to = scene.shape(to_id)?;

    let from_point = from_port
        .as_deref()
        .and_then(|pid| port_position(scene, pid))
        .unwrap_or_else(|| shape_center(from));
    let to_point = to_port
        .as_deref()
        .and_then(|pid| port_position(scene, pid))
        .unwrap_or_else(|| shape_center(to));

    let mut connector = create_shape(ShapeType::Connector, connector_id.clone(), from_point);
    set_connector_points(&mut connector, &[from_point, to_point]);
    connector.data.start_port_id = from_port;
    connector.data.end_port_id = to_port;
    connector.set_endpoint(0, Some(from_id.to_string()));
    connector.set_endpoint(1, Some(to_id.to_string()));
    scene.push(connector);

    let cid = connector_id.clone();
    if let Some(shape) = scene.shape_mut(from_id) {
        shape.attach_connector(&cid);
    }
    if let Some(shape) = scene.shape_mut(to_id) {
        shape.attach_connector(&cid);
    }
    debug!(connector = %connector_id, from = from_id, to = to_id, "connected shapes");
    Some(connector_id)
}

/// Insert a vertex on the segment of `connector_id` closest to `point`.
/// Returns the index of the new vertex.
pub fn insert_node_at(scene: &mut Scene, connector_id: &str, point: Point) -> Option<usize> {
    let connector = scene.shape(connector_id)?;
    if connector.shape_type != ShapeType::Connector {
        return None;
    }
    let pts = connector_points(connector);
    if pts.len() < 2 {
        return None;
    }
    let mut best_idx = 0;
    let mut best_dist = f64::MAX;
    let mut best_point = pts[0];
    for i in 0..pts.len() - 1 {
        let projected = project_point_to_segment(point, pts[i], pts[i + 1]);
        let dist = point.distance_to(projected);
        if dist < best_dist {
            best_dist = dist;
            best_idx = i;
            best_point = projected;
        }
    }
    let mut new_pts = pts;
    new_pts.insert(best_idx + 1, best_point);
    if let Some(connector) = scene.shape_mut(connector_id) {
        set_connector_points(connector, &new_pts);
    }
    Some(best_idx + 1)
}

/// Snap a dragged vertex: a nearby port wins, otherwise the vertex aligns
/// to its neighbors' axes within a small threshold.
pub fn snap_vertex(
    scene: &Scene,
    point: Point,
    exclude: &str,
    prev: Option<Point>,
    next: Option<Point>,
) -> Point {
    if let Some((_, port)) = find_nearest_port(scene, point, PORT_HIT_RADIUS, Some(exclude)) {
        return port.point;
    }
    let mut snapped = point;
    for neighbor in [prev, next].into_iter().flatten() {
        if (snapped.x - neighbor.x).abs() <= AXIS_ALIGN_DISTANCE {
            snapped.x = neighbor.x;
        }
        if (snapped.y - neighbor.y).abs() <= AXIS_ALIGN_DISTANCE {
            snapped.y = neighbor.y;
        }
    }
    snapped
}

/// Distance from a point to a connector's polyline route.
pub fn distance_to_connector(connector: &Shape, point: Point) -> f64 {
    let pts = connector_points(connector);
    let mut best = f64::MAX;
    for i in 0..pts.len().saturating_sub(1) {
        best = best.min(point_to_segment_distance(point, pts[i], pts[i + 1]));
    }
    best
}
