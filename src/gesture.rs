//! Pointer gesture state machine.
//!
//! One controller tracks the live gesture between pointer-down and
//! pointer-up. Down dispatches against the scene in priority order: resize
//! grip, corner handle, endpoint handle, route vertex, port, shape body,
//! empty canvas. Every mutating gesture snapshots the scene on down so
//! escape can restore it, and reports on up whether the document changed
//! so the caller records exactly one history entry per gesture.

use tracing::debug;

use crate::connections::{
    bind_endpoint, connect_shapes, find_nearest_port, route_connector, reroute_attached,
    snap_vertex, PORT_HIT_RADIUS,
};
use crate::decorations::{
    connection_preview, grip_at, marquee_element, outline_bounds, port_highlight,
    CORNER_HANDLE_SIZE, ENDPOINT_HANDLE_RADIUS, VERTEX_HANDLE_RADIUS,
};
use crate::element::Element;
use crate::geometry::{Bounds, Point};
use crate::scene::Scene;
use crate::shapes::{
    connector_points, corner_handles, resize_shape, set_connector_points, set_corner_radius,
    shape_center, translate_shape, ResizeHandle, Shape, ShapeType,
};

/// Slack added around small handles so they are not pixel-perfect targets.
const HANDLE_SLACK: f64 = 2.0;
/// Dash pattern applied to an edge while one of its endpoints is dragged.
const ENDPOINT_DRAG_DASH: &str = "6,4";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub point: Point,
    pub ctrl: bool,
}

impl PointerInput {
    pub fn at(point: Point) -> Self {
        Self { point, ctrl: false }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Idle,
    /// Translating the whole selection.
    Dragging { ids: Vec<String>, last: Point, moved: bool },
    /// Corner grip resize of one shape.
    Resizing { id: String, handle: ResizeHandle, last: Point, moved: bool },
    /// Rounded-rect radius knob; only horizontal movement counts.
    CornerDragging { id: String, last_x: f64, moved: bool },
    /// Dragging an interior route vertex.
    VertexDragging {
        id: String,
        index: usize,
        origin: Point,
        start_pointer: Point,
        moved: bool,
    },
    /// Dragging an edge endpoint, possibly rebinding it on drop.
    EndpointDragging { id: String, slot: usize, prior_dash: Option<String>, moved: bool },
    /// Rubber-band connection from a port or shape body.
    Connecting { from_id: String, from_port: Option<String>, from_point: Point, current: Point },
    /// Marquee selection.
    BoxSelecting { origin: Point, current: Point },
}

#[derive(Debug, Default)]
pub struct GestureController {
    gesture: Gesture,
    restore: Option<(Vec<Shape>, Vec<String>)>,
    highlight: Option<(String, Point)>,
}

impl Default for Gesture {
    fn default() -> Self {
        Gesture::Idle
    }
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, Gesture::Idle)
    }

    /// Port currently highlighted as a drop target.
    pub fn highlighted_port(&self) -> Option<&str> {
        self.highlight.as_ref().map(|(id, _)| id.as_str())
    }

    /// Transient overlay elements for the live gesture.
    pub fn overlay(&self) -> Vec<Element> {
        let mut out = Vec::new();
        match &self.gesture {
            Gesture::Connecting { from_point, current, .. } => {
                out.push(connection_preview(*from_point, *current));
            }
            Gesture::BoxSelecting { origin, current } => {
                out.push(marquee_element(&Bounds::from_corners(*origin, *current)));
            }
            _ => {}
        }
        if let Some((_, point)) = &self.highlight {
            out.push(port_highlight(*point));
        }
        out
    }

    /// Begin a connection gesture programmatically from a shape's port.
    pub fn start_connection(&mut self, scene: &Scene, shape_id: &str, port_id: Option<String>) {
        let Some(shape) = scene.shape(shape_id) else {
            return;
        };
        let from_point = port_id
            .as_deref()
            .and_then(|pid| {
                crate::shapes::shape_ports(shape)
                    .into_iter()
                    .find(|p| p.id == pid)
                    .map(|p| p.point)
            })
            .unwrap_or_else(|| shape_center(shape));
        self.gesture = Gesture::Connecting {
            from_id: shape_id.to_string(),
            from_port: port_id,
            from_point,
            current: from_point,
        };
    }

    pub fn pointer_down(&mut self, scene: &mut Scene, input: PointerInput) {
        self.highlight = None;
        let point = input.point;

        if let Some((id, handle)) = self.hit_grip(scene, point) {
            self.snapshot(scene);
            self.gesture = Gesture::Resizing { id, handle, last: point, moved: false };
            return;
        }
        if let Some(id) = self.hit_corner_handle(scene, point) {
            self.snapshot(scene);
            self.gesture = Gesture::CornerDragging { id, last_x: point.x, moved: false };
            return;
        }
        if let Some((id, slot)) = self.hit_endpoint(scene, point) {
            self.snapshot(scene);
            let prior_dash = self.apply_drag_dash(scene, &id);
            self.gesture = Gesture::EndpointDragging { id, slot, prior_dash, moved: false };
            return;
        }
        if let Some((id, index, origin)) = self.hit_vertex(scene, point) {
            self.snapshot(scene);
            self.gesture = Gesture::VertexDragging {
                id,
                index,
                origin,
                start_pointer: point,
                moved: false,
            };
            return;
        }
        if let Some((shape_id, port)) = find_nearest_port(scene, point, PORT_HIT_RADIUS, None) {
            self.gesture = Gesture::Connecting {
                from_id: shape_id,
                from_port: Some(port.id),
                from_point: port.point,
                current: point,
            };
            return;
        }
        if let Some(shape) = scene.shape_at(point) {
            let id = shape.id.clone();
            let group = shape.data.group_id.clone();
            let edge_pinned = shape.shape_type.is_edge() && shape.has_bound_endpoint();
            if input.ctrl {
                scene.toggle_selection(&id);
                self.gesture = Gesture::Idle;
                return;
            }
            if !scene.is_selected(&id) {
                match &group {
                    Some(gid) => scene.set_selection(scene.group_members(gid)),
                    None => scene.select_only(&id),
                }
            } else if let Some(gid) = &group {
                let members = scene.group_members(gid);
                if scene.selection_count() > members.len() {
                    // A wider selection narrows to the clicked shape's group.
                    scene.set_selection(members);
                } else {
                    // Re-clicking a member of a selected group isolates it.
                    scene.select_only(&id);
                }
            }
            if edge_pinned {
                // A bound edge only moves through its endpoints.
                self.gesture = Gesture::Idle;
                return;
            }
            self.snapshot(scene);
            self.gesture = Gesture::Dragging {
                ids: scene.selected_vec(),
                last: point,
                moved: false,
            };
            return;
        }
        if !input.ctrl {
            scene.clear_selection();
        }
        self.gesture = Gesture::BoxSelecting { origin: point, current: point };
    }

    pub fn pointer_move(&mut self, scene: &mut Scene, point: Point) {
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Dragging { ids, last, moved } => {
                let dx = point.x - last.x;
                let dy = point.y - last.y;
                if dx == 0.0 && dy == 0.0 {
                    return;
                }
                *last = point;
                *moved = true;
                let ids = ids.clone();
                for id in &ids {
                    drag_translate(scene, id, dx, dy);
                }
            }
            Gesture::Resizing { id, handle, last, moved } => {
                let dx = point.x - last.x;
                let dy = point.y - last.y;
                *last = point;
                *moved = true;
                let id = id.clone();
                let handle = *handle;
                if let Some(shape) = scene.shape_mut(&id) {
                    resize_shape(shape, handle, dx, dy);
                }
                reroute_attached(scene, &id);
            }
            Gesture::CornerDragging { id, last_x, moved } => {
                let dx = point.x - *last_x;
                *last_x = point.x;
                *moved = true;
                let id = id.clone();
                if let Some(shape) = scene.shape_mut(&id) {
                    let current = shape.data.corner_radius.unwrap_or(0.0);
                    set_corner_radius(shape, current + dx);
                }
            }
            Gesture::VertexDragging { id, index, origin, start_pointer, moved } => {
                *moved = true;
                let id = id.clone();
                let index = *index;
                // Cumulative delta from the down point avoids snap feedback.
                let candidate = origin.translated(
                    point.x - start_pointer.x,
                    point.y - start_pointer.y,
                );
                let pts = match scene.shape(&id) {
                    Some(s) => connector_points(s),
                    None => return,
                };
                let prev = index.checked_sub(1).and_then(|i| pts.get(i)).copied();
                let next = pts.get(index + 1).copied();
                let snapped = snap_vertex(scene, candidate, &id, prev, next);
                if let Some(shape) = scene.shape_mut(&id) {
                    let mut pts = connector_points(shape);
                    if index < pts.len() {
                        pts[index] = snapped;
                        set_connector_points(shape, &pts);
                    }
                }
            }
            Gesture::EndpointDragging { id, slot, moved, .. } => {
                *moved = true;
                let id = id.clone();
                let slot = *slot;
                if let Some(shape) = scene.shape_mut(&id) {
                    let mut pts = connector_points(shape);
                    if pts.is_empty() {
                        return;
                    }
                    let idx = if slot == 0 { 0 } else { pts.len() - 1 };
                    pts[idx] = point;
                    set_connector_points(shape, &pts);
                }
                self.highlight = find_nearest_port(scene, point, PORT_HIT_RADIUS, Some(&id))
                    .map(|(_, port)| (port.id, port.point));
            }
            Gesture::Connecting { from_id, current, .. } => {
                *current = point;
                let from_id = from_id.clone();
                self.highlight = find_nearest_port(scene, point, PORT_HIT_RADIUS, Some(&from_id))
                    .map(|(_, port)| (port.id, port.point));
            }
            Gesture::BoxSelecting { current, .. } => {
                *current = point;
            }
        }
    }

    /// Finish the gesture. Returns true when the document changed and the
    /// caller should record a history entry.
    pub fn pointer_up(
        &mut self,
        scene: &mut Scene,
        point: Point,
        id_gen: &mut dyn FnMut() -> String,
    ) -> bool {
        let gesture = std::mem::take(&mut self.gesture);
        let highlight = self.highlight.take();
        self.restore = None;
        match gesture {
            Gesture::Idle => false,
            Gesture::Dragging { moved, .. } => moved,
            Gesture::Resizing { moved, .. } => moved,
            Gesture::CornerDragging { moved, .. } => moved,
            Gesture::VertexDragging { moved, .. } => moved,
            Gesture::EndpointDragging { id, slot, prior_dash, moved } => {
                self.finish_endpoint(scene, &id, slot, point, highlight, prior_dash);
                moved
            }
            Gesture::Connecting { from_id, from_port, .. } => {
                self.finish_connection(scene, &from_id, from_port, point, highlight, id_gen)
            }
            Gesture::BoxSelecting { origin, current } => {
                let rect = Bounds::from_corners(origin, current);
                scene.set_selection(scene.contained_in(&rect));
                false
            }
        }
    }

    /// Abort the gesture, restoring the scene as it was at pointer-down.
    pub fn cancel(&mut self, scene: &mut Scene) {
        if let Some((shapes, selected)) = self.restore.take() {
            scene.replace_all(shapes);
            scene.set_selection(selected);
        }
        self.gesture = Gesture::Idle;
        self.highlight = None;
    }

    fn snapshot(&mut self, scene: &Scene) {
        self.restore = Some((scene.shapes().to_vec(), scene.selected_vec()));
    }

    fn hit_grip(&self, scene: &Scene, point: Point) -> Option<(String, ResizeHandle)> {
        for shape in scene.shapes().iter().rev() {
            if !scene.is_selected(&shape.id) || shape.shape_type.is_edge() {
                continue;
            }
            if let Some(handle) = grip_at(&outline_bounds(shape), point) {
                return Some((shape.id.clone(), handle));
            }
        }
        None
    }

    fn hit_corner_handle(&self, scene: &Scene, point: Point) -> Option<String> {
        let reach = CORNER_HANDLE_SIZE / 2.0 + HANDLE_SLACK + 1.0;
        for shape in scene.shapes().iter().rev() {
            if !scene.is_selected(&shape.id) {
                continue;
            }
            for handle in corner_handles(shape) {
                if point.distance_to(handle.point) <= reach {
                    return Some(shape.id.clone());
                }
            }
        }
        None
    }

    fn hit_endpoint(&self, scene: &Scene, point: Point) -> Option<(String, usize)> {
        let reach = ENDPOINT_HANDLE_RADIUS + HANDLE_SLACK;
        for shape in scene.shapes().iter().rev() {
            if !scene.is_selected(&shape.id) || !shape.shape_type.is_edge() {
                continue;
            }
            let pts = connector_points(shape);
            if pts.is_empty() {
                continue;
            }
            if point.distance_to(pts[0]) <= reach {
                return Some((shape.id.clone(), 0));
            }
            if point.distance_to(pts[pts.len() - 1]) <= reach {
                return Some((shape.id.clone(), 1));
            }
        }
        None
    }

    fn hit_vertex(&self, scene: &Scene, point: Point) -> Option<(String, usize, Point)> {
        let reach = VERTEX_HANDLE_RADIUS + HANDLE_SLACK;
        for shape in scene.shapes().iter().rev() {
            if !scene.is_selected(&shape.id) || !shape.shape_type.is_edge() {
                continue;
            }
            let pts = connector_points(shape);
            for (i, p) in pts.iter().enumerate().skip(1).take(pts.len().saturating_sub(2)) {
                if point.distance_to(*p) <= reach {
                    return Some((shape.id.clone(), i, *p));
                }
            }
        }
        None
    }

    fn apply_drag_dash(&self, scene: &mut Scene, id: &str) -> Option<String> {
        let shape = scene.shape_mut(id)?;
        let prior = shape.element.attr("stroke-dasharray").map(str::to_string);
        shape.element.set_attr("stroke-dasharray", ENDPOINT_DRAG_DASH);
        Some(prior.unwrap_or_default()).filter(|s| !s.is_empty())
    }

    fn finish_endpoint(
        &mut self,
        scene: &mut Scene,
        id: &str,
        slot: usize,
        point: Point,
        highlight: Option<(String, Point)>,
        prior_dash: Option<String>,
    ) {
        // Drop target priority: highlighted port, any port in reach, shape
        // body (center binding), free endpoint.
        let port_hit = highlight.map(|(pid, _)| pid).or_else(|| {
            find_nearest_port(scene, point, PORT_HIT_RADIUS, Some(id)).map(|(_, p)| p.id)
        });
        if let Some(port_id) = port_hit {
            let target = port_id.split("-port-").next().map(str::to_string);
            bind_endpoint(scene, id, slot, target, Some(port_id));
        } else if let Some(target) = scene
            .shape_at(point)
            .filter(|s| s.id != id && !s.shape_type.is_edge())
            .map(|s| s.id.clone())
        {
            bind_endpoint(scene, id, slot, Some(target), None);
        } else {
            bind_endpoint(scene, id, slot, None, None);
        }
        route_connector(scene, id);
        if let Some(shape) = scene.shape_mut(id) {
            match prior_dash {
                Some(dash) => shape.element.set_attr("stroke-dasharray", dash),
                None => shape.element.remove_attr("stroke-dasharray"),
            }
        }
    }

    fn finish_connection(
        &mut self,
        scene: &mut Scene,
        from_id: &str,
        from_port: Option<String>,
        point: Point,
        highlight: Option<(String, Point)>,
        id_gen: &mut dyn FnMut() -> String,
    ) -> bool {
        let target = match highlight {
            Some((port_id, _)) => port_id
                .split("-port-")
                .next()
                .map(|sid| (sid.to_string(), Some(port_id.clone()))),
            None => scene
                .shape_at(point)
                .filter(|s| s.shape_type.has_ports())
                .map(|s| (s.id.clone(), None)),
        };
        let Some((to_id, to_port)) = target else {
            debug!(from = from_id, "connection dropped on empty canvas");
            return false;
        };
        connect_shapes(scene, id_gen(), from_id, &to_id, from_port, to_port).is_some()
    }
}

/// Translate one shape during a selection drag. Bound edges do not move as
/// bodies; a multi-point connector shifts only its interior route so the
/// bound ends stay put.
fn drag_translate(scene: &mut Scene, id: &str, dx: f64, dy: f64) {
    let Some(shape) = scene.shape(id) else {
        return;
    };
    if shape.shape_type.is_edge() && shape.has_bound_endpoint() {
        if shape.shape_type == ShapeType::Connector {
            let pts = connector_points(shape);
            if pts.len() > 2 {
                let mut pts = pts;
                let interior = pts.len() - 2;
                for p in pts.iter_mut().skip(1).take(interior) {
                    *p = p.translated(dx, dy);
                }
                if let Some(shape) = scene.shape_mut(id) {
                    set_connector_points(shape, &pts);
                }
            }
        }
        return;
    }
    if let Some(shape) = scene.shape_mut(id) {
        translate_shape(shape, dx, dy);
    }
    reroute_attached(scene, id);
}
