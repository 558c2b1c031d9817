//! Editor facade: one struct owning the scene, history, clipboard and the
//! gesture controller, exposing the operations a host UI calls.
//!
//! Mutating operations record exactly one history entry after they apply.
//! Operations on missing ids log and no-op; failures a caller must see are
//! parked on the error channel and also logged.

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clipboard::Clipboard;
use crate::connections::{connect_shapes, insert_node_at, reroute_attached};
use crate::element::Element;
use crate::error::EditorError;
use crate::gesture::{GestureController, PointerInput};
use crate::geometry::Point;
use crate::history::{HistoryManager, Snapshot};
use crate::measure::{HeuristicMeasurer, TextMeasurer};
use crate::scene::Scene;
use crate::shapes::{
    create_image, create_shape, default_origin, scatter_range, shape_bounds, sync_geometry,
    ImageOptions, Shape, ShapeType,
};

pub struct Editor {
    scene: Scene,
    history: HistoryManager,
    clipboard: Clipboard,
    gesture: GestureController,
    measurer: Box<dyn TextMeasurer>,
    scatter: bool,
    hovered: Option<String>,
    last_error: Option<EditorError>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        let mut editor = Self {
            scene: Scene::new(),
            history: HistoryManager::default(),
            clipboard: Clipboard::new(),
            gesture: GestureController::new(),
            measurer: Box::new(HeuristicMeasurer),
            scatter: true,
            hovered: None,
            last_error: None,
        };
        // Baseline entry so the first undo lands on the empty document.
        editor.record();
        editor
    }

    pub fn with_measurer(measurer: Box<dyn TextMeasurer>) -> Self {
        let mut editor = Self::new();
        editor.measurer = measurer;
        editor
    }

    /// Disable random placement scatter; new shapes land exactly on their
    /// type's default origin.
    pub fn set_scatter(&mut self, scatter: bool) {
        self.scatter = scatter;
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn gesture(&self) -> &GestureController {
        &self.gesture
    }

    /// Last stored failure, cleared on read.
    pub fn take_error(&mut self) -> Option<EditorError> {
        self.last_error.take()
    }

    pub(crate) fn fail(&mut self, err: EditorError) {
        error!(%err, "editor operation failed");
        self.last_error = Some(err);
    }

    fn next_id() -> String {
        format!("shape-{}", Uuid::new_v4())
    }

    fn record(&mut self) {
        self.history.record(Snapshot {
            shapes: self.scene.shapes().to_vec(),
            selected: self.scene.selected_vec(),
        });
    }

    fn scatter_offset(&self, shape_type: ShapeType) -> (f64, f64) {
        if !self.scatter {
            return (0.0, 0.0);
        }
        let (rx, ry) = scatter_range(shape_type);
        if rx == 0.0 && ry == 0.0 {
            return (0.0, 0.0);
        }
        let bytes = *Uuid::new_v4().as_bytes();
        let fx = bytes[0] as f64 / 255.0;
        let fy = bytes[1] as f64 / 255.0;
        ((fx * rx).floor(), (fy * ry).floor())
    }

    // Creation ------------------------------------------------------------

    /// Drop a new shape at its type's default position (plus scatter).
    /// Returns the new id; the shape becomes the sole selection.
    pub fn add_shape(&mut self, shape_type: ShapeType) -> String {
        let (dx, dy) = self.scatter_offset(shape_type);
        let origin = default_origin(shape_type).translated(dx, dy);
        self.insert_new(create_shape(shape_type, Self::next_id(), origin))
    }

    /// Drop a new shape so its bounding box lands at `point`.
    pub fn add_shape_at(&mut self, shape_type: ShapeType, point: Point) -> String {
        let mut shape = create_shape(shape_type, Self::next_id(), point);
        let bounds = shape_bounds(&shape);
        crate::shapes::translate_shape(&mut shape, point.x - bounds.min_x, point.y - bounds.min_y);
        self.insert_new(shape)
    }

    pub fn add_text(&mut self, content: impl Into<String>) -> String {
        let id = self.add_shape(ShapeType::Text);
        self.set_text_content(&id, content);
        id
    }

    pub fn add_image(&mut self, opts: ImageOptions) -> String {
        let (dx, dy) = self.scatter_offset(ShapeType::Image);
        let origin = default_origin(ShapeType::Image).translated(dx, dy);
        self.insert_new(create_image(Self::next_id(), origin, opts))
    }

    pub fn add_rect(&mut self) -> String {
        self.add_shape(ShapeType::Rect)
    }

    pub fn add_rounded_rect(&mut self) -> String {
        self.add_shape(ShapeType::RoundedRect)
    }

    pub fn add_circle(&mut self) -> String {
        self.add_shape(ShapeType::Circle)
    }

    pub fn add_ellipse(&mut self) -> String {
        self.add_shape(ShapeType::Ellipse)
    }

    pub fn add_triangle(&mut self) -> String {
        self.add_shape(ShapeType::Triangle)
    }

    pub fn add_cloud(&mut self) -> String {
        self.add_shape(ShapeType::Cloud)
    }

    pub fn add_cylinder(&mut self) -> String {
        self.add_shape(ShapeType::Cylinder)
    }

    pub fn add_line(&mut self) -> String {
        self.add_shape(ShapeType::Line)
    }

    pub fn add_polyline(&mut self) -> String {
        self.add_shape(ShapeType::Polyline)
    }

    /// Add one of the path-outline shapes (diamond, trapezoid, hexagon,
    /// pentagon, speech, wave). Other kinds go through the error channel.
    pub fn add_path_shape(&mut self, kind: ShapeType) -> Option<String> {
        if !kind.is_path_family() {
            self.fail(EditorError::Creation {
                kind: kind.as_str().to_string(),
                reason: "not a path-outline shape".to_string(),
            });
            return None;
        }
        Some(self.add_shape(kind))
    }

    fn insert_new(&mut self, shape: Shape) -> String {
        let id = shape.id.clone();
        debug!(id, kind = shape.shape_type.as_str(), "shape added");
        self.scene.push(shape);
        self.scene.select_only(&id);
        self.record();
        id
    }

    // Selection -----------------------------------------------------------

    pub fn select(&mut self, id: &str) {
        self.scene.select_only(id);
    }

    pub fn toggle_select(&mut self, id: &str) {
        self.scene.toggle_selection(id);
    }

    pub fn select_all(&mut self) {
        self.scene.select_all();
    }

    pub fn clear_selection(&mut self) {
        self.scene.clear_selection();
    }

    pub fn selection_count(&self) -> usize {
        self.scene.selection_count()
    }

    /// The selected shape, when exactly one is selected.
    pub fn selected_shape(&self) -> Option<&Shape> {
        if self.scene.selection_count() != 1 {
            return None;
        }
        self.scene
            .selected_vec()
            .first()
            .and_then(|id| self.scene.shape(id))
    }

    // Styles --------------------------------------------------------------

    pub fn rotate_selected(&mut self, degrees: f64) {
        self.update_selected(true, |s| crate::style::set_rotation(s, degrees));
    }

    pub fn rotate_selected_by(&mut self, delta: f64) {
        self.update_selected(true, |s| crate::style::rotate_by(s, delta));
    }

    pub fn flip_selected_horizontal(&mut self) {
        self.update_selected(true, crate::style::flip_horizontal);
    }

    pub fn flip_selected_vertical(&mut self) {
        self.update_selected(true, crate::style::flip_vertical);
    }

    pub fn scale_selected(&mut self, scale: f64) {
        self.update_selected(true, |s| crate::style::set_scale(s, scale));
    }

    pub fn set_selected_fill(&mut self, fill: &str) {
        self.update_selected(true, |s| crate::style::set_fill(s, fill));
    }

    pub fn set_selected_stroke(&mut self, stroke: &str) {
        self.update_selected(true, |s| crate::style::set_stroke(s, stroke));
    }

    pub fn set_selected_stroke_width(&mut self, width: f64) {
        self.update_selected(true, |s| crate::style::set_stroke_width(s, width));
    }

    pub fn set_selected_opacity(&mut self, opacity: f64) {
        self.update_selected(true, |s| crate::style::set_opacity(s, opacity));
    }

    pub fn set_selected_arrow_mode(&mut self, mode: crate::shapes::ArrowMode) {
        self.update_selected(true, |s| crate::style::set_arrow_mode(s, mode));
    }

    // Mutation ------------------------------------------------------------

    /// Apply `f` to every selected shape, reroute their connectors, and
    /// record one history entry (unless `record` is false, for live
    /// previews that commit later).
    pub fn update_selected(&mut self, record: bool, mut f: impl FnMut(&mut Shape)) {
        let ids = self.scene.selected_vec();
        if ids.is_empty() {
            return;
        }
        for id in &ids {
            if let Some(shape) = self.scene.shape_mut(id) {
                f(shape);
            }
        }
        for id in &ids {
            reroute_attached(&mut self.scene, id);
        }
        if record {
            self.record();
        }
    }

    /// Replace a text shape's content, resizing its box from measured
    /// extent.
    pub fn set_text_content(&mut self, id: &str, content: impl Into<String>) {
        let content = content.into();
        let Some(shape) = self.scene.shape_mut(id) else {
            warn!(id, "set text on unknown shape");
            return;
        };
        if shape.shape_type != ShapeType::Text {
            return;
        }
        let font_size = shape.data.font_size.unwrap_or(20.0);
        let size = self.measurer.measure(&content, font_size, 0.0);
        shape.data.text = Some(content);
        shape.data.width = Some(size.width.max(30.0));
        shape.data.height = Some(size.height.max(20.0));
        sync_geometry(shape);
        reroute_attached(&mut self.scene, id);
        self.record();
    }

    /// Delete the selection. Connectors bound to a deleted node go with
    /// it, and surviving shapes drop their dangling attachment ids.
    pub fn delete_selected(&mut self) {
        let mut doomed = self.scene.selected_vec();
        if doomed.is_empty() {
            return;
        }
        // Cascade to connectors bound to a doomed node.
        let cascade: Vec<String> = self
            .scene
            .shapes()
            .iter()
            .filter(|s| s.shape_type.is_edge())
            .filter(|s| {
                s.connections
                    .iter()
                    .flatten()
                    .any(|target| doomed.iter().any(|d| d == target))
            })
            .map(|s| s.id.clone())
            .collect();
        for id in cascade {
            if !doomed.contains(&id) {
                doomed.push(id);
            }
        }
        for id in &doomed {
            self.scene.remove(id);
        }
        let doomed_set = doomed;
        for shape in self.scene.shapes().to_vec() {
            if shape.shape_type.is_edge() {
                continue;
            }
            if let Some(live) = self.scene.shape_mut(&shape.id) {
                live.connections.retain(|c| {
                    c.as_ref().is_none_or(|cid| !doomed_set.contains(cid))
                });
            }
        }
        info!(count = doomed_set.len(), "deleted shapes");
        self.record();
    }

    pub fn clear_canvas(&mut self) {
        if self.scene.is_empty() {
            return;
        }
        self.scene.clear();
        self.record();
    }

    // Grouping ------------------------------------------------------------

    /// Group the selection. Needs at least two shapes.
    pub fn group_selected(&mut self) -> Option<String> {
        let ids = self.scene.selected_vec();
        if ids.len() < 2 {
            return None;
        }
        let group_id = format!("group-{}", Uuid::new_v4());
        for id in &ids {
            if let Some(shape) = self.scene.shape_mut(id) {
                shape.data.group_id = Some(group_id.clone());
            }
        }
        self.record();
        Some(group_id)
    }

    pub fn ungroup_selected(&mut self) {
        let ids = self.scene.selected_vec();
        let mut changed = false;
        for id in &ids {
            if let Some(shape) = self.scene.shape_mut(id) {
                if shape.data.group_id.take().is_some() {
                    changed = true;
                }
            }
        }
        if changed {
            self.record();
        }
    }

    // Layering ------------------------------------------------------------

    pub fn bring_selected_to_front(&mut self) {
        self.layer_op(Scene::bring_to_front);
    }

    pub fn send_selected_to_back(&mut self) {
        self.layer_op(Scene::send_to_back);
    }

    pub fn move_selected_forward(&mut self) {
        self.layer_op(Scene::move_forward);
    }

    pub fn move_selected_backward(&mut self) {
        self.layer_op(Scene::move_backward);
    }

    fn layer_op(&mut self, op: fn(&mut Scene, &str)) {
        let ids = self.scene.selected_vec();
        if ids.is_empty() {
            return;
        }
        for id in &ids {
            op(&mut self.scene, id);
        }
        self.record();
    }

    // Connections ---------------------------------------------------------

    /// Create a connector between two shapes, optionally at named ports.
    pub fn connect(
        &mut self,
        from_id: &str,
        to_id: &str,
        from_port: Option<String>,
        to_port: Option<String>,
    ) -> Option<String> {
        for sid in [from_id, to_id] {
            if !self.scene.contains(sid) {
                self.fail(EditorError::MissingShape(sid.to_string()));
                return None;
            }
        }
        let id = connect_shapes(
            &mut self.scene,
            Self::next_id(),
            from_id,
            to_id,
            from_port,
            to_port,
        )?;
        self.record();
        Some(id)
    }

    /// Begin an interactive connection gesture from a shape.
    pub fn start_connection(&mut self, shape_id: &str, port_id: Option<String>) {
        self.gesture.start_connection(&self.scene, shape_id, port_id);
    }

    /// Add a route vertex to a connector at the nearest segment.
    pub fn insert_connector_node_at(&mut self, connector_id: &str, point: Point) -> Option<usize> {
        let idx = insert_node_at(&mut self.scene, connector_id, point)?;
        self.record();
        Some(idx)
    }

    // History -------------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.gesture = GestureController::new();
        self.scene.replace_all(snapshot.shapes);
        self.scene.set_selection(snapshot.selected);
    }

    pub(crate) fn reset_history(&mut self) {
        self.history.reset(Snapshot {
            shapes: self.scene.shapes().to_vec(),
            selected: self.scene.selected_vec(),
        });
    }

    // Clipboard -----------------------------------------------------------

    /// Copy the selection. Returns how many shapes were captured.
    pub fn copy_selected(&mut self) -> usize {
        self.clipboard.capture(&self.scene, &self.scene.selected_vec())
    }

    pub fn has_clipboard(&self) -> bool {
        !self.clipboard.is_empty()
    }

    /// Paste the clipboard; new shapes become the selection.
    pub fn paste(&mut self) -> Vec<String> {
        let mut gen = Self::id_generator();
        let ids = self.clipboard.paste(&mut self.scene, &mut gen);
        if ids.is_empty() {
            return ids;
        }
        self.scene.set_selection(ids.clone());
        self.record();
        ids
    }

    /// Copy plus paste in one step, without touching the clipboard buffer.
    pub fn duplicate_selected(&mut self) -> Vec<String> {
        let selected = self.scene.selected_vec();
        if selected.is_empty() {
            return Vec::new();
        }
        let source = crate::clipboard::snapshot_with_edges(&self.scene, &selected);
        let mut gen = Self::id_generator();
        let ids = crate::clipboard::duplicate_shapes(&mut self.scene, &source, &mut gen);
        self.scene.set_selection(ids.clone());
        self.record();
        ids
    }

    fn id_generator() -> impl FnMut() -> String {
        || Self::next_id()
    }

    // Pointer -------------------------------------------------------------

    pub fn pointer_down(&mut self, input: PointerInput) {
        self.gesture.pointer_down(&mut self.scene, input);
    }

    pub fn pointer_move(&mut self, point: Point) {
        self.gesture.pointer_move(&mut self.scene, point);
    }

    pub fn pointer_up(&mut self, point: Point) {
        let mut gen = Self::id_generator();
        if self.gesture.pointer_up(&mut self.scene, point, &mut gen) {
            self.record();
        }
    }

    /// Escape: abort the live gesture and restore the pre-gesture scene.
    pub fn cancel_gesture(&mut self) {
        self.gesture.cancel(&mut self.scene);
    }

    pub fn escape(&mut self) {
        self.cancel_gesture();
    }

    /// Double-click on a connector body inserts a route vertex there.
    pub fn double_click(&mut self, point: Point) -> Option<usize> {
        let id = self
            .scene
            .shapes()
            .iter()
            .rev()
            .filter(|s| s.shape_type == ShapeType::Connector)
            .find(|s| crate::connections::distance_to_connector(s, point) <= 6.0)
            .map(|s| s.id.clone())?;
        self.insert_connector_node_at(&id, point)
    }

    /// Track the pointer while no button is down; a hovered node shows its
    /// port markers, a hovered edge its endpoint handles.
    pub fn hover(&mut self, point: Point) {
        self.hovered = self
            .scene
            .shapes()
            .iter()
            .rev()
            .find(|s| {
                if s.shape_type.is_edge() {
                    crate::connections::distance_to_connector(s, point)
                        <= crate::decorations::ENDPOINT_HANDLE_RADIUS
                } else {
                    s.shape_type.has_ports()
                        && shape_bounds(s)
                            .expanded(crate::connections::PORT_HIT_RADIUS)
                            .contains(point)
                }
            })
            .map(|s| s.id.clone());
    }

    /// Selection decorations, hover port markers and any live gesture
    /// overlay.
    pub fn decorations(&self) -> Vec<Element> {
        let mut out = crate::decorations::scene_decorations(&self.scene);
        if let Some(shape) = self.hovered.as_deref().and_then(|id| self.scene.shape(id)) {
            if shape.shape_type.is_edge() {
                if !self.scene.is_selected(&shape.id) {
                    out.extend(crate::decorations::decorate_shape(shape));
                }
            } else {
                out.extend(crate::decorations::port_markers(shape));
            }
        }
        out.extend(self.gesture.overlay());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> Editor {
        let mut e = Editor::new();
        e.set_scatter(false);
        e
    }

    #[test]
    fn add_selects_and_records() {
        let mut e = editor();
        let id = e.add_shape(ShapeType::Rect);
        assert!(e.scene().is_selected(&id));
        assert_eq!(e.scene().shape(&id).unwrap().data.x, Some(100.0));
        assert!(e.can_undo());
        e.undo();
        assert!(e.scene().is_empty());
        e.redo();
        assert!(e.scene().contains(&id));
    }

    #[test]
    fn add_at_lands_the_bounds_on_the_point() {
        let mut e = editor();
        let id = e.add_shape_at(ShapeType::Circle, Point::new(50.0, 60.0));
        let b = shape_bounds(e.scene().shape(&id).unwrap());
        assert_eq!((b.min_x, b.min_y), (50.0, 60.0));
    }

    #[test]
    fn delete_cascades_to_bound_connectors() {
        let mut e = editor();
        let a = e.add_shape(ShapeType::Rect);
        let b = e.add_shape_at(ShapeType::Rect, Point::new(400.0, 100.0));
        let c = e.connect(&a, &b, None, None).unwrap();
        e.select(&a);
        e.delete_selected();
        assert!(!e.scene().contains(&a));
        assert!(!e.scene().contains(&c));
        // Survivor no longer references the dead connector.
        assert_eq!(e.scene().shape(&b).unwrap().attached_connectors().count(), 0);
    }

    #[test]
    fn text_resizes_from_measurement() {
        let mut e = editor();
        let id = e.add_text("hello");
        let shape = e.scene().shape(&id).unwrap();
        assert_eq!(shape.data.text.as_deref(), Some("hello"));
        // 5 chars at 20px font, 0.6 advance.
        assert_eq!(shape.data.width, Some(60.0));
        assert_eq!(shape.data.height, Some(24.0));
    }

    #[test]
    fn tiny_text_keeps_minimum_box() {
        let mut e = editor();
        let id = e.add_text("i");
        let shape = e.scene().shape(&id).unwrap();
        assert_eq!(shape.data.width, Some(30.0));
    }

    #[test]
    fn grouping_requires_two_shapes() {
        let mut e = editor();
        let a = e.add_shape(ShapeType::Rect);
        e.select(&a);
        assert!(e.group_selected().is_none());
        let b = e.add_shape_at(ShapeType::Rect, Point::new(400.0, 100.0));
        e.select(&a);
        e.toggle_select(&b);
        let gid = e.group_selected().unwrap();
        assert_eq!(e.scene().group_members(&gid).len(), 2);
        e.ungroup_selected();
        assert!(e.scene().group_members(&gid).is_empty());
    }

    #[test]
    fn duplicate_offsets_and_reselects() {
        let mut e = editor();
        let a = e.add_shape(ShapeType::Rect);
        e.select(&a);
        let ids = e.duplicate_selected();
        assert_eq!(ids.len(), 1);
        assert!(e.scene().is_selected(&ids[0]));
        assert!(!e.scene().is_selected(&a));
        assert_eq!(e.scene().shape(&ids[0]).unwrap().data.x, Some(120.0));
    }

    #[test]
    fn paste_records_a_history_entry_per_paste() {
        let mut e = editor();
        let a = e.add_shape(ShapeType::Rect);
        e.select(&a);
        e.copy_selected();
        e.paste();
        e.paste();
        assert_eq!(e.scene().len(), 3);
        e.undo();
        assert_eq!(e.scene().len(), 2);
        e.undo();
        assert_eq!(e.scene().len(), 1);
    }

    #[test]
    fn undo_walks_back_through_gestures() {
        let mut e = editor();
        let id = e.add_shape(ShapeType::Rect);
        e.pointer_down(PointerInput::at(Point::new(170.0, 140.0)));
        e.pointer_move(Point::new(270.0, 240.0));
        e.pointer_up(Point::new(270.0, 240.0));
        assert_eq!(e.scene().shape(&id).unwrap().data.x, Some(200.0));
        e.undo();
        assert_eq!(e.scene().shape(&id).unwrap().data.x, Some(100.0));
    }

    #[test]
    fn style_ops_apply_to_the_selection_and_record() {
        let mut e = editor();
        let id = e.add_rect();
        e.set_selected_fill("#ff0000");
        e.set_selected_opacity(0.5);
        let shape = e.scene().shape(&id).unwrap();
        assert_eq!(shape.data.fill.as_deref(), Some("#ff0000"));
        assert_eq!(shape.element.attr("fill"), Some("#ff0000"));
        assert_eq!(shape.data.opacity, Some(0.5));
        e.undo();
        assert_eq!(e.scene().shape(&id).unwrap().data.opacity, Some(1.0));
    }

    #[test]
    fn path_shape_helper_rejects_non_path_kinds() {
        let mut e = editor();
        assert!(e.add_path_shape(ShapeType::Hexagon).is_some());
        assert!(e.add_path_shape(ShapeType::Circle).is_none());
        assert!(matches!(e.take_error(), Some(EditorError::Creation { .. })));
    }

    #[test]
    fn double_click_splits_a_connector() {
        let mut e = editor();
        let a = e.add_shape_at(ShapeType::Rect, Point::new(0.0, 0.0));
        let b = e.add_shape_at(ShapeType::Rect, Point::new(400.0, 0.0));
        let c = e.connect(&a, &b, None, None).unwrap();
        // Centers are (70,40) and (470,40); click on the route.
        let idx = e.double_click(Point::new(250.0, 42.0)).unwrap();
        assert_eq!(idx, 1);
        let conn = e.scene().shape(&c).unwrap();
        assert_eq!(crate::shapes::connector_points(conn).len(), 3);
        // Far away does nothing.
        assert!(e.double_click(Point::new(250.0, 300.0)).is_none());
    }

    #[test]
    fn hovering_a_shape_shows_its_ports() {
        let mut e = editor();
        let id = e.add_shape_at(ShapeType::Rect, Point::new(0.0, 0.0));
        e.clear_selection();
        e.hover(Point::new(70.0, 40.0));
        let markers: Vec<_> = e
            .decorations()
            .into_iter()
            .filter(|el| el.attr("class") == Some("port-marker"))
            .collect();
        assert_eq!(markers.len(), 4);
        assert_eq!(markers[0].attr("id"), Some(format!("{id}-port-top").as_str()));
        e.hover(Point::new(900.0, 900.0));
        assert!(e.decorations().is_empty());
    }

    #[test]
    fn clipboard_and_sole_selection_queries() {
        let mut e = editor();
        assert!(!e.has_clipboard());
        let a = e.add_rect();
        assert_eq!(e.selected_shape().map(|s| s.id.as_str()), Some(a.as_str()));
        e.copy_selected();
        assert!(e.has_clipboard());
        let b = e.add_shape_at(ShapeType::Rect, Point::new(400.0, 0.0));
        e.select(&a);
        e.toggle_select(&b);
        // More than one selected shape is no longer "the" selected shape.
        assert!(e.selected_shape().is_none());
        e.clear_selection();
        assert!(e.selected_shape().is_none());
    }

    #[test]
    fn connecting_a_missing_shape_reports_the_error() {
        let mut e = editor();
        let a = e.add_rect();
        assert!(e.connect(&a, "ghost", None, None).is_none());
        assert!(matches!(e.take_error(), Some(EditorError::MissingShape(_))));
        assert_eq!(e.scene().len(), 1);
    }

    #[test]
    fn hovering_an_edge_shows_its_endpoint_handles() {
        let mut e = editor();
        let a = e.add_shape_at(ShapeType::Rect, Point::new(0.0, 0.0));
        let b = e.add_shape_at(ShapeType::Rect, Point::new(400.0, 0.0));
        e.connect(&a, &b, None, None).unwrap();
        e.clear_selection();
        // Route runs between the centers (70,40) and (470,40).
        e.hover(Point::new(250.0, 42.0));
        let handles: Vec<_> = e
            .decorations()
            .into_iter()
            .filter(|el| el.attr("class") == Some("endpoint-handle"))
            .collect();
        assert_eq!(handles.len(), 2);
    }

    #[test]
    fn scatterless_creation_is_deterministic() {
        let mut e = editor();
        let a = e.add_shape(ShapeType::Circle);
        let b = e.add_shape(ShapeType::Circle);
        let xa = e.scene().shape(&a).unwrap().data.x;
        let xb = e.scene().shape(&b).unwrap().data.x;
        assert_eq!(xa, Some(220.0));
        assert_eq!(xa, xb);
    }
}
