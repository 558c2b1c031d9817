//! Scene store: the ordered shape list plus the selection set.
//!
//! Render order is list order, last shape on top. Mutations replace list
//! entries wholesale so readers always see a consistent snapshot; lookups go
//! through ids rather than held references.

use indexmap::IndexSet;
use tracing::warn;

use crate::geometry::{Bounds, Point};
use crate::shapes::{shape_bounds, Shape, ShapeType};

#[derive(Debug, Default, Clone)]
pub struct Scene {
    shapes: Vec<Shape>,
    selected: IndexSet<String>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.shapes.iter().position(|s| s.id == id)
    }

    pub fn shape(&self, id: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn shape_mut(&mut self, id: &str) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    /// Append on top of the stack.
    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn remove(&mut self, id: &str) -> Option<Shape> {
        let idx = self.index_of(id)?;
        self.selected.shift_remove(id);
        Some(self.shapes.remove(idx))
    }

    /// Replace the whole shape list, pruning stale selection ids.
    pub fn replace_all(&mut self, shapes: Vec<Shape>) {
        self.shapes = shapes;
        let live: Vec<String> = self
            .selected
            .iter()
            .filter(|id| self.shapes.iter().any(|s| &s.id == *id))
            .cloned()
            .collect();
        self.selected = live.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.selected.clear();
    }

    /// Topmost shape whose bounds contain `point`.
    pub fn shape_at(&self, point: Point) -> Option<&Shape> {
        self.shapes
            .iter()
            .rev()
            .find(|s| shape_bounds(s).contains(point))
    }

    /// Ids of every shape in the same group, in scene order.
    pub fn group_members(&self, group_id: &str) -> Vec<String> {
        self.shapes
            .iter()
            .filter(|s| s.data.group_id.as_deref() == Some(group_id))
            .map(|s| s.id.clone())
            .collect()
    }

    // Selection -----------------------------------------------------------

    pub fn selected_ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn selected_vec(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    pub fn selection_count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn select_only(&mut self, id: &str) {
        if !self.contains(id) {
            warn!(id, "select on unknown shape");
            return;
        }
        self.selected.clear();
        self.selected.insert(id.to_string());
    }

    pub fn add_to_selection(&mut self, id: &str) {
        if !self.contains(id) {
            warn!(id, "select on unknown shape");
            return;
        }
        self.selected.insert(id.to_string());
    }

    pub fn toggle_selection(&mut self, id: &str) {
        if self.selected.contains(id) {
            self.selected.shift_remove(id);
        } else {
            self.add_to_selection(id);
        }
    }

    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = String>) {
        self.selected = ids
            .into_iter()
            .filter(|id| self.contains(id))
            .collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn select_all(&mut self) {
        self.selected = self.shapes.iter().map(|s| s.id.clone()).collect();
    }

    /// Combined bounds of the selection, if anything is selected.
    pub fn selection_bounds(&self) -> Option<Bounds> {
        let mut iter = self
            .selected
            .iter()
            .filter_map(|id| self.shape(id))
            .map(shape_bounds);
        let first = iter.next()?;
        Some(iter.fold(first, |acc, b| {
            Bounds::new(
                acc.min_x.min(b.min_x),
                acc.min_y.min(b.min_y),
                acc.max_x.max(b.max_x),
                acc.max_y.max(b.max_y),
            )
        }))
    }

    // Layering ------------------------------------------------------------

    pub fn bring_to_front(&mut self, id: &str) {
        if let Some(idx) = self.index_of(id) {
            let shape = self.shapes.remove(idx);
            self.shapes.push(shape);
        }
    }

    pub fn send_to_back(&mut self, id: &str) {
        if let Some(idx) = self.index_of(id) {
            let shape = self.shapes.remove(idx);
            self.shapes.insert(0, shape);
        }
    }

    pub fn move_forward(&mut self, id: &str) {
        if let Some(idx) = self.index_of(id) {
            if idx + 1 < self.shapes.len() {
                self.shapes.swap(idx, idx + 1);
            }
        }
    }

    pub fn move_backward(&mut self, id: &str) {
        if let Some(idx) = self.index_of(id) {
            if idx > 0 {
                self.shapes.swap(idx, idx - 1);
            }
        }
    }

    /// Shapes fully contained in `rect`, excluding connectors, in scene
    /// order. Used by marquee selection.
    pub fn contained_in(&self, rect: &Bounds) -> Vec<String> {
        self.shapes
            .iter()
            .filter(|s| s.shape_type != ShapeType::Connector)
            .filter(|s| rect.contains_bounds(&shape_bounds(s)))
            .map(|s| s.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{create_shape, ShapeType};

    fn scene_with_rects(n: usize) -> Scene {
        let mut scene = Scene::new();
        for i in 0..n {
            scene.push(create_shape(
                ShapeType::Rect,
                format!("shape-{i}"),
                Point::new(i as f64 * 10.0, 0.0),
            ));
        }
        scene
    }

    #[test]
    fn topmost_wins_hit_test() {
        let mut scene = Scene::new();
        scene.push(create_shape(ShapeType::Rect, "a".into(), Point::new(0.0, 0.0)));
        scene.push(create_shape(ShapeType::Rect, "b".into(), Point::new(0.0, 0.0)));
        assert_eq!(scene.shape_at(Point::new(10.0, 10.0)).map(|s| s.id.as_str()), Some("b"));
    }

    #[test]
    fn selection_survives_in_insertion_order() {
        let mut scene = scene_with_rects(3);
        scene.add_to_selection("shape-2");
        scene.add_to_selection("shape-0");
        let ids: Vec<_> = scene.selected_ids().collect();
        assert_eq!(ids, vec!["shape-2", "shape-0"]);
    }

    #[test]
    fn removing_a_shape_prunes_selection() {
        let mut scene = scene_with_rects(2);
        scene.add_to_selection("shape-1");
        scene.remove("shape-1");
        assert_eq!(scene.selection_count(), 0);
    }

    #[test]
    fn selecting_unknown_id_is_a_no_op() {
        let mut scene = scene_with_rects(1);
        scene.select_only("ghost");
        assert_eq!(scene.selection_count(), 0);
    }

    #[test]
    fn layering_moves_one_step() {
        let mut scene = scene_with_rects(3);
        scene.move_forward("shape-0");
        let order: Vec<_> = scene.shapes().iter().map(|s| s.id.clone()).collect();
        assert_eq!(order, vec!["shape-1", "shape-0", "shape-2"]);
        scene.move_backward("shape-0");
        let order: Vec<_> = scene.shapes().iter().map(|s| s.id.clone()).collect();
        assert_eq!(order, vec!["shape-0", "shape-1", "shape-2"]);
    }

    #[test]
    fn bring_to_front_and_back() {
        let mut scene = scene_with_rects(3);
        scene.bring_to_front("shape-0");
        assert_eq!(scene.shapes().last().map(|s| s.id.as_str()), Some("shape-0"));
        scene.send_to_back("shape-0");
        assert_eq!(scene.shapes().first().map(|s| s.id.as_str()), Some("shape-0"));
    }

    #[test]
    fn marquee_requires_full_containment_and_skips_connectors() {
        let mut scene = Scene::new();
        scene.push(create_shape(ShapeType::Rect, "r".into(), Point::new(0.0, 0.0)));
        scene.push(create_shape(ShapeType::Connector, "c".into(), Point::new(0.0, 0.0)));
        let hits = scene.contained_in(&Bounds::new(-10.0, -10.0, 500.0, 500.0));
        assert_eq!(hits, vec!["r"]);
        let partial = scene.contained_in(&Bounds::new(-10.0, -10.0, 50.0, 500.0));
        assert!(partial.is_empty());
    }
}
