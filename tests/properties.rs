//! Property tests over the geometry kernel and history.

use proptest::prelude::*;

use svgboard::history::{HistoryManager, Snapshot};
use svgboard::shapes::{
    create_shape, resize_shape, shape_bounds, shape_ports, translate_shape, ResizeHandle,
    MIN_RADIUS, MIN_SIZE,
};
use svgboard::{Point, ShapeType};

fn coord() -> impl Strategy<Value = f64> {
    -10_000.0..10_000.0f64
}

proptest! {
    #[test]
    fn translation_adds_exactly_the_delta(
        x in coord(), y in coord(), dx in coord(), dy in coord()
    ) {
        let mut s = create_shape(ShapeType::Rect, "s".into(), Point::new(x, y));
        translate_shape(&mut s, dx, dy);
        prop_assert_eq!(s.data.x, Some(x + dx));
        prop_assert_eq!(s.data.y, Some(y + dy));
    }

    #[test]
    fn box_resize_never_collapses(
        dx in coord(), dy in coord()
    ) {
        let mut s = create_shape(ShapeType::Rect, "s".into(), Point::new(0.0, 0.0));
        resize_shape(&mut s, ResizeHandle::SouthEast, dx, dy);
        prop_assert!(s.data.width.unwrap() >= MIN_SIZE);
        prop_assert!(s.data.height.unwrap() >= MIN_SIZE);
    }

    #[test]
    fn circle_resize_never_collapses(dx in coord(), dy in coord()) {
        let mut s = create_shape(ShapeType::Circle, "s".into(), Point::new(0.0, 0.0));
        resize_shape(&mut s, ResizeHandle::SouthEast, dx, dy);
        prop_assert!(s.data.radius.unwrap() >= MIN_RADIUS);
    }

    #[test]
    fn nw_resize_pins_the_opposite_corner(
        dx in -100.0..100.0f64, dy in -100.0..100.0f64
    ) {
        let mut s = create_shape(ShapeType::Rect, "s".into(), Point::new(100.0, 100.0));
        let before = shape_bounds(&s);
        resize_shape(&mut s, ResizeHandle::NorthWest, dx, dy);
        let after = shape_bounds(&s);
        prop_assert!((after.max_x - before.max_x).abs() < 1e-9);
        prop_assert!((after.max_y - before.max_y).abs() < 1e-9);
    }

    #[test]
    fn box_ports_sit_on_edge_midpoints(x in coord(), y in coord()) {
        let s = create_shape(ShapeType::Rect, "s".into(), Point::new(x, y));
        let b = shape_bounds(&s);
        let ports = shape_ports(&s);
        prop_assert_eq!(ports.len(), 4);
        let cx = (b.min_x + b.max_x) / 2.0;
        let cy = (b.min_y + b.max_y) / 2.0;
        prop_assert_eq!(ports[0].point, Point::new(cx, b.min_y));
        prop_assert_eq!(ports[1].point, Point::new(b.max_x, cy));
        prop_assert_eq!(ports[2].point, Point::new(cx, b.max_y));
        prop_assert_eq!(ports[3].point, Point::new(b.min_x, cy));
    }

    #[test]
    fn history_length_is_bounded(records in 1usize..200) {
        let mut h = HistoryManager::default();
        for i in 0..records {
            h.record(Snapshot { shapes: Vec::new(), selected: vec![i.to_string()] });
        }
        prop_assert!(h.len() <= svgboard::MAX_HISTORY);
        // Undo always terminates at the oldest retained entry.
        let mut steps = 0;
        while h.undo().is_some() {
            steps += 1;
        }
        prop_assert!(steps < svgboard::MAX_HISTORY);
    }

    #[test]
    fn clone_offsets_without_touching_the_source(
        x in coord(), y in coord()
    ) {
        let source = create_shape(ShapeType::Rect, "src".into(), Point::new(x, y));
        let cloned = svgboard::shapes::clone_shape(&source, "dup".into(), 20.0);
        prop_assert_eq!(cloned.data.x, Some(x + 20.0));
        prop_assert_eq!(source.data.x, Some(x));
        prop_assert!(cloned.connections.is_empty());
    }
}
