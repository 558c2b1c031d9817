//! End-to-end editor flows through the public API.

use svgboard::gesture::PointerInput;
use svgboard::{Editor, Point, ShapeType};

fn editor() -> Editor {
    init_tracing();
    let mut e = Editor::new();
    e.set_scatter(false);
    e
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn build_connect_move_undo() {
    let mut e = editor();
    let a = e.add_shape_at(ShapeType::Rect, Point::new(0.0, 0.0));
    let b = e.add_shape_at(ShapeType::Rect, Point::new(400.0, 0.0));
    let c = e
        .connect(&a, &b, Some(format!("{a}-port-right")), Some(format!("{b}-port-left")))
        .unwrap();

    // Drag a by (50, 30) through the pointer machine.
    e.select(&a);
    e.pointer_down(PointerInput::at(Point::new(70.0, 40.0)));
    e.pointer_move(Point::new(120.0, 70.0));
    e.pointer_up(Point::new(120.0, 70.0));

    let conn = e.scene().shape(&c).unwrap();
    // Start follows a's right port: (140, 40) + (50, 30).
    assert_eq!(conn.data.x1, Some(190.0));
    assert_eq!(conn.data.y1, Some(70.0));
    assert_eq!(conn.data.x2, Some(400.0));

    e.undo();
    let conn = e.scene().shape(&c).unwrap();
    assert_eq!(conn.data.x1, Some(140.0));
    assert_eq!(e.scene().shape(&a).unwrap().data.x, Some(0.0));

    e.redo();
    assert_eq!(e.scene().shape(&a).unwrap().data.x, Some(50.0));
}

#[test]
fn copy_paste_duplicates_connected_subgraph() {
    let mut e = editor();
    let a = e.add_shape_at(ShapeType::Rect, Point::new(0.0, 0.0));
    let b = e.add_shape_at(ShapeType::Rect, Point::new(400.0, 0.0));
    e.connect(&a, &b, None, None).unwrap();

    e.select(&a);
    e.toggle_select(&b);
    assert_eq!(e.copy_selected(), 3);
    let pasted = e.paste();
    assert_eq!(pasted.len(), 3);
    assert_eq!(e.scene().len(), 6);

    // The pasted connector binds the pasted shapes, not the originals.
    let conn = pasted
        .iter()
        .filter_map(|id| e.scene().shape(id))
        .find(|s| s.shape_type == ShapeType::Connector)
        .unwrap();
    let from = conn.endpoint(0).unwrap().to_string();
    assert!(pasted.contains(&from));
    assert_ne!(from, a);
}

#[test]
fn json_round_trip_preserves_the_document() {
    let mut e = editor();
    let a = e.add_shape_at(ShapeType::RoundedRect, Point::new(10.0, 10.0));
    let t = e.add_text("hello world");
    e.connect(&a, &t, None, None);
    let json = e.export_json().unwrap();

    let mut restored = editor();
    assert_eq!(restored.import_json(&json), 3);
    let original = e.scene().shape(&a).unwrap();
    let loaded = restored.scene().shape(&a).unwrap();
    assert_eq!(original.data, loaded.data);
    assert_eq!(original.connections, loaded.connections);
    assert_eq!(
        restored.scene().shape(&t).unwrap().data.text.as_deref(),
        Some("hello world")
    );
}

#[test]
fn escape_aborts_a_drag_without_a_history_entry() {
    let mut e = editor();
    let a = e.add_shape_at(ShapeType::Rect, Point::new(0.0, 0.0));
    e.select(&a);
    e.pointer_down(PointerInput::at(Point::new(70.0, 40.0)));
    e.pointer_move(Point::new(170.0, 140.0));
    e.cancel_gesture();
    assert_eq!(e.scene().shape(&a).unwrap().data.x, Some(0.0));
    // Undo steps back past the creation, not a phantom drag.
    e.undo();
    assert!(e.scene().is_empty());
}

#[test]
fn delete_selection_with_connectors_leaves_a_clean_scene() {
    let mut e = editor();
    let a = e.add_shape_at(ShapeType::Circle, Point::new(0.0, 0.0));
    let b = e.add_shape_at(ShapeType::Triangle, Point::new(300.0, 0.0));
    let c = e.add_shape_at(ShapeType::Rect, Point::new(0.0, 300.0));
    e.connect(&a, &b, None, None).unwrap();
    e.connect(&b, &c, None, None).unwrap();

    e.select(&b);
    e.delete_selected();

    assert_eq!(e.scene().len(), 2);
    for shape in e.scene().shapes() {
        assert_eq!(shape.attached_connectors().count(), 0);
    }
}

#[test]
fn selection_decorations_track_the_selection() {
    let mut e = editor();
    let a = e.add_shape_at(ShapeType::Rect, Point::new(0.0, 0.0));
    assert!(!e.decorations().is_empty());
    e.clear_selection();
    assert!(e.decorations().is_empty());
    e.select(&a);
    let classes: Vec<String> = e
        .decorations()
        .iter()
        .filter_map(|el| el.attr("class").map(str::to_string))
        .collect();
    assert!(classes.contains(&"selection-outline".to_string()));
    assert!(classes.contains(&"resize-grip".to_string()));
}
