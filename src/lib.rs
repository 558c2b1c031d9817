//! Vector diagram editor core.
//!
//! A headless SVG diagram editor: a geometry kernel over a closed shape
//! set, a scene store with selection, a port-based connection engine, a
//! pointer gesture state machine, bounded undo history, clipboard
//! duplication with connector re-binding, and JSON/SVG/raster export.
//! Rendering and input capture belong to the host; the editor works purely
//! on owned SVG elements.

pub mod clipboard;
pub mod connections;
pub mod decorations;
pub mod editor;
pub mod element;
pub mod error;
pub mod export;
pub mod gesture;
pub mod geometry;
pub mod history;
pub mod measure;
pub mod scene;
pub mod shapes;
pub mod style;

pub use editor::Editor;
pub use element::Element;
pub use error::EditorError;
pub use gesture::{Gesture, GestureController, PointerInput};
pub use geometry::{Bounds, Point};
pub use history::{HistoryManager, Snapshot, MAX_HISTORY};
pub use measure::{HeuristicMeasurer, TextMeasurer, TextSize};
pub use scene::Scene;
pub use shapes::{
    ArrowMode, ImageOptions, Port, PortPosition, ResizeHandle, Shape, ShapeData, ShapeType,
};
