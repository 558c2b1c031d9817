//! Editor error taxonomy. Operations on missing shapes log and no-op;
//! these errors cover the cases a caller must hear about.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("unknown shape type: {0}")]
    UnknownShapeType(String),

    #[error("failed to create {kind} shape: {reason}")]
    Creation { kind: String, reason: String },

    #[error("no shape with id {0}")]
    MissingShape(String),

    #[error("invalid markup: {0}")]
    Markup(String),

    #[error("import failed: {0}")]
    Import(String),

    #[error("export failed: {0}")]
    Export(String),
}
