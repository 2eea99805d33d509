//! Cardwright Core Library
//!
//! Layered canvas editing for invitation designs: the layer model, an
//! editor session with undo history, pointer interaction, and persistence
//! of designs against a pluggable backend. No rendering.

pub mod config;
pub mod document;
pub mod editor;
pub mod history;
pub mod input;
pub mod interaction;
pub mod layer;
pub mod page;
pub mod storage;
pub mod viewport;

pub use config::{ConfigError, EditorConfig};
pub use document::Document;
pub use editor::{Editor, EditorEvent, MoveDirection};
pub use history::{History, Snapshot};
pub use input::PointerEvent;
pub use interaction::{Corner, InteractionController, PointerOutcome};
pub use layer::{
    Geometry, Layer, LayerId, LayerKind, LayerPatch, LayerProps, NewLayer, PropsPatch, StyleProps,
};
pub use page::{PageSize, TemplateDescriptor};
pub use storage::{DesignBackend, DesignSession, FileBackend, MemoryBackend, StorageError};
pub use viewport::Viewport;
