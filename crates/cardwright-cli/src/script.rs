//! Editor command scripts.
//!
//! A script names the design to open (or the template to create one from)
//! and lists commands in the order a user would issue them:
//!
//! ```json
//! {
//!   "template": { "id": "boda", "size": "A5" },
//!   "commands": [
//!     { "op": "add", "layer": { "type": "text", "props": { "text": "Hi" } } },
//!     { "op": "pointer", "event": { "kind": "down", "position": { "x": 110, "y": 110 } } },
//!     { "op": "pointer", "event": { "kind": "up", "position": { "x": 110, "y": 110 } } },
//!     { "op": "undo" }
//!   ]
//! }
//! ```

use cardwright_core::{
    Editor, InteractionController, LayerId, LayerPatch, MoveDirection, NewLayer, PointerEvent,
    TemplateDescriptor,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid script: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    /// Existing design to open. A new one is created when absent.
    #[serde(default)]
    pub design: Option<String>,
    /// Name for a newly created design.
    #[serde(default)]
    pub name: Option<String>,
    pub template: TemplateDescriptor,
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Command {
    Add { layer: NewLayer },
    Update { id: LayerId, patch: LayerPatch },
    Delete { id: LayerId },
    Duplicate { id: LayerId },
    Lock { id: LayerId },
    Move { id: LayerId, direction: MoveDirection },
    Select { id: Option<LayerId> },
    Zoom { zoom: f64 },
    Undo,
    Redo,
    Clear,
    Pointer { event: PointerEvent },
}

/// Totals reported after a replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStats {
    pub applied: usize,
    /// Commands that changed nothing, e.g. an unknown id.
    pub no_ops: usize,
}

/// Apply one command. Returns false if it changed nothing.
pub fn apply(
    editor: &mut Editor,
    controller: &mut InteractionController,
    command: &Command,
) -> bool {
    log::debug!("Apply {command:?}");
    match command {
        Command::Add { layer } => {
            editor.add_layer(layer.clone());
            true
        }
        Command::Update { id, patch } => editor.update_layer(*id, patch),
        Command::Delete { id } => editor.delete_layer(*id),
        Command::Duplicate { id } => editor.duplicate_layer(*id).is_some(),
        Command::Lock { id } => editor.toggle_layer_lock(*id),
        Command::Move { id, direction } => editor.move_layer(*id, *direction),
        Command::Select { id } => {
            let before = editor.selected_id();
            editor.select_layer(*id);
            editor.selected_id() != before
        }
        Command::Zoom { zoom } => {
            let before = editor.document().zoom();
            editor.set_zoom(*zoom);
            editor.document().zoom() != before
        }
        Command::Undo => {
            controller.cancel(editor);
            editor.undo()
        }
        Command::Redo => {
            controller.cancel(editor);
            editor.redo()
        }
        Command::Clear => {
            controller.cancel(editor);
            editor.clear();
            true
        }
        Command::Pointer { event } => {
            let outcome = controller.handle_event(editor, *event);
            log::trace!("Pointer outcome {outcome:?}");
            outcome != cardwright_core::PointerOutcome::Ignored
        }
    }
}

/// Apply every command, closing any gesture the script left open.
pub fn replay(
    editor: &mut Editor,
    controller: &mut InteractionController,
    commands: &[Command],
) -> ReplayStats {
    let mut stats = ReplayStats::default();
    for command in commands {
        if apply(editor, controller, command) {
            stats.applied += 1;
        } else {
            stats.no_ops += 1;
        }
    }
    if controller.is_active() {
        log::warn!("Script ended mid-gesture, releasing pointer");
        controller.cancel(editor);
    }
    stats
}
