//! Editor session: the layer store, its selection and its history.
//!
//! Every operation is total. Unknown ids are silent no-ops, since panels can
//! still reference a layer that was just deleted. Each operation that changes
//! the layers records exactly one history snapshot.

use crate::config::EditorConfig;
use crate::document::{DEFAULT_ZOOM, Document};
use crate::history::History;
use crate::layer::{Layer, LayerId, LayerPatch, NewLayer};
use serde::{Deserialize, Serialize};

/// Direction for a one-step z-order move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    /// Toward the end of the order, i.e. the top of the stack.
    Up,
    /// Toward the start of the order.
    Down,
}

/// Change notifications, queued after each successful operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    LayersChanged,
    SelectionChanged,
    ZoomChanged,
    HistoryChanged,
    Loaded,
    Cleared,
}

/// An open pointer gesture on one layer.
#[derive(Debug, Clone, PartialEq)]
struct Gesture {
    label: String,
    layer: LayerId,
}

/// One editing session over one document.
#[derive(Debug, Clone)]
pub struct Editor {
    document: Document,
    history: History,
    selected: Option<LayerId>,
    config: EditorConfig,
    events: Vec<EditorEvent>,
    /// Mirrors the open history batch.
    gesture: Option<Gesture>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    /// Create a session over an empty document.
    pub fn new(config: EditorConfig) -> Self {
        Self::with_document(Document::new(), config)
    }

    /// Create a session over an existing document. History starts at it.
    pub fn with_document(document: Document, config: EditorConfig) -> Self {
        let history = History::new(document.layers().to_vec(), config.history_limit);
        Self {
            document,
            history,
            selected: None,
            config,
            events: Vec::new(),
            gesture: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn layers(&self) -> &[Layer] {
        self.document.layers()
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.document.get(id)
    }

    pub fn selected_id(&self) -> Option<LayerId> {
        self.selected
    }

    /// The selected layer as it is now. Never stale, since it is looked up
    /// on every call.
    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selected.and_then(|id| self.document.get(id))
    }

    /// Drain queued change notifications.
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: EditorEvent) {
        if self.events.last() != Some(&event) {
            self.events.push(event);
        }
    }

    /// Mark the document changed and record a snapshot.
    fn commit(&mut self, label: &str) {
        self.document.touch();
        if self.history.record(label, self.document.layers().to_vec()) {
            self.emit(EditorEvent::HistoryChanged);
        }
        self.emit(EditorEvent::LayersChanged);
        self.check_invariants();
    }

    /// Close an open gesture ahead of a change that is not part of it, so
    /// the drag so far and the change get separate entries. Pass the result
    /// to `resume_gesture` once the change is committed.
    fn interrupt_gesture(&mut self) -> Option<Gesture> {
        let gesture = self.gesture.clone()?;
        log::debug!("'{}' interrupted by an unrelated change", gesture.label);
        self.end_gesture();
        Some(gesture)
    }

    fn resume_gesture(&mut self, gesture: Option<Gesture>) {
        if let Some(gesture) = gesture {
            self.history.begin_batch(&gesture.label);
            self.gesture = Some(gesture);
        }
    }

    fn set_selection(&mut self, id: Option<LayerId>) {
        if self.selected != id {
            self.selected = id;
            self.emit(EditorEvent::SelectionChanged);
        }
    }

    /// Add a layer at the top of the stack and select it.
    pub fn add_layer(&mut self, new_layer: NewLayer) -> LayerId {
        let gesture = self.interrupt_gesture();
        let id = self.document.allocate_id();
        let layer = new_layer.build(id, self.config.default_geometry);
        log::debug!("Add layer {id} ({})", layer.kind.as_str());
        self.document.layers_mut().push(layer);
        self.set_selection(Some(id));
        self.commit("Add layer");
        self.resume_gesture(gesture);
        id
    }

    /// Merge a patch into a layer. Returns false if nothing changed.
    pub fn update_layer(&mut self, id: LayerId, patch: &LayerPatch) -> bool {
        let Some(index) = self.document.position(id) else {
            log::trace!("Update of missing layer {id} ignored");
            return false;
        };
        let current = &self.document.layers()[index];
        let updated = current.patched(patch);
        if &updated == current {
            return false;
        }
        // Only geometry changes to the gesture's own layer fold into it.
        let part_of_gesture = self.gesture.as_ref().is_some_and(|g| g.layer == id)
            && patch.is_geometry_only();
        let gesture = if part_of_gesture { None } else { self.interrupt_gesture() };
        log::debug!("Update layer {id}");
        self.document.layers_mut()[index] = updated;
        let label = if patch.props.as_ref().is_some_and(|p| p.has_geometry()) {
            "Transform layer"
        } else {
            "Edit layer"
        };
        self.commit(label);
        self.resume_gesture(gesture);
        true
    }

    /// Remove a layer, clearing the selection if it pointed at it.
    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        let Some(index) = self.document.position(id) else {
            return false;
        };
        let gesture = self.interrupt_gesture();
        log::debug!("Delete layer {id}");
        self.document.layers_mut().remove(index);
        if self.selected == Some(id) {
            self.set_selection(None);
        }
        self.commit("Delete layer");
        self.resume_gesture(gesture);
        true
    }

    /// Copy a layer to the top of the stack, offset and renamed, and select
    /// the copy.
    pub fn duplicate_layer(&mut self, id: LayerId) -> Option<LayerId> {
        let source = self.document.get(id)?.clone();
        let gesture = self.interrupt_gesture();
        let new_id = self.document.allocate_id();
        log::debug!("Duplicate layer {id} as {new_id}");
        let copy = source.duplicate(new_id, self.config.duplicate_offset);
        self.document.layers_mut().push(copy);
        self.set_selection(Some(new_id));
        self.commit("Duplicate layer");
        self.resume_gesture(gesture);
        Some(new_id)
    }

    /// Flip the lock flag of a layer.
    pub fn toggle_layer_lock(&mut self, id: LayerId) -> bool {
        let Some(index) = self.document.position(id) else {
            return false;
        };
        let gesture = self.interrupt_gesture();
        let layer = &mut self.document.layers_mut()[index];
        layer.locked = !layer.locked;
        let label = if layer.locked { "Lock layer" } else { "Unlock layer" };
        log::debug!("{label} {id}");
        self.commit(label);
        self.resume_gesture(gesture);
        true
    }

    /// Swap a layer with its neighbour. No-op at either end of the stack.
    pub fn move_layer(&mut self, id: LayerId, direction: MoveDirection) -> bool {
        let Some(pos) = self.document.position(id) else {
            return false;
        };
        let len = self.document.len();
        let target = match direction {
            MoveDirection::Up if pos + 1 < len => pos + 1,
            MoveDirection::Down if pos > 0 => pos - 1,
            _ => return false,
        };
        let gesture = self.interrupt_gesture();
        log::debug!("Move layer {id} {direction:?}");
        self.document.layers_mut().swap(pos, target);
        self.commit("Reorder layer");
        self.resume_gesture(gesture);
        true
    }

    /// Select a layer by id. An unknown id or `None` clears the selection.
    pub fn select_layer(&mut self, id: Option<LayerId>) {
        let resolved = id.filter(|&id| self.document.contains(id));
        self.set_selection(resolved);
    }

    /// Set the view zoom, clamped to the configured range. View state only:
    /// persisted but not part of history.
    pub fn set_zoom(&mut self, zoom: f64) {
        if !zoom.is_finite() {
            return;
        }
        let zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
        if (zoom - self.document.zoom()).abs() < f64::EPSILON {
            return;
        }
        self.document.set_zoom(zoom);
        self.document.touch();
        self.emit(EditorEvent::ZoomChanged);
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the previous snapshot. Returns false if there is none.
    pub fn undo(&mut self) -> bool {
        self.end_gesture();
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        let layers = snapshot.layers.clone();
        self.restore(layers);
        true
    }

    /// Reapply the next snapshot. Returns false if there is none.
    pub fn redo(&mut self) -> bool {
        self.end_gesture();
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        let layers = snapshot.layers.clone();
        self.restore(layers);
        true
    }

    fn restore(&mut self, layers: Vec<Layer>) {
        self.document.restore_layers(layers);
        // Selection is not part of snapshots; re-resolve it by id.
        let selected = self.selected.filter(|&id| self.document.contains(id));
        self.set_selection(selected);
        self.emit(EditorEvent::LayersChanged);
        self.emit(EditorEvent::HistoryChanged);
        self.check_invariants();
    }

    /// Start a gesture on `layer`. Geometry updates to that layer are
    /// recorded as one history entry until `end_gesture`. Any other change
    /// made meanwhile gets an entry of its own.
    pub fn begin_gesture(&mut self, label: &str, layer: LayerId) {
        self.history.begin_batch(label);
        self.gesture = Some(Gesture {
            label: label.to_string(),
            layer,
        });
    }

    /// Finish the current gesture, if any.
    pub fn end_gesture(&mut self) {
        self.gesture = None;
        if self.history.is_batching() && self.history.end_batch(self.document.layers()) {
            self.emit(EditorEvent::HistoryChanged);
        }
    }

    pub fn in_gesture(&self) -> bool {
        self.history.is_batching()
    }

    /// Replace the document with persisted state. History restarts at the
    /// loaded state and the id counter moves past every loaded id.
    pub fn load(&mut self, layers: Vec<Layer>, zoom: f64) {
        self.end_gesture();
        log::info!("Loading document with {} layers", layers.len());
        let repaired = self.document.replace_contents(layers, zoom);
        if repaired > 0 {
            log::warn!("Reassigned {repaired} layer ids while loading");
        }
        self.document.mark_clean();
        self.history.reset(self.document.layers().to_vec());
        self.selected = None;
        self.events.clear();
        self.emit(EditorEvent::Loaded);
        self.check_invariants();
    }

    /// Reset to an empty document at the default zoom with a fresh history.
    pub fn clear(&mut self) {
        self.end_gesture();
        log::info!("Clearing document");
        self.document.replace_contents(Vec::new(), DEFAULT_ZOOM);
        self.document.touch();
        self.history.reset(Vec::new());
        self.selected = None;
        self.events.clear();
        self.emit(EditorEvent::Cleared);
    }

    /// Mark the document clean if nothing changed since `revision` was
    /// captured for a save.
    pub fn mark_saved(&mut self, revision: u64) -> bool {
        if self.document.revision() == revision {
            self.document.mark_clean();
            true
        } else {
            log::debug!(
                "Document changed during save (saved r{revision}, now r{})",
                self.document.revision()
            );
            false
        }
    }

    /// Repair duplicate ids and a selection pointing at a missing layer.
    /// Returns how many problems were fixed.
    fn heal_invariants(&mut self) -> usize {
        let mut healed = self.document.reassign_duplicate_ids();
        if let Some(id) = self.selected.filter(|&id| !self.document.contains(id)) {
            log::warn!("Selection pointed at missing layer {id}, cleared");
            self.set_selection(None);
            healed += 1;
        }
        healed
    }

    /// The operations above never produce a state needing repair.
    fn check_invariants(&mut self) {
        let healed = self.heal_invariants();
        debug_assert_eq!(healed, 0, "editor operation broke a layer invariant");
    }
}
