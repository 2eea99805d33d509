//! The design document: ordered layers, zoom and dirty state.

use crate::layer::{Layer, LayerId};
use kurbo::{Point, Size};
use std::collections::HashSet;

/// Zoom a fresh document starts with.
pub const DEFAULT_ZOOM: f64 = 1.0;

/// Loaded ids must leave at least this many allocations before the counter
/// would overflow, otherwise the loaded layers are renumbered.
const ID_HEADROOM: LayerId = 1 << 32;

/// Layers in z-order (back to front) plus view state.
///
/// Array position is the only source of z-order; ids say nothing about
/// stacking.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    layers: Vec<Layer>,
    zoom: f64,
    dirty: bool,
    /// Next id to hand out. Never decreases.
    next_id: LayerId,
    /// Bumped on every change, used to tell whether a save is still current.
    revision: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            zoom: DEFAULT_ZOOM,
            dirty: false,
            next_id: 1,
            revision: 0,
        }
    }

    /// Build a clean document from persisted layers.
    pub fn from_layers(layers: Vec<Layer>, zoom: f64) -> Self {
        let mut doc = Self::new();
        doc.replace_contents(layers, zoom);
        doc.dirty = false;
        doc
    }

    /// Replace layers and zoom, recomputing the id counter from the new
    /// layers. The counter never moves backwards, except when ids too close
    /// to `LayerId::MAX` force a renumbering of the incoming layers.
    ///
    /// Duplicate ids among the incoming layers are reassigned. Returns the
    /// number of layers whose id changed.
    pub(crate) fn replace_contents(&mut self, mut layers: Vec<Layer>, zoom: f64) -> usize {
        let max_id = layers.iter().map(|l| l.id).max().unwrap_or(0);
        let repaired = if max_id > LayerId::MAX - ID_HEADROOM {
            log::warn!("Layer id {max_id} leaves no room for new ids, renumbering layers");
            for (layer, id) in layers.iter_mut().zip(1..) {
                layer.id = id;
            }
            self.next_id = layers.len() as LayerId + 1;
            layers.len()
        } else {
            self.next_id = self.next_id.max(max_id + 1);
            0
        };
        self.layers = layers;
        self.zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { DEFAULT_ZOOM };
        self.revision += 1;
        repaired + self.reassign_duplicate_ids()
    }

    /// Give every layer whose id already appeared earlier in the order a
    /// fresh id. Returns how many were reassigned.
    pub(crate) fn reassign_duplicate_ids(&mut self) -> usize {
        let mut seen = HashSet::new();
        let duplicates: Vec<usize> = self
            .layers
            .iter()
            .enumerate()
            .filter(|(_, l)| !seen.insert(l.id))
            .map(|(i, _)| i)
            .collect();
        for &index in &duplicates {
            let id = self.allocate_id();
            let layer = &mut self.layers[index];
            log::warn!("Duplicate layer id {} reassigned to {id}", layer.id);
            layer.id = id;
        }
        duplicates.len()
    }

    /// Swap in a restored layer sequence (undo/redo).
    pub(crate) fn restore_layers(&mut self, layers: Vec<Layer>) {
        self.layers = layers;
        self.touch();
    }

    /// Record that the document changed.
    pub(crate) fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    /// Hand out the next layer id.
    pub(crate) fn allocate_id(&mut self) -> LayerId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn layers_mut(&mut self) -> &mut Vec<Layer> {
        &mut self.layers
    }

    pub(crate) fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Layers back to front.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Whether there are changes not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The id the next added layer will get.
    pub fn next_id(&self) -> LayerId {
        self.next_id
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Index of a layer in z-order.
    pub fn position(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.position(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Layer ids in z-order.
    pub fn ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|l| l.id).collect()
    }

    /// Topmost visible layer under a canvas-space point, locked ones included.
    pub fn layer_at_point(&self, point: Point, canvas: Size) -> Option<&Layer> {
        self.layers
            .iter()
            .rev()
            .find(|l| !l.is_background() && l.hit_test(point, canvas))
    }

    /// Topmost layer under a canvas-space point that accepts pointer
    /// selection. Locked, hidden and background layers are transparent.
    pub fn pointer_target_at(&self, point: Point, canvas: Size) -> Option<&Layer> {
        self.layers
            .iter()
            .rev()
            .find(|l| l.is_pointer_target() && l.hit_test(point, canvas))
    }
}
