//! Linear undo/redo log of layer snapshots.
//!
//! The log always holds at least one snapshot (the state the session
//! started from). `cursor` points at the snapshot matching the current
//! document. Recording after an undo drops everything past the cursor.

use crate::layer::Layer;

/// One immutable copy of the layer sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// What produced this state, e.g. "Add layer".
    pub label: String,
    pub layers: Vec<Layer>,
}

/// Bounded snapshot history with a cursor.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Snapshot>,
    cursor: usize,
    limit: usize,
    /// Label of an open batch. While set, `record` is suppressed.
    batch: Option<String>,
}

impl History {
    /// Start a history whose only entry is `initial`.
    pub fn new(initial: Vec<Layer>, limit: usize) -> Self {
        Self {
            snapshots: vec![Snapshot {
                label: "Initial state".to_string(),
                layers: initial,
            }],
            cursor: 0,
            limit: limit.max(1),
            batch: None,
        }
    }

    /// Drop all entries and start over from `initial`.
    pub fn reset(&mut self, initial: Vec<Layer>) {
        *self = Self::new(initial, self.limit);
    }

    /// Append a snapshot after the cursor. Returns false if suppressed by an
    /// open batch.
    pub fn record(&mut self, label: &str, layers: Vec<Layer>) -> bool {
        if self.batch.is_some() {
            log::trace!("History record suppressed by batch: {label}");
            return false;
        }
        self.push(label.to_string(), layers);
        true
    }

    fn push(&mut self, label: String, layers: Vec<Layer>) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(Snapshot { label, layers });
        self.cursor = self.snapshots.len() - 1;

        while self.snapshots.len() > self.limit {
            self.snapshots.remove(0);
            self.cursor -= 1;
        }

        log::debug!(
            "History recorded '{}' ({} of {})",
            self.snapshots[self.cursor].label,
            self.cursor + 1,
            self.snapshots.len()
        );
    }

    /// Step back. Returns the snapshot to restore.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        log::debug!("Undo '{}'", self.snapshots[self.cursor].label);
        self.cursor -= 1;
        Some(&self.snapshots[self.cursor])
    }

    /// Step forward. Returns the snapshot to restore.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        log::debug!("Redo '{}'", self.snapshots[self.cursor].label);
        Some(&self.snapshots[self.cursor])
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Label of the change an undo would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.can_undo()
            .then(|| self.snapshots[self.cursor].label.as_str())
    }

    /// Label of the change a redo would reapply.
    pub fn redo_label(&self) -> Option<&str> {
        self.can_redo()
            .then(|| self.snapshots[self.cursor + 1].label.as_str())
    }

    /// The snapshot matching the current document.
    pub fn current(&self) -> &Snapshot {
        &self.snapshots[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Open a batch. Individual records are suppressed until `end_batch`.
    pub fn begin_batch(&mut self, label: &str) {
        if let Some(open) = &self.batch {
            log::warn!("Batch '{open}' still open when starting '{label}'");
        }
        self.batch = Some(label.to_string());
    }

    pub fn is_batching(&self) -> bool {
        self.batch.is_some()
    }

    /// Close the batch, recording `layers` once if they differ from the
    /// current snapshot. Returns true if an entry was recorded.
    pub fn end_batch(&mut self, layers: &[Layer]) -> bool {
        let Some(label) = self.batch.take() else {
            return false;
        };
        if self.current().layers == layers {
            log::trace!("Batch '{label}' closed without changes");
            return false;
        }
        self.push(label, layers.to_vec());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{Geometry, LayerKind, LayerProps};

    fn state(ids: &[u64]) -> Vec<Layer> {
        ids.iter()
            .map(|&id| {
                Layer::new(
                    id,
                    LayerKind::Shape,
                    "s",
                    LayerProps::with_geometry(Geometry::default()),
                )
            })
            .collect()
    }

    #[test]
    fn test_new_history_has_nothing_to_undo() {
        let mut history = History::new(state(&[]), 50);
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_undo_redo_walks_cursor() {
        let mut history = History::new(state(&[]), 50);
        history.record("Add", state(&[1]));
        history.record("Add", state(&[1, 2]));

        assert_eq!(history.undo().unwrap().layers, state(&[1]));
        assert_eq!(history.undo().unwrap().layers, state(&[]));
        assert!(history.undo().is_none());
        assert_eq!(history.redo().unwrap().layers, state(&[1]));
        assert_eq!(history.cursor(), 1);
        assert!(history.can_redo());
    }

    #[test]
    fn test_record_after_undo_discards_redo_branch() {
        let mut history = History::new(state(&[]), 50);
        history.record("S1", state(&[1]));
        history.record("S2", state(&[1, 2]));
        history.undo();
        history.record("S1+m", state(&[1, 3]));

        let labels: Vec<_> = history.snapshots().iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Initial state", "S1", "S1+m"]);
        assert!(!history.can_redo());
        assert_eq!(history.current().layers, state(&[1, 3]));
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::new(state(&[]), 3);
        for id in 1..=5 {
            history.record("Add", state(&[id]));
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);
        assert_eq!(history.snapshots()[0].layers, state(&[3]));
        assert_eq!(history.undo().unwrap().layers, state(&[4]));
        assert_eq!(history.undo().unwrap().layers, state(&[3]));
        assert!(history.undo().is_none());
    }

    #[test]
    fn test_labels() {
        let mut history = History::new(state(&[]), 50);
        assert_eq!(history.undo_label(), None);
        history.record("Add layer", state(&[1]));
        assert_eq!(history.undo_label(), Some("Add layer"));
        history.undo();
        assert_eq!(history.redo_label(), Some("Add layer"));
    }

    #[test]
    fn test_batch_records_once() {
        let mut history = History::new(state(&[]), 50);
        history.begin_batch("Drag");
        assert!(!history.record("Move", state(&[1])));
        assert!(!history.record("Move", state(&[1, 2])));
        assert!(history.end_batch(&state(&[1, 2])));

        assert_eq!(history.len(), 2);
        assert_eq!(history.undo_label(), Some("Drag"));
    }

    #[test]
    fn test_batch_without_change_records_nothing() {
        let mut history = History::new(state(&[1]), 50);
        history.begin_batch("Drag");
        assert!(!history.end_batch(&state(&[1])));
        assert_eq!(history.len(), 1);
        assert!(!history.is_batching());
    }
}
