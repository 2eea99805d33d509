//! Debounced autosave.
//!
//! The manager never touches a backend. It holds at most one pending payload
//! and hands it out once the document has been quiet for the configured
//! interval; the caller sends it and reports failures back.

use super::DesignData;
use std::time::{Duration, Instant};

/// A payload waiting for its quiet period to elapse.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    pub data: DesignData,
    /// Document revision the payload was captured at.
    pub revision: u64,
    /// Earliest time the payload may be sent.
    pub due: Instant,
}

/// Coalesces rapid autosave requests into one save of the latest state.
#[derive(Debug, Clone)]
pub struct AutoSaveManager {
    /// Quiet period after the last request.
    quiet: Duration,
    pending: Option<PendingSave>,
}

impl AutoSaveManager {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Queue `data`, replacing any pending payload and restarting the
    /// quiet period.
    pub fn schedule(&mut self, data: DesignData, revision: u64, now: Instant) {
        if let Some(old) = &self.pending {
            log::trace!("Autosave r{} superseded by r{revision}", old.revision);
        }
        self.pending = Some(PendingSave {
            data,
            revision,
            due: now + self.quiet,
        });
    }

    /// Take the pending payload if its quiet period has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<PendingSave> {
        if self.pending.as_ref().is_some_and(|p| p.due <= now) {
            self.pending.take()
        } else {
            None
        }
    }

    /// Put back a payload whose save failed, unless a newer one is queued.
    /// Returns true if it was requeued.
    pub fn requeue(&mut self, save: PendingSave, now: Instant) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(PendingSave {
            due: now + self.quiet,
            ..save
        });
        true
    }

    /// Drop the pending payload.
    pub fn cancel(&mut self) -> Option<PendingSave> {
        let pending = self.pending.take();
        if let Some(p) = &pending {
            log::debug!("Autosave of r{} cancelled", p.revision);
        }
        pending
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Revision of the pending payload.
    pub fn pending_revision(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.revision)
    }

    /// When the pending payload becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }
}
