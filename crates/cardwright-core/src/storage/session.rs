//! Binds an editor session to one design record.

use super::{
    AssetFile, AutoSaveManager, DesignBackend, DesignData, DesignPatch, DesignRecord, NewDesign,
    StorageResult, UploadedAsset,
};
use crate::config::EditorConfig;
use crate::editor::Editor;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// A captured payload and the document revision it reflects.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub data: DesignData,
    pub revision: u64,
}

/// Result of polling the autosave timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSaveOutcome {
    /// Nothing was due.
    Idle,
    /// The payload at `revision` was written.
    Saved { revision: u64 },
    /// The write failed; the payload was queued again unless a newer one was
    /// already waiting.
    Failed { revision: u64, requeued: bool },
}

/// Persistence adapter for one design.
///
/// Saving is split in two so that a write in flight never borrows the
/// editor: [`prepare_save`](Self::prepare_save) captures the payload,
/// [`send`](Self::send) writes it, and the caller hands the revision back to
/// [`Editor::mark_saved`]. [`save`](Self::save) does all three.
pub struct DesignSession<B: DesignBackend> {
    backend: Arc<B>,
    design_id: String,
    autosave: AutoSaveManager,
    /// Last captured payload, reused while the document is unchanged.
    last_payload: Option<SaveRequest>,
    closed: bool,
}

impl<B: DesignBackend> DesignSession<B> {
    pub fn new(backend: Arc<B>, design_id: impl Into<String>, config: &EditorConfig) -> Self {
        Self {
            backend,
            design_id: design_id.into(),
            autosave: AutoSaveManager::new(config.autosave_quiet()),
            last_payload: None,
            closed: false,
        }
    }

    /// Create a new design on the backend and bind a session to it.
    pub async fn create(
        backend: Arc<B>,
        design: NewDesign,
        config: &EditorConfig,
    ) -> StorageResult<(Self, DesignRecord)> {
        let record = backend.create_design(design).await?;
        let session = Self::new(backend, record.id.clone(), config);
        Ok((session, record))
    }

    pub fn design_id(&self) -> &str {
        &self.design_id
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn has_pending_autosave(&self) -> bool {
        self.autosave.has_pending()
    }

    /// When the pending autosave becomes due, for hosts that arm a timer.
    pub fn autosave_deadline(&self) -> Option<Instant> {
        self.autosave.deadline()
    }

    /// Fetch the design and load it into `editor`.
    pub async fn load(&mut self, editor: &mut Editor) -> StorageResult<DesignRecord> {
        let record = self.backend.get_design(&self.design_id).await?;
        self.autosave.cancel();
        let data = &record.design_data;
        editor.load(data.layers.clone(), data.zoom);
        self.last_payload = Some(SaveRequest {
            data: data.clone(),
            revision: editor.document().revision(),
        });
        log::info!(
            "Loaded design {} ({} layers)",
            self.design_id,
            editor.layers().len()
        );
        Ok(record)
    }

    /// Capture the editor state for saving. Repeated calls without an
    /// intervening edit return the same payload.
    pub fn prepare_save(&mut self, editor: &Editor) -> SaveRequest {
        let revision = editor.document().revision();
        if let Some(cached) = self.last_payload.as_ref().filter(|p| p.revision == revision) {
            return cached.clone();
        }
        let request = SaveRequest {
            data: DesignData::capture(editor.document(), Utc::now()),
            revision,
        };
        self.last_payload = Some(request.clone());
        request
    }

    /// Write a captured payload to the backend.
    pub async fn send(&self, request: &SaveRequest) -> StorageResult<DesignRecord> {
        let record = self
            .backend
            .update_design(&self.design_id, DesignPatch::data(request.data.clone()))
            .await?;
        log::info!("Saved design {} at r{}", self.design_id, request.revision);
        Ok(record)
    }

    /// Save the editor state now. A pending autosave that this save covers
    /// is dropped.
    pub async fn save(&mut self, editor: &mut Editor) -> StorageResult<DesignRecord> {
        let request = self.prepare_save(editor);
        let record = self.send(&request).await?;
        if self
            .autosave
            .pending_revision()
            .is_some_and(|pending| pending <= request.revision)
        {
            self.autosave.cancel();
        }
        editor.mark_saved(request.revision);
        Ok(record)
    }

    /// Schedule a debounced save of the editor state. Ignored once closed.
    pub fn autosave(&mut self, editor: &Editor, now: Instant) {
        if self.closed {
            log::debug!("Autosave after close ignored");
            return;
        }
        let request = self.prepare_save(editor);
        self.autosave.schedule(request.data, request.revision, now);
    }

    /// Send the pending autosave if its quiet period has elapsed. On
    /// success, pass the revision to [`Editor::mark_saved`].
    pub async fn poll_autosave(&mut self, now: Instant) -> AutoSaveOutcome {
        if self.closed {
            return AutoSaveOutcome::Idle;
        }
        let Some(pending) = self.autosave.take_due(now) else {
            return AutoSaveOutcome::Idle;
        };
        let request = SaveRequest {
            data: pending.data.clone(),
            revision: pending.revision,
        };
        match self.send(&request).await {
            Ok(_) => AutoSaveOutcome::Saved {
                revision: request.revision,
            },
            Err(e) => {
                log::warn!("Autosave of design {} failed: {}", self.design_id, e);
                let requeued = !self.closed && self.autosave.requeue(pending, now);
                AutoSaveOutcome::Failed {
                    revision: request.revision,
                    requeued,
                }
            }
        }
    }

    /// End the session. Pending autosaves are dropped and later ones
    /// ignored.
    pub fn close(&mut self) {
        self.autosave.cancel();
        self.closed = true;
        log::debug!("Closed session for design {}", self.design_id);
    }

    /// Reset the editor to an empty document. Nothing is written until the
    /// next save.
    pub fn clear(&mut self, editor: &mut Editor) {
        self.autosave.cancel();
        editor.clear();
    }

    /// Copy the stored design under a new id.
    pub async fn duplicate(&self, new_name: Option<String>) -> StorageResult<DesignRecord> {
        self.backend
            .duplicate_design(&self.design_id, new_name)
            .await
    }

    pub async fn upload_asset(&self, file: AssetFile) -> StorageResult<UploadedAsset> {
        self.backend.upload_asset(&self.design_id, file).await
    }

    /// Delete the stored design and close the session.
    pub async fn delete(mut self) -> StorageResult<()> {
        self.close();
        self.backend.delete_design(&self.design_id).await
    }
}
