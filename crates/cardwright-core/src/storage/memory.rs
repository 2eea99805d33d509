//! In-memory design backend.

use super::{
    AssetFile, BoxFuture, DesignBackend, DesignData, DesignPatch, DesignRecord, NewDesign,
    StorageError, StorageResult, UploadedAsset, copy_name,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// In-memory backend for testing and ephemeral use.
///
/// Counts update calls and can be told to fail the next few updates, so
/// save and autosave paths can be exercised without a server.
#[derive(Default)]
pub struct MemoryBackend {
    designs: RwLock<HashMap<String, DesignRecord>>,
    assets: RwLock<HashMap<String, Vec<u8>>>,
    update_calls: AtomicUsize,
    failing_updates: AtomicUsize,
}

impl MemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `update_design` calls received, failed ones included.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Make the next `count` updates fail with an IO error.
    pub fn fail_next_updates(&self, count: usize) {
        self.failing_updates.store(count, Ordering::SeqCst);
    }

    /// Bytes of an uploaded asset, by URL.
    pub fn asset(&self, url: &str) -> Option<Vec<u8>> {
        self.assets.read().ok()?.get(url).cloned()
    }

    fn lock_error(e: impl std::fmt::Display) -> StorageError {
        StorageError::Other(format!("Lock error: {}", e))
    }

    fn insert(&self, record: DesignRecord) -> StorageResult<DesignRecord> {
        let mut designs = self.designs.write().map_err(Self::lock_error)?;
        designs.insert(record.id.clone(), record.clone());
        Ok(record)
    }
}

impl DesignBackend for MemoryBackend {
    fn create_design(&self, design: NewDesign) -> BoxFuture<'_, StorageResult<DesignRecord>> {
        Box::pin(async move {
            let now = Utc::now();
            self.insert(DesignRecord {
                id: Uuid::new_v4().to_string(),
                template_id: design.template_id,
                event_id: design.event_id,
                name: design.name,
                design_data: DesignData::empty(now),
                updated_at: now,
            })
        })
    }

    fn get_design(&self, id: &str) -> BoxFuture<'_, StorageResult<DesignRecord>> {
        let id = id.to_string();
        Box::pin(async move {
            let designs = self.designs.read().map_err(Self::lock_error)?;
            designs
                .get(&id)
                .cloned()
                .ok_or(StorageError::NotFound(id))
        })
    }

    fn update_design(
        &self,
        id: &str,
        patch: DesignPatch,
    ) -> BoxFuture<'_, StorageResult<DesignRecord>> {
        let id = id.to_string();
        Box::pin(async move {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            let failing = self.failing_updates.load(Ordering::SeqCst);
            if failing > 0 {
                self.failing_updates.store(failing - 1, Ordering::SeqCst);
                return Err(StorageError::Io("Simulated update failure".to_string()));
            }

            let mut designs = self.designs.write().map_err(Self::lock_error)?;
            let record = designs
                .get_mut(&id)
                .ok_or_else(|| StorageError::NotFound(id.clone()))?;
            record.apply(patch, Utc::now());
            Ok(record.clone())
        })
    }

    fn duplicate_design(
        &self,
        id: &str,
        new_name: Option<String>,
    ) -> BoxFuture<'_, StorageResult<DesignRecord>> {
        let id = id.to_string();
        Box::pin(async move {
            let source = {
                let designs = self.designs.read().map_err(Self::lock_error)?;
                designs
                    .get(&id)
                    .cloned()
                    .ok_or(StorageError::NotFound(id))?
            };
            let now = Utc::now();
            self.insert(DesignRecord {
                id: Uuid::new_v4().to_string(),
                name: copy_name(source.name.as_deref(), new_name),
                updated_at: now,
                ..source
            })
        })
    }

    fn delete_design(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut designs = self.designs.write().map_err(Self::lock_error)?;
            designs.remove(&id);
            Ok(())
        })
    }

    fn upload_asset(
        &self,
        design_id: &str,
        file: AssetFile,
    ) -> BoxFuture<'_, StorageResult<UploadedAsset>> {
        let design_id = design_id.to_string();
        Box::pin(async move {
            if !self.designs.read().map_err(Self::lock_error)?.contains_key(&design_id) {
                return Err(StorageError::NotFound(design_id));
            }
            let url = format!("memory://{design_id}/{}", file.file_name);
            let mut assets = self.assets.write().map_err(Self::lock_error)?;
            assets.insert(url.clone(), file.bytes);
            Ok(UploadedAsset { url })
        })
    }

    fn list_designs(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let designs = self.designs.read().map_err(Self::lock_error)?;
            Ok(designs.keys().cloned().collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;

    #[test]
    fn test_create_and_get() {
        let backend = MemoryBackend::new();
        let created = block_on(backend.create_design(NewDesign::for_template("t1"))).unwrap();
        let loaded = block_on(backend.get_design(&created.id)).unwrap();

        assert_eq!(created, loaded);
        assert_eq!(loaded.template_id, "t1");
        assert!(loaded.design_data.layers.is_empty());
    }

    #[test]
    fn test_not_found() {
        let backend = MemoryBackend::new();
        let result = block_on(backend.get_design("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));

        let result = block_on(backend.update_design("nonexistent", DesignPatch::default()));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_update_counts_and_fails_on_demand() {
        let backend = MemoryBackend::new();
        let created = block_on(backend.create_design(NewDesign::for_template("t"))).unwrap();

        backend.fail_next_updates(1);
        let patch = DesignPatch {
            name: Some("Boda".into()),
            design_data: None,
        };
        assert!(block_on(backend.update_design(&created.id, patch.clone())).is_err());
        let updated = block_on(backend.update_design(&created.id, patch)).unwrap();

        assert_eq!(updated.name.as_deref(), Some("Boda"));
        assert_eq!(backend.update_calls(), 2);
    }

    #[test]
    fn test_duplicate() {
        let backend = MemoryBackend::new();
        let mut design = NewDesign::for_template("t");
        design.name = Some("Boda".into());
        let created = block_on(backend.create_design(design)).unwrap();

        let copy = block_on(backend.duplicate_design(&created.id, None)).unwrap();
        assert_ne!(copy.id, created.id);
        assert_eq!(copy.name.as_deref(), Some("Boda (copia)"));
        assert_eq!(copy.template_id, "t");

        let named = block_on(backend.duplicate_design(&created.id, Some("Otra".into()))).unwrap();
        assert_eq!(named.name.as_deref(), Some("Otra"));
        assert_eq!(block_on(backend.list_designs()).unwrap().len(), 3);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let backend = MemoryBackend::new();
        let created = block_on(backend.create_design(NewDesign::for_template("t"))).unwrap();
        block_on(backend.delete_design(&created.id)).unwrap();
        block_on(backend.delete_design(&created.id)).unwrap();
        assert!(block_on(backend.list_designs()).unwrap().is_empty());
    }

    #[test]
    fn test_upload_asset() {
        let backend = MemoryBackend::new();
        let created = block_on(backend.create_design(NewDesign::for_template("t"))).unwrap();
        let file = AssetFile {
            file_name: "photo.png".into(),
            content_type: Some("image/png".into()),
            bytes: vec![1, 2, 3],
        };

        let asset = block_on(backend.upload_asset(&created.id, file.clone())).unwrap();
        assert_eq!(backend.asset(&asset.url), Some(vec![1, 2, 3]));
        assert!(block_on(backend.upload_asset("missing", file)).is_err());
    }
}
