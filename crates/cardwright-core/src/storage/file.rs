//! File-based design backend.

use super::{
    AssetFile, BoxFuture, DesignBackend, DesignData, DesignPatch, DesignRecord, NewDesign,
    StorageError, StorageResult, UploadedAsset, copy_name,
};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Stores each design as a JSON file and assets under `assets/<design>/`.
pub struct FileBackend {
    /// Base directory for design storage.
    base_path: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create a backend in the default location.
    ///
    /// On Unix: `~/.local/share/cardwright/designs/`
    /// On Windows: `%LOCALAPPDATA%\cardwright\designs\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("cardwright").join("designs"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Make an id or file name safe to use as a path component.
    fn sanitize(name: &str) -> String {
        name.chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect::<String>()
            .trim_start_matches('.')
            .to_string()
    }

    fn design_path(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", Self::sanitize(id)))
    }

    fn read(&self, id: &str) -> StorageResult<DesignRecord> {
        let path = self.design_path(id);
        if !path.exists() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let json = fs::read_to_string(&path).map_err(|e| {
            StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        DesignRecord::from_json(&json).map_err(|e| {
            StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    fn write(&self, record: &DesignRecord) -> StorageResult<()> {
        let path = self.design_path(&record.id);
        let json = record
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        // Write through a temp file so a crash never leaves a half-written design.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| {
            StorageError::Io(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            StorageError::Io(format!("Failed to replace {}: {}", path.display(), e))
        })
    }
}

impl DesignBackend for FileBackend {
    fn create_design(&self, design: NewDesign) -> BoxFuture<'_, StorageResult<DesignRecord>> {
        Box::pin(async move {
            let now = Utc::now();
            let record = DesignRecord {
                id: Uuid::new_v4().to_string(),
                template_id: design.template_id,
                event_id: design.event_id,
                name: design.name,
                design_data: DesignData::empty(now),
                updated_at: now,
            };
            self.write(&record)?;
            log::info!("Created design {}", record.id);
            Ok(record)
        })
    }

    fn get_design(&self, id: &str) -> BoxFuture<'_, StorageResult<DesignRecord>> {
        let id = id.to_string();
        Box::pin(async move { self.read(&id) })
    }

    fn update_design(
        &self,
        id: &str,
        patch: DesignPatch,
    ) -> BoxFuture<'_, StorageResult<DesignRecord>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut record = self.read(&id)?;
            record.apply(patch, Utc::now());
            self.write(&record)?;
            Ok(record)
        })
    }

    fn duplicate_design(
        &self,
        id: &str,
        new_name: Option<String>,
    ) -> BoxFuture<'_, StorageResult<DesignRecord>> {
        let id = id.to_string();
        Box::pin(async move {
            let source = self.read(&id)?;
            let record = DesignRecord {
                id: Uuid::new_v4().to_string(),
                name: copy_name(source.name.as_deref(), new_name),
                updated_at: Utc::now(),
                ..source
            };
            self.write(&record)?;
            log::info!("Duplicated design {id} as {}", record.id);
            Ok(record)
        })
    }

    fn delete_design(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.design_path(id);
        let assets = self.base_path.join("assets").join(Self::sanitize(id));
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            if assets.exists() {
                fs::remove_dir_all(&assets).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", assets.display(), e))
                })?;
            }
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
            if !self.design_path(&design_id).exists() {
                return Err(StorageError::NotFound(design_id));
            }
            let dir = self.base_path.join("assets").join(Self::sanitize(&design_id));
            fs::create_dir_all(&dir).map_err(|e| {
                StorageError::Io(format!("Failed to create {}: {}", dir.display(), e))
            })?;
            let path = dir.join(Self::sanitize(&file.file_name));
            fs::write(&path, &file.bytes).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })?;
            Ok(UploadedAsset {
                url: format!("file://{}", path.display()),
            })
        })
    }

    fn list_designs(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&base).map_err(|e| {
                StorageError::Io(format!("Failed to read directory: {}", e))
            })?;

            let mut ids = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    if let Some(stem) = path.file_stem() {
                        ids.push(stem.to_string_lossy().to_string());
                    }
                }
            }
            Ok(ids)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::layer::{Geometry, LayerKind, NewLayer};
    use pollster::block_on;
    use tempfile::TempDir;

    fn backend() -> (TempDir, FileBackend) {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();
        (dir, backend)
    }

    #[test]
    fn test_save_and_load() {
        let (_dir, backend) = backend();
        let created = block_on(backend.create_design(NewDesign::for_template("t"))).unwrap();

        let layer = NewLayer::new(LayerKind::Text).build(1, Geometry::default());
        let data = DesignData::capture(&Document::from_layers(vec![layer], 1.0), Utc::now());
        block_on(backend.update_design(&created.id, DesignPatch::data(data.clone()))).unwrap();

        let loaded = block_on(backend.get_design(&created.id)).unwrap();
        assert_eq!(loaded.design_data, data);
        assert!(!backend.design_path(&created.id).with_extension("json.tmp").exists());
    }

    #[test]
    fn test_not_found() {
        let (_dir, backend) = backend();
        let result = block_on(backend.get_design("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let (dir, backend) = backend();
        fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        let result = block_on(backend.get_design("bad"));
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[test]
    fn test_list_and_delete() {
        let (_dir, backend) = backend();
        let a = block_on(backend.create_design(NewDesign::for_template("t"))).unwrap();
        let b = block_on(backend.duplicate_design(&a.id, None)).unwrap();

        let list = block_on(backend.list_designs()).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains(&a.id));
        assert!(list.contains(&b.id));

        block_on(backend.delete_design(&a.id)).unwrap();
        assert_eq!(block_on(backend.list_designs()).unwrap(), vec![b.id]);
    }

    #[test]
    fn test_upload_asset_written_to_disk() {
        let (dir, backend) = backend();
        let created = block_on(backend.create_design(NewDesign::for_template("t"))).unwrap();
        let file = AssetFile {
            file_name: "../logo.png".into(),
            content_type: None,
            bytes: vec![9, 8, 7],
        };

        let asset = block_on(backend.upload_asset(&created.id, file)).unwrap();
        assert!(asset.url.starts_with("file://"));
        let path = dir.path().join("assets").join(&created.id).join("_logo.png");
        assert_eq!(fs::read(path).unwrap(), vec![9, 8, 7]);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(FileBackend::sanitize("abc-123_x"), "abc-123_x");
        assert_eq!(FileBackend::sanitize("../etc/passwd"), "_etc_passwd");
        assert_eq!(FileBackend::sanitize("a b"), "a_b");
    }
}
