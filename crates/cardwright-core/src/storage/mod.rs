//! Persistence of designs against a backend.

mod autosave;
mod file;
mod memory;
mod record;
mod session;

pub use autosave::{AutoSaveManager, PendingSave};
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use record::{
    AssetFile, DesignData, DesignPatch, DesignRecord, NewDesign, UploadedAsset,
};
pub use session::{AutoSaveOutcome, DesignSession, SaveRequest};

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Design not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for backend operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Backend holding design records. Transport-agnostic: implementations may
/// talk HTTP, RPC, or keep records locally.
///
/// `get_design`, `update_design`, `delete_design` and `upload_asset` are safe
/// to retry. `create_design` and `duplicate_design` mint new identities and
/// must not be retried blindly.
pub trait DesignBackend: Send + Sync {
    /// Create a design for a template.
    fn create_design(&self, design: NewDesign) -> BoxFuture<'_, StorageResult<DesignRecord>>;

    /// Fetch a design.
    fn get_design(&self, id: &str) -> BoxFuture<'_, StorageResult<DesignRecord>>;

    /// Patch a design and return the updated record.
    fn update_design(
        &self,
        id: &str,
        patch: DesignPatch,
    ) -> BoxFuture<'_, StorageResult<DesignRecord>>;

    /// Copy a design under a new id.
    fn duplicate_design(
        &self,
        id: &str,
        new_name: Option<String>,
    ) -> BoxFuture<'_, StorageResult<DesignRecord>>;

    /// Delete a design. Deleting a missing design succeeds.
    fn delete_design(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Store an asset for a design and return its URL.
    fn upload_asset(
        &self,
        design_id: &str,
        file: AssetFile,
    ) -> BoxFuture<'_, StorageResult<UploadedAsset>>;

    /// List all design ids.
    fn list_designs(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;
}

/// Name of a duplicated design.
pub(crate) fn copy_name(original: Option<&str>, new_name: Option<String>) -> Option<String> {
    new_name.or_else(|| original.map(|name| format!("{name}{}", crate::layer::COPY_SUFFIX)))
}
