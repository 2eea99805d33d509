//! Editor configuration.
//!
//! Every field has a default, so a config file only needs to name the
//! values it overrides.

use crate::layer::Geometry;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default number of snapshots kept in the undo log.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Default quiet interval before a scheduled autosave is sent.
pub const DEFAULT_AUTOSAVE_QUIET_MS: u64 = 2000;

/// Default offset applied to both axes when duplicating a layer.
pub const DEFAULT_DUPLICATE_OFFSET: f64 = 20.0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Tunables for an editor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum number of snapshots kept in history.
    pub history_limit: usize,
    /// Quiet interval for debounced autosave, in milliseconds.
    pub autosave_quiet_ms: u64,
    /// Offset applied to x and y of a duplicated layer.
    pub duplicate_offset: f64,
    /// Geometry a new layer starts with before its own props are merged.
    pub default_geometry: Geometry,
    /// Smallest width or height a resize may produce.
    pub min_layer_size: f64,
    /// Resize handle hit radius in screen pixels.
    pub handle_tolerance_px: f64,
    /// Record one history entry per drag gesture instead of one per move.
    pub coalesce_drag_history: bool,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            autosave_quiet_ms: DEFAULT_AUTOSAVE_QUIET_MS,
            duplicate_offset: DEFAULT_DUPLICATE_OFFSET,
            default_geometry: Geometry::default(),
            min_layer_size: 10.0,
            handle_tolerance_px: 8.0,
            coalesce_drag_history: true,
            min_zoom: 0.1,
            max_zoom: 5.0,
        }
    }
}

impl EditorConfig {
    /// Parse a config from a JSON string and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Quiet interval as a `Duration`.
    pub fn autosave_quiet(&self) -> Duration {
        Duration::from_millis(self.autosave_quiet_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid("historyLimit must be at least 1".into()));
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return Err(ConfigError::Invalid(format!(
                "zoom range [{}, {}] is empty or not positive",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.min_layer_size < 0.0 {
            return Err(ConfigError::Invalid("minLayerSize must not be negative".into()));
        }
        Ok(())
    }
}
