//! Persisted design records.

use crate::document::{DEFAULT_ZOOM, Document};
use crate::layer::Layer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Editor state as stored inside a design record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignData {
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

fn default_zoom() -> f64 {
    DEFAULT_ZOOM
}

impl DesignData {
    /// Capture a document's layers and zoom.
    pub fn capture(document: &Document, updated_at: DateTime<Utc>) -> Self {
        Self {
            layers: document.layers().to_vec(),
            zoom: document.zoom(),
            updated_at,
        }
    }

    /// Empty design data.
    pub fn empty(updated_at: DateTime<Utc>) -> Self {
        Self {
            layers: Vec::new(),
            zoom: DEFAULT_ZOOM,
            updated_at,
        }
    }
}

/// A design as the backend stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignRecord {
    pub id: String,
    pub template_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub design_data: DesignData,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl DesignRecord {
    /// Serialize the record to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a record from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Apply a patch, stamping the record with `now`.
    pub fn apply(&mut self, patch: DesignPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = Some(name);
        }
        if let Some(data) = patch.design_data {
            self.design_data = data;
        }
        self.updated_at = now;
    }
}

/// Partial update of a design record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_data: Option<DesignData>,
}

impl DesignPatch {
    pub fn data(data: DesignData) -> Self {
        Self {
            design_data: Some(data),
            ..Self::default()
        }
    }
}

/// Parameters of a new design.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewDesign {
    pub template_id: String,
    pub event_id: Option<String>,
    pub name: Option<String>,
}

impl NewDesign {
    pub fn for_template(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            ..Self::default()
        }
    }
}

/// A file to upload as a design asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Where an uploaded asset can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub url: String,
}
