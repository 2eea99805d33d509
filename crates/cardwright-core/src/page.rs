//! Template page sizes and the canvas dimensions they imply.

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Paper size class of a template. Canvas units are two per millimetre.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageSize {
    #[default]
    A4,
    A5,
    A6,
    #[serde(rename = "custom")]
    Custom { width: f64, height: f64 },
}

impl PageSize {
    /// Canvas dimensions used for clamping.
    pub fn canvas_size(self) -> Size {
        match self {
            PageSize::A4 => Size::new(420.0, 594.0),
            PageSize::A5 => Size::new(297.0, 420.0),
            PageSize::A6 => Size::new(210.0, 297.0),
            PageSize::Custom { width, height } => Size::new(width.max(0.0), height.max(0.0)),
        }
    }
}

/// The template an editor session was opened from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    pub id: String,
    #[serde(default)]
    pub size: PageSize,
}

impl TemplateDescriptor {
    pub fn new(id: impl Into<String>, size: PageSize) -> Self {
        Self { id: id.into(), size }
    }

    pub fn canvas_size(&self) -> Size {
        self.size.canvas_size()
    }
}
