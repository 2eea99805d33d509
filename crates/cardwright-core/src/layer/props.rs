//! Layer attribute bags.
//!
//! Geometry is stored in canvas-space units and never scaled by zoom.
//! Style attributes are optional; which ones a layer carries depends on
//! its kind, and absent attributes are left out of the JSON form.

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Position and size of a layer in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(100.0, 100.0, 200.0, 50.0)
    }
}

impl Geometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build geometry from a kurbo rect.
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

/// How an image fills its layer box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectFit {
    Cover,
    Contain,
    Fill,
    None,
    ScaleDown,
}

/// Type-specific attributes. Text layers use the font fields, image layers
/// `src`/`object_fit`/`opacity`, shape layers `fill`/`border_radius`/`border`/`opacity`,
/// and background layers `color`/`opacity`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_decoration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_fit: Option<ObjectFit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
}

/// Overwrite `slot` only when the patch carries a value.
fn merge_field<T: Clone>(slot: &mut Option<T>, patch: &Option<T>) {
    if patch.is_some() {
        slot.clone_from(patch);
    }
}

impl StyleProps {
    /// Merge every attribute present in `patch` over `self`.
    pub fn merge(&mut self, patch: &StyleProps) {
        merge_field(&mut self.text, &patch.text);
        merge_field(&mut self.font_size, &patch.font_size);
        merge_field(&mut self.font_family, &patch.font_family);
        merge_field(&mut self.color, &patch.color);
        merge_field(&mut self.text_align, &patch.text_align);
        merge_field(&mut self.font_weight, &patch.font_weight);
        merge_field(&mut self.font_style, &patch.font_style);
        merge_field(&mut self.text_decoration, &patch.text_decoration);
        merge_field(&mut self.line_height, &patch.line_height);
        merge_field(&mut self.src, &patch.src);
        merge_field(&mut self.object_fit, &patch.object_fit);
        merge_field(&mut self.opacity, &patch.opacity);
        merge_field(&mut self.fill, &patch.fill);
        merge_field(&mut self.border_radius, &patch.border_radius);
        merge_field(&mut self.border, &patch.border);
    }
}

/// The full attribute bag of a layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerProps {
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(flatten)]
    pub style: StyleProps,
    /// Attributes this editor does not model, kept as stored.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LayerProps {
    /// Props with the given geometry and no style attributes.
    pub fn with_geometry(geometry: Geometry) -> Self {
        Self {
            geometry,
            style: StyleProps::default(),
            extra: Map::new(),
        }
    }

    /// Merge a patch over these props. Geometry fields are skipped when
    /// `allow_geometry` is false.
    pub fn merge(&mut self, patch: &PropsPatch, allow_geometry: bool) {
        if allow_geometry {
            let g = &mut self.geometry;
            g.x = patch.x.unwrap_or(g.x);
            g.y = patch.y.unwrap_or(g.y);
            g.width = patch.width.unwrap_or(g.width);
            g.height = patch.height.unwrap_or(g.height);
        }
        self.style.merge(&patch.style);
        for (key, value) in &patch.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// A partial update of layer props; only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(flatten)]
    pub style: StyleProps,
    /// Attributes outside the modelled set, merged key by key.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropsPatch {
    /// A patch that moves a layer to `(x, y)`.
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// A patch that replaces the whole geometry.
    pub fn geometry(geometry: Geometry) -> Self {
        Self {
            x: Some(geometry.x),
            y: Some(geometry.y),
            width: Some(geometry.width),
            height: Some(geometry.height),
            ..Self::default()
        }
    }

    /// A patch carrying only style attributes.
    pub fn style(style: StyleProps) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    /// Whether the patch touches position or size.
    pub fn has_geometry(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.width.is_some() || self.height.is_some()
    }

    /// Whether the patch touches position or size and nothing else.
    pub fn is_geometry_only(&self) -> bool {
        self.has_geometry() && self.style == StyleProps::default() && self.extra.is_empty()
    }
}
