//! Layer definitions for the design canvas.

mod props;

pub use props::{Geometry, LayerProps, ObjectFit, PropsPatch, StyleProps, TextAlign};

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Unique layer identifier within a document. Allocated from a per-document
/// counter and never reused.
pub type LayerId = u64;

/// Suffix appended to the name of a duplicated layer.
pub const COPY_SUFFIX: &str = " (copia)";

/// The kind of design element a layer holds.
///
/// Serialized as its lowercase name. A type string this editor does not
/// know is kept verbatim in `Unknown` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LayerKind {
    /// Fills the whole canvas regardless of its geometry.
    Background,
    Text,
    Image,
    #[default]
    Shape,
    /// Opaque layer of a foreign type.
    Unknown(String),
}

impl LayerKind {
    /// The type string used in JSON.
    pub fn as_str(&self) -> &str {
        match self {
            LayerKind::Background => "background",
            LayerKind::Text => "text",
            LayerKind::Image => "image",
            LayerKind::Shape => "shape",
            LayerKind::Unknown(kind) => kind,
        }
    }

    /// Display name given to new layers of this kind.
    pub fn default_name(&self) -> &'static str {
        match self {
            LayerKind::Background => "Fondo",
            LayerKind::Text => "Texto",
            LayerKind::Image => "Imagen",
            LayerKind::Shape => "Forma",
            LayerKind::Unknown(_) => "Capa",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, LayerKind::Unknown(_))
    }
}

impl From<String> for LayerKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "background" => LayerKind::Background,
            "text" => LayerKind::Text,
            "image" => LayerKind::Image,
            "shape" => LayerKind::Shape,
            _ => LayerKind::Unknown(kind),
        }
    }
}

impl From<LayerKind> for String {
    fn from(kind: LayerKind) -> Self {
        match kind {
            LayerKind::Unknown(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

fn default_visible() -> bool {
    true
}

/// One positioned, typed design element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    /// Invisible layers are skipped by rendering and hit-testing.
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Locked layers keep their geometry; style edits still apply.
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub props: LayerProps,
    /// Fields this editor does not model, carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Layer {
    /// Create an unlocked, visible layer.
    pub fn new(id: LayerId, kind: LayerKind, name: impl Into<String>, props: LayerProps) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            visible: true,
            locked: false,
            props,
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_background(&self) -> bool {
        self.kind == LayerKind::Background
    }

    /// Geometry in canvas space.
    pub fn geometry(&self) -> Geometry {
        self.props.geometry
    }

    /// Bounds on a canvas of the given size. Backgrounds cover the canvas.
    pub fn bounds(&self, canvas: Size) -> Rect {
        if self.is_background() {
            canvas.to_rect()
        } else {
            self.props.geometry.as_rect()
        }
    }

    /// Whether the pointer may select or drag this layer.
    pub fn is_pointer_target(&self) -> bool {
        self.visible && !self.locked && !self.is_background()
    }

    /// Check if a canvas-space point lies inside the layer.
    pub fn hit_test(&self, point: Point, canvas: Size) -> bool {
        self.visible && self.bounds(canvas).contains(point)
    }

    /// Copy this layer under a new id, offset and renamed.
    pub fn duplicate(&self, id: LayerId, offset: f64) -> Self {
        let mut copy = self.clone();
        copy.id = id;
        copy.name.push_str(COPY_SUFFIX);
        copy.props.geometry.x += offset;
        copy.props.geometry.y += offset;
        copy
    }

    /// Apply a patch, returning the patched layer. Geometry in the patch is
    /// ignored while the layer is locked.
    pub fn patched(&self, patch: &LayerPatch) -> Self {
        let mut layer = self.clone();
        let allow_geometry = !self.locked;
        if let Some(name) = &patch.name {
            layer.name.clone_from(name);
        }
        if let Some(kind) = &patch.kind {
            layer.kind.clone_from(kind);
        }
        if let Some(visible) = patch.visible {
            layer.visible = visible;
        }
        if let Some(locked) = patch.locked {
            layer.locked = locked;
        }
        if let Some(props) = &patch.props {
            layer.props.merge(props, allow_geometry);
        }
        layer
    }
}

/// Shallow update of a layer. `props` is merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<LayerKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<PropsPatch>,
}

impl LayerPatch {
    /// A patch carrying only props.
    pub fn props(props: PropsPatch) -> Self {
        Self {
            props: Some(props),
            ..Self::default()
        }
    }

    /// Whether the patch only moves or resizes the layer.
    pub fn is_geometry_only(&self) -> bool {
        self.name.is_none()
            && self.kind.is_none()
            && self.visible.is_none()
            && self.locked.is_none()
            && self.props.as_ref().is_some_and(PropsPatch::is_geometry_only)
    }
}

/// Description of a layer to add. Unset fields take defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewLayer {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub props: PropsPatch,
}

impl NewLayer {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_props(mut self, props: PropsPatch) -> Self {
        self.props = props;
        self
    }

    /// Build the layer, merging props over `defaults`.
    pub fn build(self, id: LayerId, defaults: Geometry) -> Layer {
        let mut props = LayerProps::with_geometry(defaults);
        props.merge(&self.props, true);
        let name = self
            .name
            .unwrap_or_else(|| self.kind.default_name().to_string());
        let mut layer = Layer::new(id, self.kind, name, props);
        layer.visible = self.visible.unwrap_or(true);
        layer.locked = self.locked.unwrap_or(false);
        layer
    }
}
