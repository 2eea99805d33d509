//! Pointer interaction: click-to-select, drag and corner resize.
//!
//! Pointer positions arrive in screen pixels and are converted to canvas
//! space with the document zoom before any geometry is computed. Every
//! resulting position or size is clamped to the canvas.

use crate::editor::Editor;
use crate::input::PointerEvent;
use crate::layer::{Geometry, LayerId, LayerPatch, PropsPatch};
use crate::page::TemplateDescriptor;
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Size, Vec2};

/// Corner positions of a resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// A resize handle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub position: Point,
    pub corner: Corner,
}

impl Handle {
    /// Check if a canvas-space point hits this handle. `tolerance` is in
    /// canvas units, so callers divide screen tolerance by zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= tolerance * tolerance
    }
}

/// The four corner handles of a rectangle.
pub fn corner_handles(bounds: Rect) -> [Handle; 4] {
    [
        Handle {
            position: Point::new(bounds.x0, bounds.y0),
            corner: Corner::TopLeft,
        },
        Handle {
            position: Point::new(bounds.x1, bounds.y0),
            corner: Corner::TopRight,
        },
        Handle {
            position: Point::new(bounds.x0, bounds.y1),
            corner: Corner::BottomLeft,
        },
        Handle {
            position: Point::new(bounds.x1, bounds.y1),
            corner: Corner::BottomRight,
        },
    ]
}

/// Clamp a top-left position so a box of `size` stays on the canvas.
/// A box larger than the canvas is pinned to the origin.
pub fn clamp_position(candidate: Point, size: Size, canvas: Size) -> Point {
    let max_x = (canvas.width - size.width).max(0.0);
    let max_y = (canvas.height - size.height).max(0.0);
    Point::new(candidate.x.max(0.0).min(max_x), candidate.y.max(0.0).min(max_y))
}

/// Resize `original` by moving one corner by `delta`. The opposite corner
/// stays put, the moved corner is clamped to the canvas, flipped corners are
/// normalized, and the result is at least `min_size` on each side.
pub fn resize_rect(
    original: Rect,
    corner: Corner,
    delta: Vec2,
    canvas: Size,
    min_size: f64,
) -> Rect {
    let (x0, y0, x1, y1) = match corner {
        Corner::TopLeft => (original.x0 + delta.x, original.y0 + delta.y, original.x1, original.y1),
        Corner::TopRight => (
            original.x0,
            original.y0 + delta.y,
            original.x1 + delta.x,
            original.y1,
        ),
        Corner::BottomLeft => (
            original.x0 + delta.x,
            original.y0,
            original.x1,
            original.y1 + delta.y,
        ),
        Corner::BottomRight => (
            original.x0,
            original.y0,
            original.x1 + delta.x,
            original.y1 + delta.y,
        ),
    };

    let clamp_x = |x: f64| x.max(0.0).min(canvas.width);
    let clamp_y = |y: f64| y.max(0.0).min(canvas.height);
    let (x0, x1) = (clamp_x(x0), clamp_x(x1));
    let (y0, y1) = (clamp_y(y0), clamp_y(y1));

    let (x0, x1) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
    let (y0, y1) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };

    let width = (x1 - x0).max(min_size).min(canvas.width);
    let height = (y1 - y0).max(min_size).min(canvas.height);
    let origin = clamp_position(Point::new(x0, y0), Size::new(width, height), canvas);

    Rect::from_origin_size(origin, Size::new(width, height))
}

/// Active pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Drag {
        layer: LayerId,
        /// Pointer position minus layer origin at pointer-down.
        offset: Vec2,
    },
    Resize {
        layer: LayerId,
        corner: Corner,
        start: Point,
        original: Rect,
    },
}

/// What a pointer event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Nothing changed.
    Ignored,
    /// Selection cleared by a click on empty canvas.
    SelectionCleared,
    DragStarted(LayerId),
    ResizeStarted(LayerId, Corner),
    /// The layer's geometry was updated.
    Updated(LayerId),
    GestureEnded,
}

/// Turns pointer events into store operations for one canvas.
#[derive(Debug, Clone)]
pub struct InteractionController {
    canvas: Size,
    /// Screen position of the canvas top-left corner.
    origin: Point,
    gesture: Gesture,
    /// Whether this controller opened a history gesture in the editor.
    batching: bool,
}

impl InteractionController {
    pub fn new(canvas: Size) -> Self {
        Self {
            canvas,
            origin: Point::ZERO,
            gesture: Gesture::Idle,
            batching: false,
        }
    }

    /// Controller for the canvas a template implies.
    pub fn for_template(template: &TemplateDescriptor) -> Self {
        Self::new(template.canvas_size())
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    pub fn set_canvas_size(&mut self, canvas: Size) {
        self.canvas = canvas;
    }

    /// Set where the canvas sits on screen.
    pub fn set_canvas_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    /// Viewport for the editor's current zoom.
    pub fn viewport(&self, editor: &Editor) -> Viewport {
        Viewport::new(self.origin, editor.document().zoom())
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Drag { .. })
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self.gesture, Gesture::Resize { .. })
    }

    pub fn is_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    /// Dispatch a pointer event.
    pub fn handle_event(&mut self, editor: &mut Editor, event: PointerEvent) -> PointerOutcome {
        match event {
            PointerEvent::Down { position } => self.pointer_down(editor, position),
            PointerEvent::Move { position } => self.pointer_move(editor, position),
            PointerEvent::Up { .. } | PointerEvent::Cancel => self.pointer_up(editor),
        }
    }

    /// Topmost visible layer under the pointer, locked ones included. For
    /// hover feedback only.
    pub fn hover_at(&self, editor: &Editor, screen: Point) -> Option<LayerId> {
        let point = self.viewport(editor).screen_to_canvas(screen);
        editor
            .document()
            .layer_at_point(point, self.canvas)
            .map(|l| l.id)
    }

    /// Resize handle of the selected layer under the pointer.
    fn handle_at(&self, editor: &Editor, point: Point) -> Option<(LayerId, Corner, Rect)> {
        let layer = editor.selected_layer().filter(|l| l.is_pointer_target())?;
        let tolerance = self
            .viewport(editor)
            .screen_distance_to_canvas(editor.config().handle_tolerance_px);
        let bounds = layer.bounds(self.canvas);
        corner_handles(bounds)
            .into_iter()
            .find(|h| h.hit_test(point, tolerance))
            .map(|h| (layer.id, h.corner, bounds))
    }

    fn begin(&mut self, editor: &mut Editor, gesture: Gesture, label: &str) {
        self.gesture = gesture;
        let layer = match gesture {
            Gesture::Drag { layer, .. } | Gesture::Resize { layer, .. } => layer,
            Gesture::Idle => return,
        };
        if editor.config().coalesce_drag_history {
            editor.begin_gesture(label, layer);
            self.batching = true;
        }
    }

    pub fn pointer_down(&mut self, editor: &mut Editor, screen: Point) -> PointerOutcome {
        if self.is_active() {
            log::debug!("Pointer down during an active gesture, ending it first");
            self.pointer_up(editor);
        }

        let point = self.viewport(editor).screen_to_canvas(screen);

        if let Some((layer, corner, original)) = self.handle_at(editor, point) {
            log::debug!("Resize layer {layer} from {corner:?}");
            let gesture = Gesture::Resize {
                layer,
                corner,
                start: point,
                original,
            };
            self.begin(editor, gesture, "Resize layer");
            return PointerOutcome::ResizeStarted(layer, corner);
        }

        let target = editor
            .document()
            .pointer_target_at(point, self.canvas)
            .map(|l| (l.id, l.geometry().origin()));

        match target {
            Some((layer, origin)) => {
                editor.select_layer(Some(layer));
                let offset = point - origin;
                log::debug!("Drag layer {layer}");
                self.begin(editor, Gesture::Drag { layer, offset }, "Move layer");
                PointerOutcome::DragStarted(layer)
            }
            None => {
                editor.select_layer(None);
                PointerOutcome::SelectionCleared
            }
        }
    }

    pub fn pointer_move(&mut self, editor: &mut Editor, screen: Point) -> PointerOutcome {
        let point = self.viewport(editor).screen_to_canvas(screen);

        let (layer_id, geometry) = match self.gesture {
            Gesture::Idle => return PointerOutcome::Ignored,
            Gesture::Drag { layer, offset } => {
                let Some(layer) = editor.layer(layer).filter(|l| !l.locked) else {
                    return PointerOutcome::Ignored;
                };
                let current = layer.geometry();
                let position = clamp_position(point - offset, current.size(), self.canvas);
                (
                    layer.id,
                    Geometry::new(position.x, position.y, current.width, current.height),
                )
            }
            Gesture::Resize {
                layer,
                corner,
                start,
                original,
            } => {
                if editor.layer(layer).is_none_or(|l| l.locked) {
                    return PointerOutcome::Ignored;
                }
                let rect = resize_rect(
                    original,
                    corner,
                    point - start,
                    self.canvas,
                    editor.config().min_layer_size,
                );
                (layer, Geometry::from_rect(rect))
            }
        };

        let patch = LayerPatch::props(PropsPatch::geometry(geometry));
        if editor.update_layer(layer_id, &patch) {
            PointerOutcome::Updated(layer_id)
        } else {
            PointerOutcome::Ignored
        }
    }

    /// End any gesture. Safe to call when nothing is active.
    pub fn pointer_up(&mut self, editor: &mut Editor) -> PointerOutcome {
        let was_active = self.is_active();
        self.gesture = Gesture::Idle;
        if self.batching {
            editor.end_gesture();
            self.batching = false;
        }
        if was_active {
            PointerOutcome::GestureEnded
        } else {
            PointerOutcome::Ignored
        }
    }

    /// Abort the current gesture, keeping whatever was applied so far.
    pub fn cancel(&mut self, editor: &mut Editor) {
        self.pointer_up(editor);
    }
}
