//! Pointer input events.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Primary-button pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up { position: Point },
    /// The pointer left the surface or the gesture was interrupted.
    Cancel,
}

impl PointerEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::Down {
            position: Point::new(x, y),
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::Move {
            position: Point::new(x, y),
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::Up {
            position: Point::new(x, y),
        }
    }

    /// Screen position carried by the event, if any.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::Down { position } | Self::Move { position } | Self::Up { position } => {
                Some(*position)
            }
            Self::Cancel => None,
        }
    }
}
