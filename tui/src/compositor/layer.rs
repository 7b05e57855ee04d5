//! Compositor Layer

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

use super::LayerId;

/// One z-ordered drawing surface
#[derive(Debug)]
pub struct Layer {
    /// Layer identifier
    pub id: LayerId,
    /// Position and size on screen
    pub bounds: Rect,
    /// Stacking order, higher draws on top
    pub z_index: i32,
    /// Whether the layer is composited
    pub visible: bool,
    /// Opaque layers hide everything beneath their bounds, blanks included
    pub opaque: bool,
    /// Drawing buffer in layer-local coordinates
    pub buffer: Buffer,
}

impl Layer {
    /// Create a visible, transparent layer
    pub fn new(id: LayerId, bounds: Rect, z_index: i32) -> Self {
        Self {
            id,
            bounds,
            z_index,
            visible: true,
            opaque: false,
            buffer: Buffer::empty(Rect::new(0, 0, bounds.width, bounds.height)),
        }
    }

    /// Whether a screen position falls inside the layer
    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.bounds.x
            && x < self.bounds.x.saturating_add(self.bounds.width)
            && y >= self.bounds.y
            && y < self.bounds.y.saturating_add(self.bounds.height)
    }
}
