//! Layered Compositor
//!
//! Manages z-ordered layers for rendering. The kiosk stacks three of them:
//! snowfall at the back, the specimen card over it, the status bar on top.
//! Each layer owns a buffer in its own coordinates and can be placed,
//! resized and hidden independently.
//!
//! Transparent layers let blank cells show what is beneath (snow drifting
//! around the card); opaque layers cover their whole rectangle.

mod layer;

use std::collections::HashMap;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

pub use layer::Layer;

/// Unique identifier for a layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerId(u32);

/// The compositor manages all layers and composites them together
#[derive(Debug)]
pub struct Compositor {
    /// All layers by ID
    layers: HashMap<LayerId, Layer>,
    /// Layers sorted by z-index for rendering
    render_order: Vec<LayerId>,
    /// Next layer ID to assign
    next_id: u32,
    /// Output buffer (composited result)
    output: Buffer,
    /// Total area
    area: Rect,
}

impl Compositor {
    /// Create a new compositor for the given area
    pub fn new(area: Rect) -> Self {
        Self {
            layers: HashMap::new(),
            render_order: Vec::new(),
            next_id: 0,
            output: Buffer::empty(area),
            area,
        }
    }

    /// Create a new transparent layer and return its ID
    pub fn create_layer(&mut self, bounds: Rect, z_index: i32) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;

        self.layers.insert(id, Layer::new(id, bounds, z_index));
        self.update_render_order();

        id
    }

    /// Create a new opaque layer and return its ID
    pub fn create_opaque_layer(&mut self, bounds: Rect, z_index: i32) -> LayerId {
        let id = self.create_layer(bounds, z_index);
        if let Some(layer) = self.layers.get_mut(&id) {
            layer.opaque = true;
        }
        id
    }

    /// Get mutable access to a layer's buffer for rendering
    pub fn layer_buffer_mut(&mut self, id: LayerId) -> Option<&mut Buffer> {
        self.layers.get_mut(&id).map(|l| &mut l.buffer)
    }

    /// Screen rectangle of a layer
    pub fn bounds(&self, id: LayerId) -> Option<Rect> {
        self.layers.get(&id).map(|l| l.bounds)
    }

    /// Move and resize a layer. The buffer is only reallocated on a size change.
    pub fn set_bounds(&mut self, id: LayerId, bounds: Rect) {
        if let Some(layer) = self.layers.get_mut(&id) {
            if layer.bounds.width != bounds.width || layer.bounds.height != bounds.height {
                layer.buffer = Buffer::empty(Rect::new(0, 0, bounds.width, bounds.height));
            }
            layer.bounds = bounds;
        }
    }

    /// Set layer visibility
    pub fn set_visible(&mut self, id: LayerId, visible: bool) {
        if let Some(layer) = self.layers.get_mut(&id) {
            layer.visible = visible;
        }
    }

    /// Resize the entire compositor
    pub fn resize(&mut self, area: Rect) {
        self.area = area;
        self.output = Buffer::empty(area);
    }

    /// Total area
    pub fn area(&self) -> Rect {
        self.area
    }

    /// Composite all visible layers into the output buffer
    pub fn composite(&mut self) -> &Buffer {
        self.output.reset();

        // Back to front
        for id in &self.render_order {
            if let Some(layer) = self.layers.get(id) {
                if layer.visible {
                    Self::blit_layer(&mut self.output, self.area, layer);
                }
            }
        }

        &self.output
    }

    /// Blit a layer onto the output buffer
    fn blit_layer(output: &mut Buffer, area: Rect, layer: &Layer) {
        let lb = layer.bounds;

        for ly in 0..lb.height {
            for lx in 0..lb.width {
                let dst_x = lb.x.saturating_add(lx);
                let dst_y = lb.y.saturating_add(ly);
                if dst_x >= area.width || dst_y >= area.height {
                    continue;
                }

                let src_idx = layer.buffer.index_of(lx, ly);
                let Some(src_cell) = layer.buffer.content.get(src_idx) else {
                    continue;
                };

                // Transparent layers leave blank cells as holes
                if layer.opaque || src_cell.symbol() != " " {
                    let dst_idx = output.index_of(dst_x, dst_y);
                    if let Some(dst) = output.content.get_mut(dst_idx) {
                        *dst = src_cell.clone();
                    }
                }
            }
        }
    }

    /// Topmost visible layer covering a position
    pub fn layer_at(&self, x: u16, y: u16) -> Option<LayerId> {
        self.render_order.iter().rev().copied().find(|id| {
            self.layers
                .get(id)
                .is_some_and(|layer| layer.visible && layer.contains(x, y))
        })
    }

    /// Update render order based on z-indices
    fn update_render_order(&mut self) {
        self.render_order = self.layers.keys().copied().collect();
        self.render_order
            .sort_by_key(|id| (self.layers.get(id).map_or(0, |l| l.z_index), id.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ratatui::style::Style;

    #[test]
    fn test_higher_layer_draws_on_top() {
        let mut compositor = Compositor::new(Rect::new(0, 0, 4, 1));
        let back = compositor.create_layer(Rect::new(0, 0, 4, 1), 0);
        let front = compositor.create_layer(Rect::new(1, 0, 2, 1), 10);

        compositor
            .layer_buffer_mut(back)
            .unwrap()
            .set_string(0, 0, "****", Style::default());
        compositor
            .layer_buffer_mut(front)
            .unwrap()
            .set_string(0, 0, "ab", Style::default());

        let out = compositor.composite();
        let row: String = (0..4).map(|x| out[(x, 0)].symbol().to_string()).collect();
        assert_eq!(row, "*ab*");
    }

    #[test]
    fn test_transparent_blanks_show_through_opaque_blanks_hide() {
        let mut compositor = Compositor::new(Rect::new(0, 0, 3, 1));
        let back = compositor.create_layer(Rect::new(0, 0, 3, 1), 0);
        let _glass = compositor.create_layer(Rect::new(0, 0, 1, 1), 5);
        let _wall = compositor.create_opaque_layer(Rect::new(2, 0, 1, 1), 5);

        compositor
            .layer_buffer_mut(back)
            .unwrap()
            .set_string(0, 0, "***", Style::default());

        let out = compositor.composite();
        assert_eq!(out[(0, 0)].symbol(), "*");
        assert_eq!(out[(1, 0)].symbol(), "*");
        assert_eq!(out[(2, 0)].symbol(), " ");
    }

    #[test]
    fn test_hidden_layer_is_skipped() {
        let mut compositor = Compositor::new(Rect::new(0, 0, 2, 1));
        let layer = compositor.create_layer(Rect::new(0, 0, 2, 1), 0);
        compositor
            .layer_buffer_mut(layer)
            .unwrap()
            .set_string(0, 0, "xx", Style::default());
        compositor.set_visible(layer, false);

        assert_eq!(compositor.composite()[(0, 0)].symbol(), " ");
        assert_eq!(compositor.layer_at(0, 0), None);
    }

    #[test]
    fn test_set_bounds_and_layer_at() {
        let mut compositor = Compositor::new(Rect::new(0, 0, 20, 10));
        let back = compositor.create_layer(Rect::new(0, 0, 20, 10), 0);
        let card = compositor.create_layer(Rect::new(0, 0, 4, 4), 10);

        compositor.set_bounds(card, Rect::new(5, 5, 6, 3));
        assert_eq!(compositor.bounds(card), Some(Rect::new(5, 5, 6, 3)));
        assert_eq!(
            compositor.layer_buffer_mut(card).unwrap().area,
            Rect::new(0, 0, 6, 3)
        );
        assert_eq!(compositor.layer_at(6, 6), Some(card));
        assert_eq!(compositor.layer_at(1, 1), Some(back));
    }

    #[test]
    fn test_layer_clipped_to_area() {
        let mut compositor = Compositor::new(Rect::new(0, 0, 2, 2));
        let layer = compositor.create_layer(Rect::new(1, 1, 4, 4), 0);
        compositor
            .layer_buffer_mut(layer)
            .unwrap()
            .set_string(0, 0, "abcd", Style::default());
        let out = compositor.composite();
        assert_eq!(out[(1, 1)].symbol(), "a");
    }
}
