//! Dim-with-hole overlay description

use crate::geometry::compute_highlight_cutout;
use crate::types::{HighlightShape, Point, Rect, Size};

/// Everything a renderer needs to paint the highlight overlay.
///
/// Coordinates are local to the overlay: (0, 0) is the overlay's top-left
/// corner, which covers `bounds` in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightMask {
    /// Window rectangle covered by the overlay
    pub bounds: Rect,
    /// Hole around the anchor, overlay-local
    pub cutout: Rect,
    pub shape: HighlightShape,
    /// Alpha of the dimmed area
    pub dim_alpha: u8,
}

impl HighlightMask {
    pub fn new(
        anchor: Rect,
        root: Rect,
        overlay_offset: f32,
        shape: HighlightShape,
        dim_alpha: u8,
    ) -> Self {
        Self {
            bounds: root,
            cutout: compute_highlight_cutout(anchor, root, overlay_offset),
            shape,
            dim_alpha,
        }
    }

    pub fn size(&self) -> Size {
        self.bounds.size()
    }

    /// Whether an overlay-local point falls inside the hole
    pub fn in_cutout(&self, point: Point) -> bool {
        match self.shape {
            HighlightShape::Rectangle => self.cutout.contains(point),
            HighlightShape::Oval => {
                let rx = self.cutout.width() / 2.0;
                let ry = self.cutout.height() / 2.0;
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let dx = (point.x - self.cutout.center_x()) / rx;
                let dy = (point.y - self.cutout.center_y()) / ry;
                dx * dx + dy * dy <= 1.0
            }
        }
    }

    /// Overlay alpha at an overlay-local point
    pub fn alpha_at(&self, point: Point) -> u8 {
        if self.in_cutout(point) {
            0
        } else {
            self.dim_alpha
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(shape: HighlightShape) -> HighlightMask {
        HighlightMask::new(
            Rect::new(100.0, 100.0, 140.0, 120.0),
            Rect::new(0.0, 0.0, 300.0, 300.0),
            10.0,
            shape,
            0x99,
        )
    }

    #[test]
    fn test_rectangle_cutout() {
        let m = mask(HighlightShape::Rectangle);
        assert_eq!(m.cutout, Rect::new(90.0, 90.0, 150.0, 130.0));
        assert_eq!(m.alpha_at(Point::new(91.0, 91.0)), 0);
        assert_eq!(m.alpha_at(Point::new(80.0, 91.0)), 0x99);
    }

    #[test]
    fn test_oval_cutout_excludes_corners() {
        let m = mask(HighlightShape::Oval);
        assert_eq!(m.alpha_at(Point::new(120.0, 110.0)), 0);
        // inside the bounding box but outside the ellipse
        assert_eq!(m.alpha_at(Point::new(91.0, 91.0)), 0x99);
    }

    #[test]
    fn test_overlay_offset_from_window_origin() {
        let m = HighlightMask::new(
            Rect::new(100.0, 100.0, 140.0, 120.0),
            Rect::new(20.0, 40.0, 320.0, 340.0),
            0.0,
            HighlightShape::Rectangle,
            0x80,
        );
        assert_eq!(m.cutout, Rect::new(80.0, 60.0, 120.0, 80.0));
        assert_eq!(m.size(), Size::new(300.0, 300.0));
    }
}
