//! Pure placement math: callout location, arrow alignment, highlight cutout.
//!
//! Nothing here touches callout state; every function is a mapping from
//! rectangles, sizes and configuration to a point or rectangle.

use crate::types::{ArrowDirection, Gravity, Point, Rect, Size};

/// Result of trying to place a callout of a given measured size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// The callout's top-left corner in window coordinates
    At(Point),
    /// The measured content is wider than allowed; re-measure at this width
    /// before any location is meaningful
    NeedsWidthClamp { max_width: f32 },
}

/// Top-left corner of a callout attached to `anchor` on the `gravity` side.
///
/// `offset_x` separates the callout from the anchor for Start/End,
/// `offset_y` for Top/Bottom. The callout is centered on the other axis.
pub fn compute_location(
    anchor: Rect,
    callout: Size,
    gravity: Gravity,
    offset_x: f32,
    offset_y: f32,
) -> Point {
    let center = anchor.center();
    match gravity {
        Gravity::Start => Point::new(
            anchor.left - callout.width - offset_x,
            center.y - callout.height / 2.0,
        ),
        Gravity::End => Point::new(anchor.right + offset_x, center.y - callout.height / 2.0),
        Gravity::Top => Point::new(
            center.x - callout.width / 2.0,
            anchor.top - callout.height - offset_y,
        ),
        Gravity::Bottom => Point::new(center.x - callout.width / 2.0, anchor.bottom + offset_y),
        Gravity::Center => Point::new(
            center.x - callout.width / 2.0,
            center.y - callout.height / 2.0,
        ),
    }
}

/// Check the measured content width against `max_width` (0 = unlimited)
/// before computing a location.
pub fn place(
    anchor: Rect,
    content_width: f32,
    callout: Size,
    gravity: Gravity,
    offset_x: f32,
    offset_y: f32,
    max_width: f32,
) -> Placement {
    if max_width > 0.0 && content_width > max_width {
        return Placement::NeedsWidthClamp { max_width };
    }
    Placement::At(compute_location(anchor, callout, gravity, offset_x, offset_y))
}

/// Arrow position relative to the callout's top-left corner.
///
/// `arrow` must already be oriented for `direction` (see
/// [`ArrowDirection::oriented`]). Along the edge, the arrow starts at
/// `edge_inset`, follows the anchor's center when the anchor is off-center,
/// and never runs into the far inset. The result is always inside
/// `[0, callout - arrow]` on the alignment axis.
pub fn compute_arrow_offset(
    direction: ArrowDirection,
    callout: Rect,
    anchor: Rect,
    arrow: Size,
    edge_inset: f32,
) -> Point {
    if direction.is_horizontal() {
        let x = align_on_axis(
            callout.width(),
            callout.center_x(),
            anchor.center_x(),
            arrow.width,
            edge_inset,
        );
        let y = match direction {
            ArrowDirection::Bottom => (callout.height() - arrow.height).max(0.0),
            _ => 0.0,
        };
        Point::new(x, y)
    } else {
        let y = align_on_axis(
            callout.height(),
            callout.center_y(),
            anchor.center_y(),
            arrow.height,
            edge_inset,
        );
        let x = match direction {
            ArrowDirection::Right => (callout.width() - arrow.width).max(0.0),
            _ => 0.0,
        };
        Point::new(x, y)
    }
}

/// 1-D arrow alignment along an edge of length `extent`.
fn align_on_axis(
    extent: f32,
    callout_center: f32,
    anchor_center: f32,
    arrow_extent: f32,
    inset: f32,
) -> f32 {
    let limit = (extent - arrow_extent).max(0.0);
    let centered = extent / 2.0 - arrow_extent / 2.0;
    let tracked = centered - (callout_center - anchor_center);

    let pos = if tracked <= inset {
        inset
    } else if tracked + arrow_extent + inset > extent {
        extent - arrow_extent - inset
    } else {
        tracked
    };
    pos.clamp(0.0, limit)
}

/// Highlight hole: the anchor grown by `overlay_offset` on each side, in
/// the overlay's local coordinates.
pub fn compute_highlight_cutout(anchor: Rect, overlay: Rect, overlay_offset: f32) -> Rect {
    anchor.relative_to(overlay.origin()).inset_by(overlay_offset)
}
