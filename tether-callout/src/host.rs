//! Interfaces the engine consumes from the render host.
//!
//! The engine never paints. It asks the host to create a floating surface,
//! measures it, moves it, reveals it and finally destroys it. Signals flow
//! back as calls on [`Callout`](crate::Callout).

use crate::animation::AnimationFrame;
use crate::overlay::HighlightMask;
use crate::types::{ArrowDirection, Content, Gravity, Point, Rect, Size};

/// Handle to a floating surface owned by one callout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Handle to a host element used as an anchor.
///
/// Holding one keeps nothing alive; resolution through
/// [`AnchorSource::anchor_rect`] may report the element gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId(pub u64);

/// Handle to a dim-with-hole overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(pub u64);

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Everything the host needs to build the callout surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSpec {
    pub gravity: Gravity,
    pub content: Content,
    pub arrow_direction: ArrowDirection,
    /// Oriented arrow size, `None` when no arrow is drawn
    pub arrow: Option<Size>,
    /// Padding inside the content area
    pub content_padding: f32,
    /// Padding around content + arrow (room for levitation)
    pub layout_padding: f32,
}

/// Sizes reported by one measurement pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measurement {
    /// The content area alone (what the width clamp applies to)
    pub content: Size,
    /// The whole surface: content, arrow and layout padding
    pub surface: Size,
}

/// Resolves anchor handles to their current geometry.
pub trait AnchorSource {
    /// Current window rectangle of the anchor, `None` if detached or hidden
    fn anchor_rect(&self, anchor: AnchorId) -> Option<Rect>;
}

/// Render tree and floating-surface primitives.
pub trait RenderHost: AnchorSource {
    /// False once the owning host context has been torn down
    fn is_alive(&self) -> bool;

    /// Bounds of the root the overlay covers, `None` while the root is not shown
    fn root_bounds(&self) -> Option<Rect>;

    fn create_surface(&mut self, spec: &SurfaceSpec) -> SurfaceId;

    /// Measure the surface's content under its current constraints
    fn measure(&mut self, surface: SurfaceId) -> Measurement;

    /// Constrain the content width; takes effect on the next layout pass
    fn constrain_width(&mut self, surface: SurfaceId, width: f32);

    fn update_surface(&mut self, surface: SurfaceId, x: f32, y: f32, width: f32, height: f32);

    /// Place the arrow relative to the surface's top-left corner
    fn set_arrow_offset(&mut self, surface: SurfaceId, offset: Point);

    fn set_surface_visible(&mut self, surface: SurfaceId, visible: bool);

    fn apply_frame(&mut self, surface: SurfaceId, frame: AnimationFrame);

    fn destroy_surface(&mut self, surface: SurfaceId);

    /// Ask for another layout pass touching this surface
    fn request_layout(&mut self, surface: SurfaceId);

    /// Start delivering layout-pass signals for this surface
    fn subscribe_layout(&mut self, surface: SurfaceId);

    fn unsubscribe_layout(&mut self, surface: SurfaceId);

    /// Start delivering scroll/resize/attach/detach notifications for the anchor
    fn watch_anchor(&mut self, anchor: AnchorId, surface: SurfaceId);

    fn unwatch_anchor(&mut self, anchor: AnchorId, surface: SurfaceId);

    fn show_overlay(&mut self, mask: &HighlightMask) -> OverlayId;

    fn update_overlay(&mut self, overlay: OverlayId, mask: &HighlightMask);

    fn remove_overlay(&mut self, overlay: OverlayId);
}

/// Timer primitive driven by the host clock.
pub trait Scheduler {
    /// Current host clock in milliseconds
    fn now_ms(&self) -> u64;

    fn schedule_after(&mut self, delay_ms: u64) -> TimerHandle;

    fn cancel(&mut self, handle: TimerHandle);
}

/// Full host capability set consumed by the controller.
pub trait Host: RenderHost + Scheduler {}

impl<T: RenderHost + Scheduler + ?Sized> Host for T {}

/// Notifications the host raises about a watched anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorEvent {
    /// An ancestor scrolled, the anchor moved on screen
    Scrolled,
    /// The anchor's size changed
    Resized,
    Attached,
    Detached,
    /// Visibility flipped; the rect lookup tells which way
    VisibilityChanged,
}
