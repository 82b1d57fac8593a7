//! Layout negotiation across render passes.
//!
//! The callout's size is only known after the host has measured it, and
//! clamping its width invalidates that measurement. [`Negotiator`] walks
//! the callout from `Created` to `Shown` one layout pass at a time. It is a
//! plain value: each pass goes in as a [`PassInput`], and what the host
//! should do comes out as a list of [`Directive`]s.
//!
//! ```text
//! Created ──► Measuring ──► Positioning ──► ArrowAligning ──► (Animating) ──► Shown
//!               ▲    │
//!               │    ▼  width > max
//!          WidthConstrained
//!
//! any state ──► Dismissing ──► Dismissed
//! ```

use std::fmt;

use crate::config::{CalloutConfig, CalloutStyle};
use crate::geometry::{self, Placement};
use crate::host::Measurement;
use crate::types::{ArrowDirection, Gravity, Point, Rect, Size};

/// Lifecycle position of one callout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalloutState {
    Created,
    Measuring,
    WidthConstrained,
    Positioning,
    ArrowAligning,
    Animating,
    Shown,
    Dismissing,
    Dismissed,
}

impl CalloutState {
    /// Only the edges of the negotiation graph, plus the dismissal exit
    pub fn can_transition_to(self, next: CalloutState) -> bool {
        use CalloutState::*;
        match (self, next) {
            (Created, Measuring)
            | (Measuring, WidthConstrained)
            | (Measuring, Positioning)
            | (WidthConstrained, Measuring)
            | (Positioning, ArrowAligning)
            | (ArrowAligning, Animating)
            | (ArrowAligning, Shown)
            | (Animating, Shown)
            | (Dismissing, Dismissed) => true,
            (from, Dismissing) => !from.is_terminating(),
            _ => false,
        }
    }

    /// Negotiation started but not finished
    pub fn is_negotiating(self) -> bool {
        matches!(
            self,
            Self::Measuring
                | Self::WidthConstrained
                | Self::Positioning
                | Self::ArrowAligning
                | Self::Animating
        )
    }

    pub fn is_terminating(self) -> bool {
        matches!(self, Self::Dismissing | Self::Dismissed)
    }
}

impl fmt::Display for CalloutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Geometry inputs fixed for the lifetime of a callout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NegotiationParams {
    pub gravity: Gravity,
    pub offset_x: f32,
    pub offset_y: f32,
    /// 0 disables the clamp
    pub max_width: f32,
    pub arrow_direction: ArrowDirection,
    /// Oriented arrow size, `None` when no arrow is drawn
    pub arrow: Option<Size>,
    /// Inset from the callout corners the arrow keeps
    pub edge_inset: f32,
    pub animate: bool,
}

impl NegotiationParams {
    pub fn new(config: &CalloutConfig, style: &CalloutStyle) -> Self {
        let arrow_direction = config.arrow_direction();
        let arrow = config
            .show_arrow
            .then(|| arrow_direction.oriented(style.arrow_width, style.arrow_height));
        Self {
            gravity: config.gravity,
            offset_x: config.offset_x,
            offset_y: config.offset_y,
            max_width: config.max_width,
            arrow_direction,
            arrow,
            edge_inset: style.layout_padding(config.should_animate) + style.arrow_edge_inset,
            animate: config.should_animate,
        }
    }
}

/// What the host reported on one layout pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassInput {
    pub measurement: Measurement,
    /// Anchor rectangle, `None` once it cannot be resolved
    pub anchor: Option<Rect>,
    /// Whether the host root is still shown
    pub root_visible: bool,
    /// Current value of the caller's show predicate
    pub should_show: bool,
}

/// Host-side action requested by the negotiator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Directive {
    /// Limit the content width, measurement follows on the next pass
    ConstrainWidth(f32),
    /// Move/resize the surface to this window rectangle
    Place(Rect),
    /// Put the arrow at this surface-local offset
    AlignArrow(Point),
    RequestLayout,
    /// Make the surface visible and announce it
    Reveal,
    StartAnimation,
    /// Tear the callout down
    Dismiss,
}

/// The negotiation state machine for a single callout.
#[derive(Debug, Clone)]
pub struct Negotiator {
    params: NegotiationParams,
    state: CalloutState,
    /// Width applied by the last clamp
    clamped: Option<f32>,
    /// Current window rectangle of the surface
    placed: Option<Rect>,
}

impl Negotiator {
    pub fn new(params: NegotiationParams) -> Self {
        Self {
            params,
            state: CalloutState::Created,
            clamped: None,
            placed: None,
        }
    }

    pub fn state(&self) -> CalloutState {
        self.state
    }

    pub fn params(&self) -> &NegotiationParams {
        &self.params
    }

    /// Surface rectangle last handed to the host
    pub fn placed(&self) -> Option<Rect> {
        self.placed
    }

    /// Width clamp in effect, if any
    pub fn clamped_width(&self) -> Option<f32> {
        self.clamped
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state, CalloutState::Animating | CalloutState::Shown)
    }

    fn transition(&mut self, next: CalloutState) -> bool {
        if !self.state.can_transition_to(next) {
            log::warn!("refusing callout transition {} -> {}", self.state, next);
            return false;
        }
        log::debug!("callout {} -> {}", self.state, next);
        self.state = next;
        true
    }

    /// Feed one layout pass through the machine.
    pub fn on_layout_pass(&mut self, input: &PassInput) -> Vec<Directive> {
        if self.state.is_terminating() {
            log::trace!("layout pass ignored in {}", self.state);
            return Vec::new();
        }

        let Some(anchor) = input.anchor.filter(|_| input.root_visible && input.should_show) else {
            log::debug!(
                "callout gate closed in {} (anchor: {}, root visible: {}, should show: {})",
                self.state,
                input.anchor.is_some(),
                input.root_visible,
                input.should_show
            );
            return vec![Directive::Dismiss];
        };

        match self.state {
            CalloutState::Created | CalloutState::WidthConstrained => {
                if !self.transition(CalloutState::Measuring) {
                    return Vec::new();
                }
                self.measure(anchor, input.measurement)
            }
            CalloutState::Measuring => self.measure(anchor, input.measurement),
            CalloutState::Positioning => {
                if !self.transition(CalloutState::ArrowAligning) {
                    return Vec::new();
                }
                let mut directives = self.follow(anchor);
                directives.extend(self.align_arrow(anchor));
                directives
            }
            CalloutState::ArrowAligning => {
                // anchor moved since the arrow was aligned, align again first
                let moved = self.follow(anchor);
                if moved.is_empty() {
                    self.reveal()
                } else {
                    let mut directives = moved;
                    directives.extend(self.align_arrow(anchor));
                    directives
                }
            }
            CalloutState::Animating | CalloutState::Shown => Vec::new(),
            CalloutState::Dismissing | CalloutState::Dismissed => Vec::new(),
        }
    }

    /// Re-place the measured surface against the anchor's current rect
    fn follow(&mut self, anchor: Rect) -> Vec<Directive> {
        let Some(placed) = self.placed else {
            return Vec::new();
        };
        let p = self.params;
        let origin =
            geometry::compute_location(anchor, placed.size(), p.gravity, p.offset_x, p.offset_y);
        let rect = Rect::from_origin_size(origin, placed.size());
        if rect == placed {
            return Vec::new();
        }
        log::debug!("anchor moved during negotiation, placing at {:?}", rect);
        self.placed = Some(rect);
        vec![Directive::Place(rect)]
    }

    fn measure(&mut self, anchor: Rect, measurement: Measurement) -> Vec<Directive> {
        let p = self.params;
        let mut surface = measurement.surface;
        let mut content_width = measurement.content.width;

        if let Some(clamp) = self.clamped {
            if content_width > clamp {
                log::warn!(
                    "content measured {}px wide after a {}px clamp, treating it as clamped",
                    content_width,
                    clamp
                );
                surface.width -= content_width - clamp;
                content_width = clamp;
            }
        }

        match geometry::place(
            anchor,
            content_width,
            surface,
            p.gravity,
            p.offset_x,
            p.offset_y,
            p.max_width,
        ) {
            Placement::NeedsWidthClamp { max_width } => {
                if !self.transition(CalloutState::WidthConstrained) {
                    return Vec::new();
                }
                self.clamped = Some(max_width);
                vec![Directive::ConstrainWidth(max_width), Directive::RequestLayout]
            }
            Placement::At(origin) => {
                if !self.transition(CalloutState::Positioning) {
                    return Vec::new();
                }
                let rect = Rect::from_origin_size(origin, surface);
                self.placed = Some(rect);
                vec![Directive::Place(rect), Directive::RequestLayout]
            }
        }
    }

    fn align_arrow(&mut self, anchor: Rect) -> Vec<Directive> {
        let p = self.params;
        let (Some(arrow), Some(callout)) = (p.arrow, self.placed) else {
            return vec![Directive::RequestLayout];
        };
        let offset =
            geometry::compute_arrow_offset(p.arrow_direction, callout, anchor, arrow, p.edge_inset);
        vec![Directive::AlignArrow(offset), Directive::RequestLayout]
    }

    fn reveal(&mut self) -> Vec<Directive> {
        if self.params.animate {
            if !(self.transition(CalloutState::Animating) && self.transition(CalloutState::Shown)) {
                return Vec::new();
            }
            vec![Directive::Reveal, Directive::StartAnimation]
        } else if self.transition(CalloutState::Shown) {
            vec![Directive::Reveal]
        } else {
            Vec::new()
        }
    }

    /// Recompute the surface rectangle after the anchor moved.
    ///
    /// Only a shown callout follows its anchor; earlier states pick up the
    /// new geometry on their next pass.
    pub fn reposition(&mut self, anchor: Rect) -> Option<Rect> {
        if self.state != CalloutState::Shown {
            return None;
        }
        let size = self.placed?.size();
        let p = self.params;
        let origin = geometry::compute_location(anchor, size, p.gravity, p.offset_x, p.offset_y);
        let rect = Rect::from_origin_size(origin, size);
        if Some(rect) == self.placed {
            return None;
        }
        self.placed = Some(rect);
        Some(rect)
    }

    /// Enter `Dismissing`; false when dismissal already started
    pub fn begin_dismiss(&mut self) -> bool {
        if self.state.is_terminating() {
            return false;
        }
        self.transition(CalloutState::Dismissing)
    }

    pub fn finish_dismiss(&mut self) {
        if self.state == CalloutState::Dismissing {
            self.transition(CalloutState::Dismissed);
        }
    }
}
