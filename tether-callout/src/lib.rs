//! # tether-callout
//!
//! Positions a floating callout next to an anchor element whose geometry is
//! only known after the host has laid it out, keeps it aligned while the
//! anchor moves, and drives it from creation to dismissal.
//!
//! ## Features
//! - Gravity-based placement (top, bottom, start, end, center)
//! - Arrow that follows the anchor's center, clamped to the callout edge
//! - Width clamp negotiated over several layout passes
//! - Optional dim-with-hole highlight around the anchor
//! - Entrance fade and levitation animation
//! - Auto-dismiss after a duration, on anchor detach, or on outside touch
//!
//! ## Example
//!
//! ```no_run
//! use tether_callout::{AnchorId, Callout, CalloutConfig, CalloutRequest, Gravity, Host};
//!
//! fn attach(host: &mut dyn Host, anchor: AnchorId) -> Result<Callout, tether_callout::CalloutError> {
//!     let mut callout = Callout::create(
//!         &*host,
//!         CalloutRequest::new(anchor)
//!             .with_text("New: drag to reorder")
//!             .with_config(CalloutConfig {
//!                 max_width: 240.0,
//!                 duration_ms: 5_000,
//!                 ..CalloutConfig::with_gravity(Gravity::Bottom)
//!             }),
//!     )?;
//!     callout.show(host);
//!     // forward host layout passes with `callout.on_layout_pass(host)`
//!     Ok(callout)
//! }
//! ```

pub mod animation;
mod config;
mod controller;
mod error;
pub mod geometry;
mod host;
pub mod negotiation;
pub mod overlay;
mod tracker;
mod types;

pub use animation::{AnimationFrame, AnimationSequencer};
pub use config::{CalloutConfig, CalloutStyle, DEFAULT_DURATION_MS};
pub use controller::{
    Callout, CalloutEvent, CalloutId, CalloutListener, CalloutRequest, ShowPredicate, TouchOutcome,
};
pub use error::CalloutError;
pub use host::{
    AnchorEvent, AnchorId, AnchorSource, Host, Measurement, OverlayId, RenderHost, Scheduler,
    SurfaceId, SurfaceSpec, TimerHandle,
};
pub use negotiation::CalloutState;
pub use overlay::HighlightMask;
pub use tracker::{AnchorTracker, TrackerUpdate};
pub use types::{ArrowDirection, Content, ContentId, Gravity, HighlightShape, Point, Rect, Size};
