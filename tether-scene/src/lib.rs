//! # tether-scene
//!
//! A headless render host for `tether-callout`.
//!
//! ## Features
//! - Node arena of anchors addressed by handle (resolve or absent)
//! - Floating surfaces with monospace text measurement
//! - Virtual clock with cancellable timers
//! - Layout-pass pump that routes signals to callouts
//! - Dim-with-hole overlay rasterized to an RGBA image
//!
//! ## Example
//!
//! ```no_run
//! use tether_callout::{CalloutRequest, Rect};
//! use tether_scene::Stage;
//!
//! let mut stage = Stage::new(Rect::new(0.0, 0.0, 400.0, 800.0));
//! let button = stage.scene_mut().add_node(Rect::new(100.0, 200.0, 180.0, 240.0));
//! let id = stage
//!     .add_callout(CalloutRequest::new(button).with_text("Tap to continue"))
//!     .expect("valid callout");
//! stage.show(id);
//! stage.advance(16);
//! ```

mod error;
mod raster;
mod scene;
mod stage;

pub use error::SceneError;
pub use raster::{render_overlay, save_overlay};
pub use scene::{Scene, SurfaceState, TextMetrics};
pub use stage::Stage;
