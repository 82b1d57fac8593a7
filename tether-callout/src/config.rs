//! Callout configuration and the injected visual style

use serde::Deserialize;

use crate::error::CalloutError;
use crate::types::{ArrowDirection, Gravity, HighlightShape};

/// Default auto-dismiss delay (10 s)
pub const DEFAULT_DURATION_MS: u64 = 10_000;

/// Immutable per-callout configuration.
///
/// Deserializes from TOML with every field optional:
///
/// ```toml
/// gravity = "bottom"
/// offset_y = 12.0
/// max_width = 240.0
/// duration_ms = 0          # stay until dismissed
/// should_highlight = true
/// highlight_shape = "rectangle"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CalloutConfig {
    /// Side of the anchor the callout attaches to
    pub gravity: Gravity,
    /// Horizontal gap between anchor and callout (Start/End gravity)
    pub offset_x: f32,
    /// Vertical gap between anchor and callout (Top/Bottom gravity)
    pub offset_y: f32,
    /// Maximum content width; 0 disables the clamp
    pub max_width: f32,
    /// Auto-dismiss delay in milliseconds; 0 keeps the callout until dismissed
    pub duration_ms: u64,
    /// Dismiss on a tap outside both callout and anchor
    pub dismiss_on_outside_touch: bool,
    /// Dismiss after reporting a tap inside the content
    pub dismiss_on_inside_touch: bool,
    /// Dim the screen around the anchor
    pub should_highlight: bool,
    /// Play the fade + levitate animation
    pub should_animate: bool,
    pub highlight_shape: HighlightShape,
    /// Padding between the anchor and the edge of the highlight cutout
    pub overlay_offset: f32,
    /// Draw the pointer triangle
    pub show_arrow: bool,
    /// Overrides the arrow direction derived from gravity
    pub arrow_direction: Option<ArrowDirection>,
}

impl Default for CalloutConfig {
    fn default() -> Self {
        Self {
            gravity: Gravity::Top,
            offset_x: 8.0,
            offset_y: 8.0,
            max_width: 0.0,
            duration_ms: DEFAULT_DURATION_MS,
            dismiss_on_outside_touch: false,
            dismiss_on_inside_touch: false,
            should_highlight: false,
            should_animate: true,
            highlight_shape: HighlightShape::Oval,
            overlay_offset: 8.0,
            show_arrow: true,
            arrow_direction: None,
        }
    }
}

impl CalloutConfig {
    /// Create a config attached to the given side of the anchor
    pub fn with_gravity(gravity: Gravity) -> Self {
        Self {
            gravity,
            ..Default::default()
        }
    }

    /// The arrow direction in effect (override or derived from gravity)
    pub fn arrow_direction(&self) -> ArrowDirection {
        self.arrow_direction
            .unwrap_or_else(|| self.gravity.arrow_direction())
    }

    pub fn validate(&self) -> Result<(), CalloutError> {
        finite("offset_x", self.offset_x)?;
        finite("offset_y", self.offset_y)?;
        non_negative("max_width", self.max_width)?;
        non_negative("overlay_offset", self.overlay_offset)?;
        Ok(())
    }
}

/// Visual constants resolved by the host theme and handed to the engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CalloutStyle {
    /// Arrow base width in pixels
    pub arrow_width: f32,
    /// Arrow tip height in pixels
    pub arrow_height: f32,
    /// Padding inside the content area
    pub padding: f32,
    /// Levitation amplitude; also reserved as padding around the content
    pub animation_padding: f32,
    /// Duration of one levitation sweep in milliseconds
    pub levitate_ms: u64,
    /// Entrance fade duration in milliseconds
    pub fade_in_ms: u64,
    /// Distance kept between the arrow and the callout's rounded corners
    pub arrow_edge_inset: f32,
    /// Alpha of the dimmed overlay area (0-255)
    pub overlay_alpha: u8,
}

impl Default for CalloutStyle {
    fn default() -> Self {
        Self {
            arrow_width: 30.0,
            arrow_height: 15.0,
            padding: 10.0,
            animation_padding: 4.0,
            levitate_ms: 800,
            fade_in_ms: 150,
            arrow_edge_inset: 2.0,
            overlay_alpha: 0x99,
        }
    }
}

impl CalloutStyle {
    /// Smaller arrow and tighter padding for dense layouts
    pub fn compact() -> Self {
        Self {
            arrow_width: 16.0,
            arrow_height: 8.0,
            padding: 6.0,
            animation_padding: 2.0,
            ..Default::default()
        }
    }

    /// Padding the host reserves around content + arrow
    pub fn layout_padding(&self, animated: bool) -> f32 {
        if animated {
            self.animation_padding
        } else {
            0.0
        }
    }

    pub fn validate(&self) -> Result<(), CalloutError> {
        non_negative("arrow_width", self.arrow_width)?;
        non_negative("arrow_height", self.arrow_height)?;
        non_negative("padding", self.padding)?;
        non_negative("animation_padding", self.animation_padding)?;
        non_negative("arrow_edge_inset", self.arrow_edge_inset)?;
        Ok(())
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), CalloutError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CalloutError::InvalidDimension { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), CalloutError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CalloutError::InvalidDimension { field, value })
    }
}
