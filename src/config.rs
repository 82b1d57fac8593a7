//! Scene description loading from tether.toml

use serde::Deserialize;
use std::path::Path;

use tether_callout::{CalloutConfig, CalloutStyle, Rect, Size};

use crate::app::AppError;

/// Root configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub root: RootConfig,
    #[serde(default, rename = "anchor")]
    pub anchors: Vec<AnchorConfig>,
    #[serde(default, rename = "callout")]
    pub callouts: Vec<CalloutEntry>,
    /// Scripted steps, run in order
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// The window everything is laid out in
#[derive(Debug, Clone, Deserialize)]
pub struct RootConfig {
    pub width: f32,
    pub height: f32,
    /// Monospace text metrics [char width, line height]
    #[serde(default = "default_text_metrics")]
    pub text_metrics: [f32; 2],
}

fn default_text_metrics() -> [f32; 2] {
    [8.0, 16.0]
}

impl RootConfig {
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(Default::default(), Size::new(self.width, self.height))
    }
}

/// A named anchor element
#[derive(Debug, Clone, Deserialize)]
pub struct AnchorConfig {
    pub name: String,
    /// [left, top, right, bottom] in window coordinates
    pub rect: [f32; 4],
    #[serde(default = "default_true")]
    pub visible: bool,
}

fn default_true() -> bool {
    true
}

impl AnchorConfig {
    pub fn bounds(&self) -> Rect {
        let [left, top, right, bottom] = self.rect;
        Rect::new(left, top, right, bottom)
    }
}

/// A named callout attached to one of the anchors
#[derive(Debug, Clone, Deserialize)]
pub struct CalloutEntry {
    pub name: String,
    /// Name of the anchor it points at
    pub anchor: String,
    pub text: String,
    #[serde(default)]
    pub config: CalloutConfig,
    /// Start from the compact style preset
    #[serde(default)]
    pub compact: bool,
    /// Explicit style, overrides `compact`
    pub style: Option<CalloutStyle>,
}

impl CalloutEntry {
    pub fn resolved_style(&self) -> CalloutStyle {
        match &self.style {
            Some(style) => style.clone(),
            None if self.compact => CalloutStyle::compact(),
            None => CalloutStyle::default(),
        }
    }
}

/// One timeline step
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Show { callout: String },
    Dismiss { callout: String },
    /// Run the clock forward
    Advance { ms: u64 },
    Scroll {
        anchor: String,
        #[serde(default)]
        dx: f32,
        #[serde(default)]
        dy: f32,
    },
    Resize { anchor: String, width: f32, height: f32 },
    Detach { anchor: String },
    SetVisible { anchor: String, visible: bool },
    Tap { x: f32, y: f32 },
    /// Show or hide the root view
    SetRootShown { shown: bool },
    /// Write the current highlight overlay to a PNG file
    Snapshot { path: String },
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load from default path (tether.toml in current directory)
    pub fn load_default() -> Result<Self, AppError> {
        Self::load("tether.toml")
    }

    pub fn parse(content: &str) -> Result<Self, AppError> {
        let config: Self = toml::from_str(content)?;
        log::debug!(
            "Loaded {} anchors, {} callouts, {} steps",
            config.anchors.len(),
            config.callouts.len(),
            config.steps.len()
        );
        Ok(config)
    }
}
