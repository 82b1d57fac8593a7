//! Application state - runs a scripted scene against the headless host

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver};

use tether_callout::{
    AnchorId, CalloutError, CalloutEvent, CalloutId, CalloutRequest, Point, Size, TouchOutcome,
};
use tether_scene::{save_overlay, Scene, SceneError, Stage, TextMetrics};
use thiserror::Error;

use crate::config::{Config, Step};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to read scene file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse scene file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid callout: {0}")]
    Callout(#[from] CalloutError),
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("Unknown anchor '{0}'")]
    UnknownAnchor(String),
    #[error("Unknown callout '{0}'")]
    UnknownCallout(String),
}

/// Tally of what happened over a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    pub shown: usize,
    pub dismissed: usize,
    pub taps_inside: usize,
    pub snapshots: usize,
}

/// Main application state
pub struct App {
    stage: Stage,
    anchors: HashMap<String, AnchorId>,
    callouts: HashMap<String, CalloutId>,
    names: HashMap<CalloutId, String>,
    events: Receiver<CalloutEvent>,
    steps: Vec<Step>,
    report: Report,
}

impl App {
    /// Build the scene, anchors and callouts described by `config`
    pub fn new(config: Config) -> Result<Self, AppError> {
        let [char_width, line_height] = config.root.text_metrics;
        let scene = Scene::new(config.root.bounds()).with_metrics(TextMetrics {
            char_width,
            line_height,
        });
        let mut stage = Stage::with_scene(scene);

        let mut anchors = HashMap::new();
        for anchor in &config.anchors {
            let id = stage.scene_mut().add_node(anchor.bounds());
            if !anchor.visible {
                stage.scene_mut().set_node_visible(id, false)?;
            }
            anchors.insert(anchor.name.clone(), id);
        }

        let (tx, events) = mpsc::channel();
        let mut callouts = HashMap::new();
        let mut names = HashMap::new();
        for entry in &config.callouts {
            let anchor = *anchors
                .get(&entry.anchor)
                .ok_or_else(|| AppError::UnknownAnchor(entry.anchor.clone()))?;
            let request = CalloutRequest::new(anchor)
                .with_text(entry.text.clone())
                .with_config(entry.config.clone())
                .with_style(entry.resolved_style())
                .with_listener(tx.clone());
            let id = stage.add_callout(request)?;
            log::debug!("Callout '{}' is {:?}", entry.name, id);
            callouts.insert(entry.name.clone(), id);
            names.insert(id, entry.name.clone());
        }

        Ok(Self {
            stage,
            anchors,
            callouts,
            names,
            events,
            steps: config.steps,
            report: Report::default(),
        })
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    fn anchor(&self, name: &str) -> Result<AnchorId, AppError> {
        self.anchors
            .get(name)
            .copied()
            .ok_or_else(|| AppError::UnknownAnchor(name.to_string()))
    }

    fn callout(&self, name: &str) -> Result<CalloutId, AppError> {
        self.callouts
            .get(name)
            .copied()
            .ok_or_else(|| AppError::UnknownCallout(name.to_string()))
    }

    /// Run every step, then return the tally
    pub fn run(mut self) -> Result<Report, AppError> {
        let steps = std::mem::take(&mut self.steps);
        for (index, step) in steps.iter().enumerate() {
            log::debug!("Step {}: {:?}", index + 1, step);
            self.apply(step)?;
            self.drain_events();
        }
        Ok(self.report)
    }

    fn apply(&mut self, step: &Step) -> Result<(), AppError> {
        match step {
            Step::Show { callout } => {
                let id = self.callout(callout)?;
                self.stage.show(id);
            }
            Step::Dismiss { callout } => {
                let id = self.callout(callout)?;
                self.stage.dismiss(id);
            }
            Step::Advance { ms } => self.stage.advance(*ms),
            Step::Scroll { anchor, dx, dy } => {
                let id = self.anchor(anchor)?;
                self.stage.scroll(id, *dx, *dy)?;
            }
            Step::Resize { anchor, width, height } => {
                let id = self.anchor(anchor)?;
                self.stage.resize(id, Size::new(*width, *height))?;
            }
            Step::Detach { anchor } => {
                let id = self.anchor(anchor)?;
                self.stage.detach(id)?;
            }
            Step::SetVisible { anchor, visible } => {
                let id = self.anchor(anchor)?;
                self.stage.set_anchor_visible(id, *visible)?;
            }
            Step::Tap { x, y } => {
                let outcome = self.stage.tap(Point::new(*x, *y));
                if outcome != TouchOutcome::PassThrough {
                    log::info!("Tap at ({}, {}): {:?}", x, y, outcome);
                }
            }
            Step::SetRootShown { shown } => self.stage.set_root_shown(*shown),
            Step::Snapshot { path } => match self.stage.scene().overlays().next() {
                Some(mask) => {
                    save_overlay(mask, path)?;
                    log::info!("Overlay written to {}", path);
                    self.report.snapshots += 1;
                }
                None => log::warn!("No overlay to snapshot at {}", path),
            },
        }
        Ok(())
    }

    fn drain_events(&mut self) {
        for event in self.events.try_iter() {
            let (id, label) = match event {
                CalloutEvent::Shown(id) => {
                    self.report.shown += 1;
                    (id, "shown")
                }
                CalloutEvent::Dismissed(id) => {
                    self.report.dismissed += 1;
                    (id, "dismissed")
                }
                CalloutEvent::TappedInside(id) => {
                    self.report.taps_inside += 1;
                    (id, "tapped inside")
                }
            };
            let name = self.names.get(&id).map_or("?", String::as_str);
            match self.stage.callout(id).and_then(|c| c.bounds()) {
                Some(rect) => log::info!(
                    "Callout '{}' {} at ({}, {}) {}x{}",
                    name,
                    label,
                    rect.left,
                    rect.top,
                    rect.width(),
                    rect.height()
                ),
                None => log::info!("Callout '{}' {}", name, label),
            }
        }
    }
}
