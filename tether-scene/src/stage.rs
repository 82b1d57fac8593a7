//! Drives callouts against a scene: layout passes, timers, frames, touches

use tether_callout::{
    AnchorId, Callout, CalloutError, CalloutId, CalloutRequest, Point, Rect, Size, TouchOutcome,
};

use crate::error::SceneError;
use crate::scene::Scene;

/// Upper bound on back-to-back layout passes in one pump
const MAX_LAYOUT_PASSES: usize = 32;

/// Length of one frame tick in milliseconds (~60 fps)
const FRAME_MS: u64 = 16;

/// A scene plus the callouts living on it.
pub struct Stage {
    scene: Scene,
    callouts: Vec<Callout>,
}

impl Stage {
    pub fn new(root: Rect) -> Self {
        Self::with_scene(Scene::new(root))
    }

    pub fn with_scene(scene: Scene) -> Self {
        Self {
            scene,
            callouts: Vec::new(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn callout(&self, id: CalloutId) -> Option<&Callout> {
        self.callouts.iter().find(|c| c.id() == id)
    }

    pub fn callouts(&self) -> impl Iterator<Item = &Callout> {
        self.callouts.iter()
    }

    /// Build a callout on this scene; it stays idle until [`show`](Self::show)
    pub fn add_callout(&mut self, request: CalloutRequest) -> Result<CalloutId, CalloutError> {
        let callout = Callout::create(&self.scene, request)?;
        let id = callout.id();
        self.callouts.push(callout);
        Ok(id)
    }

    pub fn show(&mut self, id: CalloutId) {
        if let Some(callout) = self.callouts.iter_mut().find(|c| c.id() == id) {
            callout.show(&mut self.scene);
        }
        self.pump();
    }

    pub fn dismiss(&mut self, id: CalloutId) {
        if let Some(callout) = self.callouts.iter_mut().find(|c| c.id() == id) {
            callout.dismiss(&mut self.scene);
        }
        self.pump();
    }

    /// Deliver pending anchor notifications and layout passes until the
    /// scene settles. Returns the number of layout passes run.
    pub fn pump(&mut self) -> usize {
        let mut passes = 0;
        loop {
            self.deliver_anchor_events();
            let Some(surfaces) = self.scene.take_layout_pass() else {
                break;
            };
            if passes == MAX_LAYOUT_PASSES {
                log::warn!("layout did not settle after {} passes", passes);
                break;
            }
            passes += 1;
            log::trace!("layout pass {} for {} surfaces", passes, surfaces.len());
            for callout in self.callouts.iter_mut() {
                if callout.surface().is_some_and(|s| surfaces.contains(&s)) {
                    callout.on_layout_pass(&mut self.scene);
                }
            }
        }
        passes
    }

    fn deliver_anchor_events(&mut self) {
        for (anchor, event) in self.scene.take_anchor_events() {
            let watchers = self.scene.watchers_of(anchor);
            for callout in self.callouts.iter_mut() {
                if callout.surface().is_some_and(|s| watchers.contains(&s)) {
                    callout.on_anchor_event(&mut self.scene, event);
                }
            }
        }
    }

    /// Run the clock forward `ms` milliseconds in frame-sized steps,
    /// firing timers and sampling animations on the way
    pub fn advance(&mut self, ms: u64) {
        let target = self.scene.now() + ms;
        self.pump();
        while self.scene.now() < target {
            let step = (self.scene.now() + FRAME_MS).min(target);
            for handle in self.scene.advance_clock(step) {
                for callout in self.callouts.iter_mut() {
                    callout.on_timer(&mut self.scene, handle);
                }
            }
            let now = self.scene.now();
            for callout in self.callouts.iter_mut() {
                callout.on_frame(&mut self.scene, now);
            }
            self.pump();
        }
    }

    /// Deliver a tap; the most recently added callout that claims it wins
    pub fn tap(&mut self, point: Point) -> TouchOutcome {
        let mut outcome = TouchOutcome::PassThrough;
        for callout in self.callouts.iter_mut().rev() {
            outcome = callout.on_touch(&mut self.scene, point);
            if outcome != TouchOutcome::PassThrough {
                break;
            }
        }
        self.pump();
        outcome
    }

    pub fn scroll(&mut self, anchor: AnchorId, dx: f32, dy: f32) -> Result<(), SceneError> {
        self.scene.scroll_node(anchor, dx, dy)?;
        self.pump();
        Ok(())
    }

    pub fn resize(&mut self, anchor: AnchorId, size: Size) -> Result<(), SceneError> {
        self.scene.resize_node(anchor, size)?;
        self.pump();
        Ok(())
    }

    pub fn detach(&mut self, anchor: AnchorId) -> Result<(), SceneError> {
        self.scene.detach_node(anchor)?;
        self.pump();
        Ok(())
    }

    pub fn set_anchor_visible(&mut self, anchor: AnchorId, visible: bool) -> Result<(), SceneError> {
        self.scene.set_node_visible(anchor, visible)?;
        self.pump();
        Ok(())
    }

    /// Hide or show the root (e.g. the enclosing dialog closed)
    pub fn set_root_shown(&mut self, shown: bool) {
        self.scene.set_root_shown(shown);
        self.pump();
    }

    /// Drop dismissed callouts
    pub fn sweep(&mut self) -> usize {
        let before = self.callouts.len();
        self.callouts.retain(|c| !c.is_dismissed());
        before - self.callouts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::mpsc::{self, Receiver};
    use tether_callout::{
        CalloutConfig, CalloutEvent, CalloutState, CalloutStyle, Content, Gravity, HighlightShape,
    };

    const ROOT: Rect = Rect::new(0.0, 0.0, 400.0, 800.0);
    const BUTTON: Rect = Rect::new(100.0, 200.0, 180.0, 240.0);

    fn plain_style() -> CalloutStyle {
        CalloutStyle {
            arrow_width: 20.0,
            arrow_height: 10.0,
            padding: 0.0,
            animation_padding: 0.0,
            ..Default::default()
        }
    }

    fn config(gravity: Gravity) -> CalloutConfig {
        CalloutConfig {
            offset_x: 5.0,
            offset_y: 10.0,
            duration_ms: 0,
            should_animate: false,
            ..CalloutConfig::with_gravity(gravity)
        }
    }

    fn setup(config: CalloutConfig, text: &str) -> (Stage, AnchorId, CalloutId, Receiver<CalloutEvent>) {
        let mut stage = Stage::new(ROOT);
        let anchor = stage.scene_mut().add_node(BUTTON);
        let (tx, rx) = mpsc::channel();
        let id = stage
            .add_callout(
                CalloutRequest::new(anchor)
                    .with_text(text)
                    .with_config(config)
                    .with_style(plain_style())
                    .with_listener(tx),
            )
            .unwrap();
        (stage, anchor, id, rx)
    }

    fn events(rx: &Receiver<CalloutEvent>) -> Vec<CalloutEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_show_negotiates_top_placement() {
        // 15 chars * 8 = 120 wide, one line of 16 + arrow 10 = 26 high
        let (mut stage, _, id, rx) = setup(config(Gravity::Top), "Tap to continue");
        stage.show(id);

        let callout = stage.callout(id).unwrap();
        assert_eq!(callout.state(), CalloutState::Shown);
        let surface = stage.scene().surface(callout.surface().unwrap()).unwrap();
        assert!(surface.visible);
        assert_eq!(surface.rect, Rect::new(80.0, 164.0, 200.0, 190.0));
        assert_eq!(surface.arrow_offset, Point::new(50.0, 16.0));
        assert_eq!(events(&rx), vec![CalloutEvent::Shown(id)]);
    }

    #[test]
    fn test_width_clamped_before_positioning() {
        let config = CalloutConfig {
            max_width: 80.0,
            ..config(Gravity::Bottom)
        };
        // 20 chars = 160px natural, wraps to 2 lines at 80px
        let (mut stage, _, id, _rx) = setup(config, "twenty characters!!!");
        stage.show(id);

        let callout = stage.callout(id).unwrap();
        assert_eq!(callout.state(), CalloutState::Shown);
        let rect = callout.bounds().unwrap();
        assert_eq!(rect.width(), 80.0);
        assert_eq!(rect.height(), 2.0 * 16.0 + 10.0);
        assert_eq!(rect.left, 140.0 - 40.0);
        assert_eq!(rect.top, 240.0 + 10.0);
    }

    #[test]
    fn test_gated_show_then_later_show() {
        let allowed = Rc::new(Cell::new(false));
        let mut stage = Stage::new(ROOT);
        let anchor = stage.scene_mut().add_node(BUTTON);
        let (tx, rx) = mpsc::channel();
        let gate = allowed.clone();
        let id = stage
            .add_callout(
                CalloutRequest::new(anchor)
                    .with_text("hello")
                    .with_config(config(Gravity::Top))
                    .with_should_show(move || gate.get())
                    .with_listener(tx),
            )
            .unwrap();

        stage.show(id);
        assert_eq!(stage.scene().surface_count(), 0);
        assert!(events(&rx).is_empty());

        allowed.set(true);
        stage.show(id);
        assert!(stage.callout(id).unwrap().is_showing());
        assert_eq!(events(&rx), vec![CalloutEvent::Shown(id)]);
    }

    #[test]
    fn test_gate_closing_mid_negotiation_never_shows() {
        let allowed = Rc::new(Cell::new(true));
        let mut stage = Stage::new(ROOT);
        let anchor = stage.scene_mut().add_node(BUTTON);
        let (tx, rx) = mpsc::channel();
        let gate = allowed.clone();
        let id = stage
            .add_callout(
                CalloutRequest::new(anchor)
                    .with_text("hello")
                    .with_config(config(Gravity::Top))
                    .with_should_show(move || gate.get())
                    .with_listener(tx),
            )
            .unwrap();

        // show without pumping, then close the gate before the first pass
        let scene = &mut stage.scene;
        stage.callouts[0].show(scene);
        allowed.set(false);
        stage.pump();

        assert!(stage.callout(id).unwrap().is_dismissed());
        assert_eq!(events(&rx), vec![CalloutEvent::Dismissed(id)]);
        assert_eq!(stage.scene().surface_count(), 0);
    }

    #[test]
    fn test_hidden_anchor_never_shows() {
        let (mut stage, anchor, id, rx) = setup(config(Gravity::Top), "hello");
        stage.set_anchor_visible(anchor, false).unwrap();
        stage.show(id);
        assert_eq!(stage.callout(id).unwrap().state(), CalloutState::Created);
        assert!(events(&rx).is_empty());
    }

    #[test]
    fn test_auto_dismiss_after_duration() {
        let config = CalloutConfig {
            duration_ms: 5_000,
            ..config(Gravity::Top)
        };
        let (mut stage, _, id, rx) = setup(config, "hello");
        stage.show(id);
        assert_eq!(events(&rx), vec![CalloutEvent::Shown(id)]);

        stage.advance(4_990);
        assert!(events(&rx).is_empty());
        assert!(stage.callout(id).unwrap().is_showing());

        stage.advance(10);
        assert_eq!(events(&rx), vec![CalloutEvent::Dismissed(id)]);
        assert!(stage.scene().now() >= 5_000);
        assert_eq!(stage.scene().pending_timers(), 0);
    }

    #[test]
    fn test_detach_dismisses_once() {
        let (mut stage, anchor, id, rx) = setup(config(Gravity::Top), "hello");
        stage.show(id);
        events(&rx);

        stage.detach(anchor).unwrap();
        assert_eq!(events(&rx), vec![CalloutEvent::Dismissed(id)]);
        assert_eq!(stage.scene().watcher_count(anchor), 0);

        stage.dismiss(id);
        assert!(events(&rx).is_empty());
    }

    #[test]
    fn test_scroll_repositions_in_place() {
        let config = CalloutConfig {
            should_highlight: true,
            highlight_shape: HighlightShape::Rectangle,
            overlay_offset: 4.0,
            ..config(Gravity::Bottom)
        };
        let (mut stage, anchor, id, _rx) = setup(config, "hello");
        stage.show(id);
        let before = stage.callout(id).unwrap().bounds().unwrap();

        stage.scroll(anchor, 0.0, -50.0).unwrap();
        let callout = stage.callout(id).unwrap();
        assert_eq!(callout.state(), CalloutState::Shown);
        let after = callout.bounds().unwrap();
        assert_eq!(after.top, before.top - 50.0);

        let surface = stage.scene().surface(callout.surface().unwrap()).unwrap();
        assert_eq!(surface.rect, after);
        let mask = stage.scene().overlays().next().unwrap();
        assert_eq!(mask.cutout, Rect::new(96.0, 146.0, 184.0, 194.0));
    }

    #[test]
    fn test_outside_touch_policy() {
        let (mut stage, _, id, rx) = setup(config(Gravity::Top), "hello");
        stage.show(id);
        events(&rx);

        assert_eq!(stage.tap(Point::new(390.0, 790.0)), TouchOutcome::Swallowed);
        assert_eq!(stage.tap(Point::new(140.0, 220.0)), TouchOutcome::PassThrough);
        let inside = stage.callout(id).unwrap().bounds().unwrap().center();
        assert_eq!(stage.tap(inside), TouchOutcome::TapInside);
        assert_eq!(events(&rx), vec![CalloutEvent::TappedInside(id)]);
        assert!(stage.callout(id).unwrap().is_showing());

        let config = CalloutConfig {
            dismiss_on_outside_touch: true,
            ..config(Gravity::Top)
        };
        let (mut stage, _, id, rx) = setup(config, "hello");
        stage.show(id);
        events(&rx);
        assert_eq!(stage.tap(Point::new(390.0, 790.0)), TouchOutcome::Dismissed);
        assert_eq!(events(&rx), vec![CalloutEvent::Dismissed(id)]);
    }

    #[test]
    fn test_root_hidden_dismisses() {
        let (mut stage, _, id, rx) = setup(config(Gravity::End), "hello");
        stage.show(id);
        events(&rx);
        stage.set_root_shown(false);
        assert_eq!(events(&rx), vec![CalloutEvent::Dismissed(id)]);
    }

    #[test]
    fn test_animation_runs_until_dismissed() {
        let config = CalloutConfig {
            should_animate: true,
            ..config(Gravity::Top)
        };
        let style = CalloutStyle {
            animation_padding: 4.0,
            fade_in_ms: 100,
            levitate_ms: 400,
            ..plain_style()
        };
        let mut stage = Stage::new(ROOT);
        let anchor = stage.scene_mut().add_node(BUTTON);
        let id = stage
            .add_callout(
                CalloutRequest::new(anchor)
                    .with_text("hello")
                    .with_config(config)
                    .with_style(style),
            )
            .unwrap();
        stage.show(id);
        let surface = stage.callout(id).unwrap().surface().unwrap();
        assert_eq!(stage.scene().surface(surface).unwrap().frame.alpha, 0.0);

        stage.advance(300);
        let frame = stage.scene().surface(surface).unwrap().frame;
        assert_eq!(frame.alpha, 1.0);
        assert!((frame.translation.y - 0.0).abs() < 0.01);

        stage.dismiss(id);
        assert_eq!(stage.scene().surface_count(), 0);
        assert_eq!(stage.sweep(), 1);
    }

    #[test]
    fn test_anchor_scrolled_mid_negotiation_is_followed() {
        let (mut stage, anchor, id, rx) = setup(config(Gravity::Bottom), "hello");
        let scene = &mut stage.scene;
        stage.callouts[0].show(scene);
        assert!(stage.scene.take_layout_pass().is_some());
        stage.callouts[0].on_layout_pass(&mut stage.scene);
        assert_eq!(stage.callout(id).unwrap().state(), CalloutState::Positioning);
        assert_eq!(stage.callout(id).unwrap().bounds().unwrap().top, 250.0);

        stage.scene_mut().scroll_node(anchor, 0.0, -100.0).unwrap();
        stage.pump();

        let callout = stage.callout(id).unwrap();
        assert_eq!(callout.state(), CalloutState::Shown);
        let bounds = callout.bounds().unwrap();
        assert_eq!(bounds, Rect::new(120.0, 150.0, 160.0, 176.0));
        let surface = stage.scene().surface(callout.surface().unwrap()).unwrap();
        assert_eq!(surface.rect, bounds);
        assert!(surface.visible);
        assert_eq!(events(&rx), vec![CalloutEvent::Shown(id)]);
    }

    #[test]
    fn test_custom_content_clamped_to_max_width() {
        let mut stage = Stage::new(ROOT);
        let anchor = stage.scene_mut().add_node(BUTTON);
        let content = stage.scene_mut().add_content(Size::new(300.0, 40.0));
        let config = CalloutConfig {
            max_width: 120.0,
            ..config(Gravity::Bottom)
        };
        let id = stage
            .add_callout(
                CalloutRequest::new(anchor)
                    .with_content(Content::Custom(content))
                    .with_config(config)
                    .with_style(plain_style()),
            )
            .unwrap();
        stage.show(id);

        let callout = stage.callout(id).unwrap();
        assert_eq!(callout.state(), CalloutState::Shown);
        assert_eq!(callout.bounds(), Some(Rect::new(80.0, 250.0, 200.0, 300.0)));
        let surface = stage.scene().surface(callout.surface().unwrap()).unwrap();
        assert_eq!(surface.width_limit, Some(120.0));
    }

    #[test]
    fn test_inside_touch_dismisses_when_configured() {
        let config = CalloutConfig {
            dismiss_on_inside_touch: true,
            ..config(Gravity::Top)
        };
        let (mut stage, _, id, rx) = setup(config, "hello");
        stage.show(id);
        events(&rx);

        let inside = stage.callout(id).unwrap().bounds().unwrap().center();
        assert_eq!(stage.tap(inside), TouchOutcome::Dismissed);
        assert_eq!(
            events(&rx),
            vec![CalloutEvent::TappedInside(id), CalloutEvent::Dismissed(id)]
        );
        assert_eq!(stage.scene().surface_count(), 0);
    }

    #[test]
    fn test_anchor_resize_recentres_callout_and_cutout() {
        let config = CalloutConfig {
            should_highlight: true,
            highlight_shape: HighlightShape::Rectangle,
            overlay_offset: 4.0,
            ..config(Gravity::Top)
        };
        let (mut stage, anchor, id, _rx) = setup(config, "hello");
        stage.show(id);
        assert_eq!(
            stage.callout(id).unwrap().bounds(),
            Some(Rect::new(120.0, 164.0, 160.0, 190.0))
        );

        stage.resize(anchor, Size::new(120.0, 60.0)).unwrap();
        let callout = stage.callout(id).unwrap();
        assert_eq!(callout.state(), CalloutState::Shown);
        let bounds = callout.bounds().unwrap();
        assert_eq!(bounds, Rect::new(140.0, 164.0, 180.0, 190.0));
        let surface = stage.scene().surface(callout.surface().unwrap()).unwrap();
        assert_eq!(surface.rect, bounds);
        let mask = stage.scene().overlays().next().unwrap();
        assert_eq!(mask.cutout, Rect::new(96.0, 196.0, 224.0, 264.0));
    }

    #[test]
    fn test_torn_down_scene_is_silent() {
        let (mut stage, _, id, rx) = setup(config(Gravity::Top), "hello");
        stage.scene_mut().teardown();
        stage.show(id);
        assert_eq!(stage.callout(id).unwrap().state(), CalloutState::Created);
        assert!(events(&rx).is_empty());
        assert!(matches!(
            stage.add_callout(CalloutRequest::new(AnchorId(1)).with_text("x")),
            Err(CalloutError::ContextGone)
        ));
    }
}
