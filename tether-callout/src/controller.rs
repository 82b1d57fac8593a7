//! Public callout API: creation, show/dismiss lifecycle, touch policy

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;

use thiserror::Error;

use crate::animation::{AnimationFrame, AnimationSequencer};
use crate::config::{CalloutConfig, CalloutStyle};
use crate::error::CalloutError;
use crate::host::{AnchorEvent, AnchorId, Host, OverlayId, RenderHost, SurfaceId, SurfaceSpec, TimerHandle};
use crate::negotiation::{CalloutState, Directive, NegotiationParams, Negotiator, PassInput};
use crate::overlay::HighlightMask;
use crate::tracker::{AnchorTracker, TrackerUpdate};
use crate::types::{Content, Point, Rect};

static NEXT_CALLOUT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a callout in listener callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalloutId(pub u64);

/// Lifecycle callbacks. All methods default to doing nothing.
pub trait CalloutListener {
    /// The surface just became visible. Fires at most once.
    fn on_show(&mut self, _callout: CalloutId) {}

    /// Teardown finished. Fires exactly once per dismissed callout.
    fn on_dismiss(&mut self, _callout: CalloutId) {}

    /// A tap landed inside the content while shown
    fn on_tap_inside(&mut self, _callout: CalloutId) {}
}

/// Lifecycle callbacks as plain values, for channel-based listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalloutEvent {
    Shown(CalloutId),
    Dismissed(CalloutId),
    TappedInside(CalloutId),
}

fn forward(sender: &Sender<CalloutEvent>, event: CalloutEvent) {
    if sender.send(event).is_err() {
        log::trace!("listener channel closed, dropped {:?}", event);
    }
}

impl CalloutListener for Sender<CalloutEvent> {
    fn on_show(&mut self, callout: CalloutId) {
        forward(self, CalloutEvent::Shown(callout));
    }

    fn on_dismiss(&mut self, callout: CalloutId) {
        forward(self, CalloutEvent::Dismissed(callout));
    }

    fn on_tap_inside(&mut self, callout: CalloutId) {
        forward(self, CalloutEvent::TappedInside(callout));
    }
}

/// Predicate gating whether the callout may show, re-checked on every pass
pub type ShowPredicate = Box<dyn Fn() -> bool>;

/// What a touch at window coordinates did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchOutcome {
    /// Not ours: callout not shown, or the tap hit the anchor's zone
    PassThrough,
    /// Landed on the content, reported through `on_tap_inside`
    TapInside,
    /// Outside tap consumed without effect
    Swallowed,
    /// The tap dismissed the callout
    Dismissed,
}

/// Operations refused because of the callout's or host's state.
///
/// Never surfaced to callers; logged and dropped.
#[derive(Error, Debug)]
enum Refusal {
    #[error("host context is gone")]
    ContextGone,
    #[error("callout already started ({0})")]
    AlreadyStarted(CalloutState),
    #[error("show predicate returned false")]
    Gated,
    #[error("anchor or root view is not visible")]
    AnchorHidden,
}

/// Everything needed to build a callout.
pub struct CalloutRequest {
    pub anchor: AnchorId,
    pub content: Option<Content>,
    pub config: CalloutConfig,
    pub style: CalloutStyle,
    pub should_show: Option<ShowPredicate>,
    pub listener: Option<Box<dyn CalloutListener>>,
}

impl CalloutRequest {
    pub fn new(anchor: AnchorId) -> Self {
        Self {
            anchor,
            content: None,
            config: CalloutConfig::default(),
            style: CalloutStyle::default(),
            should_show: None,
            listener: None,
        }
    }

    /// Show plain text laid out by the host
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content = Some(Content::Text(text.into()));
        self
    }

    pub fn with_content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_config(mut self, config: CalloutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_style(mut self, style: CalloutStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_should_show(mut self, predicate: impl Fn() -> bool + 'static) -> Self {
        self.should_show = Some(Box::new(predicate));
        self
    }

    pub fn with_listener(mut self, listener: impl CalloutListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }
}

/// A floating annotation anchored to a host element.
///
/// The host drives it: call [`show`](Self::show), then forward layout
/// passes, anchor notifications, timers, touches and frames as they arrive.
pub struct Callout {
    id: CalloutId,
    config: CalloutConfig,
    style: CalloutStyle,
    content: Content,
    tracker: AnchorTracker,
    should_show: Option<ShowPredicate>,
    listener: Option<Box<dyn CalloutListener>>,
    negotiator: Negotiator,
    animation: AnimationSequencer,
    surface: Option<SurfaceId>,
    overlay: Option<OverlayId>,
    timer: Option<TimerHandle>,
}

impl Callout {
    /// Validate the request and build an idle callout.
    pub fn create<H: RenderHost + ?Sized>(
        host: &H,
        request: CalloutRequest,
    ) -> Result<Self, CalloutError> {
        let content = request.content.ok_or(CalloutError::MissingContent)?;
        if !host.is_alive() {
            return Err(CalloutError::ContextGone);
        }
        request.config.validate()?;
        request.style.validate()?;

        let config = request.config;
        let style = request.style;
        let id = CalloutId(NEXT_CALLOUT_ID.fetch_add(1, Ordering::Relaxed));
        let negotiator = Negotiator::new(NegotiationParams::new(&config, &style));
        let animation = AnimationSequencer::new(
            config.gravity,
            style.animation_padding,
            style.fade_in_ms,
            style.levitate_ms,
        );
        log::debug!("created callout {:?} ({} gravity)", id, config.gravity);

        Ok(Self {
            id,
            config,
            style,
            content,
            tracker: AnchorTracker::new(request.anchor),
            should_show: request.should_show,
            listener: request.listener,
            negotiator,
            animation,
            surface: None,
            overlay: None,
            timer: None,
        })
    }

    pub fn id(&self) -> CalloutId {
        self.id
    }

    pub fn state(&self) -> CalloutState {
        self.negotiator.state()
    }

    pub fn config(&self) -> &CalloutConfig {
        &self.config
    }

    pub fn anchor(&self) -> AnchorId {
        self.tracker.anchor()
    }

    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }

    /// Window rectangle of the surface, once positioned
    pub fn bounds(&self) -> Option<Rect> {
        self.negotiator.placed()
    }

    /// Visible on screen (negotiation finished, not dismissed)
    pub fn is_showing(&self) -> bool {
        self.negotiator.is_visible()
    }

    pub fn is_dismissed(&self) -> bool {
        self.state() == CalloutState::Dismissed
    }

    fn should_show(&self) -> bool {
        self.should_show.as_ref().map_or(true, |predicate| predicate())
    }

    fn refuse(&self, refusal: Refusal) {
        log::debug!("callout {:?}: {}", self.id, refusal);
    }

    /// Start negotiating. No-op unless idle, showable and anchored to
    /// something visible.
    pub fn show(&mut self, host: &mut dyn Host) {
        if !host.is_alive() {
            return self.refuse(Refusal::ContextGone);
        }
        if self.state() != CalloutState::Created || self.surface.is_some() {
            return self.refuse(Refusal::AlreadyStarted(self.state()));
        }
        if !self.should_show() {
            return self.refuse(Refusal::Gated);
        }
        if host.root_bounds().is_none() || self.tracker.resolve(&*host).is_none() {
            log::warn!("callout {:?} cannot be shown, anchor or root view is hidden", self.id);
            return self.refuse(Refusal::AnchorHidden);
        }

        let params = self.negotiator.params();
        let spec = SurfaceSpec {
            gravity: params.gravity,
            content: self.content.clone(),
            arrow_direction: params.arrow_direction,
            arrow: params.arrow,
            content_padding: self.style.padding,
            layout_padding: self.style.layout_padding(self.config.should_animate),
        };
        let surface = host.create_surface(&spec);
        host.set_surface_visible(surface, false);
        host.subscribe_layout(surface);
        self.tracker.attach(host, surface);
        self.surface = Some(surface);

        if self.config.duration_ms > 0 {
            self.timer = Some(host.schedule_after(self.config.duration_ms));
        }
        log::info!("showing callout {:?} on anchor {:?}", self.id, self.anchor());
        host.request_layout(surface);
    }

    /// Tear down and report `on_dismiss`. Safe to call repeatedly and at
    /// any point of the lifecycle.
    pub fn dismiss(&mut self, host: &mut dyn Host) {
        if !self.negotiator.begin_dismiss() {
            log::trace!("callout {:?} already dismissed", self.id);
            return;
        }
        self.animation.cancel();

        if host.is_alive() {
            if let Some(timer) = self.timer.take() {
                host.cancel(timer);
            }
            if let Some(overlay) = self.overlay.take() {
                host.remove_overlay(overlay);
            }
            self.tracker.detach(host);
            if let Some(surface) = self.surface.take() {
                host.unsubscribe_layout(surface);
                host.destroy_surface(surface);
            }
        } else {
            self.timer = None;
            self.overlay = None;
            self.surface = None;
        }

        self.negotiator.finish_dismiss();
        log::info!("dismissed callout {:?}", self.id);
        if let Some(listener) = self.listener.as_mut() {
            listener.on_dismiss(self.id);
        }
    }

    /// The host finished a layout pass touching our surface
    pub fn on_layout_pass(&mut self, host: &mut dyn Host) {
        let Some(surface) = self.surface else {
            log::trace!("layout pass for callout {:?} without a surface", self.id);
            return;
        };
        if self.state().is_terminating() || !host.is_alive() {
            return;
        }

        let input = PassInput {
            measurement: host.measure(surface),
            anchor: self.tracker.resolve(&*host),
            root_visible: host.root_bounds().is_some(),
            should_show: self.should_show(),
        };

        for directive in self.negotiator.on_layout_pass(&input) {
            match directive {
                Directive::ConstrainWidth(width) => host.constrain_width(surface, width),
                Directive::Place(rect) => {
                    host.update_surface(surface, rect.left, rect.top, rect.width(), rect.height())
                }
                Directive::AlignArrow(offset) => host.set_arrow_offset(surface, offset),
                Directive::RequestLayout => host.request_layout(surface),
                Directive::Reveal => self.reveal(host, surface),
                Directive::StartAnimation => {
                    let now = host.now_ms();
                    self.animation.start(now);
                    if let Some(frame) = self.animation.sample(now) {
                        host.apply_frame(surface, frame);
                    }
                }
                Directive::Dismiss => {
                    self.dismiss(host);
                    return;
                }
            }
        }
    }

    fn reveal(&mut self, host: &mut dyn Host, surface: SurfaceId) {
        if self.config.should_highlight {
            if let Some(mask) = self.highlight_mask(host) {
                self.overlay = Some(host.show_overlay(&mask));
            }
        }
        host.apply_frame(surface, AnimationFrame::REST);
        host.set_surface_visible(surface, true);
        log::info!("callout {:?} shown", self.id);
        if let Some(listener) = self.listener.as_mut() {
            listener.on_show(self.id);
        }
    }

    fn highlight_mask(&self, host: &dyn Host) -> Option<HighlightMask> {
        let anchor = self.tracker.last_rect()?;
        let root = host.root_bounds()?;
        Some(HighlightMask::new(
            anchor,
            root,
            self.config.overlay_offset,
            self.config.highlight_shape,
            self.style.overlay_alpha,
        ))
    }

    /// The watched anchor scrolled, resized, attached or detached
    pub fn on_anchor_event(&mut self, host: &mut dyn Host, event: AnchorEvent) {
        if self.state().is_terminating() || !self.tracker.is_watching() {
            log::trace!("anchor event {:?} ignored in {}", event, self.state());
            return;
        }

        match self.tracker.handle(&*host, event) {
            TrackerUpdate::Gone => {
                log::info!("anchor of callout {:?} went away, dismissing", self.id);
                self.dismiss(host);
            }
            TrackerUpdate::Moved(anchor) => {
                if self.state().is_negotiating() {
                    log::trace!("callout {:?} anchor moved, next pass re-places", self.id);
                    return;
                }
                let (Some(surface), Some(rect)) = (self.surface, self.negotiator.reposition(anchor))
                else {
                    return;
                };
                host.update_surface(surface, rect.left, rect.top, rect.width(), rect.height());
                if let (Some(overlay), Some(mask)) = (self.overlay, self.highlight_mask(host)) {
                    host.update_overlay(overlay, &mask);
                }
            }
            TrackerUpdate::Unchanged => {}
        }
    }

    /// A timer scheduled by this callout fired
    pub fn on_timer(&mut self, host: &mut dyn Host, handle: TimerHandle) {
        if self.timer != Some(handle) {
            log::trace!("callout {:?} ignoring timer {:?}", self.id, handle);
            return;
        }
        self.timer = None;
        log::debug!("callout {:?} duration elapsed", self.id);
        self.dismiss(host);
    }

    /// Advance the animation to the host's frame time
    pub fn on_frame(&mut self, host: &mut dyn Host, now_ms: u64) -> Option<AnimationFrame> {
        let surface = self.surface?;
        if !self.is_showing() {
            return None;
        }
        let frame = self.animation.sample(now_ms)?;
        host.apply_frame(surface, frame);
        Some(frame)
    }

    /// Apply the touch policy to a tap at window coordinates
    pub fn on_touch(&mut self, host: &mut dyn Host, point: Point) -> TouchOutcome {
        if !self.is_showing() {
            return TouchOutcome::PassThrough;
        }

        if self.bounds().is_some_and(|bounds| bounds.contains(point)) {
            if let Some(listener) = self.listener.as_mut() {
                listener.on_tap_inside(self.id);
            }
            if self.config.dismiss_on_inside_touch {
                self.dismiss(host);
                return TouchOutcome::Dismissed;
            }
            return TouchOutcome::TapInside;
        }

        let anchor_zone = self
            .tracker
            .last_rect()
            .map(|anchor| anchor.inset_by(self.config.overlay_offset));
        if anchor_zone.is_some_and(|zone| zone.contains(point)) {
            return TouchOutcome::PassThrough;
        }

        if self.config.dismiss_on_outside_touch {
            self.dismiss(host);
            TouchOutcome::Dismissed
        } else {
            TouchOutcome::Swallowed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{AnchorSource, Measurement, Scheduler};
    use crate::types::Size;
    use std::sync::mpsc;

    /// Minimal host: one anchor, fixed measurement, records timers.
    struct StubHost {
        alive: bool,
        anchor: Option<Rect>,
        timers: Vec<TimerHandle>,
        cancelled: Vec<TimerHandle>,
        visible: bool,
        destroyed: bool,
        now: u64,
    }

    impl StubHost {
        fn new() -> Self {
            Self {
                alive: true,
                anchor: Some(Rect::new(100.0, 200.0, 180.0, 240.0)),
                timers: Vec::new(),
                cancelled: Vec::new(),
                visible: false,
                destroyed: false,
                now: 0,
            }
        }
    }

    impl AnchorSource for StubHost {
        fn anchor_rect(&self, _anchor: AnchorId) -> Option<Rect> {
            self.anchor
        }
    }

    impl RenderHost for StubHost {
        fn is_alive(&self) -> bool {
            self.alive
        }
        fn root_bounds(&self) -> Option<Rect> {
            Some(Rect::new(0.0, 0.0, 400.0, 800.0))
        }
        fn create_surface(&mut self, _spec: &SurfaceSpec) -> SurfaceId {
            SurfaceId(1)
        }
        fn measure(&mut self, _surface: SurfaceId) -> Measurement {
            Measurement {
                content: Size::new(100.0, 30.0),
                surface: Size::new(120.0, 50.0),
            }
        }
        fn constrain_width(&mut self, _surface: SurfaceId, _width: f32) {}
        fn update_surface(&mut self, _s: SurfaceId, _x: f32, _y: f32, _w: f32, _h: f32) {}
        fn set_arrow_offset(&mut self, _surface: SurfaceId, _offset: Point) {}
        fn set_surface_visible(&mut self, _surface: SurfaceId, visible: bool) {
            self.visible = visible;
        }
        fn apply_frame(&mut self, _surface: SurfaceId, _frame: AnimationFrame) {}
        fn destroy_surface(&mut self, _surface: SurfaceId) {
            self.destroyed = true;
        }
        fn request_layout(&mut self, _surface: SurfaceId) {}
        fn subscribe_layout(&mut self, _surface: SurfaceId) {}
        fn unsubscribe_layout(&mut self, _surface: SurfaceId) {}
        fn watch_anchor(&mut self, _anchor: AnchorId, _surface: SurfaceId) {}
        fn unwatch_anchor(&mut self, _anchor: AnchorId, _surface: SurfaceId) {}
        fn show_overlay(&mut self, _mask: &HighlightMask) -> OverlayId {
            OverlayId(1)
        }
        fn update_overlay(&mut self, _overlay: OverlayId, _mask: &HighlightMask) {}
        fn remove_overlay(&mut self, _overlay: OverlayId) {}
    }

    impl Scheduler for StubHost {
        fn now_ms(&self) -> u64 {
            self.now
        }
        fn schedule_after(&mut self, _delay_ms: u64) -> TimerHandle {
            let handle = TimerHandle(self.timers.len() as u64 + 1);
            self.timers.push(handle);
            handle
        }
        fn cancel(&mut self, handle: TimerHandle) {
            self.cancelled.push(handle);
        }
    }

    fn request() -> CalloutRequest {
        CalloutRequest::new(AnchorId(7)).with_text("Tap here to start")
    }

    #[test]
    fn test_create_requires_content() {
        let host = StubHost::new();
        let result = Callout::create(&host, CalloutRequest::new(AnchorId(7)));
        assert!(matches!(result, Err(CalloutError::MissingContent)));
    }

    #[test]
    fn test_create_fails_without_context() {
        let mut host = StubHost::new();
        host.alive = false;
        assert!(matches!(
            Callout::create(&host, request()),
            Err(CalloutError::ContextGone)
        ));
    }

    #[test]
    fn test_create_validates_config() {
        let host = StubHost::new();
        let config = CalloutConfig {
            overlay_offset: -2.0,
            ..Default::default()
        };
        assert!(matches!(
            Callout::create(&host, request().with_config(config)),
            Err(CalloutError::InvalidDimension { field: "overlay_offset", .. })
        ));
    }

    #[test]
    fn test_show_then_negotiate_to_shown() {
        let (tx, rx) = mpsc::channel();
        let mut host = StubHost::new();
        let mut callout = Callout::create(&host, request().with_listener(tx)).unwrap();

        callout.show(&mut host);
        assert_eq!(callout.state(), CalloutState::Created);
        assert_eq!(host.timers.len(), 1);

        for _ in 0..3 {
            callout.on_layout_pass(&mut host);
        }
        assert!(callout.is_showing());
        assert!(host.visible);
        assert_eq!(rx.try_recv(), Ok(CalloutEvent::Shown(callout.id())));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dismiss_twice_reports_once() {
        let (tx, rx) = mpsc::channel();
        let mut host = StubHost::new();
        let mut callout = Callout::create(&host, request().with_listener(tx)).unwrap();
        callout.show(&mut host);

        callout.dismiss(&mut host);
        callout.dismiss(&mut host);

        assert!(callout.is_dismissed());
        assert!(host.destroyed);
        assert_eq!(host.cancelled, host.timers);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![CalloutEvent::Dismissed(callout.id())]);
    }

    #[test]
    fn test_show_refused_when_gated() {
        let mut host = StubHost::new();
        let mut callout = Callout::create(&host, request().with_should_show(|| false)).unwrap();
        callout.show(&mut host);
        assert_eq!(callout.surface(), None);
        assert!(host.timers.is_empty());
    }

    #[test]
    fn test_closed_listener_channel_is_harmless() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut host = StubHost::new();
        let mut callout = Callout::create(&host, request().with_listener(tx)).unwrap();
        callout.show(&mut host);
        for _ in 0..3 {
            callout.on_layout_pass(&mut host);
        }
        assert!(callout.is_showing());
        callout.dismiss(&mut host);
        assert!(callout.is_dismissed());
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let mut host = StubHost::new();
        let mut callout = Callout::create(&host, request()).unwrap();
        callout.show(&mut host);
        callout.on_timer(&mut host, TimerHandle(99));
        assert_eq!(callout.state(), CalloutState::Created);

        callout.on_timer(&mut host, TimerHandle(1));
        assert!(callout.is_dismissed());
    }
}
