//! In-memory render tree implementing the callout host traits

use std::collections::{BTreeMap, HashMap, HashSet};

use tether_callout::{
    AnchorEvent, AnchorId, AnchorSource, AnimationFrame, Content, ContentId, HighlightMask,
    Measurement, OverlayId, Point, Rect, RenderHost, Scheduler, Size, SurfaceId, SurfaceSpec,
    TimerHandle,
};

use crate::error::SceneError;

/// Fixed-pitch text measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub char_width: f32,
    pub line_height: f32,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 16.0,
        }
    }
}

impl TextMetrics {
    /// Size of `text` laid out in lines no wider than `max_width`
    pub fn measure(&self, text: &str, max_width: Option<f32>) -> Size {
        let per_line = max_width
            .map(|w| ((w / self.char_width).floor() as usize).max(1))
            .unwrap_or(usize::MAX);

        let mut widest = 0usize;
        let mut lines = 0usize;
        for line in text.lines() {
            let chars = line.chars().count();
            let wrapped = if chars == 0 { 1 } else { chars.div_ceil(per_line) };
            lines += wrapped;
            widest = widest.max(chars.min(per_line));
        }
        Size::new(
            widest as f32 * self.char_width,
            lines.max(1) as f32 * self.line_height,
        )
    }
}

#[derive(Debug, Clone)]
struct Node {
    rect: Rect,
    attached: bool,
    visible: bool,
}

/// Host-side view of one floating surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceState {
    pub spec: SurfaceSpec,
    /// Window rectangle last commanded by the engine
    pub rect: Rect,
    pub visible: bool,
    pub arrow_offset: Point,
    pub frame: AnimationFrame,
    /// Width constraint on the content area
    pub width_limit: Option<f32>,
}

/// A headless host: anchors, surfaces, overlays and a virtual clock.
#[derive(Debug)]
pub struct Scene {
    alive: bool,
    root: Rect,
    root_shown: bool,
    metrics: TextMetrics,
    next_id: u64,
    now: u64,
    nodes: HashMap<u64, Node>,
    custom_content: HashMap<u64, Size>,
    surfaces: HashMap<u64, SurfaceState>,
    subscribed: HashSet<u64>,
    layout_requested: bool,
    watchers: HashMap<u64, HashSet<u64>>,
    pending_events: Vec<(AnchorId, AnchorEvent)>,
    overlays: HashMap<u64, HighlightMask>,
    /// (due, handle) ordered by due time, then creation order
    timers: BTreeMap<(u64, u64), TimerHandle>,
}

impl Scene {
    pub fn new(root: Rect) -> Self {
        Self {
            alive: true,
            root,
            root_shown: true,
            metrics: TextMetrics::default(),
            next_id: 1,
            now: 0,
            nodes: HashMap::new(),
            custom_content: HashMap::new(),
            surfaces: HashMap::new(),
            subscribed: HashSet::new(),
            layout_requested: false,
            watchers: HashMap::new(),
            pending_events: Vec::new(),
            overlays: HashMap::new(),
            timers: BTreeMap::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: TextMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    fn next_handle(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn root(&self) -> Rect {
        self.root
    }

    /// Tear the whole host context down; every later operation is refused
    pub fn teardown(&mut self) {
        log::info!("scene torn down");
        self.alive = false;
    }

    /// Show or hide the root (e.g. an enclosing dialog closing)
    pub fn set_root_shown(&mut self, shown: bool) {
        self.root_shown = shown;
        self.layout_requested = true;
    }

    /// Add an attached, visible element at `rect`
    pub fn add_node(&mut self, rect: Rect) -> AnchorId {
        let id = self.next_handle();
        self.nodes.insert(
            id,
            Node {
                rect,
                attached: true,
                visible: true,
            },
        );
        AnchorId(id)
    }

    /// Register host-built content of a fixed size
    pub fn add_content(&mut self, size: Size) -> ContentId {
        let id = self.next_handle();
        self.custom_content.insert(id, size);
        ContentId(id)
    }

    fn node_mut(&mut self, anchor: AnchorId) -> Result<&mut Node, SceneError> {
        self.nodes
            .get_mut(&anchor.0)
            .ok_or(SceneError::UnknownNode(anchor.0))
    }

    fn notify(&mut self, anchor: AnchorId, event: AnchorEvent) {
        if self.watchers.get(&anchor.0).is_some_and(|w| !w.is_empty()) {
            self.pending_events.push((anchor, event));
        }
    }

    /// Move a node as if an ancestor scrolled by (dx, dy)
    pub fn scroll_node(&mut self, anchor: AnchorId, dx: f32, dy: f32) -> Result<(), SceneError> {
        let node = self.node_mut(anchor)?;
        node.rect = Rect::new(
            node.rect.left + dx,
            node.rect.top + dy,
            node.rect.right + dx,
            node.rect.bottom + dy,
        );
        self.notify(anchor, AnchorEvent::Scrolled);
        Ok(())
    }

    pub fn resize_node(&mut self, anchor: AnchorId, size: Size) -> Result<(), SceneError> {
        let node = self.node_mut(anchor)?;
        node.rect = Rect::from_origin_size(node.rect.origin(), size);
        self.notify(anchor, AnchorEvent::Resized);
        self.layout_requested = true;
        Ok(())
    }

    pub fn set_node_visible(&mut self, anchor: AnchorId, visible: bool) -> Result<(), SceneError> {
        self.node_mut(anchor)?.visible = visible;
        self.notify(anchor, AnchorEvent::VisibilityChanged);
        Ok(())
    }

    pub fn detach_node(&mut self, anchor: AnchorId) -> Result<(), SceneError> {
        self.node_mut(anchor)?.attached = false;
        self.notify(anchor, AnchorEvent::Detached);
        Ok(())
    }

    pub fn attach_node(&mut self, anchor: AnchorId) -> Result<(), SceneError> {
        self.node_mut(anchor)?.attached = true;
        self.notify(anchor, AnchorEvent::Attached);
        Ok(())
    }

    /// Drop the node entirely; handles to it resolve to absent from now on
    pub fn remove_node(&mut self, anchor: AnchorId) {
        if self.nodes.remove(&anchor.0).is_some() {
            self.notify(anchor, AnchorEvent::Detached);
        }
    }

    pub fn surface(&self, surface: SurfaceId) -> Option<&SurfaceState> {
        self.surfaces.get(&surface.0)
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn overlay(&self, overlay: OverlayId) -> Option<&HighlightMask> {
        self.overlays.get(&overlay.0)
    }

    pub fn overlays(&self) -> impl Iterator<Item = &HighlightMask> {
        self.overlays.values()
    }

    pub fn watcher_count(&self, anchor: AnchorId) -> usize {
        self.watchers.get(&anchor.0).map_or(0, HashSet::len)
    }

    pub fn is_subscribed(&self, surface: SurfaceId) -> bool {
        self.subscribed.contains(&surface.0)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Consume the pending layout request, returning the surfaces that hear
    /// about the pass
    pub(crate) fn take_layout_pass(&mut self) -> Option<Vec<SurfaceId>> {
        if !std::mem::take(&mut self.layout_requested) {
            return None;
        }
        let mut surfaces: Vec<_> = self.subscribed.iter().copied().map(SurfaceId).collect();
        surfaces.sort_by_key(|s| s.0);
        Some(surfaces)
    }

    pub(crate) fn take_anchor_events(&mut self) -> Vec<(AnchorId, AnchorEvent)> {
        std::mem::take(&mut self.pending_events)
    }

    /// Surfaces watching `anchor`
    pub(crate) fn watchers_of(&self, anchor: AnchorId) -> Vec<SurfaceId> {
        self.watchers
            .get(&anchor.0)
            .map(|w| w.iter().copied().map(SurfaceId).collect())
            .unwrap_or_default()
    }

    /// Advance the clock to `until`, returning the timers that came due
    pub(crate) fn advance_clock(&mut self, until: u64) -> Vec<TimerHandle> {
        let mut due = Vec::new();
        while let Some((&(at, id), _)) = self.timers.first_key_value() {
            if at > until {
                break;
            }
            if let Some(handle) = self.timers.remove(&(at, id)) {
                self.now = at;
                due.push(handle);
            }
        }
        self.now = until.max(self.now);
        due
    }

    fn measure_content(&self, spec: &SurfaceSpec, width_limit: Option<f32>) -> Size {
        let padding = spec.content_padding * 2.0;
        match &spec.content {
            Content::Text(text) => {
                let inner_limit = width_limit.map(|w| (w - padding).max(self.metrics.char_width));
                let inner = self.metrics.measure(text, inner_limit);
                let natural = Size::new(inner.width + padding, inner.height + padding);
                match width_limit {
                    Some(limit) if natural.width > limit => Size::new(limit, natural.height),
                    _ => natural,
                }
            }
            Content::Custom(id) => {
                let size = self.custom_content.get(&id.0).copied().unwrap_or(Size::ZERO);
                let natural = Size::new(size.width + padding, size.height + padding);
                match width_limit {
                    Some(limit) => Size::new(natural.width.min(limit), natural.height),
                    None => natural,
                }
            }
        }
    }
}

impl AnchorSource for Scene {
    fn anchor_rect(&self, anchor: AnchorId) -> Option<Rect> {
        let node = self.nodes.get(&anchor.0)?;
        (node.attached && node.visible).then_some(node.rect)
    }
}

impl RenderHost for Scene {
    fn is_alive(&self) -> bool {
        self.alive
    }

    fn root_bounds(&self) -> Option<Rect> {
        (self.alive && self.root_shown).then_some(self.root)
    }

    fn create_surface(&mut self, spec: &SurfaceSpec) -> SurfaceId {
        let id = self.next_handle();
        self.surfaces.insert(
            id,
            SurfaceState {
                spec: spec.clone(),
                // provisional: parked at the root's far corner until positioned
                rect: Rect::from_origin_size(Point::new(self.root.right, self.root.bottom), Size::ZERO),
                visible: false,
                arrow_offset: Point::ZERO,
                frame: AnimationFrame::REST,
                width_limit: None,
            },
        );
        log::debug!("created surface {}", id);
        SurfaceId(id)
    }

    fn measure(&mut self, surface: SurfaceId) -> Measurement {
        let Some(state) = self.surfaces.get(&surface.0) else {
            return Measurement::default();
        };
        let content = self.measure_content(&state.spec, state.width_limit);
        let lp = state.spec.layout_padding * 2.0;
        let arrow = state.spec.arrow.unwrap_or(Size::ZERO);
        let surface = if state.spec.arrow_direction.is_horizontal() {
            Size::new(
                content.width.max(arrow.width) + lp,
                content.height + arrow.height + lp,
            )
        } else {
            Size::new(
                content.width + arrow.width + lp,
                content.height.max(arrow.height) + lp,
            )
        };
        Measurement { content, surface }
    }

    fn constrain_width(&mut self, surface: SurfaceId, width: f32) {
        if let Some(state) = self.surfaces.get_mut(&surface.0) {
            state.width_limit = Some(width);
        }
    }

    fn update_surface(&mut self, surface: SurfaceId, x: f32, y: f32, width: f32, height: f32) {
        if let Some(state) = self.surfaces.get_mut(&surface.0) {
            state.rect = Rect::from_origin_size(Point::new(x, y), Size::new(width, height));
        }
    }

    fn set_arrow_offset(&mut self, surface: SurfaceId, offset: Point) {
        if let Some(state) = self.surfaces.get_mut(&surface.0) {
            state.arrow_offset = offset;
        }
    }

    fn set_surface_visible(&mut self, surface: SurfaceId, visible: bool) {
        if let Some(state) = self.surfaces.get_mut(&surface.0) {
            state.visible = visible;
        }
    }

    fn apply_frame(&mut self, surface: SurfaceId, frame: AnimationFrame) {
        if let Some(state) = self.surfaces.get_mut(&surface.0) {
            state.frame = frame;
        }
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        self.surfaces.remove(&surface.0);
        self.subscribed.remove(&surface.0);
        log::debug!("destroyed surface {}", surface.0);
    }

    fn request_layout(&mut self, _surface: SurfaceId) {
        self.layout_requested = true;
    }

    fn subscribe_layout(&mut self, surface: SurfaceId) {
        self.subscribed.insert(surface.0);
    }

    fn unsubscribe_layout(&mut self, surface: SurfaceId) {
        self.subscribed.remove(&surface.0);
    }

    fn watch_anchor(&mut self, anchor: AnchorId, surface: SurfaceId) {
        self.watchers.entry(anchor.0).or_default().insert(surface.0);
    }

    fn unwatch_anchor(&mut self, anchor: AnchorId, surface: SurfaceId) {
        if let Some(watchers) = self.watchers.get_mut(&anchor.0) {
            watchers.remove(&surface.0);
            if watchers.is_empty() {
                self.watchers.remove(&anchor.0);
            }
        }
    }

    fn show_overlay(&mut self, mask: &HighlightMask) -> OverlayId {
        let id = self.next_handle();
        self.overlays.insert(id, *mask);
        OverlayId(id)
    }

    fn update_overlay(&mut self, overlay: OverlayId, mask: &HighlightMask) {
        if let Some(current) = self.overlays.get_mut(&overlay.0) {
            *current = *mask;
        }
    }

    fn remove_overlay(&mut self, overlay: OverlayId) {
        self.overlays.remove(&overlay.0);
    }
}

impl Scheduler for Scene {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn schedule_after(&mut self, delay_ms: u64) -> TimerHandle {
        let id = self.next_handle();
        let handle = TimerHandle(id);
        self.timers.insert((self.now + delay_ms, id), handle);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.timers.retain(|_, h| *h != handle);
    }
}
