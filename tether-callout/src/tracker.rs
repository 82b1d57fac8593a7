//! Anchor tracking through a resolve-or-absent handle

use crate::host::{AnchorEvent, AnchorId, AnchorSource, RenderHost, SurfaceId};
use crate::types::Rect;

/// What a tracker notification means for the callout
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerUpdate {
    /// The anchor now sits at this rectangle
    Moved(Rect),
    /// Still resolvable, geometry unchanged
    Unchanged,
    /// Detached, hidden, or no longer resolvable
    Gone,
}

/// Follows one anchor element without owning it.
#[derive(Debug)]
pub struct AnchorTracker {
    anchor: AnchorId,
    last_rect: Option<Rect>,
    /// Surface the host delivers our notifications for
    watching: Option<SurfaceId>,
}

impl AnchorTracker {
    pub fn new(anchor: AnchorId) -> Self {
        Self {
            anchor,
            last_rect: None,
            watching: None,
        }
    }

    pub fn anchor(&self) -> AnchorId {
        self.anchor
    }

    /// Last rectangle seen by [`resolve`](Self::resolve)
    pub fn last_rect(&self) -> Option<Rect> {
        self.last_rect
    }

    pub fn is_watching(&self) -> bool {
        self.watching.is_some()
    }

    /// Look the anchor up again, remembering the result
    pub fn resolve<S: AnchorSource + ?Sized>(&mut self, source: &S) -> Option<Rect> {
        self.last_rect = source.anchor_rect(self.anchor);
        self.last_rect
    }

    /// Subscribe to the anchor's notifications on behalf of `surface`
    pub fn attach<H: RenderHost + ?Sized>(&mut self, host: &mut H, surface: SurfaceId) {
        if self.watching.is_some() {
            return;
        }
        host.watch_anchor(self.anchor, surface);
        self.watching = Some(surface);
    }

    /// Drop our subscription, if any
    pub fn detach<H: RenderHost + ?Sized>(&mut self, host: &mut H) {
        if let Some(surface) = self.watching.take() {
            host.unwatch_anchor(self.anchor, surface);
        }
    }

    /// Interpret a host notification
    pub fn handle<S: AnchorSource + ?Sized>(&mut self, source: &S, event: AnchorEvent) -> TrackerUpdate {
        if event == AnchorEvent::Detached {
            log::debug!("anchor {:?} detached", self.anchor);
            self.last_rect = None;
            return TrackerUpdate::Gone;
        }

        let previous = self.last_rect;
        match self.resolve(source) {
            None => {
                log::debug!("anchor {:?} no longer resolvable after {:?}", self.anchor, event);
                TrackerUpdate::Gone
            }
            Some(rect) if Some(rect) == previous => TrackerUpdate::Unchanged,
            Some(rect) => TrackerUpdate::Moved(rect),
        }
    }
}
