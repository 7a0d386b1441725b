//! The scrollable surface the list is mounted into.
//!
//! Front-ends implement [`Viewport`]; the runtime subscribes once on mount
//! and holds the returned [`Subscription`] for as long as the list lives.
//! Dropping the subscription releases the listeners.

use tokio::sync::mpsc;

use crate::actions::MenuChoice;
use crate::view::ViewDensity;

/// Scroll geometry in pixels, as reported on every scroll event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollMetrics {
    pub scroll_top: u32,
    pub scroll_height: u32,
    pub client_height: u32,
}

impl ScrollMetrics {
    /// Pixels left below the visible area.  Negative when overscrolled.
    pub fn distance_from_bottom(&self) -> i64 {
        i64::from(self.scroll_height) - i64::from(self.scroll_top) - i64::from(self.client_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    /// Run the highlighted row: its primary action, or load more.
    Activate,
}

/// Input from the mounted surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportEvent {
    Scrolled(ScrollMetrics),
    Key(NavKey),
    Menu { index: usize, choice: MenuChoice },
    SetDensity(ViewDensity),
    SetAutoLoadMore(bool),
    Reload,
    /// The surface went away; the list unmounts.
    Closed,
}

pub trait Viewport: Send {
    /// Scroll to a remembered position after mount.
    fn restore_scroll_top(&mut self, top: u32);

    /// The number of rendered rows changed.
    fn content_changed(&mut self, _rows: usize) {}

    /// Start delivering events to `events` until the subscription is dropped.
    fn subscribe(&mut self, events: mpsc::UnboundedSender<ViewportEvent>) -> Subscription;
}

/// Scoped listener registration.  Runs its release hook exactly once, on drop.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
