//! List session state and the store that remembers it across mounts.
//!
//! `ListSession` lives from mount to unmount and is only changed through the
//! controller.  The scroll position additionally goes to a [`SessionStore`]
//! on every scroll (the file store writes it in the background), so a remounted list comes back where it was left.

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::highlight::HighlightNavigator;
use crate::normalize::SongView;
use crate::view::ViewDensity;

#[derive(Debug, Clone)]
pub struct ListSession {
    /// In load order; no two share a dedup identity.
    pub(crate) songs: Vec<SongView>,
    pub(crate) seen: HashSet<String>,
    /// Records received from the catalog, duplicates included.  Next page offset.
    pub(crate) fetched: usize,
    /// Never below `songs.len()`.
    pub(crate) total_count: usize,
    pub(crate) scroll_top: u32,
    pub(crate) highlight: HighlightNavigator,
    pub(crate) loading: bool,
    pub(crate) loading_more: bool,
    pub(crate) auto_load_more: bool,
    pub(crate) density: ViewDensity,
    /// Bumped on reload and unmount; page results from older generations are dropped.
    pub(crate) generation: u64,
    pub(crate) closed: bool,
    pub(crate) rescan_pending: bool,
    pub(crate) playlist_target: Option<SongView>,
}

impl ListSession {
    pub fn new(auto_load_more: bool, density: ViewDensity, scroll_top: u32) -> Self {
        Self {
            songs: Vec::new(),
            seen: HashSet::new(),
            fetched: 0,
            total_count: 0,
            scroll_top,
            highlight: HighlightNavigator::new(),
            loading: false,
            loading_more: false,
            auto_load_more,
            density,
            generation: 0,
            closed: false,
            rescan_pending: false,
            playlist_target: None,
        }
    }

    pub fn songs(&self) -> &[SongView] {
        &self.songs
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn scroll_top(&self) -> u32 {
        self.scroll_top
    }

    pub fn highlighted(&self) -> isize {
        self.highlight.index()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_loading_more(&self) -> bool {
        self.loading_more
    }

    pub fn auto_load_more(&self) -> bool {
        self.auto_load_more
    }

    pub fn density(&self) -> ViewDensity {
        self.density
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn rescan_pending(&self) -> bool {
        self.rescan_pending
    }

    pub fn playlist_target(&self) -> Option<&SongView> {
        self.playlist_target.as_ref()
    }

    pub fn fetched(&self) -> usize {
        self.fetched
    }

    /// The catalog has records past the ones already received.
    pub fn has_more(&self) -> bool {
        self.fetched < self.total_count
    }

    /// Drop all rows and start a new generation.
    pub(crate) fn clear_rows(&mut self) {
        self.songs.clear();
        self.seen.clear();
        self.fetched = 0;
        self.total_count = 0;
        self.highlight.reset();
        self.generation += 1;
    }
}

/// Shared session state that outlives one mounted list.
pub trait SessionStore: Send {
    fn scroll_top(&self) -> u32;
    fn save_scroll_top(&mut self, top: u32);

    /// Resolves once every saved value is persisted.  Called on unmount.
    fn flush(&mut self) -> BoxFuture<'static, ()> {
        Box::pin(async {})
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub scroll_top: u32,
}

/// In-process store.  Clones share the same state, so a handle kept by the
/// host survives the list being unmounted and mounted again.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<Mutex<SessionSnapshot>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemorySessionStore {
    fn scroll_top(&self) -> u32 {
        self.snapshot().scroll_top
    }

    fn save_scroll_top(&mut self, top: u32) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .scroll_top = top;
    }
}

/// Store persisted as JSON.  Saves only publish the new snapshot; a writer
/// task owns the file and writes the latest snapshot, so a burst of scroll
/// events costs one write rather than one per event.
///
/// Must be opened inside a tokio runtime.
#[derive(Debug)]
pub struct FileSessionStore {
    snapshot: SessionSnapshot,
    updates: Option<watch::Sender<SessionSnapshot>>,
    writer: Option<JoinHandle<()>>,
}

impl FileSessionStore {
    /// Open `path`.  A missing or unreadable file starts from defaults.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let snapshot = Self::load(&path);
        debug!("[session] {} -> scroll_top={}", path.display(), snapshot.scroll_top);
        let (updates, rx) = watch::channel(snapshot);
        let writer = tokio::spawn(write_loop(path, rx));
        Self {
            snapshot,
            updates: Some(updates),
            writer: Some(writer),
        }
    }

    fn load(path: &Path) -> SessionSnapshot {
        if let Ok(content) = std::fs::read_to_string(path) {
            if let Ok(snapshot) = serde_json::from_str::<SessionSnapshot>(&content) {
                return snapshot;
            }
        }
        SessionSnapshot::default()
    }
}

async fn write_loop(path: PathBuf, mut rx: watch::Receiver<SessionSnapshot>) {
    while rx.changed().await.is_ok() {
        let snapshot = *rx.borrow_and_update();
        if let Err(e) = save(&path, snapshot).await {
            warn!("[session] failed to write {}: {}", path.display(), e);
        }
    }
    debug!("[session] writer for {} stopped", path.display());
}

async fn save(path: &Path, snapshot: SessionSnapshot) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(&snapshot)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

impl SessionStore for FileSessionStore {
    fn scroll_top(&self) -> u32 {
        self.snapshot.scroll_top
    }

    fn save_scroll_top(&mut self, top: u32) {
        if self.snapshot.scroll_top == top {
            return;
        }
        self.snapshot.scroll_top = top;
        match &self.updates {
            Some(updates) => {
                let _ = updates.send(self.snapshot);
            }
            None => warn!("[session] store already flushed; scroll_top={} not persisted", top),
        }
    }

    /// Close the update channel and wait for the writer to drain it.
    fn flush(&mut self) -> BoxFuture<'static, ()> {
        self.updates = None;
        let writer = self.writer.take();
        Box::pin(async move {
            if let Some(writer) = writer {
                let _ = writer.await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_clones_share_state() {
        let host = MemorySessionStore::new();
        let mut mounted = host.clone();
        mounted.save_scroll_top(320);
        assert_eq!(host.scroll_top(), 320);
    }

    #[tokio::test]
    async fn test_file_store_round_trips_scroll_top() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("session.json");

        let mut store = FileSessionStore::open(&path);
        assert_eq!(store.scroll_top(), 0);
        store.save_scroll_top(1480);
        store.flush().await;

        let reopened = FileSessionStore::open(&path);
        assert_eq!(reopened.scroll_top(), 1480);
    }

    #[tokio::test]
    async fn test_file_store_keeps_last_of_a_burst() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut store = FileSessionStore::open(&path);
        for top in 1..=500 {
            store.save_scroll_top(top);
        }
        assert_eq!(store.scroll_top(), 500);
        store.flush().await;

        let content = std::fs::read_to_string(&path).unwrap();
        let saved: SessionSnapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(saved.scroll_top, 500);
    }

    #[tokio::test]
    async fn test_file_store_ignores_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(FileSessionStore::open(&path).scroll_top(), 0);
    }

    #[test]
    fn test_clear_rows_bumps_generation() {
        let mut session = ListSession::new(true, ViewDensity::Full, 0);
        session.songs.push(SongView::default());
        session.total_count = 5;
        session.clear_rows();
        assert!(session.songs().is_empty());
        assert_eq!(session.total_count(), 0);
        assert_eq!(session.generation(), 1);
    }
}
