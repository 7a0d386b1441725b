use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use beatdrop_proto::config::Config;
use beatdrop_proto::protocol::{Command, DeleteTarget, Notice};
use beatdrop_songlist::downloaded::DownloadedSet;
use beatdrop_songlist::pagination::{CatalogPage, PageRequest};
use beatdrop_songlist::runtime::{
    CatalogSource, LibraryCommands, NoticeSink, Presenter, SongListRuntime,
};
use beatdrop_songlist::session::MemorySessionStore;
use beatdrop_songlist::view::ListView;
use beatdrop_songlist::viewport::{ScrollMetrics, Subscription, Viewport, ViewportEvent};
use beatdrop_songlist::{RawSongRecord, SongListController};
use futures_util::future::BoxFuture;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;

pub const WAIT: Duration = Duration::from_secs(5);

/// `count` catalog records with hashes `h0..`.
pub fn catalog_records(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "metadata": { "songName": format!("Song {}", i), "songAuthorName": "Artist" },
                "hash": format!("h{}", i),
                "stats": { "rating": 0.8, "downloads": i }
            })
        })
        .collect()
}

pub fn at_bottom() -> ScrollMetrics {
    ScrollMetrics {
        scroll_top: 1200,
        scroll_height: 1600,
        client_height: 400,
    }
}

// ── Catalog ───────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeCatalog {
    records: Arc<Vec<Value>>,
    /// When set, every page waits for a permit before resolving.
    gate: Option<Arc<Notify>>,
    pub requests: Arc<Mutex<Vec<PageRequest>>>,
}

impl FakeCatalog {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records: Arc::new(records),
            ..Self::default()
        }
    }

    pub fn gated(records: Vec<Value>, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(records)
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl CatalogSource for FakeCatalog {
    fn fetch_page(&self, request: PageRequest) -> BoxFuture<'static, anyhow::Result<CatalogPage>> {
        self.requests.lock().unwrap().push(request);
        let records = Arc::clone(&self.records);
        let gate = self.gate.clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            let page = records
                .iter()
                .skip(request.offset)
                .take(request.limit)
                .cloned()
                .map(RawSongRecord::from_value)
                .collect();
            Ok(CatalogPage {
                records: page,
                total: records.len(),
            })
        })
    }
}

// ── Library ───────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeLibrary {
    pub downloaded: Arc<Mutex<DownloadedSet>>,
    pub executed: Arc<Mutex<Vec<Command>>>,
    /// When set, a rescan waits for a permit before finishing.
    rescan_gate: Option<Arc<Notify>>,
}

impl FakeLibrary {
    pub fn with_downloaded<'a>(hashes: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            downloaded: Arc::new(Mutex::new(DownloadedSet::from_hashes(hashes))),
            ..Self::default()
        }
    }

    pub fn gated_rescan(gate: Arc<Notify>) -> Self {
        Self {
            rescan_gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn executed(&self) -> Vec<Command> {
        self.executed.lock().unwrap().clone()
    }

    pub fn rescan_count(&self) -> usize {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == Command::RescanDownloaded)
            .count()
    }
}

impl LibraryCommands for FakeLibrary {
    fn execute(&self, command: Command) -> BoxFuture<'static, anyhow::Result<()>> {
        self.executed.lock().unwrap().push(command.clone());
        let downloaded = Arc::clone(&self.downloaded);
        let gate = match command {
            Command::RescanDownloaded => self.rescan_gate.clone(),
            _ => None,
        };
        Box::pin(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            let mut set = downloaded.lock().unwrap();
            match command {
                Command::Download { hash } => {
                    set.insert(hash);
                }
                Command::Delete {
                    target: DeleteTarget::Hash(hash),
                } => {
                    set.remove(&hash);
                }
                _ => {}
            }
            Ok(())
        })
    }

    fn downloaded(&self) -> BoxFuture<'static, anyhow::Result<DownloadedSet>> {
        let set = self.downloaded.lock().unwrap().clone();
        Box::pin(async move { Ok(set) })
    }
}

// ── Sinks and viewport ────────────────────────────────────────────────────────

pub struct ChannelNotices(pub mpsc::UnboundedSender<Notice>);

impl NoticeSink for ChannelNotices {
    fn notify(&mut self, notice: Notice) {
        let _ = self.0.send(notice);
    }
}

pub struct ChannelPresenter(pub mpsc::UnboundedSender<ListView>);

impl Presenter for ChannelPresenter {
    fn render(&mut self, view: &ListView) {
        let _ = self.0.send(view.clone());
    }
}

/// Hands its event sender to the test once the runtime subscribes.
pub struct FakeViewport {
    handoff: Option<oneshot::Sender<mpsc::UnboundedSender<ViewportEvent>>>,
    pub restored: Arc<Mutex<Vec<u32>>>,
    pub released: Arc<AtomicBool>,
}

impl Viewport for FakeViewport {
    fn restore_scroll_top(&mut self, top: u32) {
        self.restored.lock().unwrap().push(top);
    }

    fn subscribe(&mut self, events: mpsc::UnboundedSender<ViewportEvent>) -> Subscription {
        if let Some(handoff) = self.handoff.take() {
            let _ = handoff.send(events);
        }
        let released = Arc::clone(&self.released);
        Subscription::new(move || released.store(true, Ordering::SeqCst))
    }
}

// ── Harness ───────────────────────────────────────────────────────────────────

pub struct Harness {
    pub input: mpsc::UnboundedSender<ViewportEvent>,
    pub views: mpsc::UnboundedReceiver<ListView>,
    pub notices: mpsc::UnboundedReceiver<Notice>,
    pub restored: Arc<Mutex<Vec<u32>>>,
    pub released: Arc<AtomicBool>,
    pub handle: JoinHandle<SongListController>,
}

impl Harness {
    pub async fn mount(catalog: FakeCatalog, library: FakeLibrary, store: MemorySessionStore) -> Self {
        let controller = SongListController::new(&Config::default(), Box::new(store));
        let (view_tx, views) = mpsc::unbounded_channel();
        let (notice_tx, notices) = mpsc::unbounded_channel();
        let (handoff_tx, handoff_rx) = oneshot::channel();
        let restored = Arc::new(Mutex::new(Vec::new()));
        let released = Arc::new(AtomicBool::new(false));
        let viewport = FakeViewport {
            handoff: Some(handoff_tx),
            restored: Arc::clone(&restored),
            released: Arc::clone(&released),
        };
        let runtime = SongListRuntime::new(
            controller,
            Arc::new(catalog),
            Arc::new(library),
            Box::new(ChannelNotices(notice_tx)),
            Box::new(ChannelPresenter(view_tx)),
        );
        let handle = tokio::spawn(runtime.run(viewport));
        let input = tokio::time::timeout(WAIT, handoff_rx)
            .await
            .expect("runtime subscribed")
            .expect("viewport handoff");
        Self {
            input,
            views,
            notices,
            restored,
            released,
            handle,
        }
    }

    pub fn send(&self, event: ViewportEvent) {
        self.input.send(event).expect("runtime is running");
    }

    /// Next rendered view matching `pred`.
    pub async fn view_where(&mut self, pred: impl Fn(&ListView) -> bool) -> ListView {
        tokio::time::timeout(WAIT, async {
            loop {
                let view = self.views.recv().await.expect("runtime still rendering");
                if pred(&view) {
                    return view;
                }
            }
        })
        .await
        .expect("expected view was rendered")
    }

    pub async fn next_notice(&mut self) -> Notice {
        tokio::time::timeout(WAIT, self.notices.recv())
            .await
            .expect("notice in time")
            .expect("notice channel open")
    }

    /// Close the viewport and wait for the runtime to unmount.
    pub async fn close(self) -> (SongListController, Vec<ListView>, Arc<AtomicBool>) {
        let Harness {
            input,
            mut views,
            released,
            handle,
            ..
        } = self;
        let _ = input.send(ViewportEvent::Closed);
        let controller = tokio::time::timeout(WAIT, handle)
            .await
            .expect("runtime stopped")
            .expect("runtime task");
        let mut rest = Vec::new();
        while let Ok(view) = views.try_recv() {
            rest.push(view);
        }
        (controller, rest, released)
    }
}
