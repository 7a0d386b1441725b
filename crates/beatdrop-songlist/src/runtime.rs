//! SongListRuntime: async driver around the synchronous controller.
//!
//! The runtime owns the controller for the lifetime of one mounted list.
//! Viewport input and collaborator completions both arrive over mpsc
//! channels and are fed to the controller one at a time; the effects it
//! returns are executed here.  Fetches and commands run on spawned tasks,
//! so a slow catalog never blocks scrolling.
//!
//! On `ViewportEvent::Closed` (or when the viewport drops its sender) the
//! controller is unmounted and the viewport subscription released.  `run`
//! returns once the session store is flushed.  Tasks still in flight
//! complete into a closed channel and are lost.

use std::sync::Arc;

use beatdrop_proto::protocol::{Command, Notice};
use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::controller::{Effect, ListEvent, SongListController};
use crate::downloaded::DownloadedSet;
use crate::pagination::{CatalogPage, PageRequest};
use crate::view::ListView;
use crate::viewport::{Viewport, ViewportEvent};

// ── Collaborators ─────────────────────────────────────────────────────────────

/// Remote catalog, queried one page at a time.
pub trait CatalogSource: Send + Sync {
    fn fetch_page(&self, request: PageRequest) -> BoxFuture<'static, anyhow::Result<CatalogPage>>;
}

/// The local song library: executes commands and reports what is on disk.
pub trait LibraryCommands: Send + Sync {
    fn execute(&self, command: Command) -> BoxFuture<'static, anyhow::Result<()>>;
    fn downloaded(&self) -> BoxFuture<'static, anyhow::Result<DownloadedSet>>;
}

pub trait NoticeSink: Send {
    fn notify(&mut self, notice: Notice);
}

pub trait Presenter: Send {
    fn render(&mut self, view: &ListView);
}

impl From<ViewportEvent> for ListEvent {
    fn from(event: ViewportEvent) -> Self {
        match event {
            ViewportEvent::Scrolled(metrics) => Self::Scrolled(metrics),
            ViewportEvent::Key(key) => Self::Key(key),
            ViewportEvent::Menu { index, choice } => Self::Menu { index, choice },
            ViewportEvent::SetDensity(density) => Self::SetDensity(density),
            ViewportEvent::SetAutoLoadMore(enabled) => Self::SetAutoLoadMore(enabled),
            ViewportEvent::Reload => Self::Reload,
            ViewportEvent::Closed => Self::Unmount,
        }
    }
}

/// Commands after which the downloaded set is asked for again.
fn changes_library(command: &Command) -> bool {
    matches!(
        command,
        Command::Download { .. } | Command::Delete { .. } | Command::RescanDownloaded
    )
}

// ── SongListRuntime ───────────────────────────────────────────────────────────

pub struct SongListRuntime {
    controller: SongListController,
    catalog: Arc<dyn CatalogSource>,
    library: Arc<dyn LibraryCommands>,
    notices: Box<dyn NoticeSink>,
    presenter: Box<dyn Presenter>,
    /// Last view handed to the presenter (to skip identical renders).
    last_view: Option<ListView>,
}

impl SongListRuntime {
    pub fn new(
        controller: SongListController,
        catalog: Arc<dyn CatalogSource>,
        library: Arc<dyn LibraryCommands>,
        notices: Box<dyn NoticeSink>,
        presenter: Box<dyn Presenter>,
    ) -> Self {
        Self {
            controller,
            catalog,
            library,
            notices,
            presenter,
            last_view: None,
        }
    }

    /// Mount the list into `viewport` and run until it closes.  Returns the
    /// unmounted controller.
    pub async fn run<V: Viewport>(mut self, mut viewport: V) -> SongListController {
        info!("SongListRuntime: mounting");
        let (view_tx, mut view_rx) = mpsc::unbounded_channel();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let subscription = viewport.subscribe(view_tx);

        self.spawn_downloaded_refresh(&done_tx);
        let effects = self.controller.mount();
        self.apply(effects, &mut viewport, &done_tx);
        self.render(&mut viewport);

        loop {
            let event = tokio::select! {
                input = view_rx.recv() => match input {
                    None | Some(ViewportEvent::Closed) => break,
                    Some(input) => ListEvent::from(input),
                },
                Some(done) = done_rx.recv() => done,
            };
            let effects = self.controller.handle(event);
            self.apply(effects, &mut viewport, &done_tx);
            self.render(&mut viewport);
        }

        info!("SongListRuntime: viewport closed, unmounting");
        self.controller.unmount();
        drop(subscription);
        self.controller.flush_store().await;
        self.controller
    }

    fn apply<V: Viewport>(
        &mut self,
        effects: Vec<Effect>,
        viewport: &mut V,
        done_tx: &mpsc::UnboundedSender<ListEvent>,
    ) {
        for effect in effects {
            match effect {
                Effect::Fetch(request) => self.spawn_fetch(request, done_tx),
                Effect::Dispatch(command) => self.spawn_command(command, done_tx),
                Effect::Notify(notice) => self.notices.notify(notice),
                Effect::RestoreScroll(top) => viewport.restore_scroll_top(top),
            }
        }
    }

    fn spawn_fetch(&self, request: PageRequest, done_tx: &mpsc::UnboundedSender<ListEvent>) {
        debug!("SongListRuntime: fetch offset={} limit={}", request.offset, request.limit);
        let fetch = self.catalog.fetch_page(request);
        let tx = done_tx.clone();
        tokio::spawn(async move {
            let result = fetch.await;
            let _ = tx.send(ListEvent::PageLoaded { request, result });
        });
    }

    fn spawn_command(&self, command: Command, done_tx: &mpsc::UnboundedSender<ListEvent>) {
        info!("SongListRuntime: dispatch {}", command.label());
        let execution = self.library.execute(command.clone());
        let library = Arc::clone(&self.library);
        let tx = done_tx.clone();
        tokio::spawn(async move {
            let result = execution.await.map_err(|e| format!("{:#}", e));
            let refresh = result.is_ok() && changes_library(&command);
            if tx.send(ListEvent::CommandFinished { command, result }).is_err() {
                return;
            }
            if refresh {
                send_downloaded(library.as_ref(), &tx).await;
            }
        });
    }

    fn spawn_downloaded_refresh(&self, done_tx: &mpsc::UnboundedSender<ListEvent>) {
        let library = Arc::clone(&self.library);
        let tx = done_tx.clone();
        tokio::spawn(async move {
            send_downloaded(library.as_ref(), &tx).await;
        });
    }

    fn render<V: Viewport>(&mut self, viewport: &mut V) {
        let view = self.controller.view();
        if self.last_view.as_ref() == Some(&view) {
            return;
        }
        let rows_changed = self
            .last_view
            .as_ref()
            .map_or(true, |last| last.rows.len() != view.rows.len());
        self.presenter.render(&view);
        if rows_changed {
            viewport.content_changed(view.rows.len());
        }
        self.last_view = Some(view);
    }
}

async fn send_downloaded(library: &dyn LibraryCommands, tx: &mpsc::UnboundedSender<ListEvent>) {
    match library.downloaded().await {
        Ok(set) => {
            let _ = tx.send(ListEvent::DownloadedSetChanged(set));
        }
        Err(e) => warn!("SongListRuntime: reading downloaded songs failed: {:#}", e),
    }
}
