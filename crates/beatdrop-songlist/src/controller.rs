//! The song list controller: single owner of the list session.
//!
//! Design principles (same contract as a UI component):
//! - the controller owns its `ListSession`; nobody else mutates it;
//! - it reacts to `ListEvent`s and returns `Vec<Effect>`; it never performs
//!   I/O itself;
//! - the runtime executes effects and feeds completions back as events.

use beatdrop_proto::config::{Config, LinksConfig, NoticesConfig};
use beatdrop_proto::protocol::{Command, Notice};
use futures_util::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::actions::{self, MenuChoice, ShareOutcome};
use crate::downloaded::DownloadedSet;
use crate::highlight::HighlightTarget;
use crate::pagination::{CatalogPage, PageOutcome, PageRequest, PaginationController};
use crate::render_key::song_render_key;
use crate::session::{ListSession, SessionStore};
use crate::view::{ListView, SongRow, ViewDensity};
use crate::viewport::{NavKey, ScrollMetrics};

/// Inputs to the controller.
#[derive(Debug)]
pub enum ListEvent {
    Scrolled(ScrollMetrics),
    Key(NavKey),
    Menu { index: usize, choice: MenuChoice },
    SetDensity(ViewDensity),
    SetAutoLoadMore(bool),
    /// Throw away the rows and load from the first page again.
    Reload,
    PageLoaded {
        request: PageRequest,
        result: anyhow::Result<CatalogPage>,
    },
    /// The local library reported its current contents.
    DownloadedSetChanged(DownloadedSet),
    CommandFinished {
        command: Command,
        result: Result<(), String>,
    },
    Unmount,
}

/// Work for the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch(PageRequest),
    Dispatch(Command),
    Notify(Notice),
    RestoreScroll(u32),
}

pub struct SongListController {
    session: ListSession,
    pagination: PaginationController,
    downloaded: DownloadedSet,
    links: LinksConfig,
    notices: NoticesConfig,
    store: Box<dyn SessionStore>,
}

impl SongListController {
    pub fn new(config: &Config, store: Box<dyn SessionStore>) -> Self {
        let density = if config.list.compact {
            ViewDensity::Compact
        } else {
            ViewDensity::Full
        };
        let session = ListSession::new(config.list.auto_load_more, density, store.scroll_top());
        Self {
            session,
            pagination: PaginationController::new(
                config.list.page_size,
                config.list.scroll_threshold_px,
            ),
            downloaded: DownloadedSet::new(),
            links: config.links.clone(),
            notices: config.notices.clone(),
            store,
        }
    }

    pub fn session(&self) -> &ListSession {
        &self.session
    }

    pub fn downloaded(&self) -> &DownloadedSet {
        &self.downloaded
    }

    /// Restore the remembered scroll position and request the first page.
    pub fn mount(&mut self) -> Vec<Effect> {
        let top = self.session.scroll_top;
        info!("[list] mount, restoring scroll_top={}", top);
        let first = self.pagination.start(&mut self.session);
        vec![Effect::RestoreScroll(top), Effect::Fetch(first)]
    }

    pub fn handle(&mut self, event: ListEvent) -> Vec<Effect> {
        if self.session.closed {
            debug!("[list] ignoring {:?} after unmount", event_name(&event));
            return Vec::new();
        }
        match event {
            ListEvent::Scrolled(metrics) => {
                let request = self.pagination.on_scroll(&mut self.session, metrics);
                self.store.save_scroll_top(self.session.scroll_top);
                request.map(Effect::Fetch).into_iter().collect()
            }
            ListEvent::Key(key) => self.on_key(key),
            ListEvent::Menu { index, choice } => self.on_menu(index, choice),
            ListEvent::SetDensity(density) => {
                self.session.density = density;
                Vec::new()
            }
            ListEvent::SetAutoLoadMore(enabled) => {
                self.session.auto_load_more = enabled;
                Vec::new()
            }
            ListEvent::Reload => {
                info!("[list] reload");
                vec![Effect::Fetch(self.pagination.start(&mut self.session))]
            }
            ListEvent::PageLoaded { request, result } => {
                match self.pagination.complete(&mut self.session, request, result) {
                    PageOutcome::Failed(e) => vec![Effect::Notify(Notice::warning(e.to_string()))],
                    PageOutcome::Loaded { .. } | PageOutcome::Discarded => Vec::new(),
                }
            }
            ListEvent::DownloadedSetChanged(set) => {
                debug!("[list] downloaded set now has {} songs", set.len());
                self.downloaded = set;
                Vec::new()
            }
            ListEvent::CommandFinished { command, result } => self.on_command_finished(command, result),
            ListEvent::Unmount => {
                self.unmount();
                Vec::new()
            }
        }
    }

    fn on_key(&mut self, key: NavKey) -> Vec<Effect> {
        let len = self.session.songs.len();
        match key {
            NavKey::Up => {
                self.session.highlight.up();
                Vec::new()
            }
            NavKey::Down => {
                self.session.highlight.down(len);
                Vec::new()
            }
            NavKey::Activate => match self.session.highlight.target(len) {
                Some(HighlightTarget::Song(index)) => self.on_menu(index, MenuChoice::Primary),
                Some(HighlightTarget::LoadMore) => self
                    .pagination
                    .request_more(&mut self.session)
                    .map(Effect::Fetch)
                    .into_iter()
                    .collect(),
                None => Vec::new(),
            },
        }
    }

    fn on_menu(&mut self, index: usize, choice: MenuChoice) -> Vec<Effect> {
        let Some(song) = self.session.songs.get(index).cloned() else {
            debug!("[list] menu for missing row {}", index);
            return Vec::new();
        };
        match choice {
            MenuChoice::Primary => match actions::primary_action(&song, &self.downloaded) {
                Some(action) => {
                    info!("[list] {} {:?}", action.verb(), song.title);
                    vec![Effect::Dispatch(action.command())]
                }
                None => {
                    warn!("[list] no download identity for {:?}", song.title);
                    Vec::new()
                }
            },
            MenuChoice::AddToPlaylist => {
                let command = Command::OpenPlaylistPicker {
                    identity: crate::identity::share_identity(&song).ok().map(str::to_string),
                    title: song.title.clone(),
                };
                self.session.playlist_target = Some(song);
                vec![Effect::Dispatch(command)]
            }
            MenuChoice::Share => {
                match actions::share(&song, &self.links, &self.notices, self.session.rescan_pending) {
                    ShareOutcome::Copied { command, notice } => {
                        vec![Effect::Dispatch(command), Effect::Notify(notice)]
                    }
                    ShareOutcome::Unidentified { notice, rescan } => {
                        let mut effects = vec![Effect::Notify(notice)];
                        if let Some(command) = rescan {
                            self.session.rescan_pending = true;
                            effects.push(Effect::Dispatch(command));
                        }
                        effects
                    }
                }
            }
            MenuChoice::ViewOnline => actions::view_online_url(&song, &self.links.view_online_base)
                .map(|url| Effect::Dispatch(Command::OpenExternal { url }))
                .into_iter()
                .collect(),
        }
    }

    fn on_command_finished(&mut self, command: Command, result: Result<(), String>) -> Vec<Effect> {
        match &command {
            Command::RescanDownloaded => self.session.rescan_pending = false,
            Command::OpenPlaylistPicker { .. } if result.is_err() => {
                self.session.playlist_target = None;
            }
            _ => {}
        }
        match result {
            Ok(()) => {
                debug!("[list] {} finished", command.label());
                Vec::new()
            }
            Err(reason) => {
                let error = crate::error::SongListError::Command {
                    command: command.label(),
                    reason,
                };
                warn!("[list] {}", error);
                vec![Effect::Notify(Notice::warning(error.to_string()))]
            }
        }
    }

    /// Close the session: remember the scroll position, drop the rows, and
    /// make any in-flight page land on a closed session.
    pub fn unmount(&mut self) {
        if self.session.closed {
            return;
        }
        info!("[list] unmount at scroll_top={}", self.session.scroll_top);
        self.store.save_scroll_top(self.session.scroll_top);
        self.session.clear_rows();
        self.session.loading = false;
        self.session.loading_more = false;
        self.session.closed = true;
    }

    /// Wait for the session store to persist what it was given.
    pub fn flush_store(&mut self) -> BoxFuture<'static, ()> {
        self.store.flush()
    }

    /// Build the rows and flags for the renderer.
    pub fn view(&self) -> ListView {
        let highlighted = self.session.highlight.index();
        let rows = self
            .session
            .songs
            .iter()
            .enumerate()
            .map(|(i, song)| {
                let actions = actions::resolve_actions(song, &self.downloaded, &self.links);
                SongRow {
                    render_key: song_render_key(song, i, actions.is_downloaded, self.session.density),
                    song: song.clone(),
                    actions,
                    highlighted: highlighted == i as isize,
                }
            })
            .collect();
        ListView {
            rows,
            total_count: self.session.total_count,
            loading: self.session.loading,
            loading_more: self.session.loading_more,
            scroll_top: self.session.scroll_top,
            highlighted,
            show_load_more: self.session.has_more(),
            density: self.session.density,
            playlist_target: self.session.playlist_target.as_ref().map(|s| s.title.clone()),
        }
    }
}

fn event_name(event: &ListEvent) -> &'static str {
    match event {
        ListEvent::Scrolled(_) => "scroll",
        ListEvent::Key(_) => "key",
        ListEvent::Menu { .. } => "menu",
        ListEvent::SetDensity(_) => "density",
        ListEvent::SetAutoLoadMore(_) => "auto-load-more",
        ListEvent::Reload => "reload",
        ListEvent::PageLoaded { .. } => "page",
        ListEvent::DownloadedSetChanged(_) => "downloaded-set",
        ListEvent::CommandFinished { .. } => "command-finished",
        ListEvent::Unmount => "unmount",
    }
}
