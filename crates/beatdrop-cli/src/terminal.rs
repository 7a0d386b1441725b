//! Line-oriented terminal front-end: stdin commands in, plain text out.
//!
//! The list is laid out as fixed-height rows so that scrolling can be
//! reported in the same pixel geometry a graphical viewport would use.

use std::sync::{Arc, Mutex, PoisonError};

use beatdrop_proto::protocol::Notice;
use beatdrop_songlist::actions::MenuChoice;
use beatdrop_songlist::runtime::{NoticeSink, Presenter};
use beatdrop_songlist::view::{ListView, ViewDensity};
use beatdrop_songlist::viewport::{NavKey, ScrollMetrics, Subscription, Viewport, ViewportEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

pub const ROW_HEIGHT_PX: u32 = 24;
pub const VISIBLE_ROWS: u32 = 10;

pub const HELP: &str = "\
commands:
  j / k          highlight next / previous row
  <enter>        run the highlighted row
  n / p          scroll a page down / up
  G              scroll to the bottom
  d <row>        download or delete
  a <row>        add to playlist
  s <row>        copy share link
  o <row>        view online
  c              toggle compact rows
  A              toggle auto load more
  r              reload
  q              quit";

/// Scroll state shared between the stdin reader and the runtime.
#[derive(Debug, Clone, Copy)]
struct Geometry {
    scroll_top: u32,
    /// Restored position still waiting for enough rows to scroll to.
    pending_top: Option<u32>,
    rows: u32,
    compact: bool,
    auto_load_more: bool,
}

impl Geometry {
    fn metrics(&self) -> ScrollMetrics {
        let content = (self.rows + 1) * ROW_HEIGHT_PX;
        let client = VISIBLE_ROWS * ROW_HEIGHT_PX;
        ScrollMetrics {
            scroll_top: self.scroll_top,
            scroll_height: content.max(client),
            client_height: client,
        }
    }

    fn max_scroll_top(&self) -> u32 {
        let m = self.metrics();
        m.scroll_height - m.client_height
    }

    fn restore(&mut self, top: u32) {
        self.scroll_top = top;
        self.pending_top = Some(top);
    }

    fn set_rows(&mut self, rows: u32) {
        self.rows = rows;
        let max = self.max_scroll_top();
        match self.pending_top {
            Some(top) if top > max => {}
            Some(_) => self.pending_top = None,
            None => self.scroll_top = self.scroll_top.min(max),
        }
    }

    fn scroll_by(&mut self, delta: i64) -> ScrollMetrics {
        self.pending_top = None;
        let target = (i64::from(self.scroll_top) + delta).clamp(0, i64::from(self.max_scroll_top()));
        self.scroll_top = target as u32;
        self.metrics()
    }
}

/// Turn one input line into a viewport event.  Returns `None` for unknown
/// input.
fn parse_line(line: &str, geometry: &mut Geometry) -> Option<ViewportEvent> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Some(ViewportEvent::Key(NavKey::Activate));
    };
    let row = parts.next().and_then(|s| s.parse::<usize>().ok());
    let page = i64::from(VISIBLE_ROWS * ROW_HEIGHT_PX);
    let event = match (cmd, row) {
        ("j", _) => ViewportEvent::Key(NavKey::Down),
        ("k", _) => ViewportEvent::Key(NavKey::Up),
        ("n", _) => ViewportEvent::Scrolled(geometry.scroll_by(page)),
        ("p", _) => ViewportEvent::Scrolled(geometry.scroll_by(-page)),
        ("G", _) => ViewportEvent::Scrolled(geometry.scroll_by(i64::from(u32::MAX))),
        ("d", Some(index)) => menu(index, MenuChoice::Primary),
        ("a", Some(index)) => menu(index, MenuChoice::AddToPlaylist),
        ("s", Some(index)) => menu(index, MenuChoice::Share),
        ("o", Some(index)) => menu(index, MenuChoice::ViewOnline),
        ("c", _) => {
            geometry.compact = !geometry.compact;
            ViewportEvent::SetDensity(if geometry.compact {
                ViewDensity::Compact
            } else {
                ViewDensity::Full
            })
        }
        ("A", _) => {
            geometry.auto_load_more = !geometry.auto_load_more;
            ViewportEvent::SetAutoLoadMore(geometry.auto_load_more)
        }
        ("r", _) => ViewportEvent::Reload,
        ("q", _) => ViewportEvent::Closed,
        _ => return None,
    };
    Some(event)
}

fn menu(index: usize, choice: MenuChoice) -> ViewportEvent {
    ViewportEvent::Menu { index, choice }
}

pub struct TerminalViewport {
    geometry: Arc<Mutex<Geometry>>,
}

impl TerminalViewport {
    pub fn new(compact: bool, auto_load_more: bool) -> Self {
        Self {
            geometry: Arc::new(Mutex::new(Geometry {
                scroll_top: 0,
                pending_top: None,
                rows: 0,
                compact,
                auto_load_more,
            })),
        }
    }

    fn with_geometry<T>(&self, f: impl FnOnce(&mut Geometry) -> T) -> T {
        f(&mut self.geometry.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Viewport for TerminalViewport {
    fn restore_scroll_top(&mut self, top: u32) {
        debug!("[terminal] restore scroll_top={}", top);
        self.with_geometry(|g| g.restore(top));
    }

    fn content_changed(&mut self, rows: usize) {
        self.with_geometry(|g| g.set_rows(rows as u32));
    }

    fn subscribe(&mut self, events: mpsc::UnboundedSender<ViewportEvent>) -> Subscription {
        let geometry = Arc::clone(&self.geometry);
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) | Err(_) => {
                        let _ = events.send(ViewportEvent::Closed);
                        break;
                    }
                };
                let parsed = {
                    let mut g = geometry.lock().unwrap_or_else(PoisonError::into_inner);
                    parse_line(line.trim(), &mut g)
                };
                match parsed {
                    // No further read after quitting: a pending stdin read
                    // would hold up runtime shutdown.
                    Some(event) => {
                        let quit = event == ViewportEvent::Closed;
                        if events.send(event).is_err() || quit {
                            break;
                        }
                    }
                    None => eprintln!("{}", HELP),
                }
            }
        });
        let abort = reader.abort_handle();
        Subscription::new(move || {
            info!("[terminal] releasing stdin reader");
            abort.abort();
        })
    }
}

/// Prints the visible window of the list after every change.
pub struct StdoutPresenter;

impl StdoutPresenter {
    fn row_line(view: &ListView, index: usize) -> String {
        let row = &view.rows[index];
        let marker = if row.highlighted { '>' } else { ' ' };
        let downloaded = if row.actions.is_downloaded { '*' } else { ' ' };
        let song = &row.song;
        if view.density == ViewDensity::Compact {
            return format!("{}{}{:>4} {}", marker, downloaded, index, song.title);
        }
        let difficulties: Vec<_> = song.difficulties.iter().map(|d| d.label()).collect();
        let rating = song
            .ratings
            .map(|r| format!("{:.0}%", r * 100.0))
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{}{}{:>4} {} - {} [{}] {} by {} {} | {}",
            marker,
            downloaded,
            index,
            song.title,
            song.artist,
            difficulties.join(", "),
            rating,
            song.uploader_name.as_deref().unwrap_or("unknown"),
            song.uploaded_label().unwrap_or_default(),
            row.actions.primary_label,
        )
    }
}

impl Presenter for StdoutPresenter {
    fn render(&mut self, view: &ListView) {
        if view.loading {
            println!("loading songs...");
            return;
        }
        let first = (view.scroll_top / ROW_HEIGHT_PX) as usize;
        let last = (first + VISIBLE_ROWS as usize).min(view.rows.len());
        println!("-- songs {}-{} of {} --", first, last, view.total_count);
        for index in first..last {
            println!("{}", Self::row_line(view, index));
        }
        if last == view.rows.len() {
            if view.loading_more {
                println!("   loading more...");
            } else if view.show_load_more {
                let marker = if view.highlighted == view.rows.len() as isize { '>' } else { ' ' };
                println!("{}  [load more]", marker);
            }
        }
        if let Some(title) = &view.playlist_target {
            println!("   playlist target: {}", title);
        }
    }
}

/// Notices go to stderr and the log.
pub struct StderrNotices;

impl NoticeSink for StderrNotices {
    fn notify(&mut self, notice: Notice) {
        info!("[notice] {}", notice.text);
        eprintln!("! {}", notice.text);
    }
}
