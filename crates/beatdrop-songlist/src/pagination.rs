//! Incremental paging over the catalog.
//!
//! State machine over `{loading, loading_more}`:
//!
//! ```text
//!  mount/reload ──► loading ──(page 0 resolves)──► idle
//!  idle ──(scroll at bottom | load-more row)──► loading_more ──(resolves)──► idle
//! ```
//!
//! `loading_more` is the only guard against concurrent fetches: while it is
//! set, scroll triggers are dropped, not queued.  The next qualifying scroll
//! after the page resolves asks again.

use tracing::{debug, info, warn};

use crate::error::SongListError;
use crate::identity;
use crate::normalize::normalize;
use crate::record::RawSongRecord;
use crate::session::ListSession;
use crate::viewport::ScrollMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// First page of a generation; replaces the rows.
    Initial,
    /// Appended after the loaded rows.
    More,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    pub offset: usize,
    pub limit: usize,
    pub kind: PageKind,
}

/// One page as returned by the catalog collaborator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPage {
    pub records: Vec<RawSongRecord>,
    /// Total songs available for this query.
    pub total: usize,
}

#[derive(Debug)]
pub enum PageOutcome {
    /// The session moved on (reload or unmount) before the page arrived.
    Discarded,
    Loaded { appended: usize, duplicates: usize },
    Failed(SongListError),
}

#[derive(Debug, Clone, Copy)]
pub struct PaginationController {
    page_size: usize,
    threshold_px: u32,
}

impl PaginationController {
    pub fn new(page_size: usize, threshold_px: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            threshold_px,
        }
    }

    /// Start a fresh generation and request its first page.
    pub fn start(&self, session: &mut ListSession) -> PageRequest {
        session.clear_rows();
        session.loading = true;
        session.loading_more = false;
        PageRequest {
            generation: session.generation,
            offset: 0,
            limit: self.page_size,
            kind: PageKind::Initial,
        }
    }

    /// Record the scroll position and request the next page when the list
    /// sits at the bottom and nothing is in flight.
    pub fn on_scroll(&self, session: &mut ListSession, metrics: ScrollMetrics) -> Option<PageRequest> {
        session.scroll_top = metrics.scroll_top;
        if metrics.distance_from_bottom() > i64::from(self.threshold_px) {
            return None;
        }
        if !session.auto_load_more {
            return None;
        }
        self.next_page(session)
    }

    /// Explicit "load more", independent of the auto-load setting.
    pub fn request_more(&self, session: &mut ListSession) -> Option<PageRequest> {
        self.next_page(session)
    }

    fn next_page(&self, session: &mut ListSession) -> Option<PageRequest> {
        if session.closed || session.loading || session.loading_more || !session.has_more() {
            return None;
        }
        session.loading_more = true;
        let request = PageRequest {
            generation: session.generation,
            offset: session.fetched,
            limit: self.page_size,
            kind: PageKind::More,
        };
        debug!("[page] requesting offset={} limit={}", request.offset, request.limit);
        Some(request)
    }

    /// Apply a page result.  Late results for an older generation or a
    /// closed session are dropped without touching the session.
    pub fn complete(
        &self,
        session: &mut ListSession,
        request: PageRequest,
        result: anyhow::Result<CatalogPage>,
    ) -> PageOutcome {
        if session.closed || request.generation != session.generation {
            debug!(
                "[page] discarding result for generation {} (now {}, closed={})",
                request.generation, session.generation, session.closed
            );
            return PageOutcome::Discarded;
        }

        match request.kind {
            PageKind::Initial => session.loading = false,
            PageKind::More => session.loading_more = false,
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!("[page] fetch at offset {} failed: {:#}", request.offset, e);
                return PageOutcome::Failed(SongListError::Fetch {
                    offset: request.offset,
                    reason: format!("{:#}", e),
                });
            }
        };

        let mut appended = 0;
        let mut duplicates = 0;
        session.fetched += page.records.len();
        for record in &page.records {
            let song = normalize(record);
            if let Some(id) = identity::dedup_identity(&song) {
                if !session.seen.insert(id.to_string()) {
                    debug!("[page] dropping duplicate {}", id);
                    duplicates += 1;
                    continue;
                }
            }
            session.songs.push(song);
            appended += 1;
        }
        // A short catalog that returns nothing more ends paging where it stopped.
        let total = if page.records.is_empty() {
            session.fetched
        } else {
            page.total
        };
        session.total_count = total.max(session.songs.len());
        session.highlight.clamp(session.songs.len());

        info!(
            "[page] offset={} appended={} duplicates={} loaded={} fetched={}/{}",
            request.offset,
            appended,
            duplicates,
            session.songs.len(),
            session.fetched,
            session.total_count
        );
        PageOutcome::Loaded {
            appended,
            duplicates,
        }
    }
}
