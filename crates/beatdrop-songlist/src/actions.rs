//! Per-song context actions.
//!
//! Nothing here touches the list.  Each action resolves to [`Command`]s and
//! [`Notice`]s that the controller hands out; their results come back later
//! as a new downloaded set.

use beatdrop_proto::config::{LinksConfig, NoticesConfig};
use beatdrop_proto::protocol::{Command, DeleteTarget, Notice};
use serde::Serialize;
use tracing::{info, warn};

use crate::downloaded::DownloadedSet;
use crate::identity;
use crate::normalize::SongView;

pub const SHARE_FAILED_TEXT: &str = "Failed to identify song. Song may have been downloaded \
     externally. Songs will now be scanned. Please try again when scanning is finished.";

/// Entries of a song's context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Primary,
    AddToPlaylist,
    Share,
    ViewOnline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PrimaryAction {
    Download { hash: String },
    Delete { target: DeleteTarget },
}

impl PrimaryAction {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Download { .. } => "Download",
            Self::Delete { .. } => "Delete",
        }
    }

    pub fn command(&self) -> Command {
        match self {
            Self::Download { hash } => Command::Download { hash: hash.clone() },
            Self::Delete { target } => Command::Delete {
                target: target.clone(),
            },
        }
    }
}

/// Everything a renderer needs to build one song's menu.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionSet {
    pub is_downloaded: bool,
    /// `None` when the song is not downloaded and has no hash to fetch it by.
    pub primary: Option<PrimaryAction>,
    pub primary_label: String,
    /// Deep link the share entry will copy, or `None` if sharing will fail.
    pub share_link: Option<String>,
    pub view_online: Option<String>,
}

/// A song is downloaded if it carries its own file, or if its hash is in the
/// downloaded set.  Remote records that already exist locally only match the
/// second way.
pub fn is_downloaded(song: &SongView, downloaded: &DownloadedSet) -> bool {
    song.local_file.is_some() || downloaded.contains_song(song)
}

pub fn primary_action(song: &SongView, downloaded: &DownloadedSet) -> Option<PrimaryAction> {
    if is_downloaded(song, downloaded) {
        let target = match (&song.local_file, &song.identity_hash) {
            (Some(file), _) => DeleteTarget::File(file.clone()),
            (None, Some(hash)) => DeleteTarget::Hash(hash.clone()),
            (None, None) => return None,
        };
        return Some(PrimaryAction::Delete { target });
    }
    song.identity_hash
        .as_ref()
        .map(|hash| PrimaryAction::Download { hash: hash.clone() })
}

pub fn share_link(song: &SongView, scheme: &str) -> Option<String> {
    identity::share_identity(song)
        .ok()
        .map(|id| format!("{}://songs/details/{}", scheme, id))
}

pub fn view_online_url(song: &SongView, base: &str) -> Option<String> {
    song.catalog_id
        .as_deref()
        .map(|id| format!("{}{}", base, id))
}

pub fn resolve_actions(
    song: &SongView,
    downloaded: &DownloadedSet,
    links: &LinksConfig,
) -> ActionSet {
    let primary = primary_action(song, downloaded);
    let verb = primary.as_ref().map(PrimaryAction::verb).unwrap_or("Download");
    ActionSet {
        is_downloaded: is_downloaded(song, downloaded),
        primary_label: format!("{} {}", verb, song.title),
        primary,
        share_link: share_link(song, &links.deep_link_scheme),
        view_online: view_online_url(song, &links.view_online_base),
    }
}

/// What sharing a song produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ShareOutcome {
    /// Copy the link and confirm.
    Copied { command: Command, notice: Notice },
    /// No identity: warn, and ask for a rescan unless one is already running.
    Unidentified {
        notice: Notice,
        rescan: Option<Command>,
    },
}

pub fn share(
    song: &SongView,
    links: &LinksConfig,
    notices: &NoticesConfig,
    rescan_pending: bool,
) -> ShareOutcome {
    match share_link(song, &links.deep_link_scheme) {
        Some(link) => {
            info!("[share] {} -> {}", song.title, link);
            ShareOutcome::Copied {
                command: Command::CopyToClipboard { text: link },
                notice: Notice::success(
                    format!("Sharable Link for {} copied to clipboard!", song.title),
                    notices.share_success_color.clone(),
                    notices.share_success_timeout_ms,
                ),
            }
        }
        None => {
            warn!("[share] no identity for {:?}; requesting rescan", song.title);
            ShareOutcome::Unidentified {
                notice: Notice::warning(SHARE_FAILED_TEXT),
                rescan: (!rescan_pending).then_some(Command::RescanDownloaded),
            }
        }
    }
}
