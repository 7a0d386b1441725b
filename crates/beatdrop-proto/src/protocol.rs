use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Commands the song list hands to its collaborators.  The list never
/// performs these itself; their completion is observed later as a fresh
/// downloaded set or a command result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum Command {
    Download { hash: String },
    Delete { target: DeleteTarget },
    /// Rescan locally downloaded songs to recover missing identities.
    RescanDownloaded,
    /// Open the playlist picker scoped to one song.
    OpenPlaylistPicker { identity: Option<String>, title: String },
    CopyToClipboard { text: String },
    OpenExternal { url: String },
}

impl Command {
    /// Short name for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Download { .. } => "download",
            Self::Delete { .. } => "delete",
            Self::RescanDownloaded => "rescan",
            Self::OpenPlaylistPicker { .. } => "playlist-picker",
            Self::CopyToClipboard { .. } => "clipboard",
            Self::OpenExternal { .. } => "open-external",
        }
    }
}

/// What a delete removes: the song's own file when it has one, otherwise
/// whatever the local library holds under its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum DeleteTarget {
    File(PathBuf),
    Hash(String),
}

/// A user-visible message for the notification sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Notice {
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            timeout_ms: None,
        }
    }

    pub fn success(text: impl Into<String>, color: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            text: text.into(),
            color: Some(color.into()),
            timeout_ms: Some(timeout_ms),
        }
    }
}
