//! Local song library for the terminal front-end.
//!
//! Local songs are read from a JSON file of locally scanned records.
//! Downloads are tracked in memory only; a rescan re-reads the file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use beatdrop_proto::protocol::{Command, DeleteTarget};
use beatdrop_songlist::downloaded::DownloadedSet;
use beatdrop_songlist::normalize::normalize;
use beatdrop_songlist::runtime::LibraryCommands;
use beatdrop_songlist::{RawSongRecord, SongView};
use futures_util::future::BoxFuture;
use tracing::{info, warn};

use crate::catalog::parse_records;

#[derive(Debug, Default)]
struct LibraryState {
    local: Vec<SongView>,
    downloads: HashSet<String>,
}

impl LibraryState {
    fn downloaded(&self) -> DownloadedSet {
        let mut set = DownloadedSet::from_hashes(self.local.iter().filter_map(|s| s.identity_hash.clone()));
        for hash in &self.downloads {
            set.insert(hash.clone());
        }
        set
    }

    fn delete(&mut self, target: &DeleteTarget) -> usize {
        let before = self.local.len() + self.downloads.len();
        match target {
            DeleteTarget::File(path) => {
                self.local.retain(|s| s.local_file.as_deref() != Some(path.as_path()));
            }
            DeleteTarget::Hash(hash) => {
                self.local.retain(|s| s.identity_hash.as_deref() != Some(hash.as_str()));
                self.downloads.remove(hash);
            }
        }
        before - (self.local.len() + self.downloads.len())
    }
}

#[derive(Clone)]
pub struct LocalLibrary {
    source: Option<PathBuf>,
    state: Arc<Mutex<LibraryState>>,
}

impl LocalLibrary {
    pub async fn open(source: Option<PathBuf>) -> anyhow::Result<Self> {
        let local = match &source {
            Some(path) => read_local(path).await?,
            None => Vec::new(),
        };
        info!("[library] {} local songs", local.len());
        Ok(Self {
            source,
            state: Arc::new(Mutex::new(LibraryState {
                local,
                downloads: HashSet::new(),
            })),
        })
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut LibraryState) -> T) -> T {
        f(&mut self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

async fn read_local(path: &Path) -> anyhow::Result<Vec<SongView>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading local songs {}", path.display()))?;
    Ok(parse_records(&content)?
        .into_iter()
        .map(|value| normalize(&RawSongRecord::from_value(value)))
        .collect())
}

fn copy_to_clipboard(text: &str) -> anyhow::Result<()> {
    arboard::Clipboard::new()
        .and_then(|mut cb| cb.set_text(text.to_string()))
        .context("clipboard unavailable")
}

impl LibraryCommands for LocalLibrary {
    fn execute(&self, command: Command) -> BoxFuture<'static, anyhow::Result<()>> {
        let library = self.clone();
        Box::pin(async move {
            match command {
                Command::Download { hash } => {
                    info!("[library] download {}", hash);
                    library.with_state(|s| s.downloads.insert(hash));
                }
                Command::Delete { target } => {
                    let removed = library.with_state(|s| s.delete(&target));
                    if removed == 0 {
                        anyhow::bail!("nothing to delete for {:?}", target);
                    }
                    info!("[library] deleted {:?}", target);
                }
                Command::RescanDownloaded => {
                    if let Some(path) = &library.source {
                        let local = read_local(path).await?;
                        info!("[library] rescanned {} local songs", local.len());
                        library.with_state(|s| s.local = local);
                    }
                }
                Command::OpenPlaylistPicker { identity, title } => {
                    info!("[library] playlist picker for {:?} ({:?})", title, identity);
                    eprintln!("Add \"{}\" to a playlist: no playlists configured", title);
                }
                Command::CopyToClipboard { text } => {
                    tokio::task::spawn_blocking(move || copy_to_clipboard(&text)).await??;
                }
                Command::OpenExternal { url } => {
                    if let Err(e) = open::that(&url) {
                        warn!("[library] failed to open {}: {}", url, e);
                        anyhow::bail!("could not open {}: {}", url, e);
                    }
                }
            }
            Ok(())
        })
    }

    fn downloaded(&self) -> BoxFuture<'static, anyhow::Result<DownloadedSet>> {
        let set = self.with_state(|s| s.downloaded());
        Box::pin(async move { Ok(set) })
    }
}
