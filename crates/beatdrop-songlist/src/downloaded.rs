//! The set of locally present songs, as last reported by the local library.

use std::collections::HashSet;

use crate::normalize::SongView;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadedSet {
    hashes: HashSet<String>,
}

impl DownloadedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_hashes<I, S>(hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hashes: hashes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    /// Whether `song`'s identity hash is in the set.  The song's own `file`
    /// is a separate signal; see [`crate::actions::is_downloaded`].
    pub fn contains_song(&self, song: &SongView) -> bool {
        song.identity_hash
            .as_deref()
            .map(|h| self.contains(h))
            .unwrap_or(false)
    }

    pub fn insert(&mut self, hash: impl Into<String>) -> bool {
        self.hashes.insert(hash.into())
    }

    pub fn remove(&mut self, hash: &str) -> bool {
        self.hashes.remove(hash)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
