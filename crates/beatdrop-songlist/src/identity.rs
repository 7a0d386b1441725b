//! Identity resolution.
//!
//! Two policies that must stay distinct:
//!
//! - the **list key** may fall back to the title, because it only has to be
//!   unique enough for diffing rows;
//! - the **durable** identities (download-set lookups, dedup, deep links) are
//!   built from `hash` / `hashMd5` / `key` only.  Two songs can share a name,
//!   so a name is never a durable identity.

use crate::error::SongListError;
use crate::normalize::SongView;

/// Key for list rendering: `hash || hashMd5 || title`.
pub fn list_key(song: &SongView) -> Option<&str> {
    song.identity_hash
        .as_deref()
        .or_else(|| Some(song.title.as_str()).filter(|t| !t.is_empty()))
}

/// Hash used to cross-reference the downloaded set: `hash || hashMd5`.
pub fn durable_hash(song: &SongView) -> Result<&str, SongListError> {
    song.identity_hash.as_deref().ok_or_else(|| missing(song))
}

/// Identity for a shareable deep link: `hash || hashMd5 || key`.
pub fn share_identity(song: &SongView) -> Result<&str, SongListError> {
    song.identity_hash
        .as_deref()
        .or(song.song_key.as_deref())
        .ok_or_else(|| missing(song))
}

/// Identity used to reject duplicate rows while paging.  Songs without one
/// are never considered duplicates.
pub fn dedup_identity(song: &SongView) -> Option<&str> {
    song.identity_hash.as_deref().or(song.song_key.as_deref())
}

fn missing(song: &SongView) -> SongListError {
    SongListError::MissingIdentity {
        title: song.title.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(hash: Option<&str>, key: Option<&str>, title: &str) -> SongView {
        SongView {
            identity_hash: hash.map(str::to_string),
            song_key: key.map(str::to_string),
            title: title.to_string(),
            ..SongView::default()
        }
    }

    #[test]
    fn test_list_key_falls_back_to_title() {
        assert_eq!(list_key(&song(Some("h"), None, "t")), Some("h"));
        assert_eq!(list_key(&song(None, Some("k"), "t")), Some("t"));
        assert_eq!(list_key(&song(None, None, "")), None);
    }

    #[test]
    fn test_durable_identities_never_use_the_title() {
        let named = song(None, None, "Same Name");
        assert!(matches!(
            durable_hash(&named),
            Err(SongListError::MissingIdentity { .. })
        ));
        assert!(share_identity(&named).is_err());
        assert_eq!(dedup_identity(&named), None);
    }

    #[test]
    fn test_share_identity_prefers_hash_then_key() {
        assert_eq!(share_identity(&song(Some("h"), Some("k"), "t")).unwrap(), "h");
        assert_eq!(share_identity(&song(None, Some("k"), "t")).unwrap(), "k");
        // A key alone is not a downloaded-set identity.
        assert!(durable_hash(&song(None, Some("k"), "t")).is_err());
    }
}
