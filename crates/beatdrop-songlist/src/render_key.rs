//! Render keys: one string per row that changes whenever a fact the row
//! renders from changes, so the presentation layer can diff cheaply.

use crate::identity;
use crate::normalize::SongView;
use crate::view::ViewDensity;

pub const DOWNLOADED_TAG: &str = ".downloaded";
pub const RATINGS_TAG: &str = ".ratings-loaded";
pub const COMPACT_TAG: &str = ".compact";

/// One fact about a record; contributes `tag` to the key when `present`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTag<'a> {
    pub present: bool,
    pub tag: &'a str,
}

impl<'a> RenderTag<'a> {
    pub fn new(present: bool, tag: &'a str) -> Self {
        Self { present, tag }
    }
}

/// Concatenate the tags whose fact holds, in the order given.  Callers must
/// keep the order stable between calls.
pub fn make_render_key<'a>(tags: impl IntoIterator<Item = RenderTag<'a>>) -> String {
    tags.into_iter()
        .filter(|t| t.present)
        .map(|t| t.tag)
        .collect()
}

/// Row key for the song list: identity, then downloaded, ratings, density.
/// A song with no identity is keyed by its position `row` instead, so two
/// such rows never share a key.
pub fn song_render_key(song: &SongView, row: usize, is_downloaded: bool, density: ViewDensity) -> String {
    let id = match identity::list_key(song) {
        Some(key) => key.to_string(),
        None => format!("#{}", row),
    };
    make_render_key([
        RenderTag::new(true, &id),
        RenderTag::new(is_downloaded, DOWNLOADED_TAG),
        RenderTag::new(song.ratings.is_some(), RATINGS_TAG),
        RenderTag::new(density == ViewDensity::Compact, COMPACT_TAG),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashed(hash: &str) -> SongView {
        SongView {
            identity_hash: Some(hash.to_string()),
            ..SongView::default()
        }
    }

    #[test]
    fn test_make_render_key_keeps_order() {
        let key = make_render_key([
            RenderTag::new(true, "id"),
            RenderTag::new(false, ".a"),
            RenderTag::new(true, ".b"),
        ]);
        assert_eq!(key, "id.b");
    }

    #[test]
    fn test_key_is_deterministic() {
        let song = hashed("abc");
        assert_eq!(
            song_render_key(&song, 0, true, ViewDensity::Full),
            song_render_key(&song, 0, true, ViewDensity::Full)
        );
    }

    #[test]
    fn test_each_fact_changes_the_key() {
        let song = hashed("abc");
        let base = song_render_key(&song, 0, false, ViewDensity::Full);
        assert_eq!(base, "abc");

        assert_ne!(song_render_key(&song, 0, true, ViewDensity::Full), base);
        assert_ne!(song_render_key(&song, 0, false, ViewDensity::Compact), base);

        let rated = SongView {
            ratings: Some(0.8),
            ..song.clone()
        };
        assert_ne!(song_render_key(&rated, 0, false, ViewDensity::Full), base);

        assert_ne!(song_render_key(&hashed("abd"), 0, false, ViewDensity::Full), base);
    }

    #[test]
    fn test_all_facts_in_fixed_order() {
        let song = SongView {
            identity_hash: Some("abc".into()),
            ratings: Some(1.0),
            ..SongView::default()
        };
        assert_eq!(
            song_render_key(&song, 0, true, ViewDensity::Compact),
            "abc.downloaded.ratings-loaded.compact"
        );
    }

    #[test]
    fn test_unidentified_rows_get_distinct_keys() {
        let nameless = SongView::default();
        let first = song_render_key(&nameless, 3, false, ViewDensity::Full);
        let second = song_render_key(&nameless, 4, false, ViewDensity::Full);
        assert_eq!(first, "#3");
        assert_ne!(first, second);

        // Identified rows keep their key wherever they sit.
        let song = hashed("abc");
        assert_eq!(
            song_render_key(&song, 3, false, ViewDensity::Full),
            song_render_key(&song, 9, false, ViewDensity::Full)
        );
    }
}
