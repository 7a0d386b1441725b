//! Raw record → canonical [`SongView`].
//!
//! Every shape goes through the same field precedence:
//!
//! | field          | precedence                                                              |
//! |----------------|-------------------------------------------------------------------------|
//! | title          | `metadata.songName` → `songName` → `_songName`                          |
//! | artist         | `metadata.songAuthorName` → `authorName` → `_songAuthorName`            |
//! | difficulties   | `difficultyLevels` → `difficulties` → `_difficultyBeatmapSets` → `metadata.difficulties` |
//! | ratings        | `stats.rating` → `ratings`                                              |
//! | counts         | `stats.*` → `downloadCount` / `upVotes` / `downVotes` / `playedCount`   |
//! | image          | `coverURL` → `coverUrl`                                                 |
//!
//! Absent values stay absent; nothing here invents a placeholder.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

use crate::record::{RawSongRecord, RecordShape, Uploader};

/// Canonical, origin-agnostic song record used by the list and every resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SongView {
    pub title: String,
    pub artist: String,
    pub ratings: Option<f64>,
    pub uploader_name: Option<String>,
    pub difficulties: Vec<Difficulty>,
    pub image_source: Option<String>,
    pub song_key: Option<String>,
    /// `hash`, else `hashMd5`.
    pub identity_hash: Option<String>,
    pub local_file: Option<PathBuf>,
    pub downloads: Option<u64>,
    pub upvotes: Option<u64>,
    pub downvotes: Option<u64>,
    pub plays: Option<u64>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub catalog_id: Option<String>,
}

impl SongView {
    /// Upload time in the local timezone, for display.
    pub fn uploaded_label(&self) -> Option<String> {
        self.uploaded_at
            .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    Expert,
    ExpertPlus,
}

impl Difficulty {
    pub fn parse(name: &str) -> Option<Self> {
        let folded: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match folded.as_str() {
            "easy" => Some(Self::Easy),
            "normal" => Some(Self::Normal),
            "hard" => Some(Self::Hard),
            "expert" => Some(Self::Expert),
            "expertplus" | "expert+" => Some(Self::ExpertPlus),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Normal => "Normal",
            Self::Hard => "Hard",
            Self::Expert => "Expert",
            Self::ExpertPlus => "Expert+",
        }
    }
}

/// Normalize one raw record.  Pure; never fails.
///
/// The shape only decides which shape-specific fields exist; every field
/// then goes through the same chain, so a record carrying fields of more
/// than one shape resolves the same way whatever its shape.
pub fn normalize(record: &RawSongRecord) -> SongView {
    let refs = &record.refs;
    let (metadata, stats, local) = match &record.shape {
        RecordShape::Catalog(fields) => (Some(&fields.metadata), fields.stats.as_ref(), None),
        RecordShape::LocalFile(fields) => (None, None, Some(fields)),
        RecordShape::Legacy => (None, None, None),
    };

    let title = metadata
        .and_then(|m| m.song_name.clone())
        .or_else(|| refs.song_name.clone())
        .or_else(|| local.and_then(|l| l.song_name.clone()))
        .unwrap_or_default();
    let artist = metadata
        .and_then(|m| m.song_author_name.clone())
        .or_else(|| refs.author_name.clone())
        .or_else(|| local.and_then(|l| l.song_author_name.clone()))
        .unwrap_or_default();
    let difficulties = refs
        .difficulty_levels
        .as_ref()
        .or(refs.difficulties.as_ref())
        .or(local.and_then(|l| l.difficulty_beatmap_sets.as_ref()))
        .or(metadata.and_then(|m| m.difficulties.as_ref()))
        .map(parse_difficulties)
        .unwrap_or_default();

    let flat = &refs.stats;
    SongView {
        title,
        artist,
        difficulties,
        ratings: stats.and_then(|s| s.rating).or(flat.ratings),
        downloads: stats.and_then(|s| s.downloads).or(flat.download_count),
        upvotes: stats.and_then(|s| s.up_votes).or(flat.up_votes),
        downvotes: stats.and_then(|s| s.down_votes).or(flat.down_votes),
        plays: stats.and_then(|s| s.plays).or(flat.played_count),
        identity_hash: refs.hash.clone().or_else(|| refs.hash_md5.clone()),
        song_key: refs.key.clone(),
        catalog_id: refs.id.clone(),
        local_file: refs.file.as_ref().map(PathBuf::from),
        image_source: refs
            .cover_url_upper
            .clone()
            .or_else(|| refs.cover_url.clone()),
        uploader_name: uploader_name(refs.uploader.as_ref()),
        uploaded_at: refs.uploaded.as_deref().and_then(parse_uploaded),
    }
}

// A profile without a username degrades to no uploader.
fn uploader_name(uploader: Option<&Uploader>) -> Option<String> {
    match uploader? {
        Uploader::Name(name) => Some(name.clone()),
        Uploader::Profile { username } => username.clone(),
    }
}

/// Parse the catalog's ISO-ish `uploaded` field.  Naive timestamps are UTC.
pub fn parse_uploaded(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc());
    if parsed.is_none() {
        debug!("[normalize] unparseable upload time {:?}", raw);
    }
    parsed
}

/// Difficulty names from any of the shapes' encodings, in rank order.
pub fn parse_difficulties(value: &Value) -> Vec<Difficulty> {
    let mut found = Vec::new();
    collect_difficulties(value, &mut found);
    found.sort();
    found.dedup();
    found
}

fn collect_difficulties(value: &Value, out: &mut Vec<Difficulty>) {
    match value {
        Value::String(name) => push_named(name, out),
        Value::Array(items) => {
            for item in items {
                collect_difficulties(item, out);
            }
        }
        Value::Object(map) => {
            // Beatmap set: { _beatmapCharacteristicName, _difficultyBeatmaps: [...] }
            if let Some(maps) = map.get("_difficultyBeatmaps") {
                collect_difficulties(maps, out);
                return;
            }
            let named = ["_difficulty", "difficulty", "name"]
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str));
            if let Some(name) = named {
                push_named(name, out);
                return;
            }
            // Catalog flag map: { easy: true, expertPlus: false, ... }
            for (name, flag) in map {
                if flag.as_bool() == Some(true) {
                    push_named(name, out);
                }
            }
        }
        _ => {}
    }
}

fn push_named(name: &str, out: &mut Vec<Difficulty>) {
    match Difficulty::parse(name) {
        Some(d) => out.push(d),
        None => debug!("[normalize] ignoring unknown difficulty {:?}", name),
    }
}
