//! Raw song records as they arrive from the catalog, the local scan, or the
//! legacy stat cache.
//!
//! Every record is one of three shapes, picked by a discriminator test:
//! a `metadata` object means catalog, a `_songName` field means a locally
//! scanned beatmap, anything else is read as the legacy shape.  Fields that
//! any shape may carry (hashes, key, cover, uploader, the flat legacy names
//! and stats, ...) live in [`SongRefs`], so precedence chains can reach them
//! whatever the shape.
//!
//! Parsing never fails a page: a field with an unexpected type reads as
//! absent, and a value that is not an object becomes an empty record.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// One raw record of unknown origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSongRecord {
    pub refs: SongRefs,
    pub shape: RecordShape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordShape {
    Catalog(CatalogFields),
    LocalFile(LocalFileFields),
    /// Only the shared [`SongRefs`] fields.
    Legacy,
}

impl Default for RecordShape {
    fn default() -> Self {
        Self::Legacy
    }
}

impl RecordShape {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "catalog",
            Self::LocalFile(_) => "local-file",
            Self::Legacy => "legacy",
        }
    }
}

/// Identity and presentation fields that may appear on any shape.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SongRefs {
    #[serde(default, deserialize_with = "lenient::string")]
    pub hash: Option<String>,
    #[serde(default, rename = "hashMd5", deserialize_with = "lenient::string")]
    pub hash_md5: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub key: Option<String>,
    /// External catalog id, used for the "view online" link.
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: Option<String>,
    /// Local path of a downloaded beatmap.
    #[serde(default, deserialize_with = "lenient::string")]
    pub file: Option<String>,
    #[serde(default, rename = "coverURL", deserialize_with = "lenient::string")]
    pub cover_url_upper: Option<String>,
    #[serde(default, rename = "coverUrl", deserialize_with = "lenient::string")]
    pub cover_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub uploaded: Option<String>,
    #[serde(default, deserialize_with = "lenient::uploader")]
    pub uploader: Option<Uploader>,
    #[serde(default, deserialize_with = "lenient::json")]
    pub difficulties: Option<Value>,
    #[serde(default, rename = "songName", deserialize_with = "lenient::string")]
    pub song_name: Option<String>,
    #[serde(default, rename = "authorName", deserialize_with = "lenient::string")]
    pub author_name: Option<String>,
    #[serde(default, rename = "difficultyLevels", deserialize_with = "lenient::json")]
    pub difficulty_levels: Option<Value>,
    #[serde(flatten)]
    pub stats: LegacyStats,
}

/// `uploader` is either a bare username or a profile object.
#[derive(Debug, Clone, PartialEq)]
pub enum Uploader {
    Name(String),
    Profile { username: Option<String> },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CatalogFields {
    #[serde(default)]
    pub metadata: CatalogMetadata,
    #[serde(default, deserialize_with = "lenient::stats")]
    pub stats: Option<CatalogStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMetadata {
    #[serde(default, deserialize_with = "lenient::string")]
    pub song_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub song_author_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::json")]
    pub difficulties: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    #[serde(default, deserialize_with = "lenient::rating")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub downloads: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub up_votes: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub down_votes: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub plays: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LocalFileFields {
    #[serde(default, rename = "_songName", deserialize_with = "lenient::string")]
    pub song_name: Option<String>,
    #[serde(default, rename = "_songAuthorName", deserialize_with = "lenient::string")]
    pub song_author_name: Option<String>,
    #[serde(default, rename = "_difficultyBeatmapSets", deserialize_with = "lenient::json")]
    pub difficulty_beatmap_sets: Option<Value>,
}

/// Flat stat fields of the legacy shape; catalog records may carry them too.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyStats {
    #[serde(default, deserialize_with = "lenient::rating")]
    pub ratings: Option<f64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub download_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub up_votes: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub down_votes: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub played_count: Option<u64>,
}

impl RawSongRecord {
    /// Classify and parse one JSON value.
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            warn!("[record] expected an object, got {}; using an empty record", kind_of(&value));
            return Self::default();
        }

        let refs = parse_part::<SongRefs>(&value, "refs");
        let shape = if value.get("metadata").is_some() {
            RecordShape::Catalog(parse_part(&value, "catalog"))
        } else if value.get("_songName").is_some() {
            RecordShape::LocalFile(parse_part(&value, "local-file"))
        } else {
            RecordShape::Legacy
        };

        Self { refs, shape }
    }
}

impl<'de> Deserialize<'de> for RawSongRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self::from_value(Value::deserialize(deserializer)?))
    }
}

fn parse_part<T>(value: &Value, part: &str) -> T
where
    T: for<'de> Deserialize<'de> + Default,
{
    match T::deserialize(value) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("[record] malformed {} fields ({}); reading them as empty", part, e);
            T::default()
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Field deserializers that read unexpected types as absent instead of
/// failing the whole record.
mod lenient {
    use super::{CatalogStats, Uploader};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string<'de, D>(d: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(d)? {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn count<'de, D>(d: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(as_count(&Value::deserialize(d)?))
    }

    pub fn rating<'de, D>(d: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(as_rating(&Value::deserialize(d)?))
    }

    pub fn json<'de, D>(d: D) -> Result<Option<Value>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(d)? {
            Value::Null => None,
            other => Some(other),
        })
    }

    pub fn uploader<'de, D>(d: D) -> Result<Option<Uploader>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(d)? {
            Value::String(name) if !name.is_empty() => Some(Uploader::Name(name)),
            Value::Object(map) => Some(Uploader::Profile {
                username: map
                    .get("username")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            }),
            _ => None,
        })
    }

    pub fn stats<'de, D>(d: D) -> Result<Option<CatalogStats>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(d)?;
        if !value.is_object() {
            return Ok(None);
        }
        Ok(CatalogStats::deserialize(&value).ok())
    }

    fn as_count(value: &Value) -> Option<u64> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_rating(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            // Cached rating objects carry the score under one of these names.
            Value::Object(map) => map
                .get("rating")
                .or_else(|| map.get("score"))
                .and_then(Value::as_f64),
            _ => None,
        }
    }
}
