//! What the presentation layer receives: rows with their keys and menus,
//! plus the list flags.  Built fresh from the session on every render.

use serde::Serialize;

use crate::actions::ActionSet;
use crate::normalize::SongView;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ViewDensity {
    #[default]
    Full,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongRow {
    pub song: SongView,
    pub render_key: String,
    pub actions: ActionSet,
    pub highlighted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListView {
    pub rows: Vec<SongRow>,
    pub total_count: usize,
    /// Show a loading placeholder instead of rows.
    pub loading: bool,
    pub loading_more: bool,
    pub scroll_top: u32,
    /// `-1` for none, `rows.len()` for the load-more row.
    pub highlighted: isize,
    /// More songs exist than are loaded.
    pub show_load_more: bool,
    pub density: ViewDensity,
    /// Title of the song the playlist picker is open for.
    pub playlist_target: Option<String>,
}
