use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub list: ListConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub notices: NoticesConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Song list behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    /// Fetch the next page automatically when the list is scrolled to the bottom.
    #[serde(default = "default_auto_load_more")]
    pub auto_load_more: bool,
    /// Number of records requested per catalog page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Distance from the bottom (in pixels) that still counts as "at the bottom".
    #[serde(default = "default_scroll_threshold_px")]
    pub scroll_threshold_px: u32,
    /// Start in the compact list density.
    #[serde(default)]
    pub compact: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    /// Scheme used for shareable deep links: `<scheme>://songs/details/<id>`.
    #[serde(default = "default_deep_link_scheme")]
    pub deep_link_scheme: String,
    /// Prefix joined with the catalog id for "view online".
    #[serde(default = "default_view_online_base")]
    pub view_online_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticesConfig {
    #[serde(default = "default_share_success_timeout_ms")]
    pub share_success_timeout_ms: u64,
    #[serde(default = "default_share_success_color")]
    pub share_success_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where the list session (scroll position) is remembered between runs.
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            auto_load_more: default_auto_load_more(),
            page_size: default_page_size(),
            scroll_threshold_px: default_scroll_threshold_px(),
            compact: false,
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            deep_link_scheme: default_deep_link_scheme(),
            view_online_base: default_view_online_base(),
        }
    }
}

impl Default for NoticesConfig {
    fn default() -> Self {
        Self {
            share_success_timeout_ms: default_share_success_timeout_ms(),
            share_success_color: default_share_success_color(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            session_file: default_session_file(),
        }
    }
}

fn default_auto_load_more() -> bool {
    true
}

fn default_page_size() -> usize {
    20
}

fn default_scroll_threshold_px() -> u32 {
    1
}

fn default_deep_link_scheme() -> String {
    "beatdrop".to_string()
}

fn default_view_online_base() -> String {
    "https://www.bsaber.com/songs/".to_string()
}

fn default_share_success_timeout_ms() -> u64 {
    5000
}

fn default_share_success_color() -> String {
    "lightgreen".to_string()
}

fn default_session_file() -> PathBuf {
    platform::data_dir().join("session.json")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`, writing the defaults there first if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("[config] wrote {}", path.display());
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            list: ListConfig::default(),
            links: LinksConfig::default(),
            notices: NoticesConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}
