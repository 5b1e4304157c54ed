use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Deck configuration: where the store lives and where the corpus is read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// SQLite file holding the card table and the search index
    pub database_path: PathBuf,
    /// Root of the markdown question/answer documents
    pub markdown_root: PathBuf,
    /// File name glob for markdown documents
    pub markdown_pattern: String,
    /// Root of the image-only cards
    pub image_root: PathBuf,
    /// File name globs for image cards
    pub image_patterns: Vec<String>,
    /// URL prefix the image paths are served under (e.g. "/static/png")
    pub image_url_prefix: String,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./flashcards.db"),
            markdown_root: PathBuf::from("./static/md"),
            markdown_pattern: "*.md".to_string(),
            image_root: PathBuf::from("./static/png"),
            image_patterns: vec!["*.png".to_string(), "*.webp".to_string()],
            image_url_prefix: "/static/png".to_string(),
        }
    }
}

impl DeckConfig {
    /// Parse a configuration from TOML; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Per-user configuration file (e.g. ~/.config/flashdeck/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("flashdeck").join("config.toml"))
    }

    /// Resolve the active configuration.
    ///
    /// An explicit path must exist. Without one, the per-user file is used when
    /// present, and the built-in defaults otherwise.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            log::info!("Loading deck configuration from {:?}", path);
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::info!("Loading deck configuration from {:?}", path);
                Self::load(&path)
            }
            _ => {
                log::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}
