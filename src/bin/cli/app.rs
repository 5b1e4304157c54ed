use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use flashdeck_lib::config::DeckConfig;
use flashdeck_lib::flashcards::{BuildSummary, FlashcardStorage};

/// Shared application state for CLI commands
pub struct App {
    pub config: DeckConfig,
    pub storage: FlashcardStorage,
}

impl App {
    /// Resolve the configuration; `database` overrides the configured store
    pub fn new(config_path: Option<&Path>, database: Option<PathBuf>) -> Result<Self> {
        let mut config = DeckConfig::resolve(config_path)
            .context("Failed to load deck configuration")?;

        if let Some(database) = database {
            config.database_path = database;
        }

        let storage = FlashcardStorage::new(config.database_path.clone());
        Ok(Self { config, storage })
    }

    /// Build the store when it is missing
    pub fn ensure_store(&self) -> Result<()> {
        if let Some(summary) = self
            .storage
            .ensure_built(&self.config)
            .with_context(|| format!("Failed to build card store at {:?}", self.storage.db_path()))?
        {
            eprintln!(
                "Built card store: {} cards ({} text, {} image)",
                summary.total_records(),
                summary.text_records,
                summary.image_records
            );
        }
        Ok(())
    }

    /// Build the store, replacing an existing one when `rebuild` is set.
    ///
    /// Returns `None` when a store already exists and no rebuild was asked for.
    pub fn build(&self, rebuild: bool) -> Result<Option<BuildSummary>> {
        if rebuild {
            self.storage
                .remove()
                .context("Failed to remove the existing card store")?;
        }

        self.storage
            .ensure_built(&self.config)
            .with_context(|| format!("Failed to build card store at {:?}", self.storage.db_path()))
    }
}
