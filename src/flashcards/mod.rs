//! Flashcard deck for flashdeck
//!
//! This module provides:
//! - The SQLite card store and its build from the corpus
//! - Uniform random draws that skip already-seen cards
//! - Keyword-filtered draws through the search index

pub mod algorithm;
pub mod models;
pub mod storage;

pub use algorithm::{
    draw_random, draw_random_filtered, draw_random_filtered_with, draw_random_with, SelectionError,
};
pub use models::*;
pub use storage::{FlashcardStorage, FlashcardStorageError};

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;

    use tempfile::TempDir;

    use super::{BuildSummary, FlashcardStorage};
    use crate::config::DeckConfig;

    pub(crate) struct TestDeck {
        pub _temp: TempDir,
        pub config: DeckConfig,
        pub storage: FlashcardStorage,
        pub summary: BuildSummary,
    }

    /// Build a store from one markdown file holding `cards` in order,
    /// followed by one image card per name in `images`
    pub(crate) fn build_deck(cards: &[(&str, &str)], images: &[&str]) -> TestDeck {
        let temp = TempDir::new().unwrap();
        let md_root = temp.path().join("md");
        let png_root = temp.path().join("png");
        fs::create_dir_all(&md_root).unwrap();
        fs::create_dir_all(&png_root).unwrap();

        let document: String = cards
            .iter()
            .map(|(q, a)| format!("Question: {}\nAnswer: {}\n\n", q, a))
            .collect();
        fs::write(md_root.join("cards.md"), document).unwrap();

        for name in images {
            fs::write(png_root.join(name), b"").unwrap();
        }

        let config = DeckConfig {
            database_path: temp.path().join("flashcards.db"),
            markdown_root: md_root,
            image_root: png_root,
            image_patterns: vec!["*.png".to_string()],
            ..DeckConfig::default()
        };
        let storage = FlashcardStorage::new(config.database_path.clone());
        let summary = storage.build(&config).unwrap();

        TestDeck {
            _temp: temp,
            config,
            storage,
            summary,
        }
    }
}
