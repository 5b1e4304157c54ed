//! Flashcard deck built from markdown notes and images.
//!
//! The content pipeline extracts `Question :` / `Answer :` blocks from a
//! markdown corpus, renders them to HTML and stores them in SQLite together
//! with an FTS5 keyword index. Image files become image-only cards. Cards are
//! then drawn one at a time, uniformly at random, skipping the ids a caller
//! has already seen, optionally restricted to cards matching every keyword.

pub mod config;
pub mod corpus;
pub mod flashcards;
pub mod markdown;
pub mod search;
pub mod session;

pub use config::DeckConfig;
pub use flashcards::{
    draw_random, draw_random_filtered, FilteredDraw, FlashcardStorage, Record, RecordId,
};
pub use session::{ExclusionSet, SessionCard, StudySession};
