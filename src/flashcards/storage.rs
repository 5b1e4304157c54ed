//! Persistent card store
//!
//! One SQLite file per deck:
//! ```text
//! flashcards.db
//! ├── flashcards       # id, question_html, answer_html
//! └── flashcards_fts   # FTS5 mirror of the text cards, same ids
//! ```
//!
//! Every operation opens its own connection and drops it before returning.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use thiserror::Error;

use super::models::*;
use crate::config::DeckConfig;
use crate::corpus::{self, CorpusError};
use crate::search::{self, SearchError};

#[derive(Error, Debug)]
pub enum FlashcardStorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Search index error: {0}")]
    Search(#[from] SearchError),

    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Flashcard store has not been built: {0:?}")]
    NotBuilt(PathBuf),
}

pub type Result<T> = std::result::Result<T, FlashcardStorageError>;

/// Handle on the deck's SQLite file
#[derive(Debug, Clone)]
pub struct FlashcardStorage {
    db_path: PathBuf,
}

impl FlashcardStorage {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Whether a completed store is present
    pub fn exists(&self) -> bool {
        self.db_path.is_file()
    }

    /// Sibling file the build writes to before it is moved into place
    fn partial_path(&self) -> PathBuf {
        let mut name = self
            .db_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "flashcards.db".into());
        name.push(".partial");
        self.db_path.with_file_name(name)
    }

    /// Open a connection on a built store. Never creates the file.
    pub(crate) fn connect(&self) -> Result<Connection> {
        if !self.exists() {
            return Err(FlashcardStorageError::NotBuilt(self.db_path.clone()));
        }

        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    // ==================== Build ====================

    /// Build the store from the configured corpus roots.
    ///
    /// Text cards are inserted first, then indexed, then the image cards are
    /// appended. The store only appears at `db_path` once everything has been
    /// committed; a failed build removes its partial file. Building over an
    /// existing store replaces it. At least one corpus root must exist.
    pub fn build(&self, config: &DeckConfig) -> Result<BuildSummary> {
        log::info!("Building flashcard store at {:?}", self.db_path);

        corpus::require_content_roots(&config.markdown_root, &config.image_root)?;

        let text = corpus::load_text_corpus(&config.markdown_root, &config.markdown_pattern)?;
        let images = corpus::load_image_corpus(
            &config.image_root,
            &config.image_patterns,
            &config.image_url_prefix,
        )?;

        let mut summary =
            self.write_partial(|path| Self::build_into(path, &text.records, &images.records))?;

        summary.skipped_files = text.files_skipped + images.files_skipped;
        log::info!(
            "Flashcard store ready: {} text cards, {} image cards, {} indexed",
            summary.text_records,
            summary.image_records,
            summary.indexed_records
        );
        Ok(summary)
    }

    /// Run `write` against the partial file, then move it onto `db_path`.
    /// The partial file is removed when `write` fails.
    fn write_partial<F>(&self, write: F) -> Result<BuildSummary>
    where
        F: FnOnce(&Path) -> Result<BuildSummary>,
    {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let partial = self.partial_path();
        if partial.exists() {
            log::warn!("Removing leftover partial store {:?}", partial);
            fs::remove_file(&partial)?;
        }

        let summary = match write(&partial) {
            Ok(summary) => summary,
            Err(e) => {
                log::error!("Flashcard store build failed: {}", e);
                if let Err(cleanup) = fs::remove_file(&partial) {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        log::warn!("Failed to remove partial store {:?}: {}", partial, cleanup);
                    }
                }
                return Err(e);
            }
        };

        fs::rename(&partial, &self.db_path)?;
        Ok(summary)
    }

    /// Build the store only when it does not exist yet
    pub fn ensure_built(&self, config: &DeckConfig) -> Result<Option<BuildSummary>> {
        if self.exists() {
            log::debug!("Flashcard store already present at {:?}", self.db_path);
            return Ok(None);
        }
        self.build(config).map(Some)
    }

    fn build_into(path: &Path, text: &[NewRecord], images: &[NewRecord]) -> Result<BuildSummary> {
        let mut conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        let tx = conn.transaction()?;
        let text_records = Self::insert_records(&tx, text)?;
        let indexed_records = search::index::populate_index(&tx)?;
        let image_records = Self::insert_records(&tx, images)?;
        tx.commit()?;

        conn.close().map_err(|(_, e)| e)?;

        Ok(BuildSummary {
            text_records,
            image_records,
            indexed_records,
            skipped_files: 0,
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS flashcards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question_html TEXT NOT NULL,
                answer_html TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn insert_records(conn: &Connection, records: &[NewRecord]) -> Result<usize> {
        let mut stmt =
            conn.prepare("INSERT INTO flashcards (question_html, answer_html) VALUES (?1, ?2)")?;
        for record in records {
            stmt.execute(params![record.question_html, record.answer_html])?;
        }
        Ok(records.len())
    }

    /// Delete the store, for a rebuild from scratch
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.db_path) {
            Ok(()) => {
                log::info!("Removed flashcard store {:?}", self.db_path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // ==================== Queries ====================

    /// Total number of cards
    pub fn count_records(&self) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM flashcards", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    /// Number of cards in the search index
    pub fn count_indexed(&self) -> Result<usize> {
        let conn = self.connect()?;
        Ok(search::index::count_indexed(&conn)?)
    }

    pub fn get_record(&self, id: RecordId) -> Result<Option<Record>> {
        let conn = self.connect()?;
        let record = conn
            .query_row(
                "SELECT id, question_html, answer_html FROM flashcards WHERE id = ?1",
                params![id],
                Record::from_row,
            )
            .optional()?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::fixtures::build_deck;
    use tempfile::TempDir;

    #[test]
    fn test_count_is_text_blocks_plus_images() {
        let deck = build_deck(&[("1+1?", "2"), ("2+2?", "4"), ("3+3?", "6")], &["a.png", "b.png"]);

        assert_eq!(deck.summary.text_records, 3);
        assert_eq!(deck.summary.image_records, 2);
        assert_eq!(deck.summary.total_records(), 5);
        assert_eq!(deck.storage.count_records().unwrap(), 5);
    }

    #[test]
    fn test_images_follow_text_and_are_not_indexed() {
        let deck = build_deck(&[("Q1", "A1"), ("Q2", "A2")], &["diagram.png"]);

        assert_eq!(deck.storage.count_indexed().unwrap(), 2);

        let first = deck.storage.get_record(1).unwrap().unwrap();
        assert!(first.question_html.contains("Q1"));

        let image = deck.storage.get_record(3).unwrap().unwrap();
        assert_eq!(image.question_html, "<h3>Question :</h3>\n");
        assert!(image.answer_html.contains("diagram.png"));

        assert!(deck.storage.get_record(4).unwrap().is_none());
    }

    #[test]
    fn test_empty_corpus_builds_empty_store() {
        let deck = build_deck(&[], &[]);
        assert!(deck.storage.exists());
        assert_eq!(deck.storage.count_records().unwrap(), 0);
        assert_eq!(deck.storage.count_indexed().unwrap(), 0);
    }

    #[test]
    fn test_missing_store_is_not_built() {
        let temp = TempDir::new().unwrap();
        let storage = FlashcardStorage::new(temp.path().join("absent.db"));

        assert!(!storage.exists());
        assert!(matches!(storage.count_records(), Err(FlashcardStorageError::NotBuilt(_))));
        // Querying must not create the file
        assert!(!storage.exists());
    }

    #[test]
    fn test_failed_build_leaves_no_store() {
        let temp = TempDir::new().unwrap();
        let config = DeckConfig {
            database_path: temp.path().join("deck.db"),
            markdown_root: temp.path().to_path_buf(),
            markdown_pattern: "[".to_string(),
            image_root: temp.path().join("png"),
            ..DeckConfig::default()
        };
        let storage = FlashcardStorage::new(config.database_path.clone());

        assert!(matches!(storage.build(&config), Err(FlashcardStorageError::Corpus(_))));
        assert!(!storage.exists());
        assert!(!storage.partial_path().exists());
    }

    #[test]
    fn test_unwritable_location_is_fatal() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();

        fs::create_dir_all(temp.path().join("md")).unwrap();

        let config = DeckConfig {
            database_path: blocker.join("deck.db"),
            markdown_root: temp.path().join("md"),
            image_root: temp.path().join("png"),
            ..DeckConfig::default()
        };
        let storage = FlashcardStorage::new(config.database_path.clone());

        assert!(matches!(storage.build(&config), Err(FlashcardStorageError::Io(_))));
        assert!(!storage.exists());
    }

    #[test]
    fn test_missing_content_roots_are_fatal() {
        let temp = TempDir::new().unwrap();
        let config = DeckConfig {
            database_path: temp.path().join("deck.db"),
            markdown_root: temp.path().join("md"),
            image_root: temp.path().join("png"),
            ..DeckConfig::default()
        };
        let storage = FlashcardStorage::new(config.database_path.clone());

        assert!(matches!(
            storage.build(&config),
            Err(FlashcardStorageError::Corpus(CorpusError::NoContentRoots { .. }))
        ));
        assert!(!storage.exists());
        assert!(!storage.partial_path().exists());

        // Nothing was saved, so the next attempt builds once content appears
        assert!(storage.ensure_built(&config).is_err());
        fs::create_dir_all(&config.markdown_root).unwrap();
        fs::write(config.markdown_root.join("deck.md"), "Question: Q\nAnswer: A").unwrap();

        let summary = storage.ensure_built(&config).unwrap().unwrap();
        assert_eq!(summary.text_records, 1);
        assert!(storage.exists());
    }

    #[test]
    fn test_failure_while_writing_removes_partial() {
        let temp = TempDir::new().unwrap();
        let storage = FlashcardStorage::new(temp.path().join("deck.db"));
        let records = vec![NewRecord::new("<p>Q</p>".to_string(), "<p>A</p>".to_string())];

        // The partial file exists but is not a database, so the schema step fails
        let result = storage.write_partial(|path| {
            fs::write(path, vec![b'x'; 4096])?;
            FlashcardStorage::build_into(path, &records, &[])
        });

        assert!(matches!(result, Err(FlashcardStorageError::Sqlite(_))));
        assert!(!storage.exists());
        assert!(!storage.partial_path().exists());
    }

    #[test]
    fn test_leftover_partial_is_replaced() {
        let deck = build_deck(&[("Q", "A")], &[]);
        fs::write(deck.storage.partial_path(), b"stale").unwrap();

        let summary = deck.storage.build(&deck.config).unwrap();
        assert_eq!(summary.text_records, 1);
        assert!(!deck.storage.partial_path().exists());
        assert_eq!(deck.storage.count_records().unwrap(), 1);
    }

    #[test]
    fn test_ensure_built_and_rebuild() {
        let deck = build_deck(&[("Q", "A")], &[]);

        assert!(deck.storage.ensure_built(&deck.config).unwrap().is_none());

        // Rebuilding replaces the store instead of appending to it
        let summary = deck.storage.build(&deck.config).unwrap();
        assert_eq!(summary.total_records(), 1);
        assert_eq!(deck.storage.count_records().unwrap(), 1);
        assert_eq!(deck.storage.count_indexed().unwrap(), 1);

        deck.storage.remove().unwrap();
        assert!(!deck.storage.exists());
        deck.storage.remove().unwrap();

        assert!(deck.storage.ensure_built(&deck.config).unwrap().is_some());
        assert_eq!(deck.storage.count_records().unwrap(), 1);
    }

    #[test]
    fn test_partial_path_is_sibling() {
        let storage = FlashcardStorage::new(PathBuf::from("/data/deck.db"));
        assert_eq!(storage.partial_path(), PathBuf::from("/data/deck.db.partial"));
    }
}
