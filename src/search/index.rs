//! FTS5 keyword index mirroring the card table.
//!
//! The index is a one-shot copy of `flashcards` made after the text cards
//! are inserted. It stores the rendered HTML as-is, markup included. The
//! unicode61 tokenizer splits on punctuation and folds case, so tag and
//! attribute names (`h3`, `p`, `span`, `style`) and the `Question :` /
//! `Answer :` heading words are searchable tokens alongside the card text.
//! A keyword made only of punctuation has no tokens and matches nothing.

use rusqlite::Connection;
use thiserror::Error;

/// Name of the FTS5 virtual table
pub const FTS_TABLE: &str = "flashcards_fts";

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Keyword search needs at least one keyword")]
    NoKeywords,
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Create the index table and copy every card into it.
///
/// Returns the number of indexed cards. Cards inserted afterwards are not
/// mirrored.
pub fn populate_index(conn: &Connection) -> Result<usize> {
    conn.execute_batch(&format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS {FTS_TABLE}
         USING fts5(id UNINDEXED, question_html, answer_html);

         INSERT INTO {FTS_TABLE} (id, question_html, answer_html)
         SELECT id, question_html, answer_html FROM flashcards;"
    ))?;

    let count = count_indexed(conn)?;
    log::info!("Populated search index with {} flashcards", count);
    Ok(count)
}

/// Number of cards in the index
pub fn count_indexed(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {FTS_TABLE}"), [], |row| {
        row.get(0)
    })?;
    Ok(count.max(0) as usize)
}

/// A conjunction of keywords, each matched as a literal phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordQuery {
    keywords: Vec<String>,
}

impl KeywordQuery {
    /// Build a query from user keywords. Blank entries are ignored; at least
    /// one keyword must remain.
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keywords.is_empty() {
            return Err(SearchError::NoKeywords);
        }

        Ok(Self { keywords })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// FTS5 MATCH expression: `"k1" AND "k2"`.
    ///
    /// Every keyword is a quoted string with embedded quotes doubled, so FTS5
    /// operators (`OR`, `NOT`, `NEAR`, `*`, `^`, `col:`) typed by the user are
    /// searched as text.
    pub fn to_match_expression(&self) -> String {
        self.keywords
            .iter()
            .map(|k| format!("\"{}\"", k.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}
