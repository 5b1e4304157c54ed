//! Non-repeating random selection
//!
//! A draw counts the eligible cards (not excluded, and matching every keyword
//! in search mode), picks a uniform offset into them and reads the card at that
//! offset in id order. Both steps run in one transaction so they see the same
//! snapshot. The engine is stateless: exclusion sets belong to the caller.

use rand::Rng;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use thiserror::Error;

use super::models::{FilteredDraw, Record, RecordId};
use super::storage::{FlashcardStorage, FlashcardStorageError};
use crate::search::{KeywordQuery, SearchError, FTS_TABLE};

/// Largest exclusion set bound inline as `?` parameters. SQLite allows 32766
/// host parameters; larger sets go through a temporary table.
pub const MAX_INLINE_EXCLUSIONS: usize = 30_000;

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("Storage error: {0}")]
    Storage(#[from] FlashcardStorageError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),
}

pub type Result<T> = std::result::Result<T, SelectionError>;

/// WHERE conditions and their bound values for the eligible set
#[derive(Debug, Default)]
struct EligibleQuery {
    conditions: Vec<String>,
    params: Vec<Value>,
}

impl EligibleQuery {
    fn new() -> Self {
        Self::default()
    }

    /// Keep only cards whose indexed content matches the query
    fn matching(mut self, query: &KeywordQuery) -> Self {
        self.conditions.push(format!(
            "id IN (SELECT id FROM {FTS_TABLE} WHERE {FTS_TABLE} MATCH ?)"
        ));
        self.params.push(Value::Text(query.to_match_expression()));
        self
    }

    /// Drop the excluded ids
    fn excluding(mut self, conn: &Connection, exclude: &[RecordId]) -> rusqlite::Result<Self> {
        if exclude.is_empty() {
            return Ok(self);
        }

        if exclude.len() <= MAX_INLINE_EXCLUSIONS {
            let placeholders = vec!["?"; exclude.len()].join(", ");
            self.conditions.push(format!("id NOT IN ({})", placeholders));
            self.params.extend(exclude.iter().map(|&id| Value::Integer(id)));
        } else {
            stage_exclusions(conn, exclude)?;
            self.conditions
                .push("id NOT IN (SELECT id FROM temp.excluded_ids)".to_string());
        }

        Ok(self)
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    fn count(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM flashcards{}", self.where_clause());
        let count: i64 = conn.query_row(&sql, params_from_iter(self.params.iter()), |row| {
            row.get(0)
        })?;
        Ok(count.max(0) as usize)
    }

    /// The eligible card at `offset` in id order
    fn nth(&self, conn: &Connection, offset: usize) -> rusqlite::Result<Option<Record>> {
        let sql = format!(
            "SELECT id, question_html, answer_html FROM flashcards{} ORDER BY id LIMIT 1 OFFSET ?",
            self.where_clause()
        );

        let offset = Value::Integer(offset as i64);
        conn.query_row(
            &sql,
            params_from_iter(self.params.iter().chain(Some(&offset))),
            Record::from_row,
        )
        .optional()
    }

    /// Count, then draw uniformly from the eligible cards
    fn draw<R: Rng + ?Sized>(
        &self,
        conn: &Connection,
        rng: &mut R,
    ) -> rusqlite::Result<(Option<Record>, usize)> {
        let eligible = self.count(conn)?;
        if eligible == 0 {
            return Ok((None, 0));
        }

        let offset = rng.gen_range(0..eligible);
        Ok((self.nth(conn, offset)?, eligible))
    }
}

/// Load an exclusion set into the connection's `temp.excluded_ids` table
fn stage_exclusions(conn: &Connection, exclude: &[RecordId]) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TEMP TABLE IF NOT EXISTS excluded_ids (id INTEGER PRIMARY KEY);
         DELETE FROM temp.excluded_ids;",
    )?;

    let mut stmt = conn.prepare("INSERT OR IGNORE INTO temp.excluded_ids (id) VALUES (?1)")?;
    for id in exclude {
        stmt.execute([id])?;
    }

    log::debug!("Staged {} excluded ids in a temporary table", exclude.len());
    Ok(())
}

/// Draw one card uniformly at random among those not in `exclude`.
///
/// Returns `None` when every card is excluded or the store is empty.
pub fn draw_random(storage: &FlashcardStorage, exclude: &[RecordId]) -> Result<Option<Record>> {
    draw_random_with(storage, exclude, &mut rand::thread_rng())
}

/// [`draw_random`] with a caller-supplied random source
pub fn draw_random_with<R: Rng + ?Sized>(
    storage: &FlashcardStorage,
    exclude: &[RecordId],
    rng: &mut R,
) -> Result<Option<Record>> {
    let mut conn = storage.connect()?;
    let tx = conn.transaction()?;

    let query = EligibleQuery::new().excluding(&tx, exclude)?;
    let (record, eligible) = query.draw(&tx, rng)?;
    tx.commit()?;

    log::debug!(
        "Drew {:?} from {} eligible cards ({} excluded)",
        record.as_ref().map(|r| r.id),
        eligible,
        exclude.len()
    );
    Ok(record)
}

/// Draw one card among those matching every keyword and not in `exclude`.
///
/// `eligible_count` is the size of that set before the draw. At least one
/// non-blank keyword is required.
pub fn draw_random_filtered<S: AsRef<str>>(
    storage: &FlashcardStorage,
    exclude: &[RecordId],
    keywords: &[S],
) -> Result<FilteredDraw> {
    draw_random_filtered_with(storage, exclude, keywords, &mut rand::thread_rng())
}

/// [`draw_random_filtered`] with a caller-supplied random source
pub fn draw_random_filtered_with<S: AsRef<str>, R: Rng + ?Sized>(
    storage: &FlashcardStorage,
    exclude: &[RecordId],
    keywords: &[S],
    rng: &mut R,
) -> Result<FilteredDraw> {
    let keyword_query = KeywordQuery::new(keywords)?;

    let mut conn = storage.connect()?;
    let tx = conn.transaction()?;

    let query = EligibleQuery::new()
        .matching(&keyword_query)
        .excluding(&tx, exclude)?;
    let (record, eligible_count) = query.draw(&tx, rng)?;
    tx.commit()?;

    log::debug!(
        "Search {:?} drew {:?} from {} eligible cards",
        keyword_query.keywords(),
        record.as_ref().map(|r| r.id),
        eligible_count
    );
    Ok(FilteredDraw {
        record,
        eligible_count,
    })
}
