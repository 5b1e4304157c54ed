//! Data models for the flashcard deck

use serde::{Deserialize, Serialize};

/// Identifier assigned by the store, increasing in insertion order
pub type RecordId = i64;

/// A stored flashcard: rendered question and answer HTML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    pub question_html: String,
    pub answer_html: String,
}

impl Record {
    /// Map a `(id, question_html, answer_html)` row
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            question_html: row.get(1)?,
            answer_html: row.get(2)?,
        })
    }
}

/// A card produced by the extractor, not yet assigned an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub question_html: String,
    pub answer_html: String,
}

impl NewRecord {
    pub fn new(question_html: String, answer_html: String) -> Self {
        Self {
            question_html,
            answer_html,
        }
    }
}

/// Result of a keyword-filtered draw
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredDraw {
    pub record: Option<Record>,
    /// Matching records outside the exclusion set, counted before the draw
    pub eligible_count: usize,
}

/// What a store build inserted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    pub text_records: usize,
    pub image_records: usize,
    /// Records mirrored into the search index (text records only)
    pub indexed_records: usize,
    pub skipped_files: usize,
}

impl BuildSummary {
    pub fn total_records(&self) -> usize {
        self.text_records + self.image_records
    }
}
