//! Per-user study session
//!
//! The selection engine is stateless; this is the caller side that remembers
//! which cards were shown. A session keeps one seen set for browsing and,
//! while a search is active, a separate one for the search results. Each set
//! is cleared once it covers its population so the next draw starts a new
//! pass.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::{
    draw_random_filtered_with, draw_random_with, FlashcardStorage, FlashcardStorageError, Record,
    RecordId, SelectionError,
};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("Storage error: {0}")]
    Storage(#[from] FlashcardStorageError),

    #[error("No search is active")]
    NoActiveSearch,
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Ids already shown, in the order they were shown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<RecordId>", into = "Vec<RecordId>")]
pub struct ExclusionSet {
    ids: Vec<RecordId>,
    members: HashSet<RecordId>,
}

impl From<Vec<RecordId>> for ExclusionSet {
    fn from(ids: Vec<RecordId>) -> Self {
        let mut set = Self::default();
        for id in ids {
            set.insert(id);
        }
        set
    }
}

impl From<ExclusionSet> for Vec<RecordId> {
    fn from(set: ExclusionSet) -> Self {
        set.ids
    }
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an id; returns false if it was already present
    pub fn insert(&mut self, id: RecordId) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.members.clear();
    }

    /// Whether the set is at least as large as a population of `population`
    pub fn covers(&self, population: usize) -> bool {
        self.len() >= population
    }

    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }
}

/// A card handed out by the session, with "n of m" progress
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCard {
    pub record: Option<Record>,
    /// Size of the pool being studied
    pub population: usize,
    /// Cards shown so far in the current pass, this one included
    pub seen: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSession {
    keywords: Vec<String>,
    seen: ExclusionSet,
    /// Matching cards, learned from the first draw of the pass
    population: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    seen: ExclusionSet,
    search: Option<SearchSession>,
}

/// Split keyword entries on whitespace and drop blanks
fn normalize_keywords<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keywords
        .into_iter()
        .flat_map(|k| {
            k.as_ref()
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

impl StudySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> &ExclusionSet {
        &self.seen
    }

    /// Keywords of the active search
    pub fn search_keywords(&self) -> Option<&[String]> {
        self.search.as_ref().map(|s| s.keywords.as_slice())
    }

    pub fn search_seen(&self) -> Option<&ExclusionSet> {
        self.search.as_ref().map(|s| &s.seen)
    }

    /// Next unseen card from the whole deck
    pub fn next_card(&mut self, storage: &FlashcardStorage) -> Result<SessionCard> {
        self.next_card_with(storage, &mut rand::thread_rng())
    }

    pub fn next_card_with<R: Rng + ?Sized>(
        &mut self,
        storage: &FlashcardStorage,
        rng: &mut R,
    ) -> Result<SessionCard> {
        let total = storage.count_records()?;

        if !self.seen.is_empty() && self.seen.covers(total) {
            log::info!("All {} cards seen, starting a new pass", total);
            self.seen.clear();
        }

        let record = draw_random_with(storage, self.seen.ids(), rng)?;
        if let Some(record) = &record {
            self.seen.insert(record.id);
        }

        Ok(SessionCard {
            record,
            population: total,
            seen: self.seen.len(),
        })
    }

    /// Start searching for `keywords`.
    ///
    /// Returns true when this begins a new search. Repeating the active
    /// keywords keeps its seen set.
    pub fn start_search<I, S>(&mut self, keywords: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = normalize_keywords(keywords);

        if let Some(search) = &self.search {
            if search.keywords == keywords {
                return false;
            }
        }

        log::debug!("Starting search for {:?}", keywords);
        self.search = Some(SearchSession {
            keywords,
            ..SearchSession::default()
        });
        true
    }

    /// Next unseen card matching the active search
    pub fn next_search_card(&mut self, storage: &FlashcardStorage) -> Result<SessionCard> {
        self.next_search_card_with(storage, &mut rand::thread_rng())
    }

    pub fn next_search_card_with<R: Rng + ?Sized>(
        &mut self,
        storage: &FlashcardStorage,
        rng: &mut R,
    ) -> Result<SessionCard> {
        let search = self.search.as_mut().ok_or(SessionError::NoActiveSearch)?;

        if let Some(population) = search.population {
            if !search.seen.is_empty() && search.seen.covers(population) {
                log::info!(
                    "All {} cards matching {:?} seen, starting a new pass",
                    population,
                    search.keywords
                );
                search.seen.clear();
            }
        }

        let draw = draw_random_filtered_with(storage, search.seen.ids(), &search.keywords, rng)?;
        let population = draw.eligible_count + search.seen.len();
        search.population = Some(population);

        if let Some(record) = &draw.record {
            search.seen.insert(record.id);
        }

        Ok(SessionCard {
            record: draw.record,
            population,
            seen: search.seen.len(),
        })
    }

    /// Leave search mode; the browse set is kept
    pub fn end_search(&mut self) {
        self.search = None;
    }

    /// Forget everything shown so far
    pub fn reset(&mut self) {
        log::debug!("Resetting study session");
        self.seen.clear();
        self.search = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::fixtures::build_deck;
    use crate::search::SearchError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_exclusion_set_inserts_once() {
        let mut set = ExclusionSet::new();
        assert!(set.insert(3));
        assert!(set.insert(1));
        assert!(!set.insert(3));
        assert_eq!(set.ids(), &[3, 1]);
        assert!(set.contains(1));
        assert!(!set.contains(2));
        assert!(set.covers(2));
        assert!(!set.covers(3));

        set.clear();
        assert!(set.is_empty());
        assert!(!set.contains(3));
    }

    #[test]
    fn test_exclusion_set_serializes_as_list() {
        let set = ExclusionSet::from(vec![5, 2, 5]);
        assert_eq!(serde_json::to_string(&set).unwrap(), "[5,2]");

        let parsed: ExclusionSet = serde_json::from_str("[7,8]").unwrap();
        assert!(parsed.contains(8));
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_browse_resets_after_full_pass() {
        let deck = build_deck(&[("Q1", "A1"), ("Q2", "A2"), ("Q3", "A3")], &[]);
        let mut session = StudySession::new();
        let mut rng = StdRng::seed_from_u64(1);

        let mut first_pass = HashSet::new();
        for expected_seen in 1..=3 {
            let card = session.next_card_with(&deck.storage, &mut rng).unwrap();
            assert_eq!(card.population, 3);
            assert_eq!(card.seen, expected_seen);
            assert!(first_pass.insert(card.record.unwrap().id));
        }

        // Fourth draw starts the second pass
        let card = session.next_card_with(&deck.storage, &mut rng).unwrap();
        assert!(card.record.is_some());
        assert_eq!(card.seen, 1);
        assert_eq!(session.seen().len(), 1);
    }

    #[test]
    fn test_empty_deck_session() {
        let deck = build_deck(&[], &[]);
        let mut session = StudySession::new();

        let card = session.next_card(&deck.storage).unwrap();
        assert!(card.record.is_none());
        assert_eq!(card.population, 0);
        assert_eq!(card.seen, 0);
    }

    #[test]
    fn test_search_pass_and_reset() {
        let deck = build_deck(
            &[("cell one", "x"), ("other", "y"), ("cell two", "z")],
            &["image.png"],
        );
        let mut session = StudySession::new();
        let mut rng = StdRng::seed_from_u64(9);

        assert!(session.start_search(["cell"]));

        let first = session.next_search_card_with(&deck.storage, &mut rng).unwrap();
        assert_eq!(first.population, 2);
        assert_eq!(first.seen, 1);

        let second = session.next_search_card_with(&deck.storage, &mut rng).unwrap();
        assert_eq!(second.population, 2);
        assert_eq!(second.seen, 2);
        assert_ne!(first.record.unwrap().id, second.record.unwrap().id);

        // Covered: the search set starts over, browse set untouched
        let third = session.next_search_card_with(&deck.storage, &mut rng).unwrap();
        assert!(third.record.is_some());
        assert_eq!(third.seen, 1);
        assert!(session.seen().is_empty());
    }

    #[test]
    fn test_same_keywords_keep_search_set() {
        let deck = build_deck(&[("cell one", "x"), ("cell two", "z")], &[]);
        let mut session = StudySession::new();

        assert!(session.start_search(["cell"]));
        session.next_search_card(&deck.storage).unwrap();

        assert!(!session.start_search(["  cell "]));
        assert_eq!(session.search_seen().unwrap().len(), 1);

        assert!(session.start_search(["cell two"]));
        assert_eq!(session.search_keywords().unwrap(), ["cell", "two"]);
        assert!(session.search_seen().unwrap().is_empty());
    }

    #[test]
    fn test_search_requires_active_search_and_keywords() {
        let deck = build_deck(&[("Q", "A")], &[]);
        let mut session = StudySession::new();

        assert!(matches!(
            session.next_search_card(&deck.storage),
            Err(SessionError::NoActiveSearch)
        ));

        session.start_search(["   "]);
        assert!(matches!(
            session.next_search_card(&deck.storage),
            Err(SessionError::Selection(SelectionError::Search(SearchError::NoKeywords)))
        ));
    }

    #[test]
    fn test_no_match_search() {
        let deck = build_deck(&[("Q", "A")], &[]);
        let mut session = StudySession::new();

        session.start_search(["nothing"]);
        let card = session.next_search_card(&deck.storage).unwrap();
        assert!(card.record.is_none());
        assert_eq!(card.population, 0);
    }

    #[test]
    fn test_end_search_and_reset() {
        let deck = build_deck(&[("cell", "x"), ("other", "y")], &[]);
        let mut session = StudySession::new();

        session.next_card(&deck.storage).unwrap();
        session.start_search(["cell"]);
        session.next_search_card(&deck.storage).unwrap();

        session.end_search();
        assert!(session.search_keywords().is_none());
        assert_eq!(session.seen().len(), 1);

        session.start_search(["cell"]);
        session.reset();
        assert!(session.seen().is_empty());
        assert!(session.search_keywords().is_none());
    }
}
