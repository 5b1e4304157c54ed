pub mod index;

pub use index::{KeywordQuery, SearchError, FTS_TABLE};
