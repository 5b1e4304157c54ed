//! Markdown question/answer extraction and HTML rendering

pub mod import;

pub use import::{extract_text_records, render_card_side, render_markdown, strip_comments};
