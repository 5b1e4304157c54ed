//! Corpus discovery and loading.
//!
//! Walks the markdown and image roots and turns what it finds into
//! [`NewRecord`]s. A file that cannot be read is logged and skipped; only an
//! invalid file pattern fails the load.

pub mod images;

use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use thiserror::Error;
use walkdir::WalkDir;

use crate::flashcards::NewRecord;
use crate::markdown::extract_text_records;

pub use images::{extract_image_records, image_url};

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Corpus root not found: {0:?}")]
    MissingRoot(PathBuf),

    #[error("Corpus root is not a directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("No usable content directory: markdown {markdown_root:?} is {markdown:?}, images {image_root:?} is {image:?}")]
    NoContentRoots {
        markdown_root: PathBuf,
        markdown: CorpusStatus,
        image_root: PathBuf,
        image: CorpusStatus,
    },
}

pub type Result<T> = std::result::Result<T, CorpusError>;

/// Whether a corpus root can be walked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusStatus {
    Valid,
    Missing,
    NotADirectory,
}

pub fn check_corpus_root(root: &Path) -> CorpusStatus {
    if !root.exists() {
        CorpusStatus::Missing
    } else if !root.is_dir() {
        CorpusStatus::NotADirectory
    } else {
        CorpusStatus::Valid
    }
}

/// Fail unless at least one of the two corpus roots can be walked
pub fn require_content_roots(markdown_root: &Path, image_root: &Path) -> Result<()> {
    let markdown = check_corpus_root(markdown_root);
    let image = check_corpus_root(image_root);

    if markdown != CorpusStatus::Valid && image != CorpusStatus::Valid {
        return Err(CorpusError::NoContentRoots {
            markdown_root: markdown_root.to_path_buf(),
            markdown,
            image_root: image_root.to_path_buf(),
            image,
        });
    }
    Ok(())
}

/// Cards loaded from one corpus root
#[derive(Debug, Default)]
pub struct CorpusLoad {
    pub records: Vec<NewRecord>,
    pub files_read: usize,
    pub files_skipped: usize,
}

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: true,
    }
}

/// Recursively list the regular files under `root` whose name matches the glob
/// `pattern`. Symlinks are followed. The result is sorted.
pub fn discover_corpus(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(pattern)?;

    match check_corpus_root(root) {
        CorpusStatus::Valid => {}
        CorpusStatus::Missing => return Err(CorpusError::MissingRoot(root.to_path_buf())),
        CorpusStatus::NotADirectory => return Err(CorpusError::NotADirectory(root.to_path_buf())),
    }

    let options = match_options();
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {:?}: {}", root, e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if pattern.matches_with(&name, options) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Files under `root` matching any of `patterns`, without duplicates.
///
/// A missing or non-directory root yields no files, with a warning.
fn discover_usable(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let status = check_corpus_root(root);
    if status != CorpusStatus::Valid {
        log::warn!("Content directory unavailable: {:?} ({:?})", root, status);
        // Validate the patterns anyway so a bad configuration is not hidden
        for pattern in patterns {
            Pattern::new(pattern)?;
        }
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for pattern in patterns {
        files.extend(discover_corpus(root, pattern)?);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Read and parse every markdown document under `root`
pub fn load_text_corpus(root: &Path, pattern: &str) -> Result<CorpusLoad> {
    log::info!("Loading markdown files from {:?}", root);

    let mut load = CorpusLoad::default();
    for path in discover_usable(root, &[pattern.to_string()])? {
        log::debug!("Processing markdown file: {:?}", path);

        match fs::read_to_string(&path) {
            Ok(content) => {
                let records = extract_text_records(&content);
                log::debug!("Loaded {} flashcards from {:?}", records.len(), path);
                load.records.extend(records);
                load.files_read += 1;
            }
            Err(e) => {
                log::warn!("Failed to read {:?}: {}", path, e);
                load.files_skipped += 1;
            }
        }
    }

    log::info!(
        "Loaded {} flashcards from {} markdown files",
        load.records.len(),
        load.files_read
    );
    Ok(load)
}

/// Build one image-only card per image under `root`
pub fn load_image_corpus(root: &Path, patterns: &[String], url_prefix: &str) -> Result<CorpusLoad> {
    log::info!("Loading image flashcards from {:?}", root);

    let paths = discover_usable(root, patterns)?;
    let records = extract_image_records(&paths, root, url_prefix);

    log::info!("Loaded {} image flashcards", records.len());
    Ok(CorpusLoad {
        files_read: records.len(),
        records,
        files_skipped: 0,
    })
}
