use std::path::{Component, Path, PathBuf};

use crate::flashcards::NewRecord;
use crate::markdown::render_card_side;

/// Web path of an image: `prefix` followed by the path relative to `root`,
/// each segment percent-encoded. An empty prefix yields a relative path.
pub fn image_url(path: &Path, root: &Path, prefix: &str) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);

    let segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => {
                Some(urlencoding::encode(&segment.to_string_lossy()).into_owned())
            }
            _ => None,
        })
        .collect();

    let relative = segments.join("/");
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        relative
    } else {
        format!("{}/{}", prefix, relative)
    }
}

/// One image-only card per path: an empty question heading and an answer
/// embedding the image
pub fn extract_image_records(paths: &[PathBuf], root: &Path, prefix: &str) -> Vec<NewRecord> {
    paths
        .iter()
        .map(|path| {
            log::debug!("Processing image file: {:?}", path);

            let url = image_url(path, root, prefix);
            let alt = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();

            let answer_html = format!(
                "<h3>Answer :</h3>\n<img src=\"{}\" class=\"img-fluid\" alt=\"{}\">",
                url,
                html_escape::encode_double_quoted_attribute(&alt)
            );

            NewRecord::new(render_card_side("Question", ""), answer_html)
        })
        .collect()
}
