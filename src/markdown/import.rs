use std::sync::OnceLock;

use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::flashcards::NewRecord;

/// `<!-- ... -->`, possibly spanning lines
fn comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"))
}

/// `Question :` at the start of a line
fn question_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*Question[ \t]*:").expect("valid question regex"))
}

/// `Answer :` at the start of a line
fn answer_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*Answer[ \t]*:").expect("valid answer regex"))
}

/// Remove every comment span from a document
pub fn strip_comments(document: &str) -> String {
    comment_regex().replace_all(document, "").into_owned()
}

/// Extract the question/answer pairs of a document as rendered cards.
///
/// Comments are removed before any marker is looked for. A question runs up to
/// the first `Answer :` line before the next `Question :` line; a question with
/// no answer line in that range produces no card.
pub fn extract_text_records(document: &str) -> Vec<NewRecord> {
    let cleaned = strip_comments(document);
    let markers: Vec<_> = question_regex().find_iter(&cleaned).collect();

    let mut records = Vec::new();
    for (i, marker) in markers.iter().enumerate() {
        let block_end = markers.get(i + 1).map_or(cleaned.len(), |next| next.start());

        // find_at keeps the preceding text visible to `^`, so an `Answer :`
        // on the same line as the question marker is not a line start.
        let Some(answer) = answer_regex().find_at(&cleaned[..block_end], marker.end()) else {
            continue;
        };

        let question_md = cleaned[marker.end()..answer.start()].trim();
        let answer_md = cleaned[answer.end()..block_end].trim();

        records.push(NewRecord::new(
            render_card_side("Question", question_md),
            render_card_side("Answer", answer_md),
        ));
    }

    records
}

/// Render one side of a card, headed by `### {heading} :`
pub fn render_card_side(heading: &str, body: &str) -> String {
    render_markdown(&format!("### {} :\n{}", heading, body))
}

fn syntax_set() -> &'static SyntaxSet {
    static SET: OnceLock<SyntaxSet> = OnceLock::new();
    SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn highlight_theme() -> &'static Theme {
    static THEME: OnceLock<Theme> = OnceLock::new();
    THEME.get_or_init(|| {
        ThemeSet::load_defaults()
            .themes
            .remove("InspiredGitHub")
            .unwrap_or_default()
    })
}

/// Render markdown to HTML with tables, strikethrough, footnotes and task lists.
///
/// Fenced code blocks are syntax highlighted with inline styles.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut events = Vec::new();
    let mut fence: Option<(String, String)> = None;

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                let lang = info.split_whitespace().next().unwrap_or("").to_string();
                fence = Some((lang, String::new()));
            }
            Event::Text(text) if fence.is_some() => {
                if let Some((_, code)) = fence.as_mut() {
                    code.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) if fence.is_some() => {
                if let Some((lang, code)) = fence.take() {
                    events.push(Event::Html(highlight_code(&lang, &code).into()));
                }
            }
            other => events.push(other),
        }
    }

    let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_output, events.into_iter());
    html_output
}

/// Highlight a fenced block as `<pre><code>` with one styled span per token.
/// An unknown language is rendered as plain text.
fn highlight_code(lang: &str, code: &str) -> String {
    let set = syntax_set();
    let syntax = set
        .find_syntax_by_token(lang)
        .unwrap_or_else(|| set.find_syntax_plain_text());
    let mut highlighter = HighlightLines::new(syntax, highlight_theme());

    let mut out = if lang.is_empty() {
        String::from("<pre><code>")
    } else {
        format!(
            "<pre><code class=\"language-{}\">",
            html_escape::encode_double_quoted_attribute(lang)
        )
    };

    for line in LinesWithEndings::from(code) {
        let styled = highlighter
            .highlight_line(line, set)
            .ok()
            .and_then(|ranges| styled_line_to_highlighted_html(&ranges, IncludeBackground::No).ok());
        match styled {
            Some(html) => out.push_str(&html),
            None => out.push_str(&html_escape::encode_text(line)),
        }
    }

    out.push_str("</code></pre>\n");
    out
}
