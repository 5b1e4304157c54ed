use std::sync::OnceLock;

use regex::{Captures, Regex};

use flashdeck_lib::flashcards::Record;

/// ANSI color codes
#[allow(dead_code)]
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
}

fn image_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<img[^>]*\ssrc=["']([^"']*)["'][^>]*>"#).expect("valid image regex")
    })
}

fn heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<h[1-6][^>]*>(.*?)</h[1-6]>").expect("valid heading regex"))
}

fn line_break_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<br\s*/?>").expect("valid line break regex"))
}

/// Wrap `text` in an ANSI style when colors are on
pub fn styled(text: &str, style: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", style, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Convert rendered card HTML to terminal text
pub fn render_html(html: &str, use_color: bool) -> String {
    let text = image_regex().replace_all(html, "[Image: $1]");
    let text = heading_regex().replace_all(&text, |caps: &Captures| {
        styled(strip_html(&caps[1]).trim(), Color::BOLD, use_color)
    });
    let text = line_break_regex().replace_all(&text, "\n");
    let text = text.replace("<li>", "- ");

    let plain = html_escape::decode_html_entities(&strip_html(&text)).into_owned();

    let mut lines = Vec::new();
    for line in plain.lines() {
        if line.trim().is_empty() {
            // Collapse runs of blank lines
            if lines.last().map_or(false, |l: &String| l.is_empty()) {
                continue;
            }
            lines.push(String::new());
        } else {
            lines.extend(wrap_lines(line, "", 80));
        }
    }

    while lines.last().map_or(false, |l| l.is_empty()) {
        lines.pop();
    }
    while lines.first().map_or(false, |l| l.is_empty()) {
        lines.remove(0);
    }

    lines.join("\n")
}

/// Render the question side of a card, preceded by its id
pub fn render_question(record: &Record, use_color: bool) -> String {
    format!(
        "{}\n{}",
        styled(&format!("#{}", record.id), Color::DIM, use_color),
        render_html(&record.question_html, use_color)
    )
}

pub fn render_answer(record: &Record, use_color: bool) -> String {
    render_html(&record.answer_html, use_color)
}

/// Strip HTML tags
fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;

    for ch in html.chars() {
        if ch == '<' {
            in_tag = true;
        } else if ch == '>' {
            in_tag = false;
        } else if !in_tag {
            result.push(ch);
        }
    }

    result
}

/// Simple word-wrapping for terminal output
fn wrap_lines(text: &str, prefix: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let effective_width = max_width.saturating_sub(prefix.len());

    for line in text.lines() {
        if line.chars().count() <= effective_width {
            lines.push(format!("{}{}", prefix, line));
            continue;
        }

        let mut current_line = String::new();
        for word in line.split_whitespace() {
            if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_line.chars().count() + 1 + word.chars().count() <= effective_width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                lines.push(format!("{}{}", prefix, current_line));
                current_line = word.to_string();
            }
        }
        if !current_line.is_empty() {
            lines.push(format!("{}{}", prefix, current_line));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text_card() {
        let html = "<h3>Question :</h3>\n<p>What is <strong>2+2</strong> &amp; why?</p>\n";
        assert_eq!(render_html(html, false), "Question :\nWhat is 2+2 & why?");
    }

    #[test]
    fn test_render_heading_in_bold() {
        let rendered = render_html("<h3>Answer :</h3>\n<p>4</p>\n", true);
        assert!(rendered.starts_with("\x1b[1mAnswer :\x1b[0m"));
    }

    #[test]
    fn test_render_image_card() {
        let html = "<h3>Answer :</h3>\n<img src=\"/static/png/cell%20map.png\" class=\"img-fluid\" alt=\"cell map\">";
        assert_eq!(render_html(html, false), "Answer :\n[Image: /static/png/cell%20map.png]");
    }

    #[test]
    fn test_render_lists_and_code() {
        let html = "<ul>\n<li>one</li>\n<li>two</li>\n</ul>\n<pre><code>a &lt; b\n</code></pre>\n";
        assert_eq!(render_html(html, false), "- one\n- two\n\na < b");
    }

    #[test]
    fn test_wrap_long_lines() {
        let line = "word ".repeat(30);
        for wrapped in wrap_lines(line.trim(), "", 20) {
            assert!(wrapped.len() <= 20);
        }
    }
}
