//! Plain-text excerpt of a notebook's first markdown cell.

use std::sync::LazyLock;

use regex::Regex;

use crate::notebook::{CellType, Notebook};

/// Longest excerpt returned before truncation kicks in.
const MAX_EXCERPT_CHARS: usize = 180;

static FENCED_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("Invalid fenced code regex"));
static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]*)`").expect("Invalid inline code regex"));
static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("Invalid image regex"));
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("Invalid link regex"));
static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#*_>]").expect("Invalid markup regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Extract a one-paragraph summary from the first non-empty markdown cell.
///
/// Code, images and markdown punctuation are stripped and links reduced to
/// their text. Returns an empty string when the notebook has no markdown.
pub fn first_markdown_excerpt(notebook: &Notebook) -> String {
    notebook
        .cells
        .iter()
        .filter(|cell| cell.cell_type == CellType::Markdown)
        .map(|cell| cell.source.trim())
        .find(|text| !text.is_empty())
        .map(plain_text)
        .unwrap_or_default()
}

fn plain_text(markdown: &str) -> String {
    let text = FENCED_CODE_RE.replace_all(markdown, "");
    let text = INLINE_CODE_RE.replace_all(&text, "$1");
    let text = IMAGE_RE.replace_all(&text, "");
    let text = LINK_RE.replace_all(&text, "$1");
    let text = MARKUP_RE.replace_all(&text, "");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    truncate(text.trim())
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_EXCERPT_CHARS {
        return text.to_string();
    }

    let head: String = text.chars().take(MAX_EXCERPT_CHARS - 3).collect();
    let cut = match head.rsplit_once(' ') {
        Some((before, _)) => before,
        None => head.as_str(),
    };
    format!("{}…", cut)
}
