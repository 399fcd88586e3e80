//! The `lectures.json` catalog.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::lecture::Lecture;

/// One lecture in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub number: u32,
    pub title: String,
    pub date: String,
    pub slug: String,
    pub relative_path: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_link: Option<String>,
}

impl CatalogEntry {
    pub fn new(lecture: &Lecture, summary: String, quiz_link: Option<String>) -> Self {
        Self {
            number: lecture.number,
            title: lecture.display_title(),
            date: lecture.display_date(),
            slug: lecture.slug(),
            relative_path: lecture.relative_path(),
            summary,
            quiz_link,
        }
    }
}

/// Serialize entries sorted by lecture number, pretty-printed.
///
/// Non-ASCII characters are written as `\uXXXX` escapes.
pub fn to_json(entries: &[CatalogEntry]) -> serde_json::Result<String> {
    let mut sorted: Vec<&CatalogEntry> = entries.iter().collect();
    sorted.sort_by_key(|entry| entry.number);
    serde_json::to_string_pretty(&sorted).map(|json| escape_non_ascii(&json))
}

/// Escape every non-ASCII character, using surrogate pairs outside the BMP.
///
/// Serialized JSON only has non-ASCII text inside strings, so the result is
/// still the same JSON.
fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut units = [0u16; 2];
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
            continue;
        }
        for unit in c.encode_utf16(&mut units) {
            out.push_str(&format!("\\u{:04x}", unit));
        }
    }
    out
}

/// Write the catalog to `path`.
pub fn write(path: &Path, entries: &[CatalogEntry]) -> std::io::Result<()> {
    let json = to_json(entries)?;
    fs::write(path, json)
}
