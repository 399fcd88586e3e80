//! Lecture notebook names and the display metadata derived from them.
//!
//! A lecture notebook is named `Lecture<N>_<Title>_<YYYYMMDD>.ipynb`; the
//! number, title and date in the name are the only metadata a lecture has.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Lecture(\d+)_([A-Za-z0-9_\-]+)_(\d{8})$").expect("Invalid lecture name regex")
});
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));
static SLUG_INVALID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\-]+").expect("Invalid slug regex"));
static SLUG_DASHES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-+").expect("Invalid dash regex"));

/// Words that title-casing gets wrong, with their proper spelling.
static TITLE_FIXES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        ("Llm", "LLM"),
        ("Llms", "LLMs"),
        ("Api", "API"),
        ("Rag", "RAG"),
        ("Oop", "OOP"),
        ("Numpy", "NumPy"),
        ("Github", "GitHub"),
    ]
    .into_iter()
    .map(|(word, fixed)| {
        let re = Regex::new(&format!(r"\b{}\b", word)).expect("Invalid title fix regex");
        (re, fixed)
    })
    .collect()
});

/// Why a notebook file is not treated as a lecture.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("Unrecognised notebook name: {0}")]
    Unrecognised(String),
}

/// A recognised lecture notebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lecture {
    /// Source notebook
    pub path: PathBuf,

    /// Lecture number
    pub number: u32,

    /// Title token from the file name (`Intro_to_Python`)
    pub raw_title: String,

    /// Date digits from the file name (`20250901`)
    pub raw_date: String,

    /// Parsed date; `None` when the digits are not a calendar date
    pub date: Option<NaiveDate>,
}

impl Lecture {
    /// Recognise a notebook from its file name.
    ///
    /// Only the name pattern is checked. Digits that are not a calendar date
    /// still make a lecture, shown with its raw date.
    pub fn from_path(path: &Path) -> Result<Self, NameError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| NameError::Unrecognised(file_name.clone()))?;

        let caps = NAME_RE
            .captures(stem)
            .ok_or_else(|| NameError::Unrecognised(file_name.clone()))?;
        let number = caps[1]
            .parse()
            .map_err(|_| NameError::Unrecognised(file_name.clone()))?;
        let raw_date = caps[3].to_string();
        let date = NaiveDate::parse_from_str(&raw_date, "%Y%m%d").ok();

        Ok(Self {
            path: path.to_path_buf(),
            number,
            raw_title: caps[2].to_string(),
            raw_date,
            date,
        })
    }

    /// `Lecture 3: Control Flow`
    pub fn display_title(&self) -> String {
        format!("Lecture {}: {}", self.number, format_title(&self.raw_title))
    }

    /// `Sep 2025`, or the raw digits when they are not a date
    pub fn display_date(&self) -> String {
        match self.date {
            Some(date) => date.format("%b %Y").to_string(),
            None => self.raw_date.clone(),
        }
    }

    pub fn slug(&self) -> String {
        slugify(self.number, &self.raw_title)
    }

    /// Page path relative to the site root, always with `/` separators.
    pub fn relative_path(&self) -> String {
        format!("lectures/{}.html", self.slug())
    }

    /// Text for the page's `<title>` element, unescaped.
    pub fn page_title(&self, site_title: &str) -> String {
        format!("{} – {}", self.display_title(), site_title)
    }
}

/// Turn a title token into display text.
///
/// Underscores become spaces, each word is title-cased, and a few acronyms
/// are restored (`Llm` → `LLM`, `Numpy` → `NumPy`, ...).
pub fn format_title(raw: &str) -> String {
    let words = raw.replace('_', " ");
    let words = WHITESPACE_RE.replace_all(words.trim(), " ");
    let mut title = title_case(&words);
    for (re, fixed) in TITLE_FIXES.iter() {
        title = re.replace_all(&title, *fixed).into_owned();
    }
    title
}

/// Upper-case the first letter of every run of letters and lower-case the
/// rest, so `intro2python` becomes `Intro2Python`.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// `lecture03-control-flow`
pub fn slugify(number: u32, raw: &str) -> String {
    let base = format!("lecture{:02}-{}", number, raw.to_lowercase().replace('_', "-"));
    let slug = SLUG_INVALID_RE.replace_all(&base, "-");
    let slug = SLUG_DASHES_RE.replace_all(&slug, "-");
    slug.trim_matches('-').to_string()
}

/// Escape text for use inside HTML, quotes included.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recognises_lecture_names() {
        let lecture = Lecture::from_path(Path::new("nb/Lecture7_LLM_Api_basics_20251014.ipynb")).unwrap();

        assert_eq!(lecture.number, 7);
        assert_eq!(lecture.raw_title, "LLM_Api_basics");
        assert_eq!(lecture.display_title(), "Lecture 7: LLM API Basics");
        assert_eq!(lecture.display_date(), "Oct 2025");
        assert_eq!(lecture.slug(), "lecture07-llm-api-basics");
        assert_eq!(lecture.relative_path(), "lectures/lecture07-llm-api-basics.html");
    }

    #[test]
    fn rejects_other_names() {
        for name in [
            "Lecture_Intro_20250901.ipynb",
            "Lecture1_Intro.ipynb",
            "Lecture1_Intro_2025091.ipynb",
            "Lecture1_Intro Notes_20250901.ipynb",
            "Slides1_Intro_20250901.ipynb",
        ] {
            assert_eq!(
                Lecture::from_path(Path::new(name)),
                Err(NameError::Unrecognised(name.to_string())),
                "{}",
                name
            );
        }
    }

    #[test]
    fn impossible_dates_keep_their_digits() {
        let lecture = Lecture::from_path(Path::new("Lecture2_Intro_20250231.ipynb")).unwrap();

        assert_eq!(lecture.date, None);
        assert_eq!(lecture.raw_date, "20250231");
        assert_eq!(lecture.display_date(), "20250231");
        assert_eq!(lecture.slug(), "lecture02-intro");
    }

    #[test]
    fn formats_titles() {
        assert_eq!(format_title("intro_to__python"), "Intro To Python");
        assert_eq!(format_title("numpy_and_Github_pages"), "NumPy And GitHub Pages");
        assert_eq!(format_title("rag_with_llms"), "RAG With LLMs");
        assert_eq!(format_title("oop-basics"), "OOP-Basics");
        assert_eq!(format_title("python3_intro2code"), "Python3 Intro2Code");
        assert_eq!(format_title("Rage_against_apis"), "Rage Against Apis");
    }

    #[test]
    fn slugs_are_url_safe() {
        assert_eq!(slugify(3, "Control_Flow"), "lecture03-control-flow");
        assert_eq!(slugify(12, "--Pandas__GroupBy-"), "lecture12-pandas-groupby");
        assert_eq!(slugify(101, "A"), "lecture101-a");
    }

    #[test]
    fn page_title_joins_site_title() {
        let lecture = Lecture::from_path(Path::new("Lecture1_Intro_20250901.ipynb")).unwrap();

        assert_eq!(
            escape_html(&lecture.page_title("Code & Stars")),
            "Lecture 1: Intro – Code &amp; Stars"
        );
    }
}
