//! Site chrome injected into rendered lecture pages.

use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use crate::lecture::escape_html;
use crate::templates::TemplateEngine;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>.*?</title>").expect("Invalid title regex"));
static BODY_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<body([^>]*)class="([^"]*)""#).expect("Invalid body class regex")
});
static THEME_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-jp-theme-name="[^"]+""#).expect("Invalid theme name regex")
});

/// Links added to `<head>` right after the title.
const HEAD_LINKS: &str = "<meta charset=\"utf-8\">\n\
<link rel=\"stylesheet\" href=\"../assets/styles.css\">\n\
<link rel=\"stylesheet\" href=\"../assets/notebook.css\">\n\
<script src=\"../assets/copy.js\" defer></script>\n";

const PAGE_CLASS: &str = "lecture-page";

/// Errors from building the chrome.
#[derive(Debug, thiserror::Error)]
pub enum ChromeError {
    #[error("Invalid scrub pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to render chrome: {0}")]
    Template(#[from] minijinja::Error),
}

/// Header, footer and clean-up rules applied to every rendered page.
#[derive(Debug, Clone)]
pub struct Chrome {
    header: String,
    footer: String,
    scrub: Vec<Regex>,
}

impl Chrome {
    /// Render the header and footer for a site and compile scrub patterns.
    ///
    /// Scrub patterns are case-insensitive and `.` matches newlines.
    pub fn new(
        templates: &TemplateEngine,
        site_title: &str,
        scrub_patterns: &[String],
    ) -> Result<Self, ChromeError> {
        let scrub = scrub_patterns
            .iter()
            .map(|pattern| {
                Regex::new(&format!("(?is){}", pattern)).map_err(|source| ChromeError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            header: templates.render_header(site_title)?,
            footer: templates.render_footer(site_title)?,
            scrub,
        })
    }

    /// Dress a freshly rendered page.
    pub fn apply(&self, html: &str, page_title: &str) -> String {
        let html = replace_title(html, page_title);
        let html = html.replacen("</title>", &format!("</title>\n{}", HEAD_LINKS), 1);
        let html = add_body_class(&html);
        let html = insert_after_body_open(&html, &self.header);
        let html = html.replacen("</body>", &format!("{}</body>", self.footer), 1);
        let html = force_dark_theme(&html);
        self.scrub(&html)
    }

    /// Remove paragraphs matching the scrub patterns.
    pub fn scrub(&self, html: &str) -> String {
        let mut html = html.to_string();
        for re in &self.scrub {
            html = re.replace_all(&html, "").into_owned();
        }
        html
    }
}

/// Replace the first `<title>` element with an escaped `page_title`.
pub fn replace_title(html: &str, page_title: &str) -> String {
    let title = format!("<title>{}</title>", escape_html(page_title));
    TITLE_RE.replace(html, NoExpand(&title)).into_owned()
}

/// Put the page class first on `<body>`, creating the attribute if needed.
fn add_body_class(html: &str) -> String {
    if let Some(caps) = BODY_CLASS_RE.captures(html) {
        let classes = &caps[2];
        if classes.split_whitespace().any(|class| class == PAGE_CLASS) {
            return html.to_string();
        }
        let whole = caps.get(0).map(|m| m.range()).unwrap_or_default();
        let replacement = format!("<body{}class=\"{} {}\"", &caps[1], PAGE_CLASS, classes);
        return format!("{}{}{}", &html[..whole.start], replacement, &html[whole.end..]);
    }
    html.replacen("<body", &format!("<body class=\"{}\"", PAGE_CLASS), 1)
}

fn insert_after_body_open(html: &str, fragment: &str) -> String {
    let Some(start) = html.find("<body") else {
        return html.to_string();
    };
    let Some(end) = html[start..].find('>') else {
        return html.to_string();
    };
    let at = start + end + 1;
    format!("{}\n{}{}", &html[..at], fragment, &html[at..])
}

fn force_dark_theme(html: &str) -> String {
    let html = html.replace(r#"data-jp-theme-light="true""#, r#"data-jp-theme-light="false""#);
    THEME_NAME_RE
        .replace_all(&html, r#"data-jp-theme-name="JupyterLab Dark""#)
        .into_owned()
}
