//! Notebook to HTML rendering.

use std::sync::LazyLock;

use lectern_notebook::output::mime_text;
use lectern_notebook::{Cell, CellType, MimeBundle, Notebook, Output};
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;

use crate::templates::{CellView, NotebookPage, OutputView, TemplateEngine};

static ANSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("Invalid ANSI regex"));

/// Mime types in display preference order.
const MIME_PREFERENCE: &[&str] = &[
    "text/html",
    "image/svg+xml",
    "image/png",
    "image/jpeg",
    "text/markdown",
    "text/latex",
    "text/plain",
];

/// Errors that can occur while rendering a notebook.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to render template: {0}")]
    Template(#[from] minijinja::Error),
}

/// Renders an executed notebook to a standalone HTML document.
pub trait NotebookRenderer: Send + Sync {
    /// Render a notebook.
    ///
    /// # Arguments
    /// * `notebook` - The executed notebook
    /// * `title` - Initial document title; chrome injection replaces it later
    ///
    /// The returned document must contain a `<title>` element and a `<body>`
    /// element.
    fn render(&self, notebook: &Notebook, title: &str) -> Result<String, RenderError>;
}

/// Built-in renderer: minijinja templates with pulldown-cmark for markdown.
#[derive(Default)]
pub struct TemplateRenderer {
    templates: TemplateEngine,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotebookRenderer for TemplateRenderer {
    fn render(&self, notebook: &Notebook, title: &str) -> Result<String, RenderError> {
        let page = NotebookPage {
            title: title.to_string(),
            language: notebook.language().unwrap_or("python").to_string(),
            cells: notebook.cells.iter().filter_map(cell_view).collect(),
        };
        Ok(self.templates.render_notebook(&page)?)
    }
}

fn cell_view(cell: &Cell) -> Option<CellView> {
    match cell.cell_type {
        CellType::Markdown => Some(CellView {
            kind: "markdown",
            content: render_markdown(&cell.source),
            outputs: Vec::new(),
        }),
        CellType::Code => Some(CellView {
            kind: "code",
            content: cell.source.clone(),
            outputs: cell.outputs.iter().filter_map(output_view).collect(),
        }),
        // Only raw cells meant for HTML output are shown
        CellType::Raw => {
            let format = cell
                .metadata
                .get("format")
                .or_else(|| cell.metadata.get("raw_mimetype"))
                .and_then(|value| value.as_str());
            (format == Some("text/html")).then(|| CellView {
                kind: "raw",
                content: cell.source.clone(),
                outputs: Vec::new(),
            })
        }
    }
}

fn output_view(output: &Output) -> Option<OutputView> {
    match output {
        Output::Stream { name, text } => Some(OutputView {
            kind: "text",
            mime: format!("application/vnd.jupyter.{}", name.as_str()),
            content: strip_ansi(text),
        }),
        Output::Error {
            ename,
            evalue,
            traceback,
        } => {
            let text = if traceback.is_empty() {
                format!("{}: {}", ename, evalue)
            } else {
                traceback.join("\n")
            };
            Some(OutputView {
                kind: "error",
                mime: "application/vnd.jupyter.stderr".to_string(),
                content: strip_ansi(&text),
            })
        }
        Output::ExecuteResult { data, .. } | Output::DisplayData { data, .. } => rich_view(data),
    }
}

/// Pick the richest representation a bundle offers.
fn rich_view(data: &MimeBundle) -> Option<OutputView> {
    let (mime, text) = MIME_PREFERENCE
        .iter()
        .find_map(|mime| mime_text(data, mime).map(|text| (*mime, text)))?;

    let (kind, content) = match mime {
        "text/html" | "image/svg+xml" => ("html", text),
        "image/png" | "image/jpeg" => {
            let payload: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            ("image", format!("data:{};base64,{}", mime, payload))
        }
        "text/markdown" => ("html", render_markdown(&text)),
        "text/latex" => ("html", text),
        _ => ("text", strip_ansi(&text)),
    };
    Some(OutputView {
        kind,
        mime: mime.to_string(),
        content,
    })
}

/// Render markdown to HTML.
pub fn render_markdown(content: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let parser = Parser::new_ext(content, options);

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output
}

/// Remove terminal color codes from kernel output.
pub fn strip_ansi(text: &str) -> String {
    ANSI_RE.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_notebook::StreamName;
    use serde_json::json;

    fn bundle(entries: serde_json::Value) -> MimeBundle {
        entries.as_object().cloned().unwrap()
    }

    #[test]
    fn renders_cells_in_order() {
        let mut code = Cell::code("x = 2\nx * 21");
        code.outputs = vec![
            Output::stream(StreamName::Stdout, "working\n"),
            Output::execute_result(1, "42"),
        ];
        let notebook = Notebook::new(vec![Cell::markdown("# Numbers\n\nSome *math*."), code]);

        let html = TemplateRenderer::new().render(&notebook, "Numbers").unwrap();

        let heading = html.find("<h1>Numbers</h1>").unwrap();
        let source = html.find("x * 21").unwrap();
        let stream = html.find("working").unwrap();
        let result = html.find(">42</pre>").unwrap();
        assert!(heading < source && source < stream && stream < result);
        assert!(html.contains("<em>math</em>"));
        assert!(html.contains("<title>Numbers</title>"));
    }

    #[test]
    fn prefers_rich_mime_types() {
        let html = rich_view(&bundle(json!({
            "text/plain": "<Figure>",
            "image/png": "iVBORw0K\nGgo=\n",
        })))
        .unwrap();
        let table = rich_view(&bundle(json!({
            "text/plain": "   a\n0  1",
            "text/html": ["<table>", "</table>"],
        })))
        .unwrap();

        assert_eq!(html.kind, "image");
        assert_eq!(html.content, "data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(table.kind, "html");
        assert_eq!(table.content, "<table></table>");
        assert!(rich_view(&MimeBundle::new()).is_none());
    }

    #[test]
    fn errors_show_traceback_without_color_codes() {
        let view = output_view(&Output::error(
            "ValueError",
            "bad",
            vec![
                "\u{1b}[0;31mTraceback\u{1b}[0m".to_string(),
                "ValueError: bad".to_string(),
            ],
        ))
        .unwrap();

        assert_eq!(view.kind, "error");
        assert_eq!(view.content, "Traceback\nValueError: bad");
    }

    #[test]
    fn skips_plain_raw_cells() {
        let mut html_raw = Cell::markdown("<hr>");
        html_raw.cell_type = CellType::Raw;
        html_raw.metadata.insert("format".to_string(), json!("text/html"));
        let mut plain_raw = html_raw.clone();
        plain_raw.metadata.clear();

        assert_eq!(cell_view(&html_raw).map(|view| view.content), Some("<hr>".to_string()));
        assert!(cell_view(&plain_raw).is_none());
    }
}
