//! Template engine for rendering lecture pages and site chrome.

use minijinja::{context, Environment};

/// MathJax build loaded by every lecture page.
pub const MATHJAX_URL: &str =
    "https://cdn.jsdelivr.net/npm/mathjax@2/MathJax.js?config=TeX-AMS_CHTML-full,Safe";

/// One rendered cell.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CellView {
    /// "markdown", "code" or "raw"
    pub kind: &'static str,
    /// Source text for code cells, HTML for markdown and raw cells
    pub content: String,
    /// Outputs of a code cell
    pub outputs: Vec<OutputView>,
}

/// One rendered output.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct OutputView {
    /// "text", "html", "image" or "error"
    pub kind: &'static str,
    /// Mime type shown to the page (`text/plain`, `application/vnd.jupyter.stderr`, ...)
    pub mime: String,
    /// Plain text, trusted HTML, or an image data URI depending on `kind`
    pub content: String,
}

/// Context for rendering a notebook page.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NotebookPage {
    /// Document title
    pub title: String,
    /// Kernel language, used for code highlighting classes
    pub language: String,
    pub cells: Vec<CellView>,
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the built-in templates.
    pub fn new() -> Self {
        let mut env = Environment::new();

        env.add_template_owned("notebook.html".to_string(), NOTEBOOK_TEMPLATE.to_string())
            .expect("Failed to add notebook template");
        env.add_template_owned("cell.html".to_string(), CELL_TEMPLATE.to_string())
            .expect("Failed to add cell template");
        env.add_template_owned("header.html".to_string(), HEADER_TEMPLATE.to_string())
            .expect("Failed to add header template");
        env.add_template_owned("footer.html".to_string(), FOOTER_TEMPLATE.to_string())
            .expect("Failed to add footer template");

        Self { env }
    }

    /// Render a whole notebook document.
    pub fn render_notebook(&self, page: &NotebookPage) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("notebook.html")?;

        tmpl.render(context! {
            title => &page.title,
            language => &page.language,
            cells => &page.cells,
            mathjax_url => MATHJAX_URL,
        })
    }

    /// Render the header inserted after `<body>`.
    pub fn render_header(&self, site_title: &str) -> Result<String, minijinja::Error> {
        self.env
            .get_template("header.html")?
            .render(context! { site_title => site_title })
    }

    /// Render the footer inserted before `</body>`.
    pub fn render_footer(&self, site_title: &str) -> Result<String, minijinja::Error> {
        self.env
            .get_template("footer.html")?
            .render(context! { site_title => site_title })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const NOTEBOOK_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ title }}</title>
  <script type="text/x-mathjax-config">
    MathJax.Hub.Config({
      tex2jax: { inlineMath: [['$', '$'], ['\\(', '\\)']], processEscapes: true },
      displayAlign: 'center'
    });
  </script>
  <script src="{{ mathjax_url | safe }}"></script>
</head>
<body class="jp-Notebook" data-jp-theme-light="true" data-jp-theme-name="JupyterLab Light">
<main>
{% for cell in cells %}{% include "cell.html" %}
{% endfor %}</main>
</body>
</html>
"##;

const CELL_TEMPLATE: &str = r##"{% if cell.kind == "markdown" %}<div class="jp-Cell jp-MarkdownCell">
  <div class="jp-RenderedHTMLCommon jp-RenderedMarkdown">
{{ cell.content | safe }}
  </div>
</div>{% elif cell.kind == "raw" %}<div class="jp-Cell jp-RawCell">
{{ cell.content | safe }}
</div>{% else %}<div class="jp-Cell jp-CodeCell">
  <div class="jp-InputArea">
    <div class="jp-InputArea-editor"><pre><code class="language-{{ language }}">{{ cell.content }}</code></pre></div>
  </div>
  {% if cell.outputs %}<div class="jp-OutputArea">
  {% for output in cell.outputs %}<div class="jp-OutputArea-output" data-mime-type="{{ output.mime }}">
    {%- if output.kind == "html" %}{{ output.content | safe }}
    {%- elif output.kind == "image" %}<img src="{{ output.content | safe }}" alt="">
    {%- elif output.kind == "error" %}<pre class="jp-RenderedText jp-OutputArea-error">{{ output.content }}</pre>
    {%- else %}<pre class="jp-RenderedText">{{ output.content }}</pre>
    {%- endif %}</div>
  {% endfor %}</div>{% endif %}
</div>{% endif %}"##;

const HEADER_TEMPLATE: &str = r##"<header class="site-header">
  <div class="container">
    <a class="brand" href="../index.html">{{ site_title }}</a>
    <nav><a href="../index.html">Back to overview</a></nav>
  </div>
</header>
"##;

const FOOTER_TEMPLATE: &str = r##"<footer class="site-footer">
  <div class="container">
    <p>Part of the {{ site_title }} lecture series.</p>
  </div>
</footer>
<script>
  window.addEventListener('DOMContentLoaded', () => {
    if (window.MathJax) {
      if (window.MathJax.typesetPromise) {
        window.MathJax.typesetPromise();
      } else if (window.MathJax.Hub) {
        window.MathJax.Hub.Queue(['Typeset', window.MathJax.Hub]);
      }
    }
  });
</script>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    fn page(cells: Vec<CellView>) -> NotebookPage {
        NotebookPage {
            title: "Lecture 1: Intro".to_string(),
            language: "python".to_string(),
            cells,
        }
    }

    #[test]
    fn renders_document_shell() {
        let engine = TemplateEngine::new();

        let html = engine.render_notebook(&page(vec![])).unwrap();

        assert!(html.contains("<title>Lecture 1: Intro</title>"));
        assert!(html.contains(r#"data-jp-theme-light="true""#));
        assert!(html.contains(r#"data-jp-theme-name="JupyterLab Light""#));
        assert!(html.contains(MATHJAX_URL));
        assert!(html.contains("</body>"));
    }

    #[test]
    fn escapes_code_but_not_markdown_html() {
        let engine = TemplateEngine::new();

        let html = engine
            .render_notebook(&page(vec![
                CellView {
                    kind: "markdown",
                    content: "<h1>Arrays</h1>".to_string(),
                    outputs: vec![],
                },
                CellView {
                    kind: "code",
                    content: "if a < b:\n    pass".to_string(),
                    outputs: vec![OutputView {
                        kind: "text",
                        mime: "text/plain".to_string(),
                        content: "<class 'int'>".to_string(),
                    }],
                },
            ]))
            .unwrap();

        assert!(html.contains("<h1>Arrays</h1>"));
        assert!(html.contains("if a &lt; b:"));
        assert!(html.contains("&lt;class &#x27;int&#x27;&gt;"));
        assert!(html.contains(r#"<code class="language-python">"#));
        assert!(html.contains("jp-InputArea-editor"));
    }

    #[test]
    fn renders_images_and_errors() {
        let engine = TemplateEngine::new();

        let html = engine
            .render_notebook(&page(vec![CellView {
                kind: "code",
                content: "plot()".to_string(),
                outputs: vec![
                    OutputView {
                        kind: "image",
                        mime: "image/png".to_string(),
                        content: "data:image/png;base64,iVBORw0KGgo=".to_string(),
                    },
                    OutputView {
                        kind: "error",
                        mime: "application/vnd.jupyter.stderr".to_string(),
                        content: "ValueError: bad".to_string(),
                    },
                ],
            }]))
            .unwrap();

        assert!(html.contains(r#"<img src="data:image/png;base64,iVBORw0KGgo=" alt="">"#));
        assert!(html.contains("jp-OutputArea-error\">ValueError: bad</pre>"));
    }

    #[test]
    fn renders_chrome_with_site_title() {
        let engine = TemplateEngine::new();

        let header = engine.render_header("Stars & Code").unwrap();
        let footer = engine.render_footer("Stars & Code").unwrap();

        assert!(header.contains(r#"<a class="brand" href="../index.html">Stars &amp; Code</a>"#));
        assert!(footer.contains("Part of the Stars &amp; Code lecture series."));
        assert!(footer.contains("MathJax.Hub.Queue"));
    }
}
