//! Asset pipeline for the stylesheets and script shared by lecture pages.

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Site-wide stylesheet (`assets/styles.css`): header, footer, page frame.
    pub fn site_css() -> String {
        SITE_CSS.to_string()
    }

    /// Notebook stylesheet (`assets/notebook.css`): cells and outputs.
    pub fn notebook_css() -> String {
        NOTEBOOK_CSS.to_string()
    }

    /// Copy-to-clipboard buttons for code cells (`assets/copy.js`).
    pub fn copy_js() -> String {
        COPY_JS.to_string()
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }
}

const SITE_CSS: &str = r#"/* Lecture site theme */

:root {
  --background: #0f1117;
  --surface: #171a23;
  --border: #2a2f3d;
  --foreground: #e6e8ef;
  --muted-foreground: #9aa3b5;
  --primary: #7aa2f7;
  --primary-hover: #9bb8ff;
  --radius: 0.5rem;
  --content-max-width: 960px;
}

* {
  box-sizing: border-box;
}

body {
  margin: 0;
  font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
  background: var(--background);
  color: var(--foreground);
  line-height: 1.6;
}

a {
  color: var(--primary);
}

a:hover {
  color: var(--primary-hover);
}

.container {
  max-width: var(--content-max-width);
  margin: 0 auto;
  padding: 0 1.5rem;
}

/* Header */
.site-header {
  position: sticky;
  top: 0;
  z-index: 10;
  background: var(--surface);
  border-bottom: 1px solid var(--border);
}

.site-header .container {
  display: flex;
  align-items: center;
  justify-content: space-between;
  min-height: 3.5rem;
}

.site-header .brand {
  font-weight: 700;
  color: var(--foreground);
  text-decoration: none;
}

.site-header nav a {
  color: var(--muted-foreground);
  text-decoration: none;
}

.site-header nav a:hover {
  color: var(--foreground);
}

/* Footer */
.site-footer {
  margin-top: 3rem;
  padding: 2rem 0;
  border-top: 1px solid var(--border);
  color: var(--muted-foreground);
  font-size: 0.875rem;
}

.lecture-page main {
  max-width: var(--content-max-width);
  margin: 0 auto;
  padding: 2rem 1.5rem;
}
"#;

const NOTEBOOK_CSS: &str = r#"/* Notebook cells on lecture pages */

.jp-Cell {
  margin-bottom: 1.5rem;
}

.jp-RenderedMarkdown h1,
.jp-RenderedMarkdown h2,
.jp-RenderedMarkdown h3 {
  line-height: 1.25;
  margin: 2rem 0 1rem;
}

.jp-RenderedMarkdown table {
  border-collapse: collapse;
  margin-bottom: 1rem;
}

.jp-RenderedMarkdown th,
.jp-RenderedMarkdown td {
  border: 1px solid var(--border);
  padding: 0.375rem 0.75rem;
}

.jp-RenderedMarkdown code {
  font-family: ui-monospace, "SFMono-Regular", monospace;
  font-size: 0.875em;
  background: var(--surface);
  padding: 0.125rem 0.375rem;
  border-radius: 0.25rem;
}

.jp-InputArea {
  position: relative;
}

.jp-InputArea-editor pre {
  margin: 0;
  padding: 1rem;
  overflow-x: auto;
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  font-family: ui-monospace, "SFMono-Regular", monospace;
  font-size: 0.875rem;
}

.jp-OutputArea {
  margin-top: 0.5rem;
  padding-left: 1rem;
  border-left: 2px solid var(--border);
}

.jp-OutputArea-output {
  overflow-x: auto;
}

.jp-OutputArea-output pre {
  margin: 0.25rem 0;
  white-space: pre-wrap;
  font-family: ui-monospace, "SFMono-Regular", monospace;
  font-size: 0.8125rem;
}

.jp-OutputArea-output img {
  max-width: 100%;
  height: auto;
  background: #ffffff;
}

.jp-OutputArea-error {
  color: #f7768e;
}

/* Copy button */
.copy-button {
  position: absolute;
  top: 0.5rem;
  right: 0.5rem;
  padding: 0.25rem 0.75rem;
  font-size: 0.75rem;
  font-weight: 500;
  background: var(--border);
  color: var(--foreground);
  border: none;
  border-radius: 0.375rem;
  cursor: pointer;
  opacity: 0.7;
  transition: opacity 0.15s;
}

.copy-button:hover,
.copy-button.is-copied {
  opacity: 1;
}

.copy-button:focus-visible {
  outline: 2px solid var(--primary);
  outline-offset: 2px;
}
"#;

const COPY_JS: &str = r#"(function () {
  'use strict';

  function codeOf(area) {
    const code = area.querySelector('pre code') || area.querySelector('pre');
    return code ? code.textContent : area.textContent;
  }

  function fallbackCopy(text) {
    const textArea = document.createElement('textarea');
    textArea.value = text;
    textArea.style.position = 'fixed';
    textArea.style.opacity = '0';
    document.body.appendChild(textArea);
    textArea.select();
    try {
      document.execCommand('copy');
    } finally {
      document.body.removeChild(textArea);
    }
  }

  function flash(button, label) {
    button.classList.add('is-copied');
    button.textContent = label;
    setTimeout(() => {
      button.classList.remove('is-copied');
      button.textContent = 'Copy';
    }, 1800);
  }

  document.addEventListener('DOMContentLoaded', () => {
    document.querySelectorAll('.jp-InputArea').forEach((area) => {
      const editor = area.querySelector('.jp-InputArea-editor');
      if (!editor || area.dataset.copyDecorated === 'true') return;
      area.dataset.copyDecorated = 'true';

      const button = document.createElement('button');
      button.type = 'button';
      button.className = 'copy-button';
      button.setAttribute('aria-label', 'Copy code to clipboard');
      button.textContent = 'Copy';

      button.addEventListener('click', async () => {
        const text = codeOf(area).trimEnd();
        if (!text) {
          flash(button, 'Empty');
          return;
        }
        try {
          await navigator.clipboard.writeText(text);
        } catch (err) {
          fallbackCopy(text);
        }
        flash(button, 'Copied!');
      });

      editor.appendChild(button);
    });
  });
})();
"#;
