//! Static lecture site builder.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use lectern_exec::{
    FallbackExecutor, JupyterExecutor, NoKernel, NotebookExecutor, PythonRunner, DEFAULT_PYTHON,
};
use lectern_notebook::{first_markdown_excerpt, Notebook, NotebookError};

use crate::assets::AssetPipeline;
use crate::catalog::{self, CatalogEntry};
use crate::chrome::{self, Chrome, ChromeError};
use crate::lecture::Lecture;
use crate::render::{NotebookRenderer, RenderError, TemplateRenderer};
use crate::templates::TemplateEngine;

/// Summary used when neither the configuration nor the notebook offers one.
pub const DEFAULT_SUMMARY: &str = "Hands-on coding walkthrough.";

/// Configuration for building a lecture site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Directory holding the `Lecture*.ipynb` notebooks
    pub notebooks_dir: PathBuf,

    /// Site root; pages go to `lectures/` below it
    pub output_dir: PathBuf,

    /// Site title
    pub title: String,

    /// Paths to extra CSS stylesheets copied into `assets/`
    pub styles: Vec<String>,

    /// Minify generated CSS
    pub minify: bool,

    /// Run notebooks through Jupyter before the fallback pass
    pub execute: bool,

    /// Jupyter kernel name
    pub kernel: String,

    /// Jupyter per-cell timeout in seconds
    pub timeout_secs: u64,

    /// Python interpreter for the fallback pass
    pub python: String,

    /// Catalog summaries by lecture number
    pub summaries: BTreeMap<u32, String>,

    /// Quiz links by lecture number
    pub quiz_links: BTreeMap<u32, String>,

    /// Regexes for paragraphs removed from rendered pages
    pub scrub_patterns: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            notebooks_dir: PathBuf::from("."),
            output_dir: PathBuf::from("docs"),
            title: "Lecture Notes".to_string(),
            styles: vec![],
            minify: true,
            execute: true,
            kernel: "python3".to_string(),
            timeout_secs: 600,
            python: DEFAULT_PYTHON.to_string(),
            summaries: BTreeMap::new(),
            quiz_links: BTreeMap::new(),
            scrub_patterns: vec![],
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Pages rendered from notebooks
    pub rendered: usize,

    /// Existing pages whose title was refreshed
    pub refreshed: usize,

    /// Notebooks skipped for their file name
    pub skipped: usize,

    /// Notebooks whose page could not be built; they stay in the catalog
    pub failed: usize,

    /// Entries written to the catalog
    pub lectures: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read notebooks directory: {0}")]
    ReadError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),

    #[error(transparent)]
    Notebook(#[from] NotebookError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Chrome(#[from] ChromeError),
}

/// Static lecture site builder.
pub struct StaticBuilder {
    config: BuildConfig,
    executor: Box<dyn NotebookExecutor>,
    renderer: Box<dyn NotebookRenderer>,
    fallback: FallbackExecutor,
    chrome: Chrome,
}

impl StaticBuilder {
    /// Create a new static builder.
    ///
    /// Notebooks are executed with Jupyter when `config.execute` is set.
    pub fn new(config: BuildConfig) -> Result<Self, BuildError> {
        let templates = TemplateEngine::new();
        let chrome = Chrome::new(&templates, &config.title, &config.scrub_patterns)?;
        let executor: Box<dyn NotebookExecutor> = if config.execute {
            Box::new(JupyterExecutor::new(config.timeout_secs, config.kernel.clone()))
        } else {
            Box::new(NoKernel)
        };

        let fallback = FallbackExecutor::with_runner(PythonRunner::with_program(config.python.clone()));

        Ok(Self {
            config,
            executor,
            renderer: Box::new(TemplateRenderer::new()),
            fallback,
            chrome,
        })
    }

    /// Replace the primary execution collaborator.
    pub fn with_executor(mut self, executor: Box<dyn NotebookExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Replace the render collaborator.
    pub fn with_renderer(mut self, renderer: Box<dyn NotebookRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Build the site.
    ///
    /// One notebook failing does not stop the others; it is logged and still
    /// listed in the catalog from its file name.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        let lectures_dir = self.config.output_dir.join("lectures");
        fs::create_dir_all(&lectures_dir).map_err(|e| BuildError::WriteError(e.to_string()))?;

        let mut result = BuildResult {
            rendered: 0,
            refreshed: 0,
            skipped: 0,
            failed: 0,
            lectures: 0,
            duration_ms: 0,
            output_dir: self.config.output_dir.clone(),
        };
        let mut entries = Vec::new();

        for path in self.discover_notebooks()? {
            let lecture = match Lecture::from_path(&path) {
                Ok(lecture) => lecture,
                Err(e) => {
                    warn!("Skipping {}", e);
                    result.skipped += 1;
                    continue;
                }
            };
            if lecture.date.is_none() {
                warn!(
                    "{} has no valid date, showing {} as is",
                    path.display(),
                    lecture.raw_date
                );
            }

            let output_path = lectures_dir.join(format!("{}.html", lecture.slug()));
            let page_title = lecture.page_title(&self.config.title);

            let notebook = if output_path.exists() {
                info!("{} already built, refreshing title", output_path.display());
                if let Err(e) = refresh_title(&output_path, &page_title) {
                    warn!("Failed to refresh {}: {}", output_path.display(), e);
                }
                result.refreshed += 1;
                read_for_summary(&lecture.path)
            } else {
                match self.build_page(&lecture, &output_path, &page_title) {
                    Ok(notebook) => {
                        info!("Rendered {}", output_path.display());
                        result.rendered += 1;
                        Some(notebook)
                    }
                    Err(e) => {
                        warn!("Failed to build {}: {}", lecture.path.display(), e);
                        result.failed += 1;
                        read_for_summary(&lecture.path)
                    }
                }
            };

            entries.push(CatalogEntry::new(
                &lecture,
                self.summary(lecture.number, notebook.as_ref()),
                self.config.quiz_links.get(&lecture.number).cloned(),
            ));
        }

        self.generate_assets()?;

        catalog::write(&self.config.output_dir.join("lectures.json"), &entries)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;
        result.lectures = entries.len();

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// `Lecture*.ipynb` files directly inside the notebooks directory, sorted.
    fn discover_notebooks(&self) -> Result<Vec<PathBuf>, BuildError> {
        if !self.config.notebooks_dir.is_dir() {
            return Err(BuildError::ReadError(format!(
                "Notebooks directory not found: {}",
                self.config.notebooks_dir.display()
            )));
        }

        let notebooks = WalkDir::new(&self.config.notebooks_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                name.starts_with("Lecture") && name.ends_with(".ipynb")
            })
            .collect();

        Ok(notebooks)
    }

    /// Execute, render and write one lecture page.
    fn build_page(
        &self,
        lecture: &Lecture,
        output_path: &Path,
        page_title: &str,
    ) -> Result<Notebook, BuildError> {
        let source = Notebook::read(&lecture.path)?;

        let mut notebook = match self.executor.execute(&lecture.path, &source) {
            Ok(executed) => executed,
            Err(e) => {
                warn!(
                    "Failed to execute {} with {}: {}",
                    lecture.path.display(),
                    self.executor.name(),
                    e
                );
                source
            }
        };

        let working_dir = lecture
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty());
        match self.fallback.fill_in(&mut notebook, working_dir) {
            Ok(report) => {
                if report.attempted > 0 || report.skipped > 0 {
                    info!(
                        attempted = report.attempted,
                        skipped = report.skipped,
                        filled = report.filled,
                        "Fallback pass over {}",
                        lecture.path.display()
                    );
                }
                debug!(state = ?report.state, missing = ?report.missing.names(), "Fallback pass finished");
            }
            Err(e) => warn!("Fallback pass skipped for {}: {}", lecture.path.display(), e),
        }

        let html = self.renderer.render(&notebook, page_title)?;
        let html = self.chrome.apply(&html, page_title);

        fs::write(output_path, html).map_err(|e| BuildError::WriteError(e.to_string()))?;

        Ok(notebook)
    }

    fn summary(&self, number: u32, notebook: Option<&Notebook>) -> String {
        if let Some(summary) = self.config.summaries.get(&number) {
            return summary.clone();
        }
        notebook
            .map(first_markdown_excerpt)
            .filter(|excerpt| !excerpt.is_empty())
            .unwrap_or_else(|| DEFAULT_SUMMARY.to_string())
    }

    /// Generate static assets.
    fn generate_assets(&self) -> Result<(), BuildError> {
        let assets_dir = self.config.output_dir.join("assets");
        fs::create_dir_all(&assets_dir).map_err(|e| BuildError::WriteError(e.to_string()))?;

        for (name, css) in [
            ("styles.css", AssetPipeline::site_css()),
            ("notebook.css", AssetPipeline::notebook_css()),
        ] {
            let css = if self.config.minify {
                AssetPipeline::minify_css(&css).unwrap_or(css)
            } else {
                css
            };
            fs::write(assets_dir.join(name), css)
                .map_err(|e| BuildError::WriteError(e.to_string()))?;
        }

        fs::write(assets_dir.join("copy.js"), AssetPipeline::copy_js())
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        // Copy configured stylesheets
        for style_path in &self.config.styles {
            let source_path = PathBuf::from(style_path);
            if source_path.exists() {
                let filename = source_path
                    .file_name()
                    .and_then(|f| f.to_str())
                    .unwrap_or("style.css");
                let content = fs::read_to_string(&source_path).map_err(|e| {
                    BuildError::ReadError(format!("Failed to read stylesheet: {}", e))
                })?;
                fs::write(assets_dir.join(filename), content)
                    .map_err(|e| BuildError::WriteError(e.to_string()))?;
                info!("Copied stylesheet from {}", style_path);
            } else {
                warn!("Stylesheet not found: {}", style_path);
            }
        }

        Ok(())
    }
}

/// Source notebook of a lecture, if it can still be read.
fn read_for_summary(path: &Path) -> Option<Notebook> {
    match Notebook::read(path) {
        Ok(notebook) => Some(notebook),
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

/// Point an existing page at the current title, rewriting it only on change.
///
/// Returns whether the file was rewritten.
fn refresh_title(path: &Path, page_title: &str) -> std::io::Result<bool> {
    let existing = fs::read_to_string(path)?;
    let refreshed = chrome::replace_title(&existing, page_title);
    if refreshed == existing {
        return Ok(false);
    }
    fs::write(path, refreshed)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_exec::{python_available, ExecuteError};
    use lectern_notebook::Cell;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn write_notebook(dir: &Path, name: &str, cells: Vec<Cell>) {
        Notebook::new(cells).write(dir.join(name)).unwrap();
    }

    fn config(root: &Path) -> BuildConfig {
        BuildConfig {
            notebooks_dir: root.join("notebooks"),
            output_dir: root.join("site"),
            title: "Code Lab".to_string(),
            execute: false,
            ..Default::default()
        }
    }

    fn setup() -> (tempfile::TempDir, BuildConfig) {
        let temp = tempdir().unwrap();
        let notebooks = temp.path().join("notebooks");
        fs::create_dir_all(&notebooks).unwrap();
        write_notebook(
            &notebooks,
            "Lecture1_Intro_to_python_20250901.ipynb",
            vec![
                Cell::markdown("# Welcome\n\nWe meet **Python** and `print`."),
                Cell::code("answer = 6 * 7\nprint(answer)"),
                Cell::code("answer / 2"),
            ],
        );
        write_notebook(
            &notebooks,
            "Lecture2_Numpy_arrays_20250908.ipynb",
            vec![Cell::code("import astrokit as ak"), Cell::code("ak.arange(3)")],
        );
        write_notebook(&notebooks, "Notes_draft.ipynb", vec![Cell::code("1")]);
        write_notebook(&notebooks, "Lecture3_Later_20251340.ipynb", vec![]);
        let config = config(temp.path());
        (temp, config)
    }

    fn read_catalog(config: &BuildConfig) -> Vec<CatalogEntry> {
        let json = fs::read_to_string(config.output_dir.join("lectures.json")).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn builds_pages_and_catalog() {
        let (_temp, config) = setup();

        let result = StaticBuilder::new(config.clone()).unwrap().build().unwrap();

        assert_eq!(result.rendered, 3);
        assert_eq!(result.skipped, 0);
        assert_eq!(result.lectures, 3);

        let catalog = read_catalog(&config);
        assert_eq!(
            catalog[0],
            CatalogEntry {
                number: 1,
                title: "Lecture 1: Intro To Python".to_string(),
                date: "Sep 2025".to_string(),
                slug: "lecture01-intro-to-python".to_string(),
                relative_path: "lectures/lecture01-intro-to-python.html".to_string(),
                summary: "Welcome We meet Python and print.".to_string(),
                quiz_link: None,
            }
        );
        assert_eq!(catalog[1].title, "Lecture 2: NumPy Arrays");

        let page = fs::read_to_string(config.output_dir.join("lectures/lecture01-intro-to-python.html")).unwrap();
        assert!(page.contains("<title>Lecture 1: Intro To Python – Code Lab</title>"));
        assert!(page.contains("class=\"lecture-page"));
        assert!(page.contains("data-jp-theme-light=\"false\""));
        if python_available(DEFAULT_PYTHON) {
            assert!(page.contains(">42\n</pre>"));
            assert!(page.contains(">21.0</pre>"));

            let page = fs::read_to_string(config.output_dir.join("lectures/lecture02-numpy-arrays.html")).unwrap();
            assert!(page.contains("Python module &#x27;astrokit&#x27; is missing"));
            assert_eq!(page.matches("Output not rendered").count(), 1);
        }
    }

    #[test]
    fn impossible_dates_are_still_listed() {
        let (_temp, config) = setup();

        StaticBuilder::new(config.clone()).unwrap().build().unwrap();

        let catalog = read_catalog(&config);
        assert_eq!(catalog[2].number, 3);
        assert_eq!(catalog[2].title, "Lecture 3: Later");
        assert_eq!(catalog[2].date, "20251340");
        assert!(config.output_dir.join("lectures/lecture03-later.html").exists());
    }

    #[test]
    fn writes_assets() {
        let (_temp, mut config) = setup();
        config.minify = false;

        StaticBuilder::new(config.clone()).unwrap().build().unwrap();

        let assets = config.output_dir.join("assets");
        assert!(fs::read_to_string(assets.join("styles.css")).unwrap().contains('\n'));
        assert!(assets.join("notebook.css").exists());
        assert!(assets.join("copy.js").exists());
    }

    #[test]
    fn rebuild_is_idempotent() {
        let (_temp, config) = setup();
        let builder = StaticBuilder::new(config.clone()).unwrap();
        builder.build().unwrap();
        let catalog = fs::read(config.output_dir.join("lectures.json")).unwrap();
        let page_path = config.output_dir.join("lectures/lecture01-intro-to-python.html");
        let page = fs::read(&page_path).unwrap();

        let result = builder.build().unwrap();

        assert_eq!(result.rendered, 0);
        assert_eq!(result.refreshed, 3);
        assert_eq!(fs::read(config.output_dir.join("lectures.json")).unwrap(), catalog);
        assert_eq!(fs::read(&page_path).unwrap(), page);
    }

    #[test]
    fn rebuild_only_refreshes_titles() {
        let (_temp, config) = setup();
        StaticBuilder::new(config.clone()).unwrap().build().unwrap();
        let page_path = config.output_dir.join("lectures/lecture01-intro-to-python.html");
        let before = fs::read_to_string(&page_path).unwrap();

        let renamed = BuildConfig {
            title: "Stars & Code".to_string(),
            ..config.clone()
        };
        StaticBuilder::new(renamed).unwrap().build().unwrap();

        let after = fs::read_to_string(&page_path).unwrap();
        assert_eq!(
            after,
            before.replacen(
                "<title>Lecture 1: Intro To Python – Code Lab</title>",
                "<title>Lecture 1: Intro To Python – Stars &amp; Code</title>",
                1
            )
        );
        assert_eq!(read_catalog(&config)[0].summary, "Welcome We meet Python and print.");
    }

    #[test]
    fn configured_summaries_and_quiz_links_win() {
        let (_temp, mut config) = setup();
        config.summaries.insert(2, "Arrays and vectorisation.".to_string());
        config.quiz_links.insert(2, "https://quiz.example/2".to_string());

        StaticBuilder::new(config.clone()).unwrap().build().unwrap();

        let catalog = read_catalog(&config);
        assert_eq!(catalog[1].summary, "Arrays and vectorisation.");
        assert_eq!(catalog[1].quiz_link.as_deref(), Some("https://quiz.example/2"));
        assert_eq!(catalog[0].quiz_link, None);
    }

    #[test]
    fn broken_notebook_is_listed_without_a_page() {
        let (_temp, config) = setup();
        fs::write(
            config.notebooks_dir.join("Lecture4_Broken_20250922.ipynb"),
            "{ not json",
        )
        .unwrap();

        let result = StaticBuilder::new(config.clone()).unwrap().build().unwrap();

        assert_eq!(result.failed, 1);
        assert_eq!(result.rendered, 3);
        assert_eq!(result.lectures, 4);
        let catalog = read_catalog(&config);
        let numbers: Vec<u32> = catalog.iter().map(|e| e.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(catalog[3].title, "Lecture 4: Broken");
        assert_eq!(catalog[3].summary, DEFAULT_SUMMARY);
        assert!(!config.output_dir.join("lectures/lecture04-broken.html").exists());
    }

    #[test]
    fn notebooks_without_markdown_get_the_default_summary() {
        let (_temp, config) = setup();

        StaticBuilder::new(config.clone()).unwrap().build().unwrap();

        assert_eq!(read_catalog(&config)[1].summary, DEFAULT_SUMMARY);
    }

    struct FailingKernel;

    impl NotebookExecutor for FailingKernel {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn execute(&self, path: &Path, _notebook: &Notebook) -> Result<Notebook, ExecuteError> {
            Err(ExecuteError::InvalidPath(path.display().to_string()))
        }
    }

    #[test]
    fn kernel_failure_falls_back() {
        let (_temp, config) = setup();
        let builder = StaticBuilder::new(config.clone())
            .unwrap()
            .with_executor(Box::new(FailingKernel));

        let result = builder.build().unwrap();

        assert_eq!(result.rendered, 3);
        let page = fs::read_to_string(config.output_dir.join("lectures/lecture01-intro-to-python.html")).unwrap();
        if python_available(DEFAULT_PYTHON) {
            assert!(page.contains(">42\n</pre>"));
        }
    }

    #[test]
    fn missing_interpreter_still_renders_pages() {
        let (_temp, mut config) = setup();
        config.python = "lectern-no-such-python".to_string();

        let result = StaticBuilder::new(config.clone()).unwrap().build().unwrap();

        assert_eq!(result.rendered, 3);
        assert_eq!(result.failed, 0);
        let page = fs::read_to_string(config.output_dir.join("lectures/lecture01-intro-to-python.html")).unwrap();
        assert!(page.contains("answer = 6 * 7"));
        assert!(!page.contains(">42\n</pre>"));
    }

    #[test]
    fn missing_notebooks_dir_is_an_error() {
        let temp = tempdir().unwrap();

        let err = StaticBuilder::new(config(temp.path())).unwrap().build().unwrap_err();

        assert!(matches!(err, BuildError::ReadError(_)));
    }
}
