//! `lectern.toml` configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lectern_static::BuildConfig;
use serde::Deserialize;

/// Configuration file structure (lectern.toml).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub build: BuildSettings,
    /// Per-lecture settings keyed by lecture number
    #[serde(default)]
    pub lectures: BTreeMap<String, LectureSettings>,
    #[serde(default)]
    pub scrub: ScrubSettings,
}

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_notebooks_dir")]
    pub notebooks_dir: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Paths to CSS stylesheets to copy into the site
    #[serde(default)]
    pub styles: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            notebooks_dir: default_notebooks_dir(),
            output_dir: default_output_dir(),
            styles: vec![],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_true")]
    pub minify: bool,
    /// Run notebooks through Jupyter before rendering
    #[serde(default = "default_true")]
    pub execute: bool,
    #[serde(default = "default_kernel")]
    pub kernel: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Interpreter for the fallback pass
    #[serde(default = "default_python")]
    pub python: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            minify: true,
            execute: true,
            kernel: default_kernel(),
            timeout_secs: default_timeout(),
            python: default_python(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct LectureSettings {
    pub summary: Option<String>,
    pub quiz_link: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ScrubSettings {
    /// Regexes for paragraphs removed from rendered pages
    #[serde(default)]
    pub patterns: Vec<String>,
}

fn default_title() -> String {
    "Lecture Notes".to_string()
}
fn default_notebooks_dir() -> String {
    ".".to_string()
}
fn default_output_dir() -> String {
    "docs".to_string()
}
fn default_kernel() -> String {
    "python3".to_string()
}
fn default_timeout() -> u64 {
    600
}
fn default_python() -> String {
    "python3".to_string()
}
fn default_true() -> bool {
    true
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub notebooks_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub no_kernel: bool,
    pub no_minify: bool,
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

impl ConfigFile {
    /// Merge file settings and command-line overrides into a build config.
    pub fn build_config(self, overrides: Overrides) -> Result<BuildConfig> {
        let mut summaries = BTreeMap::new();
        let mut quiz_links = BTreeMap::new();
        for (key, lecture) in self.lectures {
            let number: u32 = key
                .parse()
                .with_context(|| format!("Invalid lecture number in [lectures.{}]", key))?;
            if let Some(summary) = lecture.summary {
                summaries.insert(number, summary);
            }
            if let Some(link) = lecture.quiz_link {
                quiz_links.insert(number, link);
            }
        }

        Ok(BuildConfig {
            notebooks_dir: overrides
                .notebooks_dir
                .unwrap_or_else(|| PathBuf::from(&self.site.notebooks_dir)),
            output_dir: overrides
                .output_dir
                .unwrap_or_else(|| PathBuf::from(&self.site.output_dir)),
            title: self.site.title,
            styles: self.site.styles,
            minify: self.build.minify && !overrides.no_minify,
            execute: self.build.execute && !overrides.no_kernel,
            kernel: self.build.kernel,
            timeout_secs: self.build.timeout_secs,
            python: self.build.python,
            summaries,
            quiz_links,
            scrub_patterns: self.scrub.patterns,
        })
    }
}
