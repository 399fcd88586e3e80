//! Write a starter configuration.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing lectern...");

    if config_path.exists() && !yes {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config_path.display()
        );
        return Ok(());
    }

    fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    tracing::info!("Created {}", config_path.display());

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'lectern build' to render Lecture*.ipynb notebooks.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Lectern Configuration

[site]
# Site title, shown in page titles, header and footer
title = "Lecture Notes"

# Directory holding Lecture<N>_<Title>_<YYYYMMDD>.ipynb notebooks
notebooks_dir = "."

# Site root; pages are written to <output_dir>/lectures/
output_dir = "docs"

# Extra stylesheets copied into <output_dir>/assets/
styles = []

[build]
# Minify generated CSS
minify = true

# Execute notebooks with Jupyter before rendering
execute = true
kernel = "python3"
timeout_secs = 600

# Interpreter that re-runs cells Jupyter left without outputs
python = "python3"

# Per-lecture catalog settings
# [lectures.1]
# summary = "Course orientation and environment setup."
# quiz_link = "https://example.com/quiz/1"

[scrub]
# Regexes (case-insensitive, dot matches newline) removed from rendered pages
patterns = []
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config, Overrides};

    #[test]
    fn writes_a_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lectern.toml");

        run(&path, false).unwrap();

        let config = load_config(&path)
            .unwrap()
            .build_config(Overrides::default())
            .unwrap();
        assert_eq!(config.title, "Lecture Notes");
        assert!(config.scrub_patterns.is_empty());
    }

    #[test]
    fn keeps_existing_config_without_yes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lectern.toml");
        fs::write(&path, "[site]\ntitle = \"Mine\"\n").unwrap();

        run(&path, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[site]\ntitle = \"Mine\"\n");

        run(&path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }
}
