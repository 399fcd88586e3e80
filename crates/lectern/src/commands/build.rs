//! Static site build command.

use std::path::Path;

use anyhow::Result;
use lectern_static::StaticBuilder;

use crate::config::{load_config, Overrides};

/// Run the build command.
pub fn run(config_path: &Path, overrides: Overrides) -> Result<()> {
    tracing::info!("Building lecture site...");

    let config = load_config(config_path)?.build_config(overrides)?;
    if !config.execute {
        tracing::info!("Kernel execution disabled, using the fallback executor only");
    }

    let result = StaticBuilder::new(config)?.build()?;

    tracing::info!(
        "Built {} lectures ({} rendered, {} refreshed) in {}ms",
        result.lectures,
        result.rendered,
        result.refreshed,
        result.duration_ms
    );
    if result.skipped > 0 {
        tracing::warn!("Skipped {} notebooks with unrecognised names", result.skipped);
    }
    if result.failed > 0 {
        tracing::warn!("{} notebooks failed to build", result.failed);
    }

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
