//! Lectern CLI - build a static lecture site from Jupyter notebooks.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

use config::{load_config, Overrides};

#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "Build a static lecture site from Jupyter notebooks")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to lectern.toml config file
    #[arg(short, long, default_value = "lectern.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default lectern.toml
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        yes: bool,
    },

    /// Build the lecture site
    Build {
        /// Notebooks directory (defaults to config or ".")
        #[arg(short, long)]
        notebooks: Option<PathBuf>,

        /// Output directory (defaults to config or "docs")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip Jupyter and use only the fallback executor
        #[arg(long)]
        no_kernel: bool,

        /// Skip minification
        #[arg(long)]
        no_minify: bool,
    },

    /// Preview the built site
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Directory to serve (defaults to the configured output directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes)?;
        }
        Commands::Build {
            notebooks,
            output,
            no_kernel,
            no_minify,
        } => {
            let overrides = Overrides {
                notebooks_dir: notebooks,
                output_dir: output,
                no_kernel,
                no_minify,
            };
            commands::build::run(&cli.config, overrides)?;
        }
        Commands::Serve { port, dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => PathBuf::from(load_config(&cli.config)?.site.output_dir),
            };
            commands::serve::run(port, dir)?;
        }
    }

    Ok(())
}
