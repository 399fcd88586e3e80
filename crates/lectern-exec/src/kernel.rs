//! Primary notebook execution through an installed Jupyter toolchain.

use std::path::Path;
use std::process::Command;

use lectern_notebook::{Notebook, NotebookError};
use tracing::debug;

use crate::traits::NotebookExecutor;

/// Errors from the primary execution collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Executed notebook could not be parsed: {0}")]
    InvalidOutput(#[from] NotebookError),

    #[error("Not a notebook file: {0}")]
    InvalidPath(String),
}

/// Runs every cell through `jupyter nbconvert --execute`.
///
/// Cell errors are allowed, so a notebook with a failing cell still comes
/// back executed up to and past the failure.
#[derive(Debug, Clone)]
pub struct JupyterExecutor {
    /// Program to invoke (default: "jupyter")
    pub program: String,

    /// Per-cell timeout in seconds
    pub timeout_secs: u64,

    /// Kernel name (default: "python3")
    pub kernel: String,
}

impl Default for JupyterExecutor {
    fn default() -> Self {
        Self {
            program: "jupyter".to_string(),
            timeout_secs: 600,
            kernel: "python3".to_string(),
        }
    }
}

impl JupyterExecutor {
    pub fn new(timeout_secs: u64, kernel: impl Into<String>) -> Self {
        Self {
            timeout_secs,
            kernel: kernel.into(),
            ..Self::default()
        }
    }

    /// Arguments passed to the program for `file_name`.
    pub fn args(&self, file_name: &str) -> Vec<String> {
        vec![
            "nbconvert".to_string(),
            "--to".to_string(),
            "notebook".to_string(),
            "--execute".to_string(),
            "--allow-errors".to_string(),
            "--stdout".to_string(),
            format!("--ExecutePreprocessor.timeout={}", self.timeout_secs),
            format!("--ExecutePreprocessor.kernel_name={}", self.kernel),
            file_name.to_string(),
        ]
    }
}

impl NotebookExecutor for JupyterExecutor {
    fn name(&self) -> &'static str {
        "jupyter"
    }

    fn execute(&self, path: &Path, _notebook: &Notebook) -> Result<Notebook, ExecuteError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ExecuteError::InvalidPath(path.display().to_string()))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        debug!(notebook = %path.display(), kernel = %self.kernel, "Executing with Jupyter");

        let output = Command::new(&self.program)
            .args(self.args(file_name))
            .current_dir(dir)
            .output()
            .map_err(|source| ExecuteError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExecuteError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(Notebook::from_json(&String::from_utf8_lossy(&output.stdout))?)
    }
}

/// Leaves notebooks unexecuted; the fallback pass does all the work.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKernel;

impl NotebookExecutor for NoKernel {
    fn name(&self) -> &'static str {
        "none"
    }

    fn execute(&self, _path: &Path, notebook: &Notebook) -> Result<Notebook, ExecuteError> {
        Ok(notebook.clone())
    }
}
