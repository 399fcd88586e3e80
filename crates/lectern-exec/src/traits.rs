//! Trait definitions for execution collaborators.

use std::path::Path;

use lectern_notebook::Notebook;

use crate::error::SessionError;
use crate::kernel::ExecuteError;
use crate::runner::CellRun;

/// Runs the code cells of one notebook for the fallback pass.
pub trait CellRunner: Send + Sync {
    /// Namespace shared by every cell of one notebook
    type Session;

    /// Start a fresh session for a notebook.
    ///
    /// # Arguments
    /// * `working_dir` - Directory the cells run in
    fn start(&self, working_dir: Option<&Path>) -> Result<Self::Session, SessionError>;

    /// Execute one cell and classify the result.
    ///
    /// # Arguments
    /// * `session` - The notebook's session
    /// * `source` - The cell source text
    /// * `count` - Execution count to stamp on an `execute_result`
    fn run(&self, session: &mut Self::Session, source: &str, count: u32) -> Result<CellRun, SessionError>;

    /// Identifiers bound by the cell's top-level imports, paired with the
    /// module each one comes from.
    ///
    /// Used to poison aliases once a module turns out to be missing.
    fn import_bindings(
        &self,
        session: &mut Self::Session,
        source: &str,
    ) -> Result<Vec<(String, String)>, SessionError>;
}

/// Executes a whole notebook before rendering.
pub trait NotebookExecutor: Send + Sync {
    /// Collaborator identifier for logs (e.g., "jupyter")
    fn name(&self) -> &'static str;

    /// Execute every cell of a notebook.
    ///
    /// # Arguments
    /// * `path` - Location of the notebook file; its directory is the working directory
    /// * `notebook` - The parsed notebook
    fn execute(&self, path: &Path, notebook: &Notebook) -> Result<Notebook, ExecuteError>;
}
