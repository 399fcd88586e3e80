//! Jupyter notebook model for lectern.
//!
//! This crate reads and writes nbformat 4 notebooks, exposes the cell and
//! output types the executors work on, and extracts the short markdown
//! excerpt used as a lecture summary.

pub mod excerpt;
pub mod notebook;
pub mod output;

pub use excerpt::first_markdown_excerpt;
pub use notebook::{Cell, CellType, Notebook, NotebookError};
pub use output::{MimeBundle, Output, StreamName};
