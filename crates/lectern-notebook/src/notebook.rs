//! Notebook and cell model.

use std::fs;
use std::path::{Path, PathBuf};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::output::Output;

/// Kind of a notebook cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Markdown,
    Code,
    Raw,
}

/// A notebook cell.
///
/// Unknown fields (cell ids, attachments) are kept in `extra` so a notebook
/// survives a read/write cycle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Cell {
    /// Cell kind
    pub cell_type: CellType,

    /// Source text, joined from nbformat's line list
    #[serde(default, with = "multiline")]
    pub source: String,

    /// Execution count, set once the cell has run
    #[serde(default)]
    pub execution_count: Option<u32>,

    /// Outputs in emission order
    #[serde(default)]
    pub outputs: Vec<Output>,

    /// Cell metadata
    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cell {
    /// Create a code cell that has not been executed.
    pub fn code(source: impl Into<String>) -> Self {
        Self::new(CellType::Code, source)
    }

    /// Create a markdown cell.
    pub fn markdown(source: impl Into<String>) -> Self {
        Self::new(CellType::Markdown, source)
    }

    fn new(cell_type: CellType, source: impl Into<String>) -> Self {
        Self {
            cell_type,
            source: source.into(),
            execution_count: None,
            outputs: Vec::new(),
            metadata: Map::new(),
            extra: Map::new(),
        }
    }

    pub fn is_code(&self) -> bool {
        self.cell_type == CellType::Code
    }

    /// Whether the primary pipeline already ran or rendered this cell.
    pub fn is_executed(&self) -> bool {
        self.execution_count.is_some() || !self.outputs.is_empty()
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("cell_type", &self.cell_type)?;
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("metadata", &self.metadata)?;
        map.serialize_entry("source", &self.source)?;
        // Only code cells carry execution state in nbformat 4
        if self.is_code() {
            map.serialize_entry("execution_count", &self.execution_count)?;
            map.serialize_entry("outputs", &self.outputs)?;
        }
        map.end()
    }
}

/// A Jupyter notebook (nbformat 4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    /// Notebook cells
    pub cells: Vec<Cell>,

    /// Notebook metadata (kernelspec, language_info, ...)
    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Major format version
    pub nbformat: u32,

    /// Minor format version
    #[serde(default)]
    pub nbformat_minor: u32,
}

/// Errors that can occur when reading or writing notebooks.
#[derive(Debug, thiserror::Error)]
pub enum NotebookError {
    #[error("Failed to read notebook {path}: {message}")]
    ReadError { path: PathBuf, message: String },

    #[error("Failed to write notebook {path}: {message}")]
    WriteError { path: PathBuf, message: String },

    #[error("Invalid notebook JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported nbformat version {0} (expected 4)")]
    UnsupportedVersion(u32),
}

impl Notebook {
    /// Create an empty notebook.
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            metadata: Map::new(),
            nbformat: 4,
            nbformat_minor: 5,
        }
    }

    /// Parse a notebook from JSON text.
    pub fn from_json(json: &str) -> Result<Self, NotebookError> {
        let notebook: Notebook = serde_json::from_str(json)?;
        if notebook.nbformat != 4 {
            return Err(NotebookError::UnsupportedVersion(notebook.nbformat));
        }
        Ok(notebook)
    }

    /// Serialize the notebook as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, NotebookError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a notebook from a file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, NotebookError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| NotebookError::ReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Write the notebook to a file.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), NotebookError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|e| NotebookError::WriteError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Kernel language from `kernelspec` or `language_info`, if recorded.
    pub fn language(&self) -> Option<&str> {
        self.metadata
            .get("kernelspec")
            .and_then(|k| k.get("language"))
            .or_else(|| self.metadata.get("language_info").and_then(|l| l.get("name")))
            .and_then(|v| v.as_str())
    }

    /// Iterate over code cells.
    pub fn code_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.is_code())
    }
}

/// Serde adapter for nbformat multiline strings, stored either as a single
/// string or as a list of lines.
pub(crate) mod multiline {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Multiline {
        One(String),
        Lines(Vec<String>),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Multiline::deserialize(deserializer)? {
            Multiline::One(text) => text,
            Multiline::Lines(lines) => lines.concat(),
        })
    }

    pub fn serialize<S: Serializer>(text: &str, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(text)
    }
}
