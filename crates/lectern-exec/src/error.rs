//! Errors raised while running cells in a Python session.

use serde::Deserialize;

/// Errors talking to the Python process behind a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to start {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Python session I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Python session exited unexpectedly")]
    Closed,

    #[error("Invalid reply from Python session: {0}")]
    Protocol(#[from] serde_json::Error),
}

/// Cell source that is not valid Python on its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("SyntaxError: {message} (line {line})")]
pub struct ParseError {
    pub message: String,
    pub line: u32,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

/// An exception that escaped a cell.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct PythonException {
    /// Exception class name (`ZeroDivisionError`)
    pub kind: String,

    /// Names of the base classes, nearest first
    #[serde(default)]
    pub bases: Vec<String>,

    pub message: String,

    /// `name` attribute of `ImportError` and `NameError`
    #[serde(default)]
    pub name: Option<String>,

    /// Formatted traceback lines
    #[serde(default)]
    pub trace: Vec<String>,
}

impl PythonException {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            bases: vec!["Exception".to_string(), "BaseException".to_string()],
            message: message.into(),
            name: None,
            trace: Vec::new(),
        }
    }

    /// Whether this exception is `kind` or a subclass of it.
    pub fn is_instance_of(&self, kind: &str) -> bool {
        self.kind == kind || self.bases.iter().any(|base| base == kind)
    }
}
