//! Single-cell execution and result classification.
//!
//! [`PythonRunner`] executes a cell in a notebook's Python session, hands the
//! raw result to [`classify`], and turns the classification into cell outputs
//! plus a signal for the fallback driver.

use std::path::Path;

use lectern_notebook::{Output, StreamName};
use serde::Deserialize;

use crate::environment::{python_available, Environment, Request, DEFAULT_PYTHON};
use crate::error::{ParseError, PythonException, SessionError};
use crate::traits::CellRunner;

/// Why a cell could not produce a result.
#[derive(Debug, Clone, PartialEq)]
pub enum CellFailure {
    /// The source did not parse
    Parse(ParseError),
    /// An exception escaped the cell
    Exec(PythonException),
}

/// Outcome of one cell, decoupled from how it failed.
#[derive(Debug, Clone)]
pub enum Classification {
    /// The cell completed; `display` holds the `repr` of the echoed trailing
    /// expression
    Ok { display: Option<String> },

    /// An import could not be resolved
    ModuleMissing {
        module: String,
        /// The module exists but a requested name in it does not
        via_import_error: bool,
    },

    /// A name was referenced before anything bound it
    NameMissing(String),

    /// The source cannot run on its own
    ParseError(ParseError),

    /// Any other exception raised by user code
    RuntimeError {
        kind: String,
        message: String,
        trace: Vec<String>,
    },
}

/// Map a raw cell result to its [`Classification`].
///
/// Checks run from most to least specific: parse failures, missing modules,
/// missing names, then everything else.
pub fn classify(result: Result<Option<String>, CellFailure>) -> Classification {
    let err = match result {
        Ok(display) => return Classification::Ok { display },
        Err(CellFailure::Parse(err)) => return Classification::ParseError(err),
        Err(CellFailure::Exec(err)) => err,
    };

    // `return` outside a function and friends only surface when compiling
    if err.is_instance_of("SyntaxError") {
        return Classification::ParseError(ParseError::new(err.message, 1));
    }

    if err.is_instance_of("ImportError") {
        let via_import_error = err.kind != "ModuleNotFoundError";
        let module = err
            .name
            .clone()
            .unwrap_or_else(|| err.message.split(' ').next().unwrap_or_default().to_string());
        return Classification::ModuleMissing {
            module,
            via_import_error,
        };
    }

    if err.is_instance_of("NameError") {
        return Classification::NameMissing(err.name.unwrap_or(err.message));
    }

    Classification::RuntimeError {
        trace: err.trace,
        kind: err.kind,
        message: err.message,
    }
}

/// Why the fallback pass stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// A cell did not parse, so later cells are assumed not to either
    ParseFailure,
    /// A cell referenced an identifier whose setup never ran
    NameMissing(String),
    /// The Python session stopped answering
    SessionLost(String),
}

/// What the driver should do after a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellSignal {
    Continue,
    ModuleMissing(String),
    Halt(HaltReason),
}

/// Outputs and signal produced by one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRun {
    pub outputs: Vec<Output>,
    pub signal: CellSignal,
}

impl CellRun {
    /// Build the outputs for a classified cell result.
    ///
    /// `stdout` and `stderr` are the text the cell printed before it finished
    /// or failed.
    pub fn from_classification(
        classification: Classification,
        stdout: String,
        stderr: String,
        count: u32,
    ) -> Self {
        match classification {
            Classification::ParseError(_) => Self {
                outputs: Vec::new(),
                signal: CellSignal::Halt(HaltReason::ParseFailure),
            },
            Classification::ModuleMissing {
                module,
                via_import_error,
            } => {
                let notice = if via_import_error {
                    "⚠️ Output not rendered: required dependency could not be loaded. \
                     Run this notebook locally to view results.\n"
                        .to_string()
                } else {
                    format!(
                        "⚠️ Output not rendered: Python module '{}' is missing. \
                         Run this notebook locally after installing dependencies.\n",
                        module
                    )
                };
                Self {
                    outputs: vec![Output::stream(StreamName::Stdout, notice)],
                    signal: CellSignal::ModuleMissing(module),
                }
            }
            Classification::NameMissing(name) => {
                let notice = format!(
                    "⚠️ Output not rendered: prior setup step did not run, so '{}' is undefined. \
                     Execute the notebook in order to view results.\n",
                    name
                );
                Self {
                    outputs: vec![Output::stream(StreamName::Stdout, notice)],
                    signal: CellSignal::Halt(HaltReason::NameMissing(name)),
                }
            }
            Classification::RuntimeError {
                kind,
                message,
                trace,
            } => {
                let mut outputs = streams(stdout, stderr);
                outputs.push(Output::error(kind, message, trace));
                Self {
                    outputs,
                    signal: CellSignal::Continue,
                }
            }
            Classification::Ok { display } => {
                let mut outputs = streams(stdout, stderr);
                if let Some(repr) = display {
                    outputs.push(Output::execute_result(count, repr));
                }
                Self {
                    outputs,
                    signal: CellSignal::Continue,
                }
            }
        }
    }
}

fn streams(stdout: String, stderr: String) -> Vec<Output> {
    let mut outputs = Vec::new();
    if !stdout.is_empty() {
        outputs.push(Output::stream(StreamName::Stdout, stdout));
    }
    if !stderr.is_empty() {
        outputs.push(Output::stream(StreamName::Stderr, stderr));
    }
    outputs
}

/// Raw reply to a `run` request.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum RunReply {
    Ok {
        display: Option<String>,
        stdout: String,
        stderr: String,
    },
    Syntax {
        message: String,
        line: u32,
    },
    Raised {
        kind: String,
        #[serde(default)]
        bases: Vec<String>,
        message: String,
        name: Option<String>,
        #[serde(default)]
        trace: Vec<String>,
        stdout: String,
        stderr: String,
    },
}

impl RunReply {
    /// Split into the raw cell result and the captured stdout and stderr.
    fn into_parts(self) -> (Result<Option<String>, CellFailure>, String, String) {
        match self {
            RunReply::Ok {
                display,
                stdout,
                stderr,
            } => (Ok(display), stdout, stderr),
            RunReply::Syntax { message, line } => (
                Err(CellFailure::Parse(ParseError::new(message, line))),
                String::new(),
                String::new(),
            ),
            RunReply::Raised {
                kind,
                bases,
                message,
                name,
                trace,
                stdout,
                stderr,
            } => {
                let exception = PythonException {
                    kind,
                    bases,
                    message,
                    name,
                    trace,
                };
                (Err(CellFailure::Exec(exception)), stdout, stderr)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImportsReply {
    bindings: Vec<(String, String)>,
}

/// Cell runner backed by a real Python interpreter, one process per notebook.
#[derive(Debug, Clone)]
pub struct PythonRunner {
    /// Interpreter to start (default: "python3")
    pub program: String,
}

impl Default for PythonRunner {
    fn default() -> Self {
        Self {
            program: DEFAULT_PYTHON.to_string(),
        }
    }
}

impl PythonRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Whether the configured interpreter can be started.
    pub fn available(&self) -> bool {
        python_available(&self.program)
    }
}

impl CellRunner for PythonRunner {
    type Session = Environment;

    fn start(&self, working_dir: Option<&Path>) -> Result<Environment, SessionError> {
        Environment::start(&self.program, working_dir)
    }

    fn run(&self, env: &mut Environment, source: &str, count: u32) -> Result<CellRun, SessionError> {
        let reply: RunReply = env.request(&Request::Run { source, count })?;
        let (result, stdout, stderr) = reply.into_parts();
        let classification = classify(result);

        if matches!(
            classification,
            Classification::ModuleMissing { .. } | Classification::NameMissing(_)
        ) {
            let _: serde_json::Value = env.request(&Request::Rollback)?;
        }

        Ok(CellRun::from_classification(classification, stdout, stderr, count))
    }

    fn import_bindings(
        &self,
        env: &mut Environment,
        source: &str,
    ) -> Result<Vec<(String, String)>, SessionError> {
        let reply: ImportsReply = env.request(&Request::Imports { source })?;
        Ok(reply.bindings)
    }
}
