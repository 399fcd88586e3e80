//! Namespace shared by the code cells of one notebook.
//!
//! The namespace lives in a Python child process started with a small
//! bootstrap script. Requests and replies are JSON, one object per line, over
//! the child's stdin and stdout.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SessionError;

/// Interpreter used when none is configured.
pub const DEFAULT_PYTHON: &str = "python3";

const BOOTSTRAP: &str = include_str!("bootstrap.py");

/// Messages understood by the bootstrap script.
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum Request<'a> {
    /// Execute a cell, echoing its trailing expression
    Run { source: &'a str, count: u32 },
    /// Put the namespace back to how it was before the last run
    Rollback,
    /// Top-level import bindings of a source
    Imports { source: &'a str },
    Names,
}

#[derive(Debug, Deserialize)]
struct NamesReply {
    names: Vec<String>,
}

/// Global bindings of one notebook's fallback pass.
///
/// Each environment owns its own Python process, so nothing leaks between
/// notebooks. The process is killed when the environment is dropped.
pub struct Environment {
    program: String,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Environment {
    /// Start a Python process holding the minimal default namespace
    /// (`__name__` only).
    ///
    /// # Arguments
    /// * `program` - Python interpreter to run (e.g., "python3")
    /// * `working_dir` - Directory cells run in; inherits ours when `None`
    pub fn start(program: &str, working_dir: Option<&Path>) -> Result<Self, SessionError> {
        let mut cmd = Command::new(program);
        cmd.arg("-u") // unbuffered
            .arg("-c")
            .arg(BOOTSTRAP)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        let launch = |source| SessionError::Launch {
            program: program.to_string(),
            source,
        };
        let mut child = cmd.spawn().map_err(launch)?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| launch(std::io::Error::other("no stdin")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| launch(std::io::Error::other("no stdout")))?;

        debug!(program, pid = child.id(), "Started Python session");

        Ok(Self {
            program: program.to_string(),
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    /// Send one request and wait for its reply.
    pub(crate) fn request<T: DeserializeOwned>(
        &mut self,
        request: &Request<'_>,
    ) -> Result<T, SessionError> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes())?;
        self.stdin.flush()?;

        let mut reply = String::new();
        if self.stdout.read_line(&mut reply)? == 0 {
            return Err(SessionError::Closed);
        }
        Ok(serde_json::from_str(&reply)?)
    }

    /// Bound names in sorted order.
    pub fn names(&mut self) -> Result<Vec<String>, SessionError> {
        let reply: NamesReply = self.request(&Request::Names)?;
        Ok(reply.names)
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("program", &self.program)
            .field("pid", &self.child.id())
            .finish()
    }
}

/// Whether `program` can be started as a Python interpreter.
pub fn python_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
pub(crate) fn test_session() -> Option<Environment> {
    python_available(DEFAULT_PYTHON).then(|| Environment::start(DEFAULT_PYTHON, None).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Deserialize)]
    struct Status {
        status: String,
    }

    #[test]
    fn starts_with_module_name_only() {
        let Some(mut env) = test_session() else { return };

        assert_eq!(env.names().unwrap(), vec!["__name__"]);
        assert_eq!(env.program(), "python3");
    }

    #[test]
    fn rollback_drops_bindings_from_the_last_run() {
        let Some(mut env) = test_session() else { return };
        let _: serde_json::Value = env.request(&Request::Run { source: "x = 1", count: 1 }).unwrap();
        let _: serde_json::Value = env
            .request(&Request::Run { source: "x = 2\nnp = None", count: 2 })
            .unwrap();

        let reply: Status = env.request(&Request::Rollback).unwrap();

        assert_eq!(reply.status, "ok");
        assert_eq!(env.names().unwrap(), vec!["__name__", "x"]);
    }

    #[test]
    fn environments_are_independent() {
        let Some(mut first) = test_session() else { return };
        let mut second = Environment::start(DEFAULT_PYTHON, None).unwrap();

        let _: serde_json::Value = first
            .request(&Request::Run { source: "shared = 1", count: 1 })
            .unwrap();

        assert_eq!(first.names().unwrap(), vec!["__name__", "shared"]);
        assert_eq!(second.names().unwrap(), vec!["__name__"]);
    }

    #[test]
    fn cells_run_in_the_working_dir() {
        let Some(_) = test_session() else { return };
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stars.csv"), "vega,0.03\n").unwrap();
        let mut env = Environment::start(DEFAULT_PYTHON, Some(dir.path())).unwrap();

        let reply: serde_json::Value = env
            .request(&Request::Run {
                source: "open('stars.csv').read().split(',')[0]",
                count: 1,
            })
            .unwrap();

        assert_eq!(reply["display"], "'vega'");
    }

    #[test]
    fn missing_interpreter_is_a_launch_error() {
        let err = Environment::start("lectern-no-such-python", None).unwrap_err();

        assert!(matches!(err, SessionError::Launch { .. }));
        assert!(!python_available("lectern-no-such-python"));
    }
}
