//! Fallback pass over the code cells a kernel left empty.

use std::collections::BTreeMap;
use std::path::Path;

use lectern_notebook::{Cell, Notebook};
use regex::Regex;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::runner::{CellSignal, HaltReason, PythonRunner};
use crate::traits::CellRunner;

/// Identifiers that must not be used because their module is missing.
///
/// Maps each blocked identifier to the module it came from. Only grows during
/// a pass.
#[derive(Debug, Clone, Default)]
pub struct MissingAliasSet {
    entries: BTreeMap<String, Blocked>,
}

#[derive(Debug, Clone)]
struct Blocked {
    module: String,
    pattern: Option<Regex>,
}

impl MissingAliasSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block one identifier. An identifier already blocked keeps its module.
    pub fn insert(&mut self, alias: impl Into<String>, module: impl Into<String>) {
        let alias = alias.into();
        if self.entries.contains_key(&alias) {
            return;
        }
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(&alias))).ok();
        self.entries.insert(
            alias,
            Blocked {
                module: module.into(),
                pattern,
            },
        );
    }

    /// Record a missing module.
    ///
    /// The module name itself is always blocked, along with every identifier
    /// from `bindings` whose module is the missing one or one of its
    /// submodules.
    pub fn record(&mut self, missing: &str, bindings: &[(String, String)]) {
        let submodule_prefix = format!("{}.", missing);
        for (alias, module) in bindings {
            if module == missing || module.starts_with(&submodule_prefix) {
                self.insert(alias.clone(), module.clone());
            }
        }
        self.insert(missing, missing);
    }

    /// The first blocked identifier `source` references as a whole word.
    pub fn referenced_in(&self, source: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(alias, blocked)| match &blocked.pattern {
                Some(pattern) => pattern.is_match(source),
                None => source.contains(alias.as_str()),
            })
            .map(|(alias, _)| alias.as_str())
    }

    /// Module a blocked identifier came from.
    pub fn module_of(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(|blocked| blocked.module.as_str())
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    /// Blocked identifiers in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where a fallback pass stands.
///
/// `Running → Poisoned → Halted`; `Halted` is terminal. The blocked
/// identifiers of a poisoned pass live in [`FallbackReport::missing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassState {
    Running,
    Poisoned,
    Halted(HaltReason),
}

/// Summary of one notebook's fallback pass.
#[derive(Debug, Clone)]
pub struct FallbackReport {
    /// Cells handed to the runner
    pub attempted: usize,

    /// Candidate cells left alone (magics, shell escapes, prompts, poisoned names)
    pub skipped: usize,

    /// Cells that received outputs or an execution count
    pub filled: usize,

    /// State when the pass ended
    pub state: PassState,

    /// Identifiers blocked by missing modules
    pub missing: MissingAliasSet,
}

impl FallbackReport {
    pub fn halted(&self) -> bool {
        matches!(self.state, PassState::Halted(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip<'a> {
    Magic,
    Shell,
    Prompt,
    /// References a blocked identifier
    Poisoned(&'a str),
}

fn skip_reason<'a>(source: &str, missing: &'a MissingAliasSet) -> Option<Skip<'a>> {
    let trimmed = source.trim_start();
    if trimmed.starts_with('%') {
        return Some(Skip::Magic);
    }
    if trimmed.starts_with('!') {
        return Some(Skip::Shell);
    }
    if source.contains("input(") || source.contains("getpass(") {
        return Some(Skip::Prompt);
    }
    missing.referenced_in(source).map(Skip::Poisoned)
}

/// Re-runs unexecuted code cells so a page still shows results after the
/// kernel failed.
///
/// Each call to [`fill`](Self::fill) starts a fresh session and alias set, so
/// nothing carries over between notebooks.
#[derive(Debug, Clone, Default)]
pub struct FallbackExecutor<R: CellRunner = PythonRunner> {
    runner: R,
}

impl FallbackExecutor<PythonRunner> {
    pub fn new() -> Self {
        Self {
            runner: PythonRunner::new(),
        }
    }
}

impl<R: CellRunner> FallbackExecutor<R> {
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Fill in outputs for every code cell that has none, in order, running
    /// cells in the current directory.
    pub fn fill(&self, notebook: &mut Notebook) -> Result<FallbackReport, SessionError> {
        self.fill_in(notebook, None)
    }

    /// Like [`fill`](Self::fill), running cells in `working_dir`.
    ///
    /// Fails only when no session can be started; a session lost mid-pass
    /// halts the pass instead.
    pub fn fill_in(
        &self,
        notebook: &mut Notebook,
        working_dir: Option<&Path>,
    ) -> Result<FallbackReport, SessionError> {
        let mut report = FallbackReport {
            attempted: 0,
            skipped: 0,
            filled: 0,
            state: PassState::Running,
            missing: MissingAliasSet::new(),
        };

        if !notebook.cells.iter().any(needs_run) {
            return Ok(report);
        }

        let mut session = self.runner.start(working_dir)?;
        let mut counter: u32 = 1;

        for (index, cell) in notebook.cells.iter_mut().enumerate() {
            if !needs_run(cell) {
                continue;
            }

            if let Some(reason) = skip_reason(&cell.source, &report.missing) {
                match reason {
                    Skip::Poisoned(alias) => {
                        debug!(cell = index, alias, "Skipping cell using a missing module")
                    }
                    other => debug!(cell = index, reason = ?other, "Skipping cell"),
                }
                report.skipped += 1;
                continue;
            }

            let step = self.runner.import_bindings(&mut session, &cell.source).and_then(|bindings| {
                self.runner
                    .run(&mut session, &cell.source, counter)
                    .map(|run| (bindings, run))
            });
            let (bindings, run) = match step {
                Ok(step) => step,
                Err(e) => {
                    warn!(cell = index, "Fallback pass stopped: {}", e);
                    report.state = PassState::Halted(HaltReason::SessionLost(e.to_string()));
                    break;
                }
            };
            let count = counter;
            counter += 1;
            report.attempted += 1;
            debug!(cell = index, count, signal = ?run.signal, outputs = run.outputs.len(), "Ran cell");

            // Cells that stopped the pass or hit a missing module keep their
            // count only when they produced a notice
            if run.signal == CellSignal::Continue || !run.outputs.is_empty() {
                cell.outputs = run.outputs;
                cell.execution_count = Some(count);
                report.filled += 1;
            }

            match run.signal {
                CellSignal::Continue => {}
                CellSignal::ModuleMissing(module) => {
                    report.missing.record(&module, &bindings);
                    report.state = PassState::Poisoned;
                }
                CellSignal::Halt(reason) => {
                    report.state = PassState::Halted(reason);
                    break;
                }
            }
        }

        Ok(report)
    }
}

/// Non-empty code cells the primary executor left untouched.
fn needs_run(cell: &Cell) -> bool {
    cell.is_code()
        && !cell.source.trim().is_empty()
        && cell.execution_count.is_none()
        && cell.outputs.is_empty()
}
