//! Notebook execution for lectern.
//!
//! Two execution paths fill in cell outputs before a lecture is rendered:
//!
//! - **Kernel execution** ([`kernel`]): the whole notebook runs through an
//!   installed Jupyter toolchain. Failures are tolerated and leave cells
//!   without outputs.
//! - **Fallback execution** ([`fallback`]): code cells the kernel left empty
//!   are re-run one by one in a Python process that keeps one [`Environment`]
//!   for the whole notebook. Each cell result is classified ([`runner`]) so
//!   the pass can skip cells that depend on missing modules and stop at the
//!   first cell whose setup never ran.

pub mod environment;
pub mod error;
pub mod fallback;
pub mod kernel;
pub mod runner;
pub mod traits;

pub use environment::{python_available, Environment, DEFAULT_PYTHON};
pub use error::{ParseError, PythonException, SessionError};
pub use fallback::{FallbackExecutor, FallbackReport, MissingAliasSet, PassState};
pub use kernel::{ExecuteError, JupyterExecutor, NoKernel};
pub use runner::{classify, CellFailure, CellRun, CellSignal, Classification, HaltReason, PythonRunner};
pub use traits::{CellRunner, NotebookExecutor};
