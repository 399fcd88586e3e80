//! Static site generator for lectern.
//!
//! Turns a directory of lecture notebooks into HTML pages with shared site
//! chrome, plus a `lectures.json` catalog.

pub mod assets;
pub mod builder;
pub mod catalog;
pub mod chrome;
pub mod lecture;
pub mod render;
pub mod templates;

pub use builder::{BuildConfig, BuildError, BuildResult, StaticBuilder, DEFAULT_SUMMARY};
pub use catalog::CatalogEntry;
pub use chrome::{Chrome, ChromeError};
pub use lecture::{Lecture, NameError};
pub use render::{NotebookRenderer, RenderError, TemplateRenderer};
