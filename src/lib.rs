//! A configuration-driven command launcher.
//!
//! Extensions are declarative YAML menus. Each one is validated as a whole
//! ([`schema`]) before it is admitted into a [`Registry`]. A [`Session`] then
//! walks the menus interactively. Picking an action item collects typed
//! inputs ([`collector`]) and substitutes them into a command template
//! ([`template`]). The rendered command line runs through the host shell
//! ([`runner`]).
//!
//! An item whose key or text ends in `{name}` accepts its single input on the
//! selection line, so `s foo` both selects `Search {term}` and sets `term`.

pub mod collector;
pub mod console;
pub mod loader;
pub mod model;
pub mod navigator;
pub mod registry;
pub mod runner;
pub mod schema;
pub mod settings;
pub mod template;
pub mod words;

pub use console::{Console, LineEditor, MemConsole};
pub use navigator::{Outcome, Session};
pub use registry::Registry;
pub use runner::{CommandRunner, ShellRunner};
pub use settings::AppSettings;

pub(crate) const NO_HELP: &str = "No help available.";
pub(crate) const NO_ABOUT: &str = "No about information available.";
