//! # Resrun
//!
//! Declarative resource-graph runner: describe resources, their
//! dependencies, and ordered run steps in YAML; resrun resolves the
//! transitive dependency order and executes each step through a shell
//! session while evaluating rule-based `skip`, `check`, and `expect`
//! predicates against command output, files, directories, the
//! environment, URLs, and executable availability.
//!
//! ## Quick Start
//!
//! ```bash
//! # Install
//! cargo install resrun
//!
//! # Show the dependency chain of a resource
//! resrun depends webapp
//!
//! # Run a resource and everything it requires
//! resrun run webapp
//! ```
//!
//! ## Resource files
//!
//! ```yaml
//! resources:
//!   - id: webapp
//!     name: Web application
//!     desc: Builds and serves the frontend
//!     category: apps
//!     requires: [toolchain]
//!     run:
//!       - name: build
//!         exec: npm run build
//!         skip: ["FILE:dist/index.html"]
//!         expect: ["0", "DIR:dist"]
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::return_self_not_must_use)]

pub mod app;
pub mod config;
pub mod core;
pub mod engine;
pub mod graph;
pub mod resource;
pub mod rules;
pub mod search;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use self::core::{which, CommandHandle, CommandResult, ShellSession};
pub use app::App;
pub use engine::{Runner, StepLog, StepLogger};
pub use graph::DependencyGraph;
pub use resource::{EnvVar, Resource, ResourceStore, Rule, RunStep};
pub use rules::{CancelToken, Evaluator, Predicate};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "resrun";

/// Environment variable holding the path of the runner's env file.
pub const ENV_FILE_VAR: &str = "RUNNER_ENV";
