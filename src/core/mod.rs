//! Core process plumbing: the shell session and env-file I/O.

mod envfile;
mod shell;

pub use envfile::{source_env_file, write_env_file};
pub use shell::{which, CommandHandle, CommandResult, ShellSession};
