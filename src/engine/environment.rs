//! Environment materialisation.
//!
//! Turns a step's `env` declarations into process environment bindings
//! before the step's command runs. Resolution precedence per variable is
//! `exec > input > file > value`; the first failure aborts the step.
//!
//! The process environment is global mutable state: during a run it is
//! written from the engine's thread only, here and by the env-file
//! sourcing between steps.

use std::io::{BufRead, Write};

use anyhow::Context;

use crate::core::ShellSession;
use crate::resource::EnvVar;

/// Materialise every declaration into the process environment.
///
/// Must complete fully before the step's `exec` runs; resolution is
/// atomic per variable, and a failure leaves earlier variables set.
pub fn apply_env_vars(session: &ShellSession, env_vars: &[EnvVar]) -> anyhow::Result<()> {
    for env_var in env_vars {
        let value = resolve(session, env_var)
            .with_context(|| format!("failed to set environment variable '{}'", env_var.name))?;

        tracing::debug!(name = env_var.name, "Setting environment variable");
        std::env::set_var(&env_var.name, value);
    }
    Ok(())
}

/// Resolve one declaration to its value.
fn resolve(session: &ShellSession, env_var: &EnvVar) -> anyhow::Result<String> {
    if let Some(command) = env_var.exec.as_deref() {
        let result = session.execute(command).wait();
        if let Some(error) = result.error {
            anyhow::bail!("capture command '{command}' failed: {error}");
        }
        // Trailing newlines from the shell are noise in an env value.
        return Ok(result.output.trim_end_matches(['\n', '\r']).to_string());
    }

    if let Some(prompt) = env_var.input.as_deref() {
        return read_input_token(prompt);
    }

    if let Some(file) = env_var.file.as_deref() {
        // `$NAME` names an environment variable holding the real path.
        let path = if let Some(var_name) = file.strip_prefix('$') {
            let path = std::env::var(var_name).unwrap_or_default();
            if path.is_empty() {
                anyhow::bail!("environment variable '{var_name}' not set or empty");
            }
            path
        } else {
            file.to_string()
        };
        // The variable holds the path itself, not the file contents.
        return Ok(path);
    }

    Ok(env_var.value.clone().unwrap_or_default())
}

/// Print `"<prompt>: "` and read one whitespace-terminated token from
/// stdin.
fn read_input_token(prompt: &str) -> anyhow::Result<String> {
    print!("{prompt}: ");
    std::io::stdout().flush().ok();

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .with_context(|| format!("failed to read input for prompt '{prompt}'"))?;

    let token = line.split_whitespace().next().unwrap_or_default();
    if token.is_empty() {
        anyhow::bail!("no input provided for prompt '{prompt}'");
    }
    Ok(token.to_string())
}
