//! Env-file reading and writing.
//!
//! The runner snapshots the process environment to a file before a run and
//! re-sources it between steps, so values exported by earlier steps (via
//! the env file) survive into later `expect` evaluations.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;

use crate::ENV_FILE_VAR;

/// Write every `KEY=value` pair of the process environment to `path`.
///
/// Values containing whitespace or quote characters are written as escaped
/// double-quoted strings. Also points `RUNNER_ENV` at `path` so later
/// steps can find the file.
pub fn write_env_file(path: &Path) -> anyhow::Result<()> {
    let mut file = fs::File::create(path)
        .with_context(|| format!("failed to create env file {}", path.display()))?;

    std::env::set_var(ENV_FILE_VAR, path);

    for (key, value) in std::env::vars() {
        let rendered = if value.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
            quote(&value)
        } else {
            value
        };
        writeln!(file, "{key}={rendered}")
            .with_context(|| format!("failed to write env file {}", path.display()))?;
    }

    Ok(())
}

/// Read `path` line by line and apply each `KEY=value` pair to the
/// process environment.
///
/// One layer of surrounding double quotes is trimmed from values. A line
/// without `=` is fatal. An empty file is valid.
pub fn source_env_file(path: &Path) -> anyhow::Result<()> {
    tracing::debug!(path = %path.display(), "Sourcing environment file");

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to open env file {}", path.display()))?;

    for line in content.lines() {
        if line.is_empty() {
            continue;
        }

        let Some((key, raw_value)) = line.split_once('=') else {
            anyhow::bail!(
                "invalid environment variable declaration '{line}' in file {}",
                path.display()
            );
        };

        let value = unquote(raw_value);
        std::env::set_var(key, &value);
        tracing::trace!(key, value = %value, "Set environment variable");
    }

    Ok(())
}

/// Render a value as a double-quoted string with inner quotes and
/// backslashes escaped.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Trim one layer of surrounding double quotes and undo the escapes
/// applied by [`quote`].
fn unquote(value: &str) -> String {
    let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
