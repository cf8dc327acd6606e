//! Rule evaluation.
//!
//! Evaluates predicates against the accumulated step output, the exit
//! code, the filesystem, the environment, PATH, and HTTP endpoints.
//! Persistent predicates (`@`) are retried on a fixed 2-second delay
//! until they pass or the run is cancelled.

use std::process::Command as ProcessCommand;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::core::which;
use crate::resource::Rule;
use crate::rules::interpolate::interpolate;
use crate::rules::predicate::{Predicate, PredicateBody};

/// Delay between attempts of a persistent predicate.
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Why a rule failed.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("expected executable '{name}' does not exist")]
    CommandMissing { name: String },

    #[error("unexpected executable path '{path}' exists")]
    CommandPresent { path: String },

    #[error("invalid EXEC command")]
    EmptySpawn,

    #[error("command '{command}' failed: {reason}")]
    SpawnFailed { command: String, reason: String },

    #[error("unexpected command '{command}' ran successfully")]
    SpawnSucceeded { command: String },

    #[error("expected environment variable '{name}' does not exist")]
    EnvMissing { name: String },

    #[error("unexpected environment variable '{name}' exists")]
    EnvPresent { name: String },

    #[error("expected file '{path}' does not exist")]
    FileMissing { path: String },

    #[error("unexpected file '{path}' exists")]
    FilePresent { path: String },

    #[error("expected directory '{path}' does not exist")]
    DirMissing { path: String },

    #[error("unexpected directory '{path}' exists")]
    DirPresent { path: String },

    #[error("expected URL '{url}' is not accessible")]
    UrlUnreachable { url: String },

    #[error("unexpected URL '{url}' is accessible")]
    UrlReachable { url: String },

    #[error("expected exit status '{expected}' but got '{actual}'")]
    ExitMismatch { expected: i32, actual: i32 },

    #[error("unexpected exit status '{actual}'")]
    ExitMatched { actual: i32 },

    #[error("expected '{needle}' not found in output")]
    SubstringMissing { needle: String },

    #[error("unexpected output: found '{needle}'")]
    SubstringPresent { needle: String },

    #[error("cancelled while retrying '{rule}'")]
    Cancelled { rule: String },
}

/// Cooperative cancellation for persistent retry loops.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Evaluates predicates.
#[derive(Debug)]
pub struct Evaluator {
    client: reqwest::blocking::Client,
    cancel: CancelToken,
    retry_delay: Duration,
}

impl Evaluator {
    /// Create an evaluator sharing the given HTTP client and token.
    pub fn new(client: reqwest::blocking::Client, cancel: CancelToken) -> Self {
        Self { client, cancel, retry_delay: RETRY_DELAY }
    }

    /// Override the persistent-retry delay (tests).
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Evaluate one predicate string against the accumulated output and
    /// the exit code of the current step.
    pub fn evaluate(&self, raw: &str, output: &str, exit_code: i32) -> Result<(), RuleError> {
        let predicate = Predicate::parse(raw);
        let body = PredicateBody::classify(&interpolate(&predicate.body));

        // An ENV check is intrinsic to the caller's environment; retrying
        // it could never change the outcome mid-run.
        let retryable = predicate.persistent && !matches!(body, PredicateBody::EnvSet(_));

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let result = self.check(&body, predicate.negated, output, exit_code);

            match result {
                Ok(()) => return Ok(()),
                Err(err) if !retryable => return Err(err),
                Err(err) => {
                    tracing::warn!(rule = raw, attempt = attempts, error = %err, "Rule attempt failed, retrying");
                    if self.cancel.is_cancelled() {
                        return Err(RuleError::Cancelled { rule: raw.to_string() });
                    }
                    std::thread::sleep(self.retry_delay);
                }
            }
        }
    }

    /// Evaluate every rule in a list, flattening `expect:` groups; the
    /// first failure wins.
    pub fn evaluate_all(
        &self,
        rules: &[Rule],
        output: &str,
        exit_code: i32,
    ) -> Result<(), RuleError> {
        for rule in rules {
            match rule {
                Rule::Spec(raw) => self.evaluate(raw, output, exit_code)?,
                Rule::Group { expect } => self.evaluate_all(expect, output, exit_code)?,
            }
        }
        Ok(())
    }

    /// Run a single positive/negated check.
    fn check(
        &self,
        body: &PredicateBody,
        negated: bool,
        output: &str,
        exit_code: i32,
    ) -> Result<(), RuleError> {
        match body {
            PredicateBody::Command(name) => match (which(name), negated) {
                (Ok(_), false) | (Err(_), true) => Ok(()),
                (Ok(path), true) => {
                    Err(RuleError::CommandPresent { path: path.display().to_string() })
                }
                (Err(_), false) => Err(RuleError::CommandMissing { name: name.clone() }),
            },

            PredicateBody::Spawn(command) => {
                let mut argv = command.split_whitespace();
                let Some(program) = argv.next() else {
                    return Err(RuleError::EmptySpawn);
                };

                let ran_ok = ProcessCommand::new(program)
                    .args(argv)
                    .output()
                    .map(|out| out.status.success());

                match (ran_ok, negated) {
                    (Ok(true), false) | (Ok(false), true) | (Err(_), true) => Ok(()),
                    (Ok(false), false) => Err(RuleError::SpawnFailed {
                        command: command.clone(),
                        reason: "non-zero exit".to_string(),
                    }),
                    (Err(e), false) => Err(RuleError::SpawnFailed {
                        command: command.clone(),
                        reason: e.to_string(),
                    }),
                    (Ok(true), true) => Err(RuleError::SpawnSucceeded { command: command.clone() }),
                }
            }

            PredicateBody::EnvSet(name) => match (std::env::var_os(name).is_some(), negated) {
                (true, false) | (false, true) => Ok(()),
                (false, false) => Err(RuleError::EnvMissing { name: name.clone() }),
                (true, true) => Err(RuleError::EnvPresent { name: name.clone() }),
            },

            PredicateBody::FileExists(path) => {
                match (std::path::Path::new(path).exists(), negated) {
                    (true, false) | (false, true) => Ok(()),
                    (false, false) => Err(RuleError::FileMissing { path: path.clone() }),
                    (true, true) => Err(RuleError::FilePresent { path: path.clone() }),
                }
            }

            PredicateBody::DirExists(path) => {
                match (std::path::Path::new(path).is_dir(), negated) {
                    (true, false) | (false, true) => Ok(()),
                    (false, false) => Err(RuleError::DirMissing { path: path.clone() }),
                    (true, true) => Err(RuleError::DirPresent { path: path.clone() }),
                }
            }

            PredicateBody::UrlOk(url) => {
                let url = with_default_protocol(url);
                let reachable = self
                    .client
                    .head(&url)
                    .send()
                    .map(|resp| resp.status() == reqwest::StatusCode::OK)
                    .unwrap_or(false);

                match (reachable, negated) {
                    (true, false) | (false, true) => Ok(()),
                    (false, false) => Err(RuleError::UrlUnreachable { url }),
                    (true, true) => Err(RuleError::UrlReachable { url }),
                }
            }

            PredicateBody::ExitCode(expected) => match (exit_code == *expected, negated) {
                (true, false) | (false, true) => Ok(()),
                (false, false) => {
                    Err(RuleError::ExitMismatch { expected: *expected, actual: exit_code })
                }
                (true, true) => Err(RuleError::ExitMatched { actual: exit_code }),
            },

            PredicateBody::Substring(needle) => {
                let found = output.to_lowercase().contains(&needle.to_lowercase());
                match (found, negated) {
                    (true, false) | (false, true) => Ok(()),
                    (false, false) => Err(RuleError::SubstringMissing { needle: needle.clone() }),
                    (true, true) => Err(RuleError::SubstringPresent { needle: needle.clone() }),
                }
            }
        }
    }
}

/// Prepend `http://` when the URL has no scheme.
fn with_default_protocol(url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}
