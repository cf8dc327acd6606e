//! Run engine.
//!
//! Resolves each requested resource to its topological stack and walks
//! the stack's resources in order, executing their steps through the
//! shell session while honouring `skip`, `check`, and `expect` rules.

use std::collections::{HashMap, HashSet};

use anyhow::Context;

use crate::core::{source_env_file, ShellSession};
use crate::engine::environment::apply_env_vars;
use crate::engine::steplog::{StepLog, StepLogger};
use crate::graph::DependencyGraph;
use crate::resource::{Resource, ResourceStore, RunStep};
use crate::rules::Evaluator;
use crate::ENV_FILE_VAR;

/// Key of a step's skip decision: `(step name, stack node)`.
type StepKey = (String, String);

/// Orchestrates the execution of resource run steps.
#[derive(Debug)]
pub struct Runner<'a> {
    store: &'a ResourceStore,
    session: &'a ShellSession,
    evaluator: Evaluator,
}

impl<'a> Runner<'a> {
    /// Create a runner over the given store and shell session.
    pub fn new(store: &'a ResourceStore, session: &'a ShellSession, evaluator: Evaluator) -> Self {
        Self { store, session, evaluator }
    }

    /// Run every requested resource after its transitive requirements.
    ///
    /// One visited set spans all requested ids, so a resource shared by
    /// two stacks executes once. Any fatal step error aborts the whole
    /// run; the logger is sealed on the way out either way.
    pub fn run(&self, ids: &[String]) -> anyhow::Result<()> {
        let logger = StepLogger::new();
        let graph = DependencyGraph::new(self.store.dependencies());
        let mut visited = HashSet::new();

        let outcome = self.run_stacks(&graph, ids, &mut visited, &logger);
        logger.close();
        outcome
    }

    fn run_stacks(
        &self,
        graph: &DependencyGraph<'_>,
        ids: &[String],
        visited: &mut HashSet<String>,
        logger: &StepLogger,
    ) -> anyhow::Result<()> {
        for id in ids {
            let stack = graph.build_stack(id, visited);
            for node in &stack {
                // Duplicate ids keep every entry in the store; each one
                // resolves in load order.
                for resource in self.store.find_all(node) {
                    self.resolve(node, resource, logger)?;
                }
            }
        }
        Ok(())
    }

    /// Execute the steps of one resolved resource node.
    fn resolve(&self, node: &str, resource: &Resource, logger: &StepLogger) -> anyhow::Result<()> {
        tracing::info!(node, "Resolving dependency");

        if resource.run.is_empty() {
            tracing::info!(node, "No run steps found for resource");
            return Ok(());
        }

        // Skip decisions are taken for every step up front, against the
        // output accumulated so far, then the steps run in declared order.
        let skip = self.skip_pass(&resource.run, node, logger);

        for step in &resource.run {
            self.run_step(step, node, &skip, logger)?;
        }
        Ok(())
    }

    /// Evaluate the `skip` rules of every step, sequentially.
    ///
    /// A step is skipped as soon as any one of its skip rules passes;
    /// rule failures only mean "do not skip".
    fn skip_pass(
        &self,
        steps: &[RunStep],
        node: &str,
        logger: &StepLogger,
    ) -> HashMap<StepKey, bool> {
        let mut skip = HashMap::new();

        for step in steps {
            let rules = step.skip.as_deref().unwrap_or_default();
            let output = logger.messages_string();

            let skipped = rules
                .iter()
                .any(|rule| self.evaluator.evaluate_all(std::slice::from_ref(rule), &output, 0).is_ok());

            if skipped {
                tracing::debug!(step = step.name, node, "Skipping step due to skip condition");
            } else {
                tracing::debug!(step = step.name, node, "Not skipping step");
            }
            skip.insert((step.name.clone(), node.to_string()), skipped);
        }

        skip
    }

    /// Execute one step: skipped note, or exec + check + expect.
    fn run_step(
        &self,
        step: &RunStep,
        node: &str,
        skip: &HashMap<StepKey, bool>,
        logger: &StepLogger,
    ) -> anyhow::Result<()> {
        let key = (step.name.clone(), node.to_string());
        if skip.get(&key).copied().unwrap_or(false) {
            logger.add(StepLog {
                resource_id: node.to_string(),
                step_name: step.name.clone(),
                command: step.exec.clone(),
                message: "Step skipped.".to_string(),
                target: node.to_string(),
            });
            tracing::info!(step = step.name, node, "Step skipped");
            return Ok(());
        }

        let mut exit_code = 0;
        if !step.exec.is_empty() {
            exit_code = self
                .execute_command(step, node, logger)
                .with_context(|| format!("execution failed for step '{}' of resource '{node}'", step.name))?;
        }

        if let Some(check) = step.check.as_deref() {
            let output = logger.messages_string();
            self.evaluator.evaluate_all(check, &output, exit_code).with_context(|| {
                format!("check failed for resource '{node}' step '{}'", step.name)
            })?;
        }

        if let Some(expect) = step.expect.as_deref() {
            // Later expectations may assert on variables exported through
            // the env file by earlier steps; rehydrate before evaluating.
            let env_file = std::env::var(ENV_FILE_VAR).unwrap_or_default();
            source_env_file(std::path::Path::new(&env_file)).with_context(|| {
                format!("failed to source environment file for step '{}'", step.name)
            })?;

            let output = logger.messages_string();
            self.evaluator.evaluate_all(expect, &output, exit_code).with_context(|| {
                format!("expectation failed for '{}'", step.name)
            })?;
        }

        Ok(())
    }

    /// Materialise the step's env, run its command, and log the result.
    ///
    /// Returns the exit code; non-zero is fatal.
    fn execute_command(
        &self,
        step: &RunStep,
        node: &str,
        logger: &StepLogger,
    ) -> anyhow::Result<i32> {
        tracing::info!(command = step.exec, node, step = step.name, "Executing command");

        apply_env_vars(self.session, &step.env)
            .with_context(|| format!("failed to set environment variables for step '{}'", step.name))?;

        let result = self.session.execute(&step.exec).wait();

        logger.add(StepLog {
            resource_id: node.to_string(),
            step_name: step.name.clone(),
            command: step.exec.clone(),
            message: result.output.clone(),
            target: node.to_string(),
        });

        if let Some(error) = result.error {
            anyhow::bail!("failed to execute command '{}': {error}", step.exec);
        }
        if result.exit_code != 0 {
            anyhow::bail!("command '{}' exited with status {}", step.exec, result.exit_code);
        }

        Ok(result.exit_code)
    }
}
