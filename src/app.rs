//! Application facade.
//!
//! Owns the resource store, the shell session, and the HTTP client, and
//! exposes one `handle_*` entry point per CLI sub-command.

use anyhow::Context;

use crate::core::ShellSession;
use crate::engine::Runner;
use crate::graph::DependencyGraph;
use crate::resource::ResourceStore;
use crate::rules::{CancelToken, Evaluator};
use crate::search::{format_resource, fuzzy_search};

/// The resrun application.
#[derive(Debug)]
pub struct App {
    store: ResourceStore,
    session: ShellSession,
    client: reqwest::blocking::Client,
    cancel: CancelToken,
}

impl App {
    /// Create an application with an empty store and a fresh shell
    /// session.
    pub fn new() -> anyhow::Result<Self> {
        // Redirects stay disabled: a resource URL or URL: rule that
        // answers 3xx is not a 200.
        let client = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            store: ResourceStore::new(),
            session: ShellSession::new().context("failed to start shell session")?,
            client,
            cancel: CancelToken::new(),
        })
    }

    /// The cancellation token observed by persistent rules.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Load a resource document (path or URL) into the store.
    pub fn load(&mut self, uri: &str) -> anyhow::Result<()> {
        self.store.load(uri, &self.client)
    }

    /// Access the loaded resources.
    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    /// `depends`: print every dependency path of each id.
    pub fn handle_depends(&self, ids: &[String]) -> anyhow::Result<()> {
        let graph = DependencyGraph::new(self.store.dependencies());
        for id in ids {
            tracing::debug!(id, "Listing direct dependencies");
            for line in graph.direct_dependencies(id) {
                println!("{line}");
            }
        }
        Ok(())
    }

    /// `rdepends`: print every reverse dependency path of each id.
    pub fn handle_rdepends(&self, ids: &[String]) -> anyhow::Result<()> {
        let graph = DependencyGraph::new(self.store.dependencies());
        for id in ids {
            tracing::debug!(id, "Listing reverse dependencies");
            for line in graph.reverse_dependencies(id) {
                println!("{line}");
            }
        }
        Ok(())
    }

    /// `tree`: print each requirement chain of each id, bottom-up.
    pub fn handle_tree(&self, ids: &[String]) -> anyhow::Result<()> {
        let graph = DependencyGraph::new(self.store.dependencies());
        for id in ids {
            tracing::debug!(id, "Listing dependency tree");
            for line in graph.tree(id) {
                println!("{line}");
            }
        }
        Ok(())
    }

    /// `tree-list`: print the topological stack of each id, leaves first.
    pub fn handle_tree_list(&self, ids: &[String]) -> anyhow::Result<()> {
        let graph = DependencyGraph::new(self.store.dependencies());
        for id in ids {
            tracing::debug!(id, "Listing top-down dependency tree");
            for line in graph.tree_top_down(id) {
                println!("{line}");
            }
        }
        Ok(())
    }

    /// `show`: print the entry block of each id; unknown ids are fatal.
    pub fn handle_show(&self, ids: &[String]) -> anyhow::Result<()> {
        for id in ids {
            let resource = self
                .store
                .find(id)
                .with_context(|| format!("resource '{id}' not found"))?;
            println!("{}", format_resource(resource));
        }
        Ok(())
    }

    /// `search`: fuzzy-find resources and print their entry blocks.
    pub fn handle_search(&self, query: &str, keys: &[String]) -> anyhow::Result<()> {
        tracing::debug!(query, "Performing fuzzy search");
        let matches = fuzzy_search(self.store.resources(), query, keys)?;
        for resource in matches {
            println!("{}\n", format_resource(resource));
        }
        Ok(())
    }

    /// `category`: print the id of every resource in the given
    /// categories.
    pub fn handle_category(&self, categories: &[String]) -> anyhow::Result<()> {
        for resource in self.store.resources() {
            for category in categories {
                if &resource.category == category {
                    tracing::debug!(category, "Listing resource in category");
                    println!("📦 {}", resource.id);
                }
            }
        }
        Ok(())
    }

    /// `index`: print every loaded resource, blocks separated by `---`.
    pub fn handle_index(&self) -> anyhow::Result<()> {
        let mut first = true;
        for resource in self.store.resources() {
            if !first {
                println!("---");
            }
            first = false;
            println!("{}", format_resource(resource));
        }
        Ok(())
    }

    /// `run`: execute each id's stack through the run engine.
    pub fn handle_run(&self, ids: &[String]) -> anyhow::Result<()> {
        let evaluator = Evaluator::new(self.client.clone(), self.cancel.clone());
        let runner = Runner::new(&self.store, &self.session, evaluator);
        runner.run(ids)
    }
}
