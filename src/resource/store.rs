//! Resource store.
//!
//! Holds every loaded resource plus the `id -> requires` adjacency map.
//! Loading appends; it never deduplicates. The adjacency entry for an id
//! is overwritten on reload, so the last-loaded document wins dependency
//! lookups while earlier duplicates stay visible in listings.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

use super::schema::{parse_document, render_document, Resource};

/// In-memory collection of resources and their dependency map.
#[derive(Debug, Default)]
pub struct ResourceStore {
    /// Every loaded resource, in load order (duplicates included)
    resources: Vec<Resource>,

    /// `id -> requires` in declaration order; last load wins per id
    dependencies: HashMap<String, Vec<String>>,
}

impl ResourceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a resource document from a filesystem path or an
    /// `http(s)://` URL and merge it into the store.
    pub fn load(&mut self, uri: &str, client: &reqwest::blocking::Client) -> anyhow::Result<()> {
        tracing::debug!(uri, "Loading resource document");

        let content = if uri.starts_with("http://") || uri.starts_with("https://") {
            fetch_document(uri, client)?
        } else {
            std::fs::read_to_string(uri)
                .with_context(|| format!("failed to read resource file {uri}"))?
        };

        self.merge_str(&content).with_context(|| format!("failed to parse {uri}"))
    }

    /// Merge a YAML document string into the store.
    pub fn merge_str(&mut self, content: &str) -> anyhow::Result<()> {
        let document = parse_document(content)?;

        for resource in document.resources {
            self.dependencies.insert(resource.id.clone(), resource.requires.clone());
            self.resources.push(resource);
        }

        Ok(())
    }

    /// Serialise the current resource list to a YAML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let rendered = render_document(&self.resources)?;
        std::fs::write(path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    /// All resources in load order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// The `id -> requires` adjacency map.
    pub fn dependencies(&self) -> &HashMap<String, Vec<String>> {
        &self.dependencies
    }

    /// Every resource whose id matches, in load order.
    pub fn find_all(&self, id: &str) -> Vec<&Resource> {
        self.resources.iter().filter(|r| r.id == id).collect()
    }

    /// The first resource whose id matches.
    pub fn find(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Number of loaded resources, duplicates included.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Fetch a resource document over HTTP. Any status other than 200 is
/// fatal.
fn fetch_document(url: &str, client: &reqwest::blocking::Client) -> anyhow::Result<String> {
    let response =
        client.get(url).send().with_context(|| format!("failed to fetch {url}"))?;

    if response.status() != reqwest::StatusCode::OK {
        anyhow::bail!("fetching {url} returned status {}", response.status());
    }

    response.text().with_context(|| format!("failed to read body of {url}"))
}
