//! Dependency graph algorithms.
//!
//! Pure traversals over the `id -> requires` adjacency map: forward and
//! reverse path listings, root-to-leaf chains, and the post-order
//! topological stack the run engine executes. Every traversal carries a
//! visited set scoped to the call, so cyclic inputs terminate.

use std::collections::{HashMap, HashSet};

/// Traversals over a resource adjacency map.
#[derive(Debug)]
pub struct DependencyGraph<'a> {
    dependencies: &'a HashMap<String, Vec<String>>,
}

impl<'a> DependencyGraph<'a> {
    /// Create a graph over the given adjacency map.
    pub fn new(dependencies: &'a HashMap<String, Vec<String>>) -> Self {
        Self { dependencies }
    }

    /// List every discovered dependency path of `id`, one line per node
    /// visit, formatted `root -> a -> b`.
    pub fn direct_dependencies(&self, id: &str) -> Vec<String> {
        let mut lines = Vec::new();
        let mut visited = HashSet::new();
        let mut seen_paths = HashSet::new();
        let mut path = Vec::new();

        self.walk_paths(id, self.dependencies, &mut visited, &mut seen_paths, &mut path, &mut lines);
        lines
    }

    /// List every path of the inverted graph: the resources that
    /// (transitively) require `id`.
    pub fn reverse_dependencies(&self, id: &str) -> Vec<String> {
        let inverted = self.invert();

        let mut lines = Vec::new();
        let mut visited = HashSet::new();
        let mut seen_paths = HashSet::new();
        let mut path = Vec::new();

        self.walk_paths(id, &inverted, &mut visited, &mut seen_paths, &mut path, &mut lines);
        lines
    }

    /// List each root-to-leaf requirement chain of `id`, formatted
    /// bottom-up as `id <- d1 <- d2`.
    pub fn tree(&self, id: &str) -> Vec<String> {
        let mut lines = Vec::new();
        let mut visited = HashSet::new();
        let mut path = Vec::new();

        self.walk_chains(id, &mut visited, &mut path, &mut lines);
        lines
    }

    /// List the topological stack of `id`, leaves first, one id per line.
    pub fn tree_top_down(&self, id: &str) -> Vec<String> {
        let mut visited = HashSet::new();
        self.build_stack(id, &mut visited)
    }

    /// Build the post-order execution stack for `id`.
    ///
    /// Requirements are visited in declaration order and recursed before
    /// `id` itself is appended, so every dependency precedes its
    /// dependents. The visited set is shared by the caller across sibling
    /// calls: each id appears at most once per set, and cycles terminate.
    pub fn build_stack(&self, id: &str, visited: &mut HashSet<String>) -> Vec<String> {
        if visited.contains(id) {
            return Vec::new();
        }
        visited.insert(id.to_string());

        let mut stack = Vec::new();
        if let Some(requires) = self.dependencies.get(id) {
            for dep in requires {
                stack.extend(self.build_stack(dep, visited));
            }
        }
        stack.push(id.to_string());
        stack
    }

    /// Depth-first path listing. A node is entered once per call; a path
    /// string already emitted is skipped to avoid duplicate lines.
    fn walk_paths(
        &self,
        id: &str,
        dependencies: &HashMap<String, Vec<String>>,
        visited: &mut HashSet<String>,
        seen_paths: &mut HashSet<String>,
        path: &mut Vec<String>,
        lines: &mut Vec<String>,
    ) {
        if visited.contains(id) {
            return;
        }
        visited.insert(id.to_string());
        path.push(id.to_string());

        let current = path.join(" -> ");
        if seen_paths.contains(&current) {
            path.pop();
            return;
        }
        seen_paths.insert(current.clone());
        lines.push(current);

        if let Some(requires) = dependencies.get(id) {
            for dep in requires {
                self.walk_paths(dep, dependencies, visited, seen_paths, path, lines);
            }
        }

        path.pop();
    }

    /// Depth-first chain listing with backtracking: a line is emitted for
    /// every root-to-leaf path; nodes already on the current path are not
    /// re-entered, so cycles terminate.
    fn walk_chains(
        &self,
        id: &str,
        visited: &mut HashSet<String>,
        path: &mut Vec<String>,
        lines: &mut Vec<String>,
    ) {
        if visited.contains(id) {
            return;
        }
        visited.insert(id.to_string());
        path.push(id.to_string());

        match self.dependencies.get(id) {
            Some(requires) if !requires.is_empty() => {
                for dep in requires {
                    self.walk_chains(dep, visited, path, lines);
                }
            }
            _ => lines.push(path.join(" <- ")),
        }

        path.pop();
        visited.remove(id);
    }

    /// Invert the adjacency map: `dep -> [nodes that require dep]`.
    fn invert(&self) -> HashMap<String, Vec<String>> {
        let mut inverted: HashMap<String, Vec<String>> = HashMap::new();
        for (id, requires) in self.dependencies {
            for dep in requires {
                inverted.entry(dep.clone()).or_default().push(id.clone());
            }
        }
        inverted
    }
}
