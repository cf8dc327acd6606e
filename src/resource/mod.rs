//! Resource model and store.

mod schema;
mod store;

pub use schema::{parse_document, render_document, EnvVar, Resource, ResourceDocument, Rule, RunStep};
pub use store::ResourceStore;
