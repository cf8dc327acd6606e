//! Fuzzy search over resource fields.
//!
//! Builds one haystack per resource from the selected fields and matches
//! the query with the nucleo fuzzy matcher.

use std::sync::Arc;

use nucleo::{
    pattern::{CaseMatching, Normalization},
    Config, Nucleo,
};

use crate::resource::Resource;

/// Fields a search may select. Unknown keys are ignored.
pub const SEARCH_KEYS: [&str; 4] = ["id", "name", "desc", "category"];

/// Find resources whose selected fields fuzzily match `query`.
///
/// `keys` picks the haystack fields; an empty list selects all of
/// [`SEARCH_KEYS`]. Returns matches in best-match order. Zero matches is
/// an error.
pub fn fuzzy_search<'a>(
    resources: &'a [Resource],
    query: &str,
    keys: &[String],
) -> anyhow::Result<Vec<&'a Resource>> {
    let selected: Vec<&str> = if keys.is_empty() {
        SEARCH_KEYS.to_vec()
    } else {
        keys.iter().map(String::as_str).collect()
    };

    let mut matcher = Nucleo::<usize>::new(Config::DEFAULT, Arc::new(|| {}), None, 1);
    let injector = matcher.injector();

    for (index, resource) in resources.iter().enumerate() {
        let haystack = haystack_for(resource, &selected);
        injector.push(index, move |_, cols| {
            cols[0] = haystack.as_str().into();
        });
    }

    matcher.pattern.reparse(0, query, CaseMatching::Ignore, Normalization::Smart, false);

    // Tick until the matcher settles.
    let mut status = matcher.tick(10);
    while status.running {
        status = matcher.tick(100);
    }

    let snapshot = matcher.snapshot();
    let matches: Vec<&Resource> = (0..snapshot.matched_item_count())
        .filter_map(|i| snapshot.get_matched_item(i).map(|item| &resources[*item.data]))
        .collect();

    if matches.is_empty() {
        anyhow::bail!("no matches found for query: {query}");
    }

    Ok(matches)
}

/// Concatenate the selected fields of a resource into its haystack.
fn haystack_for(resource: &Resource, keys: &[&str]) -> String {
    let mut haystack = String::new();
    for key in keys {
        let field = match *key {
            "id" => &resource.id,
            "name" => &resource.name,
            "desc" => &resource.desc,
            "category" => &resource.category,
            _ => continue,
        };
        haystack.push_str(field);
        haystack.push(' ');
    }
    haystack
}

/// Format a resource as the emoji entry block used by `show`, `index`,
/// and `search`.
pub fn format_resource(resource: &Resource) -> String {
    format!(
        "📦 Id: {}\n📛 Name: {}\n📝 Description: {}\n🏷️  Category: {}\n🔗 Requirements: [{}]",
        resource.id,
        resource.name,
        resource.desc,
        resource.category,
        resource.requires.join(", ")
    )
}
