//! Resource schema definitions.
//!
//! Defines the YAML structure of resource documents.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A document of resources, as loaded from one file or URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceDocument {
    /// Resources declared by this document
    pub resources: Vec<Resource>,
}

/// A named node of the resource graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique key of this resource
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Description shown by `show`, `index`, and `search`
    #[serde(default)]
    pub desc: String,

    /// Category used by the `category` listing
    #[serde(default)]
    pub category: String,

    /// Ids this resource depends on, in declaration order
    #[serde(default)]
    pub requires: Vec<String>,

    /// Steps executed by `run`, in declaration order
    #[serde(default)]
    pub run: Vec<RunStep>,
}

/// A step of a resource's `run` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStep {
    /// Name of the step
    #[serde(default)]
    pub name: String,

    /// Shell command to execute; empty means the step only carries rules
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub exec: String,

    /// Rules that, when any passes, skip this step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<Vec<Rule>>,

    /// Rules asserted right after the command ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<Vec<Rule>>,

    /// Rules asserted after the env file is re-sourced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<Vec<Rule>>,

    /// Environment variables materialised before the command runs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

/// An environment variable declaration.
///
/// Exactly one of `exec`, `input`, `file`, or `value` should be set; when
/// several are, precedence is `exec > input > file > value`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name
    pub name: String,

    /// Literal value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Shell command whose captured output becomes the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<String>,

    /// Prompt printed before reading one token from stdin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// Path the variable points at; a `$NAME` prefix resolves the path
    /// through the environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// A rule entry: either a predicate string or a nested `expect:` group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Rule {
    /// A predicate string, e.g. `"CMD:git"` or `"!0"`
    Spec(String),

    /// A group of rules under an `expect:` key
    Group {
        /// Rules of the group, evaluated in order
        expect: Vec<Rule>,
    },
}

// Hand-written so bare YAML scalars (`- 0`, `- true`) land in `Spec` as
// their string rendering rather than failing the untagged string match.
impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let value = serde_yaml::Value::deserialize(deserializer)?;
        match value {
            serde_yaml::Value::String(s) => Ok(Rule::Spec(s)),
            serde_yaml::Value::Number(n) => Ok(Rule::Spec(n.to_string())),
            serde_yaml::Value::Bool(b) => Ok(Rule::Spec(b.to_string())),
            serde_yaml::Value::Mapping(mut mapping) => {
                let expect = mapping
                    .remove("expect")
                    .ok_or_else(|| D::Error::custom("rule group requires an 'expect' key"))?;
                let rules: Vec<Rule> =
                    serde_yaml::from_value(expect).map_err(D::Error::custom)?;
                Ok(Rule::Group { expect: rules })
            }
            other => Err(D::Error::custom(format!("unsupported rule entry: {other:?}"))),
        }
    }
}

/// Parse a resource document from a YAML string.
pub fn parse_document(content: &str) -> anyhow::Result<ResourceDocument> {
    let document: ResourceDocument = serde_yaml::from_str(content)?;
    validate_document(&document)?;
    Ok(document)
}

/// Serialise resources back to a YAML document string.
pub fn render_document(resources: &[Resource]) -> anyhow::Result<String> {
    let document = ResourceDocument { resources: resources.to_vec() };
    Ok(serde_yaml::to_string(&document)?)
}

static VAR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{(\w+)\}").unwrap());

/// Validate a document for common errors.
fn validate_document(document: &ResourceDocument) -> anyhow::Result<()> {
    for (i, resource) in document.resources.iter().enumerate() {
        if resource.id.is_empty() {
            anyhow::bail!("resource {} has no id", i + 1);
        }

        for step in &resource.run {
            if step.name.is_empty() {
                anyhow::bail!("resource '{}' has a step without a name", resource.id);
            }

            // ${VAR} references are resolved at run time against the
            // process environment; flag the ones that are unset now.
            for cap in VAR_PATTERN.captures_iter(&step.exec) {
                let var_name = &cap[1];
                if std::env::var_os(var_name).is_none() {
                    tracing::debug!(
                        resource = resource.id,
                        step = step.name,
                        variable = var_name,
                        "Variable not currently set in the environment"
                    );
                }
            }
        }
    }

    Ok(())
}
