#![forbid(unsafe_code)]

//! TOML configuration for the retrieval layer.
//!
//! ```toml
//! [guard]
//! schema_mode = "strict"
//!
//! [filter]
//! node_alias = "n"
//! param_prefix = "filter_"
//!
//! [[node_types]]
//! label = "Employee"
//! extends = ["Person"]
//! description = "Person employed by an organization"
//!
//! [[node_types]]
//! label = "Person"
//!
//! [[relationships]]
//! name = "WORKS_AT"
//! from = "Employee"
//! to = "Organization"
//! ```
//!
//! `extends` is resolved transitively: a node type carries its own label plus
//! every label of every supertype reachable from it.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::filter::compile::{DEFAULT_NODE_ALIAS, DEFAULT_PARAM_PREFIX};
use crate::filter::{FilterCompiler, FilterError};
use crate::guard::{QueryGuard, SchemaMode};
use crate::schema::{NodeType, RelationshipType, SchemaDescriptor};

/// Validated configuration: schema catalog plus guard and filter settings.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    path: Option<PathBuf>,
    schema: Arc<SchemaDescriptor>,
    schema_mode: SchemaMode,
    compiler: FilterCompiler,
}

impl RetrievalConfig {
    /// Reads and validates the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            origin: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_raw(raw)?;
        config.path = Some(path.to_path_buf());
        debug!(
            path = %path.display(),
            node_types = config.schema.node_types().len(),
            relationships = config.schema.relationships().len(),
            "loaded retrieval config"
        );
        Ok(config)
    }

    /// Parses and validates configuration held in memory.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            origin: "<inline>".to_owned(),
            source,
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let compiler = FilterCompiler::new(
            raw.filter.node_alias.as_deref().unwrap_or(DEFAULT_NODE_ALIAS),
            raw.filter
                .param_prefix
                .as_deref()
                .unwrap_or(DEFAULT_PARAM_PREFIX),
        )?;
        Ok(Self {
            path: None,
            schema: Arc::new(build_schema(&raw)?),
            schema_mode: raw.guard.schema_mode,
            compiler,
        })
    }

    /// File this configuration was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Shared schema snapshot.
    pub fn schema(&self) -> &Arc<SchemaDescriptor> {
        &self.schema
    }

    /// Configured schema-adherence mode.
    pub fn schema_mode(&self) -> SchemaMode {
        self.schema_mode
    }

    /// Filter compiler with the configured alias and prefix.
    pub fn compiler(&self) -> &FilterCompiler {
        &self.compiler
    }

    /// Standard read-only guard over the configured schema.
    pub fn guard(&self) -> QueryGuard {
        QueryGuard::read_only(Arc::clone(&self.schema), self.schema_mode)
    }
}

fn build_schema(raw: &RawConfig) -> Result<SchemaDescriptor, ConfigError> {
    let mut declared: BTreeMap<&str, &RawNodeType> = BTreeMap::new();
    for node in &raw.node_types {
        if declared.insert(node.label.as_str(), node).is_some() {
            return Err(ConfigError::DuplicateNodeType {
                label: node.label.clone(),
            });
        }
    }

    let mut schema = SchemaDescriptor::new();
    for node in &raw.node_types {
        let mut path = Vec::new();
        let mut labels = BTreeSet::new();
        collect_labels(&declared, node, &mut path, &mut labels)?;
        let mut node_type = NodeType::new(node.label.as_str()).implying(labels);
        if let Some(description) = &node.description {
            node_type = node_type.described(description.as_str());
        }
        schema = schema.with_node_type(node_type);
    }

    let mut seen = BTreeSet::new();
    for rel in &raw.relationships {
        if !seen.insert(rel.name.as_str()) {
            return Err(ConfigError::DuplicateRelationship {
                name: rel.name.clone(),
            });
        }
        for endpoint in [&rel.from, &rel.to] {
            if !declared.contains_key(endpoint.as_str()) {
                return Err(ConfigError::UnknownEndpoint {
                    relationship: rel.name.clone(),
                    label: endpoint.clone(),
                });
            }
        }
        let mut relationship = RelationshipType::new(&rel.name, &rel.from, &rel.to);
        if let Some(description) = &rel.description {
            relationship = relationship.described(description.as_str());
        }
        schema = schema.with_relationship(relationship);
    }
    Ok(schema)
}

/// Depth-first walk over `extends`; `path` holds the labels being expanded.
fn collect_labels<'a>(
    declared: &BTreeMap<&'a str, &'a RawNodeType>,
    node: &'a RawNodeType,
    path: &mut Vec<&'a str>,
    labels: &mut BTreeSet<String>,
) -> Result<(), ConfigError> {
    if let Some(start) = path.iter().position(|label| *label == node.label) {
        let mut cycle: Vec<String> = path[start..].iter().map(|l| (*l).to_owned()).collect();
        cycle.push(node.label.clone());
        return Err(ConfigError::SupertypeCycle { cycle });
    }
    labels.insert(node.label.clone());
    path.push(&node.label);
    for parent in &node.extends {
        let Some(&parent_node) = declared.get(parent.as_str()) else {
            return Err(ConfigError::UnknownSupertype {
                label: node.label.clone(),
                supertype: parent.clone(),
            });
        };
        collect_labels(declared, parent_node, path, labels)?;
    }
    path.pop();
    Ok(())
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawConfig {
    #[serde(default)]
    guard: GuardSection,
    #[serde(default)]
    filter: FilterSection,
    #[serde(default)]
    node_types: Vec<RawNodeType>,
    #[serde(default)]
    relationships: Vec<RawRelationship>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct GuardSection {
    #[serde(default)]
    schema_mode: SchemaMode,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct FilterSection {
    node_alias: Option<String>,
    param_prefix: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RawNodeType {
    label: String,
    #[serde(default)]
    extends: Vec<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RawRelationship {
    name: String,
    from: String,
    to: String,
    description: Option<String>,
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read retrieval config {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The contents are not valid TOML for this layout.
    #[error("failed to parse retrieval config {origin}: {source}")]
    Parse {
        /// File path, or `<inline>` for in-memory text.
        origin: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// A node type extends a label that is not declared.
    #[error("node type '{label}' extends undeclared type '{supertype}'")]
    UnknownSupertype {
        /// Declaring node type.
        label: String,
        /// Missing supertype.
        supertype: String,
    },
    /// `extends` links form a loop.
    #[error("node type supertypes form a cycle: {}", cycle.join(" -> "))]
    SupertypeCycle {
        /// Labels along the loop, first label repeated at the end.
        cycle: Vec<String>,
    },
    /// Two node types share a primary label.
    #[error("node type '{label}' is declared more than once")]
    DuplicateNodeType {
        /// Repeated label.
        label: String,
    },
    /// Two relationship types share a name.
    #[error("relationship type '{name}' is declared more than once")]
    DuplicateRelationship {
        /// Repeated name.
        name: String,
    },
    /// A relationship endpoint is not a declared node type.
    #[error("relationship '{relationship}' references undeclared node type '{label}'")]
    UnknownEndpoint {
        /// Relationship being declared.
        relationship: String,
        /// Missing endpoint label.
        label: String,
    },
    /// `[filter]` alias or prefix is not a plain identifier.
    #[error(transparent)]
    Filter(#[from] FilterError),
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
        [guard]
        schema_mode = "lenient"

        [filter]
        node_alias = "doc"
        param_prefix = "scope_"

        [[node_types]]
        label = "Manager"
        extends = ["Employee"]

        [[node_types]]
        label = "Employee"
        extends = ["Person"]
        description = "Person employed by an organization"

        [[node_types]]
        label = "Person"

        [[node_types]]
        label = "Organization"

        [[relationships]]
        name = "WORKS_AT"
        from = "Employee"
        to = "Organization"
    "#;

    #[test]
    fn resolves_supertypes_transitively() {
        let config = RetrievalConfig::from_toml_str(CATALOG).expect("valid config");
        let manager = config.schema().node_type("Manager").expect("declared");
        assert_eq!(
            manager.labels,
            BTreeSet::from(["Employee".into(), "Manager".into(), "Person".into()])
        );
        assert_eq!(
            config.schema().node_type("Employee").map(|t| t.description.as_str()),
            Some("Person employed by an organization")
        );
        assert_eq!(config.schema_mode(), SchemaMode::Lenient);
        assert_eq!(config.compiler().node_alias(), "doc");
        assert_eq!(config.compiler().param_prefix(), "scope_");
        assert!(config.path().is_none());
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = RetrievalConfig::from_toml_str("").expect("valid config");
        assert_eq!(config.schema_mode(), SchemaMode::Strict);
        assert_eq!(config.compiler().node_alias(), DEFAULT_NODE_ALIAS);
        assert!(config.schema().node_types().is_empty());
    }

    #[test]
    fn rejects_unknown_supertype() {
        let err = RetrievalConfig::from_toml_str(
            r#"
            [[node_types]]
            label = "Employee"
            extends = ["Human"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownSupertype { ref supertype, .. } if supertype == "Human"
        ));
    }

    #[test]
    fn rejects_supertype_cycles() {
        let err = RetrievalConfig::from_toml_str(
            r#"
            [[node_types]]
            label = "A"
            extends = ["B"]

            [[node_types]]
            label = "B"
            extends = ["A"]
            "#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "node type supertypes form a cycle: A -> B -> A"
        );
    }

    #[test]
    fn rejects_duplicates_and_unknown_endpoints() {
        let err = RetrievalConfig::from_toml_str(
            r#"
            [[node_types]]
            label = "Person"

            [[node_types]]
            label = "Person"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateNodeType { .. }));

        let err = RetrievalConfig::from_toml_str(
            r#"
            [[node_types]]
            label = "Person"

            [[relationships]]
            name = "OWNS"
            from = "Person"
            to = "Car"
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownEndpoint { ref label, .. } if label == "Car"
        ));
    }

    #[test]
    fn rejects_bad_filter_settings() {
        let err = RetrievalConfig::from_toml_str(
            r#"
            [filter]
            node_alias = "n) OR (true"
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Filter(FilterError::InvalidNodeAlias { .. })
        ));
    }

    #[test]
    fn rejects_unknown_schema_mode() {
        let err = RetrievalConfig::from_toml_str("[guard]\nschema_mode = \"loose\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
