#![forbid(unsafe_code)]

//! Read-only catalog of declared node types and relationship types.
//!
//! The descriptor is built once (from code or from [`crate::config`]) and then
//! shared immutably, typically behind an `Arc`, by every validator invocation.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Declared node type with the full label set it implies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeType {
    /// Primary label.
    pub label: String,
    /// Every label a node of this type carries (primary label included).
    pub labels: BTreeSet<String>,
    /// Free-form description surfaced to agents.
    pub description: String,
}

impl NodeType {
    /// Declares a type whose only label is `label`.
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            labels: BTreeSet::from([label.clone()]),
            label,
            description: String::new(),
        }
    }

    /// Adds supertype labels carried by every node of this type.
    pub fn implying<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Sets the description.
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Declared relationship type and its endpoint types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RelationshipType {
    /// Relationship type name as written in queries.
    pub name: String,
    /// Primary label of the source node type.
    pub from: String,
    /// Primary label of the target node type.
    pub to: String,
    /// Free-form description surfaced to agents.
    pub description: String,
}

impl RelationshipType {
    /// Declares `(from)-[:name]->(to)`.
    pub fn new(name: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from: from.into(),
            to: to.into(),
            description: String::new(),
        }
    }

    /// Sets the description.
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Immutable schema snapshot checked by the adherence validator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SchemaDescriptor {
    node_types: Vec<NodeType>,
    relationships: Vec<RelationshipType>,
}

impl SchemaDescriptor {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node type.
    pub fn with_node_type(mut self, node_type: NodeType) -> Self {
        self.node_types.push(node_type);
        self
    }

    /// Registers a relationship type.
    pub fn with_relationship(mut self, relationship: RelationshipType) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Declared node types in registration order.
    pub fn node_types(&self) -> &[NodeType] {
        &self.node_types
    }

    /// Declared relationship types in registration order.
    pub fn relationships(&self) -> &[RelationshipType] {
        &self.relationships
    }

    /// Looks up a node type by primary label.
    pub fn node_type(&self, label: &str) -> Option<&NodeType> {
        self.node_types.iter().find(|ty| ty.label == label)
    }

    /// Looks up a relationship type by name.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipType> {
        self.relationships.iter().find(|rel| rel.name == name)
    }

    /// Union of every node type's implied label set.
    pub fn known_labels(&self) -> BTreeSet<&str> {
        self.node_types
            .iter()
            .flat_map(|ty| ty.labels.iter().map(String::as_str))
            .collect()
    }

    /// Names of all declared relationship types.
    pub fn relationship_names(&self) -> BTreeSet<&str> {
        self.relationships
            .iter()
            .map(|rel| rel.name.as_str())
            .collect()
    }
}

/// Compact listing suitable for an agent's system prompt.
impl fmt::Display for SchemaDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Node types:")?;
        for ty in &self.node_types {
            let labels: Vec<&str> = ty.labels.iter().map(String::as_str).collect();
            write!(f, "- {} (labels: {})", ty.label, labels.join(":"))?;
            if !ty.description.is_empty() {
                write!(f, ": {}", ty.description)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "Relationship types:")?;
        for rel in &self.relationships {
            write!(f, "- (:{})-[:{}]->(:{})", rel.from, rel.name, rel.to)?;
            if !rel.description.is_empty() {
                write!(f, ": {}", rel.description)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
