#![allow(clippy::all)]

use std::fs;

use graph_retrieval::{
    filter::FilterExpr,
    guard::{SchemaMode, ValidationError},
    ConfigError, RetrievalConfig, RetrievalError,
};

const CATALOG: &str = r#"
[guard]
schema_mode = "strict"

[filter]
node_alias = "doc"
param_prefix = "f_"

[[node_types]]
label = "Document"
description = "Uploaded source document"

[[node_types]]
label = "Chunk"
description = "Embedded slice of a document"

[[node_types]]
label = "Contract"
extends = ["LegalDocument"]

[[node_types]]
label = "LegalDocument"
extends = ["Document"]

[[relationships]]
name = "PART_OF"
from = "Chunk"
to = "Document"
description = "Chunk belongs to a document"
"#;

#[test]
fn load_builds_guard_and_compiler_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("retrieval.toml");
    fs::write(&path, CATALOG)?;

    let config = RetrievalConfig::load(&path)?;
    assert_eq!(config.path(), Some(path.as_path()));
    assert_eq!(config.schema_mode(), SchemaMode::Strict);

    let contract = config.schema().node_type("Contract").expect("declared");
    assert!(contract.labels.contains("Document"));
    assert!(contract.labels.contains("LegalDocument"));
    assert_eq!(
        config.schema().relationship("PART_OF").map(|r| r.to.as_str()),
        Some("Document")
    );

    let guard = config.guard();
    guard.check("MATCH (c:Chunk)-[:PART_OF]->(d:Document) RETURN c")?;
    let err = guard
        .check("MATCH (c:Chunk)-[:CITES]->(d:Document) RETURN c")
        .unwrap_err();
    assert!(matches!(err, ValidationError::SchemaViolation { .. }));

    let compiled = config
        .compiler()
        .compile(Some(&FilterExpr::eq("status", "signed")))?;
    assert_eq!(compiled.clause, "doc.status = $f_0");

    let listing = config.schema().to_string();
    assert!(listing.contains("Contract"));
    assert!(listing.contains("PART_OF"));
    Ok(())
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.toml");
    let err = RetrievalConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn malformed_file_is_a_parse_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[[node_types]]\ndescription = \"no label\"\n")?;

    let err = RetrievalConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));

    let wrapped = RetrievalError::from(err);
    assert_eq!(wrapped.code(), "ConfigError");
    assert!(wrapped.to_string().starts_with("config error: failed to parse retrieval config"));
    Ok(())
}
