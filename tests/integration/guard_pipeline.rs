#![allow(clippy::all)]

use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, Once};

use graph_retrieval::{
    filter::{FilterCompiler, FilterExpr, Narrowing, Parameters},
    guard::{NormalizedQuery, QueryGuard, SchemaMode, ValidationError},
    schema::{NodeType, RelationshipType, SchemaDescriptor},
    tool::{QueryExecutor, ReadQueryTool, ToolError},
    Value,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("graph_retrieval=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init();
    });
}

fn schema() -> Arc<SchemaDescriptor> {
    Arc::new(
        SchemaDescriptor::new()
            .with_node_type(NodeType::new("Person"))
            .with_node_type(NodeType::new("Employee").implying(["Person"]))
            .with_node_type(NodeType::new("Organization"))
            .with_node_type(NodeType::new("Chunk"))
            .with_relationship(RelationshipType::new("WORKS_AT", "Employee", "Organization")),
    )
}

#[derive(Debug)]
struct Offline;

impl fmt::Display for Offline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("offline")
    }
}

impl std::error::Error for Offline {}

/// Records what would have been sent to the database.
#[derive(Default)]
struct CapturingExecutor {
    sent: RefCell<Vec<(String, Parameters)>>,
}

impl QueryExecutor for &CapturingExecutor {
    type Rows = ();
    type Error = Offline;

    fn execute(&self, query: &NormalizedQuery, parameters: &Parameters) -> Result<(), Offline> {
        self.sent
            .borrow_mut()
            .push((query.to_string(), parameters.clone()));
        Ok(())
    }
}

#[test]
fn compiled_filter_keeps_hostile_values_out_of_query_text() {
    init_tracing();
    let executor = CapturingExecutor::default();
    let tool = ReadQueryTool::new(QueryGuard::read_only(schema(), SchemaMode::Strict), &executor);

    let hostile = "x'}) DETACH DELETE n //";
    let filter = FilterExpr::and([
        FilterExpr::eq("name", hostile),
        FilterExpr::contains_ci("title", "ENGINEER"),
    ]);
    let compiled = FilterCompiler::default()
        .compile(Some(&filter))
        .expect("filter compiles");
    let query = format!("MATCH (n:Person) {} RETURN n", compiled.where_clause());

    tool.run(&query, &compiled.parameters).expect("guard accepts");

    let sent = executor.sent.borrow();
    let (text, params) = &sent[0];
    assert_eq!(
        text,
        "MATCH (n:Person) WHERE (n.name = $filter_0) AND (toLower(n.title) CONTAINS $filter_1) RETURN n"
    );
    assert!(!text.contains(hostile));
    assert_eq!(params["filter_0"], Value::from(hostile));
    assert_eq!(params["filter_1"], Value::from("engineer"));
}

#[test]
fn narrowed_view_scopes_agent_filter() {
    init_tracing();
    let executor = CapturingExecutor::default();
    let tool = ReadQueryTool::new(QueryGuard::read_only(schema(), SchemaMode::Strict), &executor);

    let agent_filter = FilterExpr::from_json(
        r#"{"op": "or", "children": [
            {"op": "starts_with", "key": "text", "value": "Revenue"},
            {"op": "has_any_label", "labels": ["Chunk"]}
        ]}"#,
    )
    .expect("agent filter parses");
    let compiler = FilterCompiler::new("c", "scope_").expect("valid settings");
    let compiled = Narrowing::new()
        .with(FilterExpr::eq("document_id", "doc-42"))
        .compile(&compiler, Some(agent_filter))
        .expect("filter compiles");

    assert_eq!(
        compiled.clause,
        "(c.document_id = $scope_0) AND ((c.text STARTS WITH $scope_1) OR \
         (any(label IN labels(c) WHERE label IN $scope_2)))"
    );

    let query = format!("MATCH (c:Chunk)\\nWHERE {}\\nRETURN c", compiled.clause);
    tool.run(&query, &compiled.parameters).expect("guard accepts");
    let sent = executor.sent.borrow();
    assert!(sent[0].0.starts_with("MATCH (c:Chunk)\nWHERE "));
    assert_eq!(sent[0].1.len(), 3);
}

#[test]
fn strict_and_lenient_guards_differ_only_on_schema_drift() {
    init_tracing();
    let strict = QueryGuard::read_only(schema(), SchemaMode::Strict);
    let lenient = QueryGuard::read_only(schema(), SchemaMode::Lenient);

    let drifted = "MATCH (r:Robot)-[:BUILT_BY]->(o:Organization) RETURN r";
    match strict.check(drifted) {
        Err(ValidationError::SchemaViolation {
            unknown_labels,
            unknown_relationships,
            ..
        }) => {
            assert!(unknown_labels.contains("Robot"));
            assert!(unknown_relationships.contains("BUILT_BY"));
        }
        other => panic!("expected schema violation, got {other:?}"),
    }
    assert!(lenient.check(drifted).is_ok());

    for guard in [&strict, &lenient] {
        let err = guard
            .check("MATCH (p:Person) MERGE (p)-[:WORKS_AT]->(:Organization)")
            .unwrap_err();
        assert_eq!(err.code(), "MutationRejected");
    }
}

#[test]
fn implied_labels_pass_strict_mode() {
    let guard = QueryGuard::read_only(schema(), SchemaMode::Strict);
    assert!(guard
        .check("MATCH (e:Employee:Person)-[:WORKS_AT]->(o:Organization) RETURN e, o")
        .is_ok());
}

#[test]
fn rejection_message_is_actionable() {
    let executor = CapturingExecutor::default();
    let tool = ReadQueryTool::new(QueryGuard::read_only(schema(), SchemaMode::Strict), &executor);

    let err = tool
        .run(
            "MATCH (p:Person) CALL apoc.export.json.data([p], [], '/tmp/people.json', {}) \
             YIELD file RETURN file",
            &Parameters::new(),
        )
        .unwrap_err();
    let ToolError::Rejected(reason) = &err else {
        panic!("expected a rejection, got {err:?}");
    };
    assert_eq!(
        reason,
        &ValidationError::WriteProcedureRejected {
            procedure: "apoc.export.".into()
        }
    );
    assert_eq!(
        err.tool_message(),
        "[MutationRejected] query calls the write procedure 'apoc.export.'; only read-only \
         procedures are allowed. Rewrite the query and call the tool again."
    );
    assert!(executor.sent.borrow().is_empty());

    let err = tool
        .run("PROFILE MATCH (n:Person) RETURN n", &Parameters::new())
        .unwrap_err();
    assert!(err
        .tool_message()
        .contains("query must start with one of MATCH, OPTIONAL, WITH, UNWIND, RETURN, CALL (found 'PROFILE')"));
}
