// tests/registry_tests.rs
mod common;

use async_trait::async_trait;
use common::*;
use std::sync::Arc;
use weaver::{
  EngineConfig, EngineError, EngineResult, Operation, OperationContext, OperationRegistry, OperationResult,
  OperationType, ParameterSpec, ParameterType,
};

/// Same id as the built-in mapper, but registered as a CUBE operation.
struct ReplacementMapper;

#[async_trait]
impl Operation for ReplacementMapper {
  fn id(&self) -> &str {
    "rdf-mapping"
  }
  fn name(&self) -> &str {
    "Replacement"
  }
  fn description(&self) -> &str {
    "Shadows the built-in mapper"
  }
  fn operation_type(&self) -> OperationType {
    OperationType::Cube
  }
  fn parameters(&self) -> Vec<ParameterSpec> {
    vec![ParameterSpec::required("dimension", ParameterType::String, "Cube dimension")]
  }

  async fn execute(&self, _ctx: OperationContext) -> EngineResult<OperationResult> {
    Ok(OperationResult::success())
  }
}

#[test]
fn test_builtins_are_registered_by_id_and_type() {
  setup_tracing();
  let registry = OperationRegistry::with_builtins(&EngineConfig::default());

  assert_eq!(
    registry.ids(),
    vec![
      "csv-source",
      "json-source",
      "rdf-file-output",
      "rdf-mapping",
      "rdf-source",
      "shacl-validation"
    ]
  );
  assert_eq!(registry.get("csv-source").unwrap().operation_type(), OperationType::Source);
  assert_eq!(registry.get_by_type(OperationType::Source).len(), 3);
  assert_eq!(registry.get_by_type(OperationType::Transform).len(), 1);
  assert_eq!(registry.get_by_type(OperationType::Validation).len(), 1);
  assert_eq!(registry.get_by_type(OperationType::Output).len(), 1);
  assert!(registry.get_by_type(OperationType::Cube).is_empty());
}

#[test]
fn test_lookup_of_unknown_id() {
  setup_tracing();
  let registry = OperationRegistry::new();
  assert!(registry.is_empty());
  assert!(registry.get("nothing").is_none());
  match registry.get_or_err("nothing") {
    Err(EngineError::UnknownOperation { operation_id }) => assert_eq!(operation_id, "nothing"),
    other => panic!("Expected UnknownOperation, got {:?}", other.map(|op| op.id().to_string())),
  }
}

#[test]
fn test_reregistration_replaces_previous_entry() {
  setup_tracing();
  let registry = OperationRegistry::with_builtins(&EngineConfig::default());
  let before = registry.len();

  registry.register(Arc::new(ReplacementMapper));

  assert_eq!(registry.len(), before);
  assert_eq!(registry.get("rdf-mapping").unwrap().name(), "Replacement");
  assert!(registry.get_by_type(OperationType::Transform).is_empty());
  let cube = registry.get_by_type(OperationType::Cube);
  assert_eq!(cube.len(), 1);
  assert_eq!(cube[0].id(), "rdf-mapping");
}

#[test]
fn test_catalog_groups_operation_info_by_type() {
  setup_tracing();
  let registry = test_registry();
  let catalog = registry.get_catalog();

  assert!(!catalog.contains_key(&OperationType::Cube));
  let sources: Vec<&str> = catalog[&OperationType::Source].iter().map(|i| i.id.as_str()).collect();
  assert_eq!(sources, vec!["csv-source", "json-source", "rdf-source", "stub-source"]);

  let mapping = catalog[&OperationType::Transform]
    .iter()
    .find(|info| info.id == "rdf-mapping")
    .unwrap();
  assert_eq!(mapping.name, "RDF Mapping");
  assert!(mapping.parameters["baseUri"].required);
  assert!(mapping.parameters["propertyMappings"].required);
  assert!(!mapping.parameters["subjectTemplate"].required);

  let csv = &catalog[&OperationType::Source][0];
  assert_eq!(
    csv.parameters["delimiter"].default.as_ref().and_then(|v| v.as_str()),
    Some(",")
  );
}

#[tokio::test]
async fn test_registry_is_shared_across_tasks() {
  setup_tracing();
  let registry = test_registry();
  let handles: Vec<_> = (0..4)
    .map(|_| {
      let registry = Arc::clone(&registry);
      tokio::spawn(async move { registry.get("echo").map(|op| op.name().to_string()) })
    })
    .collect();
  for handle in handles {
    assert_eq!(handle.await.unwrap().as_deref(), Some("Echo"));
  }
}
