// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use oxrdf::{Graph, Literal, NamedNode, Triple};
use parking_lot::Mutex;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;
use weaver::{
  EngineConfig, EngineError, EngineResult, ExecutionCallback, LogLevel, Operation, OperationContext,
  OperationRegistry, OperationResult, OperationType, ParameterSpec, ParameterType, Record, RecordStream, Value,
};

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Atomic counters for checking execution counts ---
pub static SOURCE_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));
pub static OUTPUT_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));
pub static FAILING_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  SOURCE_EXEC_COUNTER.store(0, Ordering::SeqCst);
  OUTPUT_EXEC_COUNTER.store(0, Ordering::SeqCst);
  FAILING_EXEC_COUNTER.store(0, Ordering::SeqCst);
}

// --- Recording run observer ---
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackEvent {
  StepStart(String),
  StepComplete(String, bool),
  Progress(String, usize, Option<usize>),
  Log(String, LogLevel, String),
  Complete(bool, Option<String>),
}

#[derive(Default)]
pub struct RecordingCallback {
  pub events: Mutex<Vec<CallbackEvent>>,
}

impl RecordingCallback {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn events(&self) -> Vec<CallbackEvent> {
    self.events.lock().clone()
  }

  pub fn started_steps(&self) -> Vec<String> {
    self
      .events()
      .into_iter()
      .filter_map(|e| match e {
        CallbackEvent::StepStart(id) => Some(id),
        _ => None,
      })
      .collect()
  }

  pub fn logs_for(&self, step_id: &str) -> Vec<String> {
    self
      .events()
      .into_iter()
      .filter_map(|e| match e {
        CallbackEvent::Log(id, _, msg) if id == step_id => Some(msg),
        _ => None,
      })
      .collect()
  }

  pub fn completions(&self) -> Vec<(bool, Option<String>)> {
    self
      .events()
      .into_iter()
      .filter_map(|e| match e {
        CallbackEvent::Complete(ok, msg) => Some((ok, msg)),
        _ => None,
      })
      .collect()
  }
}

impl ExecutionCallback for RecordingCallback {
  fn on_step_start(&self, step_id: &str, _step_name: &str) {
    self.events.lock().push(CallbackEvent::StepStart(step_id.to_string()));
  }

  fn on_step_complete(&self, step_id: &str, success: bool) {
    self
      .events
      .lock()
      .push(CallbackEvent::StepComplete(step_id.to_string(), success));
  }

  fn on_progress(&self, step_id: &str, processed: usize, total: Option<usize>) {
    self
      .events
      .lock()
      .push(CallbackEvent::Progress(step_id.to_string(), processed, total));
  }

  fn on_log(&self, step_id: &str, level: LogLevel, message: &str) {
    self
      .events
      .lock()
      .push(CallbackEvent::Log(step_id.to_string(), level, message.to_string()));
  }

  fn on_complete(&self, success: bool, error: Option<&str>) {
    self
      .events
      .lock()
      .push(CallbackEvent::Complete(success, error.map(str::to_string)));
  }
}

// --- Stub operations ---

pub fn record(pairs: &[(&str, &str)]) -> Record {
  pairs
    .iter()
    .map(|(k, v)| (k.to_string(), Value::from(*v)))
    .collect()
}

pub fn ex(local: &str) -> NamedNode {
  NamedNode::new_unchecked(format!("http://ex.org/{}", local))
}

/// Graph with one `ex:<subject> ex:label "<subject>"` triple per subject.
pub fn labelled_graph(subjects: &[&str]) -> Graph {
  let mut graph = Graph::new();
  for s in subjects {
    graph.insert(&Triple::new(ex(s), ex("label"), Literal::new_simple_literal(*s)));
  }
  graph
}

/// SOURCE that emits the records given in its `rows` parameter (a list of
/// `id` strings) and a one-triple graph per row.
pub struct StubSource;

#[async_trait]
impl Operation for StubSource {
  fn id(&self) -> &str {
    "stub-source"
  }
  fn name(&self) -> &str {
    "Stub Source"
  }
  fn description(&self) -> &str {
    "Emits fixed rows"
  }
  fn operation_type(&self) -> OperationType {
    OperationType::Source
  }
  fn parameters(&self) -> Vec<ParameterSpec> {
    vec![ParameterSpec::optional("rows", ParameterType::List, "Row ids").with_default(vec!["a"])]
  }

  async fn execute(&self, ctx: OperationContext) -> EngineResult<OperationResult> {
    SOURCE_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
    let ids: Vec<String> = ctx
      .param("rows")
      .and_then(Value::as_list)
      .unwrap_or_default()
      .iter()
      .map(|v| v.to_string())
      .collect();
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let records = ids.iter().map(|id| record(&[("id", id.as_str())])).collect();
    Ok(OperationResult {
      success: true,
      output_stream: Some(RecordStream::from_records(records)),
      output_graph: Some(Arc::new(labelled_graph(&refs))),
      ..Default::default()
    })
  }
}

/// TRANSFORM that echoes its resolved parameters and input sizes into metadata
/// and forwards its input graph.
pub struct EchoTransform;

#[async_trait]
impl Operation for EchoTransform {
  fn id(&self) -> &str {
    "echo"
  }
  fn name(&self) -> &str {
    "Echo"
  }
  fn description(&self) -> &str {
    "Reports what it received"
  }
  fn operation_type(&self) -> OperationType {
    OperationType::Transform
  }
  fn parameters(&self) -> Vec<ParameterSpec> {
    vec![ParameterSpec::optional("mode", ParameterType::String, "Echoed back").with_default("plain")]
  }

  async fn execute(&self, ctx: OperationContext) -> EngineResult<OperationResult> {
    let rows = match ctx.input_stream.as_ref() {
      Some(stream) => stream.collect_records()?.len(),
      None => 0,
    };
    let triples = ctx.input_graph.as_ref().map(|g| g.len()).unwrap_or(0);
    ctx.callback.on_log(LogLevel::Info, &format!("echo saw {} rows", rows));
    ctx.callback.on_metric("rows", rows as f64);
    let mut result = OperationResult {
      success: true,
      output_graph: ctx.input_graph.clone(),
      ..Default::default()
    }
    .metadata("rows", rows)
    .metadata("triples", triples)
    .metadata("hasStream", ctx.input_stream.is_some())
    .metadata("hasGraph", ctx.input_graph.is_some());
    for (name, value) in &ctx.parameters {
      result = result.metadata(&format!("param.{}", name), value.clone());
    }
    Ok(result)
  }
}

/// TRANSFORM that always returns an `Operation` error.
pub struct FailingOperation;

#[async_trait]
impl Operation for FailingOperation {
  fn id(&self) -> &str {
    "failing"
  }
  fn name(&self) -> &str {
    "Failing"
  }
  fn description(&self) -> &str {
    "Always fails"
  }
  fn operation_type(&self) -> OperationType {
    OperationType::Transform
  }
  fn parameters(&self) -> Vec<ParameterSpec> {
    Vec::new()
  }

  async fn execute(&self, _ctx: OperationContext) -> EngineResult<OperationResult> {
    FAILING_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
    Err(EngineError::operation("failing", "boom"))
  }
}

/// OUTPUT that only counts invocations.
pub struct CountingOutput;

#[async_trait]
impl Operation for CountingOutput {
  fn id(&self) -> &str {
    "counting-output"
  }
  fn name(&self) -> &str {
    "Counting Output"
  }
  fn description(&self) -> &str {
    "Counts calls"
  }
  fn operation_type(&self) -> OperationType {
    OperationType::Output
  }
  fn parameters(&self) -> Vec<ParameterSpec> {
    Vec::new()
  }

  async fn execute(&self, ctx: OperationContext) -> EngineResult<OperationResult> {
    OUTPUT_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
    let triples = ctx.input_graph.as_ref().map(|g| g.len()).unwrap_or(0);
    Ok(OperationResult::success().metadata("triplesWritten", triples))
  }
}

/// Built-ins plus every stub above.
pub fn test_registry() -> Arc<OperationRegistry> {
  let registry = OperationRegistry::with_builtins(&EngineConfig::default());
  registry.register(Arc::new(StubSource));
  registry.register(Arc::new(EchoTransform));
  registry.register(Arc::new(FailingOperation));
  registry.register(Arc::new(CountingOutput));
  Arc::new(registry)
}

pub const ORG_CSV: &str = "id,name,founded\n42,Acme,1999\n7,Globex,2004\n";

pub const ORG_SHAPES: &str = r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix ex: <http://ex.org/> .

ex:OrgShape a sh:NodeShape ;
  sh:targetClass ex:Organization ;
  sh:property [
    sh:path ex:name ;
    sh:minCount 1 ;
    sh:maxCount 1 ;
    sh:datatype xsd:string ;
  ] .
"#;
