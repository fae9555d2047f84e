// weaver/src/core/context.rs

//! Defines what an operation receives (`OperationContext`) and returns
//! (`OperationResult`), and the callback it reports progress through.

use crate::core::stream::{CancellationToken, RecordStream};
use crate::core::value::{Parameters, Value, Variables};
use crate::error::{EngineError, EngineResult};
use oxrdf::Graph;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
  Debug,
  Info,
  Warn,
  Error,
}

impl fmt::Display for LogLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      LogLevel::Debug => "DEBUG",
      LogLevel::Info => "INFO",
      LogLevel::Warn => "WARN",
      LogLevel::Error => "ERROR",
    })
  }
}

/// Sink an operation reports to while it runs. The executor hands each
/// invocation a step-scoped implementation.
pub trait OperationCallback: Send + Sync {
  /// `total` is `None` when the size of the input is not known up front.
  fn on_progress(&self, processed: usize, total: Option<usize>);

  fn on_log(&self, level: LogLevel, message: &str);

  fn on_metric(&self, name: &str, value: f64);
}

/// Callback that drops everything. Handy when invoking an operation directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOperationCallback;

impl OperationCallback for NoopOperationCallback {
  fn on_progress(&self, _processed: usize, _total: Option<usize>) {}
  fn on_log(&self, _level: LogLevel, _message: &str) {}
  fn on_metric(&self, _name: &str, _value: f64) {}
}

/// Input to one operation invocation. Built fresh for every step.
pub struct OperationContext {
  pub parameters: Parameters,
  pub input_stream: Option<RecordStream>,
  pub input_graph: Option<Arc<Graph>>,
  pub variables: Variables,
  pub callback: Arc<dyn OperationCallback>,
  pub cancellation: CancellationToken,
}

impl OperationContext {
  pub fn new(parameters: Parameters) -> Self {
    Self {
      parameters,
      input_stream: None,
      input_graph: None,
      variables: Variables::new(),
      callback: Arc::new(NoopOperationCallback),
      cancellation: CancellationToken::new(),
    }
  }

  pub fn with_stream(mut self, stream: RecordStream) -> Self {
    self.input_stream = Some(stream);
    self
  }

  pub fn with_graph(mut self, graph: Arc<Graph>) -> Self {
    self.input_graph = Some(graph);
    self
  }

  pub fn with_variables(mut self, variables: Variables) -> Self {
    self.variables = variables;
    self
  }

  pub fn with_callback(mut self, callback: Arc<dyn OperationCallback>) -> Self {
    self.callback = callback;
    self
  }

  pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
    self.cancellation = token;
    self
  }

  pub fn param(&self, name: &str) -> Option<&Value> {
    self.parameters.get(name).filter(|v| !v.is_null())
  }

  /// A non-blank string parameter.
  pub fn param_str(&self, name: &str) -> Option<&str> {
    self
      .param(name)
      .and_then(Value::as_str)
      .filter(|s| !s.trim().is_empty())
  }

  pub fn require_str(&self, operation_id: &str, name: &str) -> EngineResult<&str> {
    self
      .param_str(name)
      .ok_or_else(|| EngineError::operation(operation_id, format!("Missing required parameter '{}'", name)))
  }

  pub fn param_bool(&self, name: &str, default: bool) -> bool {
    self.param(name).and_then(Value::as_bool).unwrap_or(default)
  }

  pub fn param_map(&self, name: &str) -> Option<&BTreeMap<String, Value>> {
    self.param(name).and_then(Value::as_map)
  }

  pub fn check_cancelled(&self) -> EngineResult<()> {
    if self.cancellation.is_cancelled() {
      return Err(EngineError::Cancelled { step_id: None });
    }
    Ok(())
  }
}

impl fmt::Debug for OperationContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("OperationContext")
      .field("parameters", &self.parameters)
      .field("input_stream", &self.input_stream)
      .field("input_graph_len", &self.input_graph.as_ref().map(|g| g.len()))
      .field("variables", &self.variables)
      .finish()
  }
}

/// What an operation hands back. Normally exactly one of `output_stream` and
/// `output_graph` is set, depending on the operation type.
#[derive(Debug, Clone, Default)]
pub struct OperationResult {
  pub success: bool,
  pub output_stream: Option<RecordStream>,
  pub output_graph: Option<Arc<Graph>>,
  pub metadata: BTreeMap<String, Value>,
  pub error: Option<String>,
}

impl OperationResult {
  pub fn success() -> Self {
    Self {
      success: true,
      ..Default::default()
    }
  }

  pub fn with_stream(stream: RecordStream) -> Self {
    Self {
      success: true,
      output_stream: Some(stream),
      ..Default::default()
    }
  }

  pub fn with_graph(graph: impl Into<Arc<Graph>>) -> Self {
    Self {
      success: true,
      output_graph: Some(graph.into()),
      ..Default::default()
    }
  }

  pub fn failure(message: impl Into<String>) -> Self {
    Self {
      success: false,
      error: Some(message.into()),
      ..Default::default()
    }
  }

  pub fn metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
    self.metadata.insert(key.to_string(), value.into());
    self
  }
}
