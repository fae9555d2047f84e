// weaver/src/pipeline/context.rs

//! Run state (`ExecutionContext`) and what a run reports back
//! (`StepResult`, `ExecutionResult`).

use crate::core::context::OperationResult;
use crate::core::operation::OperationType;
use crate::core::stream::RecordStream;
use crate::core::value::{Value, Variables};
use crate::pipeline::callback::MetricsMap;
use crate::pipeline::definition::PipelineStep;
use crate::rdf::merge_graphs;
use chrono::{DateTime, Utc};
use oxrdf::Graph;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of one executed (or dry-run skipped) step.
#[derive(Debug, Clone)]
pub struct StepResult {
  pub step_id: String,
  pub operation_id: String,
  pub success: bool,
  pub output_stream: Option<RecordStream>,
  pub output_graph: Option<Arc<Graph>>,
  pub metadata: BTreeMap<String, Value>,
  pub error: Option<String>,
  pub duration: Duration,
}

impl StepResult {
  pub(crate) fn from_operation(step: &PipelineStep, result: OperationResult, duration: Duration) -> Self {
    Self {
      step_id: step.id.clone(),
      operation_id: step.operation.clone(),
      success: result.success,
      output_stream: result.output_stream,
      output_graph: result.output_graph,
      metadata: result.metadata,
      error: result.error,
      duration,
    }
  }

  pub(crate) fn failed(step: &PipelineStep, message: String, duration: Duration) -> Self {
    Self {
      step_id: step.id.clone(),
      operation_id: step.operation.clone(),
      success: false,
      output_stream: None,
      output_graph: None,
      metadata: BTreeMap::new(),
      error: Some(message),
      duration,
    }
  }

  /// Synthetic result for an OUTPUT step that a dry run did not invoke.
  pub(crate) fn dry_run_skipped(step: &PipelineStep) -> Self {
    let mut metadata = BTreeMap::new();
    metadata.insert("dryRun".to_string(), Value::Bool(true));
    metadata.insert("skipped".to_string(), Value::Bool(true));
    Self {
      step_id: step.id.clone(),
      operation_id: step.operation.clone(),
      success: true,
      output_stream: None,
      output_graph: None,
      metadata,
      error: None,
      duration: Duration::ZERO,
    }
  }

  pub fn is_skipped(&self) -> bool {
    self.metadata.get("skipped").and_then(Value::as_bool).unwrap_or(false)
  }
}

/// State of a single `execute` call. Owned by that call only.
pub(crate) struct ExecutionContext {
  pub pipeline_id: String,
  pub variables: Variables,
  pub dry_run: bool,
  pub started_at: DateTime<Utc>,
  pub metrics: MetricsMap,
  results: Vec<StepResult>,
  by_step: HashMap<String, usize>,
  previous: Option<usize>,
}

impl ExecutionContext {
  pub fn new(pipeline_id: &str, variables: Variables, dry_run: bool) -> Self {
    Self {
      pipeline_id: pipeline_id.to_string(),
      variables,
      dry_run,
      started_at: Utc::now(),
      metrics: MetricsMap::default(),
      results: Vec::new(),
      by_step: HashMap::new(),
      previous: None,
    }
  }

  /// Stores a step's result and makes it the "previous" step for implicit chaining.
  pub fn record(&mut self, result: StepResult) {
    let index = self.results.len();
    self.by_step.insert(result.step_id.clone(), index);
    self.results.push(result);
    self.previous = Some(index);
  }

  pub fn result(&self, step_id: &str) -> Option<&StepResult> {
    self.by_step.get(step_id).map(|&i| &self.results[i])
  }

  /// Input for `step`. Explicit connections win: the last upstream stream is
  /// used and all upstream graphs are unioned. Without connections, non-SOURCE
  /// steps take the previous step's outputs; SOURCE steps get nothing.
  pub fn resolve_inputs(
    &self,
    step: &PipelineStep,
    operation_type: OperationType,
  ) -> (Option<RecordStream>, Option<Arc<Graph>>) {
    if !step.input_connections.is_empty() {
      let mut stream = None;
      let mut graphs = Vec::new();
      for upstream in step.input_connections.iter().filter_map(|id| self.result(id)) {
        if let Some(s) = &upstream.output_stream {
          stream = Some(s.clone());
        }
        if let Some(g) = &upstream.output_graph {
          graphs.push(Arc::clone(g));
        }
      }
      return (stream, merge_graphs(graphs));
    }

    if operation_type == OperationType::Source {
      return (None, None);
    }

    match self.previous.map(|i| &self.results[i]) {
      Some(prev) => (prev.output_stream.clone(), prev.output_graph.clone()),
      None => (None, None),
    }
  }

  pub fn into_result(self, success: bool, error_message: Option<String>) -> ExecutionResult {
    let metrics = self.metrics.lock().clone();
    ExecutionResult {
      pipeline_id: self.pipeline_id,
      started_at: self.started_at,
      finished_at: Utc::now(),
      success,
      error_message,
      metrics,
      step_results: self.results,
    }
  }
}

/// Final report of a run. On failure, results of the steps that ran (including
/// the failing one) are kept for diagnosis.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
  pub pipeline_id: String,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  pub success: bool,
  pub error_message: Option<String>,
  pub metrics: BTreeMap<String, f64>,
  /// In completion order.
  pub step_results: Vec<StepResult>,
}

impl ExecutionResult {
  pub fn step_result(&self, step_id: &str) -> Option<&StepResult> {
    self.step_results.iter().find(|r| r.step_id == step_id)
  }

  pub fn duration(&self) -> Duration {
    (self.finished_at - self.started_at).to_std().unwrap_or_default()
  }
}
