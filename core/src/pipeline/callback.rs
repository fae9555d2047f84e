// weaver/src/pipeline/callback.rs

use crate::core::context::{LogLevel, OperationCallback};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{event, Level};

/// Run-level observer implemented by the caller (job logs, progress bars).
/// Every method defaults to a no-op. The executor calls it in program order
/// from the task driving the run.
pub trait ExecutionCallback: Send + Sync {
  fn on_step_start(&self, _step_id: &str, _step_name: &str) {}

  fn on_step_complete(&self, _step_id: &str, _success: bool) {}

  fn on_progress(&self, _step_id: &str, _processed: usize, _total: Option<usize>) {}

  fn on_log(&self, _step_id: &str, _level: LogLevel, _message: &str) {}

  fn on_complete(&self, _success: bool, _error: Option<&str>) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExecutionCallback;

impl ExecutionCallback for NoopExecutionCallback {}

pub(crate) type MetricsMap = Arc<Mutex<BTreeMap<String, f64>>>;

/// Step-scoped adapter handed to operations. Tags progress and logs with the
/// step id and files metrics under `<step_id>.<name>`.
pub(crate) struct StepCallback {
  step_id: String,
  run: Arc<dyn ExecutionCallback>,
  metrics: MetricsMap,
}

impl StepCallback {
  pub(crate) fn new(step_id: &str, run: Arc<dyn ExecutionCallback>, metrics: MetricsMap) -> Self {
    Self {
      step_id: step_id.to_string(),
      run,
      metrics,
    }
  }
}

impl OperationCallback for StepCallback {
  fn on_progress(&self, processed: usize, total: Option<usize>) {
    event!(Level::TRACE, step_id = %self.step_id, processed, ?total, "Step progress.");
    self.run.on_progress(&self.step_id, processed, total);
  }

  fn on_log(&self, level: LogLevel, message: &str) {
    let step_id = self.step_id.as_str();
    match level {
      LogLevel::Debug => event!(Level::DEBUG, step_id, "{}", message),
      LogLevel::Info => event!(Level::INFO, step_id, "{}", message),
      LogLevel::Warn => event!(Level::WARN, step_id, "{}", message),
      LogLevel::Error => event!(Level::ERROR, step_id, "{}", message),
    }
    self.run.on_log(&self.step_id, level, message);
  }

  fn on_metric(&self, name: &str, value: f64) {
    let key = format!("{}.{}", self.step_id, name);
    event!(Level::DEBUG, metric = %key, value, "Metric recorded.");
    self.metrics.lock().insert(key, value);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Default)]
  struct Logs(Mutex<Vec<String>>);

  impl ExecutionCallback for Logs {
    fn on_log(&self, step_id: &str, level: LogLevel, message: &str) {
      self.0.lock().push(format!("{}:{}:{}", step_id, level, message));
    }
  }

  #[test]
  fn metrics_are_keyed_by_step() {
    let metrics: MetricsMap = Arc::default();
    let logs = Arc::new(Logs::default());
    let cb = StepCallback::new("map", logs.clone(), Arc::clone(&metrics));

    cb.on_metric("rowsProcessed", 3.0);
    cb.on_metric("rowsProcessed", 4.0);
    cb.on_log(LogLevel::Info, "done");

    assert_eq!(metrics.lock().get("map.rowsProcessed"), Some(&4.0));
    assert_eq!(logs.0.lock().as_slice(), ["map:INFO:done".to_string()]);
  }
}
