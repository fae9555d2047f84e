// weaver/src/pipeline/definition.rs

//! `PipelineDefinition` and `PipelineStep`: the declarative DAG a run executes.
//!
//! Definitions are plain data. They are usually produced by an external
//! loader (see `PipelineDefinition::from_json`) and checked with `validate`
//! against the registry the executor will use.

use crate::core::value::{Parameters, Value, Variables};
use crate::error::{EngineError, EngineResult};
use crate::registry::OperationRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Editor layout position. Ignored by execution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
  pub x: f64,
  pub y: f64,
}

/// One placement of an operation within a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStep {
  pub id: String,
  /// Id of the registered operation this step invokes.
  pub operation: String,
  #[serde(default)]
  pub name: String,
  /// Literal values or strings containing `${variable}` references.
  #[serde(default)]
  pub parameters: Parameters,
  #[serde(default)]
  pub input_connections: Vec<String>,
  #[serde(default)]
  pub output_connections: Vec<String>,
  #[serde(default)]
  pub position: Position,
}

impl PipelineStep {
  /// A step named after its id. Use `named` to set a display name.
  pub fn new(id: &str, operation: &str) -> Self {
    Self {
      id: id.to_string(),
      operation: operation.to_string(),
      name: id.to_string(),
      parameters: Parameters::new(),
      input_connections: Vec::new(),
      output_connections: Vec::new(),
      position: Position::default(),
    }
  }

  pub fn named(mut self, name: &str) -> Self {
    self.name = name.to_string();
    self
  }

  pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
    self.parameters.insert(name.to_string(), value.into());
    self
  }

  pub fn with_inputs(mut self, step_ids: &[&str]) -> Self {
    self.input_connections = step_ids.iter().map(|s| s.to_string()).collect();
    self
  }

  pub fn with_outputs(mut self, step_ids: &[&str]) -> Self {
    self.output_connections = step_ids.iter().map(|s| s.to_string()).collect();
    self
  }

  pub fn at(mut self, x: f64, y: f64) -> Self {
    self.position = Position { x, y };
    self
  }

  /// The name used in log lines and run-level error messages.
  pub fn display_name(&self) -> &str {
    if self.name.trim().is_empty() {
      &self.id
    } else {
      &self.name
    }
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineDefinition {
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub steps: Vec<PipelineStep>,
  /// Default variable bindings, overridden by the caller's bindings at run time.
  #[serde(default)]
  pub variables: Variables,
}

impl PipelineDefinition {
  pub fn new(id: &str, name: &str) -> Self {
    Self {
      id: id.to_string(),
      name: name.to_string(),
      ..Default::default()
    }
  }

  pub fn with_step(mut self, step: PipelineStep) -> Self {
    self.steps.push(step);
    self
  }

  pub fn with_variable(mut self, name: &str, value: impl Into<Value>) -> Self {
    self.variables.insert(name.to_string(), value.into());
    self
  }

  pub fn step(&self, id: &str) -> Option<&PipelineStep> {
    self.steps.iter().find(|s| s.id == id)
  }

  /// Parses a definition from its JSON form (camelCase keys).
  pub fn from_json(text: &str) -> EngineResult<Self> {
    serde_json::from_str(text).map_err(|e| EngineError::InvalidDefinition {
      message: format!("Malformed pipeline definition: {}", e),
    })
  }

  /// Definition defaults overlaid with `overrides`.
  pub fn merged_variables(&self, overrides: Variables) -> Variables {
    let mut merged = self.variables.clone();
    merged.extend(overrides);
    merged
  }

  /// Checks the structural invariants: unique non-empty step ids, input
  /// connections that name existing steps, and registered operations.
  pub fn validate(&self, registry: &OperationRegistry) -> EngineResult<()> {
    let mut ids = HashSet::new();
    for step in &self.steps {
      if step.id.trim().is_empty() {
        return Err(invalid("Step with empty id".to_string()));
      }
      if !ids.insert(step.id.as_str()) {
        return Err(invalid(format!("Duplicate step id '{}'", step.id)));
      }
    }

    for step in &self.steps {
      if let Some(missing) = step.input_connections.iter().find(|c| !ids.contains(c.as_str())) {
        return Err(invalid(format!(
          "Step '{}' has an input connection to unknown step '{}'",
          step.id, missing
        )));
      }
      if !registry.contains(&step.operation) {
        return Err(EngineError::UnknownOperation {
          operation_id: step.operation.clone(),
        });
      }
    }
    Ok(())
  }
}

fn invalid(message: String) -> EngineError {
  EngineError::InvalidDefinition { message }
}
