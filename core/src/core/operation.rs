// weaver/src/core/operation.rs

//! The `Operation` trait every pipeline step dispatches to, plus the
//! descriptive types the registry exposes for discovery.

use crate::core::context::{OperationContext, OperationResult};
use crate::core::value::Value;
use crate::error::EngineResult;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Coarse category of an operation. Drives implicit chaining (SOURCE steps
/// never inherit input) and dry-run behavior (OUTPUT steps are skipped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
  Source,
  Transform,
  Cube,
  Validation,
  Output,
}

impl OperationType {
  pub const ALL: [OperationType; 5] = [
    OperationType::Source,
    OperationType::Transform,
    OperationType::Cube,
    OperationType::Validation,
    OperationType::Output,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OperationType::Source => "SOURCE",
      OperationType::Transform => "TRANSFORM",
      OperationType::Cube => "CUBE",
      OperationType::Validation => "VALIDATION",
      OperationType::Output => "OUTPUT",
    }
  }
}

impl fmt::Display for OperationType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OperationType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OperationType::ALL
      .into_iter()
      .find(|t| t.as_str().eq_ignore_ascii_case(s))
      .ok_or_else(|| format!("unknown operation type '{}'", s))
  }
}

/// Declared value type of a parameter. Informational for tooling; operations
/// still validate what they receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
  String,
  Integer,
  Number,
  Boolean,
  List,
  Map,
  Uri,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
  pub name: String,
  pub description: String,
  pub value_type: ParameterType,
  pub required: bool,
  pub default: Option<Value>,
}

impl ParameterSpec {
  pub fn required(name: &str, value_type: ParameterType, description: &str) -> Self {
    Self {
      name: name.to_string(),
      description: description.to_string(),
      value_type,
      required: true,
      default: None,
    }
  }

  pub fn optional(name: &str, value_type: ParameterType, description: &str) -> Self {
    Self {
      name: name.to_string(),
      description: description.to_string(),
      value_type,
      required: false,
      default: None,
    }
  }

  pub fn with_default(mut self, default: impl Into<Value>) -> Self {
    self.default = Some(default.into());
    self
  }
}

/// Serializable summary of an operation, as listed in the registry catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationInfo {
  pub id: String,
  pub name: String,
  pub description: String,
  pub operation_type: OperationType,
  pub parameters: BTreeMap<String, ParameterSpec>,
}

/// A typed, parameterized unit of pipeline work.
///
/// Implementations are stateless with respect to a run: everything a single
/// invocation needs arrives in the `OperationContext`. A registered operation
/// may be invoked by many steps, one at a time.
#[async_trait]
pub trait Operation: Send + Sync {
  fn id(&self) -> &str;

  fn name(&self) -> &str;

  fn description(&self) -> &str;

  fn operation_type(&self) -> OperationType;

  fn parameters(&self) -> Vec<ParameterSpec>;

  /// Runs the operation. Returning `Err` and returning a result with
  /// `success == false` both fail the step.
  async fn execute(&self, ctx: OperationContext) -> EngineResult<OperationResult>;

  fn info(&self) -> OperationInfo {
    OperationInfo {
      id: self.id().to_string(),
      name: self.name().to_string(),
      description: self.description().to_string(),
      operation_type: self.operation_type(),
      parameters: self
        .parameters()
        .into_iter()
        .map(|spec| (spec.name.clone(), spec))
        .collect(),
    }
  }
}
