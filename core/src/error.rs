// weaver/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("Unknown operation: {operation_id}")]
  UnknownOperation { operation_id: String },

  #[error("Circular dependency detected among steps: {}", steps.join(", "))]
  CircularDependency { steps: Vec<String> },

  #[error("Invalid pipeline definition: {message}")]
  InvalidDefinition { message: String },

  #[error("Operation '{operation_id}' failed{}: {message}", step_suffix(.step_id))]
  Operation {
    operation_id: String,
    step_id: Option<String>,
    message: String,
    #[source]
    source: Option<AnyhowError>,
  },

  #[error("Pipeline execution failed: {message}")]
  PipelineExecution { message: String },

  #[error("Invalid URI template '{template}': {message}")]
  Template { template: String, message: String },

  #[error("Invalid shapes graph: {message}")]
  Shapes { message: String },

  #[error("RDF parse error: {message}")]
  RdfParse { message: String },

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Execution cancelled{}", step_suffix(.step_id))]
  Cancelled { step_id: Option<String> },

  #[error("Error in operation implementation or external collaborator. Source: {source}")]
  External {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal engine error: {0}")]
  Internal(String),
}

fn step_suffix(step_id: &Option<String>) -> String {
  match step_id {
    Some(id) => format!(" in step '{}'", id),
    None => String::new(),
  }
}

impl EngineError {
  /// Shorthand for an `Operation` error without a step id or cause.
  pub fn operation(operation_id: impl Into<String>, message: impl Into<String>) -> Self {
    EngineError::Operation {
      operation_id: operation_id.into(),
      step_id: None,
      message: message.into(),
      source: None,
    }
  }

  /// Attaches a step id to `Operation` and `Cancelled` errors that lack one.
  pub fn in_step(self, step: &str) -> Self {
    match self {
      EngineError::Operation {
        operation_id,
        step_id: None,
        message,
        source,
      } => EngineError::Operation {
        operation_id,
        step_id: Some(step.to_string()),
        message,
        source,
      },
      EngineError::Cancelled { step_id: None } => EngineError::Cancelled {
        step_id: Some(step.to_string()),
      },
      other => other,
    }
  }

  /// The bare message of an `Operation` error, or the full display otherwise.
  /// Used when a failing step's error is folded into the run-level message.
  pub fn operation_message(&self) -> String {
    match self {
      EngineError::Operation { message, .. } => message.clone(),
      other => other.to_string(),
    }
  }
}

impl From<AnyhowError> for EngineError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap an EngineError that was only carried through anyhow
    match err.downcast::<EngineError>() {
      Ok(engine_err) => engine_err,
      Err(err) => EngineError::External { source: err },
    }
  }
}

pub type EngineResult<T, E = EngineError> = std::result::Result<T, E>;
