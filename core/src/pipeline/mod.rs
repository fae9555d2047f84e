// weaver/src/pipeline/mod.rs

//! Pipeline definitions and the DAG executor that runs them.

pub mod callback;
pub mod context;
pub mod definition;
pub mod execution;
pub mod ordering;
pub mod params;

pub use callback::{ExecutionCallback, NoopExecutionCallback};
pub use context::{ExecutionResult, StepResult};
pub use definition::{PipelineDefinition, PipelineStep, Position};
pub use execution::PipelineExecutor;
