// src/lib.rs

//! Weaver: an ASYNC pipeline engine that turns tabular and JSON records into
//! RDF graphs.
//!
//! A pipeline is a DAG of steps, each bound to a registered operation:
//!  - SOURCE operations produce record streams or graphs (CSV, JSON, RDF files).
//!  - TRANSFORM operations map records to triples (`rdf-mapping`).
//!  - VALIDATION operations check graphs against SHACL shapes.
//!  - OUTPUT operations publish the result, and are skipped in dry runs.
//!
//! The executor orders steps by their input connections, wires outputs to
//! inputs (explicitly, or implicitly from the previous step), resolves
//! `${variable}` parameters and reports progress, logs and metrics through an
//! `ExecutionCallback`.

pub mod config;
pub mod core;
pub mod error;
pub mod operations;
pub mod pipeline;
pub mod rdf;
pub mod registry;
pub mod shacl;
pub mod template;

// --- Re-exports for the Public API ---

pub use crate::core::context::{LogLevel, NoopOperationCallback, OperationCallback, OperationContext, OperationResult};
pub use crate::core::operation::{Operation, OperationInfo, OperationType, ParameterSpec, ParameterType};
pub use crate::core::stream::{CancellationToken, RecordStream};
pub use crate::core::value::{Parameters, Record, Value, Variables};

pub use crate::config::{EngineConfig, EnvResolver, MapEnv, ProcessEnv, ViolationPolicy};
pub use crate::error::{EngineError, EngineResult};

pub use crate::pipeline::{
  ExecutionCallback, ExecutionResult, NoopExecutionCallback, PipelineDefinition, PipelineExecutor, PipelineStep,
  Position, StepResult,
};
pub use crate::registry::OperationRegistry;

pub use crate::shacl::{ShaclValidator, ShapesGraph, ValidationReport, ValidationResult};
pub use crate::template::{
  build_default_template, expand_template, parse_template, validate_template, TemplateVariable, UriTemplate,
};

/*
    Typical use:
    1. Build a registry: `OperationRegistry::with_builtins(&EngineConfig::from_env(&ProcessEnv)?)`,
       then `register` any custom `Operation` implementations.
    2. Describe the pipeline as a `PipelineDefinition` (builder helpers or `from_json`).
    3. `PipelineExecutor::new(Arc::new(registry)).execute(&definition, vars, dry_run, callback).await`
    4. Inspect `ExecutionResult::success`, `error_message`, `metrics` and per-step results.
*/
