// weaver/src/pipeline/execution.rs

//! Contains `PipelineExecutor`, which runs a `PipelineDefinition` step by step.

use crate::config::{EnvResolver, ProcessEnv};
use crate::core::context::{LogLevel, OperationContext};
use crate::core::operation::{Operation, OperationType};
use crate::core::stream::CancellationToken;
use crate::core::value::Variables;
use crate::error::{EngineError, EngineResult};
use crate::pipeline::callback::{ExecutionCallback, StepCallback};
use crate::pipeline::context::{ExecutionContext, ExecutionResult, StepResult};
use crate::pipeline::definition::{PipelineDefinition, PipelineStep};
use crate::pipeline::{ordering, params};
use crate::registry::OperationRegistry;
use std::sync::Arc;
use std::time::Instant;
use tracing::{event, instrument, span, Instrument, Level};

/// Runs pipeline definitions against a registry.
///
/// Steps run one at a time on the calling task, in dependency order. A run
/// never panics on bad input: every failure, structural or from an
/// operation, ends up in the returned `ExecutionResult`.
#[derive(Clone)]
pub struct PipelineExecutor {
  registry: Arc<OperationRegistry>,
  env: Arc<dyn EnvResolver>,
}

impl PipelineExecutor {
  pub fn new(registry: Arc<OperationRegistry>) -> Self {
    Self {
      registry,
      env: Arc::new(ProcessEnv),
    }
  }

  /// Replaces the environment used for whole-value `${NAME}` parameters.
  pub fn with_env(mut self, env: Arc<dyn EnvResolver>) -> Self {
    self.env = env;
    self
  }

  pub fn registry(&self) -> &Arc<OperationRegistry> {
    &self.registry
  }

  /// Executes `definition` with the caller's `variables` laid over the
  /// definition defaults. In a dry run OUTPUT steps are not invoked.
  pub async fn execute(
    &self,
    definition: &PipelineDefinition,
    variables: Variables,
    dry_run: bool,
    callback: Arc<dyn ExecutionCallback>,
  ) -> ExecutionResult {
    self
      .execute_cancellable(definition, variables, dry_run, callback, CancellationToken::new())
      .await
  }

  /// Like `execute`, observing `token` between steps and handing it to
  /// operations so streaming work can stop between records.
  #[instrument(
    name = "PipelineExecutor::execute",
    skip_all,
    fields(pipeline_id = %definition.id, num_steps = definition.steps.len(), dry_run = dry_run)
  )]
  pub async fn execute_cancellable(
    &self,
    definition: &PipelineDefinition,
    variables: Variables,
    dry_run: bool,
    callback: Arc<dyn ExecutionCallback>,
    token: CancellationToken,
  ) -> ExecutionResult {
    event!(Level::DEBUG, "Pipeline execution starting.");
    let mut ctx = ExecutionContext::new(&definition.id, definition.merged_variables(variables), dry_run);

    match self.run_steps(definition, &mut ctx, &callback, &token).await {
      Ok(()) => {
        event!(Level::DEBUG, "Pipeline execution completed successfully.");
        callback.on_complete(true, None);
        ctx.into_result(true, None)
      }
      Err(err) => {
        let message = err.to_string();
        event!(Level::ERROR, error = %message, "Pipeline execution failed.");
        callback.on_complete(false, Some(&message));
        ctx.into_result(false, Some(message))
      }
    }
  }

  #[instrument(name = "PipelineExecutor::run_steps", skip_all, err(Display))]
  async fn run_steps(
    &self,
    definition: &PipelineDefinition,
    ctx: &mut ExecutionContext,
    callback: &Arc<dyn ExecutionCallback>,
    token: &CancellationToken,
  ) -> EngineResult<()> {
    definition.validate(&self.registry)?;
    let order = ordering::topological_order(&definition.steps)?;

    for (step_index, step) in order.into_iter().enumerate() {
      if token.is_cancelled() {
        event!(Level::WARN, step_id = %step.id, "Cancellation requested, stopping before step.");
        return Err(EngineError::Cancelled {
          step_id: Some(step.id.clone()),
        });
      }
      let operation = self.registry.get_or_err(&step.operation)?;

      let step_span = span!(
        Level::INFO,
        "pipeline_step_execution",
        step_id = %step.id,
        step_name = %step.display_name(),
        operation = %step.operation,
        step_index
      );
      self
        .run_step(step, operation, ctx, callback, token)
        .instrument(step_span)
        .await?;
    }
    Ok(())
  }

  async fn run_step(
    &self,
    step: &PipelineStep,
    operation: Arc<dyn Operation>,
    ctx: &mut ExecutionContext,
    callback: &Arc<dyn ExecutionCallback>,
    token: &CancellationToken,
  ) -> EngineResult<()> {
    event!(Level::DEBUG, "Processing step.");
    callback.on_step_start(&step.id, step.display_name());

    let operation_type = operation.operation_type();
    let (input_stream, input_graph) = ctx.resolve_inputs(step, operation_type);

    let mut parameters = params::resolve_parameters(&step.parameters, &ctx.variables, self.env.as_ref());
    params::apply_defaults(&mut parameters, &operation.parameters());

    if ctx.dry_run && operation_type == OperationType::Output {
      event!(Level::INFO, "Dry run, output step skipped.");
      callback.on_log(&step.id, LogLevel::Info, "Dry run: output step skipped");
      ctx.record(StepResult::dry_run_skipped(step));
      callback.on_step_complete(&step.id, true);
      return Ok(());
    }

    let step_callback = Arc::new(StepCallback::new(&step.id, Arc::clone(callback), Arc::clone(&ctx.metrics)));
    let mut op_ctx = OperationContext::new(parameters)
      .with_variables(ctx.variables.clone())
      .with_callback(step_callback)
      .with_cancellation(token.clone());
    op_ctx.input_stream = input_stream;
    op_ctx.input_graph = input_graph;

    let started = Instant::now();
    let result = match operation.execute(op_ctx).await {
      Ok(result) => StepResult::from_operation(step, result, started.elapsed()),
      Err(err) => {
        let err = err.in_step(&step.id);
        event!(Level::ERROR, error = %err, "Operation returned an error.");
        StepResult::failed(step, err.operation_message(), started.elapsed())
      }
    };

    let success = result.success;
    let error = result.error.clone();
    ctx.record(result);
    callback.on_step_complete(&step.id, success);

    if !success {
      let reason = error.unwrap_or_else(|| "unknown error".to_string());
      return Err(EngineError::PipelineExecution {
        message: format!("Step '{}' failed: {}", step.display_name(), reason),
      });
    }
    event!(Level::DEBUG, "Step processing finished successfully.");
    Ok(())
  }
}
