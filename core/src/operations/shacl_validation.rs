// weaver/src/operations/shacl_validation.rs

use crate::config::{EngineConfig, ViolationPolicy};
use crate::core::context::{LogLevel, OperationContext, OperationResult};
use crate::core::operation::{Operation, OperationType, ParameterSpec, ParameterType};
use crate::core::value::Value;
use crate::error::{EngineError, EngineResult};
use crate::rdf::owned_label;
use crate::shacl::{ShaclValidator, ShapesGraph, ValidationReport, ValidationResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{event, instrument, Level};

const ID: &str = "shacl-validation";

/// Validates the input graph against a shapes graph and passes the input
/// graph through unchanged.
///
/// Without `shapesFile` or `shapesContent` the step is a pass-through with
/// `skipped: true`. `onViolation` decides whether a non-conforming graph
/// fails the step.
#[derive(Debug, Clone)]
pub struct ShaclValidation {
  validator: ShaclValidator,
  default_policy: ViolationPolicy,
}

impl ShaclValidation {
  pub fn new(config: &EngineConfig) -> Self {
    Self {
      validator: ShaclValidator::from_config(config),
      default_policy: config.on_violation_default,
    }
  }
}

fn load_shapes_text(ctx: &OperationContext) -> EngineResult<Option<String>> {
  if let Some(path) = ctx.param_str("shapesFile") {
    let text = std::fs::read_to_string(path)
      .map_err(|e| EngineError::operation(ID, format!("Cannot read shapes file '{}': {}", path, e)))?;
    return Ok(Some(text));
  }
  Ok(ctx.param_str("shapesContent").map(str::to_string))
}

fn result_summary(result: &ValidationResult) -> Value {
  let mut entry = BTreeMap::new();
  entry.insert("severity".to_string(), Value::from(result.severity.to_string()));
  entry.insert("focusNode".to_string(), Value::from(owned_label(&result.focus_node)));
  if let Some(path) = &result.result_path {
    entry.insert("resultPath".to_string(), Value::from(path.to_string()));
  }
  if let Some(value) = &result.value {
    entry.insert("value".to_string(), Value::from(owned_label(value)));
  }
  entry.insert("message".to_string(), Value::from(result.message.as_str()));
  entry.insert(
    "sourceConstraintComponent".to_string(),
    Value::from(result.source_constraint_component.as_str()),
  );
  entry.insert("sourceShape".to_string(), Value::from(owned_label(&result.source_shape)));
  Value::Map(entry)
}

fn with_report(result: OperationResult, report: &ValidationReport) -> OperationResult {
  result
    .metadata("conforms", report.conforms)
    .metadata("violationCount", report.violation_count)
    .metadata("warningCount", report.warning_count)
    .metadata("infoCount", report.info_count)
    .metadata("results", report.results.iter().map(result_summary).collect::<Vec<_>>())
}

#[async_trait]
impl Operation for ShaclValidation {
  fn id(&self) -> &str {
    ID
  }

  fn name(&self) -> &str {
    "SHACL Validation"
  }

  fn description(&self) -> &str {
    "Validates the input graph against SHACL shapes"
  }

  fn operation_type(&self) -> OperationType {
    OperationType::Validation
  }

  fn parameters(&self) -> Vec<ParameterSpec> {
    vec![
      ParameterSpec::optional("shapesFile", ParameterType::String, "Path of a Turtle shapes graph"),
      ParameterSpec::optional("shapesContent", ParameterType::String, "Inline Turtle shapes graph"),
      ParameterSpec::optional("onViolation", ParameterType::String, "error, warn or continue"),
    ]
  }

  #[instrument(name = "ShaclValidation::execute", skip_all, err(Display))]
  async fn execute(&self, ctx: OperationContext) -> EngineResult<OperationResult> {
    let Some(shapes_text) = load_shapes_text(&ctx)? else {
      event!(Level::INFO, "No shapes supplied, validation skipped.");
      ctx.callback.on_log(LogLevel::Info, "No shapes supplied, validation skipped");
      let passthrough = OperationResult {
        success: true,
        output_graph: ctx.input_graph.clone(),
        ..Default::default()
      };
      return Ok(passthrough.metadata("skipped", true));
    };

    let policy = match ctx.param_str("onViolation") {
      Some(raw) => raw.parse().map_err(|e: String| EngineError::operation(ID, e))?,
      None => self.default_policy,
    };
    let data = ctx
      .input_graph
      .clone()
      .ok_or_else(|| EngineError::operation(ID, "No input graph provided"))?;
    let shapes = ShapesGraph::parse(&shapes_text).map_err(|e| EngineError::operation(ID, e.to_string()))?;

    let report = self.validator.validate(&data, &shapes);
    ctx.callback.on_metric("violations", report.violation_count as f64);
    ctx.callback.on_metric("warnings", report.warning_count as f64);

    if report.conforms {
      ctx.callback.on_log(
        LogLevel::Info,
        &format!("Graph conforms ({} warnings, {} info)", report.warning_count, report.info_count),
      );
      return Ok(with_report(OperationResult::with_graph(data), &report));
    }

    let summary = format!(
      "Validation failed with {} violation(s){}",
      report.violation_count,
      report
        .results_with_severity(crate::shacl::Severity::Violation)
        .next()
        .map(|r| format!(": {}", r))
        .unwrap_or_default()
    );
    match policy {
      ViolationPolicy::Error => {
        ctx.callback.on_log(LogLevel::Error, &summary);
        let failed = OperationResult::failure(summary);
        Ok(with_report(failed, &report))
      }
      ViolationPolicy::Warn => {
        ctx.callback.on_log(LogLevel::Warn, &summary);
        Ok(with_report(OperationResult::with_graph(data), &report))
      }
      ViolationPolicy::Continue => {
        ctx.callback.on_log(LogLevel::Info, &summary);
        Ok(with_report(OperationResult::with_graph(data), &report))
      }
    }
  }
}
