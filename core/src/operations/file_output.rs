// weaver/src/operations/file_output.rs

use crate::core::context::{LogLevel, OperationContext, OperationResult};
use crate::core::operation::{Operation, OperationType, ParameterSpec, ParameterType};
use crate::error::{EngineError, EngineResult};
use crate::rdf::write_ntriples;
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::{event, instrument, Level};

const ID: &str = "rdf-file-output";

/// Writes the input graph to a file as N-Triples.
#[derive(Debug, Clone, Copy, Default)]
pub struct RdfFileOutput;

#[async_trait]
impl Operation for RdfFileOutput {
  fn id(&self) -> &str {
    ID
  }

  fn name(&self) -> &str {
    "RDF File Output"
  }

  fn description(&self) -> &str {
    "Writes the input graph to a file as N-Triples"
  }

  fn operation_type(&self) -> OperationType {
    OperationType::Output
  }

  fn parameters(&self) -> Vec<ParameterSpec> {
    vec![ParameterSpec::required("filePath", ParameterType::String, "Destination file, parent directories are created")]
  }

  #[instrument(name = "RdfFileOutput::execute", skip_all, err(Display))]
  async fn execute(&self, ctx: OperationContext) -> EngineResult<OperationResult> {
    let path = Path::new(ctx.require_str(ID, "filePath")?);
    let graph = ctx
      .input_graph
      .as_ref()
      .ok_or_else(|| EngineError::operation(ID, "No input graph provided"))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent)?;
    }
    let written = write_ntriples(graph, BufWriter::new(File::create(path)?))?;
    event!(Level::INFO, path = %path.display(), triples = written, "Graph written.");
    ctx
      .callback
      .on_log(LogLevel::Info, &format!("Wrote {} triples to {}", written, path.display()));
    ctx.callback.on_metric("triplesWritten", written as f64);

    Ok(
      OperationResult::success()
        .metadata("triplesWritten", written)
        .metadata("filePath", path.display().to_string()),
    )
  }
}
