// weaver/src/operations/mod.rs

//! Built-in operations and the startup table that registers them.

mod csv_source;
mod file_output;
mod json_source;
mod rdf_mapping;
mod rdf_source;
mod shacl_validation;

pub use csv_source::CsvSource;
pub use file_output::RdfFileOutput;
pub use json_source::JsonSource;
pub use rdf_mapping::RdfMapping;
pub use rdf_source::RdfSource;
pub use shacl_validation::ShaclValidation;

use crate::config::EngineConfig;
use crate::core::context::OperationContext;
use crate::core::stream::CancellationToken;
use crate::core::value::Record;
use crate::error::{EngineError, EngineResult};
use crate::registry::OperationRegistry;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::sync::Arc;

/// Registers every built-in operation.
pub fn register_builtins(registry: &OperationRegistry, config: &EngineConfig) {
  registry.register(Arc::new(CsvSource));
  registry.register(Arc::new(JsonSource));
  registry.register(Arc::new(RdfSource));
  registry.register(Arc::new(RdfMapping::new(config)));
  registry.register(Arc::new(ShaclValidation::new(config)));
  registry.register(Arc::new(RdfFileOutput));
}

/// Opens `filePath` if set, otherwise reads inline `content`.
pub(crate) fn open_input(ctx: &OperationContext, operation_id: &str) -> EngineResult<Box<dyn Read + Send>> {
  if let Some(path) = ctx.param_str("filePath") {
    let file = File::open(path).map_err(|e| EngineError::Operation {
      operation_id: operation_id.to_string(),
      step_id: None,
      message: format!("Cannot open '{}': {}", path, e),
      source: Some(e.into()),
    })?;
    return Ok(Box::new(BufReader::new(file)));
  }
  if let Some(content) = ctx.param("content").and_then(|v| v.as_str()) {
    return Ok(Box::new(Cursor::new(content.as_bytes().to_vec())));
  }
  Err(EngineError::operation(
    operation_id,
    "Either 'filePath' or 'content' must be provided",
  ))
}

pub(crate) fn read_input_text(ctx: &OperationContext, operation_id: &str) -> EngineResult<String> {
  let mut text = String::new();
  open_input(ctx, operation_id)?
    .read_to_string(&mut text)
    .map_err(|e| EngineError::operation(operation_id, format!("Cannot read input: {}", e)))?;
  Ok(text)
}

/// Wraps a lazy record iterator with a cancellation check per record.
///
/// Source streams run while a later step pulls them, so progress is left to
/// the consuming step and never reported under the source's step id.
pub(crate) struct Cancellable<I> {
  inner: I,
  cancellation: CancellationToken,
  done: bool,
}

impl<I> Cancellable<I> {
  pub(crate) fn new(inner: I, ctx: &OperationContext) -> Self {
    Self {
      inner,
      cancellation: ctx.cancellation.clone(),
      done: false,
    }
  }
}

impl<I> Iterator for Cancellable<I>
where
  I: Iterator<Item = EngineResult<Record>>,
{
  type Item = EngineResult<Record>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done {
      return None;
    }
    if self.cancellation.is_cancelled() {
      self.done = true;
      return Some(Err(EngineError::Cancelled { step_id: None }));
    }
    let item = self.inner.next();
    self.done = item.is_none();
    item
  }
}
