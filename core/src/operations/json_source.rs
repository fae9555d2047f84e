// weaver/src/operations/json_source.rs

use crate::core::context::{OperationContext, OperationResult};
use crate::core::operation::{Operation, OperationType, ParameterSpec, ParameterType};
use crate::core::stream::RecordStream;
use crate::core::value::{Record, Value};
use crate::error::{EngineError, EngineResult};
use crate::operations::{open_input, Cancellable};
use async_trait::async_trait;
use std::io::{BufRead, BufReader};
use tracing::{event, instrument, Level};

const ID: &str = "json-source";

/// Reads JSON documents or JSON Lines as records.
///
/// A top-level array yields one record per element, an object yields a
/// single record, and `arrayField` (dot separated) picks a nested array.
/// With `jsonLines` the input is streamed one line at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSource;

fn into_record(value: serde_json::Value, position: usize) -> EngineResult<Record> {
  match Value::from(value) {
    Value::Map(map) => Ok(map),
    other => Err(EngineError::operation(
      ID,
      format!("Element {} is not a JSON object: {}", position, other),
    )),
  }
}

fn select_array(document: serde_json::Value, field: Option<&str>) -> EngineResult<Vec<serde_json::Value>> {
  let mut current = document;
  if let Some(path) = field {
    for key in path.split('.').filter(|k| !k.is_empty()) {
      current = match current {
        serde_json::Value::Object(mut map) => map
          .remove(key)
          .ok_or_else(|| EngineError::operation(ID, format!("Field '{}' not found", path)))?,
        _ => return Err(EngineError::operation(ID, format!("Field '{}' not found", path))),
      };
    }
  }
  match current {
    serde_json::Value::Array(items) => Ok(items),
    object @ serde_json::Value::Object(_) if field.is_none() => Ok(vec![object]),
    _ => Err(EngineError::operation(
      ID,
      match field {
        Some(path) => format!("Field '{}' is not an array", path),
        None => "Top-level JSON value must be an array or an object".to_string(),
      },
    )),
  }
}

#[async_trait]
impl Operation for JsonSource {
  fn id(&self) -> &str {
    ID
  }

  fn name(&self) -> &str {
    "JSON Source"
  }

  fn description(&self) -> &str {
    "Reads JSON or JSON Lines from a file or inline content as a record stream"
  }

  fn operation_type(&self) -> OperationType {
    OperationType::Source
  }

  fn parameters(&self) -> Vec<ParameterSpec> {
    vec![
      ParameterSpec::optional("filePath", ParameterType::String, "Path of the JSON file"),
      ParameterSpec::optional("content", ParameterType::String, "Inline JSON text, used when no filePath is set"),
      ParameterSpec::optional("arrayField", ParameterType::String, "Dot separated path to the array of records"),
      ParameterSpec::optional("jsonLines", ParameterType::Boolean, "One JSON object per line").with_default(false),
    ]
  }

  #[instrument(name = "JsonSource::execute", skip_all, err(Display))]
  async fn execute(&self, ctx: OperationContext) -> EngineResult<OperationResult> {
    let input = open_input(&ctx, ID)?;

    let stream = if ctx.param_bool("jsonLines", false) {
      event!(Level::DEBUG, "Streaming JSON Lines.");
      let lines = BufReader::new(input)
        .lines()
        .enumerate()
        .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
        .map(|(index, line)| -> EngineResult<Record> {
          let line = line?;
          let value = serde_json::from_str(&line)
            .map_err(|e| EngineError::operation(ID, format!("Invalid JSON on line {}: {}", index + 1, e)))?;
          into_record(value, index + 1)
        });
      RecordStream::new(Cancellable::new(lines, &ctx))
    } else {
      let document: serde_json::Value = serde_json::from_reader(input)
        .map_err(|e| EngineError::operation(ID, format!("Invalid JSON: {}", e)))?;
      let items = select_array(document, ctx.param_str("arrayField"))?;
      event!(Level::DEBUG, records = items.len(), "JSON document loaded.");
      let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| into_record(item, index + 1));
      RecordStream::new(Cancellable::new(records, &ctx))
    };

    Ok(OperationResult::with_stream(stream))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::value::Parameters;

  async fn read(pairs: &[(&str, Value)]) -> EngineResult<Vec<Record>> {
    let params: Parameters = pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
    let result = JsonSource
      .execute(OperationContext::new(params))
      .await?;
    result.output_stream.unwrap().collect_records()
  }

  #[tokio::test]
  async fn array_and_object_documents() {
    let rows = read(&[("content", Value::from(r#"[{"id": 1}, {"id": 2, "tags": ["a"]}]"#))])
      .await
      .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["id"], Value::Integer(2));

    let rows = read(&[("content", Value::from(r#"{"id": "x"}"#))]).await.unwrap();
    assert_eq!(rows.len(), 1);
  }

  #[tokio::test]
  async fn nested_array_field() {
    let rows = read(&[
      ("content", Value::from(r#"{"data": {"items": [{"n": 1}, {"n": 2}, {"n": 3}]}}"#)),
      ("arrayField", Value::from("data.items")),
    ])
    .await
    .unwrap();
    assert_eq!(rows.len(), 3);

    let err = read(&[("content", Value::from(r#"{"data": 1}"#)), ("arrayField", Value::from("data"))])
      .await
      .unwrap_err();
    assert!(err.to_string().contains("not an array"));
  }

  #[tokio::test]
  async fn json_lines_skip_blank_lines() {
    let rows = read(&[
      ("content", Value::from("{\"a\": 1}\n\n{\"a\": 2}\n")),
      ("jsonLines", Value::Bool(true)),
    ])
    .await
    .unwrap();
    assert_eq!(rows.len(), 2);
  }
}
