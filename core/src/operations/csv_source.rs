// weaver/src/operations/csv_source.rs

use crate::core::context::{OperationContext, OperationResult};
use crate::core::operation::{Operation, OperationType, ParameterSpec, ParameterType};
use crate::core::stream::RecordStream;
use crate::core::value::{Record, Value};
use crate::error::{EngineError, EngineResult};
use crate::operations::{open_input, Cancellable};
use async_trait::async_trait;
use tracing::{event, instrument, Level};

const ID: &str = "csv-source";

/// Streams CSV rows as records. Rows are parsed as the stream is pulled.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSource;

fn parse_delimiter(raw: &str) -> EngineResult<u8> {
  let raw = if raw == "\\t" { "\t" } else { raw };
  match raw.as_bytes() {
    [byte] if byte.is_ascii() => Ok(*byte),
    _ => Err(EngineError::operation(
      ID,
      format!("Delimiter must be a single ASCII character, got '{}'", raw),
    )),
  }
}

fn column_name(headers: Option<&[String]>, index: usize) -> String {
  headers
    .and_then(|h| h.get(index))
    .cloned()
    .unwrap_or_else(|| format!("column{}", index + 1))
}

#[async_trait]
impl Operation for CsvSource {
  fn id(&self) -> &str {
    ID
  }

  fn name(&self) -> &str {
    "CSV Source"
  }

  fn description(&self) -> &str {
    "Reads CSV rows from a file or inline content as a record stream"
  }

  fn operation_type(&self) -> OperationType {
    OperationType::Source
  }

  fn parameters(&self) -> Vec<ParameterSpec> {
    vec![
      ParameterSpec::optional("filePath", ParameterType::String, "Path of the CSV file"),
      ParameterSpec::optional("content", ParameterType::String, "Inline CSV text, used when no filePath is set"),
      ParameterSpec::optional("delimiter", ParameterType::String, "Field delimiter").with_default(","),
      ParameterSpec::optional("hasHeader", ParameterType::Boolean, "First row holds column names").with_default(true),
      ParameterSpec::optional("inferTypes", ParameterType::Boolean, "Parse numbers and booleans").with_default(false),
    ]
  }

  #[instrument(name = "CsvSource::execute", skip_all, err(Display))]
  async fn execute(&self, ctx: OperationContext) -> EngineResult<OperationResult> {
    let delimiter = parse_delimiter(ctx.param("delimiter").and_then(Value::as_str).unwrap_or(","))?;
    let has_header = ctx.param_bool("hasHeader", true);
    let infer_types = ctx.param_bool("inferTypes", false);

    let mut reader = csv::ReaderBuilder::new()
      .delimiter(delimiter)
      .has_headers(has_header)
      .flexible(true)
      .from_reader(open_input(&ctx, ID)?);

    let headers: Option<Vec<String>> = if has_header {
      let headers = reader
        .headers()
        .map_err(|e| EngineError::operation(ID, format!("Cannot read CSV header: {}", e)))?;
      Some(headers.iter().map(|h| h.trim().to_string()).collect())
    } else {
      None
    };
    event!(Level::DEBUG, columns = ?headers, has_header, infer_types, "CSV source opened.");

    let columns = headers.clone().unwrap_or_default();
    let rows = reader.into_records().enumerate().map(move |(index, row)| -> EngineResult<Record> {
      let row = row.map_err(|e| EngineError::operation(ID, format!("Malformed CSV row {}: {}", index + 1, e)))?;
      let record: Record = row
        .iter()
        .enumerate()
        .map(|(i, field)| {
          let value = if infer_types { Value::infer(field) } else { Value::from(field) };
          (column_name(headers.as_deref(), i), value)
        })
        .collect();
      Ok(record)
    });

    let stream = RecordStream::new(Cancellable::new(rows, &ctx));
    Ok(OperationResult::with_stream(stream).metadata("columns", columns))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::value::Parameters;

  fn params(pairs: &[(&str, Value)]) -> Parameters {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
  }

  #[tokio::test]
  async fn streams_rows_with_header() {
    let op = CsvSource;
    let ctx = OperationContext::new(params(&[("content", Value::from("id,name\n42,Acme\n7,Globex\n"))]));
    let result = op.execute(ctx).await.unwrap();
    let rows = result.output_stream.unwrap().collect_records().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], Value::from("42"));
    assert_eq!(rows[1]["name"], Value::from("Globex"));
  }

  #[tokio::test]
  async fn headerless_rows_with_inference() {
    let op = CsvSource;
    let ctx = OperationContext::new(params(&[
      ("content", Value::from("1;2.5;true\n")),
      ("delimiter", Value::from(";")),
      ("hasHeader", Value::Bool(false)),
      ("inferTypes", Value::Bool(true)),
    ]));
    let rows = op
      .execute(ctx)
      .await
      .unwrap()
      .output_stream
      .unwrap()
      .collect_records()
      .unwrap();
    assert_eq!(rows[0]["column1"], Value::Integer(1));
    assert_eq!(rows[0]["column2"], Value::Float(2.5));
    assert_eq!(rows[0]["column3"], Value::Bool(true));
  }

  #[tokio::test]
  async fn missing_input_is_an_operation_error() {
    let op = CsvSource;
    let err = op.execute(OperationContext::new(Parameters::new())).await.unwrap_err();
    assert!(matches!(err, EngineError::Operation { ref operation_id, .. } if operation_id == ID));
  }
}
