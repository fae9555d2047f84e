// core/examples/csv_to_rdf.rs

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use weaver::{
  EngineConfig, EngineResult, ExecutionCallback, LogLevel, OperationRegistry, PipelineDefinition, PipelineExecutor,
  PipelineStep, ProcessEnv, Value, Variables,
};

const ORGS: &str = "id,name,founded,homepage\n\
42,Acme,1999,http://acme.example/\n\
7,Globex,2004,\n\
13,Initech,1988,http://initech.example/\n";

// 1. A run observer that prints what the executor reports
struct ConsoleProgress;

impl ExecutionCallback for ConsoleProgress {
  fn on_step_start(&self, step_id: &str, step_name: &str) {
    info!("-> {} ({})", step_name, step_id);
  }

  fn on_step_complete(&self, step_id: &str, success: bool) {
    info!("<- {} success={}", step_id, success);
  }

  fn on_log(&self, step_id: &str, level: LogLevel, message: &str) {
    info!("   [{}] {}: {}", level, step_id, message);
  }

  fn on_complete(&self, success: bool, error: Option<&str>) {
    info!("Run finished: success={} error={:?}", success, error);
  }
}

#[tokio::main]
async fn main() -> EngineResult<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- CSV to RDF Example ---");

  // 2. Built-in operations, configured from WEAVER_* environment variables
  let config = EngineConfig::from_env(&ProcessEnv)?;
  let registry = Arc::new(OperationRegistry::with_builtins(&config));

  // 3. Describe the pipeline: read, map, write
  let mut properties = BTreeMap::new();
  properties.insert("name".to_string(), Value::from("http://schema.org/name"));
  properties.insert("founded".to_string(), Value::from("http://schema.org/foundingDate"));
  properties.insert("homepage".to_string(), Value::from("http://schema.org/url"));
  let mut datatypes = BTreeMap::new();
  datatypes.insert("founded".to_string(), Value::from("gYear"));

  let output = std::env::temp_dir().join("weaver-orgs.nt");
  let definition = PipelineDefinition::new("orgs", "Organizations")
    .with_variable("base", "http://ex.org/org/")
    .with_step(PipelineStep::new("read", "csv-source").named("Read CSV").with_param("content", ORGS))
    .with_step(
      PipelineStep::new("map", "rdf-mapping")
        .named("Map rows")
        .with_param("baseUri", "${base}")
        .with_param("subjectColumn", "id")
        .with_param("typeUri", "http://schema.org/Organization")
        .with_param("propertyMappings", Value::Map(properties))
        .with_param("datatypeMappings", Value::Map(datatypes)),
    )
    .with_step(
      PipelineStep::new("write", "rdf-file-output")
        .named("Write N-Triples")
        .with_param("filePath", output.display().to_string()),
    );

  // 4. Dry run first: the output step is skipped
  let executor = PipelineExecutor::new(registry);
  let dry = executor
    .execute(&definition, Variables::new(), true, Arc::new(ConsoleProgress))
    .await;
  info!("Dry run success={}, steps={}", dry.success, dry.step_results.len());

  // 5. The real run
  let result = executor
    .execute(&definition, Variables::new(), false, Arc::new(ConsoleProgress))
    .await;
  for (name, value) in &result.metrics {
    info!("metric {} = {}", name, value);
  }
  if let Some(written) = result.step_result("write") {
    info!("Wrote {:?} triples to {}", written.metadata.get("triplesWritten"), output.display());
  }
  info!("Took {:?}", result.duration());

  info!("--- CSV to RDF Example End ---");
  Ok(())
}
