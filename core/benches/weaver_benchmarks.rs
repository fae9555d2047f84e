use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::runtime::Runtime; // To run async code within Criterion
use weaver::rdf::{parse_graph, RdfFormat};
use weaver::{
  expand_template, EngineConfig, NoopExecutionCallback, OperationRegistry, PipelineDefinition, PipelineExecutor,
  PipelineStep, Record, ShaclValidator, ShapesGraph, Value, Variables,
};

const SHAPES: &str = r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix ex: <http://ex.org/> .

ex:OrgShape a sh:NodeShape ;
  sh:targetClass ex:Organization ;
  sh:property [ sh:path ex:name ; sh:minCount 1 ; sh:maxCount 1 ; sh:datatype xsd:string ] ;
  sh:property [ sh:path ex:founded ; sh:minInclusive 1800 ] .
"#;

// --- Helpers ---

fn org_csv(rows: usize) -> String {
  let mut csv = String::from("id,name,founded\n");
  for i in 0..rows {
    csv.push_str(&format!("{},Org {},{}\n", i, i, 1900 + (i % 120)));
  }
  csv
}

fn org_turtle(rows: usize) -> String {
  let mut ttl = String::from("@prefix ex: <http://ex.org/> .\n");
  for i in 0..rows {
    ttl.push_str(&format!(
      "ex:org{} a ex:Organization ; ex:name \"Org {}\" ; ex:founded {} .\n",
      i,
      i,
      1900 + (i % 120)
    ));
  }
  ttl
}

fn mapping_pipeline(csv: String) -> PipelineDefinition {
  let mut properties = BTreeMap::new();
  properties.insert("name".to_string(), Value::from("http://ex.org/name"));
  properties.insert("founded".to_string(), Value::from("http://ex.org/founded"));
  let mut datatypes = BTreeMap::new();
  datatypes.insert("founded".to_string(), Value::from("gYear"));

  PipelineDefinition::new("bench", "Bench")
    .with_step(PipelineStep::new("read", "csv-source").with_param("content", csv))
    .with_step(
      PipelineStep::new("map", "rdf-mapping")
        .with_param("baseUri", "http://ex.org/org/")
        .with_param("subjectTemplate", "{founded}/{id}")
        .with_param("typeUri", "http://ex.org/Organization")
        .with_param("propertyMappings", Value::Map(properties))
        .with_param("datatypeMappings", Value::Map(datatypes)),
    )
}

// --- Benchmark Functions ---

fn bench_csv_mapping_pipeline(c: &mut Criterion) {
  let mut group = c.benchmark_group("CsvMappingPipeline");
  let rt = Runtime::new().unwrap();
  let executor = PipelineExecutor::new(Arc::new(OperationRegistry::with_builtins(&EngineConfig::default())));

  for rows in [100usize, 1_000, 10_000].iter() {
    let definition = mapping_pipeline(org_csv(*rows));
    group.throughput(Throughput::Elements(*rows as u64));
    group.bench_with_input(BenchmarkId::from_parameter(rows), &definition, |b, def| {
      b.to_async(&rt).iter(|| {
        let executor = executor.clone();
        async move {
          let result = executor
            .execute(def, Variables::new(), false, Arc::new(NoopExecutionCallback))
            .await;
          assert!(result.success);
          criterion::black_box(result.step_results.len());
        }
      });
    });
  }
  group.finish();
}

fn bench_template_expansion(c: &mut Criterion) {
  let mut group = c.benchmark_group("TemplateExpansion");
  let mut record = Record::new();
  record.insert("year".to_string(), Value::Integer(2024));
  record.insert("id".to_string(), Value::from("org 42/ä"));

  for template in ["{id}", "http://ex.org/{year}/{id}", "{+id}#{year}"].iter() {
    group.bench_with_input(BenchmarkId::from_parameter(template), template, |b, t| {
      b.iter(|| criterion::black_box(expand_template(t, &record).unwrap()));
    });
  }
  group.finish();
}

fn bench_shacl_validation(c: &mut Criterion) {
  let mut group = c.benchmark_group("ShaclValidation");
  let shapes = ShapesGraph::parse(SHAPES).unwrap();
  let validator = ShaclValidator::new();

  for subjects in [100usize, 1_000].iter() {
    let graph = parse_graph(&org_turtle(*subjects), RdfFormat::Turtle).unwrap();
    group.throughput(Throughput::Elements(*subjects as u64));
    group.bench_with_input(BenchmarkId::from_parameter(subjects), &graph, |b, g| {
      b.iter(|| {
        let report = validator.validate(g, &shapes);
        criterion::black_box(report.conforms);
      });
    });
  }
  group.finish();
}

fn bench_registry_lookup(c: &mut Criterion) {
  let registry = OperationRegistry::with_builtins(&EngineConfig::default());
  c.bench_function("RegistryLookup/get", |b| {
    b.iter(|| criterion::black_box(registry.get("rdf-mapping").is_some()));
  });
}

criterion_group!(
  benches,
  bench_csv_mapping_pipeline,
  bench_template_expansion,
  bench_shacl_validation,
  bench_registry_lookup
);
criterion_main!(benches);
