// core/examples/validate_graph.rs

use tracing::{info, warn};
use weaver::rdf::{parse_graph, RdfFormat};
use weaver::shacl::Severity;
use weaver::{EngineResult, ShaclValidator, ShapesGraph};

const DATA: &str = r#"
@prefix ex: <http://ex.org/> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

ex:acme a ex:Organization ; ex:name "Acme" ; ex:founded "1999"^^xsd:gYear .
ex:globex a ex:Organization ; ex:founded "2004"^^xsd:gYear ; ex:ceo ex:hank .
ex:hank a ex:Person ; ex:name "Hank" , "Hank Scorpio" .
"#;

const SHAPES: &str = r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix ex: <http://ex.org/> .

ex:OrgShape a sh:NodeShape ;
  sh:targetClass ex:Organization ;
  sh:property [ sh:path ex:name ; sh:minCount 1 ; sh:message "Every organization needs a name" ] ;
  sh:property [ sh:path ex:founded ; sh:datatype xsd:gYear ] ;
  sh:property [ sh:path ex:ceo ; sh:node ex:PersonShape ] .

ex:PersonShape a sh:NodeShape ;
  sh:property [ sh:path ex:name ; sh:maxCount 1 ; sh:severity sh:Warning ] .
"#;

fn main() -> EngineResult<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- SHACL Validation Example ---");

  // 1. Check the shapes text on its own
  info!("Shapes are well formed: {}", ShaclValidator::validate_syntax(SHAPES));

  // 2. Compile shapes once, validate the data graph
  let shapes = ShapesGraph::parse(SHAPES)?;
  let data = parse_graph(DATA, RdfFormat::Turtle)?;
  let report = ShaclValidator::new().validate(&data, &shapes);

  info!(
    "conforms={} violations={} warnings={}",
    report.conforms, report.violation_count, report.warning_count
  );
  for result in report.results_with_severity(Severity::Violation) {
    warn!("{}", result);
  }
  for result in report.results_with_severity(Severity::Warning) {
    info!("{}", result);
  }

  // 3. The report as an RDF graph (sh:ValidationReport)
  info!("Report graph has {} triples", report.to_graph().len());

  info!("--- SHACL Validation Example End ---");
  Ok(())
}
