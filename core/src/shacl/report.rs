// weaver/src/shacl/report.rs

use crate::shacl::shapes::PropertyPath;
use crate::shacl::vocab as sh;
use chrono::{DateTime, Utc};
use oxrdf::vocab::rdf;
use oxrdf::{BlankNode, Graph, Literal, NamedNode, Subject, Term, Triple};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
  Info,
  Warning,
  #[default]
  Violation,
}

impl Severity {
  pub fn iri(&self) -> NamedNode {
    match self {
      Severity::Info => sh::INFO.into_owned(),
      Severity::Warning => sh::WARNING.into_owned(),
      Severity::Violation => sh::VIOLATION.into_owned(),
    }
  }
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Severity::Info => "INFO",
      Severity::Warning => "WARNING",
      Severity::Violation => "VIOLATION",
    })
  }
}

/// One failed constraint for one focus node (and value, when the component
/// is value-based).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
  pub severity: Severity,
  pub focus_node: Term,
  pub result_path: Option<PropertyPath>,
  pub value: Option<Term>,
  pub message: String,
  pub source_constraint_component: NamedNode,
  pub source_shape: Term,
}

impl fmt::Display for ValidationResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}] {}", self.severity, self.focus_node)?;
    if let Some(path) = &self.result_path {
      write!(f, " {}", path)?;
    }
    write!(f, ": {}", self.message)
  }
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
  pub conforms: bool,
  pub violation_count: usize,
  pub warning_count: usize,
  pub info_count: usize,
  pub results: Vec<ValidationResult>,
  pub timestamp: DateTime<Utc>,
  pub duration: Duration,
}

impl ValidationReport {
  /// Builds the report and its counts. Conformance only looks at violations.
  pub fn new(results: Vec<ValidationResult>, timestamp: DateTime<Utc>, duration: Duration) -> Self {
    let count = |severity: Severity| results.iter().filter(|r| r.severity == severity).count();
    let violation_count = count(Severity::Violation);
    Self {
      conforms: violation_count == 0,
      violation_count,
      warning_count: count(Severity::Warning),
      info_count: count(Severity::Info),
      results,
      timestamp,
      duration,
    }
  }

  pub fn results_with_severity(&self, severity: Severity) -> impl Iterator<Item = &ValidationResult> {
    self.results.iter().filter(move |r| r.severity == severity)
  }

  /// Renders the report as a `sh:ValidationReport` graph. Paths other than
  /// plain predicates are written as their SPARQL string form.
  pub fn to_graph(&self) -> Graph {
    let mut graph = Graph::new();
    let report = BlankNode::default();
    graph.insert(&Triple::new(report.clone(), rdf::TYPE, sh::VALIDATION_REPORT.into_owned()));
    graph.insert(&Triple::new(report.clone(), sh::CONFORMS, Literal::from(self.conforms)));

    for result in &self.results {
      let node = BlankNode::default();
      graph.insert(&Triple::new(report.clone(), sh::RESULT, node.clone()));
      let subject = Subject::from(node);
      let mut add = |predicate: oxrdf::NamedNodeRef<'_>, object: Term| {
        graph.insert(&Triple::new(subject.clone(), predicate, object));
      };
      add(rdf::TYPE, sh::VALIDATION_RESULT.into_owned().into());
      add(sh::RESULT_SEVERITY, result.severity.iri().into());
      add(sh::FOCUS_NODE, result.focus_node.clone());
      if let Some(path) = &result.result_path {
        let object: Term = match path.as_predicate() {
          Some(p) => p.clone().into(),
          None => Literal::new_simple_literal(path.to_string()).into(),
        };
        add(sh::RESULT_PATH, object);
      }
      if let Some(value) = &result.value {
        add(sh::VALUE, value.clone());
      }
      add(sh::RESULT_MESSAGE, Literal::new_simple_literal(&result.message).into());
      add(
        sh::SOURCE_CONSTRAINT_COMPONENT,
        result.source_constraint_component.clone().into(),
      );
      add(sh::SOURCE_SHAPE, result.source_shape.clone());
    }
    graph
  }
}

impl fmt::Display for ValidationReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(
      f,
      "conforms={} violations={} warnings={} info={}",
      self.conforms, self.violation_count, self.warning_count, self.info_count
    )?;
    for result in &self.results {
      writeln!(f, "  {}", result)?;
    }
    Ok(())
  }
}
