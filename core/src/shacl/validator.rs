// weaver/src/shacl/validator.rs

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::shacl::constraints;
use crate::shacl::report::{ValidationReport, ValidationResult};
use crate::shacl::shapes::{as_subject, objects, PropertyPath, Shape, ShapesGraph, Target};
use chrono::Utc;
use oxrdf::vocab::{rdf as rdf_vocab, rdfs};
use oxrdf::{Graph, NamedNode, NamedNodeRef, Term, TermRef};
use std::collections::{HashSet, VecDeque};
use std::time::Instant;
use tracing::{event, instrument, Level};

/// Validates data graphs against compiled shapes.
#[derive(Debug, Clone)]
pub struct ShaclValidator {
  max_depth: usize,
}

impl Default for ShaclValidator {
  fn default() -> Self {
    Self::from_config(&EngineConfig::default())
  }
}

impl ShaclValidator {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_config(config: &EngineConfig) -> Self {
    Self {
      max_depth: config.max_shape_depth,
    }
  }

  pub fn with_max_depth(mut self, max_depth: usize) -> Self {
    self.max_depth = max_depth;
    self
  }

  #[instrument(name = "shacl_validate", skip_all, fields(triples = data.len(), shapes = shapes.len()))]
  pub fn validate(&self, data: &Graph, shapes: &ShapesGraph) -> ValidationReport {
    let started = Instant::now();
    let timestamp = Utc::now();
    let eval = Evaluation {
      data,
      shapes,
      max_depth: self.max_depth,
    };

    let mut results = Vec::new();
    for shape in shapes.targeted_shapes() {
      let focus_nodes = eval.focus_nodes(shape);
      event!(Level::TRACE, shape = %shape.id, focus_nodes = focus_nodes.len(), "Evaluating shape.");
      eval.validate_shape(shape, &focus_nodes, 0, &mut results);
    }

    let report = ValidationReport::new(results, timestamp, started.elapsed());
    event!(
      Level::DEBUG,
      conforms = report.conforms,
      violations = report.violation_count,
      warnings = report.warning_count,
      info = report.info_count,
      "Validation finished."
    );
    report
  }

  /// Parses `shapes_text` as Turtle, then validates.
  pub fn validate_text(&self, data: &Graph, shapes_text: &str) -> EngineResult<ValidationReport> {
    let shapes = ShapesGraph::parse(shapes_text)?;
    Ok(self.validate(data, &shapes))
  }

  /// True if the text parses and compiles as a shapes graph. No data is read.
  pub fn validate_syntax(shapes_text: &str) -> bool {
    match ShapesGraph::parse(shapes_text) {
      Ok(_) => true,
      Err(e) => {
        event!(Level::DEBUG, error = %e, "Shapes syntax check failed.");
        false
      }
    }
  }
}

/// State of one validation call.
pub(crate) struct Evaluation<'a> {
  data: &'a Graph,
  shapes: &'a ShapesGraph,
  max_depth: usize,
}

impl Evaluation<'_> {
  pub(crate) fn shape(&self, id: &Term) -> Option<&Shape> {
    self.shapes.get(id)
  }

  fn focus_nodes(&self, shape: &Shape) -> Vec<Term> {
    let mut nodes = Vec::new();
    for target in &shape.targets {
      match target {
        Target::Class(class) => nodes.extend(self.instances_of(class.as_ref())),
        Target::Node(node) => nodes.push(node.clone()),
        Target::SubjectsOf(p) => nodes.extend(
          self
            .data
            .triples_for_predicate(p.as_ref())
            .map(|t| TermRef::from(t.subject).into_owned()),
        ),
        Target::ObjectsOf(p) => nodes.extend(
          self
            .data
            .triples_for_predicate(p.as_ref())
            .map(|t| t.object.into_owned()),
        ),
      }
    }
    dedup_sorted(nodes)
  }

  /// Instances of `class` or of any of its `rdfs:subClassOf*` descendants.
  fn instances_of(&self, class: NamedNodeRef<'_>) -> Vec<Term> {
    let mut classes: Vec<Term> = vec![class.into_owned().into()];
    let mut queue: VecDeque<Term> = classes.iter().cloned().collect();
    while let Some(current) = queue.pop_front() {
      for sub in self.data.subjects_for_predicate_object(rdfs::SUB_CLASS_OF, current.as_ref()) {
        let sub = TermRef::from(sub).into_owned();
        if !classes.contains(&sub) {
          classes.push(sub.clone());
          queue.push_back(sub);
        }
      }
    }
    classes
      .iter()
      .flat_map(|c| {
        self
          .data
          .subjects_for_predicate_object(rdf_vocab::TYPE, c.as_ref())
          .map(|s| TermRef::from(s).into_owned())
      })
      .collect()
  }

  pub(crate) fn is_instance_of(&self, node: &Term, class: NamedNodeRef<'_>) -> bool {
    let target = Term::from(class.into_owned());
    let mut seen: HashSet<Term> = HashSet::new();
    let mut queue: VecDeque<Term> = objects(self.data, node, rdf_vocab::TYPE).into();
    while let Some(current) = queue.pop_front() {
      if current == target {
        return true;
      }
      if seen.insert(current.clone()) {
        queue.extend(objects(self.data, &current, rdfs::SUB_CLASS_OF));
      }
    }
    false
  }

  pub(crate) fn objects_of(&self, focus: &Term, predicate: NamedNodeRef<'_>) -> Vec<Term> {
    objects(self.data, focus, predicate)
  }

  /// Every (predicate, object) pair with `node` as subject.
  pub(crate) fn outgoing(&self, node: &Term) -> Vec<(NamedNode, Term)> {
    match as_subject(node) {
      Some(subject) => self
        .data
        .triples_for_subject(subject)
        .map(|t| (t.predicate.into_owned(), t.object.into_owned()))
        .collect(),
      None => Vec::new(),
    }
  }

  pub(crate) fn path_values(&self, focus: &Term, path: &PropertyPath) -> Vec<Term> {
    self.step(std::slice::from_ref(focus), path)
  }

  fn step(&self, nodes: &[Term], path: &PropertyPath) -> Vec<Term> {
    let mut out = Vec::new();
    match path {
      PropertyPath::Predicate(p) => {
        for node in nodes {
          out.extend(objects(self.data, node, p.as_ref()));
        }
      }
      PropertyPath::Inverse(inner) => match inner.as_ref() {
        PropertyPath::Predicate(p) => {
          for node in nodes {
            out.extend(
              self
                .data
                .subjects_for_predicate_object(p.as_ref(), node.as_ref())
                .map(|s| TermRef::from(s).into_owned()),
            );
          }
        }
        other => return self.step(nodes, &invert(other)),
      },
      PropertyPath::Sequence(parts) => {
        let mut current = nodes.to_vec();
        for part in parts {
          current = self.step(&current, part);
        }
        out = current;
      }
      PropertyPath::Alternative(parts) => {
        for part in parts {
          out.extend(self.step(nodes, part));
        }
      }
      PropertyPath::ZeroOrOne(inner) => {
        out.extend(nodes.iter().cloned());
        out.extend(self.step(nodes, inner));
      }
      PropertyPath::ZeroOrMore(inner) => {
        out.extend(nodes.iter().cloned());
        out.extend(self.closure(nodes, inner));
      }
      PropertyPath::OneOrMore(inner) => out.extend(self.closure(nodes, inner)),
    }
    dedup(out)
  }

  /// Nodes reachable in one or more applications of `path`.
  fn closure(&self, nodes: &[Term], path: &PropertyPath) -> Vec<Term> {
    let mut reached: Vec<Term> = Vec::new();
    let mut seen: HashSet<Term> = HashSet::new();
    let mut frontier = self.step(nodes, path);
    while !frontier.is_empty() {
      let fresh: Vec<Term> = frontier.into_iter().filter(|n| seen.insert(n.clone())).collect();
      reached.extend(fresh.iter().cloned());
      frontier = self.step(&fresh, path);
    }
    reached
  }

  fn validate_shape(&self, shape: &Shape, focus_nodes: &[Term], depth: usize, out: &mut Vec<ValidationResult>) {
    if shape.deactivated {
      return;
    }
    for focus in focus_nodes {
      let values = match &shape.path {
        Some(path) => self.path_values(focus, path),
        None => vec![focus.clone()],
      };
      for constraint in &shape.constraints {
        for finding in constraints::evaluate(self, shape, focus, &values, constraint, depth) {
          out.push(ValidationResult {
            severity: shape.severity,
            focus_node: focus.clone(),
            result_path: finding.path.or_else(|| shape.path.clone()),
            value: finding.value,
            message: shape.message.clone().unwrap_or(finding.message),
            source_constraint_component: constraint.component_iri(),
            source_shape: shape.id.clone(),
          });
        }
      }
      if shape.property_shapes.is_empty() {
        continue;
      }
      // Nested property shapes apply to this shape's value nodes.
      let next = depth + 1;
      if next > self.max_depth {
        event!(Level::WARN, shape = %shape.id, depth = next, "Property shape nesting limit reached, skipping nested shapes.");
        continue;
      }
      for property in shape.property_shapes.iter().filter_map(|id| self.shapes.get(id)) {
        self.validate_shape(property, &values, next, out);
      }
    }
  }

  /// Whether `node` conforms to the shape `shape_id`. Used by `sh:node`,
  /// `sh:not`, `sh:and`, `sh:or` and `sh:xone`.
  pub(crate) fn conforms(&self, node: &Term, shape_id: &Term, depth: usize) -> bool {
    let next = depth + 1;
    if next > self.max_depth {
      event!(Level::WARN, shape = %shape_id, depth = next, "Shape nesting limit reached, treating node as conforming.");
      return true;
    }
    let Some(shape) = self.shapes.get(shape_id) else {
      event!(Level::WARN, shape = %shape_id, "Referenced shape is not defined, treating node as conforming.");
      return true;
    };
    let mut results = Vec::new();
    self.validate_shape(shape, std::slice::from_ref(node), next, &mut results);
    results.is_empty()
  }
}

fn invert(path: &PropertyPath) -> PropertyPath {
  match path {
    PropertyPath::Predicate(_) => PropertyPath::Inverse(Box::new(path.clone())),
    PropertyPath::Inverse(inner) => inner.as_ref().clone(),
    PropertyPath::Sequence(parts) => PropertyPath::Sequence(parts.iter().rev().map(invert).collect()),
    PropertyPath::Alternative(parts) => PropertyPath::Alternative(parts.iter().map(invert).collect()),
    PropertyPath::ZeroOrMore(inner) => PropertyPath::ZeroOrMore(Box::new(invert(inner))),
    PropertyPath::OneOrMore(inner) => PropertyPath::OneOrMore(Box::new(invert(inner))),
    PropertyPath::ZeroOrOne(inner) => PropertyPath::ZeroOrOne(Box::new(invert(inner))),
  }
}

fn dedup(nodes: Vec<Term>) -> Vec<Term> {
  let mut seen = HashSet::new();
  nodes.into_iter().filter(|n| seen.insert(n.clone())).collect()
}

fn dedup_sorted(nodes: Vec<Term>) -> Vec<Term> {
  let mut nodes = dedup(nodes);
  nodes.sort_by_key(|n| n.to_string());
  nodes
}
