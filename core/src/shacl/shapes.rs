// weaver/src/shacl/shapes.rs

//! Compiles a shapes graph into `Shape` definitions.
//!
//! Compilation walks every node that is declared or referenced as a shape
//! (typed `sh:NodeShape`/`sh:PropertyShape`, carrying a target or `sh:path`,
//! or reached through `sh:property`, `sh:node`, `sh:not`, `sh:and`, `sh:or`,
//! `sh:xone`). Only shapes with targets are validated directly; the rest are
//! reached through references.

use crate::error::{EngineError, EngineResult};
use crate::rdf::{self, RdfFormat};
use crate::shacl::report::Severity;
use crate::shacl::vocab as sh;
use oxrdf::vocab::{rdf as rdf_vocab, rdfs, xsd};
use oxrdf::{Graph, Literal, NamedNode, NamedNodeRef, SubjectRef, Term, TermRef};
use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
  Class(NamedNode),
  Node(Term),
  SubjectsOf(NamedNode),
  ObjectsOf(NamedNode),
}

/// SHACL property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyPath {
  Predicate(NamedNode),
  Inverse(Box<PropertyPath>),
  Sequence(Vec<PropertyPath>),
  Alternative(Vec<PropertyPath>),
  ZeroOrMore(Box<PropertyPath>),
  OneOrMore(Box<PropertyPath>),
  ZeroOrOne(Box<PropertyPath>),
}

impl PropertyPath {
  pub fn as_predicate(&self) -> Option<&NamedNode> {
    match self {
      PropertyPath::Predicate(p) => Some(p),
      _ => None,
    }
  }
}

/// SPARQL property path syntax.
impl fmt::Display for PropertyPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fn join(f: &mut fmt::Formatter<'_>, parts: &[PropertyPath], sep: &str) -> fmt::Result {
      f.write_str("(")?;
      for (i, part) in parts.iter().enumerate() {
        if i > 0 {
          f.write_str(sep)?;
        }
        write!(f, "{}", part)?;
      }
      f.write_str(")")
    }
    match self {
      PropertyPath::Predicate(p) => write!(f, "{}", p),
      PropertyPath::Inverse(p) => write!(f, "^{}", p),
      PropertyPath::Sequence(parts) => join(f, parts, "/"),
      PropertyPath::Alternative(parts) => join(f, parts, "|"),
      PropertyPath::ZeroOrMore(p) => write!(f, "{}*", p),
      PropertyPath::OneOrMore(p) => write!(f, "{}+", p),
      PropertyPath::ZeroOrOne(p) => write!(f, "{}?", p),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
  Iri,
  BlankNode,
  Literal,
  BlankNodeOrIri,
  BlankNodeOrLiteral,
  IriOrLiteral,
}

impl NodeKind {
  fn from_iri(iri: NamedNodeRef<'_>) -> Option<Self> {
    Some(match iri {
      i if i == sh::IRI => NodeKind::Iri,
      i if i == sh::BLANK_NODE => NodeKind::BlankNode,
      i if i == sh::LITERAL => NodeKind::Literal,
      i if i == sh::BLANK_NODE_OR_IRI => NodeKind::BlankNodeOrIri,
      i if i == sh::BLANK_NODE_OR_LITERAL => NodeKind::BlankNodeOrLiteral,
      i if i == sh::IRI_OR_LITERAL => NodeKind::IriOrLiteral,
      _ => return None,
    })
  }

  pub fn matches(&self, term: TermRef<'_>) -> bool {
    let (iri, blank, literal) = match term {
      TermRef::NamedNode(_) => (true, false, false),
      TermRef::BlankNode(_) => (false, true, false),
      TermRef::Literal(_) => (false, false, true),
      #[allow(unreachable_patterns)]
      _ => (false, false, false),
    };
    match self {
      NodeKind::Iri => iri,
      NodeKind::BlankNode => blank,
      NodeKind::Literal => literal,
      NodeKind::BlankNodeOrIri => blank || iri,
      NodeKind::BlankNodeOrLiteral => blank || literal,
      NodeKind::IriOrLiteral => iri || literal,
    }
  }

  pub fn local_name(&self) -> &'static str {
    match self {
      NodeKind::Iri => "IRI",
      NodeKind::BlankNode => "BlankNode",
      NodeKind::Literal => "Literal",
      NodeKind::BlankNodeOrIri => "BlankNodeOrIRI",
      NodeKind::BlankNodeOrLiteral => "BlankNodeOrLiteral",
      NodeKind::IriOrLiteral => "IRIOrLiteral",
    }
  }
}

/// One constraint parameter of a shape.
#[derive(Debug, Clone)]
pub enum Constraint {
  Class(NamedNode),
  Datatype(NamedNode),
  NodeKind(NodeKind),
  MinCount(usize),
  MaxCount(usize),
  MinInclusive(Literal),
  MaxInclusive(Literal),
  MinExclusive(Literal),
  MaxExclusive(Literal),
  MinLength(usize),
  MaxLength(usize),
  Pattern {
    pattern: String,
    flags: Option<String>,
    regex: Regex,
  },
  LanguageIn(Vec<String>),
  UniqueLang,
  Equals(NamedNode),
  Disjoint(NamedNode),
  LessThan(NamedNode),
  LessThanOrEquals(NamedNode),
  In(Vec<Term>),
  HasValue(Term),
  Node(Term),
  Not(Term),
  And(Vec<Term>),
  Or(Vec<Term>),
  Xone(Vec<Term>),
  Closed { ignored: Vec<NamedNode> },
}

impl Constraint {
  /// Local name of the SHACL constraint component this parameter belongs to.
  pub fn component(&self) -> &'static str {
    match self {
      Constraint::Class(_) => "ClassConstraintComponent",
      Constraint::Datatype(_) => "DatatypeConstraintComponent",
      Constraint::NodeKind(_) => "NodeKindConstraintComponent",
      Constraint::MinCount(_) => "MinCountConstraintComponent",
      Constraint::MaxCount(_) => "MaxCountConstraintComponent",
      Constraint::MinInclusive(_) => "MinInclusiveConstraintComponent",
      Constraint::MaxInclusive(_) => "MaxInclusiveConstraintComponent",
      Constraint::MinExclusive(_) => "MinExclusiveConstraintComponent",
      Constraint::MaxExclusive(_) => "MaxExclusiveConstraintComponent",
      Constraint::MinLength(_) => "MinLengthConstraintComponent",
      Constraint::MaxLength(_) => "MaxLengthConstraintComponent",
      Constraint::Pattern { .. } => "PatternConstraintComponent",
      Constraint::LanguageIn(_) => "LanguageInConstraintComponent",
      Constraint::UniqueLang => "UniqueLangConstraintComponent",
      Constraint::Equals(_) => "EqualsConstraintComponent",
      Constraint::Disjoint(_) => "DisjointConstraintComponent",
      Constraint::LessThan(_) => "LessThanConstraintComponent",
      Constraint::LessThanOrEquals(_) => "LessThanOrEqualsConstraintComponent",
      Constraint::In(_) => "InConstraintComponent",
      Constraint::HasValue(_) => "HasValueConstraintComponent",
      Constraint::Node(_) => "NodeConstraintComponent",
      Constraint::Not(_) => "NotConstraintComponent",
      Constraint::And(_) => "AndConstraintComponent",
      Constraint::Or(_) => "OrConstraintComponent",
      Constraint::Xone(_) => "XoneConstraintComponent",
      Constraint::Closed { .. } => "ClosedConstraintComponent",
    }
  }

  pub fn component_iri(&self) -> NamedNode {
    NamedNode::new_unchecked(format!("{}{}", sh::SH, self.component()))
  }

  /// Shape ids this constraint refers to.
  fn referenced_shapes(&self) -> Vec<&Term> {
    match self {
      Constraint::Node(id) | Constraint::Not(id) => vec![id],
      Constraint::And(ids) | Constraint::Or(ids) | Constraint::Xone(ids) => ids.iter().collect(),
      _ => Vec::new(),
    }
  }
}

/// A compiled node or property shape. Property shapes carry a `path`.
#[derive(Debug, Clone)]
pub struct Shape {
  pub id: Term,
  pub targets: Vec<Target>,
  pub path: Option<PropertyPath>,
  pub constraints: Vec<Constraint>,
  pub property_shapes: Vec<Term>,
  pub severity: Severity,
  pub message: Option<String>,
  pub name: Option<String>,
  pub deactivated: bool,
}

impl Shape {
  pub fn is_property_shape(&self) -> bool {
    self.path.is_some()
  }

  pub fn has_targets(&self) -> bool {
    !self.targets.is_empty()
  }
}

/// All shapes of one shapes graph, keyed by shape id.
#[derive(Debug, Clone, Default)]
pub struct ShapesGraph {
  shapes: HashMap<Term, Shape>,
  targeted: Vec<Term>,
}

impl ShapesGraph {
  /// Parses Turtle text and compiles the shapes it declares.
  pub fn parse(text: &str) -> EngineResult<Self> {
    let graph = rdf::parse_graph(text, RdfFormat::Turtle).map_err(|e| match e {
      EngineError::RdfParse { message } => EngineError::Shapes { message },
      other => other,
    })?;
    Self::from_graph(&graph)
  }

  pub fn from_graph(graph: &Graph) -> EngineResult<Self> {
    let mut queue: VecDeque<Term> = seed_shape_ids(graph).into();
    let mut seen: HashSet<Term> = queue.iter().cloned().collect();
    let mut shapes = HashMap::new();

    while let Some(id) = queue.pop_front() {
      let shape = compile_shape(graph, &id)?;
      let mut referenced: Vec<Term> = shape.property_shapes.clone();
      for constraint in &shape.constraints {
        referenced.extend(constraint.referenced_shapes().into_iter().cloned());
      }
      for next in referenced {
        if seen.insert(next.clone()) {
          queue.push_back(next);
        }
      }
      shapes.insert(id, shape);
    }

    let mut targeted: Vec<Term> = shapes
      .values()
      .filter(|s| s.has_targets())
      .map(|s| s.id.clone())
      .collect();
    targeted.sort_by_key(|id| id.to_string());

    tracing::debug!(shapes = shapes.len(), targeted = targeted.len(), "Shapes graph compiled.");
    Ok(Self { shapes, targeted })
  }

  pub fn get(&self, id: &Term) -> Option<&Shape> {
    self.shapes.get(id)
  }

  /// Shapes with at least one target, sorted by id for stable report order.
  pub fn targeted_shapes(&self) -> impl Iterator<Item = &Shape> {
    self.targeted.iter().filter_map(|id| self.shapes.get(id))
  }

  pub fn len(&self) -> usize {
    self.shapes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.shapes.is_empty()
  }
}

fn seed_shape_ids(graph: &Graph) -> Vec<Term> {
  let mut ids: Vec<Term> = Vec::new();
  let mut push = |term: TermRef<'_>| {
    if !matches!(term, TermRef::Literal(_)) {
      let owned = term.into_owned();
      if !ids.contains(&owned) {
        ids.push(owned);
      }
    }
  };

  for shape_type in [sh::NODE_SHAPE, sh::PROPERTY_SHAPE] {
    for subject in graph.subjects_for_predicate_object(rdf_vocab::TYPE, shape_type) {
      push(subject.into());
    }
  }
  for predicate in [
    sh::TARGET_CLASS,
    sh::TARGET_NODE,
    sh::TARGET_SUBJECTS_OF,
    sh::TARGET_OBJECTS_OF,
    sh::PATH,
  ] {
    for triple in graph.triples_for_predicate(predicate) {
      push(triple.subject.into());
    }
  }
  ids
}

fn compile_shape(graph: &Graph, id: &Term) -> EngineResult<Shape> {
  let mut targets = Vec::new();
  for class in objects(graph, id, sh::TARGET_CLASS) {
    targets.push(Target::Class(expect_iri(id, "sh:targetClass", &class)?));
  }
  for node in objects(graph, id, sh::TARGET_NODE) {
    targets.push(Target::Node(node));
  }
  for predicate in objects(graph, id, sh::TARGET_SUBJECTS_OF) {
    targets.push(Target::SubjectsOf(expect_iri(id, "sh:targetSubjectsOf", &predicate)?));
  }
  for predicate in objects(graph, id, sh::TARGET_OBJECTS_OF) {
    targets.push(Target::ObjectsOf(expect_iri(id, "sh:targetObjectsOf", &predicate)?));
  }
  if let Term::NamedNode(node) = id {
    let is_class = has_type(graph, id, rdfs::CLASS);
    let is_shape = has_type(graph, id, sh::NODE_SHAPE) || has_type(graph, id, sh::PROPERTY_SHAPE);
    if is_class && is_shape {
      targets.push(Target::Class(node.clone()));
    }
  }

  let path = match object(graph, id, sh::PATH) {
    Some(path) => Some(parse_path(graph, &path, 0)?),
    None => None,
  };

  let severity = match object(graph, id, sh::SEVERITY) {
    Some(Term::NamedNode(n)) if n.as_ref() == sh::WARNING => Severity::Warning,
    Some(Term::NamedNode(n)) if n.as_ref() == sh::INFO => Severity::Info,
    _ => Severity::Violation,
  };

  let property_shapes = objects(graph, id, sh::PROPERTY)
    .into_iter()
    .filter(|t| !matches!(t, Term::Literal(_)))
    .collect();

  Ok(Shape {
    id: id.clone(),
    targets,
    constraints: compile_constraints(graph, id, path.is_some())?,
    path,
    property_shapes,
    severity,
    message: object(graph, id, sh::MESSAGE).and_then(literal_value),
    name: object(graph, id, sh::NAME).and_then(literal_value),
    deactivated: object(graph, id, sh::DEACTIVATED)
      .and_then(literal_value)
      .is_some_and(|v| v == "true" || v == "1"),
  })
}

fn compile_constraints(graph: &Graph, id: &Term, is_property: bool) -> EngineResult<Vec<Constraint>> {
  let mut constraints = Vec::new();

  for class in objects(graph, id, sh::CLASS) {
    constraints.push(Constraint::Class(expect_iri(id, "sh:class", &class)?));
  }
  if let Some(dt) = object(graph, id, sh::DATATYPE) {
    constraints.push(Constraint::Datatype(expect_iri(id, "sh:datatype", &dt)?));
  }
  if let Some(kind) = object(graph, id, sh::NODE_KIND) {
    let iri = expect_iri(id, "sh:nodeKind", &kind)?;
    let kind = NodeKind::from_iri(iri.as_ref())
      .ok_or_else(|| shape_error(id, format!("unknown sh:nodeKind {}", iri)))?;
    constraints.push(Constraint::NodeKind(kind));
  }

  if is_property {
    if let Some(n) = object(graph, id, sh::MIN_COUNT) {
      constraints.push(Constraint::MinCount(expect_count(id, "sh:minCount", &n)?));
    }
    if let Some(n) = object(graph, id, sh::MAX_COUNT) {
      constraints.push(Constraint::MaxCount(expect_count(id, "sh:maxCount", &n)?));
    }
    if object(graph, id, sh::UNIQUE_LANG)
      .and_then(literal_value)
      .is_some_and(|v| v == "true" || v == "1")
    {
      constraints.push(Constraint::UniqueLang);
    }
    for (predicate, label, make) in [
      (sh::EQUALS, "sh:equals", Constraint::Equals as fn(NamedNode) -> Constraint),
      (sh::DISJOINT, "sh:disjoint", Constraint::Disjoint),
      (sh::LESS_THAN, "sh:lessThan", Constraint::LessThan),
      (sh::LESS_THAN_OR_EQUALS, "sh:lessThanOrEquals", Constraint::LessThanOrEquals),
    ] {
      for other in objects(graph, id, predicate) {
        constraints.push(make(expect_iri(id, label, &other)?));
      }
    }
  } else {
    // equals/disjoint also apply to node shapes, comparing the focus node itself
    for other in objects(graph, id, sh::EQUALS) {
      constraints.push(Constraint::Equals(expect_iri(id, "sh:equals", &other)?));
    }
    for other in objects(graph, id, sh::DISJOINT) {
      constraints.push(Constraint::Disjoint(expect_iri(id, "sh:disjoint", &other)?));
    }
  }

  for (predicate, label, make) in [
    (sh::MIN_INCLUSIVE, "sh:minInclusive", Constraint::MinInclusive as fn(Literal) -> Constraint),
    (sh::MAX_INCLUSIVE, "sh:maxInclusive", Constraint::MaxInclusive),
    (sh::MIN_EXCLUSIVE, "sh:minExclusive", Constraint::MinExclusive),
    (sh::MAX_EXCLUSIVE, "sh:maxExclusive", Constraint::MaxExclusive),
  ] {
    if let Some(bound) = object(graph, id, predicate) {
      match bound {
        Term::Literal(literal) => constraints.push(make(literal)),
        other => return Err(shape_error(id, format!("{} expects a literal, got {}", label, other))),
      }
    }
  }

  if let Some(n) = object(graph, id, sh::MIN_LENGTH) {
    constraints.push(Constraint::MinLength(expect_count(id, "sh:minLength", &n)?));
  }
  if let Some(n) = object(graph, id, sh::MAX_LENGTH) {
    constraints.push(Constraint::MaxLength(expect_count(id, "sh:maxLength", &n)?));
  }

  if let Some(pattern) = object(graph, id, sh::PATTERN).and_then(literal_value) {
    let flags = object(graph, id, sh::FLAGS).and_then(literal_value);
    let regex = build_pattern(&pattern, flags.as_deref()).map_err(|e| {
      shape_error(id, format!("invalid sh:pattern '{}': {}", pattern, e))
    })?;
    constraints.push(Constraint::Pattern { pattern, flags, regex });
  }

  if let Some(head) = object(graph, id, sh::LANGUAGE_IN) {
    let tags = parse_list(graph, &head)?
      .iter()
      .filter_map(|t| match t {
        Term::Literal(l) => Some(l.value().to_string()),
        _ => None,
      })
      .collect();
    constraints.push(Constraint::LanguageIn(tags));
  }

  if let Some(head) = object(graph, id, sh::IN) {
    constraints.push(Constraint::In(parse_list(graph, &head)?));
  }
  for value in objects(graph, id, sh::HAS_VALUE) {
    constraints.push(Constraint::HasValue(value));
  }

  for shape in objects(graph, id, sh::NODE) {
    constraints.push(Constraint::Node(shape));
  }
  for shape in objects(graph, id, sh::NOT) {
    constraints.push(Constraint::Not(shape));
  }
  for (predicate, make) in [
    (sh::AND, Constraint::And as fn(Vec<Term>) -> Constraint),
    (sh::OR, Constraint::Or),
    (sh::XONE, Constraint::Xone),
  ] {
    for head in objects(graph, id, predicate) {
      constraints.push(make(parse_list(graph, &head)?));
    }
  }

  if !is_property
    && object(graph, id, sh::CLOSED)
      .and_then(literal_value)
      .is_some_and(|v| v == "true" || v == "1")
  {
    let mut ignored = Vec::new();
    if let Some(head) = object(graph, id, sh::IGNORED_PROPERTIES) {
      for term in parse_list(graph, &head)? {
        ignored.push(expect_iri(id, "sh:ignoredProperties", &term)?);
      }
    }
    constraints.push(Constraint::Closed { ignored });
  }

  Ok(constraints)
}

const MAX_PATH_DEPTH: usize = 16;

fn parse_path(graph: &Graph, node: &Term, depth: usize) -> EngineResult<PropertyPath> {
  if depth > MAX_PATH_DEPTH {
    return Err(shape_error(node, "property path nested too deeply".to_string()));
  }
  match node {
    Term::NamedNode(predicate) => Ok(PropertyPath::Predicate(predicate.clone())),
    Term::BlankNode(_) => {
      let unary = [
        (sh::INVERSE_PATH, PropertyPath::Inverse as fn(Box<PropertyPath>) -> PropertyPath),
        (sh::ZERO_OR_MORE_PATH, PropertyPath::ZeroOrMore),
        (sh::ONE_OR_MORE_PATH, PropertyPath::OneOrMore),
        (sh::ZERO_OR_ONE_PATH, PropertyPath::ZeroOrOne),
      ];
      for (predicate, make) in unary {
        if let Some(inner) = object(graph, node, predicate) {
          return Ok(make(Box::new(parse_path(graph, &inner, depth + 1)?)));
        }
      }
      if let Some(head) = object(graph, node, sh::ALTERNATIVE_PATH) {
        let parts = parse_list(graph, &head)?
          .iter()
          .map(|p| parse_path(graph, p, depth + 1))
          .collect::<EngineResult<Vec<_>>>()?;
        return Ok(PropertyPath::Alternative(parts));
      }
      if object(graph, node, rdf_vocab::FIRST).is_some() {
        let parts = parse_list(graph, node)?
          .iter()
          .map(|p| parse_path(graph, p, depth + 1))
          .collect::<EngineResult<Vec<_>>>()?;
        if parts.len() < 2 {
          return Err(shape_error(node, "sequence path needs at least two members".to_string()));
        }
        return Ok(PropertyPath::Sequence(parts));
      }
      Err(shape_error(node, "unsupported property path".to_string()))
    }
    other => Err(shape_error(other, "sh:path must be an IRI or a blank node".to_string())),
  }
}

/// Reads an RDF collection starting at `head`.
pub(crate) fn parse_list(graph: &Graph, head: &Term) -> EngineResult<Vec<Term>> {
  let mut items = Vec::new();
  let mut visited = HashSet::new();
  let mut current = head.clone();
  loop {
    if let Term::NamedNode(n) = &current {
      if n.as_ref() == rdf_vocab::NIL {
        return Ok(items);
      }
    }
    if !visited.insert(current.clone()) {
      return Err(shape_error(head, "RDF list contains a cycle".to_string()));
    }
    let first = object(graph, &current, rdf_vocab::FIRST)
      .ok_or_else(|| shape_error(head, "malformed RDF list (missing rdf:first)".to_string()))?;
    items.push(first);
    current = object(graph, &current, rdf_vocab::REST)
      .ok_or_else(|| shape_error(head, "malformed RDF list (missing rdf:rest)".to_string()))?;
  }
}

fn build_pattern(pattern: &str, flags: Option<&str>) -> Result<Regex, regex::Error> {
  let mut builder = RegexBuilder::new(pattern);
  for flag in flags.unwrap_or_default().chars() {
    match flag {
      'i' => {
        builder.case_insensitive(true);
      }
      'm' => {
        builder.multi_line(true);
      }
      's' => {
        builder.dot_matches_new_line(true);
      }
      'x' => {
        builder.ignore_whitespace(true);
      }
      _ => {}
    }
  }
  builder.build()
}

pub(crate) fn as_subject(term: &Term) -> Option<SubjectRef<'_>> {
  match term {
    Term::NamedNode(n) => Some(n.as_ref().into()),
    Term::BlankNode(b) => Some(b.as_ref().into()),
    _ => None,
  }
}

pub(crate) fn objects(graph: &Graph, subject: &Term, predicate: NamedNodeRef<'_>) -> Vec<Term> {
  match as_subject(subject) {
    Some(s) => graph
      .objects_for_subject_predicate(s, predicate)
      .map(TermRef::into_owned)
      .collect(),
    None => Vec::new(),
  }
}

pub(crate) fn object(graph: &Graph, subject: &Term, predicate: NamedNodeRef<'_>) -> Option<Term> {
  as_subject(subject).and_then(|s| {
    graph
      .object_for_subject_predicate(s, predicate)
      .map(TermRef::into_owned)
  })
}

fn has_type(graph: &Graph, id: &Term, class: NamedNodeRef<'_>) -> bool {
  objects(graph, id, rdf_vocab::TYPE)
    .iter()
    .any(|t| matches!(t, Term::NamedNode(n) if n.as_ref() == class))
}

fn literal_value(term: Term) -> Option<String> {
  match term {
    Term::Literal(l) => Some(l.value().to_string()),
    _ => None,
  }
}

fn expect_iri(shape: &Term, label: &str, term: &Term) -> EngineResult<NamedNode> {
  match term {
    Term::NamedNode(n) => Ok(n.clone()),
    other => Err(shape_error(shape, format!("{} expects an IRI, got {}", label, other))),
  }
}

fn expect_count(shape: &Term, label: &str, term: &Term) -> EngineResult<usize> {
  match term {
    Term::Literal(l) if l.datatype() == xsd::INTEGER || l.datatype() == xsd::STRING => l
      .value()
      .trim()
      .parse::<usize>()
      .map_err(|_| shape_error(shape, format!("{} expects a non-negative integer, got '{}'", label, l.value()))),
    other => Err(shape_error(shape, format!("{} expects an integer literal, got {}", label, other))),
  }
}

fn shape_error(shape: &Term, message: String) -> EngineError {
  EngineError::Shapes {
    message: format!("{}: {}", shape, message),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SHAPES: &str = r#"
    @prefix sh: <http://www.w3.org/ns/shacl#> .
    @prefix ex: <http://ex.org/> .
    @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

    ex:PersonShape a sh:NodeShape ;
      sh:targetClass ex:Person ;
      sh:closed true ;
      sh:ignoredProperties ( ex:note ) ;
      sh:property [
        sh:path ex:name ;
        sh:minCount 1 ;
        sh:datatype xsd:string ;
        sh:pattern "^[A-Z]" ;
        sh:flags "i" ;
      ] ;
      sh:property [
        sh:path [ sh:inversePath ex:employs ] ;
        sh:severity sh:Warning ;
        sh:node ex:CompanyShape ;
      ] .

    ex:CompanyShape a sh:NodeShape ;
      sh:property [ sh:path ( ex:address ex:city ) ; sh:in ( "Bern" "Zurich" ) ] .
  "#;

  #[test]
  fn compiles_targets_paths_and_references() {
    let shapes = ShapesGraph::parse(SHAPES).unwrap();
    // two node shapes, three property shapes
    assert_eq!(shapes.len(), 5);

    let targeted: Vec<&Shape> = shapes.targeted_shapes().collect();
    assert_eq!(targeted.len(), 1);
    let person = targeted[0];
    assert_eq!(person.targets, vec![Target::Class(NamedNode::new_unchecked("http://ex.org/Person"))]);
    assert!(matches!(&person.constraints[..], [Constraint::Closed { ignored }] if ignored.len() == 1));
    assert_eq!(person.property_shapes.len(), 2);

    let inverse = person
      .property_shapes
      .iter()
      .filter_map(|id| shapes.get(id))
      .find(|s| matches!(s.path, Some(PropertyPath::Inverse(_))))
      .unwrap();
    assert_eq!(inverse.severity, Severity::Warning);
    assert_eq!(inverse.path.as_ref().unwrap().to_string(), "^<http://ex.org/employs>");

    let company = shapes
      .get(&Term::NamedNode(NamedNode::new_unchecked("http://ex.org/CompanyShape")))
      .unwrap();
    let city = shapes.get(&company.property_shapes[0]).unwrap();
    assert!(matches!(city.path, Some(PropertyPath::Sequence(ref parts)) if parts.len() == 2));
    assert!(matches!(&city.constraints[..], [Constraint::In(values)] if values.len() == 2));
  }

  #[test]
  fn implicit_class_target() {
    let ttl = r#"
      @prefix sh: <http://www.w3.org/ns/shacl#> .
      @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
      @prefix ex: <http://ex.org/> .
      ex:Dog a rdfs:Class, sh:NodeShape ; sh:property [ sh:path ex:name ; sh:minCount 1 ] .
    "#;
    let shapes = ShapesGraph::parse(ttl).unwrap();
    let dog = shapes.targeted_shapes().next().unwrap();
    assert_eq!(dog.targets, vec![Target::Class(NamedNode::new_unchecked("http://ex.org/Dog"))]);
  }

  #[test]
  fn rejects_bad_parameters() {
    let bad_count = r#"
      @prefix sh: <http://www.w3.org/ns/shacl#> .
      @prefix ex: <http://ex.org/> .
      ex:S sh:targetNode ex:a ; sh:property [ sh:path ex:p ; sh:minCount "many" ] .
    "#;
    assert!(matches!(ShapesGraph::parse(bad_count), Err(EngineError::Shapes { .. })));

    let bad_regex = r#"
      @prefix sh: <http://www.w3.org/ns/shacl#> .
      @prefix ex: <http://ex.org/> .
      ex:S sh:targetNode ex:a ; sh:property [ sh:path ex:p ; sh:pattern "([a-z" ] .
    "#;
    assert!(matches!(ShapesGraph::parse(bad_regex), Err(EngineError::Shapes { .. })));

    assert!(matches!(ShapesGraph::parse("ex:broken"), Err(EngineError::Shapes { .. })));
  }
}
