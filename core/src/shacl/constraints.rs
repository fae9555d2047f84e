// weaver/src/shacl/constraints.rs

//! Evaluation of single constraint components against the value nodes of one
//! focus node.

use crate::rdf::owned_label;
use crate::shacl::shapes::{Constraint, PropertyPath, Shape};
use crate::shacl::validator::Evaluation;
use once_cell::sync::Lazy;
use oxrdf::vocab::{rdf as rdf_vocab, xsd};
use oxrdf::{Literal, NamedNode, NamedNodeRef, Term};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

static INTEGER_LEXICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("valid regex"));
static DECIMAL_LEXICAL: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)$").expect("valid regex"));
static DOUBLE_LEXICAL: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^([+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?|[+-]?INF|NaN)$").expect("valid regex")
});

/// A single failure. The owning shape supplies severity, path and source.
#[derive(Debug, Clone)]
pub(crate) struct Finding {
  pub value: Option<Term>,
  pub message: String,
  /// Replaces the shape path, used by `sh:closed` to name the offending predicate.
  pub path: Option<PropertyPath>,
}

impl Finding {
  fn new(value: Option<Term>, message: String) -> Self {
    Self {
      value,
      message,
      path: None,
    }
  }

  fn for_value(value: &Term, message: String) -> Self {
    Self::new(Some(value.clone()), message)
  }
}

pub(crate) fn evaluate(
  eval: &Evaluation<'_>,
  shape: &Shape,
  focus: &Term,
  values: &[Term],
  constraint: &Constraint,
  depth: usize,
) -> Vec<Finding> {
  let each = |check: &dyn Fn(&Term) -> Option<String>| -> Vec<Finding> {
    values
      .iter()
      .filter_map(|v| check(v).map(|message| Finding::for_value(v, message)))
      .collect()
  };

  match constraint {
    Constraint::Class(class) => each(&|v| {
      (!eval.is_instance_of(v, class.as_ref()))
        .then(|| format!("Value does not have class {}", class))
    }),

    Constraint::Datatype(datatype) => each(&|v| match v {
      Term::Literal(l) if l.datatype() == datatype.as_ref() && lexically_valid(l) => None,
      Term::Literal(l) if l.datatype() == datatype.as_ref() => Some(format!(
        "Value '{}' is not a valid lexical form of {}",
        l.value(),
        datatype
      )),
      _ => Some(format!("Value does not have datatype {}", datatype)),
    }),

    Constraint::NodeKind(kind) => each(&|v| {
      (!kind.matches(v.as_ref())).then(|| format!("Value does not have node kind sh:{}", kind.local_name()))
    }),

    Constraint::MinCount(min) => {
      if values.len() < *min {
        vec![Finding::new(None, format!("Less than {} values", min))]
      } else {
        Vec::new()
      }
    }

    Constraint::MaxCount(max) => {
      if values.len() > *max {
        vec![Finding::new(None, format!("More than {} values", max))]
      } else {
        Vec::new()
      }
    }

    Constraint::MinInclusive(bound) => range(values, bound, "greater than or equal to", |o| o != Ordering::Less),
    Constraint::MaxInclusive(bound) => range(values, bound, "less than or equal to", |o| o != Ordering::Greater),
    Constraint::MinExclusive(bound) => range(values, bound, "greater than", |o| o == Ordering::Greater),
    Constraint::MaxExclusive(bound) => range(values, bound, "less than", |o| o == Ordering::Less),

    Constraint::MinLength(min) => each(&|v| match string_form(v) {
      Some(s) if s.chars().count() >= *min => None,
      Some(_) => Some(format!("Value has less than {} characters", min)),
      None => Some("Blank node has no string representation".to_string()),
    }),

    Constraint::MaxLength(max) => each(&|v| match string_form(v) {
      Some(s) if s.chars().count() <= *max => None,
      Some(_) => Some(format!("Value has more than {} characters", max)),
      None => Some("Blank node has no string representation".to_string()),
    }),

    Constraint::Pattern { pattern, regex, .. } => each(&|v| match string_form(v) {
      Some(s) if regex.is_match(s) => None,
      _ => Some(format!("Value does not match pattern \"{}\"", pattern)),
    }),

    Constraint::LanguageIn(ranges) => each(&|v| {
      let tag = match v {
        Term::Literal(l) => l.language(),
        _ => None,
      };
      match tag {
        Some(tag) if ranges.iter().any(|r| language_matches(tag, r)) => None,
        _ => Some(format!("Language tag not in [{}]", ranges.join(", "))),
      }
    }),

    Constraint::UniqueLang => {
      let mut counts: BTreeMap<String, usize> = BTreeMap::new();
      for v in values {
        if let Term::Literal(l) = v {
          if let Some(tag) = l.language() {
            *counts.entry(tag.to_ascii_lowercase()).or_default() += 1;
          }
        }
      }
      counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(tag, _)| Finding::new(None, format!("Language \"{}\" used more than once", tag)))
        .collect()
    }

    Constraint::Equals(predicate) => {
      let others = eval.objects_of(focus, predicate.as_ref());
      let mut findings = Vec::new();
      for v in values.iter().filter(|v| !others.contains(v)) {
        findings.push(Finding::for_value(v, format!("Value is not a value of {}", predicate)));
      }
      for o in others.iter().filter(|o| !values.contains(o)) {
        findings.push(Finding::for_value(o, format!("Value of {} is missing", predicate)));
      }
      findings
    }

    Constraint::Disjoint(predicate) => {
      let others = eval.objects_of(focus, predicate.as_ref());
      each(&|v| others.contains(v).then(|| format!("Value is also a value of {}", predicate)))
    }

    Constraint::LessThan(predicate) => {
      let others = eval.objects_of(focus, predicate.as_ref());
      each(&|v| {
        others
          .iter()
          .any(|o| compare_terms(v, o) != Some(Ordering::Less))
          .then(|| format!("Value is not less than the values of {}", predicate))
      })
    }

    Constraint::LessThanOrEquals(predicate) => {
      let others = eval.objects_of(focus, predicate.as_ref());
      each(&|v| {
        others
          .iter()
          .any(|o| !matches!(compare_terms(v, o), Some(Ordering::Less | Ordering::Equal)))
          .then(|| format!("Value is not less than or equal to the values of {}", predicate))
      })
    }

    Constraint::In(allowed) => each(&|v| {
      (!allowed.contains(v)).then(|| {
        let labels: Vec<String> = allowed.iter().map(owned_label).collect();
        format!("Value is not in [{}]", labels.join(", "))
      })
    }),

    Constraint::HasValue(expected) => {
      if values.contains(expected) {
        Vec::new()
      } else {
        vec![Finding::new(None, format!("Missing expected value {}", expected))]
      }
    }

    Constraint::Node(id) => each(&|v| {
      (!eval.conforms(v, id, depth)).then(|| format!("Value does not conform to shape {}", id))
    }),

    Constraint::Not(id) => each(&|v| eval.conforms(v, id, depth).then(|| format!("Value conforms to shape {}", id))),

    Constraint::And(ids) => each(&|v| {
      (!ids.iter().all(|id| eval.conforms(v, id, depth)))
        .then(|| "Value does not conform to every shape in sh:and".to_string())
    }),

    Constraint::Or(ids) => each(&|v| {
      (!ids.iter().any(|id| eval.conforms(v, id, depth)))
        .then(|| "Value does not conform to any shape in sh:or".to_string())
    }),

    Constraint::Xone(ids) => each(&|v| {
      let matching = ids.iter().filter(|id| eval.conforms(v, id, depth)).count();
      (matching != 1).then(|| format!("Value conforms to {} shapes in sh:xone, expected exactly 1", matching))
    }),

    Constraint::Closed { ignored } => {
      let mut allowed: HashSet<NamedNode> = ignored.iter().cloned().collect();
      for property in shape.property_shapes.iter().filter_map(|id| eval.shape(id)) {
        if let Some(p) = property.path.as_ref().and_then(PropertyPath::as_predicate) {
          allowed.insert(p.clone());
        }
      }
      let mut findings = Vec::new();
      for v in values {
        for (predicate, object) in eval.outgoing(v) {
          if !allowed.contains(&predicate) {
            findings.push(Finding {
              value: Some(object),
              message: format!("Predicate {} is not allowed (closed shape)", predicate),
              path: Some(PropertyPath::Predicate(predicate)),
            });
          }
        }
      }
      findings
    }
  }
}

fn range(values: &[Term], bound: &Literal, relation: &str, accept: impl Fn(Ordering) -> bool) -> Vec<Finding> {
  let bound_term = Term::Literal(bound.clone());
  values
    .iter()
    .filter(|v| !compare_terms(v, &bound_term).is_some_and(&accept))
    .map(|v| Finding::for_value(v, format!("Value is not {} {}", relation, bound.value())))
    .collect()
}

fn string_form(term: &Term) -> Option<&str> {
  match term {
    Term::NamedNode(n) => Some(n.as_str()),
    Term::Literal(l) => Some(l.value()),
    _ => None,
  }
}

/// Basic language-range filtering: `*`, exact match, or prefix followed by `-`.
fn language_matches(tag: &str, range: &str) -> bool {
  if range == "*" {
    return true;
  }
  let tag = tag.to_ascii_lowercase();
  let range = range.to_ascii_lowercase();
  tag == range || tag.starts_with(&format!("{}-", range))
}

const INTEGER_TYPES: [NamedNodeRef<'static>; 13] = [
  xsd::INTEGER,
  xsd::INT,
  xsd::LONG,
  xsd::SHORT,
  xsd::BYTE,
  xsd::NON_NEGATIVE_INTEGER,
  xsd::NON_POSITIVE_INTEGER,
  xsd::POSITIVE_INTEGER,
  xsd::NEGATIVE_INTEGER,
  xsd::UNSIGNED_LONG,
  xsd::UNSIGNED_INT,
  xsd::UNSIGNED_SHORT,
  xsd::UNSIGNED_BYTE,
];

fn is_numeric(datatype: NamedNodeRef<'_>) -> bool {
  INTEGER_TYPES.contains(&datatype) || datatype == xsd::DECIMAL || datatype == xsd::DOUBLE || datatype == xsd::FLOAT
}

/// Lexical checks for the datatypes the mapper emits. Other datatypes are accepted as is.
pub(crate) fn lexically_valid(literal: &Literal) -> bool {
  let datatype = literal.datatype();
  let value = literal.value();
  if INTEGER_TYPES.contains(&datatype) {
    INTEGER_LEXICAL.is_match(value)
  } else if datatype == xsd::DECIMAL {
    DECIMAL_LEXICAL.is_match(value)
  } else if datatype == xsd::DOUBLE || datatype == xsd::FLOAT {
    DOUBLE_LEXICAL.is_match(value)
  } else if datatype == xsd::BOOLEAN {
    matches!(value, "true" | "false" | "1" | "0")
  } else {
    true
  }
}

/// Orders two literals: numerically when both are numeric, lexically when
/// they share a datatype (covers ISO dates and strings). Anything else is
/// incomparable.
pub(crate) fn compare_terms(a: &Term, b: &Term) -> Option<Ordering> {
  let (Term::Literal(a), Term::Literal(b)) = (a, b) else {
    return None;
  };
  if is_numeric(a.datatype()) && is_numeric(b.datatype()) {
    let x = parse_number(a.value())?;
    let y = parse_number(b.value())?;
    return x.partial_cmp(&y);
  }
  if a.datatype() == b.datatype() && a.datatype() != rdf_vocab::LANG_STRING {
    return Some(a.value().cmp(b.value()));
  }
  None
}

fn parse_number(raw: &str) -> Option<f64> {
  match raw.trim() {
    "INF" | "+INF" => Some(f64::INFINITY),
    "-INF" => Some(f64::NEG_INFINITY),
    other => other.parse::<f64>().ok(),
  }
}
