// weaver/src/template.rs

//! URI templates with RFC 6570 style placeholders, used to mint subject and
//! object identifiers from row values.
//!
//! Supported expressions:
//!  - `{name}`  percent-encoded value
//!  - `{+name}` reserved expansion, value inserted as is
//!  - `{#name}` fragment, `#` followed by the encoded value
//!  - `{/name}` path segment, `/` followed by the encoded value
//!
//! A variable missing from the supplied values expands to nothing, including
//! its prefix.

use crate::core::value::Record;
use crate::error::{EngineError, EngineResult};
use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use std::fmt;

/// Characters left untouched by value encoding: alphanumerics plus `.-*_`,
/// and `/` so that values can span several path segments.
const VALUE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
  .remove(b'.')
  .remove(b'-')
  .remove(b'*')
  .remove(b'_')
  .remove(b'/');

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
  Simple,
  Reserved,
  Fragment,
  Path,
}

impl Modifier {
  fn from_char(c: char) -> Option<Self> {
    match c {
      '+' => Some(Modifier::Reserved),
      '#' => Some(Modifier::Fragment),
      '/' => Some(Modifier::Path),
      _ => None,
    }
  }

  fn prefix(&self) -> &'static str {
    match self {
      Modifier::Simple | Modifier::Reserved => "",
      Modifier::Fragment => "#",
      Modifier::Path => "/",
    }
  }

  fn symbol(&self) -> &'static str {
    match self {
      Modifier::Simple => "",
      Modifier::Reserved => "+",
      Modifier::Fragment => "#",
      Modifier::Path => "/",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateVariable {
  pub name: String,
  pub modifier: Modifier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
  Literal(String),
  Variable(TemplateVariable),
}

/// A parsed template, reusable across rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
  source: String,
  segments: Vec<Segment>,
}

impl UriTemplate {
  pub fn parse(template: &str) -> EngineResult<Self> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices();

    while let Some((start, c)) = chars.next() {
      if c != '{' {
        literal.push(c);
        continue;
      }

      let mut expr = String::new();
      let mut closed = false;
      for (_, inner) in chars.by_ref() {
        match inner {
          '}' => {
            closed = true;
            break;
          }
          '{' => return Err(template_error(template, format!("nested '{{' in expression at offset {}", start))),
          _ => expr.push(inner),
        }
      }
      if !closed {
        return Err(template_error(template, format!("unterminated expression at offset {}", start)));
      }

      let expr = expr.trim();
      let (modifier, name) = match expr.chars().next().and_then(Modifier::from_char) {
        Some(m) => (m, expr[1..].trim()),
        None => (Modifier::Simple, expr),
      };
      if name.is_empty() {
        return Err(template_error(template, format!("empty variable name at offset {}", start)));
      }

      if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(&mut literal)));
      }
      segments.push(Segment::Variable(TemplateVariable {
        name: name.to_string(),
        modifier,
      }));
    }
    if !literal.is_empty() {
      segments.push(Segment::Literal(literal));
    }

    Ok(Self {
      source: template.to_string(),
      segments,
    })
  }

  pub fn as_str(&self) -> &str {
    &self.source
  }

  /// Distinct variables in order of first appearance.
  pub fn variables(&self) -> Vec<TemplateVariable> {
    let mut seen: Vec<TemplateVariable> = Vec::new();
    for segment in &self.segments {
      if let Segment::Variable(var) = segment {
        if !seen.iter().any(|v| v.name == var.name) {
          seen.push(var.clone());
        }
      }
    }
    seen
  }

  pub fn starts_with_placeholder(&self) -> bool {
    matches!(self.segments.first(), Some(Segment::Variable(_)))
  }

  /// Expands against row values using the standard encoding rules.
  pub fn expand(&self, values: &Record) -> String {
    self.expand_with(
      |name| values.get(name).filter(|v| !v.is_null()).map(|v| v.to_string()),
      |raw, modifier| match modifier {
        Modifier::Reserved => raw.to_string(),
        _ => encode_value(raw),
      },
    )
  }

  /// Expands with caller-supplied lookup and value encoding. The modifier
  /// prefix is added by the template; `encode` only transforms the value.
  pub fn expand_with<L, E>(&self, lookup: L, encode: E) -> String
  where
    L: Fn(&str) -> Option<String>,
    E: Fn(&str, Modifier) -> String,
  {
    let mut out = String::with_capacity(self.source.len());
    for segment in &self.segments {
      match segment {
        Segment::Literal(text) => out.push_str(text),
        Segment::Variable(var) => {
          if let Some(raw) = lookup(&var.name) {
            out.push_str(var.modifier.prefix());
            out.push_str(&encode(&raw, var.modifier));
          }
        }
      }
    }
    out
  }
}

impl fmt::Display for UriTemplate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.source)
  }
}

impl fmt::Display for TemplateVariable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{{{}{}}}", self.modifier.symbol(), self.name)
  }
}

fn template_error(template: &str, message: String) -> EngineError {
  EngineError::Template {
    template: template.to_string(),
    message,
  }
}

/// Encodes one value for use inside an IRI: trim, collapse whitespace runs to
/// `_`, then percent-encode UTF-8 bytes outside the unreserved set. Spaces
/// never become `+`, and `/` is kept.
pub fn encode_value(raw: &str) -> String {
  let collapsed = WHITESPACE_RUN.replace_all(raw.trim(), "_");
  utf8_percent_encode(&collapsed, VALUE_ENCODE_SET).to_string()
}

/// Parses and expands in one go.
pub fn expand_template(template: &str, values: &Record) -> EngineResult<String> {
  Ok(UriTemplate::parse(template)?.expand(values))
}

/// Extracts the variables of a template without expanding it.
pub fn parse_template(template: &str) -> EngineResult<Vec<TemplateVariable>> {
  Ok(UriTemplate::parse(template)?.variables())
}

/// Accepts templates that start with `http://`, `https://` or a placeholder.
pub fn validate_template(template: &str) -> EngineResult<Vec<TemplateVariable>> {
  let trimmed = template.trim_start();
  let parsed = UriTemplate::parse(trimmed)?;
  if trimmed.starts_with("http://") || trimmed.starts_with("https://") || parsed.starts_with_placeholder() {
    return Ok(parsed.variables());
  }
  Err(template_error(
    template,
    "template must start with http://, https:// or a placeholder".to_string(),
  ))
}

/// `base` (with a trailing `/`) followed by one `{column}` segment per key column.
pub fn build_default_template(base: &str, key_columns: &[&str]) -> String {
  let mut template = base.to_string();
  if !template.ends_with('/') {
    template.push('/');
  }
  let placeholders: Vec<String> = key_columns.iter().map(|c| format!("{{{}}}", c)).collect();
  template.push_str(&placeholders.join("/"));
  template
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::value::Value;

  fn row(pairs: &[(&str, &str)]) -> Record {
    pairs.iter().map(|(k, v)| (k.to_string(), Value::from(*v))).collect()
  }

  #[test]
  fn expands_and_collapses_whitespace() {
    let values = row(&[("year", "2024"), ("region", "Bern City")]);
    let out = expand_template("http://ex.org/{year}/{region}", &values).unwrap();
    assert_eq!(out, "http://ex.org/2024/Bern_City");
  }

  #[test]
  fn missing_variable_expands_to_nothing() {
    let out = expand_template("http://ex.org/{missing}", &Record::new()).unwrap();
    assert_eq!(out, "http://ex.org/");
    let out = expand_template("http://ex.org/a{/missing}{#frag}", &Record::new()).unwrap();
    assert_eq!(out, "http://ex.org/a");
  }

  #[test]
  fn modifiers_control_prefix_and_encoding() {
    let values = row(&[("path", "a b/c?d"), ("id", "x y")]);
    assert_eq!(
      expand_template("http://ex.org{/id}", &values).unwrap(),
      "http://ex.org/x_y"
    );
    assert_eq!(
      expand_template("http://ex.org/doc{#id}", &values).unwrap(),
      "http://ex.org/doc#x_y"
    );
    assert_eq!(
      expand_template("http://ex.org/{+path}", &values).unwrap(),
      "http://ex.org/a b/c?d"
    );
    assert_eq!(
      expand_template("http://ex.org/{path}", &values).unwrap(),
      "http://ex.org/a_b/c%3Fd"
    );
  }

  #[test]
  fn encoding_uses_utf8_and_never_plus() {
    assert_eq!(encode_value("  Zürich  Nord "), "Z%C3%BCrich_Nord");
    assert_eq!(encode_value("a+b"), "a%2Bb");
    assert_eq!(encode_value("x\ty"), "x_y");
  }

  #[test]
  fn parse_reports_variables_and_modifiers() {
    let vars = parse_template("{+base}/{id}{#frag}{id}").unwrap();
    assert_eq!(vars.len(), 3);
    assert_eq!(vars[0].modifier, Modifier::Reserved);
    assert_eq!(vars[1].name, "id");
    assert_eq!(vars[2].modifier, Modifier::Fragment);
    assert_eq!(vars[0].to_string(), "{+base}");
  }

  #[test]
  fn parse_rejects_malformed_expressions() {
    assert!(UriTemplate::parse("http://ex.org/{id").is_err());
    assert!(UriTemplate::parse("http://ex.org/{}").is_err());
    assert!(UriTemplate::parse("http://ex.org/{a{b}}").is_err());
  }

  #[test]
  fn validate_requires_scheme_or_placeholder() {
    assert!(validate_template("https://ex.org/{id}").is_ok());
    assert_eq!(validate_template("{base}/{id}").unwrap().len(), 2);
    assert!(validate_template("ex.org/{id}").is_err());
    assert!(validate_template("ftp://ex.org/{id}").is_err());
    // leading whitespace is ignored for both checks
    assert_eq!(validate_template(" {base}/x").unwrap().len(), 1);
    assert!(validate_template("  http://ex.org/{id}").is_ok());
    assert!(validate_template(" ex.org/{id}").is_err());
  }

  #[test]
  fn default_template_joins_key_columns() {
    assert_eq!(
      build_default_template("http://ex.org/obs", &["year", "region"]),
      "http://ex.org/obs/{year}/{region}"
    );
    assert_eq!(build_default_template("http://ex.org/", &["id"]), "http://ex.org/{id}");
  }
}
