// weaver/src/core/value.rs

//! Tagged value type shared by operation parameters, pipeline variables and records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A dynamically shaped value. Operations pattern-match on it instead of casting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
  #[default]
  Null,
  Bool(bool),
  Integer(i64),
  Float(f64),
  String(String),
  List(Vec<Value>),
  Map(BTreeMap<String, Value>),
}

/// One input row: column name to value.
pub type Record = BTreeMap<String, Value>;

/// Resolved parameters handed to an operation.
pub type Parameters = BTreeMap<String, Value>;

/// Pipeline variable bindings.
pub type Variables = BTreeMap<String, Value>;

impl Value {
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Bool(b) => Some(*b),
      Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
      },
      _ => None,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Value::Integer(i) => Some(*i),
      Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
      Value::String(s) => s.trim().parse().ok(),
      _ => None,
    }
  }

  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Value::Integer(i) => Some(*i as f64),
      Value::Float(f) => Some(*f),
      Value::String(s) => s.trim().parse().ok(),
      _ => None,
    }
  }

  pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
    match self {
      Value::Map(m) => Some(m),
      _ => None,
    }
  }

  pub fn as_list(&self) -> Option<&[Value]> {
    match self {
      Value::List(l) => Some(l),
      _ => None,
    }
  }

  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  /// Null values and blank strings count as absent for mapping purposes.
  pub fn is_empty(&self) -> bool {
    match self {
      Value::Null => true,
      Value::String(s) => s.trim().is_empty(),
      _ => false,
    }
  }

  /// Parses a raw cell into the narrowest scalar it represents.
  /// Used by sources with type inference switched on.
  pub fn infer(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Value::String(raw.to_string());
    }
    if let Ok(i) = trimmed.parse::<i64>() {
      return Value::Integer(i);
    }
    if trimmed.contains(['.', 'e', 'E']) {
      if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
          return Value::Float(f);
        }
      }
    }
    match trimmed {
      "true" | "TRUE" | "True" => Value::Bool(true),
      "false" | "FALSE" | "False" => Value::Bool(false),
      _ => Value::String(raw.to_string()),
    }
  }
}

/// The string form used for template substitution. Scalars render bare,
/// lists and maps render as JSON.
impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Null => Ok(()),
      Value::Bool(b) => write!(f, "{}", b),
      Value::Integer(i) => write!(f, "{}", i),
      Value::Float(x) => write!(f, "{}", x),
      Value::String(s) => f.write_str(s),
      Value::List(_) | Value::Map(_) => write!(f, "{}", serde_json::Value::from(self)),
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::String(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::String(s)
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self {
    Value::Integer(i)
  }
}

impl From<usize> for Value {
  fn from(i: usize) -> Self {
    Value::Integer(i64::try_from(i).unwrap_or(i64::MAX))
  }
}

impl From<f64> for Value {
  fn from(x: f64) -> Self {
    Value::Float(x)
  }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
  fn from(items: Vec<V>) -> Self {
    Value::List(items.into_iter().map(Into::into).collect())
  }
}

impl<V: Into<Value>> From<BTreeMap<String, V>> for Value {
  fn from(map: BTreeMap<String, V>) -> Self {
    Value::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
  }
}

impl From<serde_json::Value> for Value {
  fn from(json: serde_json::Value) -> Self {
    match json {
      serde_json::Value::Null => Value::Null,
      serde_json::Value::Bool(b) => Value::Bool(b),
      serde_json::Value::Number(n) => match n.as_i64() {
        Some(i) => Value::Integer(i),
        None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
      },
      serde_json::Value::String(s) => Value::String(s),
      serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
      serde_json::Value::Object(fields) => Value::Map(fields.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
    }
  }
}

impl From<&Value> for serde_json::Value {
  fn from(value: &Value) -> Self {
    match value {
      Value::Null => serde_json::Value::Null,
      Value::Bool(b) => serde_json::Value::Bool(*b),
      Value::Integer(i) => serde_json::Value::from(*i),
      Value::Float(x) => serde_json::Number::from_f64(*x)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null),
      Value::String(s) => serde_json::Value::String(s.clone()),
      Value::List(items) => serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect()),
      Value::Map(fields) => serde_json::Value::Object(
        fields
          .iter()
          .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
          .collect(),
      ),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_is_the_substitution_form() {
    assert_eq!(Value::from("Bern").to_string(), "Bern");
    assert_eq!(Value::Integer(2024).to_string(), "2024");
    assert_eq!(Value::Bool(true).to_string(), "true");
    assert_eq!(Value::Null.to_string(), "");
    assert_eq!(Value::from(vec!["a", "b"]).to_string(), r#"["a","b"]"#);
  }

  #[test]
  fn infer_picks_narrowest_scalar() {
    assert_eq!(Value::infer("42"), Value::Integer(42));
    assert_eq!(Value::infer("4.5"), Value::Float(4.5));
    assert_eq!(Value::infer("true"), Value::Bool(true));
    assert_eq!(Value::infer("Acme"), Value::from("Acme"));
    assert_eq!(Value::infer("inf"), Value::from("inf"));
  }

  #[test]
  fn json_conversion_keeps_integers_integral() {
    let json: serde_json::Value = serde_json::json!({"n": 3, "x": 1.5, "tags": ["a"]});
    let value = Value::from(json);
    let map = value.as_map().unwrap();
    assert_eq!(map["n"], Value::Integer(3));
    assert_eq!(map["x"], Value::Float(1.5));
    assert_eq!(map["tags"], Value::List(vec![Value::from("a")]));
  }
}
