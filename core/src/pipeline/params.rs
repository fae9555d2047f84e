// weaver/src/pipeline/params.rs

//! Resolution of declared step parameters into the values an operation sees.

use crate::config::EnvResolver;
use crate::core::operation::ParameterSpec;
use crate::core::value::{Parameters, Value, Variables};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static VARIABLE_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]*)\}").expect("valid regex"));
static WHOLE_ENV_REF: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^\$\{([A-Za-z_][A-Za-z0-9_]*)\}$").expect("valid regex"));

/// Replaces every `${name}` with the string form of the variable. Unknown
/// names become the empty string. Substituted text is not rescanned.
pub fn substitute_variables(raw: &str, variables: &Variables) -> String {
  VARIABLE_REF
    .replace_all(raw, |caps: &Captures<'_>| {
      variables
        .get(caps[1].trim())
        .map(|v| v.to_string())
        .unwrap_or_default()
    })
    .into_owned()
}

/// Substitutes variables, then, if the whole result reads `${NAME}`, looks
/// `NAME` up in the environment. An unset environment name leaves the value as is.
///
/// A value that is exactly `${NAME}` with no variable bound to `NAME` is looked
/// up in the environment first, so `${HOME}` reaches the environment directly.
/// Variables win over environment names.
pub fn resolve_string(raw: &str, variables: &Variables, env: &dyn EnvResolver) -> String {
  if let Some(caps) = WHOLE_ENV_REF.captures(raw) {
    if !variables.contains_key(&caps[1]) {
      if let Some(value) = env.resolve(&caps[1]) {
        return value;
      }
    }
  }
  let substituted = substitute_variables(raw, variables);
  if let Some(caps) = WHOLE_ENV_REF.captures(&substituted) {
    if let Some(value) = env.resolve(&caps[1]) {
      return value;
    }
  }
  substituted
}

fn resolve_value(value: &Value, variables: &Variables, env: &dyn EnvResolver) -> Value {
  match value {
    Value::String(s) => Value::String(resolve_string(s, variables, env)),
    Value::List(items) => Value::List(items.iter().map(|v| resolve_value(v, variables, env)).collect()),
    Value::Map(entries) => Value::Map(
      entries
        .iter()
        .map(|(k, v)| (k.clone(), resolve_value(v, variables, env)))
        .collect(),
    ),
    other => other.clone(),
  }
}

/// Resolves every declared parameter. Strings nested in lists and maps are
/// resolved too; other values pass through.
pub fn resolve_parameters(declared: &Parameters, variables: &Variables, env: &dyn EnvResolver) -> Parameters {
  declared
    .iter()
    .map(|(name, value)| (name.clone(), resolve_value(value, variables, env)))
    .collect()
}

/// Fills parameters the step left out (or set to null) from the operation's
/// declared defaults.
pub fn apply_defaults(parameters: &mut Parameters, specs: &[ParameterSpec]) {
  for spec in specs {
    if let Some(default) = &spec.default {
      let missing = parameters.get(&spec.name).map_or(true, Value::is_null);
      if missing {
        parameters.insert(spec.name.clone(), default.clone());
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::MapEnv;
  use crate::core::operation::ParameterType;

  fn vars(pairs: &[(&str, Value)]) -> Variables {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
  }

  #[test]
  fn substitutes_every_occurrence() {
    let v = vars(&[("base", Value::from("http://ex.org")), ("year", Value::from(2024i64))]);
    assert_eq!(
      substitute_variables("${base}/${year}/${base}", &v),
      "http://ex.org/2024/http://ex.org"
    );
    assert_eq!(substitute_variables("x-${missing}-y", &v), "x--y");
    assert_eq!(substitute_variables("no refs", &v), "no refs");
  }

  #[test]
  fn whole_value_env_reference_is_resolved_after_substitution() {
    let env = MapEnv::new().with("API_TOKEN", "s3cret");
    let v = vars(&[("token", Value::from("${API_TOKEN}"))]);
    assert_eq!(resolve_string("${token}", &v, &env), "s3cret");
    // unset env names stay literal
    let v = vars(&[("token", Value::from("${NOT_SET}"))]);
    assert_eq!(resolve_string("${token}", &v, &env), "${NOT_SET}");
    // partial references never hit the environment
    let v = vars(&[("token", Value::from("Bearer ${API_TOKEN}"))]);
    assert_eq!(resolve_string("${token}", &v, &env), "Bearer ${API_TOKEN}");
  }

  #[test]
  fn unbound_whole_value_reference_reads_environment() {
    let env = MapEnv::new().with("HOME", "/home/weaver");
    assert_eq!(resolve_string("${HOME}", &Variables::new(), &env), "/home/weaver");
    // a bound variable shadows the environment
    let v = vars(&[("HOME", Value::from("/srv"))]);
    assert_eq!(resolve_string("${HOME}", &v, &env), "/srv");
    // unbound and unset still resolves to the empty string
    assert_eq!(resolve_string("${NOWHERE}", &Variables::new(), &env), "");
    assert_eq!(resolve_string("dir=${HOME}", &Variables::new(), &env), "dir=");
  }

  #[test]
  fn resolves_nested_values_and_keeps_scalars() {
    let env = MapEnv::new();
    let v = vars(&[("ns", Value::from("http://ex.org/"))]);
    let mut mappings = std::collections::BTreeMap::new();
    mappings.insert("name".to_string(), Value::from("${ns}name"));
    let mut declared = Parameters::new();
    declared.insert("propertyMappings".into(), Value::Map(mappings));
    declared.insert("hasHeader".into(), Value::Bool(false));

    let resolved = resolve_parameters(&declared, &v, &env);
    assert_eq!(
      resolved["propertyMappings"].as_map().unwrap()["name"],
      Value::from("http://ex.org/name")
    );
    assert_eq!(resolved["hasHeader"], Value::Bool(false));
  }

  #[test]
  fn defaults_fill_gaps_only() {
    let specs = vec![
      ParameterSpec::optional("delimiter", ParameterType::String, "").with_default(","),
      ParameterSpec::optional("hasHeader", ParameterType::Boolean, "").with_default(true),
    ];
    let mut params = Parameters::new();
    params.insert("delimiter".into(), Value::from(";"));
    apply_defaults(&mut params, &specs);
    assert_eq!(params["delimiter"], Value::from(";"));
    assert_eq!(params["hasHeader"], Value::Bool(true));
  }
}
