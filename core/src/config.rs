// weaver/src/config.rs

//! Engine configuration and the environment lookup used for `${ENV}` parameters.

use crate::error::{EngineError, EngineResult};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Resolves environment values. Used by config loading and by parameter
/// resolution when a parameter reduces to `${NAME}`.
pub trait EnvResolver: Send + Sync {
  fn resolve(&self, name: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvResolver for ProcessEnv {
  fn resolve(&self, name: &str) -> Option<String> {
    std::env::var(name).ok()
  }
}

/// A fixed set of values, for tests and embedders that do not want the
/// process environment to leak into pipelines.
#[derive(Debug, Default, Clone)]
pub struct MapEnv(HashMap<String, String>);

impl MapEnv {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, name: &str, value: &str) -> Self {
    self.0.insert(name.to_string(), value.to_string());
    self
  }
}

impl EnvResolver for MapEnv {
  fn resolve(&self, name: &str) -> Option<String> {
    self.0.get(name).cloned()
  }
}

/// What the validation operation does with a non-conforming report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViolationPolicy {
  /// Fail the step.
  #[default]
  Error,
  /// Log at warn level and succeed.
  Warn,
  /// Log at info level and succeed.
  Continue,
}

impl FromStr for ViolationPolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "error" => Ok(ViolationPolicy::Error),
      "warn" | "warning" => Ok(ViolationPolicy::Warn),
      "continue" => Ok(ViolationPolicy::Continue),
      other => Err(format!("expected one of error, warn, continue; got '{}'", other)),
    }
  }
}

impl fmt::Display for ViolationPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      ViolationPolicy::Error => "error",
      ViolationPolicy::Warn => "warn",
      ViolationPolicy::Continue => "continue",
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
  /// Rows between progress callbacks in streaming operations.
  pub progress_interval: usize,
  /// Nesting bound for shape references (sh:node, sh:not, sh:and, ...).
  pub max_shape_depth: usize,
  /// Policy used when a validation step does not set `onViolation`.
  pub on_violation_default: ViolationPolicy,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      progress_interval: 1000,
      max_shape_depth: 32,
      on_violation_default: ViolationPolicy::Error,
    }
  }
}

impl EngineConfig {
  pub const PROGRESS_INTERVAL_VAR: &'static str = "WEAVER_PROGRESS_INTERVAL";
  pub const MAX_SHAPE_DEPTH_VAR: &'static str = "WEAVER_MAX_SHAPE_DEPTH";
  pub const ON_VIOLATION_VAR: &'static str = "WEAVER_ON_VIOLATION";

  pub fn from_env(env: &dyn EnvResolver) -> EngineResult<Self> {
    let defaults = Self::default();

    let progress_interval = match env.resolve(Self::PROGRESS_INTERVAL_VAR) {
      Some(raw) => parse_positive(Self::PROGRESS_INTERVAL_VAR, &raw)?,
      None => defaults.progress_interval,
    };
    let max_shape_depth = match env.resolve(Self::MAX_SHAPE_DEPTH_VAR) {
      Some(raw) => parse_positive(Self::MAX_SHAPE_DEPTH_VAR, &raw)?,
      None => defaults.max_shape_depth,
    };
    let on_violation_default = match env.resolve(Self::ON_VIOLATION_VAR) {
      Some(raw) => raw.parse().map_err(|e| config_error(Self::ON_VIOLATION_VAR, e))?,
      None => defaults.on_violation_default,
    };

    tracing::debug!(progress_interval, max_shape_depth, %on_violation_default, "Engine configuration loaded.");
    Ok(Self {
      progress_interval,
      max_shape_depth,
      on_violation_default,
    })
  }
}

fn parse_positive(var: &str, raw: &str) -> EngineResult<usize> {
  match raw.trim().parse::<usize>() {
    Ok(n) if n > 0 => Ok(n),
    Ok(_) => Err(config_error(var, "must be greater than zero".to_string())),
    Err(e) => Err(config_error(var, e.to_string())),
  }
}

fn config_error(var: &str, message: String) -> EngineError {
  EngineError::InvalidDefinition {
    message: format!("Invalid configuration value for {}: {}", var, message),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_when_nothing_is_set() {
    let config = EngineConfig::from_env(&MapEnv::new()).unwrap();
    assert_eq!(config, EngineConfig::default());
  }

  #[test]
  fn reads_overrides() {
    let env = MapEnv::new()
      .with("WEAVER_PROGRESS_INTERVAL", "250")
      .with("WEAVER_ON_VIOLATION", "Warn");
    let config = EngineConfig::from_env(&env).unwrap();
    assert_eq!(config.progress_interval, 250);
    assert_eq!(config.on_violation_default, ViolationPolicy::Warn);
    assert_eq!(config.max_shape_depth, 32);
  }

  #[test]
  fn rejects_zero_interval() {
    let env = MapEnv::new().with("WEAVER_PROGRESS_INTERVAL", "0");
    let err = EngineConfig::from_env(&env).unwrap_err();
    assert!(err.to_string().contains("WEAVER_PROGRESS_INTERVAL"));
  }
}
