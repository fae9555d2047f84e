// weaver/src/pipeline/ordering.rs

use crate::error::{EngineError, EngineResult};
use crate::pipeline::definition::PipelineStep;
use std::collections::HashSet;

/// Orders steps so that each one comes after every step in its
/// `input_connections`.
///
/// Repeated passes over the unvisited steps in declaration order; a step is
/// ready once all its dependencies are visited. A pass that makes no progress
/// means the remaining steps form (or depend on) a cycle. Quadratic in the
/// step count, which stays in the tens.
pub fn topological_order(steps: &[PipelineStep]) -> EngineResult<Vec<&PipelineStep>> {
  let known: HashSet<&str> = steps.iter().map(|s| s.id.as_str()).collect();
  for step in steps {
    if let Some(missing) = step.input_connections.iter().find(|c| !known.contains(c.as_str())) {
      return Err(EngineError::InvalidDefinition {
        message: format!("Step '{}' depends on unknown step '{}'", step.id, missing),
      });
    }
  }

  let mut visited: HashSet<&str> = HashSet::with_capacity(steps.len());
  let mut order = Vec::with_capacity(steps.len());

  while order.len() < steps.len() {
    let mut progressed = false;
    for step in steps {
      if visited.contains(step.id.as_str()) {
        continue;
      }
      if step.input_connections.iter().all(|dep| visited.contains(dep.as_str())) {
        visited.insert(step.id.as_str());
        order.push(step);
        progressed = true;
      }
    }
    if !progressed {
      let stuck = steps
        .iter()
        .filter(|s| !visited.contains(s.id.as_str()))
        .map(|s| s.id.clone())
        .collect();
      return Err(EngineError::CircularDependency { steps: stuck });
    }
  }
  Ok(order)
}
