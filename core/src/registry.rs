// weaver/src/registry.rs

//! Defines `OperationRegistry`, the id- and type-indexed catalog of operations
//! that pipeline steps dispatch to.

use crate::config::EngineConfig;
use crate::core::operation::{Operation, OperationInfo, OperationType};
use crate::error::{EngineError, EngineResult};
use crate::operations;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{event, Level};

/// The operation registry.
///
/// Registration is expected to happen once at startup, before any pipeline
/// runs; lookups afterwards only take read locks.
pub struct OperationRegistry {
  by_id: RwLock<HashMap<String, Arc<dyn Operation>>>,
  by_type: RwLock<HashMap<OperationType, Vec<Arc<dyn Operation>>>>,
}

impl OperationRegistry {
  /// Creates a new, empty registry.
  pub fn new() -> Self {
    Self {
      by_id: RwLock::new(HashMap::new()),
      by_type: RwLock::new(HashMap::new()),
    }
  }

  /// Creates a registry pre-populated with the built-in operations.
  pub fn with_builtins(config: &EngineConfig) -> Self {
    let registry = Self::new();
    operations::register_builtins(&registry, config);
    registry
  }

  /// Registers an operation under its id. A later registration with the same
  /// id replaces the earlier one in both the id index and its type bucket.
  pub fn register(&self, operation: Arc<dyn Operation>) {
    let id = operation.id().to_string();
    let op_type = operation.operation_type();
    event!(Level::DEBUG, operation_id = %id, operation_type = %op_type, "Registering operation.");

    let previous = self.by_id.write().insert(id.clone(), Arc::clone(&operation));

    let mut by_type = self.by_type.write();
    if let Some(previous) = previous {
      event!(Level::WARN, operation_id = %id, "Operation id registered twice; last registration wins.");
      if let Some(bucket) = by_type.get_mut(&previous.operation_type()) {
        bucket.retain(|op| op.id() != id);
      }
    }
    by_type.entry(op_type).or_default().push(operation);
  }

  pub fn get(&self, id: &str) -> Option<Arc<dyn Operation>> {
    self.by_id.read().get(id).cloned()
  }

  pub fn get_or_err(&self, id: &str) -> EngineResult<Arc<dyn Operation>> {
    self.get(id).ok_or_else(|| {
      event!(Level::ERROR, operation_id = %id, "No operation registered under this id.");
      EngineError::UnknownOperation {
        operation_id: id.to_string(),
      }
    })
  }

  pub fn contains(&self, id: &str) -> bool {
    self.by_id.read().contains_key(id)
  }

  /// Operations of one type, in registration order.
  pub fn get_by_type(&self, op_type: OperationType) -> Vec<Arc<dyn Operation>> {
    self.by_type.read().get(&op_type).cloned().unwrap_or_default()
  }

  /// Every registered operation id, sorted.
  pub fn ids(&self) -> Vec<String> {
    let mut ids: Vec<String> = self.by_id.read().keys().cloned().collect();
    ids.sort();
    ids
  }

  pub fn len(&self) -> usize {
    self.by_id.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_id.read().is_empty()
  }

  /// Discovery view for external tooling: type to operation summaries, each
  /// list sorted by id. Types with no registered operation are omitted.
  pub fn get_catalog(&self) -> BTreeMap<OperationType, Vec<OperationInfo>> {
    let by_type = self.by_type.read();
    by_type
      .iter()
      .filter(|(_, ops)| !ops.is_empty())
      .map(|(op_type, ops)| {
        let mut infos: Vec<OperationInfo> = ops.iter().map(|op| op.info()).collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        (*op_type, infos)
      })
      .collect()
  }
}

impl Default for OperationRegistry {
  fn default() -> Self {
    Self::new()
  }
}
