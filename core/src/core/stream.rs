// weaver/src/core/stream.rs

//! Lazy, single-pass record streams passed between steps.

use crate::core::value::Record;
use crate::error::EngineResult;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The iterator a consumer pulls records from. Items are fallible because
/// sources parse lazily and a malformed row surfaces only when it is reached.
pub type RecordIter = Box<dyn Iterator<Item = EngineResult<Record>> + Send>;

/// A shareable handle to a pull-based record iterator.
///
/// Cloning the handle does not duplicate the data: the first `take()` hands the
/// iterator to its caller and every later `take()` returns `None`. A stream
/// cannot be restarted once taken.
#[derive(Clone)]
pub struct RecordStream {
  inner: Arc<Mutex<Option<RecordIter>>>,
}

impl RecordStream {
  pub fn new<I>(iter: I) -> Self
  where
    I: Iterator<Item = EngineResult<Record>> + Send + 'static,
  {
    Self {
      inner: Arc::new(Mutex::new(Some(Box::new(iter)))),
    }
  }

  /// Builds a stream over already materialized records.
  pub fn from_records(records: Vec<Record>) -> Self {
    Self::new(records.into_iter().map(Ok))
  }

  /// Hands out the underlying iterator. Returns `None` once consumed.
  pub fn take(&self) -> Option<RecordIter> {
    self.inner.lock().take()
  }

  pub fn is_consumed(&self) -> bool {
    self.inner.lock().is_none()
  }

  /// Drains the stream into memory. Mostly useful in tests and small sources.
  pub fn collect_records(&self) -> EngineResult<Vec<Record>> {
    match self.take() {
      Some(iter) => iter.collect(),
      None => Ok(Vec::new()),
    }
  }
}

impl fmt::Debug for RecordStream {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RecordStream")
      .field("consumed", &self.is_consumed())
      .finish()
  }
}

/// Cooperative cancellation flag shared between a caller and a running pipeline.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::value::Value;

  #[test]
  fn stream_is_single_pass_across_clones() {
    let mut row = Record::new();
    row.insert("id".into(), Value::from("1"));
    let stream = RecordStream::from_records(vec![row]);
    let shared = stream.clone();

    assert!(!shared.is_consumed());
    assert_eq!(stream.collect_records().unwrap().len(), 1);
    assert!(shared.is_consumed());
    assert!(shared.take().is_none());
  }

  #[test]
  fn cancellation_is_visible_through_clones() {
    let token = CancellationToken::new();
    let observer = token.clone();
    assert!(!observer.is_cancelled());
    token.cancel();
    assert!(observer.is_cancelled());
  }
}
