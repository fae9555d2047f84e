pub mod context;
pub mod operation;
pub mod stream;
pub mod value;

// Re-export key types for easier access from other weaver modules (and lib.rs)
pub use context::{LogLevel, NoopOperationCallback, OperationCallback, OperationContext, OperationResult};
pub use operation::{Operation, OperationInfo, OperationType, ParameterSpec, ParameterType};
pub use stream::{CancellationToken, RecordIter, RecordStream};
pub use value::{Parameters, Record, Value, Variables};
