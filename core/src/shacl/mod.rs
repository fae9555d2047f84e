// weaver/src/shacl/mod.rs

//! SHACL core validation: shapes compilation, constraint evaluation and the
//! validation report model.

mod constraints;
pub mod report;
pub mod shapes;
pub mod validator;
pub mod vocab;

pub use report::{Severity, ValidationReport, ValidationResult};
pub use shapes::{Constraint, NodeKind, PropertyPath, Shape, ShapesGraph, Target};
pub use validator::ShaclValidator;
