//! Accessor resolution
//!
//! Turns a dot-delimited field path on a described type into a resolved chain of bound field
//! functions, validating every segment up front. Chains are compiled into closures that copy
//! plans call directly.

mod chain;
mod field_path;
mod resolver;

pub use chain::{LocateFn, ReadChain, ReadFn, WriteChain, WriteFn, WriteOutcome};
pub use field_path::FieldPath;
pub use resolver::{resolve_read, resolve_write};
