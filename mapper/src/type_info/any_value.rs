//! The wildcard field value
//!
//! `AnyValue` plays the role of a universal field type: every other type is compatible with it.
//! It holds a shared, type-erased value so copying it between instances is a reference-count bump.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A shared, type-erased field value
#[derive(Clone, Default)]
pub struct AnyValue(Option<Arc<dyn Any + Send + Sync>>);

impl AnyValue {
    /// Wrap a concrete value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self { Self(Some(Arc::new(value))) }

    /// A wildcard holding nothing
    pub const fn empty() -> Self { Self(None) }

    /// Whether no value is held
    pub const fn is_empty(&self) -> bool { self.0.is_none() }

    /// Borrow the held value as `T`, if it is one
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|value| value.downcast_ref::<T>())
    }

    /// Borrow the held value without naming its type
    pub fn as_any(&self) -> Option<&dyn Any> { self.0.as_deref().map(|value| value as &dyn Any) }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(_) => f.write_str("AnyValue(..)"),
            None => f.write_str("AnyValue(empty)"),
        }
    }
}

impl PartialEq for AnyValue {
    /// Two wildcards are equal when both are empty or both share the same allocation
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
