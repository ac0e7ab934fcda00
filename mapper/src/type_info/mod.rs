//! Type model used by accessor resolution
//!
//! Rust has no runtime field introspection, so every mappable type carries a statically built
//! [`TypeDescriptor`] (bound accessor functions per field) and every field type carries a
//! [`ValueType`] (identity plus bound value operations). The derive macro generates both; they
//! can also be written by hand.

mod any_value;
mod descriptor;
mod value_type;

pub use any_value::AnyValue;
pub use descriptor::{ConvertFn, FieldAccess, FieldDescriptor, TypeDescriptor, Upcast};
pub use value_type::{AssignFn, NavigateFn, NavigateMutFn, ValueKind, ValueType};

/// A type that can be the value of a mapped field
///
/// Implemented for primitives, `String`, `Option<T>`, [`AnyValue`] and every derived record.
/// Collection types are not field types; declare such fields with `#[mapping(skip)]`.
pub trait FieldType: std::any::Any + Clone + Send + Sync {
    /// Runtime identity and bound operations of this type
    fn value_type() -> ValueType;
}

/// A record type with a static descriptor of its fields
pub trait Mappable: FieldType {
    /// The descriptor, built once on first use
    fn descriptor() -> &'static TypeDescriptor;
}

macro_rules! impl_scalar_field_type {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldType for $ty {
                fn value_type() -> ValueType { ValueType::scalar::<Self>() }
            }
        )*
    };
}

impl_scalar_field_type!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
);

impl<T: FieldType> FieldType for Option<T> {
    fn value_type() -> ValueType { ValueType::optional::<T>() }
}

impl FieldType for AnyValue {
    fn value_type() -> ValueType { ValueType::wildcard() }
}
