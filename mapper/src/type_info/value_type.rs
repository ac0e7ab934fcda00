//! Runtime identity of a field value type
//!
//! A `ValueType` is the semantic type of a field as far as mapping is concerned: the concrete
//! `TypeId`, the canonical identity used for compatibility checks, its kind, and the bound
//! functions that navigate into, assign to and erase values of that type. All of it is resolved
//! once when a descriptor is built; copy plans only ever call the bound functions.

use std::any::{Any, TypeId, type_name};
use std::fmt;

use super::any_value::AnyValue;
use super::descriptor::{TypeDescriptor, Upcast};
use super::{FieldType, Mappable};

/// Reads the value a container holds (identity for records, `Some` payload for options)
pub type NavigateFn = fn(&dyn Any) -> Option<&dyn Any>;
/// Mutable counterpart of [`NavigateFn`]
pub type NavigateMutFn = fn(&mut dyn Any) -> Option<&mut dyn Any>;
/// Writes `value` into `slot`, returning false when the value cannot be represented in the slot
pub type AssignFn = fn(&mut dyn Any, &dyn Any) -> bool;
/// Erases a value into the wildcard holder
pub type EraseFn = fn(&dyn Any) -> Option<AnyValue>;

/// Category of a value type
#[derive(Clone, Copy)]
pub enum ValueKind {
    /// Primitive or string leaf value
    Scalar,
    /// Nullable wrapper around another value type
    Optional(fn() -> ValueType),
    /// Type with declared fields
    Record(fn() -> &'static TypeDescriptor),
    /// Universal wildcard, compatible with everything
    Wildcard,
    /// Declared but not mappable (hidden fields of arbitrary types)
    Opaque,
}

impl fmt::Debug for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => f.write_str("Scalar"),
            Self::Optional(inner) => f.debug_tuple("Optional").field(&inner().name()).finish(),
            Self::Record(descriptor) => f.debug_tuple("Record").field(&descriptor().name()).finish(),
            Self::Wildcard => f.write_str("Wildcard"),
            Self::Opaque => f.write_str("Opaque"),
        }
    }
}

/// Semantic type of a field value with its bound value operations
#[derive(Clone, Copy)]
pub struct ValueType {
    name:         &'static str,
    id:           TypeId,
    canonical:    TypeId,
    kind:         ValueKind,
    navigate:     NavigateFn,
    navigate_mut: NavigateMutFn,
    assign:       AssignFn,
    erase:        EraseFn,
}

impl ValueType {
    /// A leaf value type that is its own canonical identity
    pub fn scalar<T: FieldType>() -> Self {
        Self {
            name:         type_name::<T>(),
            id:           TypeId::of::<T>(),
            canonical:    TypeId::of::<T>(),
            kind:         ValueKind::Scalar,
            navigate:     navigate_none,
            navigate_mut: navigate_none_mut,
            assign:       assign_value::<T>,
            erase:        erase_value::<T>,
        }
    }

    /// `Option<T>`, canonically the same type as `T`
    pub fn optional<T: FieldType>() -> Self {
        Self {
            name:         type_name::<Option<T>>(),
            id:           TypeId::of::<Option<T>>(),
            canonical:    T::value_type().canonical,
            kind:         ValueKind::Optional(T::value_type),
            navigate:     navigate_option::<T>,
            navigate_mut: navigate_option_mut::<T>,
            assign:       assign_option::<T>,
            erase:        erase_option::<T>,
        }
    }

    /// A record type described by its `Mappable` descriptor
    pub fn record<T: Mappable>() -> Self {
        Self {
            name:         type_name::<T>(),
            id:           TypeId::of::<T>(),
            canonical:    TypeId::of::<T>(),
            kind:         ValueKind::Record(T::descriptor),
            navigate:     navigate_self::<T>,
            navigate_mut: navigate_self_mut::<T>,
            assign:       assign_value::<T>,
            erase:        erase_value::<T>,
        }
    }

    /// The wildcard value type
    pub fn wildcard() -> Self {
        Self {
            name:         type_name::<AnyValue>(),
            id:           TypeId::of::<AnyValue>(),
            canonical:    TypeId::of::<AnyValue>(),
            kind:         ValueKind::Wildcard,
            navigate:     navigate_none,
            navigate_mut: navigate_none_mut,
            assign:       assign_wildcard,
            erase:        erase_value::<AnyValue>,
        }
    }

    /// A declared type that takes no part in mapping
    pub fn opaque<T: Any>() -> Self {
        Self {
            name:         type_name::<T>(),
            id:           TypeId::of::<T>(),
            canonical:    TypeId::of::<T>(),
            kind:         ValueKind::Opaque,
            navigate:     navigate_none,
            navigate_mut: navigate_none_mut,
            assign:       reject_assign,
            erase:        reject_erase,
        }
    }

    /// Fully qualified type name
    pub const fn name(&self) -> &'static str { self.name }

    /// Concrete type identity
    pub const fn id(&self) -> TypeId { self.id }

    /// Identity after stripping nullable wrappers
    pub const fn canonical(&self) -> TypeId { self.canonical }

    /// Category of this type
    pub const fn kind(&self) -> ValueKind { self.kind }

    /// Whether this is the universal wildcard once nullable wrappers are stripped
    pub fn is_wildcard(&self) -> bool { self.canonical == TypeId::of::<AnyValue>() }

    /// Whether this is a nullable wrapper
    pub const fn is_optional(&self) -> bool { matches!(self.kind, ValueKind::Optional(_)) }

    /// Descriptor of the record this type holds, looking through nullable wrappers
    pub fn descriptor(&self) -> Option<&'static TypeDescriptor> {
        match self.kind {
            ValueKind::Record(descriptor) => Some(descriptor()),
            ValueKind::Optional(inner) => inner().descriptor(),
            ValueKind::Scalar | ValueKind::Wildcard | ValueKind::Opaque => None,
        }
    }

    /// Whether this type is `other` or declares `other` among its (transitive) supertypes
    pub fn is_a(&self, other: &Self) -> bool {
        self.canonical == other.canonical
            || self
                .descriptor()
                .is_some_and(|descriptor| descriptor.is_subtype_of(other.canonical))
    }

    /// Declared conversion from this type into `other`, when `other` is a distinct supertype
    pub fn upcast_to(&self, other: &Self) -> Option<Upcast> {
        if self.canonical == other.canonical {
            return None;
        }
        self.descriptor()?.upcast_to(other.canonical)
    }

    /// Reach the value held by a container of this type
    pub fn navigate<'a>(&self, value: &'a dyn Any) -> Option<&'a dyn Any> { (self.navigate)(value) }

    /// Reach the value held by a container of this type, mutably
    pub fn navigate_mut<'a>(&self, value: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        (self.navigate_mut)(value)
    }

    /// Bound navigation function, for composing into copy operations
    pub const fn navigate_fn(&self) -> NavigateFn { self.navigate }

    /// Bound mutable navigation function, for composing into copy operations
    pub const fn navigate_mut_fn(&self) -> NavigateMutFn { self.navigate_mut }

    /// Bound assignment function for slots of this type
    pub const fn assign_fn(&self) -> AssignFn { self.assign }

    /// Bound erasure function for values of this type
    pub const fn erase_fn(&self) -> EraseFn { self.erase }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueType")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name) }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool { self.id == other.id }
}

impl Eq for ValueType {}

fn navigate_none(_: &dyn Any) -> Option<&dyn Any> { None }

fn navigate_none_mut(_: &mut dyn Any) -> Option<&mut dyn Any> { None }

fn navigate_self<T: Any>(value: &dyn Any) -> Option<&dyn Any> { value.is::<T>().then_some(value) }

fn navigate_self_mut<T: Any>(value: &mut dyn Any) -> Option<&mut dyn Any> {
    if value.is::<T>() { Some(value) } else { None }
}

fn navigate_option<T: Any>(value: &dyn Any) -> Option<&dyn Any> {
    value
        .downcast_ref::<Option<T>>()?
        .as_ref()
        .map(|inner| inner as &dyn Any)
}

fn navigate_option_mut<T: Any>(value: &mut dyn Any) -> Option<&mut dyn Any> {
    value
        .downcast_mut::<Option<T>>()?
        .as_mut()
        .map(|inner| inner as &mut dyn Any)
}

/// The wildcard carried by `value`, if it is `AnyValue` or `Option<AnyValue>`
///
/// `Some(None)` is a wildcard holding nothing.
fn wildcard_of(value: &dyn Any) -> Option<Option<&AnyValue>> {
    if let Some(wildcard) = value.downcast_ref::<AnyValue>() {
        return Some(Some(wildcard).filter(|wildcard| !wildcard.is_empty()));
    }
    value
        .downcast_ref::<Option<AnyValue>>()
        .map(|wildcard| wildcard.as_ref().filter(|wildcard| !wildcard.is_empty()))
}

/// Assign into a `T` slot from a `T`, a present `Option<T>`, or a wildcard holding a `T`
fn assign_value<T: FieldType>(slot: &mut dyn Any, value: &dyn Any) -> bool {
    let Some(slot) = slot.downcast_mut::<T>() else {
        return false;
    };
    let source = value
        .downcast_ref::<T>()
        .or_else(|| value.downcast_ref::<Option<T>>().and_then(Option::as_ref))
        .or_else(|| wildcard_of(value).flatten().and_then(AnyValue::downcast_ref::<T>));
    match source {
        Some(source) => {
            slot.clone_from(source);
            true
        }
        None => false,
    }
}

/// Assign into an `Option<T>` slot; absent sources (`None`, empty wildcard) clear the slot
fn assign_option<T: FieldType>(slot: &mut dyn Any, value: &dyn Any) -> bool {
    let Some(slot) = slot.downcast_mut::<Option<T>>() else {
        return false;
    };
    if let Some(source) = value.downcast_ref::<Option<T>>() {
        slot.clone_from(source);
        return true;
    }
    let wildcard = wildcard_of(value);
    if matches!(wildcard, Some(None)) {
        *slot = None;
        return true;
    }
    let source = value
        .downcast_ref::<T>()
        .or_else(|| wildcard.flatten().and_then(AnyValue::downcast_ref::<T>));
    source.is_some_and(|source| {
        *slot = Some(source.clone());
        true
    })
}

/// Assign into an `AnyValue` slot from another wildcard; an absent `Option<AnyValue>` empties it
fn assign_wildcard(slot: &mut dyn Any, value: &dyn Any) -> bool {
    let Some(slot) = slot.downcast_mut::<AnyValue>() else {
        return false;
    };
    match wildcard_of(value) {
        Some(Some(source)) => {
            slot.clone_from(source);
            true
        }
        Some(None) => {
            *slot = AnyValue::empty();
            true
        }
        None => false,
    }
}

fn reject_assign(_: &mut dyn Any, _: &dyn Any) -> bool { false }

fn erase_value<T: FieldType>(value: &dyn Any) -> Option<AnyValue> {
    if let Some(wildcard) = value.downcast_ref::<AnyValue>() {
        return Some(wildcard.clone());
    }
    value.downcast_ref::<T>().map(|value| AnyValue::new(value.clone()))
}

fn erase_option<T: FieldType>(value: &dyn Any) -> Option<AnyValue> {
    value
        .downcast_ref::<Option<T>>()
        .map(|value| value.clone().map_or_else(AnyValue::empty, AnyValue::new))
}

fn reject_erase(_: &dyn Any) -> Option<AnyValue> { None }
