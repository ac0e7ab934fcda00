//! Type and field descriptors
//!
//! A `TypeDescriptor` is the statically built registry of bound accessor functions for one
//! record type: its declared fields in declaration order, the mapping metadata attached to
//! them, declared supertypes and an optional default constructor. Descriptors are produced by
//! `#[derive(Mappable)]` or built by hand with the builder methods and the [`field!`] macro.
//!
//! [`field!`]: crate::field

use std::any::{Any, TypeId, type_name};
use std::collections::VecDeque;
use std::fmt;

use strum_macros::{AsRefStr, Display};

use super::value_type::{AssignFn, ValueType};
use super::{FieldType, Mappable};
use crate::instruction::FieldMapping;

/// Whether a declared field can be bound by accessor resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FieldAccess {
    /// Readable and writable
    ReadWrite,
    /// Readable only; writes and mutable navigation are denied
    ReadOnly,
    /// Declared but not bindable at all
    Hidden,
}

impl FieldAccess {
    /// Whether the field can be read
    pub const fn is_readable(self) -> bool { !matches!(self, Self::Hidden) }

    /// Whether the field can be written or navigated mutably
    pub const fn is_writable(self) -> bool { matches!(self, Self::ReadWrite) }
}

/// One declared field with its bound accessor functions
#[derive(Clone, Copy)]
pub struct FieldDescriptor {
    /// Declared field name
    pub name:       &'static str,
    /// Access level
    pub access:     FieldAccess,
    /// Value type of the field, resolved lazily so recursive types can be described
    pub value_type: fn() -> ValueType,
    /// Borrow the field from an owner instance
    pub get:        fn(&dyn Any) -> Option<&dyn Any>,
    /// Mutably borrow the field from an owner instance
    pub get_mut:    fn(&mut dyn Any) -> Option<&mut dyn Any>,
}

impl FieldDescriptor {
    /// Resolved value type of the field
    pub fn value_type(&self) -> ValueType { (self.value_type)() }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("access", &self.access)
            .field("value_type", &self.value_type().name())
            .finish_non_exhaustive()
    }
}

/// Builds a [`FieldDescriptor`] binding a named field of an owner type
///
/// ```ignore
/// TypeDescriptor::of::<Order>()
///     .field(reflectmap::field!(Order, id: u64))
///     .field(reflectmap::field!(Order, created_by: String, read_only))
///     .field(reflectmap::field!(Order, scratch: Vec<u8>, hidden))
/// ```
#[macro_export]
macro_rules! field {
    (@bind $owner:ty, $name:ident, $access:expr, $value_type:expr) => {
        $crate::FieldDescriptor {
            name:       ::core::stringify!($name),
            access:     $access,
            value_type: $value_type,
            get:        |owner| {
                owner
                    .downcast_ref::<$owner>()
                    .map(|owner| &owner.$name as &dyn ::core::any::Any)
            },
            get_mut:    |owner| {
                owner
                    .downcast_mut::<$owner>()
                    .map(|owner| &mut owner.$name as &mut dyn ::core::any::Any)
            },
        }
    };
    ($owner:ty, $name:ident : $ty:ty, read_only) => {
        $crate::field!(@bind $owner, $name, $crate::FieldAccess::ReadOnly, <$ty as $crate::FieldType>::value_type)
    };
    ($owner:ty, $name:ident : $ty:ty, hidden) => {
        $crate::field!(@bind $owner, $name, $crate::FieldAccess::Hidden, $crate::ValueType::opaque::<$ty>)
    };
    ($owner:ty, $name:ident : $ty:ty) => {
        $crate::field!(@bind $owner, $name, $crate::FieldAccess::ReadWrite, <$ty as $crate::FieldType>::value_type)
    };
}

/// Converts a borrowed record (or `Option` of it) into an owned supertype value
pub type ConvertFn = fn(&dyn Any) -> Option<Box<dyn Any>>;

/// A declared supertype with the conversions into it
#[derive(Clone, Copy)]
struct Supertype {
    descriptor: fn() -> &'static TypeDescriptor,
    assign:     AssignFn,
    convert:    ConvertFn,
}

/// Conversion steps from a record into one of its transitive supertypes
///
/// Every step but the last builds an intermediate value; the last assigns straight into the
/// destination slot, so a directly declared supertype converts without allocating.
#[derive(Clone, Debug)]
pub struct Upcast {
    leading: Vec<ConvertFn>,
    last:    AssignFn,
}

impl Upcast {
    /// Conversions producing intermediate supertype values, in order
    pub fn leading(&self) -> &[ConvertFn] { &self.leading }

    /// Assignment of the last intermediate (or the source value) into the supertype slot
    pub const fn assign_fn(&self) -> AssignFn { self.last }
}

/// Statically built description of a record type
pub struct TypeDescriptor {
    name:        &'static str,
    type_id:     TypeId,
    value_type:  fn() -> ValueType,
    fields:      Vec<FieldDescriptor>,
    mappings:    Vec<FieldMapping>,
    supertypes:  Vec<Supertype>,
    constructor: Option<fn() -> Box<dyn Any + Send>>,
}

impl TypeDescriptor {
    /// Start describing `T`
    pub fn of<T: FieldType>() -> Self {
        Self {
            name:        type_name::<T>(),
            type_id:     TypeId::of::<T>(),
            value_type:  T::value_type,
            fields:      Vec::new(),
            mappings:    Vec::new(),
            supertypes:  Vec::new(),
            constructor: None,
        }
    }

    /// Declare the next field
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Attach mapping metadata to a destination field
    #[must_use]
    pub fn mapping(mut self, mapping: FieldMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Declare that `Sub`, the type being described, is-a `Super`
    ///
    /// Values are converted with `Into` when a `Sub` field is copied into a `Super` field.
    #[must_use]
    pub fn is_a<Sub, Super>(mut self) -> Self
    where
        Sub: FieldType + Into<Super>,
        Super: Mappable,
    {
        self.supertypes.push(Supertype {
            descriptor: Super::descriptor,
            assign:     assign_upcast::<Sub, Super>,
            convert:    convert_upcast::<Sub, Super>,
        });
        self
    }

    /// Set the function constructing a fresh instance
    #[must_use]
    pub fn constructor(mut self, constructor: fn() -> Box<dyn Any + Send>) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Construct fresh instances with `T::default()`
    #[must_use]
    pub fn default_constructor<T: Default + Any + Send>(self) -> Self {
        self.constructor(construct_default::<T>)
    }

    /// Fully qualified type name
    pub const fn name(&self) -> &'static str { self.name }

    /// Identity of the described type
    pub const fn type_id(&self) -> TypeId { self.type_id }

    /// Value type of the described type itself
    pub fn value_type(&self) -> ValueType { (self.value_type)() }

    /// Declared fields in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] { &self.fields }

    /// Look up a declared field by name
    pub fn field_named(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// All mapping metadata in declaration order
    pub fn mappings(&self) -> &[FieldMapping] { &self.mappings }

    /// Mapping metadata whose destination path is rooted at `field_name`
    pub fn mappings_for<'a>(&'a self, field_name: &'a str) -> impl Iterator<Item = &'a FieldMapping> {
        self.mappings
            .iter()
            .filter(move |mapping| mapping.target_root() == Some(field_name))
    }

    /// Whether `canonical` names this type or one of its transitive supertypes
    pub fn is_subtype_of(&self, canonical: TypeId) -> bool {
        self.type_id == canonical || self.upcast_to(canonical).is_some()
    }

    /// Shortest chain of declared conversions from this type into the supertype `canonical`
    ///
    /// `None` when `canonical` is this type itself or not one of its supertypes.
    pub fn upcast_to(&self, canonical: TypeId) -> Option<Upcast> {
        if canonical == self.type_id {
            return None;
        }
        let mut pending: VecDeque<(&Self, Vec<Supertype>)> = VecDeque::from([(self, Vec::new())]);
        let mut visited = vec![self.type_id];
        while let Some((descriptor, steps)) = pending.pop_front() {
            for supertype in &descriptor.supertypes {
                let next = (supertype.descriptor)();
                let mut path = steps.clone();
                path.push(*supertype);
                if next.type_id == canonical {
                    let (last, leading) = path.split_last()?;
                    return Some(Upcast {
                        leading: leading.iter().map(|step| step.convert).collect(),
                        last:    last.assign,
                    });
                }
                if !visited.contains(&next.type_id) {
                    visited.push(next.type_id);
                    pending.push_back((next, path));
                }
            }
        }
        None
    }

    /// Construct a fresh instance, if a constructor was declared
    pub fn construct(&self) -> Option<Box<dyn Any + Send>> { self.constructor.map(|construct| construct()) }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("mappings", &self.mappings.len())
            .field("constructible", &self.constructor.is_some())
            .finish_non_exhaustive()
    }
}

fn construct_default<T: Default + Any + Send>() -> Box<dyn Any + Send> { Box::new(T::default()) }

/// The `Sub` carried by `value` as `Sub` or `Option<Sub>`; `Some(None)` for an absent option
fn subtype_value<Sub: FieldType>(value: &dyn Any) -> Option<Option<&Sub>> {
    value
        .downcast_ref::<Sub>()
        .map(Some)
        .or_else(|| value.downcast_ref::<Option<Sub>>().map(Option::as_ref))
}

/// Assign a `Sub` into a `Super` or `Option<Super>` slot
fn assign_upcast<Sub, Super>(slot: &mut dyn Any, value: &dyn Any) -> bool
where
    Sub: FieldType + Into<Super>,
    Super: FieldType,
{
    let Some(source) = subtype_value::<Sub>(value) else {
        return false;
    };
    if let Some(slot) = slot.downcast_mut::<Option<Super>>() {
        *slot = source.map(|source| source.clone().into());
        return true;
    }
    match (slot.downcast_mut::<Super>(), source) {
        (Some(slot), Some(source)) => {
            *slot = source.clone().into();
            true
        }
        _ => false,
    }
}

/// Convert a `Sub` into an owned `Super`, or an `Option<Sub>` into an `Option<Super>`
fn convert_upcast<Sub, Super>(value: &dyn Any) -> Option<Box<dyn Any>>
where
    Sub: FieldType + Into<Super>,
    Super: FieldType,
{
    if let Some(source) = value.downcast_ref::<Sub>() {
        let converted: Super = source.clone().into();
        return Some(Box::new(converted));
    }
    value.downcast_ref::<Option<Sub>>().map(|source| {
        let converted: Option<Super> = source.clone().map(Into::into);
        Box::new(converted) as Box<dyn Any>
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "test assertions")]
mod tests {
    use super::*;
    use crate::type_info::AnyValue;

    #[derive(Clone, Default)]
    struct Animal {
        name: String,
    }

    #[derive(Clone, Default)]
    struct Dog {
        name:    String,
        good:    bool,
        scratch: Vec<u8>,
        legs:    Option<u8>,
        tag:     AnyValue,
    }

    #[derive(Clone, Default)]
    struct Puppy {
        name: String,
    }

    impl From<Dog> for Animal {
        fn from(dog: Dog) -> Self { Self { name: dog.name } }
    }

    impl From<Puppy> for Dog {
        fn from(puppy: Puppy) -> Self {
            Self {
                name: puppy.name,
                ..Self::default()
            }
        }
    }

    impl FieldType for Puppy {
        fn value_type() -> ValueType { ValueType::record::<Self>() }
    }

    impl Mappable for Puppy {
        fn descriptor() -> &'static TypeDescriptor {
            static DESCRIPTOR: std::sync::LazyLock<TypeDescriptor> = std::sync::LazyLock::new(|| {
                TypeDescriptor::of::<Puppy>()
                    .field(crate::field!(Puppy, name: String))
                    .is_a::<Puppy, Dog>()
            });
            &DESCRIPTOR
        }
    }

    impl FieldType for Animal {
        fn value_type() -> ValueType { ValueType::record::<Self>() }
    }

    impl Mappable for Animal {
        fn descriptor() -> &'static TypeDescriptor {
            static DESCRIPTOR: std::sync::LazyLock<TypeDescriptor> = std::sync::LazyLock::new(|| {
                TypeDescriptor::of::<Animal>().field(crate::field!(Animal, name: String))
            });
            &DESCRIPTOR
        }
    }

    impl FieldType for Dog {
        fn value_type() -> ValueType { ValueType::record::<Self>() }
    }

    impl Mappable for Dog {
        fn descriptor() -> &'static TypeDescriptor {
            static DESCRIPTOR: std::sync::LazyLock<TypeDescriptor> = std::sync::LazyLock::new(|| {
                TypeDescriptor::of::<Dog>()
                    .field(crate::field!(Dog, name: String))
                    .field(crate::field!(Dog, good: bool, read_only))
                    .field(crate::field!(Dog, scratch: Vec<u8>, hidden))
                    .field(crate::field!(Dog, legs: Option<u8>))
                    .field(crate::field!(Dog, tag: AnyValue))
                    .is_a::<Dog, Animal>()
                    .default_constructor::<Dog>()
            });
            &DESCRIPTOR
        }
    }

    #[test]
    fn test_fields_keep_declaration_order_and_access() {
        let descriptor = Dog::descriptor();
        let names: Vec<_> = descriptor.fields().iter().map(|field| field.name).collect();
        assert_eq!(names, ["name", "good", "scratch", "legs", "tag"]);

        assert_eq!(
            descriptor.field_named("good").map(|field| field.access),
            Some(FieldAccess::ReadOnly)
        );
        assert_eq!(
            descriptor.field_named("scratch").map(|field| field.access),
            Some(FieldAccess::Hidden)
        );
        assert!(descriptor.field_named("owner").is_none());
    }

    #[test]
    fn test_bound_accessors_read_and_write_fields() {
        let descriptor = Dog::descriptor();
        let mut dog = Dog {
            name: "Rex".to_string(),
            ..Dog::default()
        };

        let name = descriptor.field_named("name").expect("name is declared");
        assert_eq!(
            (name.get)(&dog)
                .and_then(|value| value.downcast_ref::<String>())
                .map(String::as_str),
            Some("Rex")
        );

        if let Some(slot) = (name.get_mut)(&mut dog) {
            assert!((name.value_type().assign_fn())(slot, &"Fido".to_string()));
        }
        assert_eq!(dog.name, "Fido");

        // Accessors refuse instances of other types
        assert!((name.get)(&Animal::default()).is_none());
    }

    #[test]
    fn test_supertypes_are_transitive_and_directional() {
        let dog = Dog::value_type();
        let animal = Animal::value_type();
        assert!(dog.is_a(&animal));
        assert!(!animal.is_a(&dog));
        assert!(Dog::descriptor().is_subtype_of(TypeId::of::<Dog>()));
    }

    #[test]
    fn test_direct_upcast_assigns_without_intermediate_values() {
        let upcast = Dog::descriptor()
            .upcast_to(TypeId::of::<Animal>())
            .expect("Dog declares Animal");
        assert!(upcast.leading().is_empty());

        let dog = Dog {
            name: "Rex".to_string(),
            ..Dog::default()
        };
        let mut animal = Animal::default();
        assert!((upcast.assign_fn())(&mut animal, &dog));
        assert_eq!(animal.name, "Rex");

        let mut maybe: Option<Animal> = None;
        assert!((upcast.assign_fn())(&mut maybe, &Some(dog)));
        assert_eq!(maybe.map(|animal| animal.name), Some("Rex".to_string()));

        // The conversion only accepts the declaring type
        assert!(!(upcast.assign_fn())(&mut animal, &Puppy::default()));
    }

    #[test]
    fn test_transitive_upcast_converts_through_each_supertype() {
        assert!(Puppy::value_type().is_a(&Animal::value_type()));
        let upcast = Puppy::descriptor()
            .upcast_to(TypeId::of::<Animal>())
            .expect("Puppy reaches Animal through Dog");
        assert_eq!(upcast.leading().len(), 1);

        let puppy = Puppy {
            name: "Bit".to_string(),
        };
        let dog = (upcast.leading()[0])(&puppy).expect("a Puppy converts to a Dog");
        let mut animal = Animal::default();
        assert!((upcast.assign_fn())(&mut animal, &*dog));
        assert_eq!(animal.name, "Bit");

        assert!(Animal::descriptor().upcast_to(TypeId::of::<Dog>()).is_none());
        assert!(Dog::descriptor().upcast_to(TypeId::of::<Dog>()).is_none());
    }

    #[test]
    fn test_constructor_builds_default_instance() {
        let built = Dog::descriptor().construct();
        assert!(built.is_some_and(|value| value.downcast_ref::<Dog>().is_some()));
        assert!(Animal::descriptor().construct().is_none());
    }
}
