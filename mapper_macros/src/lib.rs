//! Procedural macros for reflectmap

mod attributes;
mod mappable;

use proc_macro::TokenStream;

/// Derives `FieldType` and `Mappable`, building a static `TypeDescriptor` for the struct.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone, Default, Mappable)]
/// #[mapping(default)]
/// struct Shipment {
///     #[mapping(from = Order, path = "id")]
///     #[mapping(from = Return, path = "order_id")]
///     order_id: u64,
///
///     #[mapping(from = Order, path = "city", container = "address")]
///     city: String,
///
///     #[mapping(read_only)]
///     created_by: String,
///
///     #[mapping(skip)]
///     parcels: Vec<Parcel>,
/// }
/// ```
///
/// Struct attributes:
/// - `default`: fresh instances come from `Default::default()`
/// - `constructor = path`: fresh instances come from calling `path()`
/// - `is_a = Type`: declares a supertype (repeatable); the struct must implement `Into<Type>`,
///   which converts values copied into `Type` fields
///
/// Field attributes:
/// - `from = Type`: one candidate source type per attribute, in priority order
/// - `path = "field"`: field read on the source, defaulting to this field's name
/// - `container = "field"`: read `path` on the value of this source field
/// - `read_only`: readable, but never written or navigated mutably
/// - `skip`: declared but not bindable; use it for fields whose type is not a field type
///
/// The struct must be `Clone`, non-generic, and have named fields.
#[proc_macro_derive(Mappable, attributes(mapping))]
pub fn derive_mappable(input: TokenStream) -> TokenStream { mappable::derive_mappable_impl(input) }
