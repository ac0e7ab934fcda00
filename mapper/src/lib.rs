//! # reflectmap
//!
//! Compiled field-to-field copy plans between record types.
//!
//! For each (source type, destination type) pair a [`Mapper`] resolves which source fields feed
//! which destination fields, validates their types once, and composes the per-field copies into
//! a single operation. The operation is cached for the life of the mapper, so later calls only
//! read and write fields.
//!
//! # Usage
//!
//! ```ignore
//! use reflectmap::{Mappable, Mapper};
//!
//! #[derive(Clone, Default, Mappable)]
//! struct Order {
//!     id:       u64,
//!     customer: String,
//! }
//!
//! #[derive(Clone, Default, Mappable)]
//! #[mapping(default)]
//! struct OrderSummary {
//!     id:    u64,
//!     #[mapping(from = Order, path = "customer")]
//!     buyer: String,
//! }
//!
//! let mapper = Mapper::new();
//! let summary: OrderSummary = mapper.map_new(&Order { id: 7, customer: "Ada".into() })?;
//! ```
//!
//! # Copy modes
//!
//! - `ALL` (default): fields with `#[mapping(...)]` metadata use it; every other field is copied
//!   from the source field of the same name, if there is one
//! - `ANNOTATION_DRIVEN`: only fields with metadata are copied
//! - `DIRECT_COPY`: only same-name fields are copied
//!
//! Select a mode with [`MapperConfig`], or from the `REFLECTMAP_COPY_MODE` environment variable
//! through [`MapperConfig::from_env`].
//!
//! # Field metadata
//!
//! A destination field may list several candidate sources. The first candidate whose type is
//! compatible with the actual source type wins; when none is, the field is left untouched.
//! `container = "inner"` reads the path on the value of the source's `inner` field.

extern crate self as reflectmap;

pub mod accessor;
mod compatibility;
mod config;
mod constants;
mod error;
pub mod instruction;
mod mapper;
pub mod plan;
mod type_info;

pub use compatibility::compatible;
pub use config::{CopyMode, MapperConfig};
pub use constants::{ENV_COPY_MODE, PATH_DELIMITER};
pub use error::{Error, Result};
pub use instruction::{Candidate, FieldMapping, InstructionResolver, MappingInstruction};
pub use mapper::Mapper;
pub use plan::CompiledPlan;
pub use reflectmap_macros::Mappable;
pub use type_info::{
    AnyValue, FieldAccess, FieldDescriptor, FieldType, Mappable, TypeDescriptor, Upcast,
    ValueKind, ValueType,
};
