//! Mapping instructions and the strategies that resolve them
//!
//! An instruction pairs a source read chain with a destination write chain whose terminal
//! types were checked for compatibility when the instruction was built. Strategies decide which
//! correspondences between a source and a destination type become instructions.

mod metadata;
mod strategies;

use std::fmt;

use error_stack::Report;
pub use metadata::{Candidate, FieldMapping};
pub use strategies::{AnnotationDriven, Combined, DirectByName};

use crate::accessor::{ReadChain, WriteChain};
use crate::compatibility::compatible;
use crate::error::{Error, Result};
use crate::type_info::TypeDescriptor;

/// Produces the validated instructions copying `source` into `destination`
///
/// Implementations must be deterministic: the plan cache calls `resolve` at most once per pair
/// and reuses the outcome, including failures, for the life of the mapper.
pub trait InstructionResolver: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Instructions in destination field declaration order
    fn resolve(
        &self,
        source: &'static TypeDescriptor,
        destination: &'static TypeDescriptor,
    ) -> Result<Vec<MappingInstruction>>;
}

/// One validated source-to-destination field correspondence
#[derive(Clone)]
pub struct MappingInstruction {
    source:      ReadChain,
    destination: WriteChain,
}

impl MappingInstruction {
    /// Pair two chains, failing with `IncompatibleFieldTypes` when their terminal types do not
    /// match
    pub fn new(source: ReadChain, destination: WriteChain) -> Result<Self> {
        if !compatible(Some(source.terminal()), Some(destination.terminal())) {
            return Err(Report::new(Error::IncompatibleFieldTypes {
                source_type: source.root().to_string(),
                source_path: source.path().to_string(),
                dest_type:   destination.root().to_string(),
                dest_path:   destination.path().to_string(),
            })
            .attach(format!(
                "Source field type: {}, destination field type: {}",
                source.terminal(),
                destination.terminal()
            )));
        }
        Ok(Self {
            source,
            destination,
        })
    }

    /// Chain reading the source value
    pub const fn source(&self) -> &ReadChain { &self.source }

    /// Chain writing the destination field
    pub const fn destination(&self) -> &WriteChain { &self.destination }
}

impl fmt::Debug for MappingInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingInstruction")
            .field("source", &format_args!("{}.{}", self.source.root(), self.source.path()))
            .field(
                "destination",
                &format_args!("{}.{}", self.destination.root(), self.destination.path()),
            )
            .finish()
    }
}
