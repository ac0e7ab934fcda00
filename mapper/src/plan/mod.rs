//! Copy plans
//!
//! The compiler turns resolved instructions into one composed operation per type pair and the
//! cache memoizes that operation, or the failure to build it, for the life of a mapper.

mod cache;
mod compiler;

use std::any::Any;
use std::fmt;

pub use cache::PlanCache;
pub use compiler::{CopyFn, compile};

use crate::error::Result;

/// The composed copy operation for one (source type, destination type) pair
///
/// Immutable once built; the cache hands out shared references to it.
pub struct CompiledPlan {
    source:            &'static str,
    destination:       &'static str,
    copy:              CopyFn,
    instruction_count: usize,
    depth:             usize,
}

impl CompiledPlan {
    pub(crate) const fn new(
        source: &'static str,
        destination: &'static str,
        copy: CopyFn,
        instruction_count: usize,
        depth: usize,
    ) -> Self {
        Self {
            source,
            destination,
            copy,
            instruction_count,
            depth,
        }
    }

    /// Copy every mapped field of `source` into `destination`
    ///
    /// All instructions run even when one fails; the first failure is returned.
    pub fn execute(&self, source: &dyn Any, destination: &mut dyn Any) -> Result<()> {
        (self.copy)(source, destination)
    }

    /// Whether this plan copies nothing and shares the process-wide no-op operation
    pub fn is_noop(&self) -> bool { compiler::is_noop(&self.copy) }

    /// Source type name
    pub const fn source(&self) -> &'static str { self.source }

    /// Destination type name
    pub const fn destination(&self) -> &'static str { self.destination }

    /// Number of field copies the plan performs
    pub const fn instruction_count(&self) -> usize { self.instruction_count }

    /// Nesting depth of the composed operation
    pub const fn depth(&self) -> usize { self.depth }

    /// The composed operation itself
    pub const fn operation(&self) -> &CopyFn { &self.copy }
}

impl fmt::Debug for CompiledPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPlan")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("instruction_count", &self.instruction_count)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}
