//! Mapping facade
//!
//! A `Mapper` owns one plan cache. Build it once at startup and share it by reference or
//! `Arc`; every plan it compiles lives as long as the mapper does.

use std::any::Any;
use std::sync::Arc;

use error_stack::Report;

use crate::config::MapperConfig;
use crate::constants::TYPE_UNKNOWN;
use crate::error::{Error, Result};
use crate::instruction::InstructionResolver;
use crate::plan::{CompiledPlan, PlanCache};
use crate::type_info::{Mappable, TypeDescriptor};

/// Copies fields between record types using cached, compiled plans
pub struct Mapper {
    cache: PlanCache,
}

impl Mapper {
    /// Mapper using the default configuration
    pub fn new() -> Self { Self::with_config(MapperConfig::default()) }

    /// Mapper whose plans follow `config`
    pub fn with_config(config: MapperConfig) -> Self { Self::with_resolver(config.copy_mode.resolver()) }

    /// Mapper compiling plans with a caller-supplied resolver
    pub fn with_resolver(resolver: Arc<dyn InstructionResolver>) -> Self {
        Self {
            cache: PlanCache::new(resolver),
        }
    }

    /// Copy the mapped fields of `source` into `destination`
    pub fn map<S: Mappable, D: Mappable>(&self, source: &S, destination: &mut D) -> Result<()> {
        self.plan(S::descriptor(), D::descriptor())?
            .execute(source, destination)
    }

    /// Construct a `D` and copy the mapped fields of `source` into it
    pub fn map_new<S: Mappable, D: Mappable>(&self, source: &S) -> Result<D> {
        let destination = self.map_new_dyn(source, S::descriptor(), D::descriptor())?;
        destination
            .downcast::<D>()
            .map(|destination| *destination)
            .map_err(|_| {
                Report::new(Error::construction_failed(
                    D::descriptor().name(),
                    "constructor produced an instance of another type",
                ))
            })
    }

    /// Copy between type-erased instances described by `source_type` and `destination_type`
    ///
    /// Fails with `TypeMismatch` when an instance is not of its described type.
    pub fn map_dyn(
        &self,
        source: &dyn Any,
        source_type: &'static TypeDescriptor,
        destination: &mut dyn Any,
        destination_type: &'static TypeDescriptor,
    ) -> Result<()> {
        check_instance(source, source_type)?;
        check_instance(&*destination, destination_type)?;
        self.plan(source_type, destination_type)?
            .execute(source, destination)
    }

    /// Construct a fresh instance of `destination_type` and copy `source` into it
    pub fn map_new_dyn(
        &self,
        source: &dyn Any,
        source_type: &'static TypeDescriptor,
        destination_type: &'static TypeDescriptor,
    ) -> Result<Box<dyn Any + Send>> {
        let mut destination = destination_type.construct().ok_or_else(|| {
            Report::new(Error::construction_failed(
                destination_type.name(),
                "no default constructor declared",
            ))
            .attach("Declare one with #[mapping(default)] or #[mapping(constructor = path)]")
        })?;
        self.map_dyn(source, source_type, destination.as_mut(), destination_type)?;
        Ok(destination)
    }

    /// The cached plan for a pair, compiling it on first request
    pub fn plan(
        &self,
        source: &'static TypeDescriptor,
        destination: &'static TypeDescriptor,
    ) -> Result<Arc<CompiledPlan>> {
        self.cache.get(source, destination)
    }

    /// Name of the resolver in use
    pub fn resolver_name(&self) -> &'static str { self.cache.resolver_name() }

    /// Number of pairs compiled so far, failures included
    pub fn cached_plans(&self) -> usize { self.cache.len() }
}

impl Default for Mapper {
    fn default() -> Self { Self::new() }
}

fn check_instance(instance: &dyn Any, descriptor: &'static TypeDescriptor) -> Result<()> {
    if instance.type_id() == descriptor.type_id() {
        return Ok(());
    }
    Err(Report::new(Error::TypeMismatch {
        expected: descriptor.name().to_string(),
        found:    TYPE_UNKNOWN.to_string(),
    }))
}

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::expect_used,
    clippy::float_cmp,
    reason = "test assertions"
)]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crate::config::CopyMode;
    use crate::instruction::{Candidate, FieldMapping};
    use crate::type_info::{FieldType, ValueType};

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Invoice {
        number: u32,
        total:  f64,
        note:   Option<String>,
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Summary {
        number: u32,
        amount: f64,
        note:   String,
    }

    impl Default for Summary {
        fn default() -> Self {
            Self {
                number: 0,
                amount: 0.0,
                note:   "none".to_string(),
            }
        }
    }

    impl FieldType for Invoice {
        fn value_type() -> ValueType { ValueType::record::<Self>() }
    }

    impl Mappable for Invoice {
        fn descriptor() -> &'static TypeDescriptor {
            static DESCRIPTOR: LazyLock<TypeDescriptor> = LazyLock::new(|| {
                TypeDescriptor::of::<Invoice>()
                    .field(crate::field!(Invoice, number: u32))
                    .field(crate::field!(Invoice, total: f64))
                    .field(crate::field!(Invoice, note: Option<String>))
            });
            &DESCRIPTOR
        }
    }

    impl FieldType for Summary {
        fn value_type() -> ValueType { ValueType::record::<Self>() }
    }

    impl Mappable for Summary {
        fn descriptor() -> &'static TypeDescriptor {
            static DESCRIPTOR: LazyLock<TypeDescriptor> = LazyLock::new(|| {
                TypeDescriptor::of::<Summary>()
                    .field(crate::field!(Summary, number: u32))
                    .field(crate::field!(Summary, amount: f64))
                    .field(crate::field!(Summary, note: String))
                    .mapping(
                        FieldMapping::new("amount").candidate(Candidate::new::<Invoice>("total")),
                    )
                    .default_constructor::<Summary>()
            });
            &DESCRIPTOR
        }
    }

    fn invoice() -> Invoice {
        Invoice {
            number: 42,
            total:  99.5,
            note:   Some("paid".to_string()),
        }
    }

    #[test]
    fn test_map_combines_annotated_and_same_name_fields() {
        let mapper = Mapper::new();
        let mut summary = Summary::default();
        mapper.map(&invoice(), &mut summary).expect("maps");
        assert_eq!(
            summary,
            Summary {
                number: 42,
                amount: 99.5,
                note:   "paid".to_string(),
            }
        );
        assert_eq!(mapper.resolver_name(), "combined");
    }

    #[test]
    fn test_map_new_constructs_destination() {
        let mapper = Mapper::with_config(MapperConfig::with_copy_mode(CopyMode::AnnotationDriven));
        let summary: Summary = mapper.map_new(&invoice()).expect("maps");
        assert_eq!(summary.amount, 99.5);
        assert_eq!(summary.number, 0);
    }

    #[test]
    fn test_map_new_without_constructor_fails() {
        let result = Mapper::new().map_new::<Summary, Invoice>(&Summary::default());
        assert!(result.is_err_and(|report| matches!(
            report.current_context(),
            Error::ConstructionFailed { .. }
        )));
    }

    #[test]
    fn test_absent_optional_into_plain_slot_is_unassignable() {
        let mapper = Mapper::new();
        let mut summary = Summary::default();
        let source = Invoice {
            note: None,
            ..invoice()
        };

        let Err(report) = mapper.map(&source, &mut summary) else {
            panic!("None cannot be copied into a String");
        };
        assert!(matches!(
            report.current_context(),
            Error::UnassignableValue { .. }
        ));
        // Remaining instructions still ran
        assert_eq!(summary.number, 42);
        assert_eq!(summary.amount, 99.5);
        assert_eq!(summary.note, "none");
    }

    #[test]
    fn test_map_dyn_rejects_mismatched_instance() {
        let mapper = Mapper::new();
        let mut summary = Summary::default();
        let result = mapper.map_dyn(
            &Summary::default(),
            Invoice::descriptor(),
            &mut summary,
            Summary::descriptor(),
        );
        let Err(report) = result else {
            panic!("a Summary is not an Invoice");
        };
        assert_eq!(
            report.current_context(),
            &Error::TypeMismatch {
                expected: Invoice::descriptor().name().to_string(),
                found:    TYPE_UNKNOWN.to_string(),
            }
        );
        assert_eq!(mapper.cached_plans(), 0);
    }
}
