//! Two-level plan cache
//!
//! The first level maps a source type to the plans compiled from it; the second maps a
//! destination type to a once-initialized slot. Slots are cloned out of the maps before they
//! are initialized, so compiling one pair never holds a map shard locked and never blocks
//! compiles of other pairs. Callers racing on the same pair wait on the slot and all observe
//! the single stored value.

use std::any::{Any, TypeId};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use error_stack::Report;
use tracing::{debug, warn};

use super::{CompiledPlan, compile};
use crate::error::{Error, Result};
use crate::instruction::InstructionResolver;
use crate::type_info::TypeDescriptor;

/// A published plan or the terminal failure of its only compile
type PlanSlot = Arc<OnceLock<std::result::Result<Arc<CompiledPlan>, Error>>>;

/// Plans compiled from one source type, keyed by destination type
#[derive(Default)]
struct DestinationPlans {
    plans: DashMap<TypeId, PlanSlot>,
}

impl DestinationPlans {
    fn slot(&self, destination: TypeId) -> PlanSlot {
        if let Some(slot) = self.plans.get(&destination) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.plans.entry(destination).or_default().value())
    }
}

/// Memoizes one compiled plan, or one terminal error, per (source type, destination type) pair
pub struct PlanCache {
    resolver: Arc<dyn InstructionResolver>,
    sources:  DashMap<TypeId, Arc<DestinationPlans>>,
}

impl PlanCache {
    /// Empty cache compiling plans with `resolver`
    pub fn new(resolver: Arc<dyn InstructionResolver>) -> Self {
        Self {
            resolver,
            sources: DashMap::new(),
        }
    }

    /// Name of the resolver plans are compiled with
    pub fn resolver_name(&self) -> &'static str { self.resolver.name() }

    /// The plan for a pair, compiling it on first request
    ///
    /// A failed compile is stored and re-reported on every later request for the pair. The
    /// caller whose request ran the compile receives the full report with its attachments.
    pub fn get(
        &self,
        source: &'static TypeDescriptor,
        destination: &'static TypeDescriptor,
    ) -> Result<Arc<CompiledPlan>> {
        let slot = self.destinations(source.type_id()).slot(destination.type_id());
        let mut compile_report = None;
        let stored = slot.get_or_init(|| {
            self.compile(source, destination).map_err(|report| {
                let error = report.current_context().clone();
                compile_report = Some(report);
                error
            })
        });
        match (stored, compile_report) {
            (Ok(plan), _) => Ok(Arc::clone(plan)),
            (Err(_), Some(report)) => Err(report),
            (Err(error), None) => Err(Report::new(error.clone()).attach(format!(
                "Cached failure for {} -> {}",
                source.name(),
                destination.name()
            ))),
        }
    }

    /// Number of pairs with a stored plan or failure
    pub fn len(&self) -> usize {
        self.sources
            .iter()
            .map(|entry| {
                entry
                    .value()
                    .plans
                    .iter()
                    .filter(|slot| slot.value().get().is_some())
                    .count()
            })
            .sum()
    }

    /// Whether no pair has been compiled yet
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    fn destinations(&self, source: TypeId) -> Arc<DestinationPlans> {
        if let Some(plans) = self.sources.get(&source) {
            return Arc::clone(plans.value());
        }
        Arc::clone(self.sources.entry(source).or_default().value())
    }

    fn compile(
        &self,
        source: &'static TypeDescriptor,
        destination: &'static TypeDescriptor,
    ) -> Result<Arc<CompiledPlan>> {
        let resolved = panic::catch_unwind(AssertUnwindSafe(|| {
            self.resolver.resolve(source, destination)
        }));

        let compiled = match resolved {
            Ok(Ok(instructions)) => Ok(Arc::new(compile(source, destination, &instructions))),
            Ok(Err(report)) => Err(cacheable(report, source, destination)),
            Err(payload) => Err(Report::new(Error::compilation_failed(
                source.name(),
                destination.name(),
                panic_message(&*payload),
            ))),
        };

        match &compiled {
            Ok(plan) => debug!(
                source = source.name(),
                destination = destination.name(),
                resolver = self.resolver.name(),
                instructions = plan.instruction_count(),
                depth = plan.depth(),
                noop = plan.is_noop(),
                "Compiled copy plan"
            ),
            Err(report) => warn!(
                source = source.name(),
                destination = destination.name(),
                resolver = self.resolver.name(),
                error = %report.current_context(),
                "Copy plan compile failed, caching the failure"
            ),
        }
        compiled
    }
}

/// Resolution errors are kept as raised; anything else is wrapped as a compile failure
fn cacheable(
    report: Report<Error>,
    source: &'static TypeDescriptor,
    destination: &'static TypeDescriptor,
) -> Report<Error> {
    if report.current_context().is_resolution_error() {
        return report;
    }
    let wrapped =
        Error::compilation_failed(source.name(), destination.name(), report.current_context());
    report.change_context(wrapped)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "resolver panicked".to_string())
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, reason = "test assertions")]
mod tests {
    use std::sync::LazyLock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::instruction::{DirectByName, MappingInstruction};
    use crate::type_info::{FieldType, Mappable, ValueType};

    #[derive(Clone, Default)]
    struct Celsius {
        degrees: f64,
    }

    #[derive(Clone, Default)]
    struct Reading {
        degrees: f64,
        station: String,
    }

    impl FieldType for Celsius {
        fn value_type() -> ValueType { ValueType::record::<Self>() }
    }

    impl Mappable for Celsius {
        fn descriptor() -> &'static TypeDescriptor {
            static DESCRIPTOR: LazyLock<TypeDescriptor> = LazyLock::new(|| {
                TypeDescriptor::of::<Celsius>().field(crate::field!(Celsius, degrees: f64))
            });
            &DESCRIPTOR
        }
    }

    impl FieldType for Reading {
        fn value_type() -> ValueType { ValueType::record::<Self>() }
    }

    impl Mappable for Reading {
        fn descriptor() -> &'static TypeDescriptor {
            static DESCRIPTOR: LazyLock<TypeDescriptor> = LazyLock::new(|| {
                TypeDescriptor::of::<Reading>()
                    .field(crate::field!(Reading, degrees: f64))
                    .field(crate::field!(Reading, station: String))
            });
            &DESCRIPTOR
        }
    }

    /// Delegates to same-name resolution, counting calls
    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl InstructionResolver for Counting {
        fn name(&self) -> &'static str { "counting" }

        fn resolve(
            &self,
            source: &'static TypeDescriptor,
            destination: &'static TypeDescriptor,
        ) -> Result<Vec<MappingInstruction>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            DirectByName.resolve(source, destination)
        }
    }

    struct Panicking;

    impl InstructionResolver for Panicking {
        fn name(&self) -> &'static str { "panicking" }

        fn resolve(
            &self,
            _: &'static TypeDescriptor,
            _: &'static TypeDescriptor,
        ) -> Result<Vec<MappingInstruction>> {
            panic!("descriptor registry unavailable")
        }
    }

    struct Misconfigured;

    impl InstructionResolver for Misconfigured {
        fn name(&self) -> &'static str { "misconfigured" }

        fn resolve(
            &self,
            _: &'static TypeDescriptor,
            _: &'static TypeDescriptor,
        ) -> Result<Vec<MappingInstruction>> {
            Err(
                Report::new(Error::invalid_configuration("resolver", "no rules loaded"))
                    .attach("Rules file: mapping.rules"),
            )
        }
    }

    struct Unresolvable;

    impl InstructionResolver for Unresolvable {
        fn name(&self) -> &'static str { "unresolvable" }

        fn resolve(
            &self,
            source: &'static TypeDescriptor,
            _: &'static TypeDescriptor,
        ) -> Result<Vec<MappingInstruction>> {
            Err(Report::new(Error::field_not_found(source.name(), "station.id"))
                .attach("Requested path: station.id"))
        }
    }

    #[test]
    fn test_plan_is_compiled_once_per_pair() {
        let counting = Arc::new(Counting::default());
        let cache = PlanCache::new(Arc::clone(&counting) as Arc<dyn InstructionResolver>);
        assert!(cache.is_empty());

        let first = cache
            .get(Reading::descriptor(), Celsius::descriptor())
            .expect("compiles");
        let second = cache
            .get(Reading::descriptor(), Celsius::descriptor())
            .expect("compiles");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.instruction_count(), 1);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);

        // Reverse direction is its own pair
        let reverse = cache
            .get(Celsius::descriptor(), Reading::descriptor())
            .expect("compiles");
        assert_eq!(reverse.instruction_count(), 1);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_panic_is_cached_as_compilation_failure() {
        let cache = PlanCache::new(Arc::new(Panicking));
        for _ in 0..2 {
            let Err(report) = cache.get(Reading::descriptor(), Celsius::descriptor()) else {
                panic!("a panicking resolver cannot produce a plan");
            };
            let Error::CompilationFailed { cause, .. } = report.current_context() else {
                panic!("expected CompilationFailed, got {report:?}");
            };
            assert_eq!(cause, "descriptor registry unavailable");
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_compiling_caller_keeps_resolver_attachments() {
        let cache = PlanCache::new(Arc::new(Unresolvable));

        let Err(first) = cache.get(Reading::descriptor(), Celsius::descriptor()) else {
            panic!("an unresolvable pair cannot produce a plan");
        };
        let first = format!("{first:?}");
        assert!(first.contains("Requested path: station.id"));
        assert!(!first.contains("Cached failure"));

        let Err(second) = cache.get(Reading::descriptor(), Celsius::descriptor()) else {
            panic!("the failure is cached");
        };
        assert!(matches!(
            second.current_context(),
            Error::FieldNotFound { path, .. } if path == "station.id"
        ));
        assert!(format!("{second:?}").contains("Cached failure"));
    }

    #[test]
    fn test_non_resolution_errors_are_wrapped_with_attachments() {
        let cache = PlanCache::new(Arc::new(Misconfigured));
        let Err(report) = cache.get(Reading::descriptor(), Celsius::descriptor()) else {
            panic!("a misconfigured resolver cannot produce a plan");
        };
        assert!(matches!(
            report.current_context(),
            Error::CompilationFailed { .. }
        ));
        assert!(format!("{report:?}").contains("Rules file: mapping.rules"));
    }
}
