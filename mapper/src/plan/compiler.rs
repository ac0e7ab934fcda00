use std::any::Any;
use std::sync::{Arc, LazyLock};

use error_stack::Report;

use super::CompiledPlan;
use crate::accessor::{FieldPath, WriteOutcome};
use crate::error::{Error, Result};
use crate::instruction::MappingInstruction;
use crate::type_info::{ConvertFn, TypeDescriptor};

/// A composed copy operation from a source instance into a destination instance
pub type CopyFn = Arc<dyn Fn(&dyn Any, &mut dyn Any) -> Result<()> + Send + Sync>;

static NOOP: LazyLock<CopyFn> = LazyLock::new(|| copy_fn(|_, _| Ok(())));

/// The process-wide operation every empty plan shares
pub(crate) fn noop() -> CopyFn { Arc::clone(&NOOP) }

pub(crate) fn is_noop(copy: &CopyFn) -> bool { Arc::ptr_eq(copy, &NOOP) }

/// Compose all instructions for one pair into a single plan
pub fn compile(
    source: &'static TypeDescriptor,
    destination: &'static TypeDescriptor,
    instructions: &[MappingInstruction],
) -> CompiledPlan {
    let operations: Vec<CopyFn> = instructions.iter().map(elementary).collect();
    let (copy, depth) = compose(&operations);
    CompiledPlan::new(
        source.name(),
        destination.name(),
        copy,
        instructions.len(),
        depth,
    )
}

/// Balanced composition: split at the midpoint, compose each half, run left then right
///
/// Returns the composed operation and its nesting depth, which grows with log2 of the count.
fn compose(operations: &[CopyFn]) -> (CopyFn, usize) {
    match operations {
        [] => (noop(), 0),
        [single] => (Arc::clone(single), 0),
        _ => {
            let (left, right) = operations.split_at(operations.len() / 2);
            let (left, left_depth) = compose(left);
            let (right, right_depth) = compose(right);
            let copy = copy_fn(move |source, destination| {
                let first = left(source, &mut *destination);
                let second = right(source, destination);
                first.and(second)
            });
            (copy, 1 + left_depth.max(right_depth))
        }
    }
}

/// Read through the source chain, write through the destination chain
fn elementary(instruction: &MappingInstruction) -> CopyFn {
    let (source, destination) = (instruction.source(), instruction.destination());
    let read = source.compile();

    let erase = (destination.terminal().is_wildcard() && !source.terminal().is_wildcard())
        .then(|| source.terminal().erase_fn());
    let upcast = if destination.terminal().is_wildcard() {
        None
    } else {
        source.terminal().upcast_to(destination.terminal())
    };
    let (write, convert) = match upcast {
        Some(upcast) => (
            destination.compile_with(upcast.assign_fn()),
            upcast.leading().to_vec(),
        ),
        None => (destination.compile(), Vec::new()),
    };
    let failure = Failure {
        source_type:      source.root(),
        source_path:      source.path().clone(),
        value_type:       source.terminal().name(),
        destination_type: destination.root(),
        destination_path: destination.path().clone(),
    };

    copy_fn(move |owner, target| {
        let Some(value) = read(owner) else {
            return Err(failure.missing_source_container());
        };
        let outcome = match erase {
            Some(erase) => match erase(value) {
                Some(erased) => write(target, &erased),
                None => WriteOutcome::Unassignable,
            },
            None if convert.is_empty() => write(target, value),
            None => match convert_through(value, &convert) {
                Some(converted) => write(target, &*converted),
                None => WriteOutcome::Unassignable,
            },
        };
        match outcome {
            WriteOutcome::Written => Ok(()),
            WriteOutcome::MissingContainer => Err(failure.missing_destination_container()),
            WriteOutcome::Unassignable => Err(failure.unassignable()),
        }
    })
}

/// Build the intermediate supertype value a multi-step upcast assigns from
fn convert_through(value: &dyn Any, steps: &[ConvertFn]) -> Option<Box<dyn Any>> {
    let (first, rest) = steps.split_first()?;
    rest.iter()
        .try_fold(first(value)?, |current, step| step(&*current))
}

/// Names needed to report runtime failures of one instruction
struct Failure {
    source_type:      &'static str,
    source_path:      FieldPath,
    value_type:       &'static str,
    destination_type: &'static str,
    destination_path: FieldPath,
}

impl Failure {
    fn missing_source_container(&self) -> Report<Error> {
        Report::new(Error::MissingContainer {
            type_name: self.source_type.to_string(),
            path:      self.source_path.to_string(),
        })
        .attach("An optional container on the source path holds no value")
    }

    fn missing_destination_container(&self) -> Report<Error> {
        Report::new(Error::MissingContainer {
            type_name: self.destination_type.to_string(),
            path:      self.destination_path.to_string(),
        })
        .attach("Intermediate destination containers are not created")
    }

    fn unassignable(&self) -> Report<Error> {
        Report::new(Error::UnassignableValue {
            value_type: self.value_type.to_string(),
            dest_type:  self.destination_type.to_string(),
            dest_path:  self.destination_path.to_string(),
        })
        .attach(format!(
            "Read from {}.{}",
            self.source_type, self.source_path
        ))
    }
}

fn copy_fn<F>(copy: F) -> CopyFn
where
    F: Fn(&dyn Any, &mut dyn Any) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(copy)
}
