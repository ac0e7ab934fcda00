//! Resolved accessor chains
//!
//! A chain is built once by the resolver and then compiled into a single closure composed from
//! the bound field functions, so executing it never inspects descriptors again.

use std::any::Any;
use std::sync::Arc;

use super::field_path::FieldPath;
use crate::type_info::{AssignFn, NavigateFn, NavigateMutFn, ValueType};

/// Compiled read: owner instance to terminal field value
pub type ReadFn = Arc<dyn Fn(&dyn Any) -> Option<&dyn Any> + Send + Sync>;
/// Compiled mutable navigation: owner instance to the container holding the leaf field
pub type LocateFn = Arc<dyn Fn(&mut dyn Any) -> Option<&mut dyn Any> + Send + Sync>;
/// Compiled write: assign a value to the leaf field of an owner instance
pub type WriteFn = Arc<dyn Fn(&mut dyn Any, &dyn Any) -> WriteOutcome + Send + Sync>;

/// Result of executing a compiled write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The value was assigned
    Written,
    /// A container on the way to the leaf field was absent
    MissingContainer,
    /// The leaf field cannot hold the supplied value
    Unassignable,
}

/// One field read on the way along a chain
#[derive(Clone, Copy)]
pub(crate) struct ReadStep {
    /// Borrow the field from its owner
    pub get:      fn(&dyn Any) -> Option<&dyn Any>,
    /// Reach the owner of the next step from the field value
    pub navigate: NavigateFn,
}

/// One mutable container step on the way to a written field
#[derive(Clone, Copy)]
pub(crate) struct LocateStep {
    pub get_mut:      fn(&mut dyn Any) -> Option<&mut dyn Any>,
    pub navigate_mut: NavigateMutFn,
}

/// Resolved chain of field reads ending at a terminal value
#[derive(Clone)]
pub struct ReadChain {
    root:     &'static str,
    path:     FieldPath,
    steps:    Vec<ReadStep>,
    terminal: ValueType,
}

impl ReadChain {
    pub(crate) const fn new(
        root: &'static str,
        path: FieldPath,
        steps: Vec<ReadStep>,
        terminal: ValueType,
    ) -> Self {
        Self {
            root,
            path,
            steps,
            terminal,
        }
    }

    /// Name of the type the chain starts from
    pub const fn root(&self) -> &'static str { self.root }

    /// Path the chain was resolved from
    pub const fn path(&self) -> &FieldPath { &self.path }

    /// Statically resolved type of the value the chain produces
    pub const fn terminal(&self) -> &ValueType { &self.terminal }

    /// Walk the chain against an instance
    pub fn read<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        let (last, leading) = self.steps.split_last()?;
        let mut current = owner;
        for step in leading {
            current = (step.navigate)((step.get)(current)?)?;
        }
        (last.get)(current)
    }

    /// Fold the steps into one closure
    pub fn compile(&self) -> ReadFn {
        let mut steps = self.steps.iter();
        let Some(first) = steps.next() else {
            return read_fn(|_| None);
        };
        let get = first.get;
        let mut read = read_fn(move |owner| get(owner));
        let mut navigate = first.navigate;
        for step in steps {
            let (previous, get) = (read, step.get);
            read = read_fn(move |owner| previous(owner).and_then(navigate).and_then(get));
            navigate = step.navigate;
        }
        read
    }
}

/// Resolved navigate-then-write chain ending at a destination field
#[derive(Clone)]
pub struct WriteChain {
    root:       &'static str,
    path:       FieldPath,
    containers: Vec<LocateStep>,
    leaf:       fn(&mut dyn Any) -> Option<&mut dyn Any>,
    terminal:   ValueType,
}

impl WriteChain {
    pub(crate) const fn new(
        root: &'static str,
        path: FieldPath,
        containers: Vec<LocateStep>,
        leaf: fn(&mut dyn Any) -> Option<&mut dyn Any>,
        terminal: ValueType,
    ) -> Self {
        Self {
            root,
            path,
            containers,
            leaf,
            terminal,
        }
    }

    /// Name of the type the chain starts from
    pub const fn root(&self) -> &'static str { self.root }

    /// Path the chain was resolved from
    pub const fn path(&self) -> &FieldPath { &self.path }

    /// Statically resolved type the leaf field accepts
    pub const fn terminal(&self) -> &ValueType { &self.terminal }

    /// Number of containers navigated before the write
    pub fn depth(&self) -> usize { self.containers.len() }

    /// Compose the container navigation, leaf lookup and assignment into one closure
    pub fn compile(&self) -> WriteFn { self.compile_with(self.terminal.assign_fn()) }

    /// [`compile`](Self::compile) with `assign` in place of the leaf type's own assignment
    pub fn compile_with(&self, assign: AssignFn) -> WriteFn {
        let leaf = self.leaf;
        let Some(locate) = self.compile_locate() else {
            return write_fn(move |owner, value| store(leaf(owner), assign, value));
        };
        write_fn(move |owner, value| match locate(owner) {
            Some(container) => store(leaf(container), assign, value),
            None => WriteOutcome::MissingContainer,
        })
    }

    fn compile_locate(&self) -> Option<LocateFn> {
        let mut steps = self.containers.iter();
        let first = *steps.next()?;
        let mut locate = locate_fn(move |owner| (first.get_mut)(owner).and_then(first.navigate_mut));
        for step in steps.copied() {
            let previous = locate;
            locate = locate_fn(move |owner| {
                previous(owner)
                    .and_then(step.get_mut)
                    .and_then(step.navigate_mut)
            });
        }
        Some(locate)
    }
}

fn store(slot: Option<&mut dyn Any>, assign: AssignFn, value: &dyn Any) -> WriteOutcome {
    match slot {
        Some(slot) => {
            if assign(slot, value) {
                WriteOutcome::Written
            } else {
                WriteOutcome::Unassignable
            }
        }
        None => WriteOutcome::MissingContainer,
    }
}

fn read_fn<F>(read: F) -> ReadFn
where
    F: Fn(&dyn Any) -> Option<&dyn Any> + Send + Sync + 'static,
{
    Arc::new(read)
}

fn locate_fn<F>(locate: F) -> LocateFn
where
    F: Fn(&mut dyn Any) -> Option<&mut dyn Any> + Send + Sync + 'static,
{
    Arc::new(locate)
}

fn write_fn<F>(write: F) -> WriteFn
where
    F: Fn(&mut dyn Any, &dyn Any) -> WriteOutcome + Send + Sync + 'static,
{
    Arc::new(write)
}
