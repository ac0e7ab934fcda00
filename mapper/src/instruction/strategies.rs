use error_stack::Report;
use itertools::Itertools;
use tracing::{debug, trace};

use super::{FieldMapping, InstructionResolver, MappingInstruction};
use crate::accessor::{FieldPath, resolve_read, resolve_write};
use crate::compatibility::compatible;
use crate::error::{Error, Result};
use crate::type_info::{FieldDescriptor, TypeDescriptor, ValueType};

/// Instructions only for destination fields carrying mapping metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationDriven;

/// Instructions only for fields sharing a name on both types
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectByName;

/// Mapping metadata first; fields it leaves uncovered fall back to same-name copies
#[derive(Debug, Clone, Copy, Default)]
pub struct Combined;

impl InstructionResolver for AnnotationDriven {
    fn name(&self) -> &'static str { "annotation_driven" }

    fn resolve(
        &self,
        source: &'static TypeDescriptor,
        destination: &'static TypeDescriptor,
    ) -> Result<Vec<MappingInstruction>> {
        check_targets(destination)?;
        destination
            .fields()
            .iter()
            .map(|field| annotated(source, destination, field.name))
            .flatten_ok()
            .collect()
    }
}

impl InstructionResolver for DirectByName {
    fn name(&self) -> &'static str { "direct_by_name" }

    fn resolve(
        &self,
        source: &'static TypeDescriptor,
        destination: &'static TypeDescriptor,
    ) -> Result<Vec<MappingInstruction>> {
        destination
            .fields()
            .iter()
            .filter_map(|field| direct(source, destination, field).transpose())
            .collect()
    }
}

impl InstructionResolver for Combined {
    fn name(&self) -> &'static str { "combined" }

    fn resolve(
        &self,
        source: &'static TypeDescriptor,
        destination: &'static TypeDescriptor,
    ) -> Result<Vec<MappingInstruction>> {
        check_targets(destination)?;
        destination
            .fields()
            .iter()
            .map(|field| -> Result<Vec<MappingInstruction>> {
                let covered = annotated(source, destination, field.name)?;
                if covered.is_empty() {
                    Ok(direct(source, destination, field)?.into_iter().collect())
                } else {
                    Ok(covered)
                }
            })
            .flatten_ok()
            .collect()
    }
}

/// Every mapping must target a declared destination field
fn check_targets(destination: &'static TypeDescriptor) -> Result<()> {
    let undeclared = destination.mappings().iter().find(|mapping| {
        mapping
            .target_root()
            .and_then(|root| destination.field_named(root))
            .is_none()
    });
    match undeclared {
        Some(mapping) => Err(Report::new(Error::field_not_found(
            destination.name(),
            mapping.target(),
        ))
        .attach("Mapping metadata targets a field the destination does not declare")),
        None => Ok(()),
    }
}

/// Instructions from the mapping metadata rooted at `field`
fn annotated(
    source: &'static TypeDescriptor,
    destination: &'static TypeDescriptor,
    field: &str,
) -> Result<Vec<MappingInstruction>> {
    let source_type = source.value_type();
    destination
        .mappings_for(field)
        .filter_map(|mapping| {
            annotated_instruction(source, &source_type, destination, mapping).transpose()
        })
        .collect()
}

fn annotated_instruction(
    source: &'static TypeDescriptor,
    source_type: &ValueType,
    destination: &'static TypeDescriptor,
    mapping: &FieldMapping,
) -> Result<Option<MappingInstruction>> {
    let Some(candidate) = mapping
        .candidates()
        .iter()
        .find(|candidate| compatible(Some(&candidate.source_type()), Some(source_type)))
    else {
        debug!(
            source = source.name(),
            destination = destination.name(),
            field = mapping.target(),
            "No candidate matches the source type, field left unmapped"
        );
        return Ok(None);
    };

    let source_path = candidate
        .source_path()
        .ok_or_else(|| Error::field_not_found(source.name(), candidate.effective_path()))?;
    let target = FieldPath::parse(mapping.target())
        .ok_or_else(|| Error::field_not_found(destination.name(), mapping.target()))?;
    instruction(source, &source_path, destination, &target).map(Some)
}

/// Same-name instruction for a writable destination field, if the source has a readable match
fn direct(
    source: &'static TypeDescriptor,
    destination: &'static TypeDescriptor,
    field: &FieldDescriptor,
) -> Result<Option<MappingInstruction>> {
    if !field.access.is_writable() {
        return Ok(None);
    }
    if !source
        .field_named(field.name)
        .is_some_and(|source_field| source_field.access.is_readable())
    {
        return Ok(None);
    }
    let path = FieldPath::parse(field.name)
        .ok_or_else(|| Error::field_not_found(destination.name(), field.name))?;
    instruction(source, &path, destination, &path).map(Some)
}

fn instruction(
    source: &'static TypeDescriptor,
    source_path: &FieldPath,
    destination: &'static TypeDescriptor,
    destination_path: &FieldPath,
) -> Result<MappingInstruction> {
    let instruction = MappingInstruction::new(
        resolve_read(source, source_path)?,
        resolve_write(destination, destination_path)?,
    )?;
    trace!(
        source = source.name(),
        source_path = %source_path,
        destination = destination.name(),
        destination_path = %destination_path,
        "Resolved mapping instruction"
    );
    Ok(instruction)
}
