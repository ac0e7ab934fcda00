//! `#[mapping(...)]` attribute parsing

use syn::{Attribute, Field, LitStr, Path, Type};

const ATTRIBUTE: &str = "mapping";

/// Struct-level settings
#[derive(Default)]
pub struct TypeAttributes {
    /// Construct fresh instances with `Default::default()`
    pub default:     bool,
    /// Construct fresh instances with this function
    pub constructor: Option<Path>,
    /// Declared supertypes
    pub supertypes:  Vec<Type>,
}

/// How the derived descriptor exposes a field
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub enum Access {
    #[default]
    ReadWrite,
    ReadOnly,
    Hidden,
}

/// One `#[mapping(from = Type, ...)]` entry on a field
pub struct CandidateAttribute {
    pub source:    Type,
    pub path:      Option<String>,
    pub container: Option<String>,
}

/// Field-level settings; candidates keep attribute order
#[derive(Default)]
pub struct FieldAttributes {
    pub access:     Access,
    pub candidates: Vec<CandidateAttribute>,
}

/// Parse struct-level `#[mapping(default)]`, `#[mapping(constructor = path)]` and
/// `#[mapping(is_a = Type)]`
pub fn parse_type_attributes(attrs: &[Attribute]) -> syn::Result<TypeAttributes> {
    let mut parsed = TypeAttributes::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident(ATTRIBUTE)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                parsed.default = true;
                Ok(())
            } else if meta.path.is_ident("constructor") {
                parsed.constructor = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("is_a") {
                parsed.supertypes.push(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error(
                    "unsupported mapping attribute, expected `default`, `constructor = path` or `is_a = Type`",
                ))
            }
        })?;

        if parsed.default && parsed.constructor.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "`default` and `constructor` are mutually exclusive",
            ));
        }
    }
    Ok(parsed)
}

/// Parse field-level `#[mapping(...)]` attributes
///
/// Each attribute carrying `from = Type` adds one candidate; `path` defaults to the field name.
pub fn parse_field_attributes(field: &Field) -> syn::Result<FieldAttributes> {
    let mut parsed = FieldAttributes::default();
    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident(ATTRIBUTE)) {
        let mut source: Option<Type> = None;
        let mut path = None;
        let mut container = None;

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                parsed.access = Access::Hidden;
                Ok(())
            } else if meta.path.is_ident("read_only") {
                parsed.access = Access::ReadOnly;
                Ok(())
            } else if meta.path.is_ident("from") {
                source = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("path") {
                let value: LitStr = meta.value()?.parse()?;
                path = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("container") {
                let value: LitStr = meta.value()?.parse()?;
                container = Some(value.value());
                Ok(())
            } else {
                Err(meta.error(
                    "unsupported mapping attribute, expected `from`, `path`, `container`, `skip` or `read_only`",
                ))
            }
        })?;

        match source {
            Some(source) => parsed.candidates.push(CandidateAttribute {
                source,
                path,
                container,
            }),
            None if path.is_some() || container.is_some() => {
                return Err(syn::Error::new_spanned(
                    attr,
                    "`path` and `container` need a source type: add `from = Type`",
                ));
            }
            None => {}
        }
    }

    if parsed.access == Access::Hidden && !parsed.candidates.is_empty() {
        return Err(syn::Error::new_spanned(
            field,
            "a skipped field cannot declare mapping candidates",
        ));
    }
    Ok(parsed)
}
