use super::chain::{LocateStep, ReadChain, ReadStep, WriteChain};
use super::field_path::FieldPath;
use crate::error::{Error, Result};
use crate::type_info::{FieldDescriptor, TypeDescriptor};

/// Resolve `path` on `root` into a chain of field reads
///
/// Every segment must name a readable declared field of the type reached so far. Failures
/// report the root type and the full requested path.
pub fn resolve_read(root: &'static TypeDescriptor, path: &FieldPath) -> Result<ReadChain> {
    let fields = walk(root, path, path.segments(), Access::Read)?;
    let terminal = fields
        .last()
        .map(|field| field.value_type())
        .ok_or_else(|| Error::field_not_found(root.name(), path))?;
    let steps = fields
        .iter()
        .map(|field| ReadStep {
            get:      field.get,
            navigate: field.value_type().navigate_fn(),
        })
        .collect();
    Ok(ReadChain::new(root.name(), path.clone(), steps, terminal))
}

/// Resolve `path` on `root` into a navigate-then-write chain
///
/// All but the last segment are containers navigated mutably; the last segment is the field
/// written. Missing intermediate containers are not created.
pub fn resolve_write(root: &'static TypeDescriptor, path: &FieldPath) -> Result<WriteChain> {
    let (container_segments, leaf_name) = path.split_leaf();
    let containers = walk(root, path, container_segments, Access::Navigate)?;

    let owner = match containers.last() {
        Some(container) => container.value_type().descriptor(),
        None => Some(root),
    };
    let leaf = field_on(owner, leaf_name, root, path, Access::Write)?;

    let steps = containers
        .iter()
        .map(|field| LocateStep {
            get_mut:      field.get_mut,
            navigate_mut: field.value_type().navigate_mut_fn(),
        })
        .collect();
    Ok(WriteChain::new(
        root.name(),
        path.clone(),
        steps,
        leaf.get_mut,
        leaf.value_type(),
    ))
}

#[derive(Clone, Copy)]
enum Access {
    Read,
    Navigate,
    Write,
}

impl Access {
    const fn verb(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Navigate => "navigate through",
            Self::Write => "write",
        }
    }
}

/// Look up each segment on the type reached by the previous one
fn walk(
    root: &'static TypeDescriptor,
    path: &FieldPath,
    segments: &[String],
    access: Access,
) -> Result<Vec<&'static FieldDescriptor>> {
    let mut owner = Some(root);
    let mut fields = Vec::with_capacity(segments.len());
    for segment in segments {
        let field = field_on(owner, segment, root, path, access)?;
        owner = field.value_type().descriptor();
        fields.push(field);
    }
    Ok(fields)
}

fn field_on(
    owner: Option<&'static TypeDescriptor>,
    name: &str,
    root: &'static TypeDescriptor,
    path: &FieldPath,
    access: Access,
) -> Result<&'static FieldDescriptor> {
    let field = owner
        .and_then(|owner| owner.field_named(name))
        .ok_or_else(|| Error::field_not_found(root.name(), path))?;

    let permitted = match access {
        Access::Read => field.access.is_readable(),
        Access::Navigate | Access::Write => field.access.is_writable(),
    };
    if !permitted {
        let owner_name = owner.map_or(root.name(), TypeDescriptor::name);
        return Err(error_stack::Report::new(Error::access_denied(
            owner_name,
            field.name,
            format!("field is {}, cannot {}", field.access, access.verb()),
        ))
        .attach(format!("Requested path: {}.{path}", root.name())));
    }
    Ok(field)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, reason = "test assertions")]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crate::accessor::WriteOutcome;
    use crate::type_info::{FieldType, Mappable, ValueType};

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Address {
        city:    String,
        zip:     Option<u32>,
        country: String,
    }

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Customer {
        name:     String,
        address:  Address,
        billing:  Option<Address>,
        internal: u64,
    }

    impl FieldType for Address {
        fn value_type() -> ValueType { ValueType::record::<Self>() }
    }

    impl Mappable for Address {
        fn descriptor() -> &'static TypeDescriptor {
            static DESCRIPTOR: LazyLock<TypeDescriptor> = LazyLock::new(|| {
                TypeDescriptor::of::<Address>()
                    .field(crate::field!(Address, city: String))
                    .field(crate::field!(Address, zip: Option<u32>))
                    .field(crate::field!(Address, country: String, read_only))
            });
            &DESCRIPTOR
        }
    }

    impl FieldType for Customer {
        fn value_type() -> ValueType { ValueType::record::<Self>() }
    }

    impl Mappable for Customer {
        fn descriptor() -> &'static TypeDescriptor {
            static DESCRIPTOR: LazyLock<TypeDescriptor> = LazyLock::new(|| {
                TypeDescriptor::of::<Customer>()
                    .field(crate::field!(Customer, name: String))
                    .field(crate::field!(Customer, address: Address))
                    .field(crate::field!(Customer, billing: Option<Address>))
                    .field(crate::field!(Customer, internal: u64, hidden))
            });
            &DESCRIPTOR
        }
    }

    fn path(raw: &str) -> FieldPath { FieldPath::parse(raw).expect("valid path") }

    fn customer() -> Customer {
        Customer {
            name:     "Ada".to_string(),
            address:  Address {
                city:    "London".to_string(),
                zip:     Some(1815),
                country: "UK".to_string(),
            },
            billing:  None,
            internal: 7,
        }
    }

    #[test]
    fn test_resolve_read_nested_path() {
        let chain = resolve_read(Customer::descriptor(), &path("address.city")).expect("resolves");
        assert_eq!(chain.terminal().id(), String::value_type().id());

        let instance = customer();
        let read = chain.compile();
        assert_eq!(
            read(&instance).and_then(|value| value.downcast_ref::<String>()),
            Some(&"London".to_string())
        );
        assert_eq!(
            chain
                .read(&instance)
                .and_then(|value| value.downcast_ref::<String>()),
            Some(&"London".to_string())
        );
    }

    #[test]
    fn test_resolve_read_through_absent_optional_container() {
        let chain = resolve_read(Customer::descriptor(), &path("billing.city"));
        assert!(chain.as_ref().is_ok_and(|chain| chain.compile()(&customer()).is_none()));
    }

    #[test]
    fn test_missing_field_reports_root_and_full_path() {
        let Err(report) = resolve_read(Customer::descriptor(), &path("address.street")) else {
            panic!("address.street must not resolve");
        };
        assert_eq!(
            report.current_context(),
            &Error::field_not_found(Customer::descriptor().name(), "address.street")
        );
    }

    #[test]
    fn test_segment_on_scalar_is_not_found() {
        let result = resolve_read(Customer::descriptor(), &path("name.len"));
        assert!(result.is_err_and(|report| matches!(
            report.current_context(),
            Error::FieldNotFound { .. }
        )));
    }

    #[test]
    fn test_hidden_field_is_access_denied() {
        let result = resolve_read(Customer::descriptor(), &path("internal"));
        assert!(result.is_err_and(|report| matches!(
            report.current_context(),
            Error::AccessDenied(_)
        )));
    }

    #[test]
    fn test_read_only_field_cannot_be_written() {
        let readable = resolve_read(Customer::descriptor(), &path("address.country"));
        assert!(readable.is_ok());

        let writable = resolve_write(Customer::descriptor(), &path("address.country"));
        assert!(writable.is_err_and(|report| matches!(
            report.current_context(),
            Error::AccessDenied(_)
        )));
    }

    #[test]
    fn test_resolve_write_single_segment() {
        let Ok(chain) = resolve_write(Customer::descriptor(), &path("name")) else {
            panic!("name must resolve");
        };
        assert_eq!(chain.depth(), 0);

        let mut instance = customer();
        let write = chain.compile();
        assert_eq!(write(&mut instance, &"Grace".to_string()), WriteOutcome::Written);
        assert_eq!(instance.name, "Grace");
        assert_eq!(write(&mut instance, &3_i8), WriteOutcome::Unassignable);
    }

    #[test]
    fn test_resolve_write_navigates_container_then_writes_leaf() {
        let Ok(chain) = resolve_write(Customer::descriptor(), &path("address.zip")) else {
            panic!("address.zip must resolve");
        };
        assert_eq!(chain.depth(), 1);
        assert!(chain.terminal().is_optional());

        let mut instance = customer();
        let write = chain.compile();
        assert_eq!(write(&mut instance, &90210_u32), WriteOutcome::Written);
        assert_eq!(instance.address.zip, Some(90210));
    }

    #[test]
    fn test_write_into_absent_container_is_reported() {
        let Ok(chain) = resolve_write(Customer::descriptor(), &path("billing.city")) else {
            panic!("billing.city must resolve");
        };
        let mut instance = customer();
        let write = chain.compile();
        assert_eq!(
            write(&mut instance, &"Paris".to_string()),
            WriteOutcome::MissingContainer
        );

        instance.billing = Some(Address::default());
        assert_eq!(write(&mut instance, &"Paris".to_string()), WriteOutcome::Written);
        assert_eq!(
            instance.billing.map(|billing| billing.city),
            Some("Paris".to_string())
        );
    }
}
