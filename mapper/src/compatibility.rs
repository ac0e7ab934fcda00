//! Type compatibility checks
//!
//! Compatibility is deliberately permissive: two types are compatible when either is the
//! wildcard, or when either is-a the other after stripping nullable wrappers. The same rule
//! selects annotation candidates and validates terminal types of an instruction.

use crate::type_info::ValueType;

/// Whether values of `a` and `b` may be matched against each other
///
/// Absent types are never compatible.
pub fn compatible(a: Option<&ValueType>, b: Option<&ValueType>) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return false;
    };
    a.is_wildcard() || b.is_wildcard() || a.is_a(b) || b.is_a(a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_info::{AnyValue, FieldType};

    #[test]
    fn test_primitive_and_wrapper_are_compatible() {
        let plain = i32::value_type();
        let wrapped = Option::<i32>::value_type();
        assert!(compatible(Some(&plain), Some(&wrapped)));
        assert!(compatible(Some(&wrapped), Some(&plain)));
    }

    #[test]
    fn test_distinct_scalars_are_incompatible() {
        assert!(!compatible(
            Some(&String::value_type()),
            Some(&i32::value_type())
        ));
        assert!(!compatible(
            Some(&i32::value_type()),
            Some(&i64::value_type())
        ));
    }

    #[test]
    fn test_wildcard_matches_either_side() {
        let wildcard = AnyValue::value_type();
        assert!(compatible(Some(&wildcard), Some(&String::value_type())));
        assert!(compatible(Some(&f64::value_type()), Some(&wildcard)));
    }

    #[test]
    fn test_optional_wildcard_matches_either_side() {
        let wildcard = Option::<AnyValue>::value_type();
        assert!(compatible(Some(&String::value_type()), Some(&wildcard)));
        assert!(compatible(Some(&wildcard), Some(&Option::<u32>::value_type())));
    }

    #[test]
    fn test_absent_types_are_incompatible() {
        let text = String::value_type();
        assert!(!compatible(None, Some(&text)));
        assert!(!compatible(Some(&text), None));
        assert!(!compatible(None, None));
    }
}
