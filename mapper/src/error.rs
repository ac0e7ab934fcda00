use thiserror::Error;

// Error message prefixes
const MSG_FAILED_TO_PREFIX: &str = "Failed to";
const MSG_CANNOT_PREFIX: &str = "Cannot";

/// Result type for the `reflectmap` library
pub type Result<T> = std::result::Result<T, error_stack::Report<Error>>;

/// Error kinds raised while compiling or executing copy plans
///
/// Resolution errors (`FieldNotFound`, `IncompatibleFieldTypes`, `AccessDenied`,
/// `ConstructionFailed`, `CompilationFailed`) describe a static mismatch between declared
/// types. The plan cache stores them as terminal results, which is why the enum is `Clone`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A path segment does not name a declared field
    #[error("Failed to find field: {type_name}.{path}")]
    FieldNotFound {
        /// Type the path was resolved from
        type_name: String,
        /// Full requested path
        path:      String,
    },

    /// Terminal types of an instruction are not compatible
    #[error(
        "Incompatible field types: {source_type}.{source_path} cannot be copied to {dest_type}.{dest_path}"
    )]
    IncompatibleFieldTypes {
        /// Source type name
        source_type: String,
        /// Path read on the source
        source_path: String,
        /// Destination type name
        dest_type:   String,
        /// Path written on the destination
        dest_path:   String,
    },

    /// A field cannot be bound with the requested access
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// A fresh destination instance could not be built
    #[error("Construction failed for {type_name}: {reason}")]
    ConstructionFailed {
        /// Destination type name
        type_name: String,
        /// What was missing
        reason:    String,
    },

    /// Any other failure while building a plan
    #[error("Failed to compile mapping from {source_type} to {dest_type}: {cause}")]
    CompilationFailed {
        /// Source type name
        source_type: String,
        /// Destination type name
        dest_type:   String,
        /// Description of the underlying failure
        cause:       String,
    },

    /// An optional container on a path held no value at execution time
    #[error("Missing container while navigating {type_name}.{path}")]
    MissingContainer {
        /// Type the path starts from
        type_name: String,
        /// Path being navigated
        path:      String,
    },

    /// A value read at execution time cannot be stored in the destination field
    #[error("Value of type {value_type} cannot be assigned to {dest_type}.{dest_path}")]
    UnassignableValue {
        /// Declared type of the value read
        value_type: String,
        /// Destination type name
        dest_type:  String,
        /// Path written on the destination
        dest_path:  String,
    },

    /// An instance was passed with the descriptor of another type
    #[error("Type mismatch: expected an instance of {expected}, got {found}")]
    TypeMismatch {
        /// Described type
        expected: String,
        /// Actual type, when known
        found:    String,
    },

    /// A configuration value could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl Error {
    /// Create a `FieldNotFound` error for a path on a root type
    pub fn field_not_found(type_name: &str, path: impl std::fmt::Display) -> Self {
        Self::FieldNotFound {
            type_name: type_name.to_string(),
            path:      path.to_string(),
        }
    }

    /// Create an `AccessDenied` error for a field that cannot be bound
    pub fn access_denied(type_name: &str, field: &str, reason: impl std::fmt::Display) -> Self {
        Self::AccessDenied(format!(
            "{MSG_CANNOT_PREFIX} bind {type_name}.{field}: {reason}"
        ))
    }

    /// Create a `ConstructionFailed` error
    pub fn construction_failed(type_name: &str, reason: impl std::fmt::Display) -> Self {
        Self::ConstructionFailed {
            type_name: type_name.to_string(),
            reason:    reason.to_string(),
        }
    }

    /// Create a `CompilationFailed` error wrapping an unexpected cause
    pub fn compilation_failed(
        source_type: &str,
        dest_type: &str,
        cause: impl std::fmt::Display,
    ) -> Self {
        Self::CompilationFailed {
            source_type: source_type.to_string(),
            dest_type:   dest_type.to_string(),
            cause:       cause.to_string(),
        }
    }

    /// Create an `InvalidConfiguration` error for a value that failed to parse
    pub fn invalid_configuration(what: &str, details: impl std::fmt::Display) -> Self {
        Self::InvalidConfiguration(format!("{MSG_FAILED_TO_PREFIX} parse {what}: {details}"))
    }

    /// Whether this error describes a static resolution failure that is safe to cache
    pub const fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::FieldNotFound { .. }
                | Self::IncompatibleFieldTypes { .. }
                | Self::AccessDenied(_)
                | Self::ConstructionFailed { .. }
                | Self::CompilationFailed { .. }
        )
    }
}
