// ============================================================================
// FIELD PATH CONSTANTS
// ============================================================================

/// Separator between segments of an external field path (`inner.value`)
pub const PATH_DELIMITER: char = '.';

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Environment variable selecting the copy mode of a `Mapper` built with `MapperConfig::from_env`
pub const ENV_COPY_MODE: &str = "REFLECTMAP_COPY_MODE";

// ============================================================================
// TYPE NAME CONSTANTS
// ============================================================================

/// Display name used when a value's concrete type cannot be recovered
pub const TYPE_UNKNOWN: &str = "unknown";
