//! Mapper configuration
//!
//! Selects the instruction resolution strategy used when a plan is compiled. Configuration can
//! be deserialized (`{"copy_mode": "DIRECT_COPY"}`) or read from the environment.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::constants::ENV_COPY_MODE;
use crate::error::{Error, Result};
use crate::instruction::{AnnotationDriven, Combined, DirectByName, InstructionResolver};

/// Strategy selecting which field correspondences produce copy instructions
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum CopyMode {
    /// Mapping metadata first, then same-name fields for anything left uncovered
    #[default]
    All,
    /// Only destination fields carrying mapping metadata
    AnnotationDriven,
    /// Only fields with the same name on source and destination
    DirectCopy,
}

impl CopyMode {
    /// The resolver implementing this mode
    pub fn resolver(self) -> Arc<dyn InstructionResolver> {
        match self {
            Self::All => Arc::new(Combined),
            Self::AnnotationDriven => Arc::new(AnnotationDriven),
            Self::DirectCopy => Arc::new(DirectByName),
        }
    }
}

/// Configuration for a `Mapper`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Resolution strategy for every plan compiled by the mapper
    pub copy_mode: CopyMode,
}

impl MapperConfig {
    /// Configuration with an explicit copy mode
    pub const fn with_copy_mode(copy_mode: CopyMode) -> Self { Self { copy_mode } }

    /// Read configuration from the environment, falling back to defaults for unset values
    pub fn from_env() -> Result<Self> {
        std::env::var(ENV_COPY_MODE)
            .ok()
            .map_or_else(|| Ok(Self::default()), |value| Self::from_copy_mode_str(&value))
    }

    fn from_copy_mode_str(value: &str) -> Result<Self> {
        CopyMode::from_str(value.trim())
            .map(Self::with_copy_mode)
            .map_err(|e| {
                error_stack::Report::new(Error::invalid_configuration(ENV_COPY_MODE, e))
                    .attach(format!("Value: {value}"))
                    .attach("Expected one of: ALL, ANNOTATION_DRIVEN, DIRECT_COPY")
            })
    }
}
