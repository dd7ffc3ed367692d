use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::UnitType;

#[derive(Error, Debug)]
pub enum OrbatError {
    #[error("Unknown faction: {0}")]
    UnknownFaction(String),

    #[error("Node not found: {0:?}")]
    NodeNotFound(crate::core::types::NodeId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OrbatError>;

/// Why a node was left without a unit. Recorded on the node, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationFailure {
    /// The search ladder was exhausted
    NoUnitFound { unit_type: Option<UnitType> },
    /// The catalog handed back a unit it cannot resolve
    UnknownModel(String),
}

impl std::fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationFailure::NoUnitFound { unit_type: Some(ut) } => {
                write!(f, "no unit found for {}", ut)
            }
            GenerationFailure::NoUnitFound { unit_type: None } => write!(f, "no unit found"),
            GenerationFailure::UnknownModel(key) => write!(f, "unknown model: {}", key),
        }
    }
}
