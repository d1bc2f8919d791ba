//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Error taxonomy for topology inference and cable sizing."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CalcEngineError>;

/// Text carried by every structural failure so callers can match on it.
pub const NO_ROOT_DIAGNOSTIC: &str = "no root reachable — edge list may contain only cycles";

#[derive(Debug, Error)]
pub enum CalcEngineError {
    #[error("{}: {reason}", NO_ROOT_DIAGNOSTIC)]
    NoRootReachable { reason: String },
    #[error("edge list contains no power-carrying segments")]
    EmptyTopology,
    #[error("segment {segment} rejected: {reason}")]
    InvalidSegment { segment: String, reason: String },
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationFailed(#[from] serde_json::Error),
    #[error("yaml serialization error: {0}")]
    YamlSerializationFailed(#[from] serde_yaml::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl CalcEngineError {
    /// Structural failures abort the path analysis; everything else is an I/O or boundary issue.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            CalcEngineError::NoRootReachable { .. } | CalcEngineError::EmptyTopology
        )
    }
}
