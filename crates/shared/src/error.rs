use thiserror::Error;

/// Reasons an entity fails validation. Display strings are shown to users
/// verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Position and Target is the same coordinate")]
    SameCoordinate,
    #[error("Value is not in acceptable range")]
    OutOfRange,
    #[error("Invalid Plane")]
    InvalidPlane,
    #[error("Invalid Cell Size (Must be positive)")]
    InvalidCellSize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("transducer #{index} ({id}): {source}")]
    TransducerInvalid {
        index: usize,
        id: String,
        #[source]
        source: ValidationError,
    },
    #[error("simulation geometry: {0}")]
    GeometryInvalid(#[from] ValidationError),
}

impl ConfigurationError {
    pub fn reason(&self) -> ValidationError {
        match self {
            Self::TransducerInvalid { source, .. } => *source,
            Self::GeometryInvalid(source) => *source,
        }
    }
}
