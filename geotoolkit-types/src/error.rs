//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeotoolkitTypesError {
    /// Name of an axis direction is not known.
    #[error("unknown axis direction: {0}")]
    AxisDirection(String),
    /// Name of an object type is not known.
    #[error("unknown object type: {0}")]
    ObjectType(String),
}
