//! Error types used by the crate.

use geotoolkit_types::ObjectType;
use geotoolkit_wkt::WktError;
use thiserror::Error;
use web_time::Duration;

use crate::store::StoreError;

/// Error returned by authority factories.
///
/// Create-calls only ever return [`FactoryError::NoSuchAuthorityCode`] or
/// [`FactoryError::Failure`]. Lower level errors are available as the failure
/// [`cause`](FailureCause).
#[derive(Debug, Error)]
pub enum FactoryError {
    /// The code does not resolve to any definition.
    #[error("no object found for code {code}")]
    NoSuchAuthorityCode {
        /// Requested code, as given by the caller.
        code: String,
        /// Authority token of the code, if the code was scoped (`EPSG` for `EPSG:4326`).
        authority: Option<String>,
    },

    /// A definition exists but the object could not be created.
    #[error("failed to create {object_type} {code}")]
    Failure {
        /// Type of the requested object.
        object_type: ObjectType,
        /// Requested code.
        code: String,
        /// What went wrong.
        #[source]
        cause: FailureCause,
    },

    /// Invalid factory setup. Only returned while assembling a factory.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl FactoryError {
    pub(crate) fn not_found(code: &str, authority: Option<&str>) -> Self {
        Self::NoSuchAuthorityCode {
            code: code.to_string(),
            authority: authority.map(str::to_string),
        }
    }

    pub(crate) fn failure(
        object_type: ObjectType,
        code: impl Into<String>,
        cause: impl Into<FailureCause>,
    ) -> Self {
        Self::Failure {
            object_type,
            code: code.into(),
            cause: cause.into(),
        }
    }

    /// Returns true if the error means the code has no definition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoSuchAuthorityCode { .. })
    }

    /// Cause of a [`FactoryError::Failure`].
    pub fn cause(&self) -> Option<&FailureCause> {
        match self {
            Self::Failure { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Reason of a [`FactoryError::Failure`].
#[derive(Debug, Error)]
pub enum FailureCause {
    /// The definitions store failed, or returned inconsistent data.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The definition is not valid WKT.
    #[error("invalid definition")]
    Parse(#[from] WktError),

    /// The code resolves to an object of another type.
    #[error("expected {expected}, found {found}")]
    UnexpectedType {
        /// Requested type.
        expected: ObjectType,
        /// Type of the object the code resolves to.
        found: ObjectType,
    },

    /// No backing factory became available in time.
    #[error("no backing factory available after waiting {waited:?}")]
    PoolExhausted {
        /// Time spent waiting for a pool slot.
        waited: Duration,
    },

    /// The factory has been disposed.
    #[error("factory is disposed")]
    Disposed,
}
