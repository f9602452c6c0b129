use thiserror::Error;

/// Error reading a WKT definition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WktError {
    /// The text does not follow the WKT grammar. `position` is a byte offset into the text.
    #[error("syntax error at {position}: {message}")]
    Syntax {
        /// Byte offset of the error.
        position: usize,
        /// Description of the error.
        message: String,
    },

    /// An element appears where another kind of element is required.
    #[error("unexpected element {found}, expected {expected}")]
    UnexpectedElement {
        /// Keywords allowed at this place.
        expected: &'static str,
        /// Keyword found.
        found: String,
    },

    /// A required child element or value is absent.
    #[error("element {element} is missing {missing}")]
    Missing {
        /// Keyword of the incomplete element.
        element: String,
        /// What is missing.
        missing: &'static str,
    },

    /// A value cannot be interpreted.
    #[error("invalid value in {element}: {message}")]
    InvalidValue {
        /// Keyword of the element holding the value.
        element: String,
        /// Why the value was rejected.
        message: String,
    },

    /// Elements are nested deeper than the reader accepts.
    #[error("elements are nested deeper than {0} levels")]
    TooDeep(usize),
}
