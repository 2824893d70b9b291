use thiserror::Error;

/// Errors produced while reading a `.ts` document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The document is not well-formed XML.
    #[error("Malformed XML at byte {offset}: {message}")]
    Xml { offset: usize, message: String },

    /// The root element is something other than `<TS>`.
    #[error("Expected <TS> root element, found <{found}>")]
    UnexpectedRoot { found: String, offset: usize },

    /// The document contains no element at all.
    #[error("Document has no <TS> root element")]
    MissingRoot,

    /// The document ends before the element is closed.
    #[error("Unexpected end of document inside <{element}>")]
    UnexpectedEof { element: String, offset: usize },

    /// An attribute has a value the format does not allow.
    #[error("Invalid value '{value}' for attribute '{attribute}'")]
    InvalidAttribute { attribute: String, value: String, offset: usize },
}

impl CatalogError {
    /// Byte offset the error refers to, if any.
    #[must_use]
    pub const fn offset(&self) -> Option<usize> {
        match self {
            Self::Xml { offset, .. }
            | Self::UnexpectedRoot { offset, .. }
            | Self::UnexpectedEof { offset, .. }
            | Self::InvalidAttribute { offset, .. } => Some(*offset),
            Self::MissingRoot => None,
        }
    }
}
