//! Error types for propdocx library.

use std::fmt;
use std::io;
use thiserror::Error;

use crate::render::StyleRole;

/// Result type alias for propdocx operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while assembling a proposal.
///
/// Content problems in generated text never show up here: the converter
/// degrades them locally. What remains are invalid briefs, upstream
/// generation failures and configuration problems.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The brief failed validation.
    #[error("Invalid brief: {}", join_field_errors(.0))]
    InvalidBrief(Vec<FieldError>),

    /// The text-generation collaborator failed.
    #[error("Text generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// A role used by the renderer has no registered style.
    #[error("No style registered for role '{0}'")]
    MissingStyle(StyleRole),

    /// A registered style id is not defined by the template.
    #[error("Style '{style}' (role '{role}') is not defined in the template")]
    StyleNotInTemplate {
        /// Role the style was registered for
        role: StyleRole,
        /// Style id that could not be found
        style: String,
    },

    /// The template package is unreadable or incomplete.
    #[error("Template error: {0}")]
    Template(String),

    /// Error reading or writing the DOCX zip container.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error parsing template XML.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error during rendering.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Whether this error is a setup problem that should stop the process
    /// before any request is served.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MissingStyle(_)
                | Error::StyleNotInTemplate { .. }
                | Error::Template(_)
                | Error::Archive(_)
                | Error::Xml(_)
        )
    }

    /// Whether this error came from the text-generation collaborator.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Generation(_))
    }
}

/// A single brief validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name as it appears in the brief JSON
    pub field: &'static str,
    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure modes of the text-generation collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The call did not complete within its timeout.
    #[error("request timed out")]
    Timeout,

    /// The upstream service rejected the call for quota or rate limits.
    #[error("quota or rate limit exceeded")]
    QuotaExceeded,

    /// The service answered with no usable text.
    #[error("empty response")]
    EmptyResponse,

    /// Any other upstream failure.
    #[error("{0}")]
    Upstream(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingStyle(StyleRole::Bullet);
        assert_eq!(err.to_string(), "No style registered for role 'bullet'");

        let err = Error::InvalidBrief(vec![
            FieldError::new("client_name", "must not be empty"),
            FieldError::new("scope", "must not be empty"),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid brief: client_name: must not be empty; scope: must not be empty"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::MissingStyle(StyleRole::Body).is_configuration());
        assert!(Error::Template("no document part".into()).is_configuration());
        assert!(!Error::Generation(GenerationError::Timeout).is_configuration());
        assert!(Error::Generation(GenerationError::QuotaExceeded).is_upstream());
        assert!(!Error::InvalidBrief(Vec::new()).is_upstream());
    }
}
