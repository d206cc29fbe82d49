//! Error types for detection filter operations.
//!
//! Every failure a caller can trigger through the registry or a session is an
//! invalid argument: a bad image type, a negative radius, an empty or
//! uncompilable pattern. Missing filters are never errors; querying or
//! clearing an unconfigured key is a well-defined no-op.

use thiserror::Error;

/// Result type for detection filter operations.
pub type DetectionResult<T> = Result<T, DetectionError>;

/// Broad classification of a [`DetectionError`].
///
/// Only one kind exists today. It is kept separate from the variants so a
/// hosting server can map errors onto its own status codes without matching
/// every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied a value outside the accepted domain.
    /// Never retryable.
    InvalidArgument,
}

/// Errors that can occur while configuring or querying detection filters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    /// Image type wire code outside the recognized enumeration.
    #[error("invalid image type code {0} (expected 0..=9)")]
    InvalidImageType(i32),

    /// Image type name that does not match any known variant.
    #[error("unknown image type '{0}'")]
    UnknownImageTypeName(String),

    /// Radius that is negative, NaN or infinite.
    #[error("invalid detection radius {0} cm (must be finite and >= 0)")]
    InvalidRadius(f64),

    /// Empty name pattern.
    #[error("name pattern must not be empty")]
    EmptyPattern,

    /// Pattern that failed to compile.
    #[error("invalid name pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Empty camera name.
    #[error("camera name must not be empty")]
    EmptyCameraName,
}

impl DetectionError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidImageType(_)
            | Self::UnknownImageTypeName(_)
            | Self::InvalidRadius(_)
            | Self::EmptyPattern
            | Self::InvalidPattern { .. }
            | Self::EmptyCameraName => ErrorKind::InvalidArgument,
        }
    }

    /// Whether this error is an invalid-argument error.
    pub fn is_invalid_argument(&self) -> bool {
        self.kind() == ErrorKind::InvalidArgument
    }
}
