//! Error types for content loading.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while loading or reloading content.
#[derive(Debug)]
pub enum ContentError {
    /// A caller supplied an unusable argument (e.g. an empty asset name).
    InvalidArgument {
        /// Name of the offending argument.
        argument: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The content manager has been disposed.
    Disposed,

    /// The requested asset does not exist in the backing store.
    NotFound {
        /// The logical asset name.
        name: String,
    },

    /// Reading the asset's bytes failed.
    Io {
        /// The physical path that failed.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// No reader knows how to produce this asset type.
    NoReader {
        /// Human-readable type name.
        type_name: &'static str,
    },

    /// The reader failed to decode the asset.
    ReadFailed {
        /// The logical asset name.
        name: String,
        /// Description of the failure.
        message: String,
    },

    /// The asset exists but has a different type than requested.
    TypeMismatch {
        /// The logical asset name.
        name: String,
        /// The requested type.
        expected: &'static str,
        /// The type actually stored or produced.
        actual: &'static str,
    },
}

impl ContentError {
    /// Shorthand for [`ContentError::ReadFailed`].
    pub fn read_failed(name: impl Into<String>, message: impl fmt::Display) -> Self {
        ContentError::ReadFailed {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::InvalidArgument { argument, reason } => {
                write!(f, "Invalid argument '{}': {}", argument, reason)
            }
            ContentError::Disposed => {
                write!(f, "Content manager has been disposed")
            }
            ContentError::NotFound { name } => {
                write!(f, "Asset not found: {}", name)
            }
            ContentError::Io { path, source } => {
                write!(f, "IO error reading '{}': {}", path.display(), source)
            }
            ContentError::NoReader { type_name } => {
                write!(f, "No reader registered for asset type: {}", type_name)
            }
            ContentError::ReadFailed { name, message } => {
                write!(f, "Failed to read '{}': {}", name, message)
            }
            ContentError::TypeMismatch {
                name,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Type mismatch for '{}': expected {}, found {}",
                    name, expected, actual
                )
            }
        }
    }
}

impl std::error::Error for ContentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContentError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ContentError {
    fn from(err: std::io::Error) -> Self {
        ContentError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

/// Result type alias for content operations.
pub type ContentResult<T> = Result<T, ContentError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_messages() {
        let err = ContentError::TypeMismatch {
            name: "sprites/hero".to_string(),
            expected: "Texture",
            actual: "Sound",
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch for 'sprites/hero': expected Texture, found Sound"
        );
        assert_eq!(
            ContentError::Disposed.to_string(),
            "Content manager has been disposed"
        );
    }

    #[test]
    fn test_io_error_has_source() {
        let err: ContentError = std::io::Error::other("disk on fire").into();
        assert!(err.source().is_some());
        assert!(ContentError::Disposed.source().is_none());
    }
}
