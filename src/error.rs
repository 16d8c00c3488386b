//! Error types for hri
//!
//! Every failure that crosses a component boundary is an [`HriError`]. Adapter
//! errors (SQLite, snapshot I/O) are translated at the adapter boundary so the
//! ranking engine and the tool layer only ever see these variants.

use thiserror::Error;

/// Which backing store an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Structured,
    Vector,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structured => f.write_str("structured store"),
            Self::Vector => f.write_str("vector store"),
        }
    }
}

#[derive(Debug, Error)]
pub enum HriError {
    /// Malformed input to the data model, or a query with nothing to search for.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{store} unavailable: {reason}")]
    StoreUnavailable { store: StoreKind, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("search cancelled")]
    Cancelled,

    #[error("search deadline exceeded after {0} ms")]
    DeadlineExceeded(u64),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HriError {
    pub fn structured(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            store: StoreKind::Structured,
            reason: reason.into(),
        }
    }

    pub fn vector(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            store: StoreKind::Vector,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable kind, used by robot output and tool errors.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::StoreUnavailable { .. } => "store_unavailable",
            Self::Config(_) | Self::MissingConfig(_) => "config",
            Self::Cancelled | Self::DeadlineExceeded(_) => "cancelled",
            Self::Serialization(_) | Self::Io(_) => "internal",
        }
    }

    /// True when the vector store failed and the caller may degrade.
    #[must_use]
    pub const fn is_vector_unavailable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable {
                store: StoreKind::Vector,
                ..
            }
        )
    }
}

// SQLite errors only ever originate inside the structured adapter.
impl From<rusqlite::Error> for HriError {
    fn from(err: rusqlite::Error) -> Self {
        Self::structured(err.to_string())
    }
}

impl From<serde_json::Error> for HriError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HriError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(HriError::Validation("x".into()).kind(), "validation");
        assert_eq!(HriError::NotFound("x".into()).kind(), "not_found");
        assert_eq!(HriError::structured("down").kind(), "store_unavailable");
        assert_eq!(HriError::Cancelled.kind(), "cancelled");
        assert_eq!(HriError::MissingConfig("x".into()).kind(), "config");
    }

    #[test]
    fn test_vector_unavailable_detection() {
        assert!(HriError::vector("gone").is_vector_unavailable());
        assert!(!HriError::structured("gone").is_vector_unavailable());
    }

    #[test]
    fn test_rusqlite_error_maps_to_structured_store() {
        let err: HriError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(
            err,
            HriError::StoreUnavailable {
                store: StoreKind::Structured,
                ..
            }
        ));
    }
}
