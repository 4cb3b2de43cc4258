//! Error taxonomy for catalog operations.
//!
//! A missing record is not an error: lookups return `Option`, deletes
//! return `bool`. Everything in [`CatalogError`] is something the caller
//! has to handle or report.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by [`CatalogStore`](crate::store::CatalogStore) operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A required field is missing or a supplied value is unusable.
    #[error("invalid product: {0}")]
    Validation(String),

    /// The computed slug already belongs to another product.
    #[error("slug '{slug}' is already in use")]
    Conflict { slug: String },

    /// The catalog file exists but could not be read or parsed, and the
    /// store is configured to fail rather than reset.
    #[error("catalog file {} is unreadable: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// Reading or writing the catalog file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode catalog: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CatalogError::Validation(msg.into())
    }

    pub fn conflict(slug: impl Into<String>) -> Self {
        CatalogError::Conflict { slug: slug.into() }
    }

    /// Machine-readable code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Validation(_) => "bad_request",
            CatalogError::Conflict { .. } => "conflict",
            CatalogError::Corrupt { .. } | CatalogError::Io { .. } | CatalogError::Serialize(_) => {
                "internal"
            }
        }
    }

    /// Whether the error was caused by the caller's input rather than the
    /// store itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CatalogError::Validation(_) | CatalogError::Conflict { .. }
        )
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(CatalogError::validation("name is required").code(), "bad_request");
        assert_eq!(CatalogError::conflict("mug").code(), "conflict");
        let io = CatalogError::Io {
            path: PathBuf::from("/tmp/products.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(io.code(), "internal");
        assert!(!io.is_client_error());
    }

    #[test]
    fn test_display() {
        let err = CatalogError::conflict("mug");
        assert_eq!(err.to_string(), "slug 'mug' is already in use");
        assert!(err.is_client_error());

        let err = CatalogError::Corrupt {
            path: PathBuf::from("data/products.json"),
            reason: "expected value at line 1 column 1".to_string(),
        };
        assert!(err.to_string().contains("data/products.json"));
        assert!(err.to_string().contains("line 1"));
    }
}
