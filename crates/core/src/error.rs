//! Error types for bg-core
//!
//! Every gateway operation reports one of these variants. The HTTP layer
//! collapses all of them to a single status, so the display string is what
//! the caller ultimately sees.

use thiserror::Error;

/// Result type alias for bg-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for bg-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// An operation was attempted before the store was configured
    #[error("S3 not configured")]
    Unconfigured,

    /// Missing or malformed caller input
    #[error("{0}")]
    InvalidInput(String),

    /// Folder path is empty or otherwise unusable
    #[error("{0}")]
    InvalidFolderPath(String),

    /// Referenced object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The remote store rejected or failed a call
    #[error("Store error: {0}")]
    Store(String),

    /// Bulk deletion attempted without a confirmation value
    #[error("CAPTCHA verification required")]
    ConfirmationRequired,

    /// Confirmation value did not match the expected one
    #[error("Invalid CAPTCHA")]
    ConfirmationMismatch,

    /// Gateway configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Stable label for this error, used as a structured logging field
    pub const fn kind(&self) -> &'static str {
        match self {
            Error::Unconfigured => "unconfigured",
            Error::InvalidInput(_) | Error::InvalidFolderPath(_) => "invalid_input",
            Error::NotFound(_) => "not_found",
            Error::Store(_) => "store_error",
            Error::ConfirmationRequired => "confirmation_required",
            Error::ConfirmationMismatch => "confirmation_mismatch",
            Error::Config(_) | Error::TomlParse(_) | Error::TomlSerialize(_) => "config",
            Error::InvalidUrl(_) => "config",
            Error::Io(_) => "io",
            Error::General(_) => "general",
        }
    }

    /// Whether this error means the referenced object is absent
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::Unconfigured.kind(), "unconfigured");
        assert_eq!(Error::InvalidInput("x".into()).kind(), "invalid_input");
        assert_eq!(Error::InvalidFolderPath("".into()).kind(), "invalid_input");
        assert_eq!(Error::NotFound("k".into()).kind(), "not_found");
        assert_eq!(Error::Store("boom".into()).kind(), "store_error");
        assert_eq!(Error::ConfirmationRequired.kind(), "confirmation_required");
        assert_eq!(Error::ConfirmationMismatch.kind(), "confirmation_mismatch");
        assert_eq!(Error::Config("bad".into()).kind(), "config");
        assert_eq!(Error::General("x".into()).kind(), "general");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(Error::Unconfigured.to_string(), "S3 not configured");
        assert_eq!(
            Error::InvalidInput("No file provided".into()).to_string(),
            "No file provided"
        );
        assert_eq!(Error::ConfirmationMismatch.to_string(), "Invalid CAPTCHA");
        assert_eq!(
            Error::Store("AccessDenied".into()).to_string(),
            "Store error: AccessDenied"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound("a".into()).is_not_found());
        assert!(!Error::Store("a".into()).is_not_found());
    }
}
