//! Error types for rigsheet-core

use thiserror::Error;

/// Result type alias using rigsheet-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in rigsheet-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Collaboration endpoint error
    #[error("Collaboration error: {0}")]
    Collab(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handwritten_variants_display_their_context() {
        assert_eq!(
            Error::InvalidInput("user id must not be empty".to_string()).to_string(),
            "Invalid input: user id must not be empty"
        );
        assert_eq!(
            Error::Collab("Session not found (404)".to_string()).to_string(),
            "Collaboration error: Session not found (404)"
        );
    }
}
