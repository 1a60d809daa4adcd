//! Credential error types.
//!
//! The taxonomy is deliberately two-way: [`CredentialError::NotFound`] means
//! no candidate credential source was present, while
//! [`CredentialError::Invalid`] means a candidate was found but failed
//! structural or temporal validation. Callers must be able to tell these
//! apart because the remediation differs — create a credential versus renew
//! or regenerate it.

use thiserror::Error;

/// Errors from credential resolution and validation.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CredentialError {
    /// No candidate credential source was present.
    #[error("credential not found: {0}")]
    NotFound(String),

    /// A candidate credential was found but failed validation.
    ///
    /// The message names the check that failed (missing proxy extension,
    /// expiry, audience mismatch, ...) so the failure is actionable.
    #[error("invalid credential: {0}")]
    Invalid(String),
}

impl CredentialError {
    /// Creates a [`CredentialError::NotFound`] with the given message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Creates a [`CredentialError::Invalid`] with the given message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Result type alias for credential operations.
pub type Result<T> = std::result::Result<T, CredentialError>;
