//! Token header algorithm screening.
//!
//! Signature verification itself is delegated to the token issuer's
//! infrastructure and is out of scope here, but the JOSE header is still
//! screened before any claims are trusted for discovery purposes:
//! unsigned (`none`) and symmetric-key tokens are never usable as
//! SciTokens, so they are rejected up front with a clear error instead of
//! being carried around until enforcement.

use crate::error::{CredentialError, Result};

/// Algorithms that are never accepted.
///
/// - `none`: no signature at all (trivially forgeable)
/// - `HS256`/`HS384`/`HS512`: symmetric algorithms; a shared secret makes no
///   sense for tokens presented to third-party services
pub const FORBIDDEN_ALGORITHMS: &[&str] = &["none", "HS256", "HS384", "HS512"];

/// Algorithms accepted for SciTokens.
///
/// The SciTokens profile signs with asymmetric keys; RS256 and ES256 are
/// the algorithms issuers deploy in practice.
pub const ACCEPTED_ALGORITHMS: &[&str] = &["RS256", "ES256"];

/// Validates a JOSE header algorithm against the SciTokens profile.
///
/// # Errors
///
/// Returns [`CredentialError::Invalid`] if the algorithm is forbidden
/// (`none`, HS*) or not in [`ACCEPTED_ALGORITHMS`].
///
/// # Examples
///
/// ```
/// use gwdatafind_authn::validation::validate_algorithm;
///
/// assert!(validate_algorithm("RS256").is_ok());
/// assert!(validate_algorithm("ES256").is_ok());
/// assert!(validate_algorithm("none").is_err());
/// assert!(validate_algorithm("HS256").is_err());
/// ```
pub fn validate_algorithm(alg: &str) -> Result<()> {
    if FORBIDDEN_ALGORITHMS.contains(&alg) {
        return Err(CredentialError::invalid(format!(
            "token algorithm '{alg}' is not allowed for security reasons"
        )));
    }

    if !ACCEPTED_ALGORITHMS.contains(&alg) {
        return Err(CredentialError::invalid(format!(
            "token algorithm '{alg}' is not in the accepted list (RS256, ES256)"
        )));
    }

    Ok(())
}
