//! X.509 proxy credential resolution and validation.
//!
//! Authenticated datafind access historically rides on a short-lived proxy
//! certificate delegated from the user's identity certificate. Resolution
//! follows a strict ordered search over the environment and a fixed
//! per-user path; the first candidate that *exists* wins, and a candidate
//! that exists but fails validation is a hard failure — the search never
//! continues past it, because silently picking up a different credential
//! than the one the user configured is worse than failing.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use x509_parser::{der_parser::oid, der_parser::oid::Oid, prelude::*};

use crate::{
    environment::{Environment, X509_USER_CERT, X509_USER_KEY, X509_USER_PROXY},
    error::{CredentialError, Result},
};

/// RFC 3820 id-pe-proxyCertInfo.
const OID_PROXY_CERT_INFO: Oid<'static> = oid!(1.3.6.1.5.5.7.1.14);

/// Pre-standard Globus proxyCertInfo, still emitted by legacy tooling.
const OID_PROXY_CERT_INFO_LEGACY: Oid<'static> = oid!(1.3.6.1.4.1.3536.1.222);

/// Remediation hint appended to resolution failures.
const RFC_PROXY_HINT: &str = "run 'grid-proxy-init -rfc' and try again";

/// A resolved X.509 proxy credential.
///
/// `cert_path` and `key_path` are identical for a combined proxy file and
/// distinct when resolved from separate `X509_USER_CERT`/`X509_USER_KEY`
/// variables. Credentials are resolved fresh and re-validated on every
/// call; nothing is cached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyCredential {
    /// Path to the certificate (PEM).
    pub cert_path: PathBuf,
    /// Path to the private key (PEM); may equal `cert_path`.
    pub key_path: PathBuf,
}

/// Locates and validates the user's X.509 proxy credential.
///
/// Ordered search:
/// 1. `X509_USER_PROXY` — combined file, cert path = key path.
/// 2. `X509_USER_CERT` + `X509_USER_KEY` — possibly distinct pair.
/// 3. `/tmp/x509up_u<uid>` — the fixed per-user path; platforms without a
///    uid fail here with [`CredentialError::NotFound`].
///
/// The winning candidate's certificate must be readable
/// ([`CredentialError::NotFound`] otherwise) and must pass
/// [`validate_proxy`]; a validation failure propagates rather than falling
/// through to the next source.
///
/// # Errors
///
/// [`CredentialError::NotFound`] when no source is present or the chosen
/// file is unreadable; [`CredentialError::Invalid`] when the chosen file
/// fails proxy validation.
pub fn resolve_proxy(env: &dyn Environment) -> Result<ProxyCredential> {
    resolve_proxy_at(env, Utc::now())
}

/// [`resolve_proxy`] with an explicit validation instant, for callers that
/// pin the clock.
pub fn resolve_proxy_at(env: &dyn Environment, now: DateTime<Utc>) -> Result<ProxyCredential> {
    let credential = locate_proxy(env)?;
    validate_proxy_at(&credential.cert_path, now)?;
    Ok(credential)
}

/// Selects the candidate credential paths without touching the filesystem.
fn locate_proxy(env: &dyn Environment) -> Result<ProxyCredential> {
    if let Some(path) = env.var(X509_USER_PROXY) {
        let path = PathBuf::from(path);
        return Ok(ProxyCredential { cert_path: path.clone(), key_path: path });
    }

    if let (Some(cert), Some(key)) = (env.var(X509_USER_CERT), env.var(X509_USER_KEY)) {
        return Ok(ProxyCredential { cert_path: cert.into(), key_path: key.into() });
    }

    let uid = env.uid().ok_or_else(|| {
        CredentialError::not_found(format!(
            "no X509 credential variables set and this platform has no \
             per-user proxy path; {RFC_PROXY_HINT}"
        ))
    })?;
    let path = PathBuf::from(format!("/tmp/x509up_u{uid}"));
    Ok(ProxyCredential { cert_path: path.clone(), key_path: path })
}

/// Validates a proxy certificate file at the current time.
///
/// # Errors
///
/// See [`validate_proxy_at`].
pub fn validate_proxy(path: &Path) -> Result<()> {
    validate_proxy_at(path, Utc::now())
}

/// Validates a proxy certificate file at a fixed instant.
///
/// The certificate must parse as PEM, must either carry a proxyCertInfo
/// extension (RFC 3820, or the legacy Globus OID) or have a subject common
/// name starting with `proxy`, and its not-after time must be strictly
/// after `now`. All negative outcomes are errors naming the failed check;
/// this never reports "false".
///
/// The common-name fallback is a naming-convention heuristic with no
/// cryptographic grounding, preserved for compatibility with legacy
/// (pre-RFC-3820) proxies.
///
/// # Errors
///
/// [`CredentialError::NotFound`] if the file cannot be read;
/// [`CredentialError::Invalid`] for parse failures, unrecognized proxies,
/// and expired credentials.
pub fn validate_proxy_at(path: &Path, now: DateTime<Utc>) -> Result<()> {
    let data = fs::read(path).map_err(|e| {
        CredentialError::not_found(format!(
            "cannot read certificate file {}: {e}; {RFC_PROXY_HINT}",
            path.display()
        ))
    })?;

    let (_, pem) = parse_x509_pem(&data).map_err(|e| {
        CredentialError::invalid(format!(
            "failed to parse PEM from {}: {e}",
            path.display()
        ))
    })?;
    let cert = pem.parse_x509().map_err(|e| {
        CredentialError::invalid(format!(
            "failed to parse certificate from {}: {e}",
            path.display()
        ))
    })?;

    let has_proxy_extension = cert
        .extensions()
        .iter()
        .any(|ext| ext.oid == OID_PROXY_CERT_INFO || ext.oid == OID_PROXY_CERT_INFO_LEGACY);
    if !has_proxy_extension {
        let common_name = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .unwrap_or_default();
        if !common_name.starts_with("proxy") {
            return Err(CredentialError::invalid(format!(
                "{} is not a recognized proxy: no proxyCertInfo extension and \
                 subject CN does not begin with 'proxy'; {RFC_PROXY_HINT}",
                path.display()
            )));
        }
    }

    // Strictly after: a certificate expiring exactly now is already unusable.
    if cert.validity().not_after.timestamp() <= now.timestamp() {
        return Err(CredentialError::invalid(format!(
            "proxy credential {} has expired; {RFC_PROXY_HINT}",
            path.display()
        )));
    }

    Ok(())
}
