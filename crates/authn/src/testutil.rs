//! Shared test utilities for credential testing.
//!
//! This module provides common helpers for building a fixed map-backed
//! [`Environment`], generating self-signed proxy certificate fixtures, and
//! crafting raw bearer-token strings (including malformed ones for negative
//! testing). It is feature-gated behind `testutil` to prevent leaking into
//! production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! gwdatafind-authn = { path = "../authn", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use gwdatafind_authn::testutil::{MapEnvironment, craft_token, test_claims};
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::{collections::HashMap, fs, path::Path};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rcgen::{CertificateParams, CustomExtension, DistinguishedName, DnType, KeyPair};
use serde_json::{Value, json};

use crate::environment::Environment;

/// A fixed, map-backed [`Environment`] for tests.
///
/// Starts empty with no uid; populate it with the builder methods. An empty
/// `MapEnvironment` models a process with nothing configured at all, which
/// is itself an interesting test case.
#[derive(Clone, Debug, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
    uid: Option<u32>,
}

impl MapEnvironment {
    /// Creates an environment with no variables and no uid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an environment variable.
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Sets the user id.
    #[must_use]
    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }
}

impl Environment for MapEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn uid(&self) -> Option<u32> {
        self.uid
    }
}

/// Flavor of certificate fixture to generate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CertKind {
    /// Carries an RFC 3820 proxyCertInfo extension.
    Rfc3820,
    /// No proxy extension; proxy-ness (if any) rests on the CN alone.
    Plain,
}

/// Writes a self-signed PEM certificate fixture to `path`.
///
/// The certificate is valid from 2020 through 2098, so tests pin their
/// clocks inside (or far beyond) that window rather than depending on the
/// wall clock.
///
/// # Panics
///
/// Panics on any generation or I/O failure; fixtures either exist or the
/// test cannot run.
pub fn write_proxy_cert(path: &Path, common_name: &str, kind: CertKind) {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    params.distinguished_name = dn;
    params.not_before = rcgen::date_time_ymd(2020, 1, 1);
    params.not_after = rcgen::date_time_ymd(2098, 1, 1);
    if kind == CertKind::Rfc3820 {
        // id-pe-proxyCertInfo with an empty SEQUENCE body; presence is all
        // that validation looks at.
        params.custom_extensions.push(CustomExtension::from_oid_content(
            &[1, 3, 6, 1, 5, 5, 7, 1, 14],
            vec![0x30, 0x00],
        ));
    }

    let key = KeyPair::generate().expect("generate fixture key");
    let cert = params.self_signed(&key).expect("self-sign fixture certificate");
    fs::write(path, cert.pem()).expect("write fixture certificate");
}

/// Standard claims for a token from `iss` addressed to `aud`.
///
/// Expires in 2033 and authorizes `read:/frames`; tests mutate the returned
/// JSON object to produce the variant they need.
#[must_use]
pub fn test_claims(iss: &str, aud: &str) -> Value {
    json!({
        "iss": iss,
        "sub": "test-user",
        "aud": aud,
        "exp": 2_000_000_000u64,
        "iat": 1_700_000_000u64,
        "scope": "read:/frames",
        "ver": "scitoken:2.0",
    })
}

/// Crafts a raw token string with an `RS256` header and the given claims.
///
/// The signature segment is a fixed placeholder; decoding never verifies
/// it, so any base64url-safe filler works.
#[must_use]
pub fn craft_token(claims: &Value) -> String {
    craft_token_with_alg("RS256", claims)
}

/// Crafts a raw token string with an arbitrary header algorithm.
///
/// Useful for attack testing: `craft_token_with_alg("none", ...)` builds a
/// structurally valid token that must be rejected at decode time.
#[must_use]
pub fn craft_token_with_alg(alg: &str, claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({ "alg": alg, "typ": "JWT" }).to_string());
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Writes a crafted token to a file, newline-terminated as token tooling
/// does in practice.
pub fn write_token_file(path: &Path, claims: &Value) {
    fs::write(path, format!("{}\n", craft_token(claims))).expect("write token fixture");
}

/// Asserts that a result is a specific [`CredentialError`] variant whose
/// message contains a substring.
///
/// # Examples
///
/// ```ignore
/// assert_cred_error!(result, Invalid, "expired");
/// ```
#[macro_export]
macro_rules! assert_cred_error {
    ($result:expr, $variant:ident, $needle:expr) => {
        match $result {
            Err($crate::CredentialError::$variant(ref msg)) => {
                assert!(
                    msg.contains($needle),
                    "expected message containing {:?}, got: {msg}",
                    $needle
                );
            }
            other => panic!(
                concat!("expected CredentialError::", stringify!($variant), ", got: {:?}"),
                other
            ),
        }
    };
}
