//! # GWDataFind Credential Resolution
//!
//! Credential discovery and validation for authenticated datafind access.
//!
//! This crate provides:
//! - **X.509 proxy resolution**: ordered environment/filesystem search and
//!   structural + temporal validation of proxy certificates
//! - **Bearer token discovery**: WLCG Bearer Token Discovery with an
//!   HTCondor fallback for batch jobs
//! - **SciToken enforcement**: issuer/audience/expiry/scope policy checks
//!   on discovered tokens
//!
//! ## Features
//!
//! - Resolution is stateless: credentials are located and validated fresh
//!   on every call, never cached in process
//! - Unsigned (`none`) and symmetric-algorithm tokens are rejected outright
//! - All environment access goes through the [`Environment`] trait so tests
//!   run against a fixed map instead of the real process environment
//!
//! ## Example
//!
//! ```no_run
//! use gwdatafind_authn::{ProcessEnvironment, Scope, discover_token, resolve_proxy};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = ProcessEnvironment;
//!
//! // Prefer a bearer token; fall back to an X.509 proxy.
//! match discover_token(&env, "https://datafind.igwn.org", &Scope::read("/frames")) {
//!     Some(token) => println!("bearer token from {}", token.issuer()),
//!     None => {
//!         let proxy = resolve_proxy(&env)?;
//!         println!("X.509 proxy at {}", proxy.cert_path.display());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Ordered bearer token discovery.
pub mod discovery;
/// Read-only process environment provider.
pub mod environment;
/// Credential error types.
pub mod error;
/// SciToken model and enforcement.
pub mod scitoken;
/// Token algorithm screening.
pub mod validation;
/// X.509 proxy resolution and validation.
pub mod x509;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

// Re-export key types for convenience
pub use discovery::{discover_token, discover_token_at};
pub use environment::{Environment, ProcessEnvironment};
pub use error::{CredentialError, Result};
pub use scitoken::{Audience, Enforcer, SciToken, Scope, TokenClaims};
pub use validation::{ACCEPTED_ALGORITHMS, FORBIDDEN_ALGORITHMS, validate_algorithm};
pub use x509::{ProxyCredential, resolve_proxy, resolve_proxy_at, validate_proxy, validate_proxy_at};
