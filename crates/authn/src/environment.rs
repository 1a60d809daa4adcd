//! Read-only process environment provider.
//!
//! Credential resolution is driven entirely by environment variables, the
//! filesystem, and the process uid. Reading the environment ad hoc makes the
//! resolution chain untestable, so the lookups are funnelled through the
//! [`Environment`] trait and tests substitute a fixed map-backed
//! implementation (see `testutil::MapEnvironment`).

/// Combined proxy path variable: certificate and key in a single file.
pub const X509_USER_PROXY: &str = "X509_USER_PROXY";

/// Separate certificate path variable.
pub const X509_USER_CERT: &str = "X509_USER_CERT";

/// Separate private key path variable.
pub const X509_USER_KEY: &str = "X509_USER_KEY";

/// Inline bearer token contents (WLCG Bearer Token Discovery, step 1).
pub const BEARER_TOKEN: &str = "BEARER_TOKEN";

/// Path to a bearer token file (WLCG Bearer Token Discovery, step 2).
pub const BEARER_TOKEN_FILE: &str = "BEARER_TOKEN_FILE";

/// Runtime directory searched for `bt_u<uid>` token files.
pub const XDG_RUNTIME_DIR: &str = "XDG_RUNTIME_DIR";

/// Directory of scheduler-delegated credentials (HTCondor batch jobs).
pub const CONDOR_CREDS: &str = "_CONDOR_CREDS";

/// Read-only view of the process environment.
///
/// Implementations must be cheap to query repeatedly; resolution reads each
/// variable at most a handful of times per call and never caches across
/// calls.
pub trait Environment {
    /// Returns the value of the named environment variable, if set.
    fn var(&self, name: &str) -> Option<String>;

    /// Returns the numeric user id, or `None` on platforms without one.
    ///
    /// The uid anchors the fixed per-user fallback paths
    /// (`/tmp/x509up_u<uid>`, `bt_u<uid>`).
    fn uid(&self) -> Option<u32>;
}

/// The real process environment.
#[derive(Copy, Clone, Debug, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn uid(&self) -> Option<u32> {
        process_uid()
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn process_uid() -> Option<u32> {
    // SAFETY: getuid has no preconditions and cannot fail.
    Some(unsafe { libc::getuid() })
}

#[cfg(not(unix))]
fn process_uid() -> Option<u32> {
    None
}
