//! Bearer token discovery.
//!
//! Implements the WLCG Bearer Token Discovery ordering with an HTCondor
//! fallback for batch jobs. Discovery is best-effort by contract: a source
//! that yields an unusable token is logged and skipped, never fatal,
//! because the caller can always fall back to anonymous access or an X.509
//! proxy. The only terminal outcome is [`None`] — nothing usable anywhere.

use std::{fs, path::PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{
    environment::{BEARER_TOKEN, BEARER_TOKEN_FILE, CONDOR_CREDS, Environment, XDG_RUNTIME_DIR},
    error::{CredentialError, Result},
    scitoken::{Enforcer, SciToken, Scope},
};

/// Suffix of ready-to-use credential files in the HTCondor creds directory.
const CONDOR_TOKEN_SUFFIX: &str = ".use";

/// Outcome of probing a single token source.
enum Probe {
    /// The source produced a usable token.
    Found(SciToken),
    /// The source is not configured or the file does not exist.
    Absent,
    /// The source exists but its token is unusable.
    Failed(CredentialError),
}

/// Discovers a bearer token usable for `requested` at service `audience`.
///
/// Sources are probed in order and the first usable token wins:
///
/// 1. WLCG Bearer Token Discovery: `BEARER_TOKEN` (inline), then
///    `BEARER_TOKEN_FILE`, then `$XDG_RUNTIME_DIR/bt_u<uid>`, then
///    `/tmp/bt_u<uid>`. The first *present* source is the whole WLCG
///    answer: a present-but-unusable token does not fall through to later
///    WLCG sources.
/// 2. HTCondor: every `*.use` file under `$_CONDOR_CREDS`, in name order.
///    Unusable files here *are* skipped individually, since batch jobs
///    routinely carry credentials for several unrelated services.
///
/// Each candidate must decode (see [`SciToken::decode`]) and must pass
/// enforcement against `audience` and `requested` under its own issuer.
/// Unusable candidates are logged at `warn` level; returns [`None`] when
/// no source yields a usable token.
#[must_use]
pub fn discover_token(
    env: &dyn Environment,
    audience: &str,
    requested: &Scope,
) -> Option<SciToken> {
    discover_token_at(env, audience, requested, Utc::now())
}

/// [`discover_token`] with an explicit enforcement instant, for callers
/// that pin the clock.
#[must_use]
pub fn discover_token_at(
    env: &dyn Environment,
    audience: &str,
    requested: &Scope,
    now: DateTime<Utc>,
) -> Option<SciToken> {
    match probe_wlcg(env, audience, requested, now) {
        Probe::Found(token) => {
            debug!(issuer = token.issuer(), "discovered bearer token via WLCG discovery");
            return Some(token);
        }
        Probe::Absent => debug!("no WLCG bearer token source configured"),
        Probe::Failed(error) => warn!(%error, "WLCG bearer token is unusable"),
    }

    match probe_condor(env, audience, requested, now) {
        Probe::Found(token) => {
            debug!(issuer = token.issuer(), "discovered bearer token via HTCondor creds");
            Some(token)
        }
        Probe::Absent => {
            debug!("no bearer token found in any source");
            None
        }
        Probe::Failed(error) => {
            warn!(%error, "HTCondor creds directory yielded no usable token");
            None
        }
    }
}

/// Probes the four WLCG discovery sources, stopping at the first present
/// one.
fn probe_wlcg(
    env: &dyn Environment,
    audience: &str,
    requested: &Scope,
    now: DateTime<Utc>,
) -> Probe {
    if let Some(raw) = env.var(BEARER_TOKEN) {
        return check_raw(&raw, audience, requested, now);
    }

    if let Some(path) = env.var(BEARER_TOKEN_FILE) {
        return check_file(&PathBuf::from(path), audience, requested, now);
    }

    let uid = match env.uid() {
        Some(uid) => uid,
        None => return Probe::Absent,
    };

    if let Some(dir) = env.var(XDG_RUNTIME_DIR) {
        let path = PathBuf::from(dir).join(format!("bt_u{uid}"));
        if path.exists() {
            return check_file(&path, audience, requested, now);
        }
    }

    let path = PathBuf::from(format!("/tmp/bt_u{uid}"));
    if path.exists() {
        return check_file(&path, audience, requested, now);
    }

    Probe::Absent
}

/// Probes the HTCondor creds directory, trying every `*.use` file.
fn probe_condor(
    env: &dyn Environment,
    audience: &str,
    requested: &Scope,
    now: DateTime<Utc>,
) -> Probe {
    let dir = match env.var(CONDOR_CREDS) {
        Some(dir) => PathBuf::from(dir),
        None => return Probe::Absent,
    };

    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            return Probe::Failed(CredentialError::not_found(format!(
                "cannot read HTCondor creds directory {}: {e}",
                dir.display()
            )));
        }
    };

    // Name order keeps the choice deterministic across runs.
    let mut paths: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(CONDOR_TOKEN_SUFFIX))
        })
        .collect();
    paths.sort();

    let mut saw_candidate = false;
    for path in paths {
        saw_candidate = true;
        match check_file(&path, audience, requested, now) {
            Probe::Found(token) => return Probe::Found(token),
            Probe::Absent => {}
            Probe::Failed(error) => {
                warn!(path = %path.display(), %error, "skipping unusable HTCondor credential");
            }
        }
    }

    if saw_candidate {
        Probe::Failed(CredentialError::invalid(format!(
            "no usable credential among {}/*{CONDOR_TOKEN_SUFFIX}",
            dir.display()
        )))
    } else {
        Probe::Absent
    }
}

/// Reads and checks a token file; an unreadable file is a failure, since
/// the source was plainly configured.
fn check_file(
    path: &std::path::Path,
    audience: &str,
    requested: &Scope,
    now: DateTime<Utc>,
) -> Probe {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            return Probe::Failed(CredentialError::not_found(format!(
                "cannot read token file {}: {e}",
                path.display()
            )));
        }
    };
    check_raw(&raw, audience, requested, now)
}

fn check_raw(raw: &str, audience: &str, requested: &Scope, now: DateTime<Utc>) -> Probe {
    match check_token(raw, audience, requested, now) {
        Ok(token) => Probe::Found(token),
        Err(error) => Probe::Failed(error),
    }
}

/// Decodes a raw token and tests it against the local policy.
///
/// The token is enforced under its *own* issuer; discovery does not pin
/// issuers, it only refuses tokens the target service would reject
/// (audience, expiry, scope).
fn check_token(
    raw: &str,
    audience: &str,
    requested: &Scope,
    now: DateTime<Utc>,
) -> Result<SciToken> {
    let token = SciToken::decode(raw)?;
    let enforcer = Enforcer::new(token.issuer(), audience);
    enforcer.test_at(&token, requested, now)?;
    Ok(token)
}
