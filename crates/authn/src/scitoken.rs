//! SciToken object model and authorization enforcement.
//!
//! A [`SciToken`] is decoded from the JOSE compact serialization without
//! signature verification — cryptographic verification belongs to the
//! service the token is presented to. What this module establishes is
//! whether a locally discovered token is *worth presenting*: the
//! [`Enforcer`] tests a token against an issuer, an audience, and a
//! requested [`Scope`] so that discovery can skip tokens that the remote
//! side would reject anyway.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{CredentialError, Result},
    validation::validate_algorithm,
};

/// Audience value matching any service.
const ANY_AUDIENCE: &str = "ANY";

/// JOSE header fields relevant to screening. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct TokenHeader {
    alg: String,
}

/// The `aud` claim: a single audience or a list of them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// A single audience string.
    One(String),
    /// Multiple audience strings.
    Many(Vec<String>),
}

impl Audience {
    /// Returns `true` if the claim names `expected` or the wildcard `"ANY"`.
    #[must_use]
    pub fn matches(&self, expected: &str) -> bool {
        match self {
            Self::One(aud) => aud == expected || aud == ANY_AUDIENCE,
            Self::Many(auds) => auds.iter().any(|aud| aud == expected || aud == ANY_AUDIENCE),
        }
    }
}

/// An authorization scope: a `scheme:path` pair such as `read:/frames`.
///
/// A bare scheme with no path (e.g. `read`) authorizes the whole tree and
/// parses as path `/`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    scheme: String,
    path: String,
}

impl Scope {
    /// Creates a scope from a scheme and path.
    pub fn new(scheme: impl Into<String>, path: impl Into<String>) -> Self {
        Self { scheme: scheme.into(), path: path.into() }
    }

    /// Shorthand for a `read` scope on the given path.
    pub fn read(path: impl Into<String>) -> Self {
        Self::new("read", path)
    }

    /// Parses a `scheme:path` entry; a missing path means the root.
    #[must_use]
    pub fn parse(entry: &str) -> Self {
        match entry.split_once(':') {
            Some((scheme, path)) => Self::new(scheme, path),
            None => Self::new(entry, "/"),
        }
    }

    /// The operation scheme (e.g. `read`).
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The resource path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns `true` if this (authorized) scope covers `requested`.
    ///
    /// Schemes must be equal; the authorized path covers the requested path
    /// when it is the root, equal to it, or a path-boundary prefix of it
    /// (`read:/frames` covers `/frames/O4` but not `/frames-archive`).
    #[must_use]
    pub fn allows(&self, requested: &Scope) -> bool {
        if self.scheme != requested.scheme {
            return false;
        }
        let authorized = self.path.trim_end_matches('/');
        if authorized.is_empty() {
            return true;
        }
        let requested = requested.path.trim_end_matches('/');
        requested == authorized || requested.starts_with(&format!("{authorized}/"))
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scheme, self.path)
    }
}

/// SciToken claims.
///
/// Only `iss` and `exp` are required at decode time; everything else is
/// checked during enforcement where the policy decides what matters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer URL.
    pub iss: String,
    /// Subject (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Audience claim (optional; enforcement requires it).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    /// Expiration time (seconds since epoch).
    pub exp: u64,
    /// Issued at (optional, seconds since epoch).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    /// Not before (optional, seconds since epoch).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    /// Token ID (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Space-separated authorization scopes (e.g. `"read:/frames read:/archive"`).
    #[serde(default)]
    pub scope: String,
    /// SciTokens version claim (e.g. `"scitoken:2.0"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ver: Option<String>,
}

impl TokenClaims {
    /// Parses the space-separated `scope` claim into [`Scope`] entries.
    #[must_use]
    pub fn parse_scopes(&self) -> Vec<Scope> {
        self.scope.split_whitespace().map(Scope::parse).collect()
    }
}

/// A bearer token discovered from the environment.
///
/// Holds both the decoded claims and the original serialized form; the
/// serialized form is what ultimately goes on the wire.
#[derive(Clone, Debug, PartialEq)]
pub struct SciToken {
    raw: String,
    claims: TokenClaims,
}

impl SciToken {
    /// Decodes a token from its JOSE compact serialization.
    ///
    /// The header algorithm is screened (see
    /// [`validate_algorithm`](crate::validation::validate_algorithm)) and
    /// the claims are parsed, but the signature is *not* verified.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Invalid`] if:
    /// - the token does not have exactly 3 dot-separated parts
    /// - a part is not valid base64url or valid JSON
    /// - the header algorithm is forbidden or unknown
    /// - the `iss` claim is missing or empty
    pub fn decode(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() != 3 {
            return Err(CredentialError::invalid(
                "token must have 3 parts separated by dots",
            ));
        }

        let header_bytes = URL_SAFE_NO_PAD.decode(parts[0]).map_err(|e| {
            CredentialError::invalid(format!("failed to decode token header: {e}"))
        })?;
        let header: TokenHeader = serde_json::from_slice(&header_bytes).map_err(|e| {
            CredentialError::invalid(format!("failed to parse token header: {e}"))
        })?;
        validate_algorithm(&header.alg)?;

        let payload_bytes = URL_SAFE_NO_PAD.decode(parts[1]).map_err(|e| {
            CredentialError::invalid(format!("failed to decode token payload: {e}"))
        })?;
        let claims: TokenClaims = serde_json::from_slice(&payload_bytes).map_err(|e| {
            CredentialError::invalid(format!("failed to parse token claims: {e}"))
        })?;

        if claims.iss.is_empty() {
            return Err(CredentialError::invalid("missing claim: iss"));
        }

        Ok(Self { raw: raw.to_owned(), claims })
    }

    /// The decoded claims.
    #[must_use]
    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    /// The token issuer.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.claims.iss
    }

    /// The original serialized token, as presented to a service.
    #[must_use]
    pub fn serialized(&self) -> &str {
        &self.raw
    }
}

/// Authorization policy a discovered token is tested against.
///
/// An enforcer is scoped to one issuer and one audience; [`Enforcer::test`]
/// then decides whether a token from that issuer authorizes a requested
/// scope right now.
#[derive(Clone, Debug)]
pub struct Enforcer {
    issuer: String,
    audience: String,
}

impl Enforcer {
    /// Creates an enforcer for the given issuer and audience.
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self { issuer: issuer.into(), audience: audience.into() }
    }

    /// Tests `token` against the requested scope at the current time.
    ///
    /// # Errors
    ///
    /// See [`test_at`](Self::test_at).
    pub fn test(&self, token: &SciToken, requested: &Scope) -> Result<()> {
        self.test_at(token, requested, Utc::now())
    }

    /// Tests `token` against the requested scope at a fixed instant.
    ///
    /// Checks, in order: issuer identity, audience (exact match or the
    /// `"ANY"` wildcard), expiry (strict) and not-before at `now`, and
    /// whether any authorized scope covers `requested`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Invalid`] naming the first failed check.
    pub fn test_at(
        &self,
        token: &SciToken,
        requested: &Scope,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let claims = token.claims();
        // A clock before the epoch clamps to zero rather than wrapping,
        // keeping the u64 claim comparisons sound.
        let now = u64::try_from(now.timestamp()).unwrap_or(0);

        if claims.iss != self.issuer {
            return Err(CredentialError::invalid(format!(
                "token issuer mismatch: expected '{}', got '{}'",
                self.issuer, claims.iss
            )));
        }

        match &claims.aud {
            Some(aud) if aud.matches(&self.audience) => {}
            Some(_) => {
                return Err(CredentialError::invalid(format!(
                    "token audience does not include '{}'",
                    self.audience
                )));
            }
            None => return Err(CredentialError::invalid("missing claim: aud")),
        }

        if claims.exp <= now {
            return Err(CredentialError::invalid("token has expired"));
        }
        if let Some(nbf) = claims.nbf {
            if nbf > now {
                return Err(CredentialError::invalid("token is not yet valid"));
            }
        }

        if !claims.parse_scopes().iter().any(|scope| scope.allows(requested)) {
            return Err(CredentialError::invalid(format!(
                "token scope does not authorize '{requested}'"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::testutil::{craft_token, craft_token_with_alg, test_claims};

    const AUDIENCE: &str = "https://datafind.example.org";
    const ISSUER: &str = "https://cilogon.org/igwn";

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_decode_valid_token() {
        let token = SciToken::decode(&craft_token(&test_claims(ISSUER, AUDIENCE))).unwrap();
        assert_eq!(token.issuer(), ISSUER);
        assert_eq!(token.claims().scope, "read:/frames");
    }

    #[test]
    fn test_decode_trims_surrounding_whitespace() {
        // Token files routinely end with a newline.
        let raw = format!("{}\n", craft_token(&test_claims(ISSUER, AUDIENCE)));
        let token = SciToken::decode(&raw).unwrap();
        assert_eq!(token.serialized(), raw.trim());
    }

    #[test]
    fn test_decode_rejects_wrong_part_count() {
        assert!(SciToken::decode("only.two").is_err());
        assert!(SciToken::decode("not-a-token").is_err());
        assert!(SciToken::decode("").is_err());
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        assert!(SciToken::decode("!!!.!!!.!!!").is_err());
    }

    #[test]
    fn test_decode_rejects_unsigned_token() {
        let raw = craft_token_with_alg("none", &test_claims(ISSUER, AUDIENCE));
        let result = SciToken::decode(&raw);
        assert!(
            matches!(result, Err(CredentialError::Invalid(ref msg)) if msg.contains("not allowed"))
        );
    }

    #[test]
    fn test_decode_rejects_empty_issuer() {
        let mut claims = test_claims("", AUDIENCE);
        claims["iss"] = json!("");
        let result = SciToken::decode(&craft_token(&claims));
        assert!(
            matches!(result, Err(CredentialError::Invalid(ref msg)) if msg.contains("iss"))
        );
    }

    #[test]
    fn test_audience_matching() {
        let one = Audience::One(AUDIENCE.into());
        assert!(one.matches(AUDIENCE));
        assert!(!one.matches("https://other.example.org"));

        let any = Audience::One("ANY".into());
        assert!(any.matches(AUDIENCE));

        let many = Audience::Many(vec!["https://a.example".into(), AUDIENCE.into()]);
        assert!(many.matches(AUDIENCE));
        assert!(!many.matches("https://b.example"));
    }

    #[test]
    fn test_audience_deserializes_from_string_or_array() {
        let token = SciToken::decode(&craft_token(&test_claims(ISSUER, AUDIENCE))).unwrap();
        assert_eq!(token.claims().aud, Some(Audience::One(AUDIENCE.into())));

        let mut claims = test_claims(ISSUER, AUDIENCE);
        claims["aud"] = json!([AUDIENCE, "https://other.example.org"]);
        let token = SciToken::decode(&craft_token(&claims)).unwrap();
        assert!(matches!(token.claims().aud, Some(Audience::Many(_))));
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!(Scope::parse("read:/frames"), Scope::new("read", "/frames"));
        assert_eq!(Scope::parse("read"), Scope::new("read", "/"));
        assert_eq!(Scope::parse("write:/archive/O4"), Scope::new("write", "/archive/O4"));
    }

    #[test]
    fn test_scope_allows_prefix_on_path_boundary() {
        let authorized = Scope::read("/frames");
        assert!(authorized.allows(&Scope::read("/frames")));
        assert!(authorized.allows(&Scope::read("/frames/O4")));
        assert!(!authorized.allows(&Scope::read("/frames-archive")));
        assert!(!authorized.allows(&Scope::read("/")));
    }

    #[test]
    fn test_scope_root_allows_everything() {
        let authorized = Scope::read("/");
        assert!(authorized.allows(&Scope::read("/frames")));
        assert!(authorized.allows(&Scope::read("/")));
    }

    #[test]
    fn test_scope_scheme_must_match() {
        assert!(!Scope::read("/frames").allows(&Scope::new("write", "/frames")));
    }

    #[test]
    fn test_enforcer_accepts_valid_token() {
        let token = SciToken::decode(&craft_token(&test_claims(ISSUER, AUDIENCE))).unwrap();
        let enforcer = Enforcer::new(ISSUER, AUDIENCE);
        assert!(enforcer.test_at(&token, &Scope::read("/frames"), fixed_now()).is_ok());
    }

    #[test]
    fn test_enforcer_rejects_issuer_mismatch() {
        let token = SciToken::decode(&craft_token(&test_claims(ISSUER, AUDIENCE))).unwrap();
        let enforcer = Enforcer::new("https://someone-else.example", AUDIENCE);
        let result = enforcer.test_at(&token, &Scope::read("/frames"), fixed_now());
        assert!(
            matches!(result, Err(CredentialError::Invalid(ref msg)) if msg.contains("issuer"))
        );
    }

    #[test]
    fn test_enforcer_rejects_audience_mismatch() {
        let token = SciToken::decode(&craft_token(&test_claims(ISSUER, AUDIENCE))).unwrap();
        let enforcer = Enforcer::new(ISSUER, "https://other.example.org");
        let result = enforcer.test_at(&token, &Scope::read("/frames"), fixed_now());
        assert!(
            matches!(result, Err(CredentialError::Invalid(ref msg)) if msg.contains("audience"))
        );
    }

    #[test]
    fn test_enforcer_accepts_any_audience() {
        let mut claims = test_claims(ISSUER, AUDIENCE);
        claims["aud"] = json!("ANY");
        let token = SciToken::decode(&craft_token(&claims)).unwrap();
        let enforcer = Enforcer::new(ISSUER, AUDIENCE);
        assert!(enforcer.test_at(&token, &Scope::read("/frames"), fixed_now()).is_ok());
    }

    #[test]
    fn test_enforcer_rejects_missing_audience() {
        let mut claims = test_claims(ISSUER, AUDIENCE);
        claims.as_object_mut().unwrap().remove("aud");
        let token = SciToken::decode(&craft_token(&claims)).unwrap();
        let enforcer = Enforcer::new(ISSUER, AUDIENCE);
        let result = enforcer.test_at(&token, &Scope::read("/frames"), fixed_now());
        assert!(
            matches!(result, Err(CredentialError::Invalid(ref msg)) if msg.contains("aud"))
        );
    }

    #[test]
    fn test_enforcer_rejects_expired_token() {
        let mut claims = test_claims(ISSUER, AUDIENCE);
        claims["exp"] = json!(fixed_now().timestamp() - 60);
        let token = SciToken::decode(&craft_token(&claims)).unwrap();
        let enforcer = Enforcer::new(ISSUER, AUDIENCE);
        let result = enforcer.test_at(&token, &Scope::read("/frames"), fixed_now());
        assert!(
            matches!(result, Err(CredentialError::Invalid(ref msg)) if msg.contains("expired"))
        );
    }

    #[test]
    fn test_enforcer_clock_before_epoch() {
        // A pre-1970 pinned clock must not wrap the comparison instant; an
        // unexpired token is simply far in the future from there.
        let token = SciToken::decode(&craft_token(&test_claims(ISSUER, AUDIENCE))).unwrap();
        let enforcer = Enforcer::new(ISSUER, AUDIENCE);
        let before_epoch = Utc.with_ymd_and_hms(1960, 1, 1, 0, 0, 0).unwrap();
        assert!(enforcer.test_at(&token, &Scope::read("/frames"), before_epoch).is_ok());
    }

    #[test]
    fn test_enforcer_rejects_not_yet_valid_token() {
        let mut claims = test_claims(ISSUER, AUDIENCE);
        claims["nbf"] = json!(fixed_now().timestamp() + 3600);
        let token = SciToken::decode(&craft_token(&claims)).unwrap();
        let enforcer = Enforcer::new(ISSUER, AUDIENCE);
        let result = enforcer.test_at(&token, &Scope::read("/frames"), fixed_now());
        assert!(
            matches!(result, Err(CredentialError::Invalid(ref msg)) if msg.contains("not yet valid"))
        );
    }

    #[test]
    fn test_enforcer_rejects_unauthorized_scope() {
        let token = SciToken::decode(&craft_token(&test_claims(ISSUER, AUDIENCE))).unwrap();
        let enforcer = Enforcer::new(ISSUER, AUDIENCE);
        let result = enforcer.test_at(&token, &Scope::new("write", "/frames"), fixed_now());
        assert!(
            matches!(result, Err(CredentialError::Invalid(ref msg)) if msg.contains("scope"))
        );
    }

    #[test]
    fn test_enforcer_accepts_subpath_of_authorized_scope() {
        let token = SciToken::decode(&craft_token(&test_claims(ISSUER, AUDIENCE))).unwrap();
        let enforcer = Enforcer::new(ISSUER, AUDIENCE);
        assert!(enforcer.test_at(&token, &Scope::read("/frames/O4/hoft"), fixed_now()).is_ok());
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        fn arb_claims() -> impl Strategy<Value = TokenClaims> {
            (
                "[a-z0-9:/._-]{1,64}",                                    // iss
                proptest::option::of("[a-z0-9:_-]{1,32}"),                // sub
                proptest::option::of("[a-zA-Z0-9:/._-]{1,64}"),           // aud
                1_000_000_000u64..2_000_000_000u64,                       // exp
                proptest::option::of(1_000_000_000u64..2_000_000_000u64), // iat
                proptest::option::of(1_000_000_000u64..2_000_000_000u64), // nbf
                proptest::option::of("[a-zA-Z0-9-]{1,32}"),               // jti
                "[a-z:/_ ]{0,64}",                                        // scope
            )
                .prop_map(|(iss, sub, aud, exp, iat, nbf, jti, scope)| TokenClaims {
                    iss,
                    sub,
                    aud: aud.map(Audience::One),
                    exp,
                    iat,
                    nbf,
                    jti,
                    scope,
                    ver: None,
                })
        }

        proptest! {
            /// Claims survive a serde round trip unchanged.
            #[test]
            fn claims_serde_round_trip(claims in arb_claims()) {
                let json = serde_json::to_string(&claims).expect("serialize");
                let back: TokenClaims = serde_json::from_str(&json).expect("deserialize");
                prop_assert_eq!(back, claims);
            }

            /// A scope always allows itself and its path-boundary children.
            #[test]
            fn scope_allows_is_reflexive(
                scheme in "[a-z]{1,8}",
                path in "(/[a-z0-9]{1,8}){0,4}",
            ) {
                let path = if path.is_empty() { "/".to_owned() } else { path };
                let scope = Scope::new(scheme.clone(), path.clone());
                prop_assert!(scope.allows(&scope));
                let child = Scope::new(scheme, format!("{}/sub", path.trim_end_matches('/')));
                prop_assert!(scope.allows(&child));
            }
        }
    }
}
