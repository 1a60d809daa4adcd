//! Integration tests for bearer token discovery through the public API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, TimeZone, Utc};
use gwdatafind_authn::{
    Scope, discover_token_at,
    environment::{BEARER_TOKEN, BEARER_TOKEN_FILE, CONDOR_CREDS, XDG_RUNTIME_DIR},
    testutil::{MapEnvironment, craft_token, craft_token_with_alg, test_claims, write_token_file},
};
use serde_json::json;

const AUDIENCE: &str = "https://datafind.igwn.org";
const ISSUER: &str = "https://cilogon.org/igwn";

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn frames() -> Scope {
    Scope::read("/frames")
}

#[test]
fn full_discovery_order_inline_first() {
    // All four WLCG sources plus condor are configured; the inline
    // variable must win.
    let runtime = tempfile::tempdir().unwrap();
    let creds = tempfile::tempdir().unwrap();
    let file = runtime.path().join("explicit-token");
    write_token_file(&file, &test_claims("https://file.example", AUDIENCE));
    write_token_file(
        &runtime.path().join("bt_u1000"),
        &test_claims("https://xdg.example", AUDIENCE),
    );
    write_token_file(
        &creds.path().join("svc.use"),
        &test_claims("https://condor.example", AUDIENCE),
    );

    let env = MapEnvironment::new()
        .with_var(BEARER_TOKEN, craft_token(&test_claims(ISSUER, AUDIENCE)))
        .with_var(BEARER_TOKEN_FILE, file.to_str().unwrap())
        .with_var(XDG_RUNTIME_DIR, runtime.path().to_str().unwrap())
        .with_var(CONDOR_CREDS, creds.path().to_str().unwrap())
        .with_uid(1000);

    let token = discover_token_at(&env, AUDIENCE, &frames(), fixed_now()).unwrap();
    assert_eq!(token.issuer(), ISSUER);
}

#[test]
fn file_beats_xdg_and_condor() {
    let runtime = tempfile::tempdir().unwrap();
    let creds = tempfile::tempdir().unwrap();
    let file = runtime.path().join("explicit-token");
    write_token_file(&file, &test_claims(ISSUER, AUDIENCE));
    write_token_file(
        &runtime.path().join("bt_u1000"),
        &test_claims("https://xdg.example", AUDIENCE),
    );
    write_token_file(
        &creds.path().join("svc.use"),
        &test_claims("https://condor.example", AUDIENCE),
    );

    let env = MapEnvironment::new()
        .with_var(BEARER_TOKEN_FILE, file.to_str().unwrap())
        .with_var(XDG_RUNTIME_DIR, runtime.path().to_str().unwrap())
        .with_var(CONDOR_CREDS, creds.path().to_str().unwrap())
        .with_uid(1000);

    let token = discover_token_at(&env, AUDIENCE, &frames(), fixed_now()).unwrap();
    assert_eq!(token.issuer(), ISSUER);
}

#[test]
fn xdg_beats_condor() {
    let runtime = tempfile::tempdir().unwrap();
    let creds = tempfile::tempdir().unwrap();
    write_token_file(&runtime.path().join("bt_u1000"), &test_claims(ISSUER, AUDIENCE));
    write_token_file(
        &creds.path().join("svc.use"),
        &test_claims("https://condor.example", AUDIENCE),
    );

    let env = MapEnvironment::new()
        .with_var(XDG_RUNTIME_DIR, runtime.path().to_str().unwrap())
        .with_var(CONDOR_CREDS, creds.path().to_str().unwrap())
        .with_uid(1000);

    let token = discover_token_at(&env, AUDIENCE, &frames(), fixed_now()).unwrap();
    assert_eq!(token.issuer(), ISSUER);
}

#[test]
fn condor_scan_survives_malformed_and_foreign_files() {
    let creds = tempfile::tempdir().unwrap();
    std::fs::write(creds.path().join("00-corrupt.use"), "@@@ not a token @@@").unwrap();
    write_token_file(
        &creds.path().join("01-wrong-audience.use"),
        &test_claims(ISSUER, "https://other-service.example"),
    );
    // An unsigned token is structurally fine but must be rejected.
    std::fs::write(
        creds.path().join("02-unsigned.use"),
        craft_token_with_alg("none", &test_claims(ISSUER, AUDIENCE)),
    )
    .unwrap();
    // Wrong suffix: ignored entirely, even though it would validate.
    write_token_file(&creds.path().join("03-ignored.token"), &test_claims(ISSUER, AUDIENCE));
    write_token_file(&creds.path().join("04-good.use"), &test_claims(ISSUER, AUDIENCE));

    let env = MapEnvironment::new().with_var(CONDOR_CREDS, creds.path().to_str().unwrap());
    let token = discover_token_at(&env, AUDIENCE, &frames(), fixed_now()).unwrap();
    assert_eq!(token.issuer(), ISSUER);
}

#[test]
fn condor_directory_with_no_usable_token_yields_none() {
    let creds = tempfile::tempdir().unwrap();
    std::fs::write(creds.path().join("broken.use"), "junk").unwrap();

    let env = MapEnvironment::new().with_var(CONDOR_CREDS, creds.path().to_str().unwrap());
    assert!(discover_token_at(&env, AUDIENCE, &frames(), fixed_now()).is_none());
}

#[test]
fn scope_mismatch_downgrades_to_none() {
    // Token only authorizes /frames; asking for an unrelated tree must
    // come back empty rather than erroring.
    let env = MapEnvironment::new()
        .with_var(BEARER_TOKEN, craft_token(&test_claims(ISSUER, AUDIENCE)));
    assert!(
        discover_token_at(&env, AUDIENCE, &Scope::read("/archive"), fixed_now()).is_none()
    );
}

#[test]
fn expired_token_downgrades_to_none() {
    let mut claims = test_claims(ISSUER, AUDIENCE);
    claims["exp"] = json!(fixed_now().timestamp() - 3600);
    let env = MapEnvironment::new().with_var(BEARER_TOKEN, craft_token(&claims));
    assert!(discover_token_at(&env, AUDIENCE, &frames(), fixed_now()).is_none());
}

#[test]
fn empty_environment_yields_none() {
    let env = MapEnvironment::new();
    assert!(discover_token_at(&env, AUDIENCE, &frames(), fixed_now()).is_none());
}
