//! Integration tests for token issuance and verification.

mod helpers;

use std::sync::Arc;

use chrono::Duration;

use flasky_auth::token::TokenPurpose;
use flasky_core::error::ErrorKind;
use flasky_core::traits::ManualClock;
use flasky_database::Stores;
use flasky_service::Services;

#[tokio::test]
async fn test_round_trip_within_lifetime() {
    let app = helpers::TestApp::new().await;
    let user = app.create_user("a@example.com", "a", "cat").await;

    let issued = app
        .services
        .codec
        .issue(user.id, Some(TokenPurpose::Confirm), Duration::hours(1))
        .unwrap();
    app.clock.advance(Duration::minutes(30));

    let claims = app
        .services
        .codec
        .verify(&issued.token, Some(TokenPurpose::Confirm))
        .unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.purpose, Some(TokenPurpose::Confirm));
}

#[tokio::test]
async fn test_expired_token_is_invalid() {
    let app = helpers::TestApp::new().await;
    let user = app.create_user("a@example.com", "a", "cat").await;

    let issued = app
        .services
        .codec
        .issue(user.id, Some(TokenPurpose::Confirm), Duration::hours(1))
        .unwrap();
    app.clock.advance(Duration::hours(2));

    let err = app
        .services
        .codec
        .verify(&issued.token, Some(TokenPurpose::Confirm))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_confirm_token_fails_as_reset() {
    let app = helpers::TestApp::new().await;
    let user = app.create_user("a@example.com", "a", "cat").await;

    let token = app
        .services
        .identity
        .generate_confirmation_token(&user, Duration::hours(1))
        .unwrap();
    let err = app
        .services
        .codec
        .verify(&token, Some(TokenPurpose::Reset))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);

    // a reset token cannot confirm an account either
    let reset = app
        .services
        .identity
        .generate_reset_token(&user, Duration::hours(1))
        .unwrap();
    let mut user = user;
    assert!(!app.services.identity.confirm(&mut user, &reset).await.unwrap());
    assert!(!user.confirmed);
}

#[tokio::test]
async fn test_spliced_signature_is_invalid() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("alice@example.com", "alice", "cat").await;
    let bob = app.create_user("bob@example.com", "bob", "cat").await;

    let codec = &app.services.codec;
    let a = codec.issue_session(alice.id, Duration::hours(1)).unwrap().token;
    let b = codec.issue_session(bob.id, Duration::hours(1)).unwrap().token;

    let (a_head, _) = a.rsplit_once('.').unwrap();
    let (_, b_sig) = b.rsplit_once('.').unwrap();
    let spliced = format!("{a_head}.{b_sig}");

    let err = codec.verify(&spliced, None).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_session_verification_rejects_purpose_tokens() {
    let app = helpers::TestApp::new().await;
    let user = app.create_user("a@example.com", "a", "cat").await;

    let reset = app
        .services
        .identity
        .generate_reset_token(&user, Duration::hours(1))
        .unwrap();
    assert!(app.services.codec.verify(&reset, None).is_err());

    let session = app
        .services
        .codec
        .issue_session(user.id, Duration::hours(1))
        .unwrap();
    assert!(app
        .services
        .codec
        .verify(&session.token, Some(TokenPurpose::Confirm))
        .is_err());
    assert_eq!(
        app.services.codec.verify(&session.token, None).unwrap().sub,
        user.id
    );
}

#[tokio::test]
async fn test_unrepresentable_lifetime_is_rejected() {
    let app = helpers::TestApp::new().await;
    let user = app.create_user("a@example.com", "a", "cat").await;

    let err = app
        .services
        .identity
        .generate_confirmation_token(&user, Duration::MAX)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[test]
fn test_services_reject_out_of_range_token_ttl() {
    let mut config = helpers::test_config();
    config.auth.api_token_ttl_seconds = u64::MAX;

    let result = Services::new(
        &config,
        Stores::memory(),
        Arc::new(ManualClock::default()),
        Arc::new(helpers::RecordingSink::default()),
    );
    let err = result.err().unwrap();
    assert_eq!(err.kind, ErrorKind::Configuration);
    assert!(err.message.contains("auth.api_token_ttl_seconds"));
}
