//! Integration tests for account creation, confirmation, and credentials.

mod helpers;

use chrono::Duration;

use flasky_auth::rbac::catalog::{ADMINISTRATOR, USER};
use flasky_core::error::ErrorKind;
use flasky_core::traits::Clock;
use flasky_database::UserStore;
use flasky_service::identity::{
    AdminProfileUpdate, NewAccount, ProfileUpdate, RegisterUser,
};

#[tokio::test]
async fn test_admin_email_gets_administrator_role() {
    let app = helpers::TestApp::new().await;
    let admin = app.create_user(helpers::ADMIN_EMAIL, "root", "cat").await;
    let other = app.create_user("other@example.com", "other", "cat").await;

    let admin = app.identity(&admin).await;
    let other = app.identity(&other).await;
    assert_eq!(admin.role().unwrap().name, ADMINISTRATOR);
    assert_eq!(other.role().unwrap().name, USER);
}

#[tokio::test]
async fn test_create_without_default_role_fails() {
    let app = helpers::TestApp::without_roles();

    let err = app
        .services
        .identity
        .create(NewAccount::new("x@example.com", "x", "cat"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoDefaultRole);
    assert!(app.stores.users.find_by_email("x@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_email_and_username() {
    let app = helpers::TestApp::new().await;
    app.create_user("a@example.com", "a", "cat").await;

    let err = app
        .services
        .identity
        .create(NewAccount::new("a@example.com", "b", "cat"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateEmail);

    let err = app
        .services
        .identity
        .create(NewAccount::new("b@example.com", "a", "cat"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateUsername);
}

#[tokio::test]
async fn test_password_is_hashed_and_verifiable() {
    let app = helpers::TestApp::new().await;
    let user = app.create_user("a@example.com", "a", "cat").await;

    let hash = user.password_hash().unwrap();
    assert_ne!(hash, "cat");
    assert!(app.services.identity.verify_password(&user, "cat"));
    assert!(!app.services.identity.verify_password(&user, "dog"));
}

#[tokio::test]
async fn test_register_sends_confirmation_mail() {
    let app = helpers::TestApp::new().await;
    let form = RegisterUser {
        email: "new@example.com".to_string(),
        username: "newbie".to_string(),
        password: "cat".to_string(),
    };

    let mut user = app.services.identity.register(form).await.unwrap();
    assert!(!user.confirmed);

    let sent = app.sink.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "new@example.com");
    assert_eq!(sent[0].template, "auth/email/confirm");
    assert!(sent[0].subject.starts_with(&app.config.mail.subject_prefix));

    let token = app.sink.last_token().unwrap();
    assert!(app.services.identity.confirm(&mut user, &token).await.unwrap());
    assert!(user.confirmed);
}

#[tokio::test]
async fn test_register_rejects_bad_username() {
    let app = helpers::TestApp::new().await;
    let form = RegisterUser {
        email: "new@example.com".to_string(),
        username: "9lives".to_string(),
        password: "cat".to_string(),
    };

    let err = app.services.identity.register(form).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(app.sink.sent().is_empty());
}

#[tokio::test]
async fn test_confirm_is_idempotent() {
    let app = helpers::TestApp::new().await;
    let mut user = app.create_user("a@example.com", "a", "cat").await;

    let token = app
        .services
        .identity
        .generate_confirmation_token(&user, Duration::hours(1))
        .unwrap();
    assert!(app.services.identity.confirm(&mut user, &token).await.unwrap());
    assert!(app.services.identity.confirm(&mut user, &token).await.unwrap());

    let stored = app.services.identity.get_user(user.id).await.unwrap();
    assert!(stored.confirmed);
}

#[tokio::test]
async fn test_confirm_rejects_other_users_token() {
    let app = helpers::TestApp::new().await;
    let mut alice = app.create_user("alice@example.com", "alice", "cat").await;
    let bob = app.create_user("bob@example.com", "bob", "cat").await;

    let token = app
        .services
        .identity
        .generate_confirmation_token(&bob, Duration::hours(1))
        .unwrap();
    assert!(!app.services.identity.confirm(&mut alice, &token).await.unwrap());
    assert!(!alice.confirmed);
}

#[tokio::test]
async fn test_confirm_rejects_expired_token() {
    let app = helpers::TestApp::new().await;
    let mut user = app.create_user("a@example.com", "a", "cat").await;

    let token = app
        .services
        .identity
        .generate_confirmation_token(&user, Duration::seconds(1))
        .unwrap();
    app.clock.advance(Duration::seconds(2));
    assert!(!app.services.identity.confirm(&mut user, &token).await.unwrap());
}

#[tokio::test]
async fn test_reset_password_replaces_credential() {
    let app = helpers::TestApp::new().await;
    let user = app.create_user("a@example.com", "a", "cat").await;

    let token = app
        .services
        .identity
        .generate_reset_token(&user, Duration::hours(1))
        .unwrap();
    assert!(app.services.identity.reset_password(&token, "dog").await.unwrap());

    let stored = app.services.identity.get_user(user.id).await.unwrap();
    assert!(app.services.identity.verify_password(&stored, "dog"));
    assert!(!app.services.identity.verify_password(&stored, "cat"));
}

#[tokio::test]
async fn test_reset_password_rejects_bad_token() {
    let app = helpers::TestApp::new().await;
    let user = app.create_user("a@example.com", "a", "cat").await;

    assert!(!app.services.identity.reset_password("garbage", "dog").await.unwrap());

    // a confirmation token is not a reset token
    let confirm = app
        .services
        .identity
        .generate_confirmation_token(&user, Duration::hours(1))
        .unwrap();
    assert!(!app.services.identity.reset_password(&confirm, "dog").await.unwrap());

    let stored = app.services.identity.get_user(user.id).await.unwrap();
    assert!(app.services.identity.verify_password(&stored, "cat"));
}

#[tokio::test]
async fn test_request_password_reset_mails_token() {
    let app = helpers::TestApp::new().await;
    app.create_user("a@example.com", "a", "cat").await;

    app.services
        .identity
        .request_password_reset("a@example.com")
        .await
        .unwrap();
    let sent = app.sink.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].template, "auth/email/reset_password");

    let token = app.sink.last_token().unwrap();
    assert!(app.services.identity.reset_password(&token, "dog").await.unwrap());

    let err = app
        .services
        .identity
        .request_password_reset("nobody@example.com")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_change_password_requires_old_password() {
    let app = helpers::TestApp::new().await;
    let mut user = app.create_user("a@example.com", "a", "cat").await;

    let err = app
        .services
        .identity
        .change_password(&mut user, "wrong", "dog")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);

    let err = app
        .services
        .identity
        .change_password(&mut user, "cat", "cat")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    app.services
        .identity
        .change_password(&mut user, "cat", "dog")
        .await
        .unwrap();
    assert!(app.services.identity.verify_password(&user, "dog"));
}

#[tokio::test]
async fn test_change_username_checks_uniqueness() {
    let app = helpers::TestApp::new().await;
    let mut alice = app.create_user("alice@example.com", "alice", "cat").await;
    app.create_user("bob@example.com", "bob", "cat").await;

    let err = app
        .services
        .identity
        .change_username(&mut alice, "bob")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateUsername);

    app.services
        .identity
        .change_username(&mut alice, "alice.b")
        .await
        .unwrap();
    assert_eq!(
        app.services.identity.get_by_username("alice.b").await.unwrap().id,
        alice.id
    );
}

#[tokio::test]
async fn test_load_identity() {
    let app = helpers::TestApp::new().await;
    let user = app.create_user("a@example.com", "a", "cat").await;

    let anonymous = app.services.identity.load_identity(None).await.unwrap();
    assert!(anonymous.is_anonymous());

    let identity = app.identity(&user).await;
    assert_eq!(identity.user_id(), Some(user.id));
}

#[tokio::test]
async fn test_touch_activity_advances_last_seen() {
    let app = helpers::TestApp::new().await;
    let mut user = app.create_user("a@example.com", "a", "cat").await;
    let before = user.last_seen;

    app.clock.advance(Duration::minutes(5));
    app.services.identity.touch_activity(&mut user).await;

    assert!(user.last_seen > before);
    let stored = app.services.identity.get_user(user.id).await.unwrap();
    assert_eq!(stored.last_seen, user.last_seen);
}

#[tokio::test]
async fn test_update_profile_limits_location() {
    let app = helpers::TestApp::new().await;
    let mut user = app.create_user("a@example.com", "a", "cat").await;

    let update = ProfileUpdate {
        name: Some("Alice".to_string()),
        location: Some("x".repeat(65)),
        about_me: None,
    };
    let err = app
        .services
        .identity
        .update_profile(&mut user, update)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let update = ProfileUpdate {
        name: Some("Alice".to_string()),
        location: Some("Lisbon".to_string()),
        about_me: Some("Hi".to_string()),
    };
    app.services
        .identity
        .update_profile(&mut user, update)
        .await
        .unwrap();
    let stored = app.services.identity.get_user(user.id).await.unwrap();
    assert_eq!(stored.location.as_deref(), Some("Lisbon"));
}

#[tokio::test]
async fn test_admin_update_profile_requires_admin() {
    let app = helpers::TestApp::new().await;
    let admin = app.create_user(helpers::ADMIN_EMAIL, "admin", "cat").await;
    let target = app.create_user("old@example.com", "target", "cat").await;
    let old_hash = app
        .services
        .identity
        .get_user(target.id)
        .await
        .unwrap()
        .avatar_hash;

    let outsider = app.identity(&target).await;
    let err = app
        .services
        .identity
        .admin_update_profile(&outsider, admin.id, AdminProfileUpdate::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let update = AdminProfileUpdate {
        email: Some("new@example.com".to_string()),
        confirmed: Some(true),
        ..AdminProfileUpdate::default()
    };
    let updated = app
        .services
        .identity
        .admin_update_profile(&app.identity(&admin).await, target.id, update)
        .await
        .unwrap();
    assert_eq!(updated.email, "new@example.com");
    assert!(updated.confirmed);
    assert_ne!(updated.avatar_hash, old_hash);

    let clash = AdminProfileUpdate {
        username: Some("admin".to_string()),
        ..AdminProfileUpdate::default()
    };
    let err = app
        .services
        .identity
        .admin_update_profile(&app.identity(&admin).await, target.id, clash)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateUsername);
}

#[tokio::test]
async fn test_avatar_url_uses_cached_key() {
    let app = helpers::TestApp::new().await;
    let mut user = app.create_user("a@example.com", "a", "cat").await;

    let url = app
        .services
        .identity
        .avatar_url(&mut user, 100, "identicon", "g")
        .await
        .unwrap();
    let key = user.avatar_hash.clone().unwrap();
    assert_eq!(key.len(), 32);
    assert!(url.contains(&key));
    assert!(url.contains("s=100"));
}

#[tokio::test]
async fn test_seed_fake_users_creates_confirmed_self_following_accounts() {
    let app = helpers::TestApp::new().await;

    let created = app.services.identity.seed_fake_users(10).await.unwrap();
    assert_eq!(created, 10);

    let ids = app.stores.users.all_ids().await.unwrap();
    assert_eq!(ids.len(), 10);
    for id in ids {
        let user = app.services.identity.get_user(id).await.unwrap();
        assert!(user.confirmed);
        assert!(user.member_since <= app.clock.now());
        assert!(app.services.identity.verify_password(&user, "password"));
        assert!(app.services.follows.is_following(&user, &user).await.unwrap());
    }
}

#[tokio::test]
async fn test_seed_users_skips_taken_names() {
    let app = helpers::TestApp::new().await;
    let mut candidates = vec![
        NewAccount::new("a@example.com", "a", "cat"),
        NewAccount::new("a@example.com", "other", "cat"),
        NewAccount::new("b@example.com", "a", "cat"),
        NewAccount::new("c@example.com", "c", "cat"),
    ]
    .into_iter();

    let created = app
        .services
        .identity
        .seed_users(2, || candidates.next().unwrap())
        .await
        .unwrap();
    assert_eq!(created, 2);
    assert_eq!(app.stores.users.all_ids().await.unwrap().len(), 2);
    assert!(app.services.identity.get_by_username("c").await.is_ok());
}

#[tokio::test]
async fn test_seed_users_gives_up_when_every_candidate_clashes() {
    let app = helpers::TestApp::new().await;
    app.create_user("a@example.com", "a", "cat").await;

    let err = app
        .services
        .identity
        .seed_users(1, || NewAccount::new("a@example.com", "a", "cat"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Internal);
    assert_eq!(app.stores.users.all_ids().await.unwrap().len(), 1);
}
