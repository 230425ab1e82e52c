//! Integration tests for post ownership checks and API authentication.

mod helpers;

use chrono::Duration;

use flasky_core::error::ErrorKind;
use flasky_core::types::{PageRequest, PostId};
use flasky_service::ApiSession;
use flasky_auth::rbac::Identity;

#[tokio::test]
async fn test_only_owner_or_admin_may_edit() {
    let app = helpers::TestApp::new().await;
    let author = app.create_confirmed_user("author@example.com", "author").await;
    let stranger = app.create_confirmed_user("stranger@example.com", "stranger").await;
    let admin = app.create_confirmed_user(helpers::ADMIN_EMAIL, "admin").await;

    let author = app.identity(&author).await;
    let stranger = app.identity(&stranger).await;
    let admin = app.identity(&admin).await;

    let post = app.services.posts.create_post(&author, "first").await.unwrap();

    let err = app
        .services
        .posts
        .edit_post(&stranger, post.id, "hijacked")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let edited = app
        .services
        .posts
        .edit_post(&author, post.id, "second")
        .await
        .unwrap();
    assert_eq!(edited.body, "second");

    let edited = app
        .services
        .posts
        .edit_post(&admin, post.id, "moderated")
        .await
        .unwrap();
    assert_eq!(edited.body, "moderated");
    assert_eq!(edited.author_id, post.author_id);
}

#[tokio::test]
async fn test_gate_distinguishes_anonymous() {
    let app = helpers::TestApp::new().await;
    let owner = app.create_user("a@example.com", "a", "cat").await;

    let err = app
        .services
        .gate
        .authorize_edit(&Identity::Anonymous, owner.id)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);

    let identity = app.identity(&owner).await;
    assert!(app.services.gate.authorize_edit(&identity, owner.id).is_ok());
}

#[tokio::test]
async fn test_create_post_requires_write() {
    let app = helpers::TestApp::new().await;

    let err = app
        .services
        .posts
        .create_post(&Identity::Anonymous, "hello")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);

    let user = app.create_user("a@example.com", "a", "cat").await;
    let identity = app.identity(&user).await;
    let err = app
        .services
        .posts
        .create_post(&identity, "   ")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_edit_missing_post() {
    let app = helpers::TestApp::new().await;
    let user = app.create_user("a@example.com", "a", "cat").await;
    let identity = app.identity(&user).await;

    let err = app
        .services
        .posts
        .edit_post(&identity, PostId::new(), "body")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_listings_are_newest_first() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("alice@example.com", "alice", "cat").await;
    let bob = app.create_user("bob@example.com", "bob", "cat").await;
    let posts = &app.services.posts;

    let a1 = posts.create_post(&app.identity(&alice).await, "a1").await.unwrap();
    app.clock.advance(Duration::seconds(1));
    let b1 = posts.create_post(&app.identity(&bob).await, "b1").await.unwrap();
    app.clock.advance(Duration::seconds(1));
    let a2 = posts.create_post(&app.identity(&alice).await, "a2").await.unwrap();

    let all = posts.list_posts(&posts.first_page()).await.unwrap();
    let ids: Vec<_> = all.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![a2.id, b1.id, a1.id]);

    let by_alice = posts
        .posts_by_author(alice.id, &PageRequest::new(1, 1))
        .await
        .unwrap();
    assert_eq!(by_alice.items.len(), 1);
    assert_eq!(by_alice.items[0].id, a2.id);
    assert_eq!(by_alice.total_items, 2);
    assert!(by_alice.has_next);
}

#[tokio::test]
async fn test_api_password_then_token() {
    let app = helpers::TestApp::new().await;
    let user = app.create_confirmed_user("a@example.com", "a").await;
    let api = &app.services.api_auth;

    let session = api.authenticate("a@example.com", "cat").await.unwrap();
    assert!(!session.token_used);
    session.require_confirmed().unwrap();

    let token = api.issue_api_token(&session).unwrap();
    assert_eq!(token.expiration, app.config.auth.api_token_ttl_seconds);

    let by_token = api.authenticate(&token.token, "").await.unwrap();
    assert!(by_token.token_used);
    assert_eq!(by_token.identity.user_id(), Some(user.id));

    // token sessions may not mint further tokens
    let err = api.issue_api_token(&by_token).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);
}

#[tokio::test]
async fn test_api_rejects_bad_credentials() {
    let app = helpers::TestApp::new().await;
    app.create_confirmed_user("a@example.com", "a").await;
    let api = &app.services.api_auth;

    for (identifier, credential) in [
        ("", ""),
        ("a@example.com", "dog"),
        ("nobody@example.com", "cat"),
        ("not-a-token", ""),
    ] {
        let err = api.authenticate(identifier, credential).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }
}

#[tokio::test]
async fn test_api_token_expires() {
    let app = helpers::TestApp::new().await;
    app.create_confirmed_user("a@example.com", "a").await;
    let api = &app.services.api_auth;

    let session = api.authenticate("a@example.com", "cat").await.unwrap();
    let token = api.issue_api_token(&session).unwrap();

    app.clock
        .advance(Duration::seconds(app.config.auth.api_token_ttl_seconds as i64 + 1));
    let err = api.authenticate(&token.token, "").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);
}

#[tokio::test]
async fn test_unconfirmed_api_caller_is_forbidden() {
    let app = helpers::TestApp::new().await;
    app.create_user("a@example.com", "a", "cat").await;

    let session = app
        .services
        .api_auth
        .authenticate("a@example.com", "cat")
        .await
        .unwrap();
    let err = session.require_confirmed().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let anonymous = ApiSession {
        identity: Identity::Anonymous,
        token_used: false,
    };
    assert!(anonymous.require_confirmed().is_err());
}
