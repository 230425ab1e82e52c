//! Integration tests for the follow graph and the followed-posts timeline.

mod helpers;

use chrono::{Duration, Utc};
use futures::TryStreamExt;

use flasky_core::error::ErrorKind;
use flasky_core::types::{PageRequest, UserId};
use flasky_database::FollowStore;
use flasky_entity::follow::Follow;
use flasky_entity::user::NewUser;

#[tokio::test]
async fn test_new_user_follows_itself() {
    let app = helpers::TestApp::new().await;
    let user = app.create_user("a@example.com", "a", "cat").await;

    assert!(app.services.follows.is_following(&user, &user).await.unwrap());
    assert!(app.services.follows.is_followed_by(&user, &user).await.unwrap());
}

#[tokio::test]
async fn test_unfollow_self_keeps_edge() {
    let app = helpers::TestApp::new().await;
    let user = app.create_user("a@example.com", "a", "cat").await;

    app.services.follows.unfollow(user.id, user.id).await.unwrap();
    assert!(app.services.follows.is_following(&user, &user).await.unwrap());
}

#[tokio::test]
async fn test_follow_is_idempotent() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("alice@example.com", "alice", "cat").await;
    let bob = app.create_user("bob@example.com", "bob", "cat").await;
    let follows = &app.services.follows;

    follows.follow(alice.id, bob.id).await.unwrap();
    follows.follow(alice.id, bob.id).await.unwrap();
    assert!(follows.is_following(&alice, &bob).await.unwrap());
    assert!(follows.is_followed_by(&bob, &alice).await.unwrap());
    assert!(!follows.is_following(&bob, &alice).await.unwrap());
    assert_eq!(follows.follower_count(bob.id).await.unwrap(), 1);

    follows.unfollow(alice.id, bob.id).await.unwrap();
    assert!(!follows.is_following(&alice, &bob).await.unwrap());
    assert_eq!(follows.follower_count(bob.id).await.unwrap(), 0);

    // unfollowing again changes nothing
    follows.unfollow(alice.id, bob.id).await.unwrap();
}

#[tokio::test]
async fn test_follow_unknown_user() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("alice@example.com", "alice", "cat").await;

    let err = app
        .services
        .follows
        .follow(alice.id, UserId::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_unsaved_user_follows_nobody() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("alice@example.com", "alice", "cat").await;
    let draft = NewUser::new("draft@example.com", "draft", Utc::now());

    let follows = &app.services.follows;
    assert!(!follows.is_following(&draft, &alice).await.unwrap());
    assert!(!follows.is_following(&alice, &draft).await.unwrap());
    assert!(!follows.is_followed_by(&draft, &alice).await.unwrap());
}

#[tokio::test]
async fn test_listings_hide_self_edge() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("alice@example.com", "alice", "cat").await;
    let bob = app.create_user("bob@example.com", "bob", "cat").await;
    let carol = app.create_user("carol@example.com", "carol", "cat").await;
    let follows = &app.services.follows;

    follows.follow(bob.id, alice.id).await.unwrap();
    app.clock.advance(Duration::seconds(1));
    follows.follow(carol.id, alice.id).await.unwrap();

    let page = follows
        .followers(alice.id, &PageRequest::default())
        .await
        .unwrap();
    let ids: Vec<_> = page.items.iter().map(|f| f.follower_id).collect();
    assert_eq!(ids, vec![carol.id, bob.id]);
    assert_eq!(page.total_items, 2);

    assert_eq!(follows.followed_count(alice.id).await.unwrap(), 0);
    assert_eq!(follows.followed_count(bob.id).await.unwrap(), 1);
    let followed = follows.followed(bob.id, &PageRequest::default()).await.unwrap();
    assert_eq!(followed.items[0].followed_id, alice.id);
}

#[tokio::test]
async fn test_timeline_includes_own_and_followed_posts() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_confirmed_user("alice@example.com", "alice").await;
    let bob = app.create_confirmed_user("bob@example.com", "bob").await;
    let carol = app.create_confirmed_user("carol@example.com", "carol").await;

    app.services.follows.follow(alice.id, bob.id).await.unwrap();

    let posts = &app.services.posts;
    let own = posts.create_post(&app.identity(&alice).await, "mine").await.unwrap();
    app.clock.advance(Duration::seconds(1));
    let followed = posts.create_post(&app.identity(&bob).await, "bob's").await.unwrap();
    app.clock.advance(Duration::seconds(1));
    posts.create_post(&app.identity(&carol).await, "carol's").await.unwrap();

    let page = app
        .services
        .follows
        .posts_from_followed(alice.id, &PageRequest::default())
        .await
        .unwrap();
    let ids: Vec<_> = page.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![followed.id, own.id]);
}

#[tokio::test]
async fn test_timeline_stream_walks_every_page() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_confirmed_user("alice@example.com", "alice").await;
    let identity = app.identity(&alice).await;

    for i in 0..5 {
        app.services
            .posts
            .create_post(&identity, &format!("post {i}"))
            .await
            .unwrap();
        app.clock.advance(Duration::seconds(1));
    }

    let bodies: Vec<String> = app
        .services
        .follows
        .followed_posts_stream(alice.id, 2)
        .map_ok(|p| p.body)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(
        bodies,
        vec!["post 4", "post 3", "post 2", "post 1", "post 0"]
    );
}

#[tokio::test]
async fn test_timeline_stream_with_equal_timestamps_yields_each_post_once() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_confirmed_user("alice@example.com", "alice").await;
    let identity = app.identity(&alice).await;

    let mut created = Vec::new();
    for i in 0..7 {
        let post = app
            .services
            .posts
            .create_post(&identity, &format!("post {i}"))
            .await
            .unwrap();
        created.push(post.id);
    }
    created.reverse();

    let ids: Vec<_> = app
        .services
        .follows
        .followed_posts_stream(alice.id, 3)
        .map_ok(|p| p.id)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(ids, created);
}

#[tokio::test]
async fn test_timeline_page_past_the_end_is_empty() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_confirmed_user("alice@example.com", "alice").await;
    app.services
        .posts
        .create_post(&app.identity(&alice).await, "hello")
        .await
        .unwrap();

    let page = app
        .services
        .follows
        .posts_from_followed(alice.id, &PageRequest::new(u64::MAX, 20))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_items, 1);
    assert!(!page.has_next);
}

#[tokio::test]
async fn test_add_self_follows_backfills_missing_edges() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("alice@example.com", "alice", "cat").await;
    let bob = app.create_user("bob@example.com", "bob", "cat").await;

    assert_eq!(app.services.follows.add_self_follows().await.unwrap(), 0);

    // simulate an account that predates self-follows
    assert!(app.stores.follows.delete(bob.id, bob.id).await.unwrap());
    assert!(!app.services.follows.is_following(&bob, &bob).await.unwrap());

    assert_eq!(app.services.follows.add_self_follows().await.unwrap(), 1);
    assert!(app.services.follows.is_following(&bob, &bob).await.unwrap());
    assert!(app.services.follows.is_following(&alice, &alice).await.unwrap());

    let edge: Option<Follow> = app.stores.follows.find(bob.id, bob.id).await.unwrap();
    assert!(edge.unwrap().is_self_edge());
}
