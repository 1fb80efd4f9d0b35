//! Database-backed integration tests.
//!
//! These need a running PostgreSQL reachable via DATABASE_URL and are
//! gated behind the `db_tests` feature:
//!
//!     cargo test --features db_tests
#![cfg(feature = "db_tests")]

use actix_web::{http::StatusCode, test, web, App};
use sqlx::PgPool;
use uuid::Uuid;

use warble::db::{create_pool, follow_repo, like_repo, message_repo, run_migrations, user_repo};
use warble::error::AppError;
use warble::models::User;
use warble::routes::configure_routes;
use warble::security::SessionKey;
use warble::services::account;

async fn pool() -> PgPool {
    dotenv::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for db_tests");
    let pool = create_pool(&url, 5).await.expect("connect to database");
    run_migrations(&pool).await.expect("run migrations");
    pool
}

fn unique_name(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().to_string()[..8])
}

async fn make_user(pool: &PgPool, prefix: &str) -> User {
    let name = unique_name(prefix);
    account::signup(
        pool,
        &name,
        &format!("{}@example.com", name),
        "hunter2secret",
        None,
    )
    .await
    .expect("signup")
}

#[actix_rt::test]
async fn duplicate_signup_fails_and_leaves_one_row() {
    let pool = pool().await;
    let name = unique_name("dup");
    let email = format!("{}@example.com", name);

    account::signup(&pool, &name, &email, "hunter2secret", None)
        .await
        .expect("first signup");

    let second = account::signup(
        &pool,
        &name,
        &format!("other-{}", email),
        "hunter2secret",
        None,
    )
    .await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = $1")
        .bind(&name)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[actix_rt::test]
async fn authenticate_accepts_only_correct_credentials() {
    let pool = pool().await;
    let user = make_user(&pool, "auth").await;

    // Stored hash is never the plaintext.
    assert_ne!(user.password_hash, "hunter2secret");

    let ok = account::authenticate(&pool, &user.username, "hunter2secret")
        .await
        .unwrap();
    assert_eq!(ok.map(|u| u.id), Some(user.id));

    let wrong_password = account::authenticate(&pool, &user.username, "wrong-password")
        .await
        .unwrap();
    assert!(wrong_password.is_none());

    let unknown_user = account::authenticate(&pool, "no-such-user", "hunter2secret")
        .await
        .unwrap();
    assert!(unknown_user.is_none());
}

#[actix_rt::test]
async fn follow_is_directional() {
    let pool = pool().await;
    let a = make_user(&pool, "follow-a").await;
    let b = make_user(&pool, "follow-b").await;

    follow_repo::follow(&pool, a.id, b.id).await.unwrap();

    assert!(follow_repo::is_following(&pool, a.id, b.id).await.unwrap());
    assert!(!follow_repo::is_following(&pool, b.id, a.id).await.unwrap());
    assert!(follow_repo::is_followed_by(&pool, b.id, a.id).await.unwrap());

    // Repeating the follow is harmless; the edge stays unique.
    follow_repo::follow(&pool, a.id, b.id).await.unwrap();
    let edges: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM follows WHERE follower_id = $1 AND followed_id = $2",
    )
    .bind(a.id)
    .bind(b.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(edges, 1);
}

#[actix_rt::test]
async fn self_follow_is_rejected() {
    let pool = pool().await;
    let a = make_user(&pool, "selfie").await;

    let result = follow_repo::follow(&pool, a.id, a.id).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
}

#[actix_rt::test]
async fn unfollowing_a_missing_edge_is_not_found() {
    let pool = pool().await;
    let a = make_user(&pool, "unfollow-a").await;
    let b = make_user(&pool, "unfollow-b").await;

    let result = follow_repo::unfollow(&pool, a.id, b.id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    follow_repo::follow(&pool, a.id, b.id).await.unwrap();
    follow_repo::unfollow(&pool, a.id, b.id).await.unwrap();
    assert!(!follow_repo::is_following(&pool, a.id, b.id).await.unwrap());
}

#[actix_rt::test]
async fn toggling_a_like_twice_is_identity() {
    let pool = pool().await;
    let author = make_user(&pool, "liked").await;
    let liker = make_user(&pool, "liker").await;
    let message = message_repo::create_message(&pool, author.id, "warble warble")
        .await
        .unwrap();

    assert!(like_repo::toggle(&pool, liker.id, message.id).await.unwrap());
    assert!(like_repo::has_liked(&pool, liker.id, message.id).await.unwrap());

    assert!(!like_repo::toggle(&pool, liker.id, message.id).await.unwrap());
    assert!(!like_repo::has_liked(&pool, liker.id, message.id).await.unwrap());
}

#[actix_rt::test]
async fn home_feed_contains_own_and_followed_messages_only() {
    let pool = pool().await;
    let me = make_user(&pool, "feed-me").await;
    let friend = make_user(&pool, "feed-friend").await;
    let stranger = make_user(&pool, "feed-stranger").await;

    // No follows, no messages: empty feed.
    let feed = message_repo::home_feed(&pool, me.id, 100).await.unwrap();
    assert!(feed.is_empty());

    let mine = message_repo::create_message(&pool, me.id, "my own message")
        .await
        .unwrap();
    let feed = message_repo::home_feed(&pool, me.id, 100).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].id, mine.id);

    let friendly = message_repo::create_message(&pool, friend.id, "friendly message")
        .await
        .unwrap();
    message_repo::create_message(&pool, stranger.id, "stranger message")
        .await
        .unwrap();

    follow_repo::follow(&pool, me.id, friend.id).await.unwrap();

    let feed = message_repo::home_feed(&pool, me.id, 100).await.unwrap();
    let authors: Vec<Uuid> = feed.iter().map(|m| m.user_id).collect();
    assert!(authors.contains(&me.id));
    assert!(authors.contains(&friend.id));
    assert!(!authors.contains(&stranger.id));

    // Newest first, across authors.
    assert!(feed
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));
    assert_eq!(feed[0].id, friendly.id);

    // The limit caps the result at the newest entries.
    let capped = message_repo::home_feed(&pool, me.id, 1).await.unwrap();
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].id, friendly.id);
}

#[actix_rt::test]
async fn deleting_a_user_cascades_to_their_messages() {
    let pool = pool().await;
    let user = make_user(&pool, "cascade").await;
    let message = message_repo::create_message(&pool, user.id, "soon to vanish")
        .await
        .unwrap();

    user_repo::delete_user(&pool, user.id).await.unwrap();

    assert!(user_repo::find_by_id(&pool, user.id).await.unwrap().is_none());
    assert!(message_repo::find_by_id(&pool, message.id)
        .await
        .unwrap()
        .is_none());
    assert!(message_repo::list_by_user(&pool, user.id)
        .await
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------
// HTTP-surface tests
// ---------------------------------------------------------------------

fn session_key() -> SessionKey {
    SessionKey::new("integration-test-secret")
}

macro_rules! test_app {
    ($pool:expr, $key:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new($key.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_rt::test]
async fn non_owner_cannot_delete_a_message() {
    let pool = pool().await;
    let key = session_key();
    let author = make_user(&pool, "owner").await;
    let intruder = make_user(&pool, "intruder").await;
    let message = message_repo::create_message(&pool, author.id, "keep your hands off")
        .await
        .unwrap();

    let app = test_app!(pool, key);

    let req = test::TestRequest::post()
        .uri(&format!("/messages/{}/delete", message.id))
        .cookie(key.issue(intruder.id))
        .set_form(&[("csrf_token", key.csrf_token(intruder.id))])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // The message survives the rejected attempt.
    assert!(message_repo::find_by_id(&pool, message.id)
        .await
        .unwrap()
        .is_some());

    // The author can delete it.
    let req = test::TestRequest::post()
        .uri(&format!("/messages/{}/delete", message.id))
        .cookie(key.issue(author.id))
        .set_form(&[("csrf_token", key.csrf_token(author.id))])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
}

#[actix_rt::test]
async fn like_api_rejects_own_message_and_toggles_others() {
    let pool = pool().await;
    let key = session_key();
    let author = make_user(&pool, "api-author").await;
    let liker = make_user(&pool, "api-liker").await;
    let message = message_repo::create_message(&pool, author.id, "like me maybe")
        .await
        .unwrap();

    let app = test_app!(pool, key);
    let uri = format!("/api/messages/{}/like", message.id);

    // Anonymous callers are rejected outright.
    let res = test::call_service(&app, test::TestRequest::post().uri(&uri).to_request()).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Liking your own message is a rejected request on every surface.
    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(key.issue(author.id))
        .insert_header(("X-CSRF-Token", key.csrf_token(author.id)))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Someone else toggles it on, then off.
    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(key.issue(liker.id))
        .insert_header(("X-CSRF-Token", key.csrf_token(liker.id)))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["favorited"], serde_json::json!(true));

    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(key.issue(liker.id))
        .insert_header(("X-CSRF-Token", key.csrf_token(liker.id)))
        .to_request();
    let res = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["favorited"], serde_json::json!(false));
}

#[actix_rt::test]
async fn logout_requires_a_valid_csrf_token() {
    let pool = pool().await;
    let key = session_key();
    let user = make_user(&pool, "csrf").await;

    let app = test_app!(pool, key);

    let req = test::TestRequest::post()
        .uri("/logout")
        .cookie(key.issue(user.id))
        .set_form(&[("csrf_token", "forged".to_string())])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/logout")
        .cookie(key.issue(user.id))
        .set_form(&[("csrf_token", key.csrf_token(user.id))])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
}

#[actix_rt::test]
async fn profile_edit_conflict_rerenders_with_409() {
    let pool = pool().await;
    let key = session_key();
    let existing = make_user(&pool, "prof-taken").await;
    let editor = make_user(&pool, "prof-editor").await;

    let app = test_app!(pool, key);

    let token = key.csrf_token(editor.id);
    let req = test::TestRequest::post()
        .uri("/users/profile")
        .cookie(key.issue(editor.id))
        .set_form(&[
            ("username", existing.username.as_str()),
            ("email", editor.email.as_str()),
            ("password", "hunter2secret"),
            ("csrf_token", token.as_str()),
        ])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let body = test::read_body(res).await;
    let html = std::str::from_utf8(&body).unwrap();
    assert!(html.contains("Username or email already taken"));
}

#[actix_rt::test]
async fn blank_message_rerenders_with_400() {
    let pool = pool().await;
    let key = session_key();
    let user = make_user(&pool, "blank").await;

    let app = test_app!(pool, key);

    let token = key.csrf_token(user.id);
    let req = test::TestRequest::post()
        .uri("/messages/new")
        .cookie(key.issue(user.id))
        .set_form(&[("text", "   "), ("csrf_token", token.as_str())])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let count = message_repo::count_by_user(&pool, user.id).await.unwrap();
    assert_eq!(count, 0);
}

#[actix_rt::test]
async fn signup_conflict_rerenders_the_form() {
    let pool = pool().await;
    let key = session_key();
    let existing = make_user(&pool, "taken").await;

    let app = test_app!(pool, key);

    let req = test::TestRequest::post()
        .uri("/signup")
        .set_form(&[
            ("username", existing.username.as_str()),
            ("email", "fresh@example.com"),
            ("password", "hunter2secret"),
            ("image_url", ""),
        ])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let body = test::read_body(res).await;
    let html = std::str::from_utf8(&body).unwrap();
    assert!(html.contains("Username or email already taken"));
}
