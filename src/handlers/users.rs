/// User pages: listing/search, profiles, relationship lists, profile
/// editing, follow/unfollow and account deletion.
use actix_web::{http::StatusCode, web, HttpResponse};
use minijinja::context;
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;
use validator::Validate;

use crate::db::{follow_repo, like_repo, message_repo, user_repo};
use crate::error::{is_unique_violation, AppError, Result};
use crate::handlers::{
    current_user, none_if_empty, require_csrf, see_other, validation_message, CsrfForm,
    CurrentUserView, MessageView, UserCardView,
};
use crate::middleware::UserId;
use crate::models::User;
use crate::security::{password, SessionKey};
use crate::templates;
use crate::validators::validate_username;

#[derive(Debug, Deserialize)]
pub struct UserSearchQuery {
    pub q: Option<String>,
}

/// GET /users?q=
pub async fn list_users(
    me: UserId,
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
    query: web::Query<UserSearchQuery>,
) -> Result<HttpResponse> {
    let me = current_user(pool.get_ref(), me).await?;
    let users = user_repo::list_users(pool.get_ref(), query.q.as_deref()).await?;
    let following: HashSet<_> = follow_repo::following_ids(pool.get_ref(), me.id)
        .await?
        .into_iter()
        .collect();

    let cards: Vec<UserCardView> = users
        .into_iter()
        .map(|u| {
            let followed = following.contains(&u.id);
            UserCardView::new(u, followed)
        })
        .collect();

    templates::html_response(
        "users/index.html",
        context! {
            current_user => CurrentUserView::from(&me),
            csrf_token => key.csrf_token(me.id),
            query => query.q.as_deref().unwrap_or(""),
            users => cards,
        },
    )
}

async fn load_target(pool: &PgPool, id: Uuid) -> Result<User> {
    user_repo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))
}

/// GET /users/{id}
pub async fn show_user(
    me: UserId,
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let me = current_user(pool.get_ref(), me).await?;
    let profile = load_target(pool.get_ref(), path.into_inner()).await?;

    let messages = message_repo::list_by_user(pool.get_ref(), profile.id).await?;
    let liked: HashSet<_> = like_repo::liked_message_ids(pool.get_ref(), me.id)
        .await?
        .into_iter()
        .collect();
    let message_views: Vec<MessageView> = messages
        .into_iter()
        .map(|m| {
            let is_liked = liked.contains(&m.id);
            MessageView::new(m, is_liked)
        })
        .collect();

    let followed_by_me = follow_repo::is_following(pool.get_ref(), me.id, profile.id).await?;
    let message_count = message_repo::count_by_user(pool.get_ref(), profile.id).await?;
    let following = follow_repo::following_count(pool.get_ref(), profile.id).await?;
    let followers = follow_repo::followers_count(pool.get_ref(), profile.id).await?;
    let likes = like_repo::count_by_user(pool.get_ref(), profile.id).await?;

    templates::html_response(
        "users/show.html",
        context! {
            current_user => CurrentUserView::from(&me),
            csrf_token => key.csrf_token(me.id),
            profile => context! {
                id => profile.id,
                username => &profile.username,
                image_url => &profile.image_url,
                header_image_url => &profile.header_image_url,
                bio => &profile.bio,
                location => &profile.location,
            },
            stats => context! {
                messages => message_count,
                following => following,
                followers => followers,
                likes => likes,
            },
            followed_by_me => followed_by_me,
            messages => message_views,
        },
    )
}

async fn relationship_page(
    pool: &PgPool,
    key: &SessionKey,
    me: User,
    profile_id: Uuid,
    template: &str,
) -> Result<HttpResponse> {
    let profile = load_target(pool, profile_id).await?;

    let users = if template == "users/following.html" {
        follow_repo::following(pool, profile.id).await?
    } else {
        follow_repo::followers(pool, profile.id).await?
    };

    let following: HashSet<_> = follow_repo::following_ids(pool, me.id)
        .await?
        .into_iter()
        .collect();
    let cards: Vec<UserCardView> = users
        .into_iter()
        .map(|u| {
            let followed = following.contains(&u.id);
            UserCardView::new(u, followed)
        })
        .collect();

    templates::html_response(
        template,
        context! {
            current_user => CurrentUserView::from(&me),
            csrf_token => key.csrf_token(me.id),
            profile => context! { id => profile.id, username => &profile.username },
            users => cards,
        },
    )
}

/// GET /users/{id}/following
pub async fn show_following(
    me: UserId,
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let me = current_user(pool.get_ref(), me).await?;
    relationship_page(
        pool.get_ref(),
        &key,
        me,
        path.into_inner(),
        "users/following.html",
    )
    .await
}

/// GET /users/{id}/followers
pub async fn show_followers(
    me: UserId,
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let me = current_user(pool.get_ref(), me).await?;
    relationship_page(
        pool.get_ref(),
        &key,
        me,
        path.into_inner(),
        "users/followers.html",
    )
    .await
}

/// GET /users/{id}/likes
pub async fn show_likes(
    me: UserId,
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let me = current_user(pool.get_ref(), me).await?;
    let profile = load_target(pool.get_ref(), path.into_inner()).await?;

    let liked_by_profile = like_repo::liked_messages(pool.get_ref(), profile.id).await?;
    let my_likes: HashSet<_> = like_repo::liked_message_ids(pool.get_ref(), me.id)
        .await?
        .into_iter()
        .collect();
    let messages: Vec<MessageView> = liked_by_profile
        .into_iter()
        .map(|m| {
            let is_liked = my_likes.contains(&m.id);
            MessageView::new(m, is_liked)
        })
        .collect();

    templates::html_response(
        "users/likes.html",
        context! {
            current_user => CurrentUserView::from(&me),
            csrf_token => key.csrf_token(me.id),
            profile => context! { id => profile.id, username => &profile.username },
            messages => messages,
        },
    )
}

/// POST /users/follow/{id}
pub async fn follow_user(
    me: UserId,
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
    path: web::Path<Uuid>,
    form: web::Form<CsrfForm>,
) -> Result<HttpResponse> {
    require_csrf(&key, me.0, &form.csrf_token)?;
    let target = load_target(pool.get_ref(), path.into_inner()).await?;

    follow_repo::follow(pool.get_ref(), me.0, target.id).await?;

    Ok(see_other(&format!("/users/{}/following", me.0)))
}

/// POST /users/stop-following/{id}
pub async fn unfollow_user(
    me: UserId,
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
    path: web::Path<Uuid>,
    form: web::Form<CsrfForm>,
) -> Result<HttpResponse> {
    require_csrf(&key, me.0, &form.csrf_token)?;
    let target = load_target(pool.get_ref(), path.into_inner()).await?;

    follow_repo::unfollow(pool.get_ref(), me.0, target.id).await?;

    Ok(see_other(&format!("/users/{}/following", me.0)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileForm {
    #[validate(
        length(min = 3, max = 32),
        custom(function = validate_username)
    )]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[serde(default)]
    pub image_url: String,

    #[serde(default)]
    pub header_image_url: String,

    #[validate(length(max = 500))]
    #[serde(default)]
    pub bio: String,

    #[validate(length(max = 100))]
    #[serde(default)]
    pub location: String,

    /// Re-entered password confirming the change.
    pub password: String,

    pub csrf_token: String,
}

fn edit_page(
    status: StatusCode,
    me: &User,
    key: &SessionKey,
    form: &ProfileForm,
    error: Option<&str>,
) -> Result<HttpResponse> {
    templates::html_response_with(
        status,
        "users/edit.html",
        context! {
            current_user => CurrentUserView::from(me),
            csrf_token => key.csrf_token(me.id),
            error => error,
            form => context! {
                username => &form.username,
                email => &form.email,
                image_url => &form.image_url,
                header_image_url => &form.header_image_url,
                bio => &form.bio,
                location => &form.location,
            },
        },
    )
}

/// GET /users/profile
pub async fn show_profile(
    me: UserId,
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
) -> Result<HttpResponse> {
    let me = current_user(pool.get_ref(), me).await?;

    let form = ProfileForm {
        username: me.username.clone(),
        email: me.email.clone(),
        image_url: me.image_url.clone(),
        header_image_url: me.header_image_url.clone(),
        bio: me.bio.clone().unwrap_or_default(),
        location: me.location.clone().unwrap_or_default(),
        password: String::new(),
        csrf_token: String::new(),
    };

    edit_page(StatusCode::OK, &me, &key, &form, None)
}

/// POST /users/profile
pub async fn update_profile(
    me: UserId,
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
    form: web::Form<ProfileForm>,
) -> Result<HttpResponse> {
    let me = current_user(pool.get_ref(), me).await?;
    require_csrf(&key, me.id, &form.csrf_token)?;

    if let Err(errors) = form.validate() {
        let message = validation_message(&errors);
        return edit_page(StatusCode::BAD_REQUEST, &me, &key, &form, Some(&message));
    }

    // Changes must be confirmed with the account password.
    if !password::verify_password(&form.password, &me.password_hash) {
        return edit_page(
            StatusCode::BAD_REQUEST,
            &me,
            &key,
            &form,
            Some("Incorrect password"),
        );
    }

    let result = user_repo::update_profile(
        pool.get_ref(),
        me.id,
        &form.username,
        &form.email,
        none_if_empty(&form.image_url),
        none_if_empty(&form.header_image_url),
        none_if_empty(&form.bio),
        none_if_empty(&form.location),
    )
    .await;

    match result {
        Ok(updated) => Ok(see_other(&format!("/users/{}", updated.id))),
        Err(e) if is_unique_violation(&e) => edit_page(
            StatusCode::CONFLICT,
            &me,
            &key,
            &form,
            Some("Username or email already taken"),
        ),
        Err(e) => Err(AppError::Database(e)),
    }
}

/// POST /users/delete
///
/// Deletes the account; the store cascades to the user's messages,
/// follow edges and likes. The session is cleared before redirecting to
/// the signup page.
pub async fn delete_account(
    me: UserId,
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
    form: web::Form<CsrfForm>,
) -> Result<HttpResponse> {
    require_csrf(&key, me.0, &form.csrf_token)?;

    user_repo::delete_user(pool.get_ref(), me.0).await?;
    tracing::info!(user_id = %me.0, "Account deleted");

    let mut response = see_other("/signup");
    response
        .add_cookie(&key.clear())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}
