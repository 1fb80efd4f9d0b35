pub mod auth;
pub mod home;
pub mod likes;
pub mod messages;
pub mod users;

use actix_web::{http::header, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::models::{MessageWithAuthor, User};
use crate::security::SessionKey;

/// The logged-in user as exposed to templates (no password hash).
#[derive(Debug, Serialize)]
pub struct CurrentUserView {
    pub id: Uuid,
    pub username: String,
    pub image_url: String,
}

impl From<&User> for CurrentUserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            image_url: user.image_url.clone(),
        }
    }
}

/// One feed/list entry, timestamp pre-formatted for display.
#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub timestamp: String,
    pub username: String,
    pub image_url: String,
    pub liked: bool,
}

impl MessageView {
    pub fn new(message: MessageWithAuthor, liked: bool) -> Self {
        Self {
            id: message.id,
            user_id: message.user_id,
            text: message.text,
            timestamp: message
                .created_at
                .format("%d %B %Y at %H:%M")
                .to_string(),
            username: message.username,
            image_url: message.image_url,
            liked,
        }
    }
}

/// One entry on a user list, with the requester's follow state.
#[derive(Debug, Serialize)]
pub struct UserCardView {
    pub id: Uuid,
    pub username: String,
    pub image_url: String,
    pub bio: Option<String>,
    pub followed_by_me: bool,
}

impl UserCardView {
    pub fn new(user: User, followed_by_me: bool) -> Self {
        Self {
            id: user.id,
            username: user.username,
            image_url: user.image_url,
            bio: user.bio,
            followed_by_me,
        }
    }
}

/// Form carrying only the anti-forgery token (logout, follow, delete).
#[derive(Debug, Deserialize)]
pub struct CsrfForm {
    pub csrf_token: String,
}

/// Load the full user row behind a session id. A session naming a user
/// that no longer exists (deleted account, stale cookie) is treated as
/// unauthenticated.
pub async fn current_user(pool: &PgPool, user_id: UserId) -> Result<User> {
    user_repo::find_by_id(pool, user_id.0)
        .await?
        .ok_or_else(|| AppError::Authentication("Login required".to_string()))
}

/// Reject the request unless the submitted CSRF token matches.
pub fn require_csrf(key: &SessionKey, user_id: Uuid, token: &str) -> Result<()> {
    if key.verify_csrf(user_id, token) {
        Ok(())
    } else {
        Err(AppError::Authentication("Invalid CSRF token".to_string()))
    }
}

/// 303 redirect used after successful form posts.
pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}

/// HTML forms post empty strings for fields the user left blank.
pub fn none_if_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// First human-readable message out of a validation failure, for inline
/// form errors.
pub fn validation_message(errors: &validator::ValidationErrors) -> String {
    for (field, field_errors) in errors.field_errors() {
        if let Some(first) = field_errors.first() {
            return match first.code.as_ref() {
                "email" => "That doesn't look like a valid e-mail address".to_string(),
                "length" => format!("{} has an invalid length", field),
                "username_start" | "username_chars" => {
                    "Usernames may only contain letters, digits, '_' and '-'".to_string()
                }
                "blank" => format!("{} cannot be blank", field),
                other => format!("{} is invalid ({})", field, other),
            };
        }
    }
    "Invalid input".to_string()
}
