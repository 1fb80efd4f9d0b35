/// Message creation, detail and deletion.
use actix_web::{http::StatusCode, web, HttpResponse};
use minijinja::context;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::db::{like_repo, message_repo};
use crate::error::{AppError, Result};
use crate::handlers::{
    current_user, require_csrf, see_other, validation_message, CsrfForm, CurrentUserView,
    MessageView,
};
use crate::middleware::UserId;
use crate::models::User;
use crate::security::SessionKey;
use crate::templates;
use crate::validators::not_blank;

#[derive(Debug, Deserialize, Validate)]
pub struct MessageForm {
    #[validate(length(min = 1, max = 140), custom(function = not_blank))]
    pub text: String,

    pub csrf_token: String,
}

fn new_message_page(
    status: StatusCode,
    me: &User,
    key: &SessionKey,
    text: &str,
    error: Option<&str>,
) -> Result<HttpResponse> {
    templates::html_response_with(
        status,
        "messages/new.html",
        context! {
            current_user => CurrentUserView::from(me),
            csrf_token => key.csrf_token(me.id),
            error => error,
            form => context! { text => text },
        },
    )
}

/// GET /messages/new
pub async fn show_new_message(
    me: UserId,
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
) -> Result<HttpResponse> {
    let me = current_user(pool.get_ref(), me).await?;
    new_message_page(StatusCode::OK, &me, &key, "", None)
}

/// POST /messages/new
pub async fn create_message(
    me: UserId,
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
    form: web::Form<MessageForm>,
) -> Result<HttpResponse> {
    let me = current_user(pool.get_ref(), me).await?;
    require_csrf(&key, me.id, &form.csrf_token)?;

    if let Err(errors) = form.validate() {
        let message = validation_message(&errors);
        return new_message_page(
            StatusCode::BAD_REQUEST,
            &me,
            &key,
            &form.text,
            Some(&message),
        );
    }

    let message = message_repo::create_message(pool.get_ref(), me.id, form.text.trim()).await?;
    tracing::debug!(message_id = %message.id, user_id = %me.id, "Message created");

    Ok(see_other(&format!("/users/{}", me.id)))
}

/// GET /messages/{id}
pub async fn show_message(
    me: UserId,
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let me = current_user(pool.get_ref(), me).await?;
    let id = path.into_inner();

    let message = message_repo::find_by_id(pool.get_ref(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Message {}", id)))?;

    let liked = like_repo::has_liked(pool.get_ref(), me.id, message.id).await?;

    templates::html_response(
        "messages/show.html",
        context! {
            current_user => CurrentUserView::from(&me),
            csrf_token => key.csrf_token(me.id),
            message => MessageView::new(message, liked),
            liked => liked,
        },
    )
}

/// POST /messages/{id}/delete
///
/// Only the author may delete a message; anyone else gets an
/// authorization rejection and the message stays put.
pub async fn delete_message(
    me: UserId,
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
    path: web::Path<Uuid>,
    form: web::Form<CsrfForm>,
) -> Result<HttpResponse> {
    require_csrf(&key, me.0, &form.csrf_token)?;
    let id = path.into_inner();

    let message = message_repo::find_by_id(pool.get_ref(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Message {}", id)))?;

    if message.user_id != me.0 {
        return Err(AppError::Authorization(
            "Only the author can delete a message".to_string(),
        ));
    }

    message_repo::delete_message(pool.get_ref(), id).await?;

    Ok(see_other(&format!("/users/{}", me.0)))
}
