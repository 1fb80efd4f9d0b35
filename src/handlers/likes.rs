/// The JSON like-toggle endpoint.
use actix_web::{web, HttpRequest, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{like_repo, message_repo};
use crate::error::{AppError, Result};
use crate::handlers::require_csrf;
use crate::middleware::UserId;
use crate::security::SessionKey;

/// POST /api/messages/{id}/like
///
/// Toggles the caller's like on a message and reports the resulting
/// state as `{"favorited": bool}`. Liking your own message is rejected
/// on every surface, and the CSRF token travels in the `X-CSRF-Token`
/// header since there is no form body.
pub async fn toggle_like(
    req: HttpRequest,
    me: UserId,
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let token = req
        .headers()
        .get("X-CSRF-Token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    require_csrf(&key, me.0, token)?;

    let id = path.into_inner();
    let message = message_repo::find_by_id(pool.get_ref(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Message {}", id)))?;

    if message.user_id == me.0 {
        return Err(AppError::BadRequest(
            "You cannot like your own message".to_string(),
        ));
    }

    let favorited = like_repo::toggle(pool.get_ref(), me.0, message.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "favorited": favorited })))
}
