/// Homepage: the feed for logged-in users, a landing page for everyone
/// else.
use actix_web::{web, HttpRequest, HttpResponse};
use minijinja::context;
use sqlx::PgPool;
use std::collections::HashSet;

use crate::db::{like_repo, message_repo, user_repo};
use crate::error::Result;
use crate::handlers::{CurrentUserView, MessageView};
use crate::middleware::maybe_user_id;
use crate::security::SessionKey;
use crate::templates;
use crate::HOME_FEED_LIMIT;

/// GET / and POST /
pub async fn homepage(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
) -> Result<HttpResponse> {
    let user = match maybe_user_id(&req, &key) {
        Some(id) => user_repo::find_by_id(pool.get_ref(), id).await?,
        None => None,
    };

    let Some(user) = user else {
        return templates::html_response("home_anon.html", context! {});
    };

    let feed = message_repo::home_feed(pool.get_ref(), user.id, HOME_FEED_LIMIT).await?;
    let liked: HashSet<_> = like_repo::liked_message_ids(pool.get_ref(), user.id)
        .await?
        .into_iter()
        .collect();

    let messages: Vec<MessageView> = feed
        .into_iter()
        .map(|m| {
            let is_liked = liked.contains(&m.id);
            MessageView::new(m, is_liked)
        })
        .collect();

    templates::html_response(
        "home.html",
        context! {
            current_user => CurrentUserView::from(&user),
            csrf_token => key.csrf_token(user.id),
            messages => messages,
        },
    )
}
