/// Message repository.
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Message, MessageWithAuthor};

const JOINED_COLUMNS: &str = "messages.id, messages.user_id, messages.text, \
     messages.created_at, users.username, users.image_url";

/// Insert a message with a server-assigned timestamp.
pub async fn create_message(
    pool: &PgPool,
    user_id: Uuid,
    text: &str,
) -> Result<Message, sqlx::Error> {
    let id = Uuid::new_v4();

    sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (id, user_id, text)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, text, created_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(text)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<MessageWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, MessageWithAuthor>(&format!(
        "SELECT {JOINED_COLUMNS} FROM messages
         JOIN users ON users.id = messages.user_id
         WHERE messages.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_message(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM messages WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Messages authored by one user, newest first.
pub async fn list_by_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<MessageWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, MessageWithAuthor>(&format!(
        "SELECT {JOINED_COLUMNS} FROM messages
         JOIN users ON users.id = messages.user_id
         WHERE messages.user_id = $1
         ORDER BY messages.created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn count_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// The home feed: the most recent messages authored by the user or by
/// anyone the user follows, newest first.
pub async fn home_feed(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<MessageWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, MessageWithAuthor>(&format!(
        "SELECT {JOINED_COLUMNS} FROM messages
         JOIN users ON users.id = messages.user_id
         WHERE messages.user_id = $1
            OR messages.user_id IN
               (SELECT followed_id FROM follows WHERE follower_id = $1)
         ORDER BY messages.created_at DESC
         LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}
