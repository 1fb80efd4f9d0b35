/// Like repository.
///
/// A like is a `(user, message)` pair in an association table; repeating
/// the action removes the pair. The toggle runs inside one transaction so
/// concurrent toggles cannot leave a half-applied state.
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::MessageWithAuthor;

/// Toggle a like. Returns true when the message is now liked, false when
/// the like was removed.
pub async fn toggle(pool: &PgPool, user_id: Uuid, message_id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = $1 AND message_id = $2)",
    )
    .bind(user_id)
    .bind(message_id)
    .fetch_one(&mut *tx)
    .await?;

    let liked = if existing {
        sqlx::query("DELETE FROM likes WHERE user_id = $1 AND message_id = $2")
            .bind(user_id)
            .bind(message_id)
            .execute(&mut *tx)
            .await?;
        false
    } else {
        sqlx::query("INSERT INTO likes (user_id, message_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(message_id)
            .execute(&mut *tx)
            .await?;
        true
    };

    tx.commit().await?;

    Ok(liked)
}

pub async fn has_liked(pool: &PgPool, user_id: Uuid, message_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = $1 AND message_id = $2)",
    )
    .bind(user_id)
    .bind(message_id)
    .fetch_one(pool)
    .await
}

/// Ids of every message the user has liked. Used to mark like buttons in
/// feeds without a query per row.
pub async fn liked_message_ids(pool: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>("SELECT message_id FROM likes WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

/// Messages a user has liked, most recently liked first.
pub async fn liked_messages(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<MessageWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, MessageWithAuthor>(
        "SELECT messages.id, messages.user_id, messages.text, messages.created_at,
                users.username, users.image_url
         FROM messages
         JOIN likes ON likes.message_id = messages.id
         JOIN users ON users.id = messages.user_id
         WHERE likes.user_id = $1
         ORDER BY likes.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn count_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}
