/// Follow-graph repository.
///
/// Edges live in the `follows` association table with a composite primary
/// key, so a duplicate follow is impossible at the store level and
/// `follow` can be idempotent. Removing an edge that does not exist is a
/// defined error, not a silent no-op.
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::User;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, image_url, header_image_url, bio, location, created_at";

/// Create a follow edge from follower to followed.
pub async fn follow(pool: &PgPool, follower_id: Uuid, followed_id: Uuid) -> Result<()> {
    if follower_id == followed_id {
        return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
    }

    let result = sqlx::query(
        "INSERT INTO follows (follower_id, followed_id)
         VALUES ($1, $2)
         ON CONFLICT (follower_id, followed_id) DO NOTHING",
    )
    .bind(follower_id)
    .bind(followed_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        tracing::debug!(%follower_id, %followed_id, "Follow edge already exists");
    }

    Ok(())
}

/// Remove a follow edge. Removing an edge that is not there signals
/// NotFound so callers can surface it instead of pretending success.
pub async fn unfollow(pool: &PgPool, follower_id: Uuid, followed_id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followed_id = $2")
        .bind(follower_id)
        .bind(followed_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Follow relationship".to_string()));
    }

    Ok(())
}

/// Does `follower_id` follow `followed_id`?
pub async fn is_following(pool: &PgPool, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2)",
    )
    .bind(follower_id)
    .bind(followed_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Is `user_id` followed by `other_id`?
pub async fn is_followed_by(pool: &PgPool, user_id: Uuid, other_id: Uuid) -> Result<bool> {
    is_following(pool, other_id, user_id).await
}

/// Users that `user_id` follows, most recent first.
pub async fn following(pool: &PgPool, user_id: Uuid) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users
         JOIN follows ON follows.followed_id = users.id
         WHERE follows.follower_id = $1
         ORDER BY follows.created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Users that follow `user_id`, most recent first.
pub async fn followers(pool: &PgPool, user_id: Uuid) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users
         JOIN follows ON follows.follower_id = users.id
         WHERE follows.followed_id = $1
         ORDER BY follows.created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Ids of everyone `user_id` follows. Used to mark follow buttons on
/// user lists without a query per row.
pub async fn following_ids(pool: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>> {
    let ids =
        sqlx::query_scalar::<_, Uuid>("SELECT followed_id FROM follows WHERE follower_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    Ok(ids)
}

pub async fn following_count(pool: &PgPool, user_id: Uuid) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM follows WHERE follower_id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

pub async fn followers_count(pool: &PgPool, user_id: Uuid) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM follows WHERE followed_id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
