/// User repository - all database operations on the users table.
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, image_url, header_image_url, bio, location, created_at";

/// Insert a new user. A duplicate username or email surfaces as a
/// unique-violation database error; the insert leaves no partial row.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    image_url: Option<&str>,
) -> Result<User, sqlx::Error> {
    let id = Uuid::new_v4();

    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, username, email, password_hash, image_url)
        VALUES ($1, $2, $3, $4, COALESCE($5, '/static/images/default-pic.png'))
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(username)
    .bind(email.to_lowercase())
    .bind(password_hash)
    .bind(image_url)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

/// List users, optionally filtered by a case-insensitive username
/// substring (the `?q=` search box).
pub async fn list_users(pool: &PgPool, search: Option<&str>) -> Result<Vec<User>, sqlx::Error> {
    match search {
        Some(q) if !q.is_empty() => {
            let pattern = format!("%{}%", q.replace('%', "\\%").replace('_', "\\_"));
            sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE username ILIKE $1 ORDER BY username"
            ))
            .bind(pattern)
            .fetch_all(pool)
            .await
        }
        _ => {
            sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY username"
            ))
            .fetch_all(pool)
            .await
        }
    }
}

/// Update a user's editable profile fields. Username and email keep their
/// unique constraints; a conflict rolls the statement back whole.
#[allow(clippy::too_many_arguments)]
pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    username: &str,
    email: &str,
    image_url: Option<&str>,
    header_image_url: Option<&str>,
    bio: Option<&str>,
    location: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET username = $2,
            email = $3,
            image_url = COALESCE($4, '/static/images/default-pic.png'),
            header_image_url = COALESCE($5, '/static/images/warbler-hero.jpg'),
            bio = $6,
            location = $7
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(username)
    .bind(email.to_lowercase())
    .bind(image_url)
    .bind(header_image_url)
    .bind(bio)
    .bind(location)
    .fetch_one(pool)
    .await
}

/// Delete a user. Foreign keys cascade, removing the user's messages,
/// follow edges in both directions, and likes in the same transaction.
pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
