/// Account service: signup and credential verification.
use sqlx::PgPool;

use crate::db::user_repo;
use crate::error::{is_unique_violation, AppError, Result};
use crate::models::User;
use crate::security::password;

/// Create a user with a hashed password. A duplicate username or email
/// becomes `AppError::Conflict`; the failed insert leaves no partial row.
pub async fn signup(
    pool: &PgPool,
    username: &str,
    email: &str,
    plain_password: &str,
    image_url: Option<&str>,
) -> Result<User> {
    let password_hash = password::hash_password(plain_password)?;

    user_repo::create_user(pool, username, email, &password_hash, image_url)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Username or email already taken".to_string())
            } else {
                AppError::Database(e)
            }
        })
}

/// Verify credentials. Returns `Ok(None)` for an unknown username or a
/// wrong password alike; bad credentials are a result, not an error.
///
/// The password is checked against a dummy hash when the username is
/// unknown so the two failure cases take comparable time.
pub async fn authenticate(
    pool: &PgPool,
    username: &str,
    plain_password: &str,
) -> Result<Option<User>> {
    match user_repo::find_by_username(pool, username).await? {
        Some(user) => {
            if password::verify_password(plain_password, &user.password_hash) {
                Ok(Some(user))
            } else {
                Ok(None)
            }
        }
        None => {
            let _ = password::verify_password(plain_password, DUMMY_HASH);
            Ok(None)
        }
    }
}

// Argon2id hash of an unguessable throwaway value.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$tFNpZXJyYU5ldmFkYQ$kJ3ZSsM0poCoYwpghIfbByBWP1DCmBOkLXGkxt9dZWI";
