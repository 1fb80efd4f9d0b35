/// Signup, login and logout.
use actix_web::{web, HttpResponse};
use minijinja::context;
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::handlers::{none_if_empty, require_csrf, see_other, validation_message, CsrfForm};
use crate::middleware::UserId;
use crate::security::SessionKey;
use crate::services::account;
use crate::templates;
use crate::validators::validate_username;

#[derive(Debug, Deserialize, Validate)]
pub struct SignupForm {
    #[validate(
        length(min = 3, max = 32),
        custom(function = validate_username)
    )]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

fn signup_page(form: &SignupForm, error: Option<&str>) -> Result<String> {
    templates::render(
        "signup.html",
        context! {
            error => error,
            form => context! {
                username => &form.username,
                email => &form.email,
                image_url => &form.image_url,
            },
        },
    )
}

/// GET /signup
///
/// Visiting the signup page drops any existing session.
pub async fn show_signup(key: web::Data<SessionKey>) -> Result<HttpResponse> {
    let empty = SignupForm {
        username: String::new(),
        email: String::new(),
        password: String::new(),
        image_url: String::new(),
    };

    Ok(HttpResponse::Ok()
        .cookie(key.clear())
        .content_type("text/html; charset=utf-8")
        .body(signup_page(&empty, None)?))
}

/// POST /signup
pub async fn signup(
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
    form: web::Form<SignupForm>,
) -> Result<HttpResponse> {
    if let Err(errors) = form.validate() {
        let message = validation_message(&errors);
        return Ok(HttpResponse::BadRequest()
            .content_type("text/html; charset=utf-8")
            .body(signup_page(&form, Some(&message))?));
    }

    let user = match account::signup(
        pool.get_ref(),
        &form.username,
        &form.email,
        &form.password,
        none_if_empty(&form.image_url),
    )
    .await
    {
        Ok(user) => user,
        Err(AppError::Conflict(_)) => {
            return Ok(HttpResponse::Conflict()
                .content_type("text/html; charset=utf-8")
                .body(signup_page(&form, Some("Username or email already taken"))?));
        }
        Err(e) => return Err(e),
    };

    tracing::info!(user_id = %user.id, username = %user.username, "New signup");

    let mut response = see_other("/");
    response
        .add_cookie(&key.issue(user.id))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}

fn login_page(username: &str, error: Option<&str>) -> Result<String> {
    templates::render(
        "login.html",
        context! {
            error => error,
            form => context! { username => username },
        },
    )
}

/// GET /login
pub async fn show_login() -> Result<HttpResponse> {
    templates::html_response("login.html", context! { form => context! {} })
}

/// POST /login
pub async fn login(
    pool: web::Data<PgPool>,
    key: web::Data<SessionKey>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse> {
    match account::authenticate(pool.get_ref(), &form.username, &form.password).await? {
        Some(user) => {
            tracing::info!(user_id = %user.id, "Login");
            let mut response = see_other("/");
            response
                .add_cookie(&key.issue(user.id))
                .map_err(|e| AppError::Internal(e.to_string()))?;
            Ok(response)
        }
        None => Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(login_page(&form.username, Some("Invalid credentials."))?)),
    }
}

/// POST /logout
pub async fn logout(
    user: UserId,
    key: web::Data<SessionKey>,
    form: web::Form<CsrfForm>,
) -> Result<HttpResponse> {
    require_csrf(&key, user.0, &form.csrf_token)?;

    let mut response = see_other("/login");
    response
        .add_cookie(&key.clear())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> SignupForm {
        SignupForm {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "correct-horse-battery".to_string(),
            image_url: String::new(),
        }
    }

    #[test]
    fn signup_form_accepts_valid_input() {
        assert!(valid_form().validate().is_ok());
    }

    #[test]
    fn signup_form_rejects_bad_email() {
        let mut form = valid_form();
        form.email = "not-an-email".to_string();
        assert!(form.validate().is_err());
    }

    #[test]
    fn signup_form_rejects_short_password() {
        let mut form = valid_form();
        form.password = "short".to_string();
        assert!(form.validate().is_err());
    }

    #[test]
    fn signup_form_rejects_malformed_username() {
        let mut form = valid_form();
        form.username = "bad name".to_string();
        assert!(form.validate().is_err());
    }
}
