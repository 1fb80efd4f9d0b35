/// Server-side HTML rendering.
///
/// Templates are Jinja and are compiled into the binary; the environment
/// is built once. Handlers pass fully-prepared view models, so templates
/// stay free of logic beyond loops and conditionals.
use actix_web::{http::StatusCode, HttpResponse};
use minijinja::Environment;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::Result;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    (
        "partials/messages.html",
        include_str!("../templates/partials/messages.html"),
    ),
    (
        "partials/users.html",
        include_str!("../templates/partials/users.html"),
    ),
    ("home.html", include_str!("../templates/home.html")),
    ("home_anon.html", include_str!("../templates/home_anon.html")),
    ("signup.html", include_str!("../templates/signup.html")),
    ("login.html", include_str!("../templates/login.html")),
    (
        "users/index.html",
        include_str!("../templates/users/index.html"),
    ),
    (
        "users/show.html",
        include_str!("../templates/users/show.html"),
    ),
    (
        "users/edit.html",
        include_str!("../templates/users/edit.html"),
    ),
    (
        "users/following.html",
        include_str!("../templates/users/following.html"),
    ),
    (
        "users/followers.html",
        include_str!("../templates/users/followers.html"),
    ),
    (
        "users/likes.html",
        include_str!("../templates/users/likes.html"),
    ),
    (
        "messages/new.html",
        include_str!("../templates/messages/new.html"),
    ),
    (
        "messages/show.html",
        include_str!("../templates/messages/show.html"),
    ),
];

static ENV: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    for (name, source) in TEMPLATES {
        env.add_template(name, source)
            .unwrap_or_else(|e| panic!("template {} failed to parse: {}", name, e));
    }
    env
});

pub fn render<S: Serialize>(name: &str, ctx: S) -> Result<String> {
    let template = ENV.get_template(name)?;
    Ok(template.render(ctx)?)
}

/// Render a template into a 200 HTML response.
pub fn html_response<S: Serialize>(name: &str, ctx: S) -> Result<HttpResponse> {
    html_response_with(StatusCode::OK, name, ctx)
}

/// Render a template under an explicit status. Form re-renders use this
/// to report validation (400) and conflict (409) outcomes while still
/// returning the page.
pub fn html_response_with<S: Serialize>(
    status: StatusCode,
    name: &str,
    ctx: S,
) -> Result<HttpResponse> {
    Ok(HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(render(name, ctx)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn all_templates_parse() {
        // Building the environment parses every embedded template.
        Lazy::force(&ENV);
    }

    #[test]
    fn anon_homepage_renders() {
        let html = render("home_anon.html", context! {}).unwrap();
        assert!(html.contains("Sign up"));
    }

    #[test]
    fn signup_renders_inline_error() {
        let html = render(
            "signup.html",
            context! {
                error => "Username or email already taken",
                form => context! {
                    username => "alice",
                    email => "alice@example.com",
                    image_url => "",
                },
            },
        )
        .unwrap();
        assert!(html.contains("Username or email already taken"));
        assert!(html.contains("alice"));
    }

    #[test]
    fn login_renders_without_error() {
        let html = render("login.html", context! { form => context! { username => "" } })
            .unwrap();
        assert!(html.contains("form"));
    }
}
