//! Route configuration.
//!
//! Public pages come first; everything else sits behind the session
//! middleware, which resolves the current user once per request and
//! rejects anonymous access with 401.
use actix_web::web;

use crate::handlers;
use crate::middleware::SessionAuthMiddleware;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Public pages
        .route("/", web::get().to(handlers::home::homepage))
        .route("/", web::post().to(handlers::home::homepage))
        .route("/signup", web::get().to(handlers::auth::show_signup))
        .route("/signup", web::post().to(handlers::auth::signup))
        .route("/login", web::get().to(handlers::auth::show_login))
        .route("/login", web::post().to(handlers::auth::login))
        // Everything below requires a valid session
        .service(
            web::scope("")
                .wrap(SessionAuthMiddleware)
                .route("/logout", web::post().to(handlers::auth::logout))
                // Literal /users paths must precede /users/{id}
                .route("/users", web::get().to(handlers::users::list_users))
                .route(
                    "/users/profile",
                    web::get().to(handlers::users::show_profile),
                )
                .route(
                    "/users/profile",
                    web::post().to(handlers::users::update_profile),
                )
                .route(
                    "/users/delete",
                    web::post().to(handlers::users::delete_account),
                )
                .route(
                    "/users/follow/{id}",
                    web::post().to(handlers::users::follow_user),
                )
                .route(
                    "/users/stop-following/{id}",
                    web::post().to(handlers::users::unfollow_user),
                )
                .route("/users/{id}", web::get().to(handlers::users::show_user))
                .route(
                    "/users/{id}/following",
                    web::get().to(handlers::users::show_following),
                )
                .route(
                    "/users/{id}/followers",
                    web::get().to(handlers::users::show_followers),
                )
                .route(
                    "/users/{id}/likes",
                    web::get().to(handlers::users::show_likes),
                )
                .route(
                    "/messages/new",
                    web::get().to(handlers::messages::show_new_message),
                )
                .route(
                    "/messages/new",
                    web::post().to(handlers::messages::create_message),
                )
                .route(
                    "/messages/{id}",
                    web::get().to(handlers::messages::show_message),
                )
                .route(
                    "/messages/{id}/delete",
                    web::post().to(handlers::messages::delete_message),
                )
                .route(
                    "/api/messages/{id}/like",
                    web::post().to(handlers::likes::toggle_like),
                ),
        );
}
