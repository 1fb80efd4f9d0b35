pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;
pub mod templates;
pub mod validators;

pub use config::Config;
pub use error::{AppError, Result};

/// Most recent messages shown on the home feed.
pub const HOME_FEED_LIMIT: i64 = 100;

/// Maximum message length in characters.
pub const MESSAGE_MAX_LEN: u64 = 140;
