use actix_web::{web, App, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use warble::db::{create_pool, run_migrations};
use warble::middleware::NoStoreCacheControl;
use warble::routes::configure_routes;
use warble::security::SessionKey;
use warble::Config;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting warble v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let db_pool = create_pool(&config.database.url, config.database.max_connections).await?;
    tracing::info!(
        "Database pool created with {} max connections",
        config.database.max_connections
    );

    run_migrations(&db_pool).await?;
    tracing::info!("Database migrations completed");

    let session_key = SessionKey::new(&config.session.secret_key);

    let bind_addr = (config.app.host.clone(), config.app.port);
    tracing::info!("Listening on {}:{}", config.app.host, config.app.port);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(NoStoreCacheControl)
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(session_key.clone()))
            .configure(configure_routes)
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
