use anyhow::{Context, Result};
use axum::Router;
use portal_pages::AppState;
use portal_pages::auth::StaticAuthorizer;
use portal_pages::config::PagesConfig;
use portal_pages::database::sqlite::SqliteRepository;
use portal_pages::features::pages::pages_router;
use portal_pages::features::pages::service::PagesService;
use portal_pages::io::local::LocalImageStore;
use sqlx::Sqlite;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // determine environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_pages=info".into()),
        )
        .init();

    // load centralized config
    let config = PagesConfig::from_env()?;
    let shared_config = Arc::new(config.clone());

    // verify db exists
    if !Sqlite::database_exists(&config.database_url)
        .await
        .unwrap_or(false)
    {
        info!("No database at {}, creating...", config.database_url);
        Sqlite::create_database(&config.database_url)
            .await
            .with_context(|| format!("Unable to create database at {}", config.database_url))?;
    }

    // connect to our db
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to create pool on {}", config.database_url))?;

    // schema setup happens once, here
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let images = LocalImageStore::new(&config.storage_path);
    let images_dir = images.images_dir();

    let service = PagesService::new(
        Arc::new(SqliteRepository::new(pool)),
        Arc::new(StaticAuthorizer::new(
            config.sysadmins.clone(),
            config.memberships.clone(),
        )),
        Arc::new(images),
        config.site_url.clone(),
    );

    let app_state = AppState {
        service: Arc::new(service),
        config: shared_config,
    };

    let app = Router::new()
        .nest("/api", pages_router())
        .nest_service("/uploads/page_images", ServeDir::new(images_dir))
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Server listening on http://{}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
