use account_service::assets::HttpAssetStore;
use account_service::config::AppConfig;
use account_service::errors;
use account_service::handlers::cookies::CookieOptions;
use account_service::handlers::AppState;
use account_service::repositories::PgCredentialStore;
use account_service::routes;
use account_service::services::token_service::TokenService;
use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting account service");

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    errors::expose_error_traces(!config.is_production());

    info!("Connecting to database...");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    info!("Database ready");

    let assets = HttpAssetStore::from_config(&config)?;

    let state = Arc::new(AppState {
        store: Arc::new(PgCredentialStore::new(pool, config.bcrypt_cost)),
        assets: Arc::new(assets),
        tokens: TokenService::from_config(&config),
        cookie_options: CookieOptions {
            secure: config.is_production(),
        },
        cors_origin: config.cors_origin.clone(),
    });

    let app = routes::build_routes(state);

    let addr: SocketAddr = config
        .bind_address
        .parse()
        .context("Invalid bind address")?;

    info!("Account service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
