use chirpdeck_server::{config, db, router, state::AppState};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chirpdeck_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load settings
    let settings = config::Settings::new()?;

    // Initialize database
    let db = db::Database::new(&settings.database.path, &settings.database.schema)?;
    db.initialize()?;
    tracing::info!(
        "Database initialized at {} (schema {})",
        settings.database.path,
        db.schema.name()
    );

    tracing::info!(
        "Publisher transport: {:?}, timeout {}s",
        settings.publisher.transport,
        settings.publisher.timeout_secs
    );

    let state = AppState::new(db, settings.publisher.clone());
    let app = router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
