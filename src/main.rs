use bytrix::config::ServerConfig;
use bytrix::context::AppContext;
use bytrix::error::ApiResult;
use bytrix::server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ApiResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bytrix=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context (collaborator clients, pool, migrations)
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}
