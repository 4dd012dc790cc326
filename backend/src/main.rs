use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medtrack_backend::{
    config::Config,
    db::connection::create_pool,
    repositories::PgStorage,
    routes::build_router,
    services::email::SmtpMailer,
    state::AppState,
};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medtrack_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        listen_addr = %config.listen_addr,
        jwt_secret = %mask_secret(&config.jwt_secret),
        session_ttl_hours = config.session.ttl.num_hours(),
        renewal_threshold_seconds = config.session.renewal_threshold.num_seconds(),
        login_link_policy = ?config.session.login_link_policy,
        smtp_host = %config.smtp.host,
        smtp_password = %mask_secret(&config.smtp.password),
        "Loaded configuration from environment/.env"
    );

    // Initialize database
    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database is ready");

    let mailer = SmtpMailer::new(&config.smtp, &config.public_base_url)?;
    let listen_addr = config.listen_addr;
    let state = AppState::new(Arc::new(PgStorage::new(pool)), Arc::new(mailer), config);
    let app = build_router(state);

    // Start server
    tracing::info!("Server listening on {}", listen_addr);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?err, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
