use chrono::Utc;
use tracing_subscriber::EnvFilter;

use medtrack_backend::{
    config::Config,
    db::connection::create_pool,
    repositories::{PgStorage, Storage},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "token_cleanup=info".into()),
        )
        .init();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;
    let storage = PgStorage::new(pool);

    let deleted = storage.purge_consumed_login_tokens(Utc::now()).await?;
    if deleted > 0 {
        tracing::info!("Deleted {} expired consumed login tokens", deleted);
    }

    sqlx::query("VACUUM (ANALYZE) consumed_login_tokens")
        .execute(storage.pool())
        .await?;

    Ok(())
}
