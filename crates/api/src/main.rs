use std::sync::Arc;

use anyhow::Context;

use userhub_api::app::build_app;
use userhub_api::config::{ApiConfig, StorageBackend};
use userhub_infra::{bootstrap, DbConfig, InMemoryUserStore, RetryPolicy, UserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    dotenv::dotenv().ok();
    userhub_observability::init();

    let config = ApiConfig::from_env().context("invalid server configuration")?;

    let store: Arc<dyn UserStore> = match config.storage {
        StorageBackend::Postgres => {
            let db = DbConfig::from_env().context("invalid database configuration")?;
            let store = bootstrap(&db, RetryPolicy::default())
                .await
                .context("failed to initialize postgres user store")?;
            Arc::new(store)
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory user store; data is lost on restart");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let app = build_app(store, &config);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        static_dir = ?config.static_dir,
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
