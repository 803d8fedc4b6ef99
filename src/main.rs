mod app;
mod auth;
mod claim;
mod config;
mod db;
mod error;
mod extract;
mod mailer;
#[cfg(test)]
mod memory;
mod state;
mod tree;
mod validation;

use tracing_subscriber::EnvFilter;

use crate::{config::AppConfig, state::AppState};

const DEFAULT_LOG_FILTER: &str = "claimtree=debug,axum=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;

    let state = AppState::init(config, pool)?;
    app::serve(app::build_app(state)).await
}

/// `RUST_LOG` overrides the default filter; `LOG_FORMAT=json` emits one JSON object per event.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().with_current_span(true).init(),
        _ => builder.init(),
    }
}
