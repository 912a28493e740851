mod app;
mod config;
mod error;
mod state;
mod telemetry;
mod users;

use crate::{app::build_app, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        max_page_size = config.max_page_size,
        "configuration loaded"
    );

    let app = build_app(AppState::new(&config));
    app::serve(app, &config).await
}
