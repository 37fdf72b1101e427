use activity_core::db::open_db;
use activity_core::init_logging;
use activity_server::{build_app, serve, AppState, ServerConfig};
use anyhow::{anyhow, Context};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;
    init_logging(&config.log_level, config.log_target.clone()).map_err(|err| anyhow!(err))?;

    // Migrate once at startup; handlers open their own connections.
    open_db(&config.db_path)
        .with_context(|| format!("failed to open database `{}`", config.db_path.display()))?;

    let app = build_app(AppState::new(config.db_path.clone()));
    serve(app, &config.bind_address()).await
}
