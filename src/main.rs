use dotenvy::dotenv;
use log::info;

use deskserver::core::config::AppConfig;
use deskserver::main_module::{
    create_app_state, ensure_bootstrap_admin, init_database, init_logging, run_axum_server,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    info!("Starting {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = AppConfig::from_env()?;
    let pool = init_database(&config).await?;
    ensure_bootstrap_admin(&pool, &config).await?;

    let app_state = create_app_state(pool, config);
    run_axum_server(app_state).await?;

    info!("Server stopped");
    Ok(())
}
