mod app;
mod db;
mod prelude;
mod utils;

use std::sync::Arc;

use utils::config::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::tracing::init()?;

    // Load the server config, if any, then let the environment supply the database URL
    let config = match std::env::args().nth(1) {
        Some(file) => Config::load(&file).await?,
        None => Config::default(),
    };
    let config = config.with_env();
    if config.db.url.is_none() {
        tracing::warn!("{DATABASE_URL_VAR} is not set, database requests will fail with 500");
    }

    let addr = config.net.http_addr;
    let app = app::build(config, Arc::new(db::Postgres));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Live at http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
