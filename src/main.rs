//! Surface server
//!
//! Serves `GET /api/market/surface/:symbol` using the configured source.

use ivsurface_rs::config::Config;
use ivsurface_rs::engine::SurfaceEngine;
use ivsurface_rs::error::Result;
use ivsurface_rs::webapp::{router, AppState};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    config.init_logging()?;

    let engine = SurfaceEngine::from_config(&config)?;
    info!(
        "Starting surface engine ({:?} source, strict={}, max expiries {})",
        config.surface.source, config.surface.strict, config.surface.max_expiries
    );

    let app = router(AppState::new(engine));

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
