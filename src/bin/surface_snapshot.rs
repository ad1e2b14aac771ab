use ivsurface_rs::config::Config;
use ivsurface_rs::engine::SurfaceEngine;
use ivsurface_rs::error::{Result, SurfaceError};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    config.init_logging()?;

    let symbol = std::env::args()
        .nth(1)
        .ok_or_else(|| SurfaceError::ConfigError("usage: surface_snapshot <SYMBOL>".to_string()))?
        .to_uppercase();

    let engine = SurfaceEngine::from_config(&config)?;
    let response = engine.get_surface(&symbol).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
