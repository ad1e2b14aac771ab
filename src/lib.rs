//! # ivsurface-rs
//!
//! Implied volatility surface service. Irregular option quotes for a symbol
//! are binned onto a fixed moneyness ladder and the observed expiries,
//! gaps are filled, a time-driven overlay animates the result, and the cells
//! are summarised into low/med/high volatility regimes. When live data is
//! unavailable a synthetic surface of the same shape is served instead.
//!
//! ## Features
//!
//! - Yahoo Finance options-chain source behind the `MarketDataSource` trait
//! - Deterministic surface pipeline with injectable clock and overlay
//! - Synthetic fallback surface
//! - axum endpoint `GET /api/market/surface/:symbol`
//! - Environment-based configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use ivsurface_rs::config::Config;
//! use ivsurface_rs::engine::SurfaceEngine;
//!
//! #[tokio::main]
//! async fn main() -> ivsurface_rs::error::Result<()> {
//!     let config = Config::from_env()?;
//!     config.init_logging()?;
//!
//!     let engine = SurfaceEngine::from_config(&config)?;
//!     let response = engine.get_surface("SPY").await?;
//!
//!     println!(
//!         "{} @ {:.2}: low {}% / med {}% / high {}%",
//!         response.symbol,
//!         response.price,
//!         response.probabilities.low,
//!         response.probabilities.med,
//!         response.probabilities.high,
//!     );
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod webapp;

// Re-export commonly used types
pub use api::{MarketDataSource, YahooClient};
pub use config::Config;
pub use engine::SurfaceEngine;
pub use error::{Result, SurfaceError};
pub use models::SurfaceResponse;
