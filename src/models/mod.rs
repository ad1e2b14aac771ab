//! Data models for option quotes and volatility surfaces
//!
//! This module contains the quote types exchanged with market data sources
//! and the surface types returned to callers.

mod quote;
mod surface;

pub use quote::*;
pub use surface::*;
