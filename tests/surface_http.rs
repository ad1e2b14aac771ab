use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use ivsurface_rs::engine::{FixedClock, SurfaceEngine};
use ivsurface_rs::error::{Result, SurfaceError};
use ivsurface_rs::models::{OptionChain, SpotQuote, SurfaceResponse};
use ivsurface_rs::webapp::{router, AppState, ErrorBody};
use ivsurface_rs::MarketDataSource;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

struct DownSource;

#[async_trait]
impl MarketDataSource for DownSource {
    async fn get_quote(&self, _symbol: &str) -> Result<SpotQuote> {
        Err(SurfaceError::NetworkError("connection refused".to_string()))
    }

    async fn get_expirations(&self, _symbol: &str) -> Result<Vec<NaiveDate>> {
        Err(SurfaceError::NetworkError("connection refused".to_string()))
    }

    async fn get_chain(&self, _symbol: &str, _expiry: NaiveDate) -> Result<OptionChain> {
        Err(SurfaceError::NetworkError("connection refused".to_string()))
    }
}

async fn serve(engine: SurfaceEngine) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(AppState::new(engine));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 6, 1, 14, 30, 0).unwrap()))
}

#[tokio::test]
async fn test_simulated_surface_endpoint() {
    let addr = serve(SurfaceEngine::simulated().with_clock(clock())).await;

    let resp = reqwest::get(format!("http://{}/api/market/surface/SPY", addr))
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["symbol"], "SPY");
    assert_eq!(body["surface"]["x"].as_array().unwrap().len(), 7);
    assert_eq!(body["surface"]["y"].as_array().unwrap().len(), 21);
    assert_eq!(body["surface"]["z"].as_array().unwrap().len(), 21);
    assert!(body["probabilities"]["med"].is_u64());

    let typed: SurfaceResponse = serde_json::from_value(body).unwrap();
    assert!(typed.surface.is_complete());
    assert!((typed.price - 475.2).abs() <= 0.5 + 1e-9);
}

#[tokio::test]
async fn test_polling_at_fixed_instant_is_stable() {
    let addr = serve(SurfaceEngine::simulated().with_clock(clock())).await;
    let url = format!("http://{}/api/market/surface/QQQ", addr);

    let a: SurfaceResponse = reqwest::get(&url).await.unwrap().json().await.unwrap();
    let b: SurfaceResponse = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_live_failure_falls_back() {
    let engine = SurfaceEngine::live(Arc::new(DownSource)).with_clock(clock());
    let addr = serve(engine).await;

    let resp = reqwest::get(format!("http://{}/api/market/surface/AAPL", addr))
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: SurfaceResponse = resp.json().await.unwrap();
    assert_eq!(body.surface.dims(), (21, 7));
}

#[tokio::test]
async fn test_strict_failure_is_generic_500() {
    let engine = SurfaceEngine::live(Arc::new(DownSource))
        .with_clock(clock())
        .with_strict(true);
    let addr = serve(engine).await;

    let resp = reqwest::get(format!("http://{}/api/market/surface/AAPL", addr))
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = resp.json().await.unwrap();
    assert_eq!(body.error, "Market engine synchronization failed");
}
