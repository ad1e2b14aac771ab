//! Surface construction pipeline
//!
//! source -> filter -> grid -> gap fill -> overlay -> regimes, with the
//! synthetic generator as the alternate path when the source is unavailable.

pub mod clock;
pub mod fallback;
pub mod filter;
pub mod grid;
pub mod overlay;
pub mod regime;

pub use clock::{Clock, FixedClock, SystemClock};
pub use overlay::{NoOverlay, Perturbation, WaveOverlay};
pub use regime::{Regime, RegimeThresholds};

use crate::api::{MarketDataSource, YahooClient};
use crate::config::{Config, SourceMode};
use crate::error::{Result, SurfaceError};
use crate::models::{OptionChain, SurfaceResponse};
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// Run the pure part of the pipeline over already fetched chains
pub fn build_surface(
    symbol: &str,
    reference_price: f64,
    chains: &[(NaiveDate, OptionChain)],
    now: DateTime<Utc>,
    overlay: &dyn Perturbation,
    thresholds: &RegimeThresholds,
) -> SurfaceResponse {
    let points = filter::filter_points(reference_price, chains, now);
    let mut surface = grid::build_grid(&points);
    grid::fill_gaps(&mut surface, grid::GAP_FILL_IV);
    overlay::apply_overlay(&mut surface, overlay, now);

    debug!(
        "{}: {} points kept, grid {}x{}",
        symbol,
        points.len(),
        surface.y.len(),
        surface.x.len()
    );

    SurfaceResponse {
        symbol: symbol.to_string(),
        price: reference_price,
        probabilities: thresholds.probabilities(&surface),
        surface,
    }
}

/// Per-request surface builder.
///
/// Holds no per-request state; every call is an independent computation.
pub struct SurfaceEngine {
    source: Option<Arc<dyn MarketDataSource>>,
    clock: Arc<dyn Clock>,
    overlay: Arc<dyn Perturbation>,
    thresholds: RegimeThresholds,
    max_expiries: usize,
    strict: bool,
}

impl SurfaceEngine {
    /// Engine that only serves synthetic surfaces
    pub fn simulated() -> Self {
        Self {
            source: None,
            clock: Arc::new(SystemClock),
            overlay: Arc::new(WaveOverlay::default()),
            thresholds: RegimeThresholds::default(),
            max_expiries: 10,
            strict: false,
        }
    }

    /// Engine backed by `source`, falling back to synthetic surfaces on failure
    pub fn live(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source: Some(source),
            ..Self::simulated()
        }
    }

    /// Engine per configuration, with a Yahoo source in live mode
    pub fn from_config(config: &Config) -> Result<Self> {
        let engine = match config.surface.source {
            SourceMode::Live => Self::live(Arc::new(YahooClient::new(&config.yahoo)?)),
            SourceMode::Simulated => Self::simulated(),
        };
        Ok(engine
            .with_max_expiries(config.surface.max_expiries)
            .with_strict(config.surface.strict))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_overlay(mut self, overlay: Arc<dyn Perturbation>) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn with_thresholds(mut self, thresholds: RegimeThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_max_expiries(mut self, max_expiries: usize) -> Self {
        self.max_expiries = max_expiries.max(1);
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Surface for `symbol` at the current clock instant.
    ///
    /// In live mode a source failure yields the synthetic surface, or
    /// [`SurfaceError::SyncFailed`] when strict.
    pub async fn get_surface(&self, symbol: &str) -> Result<SurfaceResponse> {
        let now = self.clock.now();

        let source = match &self.source {
            Some(source) => source,
            None => return Ok(fallback::generate(symbol, now, &self.thresholds)),
        };

        match self.fetch(source.as_ref(), symbol).await {
            Ok((price, chains)) => Ok(build_surface(
                symbol,
                price,
                &chains,
                now,
                self.overlay.as_ref(),
                &self.thresholds,
            )),
            Err(e) if self.strict => {
                warn!("{}: market data unavailable: {}", symbol, e);
                Err(SurfaceError::SyncFailed)
            }
            Err(e) => {
                warn!("{}: market data unavailable, serving synthetic surface: {}", symbol, e);
                Ok(fallback::generate(symbol, now, &self.thresholds))
            }
        }
    }

    /// Quote plus up to `max_expiries` chains, fetched concurrently.
    ///
    /// Failed chains are skipped; the fetch only fails when nothing usable
    /// came back, including chains that all lack calls.
    async fn fetch(
        &self,
        source: &dyn MarketDataSource,
        symbol: &str,
    ) -> Result<(f64, Vec<(NaiveDate, OptionChain)>)> {
        let quote = source.get_quote(symbol).await?;
        if !(quote.price > 0.0) || !quote.price.is_finite() {
            return Err(SurfaceError::EmptyData(format!(
                "Invalid reference price {} for {}",
                quote.price, symbol
            )));
        }

        let mut expiries = source.get_expirations(symbol).await?;
        if expiries.is_empty() {
            return Err(SurfaceError::EmptyData(format!("No expirations for {}", symbol)));
        }
        expiries.truncate(self.max_expiries);

        let results = join_all(
            expiries
                .iter()
                .map(|&expiry| async move { (expiry, source.get_chain(symbol, expiry).await) }),
        )
        .await;

        let requested = results.len();
        let chains: Vec<(NaiveDate, OptionChain)> = results
            .into_iter()
            .filter_map(|(expiry, result)| match result {
                Ok(chain) => Some((expiry, chain)),
                Err(e) => {
                    warn!("{}: chain for {} failed: {}", symbol, expiry, e);
                    None
                }
            })
            .collect();

        if chains.is_empty() {
            return Err(SurfaceError::EmptyData(format!(
                "All {} chain requests failed for {}",
                requested, symbol
            )));
        }
        if chains.iter().all(|(_, chain)| chain.calls.is_empty()) {
            return Err(SurfaceError::EmptyData(format!(
                "No call quotes in {} chains for {}",
                chains.len(),
                symbol
            )));
        }
        debug!("{}: {}/{} chains fetched", symbol, chains.len(), requested);

        Ok((quote.price, chains))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChainQuote, RegimeProbabilities, SpotQuote};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource {
        price: Option<f64>,
        chains: Vec<(NaiveDate, Option<OptionChain>)>,
        chain_calls: AtomicUsize,
    }

    impl StaticSource {
        fn new(price: Option<f64>, chains: Vec<(NaiveDate, Option<OptionChain>)>) -> Self {
            Self {
                price,
                chains,
                chain_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MarketDataSource for StaticSource {
        async fn get_quote(&self, symbol: &str) -> Result<SpotQuote> {
            let price = self
                .price
                .ok_or_else(|| SurfaceError::NetworkError("quote down".to_string()))?;
            Ok(SpotQuote {
                symbol: symbol.to_string(),
                price,
                timestamp: Utc::now(),
            })
        }

        async fn get_expirations(&self, _symbol: &str) -> Result<Vec<NaiveDate>> {
            Ok(self.chains.iter().map(|(d, _)| *d).collect())
        }

        async fn get_chain(&self, _symbol: &str, expiry: NaiveDate) -> Result<OptionChain> {
            self.chain_calls.fetch_add(1, Ordering::SeqCst);
            let chains: HashMap<NaiveDate, &Option<OptionChain>> =
                self.chains.iter().map(|(d, c)| (*d, c)).collect();
            match chains.get(&expiry) {
                Some(Some(chain)) => Ok(chain.clone()),
                _ => Err(SurfaceError::NetworkError(format!("chain {} down", expiry))),
            }
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn chain(expiry: NaiveDate, calls: &[(f64, f64)]) -> OptionChain {
        let mut chain = OptionChain::new(expiry);
        chain.calls = calls.iter().map(|&(k, iv)| ChainQuote::new(k, iv)).collect();
        chain
    }

    fn engine(source: StaticSource) -> SurfaceEngine {
        SurfaceEngine::live(Arc::new(source)).with_clock(Arc::new(FixedClock(now())))
    }

    #[test]
    fn test_single_point_scenario() {
        // 2025-07-02 is 182 days out; use the computed t as the column
        let expiry = date(2025, 7, 2);
        let chains = vec![(expiry, chain(expiry, &[(100.0, 0.20)]))];
        let resp = build_surface(
            "SPY",
            100.0,
            &chains,
            now(),
            &WaveOverlay::default(),
            &RegimeThresholds::default(),
        );

        assert_eq!(resp.price, 100.0);
        assert_eq!(resp.surface.dims(), (21, 1));
        let t = resp.surface.x[0];
        let wave = WaveOverlay::default();
        for (i, &m) in resp.surface.y.iter().enumerate() {
            let expected = 20.0 + wave.perturb(t, m, now());
            assert!((resp.surface.get(i, 0).unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_points_all_med() {
        let expiry = date(2025, 7, 2);
        let chains = vec![(expiry, chain(expiry, &[(10.0, 0.20), (100.0, 3.0)]))];
        let resp = build_surface(
            "SPY",
            100.0,
            &chains,
            now(),
            &NoOverlay,
            &RegimeThresholds::default(),
        );
        assert_eq!(resp.surface.dims(), (21, 7));
        assert!(resp.surface.values().all(|v| v == 20.0));
        assert_eq!(resp.probabilities, RegimeProbabilities { low: 0, med: 100, high: 0 });
    }

    #[tokio::test]
    async fn test_live_surface() {
        let near = date(2025, 4, 1);
        let far = date(2026, 1, 1);
        let source = StaticSource::new(
            Some(100.0),
            vec![
                (far, Some(chain(far, &[(90.0, 0.30), (110.0, 0.15)]))),
                (near, Some(chain(near, &[(100.0, 0.22)]))),
            ],
        );

        let resp = engine(source).get_surface("SPY").await.unwrap();
        assert_eq!(resp.surface.dims(), (21, 2));
        assert!(resp.surface.x[0] < resp.surface.x[1]);
        assert!(resp.surface.is_complete());
        let p = resp.probabilities;
        assert!(((p.low + p.med + p.high) as i32 - 100).abs() <= 1);
    }

    #[tokio::test]
    async fn test_repeated_calls_identical_at_fixed_instant() {
        let expiry = date(2025, 7, 2);
        let make = || {
            StaticSource::new(
                Some(100.0),
                vec![(expiry, Some(chain(expiry, &[(95.0, 0.25), (104.0, 0.19)])))],
            )
        };
        let a = engine(make()).get_surface("SPY").await.unwrap();
        let b = engine(make()).get_surface("SPY").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_partial_chain_failure_keeps_successes() {
        let ok = date(2025, 7, 2);
        let broken = date(2025, 9, 1);
        let source = StaticSource::new(
            Some(100.0),
            vec![(ok, Some(chain(ok, &[(100.0, 0.2)]))), (broken, None)],
        );

        let resp = engine(source)
            .with_strict(true)
            .get_surface("SPY")
            .await
            .unwrap();
        assert_eq!(resp.surface.dims(), (21, 1));
        assert_eq!(resp.price, 100.0);
    }

    #[tokio::test]
    async fn test_fan_out_capped() {
        let expiries: Vec<NaiveDate> = (0u32..14)
            .map(|i| date(2025 + (i / 12) as i32, i % 12 + 1, 15))
            .collect();
        let source = Arc::new(StaticSource::new(
            Some(100.0),
            expiries
                .iter()
                .map(|&d| (d, Some(chain(d, &[(100.0, 0.2)]))))
                .collect(),
        ));

        let engine = SurfaceEngine::live(source.clone())
            .with_clock(Arc::new(FixedClock(now())))
            .with_max_expiries(10);
        let resp = engine.get_surface("QQQ").await.unwrap();
        assert_eq!(source.chain_calls.load(Ordering::SeqCst), 10);
        assert_eq!(resp.surface.x.len(), 10);
    }

    #[tokio::test]
    async fn test_unavailable_source_falls_back() {
        let resp = engine(StaticSource::new(None, vec![]))
            .get_surface("SPY")
            .await
            .unwrap();
        assert_eq!(resp.surface.dims(), (21, 7));
        assert!((resp.price - 475.2).abs() <= 0.5 + 1e-9);

        let no_expiries = engine(StaticSource::new(Some(100.0), vec![]))
            .get_surface("SPY")
            .await
            .unwrap();
        assert_eq!(no_expiries, fallback::generate("SPY", now(), &RegimeThresholds::default()));
    }

    #[tokio::test]
    async fn test_empty_chains_fall_back() {
        let expiry = date(2025, 7, 2);
        let mut puts_only = OptionChain::new(expiry);
        puts_only.puts = vec![ChainQuote::new(100.0, 0.2)];
        let source = StaticSource::new(
            Some(100.0),
            vec![(expiry, Some(OptionChain::new(expiry))), (date(2025, 9, 1), Some(puts_only))],
        );

        let resp = engine(source).get_surface("SPY").await.unwrap();
        assert_eq!(resp, fallback::generate("SPY", now(), &RegimeThresholds::default()));
        assert_ne!(resp.price, 100.0);
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_empty_chains() {
        let expiry = date(2025, 7, 2);
        let source = StaticSource::new(Some(100.0), vec![(expiry, Some(OptionChain::new(expiry)))]);
        let result = engine(source).with_strict(true).get_surface("SPY").await;
        assert!(matches!(result, Err(SurfaceError::SyncFailed)));
    }

    #[tokio::test]
    async fn test_strict_mode_reports_sync_failure() {
        let broken = date(2025, 7, 2);
        let result = engine(StaticSource::new(Some(100.0), vec![(broken, None)]))
            .with_strict(true)
            .get_surface("SPY")
            .await;
        assert!(matches!(result, Err(SurfaceError::SyncFailed)));
    }

    #[tokio::test]
    async fn test_simulated_engine() {
        let engine = SurfaceEngine::simulated().with_clock(Arc::new(FixedClock(now())));
        let resp = engine.get_surface("AAPL").await.unwrap();
        assert_eq!(resp, fallback::generate("AAPL", now(), &RegimeThresholds::default()));
    }
}
