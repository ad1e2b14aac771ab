use crate::api::MarketDataSource;
use crate::config::YahooConfig;
use crate::error::{Result, SurfaceError};
use crate::models::{ChainQuote, OptionChain, SpotQuote};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

static YAHOO_HEADERS: Lazy<HeaderMap> = Lazy::new(|| {
    let mut h = HeaderMap::new();
    h.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        ),
    );
    h.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    h.insert("accept-language", HeaderValue::from_static("en-US,en;q=0.9"));
    h
});

/// Yahoo Finance options client (unofficial API, delayed data)
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(config: &YahooConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(YAHOO_HEADERS.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SurfaceError::NetworkError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/v7/finance{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| SurfaceError::NetworkError(format!("Request to {} failed: {}", url, e)))?;

        let resp = resp
            .error_for_status()
            .map_err(|e| SurfaceError::NetworkError(e.to_string()))?;

        let body = resp
            .text()
            .await
            .map_err(|e| SurfaceError::NetworkError(format!("Failed to read response: {}", e)))?;

        serde_json::from_str::<T>(&body)
            .map_err(|e| SurfaceError::ParseError(format!("Unexpected payload from {}: {}", url, e)))
    }

    async fn options_payload(
        &self,
        symbol: &str,
        expiry: Option<NaiveDate>,
    ) -> Result<YahooOptionChainData> {
        let mut query = Vec::new();
        if let Some(date) = expiry {
            query.push(("date", expiry_timestamp(date).to_string()));
        }
        let response: YahooOptionsResponse =
            self.get_json(&format!("/options/{}", symbol), &query).await?;
        first_chain(response)
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    async fn get_quote(&self, symbol: &str) -> Result<SpotQuote> {
        let response: YahooQuoteResponse = self
            .get_json("/quote", &[("symbols", symbol.to_string())])
            .await?;
        parse_quote(symbol, response)
    }

    async fn get_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>> {
        let chain = self.options_payload(symbol, None).await?;
        Ok(parse_expirations(&chain))
    }

    async fn get_chain(&self, symbol: &str, expiry: NaiveDate) -> Result<OptionChain> {
        let chain = self.options_payload(symbol, Some(expiry)).await?;
        Ok(parse_chain(chain, expiry))
    }
}

/// Yahoo keys expirations by midnight UTC
fn expiry_timestamp(expiry: NaiveDate) -> i64 {
    expiry.and_time(NaiveTime::MIN).and_utc().timestamp()
}

fn parse_quote(symbol: &str, response: YahooQuoteResponse) -> Result<SpotQuote> {
    let price = response
        .quote_response
        .result
        .into_iter()
        .next()
        .and_then(|q| q.regular_market_price)
        .ok_or_else(|| SurfaceError::EmptyData(format!("No quote returned for {}", symbol)))?;

    Ok(SpotQuote {
        symbol: symbol.to_string(),
        price,
        timestamp: Utc::now(),
    })
}

fn first_chain(response: YahooOptionsResponse) -> Result<YahooOptionChainData> {
    response
        .option_chain
        .result
        .into_iter()
        .next()
        .ok_or_else(|| SurfaceError::EmptyData("No options data returned".to_string()))
}

fn parse_expirations(chain: &YahooOptionChainData) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = chain
        .expiration_dates
        .iter()
        .filter_map(|&ts| DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()))
        .collect();
    dates.sort();
    dates.dedup();
    dates
}

fn parse_chain(chain: YahooOptionChainData, expiry: NaiveDate) -> OptionChain {
    let mut out = OptionChain::new(expiry);
    if let Some(options) = chain.options.into_iter().next() {
        out.calls = options.calls.iter().map(YahooOptionData::to_quote).collect();
        out.puts = options.puts.iter().map(YahooOptionData::to_quote).collect();
    }
    out
}

// Yahoo Finance API response structures

#[derive(Debug, Deserialize)]
struct YahooQuoteResponse {
    #[serde(rename = "quoteResponse")]
    quote_response: YahooQuoteResult,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteResult {
    #[serde(default)]
    result: Vec<YahooQuoteData>,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteData {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: YahooOptionChain,
}

#[derive(Debug, Deserialize)]
struct YahooOptionChain {
    #[serde(default)]
    result: Vec<YahooOptionChainData>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionChainData {
    #[serde(rename = "expirationDates", default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<YahooOptions>,
}

#[derive(Debug, Deserialize)]
struct YahooOptions {
    #[serde(default)]
    calls: Vec<YahooOptionData>,
    #[serde(default)]
    puts: Vec<YahooOptionData>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionData {
    strike: Option<f64>,
    #[serde(rename = "impliedVolatility")]
    implied_volatility: Option<f64>,
}

impl YahooOptionData {
    fn to_quote(&self) -> ChainQuote {
        ChainQuote {
            strike: self.strike,
            implied_vol: self.implied_volatility,
        }
    }
}
