//! Metrics-backend client.
//!
//! Fetches raw feed series from a Prometheus-compatible metrics backend
//! (VictoriaMetrics behind a Grafana datasource proxy in production).

use crate::types::RangeResponse;
use crate::{FeedError, Result};
use chrono::{Duration, Utc};
use sagres_signals::RawFeeds;
use sagres_traits::TimeSeries;
use std::env;

/// Default datasource uid of the production backend.
const DEFAULT_DS_UID: &str = "victoriametrics-uid";

/// Default range-query resolution.
pub const DEFAULT_STEP: &str = "5m";

/// Client for the metrics backend serving the raw feed series.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    base_url: String,
    ds_uid: String,
    auth: Option<(String, String)>,
}

impl FeedClient {
    /// Create a client against the given backend base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            ds_uid: DEFAULT_DS_UID.to_string(),
            auth: None,
        }
    }

    /// Override the Grafana datasource uid.
    #[must_use]
    pub fn with_ds_uid(mut self, ds_uid: impl Into<String>) -> Self {
        self.ds_uid = ds_uid.into();
        self
    }

    /// Attach basic-auth credentials.
    #[must_use]
    pub fn with_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((user.into(), password.into()));
        self
    }

    /// Create a client from the environment (`SAGRES_METRICS_URL`,
    /// optional `SAGRES_METRICS_DS_UID`, `SAGRES_METRICS_USER`,
    /// `SAGRES_METRICS_PASSWORD`), loading a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::MissingBaseUrl`] when the URL is not set.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let base_url = env::var("SAGRES_METRICS_URL").map_err(|_| FeedError::MissingBaseUrl)?;
        let mut client = Self::new(base_url);

        if let Ok(ds_uid) = env::var("SAGRES_METRICS_DS_UID") {
            client = client.with_ds_uid(ds_uid);
        }
        if let (Ok(user), Ok(password)) = (
            env::var("SAGRES_METRICS_USER"),
            env::var("SAGRES_METRICS_PASSWORD"),
        ) {
            client = client.with_auth(user, password);
        }

        Ok(client)
    }

    fn range_url(&self) -> String {
        format!(
            "{}/api/datasources/proxy/uid/{}/api/v1/query_range",
            self.base_url.trim_end_matches('/'),
            self.ds_uid
        )
    }

    /// Run a range query over the trailing `hours` at the given step and
    /// return the first matching series.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, backend-reported errors, or an empty
    /// result.
    pub async fn query_range(&self, query: &str, hours: i64, step: &str) -> Result<TimeSeries> {
        let end = Utc::now();
        let start = end - Duration::hours(hours);
        let start_secs = start.timestamp().to_string();
        let end_secs = end.timestamp().to_string();

        tracing::debug!(query, hours, step, "range query");

        let mut request = self.client.get(self.range_url()).query(&[
            ("query", query),
            ("start", start_secs.as_str()),
            ("end", end_secs.as_str()),
            ("step", step),
        ]);
        if let Some((user, password)) = &self.auth {
            request = request.basic_auth(user, Some(password));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(FeedError::Api(format!("HTTP {status}: {text}")));
        }

        let parsed: RangeResponse = serde_json::from_str(&response.text().await?)?;
        parsed.into_series(query)
    }

    /// Spot price for an asset.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`FeedClient::query_range`].
    pub async fn price(&self, asset: &str, hours: i64, step: &str) -> Result<TimeSeries> {
        self.query_range(&format!("binance_price_usdt{{asset=\"{asset}\"}}"), hours, step)
            .await
    }

    /// 24h total borrow volume for an asset.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`FeedClient::query_range`].
    pub async fn total_borrow(&self, asset: &str, hours: i64, step: &str) -> Result<TimeSeries> {
        self.query_range(
            &format!("binance_24h_total_borrow_usdt{{asset=\"{asset}\"}}"),
            hours,
            step,
        )
        .await
    }

    /// 24h total repay volume for an asset.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`FeedClient::query_range`].
    pub async fn total_repay(&self, asset: &str, hours: i64, step: &str) -> Result<TimeSeries> {
        self.query_range(
            &format!("binance_24h_total_repay_usdt{{asset=\"{asset}\"}}"),
            hours,
            step,
        )
        .await
    }

    /// RSI computed by the indicator pipeline.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`FeedClient::query_range`].
    pub async fn rsi(
        &self,
        asset: &str,
        timeframe: &str,
        hours: i64,
        step: &str,
    ) -> Result<TimeSeries> {
        self.query_range(
            &format!(
                "rsi{{symbol=\"{asset}\", timeframe=\"{timeframe}\", source=\"indicator_core\"}}"
            ),
            hours,
            step,
        )
        .await
    }

    /// Futures funding rate for a symbol (e.g. `BTCUSDT`).
    ///
    /// # Errors
    ///
    /// Same failure modes as [`FeedClient::query_range`].
    pub async fn funding_rate(&self, symbol: &str, hours: i64, step: &str) -> Result<TimeSeries> {
        self.query_range(
            &format!("binance_futures_funding_rate{{symbol=\"{symbol}\"}}"),
            hours,
            step,
        )
        .await
    }

    /// Futures open interest for a symbol.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`FeedClient::query_range`].
    pub async fn open_interest(&self, symbol: &str, hours: i64, step: &str) -> Result<TimeSeries> {
        self.query_range(
            &format!("binance_futures_open_interest{{symbol=\"{symbol}\"}}"),
            hours,
            step,
        )
        .await
    }

    /// Fetch every raw feed needed for signal evaluation, in parallel.
    ///
    /// # Errors
    ///
    /// Fails if any individual feed cannot be fetched.
    pub async fn fetch_all(&self, asset: &str, hours: i64, step: &str) -> Result<RawFeeds> {
        let asset = asset.to_uppercase();
        let futures_symbol = format!("{asset}USDT");

        tracing::debug!(asset, hours, step, "fetching all raw feeds");

        let (price, total_borrow, total_repay, rsi, funding_rate, open_interest) = tokio::try_join!(
            self.price(&asset, hours, step),
            self.total_borrow(&asset, hours, step),
            self.total_repay(&asset, hours, step),
            self.rsi(&asset, "3m", hours, step),
            self.funding_rate(&futures_symbol, hours, step),
            self.open_interest(&futures_symbol, hours, step),
        )?;

        Ok(RawFeeds {
            asset,
            price,
            total_borrow,
            total_repay,
            rsi,
            funding_rate,
            open_interest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_url_building() {
        let client = FeedClient::new("https://metrics.example.com/");
        assert_eq!(
            client.range_url(),
            "https://metrics.example.com/api/datasources/proxy/uid/victoriametrics-uid/api/v1/query_range"
        );

        let client = FeedClient::new("https://metrics.example.com").with_ds_uid("vm-prod");
        assert_eq!(
            client.range_url(),
            "https://metrics.example.com/api/datasources/proxy/uid/vm-prod/api/v1/query_range"
        );
    }
}
