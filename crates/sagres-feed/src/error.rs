//! Error types for the metrics-backend client.

use thiserror::Error;

/// Errors that can occur when fetching feed data.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Missing backend URL.
    #[error("SAGRES_METRICS_URL environment variable not set")]
    MissingBaseUrl,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("Failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend reported a query failure.
    #[error("Metrics backend error: {0}")]
    Api(String),

    /// A query returned no series.
    #[error("No data returned for query: {0}")]
    Empty(String),

    /// The returned samples could not form a valid series.
    #[error("Invalid series from backend: {0}")]
    Series(#[from] sagres_traits::SagresError),
}

/// A specialized Result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FeedError::Empty("binance_price_usdt".to_string());
        assert_eq!(
            err.to_string(),
            "No data returned for query: binance_price_usdt"
        );
    }
}
