//! Data types for metrics-backend responses.
//!
//! The backend speaks the Prometheus HTTP API: `query_range` returns a
//! `matrix` result of `[unix_seconds, "value"]` sample pairs per series.

use crate::{FeedError, Result};
use chrono::DateTime;
use sagres_traits::TimeSeries;
use serde::Deserialize;
use std::collections::HashMap;

/// Envelope of a `query_range` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RangeResponse {
    /// `"success"` or `"error"`.
    pub status: String,
    /// Query result payload, present on success.
    #[serde(default)]
    pub data: Option<RangeData>,
    /// Error description, present on failure.
    #[serde(default)]
    pub error: Option<String>,
}

impl RangeResponse {
    /// Extract the first series of a successful matrix response.
    ///
    /// # Errors
    ///
    /// [`FeedError::Api`] when the backend reported a failure and
    /// [`FeedError::Empty`] when no series came back for the query.
    pub fn into_series(self, query: &str) -> Result<TimeSeries> {
        if self.status != "success" {
            return Err(FeedError::Api(
                self.error
                    .unwrap_or_else(|| format!("query failed with status {}", self.status)),
            ));
        }
        let data = self
            .data
            .ok_or_else(|| FeedError::Empty(query.to_string()))?;
        let series = data
            .result
            .into_iter()
            .next()
            .ok_or_else(|| FeedError::Empty(query.to_string()))?;
        series.into_series()
    }
}

/// Payload of a `query_range` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RangeData {
    /// Result type; range queries produce `"matrix"`.
    #[serde(rename = "resultType")]
    pub result_type: String,
    /// One entry per matching series.
    pub result: Vec<RangeSeries>,
}

/// A single series in a matrix result.
#[derive(Debug, Clone, Deserialize)]
pub struct RangeSeries {
    /// Label set identifying the series.
    #[serde(default)]
    pub metric: HashMap<String, String>,
    /// Sample pairs: unix timestamp in seconds, value as string.
    pub values: Vec<(f64, String)>,
}

impl RangeSeries {
    /// Convert the sample pairs into a [`TimeSeries`].
    ///
    /// Unparseable sample values become missing observations; duplicate
    /// timestamps keep the first sample.
    ///
    /// # Errors
    ///
    /// Propagates series-construction failures.
    pub fn into_series(self) -> Result<TimeSeries> {
        let mut pairs = Vec::with_capacity(self.values.len());
        let mut last_secs = i64::MIN;

        for (secs, raw) in self.values {
            let secs = secs as i64;
            if secs <= last_secs {
                continue;
            }
            let Some(timestamp) = DateTime::from_timestamp(secs, 0) else {
                continue;
            };
            let value = raw.parse::<f64>().unwrap_or(f64::NAN);
            pairs.push((timestamp, value));
            last_secs = secs;
        }

        Ok(TimeSeries::from_pairs(pairs)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix_response(values: Vec<(f64, String)>) -> RangeResponse {
        RangeResponse {
            status: "success".to_string(),
            data: Some(RangeData {
                result_type: "matrix".to_string(),
                result: vec![RangeSeries {
                    metric: HashMap::new(),
                    values,
                }],
            }),
            error: None,
        }
    }

    #[test]
    fn test_parse_range_response_json() {
        let json = r#"{
            "status": "success",
            "data": {
                "resultType": "matrix",
                "result": [
                    {
                        "metric": {"asset": "BTC"},
                        "values": [[1700000000, "42000.5"], [1700000300, "42100.0"]]
                    }
                ]
            }
        }"#;

        let response: RangeResponse = serde_json::from_str(json).unwrap();
        let series = response.into_series("test").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.values(), &[42000.5, 42100.0]);
    }

    #[test]
    fn test_error_status() {
        let response = RangeResponse {
            status: "error".to_string(),
            data: None,
            error: Some("bad query".to_string()),
        };
        assert!(matches!(
            response.into_series("q"),
            Err(FeedError::Api(msg)) if msg == "bad query"
        ));
    }

    #[test]
    fn test_empty_result() {
        let response = RangeResponse {
            status: "success".to_string(),
            data: Some(RangeData {
                result_type: "matrix".to_string(),
                result: vec![],
            }),
            error: None,
        };
        assert!(matches!(response.into_series("q"), Err(FeedError::Empty(_))));
    }

    #[test]
    fn test_unparseable_value_becomes_missing() {
        let response = matrix_response(vec![
            (1700000000.0, "1.0".to_string()),
            (1700000300.0, "NaN".to_string()),
            (1700000600.0, "oops".to_string()),
            (1700000900.0, "2.0".to_string()),
        ]);
        let series = response.into_series("q").unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series.missing_count(), 2);
    }

    #[test]
    fn test_duplicate_timestamps_keep_first() {
        let response = matrix_response(vec![
            (1700000000.0, "1.0".to_string()),
            (1700000000.0, "9.0".to_string()),
            (1700000300.0, "2.0".to_string()),
        ]);
        let series = response.into_series("q").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.values(), &[1.0, 2.0]);
    }
}
