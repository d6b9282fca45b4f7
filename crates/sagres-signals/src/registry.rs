//! Signal registry: construction and discovery of candidate signals.
//!
//! [`SignalRegistry::from_raw_feeds`] builds the full derived-signal set
//! from the raw feed series (borrow/repay volumes, RSI, funding rate,
//! open interest) the data layer provides. The registry owns the signals
//! and hands them to the evaluator read-only.

use crate::derive::{difference, momentum, ratio, zscore};
use sagres_traits::{Result, SagresError, Signal, SignalKind, TimeSeries, ValueBounds};
use serde::{Deserialize, Serialize};

/// Momentum lookback in samples: one hour at 5-minute bars.
pub const MOMENTUM_PERIODS: usize = 12;

/// Z-score rolling window in samples: one day at 5-minute bars.
pub const ZSCORE_WINDOW: usize = 288;

/// Raw feed series for one asset over a common time range.
#[derive(Debug, Clone)]
pub struct RawFeeds {
    /// Asset symbol (e.g. "BTC").
    pub asset: String,
    /// Spot price.
    pub price: TimeSeries,
    /// 24h total borrow volume.
    pub total_borrow: TimeSeries,
    /// 24h total repay volume.
    pub total_repay: TimeSeries,
    /// Relative strength index.
    pub rsi: TimeSeries,
    /// Futures funding rate.
    pub funding_rate: TimeSeries,
    /// Futures open interest.
    pub open_interest: TimeSeries,
}

/// Metadata about a signal the registry can build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalInfo {
    /// Unique identifier for the signal.
    pub name: &'static str,
    /// Classification.
    pub kind: SignalKind,
    /// Human-readable description.
    pub description: &'static str,
}

/// Get information about all signals [`SignalRegistry::from_raw_feeds`]
/// builds.
#[must_use]
pub fn available_signals() -> Vec<SignalInfo> {
    vec![
        SignalInfo {
            name: "borrow_repay_ratio",
            kind: SignalKind::Ratio,
            description: "Borrow volume relative to repay volume",
        },
        SignalInfo {
            name: "borrow_momentum",
            kind: SignalKind::Momentum,
            description: "1-hour change in borrow volume",
        },
        SignalInfo {
            name: "repay_momentum",
            kind: SignalKind::Momentum,
            description: "1-hour change in repay volume",
        },
        SignalInfo {
            name: "rsi_raw",
            kind: SignalKind::Raw,
            description: "Relative strength index",
        },
        SignalInfo {
            name: "rsi_zscore",
            kind: SignalKind::ZScore,
            description: "RSI standardized over a 1-day rolling window",
        },
        SignalInfo {
            name: "total_borrow",
            kind: SignalKind::Raw,
            description: "24h total borrow volume",
        },
        SignalInfo {
            name: "total_repay",
            kind: SignalKind::Raw,
            description: "24h total repay volume",
        },
        SignalInfo {
            name: "funding_rate",
            kind: SignalKind::Raw,
            description: "Futures funding rate",
        },
        SignalInfo {
            name: "open_interest",
            kind: SignalKind::Raw,
            description: "Futures open interest",
        },
        SignalInfo {
            name: "oi_momentum",
            kind: SignalKind::Momentum,
            description: "1-hour change in open interest",
        },
        SignalInfo {
            name: "net_flow",
            kind: SignalKind::Raw,
            description: "Borrow volume minus repay volume",
        },
        SignalInfo {
            name: "net_flow_momentum",
            kind: SignalKind::Momentum,
            description: "1-hour change in net flow",
        },
        SignalInfo {
            name: "ratio_momentum",
            kind: SignalKind::Momentum,
            description: "1-hour change in the borrow/repay ratio",
        },
        SignalInfo {
            name: "funding_zscore",
            kind: SignalKind::ZScore,
            description: "Funding rate standardized over a 1-day rolling window",
        },
        SignalInfo {
            name: "oi_zscore",
            kind: SignalKind::ZScore,
            description: "Open interest standardized over a 1-day rolling window",
        },
    ]
}

/// Registry of constructed signals, in registration order.
#[derive(Debug, Clone, Default)]
pub struct SignalRegistry {
    signals: Vec<Signal>,
}

impl SignalRegistry {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            signals: Vec::new(),
        }
    }

    /// Register a signal, replacing any existing one with the same name.
    pub fn register(&mut self, signal: Signal) {
        if let Some(existing) = self
            .signals
            .iter_mut()
            .find(|s| s.name() == signal.name())
        {
            *existing = signal;
        } else {
            self.signals.push(signal);
        }
    }

    /// Look up a signal by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name() == name)
    }

    /// Look up a signal by name, or error.
    ///
    /// # Errors
    ///
    /// Returns [`SagresError::SignalNotFound`] for an unknown name.
    pub fn try_get(&self, name: &str) -> Result<&Signal> {
        self.get(name)
            .ok_or_else(|| SagresError::SignalNotFound(name.to_string()))
    }

    /// Names of all registered signals, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.signals.iter().map(Signal::name).collect()
    }

    /// All registered signals.
    #[must_use]
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Number of registered signals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Build the full derived-signal set from the raw feeds.
    ///
    /// # Errors
    ///
    /// Propagates series-construction errors from the builders.
    pub fn from_raw_feeds(feeds: &RawFeeds) -> Result<Self> {
        let mut registry = Self::new();

        let borrow = &feeds.total_borrow;
        let repay = &feeds.total_repay;

        let borrow_repay = ratio(borrow, repay)?;
        let net = difference(borrow, repay)?;

        registry.register(
            Signal::new("borrow_repay_ratio", SignalKind::Ratio, borrow_repay.clone())
                .with_bounds(ValueBounds::non_negative()),
        );
        registry.register(Signal::new(
            "borrow_momentum",
            SignalKind::Momentum,
            momentum(borrow, MOMENTUM_PERIODS),
        ));
        registry.register(Signal::new(
            "repay_momentum",
            SignalKind::Momentum,
            momentum(repay, MOMENTUM_PERIODS),
        ));
        registry.register(
            Signal::new("rsi_raw", SignalKind::Raw, feeds.rsi.clone())
                .with_bounds(ValueBounds::range(0.0, 100.0)),
        );
        registry.register(Signal::new(
            "rsi_zscore",
            SignalKind::ZScore,
            zscore(&feeds.rsi, ZSCORE_WINDOW)?,
        ));
        registry.register(
            Signal::new("total_borrow", SignalKind::Raw, borrow.clone())
                .with_bounds(ValueBounds::non_negative()),
        );
        registry.register(
            Signal::new("total_repay", SignalKind::Raw, repay.clone())
                .with_bounds(ValueBounds::non_negative()),
        );
        registry.register(Signal::new(
            "funding_rate",
            SignalKind::Raw,
            feeds.funding_rate.clone(),
        ));
        registry.register(
            Signal::new("open_interest", SignalKind::Raw, feeds.open_interest.clone())
                .with_bounds(ValueBounds::positive()),
        );
        registry.register(Signal::new(
            "oi_momentum",
            SignalKind::Momentum,
            momentum(&feeds.open_interest, MOMENTUM_PERIODS),
        ));
        registry.register(Signal::new("net_flow", SignalKind::Raw, net.clone()));
        registry.register(Signal::new(
            "net_flow_momentum",
            SignalKind::Momentum,
            momentum(&net, MOMENTUM_PERIODS),
        ));
        registry.register(Signal::new(
            "ratio_momentum",
            SignalKind::Momentum,
            momentum(&borrow_repay, MOMENTUM_PERIODS),
        ));
        registry.register(Signal::new(
            "funding_zscore",
            SignalKind::ZScore,
            zscore(&feeds.funding_rate, ZSCORE_WINDOW)?,
        ));
        registry.register(Signal::new(
            "oi_zscore",
            SignalKind::ZScore,
            zscore(&feeds.open_interest, ZSCORE_WINDOW)?,
        ));

        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use sagres_traits::Timestamp;

    fn ts(i: usize) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(5 * i as i64)
    }

    fn series(values: Vec<f64>) -> TimeSeries {
        let timestamps = (0..values.len()).map(ts).collect();
        TimeSeries::new(timestamps, values).unwrap()
    }

    fn sample_feeds(n: usize) -> RawFeeds {
        RawFeeds {
            asset: "BTC".to_string(),
            price: series((0..n).map(|i| 90_000.0 + i as f64 * 10.0).collect()),
            total_borrow: series((0..n).map(|i| 2.5e9 + i as f64 * 1e6).collect()),
            total_repay: series((0..n).map(|i| 2.3e9 + i as f64 * 9e5).collect()),
            rsi: series((0..n).map(|i| 40.0 + (i % 20) as f64).collect()),
            funding_rate: series((0..n).map(|i| 0.0001 * ((i % 7) as f64 - 3.0)).collect()),
            open_interest: series((0..n).map(|i| 15e9 + i as f64 * 1e6).collect()),
        }
    }

    #[test]
    fn test_from_raw_feeds_builds_all_signals() {
        let registry = SignalRegistry::from_raw_feeds(&sample_feeds(50)).unwrap();
        assert_eq!(registry.len(), available_signals().len());

        for info in available_signals() {
            let signal = registry.try_get(info.name).unwrap();
            assert_eq!(signal.kind(), info.kind, "kind mismatch for {}", info.name);
        }
    }

    #[test]
    fn test_bounds_assignment() {
        let registry = SignalRegistry::from_raw_feeds(&sample_feeds(50)).unwrap();

        let rsi = registry.get("rsi_raw").unwrap();
        assert_eq!(rsi.bounds().unwrap().max, Some(100.0));

        let oi = registry.get("open_interest").unwrap();
        assert!(!oi.bounds().unwrap().allow_zero);

        let funding = registry.get("funding_rate").unwrap();
        assert!(funding.bounds().is_none());
    }

    #[test]
    fn test_momentum_signal_values() {
        let registry = SignalRegistry::from_raw_feeds(&sample_feeds(50)).unwrap();
        let momentum_signal = registry.get("borrow_momentum").unwrap();

        assert_eq!(momentum_signal.series().leading_missing_run(), MOMENTUM_PERIODS);
        assert!(momentum_signal.series().values()[MOMENTUM_PERIODS].is_finite());
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = SignalRegistry::new();
        registry.register(Signal::new("a", SignalKind::Raw, series(vec![1.0, 2.0])));
        registry.register(Signal::new("a", SignalKind::Momentum, series(vec![3.0, 4.0])));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().kind(), SignalKind::Momentum);
    }

    #[test]
    fn test_unknown_signal_errors() {
        let registry = SignalRegistry::new();
        assert!(matches!(
            registry.try_get("nope"),
            Err(SagresError::SignalNotFound(_))
        ));
    }

    #[test]
    fn test_names_in_registration_order() {
        let registry = SignalRegistry::from_raw_feeds(&sample_feeds(30)).unwrap();
        let names = registry.names();
        assert_eq!(names[0], "borrow_repay_ratio");
        assert_eq!(names[names.len() - 1], "oi_zscore");
    }
}
